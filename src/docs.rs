use crate::api::vacation::VacationFilter;
use crate::model::employee::Employee;
use crate::model::vacation::VacationEntry;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Vacation Scheduling API",
        version = "1.0.0",
        description = r#"
## Vacation Scheduling Backend

Employees submit date-ranged vacation requests which are stored in MySQL.

### 🔹 Key Features
- **Employee Directory**
  - Fixed fixture roster, listed by id
- **Vacation Requests**
  - Submit one or more dates per request, with optional per-date times
  - Resubmitting a date overwrites its time window (upsert)
  - List all requests, optionally filtered by employee

### 📦 Response Format
- JSON-based RESTful responses
- Dates as `YYYY-MM-DD`, times as 24-hour `HH:MM`

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::health::health_check,

        crate::api::employee::list_employees,

        crate::api::vacation::list_vacation_requests,
        crate::api::vacation::create_vacation_request,
    ),
    components(
        schemas(
            Employee,
            VacationEntry,
            VacationFilter
        )
    ),
    tags(
        (name = "Health", description = "Service health APIs"),
        (name = "Employee", description = "Employee directory APIs"),
        (name = "Vacation", description = "Vacation request APIs"),
    )
)]
pub struct ApiDoc;
