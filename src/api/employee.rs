use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use sqlx::MySqlPool;
use tracing::error;

use crate::model::employee::Employee;

/// List employees
#[utoipa::path(
    get,
    path = "/employees",
    responses(
        (status = 200, description = "All employees, ordered by id", body = [Employee])
    ),
    tag = "Employee"
)]
pub async fn list_employees(pool: web::Data<MySqlPool>) -> actix_web::Result<impl Responder> {
    let employees = sqlx::query_as::<_, Employee>("SELECT id, name FROM employees ORDER BY id")
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to list employees");
            ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(employees))
}
