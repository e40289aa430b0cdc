use std::collections::BTreeMap;

use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use serde_json::{Value, json};
use sqlx::{MySql, MySqlPool, QueryBuilder};
use tracing::error;
use utoipa::{IntoParams, ToSchema};

use crate::model::vacation::{VacationEntry, VacationRow};

const DEFAULT_START_TIME: &str = "09:00";
const DEFAULT_END_TIME: &str = "18:00";

const BASE_SELECT: &str = r#"
    SELECT v.employee_id,
           e.name AS employee_name,
           v.vacation_date,
           CAST(TIME_TO_SEC(v.start_time) AS SIGNED) AS start_secs,
           CAST(TIME_TO_SEC(v.end_time) AS SIGNED) AS end_secs,
           v.submitted_at
    FROM vacation AS v
    JOIN employees AS e ON e.id = v.employee_id
"#;

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct VacationFilter {
    /// Narrow the list to one employee
    #[schema(example = 1)]
    pub employee_id: Option<i64>,
}

/// A single element of the `dates` payload array, resolved from the loose
/// JSON shape: either a bare ISO date (default working hours apply) or an
/// object carrying explicit times.
#[derive(Debug)]
enum DateSpec {
    Bare(String),
    Detailed {
        date: Option<String>,
        start_time: Option<String>,
        end_time: Option<String>,
    },
}

impl DateSpec {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::String(s) => Ok(Self::Bare(s.clone())),
            Value::Object(obj) => Ok(Self::Detailed {
                date: obj.get("date").and_then(Value::as_str).map(str::to_string),
                start_time: obj
                    .get("start_time")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                end_time: obj
                    .get("end_time")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            }),
            _ => Err("dates must be strings or objects".to_string()),
        }
    }
}

type TimeWindow = (NaiveTime, NaiveTime);

fn extract_employee_id(payload: &Value) -> Option<i64> {
    match payload.get("employee_id")? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Validates and normalizes the `dates` array. Duplicate dates collapse to
/// the last occurrence. The map key doubles as the upsert key, so the batch
/// handed to MySQL never conflicts with itself.
fn normalize_dates(raw_dates: &[Value]) -> Result<BTreeMap<NaiveDate, TimeWindow>, String> {
    let mut normalized = BTreeMap::new();

    for raw in raw_dates {
        let (date, raw_start, raw_end) = match DateSpec::from_value(raw)? {
            DateSpec::Bare(date) => (
                Some(date),
                DEFAULT_START_TIME.to_string(),
                DEFAULT_END_TIME.to_string(),
            ),
            DateSpec::Detailed {
                date,
                start_time,
                end_time,
            } => (
                date,
                start_time.unwrap_or_default(),
                end_time.unwrap_or_default(),
            ),
        };

        // Required on both shapes; an empty string counts as missing.
        let raw_iso = date
            .filter(|d| !d.is_empty())
            .ok_or_else(|| "date field is required".to_string())?;

        let parsed_date = NaiveDate::parse_from_str(&raw_iso, "%Y-%m-%d")
            .map_err(|_| format!("Invalid date format: {raw_iso}"))?;

        let start_time = NaiveTime::parse_from_str(&raw_start, "%H:%M")
            .map_err(|_| "start_time/end_time must be HH:MM".to_string())?;
        let end_time = NaiveTime::parse_from_str(&raw_end, "%H:%M")
            .map_err(|_| "start_time/end_time must be HH:MM".to_string())?;

        if start_time >= end_time {
            return Err("start_time must be earlier than end_time".to_string());
        }

        normalized.insert(parsed_date, (start_time, end_time));
    }

    Ok(normalized)
}

/// List vacation requests
#[utoipa::path(
    get,
    path = "/vacation-requests",
    params(VacationFilter),
    responses(
        (status = 200, description = "Vacation entries ordered by (date, start time)", body = [VacationEntry])
    ),
    tag = "Vacation"
)]
pub async fn list_vacation_requests(
    pool: web::Data<MySqlPool>,
    query: web::Query<VacationFilter>,
) -> actix_web::Result<impl Responder> {
    let rows = if let Some(employee_id) = query.employee_id {
        sqlx::query_as::<_, VacationRow>(&format!(
            "{BASE_SELECT} WHERE v.employee_id = ? ORDER BY v.vacation_date, v.start_time"
        ))
        .bind(employee_id)
        .fetch_all(pool.get_ref())
        .await
    } else {
        sqlx::query_as::<_, VacationRow>(&format!(
            "{BASE_SELECT} ORDER BY v.vacation_date, v.start_time"
        ))
        .fetch_all(pool.get_ref())
        .await
    }
    .map_err(|e| {
        error!(error = %e, "Failed to fetch vacation requests");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let entries: Vec<VacationEntry> = rows.into_iter().map(VacationEntry::from).collect();
    Ok(HttpResponse::Ok().json(entries))
}

/// Create or overwrite vacation requests
#[utoipa::path(
    post,
    path = "/vacation-requests",
    request_body(
        content = Object,
        description = "Employee id plus a list of dates; each date is a bare ISO string or an object with explicit times",
        content_type = "application/json",
        example = json!({
            "employee_id": 1,
            "dates": [
                "2024-06-01",
                { "date": "2024-06-02", "start_time": "10:00", "end_time": "15:00" }
            ]
        })
    ),
    responses(
        (status = 201, description = "Entries persisted and echoed back", body = Object, example = json!({
            "requests": [{
                "employee_id": 1,
                "employee_name": "Alice",
                "vacation_date": "2024-06-01",
                "start_time": "09:00",
                "end_time": "18:00",
                "submitted_at": "2024-05-20T12:34:56"
            }]
        })),
        (status = 400, description = "Validation failure", body = Object, example = json!({
            "error": "dates array is required"
        })),
        (status = 404, description = "Unknown employee", body = Object, example = json!({
            "error": "Employee 42 not found"
        }))
    ),
    tag = "Vacation"
)]
pub async fn create_vacation_request(
    pool: web::Data<MySqlPool>,
    payload: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    let Some(employee_id) = extract_employee_id(&payload) else {
        return Ok(HttpResponse::BadRequest().json(json!({ "error": "employee_id is required" })));
    };

    let raw_dates = match payload.get("dates").and_then(Value::as_array) {
        Some(dates) if !dates.is_empty() => dates,
        _ => {
            return Ok(
                HttpResponse::BadRequest().json(json!({ "error": "dates array is required" }))
            );
        }
    };

    let entries = match normalize_dates(raw_dates) {
        Ok(entries) => entries,
        Err(message) => {
            return Ok(HttpResponse::BadRequest().json(json!({ "error": message })));
        }
    };

    // Lookup, upsert and re-fetch all run on this one connection; dropping
    // the guard returns it to the pool on every exit path.
    let mut conn = pool.acquire().await.map_err(|e| {
        error!(error = %e, "Failed to acquire database connection");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let known = sqlx::query("SELECT 1 FROM employees WHERE id = ?")
        .bind(employee_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| {
            error!(error = %e, employee_id, "Employee lookup failed");
            ErrorInternalServerError("Internal Server Error")
        })?;
    if known.is_none() {
        return Ok(HttpResponse::NotFound()
            .json(json!({ "error": format!("Employee {employee_id} not found") })));
    }

    let mut qb: QueryBuilder<MySql> =
        QueryBuilder::new("INSERT INTO vacation (employee_id, vacation_date, start_time, end_time) ");
    qb.push_values(entries.iter(), |mut b, (date, (start_time, end_time))| {
        b.push_bind(employee_id)
            .push_bind(*date)
            .push_bind(*start_time)
            .push_bind(*end_time);
    });
    // submitted_at stays untouched on conflict: resubmitting a date keeps
    // the original submission timestamp.
    qb.push(
        " ON DUPLICATE KEY UPDATE \
         vacation_date = VALUES(vacation_date), \
         start_time = VALUES(start_time), \
         end_time = VALUES(end_time)",
    );
    qb.build().execute(&mut *conn).await.map_err(|e| {
        error!(error = %e, employee_id, "Failed to upsert vacation entries");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let placeholders = vec!["?"; entries.len()].join(",");
    let select_sql = format!(
        "{BASE_SELECT} WHERE v.employee_id = ? AND v.vacation_date IN ({placeholders}) \
         ORDER BY v.vacation_date, v.start_time"
    );
    let mut select = sqlx::query_as::<_, VacationRow>(&select_sql).bind(employee_id);
    for date in entries.keys() {
        select = select.bind(*date);
    }
    let rows = select.fetch_all(&mut *conn).await.map_err(|e| {
        error!(error = %e, employee_id, "Failed to re-fetch vacation entries");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let requests: Vec<VacationEntry> = rows.into_iter().map(VacationEntry::from).collect();
    Ok(HttpResponse::Created().json(json!({ "requests": requests })))
}

/// CORS preflight for the POST route; the permissive headers are attached by
/// middleware.
pub async fn preflight() -> impl Responder {
    HttpResponse::NoContent().finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::{Method, StatusCode};
    use actix_web::web::Data;
    use actix_web::App;
    use actix_web::test as actix_test;
    use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn bare_date_gets_default_working_hours() {
        let entries = normalize_dates(&[json!("2024-06-01")]).unwrap();
        assert_eq!(
            entries.get(&date(2024, 6, 1)),
            Some(&(time(9, 0), time(18, 0)))
        );
    }

    #[test]
    fn detailed_date_keeps_explicit_times() {
        let entries = normalize_dates(&[json!({
            "date": "2024-06-02",
            "start_time": "10:00",
            "end_time": "15:30"
        })])
        .unwrap();
        assert_eq!(
            entries.get(&date(2024, 6, 2)),
            Some(&(time(10, 0), time(15, 30)))
        );
    }

    #[test]
    fn duplicate_dates_collapse_to_last_occurrence() {
        let entries = normalize_dates(&[
            json!({ "date": "2024-06-01", "start_time": "08:00", "end_time": "12:00" }),
            json!({ "date": "2024-06-01", "start_time": "13:00", "end_time": "17:00" }),
        ])
        .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(
            entries.get(&date(2024, 6, 1)),
            Some(&(time(13, 0), time(17, 0)))
        );
    }

    #[test]
    fn rejects_non_string_non_object_elements() {
        let err = normalize_dates(&[json!(42)]).unwrap_err();
        assert_eq!(err, "dates must be strings or objects");
    }

    #[test]
    fn rejects_object_without_date() {
        let err =
            normalize_dates(&[json!({ "start_time": "09:00", "end_time": "10:00" })]).unwrap_err();
        assert_eq!(err, "date field is required");
    }

    #[test]
    fn rejects_empty_bare_date_as_missing() {
        let err = normalize_dates(&[json!("")]).unwrap_err();
        assert_eq!(err, "date field is required");
    }

    #[test]
    fn rejects_malformed_date() {
        let err = normalize_dates(&[json!("June 1st")]).unwrap_err();
        assert_eq!(err, "Invalid date format: June 1st");
    }

    #[test]
    fn rejects_malformed_times() {
        let err = normalize_dates(&[json!({
            "date": "2024-06-01",
            "start_time": "9am",
            "end_time": "18:00"
        })])
        .unwrap_err();
        assert_eq!(err, "start_time/end_time must be HH:MM");
    }

    #[test]
    fn object_without_times_is_rejected_not_defaulted() {
        let err = normalize_dates(&[json!({ "date": "2024-06-01" })]).unwrap_err();
        assert_eq!(err, "start_time/end_time must be HH:MM");
    }

    #[test]
    fn rejects_inverted_time_window() {
        let err = normalize_dates(&[json!({
            "date": "2024-06-01",
            "start_time": "14:00",
            "end_time": "10:00"
        })])
        .unwrap_err();
        assert_eq!(err, "start_time must be earlier than end_time");

        let err = normalize_dates(&[json!({
            "date": "2024-06-01",
            "start_time": "10:00",
            "end_time": "10:00"
        })])
        .unwrap_err();
        assert_eq!(err, "start_time must be earlier than end_time");
    }

    #[test]
    fn employee_id_accepts_numbers_and_numeric_strings() {
        assert_eq!(extract_employee_id(&json!({ "employee_id": 7 })), Some(7));
        assert_eq!(extract_employee_id(&json!({ "employee_id": "7" })), Some(7));
        assert_eq!(extract_employee_id(&json!({ "employee_id": "x" })), None);
        assert_eq!(extract_employee_id(&json!({ "employee_id": null })), None);
        assert_eq!(extract_employee_id(&json!({})), None);
    }

    // Routing tests below never reach MySQL: validation rejects first, so a
    // lazily-connecting pool pointed nowhere is enough.
    fn lazy_pool() -> MySqlPool {
        MySqlPoolOptions::new().connect_lazy_with(
            MySqlConnectOptions::new()
                .host("127.0.0.1")
                .port(3306)
                .username("nobody")
                .database("unused"),
        )
    }

    macro_rules! test_app {
        () => {
            actix_test::init_service(
                App::new()
                    .wrap(crate::routes::cors_headers())
                    .app_data(Data::new(lazy_pool()))
                    .configure(crate::routes::configure),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn health_reports_ok_with_cors_headers() {
        let app = test_app!();
        let resp = actix_test::call_service(
            &app,
            actix_test::TestRequest::get().uri("/health").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get("Access-Control-Allow-Origin").unwrap(),
            "*"
        );
        assert_eq!(
            resp.headers().get("Access-Control-Allow-Methods").unwrap(),
            "GET,POST,OPTIONS"
        );
        let body: Value = actix_test::read_body_json(resp).await;
        assert_eq!(body, json!({ "status": "ok" }));
    }

    #[actix_web::test]
    async fn preflight_returns_no_content() {
        let app = test_app!();
        let resp = actix_test::call_service(
            &app,
            actix_test::TestRequest::default()
                .method(Method::OPTIONS)
                .uri("/vacation-requests")
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            resp.headers().get("Access-Control-Allow-Origin").unwrap(),
            "*"
        );
    }

    #[actix_web::test]
    async fn post_without_employee_id_is_bad_request() {
        let app = test_app!();
        let resp = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/vacation-requests")
                .set_json(json!({ "dates": ["2024-06-01"] }))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(resp).await;
        assert_eq!(body["error"], "employee_id is required");
    }

    #[actix_web::test]
    async fn post_with_empty_dates_is_bad_request() {
        let app = test_app!();
        for payload in [json!({ "employee_id": 1 }), json!({ "employee_id": 1, "dates": [] })] {
            let resp = actix_test::call_service(
                &app,
                actix_test::TestRequest::post()
                    .uri("/vacation-requests")
                    .set_json(payload)
                    .to_request(),
            )
            .await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            let body: Value = actix_test::read_body_json(resp).await;
            assert_eq!(body["error"], "dates array is required");
        }
    }

    #[actix_web::test]
    async fn post_with_inverted_times_is_bad_request() {
        let app = test_app!();
        let resp = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/vacation-requests")
                .set_json(json!({
                    "employee_id": 1,
                    "dates": [{ "date": "2024-06-01", "start_time": "14:00", "end_time": "10:00" }]
                }))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(resp).await;
        assert_eq!(body["error"], "start_time must be earlier than end_time");
    }
}
