use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use sqlx::prelude::FromRow;
use utoipa::ToSchema;

/// Raw row from the vacation/employees join. The TIME columns are selected
/// as seconds since midnight (`CAST(TIME_TO_SEC(..) AS SIGNED)`) because
/// MySQL TIME is a duration and can exceed 24 hours.
#[derive(Debug, FromRow)]
pub struct VacationRow {
    pub employee_id: i64,
    pub employee_name: String,
    pub vacation_date: NaiveDate,
    pub start_secs: i64,
    pub end_secs: i64,
    pub submitted_at: NaiveDateTime,
}

#[derive(Debug, Serialize, ToSchema)]
#[schema(example = json!({
    "employee_id": 1,
    "employee_name": "Alice",
    "vacation_date": "2024-06-01",
    "start_time": "09:00",
    "end_time": "18:00",
    "submitted_at": "2024-05-20T12:34:56"
}))]
pub struct VacationEntry {
    #[schema(example = 1)]
    pub employee_id: i64,
    #[schema(example = "Alice")]
    pub employee_name: String,
    #[schema(example = "2024-06-01", format = "date")]
    pub vacation_date: String,
    #[schema(example = "09:00")]
    pub start_time: String,
    #[schema(example = "18:00")]
    pub end_time: String,
    #[schema(example = "2024-05-20T12:34:56", format = "date-time")]
    pub submitted_at: String,
}

impl From<VacationRow> for VacationEntry {
    fn from(row: VacationRow) -> Self {
        Self {
            employee_id: row.employee_id,
            employee_name: row.employee_name,
            vacation_date: row.vacation_date.format("%Y-%m-%d").to_string(),
            start_time: hhmm_from_secs(row.start_secs),
            end_time: hhmm_from_secs(row.end_secs),
            submitted_at: row.submitted_at.format("%Y-%m-%dT%H:%M:%S").to_string(),
        }
    }
}

/// Zero-padded 24-hour `HH:MM`, wrapping at 24 hours.
pub fn hhmm_from_secs(total_secs: i64) -> String {
    let total_minutes = total_secs.div_euclid(60);
    let hours = total_minutes.div_euclid(60).rem_euclid(24);
    let minutes = total_minutes.rem_euclid(60);
    format!("{hours:02}:{minutes:02}")
}
