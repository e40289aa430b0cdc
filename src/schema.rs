use sqlx::mysql::{MySqlDatabaseError, MySqlPool};
use sqlx::QueryBuilder;
use tracing::info;

use crate::config::Config;
use crate::db;

const EMPLOYEE_FIXTURES: [(i64, &str); 10] = [
    (1, "Alice"),
    (2, "Bob"),
    (3, "Charlie"),
    (4, "Diana"),
    (5, "Ethan"),
    (6, "Fiona"),
    (7, "George"),
    (8, "Hannah"),
    (9, "Ivan"),
    (10, "Judy"),
];

/// MySQL ER_BAD_DB_ERROR: the configured database does not exist yet.
fn is_unknown_database(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|e| e.try_downcast_ref::<MySqlDatabaseError>())
        .map(|e| e.number() == 1049)
        .unwrap_or(false)
}

async fn create_database_if_missing(config: &Config) -> Result<(), sqlx::Error> {
    let mut conn = db::connect_server(config).await?;
    sqlx::query(&format!(
        "CREATE DATABASE IF NOT EXISTS `{}`",
        config.database
    ))
    .execute(&mut conn)
    .await?;
    Ok(())
}

async fn column_exists(pool: &MySqlPool, column: &str) -> Result<bool, sqlx::Error> {
    // SHOW ... LIKE does not take placeholders; column names here are fixed.
    let row = sqlx::query(&format!("SHOW COLUMNS FROM vacation LIKE '{column}'"))
        .fetch_optional(pool)
        .await?;
    Ok(row.is_some())
}

/// Idempotent schema migration. Safe to run on every process start, including
/// against a database created by an older version of the schema.
pub async fn ensure_schema(pool: &MySqlPool, config: &Config) -> Result<(), sqlx::Error> {
    if let Err(err) = sqlx::query("SELECT 1").execute(pool).await {
        if is_unknown_database(&err) {
            create_database_if_missing(config).await?;
        } else {
            return Err(err);
        }
    }

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS employees (
            id INT PRIMARY KEY,
            name VARCHAR(100) NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Legacy table replaced by `vacation`; drop it wherever it still exists.
    sqlx::query("DROP TABLE IF EXISTS vacation_requests")
        .execute(pool)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS vacation (
            employee_id INT NOT NULL,
            vacation_date DATE NOT NULL,
            start_time TIME NOT NULL DEFAULT '09:00:00',
            end_time TIME NOT NULL DEFAULT '18:00:00',
            submitted_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (employee_id, vacation_date),
            CONSTRAINT fk_vacation_employee FOREIGN KEY (employee_id)
                REFERENCES employees (id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Pre-existing `vacation` tables may predate the time columns; add only
    // what is missing, keeping the column order stable.
    let has_start_time = column_exists(pool, "start_time").await?;
    let has_end_time = column_exists(pool, "end_time").await?;
    let has_submitted_at = column_exists(pool, "submitted_at").await?;

    let mut alter_clauses: Vec<String> = Vec::new();
    if !has_start_time {
        alter_clauses.push(
            "ADD COLUMN start_time TIME NOT NULL DEFAULT '09:00:00' AFTER vacation_date"
                .to_string(),
        );
    }
    if !has_end_time {
        let position = if !has_start_time {
            "AFTER start_time"
        } else {
            "AFTER vacation_date"
        };
        alter_clauses.push(format!(
            "ADD COLUMN end_time TIME NOT NULL DEFAULT '18:00:00' {position}"
        ));
    }
    if !has_submitted_at {
        alter_clauses.push(
            "ADD COLUMN submitted_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP AFTER end_time"
                .to_string(),
        );
    }

    if !alter_clauses.is_empty() {
        sqlx::query(&format!("ALTER TABLE vacation {}", alter_clauses.join(", ")))
            .execute(pool)
            .await?;
    }

    Ok(())
}

/// Inserts the fixture employees, but only into an empty table.
pub async fn seed_sample_data(pool: &MySqlPool) -> Result<(), sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM employees")
        .fetch_one(pool)
        .await?;
    if count == 0 {
        let mut qb: QueryBuilder<sqlx::MySql> = QueryBuilder::new("INSERT INTO employees (id, name) ");
        qb.push_values(EMPLOYEE_FIXTURES, |mut b, (id, name)| {
            b.push_bind(id).push_bind(name);
        });
        qb.build().execute(pool).await?;
        info!(rows = EMPLOYEE_FIXTURES.len(), "Seeded employee fixtures");
    }
    Ok(())
}

pub async fn bootstrap(pool: &MySqlPool, config: &Config) -> anyhow::Result<()> {
    ensure_schema(pool, config).await?;
    seed_sample_data(pool).await?;
    Ok(())
}
