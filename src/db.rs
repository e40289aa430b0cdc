use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlPool, MySqlPoolOptions};
use sqlx::Connection;

use crate::config::Config;

fn connect_options(config: &Config) -> MySqlConnectOptions {
    MySqlConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.user)
        .password(&config.password)
}

/// Pool with the target database selected. Connections are opened lazily so
/// the server can start even while MySQL is down; requests fail individually
/// until it comes back.
pub fn init_db(config: &Config) -> MySqlPool {
    MySqlPoolOptions::new()
        .max_connections(config.pool_size)
        .connect_lazy_with(connect_options(config).database(&config.database))
}

/// One-off connection without a database selected, for the
/// CREATE DATABASE fallback in the schema manager.
pub async fn connect_server(config: &Config) -> Result<MySqlConnection, sqlx::Error> {
    MySqlConnection::connect_with(&connect_options(config)).await
}
