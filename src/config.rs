use dotenvy::dotenv;
use std::env;

#[derive(Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub pool_name: String,
    pub pool_size: u32,

    pub server_addr: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        Self {
            host: env::var("MYSQL_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("MYSQL_PORT")
                .unwrap_or_else(|_| "3306".to_string())
                .parse()
                .unwrap(),
            user: env::var("MYSQL_USER").unwrap_or_else(|_| "spxeas".to_string()),
            password: env::var("MYSQL_PASSWORD").unwrap_or_else(|_| "123456".to_string()),
            database: env::var("MYSQL_DATABASE").unwrap_or_else(|_| "vacation".to_string()),
            pool_name: env::var("MYSQL_POOL_NAME")
                .unwrap_or_else(|_| "vacation_app_pool".to_string()),
            pool_size: env::var("MYSQL_POOL_SIZE")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .unwrap(),

            server_addr: env::var("SERVER_ADDR").unwrap_or_else(|_| "127.0.0.1:5000".to_string()),
        }
    }
}
