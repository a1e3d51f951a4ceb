use std::env;

use crate::utils::fare::FareRates;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub server_host: String,
    pub server_port: u16,
    pub app_env: String,
    pub fare_rates: FareRates,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            database_url: env::var("DATABASE_URL")
                .expect("DATABASE_URL must be set"),
            jwt_secret: env::var("JWT_SECRET")
                .expect("JWT_SECRET must be set"),
            jwt_expiration_hours: env::var("JWT_EXPIRATION_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse()
                .expect("JWT_EXPIRATION_HOURS must be a number"),
            server_host: env::var("SERVER_HOST")
                .unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .expect("SERVER_PORT must be a number"),
            app_env: env::var("APP_ENV")
                .unwrap_or_else(|_| "development".to_string()),
            fare_rates: FareRates {
                base: parse_rate("FARE_BASE", "2.50"),
                per_km: parse_rate("FARE_PER_KM", "1.20"),
                per_minute: parse_rate("FARE_PER_MINUTE", "0.35"),
                tax_rate: parse_rate("FARE_TAX_RATE", "0.10"),
                avg_speed_kmh: parse_rate("FARE_AVG_SPEED_KMH", "40"),
            },
        }
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    pub fn is_production(&self) -> bool {
        self.app_env == "production"
    }
}

fn parse_rate(key: &str, default: &str) -> f64 {
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .unwrap_or_else(|_| panic!("{} must be a number", key))
}
