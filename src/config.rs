use std::env;

use anyhow::{anyhow, bail, Context, Result};

const DEFAULT_DATABASE_URL: &str = "mysql://localhost/local_food_api";
const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_POOL_SIZE: u32 = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Mysql,
    Memory,
}

/// Application configuration, read from the environment (and `.env`).
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub listen_addr: String,
    pub pool_size: u32,
    pub backend: StoreBackend,
    pub seed_sample_data: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());
        let listen_addr = lookup("LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());

        let pool_size = match lookup("DATABASE_POOL_SIZE") {
            Some(raw) => raw
                .parse::<u32>()
                .with_context(|| format!("parse DATABASE_POOL_SIZE {:?}", raw))?,
            None => DEFAULT_POOL_SIZE,
        };
        if pool_size == 0 {
            bail!("DATABASE_POOL_SIZE must be greater than zero");
        }

        let backend = match lookup("STORE_BACKEND").as_deref() {
            None | Some("mysql") => StoreBackend::Mysql,
            Some("memory") => StoreBackend::Memory,
            Some(other) => bail!("unknown STORE_BACKEND {:?}, expected mysql or memory", other),
        };

        let seed_sample_data = match lookup("SEED_SAMPLE_DATA") {
            Some(raw) => parse_bool(&raw)
                .ok_or_else(|| anyhow!("parse SEED_SAMPLE_DATA {:?}", raw))?,
            None => true,
        };

        Ok(AppConfig {
            database_url,
            listen_addr,
            pool_size,
            backend,
            seed_sample_data,
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
