use anyhow::Result;
use dotenvy::dotenv;
use serde::Deserialize;

const DEFAULT_MAX_FILE_SIZE: usize = 10 * 1024 * 1024; // 10MB
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub max_file_size: usize,
    pub bind_addr: String,
}

impl Config {
    pub fn new() -> Result<Self> {
        // Load .env file first
        dotenv().ok();

        let max_file_size = match std::env::var("MAX_FILE_SIZE") {
            Ok(raw) => raw
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid MAX_FILE_SIZE '{}': {}", raw, e))?,
            Err(_) => DEFAULT_MAX_FILE_SIZE,
        };

        let bind_addr =
            std::env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());

        Ok(Config {
            max_file_size,
            bind_addr,
        })
    }
}
