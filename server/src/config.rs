use std::{env, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use generator::config::{DEFAULT_API_URL, DEFAULT_IMAGE_SIZE, DEFAULT_TIMEOUT_SECS};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_OUTPUT_ROOT: &str = "/data/output";

/// Configuración del server, leída de variables de entorno (y de .env).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// Cada tarea escribe en {output_root}/{task_id}
    pub output_root: PathBuf,
    /// API key por defecto; el header x-api-key la reemplaza por request
    pub api_key: Option<String>,
    pub api_url: String,
    pub image_size: String,
    pub request_timeout: Duration,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let request_timeout_secs = match get("REQUEST_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("REQUEST_TIMEOUT_SECS inválido: {raw}"))?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            output_root: get("OUTPUT_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_ROOT)),
            api_key: get("OPENAI_API_KEY"),
            api_url: get("OPENAI_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            image_size: get("IMAGE_SIZE").unwrap_or_else(|| DEFAULT_IMAGE_SIZE.to_string()),
            request_timeout: Duration::from_secs(request_timeout_secs),
        })
    }
}
