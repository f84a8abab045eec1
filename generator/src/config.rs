use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1/images/generations";
pub const DEFAULT_IMAGE_SIZE: &str = "1024x1024";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Parámetros del cliente de la API de imágenes.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub api_key: String,
    pub api_url: String,
    /// Tamaño pedido a la API, ej: "1024x1024"
    pub size: String,
    /// Tope por request (generación y descarga)
    pub timeout: Duration,
}

impl GeneratorConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_url: DEFAULT_API_URL.to_string(),
            size: DEFAULT_IMAGE_SIZE.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}
