use async_trait::async_trait;
use common::{GenerationError, GenerationService};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::GeneratorConfig;

/// Cliente de la API de generación de imágenes (formato OpenAI).
pub struct OpenAiGenerator {
    client: Client,
    config: GeneratorConfig,
}

#[derive(Debug, Serialize)]
struct ImageRequest<'a> {
    prompt: &'a str,
    n: u32,
    size: &'a str,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    #[serde(default)]
    data: Option<Vec<ImageData>>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    #[serde(default)]
    url: Option<String>,
}

/// Cliente HTTP compartible con el timeout configurado.
pub fn build_http_client(config: &GeneratorConfig) -> Result<Client, reqwest::Error> {
    Client::builder().timeout(config.timeout).build()
}

impl OpenAiGenerator {
    pub fn new(config: GeneratorConfig) -> Result<Self, GenerationError> {
        let client =
            build_http_client(&config).map_err(|e| GenerationError::Transport(e.to_string()))?;
        Ok(Self { client, config })
    }

    /// Reusa un cliente existente (pool de conexiones compartido).
    pub fn with_client(client: Client, config: GeneratorConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl GenerationService for OpenAiGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        debug!("POST {} con prompt: {}", self.config.api_url, prompt);

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&ImageRequest {
                prompt,
                n: 1,
                size: &self.config.size,
            })
            .send()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("la API de imágenes devolvió {}: {}", status, body);
            return Err(GenerationError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ImageResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;

        let first = match parsed.data {
            Some(data) if !data.is_empty() => data.into_iter().next(),
            _ => {
                return Err(GenerationError::MalformedResponse(
                    "sin campo 'data' o 'data' vacío".to_string(),
                ))
            }
        };

        let url = first
            .and_then(|d| d.url)
            .filter(|u| !u.is_empty())
            .ok_or(GenerationError::MissingResult)?;

        info!("imagen generada: {}", url);
        Ok(url)
    }
}
