use std::path::{Path, PathBuf};

use async_trait::async_trait;
use common::{PersistenceService, StorageError};
use reqwest::Client;
use tracing::debug;

/// Descarga las imágenes generadas y las guarda en un directorio.
pub struct ImageSaver {
    client: Client,
    output_dir: PathBuf,
}

impl ImageSaver {
    /// El directorio de salida se crea recién al guardar la primera imagen.
    pub fn new(client: Client, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

/// Deja sólo caracteres seguros para un nombre de archivo.
fn sanitize(part: &str) -> String {
    let cleaned: String = part
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() {
        "anon".to_string()
    } else {
        cleaned
    }
}

#[async_trait]
impl PersistenceService for ImageSaver {
    async fn save(
        &self,
        image_ref: &str,
        name: &str,
        last_name: &str,
    ) -> Result<PathBuf, StorageError> {
        let response = self
            .client
            .get(image_ref)
            .send()
            .await
            .map_err(|e| StorageError::Download(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StorageError::DownloadStatus {
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| StorageError::Download(e.to_string()))?;

        let file_name = format!(
            "{}_{}_{}.png",
            sanitize(name),
            sanitize(last_name),
            uuid::Uuid::new_v4()
        );
        tokio::fs::create_dir_all(&self.output_dir).await?;
        let path = self.output_dir.join(file_name);
        tokio::fs::write(&path, &bytes).await?;

        debug!("imagen guardada en {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }
}
