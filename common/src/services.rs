use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::{GenerationError, StorageError};

/// Servicio externo que convierte un prompt en una imagen (devuelve su URL).
#[async_trait]
pub trait GenerationService: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Descarga/guarda la imagen generada y devuelve la ruta del archivo.
#[async_trait]
pub trait PersistenceService: Send + Sync {
    async fn save(
        &self,
        image_ref: &str,
        name: &str,
        last_name: &str,
    ) -> Result<PathBuf, StorageError>;
}
