// Colaboradores falsos para los tests del server: generan al instante y
// escriben archivos chicos en disco.

use std::{
    env, fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use common::{GenerationError, GenerationService, PersistenceService, StorageError};

use crate::config::ServerConfig;
use crate::state::{AppState, Collaborators};

pub(crate) struct InstantGenerator;

#[async_trait]
impl GenerationService for InstantGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        Ok(format!("mem://{}", prompt.len()))
    }
}

pub(crate) struct DiskSaver {
    pub(crate) dir: PathBuf,
}

#[async_trait]
impl PersistenceService for DiskSaver {
    async fn save(
        &self,
        _image_ref: &str,
        name: &str,
        last_name: &str,
    ) -> Result<PathBuf, StorageError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(format!("{name}_{last_name}.png"));
        tokio::fs::write(&path, b"png").await?;
        Ok(path)
    }
}

pub(crate) struct FakeCollaborators;

impl Collaborators for FakeCollaborators {
    fn generator(&self, _api_key: &str) -> Result<Arc<dyn GenerationService>, GenerationError> {
        Ok(Arc::new(InstantGenerator))
    }

    fn persistence(&self, output_dir: &Path) -> Arc<dyn PersistenceService> {
        Arc::new(DiskSaver {
            dir: output_dir.to_path_buf(),
        })
    }
}

/// Estado con salida en un directorio temporal propio de cada test.
pub(crate) fn test_state(sub: &str, api_key: Option<&str>) -> AppState {
    let root = env::temp_dir().join("server_handler_tests").join(sub);
    let _ = fs::remove_dir_all(&root);

    let mut config = ServerConfig::from_lookup(|_| None).unwrap();
    config.output_root = root;
    config.api_key = api_key.map(str::to_string);

    AppState::new(Arc::new(config), Arc::new(FakeCollaborators))
}
