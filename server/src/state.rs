// server/src/state.rs

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use common::{
    GenerationError, GenerationService, PersistenceService, TaskId, TaskRegistry,
    TaskSupervisor,
};
use generator::{build_http_client, GeneratorConfig, ImageSaver, OpenAiGenerator};

use crate::config::ServerConfig;

/// Arma los colaboradores de cada tarea (generación con la API key del
/// request, guardado en el directorio de la tarea).
pub trait Collaborators: Send + Sync {
    fn generator(&self, api_key: &str) -> Result<Arc<dyn GenerationService>, GenerationError>;
    fn persistence(&self, output_dir: &Path) -> Arc<dyn PersistenceService>;
}

/// Colaboradores reales: API de imágenes por HTTP + descarga a disco.
pub struct HttpCollaborators {
    client: reqwest::Client,
    config: Arc<ServerConfig>,
}

impl HttpCollaborators {
    pub fn new(config: Arc<ServerConfig>) -> Result<Self, reqwest::Error> {
        let client = build_http_client(&Self::generator_config(&config, ""))?;
        Ok(Self { client, config })
    }

    fn generator_config(config: &ServerConfig, api_key: &str) -> GeneratorConfig {
        GeneratorConfig {
            api_key: api_key.to_string(),
            api_url: config.api_url.clone(),
            size: config.image_size.clone(),
            timeout: config.request_timeout,
        }
    }
}

impl Collaborators for HttpCollaborators {
    fn generator(&self, api_key: &str) -> Result<Arc<dyn GenerationService>, GenerationError> {
        Ok(Arc::new(OpenAiGenerator::with_client(
            self.client.clone(),
            Self::generator_config(&self.config, api_key),
        )))
    }

    fn persistence(&self, output_dir: &Path) -> Arc<dyn PersistenceService> {
        Arc::new(ImageSaver::new(self.client.clone(), output_dir))
    }
}

/// Lo que queda de una tarea cuando su pipeline terminó.
#[derive(Debug, Clone)]
pub struct TaskOutput {
    pub output_dir: PathBuf,
    pub files: Vec<PathBuf>,
    /// None si el zip no se pudo escribir
    pub archive: Option<PathBuf>,
}

#[derive(Clone)]
pub struct AppState {
    pub supervisor: TaskSupervisor,
    pub config: Arc<ServerConfig>,
    pub collaborators: Arc<dyn Collaborators>,
    // resultados de tareas terminadas, para /results y /archive
    pub outputs: Arc<Mutex<HashMap<TaskId, TaskOutput>>>,
}

impl AppState {
    pub fn new(config: Arc<ServerConfig>, collaborators: Arc<dyn Collaborators>) -> Self {
        Self {
            supervisor: TaskSupervisor::new(TaskRegistry::new()),
            config,
            collaborators,
            outputs: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn registry(&self) -> &TaskRegistry {
        self.supervisor.registry()
    }

    pub fn outputs(&self) -> MutexGuard<'_, HashMap<TaskId, TaskOutput>> {
        self.outputs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn record_output(&self, task_id: &str, output: TaskOutput) {
        self.outputs().insert(task_id.to_string(), output);
    }
}
