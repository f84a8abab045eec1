// common/src/registry.rs

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use chrono::Utc;
use tracing::debug;

use crate::error::RegistryError;
use crate::task::{percentage, TaskId, TaskState, TaskStatus};

#[derive(Debug, Clone)]
struct Entry {
    state: TaskState,
    // el pipeline ya hizo su escritura de salida; nada más cambia
    finished: bool,
}

/// Registro compartido de tareas: id -> estado.
///
/// Todas las operaciones pasan por un único Mutex, así que ningún lector ve
/// un estado a medio actualizar. Se clona barato (Arc) y se comparte entre
/// los pipelines y los handlers HTTP.
#[derive(Debug, Clone, Default)]
pub struct TaskRegistry {
    tasks: Arc<Mutex<HashMap<TaskId, Entry>>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<TaskId, Entry>> {
        // un panic con el lock tomado no deja el mapa a medias: cada
        // operación escribe la entrada completa antes de soltarlo
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Crea la entrada en Running con contadores en cero.
    pub fn create(&self, id: &str) -> Result<TaskState, RegistryError> {
        let mut tasks = self.lock();
        if tasks.contains_key(id) {
            return Err(RegistryError::Duplicate(id.to_string()));
        }

        let state = TaskState::new();
        tasks.insert(
            id.to_string(),
            Entry {
                state: state.clone(),
                finished: false,
            },
        );
        debug!("tarea {} registrada", id);
        Ok(state)
    }

    /// Registra el total de filas una vez cargado el dataset.
    pub fn set_totals(&self, id: &str, total: u64) -> Result<(), RegistryError> {
        let mut tasks = self.lock();
        let entry = tasks
            .get_mut(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;

        entry.state.total = total;
        entry.state.percentage =
            percentage(entry.state.generated, total, entry.state.status);
        Ok(())
    }

    /// Guarda generated/total/status y recalcula el porcentaje.
    ///
    /// Devuelve el estado que quedó guardado: si hay una cancelación pedida,
    /// una escritura Running o Done conserva Canceled y el llamador debe
    /// tratarla como cancelación.
    pub fn update(
        &self,
        id: &str,
        generated: u64,
        total: u64,
        status: TaskStatus,
    ) -> Result<TaskStatus, RegistryError> {
        let mut tasks = self.lock();
        let entry = tasks
            .get_mut(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;

        if entry.finished {
            return Err(RegistryError::InvalidTransition {
                id: id.to_string(),
                status: entry.state.status,
            });
        }

        let stored = match (entry.state.status, status) {
            (TaskStatus::Canceled, TaskStatus::Running | TaskStatus::Done) => TaskStatus::Canceled,
            (_, requested) => requested,
        };

        entry.state.generated = generated;
        entry.state.total = total;
        entry.state.status = stored;
        entry.state.percentage = percentage(generated, total, stored);

        if status.is_terminal() && stored == status {
            entry.finished = true;
            entry.state.finished_at = Some(Utc::now());
        }

        Ok(stored)
    }

    /// Marca la tarea como Error; generated/total quedan como estaban.
    pub fn mark_error(&self, id: &str, message: &str) -> Result<(), RegistryError> {
        let mut tasks = self.lock();
        let entry = tasks
            .get_mut(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;

        if entry.finished {
            return Err(RegistryError::InvalidTransition {
                id: id.to_string(),
                status: entry.state.status,
            });
        }

        entry.state.status = TaskStatus::Error;
        entry.state.percentage = 0;
        entry.state.error_message = Some(message.to_string());
        entry.state.finished_at = Some(Utc::now());
        entry.finished = true;
        Ok(())
    }

    /// Pide la cancelación. Sólo vale mientras la tarea está en Running; el
    /// pipeline la ve en su próximo checkpoint.
    pub fn request_cancel(&self, id: &str) -> Result<TaskState, RegistryError> {
        let mut tasks = self.lock();
        let entry = tasks
            .get_mut(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;

        if entry.state.status != TaskStatus::Running {
            return Err(RegistryError::InvalidTransition {
                id: id.to_string(),
                status: entry.state.status,
            });
        }

        entry.state.status = TaskStatus::Canceled;
        entry.state.percentage = 0;
        debug!("cancelación pedida para tarea {}", id);
        Ok(entry.state.clone())
    }

    pub fn get(&self, id: &str) -> Result<TaskState, RegistryError> {
        self.lock()
            .get(id)
            .map(|entry| entry.state.clone())
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }

    /// Checkpoint: ¿alguien pidió cancelar? Ids desconocidos cuentan como no.
    pub fn is_canceled(&self, id: &str) -> bool {
        self.lock()
            .get(id)
            .map(|entry| entry.state.status == TaskStatus::Canceled)
            .unwrap_or(false)
    }

    /// Snapshot de todas las tareas, de la más vieja a la más nueva.
    pub fn list(&self) -> Vec<(TaskId, TaskState)> {
        let mut out: Vec<(TaskId, TaskState)> = self
            .lock()
            .iter()
            .map(|(id, entry)| (id.clone(), entry.state.clone()))
            .collect();
        out.sort_by(|a, b| a.1.created_at.cmp(&b.1.created_at).then_with(|| a.0.cmp(&b.0)));
        out
    }
}
