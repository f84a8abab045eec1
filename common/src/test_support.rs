// Dobles de prueba para los colaboradores del pipeline.

use std::{
    path::PathBuf,
    sync::atomic::{AtomicUsize, Ordering},
    sync::Arc,
};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::error::{GenerationError, StorageError};
use crate::registry::TaskRegistry;
use crate::row::Row;
use crate::services::{GenerationService, PersistenceService};

pub(crate) fn rows(n: usize) -> Vec<Row> {
    (1..=n)
        .map(|i| Row {
            name: format!("name{i}"),
            last_name: format!("last{i}"),
            job_title: format!("job{i}"),
            hobby: format!("hobby{i}"),
            favorite_food: format!("food{i}"),
        })
        .collect()
}

#[derive(Default)]
pub(crate) struct FakeGenerator {
    fail_on: Option<usize>,
    cancel_on: Option<(TaskRegistry, String, usize)>,
    gate: Option<Arc<Semaphore>>,
    panic_on: Option<usize>,
    calls: AtomicUsize,
}

impl FakeGenerator {
    pub(crate) fn ok() -> Self {
        Self::default()
    }

    /// Falla en la llamada número `n` (desde 1).
    pub(crate) fn failing_on(n: usize) -> Self {
        Self {
            fail_on: Some(n),
            ..Self::default()
        }
    }

    /// Pide la cancelación durante la llamada número `n`.
    pub(crate) fn canceling_on(registry: TaskRegistry, id: &str, n: usize) -> Self {
        Self {
            cancel_on: Some((registry, id.to_string(), n)),
            ..Self::default()
        }
    }

    /// Cada llamada espera un permiso del semáforo.
    pub(crate) fn gated(gate: Arc<Semaphore>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    /// Hace panic en la llamada número `n`.
    pub(crate) fn panicking_on(n: usize) -> Self {
        Self {
            panic_on: Some(n),
            ..Self::default()
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerationService for FakeGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .map_err(|e| GenerationError::Transport(e.to_string()))?
                .forget();
        }

        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some((registry, id, at)) = &self.cancel_on {
            if *at == n {
                let _ = registry.request_cancel(id);
            }
        }

        if self.panic_on == Some(n) {
            panic!("generador roto en la llamada {n}");
        }

        if self.fail_on == Some(n) {
            return Err(GenerationError::Api {
                status: 500,
                body: "boom".to_string(),
            });
        }

        Ok(format!("https://images.test/{n}.png"))
    }
}

#[derive(Default)]
pub(crate) struct FakeSaver {
    fail_on: Option<usize>,
    cancel_after: Option<(TaskRegistry, String, usize)>,
    calls: AtomicUsize,
}

impl FakeSaver {
    pub(crate) fn ok() -> Self {
        Self::default()
    }

    pub(crate) fn failing_on(n: usize) -> Self {
        Self {
            fail_on: Some(n),
            ..Self::default()
        }
    }

    /// Pide la cancelación después de guardar la imagen número `n`.
    pub(crate) fn canceling_after(registry: TaskRegistry, id: &str, n: usize) -> Self {
        Self {
            cancel_after: Some((registry, id.to_string(), n)),
            ..Self::default()
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PersistenceService for FakeSaver {
    async fn save(
        &self,
        _image_ref: &str,
        name: &str,
        last_name: &str,
    ) -> Result<PathBuf, StorageError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

        if self.fail_on == Some(n) {
            return Err(StorageError::DownloadStatus { status: 404 });
        }

        if let Some((registry, id, at)) = &self.cancel_after {
            if *at == n {
                let _ = registry.request_cancel(id);
            }
        }

        Ok(PathBuf::from(format!("{name}_{last_name}.png")))
    }
}
