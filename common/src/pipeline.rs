// common/src/pipeline.rs

use std::{path::PathBuf, sync::Arc};

use tracing::{debug, error, info, warn};

use crate::prompt::build_prompt;
use crate::registry::TaskRegistry;
use crate::row::Row;
use crate::services::{GenerationService, PersistenceService};
use crate::task::{TaskId, TaskStatus};

/// Puntos de cada fila donde el pipeline relee el estado de la tarea.
///
/// Los dos últimos rodean a las llamadas de red: una cancelación espera como
/// mucho lo que tarde una llamada al colaborador en curso.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Checkpoint {
    BeforeRow,
    BeforeGeneration,
    BeforePersistence,
}

/// Resultado de correr el pipeline: estado final y las imágenes guardadas
/// hasta ese momento (completas o parciales).
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutcome {
    pub status: TaskStatus,
    pub artifacts: Vec<PathBuf>,
}

/// Procesa las filas de una tarea en orden, una por una.
pub struct RowPipeline {
    task_id: TaskId,
    registry: TaskRegistry,
    generator: Arc<dyn GenerationService>,
    persistence: Arc<dyn PersistenceService>,
}

impl RowPipeline {
    pub fn new(
        task_id: impl Into<TaskId>,
        registry: TaskRegistry,
        generator: Arc<dyn GenerationService>,
        persistence: Arc<dyn PersistenceService>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            registry,
            generator,
            persistence,
        }
    }

    pub async fn run(&self, rows: Vec<Row>) -> PipelineOutcome {
        let total = rows.len() as u64;

        if let Err(e) = self.registry.set_totals(&self.task_id, total) {
            warn!("no se pudo registrar el total de la tarea {}: {}", self.task_id, e);
        }
        info!("tarea {} arrancando con {} filas", self.task_id, total);

        let mut artifacts: Vec<PathBuf> = Vec::with_capacity(rows.len());

        for (idx, row) in rows.iter().enumerate() {
            let index = idx as u64 + 1;

            if self.canceled_at(Checkpoint::BeforeRow, index) {
                return self.finish_canceled(artifacts, total);
            }

            let prompt = build_prompt(row);

            if self.canceled_at(Checkpoint::BeforeGeneration, index) {
                return self.finish_canceled(artifacts, total);
            }

            let image_ref = match self.generator.generate(&prompt).await {
                Ok(image_ref) => image_ref,
                Err(e) => return self.finish_error(artifacts, index, &e.to_string()),
            };

            if self.canceled_at(Checkpoint::BeforePersistence, index) {
                return self.finish_canceled(artifacts, total);
            }

            let saved = match self
                .persistence
                .save(&image_ref, &row.name, &row.last_name)
                .await
            {
                Ok(path) => path,
                Err(e) => return self.finish_error(artifacts, index, &e.to_string()),
            };

            debug!(
                "tarea {}: fila {}/{} guardada en {}",
                self.task_id,
                index,
                total,
                saved.display()
            );
            artifacts.push(saved);

            // si quedó Canceled lo vemos en el próximo checkpoint
            if let Err(e) = self
                .registry
                .update(&self.task_id, index, total, TaskStatus::Running)
            {
                warn!("no se pudo actualizar progreso de la tarea {}: {}", self.task_id, e);
            }
        }

        match self
            .registry
            .update(&self.task_id, total, total, TaskStatus::Done)
        {
            // la cancelación llegó después del último checkpoint
            Ok(TaskStatus::Canceled) => return self.finish_canceled(artifacts, total),
            Ok(_) => {}
            Err(e) => warn!("no se pudo cerrar la tarea {}: {}", self.task_id, e),
        }

        info!(
            "tarea {} completada: {}/{} imágenes generadas",
            self.task_id, total, total
        );
        PipelineOutcome {
            status: TaskStatus::Done,
            artifacts,
        }
    }

    fn canceled_at(&self, checkpoint: Checkpoint, index: u64) -> bool {
        let canceled = self.registry.is_canceled(&self.task_id);
        if canceled {
            debug!(
                "tarea {}: cancelación vista en {:?} de la fila {}",
                self.task_id, checkpoint, index
            );
        }
        canceled
    }

    fn finish_canceled(&self, artifacts: Vec<PathBuf>, total: u64) -> PipelineOutcome {
        let generated = artifacts.len() as u64;

        if let Err(e) = self
            .registry
            .update(&self.task_id, generated, total, TaskStatus::Canceled)
        {
            warn!("no se pudo marcar la tarea {} como cancelada: {}", self.task_id, e);
        }
        info!(
            "tarea {} cancelada con {}/{} imágenes generadas",
            self.task_id, generated, total
        );

        PipelineOutcome {
            status: TaskStatus::Canceled,
            artifacts,
        }
    }

    fn finish_error(&self, artifacts: Vec<PathBuf>, index: u64, message: &str) -> PipelineOutcome {
        error!(
            "tarea {} falló en la fila {}: {}",
            self.task_id, index, message
        );

        // generated/total ya quedaron en el registro tras la última fila completa
        if let Err(e) = self.registry.mark_error(&self.task_id, message) {
            warn!("no se pudo marcar la tarea {} con error: {}", self.task_id, e);
        }

        PipelineOutcome {
            status: TaskStatus::Error,
            artifacts,
        }
    }
}
