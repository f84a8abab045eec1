use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::error::RegistryError;
use crate::pipeline::{PipelineOutcome, RowPipeline};
use crate::registry::TaskRegistry;
use crate::row::Row;
use crate::services::{GenerationService, PersistenceService};
use crate::task::{TaskId, TaskState, TaskStatus};

/// Lanza un pipeline por tarea aceptada, cada uno en su propia tarea de tokio.
#[derive(Debug, Clone, Default)]
pub struct TaskSupervisor {
    registry: TaskRegistry,
}

impl TaskSupervisor {
    pub fn new(registry: TaskRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    /// Registra la tarea (Running) y arranca su pipeline en segundo plano.
    /// Debe llamarse dentro de un runtime de tokio.
    pub fn submit(
        &self,
        task_id: impl Into<TaskId>,
        rows: Vec<Row>,
        generator: Arc<dyn GenerationService>,
        persistence: Arc<dyn PersistenceService>,
    ) -> Result<TaskHandle, RegistryError> {
        let task_id = task_id.into();
        self.registry.create(&task_id)?;

        info!("tarea {} aceptada con {} filas", task_id, rows.len());

        let pipeline = RowPipeline::new(
            task_id.clone(),
            self.registry.clone(),
            generator,
            persistence,
        );
        let join = tokio::spawn(async move { pipeline.run(rows).await });

        Ok(TaskHandle {
            id: task_id,
            registry: self.registry.clone(),
            join,
        })
    }
}

/// Referencia a una tarea en curso. status/cancel leen y escriben el registro;
/// wait espera el resultado del pipeline.
#[derive(Debug)]
pub struct TaskHandle {
    id: TaskId,
    registry: TaskRegistry,
    join: JoinHandle<PipelineOutcome>,
}

impl TaskHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn status(&self) -> Result<TaskState, RegistryError> {
        self.registry.get(&self.id)
    }

    pub fn cancel(&self) -> Result<TaskState, RegistryError> {
        self.registry.request_cancel(&self.id)
    }

    /// Espera a que el pipeline termine. Si el pipeline hizo panic, la tarea
    /// queda en Error en el registro y se devuelve un resultado sin imágenes.
    pub async fn wait(self) -> PipelineOutcome {
        match self.join.await {
            Ok(outcome) => outcome,
            Err(e) => {
                let message = format!("pipeline abortado: {e}");
                error!("tarea {}: {}", self.id, message);
                if let Err(e) = self.registry.mark_error(&self.id, &message) {
                    warn!("no se pudo marcar en error la tarea {}: {}", self.id, e);
                }
                PipelineOutcome {
                    status: TaskStatus::Error,
                    artifacts: Vec::new(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{rows, FakeGenerator, FakeSaver};
    use std::time::Duration;
    use tokio::sync::Semaphore;

    async fn wait_for_generated(handle: &TaskHandle, generated: u64) {
        for _ in 0..500 {
            if handle.status().unwrap().generated >= generated {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("la tarea no llegó a {generated} filas");
    }

    #[tokio::test]
    async fn submit_corre_el_pipeline_hasta_done() {
        let sup = TaskSupervisor::new(TaskRegistry::new());
        let handle = sup
            .submit("t", rows(3), Arc::new(FakeGenerator::ok()), Arc::new(FakeSaver::ok()))
            .unwrap();

        assert_eq!(handle.id(), "t");
        let out = handle.wait().await;

        assert_eq!(out.status, TaskStatus::Done);
        assert_eq!(out.artifacts.len(), 3);
        let st = sup.registry().get("t").unwrap();
        assert_eq!((st.status, st.generated, st.total, st.percentage), (TaskStatus::Done, 3, 3, 100));
    }

    #[tokio::test]
    async fn submit_con_id_repetido_falla() {
        let sup = TaskSupervisor::new(TaskRegistry::new());
        let first = sup
            .submit("t", rows(0), Arc::new(FakeGenerator::ok()), Arc::new(FakeSaver::ok()))
            .unwrap();
        first.wait().await;

        let err = sup
            .submit("t", rows(1), Arc::new(FakeGenerator::ok()), Arc::new(FakeSaver::ok()))
            .unwrap_err();
        assert_eq!(err, RegistryError::Duplicate("t".to_string()));
    }

    #[tokio::test]
    async fn cancel_desde_el_handle_detiene_la_tarea() {
        let sup = TaskSupervisor::new(TaskRegistry::new());
        let gate = Arc::new(Semaphore::new(1));
        let handle = sup
            .submit(
                "t",
                rows(3),
                Arc::new(FakeGenerator::gated(gate.clone())),
                Arc::new(FakeSaver::ok()),
            )
            .unwrap();

        // la fila 1 pasa; la fila 2 queda esperando en la generación
        wait_for_generated(&handle, 1).await;
        let st = handle.cancel().unwrap();
        assert_eq!(st.status, TaskStatus::Canceled);

        gate.add_permits(10);
        let out = handle.wait().await;

        assert_eq!(out.status, TaskStatus::Canceled);
        assert_eq!(out.artifacts.len(), 1);
        let st = sup.registry().get("t").unwrap();
        assert_eq!((st.status, st.generated, st.total, st.percentage), (TaskStatus::Canceled, 1, 3, 0));
    }

    #[tokio::test]
    async fn cancel_sobre_tarea_done_es_transicion_invalida() {
        let sup = TaskSupervisor::new(TaskRegistry::new());
        let handle = sup
            .submit("t", rows(2), Arc::new(FakeGenerator::ok()), Arc::new(FakeSaver::ok()))
            .unwrap();

        // esperamos a que cierre antes de cancelar
        for _ in 0..500 {
            if handle.status().unwrap().status == TaskStatus::Done {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        assert!(matches!(
            handle.cancel(),
            Err(RegistryError::InvalidTransition { status: TaskStatus::Done, .. })
        ));
        assert_eq!(handle.wait().await.status, TaskStatus::Done);
    }

    #[tokio::test]
    async fn error_de_colaborador_no_escapa_del_handle() {
        let sup = TaskSupervisor::new(TaskRegistry::new());
        let handle = sup
            .submit(
                "t",
                rows(3),
                Arc::new(FakeGenerator::failing_on(2)),
                Arc::new(FakeSaver::ok()),
            )
            .unwrap();

        let out = handle.wait().await;
        assert_eq!(out.status, TaskStatus::Error);
        assert_eq!(out.artifacts.len(), 1);

        let st = sup.registry().get("t").unwrap();
        assert_eq!(st.status, TaskStatus::Error);
        assert!(st.error_message.is_some());
    }

    #[tokio::test]
    async fn panic_del_pipeline_deja_la_tarea_en_error() {
        let sup = TaskSupervisor::new(TaskRegistry::new());
        let handle = sup
            .submit(
                "t",
                rows(3),
                Arc::new(FakeGenerator::panicking_on(2)),
                Arc::new(FakeSaver::ok()),
            )
            .unwrap();

        let out = handle.wait().await;
        assert_eq!(out.status, TaskStatus::Error);
        assert!(out.artifacts.is_empty());

        let st = sup.registry().get("t").unwrap();
        assert_eq!((st.status, st.generated, st.total, st.percentage), (TaskStatus::Error, 1, 3, 0));
        assert!(st.error_message.unwrap().contains("pipeline abortado"));
    }

    #[tokio::test]
    async fn panic_con_la_tarea_ya_cerrada_no_pisa_el_estado() {
        let registry = TaskRegistry::new();
        registry.create("t").unwrap();
        registry.update("t", 0, 0, TaskStatus::Done).unwrap();

        // el pipeline de un id ya cerrado hace panic; wait no debe cambiar nada
        let handle = TaskHandle {
            id: "t".to_string(),
            registry: registry.clone(),
            join: tokio::spawn(async { panic!("después del cierre") }),
        };

        let out = handle.wait().await;
        assert_eq!(out.status, TaskStatus::Error);
        assert_eq!(registry.get("t").unwrap().status, TaskStatus::Done);
    }
}
