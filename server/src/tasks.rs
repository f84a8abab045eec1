use std::path::PathBuf;

use common::TaskHandle;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::archive::{write_zip, ARCHIVE_NAME};
use crate::state::{AppState, TaskOutput};

/// Espera a que termine el pipeline de la tarea y empaqueta lo que haya
/// generado (todo o parcial) en un zip dentro de su directorio de salida.
///
/// No toca el registro: el estado final ya lo dejó el pipeline.
pub fn spawn_archiver(state: AppState, handle: TaskHandle, output_dir: PathBuf) -> JoinHandle<()> {
    tokio::spawn(async move {
        let task_id = handle.id().to_string();
        let outcome = handle.wait().await;

        info!(
            "tarea {} terminó en {} con {} imágenes, empaquetando",
            task_id,
            outcome.status,
            outcome.artifacts.len()
        );

        let zip_path = output_dir.join(ARCHIVE_NAME);
        let archive = {
            let files = outcome.artifacts.clone();
            let dest = zip_path.clone();
            match tokio::task::spawn_blocking(move || write_zip(&dest, &files)).await {
                Ok(Ok(())) => Some(zip_path),
                Ok(Err(e)) => {
                    warn!("no se pudo escribir el zip de la tarea {}: {}", task_id, e);
                    None
                }
                Err(e) => {
                    warn!("panic o join error escribiendo zip de la tarea {}: {:?}", task_id, e);
                    None
                }
            }
        };

        state.record_output(
            &task_id,
            TaskOutput {
                output_dir,
                files: outcome.artifacts,
                archive,
            },
        );
    })
}
