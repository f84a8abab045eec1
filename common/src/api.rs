// Cuerpos JSON que intercambian server y client.

use serde::{Deserialize, Serialize};

use crate::task::{TaskId, TaskState, TaskStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub task_id: TaskId,
    pub total: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelResponse {
    pub task_id: TaskId,
    pub status: TaskStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSummary {
    pub task_id: TaskId,
    #[serde(flatten)]
    pub state: TaskState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResults {
    pub task_id: TaskId,
    /// Directorio donde quedaron las imágenes de esta tarea
    pub output_dir: String,
    /// Nombres de archivo de las imágenes guardadas, en orden de fila
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
