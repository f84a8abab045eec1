use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type TaskId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Running,
    Done,
    Canceled,
    Error,
}

impl TaskStatus {
    /// Cualquier estado distinto de Running ya no avanza más filas.
    pub fn is_terminal(self) -> bool {
        !matches!(self, TaskStatus::Running)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TaskStatus::Running => "running",
            TaskStatus::Done => "done",
            TaskStatus::Canceled => "canceled",
            TaskStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// Estado visible de una tarea (lo que devuelve el endpoint de status).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskState {
    pub status: TaskStatus,
    pub generated: u64,
    pub total: u64,
    pub percentage: u8,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    // -------- Métricas de la tarea --------
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
}

impl TaskState {
    pub fn new() -> Self {
        Self {
            status: TaskStatus::Running,
            generated: 0,
            total: 0,
            percentage: 0,
            error_message: None,
            created_at: Utc::now(),
            finished_at: None,
        }
    }
}

impl Default for TaskState {
    fn default() -> Self {
        Self::new()
    }
}

/// Porcentaje a mostrar para (generated, total, status).
///
/// Running y Done usan floor(generated/total*100), con total=0 -> 0.
/// Canceled y Error siempre reportan 0, aunque ya haya filas generadas.
pub fn percentage(generated: u64, total: u64, status: TaskStatus) -> u8 {
    match status {
        TaskStatus::Canceled | TaskStatus::Error => 0,
        TaskStatus::Running | TaskStatus::Done => {
            if total == 0 {
                return 0;
            }
            let done = generated.min(total) as u128;
            ((done * 100) / total as u128) as u8
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_trunca_hacia_abajo_mientras_corre() {
        assert_eq!(percentage(1, 3, TaskStatus::Running), 33);
        assert_eq!(percentage(2, 3, TaskStatus::Running), 66);
        assert_eq!(percentage(3, 3, TaskStatus::Running), 100);
    }

    #[test]
    fn percentage_con_total_cero_es_cero() {
        assert_eq!(percentage(0, 0, TaskStatus::Running), 0);
        assert_eq!(percentage(0, 0, TaskStatus::Done), 0);
    }

    #[test]
    fn percentage_es_cero_en_cancelada_y_error() {
        assert_eq!(percentage(2, 3, TaskStatus::Canceled), 0);
        assert_eq!(percentage(3, 3, TaskStatus::Error), 0);
    }

    #[test]
    fn done_completo_es_cien() {
        assert_eq!(percentage(5, 5, TaskStatus::Done), 100);
    }

    #[test]
    fn task_status_se_serializa_en_minusculas() {
        let s = serde_json::to_string(&TaskStatus::Canceled).unwrap();
        assert_eq!(s, "\"canceled\"");
        assert_eq!(TaskStatus::Done.to_string(), "done");
    }

    #[test]
    fn task_state_omite_error_message_si_no_hay() {
        let v = serde_json::to_value(TaskState::new()).unwrap();
        assert_eq!(v["status"], "running");
        assert!(v.get("error_message").is_none());
    }
}
