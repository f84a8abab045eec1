use serde::{Deserialize, Serialize};

/// Una fila del dataset: una persona, una imagen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub name: String,
    pub last_name: String,
    pub job_title: String,
    pub hobby: String,
    pub favorite_food: String,
}
