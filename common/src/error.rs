use std::io;

use thiserror::Error;

use crate::task::{TaskId, TaskStatus};

/// Errores de forma del dataset de entrada. Se devuelven antes de crear la tarea.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("faltan columnas requeridas: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("valor vacío en la columna {column} (línea {line})")]
    MissingValue { line: u64, column: &'static str },

    #[error("CSV inválido: {0}")]
    Csv(#[from] csv::Error),

    #[error("planilla xlsx inválida: {0}")]
    Xlsx(#[from] calamine::XlsxError),

    #[error("la planilla no tiene hojas")]
    NoSheet,

    #[error("error leyendo dataset: {0}")]
    Io(#[from] io::Error),
}

/// Fallos del servicio externo de generación de imágenes.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("error de transporte llamando a la API de imágenes: {0}")]
    Transport(String),

    #[error("la API de imágenes respondió {status}: {body}")]
    Api { status: u16, body: String },

    #[error("respuesta inesperada de la API de imágenes: {0}")]
    MalformedResponse(String),

    #[error("la respuesta de la API no trae URL de imagen")]
    MissingResult,
}

/// Fallos al descargar o guardar una imagen generada.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("error descargando imagen: {0}")]
    Download(String),

    #[error("descarga de imagen respondió {status}")]
    DownloadStatus { status: u16 },

    #[error("error guardando imagen: {0}")]
    Io(#[from] io::Error),
}

/// Uso incorrecto del registro de tareas.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("tarea {0} no encontrada")]
    NotFound(TaskId),

    #[error("transición inválida para la tarea {id}: estado actual {status}")]
    InvalidTransition { id: TaskId, status: TaskStatus },

    #[error("la tarea {0} ya existe")]
    Duplicate(TaskId),
}
