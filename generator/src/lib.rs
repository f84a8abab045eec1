//! Colaboradores externos del pipeline: la API de generación de imágenes y
//! el guardado de las imágenes generadas.

pub mod config;
pub mod openai;
pub mod saver;

pub use config::GeneratorConfig;
pub use openai::{build_http_client, OpenAiGenerator};
pub use saver::ImageSaver;
