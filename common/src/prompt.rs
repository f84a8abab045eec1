use tracing::debug;

use crate::row::Row;

/// Arma el texto que se manda al servicio de generación para una fila.
pub fn build_prompt(row: &Row) -> String {
    let prompt = format!(
        "Create a vivid background image inspired by {}'s profession as a {}, \
         who loves {} and their favorite food is {}.",
        row.name, row.job_title, row.hobby, row.favorite_food
    );
    debug!("prompt generado: {}", prompt);
    prompt
}
