use std::{
    fs::{self, File},
    io::{Cursor, Read},
    path::Path,
};

use calamine::{Reader, Xlsx};
use tracing::debug;

use crate::error::SchemaError;
use crate::row::Row;

pub const CSV_CONTENT_TYPE: &str = "text/csv";
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Columnas requeridas: (nombre canónico, variantes normalizadas aceptadas).
/// La normalización ignora mayúsculas, '_', '-' y espacios.
const REQUIRED_COLUMNS: [(&str, &[&str]); 5] = [
    ("name", &["name"]),
    ("lastName", &["lastname"]),
    ("jobTitle", &["jobtitle"]),
    ("hobby", &["hobby"]),
    // "FavoritFood" es como viene en las planillas viejas
    ("favoriteFood", &["favoritefood", "favoritfood"]),
];

/// Formato del archivo subido.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    Csv,
    Xlsx,
}

impl DatasetFormat {
    /// Decide por Content-Type y, si no dice nada, por la firma zip del xlsx.
    pub fn detect(content_type: Option<&str>, bytes: &[u8]) -> Self {
        match content_type {
            Some(ct) if ct.contains("spreadsheetml") => DatasetFormat::Xlsx,
            Some(ct) if ct.starts_with("text/") => DatasetFormat::Csv,
            _ if bytes.starts_with(b"PK\x03\x04") => DatasetFormat::Xlsx,
            _ => DatasetFormat::Csv,
        }
    }

    /// Por extensión: .xlsx es planilla, el resto se lee como CSV.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        match path.as_ref().extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("xlsx") => DatasetFormat::Xlsx,
            _ => DatasetFormat::Csv,
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            DatasetFormat::Csv => CSV_CONTENT_TYPE,
            DatasetFormat::Xlsx => XLSX_CONTENT_TYPE,
        }
    }
}

fn normalize_header(raw: &str) -> String {
    raw.trim()
        .trim_start_matches('\u{feff}')
        .chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Índice de cada columna requerida. None si no hay encabezados (entrada vacía).
fn column_indices(headers: &[String]) -> Result<Option<[usize; 5]>, SchemaError> {
    if headers.iter().all(|h| h.is_empty()) {
        return Ok(None);
    }

    let mut indices = [0usize; 5];
    let mut missing = Vec::new();
    for (slot, (canonical, aliases)) in REQUIRED_COLUMNS.iter().enumerate() {
        match headers.iter().position(|h| aliases.contains(&h.as_str())) {
            Some(idx) => indices[slot] = idx,
            None => missing.push(canonical.to_string()),
        }
    }
    if !missing.is_empty() {
        return Err(SchemaError::MissingColumns(missing));
    }
    Ok(Some(indices))
}

fn build_row<'a>(
    line: u64,
    indices: &[usize; 5],
    field: impl Fn(usize) -> Option<&'a str>,
) -> Result<Row, SchemaError> {
    let mut values: [String; 5] = Default::default();
    for (slot, idx) in indices.iter().enumerate() {
        let value = field(*idx).unwrap_or("").trim().trim_start_matches('\u{feff}');
        if value.is_empty() {
            return Err(SchemaError::MissingValue {
                line,
                column: REQUIRED_COLUMNS[slot].0,
            });
        }
        values[slot] = value.to_string();
    }

    let [name, last_name, job_title, hobby, favorite_food] = values;
    Ok(Row {
        name,
        last_name,
        job_title,
        hobby,
        favorite_food,
    })
}

/// Lee un CSV (primera línea = encabezados) y devuelve las filas en orden.
pub fn load_rows<R: Read>(reader: R) -> Result<Vec<Row>, SchemaError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = rdr.headers()?.iter().map(normalize_header).collect();

    // archivo vacío: cero filas, no es un error
    let Some(indices) = column_indices(&headers)? else {
        return Ok(Vec::new());
    };

    let mut rows = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let record = result?;
        // encabezado en la línea 1
        let line = record
            .position()
            .map(|p| p.line())
            .unwrap_or(i as u64 + 2);

        rows.push(build_row(line, &indices, |idx| record.get(idx))?);
    }

    debug!("dataset cargado: {} filas", rows.len());
    Ok(rows)
}

/// Lee la primera hoja de un .xlsx; la primera fila con datos son los encabezados.
pub fn load_rows_xlsx(bytes: &[u8]) -> Result<Vec<Row>, SchemaError> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(SchemaError::NoSheet)??;

    // número de fila real en la planilla (1-based)
    let first_line = range.start().map(|(row, _)| row as u64 + 1).unwrap_or(1);
    let mut sheet_rows = range
        .rows()
        .map(|cells| cells.iter().map(|c| c.to_string()).collect::<Vec<String>>());

    let headers: Vec<String> = match sheet_rows.next() {
        Some(cells) => cells.iter().map(|h| normalize_header(h)).collect(),
        None => return Ok(Vec::new()),
    };
    let Some(indices) = column_indices(&headers)? else {
        return Ok(Vec::new());
    };

    let mut rows = Vec::new();
    for (i, cells) in sheet_rows.enumerate() {
        // filas en blanco al final de la hoja
        if cells.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        let line = first_line + i as u64 + 1;
        rows.push(build_row(line, &indices, |idx| cells.get(idx).map(String::as_str))?);
    }

    debug!("planilla cargada: {} filas", rows.len());
    Ok(rows)
}

pub fn load_rows_from_bytes(bytes: &[u8], format: DatasetFormat) -> Result<Vec<Row>, SchemaError> {
    match format {
        DatasetFormat::Csv => load_rows(bytes),
        DatasetFormat::Xlsx => load_rows_xlsx(bytes),
    }
}

pub fn load_rows_from_path(path: impl AsRef<Path>) -> Result<Vec<Row>, SchemaError> {
    let path = path.as_ref();
    match DatasetFormat::from_path(path) {
        DatasetFormat::Csv => load_rows(File::open(path)?),
        DatasetFormat::Xlsx => load_rows_xlsx(&fs::read(path)?),
    }
}
