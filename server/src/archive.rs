use std::{
    fs::{self, File},
    io,
    path::{Path, PathBuf},
};

use zip::{write::FileOptions, CompressionMethod, ZipWriter};

pub const ARCHIVE_NAME: &str = "background_images.zip";

fn zip_err(e: zip::result::ZipError) -> io::Error {
    io::Error::new(io::ErrorKind::Other, format!("error escribiendo zip: {e}"))
}

/// Empaqueta las imágenes en un zip; cada entrada usa el nombre base del archivo.
pub fn write_zip(zip_path: &Path, files: &[PathBuf]) -> io::Result<()> {
    if let Some(parent) = zip_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut zip = ZipWriter::new(File::create(zip_path)?);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for path in files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("ruta sin nombre de archivo: {}", path.display()),
                )
            })?;

        zip.start_file(name, options).map_err(zip_err)?;
        let mut src = File::open(path)?;
        io::copy(&mut src, &mut zip)?;
    }

    zip.finish().map_err(zip_err)?;
    Ok(())
}
