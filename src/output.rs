use log::{debug, info};
use std::fs::{self, Permissions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::Builder;
use thiserror::Error;

use crate::lso::EncodedImage;

/// Extension of generated light-sequence objects
pub const LSO_EXTENSION: &str = "lso";

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("output path {} would overwrite the input", .0.display())]
    SameAsInput(PathBuf),

    #[error("failed to write {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Destination for a vector script: same name, `.lso` extension
pub fn lso_path(input: &Path) -> Result<PathBuf, OutputError> {
    let output = input.with_extension(LSO_EXTENSION);
    ensure_distinct(input, &output)?;
    Ok(output)
}

/// Refuse an output that names the input file, spelled either way
pub fn ensure_distinct(input: &Path, output: &Path) -> Result<(), OutputError> {
    let same = output == input
        || matches!(
            (fs::canonicalize(input), fs::canonicalize(output)),
            (Ok(a), Ok(b)) if a == b
        );
    if same {
        return Err(OutputError::SameAsInput(output.to_path_buf()));
    }
    Ok(())
}

/// Mode for a fresh image, 0644 less the umask
#[cfg(unix)]
fn default_permissions() -> Option<Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn default_permissions() -> Option<Permissions> {
    None
}

/// Write an image so the destination is either complete or untouched.
///
/// Bytes go to a temporary file next to `path`, which is renamed over the
/// destination once fully flushed. The temporary file is removed on error.
pub fn write_image(path: &Path, image: &EncodedImage) -> Result<(), OutputError> {
    let io_err = |source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut builder = Builder::new();
    if let Some(perms) = default_permissions() {
        builder.permissions(perms);
    }
    let mut tmp = builder.tempfile_in(dir).map_err(io_err)?;

    // A replaced image keeps the mode of the file it replaces
    if let Ok(meta) = fs::metadata(path) {
        tmp.as_file()
            .set_permissions(meta.permissions())
            .map_err(io_err)?;
    }
    debug!("Staging {} bytes in {}", image.len(), tmp.path().display());

    tmp.write_all(image.as_bytes()).map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;

    info!("Wrote {} ({} bytes)", path.display(), image.len());
    Ok(())
}
