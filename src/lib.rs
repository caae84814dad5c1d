//! Vector script to light-sequence object (LSO) compiler.
//!
//! A vector script lists timed drive levels for the 8 channels of an Octa
//! luminaire. This crate validates those levels against the drive safety
//! ceiling and encodes them into the byte-exact LSO image the playback
//! firmware loads.
//!
//! ```no_run
//! use std::path::Path;
//! use vec2lso::{convert, Options};
//!
//! let written = convert(Path::new("show.vec"), None, &Options::default())?;
//! println!("wrote {}", written.display());
//! # Ok::<(), vec2lso::ConvertError>(())
//! ```

pub mod config;
pub mod lso;
pub mod output;
pub mod vector;

pub use config::Options;
pub use lso::{encode, EncodeError, EncodedImage};
pub use vector::{Frame, Script};

use log::{info, warn};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error(transparent)]
    Load(#[from] vector::LoadError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Output(#[from] output::OutputError),
}

/// Compile one vector script to an LSO file.
///
/// Writes to `output`, or next to `input` with an `.lso` extension. Nothing
/// is written unless the whole script loads and encodes.
pub fn convert(
    input: &Path,
    output: Option<&Path>,
    options: &Options,
) -> Result<PathBuf, ConvertError> {
    let options = options.resolved();
    if options.dark_after {
        warn!("dark_after has no encoding in this LSO version and is ignored");
    }

    let dst = match output {
        Some(path) => {
            output::ensure_distinct(input, path)?;
            path.to_path_buf()
        }
        None => output::lso_path(input)?,
    };

    let script = vector::load(input)?;
    let image = encode(&script, &options)?;

    info!(
        "Encoded {} frames ({} bytes, loop={}, smooth={})",
        image.frame_count(),
        image.script_len(),
        image.repeats(),
        image.smooth()
    );

    output::write_image(&dst, &image)?;
    Ok(dst)
}
