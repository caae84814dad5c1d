//! Vector script loader.
//!
//! A vector script is plain text, one record per line:
//! `duration_ms,ch0,ch1,ch2,ch3,ch4,ch5,ch6,ch7`. Every record is checked
//! against the drive safety ceiling before anything is encoded.

use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::lso::layout::NUM_CHANNELS;

/// Lines this short (terminator included) are treated as blank
pub const MIN_RECORD_LEN: usize = 9;

/// Highest allowed average drive across a record's channels
pub const SAFETY_CEILING: f64 = 0.3;

/// One timed sample
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub duration_ms: u32,
    /// Drive levels in input order, nominally 0.0..=1.0
    pub channels: Vec<f64>,
}

impl Frame {
    pub fn new(duration_ms: u32, channels: impl Into<Vec<f64>>) -> Self {
        Frame {
            duration_ms,
            channels: channels.into(),
        }
    }

    /// Average drive, always divided by the nominal channel count
    pub fn average_drive(&self) -> f64 {
        self.channels.iter().sum::<f64>() / NUM_CHANNELS as f64
    }
}

/// Frames in playback order
pub type Script = Vec<Frame>;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("unable to locate or open {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    #[error("vector script contains no records")]
    Empty,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error("line {line}: drive level {levels:?} is too high (average {average:.3} > {ceiling})", ceiling = SAFETY_CEILING)]
    SafetyLimitExceeded {
        line: usize,
        average: f64,
        levels: Vec<f64>,
    },
}

/// Read and validate a vector script from disk
pub fn load(path: &Path) -> Result<Script, LoadError> {
    let text = fs::read_to_string(path).map_err(|source| InputError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&text)
}

/// Parse and validate a whole vector script.
///
/// The first record over the safety ceiling aborts the run, even when
/// earlier records were fine.
pub fn parse(text: &str) -> Result<Script, LoadError> {
    let mut script = Vec::new();

    for (idx, line) in split_lines(text).enumerate() {
        let line_no = idx + 1;
        let Some(frame) = parse_record(line_no, line)? else {
            continue;
        };

        let average = frame.average_drive();
        if average > SAFETY_CEILING {
            return Err(LoadError::SafetyLimitExceeded {
                line: line_no,
                average,
                levels: frame.channels,
            });
        }

        if frame.channels.iter().any(|v| !(0.0..=1.0).contains(v)) {
            warn!(
                "line {}: drive level outside 0.0..=1.0: {:?}",
                line_no, frame.channels
            );
        }

        script.push(frame);
    }

    if script.is_empty() {
        return Err(InputError::Empty.into());
    }

    debug!("Loaded {} frames", script.len());
    Ok(script)
}

/// Split text into lines, keeping each terminator. `\n`, `\r\n` and a
/// lone `\r` all end a line.
pub fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    let mut rest = text;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        let end = match rest.find(['\r', '\n']) {
            Some(i) if rest[i..].starts_with("\r\n") => i + 2,
            Some(i) => i + 1,
            None => rest.len(),
        };
        let (line, tail) = rest.split_at(end);
        rest = tail;
        Some(line)
    })
}

/// Parse one raw line (terminator included). Short lines yield `None`.
///
/// Any terminator counts as a single character toward `MIN_RECORD_LEN`.
pub fn parse_record(line_no: usize, line: &str) -> Result<Option<Frame>, InputError> {
    let (body, terminated) = match line
        .strip_suffix("\r\n")
        .or_else(|| line.strip_suffix('\n'))
        .or_else(|| line.strip_suffix('\r'))
    {
        Some(body) => (body, true),
        None => (line, false),
    };

    if body.chars().count() + usize::from(terminated) < MIN_RECORD_LEN {
        return Ok(None);
    }

    let mut fields = body.split(',');

    // split always yields at least one field
    let duration_field = fields.next().unwrap_or_default();
    let duration_ms = parse_duration(duration_field).ok_or_else(|| InputError::Malformed {
        line: line_no,
        reason: format!("invalid duration {:?}", duration_field.trim()),
    })?;

    let channels = fields
        .enumerate()
        .map(|(chan, field)| {
            field.trim().parse::<f64>().map_err(|_| InputError::Malformed {
                line: line_no,
                reason: format!("invalid drive level {:?} for channel {}", field.trim(), chan),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Some(Frame {
        duration_ms,
        channels,
    }))
}

/// Durations are decimal numbers truncated toward zero
fn parse_duration(field: &str) -> Option<u32> {
    let value = field.trim().parse::<f64>().ok()?.trunc();
    if value.is_finite() && (0.0..=u32::MAX as f64).contains(&value) {
        Some(value as u32)
    } else {
        None
    }
}
