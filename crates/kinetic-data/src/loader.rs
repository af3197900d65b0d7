//! Reading the kinetic config file from disk.
//!
//! The config may be written as RON, TOML or JSON. The extension picks the
//! parser, and a directory holding the same config in two formats is an
//! error rather than a silent preference.

use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Why the kinetic config could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    #[error("{file} is not a .ron, .toml or .json file")]
    UnsupportedFormat { file: PathBuf },

    /// `kinetic.ron` next to `kinetic.json`, for example.
    #[error("config found in two formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    #[error("could not parse {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// A stress entry names a node type the engine does not know.
    #[error("{file}: '{name}' is not a known {expected_kind}")]
    UnresolvedRef {
        file: PathBuf,
        name: String,
        expected_kind: &'static str,
    },

    /// The same node type has two stress entries.
    #[error("{file}: '{name}' is listed more than once")]
    DuplicateName { file: PathBuf, name: String },

    #[error("{field} = {value} in {file} is out of range (expected {expected})")]
    OutOfRange {
        file: PathBuf,
        field: String,
        value: f64,
        expected: &'static str,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Config file syntaxes, in lookup order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

impl Format {
    pub const ALL: [Format; 3] = [Format::Ron, Format::Toml, Format::Json];

    pub fn extension(self) -> &'static str {
        match self {
            Format::Ron => "ron",
            Format::Toml => "toml",
            Format::Json => "json",
        }
    }
}

/// The format implied by `path`'s extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    let ext = path.extension().and_then(|e| e.to_str());
    Format::ALL
        .into_iter()
        .find(|f| Some(f.extension()) == ext)
        .ok_or_else(|| DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        })
}

/// Path of `dir/{base_name}.{ron,toml,json}`, or `None` when there is no
/// such file. Two matches are a [`DataLoadError::ConflictingFormats`].
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut candidates = Format::ALL
        .into_iter()
        .map(|f| dir.join(format!("{base_name}.{}", f.extension())))
        .filter(|path| path.exists());

    let Some(first) = candidates.next() else {
        return Ok(None);
    };
    match candidates.next() {
        Some(second) => Err(DataLoadError::ConflictingFormats { a: first, b: second }),
        None => Ok(Some(first)),
    }
}

/// Read `path` and parse it with the parser its extension selects.
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let text = std::fs::read_to_string(path)?;
    let parsed = match format {
        Format::Ron => ron::from_str(&text).map_err(|e| e.to_string()),
        Format::Toml => toml::from_str(&text).map_err(|e| e.to_string()),
        Format::Json => serde_json::from_str(&text).map_err(|e| e.to_string()),
    };
    parsed.map_err(|detail| DataLoadError::Parse {
        file: path.to_path_buf(),
        detail,
    })
}
