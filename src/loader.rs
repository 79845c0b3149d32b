//! Document loading for feeds, schemas and configuration.
//!
//! Files are read once and deserialized from YAML or JSON, chosen by file
//! extension (`.json` is JSON, anything else is YAML).

use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

use crate::error::LoadError;

/// Serialized document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
}

impl Format {
    /// Pick a format from the file extension.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Format::Json,
            _ => Format::Yaml,
        }
    }
}

/// Deserialize a document from a string.
pub fn from_str<T: DeserializeOwned>(contents: &str, format: Format) -> Result<T, LoadError> {
    match format {
        Format::Yaml => Ok(serde_yaml::from_str(contents)?),
        Format::Json => Ok(serde_json::from_str(contents)?),
    }
}

/// Read and deserialize a document from a file.
///
/// # Errors
/// Returns error if the file doesn't exist or has invalid format
pub fn load_from_file<T, P>(path: P) -> Result<T, LoadError>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    let contents = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;

    from_str(&contents, Format::from_path(path))
}
