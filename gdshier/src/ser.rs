//!
//! # Serialization Utilities
//! (and file IO for those serialized objects)
//!

// Std-Lib Imports
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

// Crates.io Imports
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// # Enumerated Supported Serialization Formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerializationFormat {
    Json,
    Yaml,
}
impl SerializationFormat {
    /// Infer the format from the extension of `path`
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Ok(Self::Json),
            Some("yaml") | Some("yml") => Ok(Self::Yaml),
            _ => Err(Error::UnknownFormat(path.to_path_buf())),
        }
    }
    /// Convert any [serde::Serialize] data to a serialized string
    pub fn to_string(&self, data: &impl Serialize) -> Result<String, Error> {
        match *self {
            Self::Json => Ok(serde_json::to_string_pretty(data)?),
            Self::Yaml => Ok(serde_yaml::to_string(data)?),
        }
    }
    /// Save `data` to file `fname`
    pub fn save(&self, data: &impl Serialize, fname: impl AsRef<Path>) -> Result<(), Error> {
        let mut file = BufWriter::new(File::create(fname)?);
        let s = self.to_string(data)?;
        file.write_all(s.as_bytes())?;
        file.flush()?;
        Ok(())
    }
    /// Load from file at path `fname`
    pub fn open<T: DeserializeOwned>(&self, fname: impl AsRef<Path>) -> Result<T, Error> {
        let file = BufReader::new(File::open(fname)?);
        let rv: T = match *self {
            Self::Json => serde_json::from_reader(file)?,
            Self::Yaml => serde_yaml::from_reader(file)?,
        };
        Ok(rv)
    }
}

/// # Serialization Errors
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("cannot infer a serialization format from {0:?}; use .json, .yaml or .yml")]
    UnknownFormat(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_from_paths() {
        use SerializationFormat::{Json, Yaml};
        assert_eq!(SerializationFormat::from_path("a/b.json").unwrap(), Json);
        assert_eq!(SerializationFormat::from_path("b.yaml").unwrap(), Yaml);
        assert_eq!(SerializationFormat::from_path("b.yml").unwrap(), Yaml);
        assert!(matches!(
            SerializationFormat::from_path("b.toml"),
            Err(Error::UnknownFormat(_))
        ));
        assert!(SerializationFormat::from_path("noext").is_err());
    }
    #[test]
    fn to_strings() -> Result<(), Error> {
        let mut data = std::collections::BTreeMap::new();
        data.insert("a", 1);
        assert_eq!(SerializationFormat::Yaml.to_string(&data)?, "a: 1\n");
        assert_eq!(
            SerializationFormat::Json.to_string(&data)?,
            "{\n  \"a\": 1\n}"
        );
        Ok(())
    }
}
