use serde::de::DeserializeOwned;
use thiserror::Error;

/// A deserialization failure with the JSON path where it happened.
#[derive(Debug, Error)]
#[error("at JSON path {path} → {source}")]
pub struct PathError {
    pub path: String,
    #[source]
    pub source: serde_json::Error,
}

/// Deserialize with JSON-path context in error messages.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, PathError> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize::<_, T>(de).map_err(into_path_error)
}

pub fn from_slice_with_path<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, PathError> {
    let de = &mut serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize::<_, T>(de).map_err(into_path_error)
}

fn into_path_error(err: serde_path_to_error::Error<serde_json::Error>) -> PathError {
    let path = err.path().to_string();
    PathError { path, source: err.into_inner() }
}
