//! Reading of pretrained JSON artifacts (vocabulary, classifier parameters).

use crate::error::ArtifactLoadError;
use serde::de::DeserializeOwned;
use std::path::Path;

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactLoadError> {
    if !path.exists() {
        return Err(ArtifactLoadError::Missing {
            path: path.to_path_buf(),
        });
    }
    let data = std::fs::read_to_string(path).map_err(|source| ArtifactLoadError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&data).map_err(|source| ArtifactLoadError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}
