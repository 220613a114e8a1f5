//! Parameter store implementations
//!
//! A JSON file store that survives between the `create` and `deploy` steps,
//! and an in-memory store for embedding and tests.

use crate::domain::entities::TokenParameters;
use crate::domain::repositories::ParameterStore;
use crate::shared::constants::PARAMETER_SESSION_KEY;
use crate::shared::error::DeployError;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Stores parameters as `<data_dir>/<session_key>.json`
pub struct FileParameterStore {
    data_dir: PathBuf,
    session_key: String,
}

impl FileParameterStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self::with_key(data_dir, PARAMETER_SESSION_KEY)
    }

    pub fn with_key(data_dir: impl Into<PathBuf>, session_key: impl Into<String>) -> Self {
        Self {
            data_dir: data_dir.into(),
            session_key: session_key.into(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.data_dir.join(format!("{}.json", self.session_key))
    }

    fn write_atomically(path: &Path, contents: &[u8]) -> Result<(), DeployError> {
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

impl ParameterStore for FileParameterStore {
    fn save(&self, params: &TokenParameters) -> Result<(), DeployError> {
        params.validate()?;
        fs::create_dir_all(&self.data_dir)?;
        let contents = serde_json::to_vec_pretty(params)?;
        Self::write_atomically(&self.path(), &contents)?;
        log::debug!("Token parameters saved to {}", self.path().display());
        Ok(())
    }

    fn load(&self) -> Result<Option<TokenParameters>, DeployError> {
        let path = self.path();
        if !path.exists() {
            return Ok(None);
        }
        let data = fs::read_to_string(&path)?;
        let params: TokenParameters = serde_json::from_str(&data)?;
        params.validate()?;
        Ok(Some(params))
    }

    fn clear(&self) -> Result<(), DeployError> {
        let path = self.path();
        if path.exists() {
            fs::remove_file(&path)?;
            log::debug!("Token parameters cleared from {}", path.display());
        }
        Ok(())
    }
}

/// Keeps the serialized record in memory
#[derive(Default)]
pub struct MemoryParameterStore {
    record: Mutex<Option<String>>,
}

impl MemoryParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<String>>, DeployError> {
        self.record
            .lock()
            .map_err(|_| DeployError::storage("Parameter store lock poisoned"))
    }
}

impl ParameterStore for MemoryParameterStore {
    fn save(&self, params: &TokenParameters) -> Result<(), DeployError> {
        params.validate()?;
        *self.lock()? = Some(serde_json::to_string(params)?);
        Ok(())
    }

    fn load(&self) -> Result<Option<TokenParameters>, DeployError> {
        match self.lock()?.as_deref() {
            Some(record) => Ok(Some(serde_json::from_str(record)?)),
            None => Ok(None),
        }
    }

    fn clear(&self) -> Result<(), DeployError> {
        *self.lock()? = None;
        Ok(())
    }
}
