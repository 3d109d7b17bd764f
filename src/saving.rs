use async_trait::async_trait;
use bincode::{deserialize_from, serialize_into};
use chrono::Utc;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::scenario::{Scenario, ScenarioParams};
use crate::store::{Result, ScenarioStore, StorageKind, StoreError};
use crate::validation::validate_params;

/// On-disk layout of the local store
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ScenarioFile {
    /// Next id to hand out; never decreases, so ids are not reused
    pub next_id: u64,
    pub scenarios: Vec<Scenario>,
}

/// Write a scenario file as gzip-compressed bincode
///
/// The data goes to a sibling temp file first and is renamed into place.
pub fn save_scenarios(file: &ScenarioFile, filename: &Path) -> std::io::Result<()> {
    if let Some(parent) = filename.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp = filename.with_extension("tmp");
    {
        let out = File::create(&tmp)?;
        let encoder = GzEncoder::new(out, Compression::default());
        let mut writer = std::io::BufWriter::new(encoder);

        serialize_into(&mut writer, file)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

        let encoder = writer.into_inner().map_err(|e| e.into_error())?;
        encoder.finish()?.flush()?;
    }
    fs::rename(&tmp, filename)?;

    Ok(())
}

/// Read a scenario file; a missing file is an empty store
pub fn load_scenarios(filename: &Path) -> std::io::Result<ScenarioFile> {
    let file = match File::open(filename) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(ScenarioFile::default()),
        Err(e) => return Err(e),
    };
    let decoder = GzDecoder::new(file);
    let mut reader = std::io::BufReader::new(decoder);

    let scenarios: ScenarioFile = deserialize_from(&mut reader)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

    Ok(scenarios)
}

/// Fallback store kept in a single file on this machine
///
/// Ids are assigned locally as `1, 2, 3, ...`.
pub struct LocalScenarioStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl LocalScenarioStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        LocalScenarioStore {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }
}

#[async_trait]
impl ScenarioStore for LocalScenarioStore {
    fn kind(&self) -> StorageKind {
        StorageKind::Local
    }

    async fn save(&self, params: ScenarioParams) -> Result<Scenario> {
        validate_params(&params)?;
        let _guard = self.lock.lock().await;

        let mut file = load_scenarios(&self.path)?;
        file.next_id = file.next_id.max(1);
        let scenario = Scenario::new(file.next_id.to_string(), params, Utc::now());
        file.next_id += 1;
        file.scenarios.push(scenario.clone());
        save_scenarios(&file, &self.path)?;

        tracing::debug!(id = %scenario.id, path = %self.path.display(), "saved scenario locally");
        Ok(scenario)
    }

    async fn list(&self) -> Result<Vec<Scenario>> {
        let _guard = self.lock.lock().await;
        Ok(load_scenarios(&self.path)?.scenarios)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let _guard = self.lock.lock().await;

        let mut file = load_scenarios(&self.path)?;
        let before = file.scenarios.len();
        file.scenarios.retain(|s| s.id != id);
        if file.scenarios.len() == before {
            return Err(StoreError::NotFound(id.to_string()));
        }
        save_scenarios(&file, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn params(balance: f64) -> ScenarioParams {
        ScenarioParams {
            initial_balance: balance,
            monthly_deposit: 25.0,
            annual_rate_percent: 3.0,
            years: 4,
        }
    }

    #[tokio::test]
    async fn missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = LocalScenarioStore::new(dir.path().join("none.bin.gz"));
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn assigns_sequential_ids_without_reuse() {
        let dir = tempdir().unwrap();
        let store = LocalScenarioStore::new(dir.path().join("scenarios.bin.gz"));

        assert_eq!(store.save(params(1.0)).await.unwrap().id, "1");
        assert_eq!(store.save(params(2.0)).await.unwrap().id, "2");
        store.delete("2").await.unwrap();
        assert_eq!(store.save(params(3.0)).await.unwrap().id, "3");

        let ids: Vec<String> = store.list().await.unwrap().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, ["1", "3"]);
    }

    #[tokio::test]
    async fn survives_reopening() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("scenarios.bin.gz");
        let saved = LocalScenarioStore::new(&path).save(params(750.0)).await.unwrap();

        let reopened = LocalScenarioStore::new(&path);
        let listed = reopened.list().await.unwrap();
        assert_eq!(listed, vec![saved]);
        assert!(!path.with_extension("tmp").exists());
    }

    #[tokio::test]
    async fn rejects_invalid_params() {
        let dir = tempdir().unwrap();
        let store = LocalScenarioStore::new(dir.path().join("s.bin.gz"));
        let err = store.save(params(-1.0)).await.unwrap_err();
        assert!(matches!(err, StoreError::Invalid(_)));
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn deleting_unknown_id_fails() {
        let dir = tempdir().unwrap();
        let store = LocalScenarioStore::new(dir.path().join("s.bin.gz"));
        store.save(params(1.0)).await.unwrap();
        assert!(matches!(store.delete("9").await, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.bin.gz");
        fs::write(&path, b"not gzip").unwrap();
        assert!(load_scenarios(&path).is_err());
    }
}
