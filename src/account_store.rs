use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::scenario::{Scenario, ScenarioParams};
use crate::store::{Result, ScenarioStore, StorageKind, StoreError};
use crate::validation::validate_params;

const SCENARIOS_FILE: &str = "scenarios.json";

/// Server-side store for one account
///
/// Scenarios live in `<database>/<username>/scenarios.json` and get UUID ids.
/// The write lock is shared by every store opened on the same server so that
/// concurrent requests do not interleave read-modify-write cycles.
pub struct AccountScenarioStore {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl AccountScenarioStore {
    pub fn new(database_dir: impl AsRef<Path>, username: &str, lock: Arc<Mutex<()>>) -> Self {
        AccountScenarioStore {
            path: database_dir.as_ref().join(username).join(SCENARIOS_FILE),
            lock,
        }
    }

    async fn read(&self) -> Result<Vec<Scenario>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(data) => Ok(serde_json::from_str(&data)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, scenarios: &[Scenario]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(scenarios)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }
}

#[async_trait]
impl ScenarioStore for AccountScenarioStore {
    fn kind(&self) -> StorageKind {
        StorageKind::Remote
    }

    async fn save(&self, params: ScenarioParams) -> Result<Scenario> {
        validate_params(&params)?;
        let _guard = self.lock.lock().await;

        let mut scenarios = self.read().await?;
        let scenario = Scenario::new(Uuid::new_v4().to_string(), params, Utc::now());
        scenarios.push(scenario.clone());
        self.write(&scenarios).await?;
        Ok(scenario)
    }

    async fn list(&self) -> Result<Vec<Scenario>> {
        let _guard = self.lock.lock().await;
        self.read().await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let _guard = self.lock.lock().await;

        let mut scenarios = self.read().await?;
        let before = scenarios.len();
        scenarios.retain(|s| s.id != id);
        if scenarios.len() == before {
            return Err(StoreError::NotFound(id.to_string()));
        }
        self.write(&scenarios).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn params() -> ScenarioParams {
        ScenarioParams {
            initial_balance: 500.0,
            monthly_deposit: 50.0,
            annual_rate_percent: 2.5,
            years: 6,
        }
    }

    #[tokio::test]
    async fn accounts_are_isolated() {
        let dir = tempdir().unwrap();
        let lock = Arc::new(Mutex::new(()));
        let alice = AccountScenarioStore::new(dir.path(), "alice", lock.clone());
        let bob = AccountScenarioStore::new(dir.path(), "bob", lock);

        let saved = alice.save(params()).await.unwrap();
        assert!(Uuid::parse_str(&saved.id).is_ok());
        assert_eq!(alice.list().await.unwrap(), vec![saved.clone()]);
        assert!(bob.list().await.unwrap().is_empty());
        assert!(dir.path().join("alice").join(SCENARIOS_FILE).exists());

        alice.delete(&saved.id).await.unwrap();
        assert!(alice.list().await.unwrap().is_empty());
        assert!(matches!(
            alice.delete(&saved.id).await,
            Err(StoreError::NotFound(_))
        ));
    }
}
