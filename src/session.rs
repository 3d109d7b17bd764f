use std::path::PathBuf;
use std::time::Duration;

use crate::remote_store::RemoteScenarioStore;
use crate::saving::LocalScenarioStore;
use crate::scenario::{Scenario, ScenarioParams, SortOrder, sort_scenarios};
use crate::store::{Result, ScenarioStore, StorageKind};

/// How a session wants to persist scenarios
///
/// Chosen once when the session opens; every later call goes through the
/// resulting store.
#[derive(Debug, Clone)]
pub enum StorageStrategy {
    Remote {
        url: String,
        username: String,
        password: String,
        timeout: Duration,
    },
    Local {
        path: PathBuf,
    },
}

/// Per-user working state: the active store, the loaded scenarios and the
/// current listing order
pub struct ScenarioSession {
    store: Box<dyn ScenarioStore>,
    scenarios: Vec<Scenario>,
    order: SortOrder,
    status: String,
}

impl ScenarioSession {
    /// Open a session over an already constructed store
    pub async fn with_store(store: Box<dyn ScenarioStore>, status: String) -> Result<Self> {
        let mut session = ScenarioSession {
            store,
            scenarios: Vec::new(),
            order: SortOrder::default(),
            status,
        };
        session.reload().await?;
        Ok(session)
    }

    /// Open a session for the given strategy
    ///
    /// A remote strategy whose login fails (bad credentials or unreachable
    /// server) falls back to the local store at `fallback`; the reason is kept
    /// in [`ScenarioSession::status`].
    pub async fn open(strategy: StorageStrategy, fallback: PathBuf) -> Result<Self> {
        match strategy {
            StorageStrategy::Remote {
                url,
                username,
                password,
                timeout,
            } => match RemoteScenarioStore::login(&url, &username, &password, timeout).await {
                Ok(remote) => {
                    let status = format!("Logged in as {}; scenarios are saved on {}", username, url);
                    Self::with_store(Box::new(remote), status).await
                }
                Err(e) => {
                    tracing::warn!(error = %e, "remote login failed, using local scenario store");
                    let status = format!(
                        "Login failed ({}); scenarios are saved locally in {}",
                        e,
                        fallback.display()
                    );
                    Self::with_store(Box::new(LocalScenarioStore::new(fallback)), status).await
                }
            },
            StorageStrategy::Local { path } => {
                let status = format!("Not logged in; scenarios are saved locally in {}", path.display());
                Self::with_store(Box::new(LocalScenarioStore::new(path)), status).await
            }
        }
    }

    /// Refresh the in-memory collection from the store
    pub async fn reload(&mut self) -> Result<()> {
        self.scenarios = self.store.list().await?;
        sort_scenarios(&mut self.scenarios, self.order);
        Ok(())
    }

    pub async fn save(&mut self, params: ScenarioParams) -> Result<Scenario> {
        let scenario = self.store.save(params).await?;
        self.scenarios.push(scenario.clone());
        sort_scenarios(&mut self.scenarios, self.order);
        Ok(scenario)
    }

    /// Delete from the store; the store decides whether the id exists, since
    /// the loaded collection may be older than the store's contents
    pub async fn delete(&mut self, id: &str) -> Result<()> {
        self.store.delete(id).await?;
        self.scenarios.retain(|s| s.id != id);
        Ok(())
    }

    pub fn sort_by(&mut self, order: SortOrder) {
        self.order = order;
        sort_scenarios(&mut self.scenarios, order);
    }

    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    pub fn kind(&self) -> StorageKind {
        self.store.kind()
    }

    pub fn status(&self) -> &str {
        &self.status
    }
}
