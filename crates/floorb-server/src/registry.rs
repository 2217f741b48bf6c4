use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use floorb::{ActorEnvironment, ActorService, FloorbError, Result};

/// # ActorRegistry
///
/// The local actors this process serves, by name. Each actor has its own
/// service (and so its own graph lock); the registry lock only guards the map.
pub struct ActorRegistry {
    env: ActorEnvironment,
    actors: RwLock<HashMap<String, Arc<ActorService>>>,
}

impl ActorRegistry {
    pub fn new(env: ActorEnvironment) -> Self {
        Self {
            env,
            actors: RwLock::new(HashMap::new()),
        }
    }

    pub fn env(&self) -> &ActorEnvironment {
        &self.env
    }

    /// Load every actor in the store. A record that fails to load is logged
    /// and skipped; it is not served.
    pub async fn load_all(&self) -> Result<usize> {
        let names = self.env.store.list().await?;
        let mut loaded = 0;
        for name in names {
            match ActorService::load(&self.env, &name).await {
                Ok(service) => {
                    self.actors.write().await.insert(name, Arc::new(service));
                    loaded += 1;
                }
                Err(e) => warn!("Not serving actor '{}': {}", name, e),
            }
        }
        info!("Serving {} actors", loaded);
        Ok(loaded)
    }

    /// Create a new actor and start serving it.
    pub async fn create(
        &self,
        name: &str,
        summary: &str,
        actor_type: &str,
        iri: &str,
    ) -> Result<Arc<ActorService>> {
        // duplicate names are refused by the store
        let service =
            Arc::new(ActorService::create(&self.env, name, summary, actor_type, iri).await?);
        self.actors
            .write()
            .await
            .insert(name.to_string(), service.clone());
        Ok(service)
    }

    /// The served actor called `name`, loading it from the store if it is
    /// not served yet.
    pub async fn load(&self, name: &str) -> Result<Arc<ActorService>> {
        if let Some(service) = self.get(name).await {
            return Ok(service);
        }

        let service = Arc::new(ActorService::load(&self.env, name).await?);
        let mut actors = self.actors.write().await;
        Ok(actors.entry(name.to_string()).or_insert(service).clone())
    }

    pub async fn get(&self, name: &str) -> Option<Arc<ActorService>> {
        self.actors.read().await.get(name).cloned()
    }

    pub async fn require(&self, name: &str) -> Result<Arc<ActorService>> {
        self.get(name)
            .await
            .ok_or_else(|| FloorbError::NotFound(name.to_string()))
    }

    pub async fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.actors.read().await.keys().cloned().collect();
        names.sort();
        names
    }
}
