use std::sync::{Arc, Mutex, MutexGuard};

use crate::cognition::ResponseRequester;
use crate::config::{BotIdentity, LurkerCfg};
use crate::emotes::EmoteCatalog;
use crate::entropy::Entropy;
use crate::io::Transport;
use crate::memory::Persistence;
use crate::state::StateStore;

/// Collaborators and shared state handed to every channel worker.
pub struct Services {
    pub cfg: Arc<LurkerCfg>,
    pub identity: BotIdentity,
    pub store: StateStore,
    pub persistence: Arc<dyn Persistence>,
    /// `None` leaves the bot silent: it still listens and records.
    pub requester: Option<ResponseRequester>,
    pub catalog: Arc<dyn EmoteCatalog>,
    pub transport: Arc<dyn Transport>,
    generation_gate: Option<tokio::sync::Mutex<()>>,
    entropy: Mutex<Box<dyn Entropy>>,
}

impl Services {
    pub fn new(
        cfg: Arc<LurkerCfg>,
        identity: BotIdentity,
        persistence: Arc<dyn Persistence>,
        requester: Option<ResponseRequester>,
        catalog: Arc<dyn EmoteCatalog>,
        transport: Arc<dyn Transport>,
        entropy: Box<dyn Entropy>,
    ) -> Self {
        let store = StateStore::new(Arc::clone(&cfg), identity.nick.clone());
        let generation_gate = cfg.serialize_generation.then(|| tokio::sync::Mutex::new(()));
        Self {
            cfg,
            identity,
            store,
            persistence,
            requester,
            catalog,
            transport,
            generation_gate,
            entropy: Mutex::new(entropy),
        }
    }

    /// Shared randomness. Never hold the guard across an await.
    pub fn entropy(&self) -> MutexGuard<'_, Box<dyn Entropy>> {
        self.entropy.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Serialises generation across channels when enabled; released on drop.
    pub async fn generation_permit(&self) -> Option<tokio::sync::MutexGuard<'_, ()>> {
        match &self.generation_gate {
            Some(gate) => Some(gate.lock().await),
            None => None,
        }
    }
}
