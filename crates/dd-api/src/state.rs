use std::sync::Arc;

use chrono::{DateTime, Utc};
use dd_db::store::{FileStore, StatsStore};
use tokio::sync::Mutex;

use crate::{
    ApiConfig,
    assistant::{Assistant, FallbackAssistant, GeminiAssistant},
    clock::{Clock, SystemClock},
    config::{ConfigError, Environment},
    progress::StatsContainer,
    session::SessionRegistry,
};

#[derive(Clone)]
pub struct ApiState {
    /// The user's progress; every transition goes through this lock
    pub stats: Arc<Mutex<StatsContainer>>,
    pub sessions: SessionRegistry,
    pub assistant: FallbackAssistant,
    pub clock: Arc<dyn Clock>,
    /// Questions requested per quiz
    pub quiz_length: usize,
    pub frontend_url: String,
    pub environment: Environment,
}

impl ApiState {
    /// Production wiring: file-backed progress, Gemini, wall clock.
    pub fn new(config: &ApiConfig) -> anyhow::Result<Self> {
        let store = FileStore::new(config.data_dir.clone());
        tracing::info!(data_dir = %store.dir().display(), "Using file-backed progress store");

        if config.gemini_api_key.is_none() {
            tracing::warn!("DD_GEMINI_API_KEY not set, quizzes will use fallback questions");
        }
        let assistant = GeminiAssistant::from_config(config)?;

        Ok(Self::from_parts(
            config,
            Box::new(store),
            Arc::new(assistant),
            Arc::new(SystemClock),
        )?)
    }

    /// Assemble from explicit parts. Loads the saved progress.
    pub fn from_parts(
        config: &ApiConfig,
        store: Box<dyn StatsStore>,
        assistant: Arc<dyn Assistant>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        let offset = config.utc_offset()?;
        let container = StatsContainer::load(store, clock.now(), offset);

        Ok(Self {
            stats: Arc::new(Mutex::new(container)),
            sessions: SessionRegistry::new(),
            assistant: FallbackAssistant::new(assistant),
            clock,
            quiz_length: config.quiz_length,
            frontend_url: config.frontend_url.clone(),
            environment: config.env,
        })
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}
