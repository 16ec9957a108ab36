//! services/client/src/flows/tutor.rs
//!
//! The tutor tries an ordered list of strategies. The first answer wins; if
//! every strategy fails, the apology of the last one tried is returned. The
//! result is always something that can be shown to a child.

use crate::adapters::backend::{BackendClient, BackendTutor};
use crate::adapters::direct_llm::DirectChatTutor;
use crate::config::DirectProviderSettings;
use crybaby_core::ports::TutorStrategy;
use std::sync::Arc;
use tracing::{error, info};

/// Used only when the chain is empty.
pub const NO_TUTOR: &str = "The tutor is not available right now. Please try again later! 🧸";

pub struct Tutor {
    strategies: Vec<Arc<dyn TutorStrategy>>,
}

impl Tutor {
    pub fn new(strategies: Vec<Arc<dyn TutorStrategy>>) -> Self {
        Self { strategies }
    }

    /// The standard chain: the direct provider when it is switched on and has a
    /// key, then the backend proxy. With `fallback_to_backend` off, a usable
    /// direct provider is the only strategy.
    pub fn standard(
        direct: &DirectProviderSettings,
        backend: Arc<BackendClient>,
        fallback_to_backend: bool,
    ) -> Self {
        let mut strategies: Vec<Arc<dyn TutorStrategy>> = Vec::new();
        if let Some(key) = direct.usable_key() {
            strategies.push(Arc::new(DirectChatTutor::new(
                direct.base_url.clone(),
                key,
                direct.model.clone(),
            )));
        }
        if strategies.is_empty() || fallback_to_backend {
            strategies.push(Arc::new(BackendTutor::new(backend)));
        }
        Self::new(strategies)
    }

    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub async fn get_tutor_response(&self, prompt: &str) -> String {
        let mut apology = NO_TUTOR;
        for strategy in &self.strategies {
            match strategy.ask(prompt).await {
                Ok(answer) => {
                    info!("Tutor answer from {}", strategy.name());
                    return answer;
                }
                Err(e) => {
                    error!("Tutor strategy {} failed: {}", strategy.name(), e);
                    apology = strategy.apology();
                }
            }
        }
        apology.to_string()
    }
}
