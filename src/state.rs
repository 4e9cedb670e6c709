//! Application state: the assessment runner, the registry of live runs,
//! prompts/limits, and the optional OpenAI client.
//!
//! This module owns:
//!   - the run registry (by id), shared by HTTP and WebSocket handlers
//!   - the fallback question bank (config entries + built-in tables)
//!   - the prompts struct (from TOML or defaults)
//!   - optional OpenAI client
//!
//! Question resolution always tries the model first when it is configured and
//! falls back to the local bank otherwise.

use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::assessment::{AssessmentRunner, FallbackProvider, QuestionSource, RunError, RunHandle};
use crate::config::{load_app_config_from_env, AppConfig, Limits, Prompts};
use crate::domain::RunRequest;
use crate::openai::{OpenAI, OpenAIQuestionSource};
use crate::seeds::SeedBank;

#[derive(Clone)]
pub struct AppState {
    pub runner: AssessmentRunner,
    pub runs: Arc<RwLock<HashMap<Uuid, RunHandle>>>,
    pub openai: Option<OpenAI>,
    pub prompts: Prompts,
    pub limits: Limits,
}

impl AppState {
    /// Build state from env: load config, seed the fallback bank, init OpenAI.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let cfg = load_app_config_from_env().unwrap_or_default();

        let openai = OpenAI::from_env();
        if let Some(oa) = &openai {
            info!(target: "modlrn_backend", base_url = %oa.base_url, fast_model = %oa.fast_model, strong_model = %oa.strong_model, "OpenAI enabled.");
        } else {
            info!(target: "modlrn_backend", "OpenAI disabled (no OPENAI_API_KEY). Using local question bank.");
        }

        Self::from_config(cfg, openai)
    }

    /// Build state from an already loaded config.
    pub fn from_config(cfg: AppConfig, openai: Option<OpenAI>) -> Self {
        let bank = SeedBank::from_config(&cfg.questions);
        info!(target: "assessment", configured = bank.bank_size(), "Startup question bank inventory");

        let source: Option<Arc<dyn QuestionSource>> = openai.clone().map(|client| {
            Arc::new(OpenAIQuestionSource { client, prompts: cfg.prompts.clone() }) as Arc<dyn QuestionSource>
        });
        let fallback: Arc<dyn FallbackProvider> = Arc::new(bank);
        info!(
            target: "assessment",
            easy_secs = cfg.timing.easy_secs,
            medium_secs = cfg.timing.medium_secs,
            hard_secs = cfg.timing.hard_secs,
            max_questions = cfg.limits.max_questions,
            "Assessment timing and limits"
        );

        Self {
            runner: AssessmentRunner::new(source, fallback, cfg.timing),
            runs: Arc::new(RwLock::new(HashMap::new())),
            openai,
            prompts: cfg.prompts,
            limits: cfg.limits,
        }
    }

    /// Start a run and register it. Runs whose task has ended are pruned here.
    #[instrument(level = "info", skip(self), fields(topic = %request.topic, count = request.count))]
    pub async fn start_run(&self, request: RunRequest) -> Result<RunHandle, RunError> {
        let handle = self.runner.start(request).await?;
        let mut runs = self.runs.write().await;
        let before = runs.len();
        runs.retain(|_, h| !h.is_closed());
        if runs.len() < before {
            info!(target: "assessment", pruned = before - runs.len(), "Dropped ended runs");
        }
        runs.insert(handle.id(), handle.clone());
        Ok(handle)
    }

    /// Read-only access to a run handle by id.
    #[instrument(level = "debug", skip(self), fields(%id))]
    pub async fn get_run(&self, id: Uuid) -> Option<RunHandle> {
        self.runs.read().await.get(&id).cloned()
    }

    /// Unregister and tear down a run. Returns false for unknown ids.
    #[instrument(level = "info", skip(self), fields(%id))]
    pub async fn remove_run(&self, id: Uuid) -> bool {
        match self.runs.write().await.remove(&id) {
            Some(handle) => {
                handle.close();
                true
            }
            None => false,
        }
    }

    /// Tear down every live run (shutdown).
    #[instrument(level = "info", skip(self))]
    pub async fn close_all(&self) {
        let mut runs = self.runs.write().await;
        for handle in runs.values() {
            handle.close();
        }
        info!(target: "assessment", closed = runs.len(), "Closed all runs");
        runs.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Difficulty;

    fn request() -> RunRequest {
        RunRequest { topic: "Civil Engineering".into(), count: 3, difficulty: Difficulty::Easy }
    }

    #[tokio::test]
    async fn runs_are_registered_and_removed() {
        let state = AppState::from_config(AppConfig::default(), None);
        let handle = state.start_run(request()).await.unwrap();
        assert!(state.get_run(handle.id()).await.is_some());

        assert!(state.remove_run(handle.id()).await);
        assert!(state.get_run(handle.id()).await.is_none());
        assert!(!state.remove_run(handle.id()).await);
        assert!(handle.is_closed());
    }

    #[tokio::test]
    async fn close_all_tears_down_every_run() {
        let state = AppState::from_config(AppConfig::default(), None);
        let a = state.start_run(request()).await.unwrap();
        let b = state.start_run(request()).await.unwrap();
        state.close_all().await;
        assert!(a.is_closed() && b.is_closed());
        assert!(state.runs.read().await.is_empty());
    }
}
