//! Loading application configuration (prompts, timing, limits, optional question bank) from TOML.
//!
//! See `AppConfig` and `Prompts` for expected schema. Every section is optional.

use std::time::Duration;

use serde::Deserialize;
use tracing::{info, error};

use crate::domain::{Difficulty, Question};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
  #[serde(default)]
  pub prompts: Prompts,
  #[serde(default)]
  pub timing: Timing,
  #[serde(default)]
  pub limits: Limits,
  #[serde(default)]
  pub questions: Vec<QuestionCfg>,
}

/// Question entry accepted in TOML configuration (the local bank).
#[derive(Clone, Debug, Deserialize)]
pub struct QuestionCfg {
  pub topic: String,
  pub text: String,
  pub options: Vec<String>,
  pub correct_option: String,
  #[serde(default)] pub explanation: String,
  #[serde(default)] pub difficulty: Option<Difficulty>,
}

impl QuestionCfg {
  pub fn to_question(&self) -> Question {
    Question {
      text: self.text.clone(),
      options: self.options.clone(),
      correct_option: self.correct_option.clone(),
      explanation: self.explanation.clone(),
      difficulty: self.difficulty.unwrap_or_default(),
    }
  }
}

/// Countdown policy. The per-difficulty budget is the only countdown a run uses.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Timing {
  pub easy_secs: u32,
  pub medium_secs: u32,
  pub hard_secs: u32,
  /// Length of one countdown step; one step removes one second from the budget.
  pub tick_millis: u64,
  /// How long a completed run stays queryable before its task exits.
  pub completed_retention_secs: u64,
}

impl Default for Timing {
  fn default() -> Self {
    Self {
      easy_secs: 20,
      medium_secs: 30,
      hard_secs: 40,
      tick_millis: 1000,
      completed_retention_secs: 30 * 60,
    }
  }
}

impl Timing {
  pub fn budget_for(&self, difficulty: Difficulty) -> u32 {
    match difficulty {
      Difficulty::Easy => self.easy_secs,
      Difficulty::Medium => self.medium_secs,
      Difficulty::Hard => self.hard_secs,
    }
  }

  pub fn tick_period(&self) -> Duration {
    Duration::from_millis(self.tick_millis.max(1))
  }

  pub fn completed_retention(&self) -> Duration {
    Duration::from_secs(self.completed_retention_secs)
  }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Limits {
  pub default_questions: usize,
  pub max_questions: usize,
}

impl Default for Limits {
  fn default() -> Self {
    Self { default_questions: 5, max_questions: 25 }
  }
}

/// Prompts used by the model client. Defaults target engineering assessments.
/// You can override any of them in TOML if you need to tune tone/structure.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  // Question generation
  pub questions_system: String,
  pub questions_user_template: String,
  // Explanation of a correct answer
  pub explanation_system: String,
  pub explanation_user_template: String,
  // Tutor chat
  pub chat_system_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      questions_system: "You are an engineering assessment author. Respond ONLY with strict JSON.".into(),
      questions_user_template: "Generate {count} multiple-choice questions on {topic} with {difficulty} difficulty.\n\n{guidance}\n\nThe questions MUST be specifically about core concepts in {topic} and should NOT be general knowledge that could apply to any engineering field.\n\nEach question should:\n1. Be specifically relevant to {topic}\n2. Test understanding of fundamental principles, not just memorization\n3. Have 4 distinct options with one clear correct answer and 3 plausible distractors\n4. Include a detailed explanation of why the correct answer is right and why the other options are wrong\n\nReturn JSON: {\"questions\": [{\"question\": string, \"options\": [string, string, string, string], \"correctAnswer\": string (exactly one of options), \"explanation\": string, \"difficulty\": \"{difficulty}\"}]}".into(),
      explanation_system: "You are an engineering tutor. Explain answers clearly in 3-4 sentences.".into(),
      explanation_user_template: "Subject: {topic}\nQuestion: {question}\nCorrect answer: {correct_answer}\nExplain why this answer is correct and why common alternatives are wrong.".into(),
      chat_system_template: "You are an AI educational assistant for a college student.\nYou have access to the following student information:\n\n{context}\n\nProvide helpful, clear, and concise responses to the student's questions. Focus on being educational and supportive.\nIf asked about topics not in your knowledge, provide general educational guidance rather than making up specific details.".into(),
    }
  }
}

/// Attempt to load `AppConfig` from APP_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_app_config_from_env() -> Option<AppConfig> {
  let path = std::env::var("APP_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<AppConfig>(&s) {
      Ok(cfg) => {
        info!(target: "modlrn_backend", %path, bank = cfg.questions.len(), "Loaded app config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "modlrn_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "modlrn_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
