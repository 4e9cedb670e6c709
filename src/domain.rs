//! Domain models used by the backend: difficulty, questions, run requests and question origin.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Number of options every multiple-choice question carries.
pub const OPTIONS_PER_QUESTION: usize = 4;

/// How hard a question is. Also decides the per-question time budget.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
  Easy,
  #[default]
  Medium,
  Hard,
}

impl Difficulty {
  pub fn as_str(&self) -> &'static str {
    match self {
      Difficulty::Easy => "easy",
      Difficulty::Medium => "medium",
      Difficulty::Hard => "hard",
    }
  }
}

impl fmt::Display for Difficulty {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Difficulty {
  type Err = String;

  /// Case-insensitive: the dashboard sends "Easy", the model sends "easy".
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "easy" => Ok(Difficulty::Easy),
      "medium" => Ok(Difficulty::Medium),
      "hard" => Ok(Difficulty::Hard),
      other => Err(format!("unknown difficulty '{}' (expected easy, medium or hard)", other)),
    }
  }
}

/// A multiple-choice question. Immutable once handed to a run.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Question {
  pub text: String,
  pub options: Vec<String>,
  pub correct_option: String,
  #[serde(default)]
  pub explanation: String,
  #[serde(default)]
  pub difficulty: Difficulty,
}

impl Question {
  /// Shape check applied to every question that enters a run:
  /// non-empty text, four distinct options, and the correct option among them.
  pub fn validate(&self) -> Result<(), String> {
    if self.text.trim().is_empty() {
      return Err("question text is empty".into());
    }
    if self.options.len() != OPTIONS_PER_QUESTION {
      return Err(format!("expected {} options, got {}", OPTIONS_PER_QUESTION, self.options.len()));
    }
    for (i, opt) in self.options.iter().enumerate() {
      if opt.trim().is_empty() {
        return Err(format!("option {} is empty", i));
      }
      if self.options[..i].contains(opt) {
        return Err(format!("duplicate option '{}'", opt));
      }
    }
    if !self.options.contains(&self.correct_option) {
      return Err(format!("correct option '{}' is not one of the options", self.correct_option));
    }
    Ok(())
  }
}

/// Parameters of one assessment attempt, passed explicitly into the runner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunRequest {
  pub topic: String,
  pub count: usize,
  pub difficulty: Difficulty,
}

/// Where did the questions of a run come from?
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum QuestionOrigin {
  Remote,   // generated by the language model
  Fallback, // local bank / built-in tables
}
