//! Minimal OpenAI-compatible client for our use-cases.
//!
//! We only call chat.completions and request either plain text or a JSON object.
//! Any OpenAI-compatible endpoint works (set OPENAI_BASE_URL), including
//! Gemini's compatibility endpoint.
//! Calls are instrumented and log model names, latencies, and response sizes (not contents).
//!
//! NOTE: We never log the API key and we keep payload truncations short to avoid PII leaks.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

use crate::assessment::{QuestionSource, SourceError};
use crate::catalog::guidance_for;
use crate::config::Prompts;
use crate::domain::{Difficulty, Question, RunRequest};
use crate::util::{fill_template, strip_code_fences, trunc_for_log};

#[derive(Clone)]
pub struct OpenAI {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub fast_model: String,
  pub strong_model: String,
}

/// One turn of a chat conversation as sent to the model.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatTurn {
  pub role: String,
  pub content: String,
}

impl ChatTurn {
  pub fn new(role: &str, content: impl Into<String>) -> Self {
    Self { role: role.into(), content: content.into() }
  }

  /// Frontends label the tutor's turns "model" or "bot"; the API wants "assistant".
  fn normalized(&self) -> Self {
    let role = match self.role.as_str() {
      "user" | "system" => self.role.as_str(),
      _ => "assistant",
    };
    Self::new(role, self.content.clone())
  }
}

impl OpenAI {
  /// Construct the client if we find OPENAI_API_KEY; otherwise return None.
  pub fn from_env() -> Option<Self> {
    let api_key = std::env::var("OPENAI_API_KEY").ok()?;
    let base_url =
      std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
    let fast_model =
      std::env::var("OPENAI_FAST_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());
    let strong_model =
      std::env::var("OPENAI_STRONG_MODEL").unwrap_or_else(|_| "gpt-4o".into());

    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .ok()?;

    Some(Self { client, api_key, base_url, fast_model, strong_model })
  }

  /// Chat completion returning the raw assistant text.
  #[instrument(level = "info", skip(self, messages), fields(turns = messages.len()))]
  async fn chat(
    &self,
    model: &str,
    messages: Vec<ChatTurn>,
    temperature: f32,
    json_mode: bool,
  ) -> Result<String, String> {
    let url = format!("{}/chat/completions", self.base_url);
    let req = ChatCompletionRequest {
      model: model.to_string(),
      messages,
      temperature,
      response_format: json_mode.then(|| ResponseFormat { r#type: "json_object".into() }),
      max_tokens: None,
    };

    let res = self.client.post(&url)
      .header(USER_AGENT, "modlrn-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&req).send().await.map_err(|e| e.to_string())?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let msg = extract_openai_error(&body).unwrap_or(body);
      return Err(format!("OpenAI HTTP {}: {}", status, trunc_for_log(&msg, 300)));
    }

    let body: ChatCompletionResponse = res.json().await.map_err(|e| e.to_string())?;
    if let Some(usage) = &body.usage {
      info!(prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "OpenAI usage");
    }
    let text = body.choices.first()
      .and_then(|c| c.message.content.clone())
      .unwrap_or_default().trim().to_string();

    Ok(text)
  }

  /// Plain-text completion with a system and a user message.
  async fn chat_plain(&self, model: &str, system: &str, user: &str, temperature: f32) -> Result<String, String> {
    let messages = vec![ChatTurn::new("system", system), ChatTurn::new("user", user)];
    self.chat(model, messages, temperature, false).await
  }

  // --- High-level helpers (domain-specialized) ---

  /// Generate a batch of multiple-choice questions.
  #[instrument(
    level = "info",
    skip(self, prompts, request),
    fields(topic = %request.topic, count = request.count, difficulty = %request.difficulty, model = %self.strong_model)
  )]
  pub async fn generate_questions(
    &self,
    prompts: &Prompts,
    request: &RunRequest,
  ) -> Result<Vec<Question>, SourceError> {
    let count = request.count.to_string();
    let user = fill_template(
      &prompts.questions_user_template,
      &[
        ("count", &count),
        ("topic", &request.topic),
        ("difficulty", request.difficulty.as_str()),
        ("guidance", guidance_for(&request.topic)),
      ],
    );

    let start = Instant::now();
    let raw = self
      .chat_plain_json(&prompts.questions_system, &user)
      .await
      .map_err(|e| {
        error!(elapsed = ?start.elapsed(), error = %e, "Model call failed during question generation");
        SourceError::Unavailable(e)
      })?;
    info!(elapsed = ?start.elapsed(), bytes = raw.len(), "Model response received");

    let mut questions = parse_question_payload(&raw, request.difficulty).map_err(|e| {
      warn!(error = %e, payload = %trunc_for_log(&raw, 200), "Unusable question payload");
      e
    })?;
    if questions.len() > request.count {
      warn!(returned = questions.len(), requested = request.count, "Model returned extra questions; truncating");
      questions.truncate(request.count);
    }
    Ok(questions)
  }

  async fn chat_plain_json(&self, system: &str, user: &str) -> Result<String, String> {
    let messages = vec![ChatTurn::new("system", system), ChatTurn::new("user", user)];
    self.chat(&self.strong_model, messages, 0.7, true).await
  }

  /// Explain why `correct_answer` answers `question`.
  #[instrument(level = "info", skip(self, prompts, question, correct_answer), fields(%subject, question_len = question.len()))]
  pub async fn explain_answer(
    &self,
    prompts: &Prompts,
    subject: &str,
    question: &str,
    correct_answer: &str,
  ) -> Result<String, String> {
    let user = fill_template(
      &prompts.explanation_user_template,
      &[("topic", subject), ("question", question), ("correct_answer", correct_answer)],
    );
    self.chat_plain(&self.fast_model, &prompts.explanation_system, &user, 0.2).await
  }

  /// Tutor chat: system context, prior turns, then the new message.
  #[instrument(level = "info", skip(self, prompts, context, history, message), fields(history = history.len(), message_len = message.len()))]
  pub async fn tutor_reply(
    &self,
    prompts: &Prompts,
    context: &str,
    history: &[ChatTurn],
    message: &str,
  ) -> Result<String, String> {
    let system = fill_template(&prompts.chat_system_template, &[("context", context)]);
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatTurn::new("system", system));
    messages.extend(history.iter().map(ChatTurn::normalized));
    messages.push(ChatTurn::new("user", message));
    self.chat(&self.fast_model, messages, 0.4, false).await
  }
}

/// `QuestionSource` backed by the model.
pub struct OpenAIQuestionSource {
  pub client: OpenAI,
  pub prompts: Prompts,
}

#[async_trait]
impl QuestionSource for OpenAIQuestionSource {
  async fn fetch(&self, request: &RunRequest) -> Result<Vec<Question>, SourceError> {
    self.client.generate_questions(&self.prompts, request).await
  }
}

/// Question as the model writes it (field names from the prompt).
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireQuestion {
  #[serde(alias = "text")]
  question: String,
  options: Vec<String>,
  #[serde(alias = "correctOption")]
  correct_answer: String,
  #[serde(default)]
  explanation: String,
  #[serde(default)]
  difficulty: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WirePayload {
  Wrapped { questions: Vec<WireQuestion> },
  Bare(Vec<WireQuestion>),
}

/// Parse the model's reply: either `{"questions": [...]}` or a bare array,
/// optionally inside a markdown code fence. Shape checks happen in the runner.
pub fn parse_question_payload(raw: &str, requested: Difficulty) -> Result<Vec<Question>, SourceError> {
  let body = strip_code_fences(raw);
  let payload: WirePayload = serde_json::from_str(body)
    .map_err(|e| SourceError::Malformed(format!("JSON parse error: {}", e)))?;
  let items = match payload {
    WirePayload::Wrapped { questions } => questions,
    WirePayload::Bare(questions) => questions,
  };
  if items.is_empty() {
    return Err(SourceError::Malformed("empty question list".into()));
  }

  Ok(items
    .into_iter()
    .map(|w| Question {
      text: w.question.trim().to_string(),
      options: w.options.into_iter().map(|o| o.trim().to_string()).collect(),
      correct_option: w.correct_answer.trim().to_string(),
      explanation: w.explanation,
      difficulty: w
        .difficulty
        .and_then(|d| d.parse().ok())
        .unwrap_or(requested),
    })
    .collect())
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatTurn>,
  temperature: f32,
  #[serde(skip_serializing_if = "Option::is_none")]
  response_format: Option<ResponseFormat>,
  #[serde(skip_serializing_if = "Option::is_none")]
  max_tokens: Option<u32>,
}
#[derive(Serialize)]
struct ResponseFormat { #[serde(rename = "type")] r#type: String }

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice { message: ChatMessageResp }
#[derive(Deserialize)]
struct ChatMessageResp { content: Option<String> }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}

/// Try to extract a clean error message from OpenAI error body.
fn extract_openai_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  serde_json::from_str::<EWrap>(body).ok().map(|w| w.error.message)
}
