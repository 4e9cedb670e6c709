//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - Turning raw start parameters into a validated `RunRequest`
//!   - Resolving question batches (model first, then local bank)
//!   - Answer explanations and tutor chat, each with a local stub fallback

use tracing::{debug, error, info, instrument};

use crate::config::Limits;
use crate::domain::{Difficulty, Question, QuestionOrigin, RunRequest};
use crate::error::ApiError;
use crate::protocol::{ChatIn, StudentContext};
use crate::state::AppState;

/// Validate start parameters. Missing count/difficulty take the defaults.
pub fn parse_run_request(
  topic: &str,
  count: Option<usize>,
  difficulty: Option<&str>,
  limits: &Limits,
) -> Result<RunRequest, ApiError> {
  let topic = topic.trim();
  if topic.is_empty() {
    return Err(ApiError::BadRequest("topic must not be empty".into()));
  }
  let count = count.unwrap_or(limits.default_questions);
  if count == 0 || count > limits.max_questions {
    return Err(ApiError::BadRequest(format!(
      "count must be between 1 and {}, got {}",
      limits.max_questions, count
    )));
  }
  let difficulty = match difficulty {
    Some(d) => d.parse::<Difficulty>().map_err(ApiError::BadRequest)?,
    None => Difficulty::default(),
  };
  Ok(RunRequest { topic: topic.to_string(), count, difficulty })
}

/// Standalone question batch, resolved the same way runs resolve theirs.
#[instrument(level = "info", skip(state), fields(topic = %request.topic, count = request.count))]
pub async fn fetch_questions(state: &AppState, request: &RunRequest) -> (Vec<Question>, QuestionOrigin) {
  let (questions, origin) = state.runner.resolve_questions(request).await;
  info!(target: "assessment", n = questions.len(), ?origin, "Question batch served");
  (questions, origin)
}

#[instrument(level = "info", skip(state, question, correct_answer), fields(%subject, question_len = question.len()))]
pub async fn do_explanation(state: &AppState, subject: &str, question: &str, correct_answer: &str) -> String {
  if let Some(oa) = &state.openai {
    match oa.explain_answer(&state.prompts, subject, question, correct_answer).await {
      Ok(t) if !t.is_empty() => return t,
      Ok(_) => error!(target: "modlrn_backend", "OpenAI explanation was empty; using stub fallback."),
      Err(e) => error!(target: "modlrn_backend", error = %e, "OpenAI explanation failed; using stub fallback."),
    }
  }
  explanation_stub(subject, question, correct_answer)
}

#[instrument(level = "info", skip(state, body), fields(history = body.conversation_history.len(), message_len = body.message.len()))]
pub async fn do_chat_reply(state: &AppState, body: &ChatIn) -> String {
  if let Some(oa) = &state.openai {
    let context = describe_student(&body.context.user);
    match oa.tutor_reply(&state.prompts, &context, &body.conversation_history, &body.message).await {
      Ok(t) => {
        debug!(target: "modlrn_backend", "Tutor reply via OpenAI.");
        t
      }
      Err(e) => {
        error!(target: "modlrn_backend", error = %e, "Tutor reply failed; using stub.");
        chat_stub(&body.message)
      }
    }
  } else {
    debug!(target: "modlrn_backend", "Tutor reply via stub.");
    chat_stub(&body.message)
  }
}

/// Student context block injected into the tutor's system prompt.
fn describe_student(user: &StudentContext) -> String {
  let mut out = format!("Courses: {}\n", user.courses.join(", "));
  out.push_str("\nAssignments:\n");
  for a in &user.assignments {
    out.push_str(&format!("- {}: {} (Due: {})\n", a.subject, a.title, a.due_date));
  }
  out.push_str("\nExams:\n");
  for e in &user.exams {
    out.push_str(&format!("- {}: {} (Date: {} at {})\n", e.subject, e.title, e.date, e.time));
  }
  out
}

const EXPLANATION_MIN_LEN: usize = 150;
const GENERIC_EXPLANATION: &str = "Understanding this concept requires knowledge of fundamental principles in this field. The correct answer represents the most accurate application of these principles to the given scenario, while the other options contain misconceptions or incomplete understanding of the core concepts.";

/// Subject-prefixed, keyword-driven explanation used without the model.
pub fn explanation_stub(subject: &str, question: &str, correct_answer: &str) -> String {
  let prefix = match subject {
    "Mechanical Engineering" => "In mechanical engineering, ",
    "Electrical Engineering" => "From an electrical engineering perspective, ",
    "Civil Engineering" => "According to civil engineering principles, ",
    "Computer Engineering" => "In computer engineering, ",
    "Chemical Engineering" => "Following chemical engineering concepts, ",
    "Aerospace Engineering" => "In aerospace engineering, ",
    "Biomedical Engineering" => "From a biomedical standpoint, ",
    "Industrial Engineering" => "In industrial engineering practice, ",
    "Software Engineering" => "Following software engineering best practices, ",
    "Materials Science" => "In materials science, ",
    _ => "The explanation is that ",
  };
  let q = question.to_lowercase();
  let has = |words: &[&str]| words.iter().any(|w| q.contains(w));

  let detail = match subject {
    "Mechanical Engineering" if has(&["heat", "thermodynamics"]) =>
      "This relates to thermodynamic principles where energy transfer is governed by temperature differentials. The correct answer follows from the First Law of Thermodynamics which states that energy cannot be created or destroyed, only transferred or converted.",
    "Mechanical Engineering" if has(&["fluid", "flow"]) =>
      "This is explained by fluid mechanics principles. The behavior of fluids under different conditions is governed by the conservation of mass, momentum, and energy equations.",
    "Mechanical Engineering" if has(&["stress", "strain", "material"]) =>
      "This is based on material mechanics principles. When forces are applied to materials, they experience stress and strain according to their material properties, which determine whether they deform elastically or plastically.",
    "Electrical Engineering" if has(&["circuit", "current", "voltage"]) =>
      "This follows from Ohm's Law and Kirchhoff's Laws which govern the behavior of electrical circuits. The relationship between voltage, current, and resistance is fundamental to circuit analysis.",
    "Electrical Engineering" if has(&["signal", "frequency"]) =>
      "This is based on signal processing theory. Signals can be analyzed in both time and frequency domains, with transformations between these domains governed by mathematical principles like the Fourier Transform.",
    "Electrical Engineering" if has(&["semiconductor", "diode", "transistor"]) =>
      "This relies on semiconductor physics. The behavior of semiconductor devices depends on their doping, bias conditions, and junction characteristics.",
    "Computer Engineering" if has(&["processor", "cpu", "architecture"]) =>
      "This relates to computer architecture design principles. Modern processors are designed with specific instruction sets, pipeline stages, and memory hierarchies that determine their performance characteristics.",
    "Computer Engineering" if has(&["memory", "cache"]) =>
      "This is based on memory system design principles. Computer memory is organized in a hierarchy with different levels of cache, main memory, and storage, each with its own speed, capacity, and volatility characteristics.",
    "Computer Engineering" if has(&["network", "protocol"]) =>
      "This follows from networking principles and protocols. Computer networks operate on a layered architecture, with each layer providing specific services and following established protocols for data transmission.",
    "Computer Engineering" if has(&["logic", "gate"]) =>
      "This is based on digital logic principles. Digital circuits are built from basic logic gates (AND, OR, NOT, etc.) that implement Boolean algebra operations and can be combined to create complex digital systems.",
    _ => "",
  };

  let mut out = format!("{}the correct answer is \"{}\". {}", prefix, correct_answer, detail);
  if out.len() < EXPLANATION_MIN_LEN {
    out.push_str(GENERIC_EXPLANATION);
  }
  out
}

/// Tiny tutor fallback for when the model is unavailable.
fn chat_stub(message: &str) -> String {
  let m = message.to_lowercase();
  if m.contains("exam") || m.contains("test") {
    "I can't reach the tutor service right now. Start with your next exam: list its topics, then work through practice questions on the weakest one first.".into()
  } else if m.contains("assignment") || m.contains("due") {
    "I can't reach the tutor service right now. Sort your assignments by due date and break the nearest one into small steps.".into()
  } else {
    "I can't reach the tutor service right now. Try a practice assessment on the subject you're studying and review the explanations afterwards.".into()
  }
}
