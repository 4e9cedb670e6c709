//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::assessment::{AssessmentResult, RunSnapshot};
use crate::domain::{Difficulty, Question, QuestionOrigin};
use crate::openai::ChatTurn;
use crate::results::LeaderboardEntry;

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    StartRun {
        topic: String,
        #[serde(default)]
        count: Option<usize>,
        #[serde(default)]
        difficulty: Option<String>,
    },
    Answer {
        selection: String,
    },
    Skip,
    Next,
    Previous,
    EndRun,
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    /// Questions are being resolved; a `run` or `error` follows.
    Loading {
        topic: String,
    },
    Run {
        #[serde(skip_serializing_if = "Option::is_none")]
        origin: Option<QuestionOrigin>,
        run: RunSnapshot,
    },
    Tick {
        #[serde(rename = "questionIndex")]
        question_index: usize,
        remaining: u32,
    },
    Completed {
        result: AssessmentResult,
    },
    Error {
        message: String,
    },
}

// ---- HTTP DTOs ----

#[derive(Debug, Serialize)]
pub struct HealthOut {
    pub ok: bool,
}

#[derive(Debug, Deserialize)]
pub struct StartRunIn {
    pub topic: String,
    #[serde(default)]
    pub count: Option<usize>,
    #[serde(default)]
    pub difficulty: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StartRunOut {
    pub origin: QuestionOrigin,
    pub run: RunSnapshot,
}

#[derive(Debug, Deserialize)]
pub struct AnswerIn {
    pub selection: String,
}

#[derive(Debug, Deserialize)]
pub struct QuestionsQuery {
    pub subject: Option<String>,
    pub count: Option<usize>,
    pub difficulty: Option<String>,
}

/// Question as served by `/api/v1/questions` (includes the correct answer).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionOut {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub explanation: String,
    pub difficulty: Difficulty,
}

impl From<Question> for QuestionOut {
    fn from(q: Question) -> Self {
        Self {
            question: q.text,
            options: q.options,
            correct_answer: q.correct_option,
            explanation: q.explanation,
            difficulty: q.difficulty,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct QuestionsOut {
    pub origin: QuestionOrigin,
    pub questions: Vec<QuestionOut>,
}

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    pub subject: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LeaderboardOut {
    pub subject: String,
    pub entries: Vec<LeaderboardEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplanationIn {
    pub subject: String,
    pub question: String,
    pub correct_answer: String,
}

#[derive(Debug, Serialize)]
pub struct ExplanationOut {
    pub explanation: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatIn {
    pub message: String,
    #[serde(default)]
    pub conversation_history: Vec<ChatTurn>,
    #[serde(default)]
    pub context: ChatContext,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChatContext {
    #[serde(default)]
    pub user: StudentContext,
}

/// What the tutor knows about the student.
#[derive(Debug, Default, Deserialize)]
pub struct StudentContext {
    #[serde(default)]
    pub courses: Vec<String>,
    #[serde(default)]
    pub assignments: Vec<AssignmentIn>,
    #[serde(default)]
    pub exams: Vec<ExamIn>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentIn {
    pub subject: String,
    pub title: String,
    #[serde(default)]
    pub due_date: String,
}

#[derive(Debug, Deserialize)]
pub struct ExamIn {
    pub subject: String,
    pub title: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub time: String,
}

#[derive(Debug, Serialize)]
pub struct ChatOut {
    pub reply: String,
}
