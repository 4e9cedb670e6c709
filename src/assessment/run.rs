//! The assessment run state machine: question sequencing, per-question
//! countdown bookkeeping, answer collection and completion.
//!
//! `AssessmentRun` is plain synchronous state. It does not own a timer: the
//! runner task calls [`AssessmentRun::tick`] once per countdown period and
//! serializes those calls with user actions.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::Timing;
use crate::domain::{Difficulty, Question};

use super::result::{derive_result, AssessmentResult};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    InProgress,
    Completed,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::InProgress => f.write_str("in progress"),
            RunStatus::Completed => f.write_str("completed"),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RunError {
    #[error("cannot {action}: run is {status}")]
    InvalidTransition { action: &'static str, status: RunStatus },
    #[error("a run needs at least one question")]
    NoQuestions,
    #[error("run is closed")]
    Closed,
}

/// What was recorded for a question.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Answer {
    Selected(String),
    /// Skip or timeout.
    Empty,
}

impl Answer {
    pub fn selection(&self) -> Option<&str> {
        match self {
            Answer::Selected(s) => Some(s),
            Answer::Empty => None,
        }
    }
}

/// Result of an answer/skip/timeout transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    Advanced,
    Completed(AssessmentResult),
}

/// Result of one countdown step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Tick {
    Counting(u32),
    TimedOut(Step),
}

/// The current question as shown to the test taker (no correct option).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    pub index: usize,
    pub text: String,
    pub options: Vec<String>,
    pub difficulty: Difficulty,
    pub time_budget: u32,
    /// Answer already recorded for this question, when revisited.
    pub selected: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RunSnapshot {
    pub id: Uuid,
    pub topic: String,
    pub status: RunStatus,
    pub current_index: usize,
    pub total: usize,
    pub answered: usize,
    pub time_remaining: u32,
    pub question: Option<QuestionView>,
}

#[derive(Debug)]
pub struct AssessmentRun {
    id: Uuid,
    topic: String,
    questions: Vec<Question>,
    current_index: usize,
    // One slot per question; `None` until something is recorded there.
    answers: Vec<Option<Answer>>,
    time_remaining: u32,
    timing: Timing,
    result: Option<AssessmentResult>,
}

impl AssessmentRun {
    pub fn new(
        id: Uuid,
        topic: impl Into<String>,
        questions: Vec<Question>,
        timing: Timing,
    ) -> Result<Self, RunError> {
        if questions.is_empty() {
            return Err(RunError::NoQuestions);
        }
        let answers = vec![None; questions.len()];
        let mut run = Self {
            id,
            topic: topic.into(),
            questions,
            current_index: 0,
            answers,
            time_remaining: 0,
            timing,
            result: None,
        };
        run.reset_countdown();
        Ok(run)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn total(&self) -> usize {
        self.questions.len()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    pub fn result(&self) -> Option<&AssessmentResult> {
        self.result.as_ref()
    }

    pub fn status(&self) -> RunStatus {
        if self.current_index == self.questions.len() {
            RunStatus::Completed
        } else {
            RunStatus::InProgress
        }
    }

    pub fn is_in_progress(&self) -> bool {
        self.status() == RunStatus::InProgress
    }

    /// Number of questions with a recorded answer (including empty ones).
    pub fn answered(&self) -> usize {
        self.answers.iter().filter(|a| a.is_some()).count()
    }

    pub fn answer_at(&self, index: usize) -> Option<&Answer> {
        self.answers.get(index).and_then(|a| a.as_ref())
    }

    pub fn answer(&mut self, selection: impl Into<String>) -> Result<Step, RunError> {
        self.record("answer", Answer::Selected(selection.into()))
    }

    pub fn skip(&mut self) -> Result<Step, RunError> {
        self.record("skip", Answer::Empty)
    }

    pub fn on_timeout(&mut self) -> Result<Step, RunError> {
        self.record("time out", Answer::Empty)
    }

    /// Move forward without recording anything. Returns whether the index changed.
    pub fn go_next(&mut self) -> Result<bool, RunError> {
        self.ensure_in_progress("go to the next question")?;
        if self.current_index + 1 >= self.questions.len() {
            return Ok(false);
        }
        self.current_index += 1;
        self.reset_countdown();
        Ok(true)
    }

    /// Move back without recording anything. Returns whether the index changed.
    pub fn go_previous(&mut self) -> Result<bool, RunError> {
        self.ensure_in_progress("go to the previous question")?;
        if self.current_index == 0 {
            return Ok(false);
        }
        self.current_index -= 1;
        self.reset_countdown();
        Ok(true)
    }

    /// One countdown step: remove a second and time out at zero.
    pub fn tick(&mut self) -> Result<Tick, RunError> {
        self.ensure_in_progress("tick")?;
        self.time_remaining = self.time_remaining.saturating_sub(1);
        if self.time_remaining > 0 {
            return Ok(Tick::Counting(self.time_remaining));
        }
        self.on_timeout().map(Tick::TimedOut)
    }

    pub fn snapshot(&self) -> RunSnapshot {
        let question = self.questions.get(self.current_index).map(|q| QuestionView {
            index: self.current_index,
            text: q.text.clone(),
            options: q.options.clone(),
            difficulty: q.difficulty,
            time_budget: self.timing.budget_for(q.difficulty),
            selected: self
                .answer_at(self.current_index)
                .and_then(Answer::selection)
                .map(str::to_string),
        });
        RunSnapshot {
            id: self.id,
            topic: self.topic.clone(),
            status: self.status(),
            current_index: self.current_index,
            total: self.questions.len(),
            answered: self.answered(),
            time_remaining: self.time_remaining,
            question,
        }
    }

    fn record(&mut self, action: &'static str, answer: Answer) -> Result<Step, RunError> {
        self.ensure_in_progress(action)?;
        self.answers[self.current_index] = Some(answer);

        if self.current_index + 1 < self.questions.len() {
            self.current_index += 1;
            self.reset_countdown();
            return Ok(Step::Advanced);
        }

        // Final question: the run is over.
        self.current_index = self.questions.len();
        self.time_remaining = 0;
        let result = derive_result(&self.questions, &self.answers);
        self.result = Some(result.clone());
        Ok(Step::Completed(result))
    }

    fn ensure_in_progress(&self, action: &'static str) -> Result<(), RunError> {
        match self.status() {
            RunStatus::InProgress => Ok(()),
            status => Err(RunError::InvalidTransition { action, status }),
        }
    }

    fn reset_countdown(&mut self) {
        if let Some(q) = self.questions.get(self.current_index) {
            self.time_remaining = self.timing.budget_for(q.difficulty);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(correct: &str, difficulty: Difficulty) -> Question {
        Question {
            text: format!("pick {}", correct),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_option: correct.into(),
            explanation: format!("{} is right", correct),
            difficulty,
        }
    }

    fn run_of(n: usize) -> AssessmentRun {
        let questions = (0..n).map(|_| q("a", Difficulty::Medium)).collect();
        AssessmentRun::new(Uuid::nil(), "Mechanical Engineering", questions, Timing::default()).unwrap()
    }

    #[test]
    fn empty_question_list_is_rejected() {
        let err = AssessmentRun::new(Uuid::nil(), "x", vec![], Timing::default()).unwrap_err();
        assert_eq!(err, RunError::NoQuestions);
    }

    #[test]
    fn answers_advance_linearly_until_completion() {
        let mut run = run_of(3);
        for i in 0..2 {
            assert_eq!(run.current_index(), i);
            assert_eq!(run.answered(), i);
            assert_eq!(run.answer("a").unwrap(), Step::Advanced);
            assert!(run.is_in_progress());
            assert!(run.current_index() < run.total());
        }
        let Step::Completed(result) = run.answer("b").unwrap() else { panic!("expected completion") };
        assert_eq!(run.status(), RunStatus::Completed);
        assert_eq!(run.current_index(), 3);
        assert_eq!(result.score, 2);
        assert_eq!(run.result(), Some(&result));
    }

    #[test]
    fn score_matches_correct_positions() {
        let questions = vec![
            q("a", Difficulty::Easy),
            q("b", Difficulty::Easy),
            q("c", Difficulty::Easy),
            q("d", Difficulty::Easy),
            q("a", Difficulty::Easy),
        ];
        let mut run = AssessmentRun::new(Uuid::nil(), "Civil Engineering", questions, Timing::default()).unwrap();
        run.answer("a").unwrap();
        run.answer("b").unwrap();
        run.answer("a").unwrap();
        run.answer("d").unwrap();
        let Step::Completed(result) = run.skip().unwrap() else { panic!("expected completion") };
        assert_eq!(result.score, 3);
        assert_eq!(result.detailed_results.len(), 5);
        assert_eq!(result.detailed_results[2].user_answer.as_deref(), Some("a"));
        assert_eq!(result.detailed_results[4].user_answer, None);
    }

    #[test]
    fn actions_after_completion_are_invalid_transitions() {
        let mut run = run_of(1);
        run.answer("a").unwrap();
        let completed = RunError::InvalidTransition { action: "answer", status: RunStatus::Completed };
        assert_eq!(run.answer("a").unwrap_err(), completed);
        assert!(matches!(run.skip(), Err(RunError::InvalidTransition { .. })));
        assert!(matches!(run.go_next(), Err(RunError::InvalidTransition { .. })));
        assert!(matches!(run.go_previous(), Err(RunError::InvalidTransition { .. })));
        assert!(matches!(run.tick(), Err(RunError::InvalidTransition { .. })));
        assert_eq!(run.current_index(), 1);
    }

    #[test]
    fn next_on_last_question_is_a_no_op() {
        let mut run = run_of(2);
        assert!(run.go_next().unwrap());
        let before = run.snapshot();
        assert!(!run.go_next().unwrap());
        assert_eq!(run.snapshot(), before);
        assert!(run.is_in_progress());
    }

    #[test]
    fn previous_on_first_question_is_a_no_op() {
        let mut run = run_of(2);
        assert!(!run.go_previous().unwrap());
        assert_eq!(run.current_index(), 0);
    }

    #[test]
    fn navigation_records_nothing_and_resets_countdown() {
        let mut run = run_of(3);
        run.tick().unwrap();
        run.tick().unwrap();
        assert_eq!(run.time_remaining(), 28);
        run.go_next().unwrap();
        assert_eq!(run.answered(), 0);
        assert_eq!(run.time_remaining(), 30);
        run.go_previous().unwrap();
        assert_eq!(run.current_index(), 0);
        assert_eq!(run.time_remaining(), 30);
    }

    #[test]
    fn revisited_question_shows_and_replaces_prior_answer() {
        let mut run = run_of(3);
        run.answer("b").unwrap();
        run.go_previous().unwrap();
        assert_eq!(run.snapshot().question.unwrap().selected.as_deref(), Some("b"));
        run.answer("a").unwrap();
        assert_eq!(run.answer_at(0), Some(&Answer::Selected("a".into())));
        assert_eq!(run.current_index(), 1);
    }

    #[test]
    fn final_answer_completes_even_with_unvisited_slots() {
        let mut run = run_of(3);
        run.go_next().unwrap();
        run.go_next().unwrap();
        let Step::Completed(result) = run.answer("a").unwrap() else { panic!("expected completion") };
        assert_eq!(result.score, 1);
        assert_eq!(result.total, 3);
        assert_eq!(result.detailed_results[0].user_answer, None);
    }

    #[test]
    fn countdown_budget_follows_difficulty() {
        let questions = vec![q("a", Difficulty::Easy), q("a", Difficulty::Hard), q("a", Difficulty::Medium)];
        let mut run = AssessmentRun::new(Uuid::nil(), "x", questions, Timing::default()).unwrap();
        assert_eq!(run.time_remaining(), 20);
        run.skip().unwrap();
        assert_eq!(run.time_remaining(), 40);
        run.skip().unwrap();
        assert_eq!(run.time_remaining(), 30);
    }

    #[test]
    fn countdown_reaching_zero_matches_skip() {
        let mut timed = run_of(3);
        let mut skipped = run_of(3);
        timed.answer("a").unwrap();
        skipped.answer("a").unwrap();

        for remaining in (1..30).rev() {
            assert_eq!(timed.tick().unwrap(), Tick::Counting(remaining));
        }
        assert_eq!(timed.tick().unwrap(), Tick::TimedOut(Step::Advanced));
        assert_eq!(skipped.skip().unwrap(), Step::Advanced);

        assert_eq!(timed.snapshot(), skipped.snapshot());
        assert_eq!(timed.answer_at(1), Some(&Answer::Empty));
        assert_eq!(timed.answer_at(1), skipped.answer_at(1));
    }

    #[test]
    fn timeout_on_last_question_completes() {
        let mut run = run_of(1);
        for _ in 0..29 {
            run.tick().unwrap();
        }
        let Tick::TimedOut(Step::Completed(result)) = run.tick().unwrap() else { panic!("expected timeout completion") };
        assert_eq!(result.score, 0);
        assert_eq!(run.status(), RunStatus::Completed);
        assert!(run.snapshot().question.is_none());
    }
}
