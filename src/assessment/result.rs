//! Score derivation for a completed run.

use serde::{Deserialize, Serialize};

use crate::domain::Question;

use super::run::Answer;

/// Per-question outcome, in question order.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DetailedResult {
    pub question: String,
    pub options: Vec<String>,
    /// `None` is the empty marker: skipped, timed out or never answered.
    pub user_answer: Option<String>,
    pub correct_answer: String,
    pub is_correct: bool,
    pub explanation: String,
}

/// Completion payload of a run. Derived once, read-only afterward.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentResult {
    pub score: usize,
    pub total: usize,
    pub detailed_results: Vec<DetailedResult>,
}

impl AssessmentResult {
    /// Score as a rounded percentage of `total`.
    pub fn percentage(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        ((self.score as f64 / self.total as f64) * 100.0).round() as u32
    }
}

/// `answers` holds one slot per question; an unfilled slot scores like an empty answer.
pub fn derive_result(questions: &[Question], answers: &[Option<Answer>]) -> AssessmentResult {
    let detailed_results: Vec<DetailedResult> = questions
        .iter()
        .enumerate()
        .map(|(i, q)| {
            let user_answer = answers
                .get(i)
                .and_then(|a| a.as_ref())
                .and_then(|a| a.selection())
                .map(str::to_string);
            let is_correct = user_answer.as_deref() == Some(q.correct_option.as_str());
            DetailedResult {
                question: q.text.clone(),
                options: q.options.clone(),
                user_answer,
                correct_answer: q.correct_option.clone(),
                is_correct,
                explanation: q.explanation.clone(),
            }
        })
        .collect();

    AssessmentResult {
        score: detailed_results.iter().filter(|r| r.is_correct).count(),
        total: questions.len(),
        detailed_results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Difficulty;

    fn q(correct: &str) -> Question {
        Question {
            text: format!("pick {}", correct),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_option: correct.into(),
            explanation: "because".into(),
            difficulty: Difficulty::Medium,
        }
    }

    #[test]
    fn score_counts_exact_matches() {
        let questions = vec![q("a"), q("b"), q("c"), q("d"), q("a")];
        let answers = vec![
            Some(Answer::Selected("a".into())),
            Some(Answer::Selected("b".into())),
            Some(Answer::Selected("a".into())),
            Some(Answer::Selected("d".into())),
            Some(Answer::Empty),
        ];
        let result = derive_result(&questions, &answers);
        assert_eq!(result.score, 3);
        assert_eq!(result.total, 5);
        let flags: Vec<bool> = result.detailed_results.iter().map(|r| r.is_correct).collect();
        assert_eq!(flags, vec![true, true, false, true, false]);
        assert_eq!(result.detailed_results[4].user_answer, None);
        assert_eq!(result.percentage(), 60);
    }

    #[test]
    fn missing_slots_score_as_empty() {
        let questions = vec![q("a"), q("b")];
        let result = derive_result(&questions, &[Some(Answer::Selected("a".into()))]);
        assert_eq!(result.score, 1);
        assert_eq!(result.detailed_results[1].user_answer, None);
        assert!(!result.detailed_results[1].is_correct);
    }
}
