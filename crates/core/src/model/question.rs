use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{QuestionId, TestId};

//
// ─── QUESTION TYPES ────────────────────────────────────────────────────────────
//

/// The kind of a question, tagged on the wire as `question_type`.
///
/// Multiple-choice questions carry their ordered option texts; the stored
/// correct answer is compared against the selected option's literal text,
/// not an index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "question_type", rename_all = "snake_case")]
pub enum QuestionKind {
    MultipleChoice { options: Vec<String> },
    OpenEnded,
}

/// A single question within a test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub test_id: TestId,
    #[serde(rename = "question_text")]
    pub text: String,
    #[serde(flatten)]
    pub kind: QuestionKind,
    pub correct_answer: String,
    pub points: u32,
}

impl Question {
    /// Create a validated question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyText` if the question text is blank,
    /// `QuestionError::TooFewOptions` if a multiple-choice question has
    /// fewer than two options, and `QuestionError::ZeroPoints` if the
    /// point value is zero.
    pub fn new(
        id: QuestionId,
        test_id: TestId,
        text: impl Into<String>,
        kind: QuestionKind,
        correct_answer: impl Into<String>,
        points: u32,
    ) -> Result<Self, QuestionError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(QuestionError::EmptyText);
        }
        if let QuestionKind::MultipleChoice { options } = &kind {
            if options.len() < 2 {
                return Err(QuestionError::TooFewOptions { got: options.len() });
            }
        }
        if points == 0 {
            return Err(QuestionError::ZeroPoints);
        }

        Ok(Self {
            id,
            test_id,
            text,
            kind,
            correct_answer: correct_answer.into(),
            points,
        })
    }

    /// Option texts for a multiple-choice question, or `None` for open-ended.
    #[must_use]
    pub fn options(&self) -> Option<&[String]> {
        match &self.kind {
            QuestionKind::MultipleChoice { options } => Some(options),
            QuestionKind::OpenEnded => None,
        }
    }

    #[must_use]
    pub fn is_multiple_choice(&self) -> bool {
        matches!(self.kind, QuestionKind::MultipleChoice { .. })
    }
}

//
// ─── QUESTION VALIDATION ERRORS ────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text is empty")]
    EmptyText,

    #[error("multiple-choice question needs at least 2 options, got {got}")]
    TooFewOptions { got: usize },

    #[error("question must be worth at least 1 point")]
    ZeroPoints,
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn choice(options: &[&str]) -> QuestionKind {
        QuestionKind::MultipleChoice {
            options: options.iter().map(ToString::to_string).collect(),
        }
    }

    #[test]
    fn question_fails_if_text_blank() {
        let err = Question::new(
            QuestionId::new(1),
            TestId::new(1),
            "   ",
            QuestionKind::OpenEnded,
            "42",
            1,
        )
        .unwrap_err();

        assert_eq!(err, QuestionError::EmptyText);
    }

    #[test]
    fn multiple_choice_requires_two_options() {
        let err = Question::new(
            QuestionId::new(1),
            TestId::new(1),
            "Pick one",
            choice(&["only"]),
            "only",
            1,
        )
        .unwrap_err();

        assert!(matches!(err, QuestionError::TooFewOptions { got: 1 }));
    }

    #[test]
    fn question_requires_positive_points() {
        let err = Question::new(
            QuestionId::new(1),
            TestId::new(1),
            "Worth nothing?",
            QuestionKind::OpenEnded,
            "no",
            0,
        )
        .unwrap_err();

        assert_eq!(err, QuestionError::ZeroPoints);
    }

    #[test]
    fn valid_question_exposes_options() {
        let q = Question::new(
            QuestionId::new(5),
            TestId::new(1),
            "2 + 2 = ?",
            choice(&["3", "4"]),
            "4",
            2,
        )
        .unwrap();

        assert!(q.is_multiple_choice());
        assert_eq!(q.options(), Some(&["3".to_string(), "4".to_string()][..]));
        assert_eq!(q.points, 2);
    }

    #[test]
    fn open_ended_has_no_options() {
        let q = Question::new(
            QuestionId::new(6),
            TestId::new(1),
            "Explain ownership",
            QuestionKind::OpenEnded,
            "moves",
            3,
        )
        .unwrap();

        assert!(!q.is_multiple_choice());
        assert_eq!(q.options(), None);
    }
}
