//! The scoring contract realized by the backend.
//!
//! The client never grades answers itself; these functions exist so the
//! in-memory gateway and the tests can reproduce exactly what the server
//! computes.

use crate::model::{Answer, Question, Test};

/// Whether submitted content matches a question's correct answer.
///
/// Exact string equality after trimming surrounding whitespace,
/// case-sensitive, for both multiple-choice and open-ended questions.
#[must_use]
pub fn check_answer(question: &Question, submitted: &str) -> bool {
    submitted.trim() == question.correct_answer.trim()
}

/// Points earned for a submission: the question's full value or nothing.
#[must_use]
pub fn earned_points(question: &Question, submitted: &str) -> u32 {
    if check_answer(question, submitted) {
        question.points
    } else {
        0
    }
}

/// Final score for a result: the sum of earned points over correct
/// answers. Unanswered questions contribute nothing.
#[must_use]
pub fn tally_score(answers: &[Answer]) -> u32 {
    answers
        .iter()
        .filter(|a| a.is_correct)
        .map(|a| a.points_earned)
        .sum()
}

/// Score as a rounded percentage of the test's total points.
///
/// A test with zero total points yields 0, never a division error.
#[must_use]
pub fn percentage(score: u32, total_points: u32) -> u32 {
    if total_points == 0 {
        return 0;
    }
    let ratio = f64::from(score) / f64::from(total_points) * 100.0;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    {
        ratio.round() as u32
    }
}

/// Convenience: percentage for a score against a test definition.
#[must_use]
pub fn percentage_of(test: &Test, score: u32) -> u32 {
    percentage(score, test.total_points())
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
