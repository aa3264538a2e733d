//! Read-only breakdown of a completed result.

use quiz_core::model::{QuestionId, QuestionKind, ResultDetail, ResultId};
use quiz_core::scoring;

/// Per-question row of a result breakdown.
///
/// This is intentionally **not** a UI view-model: no pre-formatted
/// strings, no localization assumptions. The UI formats as needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionOutcome {
    pub question_id: QuestionId,
    pub text: String,
    pub kind: QuestionKind,
    pub points: u32,
    pub correct_answer: String,
    /// What the user submitted, if an answer reached the backend.
    pub submitted: Option<String>,
    pub is_correct: bool,
    pub points_earned: u32,
}

/// A completed result folded into display-ready numbers and rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultBreakdown {
    pub result_id: ResultId,
    pub test_title: String,
    pub rows: Vec<QuestionOutcome>,
    pub score: u32,
    pub max_score: u32,
    pub percentage: u32,
    pub completion_time: Option<u32>,
    pub completed: bool,
}

impl ResultBreakdown {
    /// Fold a fetched result into one row per question, in test order.
    ///
    /// Score and correctness come from the backend; this never re-grades.
    #[must_use]
    pub fn assemble(detail: &ResultDetail) -> Self {
        let rows = detail
            .test
            .questions
            .iter()
            .map(|question| {
                let answer = detail.answer_for(question.id);
                QuestionOutcome {
                    question_id: question.id,
                    text: question.text.clone(),
                    kind: question.kind.clone(),
                    points: question.points,
                    correct_answer: question.correct_answer.clone(),
                    submitted: answer.map(|a| a.content.clone()),
                    is_correct: answer.is_some_and(|a| a.is_correct),
                    points_earned: answer.map_or(0, |a| a.points_earned),
                }
            })
            .collect();

        let score = detail.result.score.unwrap_or(0);
        let max_score = detail.test.total_points();
        Self {
            result_id: detail.result.id,
            test_title: detail.test.title.clone(),
            rows,
            score,
            max_score,
            percentage: scoring::percentage(score, max_score),
            completion_time: detail.result.completion_time,
            completed: detail.result.completed,
        }
    }

    /// Number of questions answered correctly.
    #[must_use]
    pub fn correct_count(&self) -> usize {
        self.rows.iter().filter(|r| r.is_correct).count()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
