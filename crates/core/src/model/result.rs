use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{AnswerId, QuestionId, ResultId, Test, TestId, UserId};

//
// ─── TEST RESULT ───────────────────────────────────────────────────────────────
//

/// One user's attempt at one test.
///
/// Created incomplete when the session starts; `score` and
/// `completion_time` are populated by the backend exactly once, on
/// completion. Answers belonging to a completed result are immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    pub id: ResultId,
    pub test_id: TestId,
    pub user_id: UserId,
    /// Sum of points from correct answers; set only on completion.
    #[serde(default)]
    pub score: Option<u32>,
    /// Seconds between session start and completion; set only on completion.
    #[serde(default)]
    pub completion_time: Option<u32>,
    #[serde(default)]
    pub completed: bool,
    pub started_at: DateTime<Utc>,
}

impl TestResult {
    /// A freshly started, incomplete result.
    #[must_use]
    pub fn started(id: ResultId, test_id: TestId, user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            test_id,
            user_id,
            score: None,
            completion_time: None,
            completed: false,
            started_at: now,
        }
    }
}

//
// ─── ANSWER ────────────────────────────────────────────────────────────────────
//

/// A stored answer, one per (result, question). Correctness and earned
/// points are assigned by the backend's scoring engine, never the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub id: AnswerId,
    pub test_result_id: ResultId,
    pub question_id: QuestionId,
    #[serde(rename = "answer_content")]
    pub content: String,
    pub is_correct: bool,
    pub points_earned: u32,
}

//
// ─── RESULT DETAIL ─────────────────────────────────────────────────────────────
//

/// A completed result with its test definition and per-question answers,
/// as returned by the result endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultDetail {
    #[serde(flatten)]
    pub result: TestResult,
    pub test: Test,
    #[serde(default)]
    pub answers: Vec<Answer>,
}

impl ResultDetail {
    /// The stored answer for a question, if one was submitted.
    #[must_use]
    pub fn answer_for(&self, question_id: QuestionId) -> Option<&Answer> {
        self.answers.iter().find(|a| a.question_id == question_id)
    }
}
