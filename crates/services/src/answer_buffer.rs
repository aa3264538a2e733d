//! Local buffer of the user's in-progress answers.

use std::collections::HashMap;

use quiz_core::model::QuestionId;

/// Mapping of question id to the user's current answer text, scoped to
/// one active session.
///
/// Writes overwrite unconditionally — no merge semantics — and reads are
/// synchronous so the view reflects the latest keystroke before any
/// network flush. The buffer only feeds submission; it is never the
/// source of truth for correctness.
#[derive(Debug, Clone, Default)]
pub struct AnswerBuffer {
    answers: HashMap<QuestionId, String>,
}

impl AnswerBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the buffered answer for a question.
    pub fn set(&mut self, question_id: QuestionId, value: impl Into<String>) {
        self.answers.insert(question_id, value.into());
    }

    /// The buffered answer text, if the question has been touched.
    #[must_use]
    pub fn get(&self, question_id: QuestionId) -> Option<&str> {
        self.answers.get(&question_id).map(String::as_str)
    }

    /// The buffered answer, or the empty string for untouched questions.
    #[must_use]
    pub fn get_or_empty(&self, question_id: QuestionId) -> &str {
        self.get(question_id).unwrap_or("")
    }

    /// Whether the buffered answer is missing or blank after trimming.
    #[must_use]
    pub fn is_blank(&self, question_id: QuestionId) -> bool {
        self.get_or_empty(question_id).trim().is_empty()
    }

    /// Drop all buffered answers; called when the session ends.
    pub fn clear(&mut self) {
        self.answers.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.answers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }
}
