//! Transport-agnostic contract for the quiz backend.

use async_trait::async_trait;

use quiz_core::model::{
    Answer, Category, CategoryId, QuestionId, ResultDetail, ResultId, Test, TestId, TestResult,
};

use crate::error::ApiError;

/// Backend operations the session core consumes.
///
/// Implementations are shared as `Arc<dyn QuizGateway>`; the HTTP gateway
/// talks to the real backend, the in-memory gateway backs tests.
#[async_trait]
pub trait QuizGateway: Send + Sync {
    /// Fetch a test definition with its ordered questions.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if no such test exists.
    async fn fetch_test(&self, test_id: TestId) -> Result<Test, ApiError>;

    /// Create a new incomplete result record for the caller.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` if the caller lacks access.
    async fn start_session(&self, test_id: TestId) -> Result<TestResult, ApiError>;

    /// Upsert the answer for one question of one session.
    ///
    /// Returns the stored answer including backend-assigned correctness.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the session or question is absent.
    async fn submit_answer(
        &self,
        result_id: ResultId,
        question_id: QuestionId,
        content: &str,
    ) -> Result<Answer, ApiError>;

    /// Finalize a session: compute and persist score and completion time.
    ///
    /// Idempotent — repeat calls return the already-completed result
    /// unchanged.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the session is absent.
    async fn complete_session(&self, result_id: ResultId) -> Result<TestResult, ApiError>;

    /// Fetch a result with its embedded test and per-question answers.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the session is absent or not owned
    /// by the caller.
    async fn fetch_result(&self, result_id: ResultId) -> Result<ResultDetail, ApiError>;

    /// List available tests, optionally filtered by category.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on request failure.
    async fn list_tests(&self, category: Option<CategoryId>) -> Result<Vec<Test>, ApiError>;

    /// List browsing categories.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on request failure.
    async fn list_categories(&self) -> Result<Vec<Category>, ApiError>;
}
