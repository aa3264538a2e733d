//! In-memory gateway for testing and prototyping.
//!
//! Realizes the backend's side of the contract — grading at submit time,
//! tallying at completion, idempotent completion — so the session runner
//! can be exercised without a server.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::StatusCode;

use quiz_core::model::{
    Answer, AnswerId, Category, CategoryId, QuestionId, ResultDetail, ResultId, Test, TestId,
    TestResult, UserId,
};
use quiz_core::scoring;
use quiz_core::Clock;

use crate::error::ApiError;
use crate::gateway::QuizGateway;

#[derive(Default)]
struct GatewayState {
    tests: HashMap<TestId, Test>,
    categories: Vec<Category>,
    results: HashMap<ResultId, TestResult>,
    answers: HashMap<(ResultId, QuestionId), Answer>,
    submissions: HashMap<(ResultId, QuestionId), u32>,
    next_result_id: u64,
    next_answer_id: u64,
}

/// Simple in-memory gateway implementation for testing and prototyping.
#[derive(Clone)]
pub struct InMemoryGateway {
    state: Arc<Mutex<GatewayState>>,
    clock: Arc<Mutex<Clock>>,
    user_id: UserId,
    deny_sessions: Arc<AtomicBool>,
    fail_submissions: Arc<AtomicBool>,
}

impl Default for InMemoryGateway {
    fn default() -> Self {
        Self::new(Clock::default_clock())
    }
}

impl InMemoryGateway {
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self {
            state: Arc::new(Mutex::new(GatewayState {
                next_result_id: 1,
                next_answer_id: 1,
                ..GatewayState::default()
            })),
            clock: Arc::new(Mutex::new(clock)),
            user_id: UserId::new(1),
            deny_sessions: Arc::new(AtomicBool::new(false)),
            fail_submissions: Arc::new(AtomicBool::new(false)),
        }
    }

    #[must_use]
    pub fn with_test(self, test: Test) -> Self {
        self.insert_test(test);
        self
    }

    /// Register a test definition.
    pub fn insert_test(&self, test: Test) {
        if let Ok(mut state) = self.state.lock() {
            state.tests.insert(test.id, test);
        }
    }

    /// Register a browsing category.
    pub fn insert_category(&self, category: Category) {
        if let Ok(mut state) = self.state.lock() {
            state.categories.push(category);
        }
    }

    /// Make `start_session` fail with `Unauthorized`.
    pub fn deny_sessions(&self, deny: bool) {
        self.deny_sessions.store(deny, Ordering::SeqCst);
    }

    /// Make `submit_answer` fail, for best-effort-path tests.
    pub fn fail_submissions(&self, fail: bool) {
        self.fail_submissions.store(fail, Ordering::SeqCst);
    }

    /// Move a fixed clock forward, for completion-time tests.
    ///
    /// Has no effect when the gateway was built with the system clock.
    pub fn advance_clock(&self, delta: Duration) {
        if let Ok(mut clock) = self.clock.lock() {
            clock.advance(delta);
        }
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock
            .lock()
            .map(|clock| clock.now())
            .unwrap_or_else(|_| Utc::now())
    }

    /// How many times an answer was submitted for this (session, question).
    #[must_use]
    pub fn submission_count(&self, result_id: ResultId, question_id: QuestionId) -> u32 {
        self.state
            .lock()
            .ok()
            .and_then(|state| state.submissions.get(&(result_id, question_id)).copied())
            .unwrap_or(0)
    }

    /// The currently stored answer for this (session, question), if any.
    #[must_use]
    pub fn stored_answer(&self, result_id: ResultId, question_id: QuestionId) -> Option<Answer> {
        self.state
            .lock()
            .ok()
            .and_then(|state| state.answers.get(&(result_id, question_id)).cloned())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, GatewayState>, ApiError> {
        self.state
            .lock()
            .map_err(|e| ApiError::Unavailable(e.to_string()))
    }
}

#[async_trait]
impl QuizGateway for InMemoryGateway {
    async fn fetch_test(&self, test_id: TestId) -> Result<Test, ApiError> {
        let state = self.lock()?;
        state.tests.get(&test_id).cloned().ok_or(ApiError::NotFound)
    }

    async fn start_session(&self, test_id: TestId) -> Result<TestResult, ApiError> {
        if self.deny_sessions.load(Ordering::SeqCst) {
            return Err(ApiError::Unauthorized);
        }

        let mut state = self.lock()?;
        if !state.tests.contains_key(&test_id) {
            return Err(ApiError::NotFound);
        }

        let id = ResultId::new(state.next_result_id);
        state.next_result_id += 1;
        let result = TestResult::started(id, test_id, self.user_id, self.now());
        state.results.insert(id, result.clone());
        Ok(result)
    }

    async fn submit_answer(
        &self,
        result_id: ResultId,
        question_id: QuestionId,
        content: &str,
    ) -> Result<Answer, ApiError> {
        if self.fail_submissions.load(Ordering::SeqCst) {
            return Err(ApiError::Unavailable("submission rejected".into()));
        }

        let mut guard = self.lock()?;
        let state = &mut *guard;
        *state.submissions.entry((result_id, question_id)).or_insert(0) += 1;

        let result = state.results.get(&result_id).ok_or(ApiError::NotFound)?;
        if result.completed {
            // Answers are immutable once the session is finalized.
            return Err(ApiError::HttpStatus(StatusCode::CONFLICT));
        }

        let test = state.tests.get(&result.test_id).ok_or(ApiError::NotFound)?;
        let question = test
            .questions
            .iter()
            .find(|q| q.id == question_id)
            .ok_or(ApiError::NotFound)?;

        let answer = Answer {
            id: match state.answers.get(&(result_id, question_id)) {
                Some(existing) => existing.id,
                None => {
                    let id = AnswerId::new(state.next_answer_id);
                    state.next_answer_id += 1;
                    id
                }
            },
            test_result_id: result_id,
            question_id,
            content: content.to_string(),
            is_correct: scoring::check_answer(question, content),
            points_earned: scoring::earned_points(question, content),
        };
        state.answers.insert((result_id, question_id), answer.clone());
        Ok(answer)
    }

    async fn complete_session(&self, result_id: ResultId) -> Result<TestResult, ApiError> {
        let mut state = self.lock()?;
        let result = state.results.get(&result_id).cloned().ok_or(ApiError::NotFound)?;
        if result.completed {
            return Ok(result);
        }

        let score = scoring::tally_score(
            &state
                .answers
                .values()
                .filter(|a| a.test_result_id == result_id)
                .cloned()
                .collect::<Vec<_>>(),
        );

        let elapsed = (self.now() - result.started_at).num_seconds().max(0);
        let mut completed = result;
        completed.score = Some(score);
        completed.completion_time = u32::try_from(elapsed).ok();
        completed.completed = true;
        state.results.insert(result_id, completed.clone());
        Ok(completed)
    }

    async fn fetch_result(&self, result_id: ResultId) -> Result<ResultDetail, ApiError> {
        let state = self.lock()?;
        let result = state.results.get(&result_id).cloned().ok_or(ApiError::NotFound)?;
        let test = state
            .tests
            .get(&result.test_id)
            .cloned()
            .ok_or(ApiError::NotFound)?;
        let answers = state
            .answers
            .values()
            .filter(|a| a.test_result_id == result_id)
            .cloned()
            .collect();
        Ok(ResultDetail {
            result,
            test,
            answers,
        })
    }

    async fn list_tests(&self, category: Option<CategoryId>) -> Result<Vec<Test>, ApiError> {
        let state = self.lock()?;
        let mut tests: Vec<Test> = state
            .tests
            .values()
            .filter(|t| match category {
                Some(id) => t.categories.iter().any(|c| c.id == id),
                None => true,
            })
            .cloned()
            .collect();
        tests.sort_by_key(|t| t.id);
        Ok(tests)
    }

    async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        let state = self.lock()?;
        Ok(state.categories.clone())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{Question, QuestionKind};
    use quiz_core::time::{fixed_clock, fixed_now};

    fn choice_question(id: u64, correct: &str, points: u32) -> Question {
        Question::new(
            QuestionId::new(id),
            TestId::new(1),
            format!("Question {id}"),
            QuestionKind::MultipleChoice {
                options: vec!["A".into(), "B".into(), "C".into()],
            },
            correct,
            points,
        )
        .unwrap()
    }

    fn build_test(questions: Vec<Question>) -> Test {
        Test::new(
            TestId::new(1),
            "Basics",
            "",
            None,
            UserId::new(1),
            fixed_now(),
            questions,
        )
        .unwrap()
    }

    fn gateway_with_questions() -> InMemoryGateway {
        InMemoryGateway::new(fixed_clock()).with_test(build_test(vec![
            choice_question(1, "B", 2),
            choice_question(2, "A", 3),
        ]))
    }

    #[tokio::test]
    async fn missing_test_is_not_found() {
        let gw = InMemoryGateway::new(fixed_clock());
        let err = gw.fetch_test(TestId::new(9)).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn denied_session_is_unauthorized() {
        let gw = gateway_with_questions();
        gw.deny_sessions(true);
        let err = gw.start_session(TestId::new(1)).await.unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[tokio::test]
    async fn submit_upserts_one_answer_per_question() {
        let gw = gateway_with_questions();
        let result = gw.start_session(TestId::new(1)).await.unwrap();

        let first = gw
            .submit_answer(result.id, QuestionId::new(1), "C")
            .await
            .unwrap();
        assert!(!first.is_correct);

        let second = gw
            .submit_answer(result.id, QuestionId::new(1), "B")
            .await
            .unwrap();
        assert!(second.is_correct);
        assert_eq!(second.points_earned, 2);
        assert_eq!(second.id, first.id);
        assert_eq!(gw.submission_count(result.id, QuestionId::new(1)), 2);

        let detail = gw.fetch_result(result.id).await.unwrap();
        assert_eq!(detail.answers.len(), 1);
    }

    #[tokio::test]
    async fn completion_tallies_and_is_idempotent() {
        let gw = gateway_with_questions();
        let result = gw.start_session(TestId::new(1)).await.unwrap();

        gw.submit_answer(result.id, QuestionId::new(1), "B")
            .await
            .unwrap();
        gw.submit_answer(result.id, QuestionId::new(2), "C")
            .await
            .unwrap();

        let completed = gw.complete_session(result.id).await.unwrap();
        assert!(completed.completed);
        assert_eq!(completed.score, Some(2));

        let again = gw.complete_session(result.id).await.unwrap();
        assert_eq!(again, completed);
    }

    #[tokio::test]
    async fn completion_time_counts_elapsed_seconds() {
        let gw = gateway_with_questions();
        let result = gw.start_session(TestId::new(1)).await.unwrap();

        gw.advance_clock(Duration::seconds(90));
        let completed = gw.complete_session(result.id).await.unwrap();
        assert_eq!(completed.completion_time, Some(90));
    }

    #[tokio::test]
    async fn answers_are_immutable_after_completion() {
        let gw = gateway_with_questions();
        let result = gw.start_session(TestId::new(1)).await.unwrap();
        gw.complete_session(result.id).await.unwrap();

        let err = gw
            .submit_answer(result.id, QuestionId::new(1), "B")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::HttpStatus(StatusCode::CONFLICT)));
    }

    #[tokio::test]
    async fn list_tests_filters_by_category() {
        let gw = InMemoryGateway::new(fixed_clock());
        let category = Category {
            id: CategoryId::new(7),
            name: "Rust".into(),
            description: None,
        };
        let mut tagged = build_test(Vec::new());
        tagged.categories.push(category.clone());
        gw.insert_test(tagged);

        let mut other = build_test(Vec::new());
        other.id = TestId::new(2);
        gw.insert_test(other);
        gw.insert_category(category);

        let all = gw.list_tests(None).await.unwrap();
        assert_eq!(all.len(), 2);

        let filtered = gw.list_tests(Some(CategoryId::new(7))).await.unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, TestId::new(1));
    }
}
