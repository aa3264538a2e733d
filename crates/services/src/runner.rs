//! The test session state machine.
//!
//! Orchestrates loading a test, starting a result record, walking
//! questions under the empty-answer gate, best-effort answer submission,
//! and finalizing — by explicit confirmation or by clock expiry.

use std::sync::Arc;

use tokio::sync::Mutex;

use api::{ApiError, QuizGateway};
use quiz_core::model::{Question, QuestionId, ResultId, Test, TestId, TestResult};

use crate::answer_buffer::AnswerBuffer;
use crate::countdown::{Countdown, CountdownHandle};
use crate::error::RunnerError;

//
// ─── PHASES ────────────────────────────────────────────────────────────────────
//

/// Why a session failed to load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadFailure {
    /// The test or session does not exist; terminal, no retry.
    NotFound,
    /// The caller needs to re-enter credentials.
    Unauthorized,
    /// Network or server failure; retry is manual.
    Network(String),
}

impl LoadFailure {
    fn from_api(err: &ApiError) -> Self {
        match err {
            ApiError::NotFound => Self::NotFound,
            ApiError::Unauthorized => Self::Unauthorized,
            other => Self::Network(other.to_string()),
        }
    }
}

/// Lifecycle phase of a session.
///
/// `EmptyTest` is a valid, expected terminal display state for a test
/// with no questions — distinct from `Errored`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Loading,
    InProgress { index: usize },
    Confirming,
    Completed { result_id: ResultId },
    EmptyTest,
    Errored(LoadFailure),
}

//
// ─── RUNNER ────────────────────────────────────────────────────────────────────
//

/// One user's attempt at one test, driven by UI events and the countdown.
///
/// Completion is idempotent from the state machine's perspective: once
/// `Completed`, every further transition request is a no-op, so a losing
/// race between the last-second tick and a user action is simply
/// discarded.
pub struct SessionRunner {
    gateway: Arc<dyn QuizGateway>,
    phase: SessionPhase,
    test: Option<Test>,
    result: Option<TestResult>,
    buffer: AnswerBuffer,
}

impl SessionRunner {
    #[must_use]
    pub fn new(gateway: Arc<dyn QuizGateway>) -> Self {
        Self {
            gateway,
            phase: SessionPhase::Idle,
            test: None,
            result: None,
            buffer: AnswerBuffer::new(),
        }
    }

    #[must_use]
    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    #[must_use]
    pub fn test(&self) -> Option<&Test> {
        self.test.as_ref()
    }

    #[must_use]
    pub fn result_id(&self) -> Option<ResultId> {
        self.result.as_ref().map(|r| r.id)
    }

    /// The question currently on screen: the indexed one while in
    /// progress, the last one while the confirmation prompt is open.
    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        let test = self.test.as_ref()?;
        match self.phase {
            SessionPhase::InProgress { index } => test.question_at(index),
            SessionPhase::Confirming => test.question_at(test.question_count().saturating_sub(1)),
            _ => None,
        }
    }

    /// One-based position and total, for a "question i of n" display.
    #[must_use]
    pub fn progress(&self) -> Option<(usize, usize)> {
        let test = self.test.as_ref()?;
        match self.phase {
            SessionPhase::InProgress { index } => Some((index + 1, test.question_count())),
            SessionPhase::Confirming => Some((test.question_count(), test.question_count())),
            _ => None,
        }
    }

    /// Seconds allowed for this test, or `None` when untimed.
    #[must_use]
    pub fn time_limit_seconds(&self) -> Option<u32> {
        self.test.as_ref().and_then(Test::time_limit_seconds)
    }

    #[must_use]
    pub fn buffer(&self) -> &AnswerBuffer {
        &self.buffer
    }

    /// Load the test and start a result record, concurrently.
    ///
    /// Zero questions is a valid outcome and lands in `EmptyTest`; any
    /// load failure lands in `Errored` and is returned to the caller.
    ///
    /// # Errors
    ///
    /// Returns the underlying `ApiError` when the fetch or the session
    /// start fails.
    pub async fn start(&mut self, test_id: TestId) -> Result<(), RunnerError> {
        self.phase = SessionPhase::Loading;
        self.buffer.clear();

        let (test, result) = tokio::join!(
            self.gateway.fetch_test(test_id),
            self.gateway.start_session(test_id),
        );

        let test = match test {
            Ok(test) => test,
            Err(err) => return Err(self.fail_load(err)),
        };
        let result = match result {
            Ok(result) => result,
            Err(err) => return Err(self.fail_load(err)),
        };

        tracing::debug!(test = %test.id, result = %result.id, "session started");
        let empty = test.questions.is_empty();
        self.test = Some(test);
        self.result = Some(result);
        self.phase = if empty {
            SessionPhase::EmptyTest
        } else {
            SessionPhase::InProgress { index: 0 }
        };
        Ok(())
    }

    fn fail_load(&mut self, err: ApiError) -> RunnerError {
        self.phase = SessionPhase::Errored(LoadFailure::from_api(&err));
        err.into()
    }

    /// Buffer the user's answer for a question; overwrites unconditionally.
    ///
    /// # Errors
    ///
    /// Returns `RunnerError::NotInProgress` outside an active session —
    /// answers are immutable once completed.
    pub fn set_answer(
        &mut self,
        question_id: QuestionId,
        value: impl Into<String>,
    ) -> Result<(), RunnerError> {
        match self.phase {
            SessionPhase::InProgress { .. } | SessionPhase::Confirming => {
                self.buffer.set(question_id, value);
                Ok(())
            }
            _ => Err(RunnerError::NotInProgress),
        }
    }

    /// Move forward: submit the current answer, then advance — or open
    /// the confirmation prompt when on the last question.
    ///
    /// The submission is best-effort: a failure is logged and never
    /// blocks navigation.
    ///
    /// # Errors
    ///
    /// Returns `RunnerError::EmptyAnswer` when the current question has
    /// no non-blank buffered answer, `RunnerError::NotInProgress` outside
    /// `InProgress`.
    pub async fn next(&mut self) -> Result<(), RunnerError> {
        let SessionPhase::InProgress { index } = self.phase else {
            return Err(RunnerError::NotInProgress);
        };
        let question_id = self
            .current_question()
            .map(|q| q.id)
            .ok_or(RunnerError::NotInProgress)?;
        if self.buffer.is_blank(question_id) {
            return Err(RunnerError::EmptyAnswer);
        }

        // Submission is issued strictly before the index advances.
        self.submit_best_effort(question_id).await;

        let total = self.test.as_ref().map_or(0, Test::question_count);
        self.phase = if index + 1 >= total {
            SessionPhase::Confirming
        } else {
            SessionPhase::InProgress { index: index + 1 }
        };
        Ok(())
    }

    /// Move back one question. Pure navigation: no submission, no
    /// validation; a no-op on the first question or outside `InProgress`.
    pub fn previous(&mut self) {
        if let SessionPhase::InProgress { index } = self.phase {
            if index > 0 {
                self.phase = SessionPhase::InProgress { index: index - 1 };
            }
        }
    }

    /// Dismiss the confirmation prompt, returning to the last question.
    pub fn cancel_confirm(&mut self) {
        if self.phase == SessionPhase::Confirming {
            let last = self
                .test
                .as_ref()
                .map_or(0, |t| t.question_count().saturating_sub(1));
            self.phase = SessionPhase::InProgress { index: last };
        }
    }

    /// Finalize the session after explicit user confirmation.
    ///
    /// # Errors
    ///
    /// Returns `RunnerError::NotConfirming` outside the confirmation
    /// prompt. A failed completion call is logged and returned while the
    /// phase stays `Confirming`, so the user can confirm again.
    pub async fn confirm(&mut self) -> Result<ResultId, RunnerError> {
        if self.phase != SessionPhase::Confirming {
            return Err(RunnerError::NotConfirming);
        }
        let result_id = self.result_id().ok_or(RunnerError::NotConfirming)?;

        let outcome = self.gateway.complete_session(result_id).await;
        match outcome {
            Ok(result) => {
                self.result = Some(result);
                self.finish(result_id);
                Ok(result_id)
            }
            Err(err) => {
                tracing::warn!(error = %err, result = %result_id, "completion call failed");
                Err(err.into())
            }
        }
    }

    /// Clock expiry: flush the current question's buffered answer as-is
    /// (even empty), then complete unconditionally. Timeout is
    /// authoritative — no confirmation, and a failed network call still
    /// completes the session locally.
    ///
    /// A no-op when the session is already completed or never reached an
    /// active question.
    pub async fn expire(&mut self) {
        let current = match self.phase {
            SessionPhase::InProgress { .. } | SessionPhase::Confirming => {
                self.current_question().map(|q| q.id)
            }
            _ => return,
        };
        let Some(result_id) = self.result_id() else {
            return;
        };

        // Keep the answer set consistent with one answer per visited
        // question, even when the user typed nothing.
        if let Some(question_id) = current {
            self.submit_best_effort(question_id).await;
        }

        let outcome = self.gateway.complete_session(result_id).await;
        match outcome {
            Ok(result) => self.result = Some(result),
            Err(err) => {
                tracing::warn!(error = %err, result = %result_id, "completion at expiry failed");
            }
        }
        self.finish(result_id);
        tracing::debug!(result = %result_id, "session completed by timeout");
    }

    fn finish(&mut self, result_id: ResultId) {
        self.buffer.clear();
        self.phase = SessionPhase::Completed { result_id };
    }

    async fn submit_best_effort(&self, question_id: QuestionId) {
        let Some(result_id) = self.result_id() else {
            return;
        };
        let content = self.buffer.get_or_empty(question_id).to_owned();
        if let Err(err) = self
            .gateway
            .submit_answer(result_id, question_id, &content)
            .await
        {
            tracing::warn!(error = %err, question = %question_id, "answer submission dropped");
        }
    }
}

/// Wire a shared runner to its countdown, if the loaded test is timed.
///
/// Expiry locks the runner and drives the timeout path; cancelling (or
/// dropping) the returned handle stops the clock with no further side
/// effects.
pub async fn spawn_session_countdown(
    runner: &Arc<Mutex<SessionRunner>>,
) -> Option<CountdownHandle> {
    let seconds = runner.lock().await.time_limit_seconds()?;
    let runner = Arc::clone(runner);
    Some(Countdown::start(seconds, move || async move {
        runner.lock().await.expire().await;
    }))
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use api::InMemoryGateway;
    use quiz_core::model::{Question, QuestionKind, UserId};
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

    fn build_test(time_limit: Option<u32>, questions: Vec<Question>) -> Test {
        Test::new(
            TestId::new(1),
            "Basics",
            "",
            time_limit,
            UserId::new(1),
            fixed_now(),
            questions,
        )
        .unwrap()
    }

    fn two_question_gateway() -> InMemoryGateway {
        InMemoryGateway::new(fixed_clock()).with_test(build_test(
            None,
            vec![choice_question(1, "B", 2), choice_question(2, "A", 3)],
        ))
    }

    async fn started_runner(gateway: &InMemoryGateway) -> SessionRunner {
        let mut runner = SessionRunner::new(Arc::new(gateway.clone()));
        runner.start(TestId::new(1)).await.unwrap();
        runner
    }

    #[tokio::test]
    async fn start_lands_on_first_question() {
        let gateway = two_question_gateway();
        let runner = started_runner(&gateway).await;

        assert_eq!(*runner.phase(), SessionPhase::InProgress { index: 0 });
        assert_eq!(runner.progress(), Some((1, 2)));
        assert_eq!(runner.current_question().unwrap().id, QuestionId::new(1));
    }

    #[tokio::test]
    async fn missing_test_errors_the_session() {
        let gateway = InMemoryGateway::new(fixed_clock());
        let mut runner = SessionRunner::new(Arc::new(gateway));

        let err = runner.start(TestId::new(9)).await.unwrap_err();
        assert!(matches!(err, RunnerError::Api(ApiError::NotFound)));
        assert_eq!(*runner.phase(), SessionPhase::Errored(LoadFailure::NotFound));
    }

    #[tokio::test]
    async fn denied_start_reports_unauthorized() {
        let gateway = two_question_gateway();
        gateway.deny_sessions(true);
        let mut runner = SessionRunner::new(Arc::new(gateway));

        let err = runner.start(TestId::new(1)).await.unwrap_err();
        assert!(matches!(err, RunnerError::Api(ApiError::Unauthorized)));
        assert_eq!(
            *runner.phase(),
            SessionPhase::Errored(LoadFailure::Unauthorized)
        );
    }

    #[tokio::test]
    async fn zero_questions_is_empty_test_not_error() {
        let gateway = InMemoryGateway::new(fixed_clock()).with_test(build_test(None, Vec::new()));
        let runner = started_runner(&gateway).await;

        assert_eq!(*runner.phase(), SessionPhase::EmptyTest);
    }

    #[tokio::test]
    async fn next_requires_a_non_blank_answer() {
        let gateway = two_question_gateway();
        let mut runner = started_runner(&gateway).await;

        let err = runner.next().await.unwrap_err();
        assert!(matches!(err, RunnerError::EmptyAnswer));

        runner.set_answer(QuestionId::new(1), "   ").unwrap();
        let err = runner.next().await.unwrap_err();
        assert!(matches!(err, RunnerError::EmptyAnswer));

        assert_eq!(*runner.phase(), SessionPhase::InProgress { index: 0 });
        assert_eq!(gateway.submission_count(ResultId::new(1), QuestionId::new(1)), 0);
    }

    #[tokio::test]
    async fn next_submits_exactly_once_then_advances() {
        let gateway = two_question_gateway();
        let mut runner = started_runner(&gateway).await;

        runner.set_answer(QuestionId::new(1), "B").unwrap();
        runner.next().await.unwrap();

        assert_eq!(*runner.phase(), SessionPhase::InProgress { index: 1 });
        assert_eq!(gateway.submission_count(ResultId::new(1), QuestionId::new(1)), 1);
        let stored = gateway
            .stored_answer(ResultId::new(1), QuestionId::new(1))
            .unwrap();
        assert_eq!(stored.content, "B");
        assert!(stored.is_correct);
    }

    #[tokio::test]
    async fn submission_failure_does_not_block_navigation() {
        let gateway = two_question_gateway();
        let mut runner = started_runner(&gateway).await;

        gateway.fail_submissions(true);
        runner.set_answer(QuestionId::new(1), "B").unwrap();
        runner.next().await.unwrap();

        assert_eq!(*runner.phase(), SessionPhase::InProgress { index: 1 });
        assert!(gateway
            .stored_answer(ResultId::new(1), QuestionId::new(1))
            .is_none());
    }

    #[tokio::test]
    async fn previous_is_pure_navigation() {
        let gateway = two_question_gateway();
        let mut runner = started_runner(&gateway).await;

        runner.previous();
        assert_eq!(*runner.phase(), SessionPhase::InProgress { index: 0 });

        runner.set_answer(QuestionId::new(1), "B").unwrap();
        runner.next().await.unwrap();
        runner.previous();

        assert_eq!(*runner.phase(), SessionPhase::InProgress { index: 0 });
        // Going back re-submits nothing.
        assert_eq!(gateway.submission_count(ResultId::new(1), QuestionId::new(1)), 1);
        // The earlier answer is still buffered locally.
        assert_eq!(runner.buffer().get(QuestionId::new(1)), Some("B"));
    }

    #[tokio::test]
    async fn last_question_routes_through_confirmation() {
        let gateway = two_question_gateway();
        let mut runner = started_runner(&gateway).await;

        runner.set_answer(QuestionId::new(1), "B").unwrap();
        runner.next().await.unwrap();
        runner.set_answer(QuestionId::new(2), "C").unwrap();
        runner.next().await.unwrap();

        assert_eq!(*runner.phase(), SessionPhase::Confirming);
        assert_eq!(runner.progress(), Some((2, 2)));

        runner.cancel_confirm();
        assert_eq!(*runner.phase(), SessionPhase::InProgress { index: 1 });

        runner.next().await.unwrap();
        let result_id = runner.confirm().await.unwrap();
        assert_eq!(*runner.phase(), SessionPhase::Completed { result_id });

        let completed = gateway.complete_session(result_id).await.unwrap();
        assert_eq!(completed.score, Some(2));
    }

    #[tokio::test]
    async fn confirm_outside_prompt_is_rejected() {
        let gateway = two_question_gateway();
        let mut runner = started_runner(&gateway).await;

        let err = runner.confirm().await.unwrap_err();
        assert!(matches!(err, RunnerError::NotConfirming));
    }

    #[tokio::test]
    async fn expiry_flushes_empty_answer_and_completes() {
        let gateway = two_question_gateway();
        let mut runner = started_runner(&gateway).await;

        // The user never touched the first question.
        runner.expire().await;

        let result_id = ResultId::new(1);
        assert_eq!(*runner.phase(), SessionPhase::Completed { result_id });
        let flushed = gateway
            .stored_answer(result_id, QuestionId::new(1))
            .unwrap();
        assert_eq!(flushed.content, "");
        assert!(!flushed.is_correct);

        let completed = gateway.complete_session(result_id).await.unwrap();
        assert!(completed.completed);
        assert_eq!(completed.score, Some(0));
    }

    #[tokio::test]
    async fn expiry_after_completion_is_a_no_op() {
        let gateway = two_question_gateway();
        let mut runner = started_runner(&gateway).await;

        runner.set_answer(QuestionId::new(1), "B").unwrap();
        runner.next().await.unwrap();
        runner.set_answer(QuestionId::new(2), "A").unwrap();
        runner.next().await.unwrap();
        let result_id = runner.confirm().await.unwrap();

        let before = gateway.complete_session(result_id).await.unwrap();
        runner.expire().await;
        let after = gateway.complete_session(result_id).await.unwrap();

        assert_eq!(before, after);
        assert_eq!(before.score, Some(5));
        assert_eq!(*runner.phase(), SessionPhase::Completed { result_id });
    }

    #[tokio::test]
    async fn answers_cannot_change_after_completion() {
        let gateway = two_question_gateway();
        let mut runner = started_runner(&gateway).await;

        runner.expire().await;
        let err = runner.set_answer(QuestionId::new(1), "B").unwrap_err();
        assert!(matches!(err, RunnerError::NotInProgress));
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_completes_a_timed_session() {
        let gateway = InMemoryGateway::new(fixed_clock()).with_test(build_test(
            Some(1),
            vec![choice_question(1, "B", 2)],
        ));
        let runner = Arc::new(Mutex::new(SessionRunner::new(Arc::new(gateway.clone()))));
        runner.lock().await.start(TestId::new(1)).await.unwrap();

        let handle = spawn_session_countdown(&runner).await.unwrap();
        assert_eq!(handle.remaining(), 60);

        let mut rx = handle.subscribe();
        while *rx.borrow() > 0 {
            rx.changed().await.unwrap();
        }
        // Give the expiry action a chance to run to completion.
        while !handle.is_finished() {
            tokio::task::yield_now().await;
        }

        let guard = runner.lock().await;
        assert!(matches!(*guard.phase(), SessionPhase::Completed { .. }));
    }

    #[tokio::test]
    async fn untimed_test_never_starts_a_countdown() {
        let gateway = two_question_gateway();
        let runner = Arc::new(Mutex::new(SessionRunner::new(Arc::new(gateway))));
        runner.lock().await.start(TestId::new(1)).await.unwrap();

        assert!(spawn_session_countdown(&runner).await.is_none());
    }
}
