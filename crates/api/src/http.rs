//! HTTP implementation of the gateway over the backend's REST surface.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use url::Url;

use quiz_core::model::{
    Answer, Category, CategoryId, QuestionId, ResultDetail, ResultId, Test, TestId, TestResult,
    User, UserId,
};

use crate::credentials::CredentialProvider;
use crate::error::ApiError;
use crate::gateway::QuizGateway;

/// Gateway talking to the real backend over HTTP.
///
/// Credentials are injected, not ambient: every request attaches the
/// provider's current bearer token, `login` stores one and `logout`
/// clears it.
#[derive(Clone)]
pub struct HttpGateway {
    base: Url,
    client: Client,
    credentials: CredentialProvider,
}

impl HttpGateway {
    #[must_use]
    pub fn new(mut base: Url, credentials: CredentialProvider) -> Self {
        // `Url::join` drops the last path segment unless the base ends
        // with a slash, so normalize here rather than at every call.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Self {
            base,
            client: Client::new(),
            credentials,
        }
    }

    #[must_use]
    pub fn credentials(&self) -> &CredentialProvider {
        &self.credentials
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base.join(path)?)
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let mut req = self.client.request(method, self.endpoint(path)?);
        if let Some(token) = self.credentials.bearer() {
            req = req.bearer_auth(token);
        }
        Ok(req)
    }

    async fn check(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(ApiError::from_status(status))
        }
    }

    /// Exchange credentials for an access token and store it.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` on bad credentials, other
    /// `ApiError` variants on request failure.
    pub async fn login(&self, username: &str, password: &str) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.endpoint("token")?)
            .form(&[("username", username), ("password", password)])
            .send()
            .await?;
        let body: TokenResponse = Self::check(response).await?.json().await?;
        self.credentials.store(body.access_token);
        tracing::debug!(username, "credentials acquired");
        Ok(())
    }

    /// Forget the stored token.
    pub fn logout(&self) {
        self.credentials.clear();
        tracing::debug!("credentials cleared");
    }

    /// Resolve the authenticated caller.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` when no valid token is attached.
    pub async fn current_user(&self) -> Result<User, ApiError> {
        let response = self.request(Method::GET, "users/me")?.send().await?;
        Ok(Self::check(response).await?.json().await?)
    }
}

#[async_trait]
impl QuizGateway for HttpGateway {
    async fn fetch_test(&self, test_id: TestId) -> Result<Test, ApiError> {
        let response = self
            .request(Method::GET, &format!("tests/{test_id}"))?
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn start_session(&self, test_id: TestId) -> Result<TestResult, ApiError> {
        // The backend keys new results on the caller's user id.
        let user = self.current_user().await?;
        let response = self
            .request(Method::POST, "test-results")?
            .json(&StartSessionRequest {
                test_id,
                user_id: user.id,
            })
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn submit_answer(
        &self,
        result_id: ResultId,
        question_id: QuestionId,
        content: &str,
    ) -> Result<Answer, ApiError> {
        let response = self
            .request(Method::POST, &format!("test-results/{result_id}/answers"))?
            .json(&AnswerSubmission {
                question_id,
                test_result_id: result_id,
                answer_content: content,
            })
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn complete_session(&self, result_id: ResultId) -> Result<TestResult, ApiError> {
        let response = self
            .request(Method::POST, &format!("test-results/{result_id}/complete"))?
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn fetch_result(&self, result_id: ResultId) -> Result<ResultDetail, ApiError> {
        let response = self
            .request(Method::GET, &format!("test-results/{result_id}"))?
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn list_tests(&self, category: Option<CategoryId>) -> Result<Vec<Test>, ApiError> {
        let mut req = self.request(Method::GET, "tests")?;
        if let Some(category_id) = category {
            req = req.query(&[("category_id", category_id.to_string())]);
        }
        let response = req.send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        let response = self.request(Method::GET, "categories")?.send().await?;
        Ok(Self::check(response).await?.json().await?)
    }
}

#[derive(Debug, Serialize)]
struct StartSessionRequest {
    test_id: TestId,
    user_id: UserId,
}

#[derive(Debug, Serialize)]
struct AnswerSubmission<'a> {
    question_id: QuestionId,
    test_result_id: ResultId,
    answer_content: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}
