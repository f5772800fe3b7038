//! JSON-over-HTTP gateway for a real authentication backend.
//!
//! Targets the `api/auth/*` routes the portal screens post to, relative to the
//! base URL so a path prefix on the base is kept. Failures map onto
//! `GatewayError` as follows:
//!
//! - 401 and 404 keep their meaning on every endpoint except sign-up.
//! - Otherwise a `message` in the error body wins and becomes `Rejected(Some(..))`.
//! - Without one: 400 rejected, 409 conflict, anything else transient.

use super::gateway::{AuthGateway, GatewayError, Registration};
use crate::APP_USER_AGENT;
use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, instrument};
use url::Url;

pub const SECURITY_QUESTION_PATH: &str = "/api/auth/get-security-question";
pub const VERIFY_ANSWER_PATH: &str = "/api/auth/verify-security-answer";
pub const RESET_PASSWORD_PATH: &str = "/api/auth/reset-password";
pub const SIGN_IN_PATH: &str = "/api/auth/signin";
pub const SIGN_UP_PATH: &str = "/api/auth/signup";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UsernameRequest<'a> {
    username: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyAnswerRequest<'a> {
    username: &'a str,
    security_answer: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResetPasswordRequest<'a> {
    username: &'a str,
    new_password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignInRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignUpRequest<'a> {
    first_name: &'a str,
    last_name: &'a str,
    email: &'a str,
    phone: &'a str,
    username: &'a str,
    password: &'a str,
    security_question: &'a str,
    security_answer: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SecurityQuestionResponse {
    security_question: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Endpoint {
    SecurityQuestion,
    VerifyAnswer,
    ResetPassword,
    SignIn,
    SignUp,
}

impl Endpoint {
    const fn path(self) -> &'static str {
        match self {
            Self::SecurityQuestion => SECURITY_QUESTION_PATH,
            Self::VerifyAnswer => VERIFY_ANSWER_PATH,
            Self::ResetPassword => RESET_PASSWORD_PATH,
            Self::SignIn => SIGN_IN_PATH,
            Self::SignUp => SIGN_UP_PATH,
        }
    }

    /// Map a failed reply. Sign-up lets the server message override every status.
    fn failure(self, status: StatusCode, message: Option<String>) -> GatewayError {
        if self != Self::SignUp {
            match status {
                StatusCode::UNAUTHORIZED if self == Self::VerifyAnswer => {
                    return GatewayError::IncorrectAnswer
                }
                StatusCode::UNAUTHORIZED => return GatewayError::InvalidCredentials,
                StatusCode::NOT_FOUND => return GatewayError::NotFound,
                _ => {}
            }
        }

        if let Some(message) = message {
            return GatewayError::Rejected(Some(message));
        }

        match status {
            StatusCode::BAD_REQUEST => GatewayError::Rejected(None),
            StatusCode::CONFLICT => GatewayError::Conflict,
            StatusCode::NOT_FOUND => GatewayError::NotFound,
            StatusCode::UNAUTHORIZED => GatewayError::InvalidCredentials,
            _ => GatewayError::Transient(format!("unexpected status {status}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: Url,
}

impl HttpGateway {
    /// # Errors
    /// Returns an error if the base URL is invalid or the HTTP client cannot be built.
    pub fn new(base_url: &str) -> Result<Self> {
        let mut base_url =
            Url::parse(base_url).with_context(|| format!("Invalid gateway base URL: {base_url}"))?;
        // `join` keeps the base path only below a trailing slash
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url, GatewayError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| GatewayError::Transient(format!("invalid endpoint {path}: {e}")))
    }

    async fn post<T: Serialize + Sync>(
        &self,
        endpoint: Endpoint,
        body: &T,
    ) -> Result<reqwest::Response, GatewayError> {
        let path = endpoint.path();
        let url = self.endpoint(path)?;

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                error!("Request to {} failed: {}", path, e);
                GatewayError::Transient(e.to_string())
            })?;

        let status = response.status();
        debug!("{} responded {}", path, status);

        if status.is_success() {
            return Ok(response);
        }

        let message = error_message(response).await;
        Err(endpoint.failure(status, message))
    }
}

/// Pull `message` out of an error body, if the server sent one.
async fn error_message(response: reqwest::Response) -> Option<String> {
    let body: Value = response.json().await.ok()?;
    body.get("message")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|message| !message.is_empty())
        .map(str::to_string)
}

impl AuthGateway for HttpGateway {
    #[instrument(skip(self))]
    async fn lookup_security_question(&self, username: &str) -> Result<String, GatewayError> {
        let response = self
            .post(Endpoint::SecurityQuestion, &UsernameRequest { username })
            .await?;

        let body: SecurityQuestionResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Transient(format!("invalid response: {e}")))?;

        Ok(body.security_question)
    }

    #[instrument(skip(self, answer))]
    async fn verify_security_answer(&self, username: &str, answer: &str) -> Result<(), GatewayError> {
        self.post(
            Endpoint::VerifyAnswer,
            &VerifyAnswerRequest {
                username,
                security_answer: answer,
            },
        )
        .await
        .map(drop)
    }

    #[instrument(skip(self, new_password))]
    async fn reset_password(
        &self,
        username: &str,
        new_password: &SecretString,
    ) -> Result<(), GatewayError> {
        self.post(
            Endpoint::ResetPassword,
            &ResetPasswordRequest {
                username,
                new_password: new_password.expose_secret(),
            },
        )
        .await
        .map(drop)
    }

    #[instrument(skip(self, password))]
    async fn sign_in(&self, username: &str, password: &SecretString) -> Result<(), GatewayError> {
        self.post(
            Endpoint::SignIn,
            &SignInRequest {
                username,
                password: password.expose_secret(),
            },
        )
        .await
        .map(drop)
    }

    #[instrument(skip_all, fields(username = %registration.username))]
    async fn sign_up(&self, registration: &Registration) -> Result<(), GatewayError> {
        self.post(
            Endpoint::SignUp,
            &SignUpRequest {
                first_name: &registration.first_name,
                last_name: &registration.last_name,
                email: &registration.email,
                phone: &registration.phone,
                username: &registration.username,
                password: registration.password.expose_secret(),
                security_question: &registration.security_question,
                security_answer: &registration.security_answer,
            },
        )
        .await
        .map(drop)
    }
}
