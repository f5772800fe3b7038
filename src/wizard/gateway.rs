//! Backend capability used by the portal forms.
//!
//! Each operation is a single request/response with no retries. The controllers
//! turn a `GatewayError` into a field- or form-scoped message and never advance
//! on failure.

use secrecy::SecretString;
use std::future::Future;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("not found")]
    NotFound,
    #[error("incorrect answer")]
    IncorrectAnswer,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("conflict")]
    Conflict,
    /// Refused by the server, with its message when it sent one.
    #[error("rejected: {}", .0.as_deref().unwrap_or("bad request"))]
    Rejected(Option<String>),
    #[error("transient failure: {0}")]
    Transient(String),
}

/// Sign-up payload, already normalized by the sign-up controller.
#[derive(Debug, Clone)]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub username: String,
    pub password: SecretString,
    pub security_question: String,
    pub security_answer: String,
}

pub trait AuthGateway: Send + Sync {
    /// Fetch the security question registered for `username`.
    fn lookup_security_question(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<String, GatewayError>> + Send;

    fn verify_security_answer(
        &self,
        username: &str,
        answer: &str,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;

    fn reset_password(
        &self,
        username: &str,
        new_password: &SecretString,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;

    fn sign_in(
        &self,
        username: &str,
        password: &SecretString,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;

    fn sign_up(
        &self,
        registration: &Registration,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;
}
