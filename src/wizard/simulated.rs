//! Stand-in backend: waits a fixed delay and reports success.

use super::gateway::{AuthGateway, GatewayError, Registration};
use secrecy::SecretString;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, instrument};

pub const DEFAULT_DELAY: Duration = Duration::from_millis(1500);
pub const DEFAULT_QUESTION: &str = "What is your pet name ?";

#[derive(Debug, Clone)]
pub struct SimulatedGateway {
    delay: Duration,
    question: String,
}

impl Default for SimulatedGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedGateway {
    #[must_use]
    pub fn new() -> Self {
        Self {
            delay: DEFAULT_DELAY,
            question: DEFAULT_QUESTION.to_string(),
        }
    }

    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    #[must_use]
    pub fn with_question(mut self, question: impl Into<String>) -> Self {
        self.question = question.into();
        self
    }
}

impl AuthGateway for SimulatedGateway {
    #[instrument(skip_all, fields(username = %username))]
    async fn lookup_security_question(&self, username: &str) -> Result<String, GatewayError> {
        sleep(self.delay).await;
        info!("simulated lookup, backend not connected");
        Ok(self.question.clone())
    }

    #[instrument(skip_all, fields(username = %username))]
    async fn verify_security_answer(&self, username: &str, _answer: &str) -> Result<(), GatewayError> {
        sleep(self.delay).await;
        info!("simulated answer verification, backend not connected");
        Ok(())
    }

    #[instrument(skip_all, fields(username = %username))]
    async fn reset_password(
        &self,
        username: &str,
        _new_password: &SecretString,
    ) -> Result<(), GatewayError> {
        sleep(self.delay).await;
        info!("simulated password reset, backend not connected");
        Ok(())
    }

    #[instrument(skip_all, fields(username = %username))]
    async fn sign_in(&self, username: &str, _password: &SecretString) -> Result<(), GatewayError> {
        sleep(self.delay).await;
        info!("simulated sign-in, backend not connected");
        Ok(())
    }

    #[instrument(skip_all, fields(username = %registration.username))]
    async fn sign_up(&self, registration: &Registration) -> Result<(), GatewayError> {
        sleep(self.delay).await;
        info!("simulated sign-up, backend not connected");
        Ok(())
    }
}
