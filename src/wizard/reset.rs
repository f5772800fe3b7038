//! Password-reset wizard: Username → Security Q&A → New Password.
//!
//! The wizard is forward-only. Each step validates locally, hands a request to
//! the `AuthGateway` and only advances once the gateway confirms. While a step
//! waits on the gateway its pending flag blocks a second trigger; the flag lives
//! in the stage variant so two steps can never be pending at once.
//!
//! The synchronous `submit_*`/`resolve_*` pairs are the state machine proper.
//! `search_username`, `verify_answer` and `reset_password` drive one full round
//! trip against a gateway.

use super::{
    form::{FormError, FormState},
    gateway::{AuthGateway, GatewayError},
    validate::{Field, Screen},
    Pending, PendingGuard,
};
use secrecy::SecretString;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

pub const USERNAME_NOT_FOUND: &str = "Username not found";
pub const LOOKUP_FAILED: &str = "Something went wrong";
pub const INCORRECT_ANSWER: &str = "Incorrect answer";
pub const VERIFICATION_FAILED: &str = "Verification failed";
pub const RESET_FAILED: &str = "Password reset failed. Please try again.";
pub const RESET_SUCCESSFUL: &str =
    "Password reset successful! You can now login with your new password.";

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WizardStep {
    UsernameEntry,
    SecurityChallenge,
    PasswordReset,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stage {
    UsernameEntry { pending: bool },
    SecurityChallenge { pending: bool },
    PasswordReset { pending: bool },
    Completed,
}

impl Stage {
    const fn step(self) -> WizardStep {
        match self {
            Self::UsernameEntry { .. } => WizardStep::UsernameEntry,
            Self::SecurityChallenge { .. } => WizardStep::SecurityChallenge,
            Self::PasswordReset { .. } | Self::Completed => WizardStep::PasswordReset,
        }
    }

    const fn is_pending(self) -> bool {
        match self {
            Self::UsernameEntry { pending }
            | Self::SecurityChallenge { pending }
            | Self::PasswordReset { pending } => pending,
            Self::Completed => false,
        }
    }

    const fn with_pending(self, pending: bool) -> Self {
        match self {
            Self::UsernameEntry { .. } => Self::UsernameEntry { pending },
            Self::SecurityChallenge { .. } => Self::SecurityChallenge { pending },
            Self::PasswordReset { .. } => Self::PasswordReset { pending },
            Self::Completed => Self::Completed,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WizardError {
    #[error("form has validation errors")]
    Invalid,
    #[error("a request for this step is already pending")]
    Busy,
    #[error("wizard is at {current:?}, not {expected:?}")]
    OutOfStep {
        expected: WizardStep,
        current: WizardStep,
    },
    #[error("no request pending for {0:?}")]
    NotPending(WizardStep),
    #[error("password reset already completed")]
    Completed,
}

/// Result of applying a gateway reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Advanced(WizardStep),
    /// The gateway failed; the error is on the step's field.
    Stayed,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupRequest {
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyRequest {
    pub username: String,
    pub answer: String,
}

#[derive(Debug, Clone)]
pub struct ResetRequest {
    pub username: String,
    pub new_password: SecretString,
}

#[derive(Debug, Clone)]
pub struct ResetWizard {
    form: FormState,
    stage: Stage,
    security_question: Option<String>,
    /// Trimmed username the question was found for; fixed once step 1 succeeds.
    verified_username: Option<String>,
}

impl Default for ResetWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl ResetWizard {
    #[must_use]
    pub fn new() -> Self {
        Self {
            form: FormState::new(Screen::ResetPassword),
            stage: Stage::UsernameEntry { pending: false },
            security_question: None,
            verified_username: None,
        }
    }

    #[must_use]
    pub const fn step(&self) -> WizardStep {
        self.stage.step()
    }

    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.stage.is_pending()
    }

    #[must_use]
    pub const fn is_complete(&self) -> bool {
        matches!(self.stage, Stage::Completed)
    }

    #[must_use]
    pub fn security_question(&self) -> Option<&str> {
        self.security_question.as_deref()
    }

    #[must_use]
    pub fn verified_username(&self) -> Option<&str> {
        self.verified_username.as_deref()
    }

    #[must_use]
    pub const fn form(&self) -> &FormState {
        &self.form
    }

    /// # Errors
    /// Returns `FormError::UnknownField` for fields outside the reset screen and
    /// `FormError::Locked` for the username once a search is pending or done.
    pub fn set_field(&mut self, field: Field, value: impl Into<String>) -> Result<(), FormError> {
        if field == Field::Username && self.stage != (Stage::UsernameEntry { pending: false }) {
            return Err(FormError::Locked(field));
        }
        self.form.set_field(field, value)
    }

    /// Forget an in-flight request so the current step can be triggered again.
    /// A late reply is then refused with `NotPending`.
    pub fn cancel_pending(&mut self) {
        if self.stage.is_pending() {
            debug!("abandoning pending {:?} request", self.stage.step());
            self.stage = self.stage.with_pending(false);
        }
    }

    /// Back to the first step with an empty form and no question.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    // Always set past step 1.
    fn username_for_request(&self) -> String {
        self.verified_username.clone().unwrap_or_default()
    }

    fn expect_step(&self, expected: WizardStep) -> Result<(), WizardError> {
        if self.is_complete() {
            return Err(WizardError::Completed);
        }
        let current = self.step();
        if current != expected {
            return Err(WizardError::OutOfStep { expected, current });
        }
        if self.is_pending() {
            return Err(WizardError::Busy);
        }
        Ok(())
    }

    fn expect_pending(&self, expected: WizardStep) -> Result<(), WizardError> {
        if self.is_complete() || self.step() != expected || !self.is_pending() {
            return Err(WizardError::NotPending(expected));
        }
        Ok(())
    }

    /// Validate the username and mark the search pending.
    ///
    /// # Errors
    /// `Invalid` (username error stored), `Busy`, `OutOfStep` or `Completed`.
    pub fn submit_username(&mut self) -> Result<LookupRequest, WizardError> {
        self.expect_step(WizardStep::UsernameEntry)?;

        let error = self.form.check(Field::Username);
        if !error.is_empty() {
            self.form.replace_errors([(Field::Username, error)]);
            return Err(WizardError::Invalid);
        }

        self.stage = self.stage.with_pending(true);

        Ok(LookupRequest {
            username: self.form.value(Field::Username).trim().to_string(),
        })
    }

    /// # Errors
    /// `NotPending` if no search is in flight.
    pub fn resolve_lookup(
        &mut self,
        result: Result<String, GatewayError>,
    ) -> Result<StepOutcome, WizardError> {
        self.expect_pending(WizardStep::UsernameEntry)?;

        match result {
            Ok(question) => {
                self.security_question = Some(question);
                self.verified_username =
                    Some(self.form.value(Field::Username).trim().to_string());
                self.form.clear_errors();
                self.stage = Stage::SecurityChallenge { pending: false };
                debug!("security question found, moving to security challenge");
                Ok(StepOutcome::Advanced(WizardStep::SecurityChallenge))
            }
            Err(err) => {
                warn!("security question lookup failed: {}", err);
                let message = match err {
                    GatewayError::NotFound => USERNAME_NOT_FOUND,
                    _ => LOOKUP_FAILED,
                };
                self.form
                    .replace_errors([(Field::Username, message.to_string())]);
                self.stage = self.stage.with_pending(false);
                Ok(StepOutcome::Stayed)
            }
        }
    }

    /// Validate the answer and mark verification pending.
    ///
    /// # Errors
    /// `Invalid` (answer error stored), `Busy`, `OutOfStep` or `Completed`.
    pub fn submit_answer(&mut self) -> Result<VerifyRequest, WizardError> {
        self.expect_step(WizardStep::SecurityChallenge)?;

        let error = self.form.check(Field::SecurityAnswer);
        if !error.is_empty() {
            self.form.replace_errors([(Field::SecurityAnswer, error)]);
            return Err(WizardError::Invalid);
        }

        self.stage = self.stage.with_pending(true);

        Ok(VerifyRequest {
            username: self.username_for_request(),
            answer: self.form.value(Field::SecurityAnswer).trim().to_string(),
        })
    }

    /// # Errors
    /// `NotPending` if no verification is in flight.
    pub fn resolve_verification(
        &mut self,
        result: Result<(), GatewayError>,
    ) -> Result<StepOutcome, WizardError> {
        self.expect_pending(WizardStep::SecurityChallenge)?;

        match result {
            Ok(()) => {
                self.form.clear_errors();
                self.stage = Stage::PasswordReset { pending: false };
                debug!("security answer accepted, moving to password reset");
                Ok(StepOutcome::Advanced(WizardStep::PasswordReset))
            }
            Err(err) => {
                warn!("security answer verification failed: {}", err);
                let message = match err {
                    GatewayError::IncorrectAnswer => INCORRECT_ANSWER,
                    _ => VERIFICATION_FAILED,
                };
                self.form
                    .replace_errors([(Field::SecurityAnswer, message.to_string())]);
                self.stage = self.stage.with_pending(false);
                Ok(StepOutcome::Stayed)
            }
        }
    }

    /// Validate both password fields and mark the reset pending.
    ///
    /// # Errors
    /// `Invalid` (both password errors stored), `Busy`, `OutOfStep` or `Completed`.
    pub fn submit_new_password(&mut self) -> Result<ResetRequest, WizardError> {
        self.expect_step(WizardStep::PasswordReset)?;

        let new_password_error = self.form.check(Field::NewPassword);
        let confirm_password_error = self.form.check(Field::ConfirmPassword);

        if !new_password_error.is_empty() || !confirm_password_error.is_empty() {
            self.form.replace_errors([
                (Field::NewPassword, new_password_error),
                (Field::ConfirmPassword, confirm_password_error),
            ]);
            return Err(WizardError::Invalid);
        }

        self.stage = self.stage.with_pending(true);

        Ok(ResetRequest {
            username: self.username_for_request(),
            new_password: SecretString::from(self.form.value(Field::NewPassword).to_string()),
        })
    }

    /// # Errors
    /// `NotPending` if no reset is in flight.
    pub fn resolve_reset(
        &mut self,
        result: Result<(), GatewayError>,
    ) -> Result<StepOutcome, WizardError> {
        self.expect_pending(WizardStep::PasswordReset)?;

        match result {
            Ok(()) => {
                self.form.clear_errors();
                self.stage = Stage::Completed;
                info!("{}", RESET_SUCCESSFUL);
                Ok(StepOutcome::Completed)
            }
            Err(err) => {
                warn!("password reset failed: {}", err);
                self.form
                    .replace_errors([(Field::NewPassword, RESET_FAILED.to_string())]);
                self.stage = self.stage.with_pending(false);
                Ok(StepOutcome::Stayed)
            }
        }
    }

    /// Step 1 round trip.
    ///
    /// # Errors
    /// Same as `submit_username`.
    #[instrument(skip_all)]
    pub async fn search_username<G: AuthGateway>(
        &mut self,
        gateway: &G,
    ) -> Result<StepOutcome, WizardError> {
        let request = self.submit_username()?;
        let guard = PendingGuard::new(self);
        let result = gateway.lookup_security_question(&request.username).await;
        guard.resolve(|wizard| wizard.resolve_lookup(result))
    }

    /// Step 2 round trip.
    ///
    /// # Errors
    /// Same as `submit_answer`.
    #[instrument(skip_all)]
    pub async fn verify_answer<G: AuthGateway>(
        &mut self,
        gateway: &G,
    ) -> Result<StepOutcome, WizardError> {
        let request = self.submit_answer()?;
        let guard = PendingGuard::new(self);
        let result = gateway
            .verify_security_answer(&request.username, &request.answer)
            .await;
        guard.resolve(|wizard| wizard.resolve_verification(result))
    }

    /// Step 3 round trip.
    ///
    /// # Errors
    /// Same as `submit_new_password`.
    #[instrument(skip_all)]
    pub async fn reset_password<G: AuthGateway>(
        &mut self,
        gateway: &G,
    ) -> Result<StepOutcome, WizardError> {
        let request = self.submit_new_password()?;
        let guard = PendingGuard::new(self);
        let result = gateway
            .reset_password(&request.username, &request.new_password)
            .await;
        guard.resolve(|wizard| wizard.resolve_reset(result))
    }
}

impl Pending for ResetWizard {
    fn cancel_pending(&mut self) {
        Self::cancel_pending(self);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::wizard::{
        gateway::Registration,
        simulated::{SimulatedGateway, DEFAULT_QUESTION},
        validate::{MIN_USERNAME, PASSWORDS_MISMATCH, REQUIRED},
    };
    use secrecy::ExposeSecret;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    };
    use std::time::Duration;

    /// Records calls and replays scripted failures.
    #[derive(Default)]
    struct FakeGateway {
        lookup_error: Option<GatewayError>,
        verify_error: Option<GatewayError>,
        reset_error: Option<GatewayError>,
        calls: AtomicUsize,
        last_reset: Mutex<Option<(String, String)>>,
    }

    impl AuthGateway for FakeGateway {
        async fn lookup_security_question(&self, _username: &str) -> Result<String, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.lookup_error
                .clone()
                .map_or_else(|| Ok("Which is you Fav Car ?".to_string()), Err)
        }

        async fn verify_security_answer(
            &self,
            _username: &str,
            _answer: &str,
        ) -> Result<(), GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.verify_error.clone().map_or(Ok(()), Err)
        }

        async fn reset_password(
            &self,
            username: &str,
            new_password: &SecretString,
        ) -> Result<(), GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_reset.lock().unwrap() = Some((
                username.to_string(),
                new_password.expose_secret().to_string(),
            ));
            self.reset_error.clone().map_or(Ok(()), Err)
        }

        async fn sign_in(&self, _username: &str, _password: &SecretString) -> Result<(), GatewayError> {
            Ok(())
        }

        async fn sign_up(&self, _registration: &Registration) -> Result<(), GatewayError> {
            Ok(())
        }
    }

    fn quick() -> SimulatedGateway {
        SimulatedGateway::new().with_delay(Duration::ZERO)
    }

    #[tokio::test]
    async fn valid_username_moves_to_security_challenge() {
        let mut wizard = ResetWizard::new();
        wizard.set_field(Field::Username, "alice").unwrap();

        let outcome = wizard.search_username(&quick()).await.unwrap();

        assert_eq!(outcome, StepOutcome::Advanced(WizardStep::SecurityChallenge));
        assert_eq!(wizard.step(), WizardStep::SecurityChallenge);
        assert_eq!(wizard.security_question(), Some(DEFAULT_QUESTION));
        assert!(wizard.form().errors().is_empty());
        assert!(!wizard.is_pending());
    }

    #[tokio::test]
    async fn short_username_stays_with_error() {
        let gateway = FakeGateway::default();
        let mut wizard = ResetWizard::new();
        wizard.set_field(Field::Username, "ab").unwrap();
        wizard.set_field(Field::NewPassword, "x").unwrap();

        let result = wizard.search_username(&gateway).await;

        assert_eq!(result, Err(WizardError::Invalid));
        assert_eq!(wizard.step(), WizardStep::UsernameEntry);
        assert_eq!(wizard.form().error(Field::Username), MIN_USERNAME);
        assert_eq!(wizard.form().errors().len(), 1);
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
        assert!(!wizard.is_pending());
    }

    #[test]
    fn second_trigger_while_pending_is_ignored() {
        let mut wizard = ResetWizard::new();
        wizard.set_field(Field::Username, "  alice ").unwrap();

        let request = wizard.submit_username().unwrap();
        assert_eq!(request.username, "alice");
        assert!(wizard.is_pending());

        assert_eq!(wizard.submit_username(), Err(WizardError::Busy));

        let outcome = wizard
            .resolve_lookup(Ok("What city were you born in?".to_string()))
            .unwrap();
        assert_eq!(outcome, StepOutcome::Advanced(WizardStep::SecurityChallenge));

        // only one reply can land
        assert_eq!(
            wizard.resolve_lookup(Ok("again".to_string())),
            Err(WizardError::NotPending(WizardStep::UsernameEntry))
        );
        assert_eq!(wizard.security_question(), Some("What city were you born in?"));
    }

    #[tokio::test]
    async fn lookup_failures_are_scoped_to_username() {
        let mut wizard = ResetWizard::new();
        wizard.set_field(Field::Username, "ghost").unwrap();

        let not_found = FakeGateway {
            lookup_error: Some(GatewayError::NotFound),
            ..FakeGateway::default()
        };
        assert_eq!(
            wizard.search_username(&not_found).await,
            Ok(StepOutcome::Stayed)
        );
        assert_eq!(wizard.step(), WizardStep::UsernameEntry);
        assert_eq!(wizard.form().error(Field::Username), USERNAME_NOT_FOUND);
        assert_eq!(wizard.security_question(), None);

        let down = FakeGateway {
            lookup_error: Some(GatewayError::Transient("timeout".to_string())),
            ..FakeGateway::default()
        };
        assert_eq!(wizard.search_username(&down).await, Ok(StepOutcome::Stayed));
        assert_eq!(wizard.form().error(Field::Username), LOOKUP_FAILED);
        assert!(!wizard.is_pending());
    }

    #[tokio::test]
    async fn answer_must_be_present_and_correct() {
        let gateway = FakeGateway {
            verify_error: Some(GatewayError::IncorrectAnswer),
            ..FakeGateway::default()
        };
        let mut wizard = ResetWizard::new();
        wizard.set_field(Field::Username, "alice").unwrap();
        wizard.search_username(&gateway).await.unwrap();

        assert_eq!(
            wizard.verify_answer(&gateway).await,
            Err(WizardError::Invalid)
        );
        assert_eq!(wizard.form().error(Field::SecurityAnswer), REQUIRED);

        wizard.set_field(Field::SecurityAnswer, "tom").unwrap();
        assert_eq!(wizard.verify_answer(&gateway).await, Ok(StepOutcome::Stayed));
        assert_eq!(wizard.step(), WizardStep::SecurityChallenge);
        assert_eq!(wizard.form().error(Field::SecurityAnswer), INCORRECT_ANSWER);

        let flaky = FakeGateway {
            verify_error: Some(GatewayError::Transient("503".to_string())),
            ..FakeGateway::default()
        };
        assert_eq!(wizard.verify_answer(&flaky).await, Ok(StepOutcome::Stayed));
        assert_eq!(
            wizard.form().error(Field::SecurityAnswer),
            VERIFICATION_FAILED
        );
    }

    #[tokio::test]
    async fn full_flow_completes() {
        let gateway = FakeGateway::default();
        let mut wizard = ResetWizard::new();

        wizard.set_field(Field::Username, " alice").unwrap();
        wizard.search_username(&gateway).await.unwrap();
        wizard.set_field(Field::SecurityAnswer, "rex").unwrap();
        assert_eq!(
            wizard.verify_answer(&gateway).await,
            Ok(StepOutcome::Advanced(WizardStep::PasswordReset))
        );

        wizard.set_field(Field::NewPassword, "newpassword").unwrap();
        wizard.set_field(Field::ConfirmPassword, "newpassword").unwrap();
        assert_eq!(
            wizard.reset_password(&gateway).await,
            Ok(StepOutcome::Completed)
        );

        assert!(wizard.is_complete());
        assert_eq!(wizard.step(), WizardStep::PasswordReset);
        assert_eq!(
            *gateway.last_reset.lock().unwrap(),
            Some(("alice".to_string(), "newpassword".to_string()))
        );
        assert_eq!(
            wizard.submit_new_password().map(|_| ()),
            Err(WizardError::Completed)
        );
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn mismatched_passwords_send_nothing() {
        let gateway = FakeGateway::default();
        let mut wizard = ResetWizard::new();
        wizard.set_field(Field::Username, "alice").unwrap();
        wizard.search_username(&gateway).await.unwrap();
        wizard.set_field(Field::SecurityAnswer, "rex").unwrap();
        wizard.verify_answer(&gateway).await.unwrap();

        wizard.set_field(Field::NewPassword, "newpassword").unwrap();
        wizard.set_field(Field::ConfirmPassword, "newpassw0rd").unwrap();

        assert_eq!(
            wizard.reset_password(&gateway).await.map(|_| ()),
            Err(WizardError::Invalid)
        );
        assert_eq!(wizard.form().error(Field::NewPassword), "");
        assert_eq!(
            wizard.form().error(Field::ConfirmPassword),
            PASSWORDS_MISMATCH
        );
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 2);
        assert!(!wizard.is_complete());
    }

    #[tokio::test]
    async fn reset_failure_stays_on_last_step() {
        let gateway = FakeGateway {
            reset_error: Some(GatewayError::Transient("500".to_string())),
            ..FakeGateway::default()
        };
        let mut wizard = ResetWizard::new();
        wizard.set_field(Field::Username, "alice").unwrap();
        wizard.search_username(&gateway).await.unwrap();
        wizard.set_field(Field::SecurityAnswer, "rex").unwrap();
        wizard.verify_answer(&gateway).await.unwrap();
        wizard.set_field(Field::NewPassword, "newpassword").unwrap();
        wizard.set_field(Field::ConfirmPassword, "newpassword").unwrap();

        assert_eq!(wizard.reset_password(&gateway).await, Ok(StepOutcome::Stayed));
        assert!(!wizard.is_complete());
        assert_eq!(wizard.form().error(Field::NewPassword), RESET_FAILED);
    }

    #[test]
    fn steps_cannot_be_skipped() {
        let mut wizard = ResetWizard::new();
        wizard.set_field(Field::SecurityAnswer, "rex").unwrap();

        assert_eq!(
            wizard.submit_answer(),
            Err(WizardError::OutOfStep {
                expected: WizardStep::SecurityChallenge,
                current: WizardStep::UsernameEntry,
            })
        );
        assert_eq!(
            wizard.resolve_verification(Ok(())),
            Err(WizardError::NotPending(WizardStep::SecurityChallenge))
        );
        assert!(WizardStep::UsernameEntry < WizardStep::SecurityChallenge);
        assert!(WizardStep::SecurityChallenge < WizardStep::PasswordReset);
    }

    #[tokio::test]
    async fn username_is_fixed_after_lookup() {
        let gateway = FakeGateway::default();
        let mut wizard = ResetWizard::new();
        wizard.set_field(Field::Username, " alice ").unwrap();

        wizard.submit_username().unwrap();
        assert_eq!(
            wizard.set_field(Field::Username, "eve"),
            Err(FormError::Locked(Field::Username))
        );
        wizard
            .resolve_lookup(Ok("Which is you Fav Car ?".to_string()))
            .unwrap();
        assert_eq!(wizard.verified_username(), Some("alice"));

        assert_eq!(
            wizard.set_field(Field::Username, "mallory"),
            Err(FormError::Locked(Field::Username))
        );
        wizard.set_field(Field::SecurityAnswer, "rex").unwrap();
        assert_eq!(wizard.submit_answer().unwrap().username, "alice");
        wizard.resolve_verification(Ok(())).unwrap();

        assert_eq!(
            wizard.set_field(Field::Username, "mallory"),
            Err(FormError::Locked(Field::Username))
        );
        wizard.set_field(Field::NewPassword, "newpassword").unwrap();
        wizard.set_field(Field::ConfirmPassword, "newpassword").unwrap();
        assert_eq!(wizard.reset_password(&gateway).await, Ok(StepOutcome::Completed));
        assert_eq!(
            *gateway.last_reset.lock().unwrap(),
            Some(("alice".to_string(), "newpassword".to_string()))
        );

        wizard.reset();
        assert_eq!(wizard.verified_username(), None);
        assert!(wizard.set_field(Field::Username, "bob").is_ok());
    }

    #[test]
    fn later_steps_are_busy_while_pending() {
        let mut wizard = ResetWizard::new();
        wizard.set_field(Field::Username, "alice").unwrap();
        wizard.submit_username().unwrap();
        wizard.resolve_lookup(Ok(DEFAULT_QUESTION.to_string())).unwrap();

        wizard.set_field(Field::SecurityAnswer, "rex").unwrap();
        wizard.submit_answer().unwrap();
        assert_eq!(wizard.submit_answer(), Err(WizardError::Busy));
        wizard.resolve_verification(Ok(())).unwrap();

        wizard.set_field(Field::NewPassword, "newpassword").unwrap();
        wizard.set_field(Field::ConfirmPassword, "newpassword").unwrap();
        wizard.submit_new_password().unwrap();
        assert_eq!(
            wizard.submit_new_password().map(|_| ()),
            Err(WizardError::Busy)
        );
        assert_eq!(wizard.resolve_reset(Ok(())), Ok(StepOutcome::Completed));
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_driver_releases_the_step() {
        let mut wizard = ResetWizard::new();
        wizard.set_field(Field::Username, "alice").unwrap();

        let slow = SimulatedGateway::new();
        let timed_out =
            tokio::time::timeout(Duration::from_millis(10), wizard.search_username(&slow)).await;
        assert!(timed_out.is_err());

        assert!(!wizard.is_pending());
        assert_eq!(wizard.step(), WizardStep::UsernameEntry);
        assert_eq!(
            wizard.resolve_lookup(Ok("late".to_string())),
            Err(WizardError::NotPending(WizardStep::UsernameEntry))
        );
        assert_eq!(
            wizard.search_username(&quick()).await,
            Ok(StepOutcome::Advanced(WizardStep::SecurityChallenge))
        );
    }

    #[test]
    fn cancel_pending_is_a_noop_when_idle() {
        let mut wizard = ResetWizard::new();
        wizard.cancel_pending();
        assert!(!wizard.is_pending());
        assert_eq!(wizard.step(), WizardStep::UsernameEntry);
    }

    #[tokio::test]
    async fn reset_clears_question_and_form() {
        let mut wizard = ResetWizard::new();
        wizard.set_field(Field::Username, "alice").unwrap();
        wizard.search_username(&quick()).await.unwrap();

        wizard.reset();

        assert_eq!(wizard.step(), WizardStep::UsernameEntry);
        assert_eq!(wizard.security_question(), None);
        assert_eq!(wizard.form().value(Field::Username), "");
    }
}
