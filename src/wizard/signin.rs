//! Sign-in form: validate both fields, submit once, report the result.

use super::{
    form::{FormError, FormState},
    gateway::{AuthGateway, GatewayError},
    validate::{Field, Screen},
    Pending, PendingGuard, SubmitError, SubmitOutcome,
};
use secrecy::SecretString;
use tracing::{info, instrument, warn};

pub const LOGIN_SUCCESSFUL: &str = "Login successful! Welcome back!";
pub const INVALID_CREDENTIALS: &str = "Invalid username or password";
pub const ACCOUNT_NOT_FOUND: &str = "Account not found. Please sign up first.";
pub const LOGIN_FAILED: &str = "Login failed: Something went wrong";

#[derive(Debug, Clone)]
pub struct SignInRequest {
    pub username: String,
    pub password: SecretString,
}

#[derive(Debug, Clone)]
pub struct SignInForm {
    form: FormState,
    submitting: bool,
    show_password: bool,
}

impl Default for SignInForm {
    fn default() -> Self {
        Self::new()
    }
}

impl SignInForm {
    #[must_use]
    pub fn new() -> Self {
        Self {
            form: FormState::new(Screen::SignIn),
            submitting: false,
            show_password: false,
        }
    }

    #[must_use]
    pub const fn form(&self) -> &FormState {
        &self.form
    }

    #[must_use]
    pub const fn is_submitting(&self) -> bool {
        self.submitting
    }

    #[must_use]
    pub const fn show_password(&self) -> bool {
        self.show_password
    }

    pub fn toggle_password_visibility(&mut self) {
        self.show_password = !self.show_password;
    }

    /// Forget an in-flight submission so the form can be submitted again.
    pub fn cancel_pending(&mut self) {
        self.submitting = false;
    }

    /// # Errors
    /// Returns `FormError::UnknownField` for fields outside the sign-in screen.
    pub fn set_field(&mut self, field: Field, value: impl Into<String>) -> Result<(), FormError> {
        self.form.set_field(field, value)
    }

    /// # Errors
    /// `Busy` while a submission is pending, `Invalid` when any field fails.
    pub fn submit(&mut self) -> Result<SignInRequest, SubmitError> {
        if self.submitting {
            return Err(SubmitError::Busy);
        }
        if !self.form.validate_all() {
            return Err(SubmitError::Invalid);
        }

        self.submitting = true;

        Ok(SignInRequest {
            username: self.form.value(Field::Username).trim().to_string(),
            password: SecretString::from(self.form.value(Field::Password).to_string()),
        })
    }

    /// # Errors
    /// `NotPending` if nothing was submitted.
    pub fn resolve(&mut self, result: Result<(), GatewayError>) -> Result<SubmitOutcome, SubmitError> {
        if !self.submitting {
            return Err(SubmitError::NotPending);
        }
        self.submitting = false;

        let outcome = match result {
            Ok(()) => {
                info!("sign-in succeeded");
                SubmitOutcome::Succeeded(LOGIN_SUCCESSFUL.to_string())
            }
            Err(err) => {
                warn!("sign-in failed: {}", err);
                SubmitOutcome::Failed(match err {
                    GatewayError::InvalidCredentials => INVALID_CREDENTIALS.to_string(),
                    GatewayError::NotFound => ACCOUNT_NOT_FOUND.to_string(),
                    GatewayError::Rejected(Some(message)) => format!("Login failed: {message}"),
                    _ => LOGIN_FAILED.to_string(),
                })
            }
        };

        Ok(outcome)
    }

    /// Validate, call the gateway and resolve in one go.
    ///
    /// # Errors
    /// Same as `submit`.
    #[instrument(skip_all)]
    pub async fn sign_in<G: AuthGateway>(&mut self, gateway: &G) -> Result<SubmitOutcome, SubmitError> {
        let request = self.submit()?;
        let guard = PendingGuard::new(self);
        let result = gateway.sign_in(&request.username, &request.password).await;
        guard.resolve(|form| form.resolve(result))
    }
}

impl Pending for SignInForm {
    fn cancel_pending(&mut self) {
        Self::cancel_pending(self);
    }
}
