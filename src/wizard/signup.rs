//! Sign-up form with the fixed list of security questions.

use super::{
    form::{FormError, FormState},
    gateway::{AuthGateway, GatewayError, Registration},
    validate::{Field, Screen, REQUIRED},
    Pending, PendingGuard, SubmitError, SubmitOutcome,
};
use secrecy::SecretString;
use tracing::{info, instrument, warn};

pub const SECURITY_QUESTIONS: [&str; 3] = [
    "What is your pet name ?",
    "Which is you Fav Car ?",
    "What city were you born in?",
];

pub const ACCOUNT_CREATED: &str = "Account created successfully! Please login to continue.";
pub const CHECK_INFORMATION: &str = "Registration failed: Please check your information";
pub const ALREADY_EXISTS: &str = "Registration failed: Email or username already exists";
pub const REGISTRATION_FAILED: &str = "Registration failed: Something went wrong";

#[derive(Debug, Clone)]
pub struct SignUpForm {
    form: FormState,
    submitting: bool,
    show_password: bool,
}

impl Default for SignUpForm {
    fn default() -> Self {
        Self::new()
    }
}

impl SignUpForm {
    #[must_use]
    pub fn new() -> Self {
        Self {
            form: FormState::new(Screen::SignUp),
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
    /// Returns `FormError::UnknownField` for fields outside the sign-up screen.
    pub fn set_field(&mut self, field: Field, value: impl Into<String>) -> Result<(), FormError> {
        self.form.set_field(field, value)
    }

    /// Validate every field and build the normalized registration.
    ///
    /// # Errors
    /// `Busy` while a submission is pending, `Invalid` when any field fails or the
    /// security question is not one of `SECURITY_QUESTIONS`.
    pub fn submit(&mut self) -> Result<Registration, SubmitError> {
        if self.submitting {
            return Err(SubmitError::Busy);
        }

        let mut valid = self.form.validate_all();

        let question = self.form.value(Field::SecurityQuestion);
        if !question.is_empty() && !SECURITY_QUESTIONS.contains(&question) {
            let mut errors = self.form.errors().clone();
            errors.insert(Field::SecurityQuestion, REQUIRED.to_string());
            self.form.replace_errors(errors);
            valid = false;
        }

        if !valid {
            return Err(SubmitError::Invalid);
        }

        self.submitting = true;

        let form = &self.form;
        Ok(Registration {
            first_name: form.value(Field::FirstName).trim().to_lowercase(),
            last_name: form.value(Field::LastName).trim().to_lowercase(),
            email: form.value(Field::Email).trim().to_lowercase(),
            phone: form.value(Field::Phone).trim().to_string(),
            username: form.value(Field::Username).trim().to_string(),
            password: SecretString::from(form.value(Field::Password).to_string()),
            security_question: form.value(Field::SecurityQuestion).to_string(),
            security_answer: form.value(Field::SecurityAnswer).trim().to_string(),
        })
    }

    /// On success the form is cleared for the next registration.
    ///
    /// # Errors
    /// `NotPending` if nothing was submitted.
    pub fn resolve(&mut self, result: Result<(), GatewayError>) -> Result<SubmitOutcome, SubmitError> {
        if !self.submitting {
            return Err(SubmitError::NotPending);
        }
        self.submitting = false;

        match result {
            Ok(()) => {
                info!("registration succeeded");
                self.form.reset();
                Ok(SubmitOutcome::Succeeded(ACCOUNT_CREATED.to_string()))
            }
            Err(err) => {
                warn!("registration failed: {}", err);
                let message = match err {
                    GatewayError::Rejected(Some(message)) => {
                        format!("Registration failed: {message}")
                    }
                    GatewayError::Rejected(None) => CHECK_INFORMATION.to_string(),
                    GatewayError::Conflict => ALREADY_EXISTS.to_string(),
                    _ => REGISTRATION_FAILED.to_string(),
                };
                Ok(SubmitOutcome::Failed(message))
            }
        }
    }

    /// # Errors
    /// Same as `submit`.
    #[instrument(skip_all)]
    pub async fn sign_up<G: AuthGateway>(&mut self, gateway: &G) -> Result<SubmitOutcome, SubmitError> {
        let registration = self.submit()?;
        let guard = PendingGuard::new(self);
        let result = gateway.sign_up(&registration).await;
        guard.resolve(|form| form.resolve(result))
    }
}

impl Pending for SignUpForm {
    fn cancel_pending(&mut self) {
        Self::cancel_pending(self);
    }
}
