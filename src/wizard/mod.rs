//! Client-side logic for the portal screens.
//!
//! Screens hold a [`form::FormState`] validated by [`validate`]. Submissions go
//! through an [`gateway::AuthGateway`]; [`simulated::SimulatedGateway`] stands in
//! until a backend exists and [`http::HttpGateway`] talks to one over JSON.

pub mod form;
pub mod gateway;
pub mod http;
pub mod reset;
pub mod signin;
pub mod signup;
pub mod simulated;
pub mod validate;

use thiserror::Error;

pub use self::form::{ErrorMap, FormData, FormError, FormState};
pub use self::gateway::{AuthGateway, GatewayError, Registration};
pub use self::reset::{ResetWizard, StepOutcome, WizardError, WizardStep};
pub use self::signin::SignInForm;
pub use self::signup::SignUpForm;
pub use self::simulated::SimulatedGateway;
pub use self::validate::{validate_field, Field, Screen};

/// A controller with at most one request in flight.
pub(crate) trait Pending {
    fn cancel_pending(&mut self);
}

/// Held across a gateway call by the async drivers. Dropping it before
/// `resolve` (the driver future was cancelled) clears the pending flag so the
/// step can be triggered again.
pub(crate) struct PendingGuard<'a, T: Pending> {
    owner: &'a mut T,
    armed: bool,
}

impl<'a, T: Pending> PendingGuard<'a, T> {
    pub(crate) fn new(owner: &'a mut T) -> Self {
        Self { owner, armed: true }
    }

    /// Apply the gateway reply; the owner's resolve step clears the flag itself.
    pub(crate) fn resolve<R>(mut self, apply: impl FnOnce(&mut T) -> R) -> R {
        self.armed = false;
        apply(&mut *self.owner)
    }
}

impl<T: Pending> Drop for PendingGuard<'_, T> {
    fn drop(&mut self) {
        if self.armed {
            self.owner.cancel_pending();
        }
    }
}

/// Why a single-step form did not submit or resolve.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("form has validation errors")]
    Invalid,
    #[error("a submission is already pending")]
    Busy,
    #[error("no submission pending")]
    NotPending,
}

/// User-facing result of a single-step form submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Succeeded(String),
    Failed(String),
}

impl SubmitOutcome {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }

    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Succeeded(message) | Self::Failed(message) => message,
        }
    }
}
