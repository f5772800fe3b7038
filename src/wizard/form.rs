//! Per-screen form state: values, field-scoped errors and focus.

use super::validate::{validate_field, Field, Screen};
use std::collections::BTreeMap;
use thiserror::Error;

pub type FormData = BTreeMap<Field, String>;
pub type ErrorMap = BTreeMap<Field, String>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("field {field} does not belong to the {screen:?} screen")]
    UnknownField { screen: Screen, field: Field },
    #[error("field {0} can no longer be edited")]
    Locked(Field),
}

#[derive(Debug, Clone)]
pub struct FormState {
    screen: Screen,
    values: FormData,
    errors: ErrorMap,
    focused: Option<Field>,
}

impl FormState {
    #[must_use]
    pub fn new(screen: Screen) -> Self {
        let values = screen
            .fields()
            .iter()
            .map(|field| (*field, String::new()))
            .collect();

        Self {
            screen,
            values,
            errors: ErrorMap::new(),
            focused: None,
        }
    }

    #[must_use]
    pub const fn screen(&self) -> Screen {
        self.screen
    }

    /// Store a value and re-validate that field only.
    ///
    /// # Errors
    /// Returns `FormError::UnknownField` if the field is not part of this screen.
    pub fn set_field(&mut self, field: Field, value: impl Into<String>) -> Result<(), FormError> {
        self.ensure_field(field)?;

        let value = value.into();
        let error = validate_field(self.screen, field, &value, &self.values);
        self.values.insert(field, value);
        self.errors.insert(field, error);

        Ok(())
    }

    #[must_use]
    pub fn value(&self, field: Field) -> &str {
        self.values.get(&field).map_or("", String::as_str)
    }

    #[must_use]
    pub const fn values(&self) -> &FormData {
        &self.values
    }

    /// Current message for a field, empty when valid or never validated.
    #[must_use]
    pub fn error(&self, field: Field) -> &str {
        self.errors.get(&field).map_or("", String::as_str)
    }

    #[must_use]
    pub const fn errors(&self) -> &ErrorMap {
        &self.errors
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.errors.values().any(|message| !message.is_empty())
    }

    /// Validate the given field against the current values without storing anything.
    #[must_use]
    pub fn check(&self, field: Field) -> String {
        validate_field(self.screen, field, self.value(field), &self.values)
    }

    /// Run every rule of the screen and replace the error map with the failures.
    /// Returns `true` when the form is valid.
    pub fn validate_all(&mut self) -> bool {
        self.errors = self
            .screen
            .fields()
            .iter()
            .filter_map(|field| {
                let error = self.check(*field);
                (!error.is_empty()).then_some((*field, error))
            })
            .collect();

        self.errors.is_empty()
    }

    /// Replace every error at once. Keys outside the screen are dropped.
    pub fn replace_errors<I>(&mut self, errors: I)
    where
        I: IntoIterator<Item = (Field, String)>,
    {
        let screen = self.screen;
        self.errors = errors
            .into_iter()
            .filter(|(field, _)| screen.has_field(*field))
            .collect();
    }

    pub fn clear_errors(&mut self) {
        self.errors.clear();
    }

    /// # Errors
    /// Returns `FormError::UnknownField` if the field is not part of this screen.
    pub fn focus(&mut self, field: Field) -> Result<(), FormError> {
        self.ensure_field(field)?;
        self.focused = Some(field);
        Ok(())
    }

    pub fn blur(&mut self) {
        self.focused = None;
    }

    #[must_use]
    pub const fn focused(&self) -> Option<Field> {
        self.focused
    }

    /// A field is active while focused or holding a value.
    #[must_use]
    pub fn is_field_active(&self, field: Field) -> bool {
        self.focused == Some(field) || !self.value(field).is_empty()
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.screen);
    }

    fn ensure_field(&self, field: Field) -> Result<(), FormError> {
        if self.screen.has_field(field) {
            Ok(())
        } else {
            Err(FormError::UnknownField {
                screen: self.screen,
                field,
            })
        }
    }
}
