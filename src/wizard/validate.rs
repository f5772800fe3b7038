//! Field validation shared by the sign-in, sign-up and reset screens.
//!
//! Every rule is a pure function of one field's value. The only exception is
//! `confirmPassword`, which reads the sibling `newPassword` at validation time.
//! An empty string means the value is valid.

use super::form::FormData;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const REQUIRED: &str = "Required";
pub const MIN_USERNAME: &str = "Min 3 characters";
pub const MIN_PASSWORD: &str = "Min 8 characters";
pub const USERNAME_CHARSET: &str = "Letters, numbers, underscore only";
pub const PASSWORDS_MISMATCH: &str = "Passwords do not match";
pub const INVALID_EMAIL: &str = "Invalid email";
pub const INVALID_PHONE: &str = "Invalid phone";

const MIN_USERNAME_LENGTH: usize = 3;
const MIN_PASSWORD_LENGTH: usize = 8;

/// Every input the portal screens know about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    FirstName,
    LastName,
    Email,
    Phone,
    Username,
    Password,
    SecurityQuestion,
    SecurityAnswer,
    NewPassword,
    ConfirmPassword,
}

impl Field {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FirstName => "firstName",
            Self::LastName => "lastName",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Username => "username",
            Self::Password => "password",
            Self::SecurityQuestion => "securityQuestion",
            Self::SecurityAnswer => "securityAnswer",
            Self::NewPassword => "newPassword",
            Self::ConfirmPassword => "confirmPassword",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The screen a form belongs to; decides which fields exist and which rules apply.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Screen {
    SignIn,
    SignUp,
    ResetPassword,
}

impl Screen {
    /// Fields in display order.
    #[must_use]
    pub const fn fields(self) -> &'static [Field] {
        match self {
            Self::SignIn => &[Field::Username, Field::Password],
            Self::SignUp => &[
                Field::FirstName,
                Field::LastName,
                Field::Email,
                Field::Phone,
                Field::Username,
                Field::Password,
                Field::SecurityQuestion,
                Field::SecurityAnswer,
            ],
            Self::ResetPassword => &[
                Field::Username,
                Field::SecurityAnswer,
                Field::NewPassword,
                Field::ConfirmPassword,
            ],
        }
    }

    #[must_use]
    pub fn has_field(self, field: Field) -> bool {
        self.fields().contains(&field)
    }
}

/// Validate one field. Returns the error message, or an empty string when valid.
#[must_use]
pub fn validate_field(screen: Screen, field: Field, value: &str, form: &FormData) -> String {
    let message = match field {
        Field::Username => username(screen, value),
        Field::Password | Field::NewPassword => password(value),
        Field::ConfirmPassword => {
            confirm_password(value, form.get(&Field::NewPassword).map_or("", String::as_str))
        }
        Field::Email => email(value),
        Field::Phone => phone(value),
        Field::FirstName
        | Field::LastName
        | Field::SecurityQuestion
        | Field::SecurityAnswer => required(value),
    };

    message.map_or_else(String::new, str::to_string)
}

fn required(value: &str) -> Option<&'static str> {
    value.trim().is_empty().then_some(REQUIRED)
}

fn username(screen: Screen, value: &str) -> Option<&'static str> {
    if value.trim().is_empty() {
        return Some(REQUIRED);
    }
    if value.chars().count() < MIN_USERNAME_LENGTH {
        return Some(MIN_USERNAME);
    }
    if screen == Screen::SignUp && !valid_username_charset(value) {
        return Some(USERNAME_CHARSET);
    }
    None
}

fn password(value: &str) -> Option<&'static str> {
    if value.is_empty() {
        return Some(REQUIRED);
    }
    (value.chars().count() < MIN_PASSWORD_LENGTH).then_some(MIN_PASSWORD)
}

fn confirm_password(value: &str, new_password: &str) -> Option<&'static str> {
    if value.is_empty() {
        return Some(REQUIRED);
    }
    (value != new_password).then_some(PASSWORDS_MISMATCH)
}

fn email(value: &str) -> Option<&'static str> {
    if value.trim().is_empty() {
        return Some(REQUIRED);
    }
    (!valid_email(value)).then_some(INVALID_EMAIL)
}

fn phone(value: &str) -> Option<&'static str> {
    if value.trim().is_empty() {
        return Some(REQUIRED);
    }
    (!valid_phone(value)).then_some(INVALID_PHONE)
}

pub fn valid_username_charset(username: &str) -> bool {
    Regex::new(r"^[a-zA-Z0-9_]+$").is_ok_and(|re| re.is_match(username))
}

/// `local@domain.tld`: word characters, hyphens and dots in the local part,
/// at least one dot in the domain and a 2-7 letter TLD.
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[A-Za-z0-9_-]+(\.[A-Za-z0-9_-]+)*@([A-Za-z0-9_-]+\.)+[a-zA-Z]{2,7}$")
        .is_ok_and(|re| re.is_match(email))
}

/// Optional `+`, a first digit 1-9, then 9 to 14 digits. Whitespace is ignored.
pub fn valid_phone(phone: &str) -> bool {
    let compact: String = phone.chars().filter(|c| !c.is_whitespace()).collect();
    Regex::new(r"^\+?[1-9][0-9]{9,14}$").is_ok_and(|re| re.is_match(&compact))
}
