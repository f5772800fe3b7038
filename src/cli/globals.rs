use std::{fmt, str::FromStr};

/// Deployment environment; `Development` exposes error details in responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    Development,
    #[default]
    Production,
}

impl Environment {
    #[must_use]
    pub const fn is_development(self) -> bool {
        matches!(self, Self::Development)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(format!("invalid environment: {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub environment: Environment,
    pub cors_origin: Option<String>,
}

impl GlobalArgs {
    #[must_use]
    pub const fn new(environment: Environment) -> Self {
        Self {
            environment,
            cors_origin: None,
        }
    }

    pub fn set_cors_origin(&mut self, origin: String) {
        self.cors_origin = Some(origin);
    }
}
