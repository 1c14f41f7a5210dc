//! Employer identity and profile models.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::validation::{DraftError, DraftResult};

/// Identity-provider user id of an employer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct EmployerId(pub String);

impl EmployerId {
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmployerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for EmployerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EmployerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Employer profile document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EmployerProfile {
    /// Document id in the employers collection
    pub id: String,

    pub employer_id: EmployerId,

    pub name: String,
    pub email: String,

    /// Industry or field the employer operates in
    #[serde(default)]
    pub field: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub about: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// Partial profile update. Empty or missing fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub about: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl ProfileUpdate {
    /// Drop blank fields, trimming the rest.
    pub fn normalized(&self) -> Self {
        Self {
            name: non_empty(&self.name),
            email: non_empty(&self.email).map(|e| e.to_lowercase()),
            field: non_empty(&self.field),
            about: non_empty(&self.about),
            location: non_empty(&self.location),
            website: non_empty(&self.website),
            avatar: non_empty(&self.avatar),
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Fields that differ from the stored profile, as `(field, value)` pairs.
    ///
    /// The avatar is included only when it actually changes.
    pub fn changes(&self, current: &EmployerProfile) -> Vec<(&'static str, String)> {
        let update = self.normalized();
        let mut out = Vec::new();
        let scalar = [
            ("name", update.name),
            ("email", update.email),
            ("field", update.field),
            ("about", update.about),
            ("location", update.location),
            ("website", update.website),
        ];
        for (key, value) in scalar {
            if let Some(v) = value {
                out.push((key, v));
            }
        }
        if let Some(avatar) = update.avatar {
            if current.avatar.as_deref() != Some(avatar.as_str()) {
                out.push(("avatar", avatar));
            }
        }
        out
    }
}

/// Sign-up form for a new employer account.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate)]
pub struct Registration {
    #[validate(length(min = 1, message = "Name is required"))]
    #[serde(default)]
    pub name: String,

    #[validate(email(message = "A valid email address is required"))]
    #[serde(default)]
    pub email: String,

    #[validate(length(min = 1, message = "Field is required"))]
    #[serde(default)]
    pub field: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    #[serde(default)]
    pub password: String,
}

impl Registration {
    /// Trim inputs, lower-case the email and validate.
    pub fn normalized(self) -> DraftResult<Self> {
        let reg = Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            field: self.field.trim().to_string(),
            password: self.password,
        };
        reg.validate()?;
        Ok(reg)
    }
}

/// Minimum length of a password set through the reset flow.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Request for a password-reset email.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, Validate)]
pub struct PasswordResetRequest {
    #[validate(email(message = "Please provide a valid email address"))]
    #[serde(default)]
    pub email: String,
}

impl PasswordResetRequest {
    pub fn normalized(self) -> DraftResult<Self> {
        let email = self.email.trim().to_lowercase();
        if email.is_empty() {
            return Err(DraftError::new("Please provide an email address"));
        }
        let req = Self { email };
        req.validate()?;
        Ok(req)
    }
}

/// New password plus the out-of-band code from the reset email.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct PasswordResetCompletion {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

impl PasswordResetCompletion {
    /// Required fields first, then the match, then the length.
    pub fn validate(&self) -> DraftResult<()> {
        if self.code.trim().is_empty() || self.password.is_empty() || self.confirm_password.is_empty() {
            return Err(DraftError::new("Please fill in all required fields"));
        }
        if self.password != self.confirm_password {
            return Err(DraftError::new("Passwords do not match"));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(DraftError::new(format!(
                "Password must be at least {} characters long",
                MIN_PASSWORD_LEN
            )));
        }
        Ok(())
    }
}
