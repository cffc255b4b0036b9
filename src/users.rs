//! Users
//!
//! User identity as returned by the API, the signup form and the profile
//! patch sent by UPDATE. [`UsersMachine`] lists and searches contacts.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::Credentials;
use crate::data::DataMachine;
use crate::http::HttpResource;
use crate::resource::Resource;
use crate::validation::{self, ValidationError};

pub const PASSWORD_MIN: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub uuid: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    /// Balance in cents
    #[serde(default)]
    pub balance: Option<i64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub modified_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn new(
        id: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            uuid: None,
            first_name: first_name.into(),
            last_name: last_name.into(),
            username: username.into(),
            email: None,
            phone_number: None,
            avatar: None,
            balance: None,
            created_at: None,
            modified_at: None,
        }
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

// ============================================================================
// Signup
// ============================================================================

/// Signup form
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub password: String,
    pub confirm_password: String,
}

impl NewUser {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        let password = password.into();
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            username: username.into(),
            confirm_password: password.clone(),
            password,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::required("firstName", &self.first_name)?;
        validation::required("lastName", &self.last_name)?;
        validation::required("username", &self.username)?;

        let actual = self.password.chars().count();
        if actual < PASSWORD_MIN {
            return Err(ValidationError::TooShort {
                field: "password",
                min: PASSWORD_MIN,
            });
        }
        if self.password != self.confirm_password {
            return Err(ValidationError::Mismatch {
                field: "confirmPassword",
                other: "password",
            });
        }
        Ok(())
    }

    /// Login input for the session opened right after signup
    pub fn credentials(&self, remember: bool) -> Credentials {
        Credentials::new(self.username.clone(), self.password.clone(), remember)
    }
}

impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

// ============================================================================
// Profile Update
// ============================================================================

/// Fields changed by a profile UPDATE; absent fields are left alone
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

impl ProfilePatch {
    pub fn first_name(mut self, value: impl Into<String>) -> Self {
        self.first_name = Some(value.into());
        self
    }

    pub fn last_name(mut self, value: impl Into<String>) -> Self {
        self.last_name = Some(value.into());
        self
    }

    pub fn email(mut self, value: impl Into<String>) -> Self {
        self.email = Some(value.into());
        self
    }

    pub fn phone_number(mut self, value: impl Into<String>) -> Self {
        self.phone_number = Some(value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
            && self.phone_number.is_none()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.is_empty() {
            return Err(ValidationError::Required { field: "profile" });
        }
        if let Some(v) = &self.first_name {
            validation::required("firstName", v)?;
        }
        if let Some(v) = &self.last_name {
            validation::required("lastName", v)?;
        }
        if let Some(v) = &self.email {
            let v = validation::required("email", v)?;
            if !v.contains('@') {
                return Err(ValidationError::InvalidFormat {
                    field: "email",
                    expected: "name@domain",
                });
            }
        }
        if let Some(v) = &self.phone_number {
            let v = validation::required("phoneNumber", v)?;
            if !v.chars().all(|c| c.is_ascii_digit() || "+-() ".contains(c)) {
                return Err(ValidationError::InvalidFormat {
                    field: "phoneNumber",
                    expected: "digits, spaces, + - ( )",
                });
            }
        }
        Ok(())
    }
}

// ============================================================================
// Resource Binding
// ============================================================================

impl Resource for User {
    type Id = String;
    type Draft = NewUser;

    const LABEL: &'static str = "User";

    fn id(&self) -> &String {
        &self.id
    }

    fn validate_draft(draft: &NewUser) -> Result<(), ValidationError> {
        draft.validate()
    }
}

impl HttpResource for User {
    const PATH: &'static str = "users";
    const ITEM_KEY: &'static str = "user";
    const SEARCH_PATH: Option<&'static str> = Some("users/search");
}

/// Contact list; FETCH with a `q` parameter searches
pub type UsersMachine = DataMachine<User>;
