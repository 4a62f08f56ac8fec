//! Wire DTOs for the GoTrue auth API and the PostgREST table API.
//!
//! Responses are decoded into these first and converted into domain types in
//! one pass; nothing outside this adapter sees them.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::{
    BusinessId, Category, CategoryId, CategoryUpdate, NewCategory, Principal, SecretToken,
    Session,
};

#[derive(Debug, Serialize)]
pub(super) struct PasswordGrantDto<'a> {
    pub(super) email: &'a str,
    pub(super) password: &'a str,
}

#[derive(Debug, Serialize)]
pub(super) struct RefreshGrantDto<'a> {
    pub(super) refresh_token: &'a str,
}

#[derive(Debug, Serialize)]
pub(super) struct RecoverDto<'a> {
    pub(super) email: &'a str,
}

#[derive(Debug, Deserialize)]
pub(super) struct UserDto {
    pub(super) id: Uuid,
    pub(super) email: Option<String>,
    #[serde(default)]
    pub(super) user_metadata: Value,
}

impl From<UserDto> for Principal {
    fn from(value: UserDto) -> Self {
        Self {
            id: value.id,
            email: value.email,
            metadata: value.user_metadata,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct SessionDto {
    pub(super) access_token: String,
    pub(super) refresh_token: String,
    pub(super) expires_in: Option<i64>,
    pub(super) expires_at: Option<i64>,
    pub(super) user: UserDto,
}

impl SessionDto {
    /// Prefer the absolute expiry; fall back to `now + expires_in`.
    pub(super) fn into_session(self, now: DateTime<Utc>) -> Result<Session, String> {
        let expires_at = match (self.expires_at, self.expires_in) {
            (Some(epoch), _) => Utc
                .timestamp_opt(epoch, 0)
                .single()
                .ok_or_else(|| format!("expires_at {epoch} is out of range"))?,
            (None, Some(secs)) => now + Duration::seconds(secs),
            (None, None) => return Err("session carries no expiry".to_owned()),
        };
        Ok(Session {
            access_token: SecretToken::new(self.access_token),
            refresh_token: SecretToken::new(self.refresh_token),
            expires_at,
            principal: self.user.into(),
        })
    }
}

/// `/signup` answers with a session when the project auto-confirms and with
/// the bare user when a confirmation email was sent.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum SignUpResponseDto {
    Session(SessionDto),
    User(UserDto),
}

#[derive(Debug, Deserialize)]
pub(super) struct CategoryRowDto {
    pub(super) id: Uuid,
    pub(super) business_id: Uuid,
    pub(super) name: String,
    pub(super) description: Option<String>,
    pub(super) created_at: DateTime<Utc>,
}

impl From<CategoryRowDto> for Category {
    fn from(value: CategoryRowDto) -> Self {
        Self {
            id: CategoryId::from_uuid(value.id),
            business_id: BusinessId::from_uuid(value.business_id),
            name: value.name,
            description: value.description,
            created_at: value.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct NewCategoryDto<'a> {
    pub(super) business_id: Uuid,
    pub(super) name: &'a str,
    pub(super) description: Option<&'a str>,
}

impl<'a> From<&'a NewCategory> for NewCategoryDto<'a> {
    fn from(value: &'a NewCategory) -> Self {
        Self {
            business_id: *value.business_id().as_uuid(),
            name: value.name(),
            description: value.description(),
        }
    }
}

/// Only the fields being changed are sent; `description: null` clears it.
#[derive(Debug, Serialize)]
pub(super) struct CategoryPatchDto<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) description: Option<Option<&'a str>>,
}

impl<'a> From<&'a CategoryUpdate> for CategoryPatchDto<'a> {
    fn from(value: &'a CategoryUpdate) -> Self {
        Self {
            name: value.name(),
            description: value.description(),
        }
    }
}

/// Union of the error shapes GoTrue and PostgREST return.
#[derive(Debug, Default, Deserialize)]
pub(super) struct ErrorBodyDto {
    msg: Option<String>,
    message: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
    error_code: Option<String>,
    code: Option<Value>,
}

impl ErrorBodyDto {
    pub(super) fn parse(body: &[u8]) -> Option<Self> {
        serde_json::from_slice(body).ok()
    }

    /// Most specific human-readable message present.
    pub(super) fn message(&self) -> Option<&str> {
        [
            &self.msg,
            &self.message,
            &self.error_description,
            &self.error,
        ]
        .into_iter()
        .flatten()
        .map(String::as_str)
        .find(|message| !message.trim().is_empty())
    }

    /// Machine-readable code: `error_code`, or a string `code`.
    pub(super) fn code(&self) -> Option<&str> {
        self.error_code
            .as_deref()
            .or_else(|| self.code.as_ref().and_then(Value::as_str))
    }
}
