//! User domain entity and related types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::account::{PushToken, Session, Wallet, WalletWithTransactions};
use crate::constants::{MAX_DEVICE_ID_LENGTH, MAX_DISPLAY_NAME_LENGTH, MIN_DISPLAY_NAME_LENGTH};
use crate::error::{DomainError, DomainResult};

/// User domain entity, keyed by the device it first contacted us from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct User {
    pub id: Uuid,
    pub device_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub last_seen_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a bare user for a device, seen now
    pub fn new(id: Uuid, device_id: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            device_id,
            display_name: None,
            last_seen_at: now,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Check a device identifier against the column constraints.
pub fn validate_device_id(device_id: &str) -> DomainResult<()> {
    if device_id.trim().is_empty() {
        return Err(DomainError::validation("Device ID cannot be empty"));
    }
    if device_id.len() > MAX_DEVICE_ID_LENGTH {
        return Err(DomainError::validation(format!(
            "Device ID cannot exceed {} characters",
            MAX_DEVICE_ID_LENGTH
        )));
    }
    Ok(())
}

/// Check a display name against the length bounds.
pub fn validate_display_name(name: &str) -> DomainResult<()> {
    let len = name.chars().count();
    if !(MIN_DISPLAY_NAME_LENGTH..=MAX_DISPLAY_NAME_LENGTH).contains(&len) {
        return Err(DomainError::validation(format!(
            "Display name must be between {} and {} characters",
            MIN_DISPLAY_NAME_LENGTH, MAX_DISPLAY_NAME_LENGTH
        )));
    }
    Ok(())
}

/// Full user creation input
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateUser {
    pub device_id: String,
    pub display_name: Option<String>,
    /// Defaults to the creation time
    pub last_seen_at: Option<DateTime<Utc>>,
}

impl CreateUser {
    /// Validate every supplied field
    pub fn validate(&self) -> DomainResult<()> {
        validate_device_id(&self.device_id)?;
        if let Some(ref name) = self.display_name {
            validate_display_name(name)?;
        }
        Ok(())
    }
}

/// Minimal creation input used on first contact from a device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDeviceUser {
    device_id: String,
}

impl NewDeviceUser {
    /// Build the input, rejecting device ids the store would not accept
    pub fn new(device_id: impl Into<String>) -> DomainResult<Self> {
        let device_id = device_id.into();
        validate_device_id(&device_id)?;
        Ok(Self { device_id })
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn into_device_id(self) -> String {
        self.device_id
    }
}

/// Partial user update; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UpdateUser {
    pub display_name: Option<String>,
    pub last_seen_at: Option<DateTime<Utc>>,
}

impl UpdateUser {
    /// Update that only moves the last-seen timestamp
    pub fn last_seen(at: DateTime<Utc>) -> Self {
        Self {
            last_seen_at: Some(at),
            ..Default::default()
        }
    }
}

/// User with wallets, sessions and push tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UserDetails {
    #[serde(flatten)]
    pub user: User,
    pub wallets: Vec<Wallet>,
    pub sessions: Vec<Session>,
    pub push_tokens: Vec<PushToken>,
}

/// User looked up by device: wallets and sessions, never push tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DeviceUser {
    #[serde(flatten)]
    pub user: User,
    pub wallets: Vec<Wallet>,
    pub sessions: Vec<Session>,
}

/// Deep user view.
///
/// Wallets carry their most recent transactions, sessions are limited to
/// non-revoked ones (newest first) and push tokens to active ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UserProfile {
    #[serde(flatten)]
    pub user: User,
    pub wallets: Vec<WalletWithTransactions>,
    pub sessions: Vec<Session>,
    pub push_tokens: Vec<PushToken>,
}

/// List entry: user with wallets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UserSummary {
    #[serde(flatten)]
    pub user: User,
    pub wallets: Vec<Wallet>,
}
