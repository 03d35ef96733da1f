//! Records owned by a user: wallets and their ledger, sessions, push tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Wallet owned by a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Wallet {
    pub id: Uuid,
    pub user_id: Uuid,
    pub address: String,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

/// Immutable ledger entry of a wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Transaction {
    pub id: Uuid,
    pub wallet_id: Uuid,
    /// Signed amount in minor units
    pub amount: i64,
    pub kind: String,
    pub timestamp: DateTime<Utc>,
}

/// Wallet together with its most recent transactions (newest first)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct WalletWithTransactions {
    #[serde(flatten)]
    pub wallet: Wallet,
    pub transactions: Vec<Transaction>,
}

/// Login session of a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    pub revoked: bool,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Check if the session can still be used
    pub fn is_active(&self) -> bool {
        !self.revoked
    }
}

/// Push notification token registered by a user's device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PushToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token: String,
    pub platform: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}
