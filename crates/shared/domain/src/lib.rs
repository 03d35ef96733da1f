//! Domain layer - Core business entities and value objects.
//!
//! This crate contains pure domain logic with no infrastructure dependencies.
//! Users are keyed by the device they first contacted the service from and
//! own wallets (with a transaction ledger), sessions and push tokens.

pub mod account;
pub mod constants;
pub mod error;
pub mod pagination;
pub mod user;

pub use account::{PushToken, Session, Transaction, Wallet, WalletWithTransactions};
pub use constants::*;
pub use error::{DomainError, DomainResult};
#[cfg(feature = "openapi")]
pub use pagination::UserPage;
pub use pagination::{
    ListUsersQuery, Page, PageMeta, SortDirection, UserFilter, UserOrder, UserOrderField,
};
pub use user::{
    validate_device_id, validate_display_name, CreateUser, DeviceUser, NewDeviceUser, UpdateUser,
    User, UserDetails, UserProfile, UserSummary,
};
