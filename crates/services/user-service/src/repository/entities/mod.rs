//! SeaORM entity definitions
//!
//! These are database-specific entities separate from domain models.

pub mod push_token;
pub mod session;
pub mod transaction;
pub mod user;
pub mod wallet;
