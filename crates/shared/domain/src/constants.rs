//! Domain-level constants.
//!
//! These constants define business rules and validation requirements.

// =============================================================================
// Pagination
// =============================================================================

/// Page size used when a list query does not specify `take`
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Page number reported when a list query does not specify `skip`
pub const DEFAULT_PAGE_NUMBER: u64 = 1;

// =============================================================================
// Relations
// =============================================================================

/// Number of most recent transactions loaded per wallet in a profile fetch
pub const RECENT_TRANSACTIONS_LIMIT: u64 = 50;

// =============================================================================
// Validation
// =============================================================================

/// Maximum device identifier length (matches the column width)
pub const MAX_DEVICE_ID_LENGTH: usize = 255;

/// Minimum display name length
pub const MIN_DISPLAY_NAME_LENGTH: usize = 1;

/// Maximum display name length
pub const MAX_DISPLAY_NAME_LENGTH: usize = 100;
