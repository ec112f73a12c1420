//! Brute-force lockout policy.
//!
//! Pure decision logic over an account's consecutive failed-attempt counter.
//! Persistence of the counter lives with the caller; this module only answers
//! whether a given count means the account is locked.

/// Number of consecutive failed password checks after which an account is
/// locked until the counter is reset.
pub const LOCKOUT_THRESHOLD: i32 = 5;

/// Whether an account with this many consecutive failed attempts is locked.
///
/// Callers must check this before comparing any password, so a locked
/// account never reaches the hash comparison.
pub fn is_locked(failed_attempts: i32) -> bool {
    failed_attempts >= LOCKOUT_THRESHOLD
}
