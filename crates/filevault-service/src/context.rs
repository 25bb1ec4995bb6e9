//! Request context carrying the authenticated principal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Context for the current authenticated request.
///
/// Authentication happens outside the core; every service method receives
/// the already-resolved principal through this value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The authenticated user's ID.
    pub user_id: i64,
    /// Whether the caller already proved the lock password in this session.
    pub unlock_verified: bool,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a context for the given user with no verified unlock.
    pub fn new(user_id: i64) -> Self {
        Self {
            user_id,
            unlock_verified: false,
            request_time: Utc::now(),
        }
    }

    /// Marks the session as having passed the lock-password check.
    pub fn with_unlock_verified(mut self) -> Self {
        self.unlock_verified = true;
        self
    }
}
