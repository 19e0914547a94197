//! Host collaborator traits.
//!
//! The host implements these to give the resolver read access to its
//! session store and its registry of target applications.

use crate::models::{Authentication, RegisteredService};

/// Read access to existing single-sign-on sessions.
pub trait SessionStore: Send + Sync {
    /// Authentication bound to the session, or `None` when the session is
    /// unknown or expired.
    fn authentication(&self, session_id: &str) -> Option<Authentication>;
}

/// Read access to registered target applications.
pub trait ServiceRegistry: Send + Sync {
    fn find(&self, service_id: &str) -> Option<RegisteredService>;
}
