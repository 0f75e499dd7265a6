use serde::{Deserialize, Serialize};

use crate::OrgId;

/// User information carried by an authenticated session.
///
/// Only what permission resolution consumes: the stable subject claim and the
/// organization the session is acting within. Profile data (name, email)
/// belongs to the identity provider, not to authorization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    subject: String,
    org_id: OrgId,
}

impl UserIdentity {
    /// Creates a user identity from authentication and organization data.
    #[must_use]
    pub fn new(subject: impl Into<String>, org_id: OrgId) -> Self {
        Self {
            subject: subject.into(),
            org_id,
        }
    }

    /// Returns the stable subject claim from the identity provider.
    #[must_use]
    pub fn subject(&self) -> &str {
        self.subject.as_str()
    }

    /// Returns the organization the identity is acting within.
    #[must_use]
    pub fn org_id(&self) -> OrgId {
        self.org_id
    }
}
