//! Identity capability.
//!
//! The cart layer consumes identity as a pure query: "who is signed in right
//! now, if anyone". Login and logout themselves belong to the host.

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    sync::RwLock,
};

use mockall::automock;
use serde::{Deserialize, Serialize};

/// Opaque user identifier supplied by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    /// Wrap an opaque identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(&self.0, f)
    }
}

/// A signed-in identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// The provider's identifier for this user.
    pub id: UserId,
}

/// Source of the current identity, or none when browsing anonymously.
#[automock]
pub trait IdentityProvider: Send + Sync {
    /// The identity currently signed in, if any.
    fn current_identity(&self) -> Option<Identity>;
}

/// In-process identity provider whose value can be switched at runtime.
///
/// Hosts use this to reflect sign-in state; tests use it to model sign-out
/// and identity switching mid-scenario.
#[derive(Debug, Default)]
pub struct SharedIdentity {
    current: RwLock<Option<Identity>>,
}

impl SharedIdentity {
    /// Start with nobody signed in.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Start signed in as the given user.
    #[must_use]
    pub fn signed_in(id: impl Into<String>) -> Self {
        let identity = Self::default();
        identity.sign_in(id);
        identity
    }

    /// Record a sign-in (or an identity switch).
    pub fn sign_in(&self, id: impl Into<String>) {
        if let Ok(mut current) = self.current.write() {
            *current = Some(Identity {
                id: UserId::new(id),
            });
        }
    }

    /// Record a sign-out.
    pub fn sign_out(&self) {
        if let Ok(mut current) = self.current.write() {
            *current = None;
        }
    }
}

impl IdentityProvider for SharedIdentity {
    fn current_identity(&self) -> Option<Identity> {
        self.current.read().ok().and_then(|current| current.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_identity_tracks_sign_in_and_out() {
        let identity = SharedIdentity::anonymous();
        assert_eq!(identity.current_identity(), None);

        identity.sign_in("user-1");
        assert_eq!(
            identity.current_identity().map(|i| i.id),
            Some(UserId::new("user-1"))
        );

        identity.sign_out();
        assert_eq!(identity.current_identity(), None);
    }

    #[test]
    fn switching_identity_replaces_the_previous_one() {
        let identity = SharedIdentity::signed_in("user-1");

        identity.sign_in("user-2");

        assert_eq!(
            identity.current_identity().map(|i| i.id),
            Some(UserId::new("user-2"))
        );
    }
}
