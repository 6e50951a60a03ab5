//! Authorization Guard
//! Mission: Turn bearer tokens into identities and decide resource access

use crate::auth::{
    errors::AuthError,
    jwt::JwtHandler,
    models::{User, UserRole},
    user_store::UserStore,
};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Operations a caller can attempt on an owned resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
}

/// Outcome of an authorization check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        self == Decision::Allow
    }
}

/// A resource with a single owning user
pub trait Owned {
    fn owner_id(&self) -> Uuid;
}

/// Resolves tokens against the credential store and applies access rules
#[derive(Clone)]
pub struct AuthGuard {
    user_store: Arc<dyn UserStore>,
    jwt_handler: Arc<JwtHandler>,
}

impl AuthGuard {
    pub fn new(user_store: Arc<dyn UserStore>, jwt_handler: Arc<JwtHandler>) -> Self {
        Self {
            user_store,
            jwt_handler,
        }
    }

    /// Verify `token` and load the user it names.
    ///
    /// A valid signature naming a user that is not in the store fails
    /// closed with `UnknownSubject`.
    pub fn resolve_identity(&self, token: &str) -> Result<User, AuthError> {
        let subject = self.jwt_handler.verify(token)?;

        self.user_store.get_user_by_id(&subject).ok_or_else(|| {
            warn!("Valid token for unknown subject {}", subject);
            AuthError::UnknownSubject
        })
    }

    /// Decide whether `identity` may perform `action` on `resource`
    pub fn authorize<R: Owned + ?Sized>(
        &self,
        identity: &User,
        action: Action,
        resource: &R,
    ) -> Decision {
        let decision = authorize(identity, action, resource);
        if decision == Decision::Deny {
            debug!(
                "Denied {:?} for {} ({}) on resource owned by {}",
                action,
                identity.username,
                identity.role.as_str(),
                resource.owner_id()
            );
        }
        decision
    }

    /// Like `authorize`, but as a `Result` for `?` in handlers
    pub fn require<R: Owned + ?Sized>(
        &self,
        identity: &User,
        action: Action,
        resource: &R,
    ) -> Result<(), AuthError> {
        match self.authorize(identity, action, resource) {
            Decision::Allow => Ok(()),
            Decision::Deny => Err(AuthError::Forbidden),
        }
    }
}

/// Two-tier rule: admins may do anything, everyone else only touches what they own.
///
/// Manager carries no extra rights.
pub fn authorize<R: Owned + ?Sized>(identity: &User, action: Action, resource: &R) -> Decision {
    if action == Action::Create {
        return Decision::Allow;
    }

    match identity.role {
        UserRole::Admin => Decision::Allow,
        UserRole::Manager | UserRole::User => {
            if identity.id == resource.owner_id() {
                Decision::Allow
            } else {
                Decision::Deny
            }
        }
    }
}

/// Whether `identity` may see `resource` in listings
pub fn can_view<R: Owned + ?Sized>(identity: &User, resource: &R) -> bool {
    authorize(identity, Action::Read, resource).is_allowed()
}
