//! User Storage
//! Mission: Hold user accounts and their bcrypt digests in memory

use crate::auth::{
    errors::AuthError,
    models::{NewUser, User, UserRole},
};
use bcrypt::{hash, verify};
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// bcrypt only reads this many bytes of input; longer passwords are refused
/// rather than silently truncated.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Credential store interface.
///
/// Implementations must enforce exact, case-sensitive username uniqueness
/// atomically with the insert.
pub trait UserStore: Send + Sync {
    /// Create a new user, hashing the raw password
    fn create_user(&self, new_user: NewUser) -> Result<User, AuthError>;

    /// Get user by username
    fn get_user_by_username(&self, username: &str) -> Option<User>;

    /// Get user by id
    fn get_user_by_id(&self, id: &Uuid) -> Option<User>;

    /// List all users
    fn list_users(&self) -> Vec<User>;

    /// Number of stored users
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check a username/password pair.
    ///
    /// Unknown usernames and wrong passwords are indistinguishable to the
    /// caller.
    fn verify_credentials(&self, username: &str, password: &str) -> Result<User, AuthError>;
}

#[derive(Default)]
struct Users {
    by_id: HashMap<Uuid, User>,
    by_username: HashMap<String, Uuid>,
}

/// User storage backed by in-process maps
pub struct MemoryUserStore {
    users: RwLock<Users>,
    bcrypt_cost: u32,
    // Verified against when the username is unknown so both paths pay for one bcrypt run
    dummy_hash: String,
}

impl MemoryUserStore {
    /// Create an empty store hashing at `bcrypt_cost`
    pub fn new(bcrypt_cost: u32) -> Result<Self, AuthError> {
        let dummy_hash = hash(Uuid::new_v4().simple().to_string(), bcrypt_cost)?;
        Ok(Self {
            users: RwLock::new(Users::default()),
            bcrypt_cost,
            dummy_hash,
        })
    }
}

impl UserStore for MemoryUserStore {
    fn create_user(&self, new_user: NewUser) -> Result<User, AuthError> {
        if new_user.password.len() > MAX_PASSWORD_BYTES {
            return Err(AuthError::PasswordTooLong);
        }

        // Skip the slow hash for obvious duplicates; the write lock below is authoritative
        if self.users.read().by_username.contains_key(&new_user.username) {
            return Err(AuthError::DuplicateUsername);
        }

        let password_hash = hash(&new_user.password, self.bcrypt_cost)?;

        let user = User {
            id: Uuid::new_v4(),
            username: new_user.username,
            email: new_user.email,
            name: new_user.name,
            role: new_user.role,
            password_hash,
            created_at: Utc::now(),
        };

        let mut users = self.users.write();
        if users.by_username.contains_key(&user.username) {
            return Err(AuthError::DuplicateUsername);
        }
        users.by_username.insert(user.username.clone(), user.id);
        users.by_id.insert(user.id, user.clone());
        drop(users);

        info!("✅ Created user: {} ({})", user.username, user.role.as_str());

        Ok(user)
    }

    fn get_user_by_username(&self, username: &str) -> Option<User> {
        let users = self.users.read();
        users
            .by_username
            .get(username)
            .and_then(|id| users.by_id.get(id))
            .cloned()
    }

    fn get_user_by_id(&self, id: &Uuid) -> Option<User> {
        self.users.read().by_id.get(id).cloned()
    }

    fn list_users(&self) -> Vec<User> {
        self.users.read().by_id.values().cloned().collect()
    }

    fn len(&self) -> usize {
        self.users.read().by_id.len()
    }

    fn verify_credentials(&self, username: &str, password: &str) -> Result<User, AuthError> {
        // No stored digest was made from more than MAX_PASSWORD_BYTES
        if password.len() > MAX_PASSWORD_BYTES {
            let _ = verify(password, &self.dummy_hash)?;
            debug!("Credential check failed for {}: oversized password", username);
            return Err(AuthError::InvalidCredentials);
        }

        match self.get_user_by_username(username) {
            Some(user) => {
                if verify(password, &user.password_hash)? {
                    Ok(user)
                } else {
                    debug!("Credential check failed for {}: wrong password", username);
                    Err(AuthError::InvalidCredentials)
                }
            }
            None => {
                let _ = verify(password, &self.dummy_hash)?;
                debug!("Credential check failed for {}: no such user", username);
                Err(AuthError::InvalidCredentials)
            }
        }
    }
}

/// Demo accounts created at startup when seeding is enabled
const DEMO_USERS: [(&str, &str, &str, &str, UserRole); 3] = [
    (
        "admin",
        "admin@promanage.com",
        "Administrador",
        "admin123",
        UserRole::Admin,
    ),
    (
        "manager",
        "manager@promanage.com",
        "Gerente de Proyectos",
        "manager123",
        UserRole::Manager,
    ),
    (
        "user",
        "user@promanage.com",
        "Usuario Regular",
        "user123",
        UserRole::User,
    ),
];

/// Create the demo accounts that are not already present
pub fn seed_demo_users(store: &dyn UserStore) -> Result<usize, AuthError> {
    let mut created = 0;

    for (username, email, name, password, role) in DEMO_USERS {
        if store.get_user_by_username(username).is_some() {
            continue;
        }

        store.create_user(NewUser {
            username: username.to_string(),
            email: email.to_string(),
            name: name.to_string(),
            password: password.to_string(),
            role,
        })?;
        created += 1;
    }

    if created > 0 {
        info!("🔐 Seeded {} demo users (admin, manager, user)", created);
        warn!("⚠️  DEMO PASSWORDS ARE PUBLIC - DISABLE SEED_DEMO_USERS IN PRODUCTION!");
    }

    Ok(created)
}
