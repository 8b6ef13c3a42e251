//! Process-local user accounts for the signup/login pages.
//!
//! Credentials are held only in memory and vanish on restart. There is no
//! hashing or session token; this mirrors a demo login, not real security.

use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignupOutcome {
    Created,
    AlreadyExists,
}

#[derive(Debug, Default)]
pub struct AccountRegistry {
    users: RwLock<HashMap<String, String>>,
    logged_in: RwLock<HashSet<String>>,
}

impl AccountRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn signup(&self, username: &str, password: &str) -> SignupOutcome {
        let mut users = self.users.write().await;
        if users.contains_key(username) {
            return SignupOutcome::AlreadyExists;
        }
        users.insert(username.to_string(), password.to_string());
        SignupOutcome::Created
    }

    /// Mark the user logged in if the password matches
    pub async fn login(&self, username: &str, password: &str) -> bool {
        let valid = self
            .users
            .read()
            .await
            .get(username)
            .is_some_and(|stored| stored == password);
        if valid {
            self.logged_in.write().await.insert(username.to_string());
        }
        valid
    }

    /// End the user's login; false when they were not logged in
    pub async fn logout(&self, username: &str) -> bool {
        self.logged_in.write().await.remove(username)
    }
}
