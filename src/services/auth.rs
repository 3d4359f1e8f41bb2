//! Authentication provider
//!
//! The service only needs to know who is signed in; the provider owns
//! accounts and issues opaque bearer tokens.

use std::{collections::HashMap, sync::Mutex};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    error::{Error, Result},
    state::UserId,
};

/// Shortest password accepted at registration
pub const MIN_PASSWORD_LEN: usize = 6;

/// A signed-in identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub user_id: UserId,
    pub token: String,
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Create an account and sign it in
    async fn register(&self, email: &str, password: &str) -> Result<AuthSession>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession>;

    /// Resolve a bearer token to its user, if the token is still signed in
    async fn current_user(&self, token: &str) -> Option<UserId>;

    async fn sign_out(&self, token: &str);
}

#[derive(Debug)]
struct Account {
    user_id: UserId,
    salt: String,
    password_hash: String,
}

/// Process-local auth provider
#[derive(Debug, Default)]
pub struct InMemoryAuth {
    accounts: Mutex<HashMap<String, Account>>,
    tokens: Mutex<HashMap<String, UserId>>,
}

impl InMemoryAuth {
    pub fn new() -> Self {
        Self::default()
    }

    fn issue_token(&self, user_id: &UserId) -> Result<AuthSession> {
        let token = Uuid::new_v4().simple().to_string();
        self.tokens
            .lock()
            .map_err(|e| Error::poisoned("auth tokens", e))?
            .insert(token.clone(), user_id.clone());

        Ok(AuthSession {
            user_id: user_id.clone(),
            token,
        })
    }
}

fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(Error::InvalidEmail(email)),
    }
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

#[async_trait]
impl AuthProvider for InMemoryAuth {
    async fn register(&self, email: &str, password: &str) -> Result<AuthSession> {
        let email = normalize_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(Error::WeakPassword(MIN_PASSWORD_LEN));
        }

        let user_id = {
            let mut accounts = self
                .accounts
                .lock()
                .map_err(|e| Error::poisoned("accounts", e))?;
            if accounts.contains_key(&email) {
                return Err(Error::EmailInUse(email));
            }

            let user_id = Uuid::new_v4().to_string();
            let salt = Uuid::new_v4().simple().to_string();
            let password_hash = hash_password(&salt, password);
            accounts.insert(
                email.clone(),
                Account {
                    user_id: user_id.clone(),
                    salt,
                    password_hash,
                },
            );
            user_id
        };

        info!("Registered account {} for {}", user_id, email);
        self.issue_token(&user_id)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession> {
        let email = normalize_email(email).map_err(|_| Error::InvalidCredentials)?;

        let user_id = {
            let accounts = self
                .accounts
                .lock()
                .map_err(|e| Error::poisoned("accounts", e))?;
            let account = accounts.get(&email).ok_or(Error::InvalidCredentials)?;
            if hash_password(&account.salt, password) != account.password_hash {
                return Err(Error::InvalidCredentials);
            }
            account.user_id.clone()
        };

        info!("User {} signed in", user_id);
        self.issue_token(&user_id)
    }

    async fn current_user(&self, token: &str) -> Option<UserId> {
        self.tokens.lock().ok()?.get(token).cloned()
    }

    async fn sign_out(&self, token: &str) {
        if let Ok(mut tokens) = self.tokens.lock() {
            if let Some(user_id) = tokens.remove(token) {
                debug!("User {} signed out", user_id);
            }
        }
    }
}
