//! User registration and login against salted password hashes.
//!
//! The registry is meant to live behind an authenticated service boundary.
//! Plain passwords only pass through `register` and `authenticate`; what is
//! kept is a per-account random salt and the SHA-256 digest of salt and
//! password.

use std::collections::HashMap;

use chrono::NaiveDate;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{TrackerError, TrackerResult};

pub const MIN_PASSWORD_LEN: usize = 6;

const SALT_LEN: usize = 16;

/// Public part of an account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub birth_date: Option<NaiveDate>,
    pub email: String,
    pub username: String,
    #[serde(default)]
    pub pre_existing_conditions: String,
}

/// Data submitted by the sign-up form. Not `Debug`, it carries the password.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationForm {
    pub name: String,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    pub email: String,
    pub email_confirmation: String,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub pre_existing_conditions: String,
}

impl RegistrationForm {
    /// Every problem with the form, in the order the form shows them.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.email != self.email_confirmation {
            problems.push("Os e-mails não coincidem.".to_string());
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            problems.push(format!(
                "A senha deve ter pelo menos {MIN_PASSWORD_LEN} caracteres."
            ));
        }
        if self.username.trim().is_empty() {
            problems.push("Informe um nome de usuário.".to_string());
        }
        problems
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct StoredCredential {
    salt: String,
    hash: String,
}

impl StoredCredential {
    fn derive(password: &str) -> Self {
        let mut salt = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);
        Self {
            salt: hex::encode(salt),
            hash: hash_with_salt(&salt, password),
        }
    }

    fn verify(&self, password: &str) -> bool {
        let Ok(salt) = hex::decode(&self.salt) else {
            return false;
        };
        constant_time_eq(
            hash_with_salt(&salt, password).as_bytes(),
            self.hash.as_bytes(),
        )
    }
}

fn hash_with_salt(salt: &[u8], password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

fn constant_time_eq(left: &[u8], right: &[u8]) -> bool {
    left.len() == right.len()
        && left
            .iter()
            .zip(right)
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Account {
    profile: UserProfile,
    credential: StoredCredential,
}

/// Accounts keyed by username. Serializes to profiles plus salt and hash.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountRegistry {
    accounts: HashMap<String, Account>,
}

impl AccountRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a registry saved by [`AccountRegistry::to_json_string`]. Blank input is empty.
    pub fn from_json_str(raw: &str) -> TrackerResult<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(raw).map_err(|err| TrackerError::Parse(err.to_string()))
    }

    pub fn to_json_string(&self) -> TrackerResult<String> {
        serde_json::to_string_pretty(self).map_err(|err| TrackerError::Parse(err.to_string()))
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn register(&mut self, form: RegistrationForm) -> TrackerResult<UserProfile> {
        let problems = form.problems();
        if !problems.is_empty() {
            return Err(TrackerError::Validation(problems.join(" ")));
        }

        let username = form.username.trim().to_string();
        if self.accounts.contains_key(&username) {
            return Err(TrackerError::Conflict(format!("username {username}")));
        }

        let profile = UserProfile {
            id: Uuid::new_v4().to_string(),
            name: form.name.trim().to_string(),
            birth_date: form.birth_date,
            email: form.email.trim().to_string(),
            username: username.clone(),
            pre_existing_conditions: form.pre_existing_conditions,
        };
        let credential = StoredCredential::derive(&form.password);

        info!(user_id = %profile.id, "account registered");
        self.accounts.insert(
            username,
            Account {
                profile: profile.clone(),
                credential,
            },
        );
        Ok(profile)
    }

    /// Same error for an unknown user and a wrong password.
    pub fn authenticate(&self, username: &str, password: &str) -> TrackerResult<UserProfile> {
        match self.accounts.get(username.trim()) {
            Some(account) if account.credential.verify(password) => Ok(account.profile.clone()),
            _ => {
                warn!("rejected login attempt");
                Err(TrackerError::Authentication)
            }
        }
    }

    pub fn profile(&self, user_id: &str) -> Option<&UserProfile> {
        self.accounts
            .values()
            .map(|account| &account.profile)
            .find(|profile| profile.id == user_id)
    }
}
