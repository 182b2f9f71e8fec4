use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::gateway::{GatewayError, Query, RestGateway};
use crate::models::UserSession;

pub const MIN_PASSWORD_LEN: usize = 6;

const ACCOUNTS: &str = "auth_users";
const IDENTITIES: &str = "users";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("username already exists")]
    UsernameTaken,
    #[error("passwords do not match")]
    PasswordMismatch,
    #[error("password must be at least 6 characters")]
    PasswordTooShort,
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("login failed: {0}")]
    Login(GatewayError),
    #[error("signup failed: {0}")]
    Signup(GatewayError),
}

impl AuthError {
    /// Key into the UI translation table for the inline form message.
    pub fn message_key(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "invalidCredentials",
            AuthError::UsernameTaken => "usernameExists",
            AuthError::PasswordMismatch => "passwordsNotMatch",
            AuthError::PasswordTooShort => "passwordTooShort",
            AuthError::Login(_) => "loginFailed",
            AuthError::MissingField(_) | AuthError::Signup(_) => "signupFailed",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub username: String,
    pub name: String,
    pub surname: String,
    pub password: String,
    pub confirm_password: String,
}

impl SignupForm {
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.username.trim().is_empty() {
            return Err(AuthError::MissingField("username"));
        }
        if self.password != self.confirm_password {
            return Err(AuthError::PasswordMismatch);
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::PasswordTooShort);
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct AccountRow {
    id: i64,
    username: String,
    name: String,
    surname: String,
    password_hash: String,
}

#[derive(Debug, Serialize)]
struct NewAccount<'a> {
    username: &'a str,
    name: &'a str,
    surname: &'a str,
    password_hash: String,
}

#[derive(Debug, Deserialize)]
struct IdentityRow {
    id: i64,
}

#[derive(Debug, Serialize)]
struct NewIdentity<'a> {
    telegram_id: i64,
    username: &'a str,
    first_name: &'a str,
}

pub fn hash_password(password: &str) -> String {
    format!("{:x}", Sha256::digest(password.as_bytes()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordMatch {
    Current,
    /// Row written by the web client, which stored `base64(password)`.
    Legacy,
    Mismatch,
}

pub fn verify_password(password: &str, stored: &str) -> PasswordMatch {
    if stored == hash_password(password) {
        PasswordMatch::Current
    } else if stored == STANDARD.encode(password.as_bytes()) {
        PasswordMatch::Legacy
    } else {
        PasswordMatch::Mismatch
    }
}

/// Web accounts get a negative bridge key so they never collide with
/// identities created by other clients.
pub fn bridge_key(account_id: i64) -> i64 {
    -account_id.abs()
}

#[derive(Clone)]
pub struct Authenticator {
    gateway: RestGateway,
}

impl Authenticator {
    pub fn new(gateway: RestGateway) -> Self {
        Self { gateway }
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<UserSession, AuthError> {
        let username = username.trim();
        let account = self
            .find_account(username)
            .await
            .map_err(AuthError::Login)?
            .ok_or(AuthError::InvalidCredentials)?;
        match verify_password(password, &account.password_hash) {
            PasswordMatch::Current => {}
            PasswordMatch::Legacy => self.upgrade_hash(&account, password).await,
            PasswordMatch::Mismatch => {
                tracing::info!(username, "password verification failed");
                return Err(AuthError::InvalidCredentials);
            }
        }
        let id = self
            .bridge_identity(&account)
            .await
            .map_err(AuthError::Login)?;
        Ok(session_for(id, account))
    }

    pub async fn signup(&self, form: &SignupForm) -> Result<UserSession, AuthError> {
        form.validate()?;
        let username = form.username.trim();
        if self.user_exists(username).await? {
            return Err(AuthError::UsernameTaken);
        }

        let new_account = NewAccount {
            username,
            name: form.name.trim(),
            surname: form.surname.trim(),
            password_hash: hash_password(&form.password),
        };
        let created: Vec<AccountRow> = self
            .gateway
            .insert(ACCOUNTS, &new_account)
            .await
            .map_err(AuthError::Signup)?;
        let account = created.into_iter().next().ok_or_else(|| {
            AuthError::Signup(GatewayError::Parse("no account row returned".into()))
        })?;

        let id = self
            .bridge_identity(&account)
            .await
            .map_err(AuthError::Signup)?;
        tracing::info!(username, id, "account created");
        Ok(session_for(id, account))
    }

    pub async fn user_exists(&self, username: &str) -> Result<bool, AuthError> {
        let rows: Vec<serde_json::Value> = self
            .gateway
            .select(
                ACCOUNTS,
                &Query::new().select("username").eq("username", username).limit(1),
            )
            .await
            .map_err(AuthError::Signup)?;
        Ok(!rows.is_empty())
    }

    async fn find_account(&self, username: &str) -> Result<Option<AccountRow>, GatewayError> {
        let rows: Vec<AccountRow> = self
            .gateway
            .select(
                ACCOUNTS,
                &Query::new()
                    .select("id,username,name,surname,password_hash")
                    .eq("username", username)
                    .limit(1),
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    /// Rewrites a legacy hash after a successful login. Failure only logs;
    /// the next login retries.
    async fn upgrade_hash(&self, account: &AccountRow, password: &str) {
        let body = serde_json::json!({ "password_hash": hash_password(password) });
        let query = Query::new().eq("id", account.id);
        let result: Result<Vec<serde_json::Value>, _> =
            self.gateway.update(ACCOUNTS, &body, &query).await;
        match result {
            Ok(_) => tracing::info!(username = %account.username, "password hash upgraded"),
            Err(err) => {
                tracing::warn!(%err, username = %account.username, "password hash upgrade failed")
            }
        }
    }

    /// Returns the `users` id for an account, creating the bridge row if needed.
    async fn bridge_identity(&self, account: &AccountRow) -> Result<i64, GatewayError> {
        let key = bridge_key(account.id);
        let existing: Vec<IdentityRow> = self
            .gateway
            .select(
                IDENTITIES,
                &Query::new().select("id").eq("telegram_id", key).limit(1),
            )
            .await?;
        if let Some(row) = existing.first() {
            return Ok(row.id);
        }

        let identity = NewIdentity {
            telegram_id: key,
            username: &account.username,
            first_name: &account.name,
        };
        let created: Vec<IdentityRow> = self.gateway.insert(IDENTITIES, &identity).await?;
        created
            .first()
            .map(|row| row.id)
            .ok_or_else(|| GatewayError::Parse("no identity row returned".into()))
    }
}

fn session_for(id: i64, account: AccountRow) -> UserSession {
    UserSession {
        id,
        username: account.username,
        name: account.name,
        surname: account.surname,
    }
}
