//! Account service boundary: sign-in, sign-out, account creation, session
//! validation.
//!
//! [`LocalAccountService`] keeps accounts and sessions in memory. Passwords
//! are stored as bcrypt hashes (salt and cost inside the hash string);
//! session tokens are UUID v4 strings with a fixed time-to-live. Account uids
//! are derived from the normalized email, so a re-created account keeps its
//! uid across restarts.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

pub const DEFAULT_SESSION_TTL_HOURS: i64 = 8;
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub uid: String,
    pub email: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub uid: String,
    pub email: String,
    pub signed_in_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthError {
    InvalidCredential,
    UserDisabled,
    UserNotFound,
    WrongPassword,
    EmailInUse,
    WeakPassword,
    SessionExpired,
    Unknown(String),
}

impl AuthError {
    /// Stable code, mirroring the hosted account service's error codes.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredential => "auth/invalid-credential",
            AuthError::UserDisabled => "auth/user-disabled",
            AuthError::UserNotFound => "auth/user-not-found",
            AuthError::WrongPassword => "auth/wrong-password",
            AuthError::EmailInUse => "auth/email-already-in-use",
            AuthError::WeakPassword => "auth/weak-password",
            AuthError::SessionExpired => "auth/session-expired",
            AuthError::Unknown(_) => "auth/unknown",
        }
    }

    /// Message shown to staff on the login screen.
    pub fn user_message(&self) -> &'static str {
        match self {
            AuthError::InvalidCredential => "Adresse e-mail ou mot de passe invalide.",
            AuthError::UserDisabled => "Compte désactivé.",
            AuthError::UserNotFound => "Aucun utilisateur trouvé avec cet e-mail.",
            AuthError::WrongPassword => "Mot de passe incorrect.",
            AuthError::EmailInUse => "Cette adresse e-mail est déjà utilisée.",
            AuthError::WeakPassword => "Le mot de passe doit contenir au moins 6 caractères.",
            AuthError::SessionExpired => "Session expirée, veuillez vous reconnecter.",
            AuthError::Unknown(_) => "Erreur inconnue, réessayez.",
        }
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::Unknown(detail) => write!(f, "{}: {detail}", self.code()),
            other => write!(f, "{}", other.code()),
        }
    }
}

impl std::error::Error for AuthError {}

// ---------------------------------------------------------------------------
// Service trait
// ---------------------------------------------------------------------------

#[async_trait::async_trait]
pub trait AccountService: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    /// Revoke a session token. Unknown tokens are ignored.
    async fn sign_out(&self, token: &str) -> Result<(), AuthError>;

    async fn create_account(&self, email: &str, password: &str) -> Result<Identity, AuthError>;

    /// Resolve a bearer token to its live session.
    async fn validate(&self, token: &str) -> Result<Session, AuthError>;

    async fn set_disabled(&self, uid: &str, disabled: bool) -> Result<(), AuthError>;
}

// ---------------------------------------------------------------------------
// LocalAccountService
// ---------------------------------------------------------------------------

struct Account {
    uid: String,
    email: String,
    password_hash: String,
    disabled: bool,
}

#[derive(Default)]
struct LocalInner {
    /// Keyed by normalized email.
    accounts: BTreeMap<String, Account>,
    sessions: HashMap<String, Session>,
}

pub struct LocalAccountService {
    inner: Mutex<LocalInner>,
    session_ttl: Duration,
    hash_cost: u32,
}

impl Default for LocalAccountService {
    fn default() -> Self {
        Self::new(Duration::hours(DEFAULT_SESSION_TTL_HOURS))
    }
}

fn email_key(email: &str) -> String {
    email.trim().to_lowercase()
}

fn uid_for(key: &str) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, format!("mailto:{key}").as_bytes())
        .simple()
        .to_string()
}

fn hash_error(e: bcrypt::BcryptError) -> AuthError {
    warn!(error = %e, "password hashing failed");
    AuthError::Unknown(e.to_string())
}

impl LocalAccountService {
    pub fn new(session_ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(LocalInner::default()),
            session_ttl,
            hash_cost: bcrypt::DEFAULT_COST,
        }
    }

    /// bcrypt work factor for new hashes (4..=31).
    pub fn with_hash_cost(mut self, cost: u32) -> Self {
        self.hash_cost = cost;
        self
    }

    fn lock(&self) -> MutexGuard<'_, LocalInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn account_count(&self) -> usize {
        self.lock().accounts.len()
    }

    /// Sessions currently held, expired ones included until the next sign-in.
    pub fn session_count(&self) -> usize {
        self.lock().sessions.len()
    }
}

#[async_trait::async_trait]
impl AccountService for LocalAccountService {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let key = email_key(email);
        if key.is_empty() || password.is_empty() {
            return Err(AuthError::InvalidCredential);
        }

        let (uid, stored_email, password_hash) = {
            let inner = self.lock();
            let account = inner.accounts.get(&key).ok_or(AuthError::UserNotFound)?;
            if account.disabled {
                return Err(AuthError::UserDisabled);
            }
            (
                account.uid.clone(),
                account.email.clone(),
                account.password_hash.clone(),
            )
        };
        // Verified outside the lock: bcrypt is slow on purpose.
        if !bcrypt::verify(password, &password_hash).map_err(hash_error)? {
            return Err(AuthError::WrongPassword);
        }

        let now = Utc::now();
        let session = Session {
            token: Uuid::new_v4().to_string(),
            uid,
            email: stored_email,
            signed_in_at: now,
            expires_at: now + self.session_ttl,
        };
        let mut inner = self.lock();
        let before = inner.sessions.len();
        inner.sessions.retain(|_, s| s.expires_at >= now);
        let pruned = before - inner.sessions.len();
        inner
            .sessions
            .insert(session.token.clone(), session.clone());
        drop(inner);

        if pruned > 0 {
            info!(pruned, "expired sessions pruned");
        }

        info!(uid = %session.uid, "sign-in");
        Ok(session)
    }

    async fn sign_out(&self, token: &str) -> Result<(), AuthError> {
        if let Some(s) = self.lock().sessions.remove(token) {
            info!(uid = %s.uid, "sign-out");
        }
        Ok(())
    }

    async fn create_account(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let key = email_key(email);
        if key.is_empty() || !key.contains('@') {
            return Err(AuthError::InvalidCredential);
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword);
        }

        if self.lock().accounts.contains_key(&key) {
            return Err(AuthError::EmailInUse);
        }
        let password_hash = bcrypt::hash(password, self.hash_cost).map_err(hash_error)?;

        let mut inner = self.lock();
        // Re-checked: another caller may have won while hashing.
        if inner.accounts.contains_key(&key) {
            return Err(AuthError::EmailInUse);
        }
        let account = Account {
            uid: uid_for(&key),
            email: email.trim().to_string(),
            password_hash,
            disabled: false,
        };
        let identity = Identity {
            uid: account.uid.clone(),
            email: account.email.clone(),
        };
        inner.accounts.insert(key, account);
        drop(inner);

        info!(uid = %identity.uid, "account created");
        Ok(identity)
    }

    async fn validate(&self, token: &str) -> Result<Session, AuthError> {
        let mut inner = self.lock();
        let session = inner
            .sessions
            .get(token)
            .cloned()
            .ok_or(AuthError::InvalidCredential)?;
        if Utc::now() > session.expires_at {
            inner.sessions.remove(token);
            return Err(AuthError::SessionExpired);
        }
        Ok(session)
    }

    async fn set_disabled(&self, uid: &str, disabled: bool) -> Result<(), AuthError> {
        let mut inner = self.lock();
        let account = inner
            .accounts
            .values_mut()
            .find(|a| a.uid == uid)
            .ok_or(AuthError::UserNotFound)?;
        account.disabled = disabled;
        if disabled {
            inner.sessions.retain(|_, s| s.uid != uid);
        }
        Ok(())
    }
}
