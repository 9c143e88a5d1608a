use crate::ports::storage::{KeyValueStore, StorageError};
use crate::ports::time::TimeProvider;

use base64::{URL_SAFE_NO_PAD, encode_config};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use std::sync::{Arc, Mutex};
use std::time::Duration;

pub(crate) const TOKEN_KEY: &str = "authToken";
pub(crate) const USER_KEY: &str = "user";

const LOGIN_ROUND_TRIP: Duration = Duration::from_millis(1000);
const MIN_PASSWORD_CHARS: usize = 6;
const LOCAL_USER_ID: &str = "1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unknown,
    Anonymous,
    Authenticated { user: User, token: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub loading: bool,
}

#[derive(Debug)]
pub enum SessionError {
    InvalidCredentials,
    Storage(StorageError),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::InvalidCredentials => f.write_str("invalid credentials"),
            SessionError::Storage(err) => write!(f, "session storage failed: {err}"),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<StorageError> for SessionError {
    fn from(err: StorageError) -> Self {
        SessionError::Storage(err)
    }
}

struct SessionInner {
    state: SessionState,
    loading: bool,
}

/// Mock sign-in with the shape of a remote round trip: a fixed delay stands
/// in for the network, the token is minted locally, and the session is
/// persisted so it survives restarts.
#[derive(Clone)]
pub struct SessionStore<T, S> {
    time: T,
    storage: S,
    inner: Arc<Mutex<SessionInner>>,
}

impl<T, S> SessionStore<T, S>
where
    T: TimeProvider,
    S: KeyValueStore,
{
    pub fn new(time: T, storage: S) -> Self {
        Self {
            time,
            storage,
            inner: Arc::new(Mutex::new(SessionInner {
                state: SessionState::Unknown,
                loading: true,
            })),
        }
    }

    /// Adopts a previously persisted session, if both keys are present and
    /// the user record still parses. A malformed record purges both keys.
    pub async fn restore(&self) {
        let token = self.read_key(TOKEN_KEY);
        let user_json = self.read_key(USER_KEY);

        let state = match (token, user_json) {
            (Some(token), Some(raw)) => match serde_json::from_str::<User>(&raw) {
                Ok(user) => SessionState::Authenticated { user, token },
                Err(err) => {
                    tracing::warn!("persisted user record is malformed, purging session: {err}");
                    self.purge_persisted();
                    SessionState::Anonymous
                }
            },
            _ => SessionState::Anonymous,
        };

        let mut inner = self.inner.lock().expect("session lock");
        inner.state = state;
        inner.loading = false;
    }

    pub async fn login(&self, credentials: Credentials) -> Result<User, SessionError> {
        self.set_loading(true);
        self.time.sleep(LOGIN_ROUND_TRIP).await;

        if !credentials_are_valid(&credentials) {
            self.set_loading(false);
            return Err(SessionError::InvalidCredentials);
        }

        let user = User {
            id: LOCAL_USER_ID.to_string(),
            email: credentials.email.clone(),
            name: display_name(&credentials.email),
        };
        let token = mint_token_with_rng(self.time.now(), &mut OsRng);

        if let Err(err) = self.persist(&user, &token) {
            // Never leave half a session behind.
            self.purge_persisted();
            self.set_loading(false);
            return Err(err.into());
        }

        tracing::info!("signed in as {}", user.email);
        let mut inner = self.inner.lock().expect("session lock");
        inner.state = SessionState::Authenticated {
            user: user.clone(),
            token,
        };
        inner.loading = false;
        Ok(user)
    }

    pub fn logout(&self) {
        self.purge_persisted();
        let mut inner = self.inner.lock().expect("session lock");
        inner.state = SessionState::Anonymous;
        inner.loading = false;
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let inner = self.inner.lock().expect("session lock");
        SessionSnapshot {
            state: inner.state.clone(),
            loading: inner.loading,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(
            self.inner.lock().expect("session lock").state,
            SessionState::Authenticated { .. }
        )
    }

    pub fn is_loading(&self) -> bool {
        self.inner.lock().expect("session lock").loading
    }

    pub fn current_user(&self) -> Option<User> {
        match &self.inner.lock().expect("session lock").state {
            SessionState::Authenticated { user, .. } => Some(user.clone()),
            _ => None,
        }
    }

    pub fn token(&self) -> Option<String> {
        match &self.inner.lock().expect("session lock").state {
            SessionState::Authenticated { token, .. } => Some(token.clone()),
            _ => None,
        }
    }

    fn persist(&self, user: &User, token: &str) -> Result<(), StorageError> {
        let record = serde_json::to_string(user).expect("user record serializes");
        self.storage.set(TOKEN_KEY, token)?;
        self.storage.set(USER_KEY, &record)?;
        Ok(())
    }

    fn purge_persisted(&self) {
        for key in [TOKEN_KEY, USER_KEY] {
            if let Err(err) = self.storage.remove(key) {
                tracing::warn!("failed to purge persisted {key}: {err}");
            }
        }
    }

    fn read_key(&self, key: &str) -> Option<String> {
        match self.storage.get(key) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("failed to read persisted {key}: {err}");
                None
            }
        }
    }

    fn set_loading(&self, loading: bool) {
        self.inner.lock().expect("session lock").loading = loading;
    }
}

fn credentials_are_valid(credentials: &Credentials) -> bool {
    !credentials.email.is_empty() && credentials.password.chars().count() >= MIN_PASSWORD_CHARS
}

fn display_name(email: &str) -> String {
    match email.split_once('@') {
        Some((local, _)) => local.to_string(),
        None => email.to_string(),
    }
}

fn mint_token_with_rng<R: RngCore + CryptoRng>(now: OffsetDateTime, rng: &mut R) -> String {
    let millis = now.unix_timestamp_nanos() / 1_000_000;
    let mut nonce = [0u8; 8];
    rng.fill_bytes(&mut nonce);
    format!("session-{}-{}", millis, encode_config(nonce, URL_SAFE_NO_PAD))
}
