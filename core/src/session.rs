//! Session handle carrying the bearer token.
//!
//! One `Session` is created at startup and cloned into whatever needs it:
//! the HTTP client reads the token at request time, the UI logs in and out.

use std::fmt;
use std::sync::{Arc, RwLock};

use anyhow::{bail, Result};
use tracing::info;

use crate::repository::TokenStore;

#[derive(Clone, Default)]
pub struct Session {
    inner: Arc<SessionInner>,
}

#[derive(Default)]
struct SessionInner {
    token: RwLock<Option<String>>,
    store: Option<Box<dyn TokenStore + Send + Sync>>,
}

impl Session {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Session backed by a token store, seeded with whatever token it holds.
    pub fn persistent(store: impl TokenStore + Send + Sync + 'static) -> Result<Self> {
        let token = store.load()?;
        Ok(Self {
            inner: Arc::new(SessionInner {
                token: RwLock::new(token),
                store: Some(Box::new(store)),
            }),
        })
    }

    pub fn login(&self, token: impl Into<String>) -> Result<()> {
        let token = token.into().trim().to_string();
        if token.is_empty() {
            bail!("Token must not be empty");
        }
        if let Some(store) = &self.inner.store {
            store.save(&token)?;
        }
        *self.inner.token.write().unwrap_or_else(|e| e.into_inner()) = Some(token);
        info!("session token set");
        Ok(())
    }

    /// Drops the token locally. The server is not told.
    pub fn logout(&self) -> Result<()> {
        self.inner.token.write().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(store) = &self.inner.store {
            store.clear()?;
        }
        info!("session token cleared");
        Ok(())
    }

    pub fn token(&self) -> Option<String> {
        self.inner.token.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.token.read().unwrap_or_else(|e| e.into_inner()).is_some()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("authenticated", &self.is_authenticated())
            .field("persistent", &self.inner.store.is_some())
            .finish()
    }
}
