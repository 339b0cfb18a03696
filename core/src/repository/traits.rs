use anyhow::Result;

/// Persistence for the session token. Nothing else is stored client-side.
pub trait TokenStore {
    fn load(&self) -> Result<Option<String>>;
    fn save(&self, token: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;
}
