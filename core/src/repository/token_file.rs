use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};

use crate::repository::traits::TokenStore;

const DEFAULT_DIR_NAME: &str = ".taskdeck";
const TOKEN_FILE_NAME: &str = "token";

/// Resolves the data directory: the given one, or `~/.taskdeck`.
pub fn data_dir(base_dir: Option<PathBuf>) -> Result<PathBuf> {
    match base_dir {
        Some(dir) => Ok(dir),
        None => {
            let home_dir = dirs::home_dir()
                .ok_or_else(|| anyhow!("Could not determine home directory"))?;
            Ok(home_dir.join(DEFAULT_DIR_NAME))
        }
    }
}

/// Keeps the bearer token in a single file under the data directory.
#[derive(Clone, Debug)]
pub struct FileTokenStore {
    file_path: PathBuf,
}

impl FileTokenStore {
    pub fn new(base_dir: Option<PathBuf>) -> Result<Self> {
        let dir = data_dir(base_dir)?;
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create data directory {}", dir.display()))?;
        Ok(FileTokenStore { file_path: dir.join(TOKEN_FILE_NAME) })
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.file_path) {
            Ok(contents) => {
                let token = contents.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => {
                Err(e).with_context(|| format!("Failed to read {}", self.file_path.display()))
            }
        }
    }

    fn save(&self, token: &str) -> Result<()> {
        let file = File::create(&self.file_path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(token.as_bytes())?;
        writer.flush()?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.file_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
