//! User id and session token persisted as two small text files

use crate::config::CredentialsConfig;
use crate::error::{CredentialKind, Error, Result};
use std::fmt;
use std::path::Path;

/// The two strings a catalog request needs
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Remote user identifier (`userId` query parameter)
    pub user_id: String,
    /// Session token (sent as a cookie)
    pub session_token: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user_id", &self.user_id)
            .field("session_token", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Build credentials from raw input, trimming surrounding whitespace
    pub fn new(user_id: impl AsRef<str>, session_token: impl AsRef<str>) -> Self {
        Self {
            user_id: user_id.as_ref().trim().to_string(),
            session_token: session_token.as_ref().trim().to_string(),
        }
    }

    /// Read both credential files
    ///
    /// Called before every run so that values saved by a front-end in the
    /// meantime are picked up. A missing, unreadable or blank file is an error.
    pub async fn load(config: &CredentialsConfig) -> Result<Self> {
        let user_id = read_trimmed(&config.user_id_file, CredentialKind::UserId).await?;
        let session_token =
            read_trimmed(&config.session_token_file, CredentialKind::SessionToken).await?;
        Ok(Self {
            user_id,
            session_token,
        })
    }

    /// Persist both values to the configured files
    pub async fn save(&self, config: &CredentialsConfig) -> Result<()> {
        tokio::fs::write(&config.user_id_file, &self.user_id).await?;
        tokio::fs::write(&config.session_token_file, &self.session_token).await?;
        Ok(())
    }
}

async fn read_trimmed(path: &Path, kind: CredentialKind) -> Result<String> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| Error::Credentials {
            kind,
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    let value = raw.trim();
    if value.is_empty() {
        return Err(Error::Credentials {
            kind,
            path: path.to_path_buf(),
            reason: "file is empty".to_string(),
        });
    }
    Ok(value.to_string())
}
