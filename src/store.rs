//! Saved credentials per network
//!
//! A small JSON document kept next to the config:
//! `{"passwords": {ssid: key}, "password_visibility": {ssid: bool}}`.
//! The engine never touches it; callers look up a credential before
//! connecting and record it once the attempt succeeds.

use crate::error::StoreError;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct StoreDocument {
    #[serde(default)]
    passwords: BTreeMap<String, String>,
    #[serde(default)]
    password_visibility: BTreeMap<String, bool>,
}

#[derive(Debug)]
pub struct CredentialStore {
    path: PathBuf,
    doc: StoreDocument,
}

impl CredentialStore {
    /// Load the store; a missing file is an empty store
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let doc = match std::fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoreDocument::default(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, doc })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Saved key for `identity`; an empty saved key means an open network
    pub fn credential(&self, identity: &str) -> Option<SecretString> {
        self.doc
            .passwords
            .get(identity)
            .filter(|key| !key.is_empty())
            .map(|key| SecretString::from(key.clone()))
    }

    pub fn set_credential(&mut self, identity: &str, key: &str) {
        self.doc
            .passwords
            .insert(identity.to_string(), key.to_string());
    }

    pub fn is_visible(&self, identity: &str) -> bool {
        self.doc
            .password_visibility
            .get(identity)
            .copied()
            .unwrap_or(false)
    }

    pub fn set_visible(&mut self, identity: &str, visible: bool) {
        self.doc
            .password_visibility
            .insert(identity.to_string(), visible);
    }

    pub fn save(&self) -> Result<(), StoreError> {
        let text = serde_json::to_string_pretty(&self.doc)?;
        std::fs::write(&self.path, text)?;
        tracing::debug!(path = %self.path.display(), "credential store saved");
        Ok(())
    }
}
