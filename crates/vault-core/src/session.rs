//! Passkey session state with injected persistence.
//!
//! A [`Session`] owns its identity store; nothing is kept in globals. The
//! persisted object is a single JSON document:
//!
//! ```json
//! { "id": "<credential id>", "address": "0x…", "publicKey": "0x…" }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use chain_fuel::Bytes32;

use crate::error::VaultError;
use crate::passkey::{sign_with_passkey, PasskeyProvider};
use crate::signature::Signature;

/// Storage key of the persisted identity.
pub const IDENTITY_KEY: &str = "bako_passkey_identity";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredIdentity {
    pub id: String,
    pub address: String,
    pub public_key: String,
}

pub trait IdentityStore {
    fn load(&self) -> Result<Option<StoredIdentity>, VaultError>;
    fn save(&mut self, identity: &StoredIdentity) -> Result<(), VaultError>;
    fn clear(&mut self) -> Result<(), VaultError>;
}

/// Keeps the identity in `<dir>/bako_passkey_identity.json`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(format!("{IDENTITY_KEY}.json"))
    }
}

impl IdentityStore for JsonFileStore {
    fn load(&self) -> Result<Option<StoredIdentity>, VaultError> {
        let path = self.path();
        if !path.exists() {
            return Ok(None);
        }
        let data = fs::read_to_string(&path)
            .map_err(|e| VaultError::Storage(format!("read {}: {e}", path.display())))?;
        Ok(Some(serde_json::from_str(&data)?))
    }

    fn save(&mut self, identity: &StoredIdentity) -> Result<(), VaultError> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| VaultError::Storage(format!("create {}: {e}", self.dir.display())))?;

        let json = serde_json::to_string_pretty(identity)?;
        let tmp = self.dir.join(format!("{IDENTITY_KEY}.tmp"));
        fs::write(&tmp, json)
            .map_err(|e| VaultError::Storage(format!("write {}: {e}", tmp.display())))?;
        fs::rename(&tmp, self.path())
            .map_err(|e| VaultError::Storage(format!("rename {}: {e}", tmp.display())))?;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), VaultError> {
        let path = self.path();
        if path.exists() {
            fs::remove_file(&path)
                .map_err(|e| VaultError::Storage(format!("remove {}: {e}", path.display())))?;
        }
        Ok(())
    }
}

/// In-memory store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    identity: Option<StoredIdentity>,
}

impl IdentityStore for MemoryStore {
    fn load(&self) -> Result<Option<StoredIdentity>, VaultError> {
        Ok(self.identity.clone())
    }

    fn save(&mut self, identity: &StoredIdentity) -> Result<(), VaultError> {
        self.identity = Some(identity.clone());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), VaultError> {
        self.identity = None;
        Ok(())
    }
}

pub struct Session<S: IdentityStore> {
    session_id: String,
    store: S,
    identity: Option<StoredIdentity>,
}

impl<S: IdentityStore> Session<S> {
    /// Open a session, recalling any identity already in `store`.
    pub fn open(store: S) -> Result<Self, VaultError> {
        let identity = store.load()?;
        let session_id = hex::encode(rand::random::<[u8; 16]>());
        debug!(
            "session {session_id} opened ({})",
            if identity.is_some() { "recalled identity" } else { "no identity" }
        );
        Ok(Self {
            session_id,
            store,
            identity,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn identity(&self) -> Option<&StoredIdentity> {
        self.identity.as_ref()
    }

    /// Return the stored identity, or create a passkey credential and
    /// persist it.
    pub async fn recall_or_create<P: PasskeyProvider + ?Sized>(
        &mut self,
        passkey: &P,
        username: &str,
        challenge: &str,
    ) -> Result<StoredIdentity, VaultError> {
        if let Some(identity) = &self.identity {
            return Ok(identity.clone());
        }

        let credential = passkey.create_credential(username, challenge).await?;
        let identity = credential.to_identity();
        self.store.save(&identity)?;
        info!("created passkey identity {}", credential.readable_address());
        self.identity = Some(identity.clone());
        Ok(identity)
    }

    /// Sign a vault hash with the session's passkey.
    pub async fn sign<P: PasskeyProvider + ?Sized>(
        &self,
        passkey: &P,
        hash: &Bytes32,
    ) -> Result<Signature, VaultError> {
        let identity = self
            .identity
            .as_ref()
            .ok_or(VaultError::MissingIdentity)?;
        sign_with_passkey(passkey, identity, hash).await
    }

    /// Forget the identity, in memory and in the store.
    pub fn forget(&mut self) -> Result<(), VaultError> {
        self.store.clear()?;
        self.identity = None;
        Ok(())
    }

    pub fn into_store(self) -> S {
        self.store
    }
}
