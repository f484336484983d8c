//! WebAuthn/passkey signer boundary.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use chain_fuel::{to_passkey_readable, Address, Bytes32};

use crate::error::{ProviderError, VaultError};
use crate::session::StoredIdentity;
use crate::signature::Signature;

/// A passkey credential as created by the authenticator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub id: String,
    pub public_key_hex: String,
    pub address: Address,
}

impl Credential {
    /// Address under the `passkey` namespace.
    pub fn readable_address(&self) -> String {
        to_passkey_readable(&self.address)
    }

    pub fn to_identity(&self) -> StoredIdentity {
        StoredIdentity {
            id: self.id.clone(),
            address: self.address.to_hex(),
            public_key: self.public_key_hex.clone(),
        }
    }
}

/// Output of a WebAuthn `get` ceremony over a vault signing hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebAuthnAssertion {
    /// 64-byte `r || s` secp256r1 signature, hex.
    pub signature: String,
    pub authenticator_data: Vec<u8>,
    pub client_data_json: Vec<u8>,
}

impl WebAuthnAssertion {
    pub fn into_signature(self) -> Signature {
        Signature::WebAuthn {
            signature: self.signature,
            authenticator_data: self.authenticator_data,
            client_data_json: self.client_data_json,
        }
    }
}

#[async_trait]
pub trait PasskeyProvider: Send + Sync {
    async fn create_credential(
        &self,
        username: &str,
        challenge: &str,
    ) -> Result<Credential, ProviderError>;

    async fn sign_challenge(
        &self,
        credential_id: &str,
        challenge_hex: &str,
        public_key_hex: &str,
    ) -> Result<WebAuthnAssertion, ProviderError>;
}

/// Ask the passkey behind `identity` to sign a vault hash.
pub async fn sign_with_passkey<P: PasskeyProvider + ?Sized>(
    provider: &P,
    identity: &StoredIdentity,
    hash: &Bytes32,
) -> Result<Signature, VaultError> {
    let assertion = provider
        .sign_challenge(&identity.id, &hash.to_hex(), &identity.public_key)
        .await?;
    Ok(assertion.into_signature())
}
