//! Account helpers: key generation, hex import and keystore export.

use std::{fmt, path::Path};

use alloy::{
    primitives::{Address, Bytes, B256},
    signers::local::PrivateKeySigner,
};
use serde::{Deserialize, Serialize};

use crate::{error::TxError, signer::parse_private_key};

/// A secp256k1 key together with its derived public key and address.
#[derive(Clone)]
pub struct KeyPair {
    signer: PrivateKeySigner,
}

impl KeyPair {
    pub fn signer(&self) -> &PrivateKeySigner {
        &self.signer
    }

    pub fn into_signer(self) -> PrivateKeySigner {
        self.signer
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn private_key(&self) -> B256 {
        self.signer.to_bytes()
    }

    /// Uncompressed SEC1 public key (65 bytes, `0x04` prefix).
    pub fn public_key(&self) -> Bytes {
        let point = self.signer.credential().verifying_key().to_encoded_point(false);
        Bytes::copy_from_slice(point.as_bytes())
    }

    pub fn to_account(&self) -> Account {
        Account {
            address: self.address(),
            private_key: self.private_key(),
        }
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

/// Fresh random key.
pub fn generate_account() -> KeyPair {
    let signer = PrivateKeySigner::random();
    tracing::debug!(address = %signer.address(), "generated account");
    KeyPair { signer }
}

/// Load a key from its hex encoding.
pub fn account_from_hex(key: &str) -> Result<KeyPair, TxError> {
    Ok(KeyPair {
        signer: parse_private_key(key)?,
    })
}

/// Plain address and private key, as exported from a keystore.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub address: Address,
    pub private_key: B256,
}

impl Account {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// Decrypt the keystore file at `path`.
pub fn export_keystore(path: impl AsRef<Path>, password: &str) -> Result<Account, TxError> {
    let path = path.as_ref();
    let signer = PrivateKeySigner::decrypt_keystore(path, password).map_err(|e| {
        tracing::warn!(path = %path.display(), error = %e, "failed to decrypt keystore");
        TxError::Keystore(e)
    })?;
    Ok(KeyPair { signer }.to_account())
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{address, b256};

    use super::*;

    #[test]
    fn test_account_from_hex() {
        let pair = account_from_hex(
            "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d",
        )
        .unwrap();
        assert_eq!(
            pair.address(),
            address!("0x70997970C51812dc3A010C7d01b50e0d17dc79C8")
        );
        assert_eq!(
            pair.private_key(),
            b256!("0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d")
        );

        let public = pair.public_key();
        assert_eq!(public.len(), 65);
        assert_eq!(public[0], 0x04);
        // address is the tail of keccak(x || y)
        let hash = alloy::primitives::keccak256(&public[1..]);
        assert_eq!(&hash[12..], pair.address().as_slice());

        assert!(matches!(account_from_hex("0x00"), Err(TxError::Key(_))));
    }

    #[test]
    fn test_generated_accounts_are_distinct() {
        let a = generate_account();
        let b = generate_account();
        assert_ne!(a.address(), b.address());

        let reloaded = account_from_hex(&a.private_key().to_string()).unwrap();
        assert_eq!(reloaded.address(), a.address());
    }

    #[test]
    fn test_debug_hides_private_key() {
        let pair = generate_account();
        let key = pair.private_key().to_string();
        assert!(!format!("{pair:?}").contains(&key[2..]));
        assert!(!format!("{:?}", pair.to_account()).contains(&key[2..]));
    }

    #[test]
    fn test_account_json() {
        let account = generate_account().to_account();
        let json = account.to_json().unwrap();
        assert!(json.contains("\"privateKey\""));
        let back: Account = serde_json::from_str(&json).unwrap();
        assert_eq!(back, account);
    }

    #[test]
    fn test_export_keystore() {
        let dir = tempfile::tempdir().unwrap();
        let key = b256!("0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d");

        let (signer, _) = PrivateKeySigner::encrypt_keystore(
            dir.path(),
            &mut rand::thread_rng(),
            key,
            "hunter2",
            Some("bob.json"),
        )
        .unwrap();

        let account = export_keystore(dir.path().join("bob.json"), "hunter2").unwrap();
        assert_eq!(account.address, signer.address());
        assert_eq!(
            account.address,
            address!("0x70997970C51812dc3A010C7d01b50e0d17dc79C8")
        );
        assert_eq!(account.private_key, key);

        assert!(matches!(
            export_keystore(dir.path().join("bob.json"), "hunter3"),
            Err(TxError::Keystore(_))
        ));
    }

    #[test]
    fn test_fresh_keystore_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let (signer, uuid) =
            PrivateKeySigner::new_keystore(dir.path(), &mut rand::thread_rng(), "pw", None)
                .unwrap();

        let account = export_keystore(dir.path().join(uuid), "pw").unwrap();
        assert_eq!(account.address, signer.address());
        assert_eq!(account.private_key, B256::from(signer.to_bytes()));
    }

    #[test]
    fn test_export_keystore_errors() {
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("missing.json");
        assert!(matches!(
            export_keystore(&missing, "pw"),
            Err(TxError::Keystore(_))
        ));

        let garbage = dir.path().join("garbage.json");
        std::fs::write(&garbage, "{\"version\": 3}").unwrap();
        assert!(matches!(
            export_keystore(&garbage, "pw"),
            Err(TxError::Keystore(_))
        ));
    }
}
