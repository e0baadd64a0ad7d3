// Copyright 2024 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

//! Conversions between secp256k1 key pairs and their password-protected
//! records, plus ECDH based transport of session keys between two parties.

use crate::asymmetric::secp256k1::{PrivateKey, PublicKey, SECRET_KEY_LENGTH};
use crate::error::KeyExchangeError;
use crate::hkdf;
use crate::key_record::{Curve, EcKeyRecord};
use crate::secret::SecretBytes;
use crate::session_key::SessionKey;
use cashmint_key_cipher::{CiphertextRecord, KeyCipher, Password};
use tracing::{debug, warn};
use zeroize::Zeroizing;

pub const CHAIN_CODE_LENGTH: usize = 32;
pub const SHARED_SECRET_LENGTH: usize = 32;

/// Domain separation label mixed into every negotiated secret.
const ECDH_SESSION_INFO: &[u8] = b"cashmint/ecdh-session-key/v1";

/// Key protection and exchange operations of an elliptic-curve provider.
///
/// Every operation requiring the plaintext private scalar is handed the
/// credential explicitly and keeps the scalar only for its own duration.
pub trait EcdsaKeyExchange {
    fn curve(&self) -> Curve;

    fn key_cipher(&self) -> &KeyCipher;

    fn private_key_from_record(
        &self,
        record: &EcKeyRecord,
        password: &Password,
    ) -> Result<PrivateKey, KeyExchangeError>;

    /// Cached public point of the record. Never decrypts anything.
    fn public_key_from_key_pair(
        &self,
        record: &EcKeyRecord,
    ) -> Result<PublicKey, KeyExchangeError> {
        PublicKey::from_bytes(record.public_key_bytes())
    }

    fn public_record_from_point(&self, point: &[u8]) -> Result<EcKeyRecord, KeyExchangeError> {
        let public_key = PublicKey::from_bytes(point)?;
        Ok(EcKeyRecord::new_public(&public_key))
    }

    fn export_private_key(
        &self,
        private_key: &PrivateKey,
        password: &Password,
    ) -> Result<CiphertextRecord, KeyExchangeError>;

    /// Wrap a freshly generated scalar into a complete private record with the
    /// public point cached alongside it.
    fn private_record(
        &self,
        private_key: &PrivateKey,
        password: &Password,
    ) -> Result<EcKeyRecord, KeyExchangeError> {
        let encrypted = self.export_private_key(private_key, password)?;
        Ok(EcKeyRecord::new_private(
            Some(&private_key.public_key()),
            encrypted,
            None,
        ))
    }

    fn encrypt_private_key_with_chain_code(
        &self,
        private_key: &PrivateKey,
        chain_code: &[u8],
        password: &Password,
    ) -> Result<EcKeyRecord, KeyExchangeError>;

    fn decrypt_private_key_with_chain_code(
        &self,
        record: &EcKeyRecord,
        password: &Password,
    ) -> Result<(PrivateKey, SecretBytes), KeyExchangeError>;

    fn derive_shared_secret(
        &self,
        local_private: &EcKeyRecord,
        remote_public: &[u8],
        password: &Password,
    ) -> Result<SecretBytes, KeyExchangeError>;

    /// Re-lock `session_key` under the secret shared with the owner of
    /// `remote_public`. Returns the negotiated secret together with the
    /// re-locked key.
    fn wrap_session_key(
        &self,
        local_private: &EcKeyRecord,
        remote_public: &[u8],
        key_password: &Password,
        session_key: &SessionKey,
        session_password: &Password,
    ) -> Result<(SecretBytes, SessionKey), KeyExchangeError> {
        let shared = self.derive_shared_secret(local_private, remote_public, key_password)?;
        let lock = Password::from(shared.as_bytes());
        let wrapped = session_key.change_password(self.key_cipher(), session_password, &lock)?;
        Ok((shared, wrapped))
    }

    /// Unlock a session key wrapped by the owner of `remote_public` for us.
    fn unwrap_session_key(
        &self,
        remote_public: &[u8],
        local_private: &EcKeyRecord,
        key_password: &Password,
        session_key: &SessionKey,
    ) -> Result<SecretBytes, KeyExchangeError> {
        let lock = self
            .derive_shared_secret(local_private, remote_public, key_password)?
            .into_password();
        session_key.unlock(self.key_cipher(), &lock)
    }

    /// Public copy of a private record, with the point recomputed from the
    /// decrypted scalar.
    fn private_to_public(
        &self,
        record: &EcKeyRecord,
        password: &Password,
    ) -> Result<EcKeyRecord, KeyExchangeError> {
        let public_key = self.private_to_public_point(record, password)?;
        let mut public = record.to_public();
        public.set_public_key(&public_key);
        Ok(public)
    }

    fn private_to_public_point(
        &self,
        record: &EcKeyRecord,
        password: &Password,
    ) -> Result<PublicKey, KeyExchangeError> {
        Ok(self.private_key_from_record(record, password)?.public_key())
    }

    fn seed_to_curve_key(&self, _seed: &[u8]) -> Result<PrivateKey, KeyExchangeError> {
        warn!("{} provider cannot derive keys from a seed", self.curve());
        Err(KeyExchangeError::Unsupported {
            operation: "seed to curve key derivation",
            curve: self.curve(),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct Secp256k1Provider {
    cipher: KeyCipher,
}

impl Secp256k1Provider {
    pub fn new(cipher: KeyCipher) -> Self {
        Secp256k1Provider { cipher }
    }

    fn ensure_curve(
        &self,
        record: &EcKeyRecord,
        operation: &'static str,
    ) -> Result<(), KeyExchangeError> {
        if record.curve != self.curve() {
            return Err(KeyExchangeError::Unsupported {
                operation,
                curve: record.curve,
            });
        }
        Ok(())
    }

    fn decrypt_locked(
        &self,
        locked: &CiphertextRecord,
        password: &Password,
    ) -> Result<Zeroizing<Vec<u8>>, KeyExchangeError> {
        self.cipher.decrypt(locked, password).map_err(|err| {
            warn!("failed to decrypt private key material: {err}");
            err.into()
        })
    }
}

impl EcdsaKeyExchange for Secp256k1Provider {
    fn curve(&self) -> Curve {
        Curve::Secp256k1
    }

    fn key_cipher(&self) -> &KeyCipher {
        &self.cipher
    }

    fn private_key_from_record(
        &self,
        record: &EcKeyRecord,
        password: &Password,
    ) -> Result<PrivateKey, KeyExchangeError> {
        self.ensure_curve(record, "private key decryption")?;
        let locked = record
            .encrypted_key()
            .ok_or(KeyExchangeError::MissingPrivateKey)?;

        let plaintext = self.decrypt_locked(locked, password)?;
        PrivateKey::from_bytes(&plaintext)
    }

    fn export_private_key(
        &self,
        private_key: &PrivateKey,
        password: &Password,
    ) -> Result<CiphertextRecord, KeyExchangeError> {
        let scalar = private_key.to_bytes();
        Ok(self.cipher.encrypt(&scalar[..], password)?)
    }

    fn encrypt_private_key_with_chain_code(
        &self,
        private_key: &PrivateKey,
        chain_code: &[u8],
        password: &Password,
    ) -> Result<EcKeyRecord, KeyExchangeError> {
        if chain_code.len() != CHAIN_CODE_LENGTH {
            return Err(KeyExchangeError::malformed(format!(
                "expected a {CHAIN_CODE_LENGTH} byte chain code, got {} bytes",
                chain_code.len()
            )));
        }

        let encrypted_key = self.export_private_key(private_key, password)?;
        let encrypted_chain_code = self.cipher.encrypt(chain_code, password)?;
        Ok(EcKeyRecord::new_private(
            Some(&private_key.public_key()),
            encrypted_key,
            Some(encrypted_chain_code),
        ))
    }

    fn decrypt_private_key_with_chain_code(
        &self,
        record: &EcKeyRecord,
        password: &Password,
    ) -> Result<(PrivateKey, SecretBytes), KeyExchangeError> {
        let private_key = self.private_key_from_record(record, password)?;
        let locked_chain_code = record.chain_code().ok_or_else(|| {
            KeyExchangeError::malformed("the key record does not hold a chain code")
        })?;

        let chain_code = self.decrypt_locked(locked_chain_code, password)?;
        if chain_code.len() != CHAIN_CODE_LENGTH {
            return Err(KeyExchangeError::malformed(
                "the decrypted chain code has an unexpected length",
            ));
        }
        Ok((private_key, SecretBytes::from_slice(&chain_code)))
    }

    fn derive_shared_secret(
        &self,
        local_private: &EcKeyRecord,
        remote_public: &[u8],
        password: &Password,
    ) -> Result<SecretBytes, KeyExchangeError> {
        let remote = PublicKey::from_bytes(remote_public).map_err(|err| {
            debug!("rejecting the remote point for ECDH: {err}");
            err
        })?;
        let local = self.private_key_from_record(local_private, password)?;

        let raw = local.diffie_hellman(&remote);
        if raw.len() != SECRET_KEY_LENGTH {
            return Err(KeyExchangeError::EcdhFailure {
                reason: format!("unexpected raw secret length of {}", raw.len()),
            });
        }

        let okm = hkdf::extract_then_expand(
            None,
            raw.as_bytes(),
            Some(ECDH_SESSION_INFO),
            SHARED_SECRET_LENGTH,
        )
        .map_err(|err| KeyExchangeError::EcdhFailure {
            reason: err.to_string(),
        })?;
        Ok(SecretBytes::from_slice(&okm))
    }
}
