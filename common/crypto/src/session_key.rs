// Copyright 2024 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::error::KeyExchangeError;
use crate::secret::SecretBytes;
use aes_gcm::aead::{Aead, Nonce};
use aes_gcm::{Aes256Gcm, Key, KeyInit};
use cashmint_key_cipher::{CiphertextRecord, KeyCipher, Password, AES256GCM_NONCE_SIZE};
use rand::{thread_rng, CryptoRng, Fill, RngCore};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

pub const SESSION_KEY_LENGTH: usize = 32;

/// Payload sealed under an unlocked session key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedData {
    pub nonce: [u8; AES256GCM_NONCE_SIZE],
    pub ciphertext: Vec<u8>,
}

/// Symmetric 256-bit key that only ever exists at rest in its password-locked form.
///
/// The lock is either a user password or a secret negotiated via ECDH, which is
/// what allows the key to be handed over to a peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionKey {
    locked: CiphertextRecord,
}

impl SessionKey {
    pub fn generate(cipher: &KeyCipher, password: &Password) -> Result<Self, KeyExchangeError> {
        let mut rng = thread_rng();
        Self::generate_with_rng(&mut rng, cipher, password)
    }

    pub fn generate_with_rng<R: RngCore + CryptoRng>(
        rng: &mut R,
        cipher: &KeyCipher,
        password: &Password,
    ) -> Result<Self, KeyExchangeError> {
        let mut key = Zeroizing::new([0u8; SESSION_KEY_LENGTH]);
        key.try_fill(&mut *rng)?;
        let locked = cipher.encrypt_with_rng(rng, &key[..], password)?;
        Ok(SessionKey { locked })
    }

    pub fn from_key_bytes(
        cipher: &KeyCipher,
        key: &[u8],
        password: &Password,
    ) -> Result<Self, KeyExchangeError> {
        if key.len() != SESSION_KEY_LENGTH {
            return Err(KeyExchangeError::malformed(format!(
                "expected a {SESSION_KEY_LENGTH} byte session key, got {} bytes",
                key.len()
            )));
        }
        Ok(SessionKey {
            locked: cipher.encrypt(key, password)?,
        })
    }

    pub fn locked_record(&self) -> &CiphertextRecord {
        &self.locked
    }

    pub fn unlock(
        &self,
        cipher: &KeyCipher,
        password: &Password,
    ) -> Result<SecretBytes, KeyExchangeError> {
        let plaintext = cipher.decrypt(&self.locked, password)?;
        if plaintext.len() != SESSION_KEY_LENGTH {
            return Err(KeyExchangeError::malformed(
                "the locked session key has an unexpected length",
            ));
        }
        Ok(SecretBytes::from_slice(&plaintext))
    }

    /// Re-lock the same key bytes under a different password.
    pub fn change_password(
        &self,
        cipher: &KeyCipher,
        old_password: &Password,
        new_password: &Password,
    ) -> Result<SessionKey, KeyExchangeError> {
        Ok(SessionKey {
            locked: cipher.change_password(&self.locked, old_password, new_password)?,
        })
    }

    pub fn seal(
        &self,
        cipher: &KeyCipher,
        password: &Password,
        plaintext: &[u8],
    ) -> Result<SealedData, KeyExchangeError> {
        let key = self.unlock(cipher, password)?;
        let aead = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));

        let mut nonce = [0u8; AES256GCM_NONCE_SIZE];
        nonce.try_fill(&mut thread_rng())?;

        let ciphertext = aead
            .encrypt(Nonce::<Aes256Gcm>::from_slice(&nonce), plaintext)
            .map_err(|_| KeyExchangeError::AeadFailure)?;
        Ok(SealedData { nonce, ciphertext })
    }

    pub fn open(
        &self,
        cipher: &KeyCipher,
        password: &Password,
        sealed: &SealedData,
    ) -> Result<Zeroizing<Vec<u8>>, KeyExchangeError> {
        let key = self.unlock(cipher, password)?;
        let aead = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));

        aead.decrypt(
            Nonce::<Aes256Gcm>::from_slice(&sealed.nonce),
            sealed.ciphertext.as_ref(),
        )
        .map(Zeroizing::new)
        .map_err(|_| KeyExchangeError::AeadFailure)
    }
}
