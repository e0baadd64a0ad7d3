// Copyright 2024 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

//! Encryption of raw private key bytes under a password.
//!
//! Every record gets its own Argon2 salt and AES-256-GCM nonce, and carries
//! everything (apart from the password) required to reverse the encryption.

use aes_gcm::aead::{Aead, Nonce};
use aes_gcm::{Aes256Gcm, KeyInit};
use rand::{thread_rng, CryptoRng, Fill, RngCore};
use serde::{Deserialize, Serialize};
use tracing::debug;
use zeroize::Zeroizing;

pub use crate::error::Error;
pub use crate::kdf::{
    KdfInfo, KdfSettings, ARGON2_SALT_SIZE, MAX_ARGON2_M_COST, MAX_ARGON2_P_COST,
    MAX_ARGON2_T_COST,
};
pub use crate::password::Password;

mod error;
mod kdf;
mod password;
mod serde_helpers;

pub const CURRENT_VERSION: u8 = 1;
pub const AES256GCM_NONCE_SIZE: usize = 12;
pub const AES256GCM_TAG_SIZE: usize = 16;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "cipher", rename_all = "snake_case")]
pub enum CiphertextInfo {
    Aes256Gcm {
        /// The nonce that was used to encrypt the ciphertext.
        nonce: [u8; AES256GCM_NONCE_SIZE],
        ciphertext: Vec<u8>,
    },
}

impl CiphertextInfo {
    pub fn algorithm(&self) -> &'static str {
        match self {
            CiphertextInfo::Aes256Gcm { .. } => "aes-256-gcm",
        }
    }

    pub fn ciphertext(&self) -> &[u8] {
        match self {
            CiphertextInfo::Aes256Gcm { ciphertext, .. } => ciphertext,
        }
    }
}

/// Password-locked key material along with the cipher parameters needed to
/// recover it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CiphertextRecord {
    pub version: u8,

    /// How the password was stretched into the record key.
    pub kdf_info: KdfInfo,

    pub ciphertext_info: CiphertextInfo,
}

impl CiphertextRecord {
    pub fn algorithm(&self) -> &'static str {
        self.ciphertext_info.algorithm()
    }
}

#[derive(Debug, Clone, Default)]
pub struct KeyCipher {
    settings: KdfSettings,
}

impl KeyCipher {
    pub fn new(settings: KdfSettings) -> Self {
        KeyCipher { settings }
    }

    pub fn settings(&self) -> &KdfSettings {
        &self.settings
    }

    pub fn encrypt(
        &self,
        plaintext: &[u8],
        password: &Password,
    ) -> Result<CiphertextRecord, Error> {
        let mut rng = thread_rng();
        self.encrypt_with_rng(&mut rng, plaintext, password)
    }

    pub fn encrypt_with_rng<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        plaintext: &[u8],
        password: &Password,
    ) -> Result<CiphertextRecord, Error> {
        let kdf_info = KdfInfo::new_argon2_with_rng(rng, &self.settings)?;
        let key = kdf_info.expand_key(password)?;

        let mut nonce = [0u8; AES256GCM_NONCE_SIZE];
        nonce.try_fill(rng)?;

        let ciphertext =
            Aes256Gcm::new(&key).encrypt(Nonce::<Aes256Gcm>::from_slice(&nonce), plaintext)?;

        Ok(CiphertextRecord {
            version: CURRENT_VERSION,
            kdf_info,
            ciphertext_info: CiphertextInfo::Aes256Gcm { nonce, ciphertext },
        })
    }

    /// Recover the plaintext locked inside the record.
    ///
    /// The returned buffer is wiped once dropped; callers should keep it alive
    /// only for the duration of the operation that needs it.
    pub fn decrypt(
        &self,
        record: &CiphertextRecord,
        password: &Password,
    ) -> Result<Zeroizing<Vec<u8>>, Error> {
        if record.version != CURRENT_VERSION {
            return Err(Error::VersionMismatch {
                received: record.version,
            });
        }

        let CiphertextInfo::Aes256Gcm { nonce, ciphertext } = &record.ciphertext_info;
        if ciphertext.len() < AES256GCM_TAG_SIZE {
            return Err(Error::malformed(format!(
                "ciphertext of {} bytes is shorter than the authentication tag",
                ciphertext.len()
            )));
        }

        let key = record.kdf_info.expand_key(password)?;

        let nonce = Nonce::<Aes256Gcm>::from_slice(nonce);
        match Aes256Gcm::new(&key).decrypt(nonce, ciphertext.as_ref()) {
            Ok(plaintext) => Ok(Zeroizing::new(plaintext)),
            Err(_) => {
                debug!("key record authentication failed");
                Err(Error::InvalidPassword)
            }
        }
    }

    /// Re-lock the record under a new password, with fresh salt and nonce.
    pub fn change_password(
        &self,
        record: &CiphertextRecord,
        old_password: &Password,
        new_password: &Password,
    ) -> Result<CiphertextRecord, Error> {
        let plaintext = self.decrypt(record, old_password)?;
        self.encrypt(&plaintext, new_password)
    }
}
