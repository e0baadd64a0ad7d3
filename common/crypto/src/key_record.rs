// Copyright 2024 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::asymmetric::secp256k1::PublicKey;
use crate::error::KeyExchangeError;
use cashmint_key_cipher::CiphertextRecord;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Curve {
    Secp256k1,
}

impl Display for Curve {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Curve::Secp256k1 => f.write_str("secp256k1"),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyMode {
    Public,
    Private,
}

/// Elliptic-curve key as it is stored and transported.
///
/// A `Public` record only ever carries the cleartext point. A `Private` record
/// carries the password-locked scalar (and optionally a locked chain code),
/// plus the cached public point when it is known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EcKeyRecord {
    pub curve: Curve,
    pub mode: KeyMode,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    public_key: Vec<u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    encrypted_key: Option<CiphertextRecord>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    chain_code: Option<CiphertextRecord>,
}

impl EcKeyRecord {
    pub fn new_public(public_key: &PublicKey) -> Self {
        EcKeyRecord {
            curve: Curve::Secp256k1,
            mode: KeyMode::Public,
            public_key: public_key.to_bytes(),
            encrypted_key: None,
            chain_code: None,
        }
    }

    pub fn new_private(
        public_key: Option<&PublicKey>,
        encrypted_key: CiphertextRecord,
        chain_code: Option<CiphertextRecord>,
    ) -> Self {
        EcKeyRecord {
            curve: Curve::Secp256k1,
            mode: KeyMode::Private,
            public_key: public_key.map(PublicKey::to_bytes).unwrap_or_default(),
            encrypted_key: Some(encrypted_key),
            chain_code,
        }
    }

    pub fn is_public(&self) -> bool {
        self.mode == KeyMode::Public
    }

    /// Cached public point, empty if it was never recorded.
    pub fn public_key_bytes(&self) -> &[u8] {
        &self.public_key
    }

    pub fn set_public_key(&mut self, public_key: &PublicKey) {
        self.public_key = public_key.to_bytes();
    }

    pub fn encrypted_key(&self) -> Option<&CiphertextRecord> {
        self.encrypted_key.as_ref()
    }

    pub fn chain_code(&self) -> Option<&CiphertextRecord> {
        self.chain_code.as_ref()
    }

    /// Copy of this record with every field able to recover the private
    /// scalar cleared.
    pub fn to_public(&self) -> EcKeyRecord {
        EcKeyRecord {
            curve: self.curve,
            mode: KeyMode::Public,
            public_key: self.public_key.clone(),
            encrypted_key: None,
            chain_code: None,
        }
    }

    pub fn validate(&self) -> Result<(), KeyExchangeError> {
        match self.mode {
            KeyMode::Public => {
                if self.encrypted_key.is_some() || self.chain_code.is_some() {
                    return Err(KeyExchangeError::malformed(
                        "public key record carries private key material",
                    ));
                }
                if self.public_key.is_empty() {
                    return Err(KeyExchangeError::MissingPublicKey);
                }
            }
            KeyMode::Private => {
                if self.encrypted_key.is_none() {
                    return Err(KeyExchangeError::MissingPrivateKey);
                }
            }
        }
        Ok(())
    }
}
