// Copyright 2024 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::key_record::Curve;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KeyExchangeError {
    #[error(transparent)]
    KeyCipher(#[from] cashmint_key_cipher::Error),

    #[error("the key record does not hold an encrypted private key")]
    MissingPrivateKey,

    #[error("the key record does not hold a public key")]
    MissingPublicKey,

    #[error("the key record is malformed: {reason}")]
    MalformedRecord { reason: String },

    #[error("malformed {curve} key material: {source}")]
    MalformedKey {
        curve: Curve,
        #[source]
        source: k256::elliptic_curve::Error,
    },

    #[error("the provided signature is malformed or did not verify: {source}")]
    SignatureFailure {
        #[source]
        source: k256::ecdsa::Error,
    },

    #[error("the armored data could not be decoded: {source}")]
    MalformedArmor {
        #[from]
        source: base64::DecodeError,
    },

    #[error("failed to serialize/deserialize the key container: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },

    #[error("failed to generate random bytes: {source}")]
    RandomError {
        #[from]
        source: rand::Error,
    },

    #[error("the session key could not seal or open the payload")]
    AeadFailure,

    #[error("ECDH shared secret negotiation failed: {reason}")]
    EcdhFailure { reason: String },

    #[error("this provider does not support {operation} on {curve}")]
    Unsupported {
        operation: &'static str,
        curve: Curve,
    },
}

impl KeyExchangeError {
    pub(crate) fn malformed<S: Into<String>>(reason: S) -> Self {
        KeyExchangeError::MalformedRecord {
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed_secp256k1(source: k256::elliptic_curve::Error) -> Self {
        KeyExchangeError::MalformedKey {
            curve: Curve::Secp256k1,
            source,
        }
    }

    /// The password (or the derived session secret) did not unlock the key material.
    pub fn is_credential_failure(&self) -> bool {
        match self {
            KeyExchangeError::KeyCipher(err) => err.is_credential_failure(),
            KeyExchangeError::AeadFailure => true,
            _ => false,
        }
    }

    pub fn is_malformed(&self) -> bool {
        match self {
            KeyExchangeError::KeyCipher(err) => err.is_malformed(),
            KeyExchangeError::MalformedRecord { .. }
            | KeyExchangeError::MalformedKey { .. }
            | KeyExchangeError::MalformedArmor { .. }
            | KeyExchangeError::Serialization { .. }
            | KeyExchangeError::MissingPrivateKey
            | KeyExchangeError::MissingPublicKey => true,
            _ => false,
        }
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, KeyExchangeError::Unsupported { .. })
    }
}
