// Copyright 2024 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::denomination::{Amount, MAX_DENOMINATIONS};
use crate::identifier::Identifier;
use crate::time::Timestamp;
use crate::token::TokenError;
use cashmint_crypto::KeyExchangeError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = MintError> = std::result::Result<T, E>;

/// Coarse classification of every failure the mint can report.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Wrong password or otherwise undecryptable key material.
    CredentialFailure,
    NotFound,
    Unsupported,
    Malformed,
    CryptoFailure,
    Expired,
    InvalidInput,
}

#[derive(Debug, Error)]
pub enum MintError {
    #[error(transparent)]
    KeyExchange(#[from] KeyExchangeError),

    #[error(transparent)]
    KeyCipher(#[from] cashmint_key_cipher::Error),

    #[error("the mint has not been loaded or generated yet")]
    NotLoaded,

    #[error("the mint for series {series} expired at {expiration} (current time: {now})")]
    Expired {
        series: u32,
        expiration: Timestamp,
        now: Timestamp,
    },

    #[error("the mint for series {series} only becomes valid at {valid_from} (current time: {now})")]
    NotYetValid {
        series: u32,
        valid_from: Timestamp,
        now: Timestamp,
    },

    #[error("tokens of series {series} were redeemable until {valid_to} (current time: {now})")]
    RedemptionClosed {
        series: u32,
        valid_to: Timestamp,
        now: Timestamp,
    },

    #[error("there is no denomination at index {index}. the mint holds {count} denominations")]
    DenominationIndexOutOfRange { index: usize, count: usize },

    #[error("the mint has no denomination worth {value}")]
    UnknownDenomination { value: Amount },

    #[error("the mint already has a denomination worth {value}")]
    DuplicateDenomination { value: Amount },

    #[error("between 1 and {MAX_DENOMINATIONS} initial denominations are required, got {count}")]
    InvalidDenominationCount { count: usize },

    #[error("denominations must have a non-zero face value")]
    ZeroDenomination,

    #[error("invalid validity window: valid_from {valid_from}, expiration {expiration}, valid_to {valid_to}")]
    InvalidValidityWindow {
        valid_from: Timestamp,
        valid_to: Timestamp,
        expiration: Timestamp,
    },

    #[error("the mint already holds keys for series {series}")]
    AlreadyGenerated { series: u32 },

    #[error("{field} mismatch: the mint uses {expected} but {received} was provided")]
    IdentifierMismatch {
        field: &'static str,
        expected: Identifier,
        received: Identifier,
    },

    #[error("signing authority {received} is not the server authority ({expected}) of this mint")]
    WrongSigningAuthority {
        expected: Identifier,
        received: Identifier,
    },

    #[error("key strength of {strength} bits is not supported")]
    UnsupportedKeyStrength { strength: u32 },

    #[error("denomination {value} does not hold a private key")]
    MissingPrivateKey { value: Amount },

    #[error("the private key of denomination {value} does not match its public key")]
    KeyPairMismatch { value: Amount },

    #[error("the mint has not been signed")]
    MissingSignature,

    #[error("the mint signature does not verify against the identity of {nym_id}")]
    InvalidMintSignature { nym_id: Identifier },

    #[error("the token for denomination {value} did not verify")]
    TokenRejected { value: Amount },

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("series {received} does not follow the latest known series {latest}")]
    SeriesNotIncreasing { latest: u32, received: u32 },

    #[error("the mint document is malformed: {reason}")]
    MalformedDocument { reason: String },

    #[error("failed to serialize or deserialize the mint document: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },

    #[error("failed to load config file using path '{}'. detailed message: {source}", path.display())]
    ConfigLoadFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config file '{}': {source}", path.display())]
    ConfigParseFailure {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("the provided config is invalid: {reason}")]
    InvalidConfig { reason: String },
}

impl MintError {
    pub(crate) fn malformed<S: Into<String>>(reason: S) -> Self {
        MintError::MalformedDocument {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_config<S: Into<String>>(reason: S) -> Self {
        MintError::InvalidConfig {
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            MintError::KeyExchange(err) => {
                if err.is_credential_failure() {
                    ErrorKind::CredentialFailure
                } else if err.is_unsupported() {
                    ErrorKind::Unsupported
                } else if err.is_malformed() {
                    ErrorKind::Malformed
                } else {
                    ErrorKind::CryptoFailure
                }
            }
            MintError::KeyCipher(err) => {
                if err.is_credential_failure() {
                    ErrorKind::CredentialFailure
                } else if err.is_malformed() {
                    ErrorKind::Malformed
                } else {
                    ErrorKind::CryptoFailure
                }
            }
            MintError::Expired { .. }
            | MintError::NotYetValid { .. }
            | MintError::RedemptionClosed { .. } => ErrorKind::Expired,
            MintError::NotLoaded
            | MintError::DenominationIndexOutOfRange { .. }
            | MintError::UnknownDenomination { .. }
            | MintError::MissingPrivateKey { .. }
            | MintError::MissingSignature => ErrorKind::NotFound,
            MintError::UnsupportedKeyStrength { .. } => ErrorKind::Unsupported,
            MintError::KeyPairMismatch { .. }
            | MintError::InvalidMintSignature { .. }
            | MintError::TokenRejected { .. }
            | MintError::Token(_) => ErrorKind::CryptoFailure,
            MintError::MalformedDocument { .. } | MintError::Serialization { .. } => {
                ErrorKind::Malformed
            }
            MintError::DuplicateDenomination { .. }
            | MintError::InvalidDenominationCount { .. }
            | MintError::ZeroDenomination
            | MintError::InvalidValidityWindow { .. }
            | MintError::AlreadyGenerated { .. }
            | MintError::IdentifierMismatch { .. }
            | MintError::WrongSigningAuthority { .. }
            | MintError::SeriesNotIncreasing { .. }
            | MintError::ConfigLoadFailure { .. }
            | MintError::ConfigParseFailure { .. }
            | MintError::InvalidConfig { .. } => ErrorKind::InvalidInput,
        }
    }
}
