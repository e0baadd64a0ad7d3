// Copyright 2024 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::CURRENT_VERSION;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to encrypt the provided key material: {cause}")]
    AesFailure { cause: aes_gcm::Error },

    #[error("failed to expand the password: {cause}")]
    Argon2Failure { cause: argon2::Error },

    #[error("failed to generate random bytes: {source}")]
    RandomError {
        #[from]
        source: rand::Error,
    },

    #[error("the record was encrypted with a different version ({received}). The current version is {CURRENT_VERSION}")]
    VersionMismatch { received: u8 },

    #[error("the ciphertext record is malformed: {reason}")]
    MalformedRecord { reason: String },

    #[error("could not decrypt the key material - the provided password was invalid")]
    InvalidPassword,
}

impl Error {
    pub(crate) fn malformed<S: Into<String>>(reason: S) -> Self {
        Error::MalformedRecord {
            reason: reason.into(),
        }
    }

    /// The record is intact but the credential could not open it.
    pub fn is_credential_failure(&self) -> bool {
        matches!(self, Error::InvalidPassword)
    }

    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Error::VersionMismatch { .. } | Error::MalformedRecord { .. }
        )
    }
}

impl From<aes_gcm::Error> for Error {
    fn from(cause: aes_gcm::Error) -> Self {
        Error::AesFailure { cause }
    }
}

impl From<argon2::Error> for Error {
    fn from(cause: argon2::Error) -> Self {
        Error::Argon2Failure { cause }
    }
}
