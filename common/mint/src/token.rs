// Copyright 2024 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::denomination::Amount;
use crate::identifier::Identifier;
use cashmint_crypto::asymmetric::secp256k1::{PrivateKey, PublicKey};
use cashmint_crypto::KeyExchangeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("the token request was rejected: {reason}")]
    Rejected { reason: String },

    #[error("the token is malformed: {reason}")]
    Malformed { reason: String },

    #[error("token cryptography failed: {0}")]
    Crypto(#[from] KeyExchangeError),
}

/// Everything a token needs to know about the key it is being signed or
/// verified with.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DenominationContext {
    pub instrument_definition_id: Identifier,
    pub series: u32,
    pub face_value: Amount,
}

/// A single blinded coin, as understood by a particular blind-signature scheme.
///
/// The mint never looks inside a token. It only selects the denomination key
/// and hands it over.
pub trait Token {
    /// Sign the blinded request with the denomination's private key and return
    /// the serialized response for the requester.
    fn blind_sign(
        &mut self,
        private_key: &PrivateKey,
        context: &DenominationContext,
    ) -> Result<Vec<u8>, TokenError>;

    /// Check an unblinded token presented for deposit.
    fn verify(
        &self,
        cleartext: &[u8],
        public_key: &PublicKey,
        context: &DenominationContext,
    ) -> Result<bool, TokenError>;
}
