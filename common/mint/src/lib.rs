// Copyright 2024 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

//! Issuance and redemption engine of denominated blind-signature cash.
//!
//! A [`Mint`] owns one key pair per denomination for a single series of an
//! instrument. Private keys stay locked under the credential of the server's
//! [`SigningAuthority`] and are only unlocked for the duration of a single
//! [`Mint::sign_token`] call. The blind-signature scheme itself is supplied by
//! the caller through the [`Token`] capability.

pub mod authority;
pub mod config;
pub mod denomination;
pub mod error;
pub mod identifier;
pub mod mint;
pub mod persistence;
pub mod rotation;
pub mod time;
pub mod token;

#[cfg(test)]
pub(crate) mod tests;

pub use authority::{LocalSigningAuthority, PublicIdentity, SigningAuthority, DEFAULT_KEY_STRENGTH};
pub use config::Config;
pub use denomination::{Amount, DenominationKeySet, MAX_DENOMINATIONS};
pub use error::{ErrorKind, MintError};
pub use identifier::Identifier;
pub use mint::Mint;
pub use persistence::MintDocument;
pub use rotation::{MintRotation, SeriesSchedule};
pub use time::{Clock, ManualClock, SystemClock, Timestamp, ValidityWindow};
pub use token::{DenominationContext, Token, TokenError};
