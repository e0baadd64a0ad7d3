// Copyright 2024 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

pub mod armor;
pub mod asymmetric;
pub mod error;
pub mod hkdf;
pub mod key_exchange;
pub mod key_record;
pub mod secret;
pub mod session_key;

pub use armor::Armored;
pub use error::KeyExchangeError;
pub use key_exchange::{EcdsaKeyExchange, Secp256k1Provider};
pub use key_record::{Curve, EcKeyRecord, KeyMode};
pub use secret::SecretBytes;
pub use session_key::{SealedData, SessionKey};

// re-exported so that consumers do not need a direct dependency to lock keys
pub use cashmint_key_cipher::{CiphertextRecord, KdfSettings, KeyCipher, Password};
