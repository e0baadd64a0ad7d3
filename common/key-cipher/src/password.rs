// Copyright 2024 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use std::fmt::{self, Debug, Formatter};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Credential used to lock and unlock key material.
///
/// It is wiped from memory when dropped and is intentionally not `Clone`,
/// so every decryption site has to be handed the password explicitly.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Password(Vec<u8>);

impl Password {
    pub fn new<B: Into<Vec<u8>>>(bytes: B) -> Self {
        Password(bytes.into())
    }

    /// Password consisting of no bytes at all.
    pub fn empty() -> Self {
        Password(Vec::new())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for Password {
    fn from(value: &str) -> Self {
        Password::new(value.as_bytes())
    }
}

impl From<String> for Password {
    fn from(value: String) -> Self {
        Password::new(value.into_bytes())
    }
}

impl From<Vec<u8>> for Password {
    fn from(value: Vec<u8>) -> Self {
        Password(value)
    }
}

impl From<&[u8]> for Password {
    fn from(value: &[u8]) -> Self {
        Password::new(value)
    }
}

impl Debug for Password {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}
