// Copyright 2024 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::error::KeyExchangeError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Base64 text encoding of binary key or ciphertext material.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Armored(String);

impl Armored {
    pub fn encode<B: AsRef<[u8]>>(bytes: B) -> Self {
        Armored(STANDARD.encode(bytes))
    }

    /// Armor the JSON representation of a serializable container.
    pub fn encode_json<T: Serialize>(value: &T) -> Result<Self, KeyExchangeError> {
        let raw = serde_json::to_vec(value)?;
        Ok(Armored::encode(raw))
    }

    pub fn decode(&self) -> Result<Vec<u8>, KeyExchangeError> {
        Ok(STANDARD.decode(&self.0)?)
    }

    pub fn decode_json<T: DeserializeOwned>(&self) -> Result<T, KeyExchangeError> {
        let raw = self.decode()?;
        Ok(serde_json::from_slice(&raw)?)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for Armored {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl FromStr for Armored {
    type Err = KeyExchangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        STANDARD.decode(trimmed)?;
        Ok(Armored(trimmed.to_string()))
    }
}
