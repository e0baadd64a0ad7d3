// Copyright 2024 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::error::MintError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt::{self, Debug, Display, Formatter};
use std::str::FromStr;

pub const IDENTIFIER_LENGTH: usize = 32;

/// Content derived identifier of a notary, nym or instrument definition.
///
/// Rendered as base58 in every textual representation.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier([u8; IDENTIFIER_LENGTH]);

impl Identifier {
    /// Hash the contents (contract, public key, ...) the identifier stands for.
    pub fn from_contents<B: AsRef<[u8]>>(contents: B) -> Self {
        Identifier(Sha256::digest(contents.as_ref()).into())
    }

    pub const fn from_bytes(bytes: [u8; IDENTIFIER_LENGTH]) -> Self {
        Identifier(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; IDENTIFIER_LENGTH] {
        &self.0
    }

    pub fn to_base58_string(&self) -> String {
        bs58::encode(&self.0).into_string()
    }

    pub fn from_base58_string<S: AsRef<str>>(val: S) -> Result<Self, MintError> {
        let bytes = bs58::decode(val.as_ref())
            .into_vec()
            .map_err(|err| MintError::malformed(format!("invalid base58 identifier: {err}")))?;

        let bytes: [u8; IDENTIFIER_LENGTH] = bytes.try_into().map_err(|raw: Vec<u8>| {
            MintError::malformed(format!(
                "identifiers are {IDENTIFIER_LENGTH} bytes long, got {} bytes",
                raw.len()
            ))
        })?;
        Ok(Identifier(bytes))
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58_string())
    }
}

impl Debug for Identifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Identifier({self})")
    }
}

impl FromStr for Identifier {
    type Err = MintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Identifier::from_base58_string(s)
    }
}

impl Serialize for Identifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base58_string())
    }
}

impl<'de> Deserialize<'de> for Identifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Identifier::from_base58_string(&s).map_err(serde::de::Error::custom)
    }
}
