// Copyright 2024 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::denomination::Amount;
use crate::error::{MintError, Result};
use crate::identifier::Identifier;
use crate::time::ValidityWindow;
use cashmint_crypto::asymmetric::secp256k1::Signature;
use cashmint_crypto::Armored;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const MINT_DOCUMENT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenominationEntry {
    pub value: Amount,

    /// Base64 armored SEC1 public key.
    pub public: Armored,

    /// Base64 armored JSON of the password-locked private key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private: Option<Armored>,
}

/// Serialized form of a mint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintDocument {
    pub version: u32,

    pub notary_id: Identifier,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_nym_id: Option<Identifier>,

    pub instrument_definition_id: Identifier,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cash_account_id: Option<Identifier>,

    pub series: u32,

    pub validity: ValidityWindow,

    pub denomination_count: usize,

    pub denominations: Vec<DenominationEntry>,

    /// Base58 encoded ECDSA signature of the server authority over the public
    /// contents of the document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl MintDocument {
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn includes_private_keys(&self) -> bool {
        self.denominations.iter().any(|entry| entry.private.is_some())
    }

    /// Bytes covered by the mint signature: the document without any private
    /// key material and without the signature itself.
    pub fn signing_payload(&self) -> Result<Vec<u8>> {
        let mut public = self.clone();
        public.signature = None;
        for entry in &mut public.denominations {
            entry.private = None;
        }
        Ok(serde_json::to_vec(&public)?)
    }

    pub fn decode_signature(&self) -> Result<Option<Signature>> {
        self.signature
            .as_deref()
            .map(|encoded| {
                let bytes = bs58::decode(encoded).into_vec().map_err(|err| {
                    MintError::malformed(format!("invalid base58 mint signature: {err}"))
                })?;
                Signature::from_bytes(&bytes)
                    .map_err(|err| MintError::malformed(format!("invalid mint signature: {err}")))
            })
            .transpose()
    }

    pub fn encode_signature(signature: &Signature) -> String {
        bs58::encode(signature.to_bytes()).into_string()
    }

    pub fn validate(&self) -> Result<()> {
        if self.version != MINT_DOCUMENT_VERSION {
            return Err(MintError::malformed(format!(
                "unsupported document version {} (expected {MINT_DOCUMENT_VERSION})",
                self.version
            )));
        }

        if self.denomination_count != self.denominations.len() {
            return Err(MintError::malformed(format!(
                "declared {} denominations but {} are present",
                self.denomination_count,
                self.denominations.len()
            )));
        }

        let mut seen = BTreeSet::new();
        for entry in &self.denominations {
            if entry.value == 0 {
                return Err(MintError::malformed("denomination with a zero face value"));
            }
            if !seen.insert(entry.value) {
                return Err(MintError::malformed(format!(
                    "denomination {} is listed more than once",
                    entry.value
                )));
            }
            if entry.public.is_empty() {
                return Err(MintError::malformed(format!(
                    "denomination {} has no public key",
                    entry.value
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn document() -> MintDocument {
        MintDocument {
            version: MINT_DOCUMENT_VERSION,
            notary_id: Identifier::from_contents(b"notary"),
            server_nym_id: Some(Identifier::from_contents(b"server")),
            instrument_definition_id: Identifier::from_contents(b"instrument"),
            cash_account_id: None,
            series: 1,
            validity: ValidityWindow::new(1000, 5000, 3000).unwrap(),
            denomination_count: 2,
            denominations: vec![
                DenominationEntry {
                    value: 1,
                    public: Armored::encode([2u8; 33]),
                    private: Some(Armored::encode(b"locked")),
                },
                DenominationEntry {
                    value: 5,
                    public: Armored::encode([3u8; 33]),
                    private: None,
                },
            ],
            signature: None,
        }
    }

    #[test]
    fn signing_payload_ignores_private_material_and_signature() {
        let with_private = document();
        let mut public_only = document();
        public_only.denominations[0].private = None;
        public_only.signature = Some("abc".to_string());

        assert_eq!(
            with_private.signing_payload().unwrap(),
            public_only.signing_payload().unwrap()
        );
        assert!(with_private.includes_private_keys());
        assert!(!public_only.includes_private_keys());
    }

    #[test]
    fn inconsistent_documents_are_malformed() {
        let mut wrong_count = document();
        wrong_count.denomination_count = 3;
        assert_eq!(wrong_count.validate().unwrap_err().kind(), ErrorKind::Malformed);

        let mut duplicate = document();
        duplicate.denominations[1].value = 1;
        assert_eq!(duplicate.validate().unwrap_err().kind(), ErrorKind::Malformed);

        let mut future = document();
        future.version = MINT_DOCUMENT_VERSION + 1;
        assert_eq!(future.validate().unwrap_err().kind(), ErrorKind::Malformed);

        assert!(document().validate().is_ok());
    }

    #[test]
    fn private_entries_are_omitted_when_absent() {
        let json = document().to_json().unwrap();
        assert_eq!(json.matches("\"private\"").count(), 1);
        assert!(!json.contains("signature"));

        let recovered = MintDocument::from_json(&json).unwrap();
        assert_eq!(recovered, document());
    }

    #[test]
    fn garbage_is_malformed() {
        let err = MintDocument::from_json("{\"version\": 1").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Malformed);
    }
}
