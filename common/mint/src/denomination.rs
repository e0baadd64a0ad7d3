// Copyright 2024 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::authority::SigningAuthority;
use crate::error::{MintError, Result};
use cashmint_crypto::asymmetric::secp256k1::{PrivateKey, PublicKey};
use cashmint_crypto::{Armored, CiphertextRecord, Curve, EcKeyRecord};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

/// Face value of a token.
pub type Amount = u64;

/// Upper bound on the number of denominations created together with a mint.
pub const MAX_DENOMINATIONS: usize = 10;

/// Check a list of initial denomination values: 1 to [`MAX_DENOMINATIONS`]
/// distinct, non-zero values.
pub fn validate_denomination_values(values: &[Amount]) -> Result<()> {
    if values.is_empty() || values.len() > MAX_DENOMINATIONS {
        return Err(MintError::InvalidDenominationCount {
            count: values.len(),
        });
    }

    let mut seen = BTreeSet::new();
    for value in values {
        if *value == 0 {
            return Err(MintError::ZeroDenomination);
        }
        if !seen.insert(*value) {
            return Err(MintError::DuplicateDenomination { value: *value });
        }
    }
    Ok(())
}

/// Key pair of a single denomination.
///
/// The public half is always present. The private half is only ever held as
/// an armored, password-locked record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DenominationKeySet {
    face_value: Amount,
    public_armor: Armored,
    private_armor: Option<Armored>,
}

impl DenominationKeySet {
    pub fn generate(
        authority: &dyn SigningAuthority,
        face_value: Amount,
        key_strength: u32,
    ) -> Result<Self> {
        if face_value == 0 {
            return Err(MintError::ZeroDenomination);
        }

        let record = authority.generate_key_pair(Curve::Secp256k1, key_strength)?;
        let encrypted = record
            .encrypted_key()
            .ok_or(MintError::MissingPrivateKey { value: face_value })?;

        Ok(DenominationKeySet {
            face_value,
            public_armor: Armored::encode(record.public_key_bytes()),
            private_armor: Some(Armored::encode_json(encrypted)?),
        })
    }

    pub(crate) fn from_armor(
        face_value: Amount,
        public_armor: Armored,
        private_armor: Option<Armored>,
    ) -> Self {
        DenominationKeySet {
            face_value,
            public_armor,
            private_armor,
        }
    }

    pub fn face_value(&self) -> Amount {
        self.face_value
    }

    pub fn public_armor(&self) -> &Armored {
        &self.public_armor
    }

    pub fn private_armor(&self) -> Option<&Armored> {
        self.private_armor.as_ref()
    }

    pub fn has_private_key(&self) -> bool {
        self.private_armor.is_some()
    }

    pub fn public_key(&self) -> Result<PublicKey> {
        Ok(PublicKey::from_bytes(&self.public_armor.decode()?)?)
    }

    pub fn private_record(&self) -> Result<EcKeyRecord> {
        let armor = self
            .private_armor
            .as_ref()
            .ok_or(MintError::MissingPrivateKey {
                value: self.face_value,
            })?;
        let encrypted: CiphertextRecord = armor.decode_json()?;
        let public_key = self.public_key()?;
        Ok(EcKeyRecord::new_private(Some(&public_key), encrypted, None))
    }

    /// Decrypt the private key through the authority that locked it, making
    /// sure it still belongs to the published public key.
    pub fn unlock(&self, authority: &dyn SigningAuthority) -> Result<PrivateKey> {
        let private_key = authority.unlock_private_key(&self.private_record()?)?;
        if private_key.public_key() != self.public_key()? {
            return Err(MintError::KeyPairMismatch {
                value: self.face_value,
            });
        }
        Ok(private_key)
    }

    pub fn erase_private_key(&mut self) {
        self.private_armor = None;
    }
}

/// Denomination key sets ordered by face value.
///
/// Index based access walks the same ordering, so index `0` is always the
/// smallest denomination.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Denominations {
    by_value: BTreeMap<Amount, DenominationKeySet>,
}

impl Denominations {
    pub fn len(&self) -> usize {
        self.by_value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_value.is_empty()
    }

    pub fn contains(&self, face_value: Amount) -> bool {
        self.by_value.contains_key(&face_value)
    }

    pub fn get(&self, face_value: Amount) -> Option<&DenominationKeySet> {
        self.by_value.get(&face_value)
    }

    pub fn get_by_index(&self, index: usize) -> Option<&DenominationKeySet> {
        self.by_value.values().nth(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DenominationKeySet> {
        self.by_value.values()
    }

    pub fn insert(&mut self, key_set: DenominationKeySet) -> Result<()> {
        match self.by_value.entry(key_set.face_value) {
            Entry::Occupied(_) => Err(MintError::DuplicateDenomination {
                value: key_set.face_value,
            }),
            Entry::Vacant(entry) => {
                entry.insert(key_set);
                Ok(())
            }
        }
    }

    /// Largest face value not exceeding `amount`, or zero if none fits.
    pub fn largest_at_most(&self, amount: Amount) -> Amount {
        self.by_value
            .range(..=amount)
            .next_back()
            .map(|(value, _)| *value)
            .unwrap_or_default()
    }

    pub fn erase_private_keys(&mut self) {
        for key_set in self.by_value.values_mut() {
            key_set.erase_private_key()
        }
    }
}
