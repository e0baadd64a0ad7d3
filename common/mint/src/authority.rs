// Copyright 2024 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::error::{MintError, Result};
use crate::identifier::Identifier;
use cashmint_crypto::asymmetric::secp256k1::{KeyPair, PrivateKey, PublicKey, Signature};
use cashmint_crypto::{Curve, EcKeyRecord, EcdsaKeyExchange, Password, Secp256k1Provider};
use rand::{thread_rng, CryptoRng, RngCore};
use tracing::debug;

/// Strength, in bits, of every denomination key this crate can produce.
pub const DEFAULT_KEY_STRENGTH: u32 = 256;

/// Publicly known part of a signing authority.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PublicIdentity {
    pub nym_id: Identifier,
    pub public_key: PublicKey,
}

impl PublicIdentity {
    pub fn from_public_key(public_key: PublicKey) -> Self {
        PublicIdentity {
            nym_id: Identifier::from_contents(public_key.to_bytes()),
            public_key,
        }
    }
}

/// The server identity that owns a mint's keys.
///
/// It generates denomination keys locked under its own credential and is the
/// only party able to unlock them again.
pub trait SigningAuthority {
    fn identity(&self) -> PublicIdentity;

    fn nym_id(&self) -> Identifier {
        self.identity().nym_id
    }

    fn generate_key_pair(&self, curve: Curve, strength: u32) -> Result<EcKeyRecord>;

    fn unlock_private_key(&self, record: &EcKeyRecord) -> Result<PrivateKey>;

    fn sign(&self, message: &[u8]) -> Result<Signature>;
}

/// Signing authority whose identity key and credential live in this process.
pub struct LocalSigningAuthority {
    identity: PublicIdentity,
    identity_record: EcKeyRecord,
    password: Password,
    provider: Secp256k1Provider,
}

impl LocalSigningAuthority {
    pub fn generate(provider: Secp256k1Provider, password: Password) -> Result<Self> {
        let mut rng = thread_rng();
        Self::generate_with_rng(&mut rng, provider, password)
    }

    pub fn generate_with_rng<R: RngCore + CryptoRng>(
        rng: &mut R,
        provider: Secp256k1Provider,
        password: Password,
    ) -> Result<Self> {
        let keys = KeyPair::new(rng);
        let identity_record = provider.private_record(keys.private_key(), &password)?;
        Ok(LocalSigningAuthority {
            identity: PublicIdentity::from_public_key(*keys.public_key()),
            identity_record,
            password,
            provider,
        })
    }

    /// Restore the authority from its stored identity record, checking that the
    /// credential unlocks it.
    pub fn from_record(
        provider: Secp256k1Provider,
        identity_record: EcKeyRecord,
        password: Password,
    ) -> Result<Self> {
        identity_record.validate()?;
        let public_key = provider.private_to_public_point(&identity_record, &password)?;
        Ok(LocalSigningAuthority {
            identity: PublicIdentity::from_public_key(public_key),
            identity_record,
            password,
            provider,
        })
    }

    pub fn identity_record(&self) -> &EcKeyRecord {
        &self.identity_record
    }

    pub fn provider(&self) -> &Secp256k1Provider {
        &self.provider
    }
}

impl SigningAuthority for LocalSigningAuthority {
    fn identity(&self) -> PublicIdentity {
        self.identity
    }

    fn generate_key_pair(&self, curve: Curve, strength: u32) -> Result<EcKeyRecord> {
        if curve != self.provider.curve() {
            return Err(cashmint_crypto::KeyExchangeError::Unsupported {
                operation: "key generation",
                curve,
            }
            .into());
        }
        if strength != DEFAULT_KEY_STRENGTH {
            return Err(MintError::UnsupportedKeyStrength { strength });
        }

        let keys = KeyPair::new(&mut thread_rng());
        debug!("generated a new {curve} key pair for {}", self.identity.nym_id);
        Ok(self.provider.private_record(keys.private_key(), &self.password)?)
    }

    fn unlock_private_key(&self, record: &EcKeyRecord) -> Result<PrivateKey> {
        Ok(self.provider.private_key_from_record(record, &self.password)?)
    }

    fn sign(&self, message: &[u8]) -> Result<Signature> {
        let private_key = self
            .provider
            .private_key_from_record(&self.identity_record, &self.password)?;
        Ok(private_key.sign(message))
    }
}
