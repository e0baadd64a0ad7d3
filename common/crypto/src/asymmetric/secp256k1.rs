// Copyright 2024 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::error::KeyExchangeError;
use crate::secret::SecretBytes;
use k256::ecdsa::signature::{Signer, Verifier};
use k256::ecdsa::{SigningKey, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use rand::{CryptoRng, RngCore};
use std::fmt::{self, Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use zeroize::{Zeroize, Zeroizing};

pub const SECRET_KEY_LENGTH: usize = 32;
/// Length of a compressed SEC1 encoded point.
pub const PUBLIC_KEY_LENGTH: usize = 33;
pub const SIGNATURE_LENGTH: usize = 64;

/// Keypair for usage in secp256k1 ECDSA and ECDH.
pub struct KeyPair {
    private_key: PrivateKey,
    public_key: PublicKey,
}

impl KeyPair {
    pub fn new<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        PrivateKey::new(rng).into()
    }

    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn into_private_key(self) -> PrivateKey {
        self.private_key
    }
}

impl From<PrivateKey> for KeyPair {
    fn from(private_key: PrivateKey) -> Self {
        KeyPair {
            public_key: private_key.public_key(),
            private_key,
        }
    }
}

/// secp256k1 private scalar.
///
/// The underlying key is wiped on drop and the type is deliberately not `Clone`.
pub struct PrivateKey(k256::SecretKey);

impl PrivateKey {
    pub fn new<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        PrivateKey(k256::SecretKey::random(rng))
    }

    pub fn from_bytes(b: &[u8]) -> Result<Self, KeyExchangeError> {
        if b.len() != SECRET_KEY_LENGTH {
            return Err(KeyExchangeError::malformed(format!(
                "expected a {SECRET_KEY_LENGTH} byte private scalar, got {} bytes",
                b.len()
            )));
        }
        k256::SecretKey::from_slice(b)
            .map(PrivateKey)
            .map_err(KeyExchangeError::malformed_secp256k1)
    }

    pub fn to_bytes(&self) -> Zeroizing<[u8; SECRET_KEY_LENGTH]> {
        let mut field_bytes = self.0.to_bytes();
        let mut out = Zeroizing::new([0u8; SECRET_KEY_LENGTH]);
        out.copy_from_slice(&field_bytes);
        field_bytes.zeroize();
        out
    }

    /// Multiply the curve base point by this scalar.
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.0.public_key())
    }

    /// Raw ECDH output, i.e. the x-coordinate of the shared point.
    pub fn diffie_hellman(&self, remote: &PublicKey) -> SecretBytes {
        let shared = k256::ecdh::diffie_hellman(self.0.to_nonzero_scalar(), remote.0.as_affine());
        SecretBytes::from_slice(shared.raw_secret_bytes())
    }

    pub fn sign<M: AsRef<[u8]>>(&self, message: M) -> Signature {
        let signing_key = SigningKey::from(&self.0);
        Signature(signing_key.sign(message.as_ref()))
    }
}

impl Debug for PrivateKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(<redacted>)")
    }
}

/// secp256k1 public point, serialized as compressed SEC1.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct PublicKey(k256::PublicKey);

impl PublicKey {
    pub fn from_bytes(b: &[u8]) -> Result<Self, KeyExchangeError> {
        if b.is_empty() {
            return Err(KeyExchangeError::MissingPublicKey);
        }
        k256::PublicKey::from_sec1_bytes(b)
            .map(PublicKey)
            .map_err(KeyExchangeError::malformed_secp256k1)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.to_encoded_point(true).as_bytes().to_vec()
    }

    pub fn to_base58_string(&self) -> String {
        bs58::encode(self.to_bytes()).into_string()
    }

    pub fn from_base58_string<I: AsRef<[u8]>>(val: I) -> Result<Self, KeyExchangeError> {
        let bytes = bs58::decode(val).into_vec().map_err(|source| {
            KeyExchangeError::malformed(format!("invalid base58 public key: {source}"))
        })?;
        Self::from_bytes(&bytes)
    }

    pub fn verify<M: AsRef<[u8]>>(
        &self,
        message: M,
        signature: &Signature,
    ) -> Result<(), KeyExchangeError> {
        VerifyingKey::from(&self.0)
            .verify(message.as_ref(), &signature.0)
            .map_err(|source| KeyExchangeError::SignatureFailure { source })
    }
}

impl Hash for PublicKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_bytes().hash(state)
    }
}

impl Display for PublicKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.to_base58_string(), f)
    }
}

impl Debug for PublicKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.to_base58_string(), f)
    }
}

impl FromStr for PublicKey {
    type Err = KeyExchangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PublicKey::from_base58_string(s)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Signature(k256::ecdsa::Signature);

impl Signature {
    pub fn to_bytes(&self) -> [u8; SIGNATURE_LENGTH] {
        let mut out = [0u8; SIGNATURE_LENGTH];
        out.copy_from_slice(&self.0.to_bytes());
        out
    }

    pub fn from_bytes(b: &[u8]) -> Result<Self, KeyExchangeError> {
        k256::ecdsa::Signature::from_slice(b)
            .map(Signature)
            .map_err(|source| KeyExchangeError::SignatureFailure { source })
    }
}
