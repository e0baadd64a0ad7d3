// Copyright 2024 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::serde_helpers::{argon2_algorithm_name, argon2_cost_helper, argon2_version_number};
use crate::{Error, Password};
use aes_gcm::{Aes256Gcm, Key};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::{thread_rng, CryptoRng, Fill, RngCore};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

pub const ARGON2_SALT_SIZE: usize = 16;

/// Highest Argon2 memory cost, in KiB, accepted for new or stored records (1 GiB).
pub const MAX_ARGON2_M_COST: u32 = 1 << 20;

/// Highest Argon2 iteration count accepted for new or stored records.
pub const MAX_ARGON2_T_COST: u32 = 64;

/// Highest Argon2 parallelism accepted for new or stored records.
pub const MAX_ARGON2_P_COST: u32 = 16;

fn ensure_costs_within_limits(m_cost: u32, t_cost: u32, p_cost: u32) -> Result<(), Error> {
    if m_cost > MAX_ARGON2_M_COST || t_cost > MAX_ARGON2_T_COST || p_cost > MAX_ARGON2_P_COST {
        return Err(Error::malformed(format!(
            "argon2 costs (m = {m_cost}, t = {t_cost}, p = {p_cost}) exceed the supported maximum \
             (m = {MAX_ARGON2_M_COST}, t = {MAX_ARGON2_T_COST}, p = {MAX_ARGON2_P_COST})"
        )));
    }
    Ok(())
}

/// Argon2 cost settings applied to every newly encrypted record.
///
/// Records always carry the parameters they were produced with, so changing
/// the settings never affects the ability to decrypt existing material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfSettings {
    /// Memory size in KiB.
    pub m_cost: u32,

    /// Number of iterations.
    pub t_cost: u32,

    /// Degree of parallelism.
    pub p_cost: u32,
}

impl Default for KdfSettings {
    fn default() -> Self {
        KdfSettings {
            m_cost: Params::DEFAULT_M_COST,
            t_cost: Params::DEFAULT_T_COST,
            p_cost: Params::DEFAULT_P_COST,
        }
    }
}

impl KdfSettings {
    pub fn to_params(&self) -> Result<Params, Error> {
        ensure_costs_within_limits(self.m_cost, self.t_cost, self.p_cost)?;
        Ok(Params::new(self.m_cost, self.t_cost, self.p_cost, None)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kdf", rename_all = "snake_case")]
pub enum KdfInfo {
    Argon2 {
        /// The Argon2 cost parameters used when deriving the record key.
        #[serde(with = "argon2_cost_helper")]
        params: Params,

        /// The Argon2 variant used when deriving the record key.
        #[serde(with = "argon2_algorithm_name")]
        algorithm: Algorithm,

        /// The Argon2 version used when deriving the record key.
        #[serde(with = "argon2_version_number")]
        version: Version,

        /// The salt mixed into the password when the record key was derived.
        kdf_salt: [u8; ARGON2_SALT_SIZE],
    },
}

impl KdfInfo {
    pub fn new_argon2(settings: &KdfSettings) -> Result<Self, Error> {
        let mut rng = thread_rng();
        Self::new_argon2_with_rng(&mut rng, settings)
    }

    pub fn new_argon2_with_rng<R: RngCore + CryptoRng>(
        rng: &mut R,
        settings: &KdfSettings,
    ) -> Result<Self, Error> {
        let mut kdf_salt = [0u8; ARGON2_SALT_SIZE];
        kdf_salt.try_fill(rng)?;

        Ok(KdfInfo::Argon2 {
            params: settings.to_params()?,
            algorithm: Algorithm::Argon2id,
            version: Version::V0x13,
            kdf_salt,
        })
    }

    pub fn salt(&self) -> &[u8] {
        match self {
            KdfInfo::Argon2 { kdf_salt, .. } => kdf_salt,
        }
    }

    /// Refuse records whose claimed costs would stall or exhaust the host.
    pub fn ensure_within_limits(&self) -> Result<(), Error> {
        match self {
            KdfInfo::Argon2 { params, .. } => {
                ensure_costs_within_limits(params.m_cost(), params.t_cost(), params.p_cost())
            }
        }
    }

    /// Stretch the password into a one-off AES-256 key for a single record.
    pub(crate) fn expand_key(
        &self,
        password: &Password,
    ) -> Result<Zeroizing<Key<Aes256Gcm>>, Error> {
        match self {
            KdfInfo::Argon2 {
                params,
                algorithm,
                version,
                kdf_salt,
            } => {
                self.ensure_within_limits()?;
                let argon2 = Argon2::new(*algorithm, *version, params.clone());
                let mut key = Zeroizing::new(Key::<Aes256Gcm>::default());
                argon2.hash_password_into(password.as_bytes(), kdf_salt, key.as_mut_slice())?;
                Ok(key)
            }
        }
    }
}
