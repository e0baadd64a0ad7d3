// Copyright 2024 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::authority::DEFAULT_KEY_STRENGTH;
use crate::denomination::{validate_denomination_values, Amount};
use crate::error::{MintError, Result};
use crate::rotation::{SeriesSchedule, MAX_SERIES_VALIDITY_PERIOD};
use crate::time::Timestamp;
use cashmint_key_cipher::{KdfSettings, KeyCipher};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use std::{fs, io};
use tracing::debug;

pub const DEFAULT_SERIES_VALIDITY_PERIOD: Duration = Duration::from_secs(180 * 24 * 60 * 60);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Argon2 parameters used whenever new key material gets locked.
    pub key_protection: KdfSettings,

    pub issuance: Issuance,

    pub series: Series,
}

impl Config {
    pub fn ensure_is_valid(&self) -> Result<()> {
        self.key_protection.to_params().map_err(|err| {
            MintError::invalid_config(format!("unusable key protection parameters: {err}"))
        })?;
        self.issuance.ensure_is_valid()?;
        self.series.ensure_is_valid()
    }

    pub fn key_cipher(&self) -> KeyCipher {
        KeyCipher::new(self.key_protection)
    }

    pub fn read_from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| MintError::ConfigLoadFailure {
            path: path.to_path_buf(),
            source,
        })?;
        let loaded: Config =
            toml::from_str(&raw).map_err(|source| MintError::ConfigParseFailure {
                path: path.to_path_buf(),
                source,
            })?;
        loaded.ensure_is_valid()?;
        debug!("loaded config file from {}", path.display());
        Ok(loaded)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let formatted = toml::to_string_pretty(self).map_err(io::Error::other)?;
        fs::write(path, formatted)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Issuance {
    /// Strength, in bits, of newly generated denomination keys.
    pub key_strength: u32,

    /// Face values every new series starts with.
    pub denominations: Vec<Amount>,
}

impl Default for Issuance {
    fn default() -> Self {
        Issuance {
            key_strength: DEFAULT_KEY_STRENGTH,
            denominations: vec![1, 5, 10, 20, 50, 100],
        }
    }
}

impl Issuance {
    pub fn ensure_is_valid(&self) -> Result<()> {
        if self.key_strength != DEFAULT_KEY_STRENGTH {
            return Err(MintError::invalid_config(format!(
                "only {DEFAULT_KEY_STRENGTH} bit keys are supported, got {}",
                self.key_strength
            )));
        }
        validate_denomination_values(&self.denominations)
            .map_err(|err| MintError::invalid_config(format!("invalid denominations: {err}")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Series {
    /// How long a series stays valid. It issues for the first half and
    /// redeems for the whole period.
    #[serde(with = "humantime_serde")]
    pub validity_period: Duration,
}

impl Default for Series {
    fn default() -> Self {
        Series {
            validity_period: DEFAULT_SERIES_VALIDITY_PERIOD,
        }
    }
}

impl Series {
    pub fn ensure_is_valid(&self) -> Result<()> {
        if self.validity_period < Duration::from_secs(2) {
            return Err(MintError::invalid_config(
                "the series validity period must be at least two seconds",
            ));
        }
        if self.validity_period > MAX_SERIES_VALIDITY_PERIOD {
            return Err(MintError::invalid_config(format!(
                "the series validity period may not exceed {}s",
                MAX_SERIES_VALIDITY_PERIOD.as_secs()
            )));
        }
        Ok(())
    }

    pub fn schedule(&self, genesis: Timestamp) -> Result<SeriesSchedule> {
        SeriesSchedule::new(genesis, self.validity_period)
    }
}
