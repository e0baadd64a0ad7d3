// Copyright 2024 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::error::{MintError, Result};
use crate::identifier::Identifier;
use crate::mint::Mint;
use crate::time::{Timestamp, ValidityWindow};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Longest series validity period a schedule accepts (roughly a century).
pub const MAX_SERIES_VALIDITY_PERIOD: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Back-to-back series windows.
///
/// Every series issues for the first half of its validity period and then
/// only redeems, while the next series takes over issuance. Hence at most two
/// series are ever valid at the same time.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SeriesSchedule {
    genesis: Timestamp,
    half_period: i64,
}

impl SeriesSchedule {
    pub fn new(genesis: Timestamp, validity_period: Duration) -> Result<Self> {
        if validity_period > MAX_SERIES_VALIDITY_PERIOD {
            return Err(MintError::invalid_config(format!(
                "the series validity period may not exceed {}s",
                MAX_SERIES_VALIDITY_PERIOD.as_secs()
            )));
        }
        let half_period = i64::try_from(validity_period.as_secs() / 2).map_err(|_| {
            MintError::invalid_config("the series validity period is too long")
        })?;
        if half_period == 0 {
            return Err(MintError::invalid_config(
                "the series validity period must be at least two seconds",
            ));
        }
        Ok(SeriesSchedule {
            genesis,
            half_period,
        })
    }

    pub fn window_for(&self, series: u32) -> Result<ValidityWindow> {
        let valid_from = i64::from(series)
            .checked_mul(self.half_period)
            .and_then(|offset| offset.checked_add(self.genesis))
            .ok_or_else(|| MintError::invalid_config("series start does not fit a timestamp"))?;

        let expiration = valid_from.checked_add(self.half_period).ok_or_else(|| {
            MintError::invalid_config("series expiration does not fit a timestamp")
        })?;
        // the window closes right before the series after next becomes valid
        let valid_to = expiration
            .checked_add(self.half_period - 1)
            .ok_or_else(|| MintError::invalid_config("series end does not fit a timestamp"))?;
        ValidityWindow::new(valid_from, valid_to, expiration)
    }

    /// The newest series that has started issuing by `now`.
    pub fn current_series(&self, now: Timestamp) -> Option<u32> {
        if now < self.genesis {
            return None;
        }
        u32::try_from((now - self.genesis) / self.half_period).ok()
    }
}

/// All live mints of a single instrument, keyed by series.
#[derive(Debug)]
pub struct MintRotation {
    instrument_definition_id: Identifier,
    mints: RwLock<BTreeMap<u32, Arc<Mint>>>,
}

impl MintRotation {
    pub fn new(instrument_definition_id: Identifier) -> Self {
        MintRotation {
            instrument_definition_id,
            mints: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn instrument_definition_id(&self) -> Identifier {
        self.instrument_definition_id
    }

    pub fn insert(&self, mint: Arc<Mint>) -> Result<()> {
        if mint.validity().is_none() {
            return Err(MintError::NotLoaded);
        }
        if let Some(received) = mint.instrument_definition_id() {
            if received != self.instrument_definition_id {
                return Err(MintError::IdentifierMismatch {
                    field: "instrument definition id",
                    expected: self.instrument_definition_id,
                    received,
                });
            }
        }

        let series = mint.series();
        let mut mints = self.mints.write();
        if let Some(latest) = mints.keys().next_back().copied() {
            if series <= latest {
                return Err(MintError::SeriesNotIncreasing {
                    latest,
                    received: series,
                });
            }
        }

        mints.insert(series, mint);
        info!(
            "series {series} of instrument {} is now part of the rotation",
            self.instrument_definition_id
        );
        Ok(())
    }

    pub fn latest_series(&self) -> Option<u32> {
        self.mints.read().keys().next_back().copied()
    }

    pub fn len(&self) -> usize {
        self.mints.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.mints.read().is_empty()
    }

    /// The newest mint currently allowed to issue tokens.
    pub fn issuing_mint(&self, now: Timestamp) -> Option<Arc<Mint>> {
        self.mints
            .read()
            .values()
            .rev()
            .find(|mint| mint.validity().is_some_and(|v| v.is_issuing_at(now)))
            .cloned()
    }

    /// The mint of `series`, provided its tokens are still redeemable.
    pub fn redeeming_mint(&self, series: u32, now: Timestamp) -> Option<Arc<Mint>> {
        let mints = self.mints.read();
        let mint = mints.get(&series)?;
        if mint.validity().is_some_and(|v| v.is_redeemable_at(now)) {
            Some(Arc::clone(mint))
        } else {
            debug!("series {series} is past its redemption window");
            None
        }
    }

    /// Mints whose tokens are redeemable at `now`.
    pub fn valid_series(&self, now: Timestamp) -> Vec<u32> {
        self.mints
            .read()
            .iter()
            .filter(|(_, mint)| {
                mint.validity()
                    .is_some_and(|v| v.valid_from() <= now && v.is_redeemable_at(now))
            })
            .map(|(series, _)| *series)
            .collect()
    }

    /// Forget every mint past its redemption window, returning how many were dropped.
    pub fn prune(&self, now: Timestamp) -> usize {
        let mut mints = self.mints.write();
        let before = mints.len();
        mints.retain(|_, mint| mint.validity().is_some_and(|v| v.is_redeemable_at(now)));
        let removed = before - mints.len();
        if removed > 0 {
            info!(
                "pruned {removed} stale series of instrument {}",
                self.instrument_definition_id
            );
        }
        removed
    }
}
