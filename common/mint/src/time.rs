// Copyright 2024 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::error::MintError;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, Ordering};
use time::OffsetDateTime;
use tracing::warn;

/// Unix timestamp, in seconds.
pub type Timestamp = i64;

pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        OffsetDateTime::now_utc().unix_timestamp()
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(now: Timestamp) -> Self {
        ManualClock {
            now: AtomicI64::new(now),
        }
    }

    pub fn set(&self, now: Timestamp) {
        self.now.store(now, Ordering::SeqCst)
    }

    pub fn advance(&self, seconds: i64) {
        self.now.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}

/// Validity window of a single mint series.
///
/// Tokens are issued in `[valid_from, expiration]` and redeemed up until
/// `valid_to`, so the public state of the mint does not reveal when a given
/// token would stop being accepted.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawValidityWindow")]
pub struct ValidityWindow {
    valid_from: Timestamp,
    valid_to: Timestamp,
    expiration: Timestamp,
}

#[derive(Deserialize)]
struct RawValidityWindow {
    valid_from: Timestamp,
    valid_to: Timestamp,
    expiration: Timestamp,
}

impl TryFrom<RawValidityWindow> for ValidityWindow {
    type Error = MintError;

    fn try_from(raw: RawValidityWindow) -> Result<Self, Self::Error> {
        ValidityWindow::new(raw.valid_from, raw.valid_to, raw.expiration)
    }
}

impl ValidityWindow {
    pub fn new(
        valid_from: Timestamp,
        valid_to: Timestamp,
        expiration: Timestamp,
    ) -> Result<Self, MintError> {
        if valid_from >= valid_to || expiration < valid_from || expiration > valid_to {
            return Err(MintError::InvalidValidityWindow {
                valid_from,
                valid_to,
                expiration,
            });
        }

        // widened so that windows spanning the whole timestamp range cannot overflow;
        // integer rounding puts the midpoint of an odd-length window off by one
        let midpoint = (i128::from(valid_from) + i128::from(valid_to)) / 2;
        if (i128::from(expiration) - midpoint).abs() > 1 {
            warn!(
                "mint expiration {expiration} is not halfway between {valid_from} and {valid_to} (expected around {midpoint})"
            );
        }

        Ok(ValidityWindow {
            valid_from,
            valid_to,
            expiration,
        })
    }

    pub fn valid_from(&self) -> Timestamp {
        self.valid_from
    }

    pub fn valid_to(&self) -> Timestamp {
        self.valid_to
    }

    pub fn expiration(&self) -> Timestamp {
        self.expiration
    }

    /// The boundary itself is still valid.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        now > self.expiration
    }

    pub fn is_issuing_at(&self, now: Timestamp) -> bool {
        now >= self.valid_from && !self.is_expired_at(now)
    }

    pub fn is_redeemable_at(&self, now: Timestamp) -> bool {
        now <= self.valid_to
    }
}
