// Copyright 2024 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroizing;

pub use hkdf::InvalidLength;

/// Perform HKDF-SHA256 extract then expand as a single step.
pub fn extract_then_expand(
    salt: Option<&[u8]>,
    ikm: &[u8],
    info: Option<&[u8]>,
    okm_length: usize,
) -> Result<Zeroizing<Vec<u8>>, InvalidLength> {
    // `info` is used to bind the derived key to an application context
    let hkdf = Hkdf::<Sha256>::new(salt, ikm);
    let mut okm = Zeroizing::new(vec![0u8; okm_length]);
    hkdf.expand(info.unwrap_or(&[]), &mut okm)?;

    Ok(okm)
}
