// Copyright 2024 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::authority::{PublicIdentity, SigningAuthority, DEFAULT_KEY_STRENGTH};
use crate::denomination::{
    validate_denomination_values, Amount, DenominationKeySet, Denominations,
};
use crate::error::{MintError, Result};
use crate::identifier::Identifier;
use crate::persistence::{DenominationEntry, MintDocument, MINT_DOCUMENT_VERSION};
use crate::time::{Clock, SystemClock, Timestamp, ValidityWindow};
use crate::token::{DenominationContext, Token};
use cashmint_crypto::asymmetric::secp256k1::Signature;
use cashmint_crypto::Armored;
use parking_lot::RwLock;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default)]
struct MintState {
    notary_id: Option<Identifier>,
    server_nym_id: Option<Identifier>,
    instrument_definition_id: Option<Identifier>,
    cash_account_id: Option<Identifier>,
    series: u32,

    /// Present once the mint got generated or loaded.
    validity: Option<ValidityWindow>,
    denominations: Denominations,
    signature: Option<Signature>,
}

impl MintState {
    fn validity(&self) -> Result<ValidityWindow> {
        self.validity.ok_or(MintError::NotLoaded)
    }

    fn ensure_not_generated(&self) -> Result<()> {
        if self.validity.is_some() {
            return Err(MintError::AlreadyGenerated {
                series: self.series,
            });
        }
        Ok(())
    }

    fn ensure_addressed(
        &self,
        notary_id: Identifier,
        instrument_definition_id: Identifier,
    ) -> Result<()> {
        ensure_same("notary id", self.notary_id, notary_id)?;
        ensure_same(
            "instrument definition id",
            self.instrument_definition_id,
            instrument_definition_id,
        )
    }

    fn ensure_authority(&self, authority: &dyn SigningAuthority) -> Result<()> {
        match self.server_nym_id {
            Some(expected) if expected != authority.nym_id() => {
                Err(MintError::WrongSigningAuthority {
                    expected,
                    received: authority.nym_id(),
                })
            }
            _ => Ok(()),
        }
    }

    fn context(&self, face_value: Amount) -> Result<DenominationContext> {
        Ok(DenominationContext {
            instrument_definition_id: self
                .instrument_definition_id
                .ok_or(MintError::NotLoaded)?,
            series: self.series,
            face_value,
        })
    }

    fn to_document(&self, include_private_keys: bool) -> Result<MintDocument> {
        let (Some(notary_id), Some(instrument_definition_id)) =
            (self.notary_id, self.instrument_definition_id)
        else {
            return Err(MintError::NotLoaded);
        };

        let denominations = self
            .denominations
            .iter()
            .map(|key_set| DenominationEntry {
                value: key_set.face_value(),
                public: key_set.public_armor().clone(),
                private: if include_private_keys {
                    key_set.private_armor().cloned()
                } else {
                    None
                },
            })
            .collect::<Vec<_>>();

        Ok(MintDocument {
            version: MINT_DOCUMENT_VERSION,
            notary_id,
            server_nym_id: self.server_nym_id,
            instrument_definition_id,
            cash_account_id: self.cash_account_id,
            series: self.series,
            validity: self.validity()?,
            denomination_count: denominations.len(),
            denominations,
            signature: self.signature.as_ref().map(MintDocument::encode_signature),
        })
    }

    fn signing_payload(&self) -> Result<Vec<u8>> {
        self.to_document(false)?.signing_payload()
    }

    /// Replace the signature with a fresh one over the current contents.
    fn sign(&mut self, authority: &dyn SigningAuthority) -> Result<()> {
        let payload = self.signing_payload()?;
        self.signature = Some(authority.sign(&payload)?);
        Ok(())
    }
}

fn ensure_same(
    field: &'static str,
    expected: Option<Identifier>,
    received: Identifier,
) -> Result<()> {
    match expected {
        Some(expected) if expected != received => Err(MintError::IdentifierMismatch {
            field,
            expected,
            received,
        }),
        _ => Ok(()),
    }
}

/// Issuing authority of one instrument for one series.
///
/// All state lives behind a readers-writer lock: issuance and verification
/// only read, key generation, loading and erasure write.
pub struct Mint {
    state: RwLock<MintState>,
    clock: Arc<dyn Clock>,
    key_strength: u32,
}

impl Debug for Mint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("Mint")
            .field("notary_id", &state.notary_id)
            .field("instrument_definition_id", &state.instrument_definition_id)
            .field("series", &state.series)
            .field("validity", &state.validity)
            .field("denominations", &state.denominations.len())
            .finish_non_exhaustive()
    }
}

impl Mint {
    fn with_state(state: MintState) -> Self {
        Mint {
            state: RwLock::new(state),
            clock: Arc::new(SystemClock),
            key_strength: DEFAULT_KEY_STRENGTH,
        }
    }

    /// Mint without any identifiers, to be populated by [`Mint::load`].
    pub fn empty() -> Self {
        Self::with_state(MintState::default())
    }

    pub fn new(notary_id: Identifier, instrument_definition_id: Identifier) -> Self {
        Self::with_state(MintState {
            notary_id: Some(notary_id),
            instrument_definition_id: Some(instrument_definition_id),
            ..Default::default()
        })
    }

    pub fn new_with_server(
        notary_id: Identifier,
        server_nym_id: Identifier,
        instrument_definition_id: Identifier,
    ) -> Self {
        Self::with_state(MintState {
            notary_id: Some(notary_id),
            server_nym_id: Some(server_nym_id),
            instrument_definition_id: Some(instrument_definition_id),
            ..Default::default()
        })
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Strength of the keys produced for new denominations.
    #[must_use]
    pub fn with_key_strength(mut self, key_strength: u32) -> Self {
        self.key_strength = key_strength;
        self
    }

    /// Populate the mint with a series, its validity window and the initial
    /// denominations.
    ///
    /// All keys are created before the state is touched, so observers either
    /// see the complete new series or the previous state.
    pub fn generate_new_mint(
        &self,
        series: u32,
        validity: ValidityWindow,
        instrument_definition_id: Identifier,
        notary_id: Identifier,
        authority: &dyn SigningAuthority,
        denomination_values: &[Amount],
    ) -> Result<()> {
        validate_denomination_values(denomination_values)?;
        {
            let state = self.state.read();
            state.ensure_not_generated()?;
            state.ensure_addressed(notary_id, instrument_definition_id)?;
            state.ensure_authority(authority)?;
        }

        let mut denominations = Denominations::default();
        for value in denomination_values {
            let key_set = DenominationKeySet::generate(authority, *value, self.key_strength)?;
            denominations.insert(key_set)?;
        }

        let mut state = self.state.write();
        // re-check: another caller might have won the race while keys were generated
        state.ensure_not_generated()?;
        state.ensure_addressed(notary_id, instrument_definition_id)?;
        state.ensure_authority(authority)?;

        let mut generated = MintState {
            notary_id: Some(notary_id),
            server_nym_id: Some(authority.nym_id()),
            instrument_definition_id: Some(instrument_definition_id),
            cash_account_id: state.cash_account_id,
            series,
            validity: Some(validity),
            denominations,
            signature: None,
        };
        generated.sign(authority)?;
        *state = generated;

        info!(
            "generated series {series} of instrument {instrument_definition_id} with {} denominations",
            denomination_values.len()
        );
        Ok(())
    }

    pub fn add_denomination(
        &self,
        authority: &dyn SigningAuthority,
        face_value: Amount,
        key_strength: u32,
    ) -> Result<()> {
        {
            let state = self.state.read();
            state.validity()?;
            state.ensure_authority(authority)?;
            if state.denominations.contains(face_value) {
                return Err(MintError::DuplicateDenomination { value: face_value });
            }
        }

        let key_set = DenominationKeySet::generate(authority, face_value, key_strength)?;

        let mut state = self.state.write();
        let mut updated = state.clone();
        updated.denominations.insert(key_set)?;
        updated.sign(authority)?;
        *state = updated;

        info!(
            "added denomination {face_value} to series {} of instrument {:?}",
            state.series, state.instrument_definition_id
        );
        Ok(())
    }

    pub fn get_largest_denomination(&self, amount: Amount) -> Amount {
        self.state.read().denominations.largest_at_most(amount)
    }

    /// Blind sign the token with the key of the denomination at `denomination_index`
    /// (ordered by face value) and return the serialized response.
    pub fn sign_token(
        &self,
        authority: &dyn SigningAuthority,
        token: &mut dyn Token,
        denomination_index: usize,
    ) -> Result<Vec<u8>> {
        let now = self.clock.now();
        let state = self.state.read();
        let validity = state.validity()?;

        if validity.is_expired_at(now) {
            return Err(MintError::Expired {
                series: state.series,
                expiration: validity.expiration(),
                now,
            });
        }
        if now < validity.valid_from() {
            return Err(MintError::NotYetValid {
                series: state.series,
                valid_from: validity.valid_from(),
                now,
            });
        }
        state.ensure_authority(authority)?;

        let key_set = state
            .denominations
            .get_by_index(denomination_index)
            .ok_or(MintError::DenominationIndexOutOfRange {
                index: denomination_index,
                count: state.denominations.len(),
            })?;

        let private_key = key_set.unlock(authority).map_err(|err| {
            warn!(
                "could not unlock the key of denomination {}: {err}",
                key_set.face_value()
            );
            err
        })?;

        let context = state.context(key_set.face_value())?;
        let response = token.blind_sign(&private_key, &context)?;

        info!(
            "issued a token of denomination {} in series {}",
            key_set.face_value(),
            state.series
        );
        Ok(response)
    }

    /// Check a token presented for deposit against the public key of the
    /// denomination worth `face_value`.
    pub fn verify_token(
        &self,
        token: &dyn Token,
        cleartext: &[u8],
        face_value: Amount,
    ) -> Result<()> {
        let now = self.clock.now();
        let state = self.state.read();
        let validity = state.validity()?;

        if !validity.is_redeemable_at(now) {
            return Err(MintError::RedemptionClosed {
                series: state.series,
                valid_to: validity.valid_to(),
                now,
            });
        }

        let Some(key_set) = state.denominations.get(face_value) else {
            debug!("no denomination worth {face_value} in series {}", state.series);
            return Err(MintError::UnknownDenomination { value: face_value });
        };

        let public_key = key_set.public_key()?;
        let context = state.context(face_value)?;
        if !token.verify(cleartext, &public_key, &context)? {
            return Err(MintError::TokenRejected { value: face_value });
        }
        Ok(())
    }

    pub fn sign_mint(&self, authority: &dyn SigningAuthority) -> Result<()> {
        let mut state = self.state.write();
        state.ensure_authority(authority)?;
        state.sign(authority)
    }

    /// Check that the mint was signed by the given server identity.
    pub fn verify_mint(&self, identity: &PublicIdentity) -> Result<()> {
        let state = self.state.read();
        if let Some(expected) = state.server_nym_id {
            if expected != identity.nym_id {
                return Err(MintError::WrongSigningAuthority {
                    expected,
                    received: identity.nym_id,
                });
            }
        }

        let signature = state.signature.ok_or(MintError::MissingSignature)?;
        let payload = state.signing_payload()?;
        identity
            .public_key
            .verify(&payload, &signature)
            .map_err(|_| MintError::InvalidMintSignature {
                nym_id: identity.nym_id,
            })
    }

    /// Check that every private key held by the mint belongs to its
    /// published public key.
    pub fn verify_key_pairs(&self, authority: &dyn SigningAuthority) -> Result<()> {
        let state = self.state.read();
        for key_set in state.denominations.iter().filter(|k| k.has_private_key()) {
            key_set.unlock(authority)?;
        }
        Ok(())
    }

    /// Drop every private key, leaving a copy fit for public distribution.
    pub fn erase_private_keys(&self) {
        self.state.write().denominations.erase_private_keys()
    }

    pub fn expired(&self) -> bool {
        let now = self.clock.now();
        self.state
            .read()
            .validity
            .is_some_and(|validity| validity.is_expired_at(now))
    }

    pub fn save(&self, include_private_keys: bool) -> Result<String> {
        let document = self.state.read().to_document(include_private_keys)?;
        if document.includes_private_keys() {
            info!(
                "serializing series {} of instrument {} including private keys",
                document.series, document.instrument_definition_id
            );
        }
        document.to_json()
    }

    pub fn load(&self, raw: &str) -> Result<()> {
        let document = MintDocument::from_json(raw)?;
        document.validate()?;
        let signature = document.decode_signature()?;

        let mut denominations = Denominations::default();
        for entry in document.denominations {
            let key_set = DenominationKeySet::from_armor(entry.value, entry.public, entry.private);
            key_set.public_key().map_err(|err| {
                MintError::malformed(format!("denomination {}: {err}", entry.value))
            })?;
            denominations.insert(key_set)?;
        }

        let mut state = self.state.write();
        state.ensure_not_generated()?;
        state.ensure_addressed(document.notary_id, document.instrument_definition_id)?;
        if let Some(server_nym_id) = document.server_nym_id {
            ensure_same("server nym id", state.server_nym_id, server_nym_id)?;
        }

        *state = MintState {
            notary_id: Some(document.notary_id),
            server_nym_id: document.server_nym_id.or(state.server_nym_id),
            instrument_definition_id: Some(document.instrument_definition_id),
            cash_account_id: document.cash_account_id,
            series: document.series,
            validity: Some(document.validity),
            denominations,
            signature,
        };

        debug!(
            "loaded series {} of instrument {} with {} denominations",
            document.series,
            document.instrument_definition_id,
            state.denominations.len()
        );
        Ok(())
    }

    pub fn notary_id(&self) -> Option<Identifier> {
        self.state.read().notary_id
    }

    pub fn server_nym_id(&self) -> Option<Identifier> {
        self.state.read().server_nym_id
    }

    pub fn instrument_definition_id(&self) -> Option<Identifier> {
        self.state.read().instrument_definition_id
    }

    pub fn cash_reserve_account(&self) -> Option<Identifier> {
        self.state.read().cash_account_id
    }

    /// Reference the ledger account backing the tokens of this mint.
    pub fn set_cash_reserve_account(&self, account_id: Identifier) {
        self.state.write().cash_account_id = Some(account_id)
    }

    pub fn series(&self) -> u32 {
        self.state.read().series
    }

    pub fn validity(&self) -> Option<ValidityWindow> {
        self.state.read().validity
    }

    pub fn valid_from(&self) -> Option<Timestamp> {
        self.validity().map(|validity| validity.valid_from())
    }

    pub fn valid_to(&self) -> Option<Timestamp> {
        self.validity().map(|validity| validity.valid_to())
    }

    pub fn expiration(&self) -> Option<Timestamp> {
        self.validity().map(|validity| validity.expiration())
    }

    pub fn denomination_count(&self) -> usize {
        self.state.read().denominations.len()
    }

    /// Face value of the denomination at `index`, ordered by value.
    pub fn get_denomination(&self, index: usize) -> Option<Amount> {
        self.state
            .read()
            .denominations
            .get_by_index(index)
            .map(DenominationKeySet::face_value)
    }

    pub fn get_public(&self, face_value: Amount) -> Option<Armored> {
        self.state
            .read()
            .denominations
            .get(face_value)
            .map(|key_set| key_set.public_armor().clone())
    }

    pub fn get_private(&self, face_value: Amount) -> Option<Armored> {
        self.state
            .read()
            .denominations
            .get(face_value)
            .and_then(|key_set| key_set.private_armor().cloned())
    }

    pub fn is_signed(&self) -> bool {
        self.state.read().signature.is_some()
    }
}
