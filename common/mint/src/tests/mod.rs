// Copyright 2024 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::authority::{SigningAuthority, DEFAULT_KEY_STRENGTH};
use crate::error::{ErrorKind, MintError};
use crate::identifier::Identifier;
use crate::mint::Mint;
use crate::rotation::{MintRotation, SeriesSchedule};
use crate::time::ManualClock;
use crate::tests::fixtures::*;
use cashmint_crypto::{EcdsaKeyExchange, Password, SessionKey};
use std::sync::Arc;
use std::thread;
use std::time::Duration;


#[test]
fn issued_tokens_stay_redeemable_after_expiration() {
    let mut rng = test_rng([1u8; 32]);
    let scenario = scenario_mint(&mut rng);

    let token = issue_token(&scenario, &mut rng, 20);
    scenario
        .mint
        .verify_token(&token, &token.cleartext(), 20)
        .unwrap();

    scenario.clock.set(SCENARIO_EXPIRATION + 1);
    assert!(scenario.mint.expired());

    let mut late = EcdsaToken::new(&mut rng);
    let err = scenario
        .mint
        .sign_token(&scenario.authority, &mut late, index_of(&scenario.mint, 20))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Expired);

    // redemption of the earlier token is still honoured until valid_to
    scenario
        .mint
        .verify_token(&token, &token.cleartext(), 20)
        .unwrap();
    scenario.clock.set(SCENARIO_VALID_TO);
    scenario
        .mint
        .verify_token(&token, &token.cleartext(), 20)
        .unwrap();

    scenario.clock.set(SCENARIO_VALID_TO + 1);
    let err = scenario
        .mint
        .verify_token(&token, &token.cleartext(), 20)
        .unwrap_err();
    assert!(matches!(err, MintError::RedemptionClosed { .. }));
    assert_eq!(err.kind(), ErrorKind::Expired);
}

#[test]
fn expiration_boundary_is_still_valid() {
    let mut rng = test_rng([2u8; 32]);
    let scenario = scenario_mint(&mut rng);

    scenario.clock.set(SCENARIO_EXPIRATION);
    assert!(!scenario.mint.expired());
    issue_token(&scenario, &mut rng, 1);

    scenario.clock.set(SCENARIO_EXPIRATION + 1);
    assert!(scenario.mint.expired());
}

#[test]
fn issuance_is_refused_before_the_window_opens() {
    let mut rng = test_rng([3u8; 32]);
    let scenario = scenario_mint(&mut rng);
    scenario.clock.set(SCENARIO_VALID_FROM - 1);

    let mut token = EcdsaToken::new(&mut rng);
    let err = scenario
        .mint
        .sign_token(&scenario.authority, &mut token, 0)
        .unwrap_err();
    assert!(matches!(err, MintError::NotYetValid { .. }));
}

#[test]
fn generated_mint_exposes_its_parameters() {
    let mut rng = test_rng([4u8; 32]);
    let scenario = scenario_mint(&mut rng);
    let mint = &scenario.mint;

    assert_eq!(mint.series(), SCENARIO_SERIES);
    assert_eq!(mint.valid_from(), Some(SCENARIO_VALID_FROM));
    assert_eq!(mint.valid_to(), Some(SCENARIO_VALID_TO));
    assert_eq!(mint.expiration(), Some(SCENARIO_EXPIRATION));
    assert_eq!(mint.denomination_count(), 3);
    assert_eq!(mint.notary_id(), Some(notary_id()));
    assert_eq!(mint.instrument_definition_id(), Some(instrument_definition_id()));
    assert_eq!(mint.server_nym_id(), Some(scenario.authority.nym_id()));
    assert_eq!(mint.cash_reserve_account(), None);

    for (index, value) in SCENARIO_DENOMINATIONS.iter().enumerate() {
        assert_eq!(mint.get_denomination(index), Some(*value));
        assert!(mint.get_public(*value).is_some());
        assert!(mint.get_private(*value).is_some());
    }
    assert_eq!(mint.get_denomination(3), None);
    assert_eq!(mint.get_public(2), None);

    let account = Identifier::from_contents(b"reserve account");
    mint.set_cash_reserve_account(account);
    assert_eq!(mint.cash_reserve_account(), Some(account));
}

#[test]
fn largest_denomination_selection() {
    let mut rng = test_rng([5u8; 32]);
    let authority = authority(&mut rng);
    let mint = Mint::new(notary_id(), instrument_definition_id());
    mint.generate_new_mint(
        1,
        scenario_window(),
        instrument_definition_id(),
        notary_id(),
        &authority,
        &[100, 1, 50, 5, 20],
    )
    .unwrap();

    assert_eq!(mint.get_largest_denomination(37), 20);
    assert_eq!(mint.get_largest_denomination(0), 0);
    assert_eq!(mint.get_largest_denomination(100), 100);
    assert_eq!(mint.get_largest_denomination(99), 50);
}

#[test]
fn failed_generation_leaves_no_partial_state() {
    let mut rng = test_rng([6u8; 32]);
    let authority = authority(&mut rng);
    let mint = Mint::new(notary_id(), instrument_definition_id());

    let too_many: Vec<_> = (1..=11).collect();
    let err = mint
        .generate_new_mint(
            1,
            scenario_window(),
            instrument_definition_id(),
            notary_id(),
            &authority,
            &too_many,
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert_eq!(mint.denomination_count(), 0);
    assert!(mint.validity().is_none());

    // keys the authority cannot produce fail the whole generation
    let err = Mint::new(notary_id(), instrument_definition_id())
        .with_key_strength(1024)
        .generate_new_mint(
            1,
            scenario_window(),
            instrument_definition_id(),
            notary_id(),
            &authority,
            &[1, 5],
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unsupported);

    let wrong_notary = mint
        .generate_new_mint(
            1,
            scenario_window(),
            instrument_definition_id(),
            Identifier::from_contents(b"another notary"),
            &authority,
            &[1, 5],
        )
        .unwrap_err();
    assert_eq!(wrong_notary.kind(), ErrorKind::InvalidInput);
    assert_eq!(mint.denomination_count(), 0);
}

#[test]
fn mint_is_only_generated_once() {
    let mut rng = test_rng([7u8; 32]);
    let scenario = scenario_mint(&mut rng);

    let err = scenario
        .mint
        .generate_new_mint(
            2,
            scenario_window(),
            instrument_definition_id(),
            notary_id(),
            &scenario.authority,
            &[1],
        )
        .unwrap_err();
    assert!(matches!(err, MintError::AlreadyGenerated { series: 1 }));
    assert_eq!(scenario.mint.denomination_count(), 3);
}

#[test]
fn duplicate_denomination_does_not_touch_the_existing_one() {
    let mut rng = test_rng([8u8; 32]);
    let scenario = scenario_mint(&mut rng);
    let before_public = scenario.mint.get_public(5);
    let before_private = scenario.mint.get_private(5);

    let err = scenario
        .mint
        .add_denomination(&scenario.authority, 5, DEFAULT_KEY_STRENGTH)
        .unwrap_err();
    assert!(matches!(err, MintError::DuplicateDenomination { value: 5 }));
    assert_eq!(scenario.mint.denomination_count(), 3);
    assert_eq!(scenario.mint.get_public(5), before_public);
    assert_eq!(scenario.mint.get_private(5), before_private);

    scenario
        .mint
        .add_denomination(&scenario.authority, 50, DEFAULT_KEY_STRENGTH)
        .unwrap();
    assert_eq!(scenario.mint.denomination_count(), 4);
    assert_eq!(scenario.mint.get_largest_denomination(60), 50);

    // the contents changed, yet the mint carries a valid signature
    scenario
        .mint
        .verify_mint(&scenario.authority.identity())
        .unwrap();
}

#[test]
fn verification_needs_no_private_keys() {
    let mut rng = test_rng([9u8; 32]);
    let scenario = scenario_mint(&mut rng);
    let token = issue_token(&scenario, &mut rng, 5);

    scenario.mint.erase_private_keys();
    assert!(scenario.mint.get_private(5).is_none());
    scenario
        .mint
        .verify_token(&token, &token.cleartext(), 5)
        .unwrap();

    // a public copy handed to someone else verifies just the same
    let public_copy = Mint::empty().with_clock(scenario.clock.clone());
    public_copy.load(&scenario.mint.save(false).unwrap()).unwrap();
    public_copy
        .verify_token(&token, &token.cleartext(), 5)
        .unwrap();

    let mut another = EcdsaToken::new(&mut rng);
    let err = public_copy
        .sign_token(&scenario.authority, &mut another, index_of(&public_copy, 5))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn token_verification_failures() {
    let mut rng = test_rng([10u8; 32]);
    let scenario = scenario_mint(&mut rng);
    let token = issue_token(&scenario, &mut rng, 5);

    // presented under the wrong denomination
    let err = scenario
        .mint
        .verify_token(&token, &token.cleartext(), 20)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CryptoFailure);

    let err = scenario
        .mint
        .verify_token(&token, &token.cleartext(), 7)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let mut forged = token.cleartext();
    forged[0] ^= 0xFF;
    assert!(scenario.mint.verify_token(&token, &forged, 5).is_err());

    assert!(scenario.mint.verify_token(&token, &[1, 2, 3], 5).is_err());
}

#[test]
fn signing_failures_are_typed() {
    let mut rng = test_rng([11u8; 32]);
    let scenario = scenario_mint(&mut rng);

    let mut token = EcdsaToken::new(&mut rng);
    let err = scenario
        .mint
        .sign_token(&scenario.authority, &mut token, 3)
        .unwrap_err();
    assert!(matches!(
        err,
        MintError::DenominationIndexOutOfRange { index: 3, count: 3 }
    ));
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = scenario
        .mint
        .sign_token(&scenario.authority, &mut RejectingToken, 0)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CryptoFailure);

    let stranger = authority(&mut rng);
    let err = scenario
        .mint
        .sign_token(&stranger, &mut token, 0)
        .unwrap_err();
    assert!(matches!(err, MintError::WrongSigningAuthority { .. }));

    // the mint keeps working after failed calls
    issue_token(&scenario, &mut rng, 1);
}

#[test]
fn undecryptable_keys_are_a_credential_failure() {
    let mut rng = test_rng([12u8; 32]);
    let scenario = scenario_mint(&mut rng);

    // denomination keys stay locked to the credential of the authority that
    // generated them
    let document = scenario.mint.save(true).unwrap();
    let other = authority_with_password(&mut rng, "other password");
    let mint = Mint::empty().with_clock(scenario.clock.clone());
    mint.load(&document).unwrap();

    let mut token = EcdsaToken::new(&mut rng);
    let err = mint.sign_token(&other, &mut token, 0).unwrap_err();
    // the loaded document is bound to the original server nym
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    let unbound =
        Mint::new(notary_id(), instrument_definition_id()).with_clock(scenario.clock.clone());
    let mut document: serde_json::Value = serde_json::from_str(&document).unwrap();
    document.as_object_mut().unwrap().remove("server_nym_id");
    document.as_object_mut().unwrap().remove("signature");
    unbound.load(&document.to_string()).unwrap();

    let err = unbound.sign_token(&other, &mut token, 0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CredentialFailure);
    assert!(unbound.verify_key_pairs(&other).is_err());
    unbound.verify_key_pairs(&scenario.authority).unwrap();
}

#[test]
fn saved_private_keys_only_when_requested() {
    let mut rng = test_rng([13u8; 32]);
    let scenario = scenario_mint(&mut rng);

    let public = scenario.mint.save(false).unwrap();
    assert!(!public.contains("\"private\""));
    // the choice does not stick to the mint
    let private = scenario.mint.save(true).unwrap();
    assert_eq!(private.matches("\"private\"").count(), 3);
    let public_again = scenario.mint.save(false).unwrap();
    assert_eq!(public, public_again);

    let restored =
        Mint::new(notary_id(), instrument_definition_id()).with_clock(scenario.clock.clone());
    restored.load(&private).unwrap();
    assert_eq!(restored.series(), scenario.mint.series());
    assert_eq!(restored.validity(), scenario.mint.validity());
    restored.verify_key_pairs(&scenario.authority).unwrap();
    restored
        .verify_mint(&scenario.authority.identity())
        .unwrap();

    let mut token = EcdsaToken::new(&mut rng);
    restored
        .sign_token(&scenario.authority, &mut token, 2)
        .unwrap();
    scenario
        .mint
        .verify_token(&token, &token.cleartext(), 20)
        .unwrap();
}

#[test]
fn loading_refuses_foreign_or_broken_documents() {
    let mut rng = test_rng([14u8; 32]);
    let scenario = scenario_mint(&mut rng);
    let document = scenario.mint.save(false).unwrap();

    let other_instrument = Mint::new(notary_id(), Identifier::from_contents(b"other instrument"));
    let err = other_instrument.load(&document).unwrap_err();
    assert!(matches!(err, MintError::IdentifierMismatch { .. }));
    assert!(other_instrument.validity().is_none());

    let loaded = Mint::empty();
    loaded.load(&document).unwrap();
    let err = loaded.load(&document).unwrap_err();
    assert!(matches!(err, MintError::AlreadyGenerated { .. }));

    let err = Mint::empty().load("not a mint").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Malformed);

    let mut tampered: serde_json::Value = serde_json::from_str(&document).unwrap();
    tampered["denominations"][0]["public"] = serde_json::Value::from("AAAA");
    let err = Mint::empty().load(&tampered.to_string()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Malformed);

    let mut miscounted: serde_json::Value = serde_json::from_str(&document).unwrap();
    miscounted["denomination_count"] = serde_json::Value::from(4);
    let err = Mint::empty().load(&miscounted.to_string()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Malformed);
}

#[test]
fn documents_with_extreme_windows_load_without_overflow() {
    let mut rng = test_rng([21u8; 32]);
    let scenario = scenario_mint(&mut rng);
    let document = scenario.mint.save(false).unwrap();

    let mut widest: serde_json::Value = serde_json::from_str(&document).unwrap();
    widest["validity"] = serde_json::json!({
        "valid_from": i64::MIN,
        "valid_to": i64::MAX,
        "expiration": 0,
    });
    let loaded = Mint::empty();
    loaded.load(&widest.to_string()).unwrap();
    assert_eq!(loaded.valid_from(), Some(i64::MIN));
    assert_eq!(loaded.valid_to(), Some(i64::MAX));

    // the signature was made over the original window
    let identity = scenario.authority.identity();
    assert_eq!(
        loaded.verify_mint(&identity).unwrap_err().kind(),
        ErrorKind::CryptoFailure
    );

    let mut inverted: serde_json::Value = serde_json::from_str(&document).unwrap();
    inverted["validity"] = serde_json::json!({
        "valid_from": i64::MAX,
        "valid_to": i64::MIN,
        "expiration": 0,
    });
    let err = Mint::empty().load(&inverted.to_string()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Malformed);
}

#[test]
fn mint_signature_covers_public_contents() {
    let mut rng = test_rng([15u8; 32]);
    let scenario = scenario_mint(&mut rng);
    let identity = scenario.authority.identity();

    assert!(scenario.mint.is_signed());
    scenario.mint.verify_mint(&identity).unwrap();

    // erasing private keys does not invalidate the signature
    scenario.mint.erase_private_keys();
    scenario.mint.verify_mint(&identity).unwrap();

    let stranger = authority(&mut rng);
    let err = scenario.mint.verify_mint(&stranger.identity()).unwrap_err();
    assert!(matches!(err, MintError::WrongSigningAuthority { .. }));

    let mut tampered: serde_json::Value =
        serde_json::from_str(&scenario.mint.save(false).unwrap()).unwrap();
    tampered["series"] = serde_json::Value::from(2);
    let forged = Mint::empty();
    forged.load(&tampered.to_string()).unwrap();
    let err = forged.verify_mint(&identity).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CryptoFailure);

    // re-signing by the rightful authority repairs it
    forged.sign_mint(&scenario.authority).unwrap();
    forged.verify_mint(&identity).unwrap();
}

#[test]
fn concurrent_issuance_and_verification() {
    let mut rng = test_rng([16u8; 32]);
    let scenario = scenario_mint(&mut rng);
    let issued = issue_token(&scenario, &mut rng, 20);
    let seeds: Vec<[u8; 32]> = (0..4u8).map(|i| [100 + i; 32]).collect();

    thread::scope(|s| {
        for seed in &seeds {
            let scenario = &scenario;
            s.spawn(move || {
                let mut rng = test_rng(*seed);
                for face_value in SCENARIO_DENOMINATIONS {
                    let token = issue_token(scenario, &mut rng, face_value);
                    scenario
                        .mint
                        .verify_token(&token, &token.cleartext(), face_value)
                        .unwrap();
                }
            });
        }

        s.spawn(|| {
            for _ in 0..10 {
                scenario
                    .mint
                    .verify_token(&issued, &issued.cleartext(), 20)
                    .unwrap();
            }
        });

        s.spawn(|| {
            scenario
                .mint
                .add_denomination(&scenario.authority, 100, DEFAULT_KEY_STRENGTH)
                .unwrap();
        });
    });

    assert_eq!(scenario.mint.denomination_count(), 4);
    scenario
        .mint
        .verify_mint(&scenario.authority.identity())
        .unwrap();
}

#[test]
fn rotation_hands_over_issuance_between_series() {
    let mut rng = test_rng([17u8; 32]);
    let authority = authority(&mut rng);
    let clock = Arc::new(ManualClock::new(1000));
    let schedule = SeriesSchedule::new(1000, Duration::from_secs(4000)).unwrap();
    let rotation = MintRotation::new(instrument_definition_id());

    let generate = |series: u32| {
        let mint = Mint::new(notary_id(), instrument_definition_id()).with_clock(clock.clone());
        mint.generate_new_mint(
            series,
            schedule.window_for(series).unwrap(),
            instrument_definition_id(),
            notary_id(),
            &authority,
            &[1, 5],
        )
        .unwrap();
        Arc::new(mint)
    };

    rotation.insert(generate(0)).unwrap();
    rotation.insert(generate(1)).unwrap();
    assert_eq!(rotation.latest_series(), Some(1));

    let err = rotation.insert(generate(1)).unwrap_err();
    assert!(matches!(err, MintError::SeriesNotIncreasing { latest: 1, received: 1 }));

    assert_eq!(rotation.issuing_mint(2000).unwrap().series(), 0);
    assert_eq!(rotation.issuing_mint(3500).unwrap().series(), 1);
    assert_eq!(rotation.valid_series(3500), vec![0, 1]);

    // series 0 stopped issuing but still redeems
    assert!(rotation.redeeming_mint(0, 4999).is_some());
    assert!(rotation.redeeming_mint(0, 5000).is_none());

    assert_eq!(rotation.prune(5000), 1);
    assert_eq!(rotation.len(), 1);
    assert!(rotation.issuing_mint(9000).is_none());

    let foreign = Mint::new(notary_id(), Identifier::from_contents(b"other instrument"));
    foreign
        .generate_new_mint(
            5,
            schedule.window_for(5).unwrap(),
            Identifier::from_contents(b"other instrument"),
            notary_id(),
            &authority,
            &[1],
        )
        .unwrap();
    assert!(rotation.insert(Arc::new(foreign)).is_err());
}

#[test]
fn denomination_keys_can_be_moved_to_a_peer() {
    let mut rng = test_rng([18u8; 32]);
    let scenario = scenario_mint(&mut rng);
    let peer = authority_with_password(&mut rng, "peer password");
    let provider = scenario.authority.provider();

    // the sender locks the saved mint under a fresh session key
    let session_password = Password::from("transport");
    let session_key =
        SessionKey::generate_with_rng(&mut rng, provider.key_cipher(), &session_password).unwrap();
    let document = scenario.mint.save(true).unwrap();
    let sealed = session_key
        .seal(provider.key_cipher(), &session_password, document.as_bytes())
        .unwrap();

    // and hands the session key over to the peer through ECDH
    let (_, wrapped) = provider
        .wrap_session_key(
            scenario.authority.identity_record(),
            &peer.identity().public_key.to_bytes(),
            &Password::from(AUTHORITY_PASSWORD),
            &session_key,
            &session_password,
        )
        .unwrap();

    let unlocked = peer
        .provider()
        .unwrap_session_key(
            &scenario.authority.identity().public_key.to_bytes(),
            peer.identity_record(),
            &Password::from("peer password"),
            &wrapped,
        )
        .unwrap();
    let relocked = SessionKey::from_key_bytes(
        peer.provider().key_cipher(),
        unlocked.as_bytes(),
        &Password::from("peer session"),
    )
    .unwrap();

    let opened = relocked
        .open(
            peer.provider().key_cipher(),
            &Password::from("peer session"),
            &sealed,
        )
        .unwrap();
    let received = Mint::empty();
    received
        .load(std::str::from_utf8(&opened).unwrap())
        .unwrap();
    assert_eq!(received.denomination_count(), 3);
    received
        .verify_mint(&scenario.authority.identity())
        .unwrap();
}
