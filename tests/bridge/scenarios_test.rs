// Home Bridge Scenario Tests
// End-to-end flows through the bridge facade in both directions

use home_bridge::bridge::{
    AffirmationStatus, BridgeConfig, BridgeError, BridgeEvent, HomeBridge, SignatureStatus,
};
use home_bridge::consensus::{is_already_processed, ClaimKey, TxHash};
use home_bridge::gateway::{ForwardNotice, InMemoryToken};
use home_bridge::identity::{Address, Keypair, Signer};
use home_bridge::limits::{LimitsConfig, ManualClock, ReleaseDecision, UNIT};
use home_bridge::relay::{MessageHash, ReleaseMessage};
use home_bridge::validators::ValidatorSet;
use std::sync::Arc;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

const OWNER: Address = Address::from_bytes([0x0e; 20]);
const BRIDGE_ID: Address = Address::from_bytes([0xb1; 20]);
const TOKEN: Address = Address::from_bytes([0xaa; 20]);
const RECIPIENT: Address = Address::from_bytes([0x05; 20]);

struct Fixture {
    bridge: HomeBridge,
    keys: Vec<Keypair>,
    registry: Arc<ValidatorSet>,
    token: Arc<InMemoryToken>,
    clock: Arc<ManualClock>,
}

impl Fixture {
    fn validator(&self, index: usize) -> Address {
        self.keys[index].address()
    }

    fn affirm(
        &self,
        index: usize,
        amount: u128,
        tx: TxHash,
    ) -> Result<AffirmationStatus, BridgeError> {
        self.bridge.affirm(&self.validator(index), RECIPIENT, amount, tx)
    }

    fn sign(&self, index: usize, raw: &[u8]) -> Result<SignatureStatus, BridgeError> {
        let signature = Signer::sign(&self.keys[index], raw);
        self.bridge
            .submit_signature(&self.validator(index), signature.as_bytes(), raw)
    }
}

/// daily 1, max 0.5, min 0.01 in both directions
fn half_unit_limits() -> LimitsConfig {
    LimitsConfig::new()
        .with_daily_limit(UNIT)
        .with_max_per_tx(UNIT / 2)
        .with_min_per_tx(UNIT / 100)
        .with_execution_daily_limit(UNIT)
        .with_execution_max_per_tx(UNIT / 2)
}

fn setup(validators: usize, required: u32, limits: LimitsConfig) -> Fixture {
    let keys: Vec<Keypair> = (0..validators).map(|_| Keypair::generate()).collect();
    let registry =
        Arc::new(ValidatorSet::new(keys.iter().map(Keypair::address), required).unwrap());
    let token = Arc::new(InMemoryToken::new(TOKEN));
    let clock = Arc::new(ManualClock::new(1_700_000_000));

    let config = BridgeConfig::new()
        .with_validators(registry.clone())
        .with_token(token.clone())
        .with_limits(limits)
        .with_owner(OWNER)
        .with_bridge_id(BRIDGE_ID)
        .with_clock(clock.clone());

    Fixture {
        bridge: HomeBridge::initialize(config).unwrap(),
        keys,
        registry,
        token,
        clock,
    }
}

fn tx(byte: u8) -> TxHash {
    TxHash::from_bytes([byte; 32])
}

// ============================================================================
// INITIALIZATION
// ============================================================================

#[test]
fn test_initialize_rejects_incomplete_config() {
    let registry = Arc::new(ValidatorSet::new([Address::from_bytes([1; 20])], 1).unwrap());
    let token = Arc::new(InMemoryToken::new(TOKEN));

    let missing_token = BridgeConfig::new()
        .with_validators(registry.clone())
        .with_owner(OWNER)
        .with_bridge_id(BRIDGE_ID);
    assert!(matches!(
        HomeBridge::initialize(missing_token),
        Err(BridgeError::Validation(_))
    ));

    let zero_owner = BridgeConfig::new()
        .with_validators(registry.clone())
        .with_token(token.clone())
        .with_bridge_id(BRIDGE_ID);
    assert!(matches!(
        HomeBridge::initialize(zero_owner),
        Err(BridgeError::Validation(_))
    ));

    let bad_limits = BridgeConfig::new()
        .with_validators(registry)
        .with_token(token)
        .with_owner(OWNER)
        .with_bridge_id(BRIDGE_ID)
        .with_limits(LimitsConfig::default().with_max_per_tx(0));
    assert!(matches!(
        HomeBridge::initialize(bad_limits),
        Err(BridgeError::Validation(_))
    ));
}

#[test]
fn test_initial_settings() {
    let f = setup(3, 2, half_unit_limits());

    assert_eq!(f.bridge.owner(), OWNER);
    assert_eq!(f.bridge.bridge_id(), BRIDGE_ID);
    assert_eq!(f.bridge.required_signatures(), 2);
    assert_eq!(f.bridge.limits(), half_unit_limits());
    assert_eq!(f.bridge.gas_price(), 1_000_000_000);
    assert_eq!(f.bridge.required_block_confirmations(), 8);
    assert_eq!(f.bridge.forwarding_address(), None);
    assert_eq!(HomeBridge::required_message_length(), 104);
}

// ============================================================================
// INBOUND: AFFIRMATIONS
// ============================================================================

#[test]
fn test_daily_limit_defers_third_release() {
    let f = setup(1, 1, half_unit_limits());

    assert_eq!(f.affirm(0, UNIT / 2, tx(1)).unwrap(), AffirmationStatus::Released);
    assert_eq!(f.bridge.inbound_spent_today(), UNIT / 2);
    assert_eq!(f.affirm(0, UNIT / 2, tx(2)).unwrap(), AffirmationStatus::Released);
    assert_eq!(f.bridge.inbound_spent_today(), UNIT);
    assert_eq!(f.affirm(0, UNIT / 2, tx(3)).unwrap(), AffirmationStatus::Deferred);

    assert_eq!(f.bridge.out_of_limit_amount(), UNIT / 2);
    assert_eq!(f.token.balance_of(&RECIPIENT), UNIT);
    assert_eq!(f.bridge.remaining_out_of_limit(&tx(3)), UNIT / 2);
}

#[test]
fn test_duplicate_vote_then_quorum() {
    let f = setup(3, 2, half_unit_limits());
    let key = ClaimKey::derive(&RECIPIENT, UNIT / 4, &tx(1));

    assert_eq!(
        f.affirm(0, UNIT / 4, tx(1)).unwrap(),
        AffirmationStatus::Pending { votes: 1 }
    );
    assert_eq!(
        f.affirm(0, UNIT / 4, tx(1)),
        Err(BridgeError::DuplicateVote(f.validator(0)))
    );
    assert_eq!(f.affirm(1, UNIT / 4, tx(1)).unwrap(), AffirmationStatus::Released);

    let raw = f.bridge.num_affirmations_signed(&key);
    assert!(is_already_processed(raw));
    assert!(f.bridge.affirmations_signed(&f.validator(0), &key));
    assert!(!f.bridge.affirmations_signed(&f.validator(2), &key));
    assert_eq!(f.bridge.claim(&key).unwrap().votes(), 2);
}

#[test]
fn test_threshold_raised_mid_claim() {
    let f = setup(3, 2, half_unit_limits());

    f.affirm(0, UNIT / 4, tx(1)).unwrap();
    f.registry.set_required_signatures(3).unwrap();

    assert_eq!(
        f.affirm(1, UNIT / 4, tx(1)).unwrap(),
        AffirmationStatus::Pending { votes: 2 }
    );
    assert_eq!(f.affirm(2, UNIT / 4, tx(1)).unwrap(), AffirmationStatus::Released);
    assert_eq!(f.token.balance_of(&RECIPIENT), UNIT / 4);
}

#[test]
fn test_reconcile_errors() {
    let f = setup(1, 1, half_unit_limits());

    assert_eq!(
        f.bridge.fix_assets_above_limits(&OWNER, tx(9), false, 1),
        Err(BridgeError::UnknownOrExhausted(tx(9)))
    );

    f.affirm(0, UNIT, tx(1)).unwrap();
    assert_eq!(
        f.bridge.fix_assets_above_limits(&OWNER, tx(1), false, UNIT + 1),
        Err(BridgeError::ExceedsRemaining {
            requested: UNIT + 1,
            remaining: UNIT
        })
    );
    assert_eq!(f.bridge.remaining_out_of_limit(&tx(1)), UNIT);
}

#[test]
fn test_zero_amount_released_immediately() {
    let f = setup(1, 1, half_unit_limits());
    f.bridge.take_events();

    assert_eq!(f.affirm(0, 0, tx(1)).unwrap(), AffirmationStatus::Released);
    assert_eq!(f.bridge.inbound_spent_today(), 0);
    assert!(f.bridge.take_events().contains(&BridgeEvent::AffirmationCompleted {
        recipient: RECIPIENT,
        amount: 0,
        external_tx_id: tx(1),
        decision: ReleaseDecision::Released,
    }));
}

#[test]
fn test_replay_of_finalized_claim_rejected() {
    let f = setup(2, 1, half_unit_limits());

    f.affirm(0, UNIT / 4, tx(1)).unwrap();
    assert_eq!(f.affirm(0, UNIT / 4, tx(1)), Err(BridgeError::AlreadyProcessed));
    assert_eq!(f.affirm(1, UNIT / 4, tx(1)), Err(BridgeError::AlreadyProcessed));
    assert_eq!(f.token.balance_of(&RECIPIENT), UNIT / 4);
}

#[test]
fn test_non_validator_cannot_affirm() {
    let f = setup(1, 1, half_unit_limits());
    let outsider = Address::from_bytes([0x77; 20]);

    assert!(matches!(
        f.bridge.affirm(&outsider, RECIPIENT, 1, tx(1)),
        Err(BridgeError::Authorization(_))
    ));
    assert!(f.bridge.events().is_empty());
}

#[test]
fn test_affirmation_events_in_order() {
    let f = setup(2, 2, half_unit_limits());

    f.affirm(0, UNIT, tx(1)).unwrap();
    f.affirm(1, UNIT, tx(1)).unwrap();

    assert_eq!(
        f.bridge.take_events(),
        vec![
            BridgeEvent::SignedForAffirmation {
                signer: f.validator(0),
                external_tx_id: tx(1)
            },
            BridgeEvent::SignedForAffirmation {
                signer: f.validator(1),
                external_tx_id: tx(1)
            },
            BridgeEvent::AffirmationCompleted {
                recipient: RECIPIENT,
                amount: UNIT,
                external_tx_id: tx(1),
                decision: ReleaseDecision::Deferred
            },
            BridgeEvent::AmountLimitExceeded {
                recipient: RECIPIENT,
                amount: UNIT,
                external_tx_id: tx(1)
            },
        ]
    );
    assert!(f.bridge.take_events().is_empty());
}

#[test]
fn test_day_rollover_releases_again() {
    let f = setup(1, 1, half_unit_limits());

    f.affirm(0, UNIT / 2, tx(1)).unwrap();
    f.affirm(0, UNIT / 2, tx(2)).unwrap();
    assert_eq!(f.affirm(0, UNIT / 2, tx(3)).unwrap(), AffirmationStatus::Deferred);

    f.clock.advance_days(1);
    assert_eq!(f.bridge.inbound_spent_today(), 0);
    assert_eq!(f.affirm(0, UNIT / 2, tx(4)).unwrap(), AffirmationStatus::Released);
    assert_eq!(f.bridge.out_of_limit_amount(), UNIT / 2);
}

#[test]
fn test_forwarded_release() {
    let f = setup(1, 1, half_unit_limits());
    let forwarder = Address::from_bytes([0xf0; 20]);
    f.bridge.set_forwarding_address(&OWNER, Some(forwarder)).unwrap();

    f.affirm(0, UNIT / 4, tx(1)).unwrap();

    assert_eq!(f.token.balance_of(&forwarder), UNIT / 4);
    assert_eq!(f.token.balance_of(&RECIPIENT), 0);
    assert_eq!(
        f.token.notices(),
        vec![ForwardNotice {
            forwarder,
            recipient: RECIPIENT,
            amount: UNIT / 4
        }]
    );
}

// ============================================================================
// OVERFLOW RECONCILIATION
// ============================================================================

#[test]
fn test_reconcile_in_parts() {
    let f = setup(1, 1, half_unit_limits());
    f.affirm(0, UNIT, tx(1)).unwrap();

    assert_eq!(
        f.bridge.fix_assets_above_limits(&OWNER, tx(1), false, UNIT / 4).unwrap(),
        3 * UNIT / 4
    );
    assert_eq!(f.bridge.out_of_limit_amount(), 3 * UNIT / 4);
    assert_eq!(
        f.bridge.fix_assets_above_limits(&OWNER, tx(1), false, 3 * UNIT / 4).unwrap(),
        0
    );
    assert_eq!(f.bridge.out_of_limit_amount(), 0);
    assert_eq!(
        f.bridge.fix_assets_above_limits(&OWNER, tx(1), false, 1),
        Err(BridgeError::UnknownOrExhausted(tx(1)))
    );
    // deferred funds are never credited here
    assert_eq!(f.token.balance_of(&RECIPIENT), 0);
}

#[test]
fn test_reconcile_forward_raises_release_request() {
    let f = setup(1, 1, half_unit_limits());
    f.affirm(0, 2 * UNIT, tx(1)).unwrap();
    f.bridge.take_events();

    // forwarding ignores the outbound window
    f.bridge.fix_assets_above_limits(&OWNER, tx(1), true, 2 * UNIT).unwrap();

    let events = f.bridge.take_events();
    assert_eq!(
        events[0],
        BridgeEvent::AssetAboveLimitsFixed {
            external_tx_id: tx(1),
            released: 2 * UNIT,
            remaining: 0
        }
    );
    match &events[1] {
        BridgeEvent::UserRequestForSignature {
            recipient,
            amount,
            message,
            ..
        } => {
            assert_eq!(*recipient, RECIPIENT);
            assert_eq!(*amount, 2 * UNIT);
            let decoded = ReleaseMessage::decode(message).unwrap();
            assert_eq!(decoded.bridge_id(), &BRIDGE_ID);
            assert_eq!(decoded.amount(), 2 * UNIT);
        }
        other => panic!("unexpected event {:?}", other),
    }
    assert_eq!(f.bridge.outbound_spent_today(), 0);
}

#[test]
fn test_reconcile_requires_owner() {
    let f = setup(1, 1, half_unit_limits());
    f.affirm(0, UNIT, tx(1)).unwrap();

    assert!(matches!(
        f.bridge.fix_assets_above_limits(&f.validator(0), tx(1), false, 1),
        Err(BridgeError::Authorization(_))
    ));
    assert_eq!(f.bridge.remaining_out_of_limit(&tx(1)), UNIT);
}

// ============================================================================
// OUTBOUND: DEPOSITS AND SIGNATURES
// ============================================================================

#[test]
fn test_deposit_to_collected_bundle() {
    let f = setup(3, 2, half_unit_limits());
    let depositor = Address::from_bytes([0x0d; 20]);

    let message = f
        .bridge
        .on_inbound_notification(&TOKEN, depositor, UNIT / 4, &[])
        .unwrap();
    assert_eq!(message.recipient(), &depositor);
    assert_eq!(message.bridge_id(), &BRIDGE_ID);
    assert_eq!(f.bridge.outbound_spent_today(), UNIT / 4);

    let raw = message.encode();
    let hash = message.hash();
    assert_eq!(
        f.sign(0, &raw).unwrap(),
        SignatureStatus::Pending { signatures: 1 }
    );
    assert!(f.bridge.relay_bundle(&hash).is_none());
    assert_eq!(
        f.sign(2, &raw).unwrap(),
        SignatureStatus::Collected {
            responsible: f.validator(2)
        }
    );

    assert!(is_already_processed(f.bridge.num_messages_signed(&hash)));
    assert!(f.bridge.message_signed_by(&f.validator(2), &hash));
    assert_eq!(f.sign(1, &raw), Err(BridgeError::AlreadyProcessed));

    let bundle = f.bridge.relay_bundle(&hash).unwrap();
    assert_eq!(bundle.message(), raw.as_slice());
    assert_eq!(bundle.signatures().len(), 2);
    assert_eq!(bundle.responsible(), Some(&f.validator(2)));
    assert_eq!(bundle.release().unwrap(), message);

    let events = f.bridge.take_events();
    assert!(events.contains(&BridgeEvent::CollectedSignatures {
        responsible_signer: f.validator(2),
        message_hash: hash,
        signatures: 2,
    }));
}

#[test]
fn test_stored_message_independent_of_signer_order() {
    let a = setup(3, 3, half_unit_limits());
    let raw = a
        .bridge
        .on_inbound_notification(&TOKEN, RECIPIENT, UNIT / 4, &[])
        .unwrap()
        .encode();
    let hash = MessageHash::of(&raw);

    a.sign(2, &raw).unwrap();
    a.sign(0, &raw).unwrap();

    assert_eq!(a.bridge.message(&hash).unwrap(), raw.to_vec());
    let first = a.bridge.signature(&hash, 0).unwrap();
    assert_eq!(Signer::recover(&first, &raw).unwrap(), a.validator(2));
}

#[test]
fn test_extra_data_names_recipient() {
    let f = setup(1, 1, half_unit_limits());
    let target = Address::from_bytes([0x44; 20]);

    let message = f
        .bridge
        .on_inbound_notification(&TOKEN, RECIPIENT, UNIT / 4, target.as_bytes())
        .unwrap();
    assert_eq!(message.recipient(), &target);

    let message = f
        .bridge
        .on_inbound_notification(&TOKEN, RECIPIENT, UNIT / 4, b"memo")
        .unwrap();
    assert_eq!(message.recipient(), &RECIPIENT);
}

#[test]
fn test_deposit_notifier_must_be_token_or_forwarder() {
    let f = setup(1, 1, half_unit_limits());
    let forwarder = Address::from_bytes([0xf0; 20]);

    assert!(matches!(
        f.bridge.on_inbound_notification(&forwarder, RECIPIENT, UNIT / 4, &[]),
        Err(BridgeError::Authorization(_))
    ));

    f.bridge.set_forwarding_address(&OWNER, Some(forwarder)).unwrap();
    assert!(f
        .bridge
        .on_inbound_notification(&forwarder, RECIPIENT, UNIT / 4, &[])
        .is_ok());
}

#[test]
fn test_deposit_outbound_limits() {
    let f = setup(1, 1, half_unit_limits());

    assert!(matches!(
        f.bridge.on_inbound_notification(&TOKEN, RECIPIENT, UNIT / 1000, &[]),
        Err(BridgeError::Validation(_))
    ));
    assert!(matches!(
        f.bridge.on_inbound_notification(&TOKEN, RECIPIENT, UNIT, &[]),
        Err(BridgeError::Validation(_))
    ));

    f.bridge
        .on_inbound_notification(&TOKEN, RECIPIENT, UNIT / 2, &[])
        .unwrap();
    f.bridge
        .on_inbound_notification(&TOKEN, RECIPIENT, UNIT / 2, &[])
        .unwrap();
    assert!(f
        .bridge
        .on_inbound_notification(&TOKEN, RECIPIENT, UNIT / 100, &[])
        .is_err());

    f.clock.advance_days(1);
    assert!(f
        .bridge
        .on_inbound_notification(&TOKEN, RECIPIENT, UNIT / 100, &[])
        .is_ok());
}

#[test]
fn test_wrong_length_message_rejected() {
    let f = setup(1, 1, half_unit_limits());
    let raw = [0u8; 103];
    let signature = Signer::sign(&f.keys[0], &raw);

    assert!(matches!(
        f.bridge
            .submit_signature(&f.validator(0), signature.as_bytes(), &raw),
        Err(BridgeError::Validation(_))
    ));
}

#[test]
fn test_signature_from_someone_else_rejected() {
    let f = setup(2, 2, half_unit_limits());
    let raw = f
        .bridge
        .on_inbound_notification(&TOKEN, RECIPIENT, UNIT / 4, &[])
        .unwrap()
        .encode();
    let signature = Signer::sign(&f.keys[0], &raw);

    assert!(matches!(
        f.bridge
            .submit_signature(&f.validator(1), signature.as_bytes(), &raw),
        Err(BridgeError::Authorization(_))
    ));
    assert_eq!(f.bridge.num_messages_signed(&MessageHash::of(&raw)), 0);
}

// ============================================================================
// PERSISTENCE
// ============================================================================

#[test]
fn test_snapshot_restores_ledgers() {
    let f = setup(3, 2, half_unit_limits());
    f.affirm(0, UNIT / 4, tx(1)).unwrap();
    f.affirm(0, UNIT, tx(2)).unwrap();
    f.affirm(1, UNIT, tx(2)).unwrap();
    f.bridge.set_gas_price(&OWNER, 42).unwrap();

    let bytes = f.bridge.snapshot().to_bytes().unwrap();
    let snapshot = home_bridge::LedgerSnapshot::from_bytes(&bytes).unwrap();

    let config = BridgeConfig::new()
        .with_validators(f.registry.clone())
        .with_token(f.token.clone())
        .with_limits(half_unit_limits())
        .with_owner(OWNER)
        .with_bridge_id(BRIDGE_ID)
        .with_clock(f.clock.clone());
    let restored = HomeBridge::from_snapshot(config, snapshot).unwrap();

    assert_eq!(restored.gas_price(), 42);
    assert_eq!(restored.remaining_out_of_limit(&tx(2)), UNIT);
    assert_eq!(
        restored.affirm(&f.validator(0), RECIPIENT, UNIT / 4, tx(1)),
        Err(BridgeError::DuplicateVote(f.validator(0)))
    );
    assert_eq!(
        restored.affirm(&f.validator(2), RECIPIENT, UNIT, tx(2)),
        Err(BridgeError::AlreadyProcessed)
    );
    assert_eq!(
        restored
            .affirm(&f.validator(1), RECIPIENT, UNIT / 4, tx(1))
            .unwrap(),
        AffirmationStatus::Released
    );
}

#[test]
fn test_snapshot_for_other_bridge_rejected() {
    let f = setup(1, 1, half_unit_limits());
    let snapshot = f.bridge.snapshot();

    let config = BridgeConfig::new()
        .with_validators(f.registry.clone())
        .with_token(f.token.clone())
        .with_limits(half_unit_limits())
        .with_owner(OWNER)
        .with_bridge_id(Address::from_bytes([0xb2; 20]));
    assert!(matches!(
        HomeBridge::from_snapshot(config, snapshot),
        Err(BridgeError::Validation(_))
    ));
}
