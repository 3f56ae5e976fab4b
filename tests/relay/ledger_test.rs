// Request Ledger Tests
// Signature collection over release messages

use home_bridge::bridge::BridgeError;
use home_bridge::consensus::is_already_processed;
use home_bridge::identity::{Address, EcdsaRecovery, Keypair, Signer};
use home_bridge::relay::{MessageHash, MessageStatus, RequestLedger, SignatureVote};
use home_bridge::validators::{ValidatorGate, ValidatorSet};
use std::sync::Arc;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

struct Setup {
    keys: Vec<Keypair>,
    set: Arc<ValidatorSet>,
    gate: ValidatorGate,
    ledger: RequestLedger,
    raw: Vec<u8>,
}

fn setup(validators: usize, required: u32) -> Setup {
    let keys: Vec<Keypair> = (0..validators).map(|_| Keypair::generate()).collect();
    let set = Arc::new(ValidatorSet::new(keys.iter().map(Keypair::address), required).unwrap());
    let gate = ValidatorGate::new(set.clone());
    let mut ledger = RequestLedger::new();
    let raw = ledger
        .on_transfer_received(Address::from_bytes([5; 20]), 1_000, Address::from_bytes([9; 20]))
        .encode()
        .to_vec();

    Setup {
        keys,
        set,
        gate,
        ledger,
        raw,
    }
}

fn submit(s: &mut Setup, index: usize) -> Result<SignatureVote, BridgeError> {
    let key = &s.keys[index];
    let signature = Signer::sign(key, &s.raw);
    s.ledger
        .submit_signature(&s.gate, &EcdsaRecovery, key.address(), signature.as_bytes(), &s.raw)
}

// ============================================================================
// PREPARING REQUESTS
// ============================================================================

#[test]
fn test_prepare_advances_nonce_only() {
    let s = setup(1, 1);

    assert_eq!(s.ledger.nonce(), 1);
    assert_eq!(s.ledger.message_count(), 0);
}

#[test]
fn test_consecutive_requests_get_distinct_transfer_ids() {
    let mut ledger = RequestLedger::new();
    let bridge = Address::from_bytes([9; 20]);
    let recipient = Address::from_bytes([5; 20]);

    let a = ledger.on_transfer_received(recipient, 10, bridge);
    let b = ledger.on_transfer_received(recipient, 10, bridge);

    assert_ne!(a.transfer_id(), b.transfer_id());
    assert_ne!(a.hash(), b.hash());
}

// ============================================================================
// COLLECTING SIGNATURES
// ============================================================================

#[test]
fn test_collects_until_threshold() {
    let mut s = setup(3, 2);
    let hash = MessageHash::of(&s.raw);

    assert_eq!(
        submit(&mut s, 0).unwrap(),
        SignatureVote::Recorded { hash, signatures: 1 }
    );
    let responsible = s.keys[1].address();
    assert_eq!(
        submit(&mut s, 1).unwrap(),
        SignatureVote::Collected {
            hash,
            signatures: 2,
            responsible
        }
    );

    let entry = s.ledger.get(&hash).unwrap();
    assert_eq!(entry.status(), MessageStatus::Processed);
    assert_eq!(entry.responsible(), Some(&responsible));
    assert!(is_already_processed(s.ledger.raw_counter(&hash)));
}

#[test]
fn test_signatures_kept_in_submission_order() {
    let mut s = setup(3, 3);
    let hash = MessageHash::of(&s.raw);

    submit(&mut s, 2).unwrap();
    submit(&mut s, 0).unwrap();

    let first = s.ledger.signature(&hash, 0).unwrap().to_vec();
    let second = s.ledger.signature(&hash, 1).unwrap().to_vec();
    assert_eq!(Signer::recover(&first, &s.raw).unwrap(), s.keys[2].address());
    assert_eq!(Signer::recover(&second, &s.raw).unwrap(), s.keys[0].address());
    assert!(s.ledger.signature(&hash, 2).is_none());
}

#[test]
fn test_stored_message_is_first_submission() {
    let mut s = setup(3, 3);
    let hash = MessageHash::of(&s.raw);

    submit(&mut s, 1).unwrap();
    submit(&mut s, 0).unwrap();

    assert_eq!(s.ledger.message(&hash).unwrap(), s.raw.as_slice());
}

#[test]
fn test_duplicate_signature_rejected() {
    let mut s = setup(3, 3);

    submit(&mut s, 0).unwrap();
    let signer = s.keys[0].address();
    assert_eq!(submit(&mut s, 0), Err(BridgeError::DuplicateVote(signer)));
}

#[test]
fn test_signature_after_collection_rejected() {
    let mut s = setup(3, 1);

    submit(&mut s, 0).unwrap();
    assert_eq!(submit(&mut s, 1), Err(BridgeError::AlreadyProcessed));
}

#[test]
fn test_wrong_length_rejected_before_recovery() {
    let mut s = setup(1, 1);
    let key = s.keys[0].clone();
    let short = &s.raw[..103];
    let signature = Signer::sign(&key, short);

    let result = s.ledger.submit_signature(
        &s.gate,
        &EcdsaRecovery,
        key.address(),
        signature.as_bytes(),
        short,
    );
    assert!(matches!(result, Err(BridgeError::Validation(_))));
    assert_eq!(s.ledger.message_count(), 0);
}

#[test]
fn test_signer_must_match_caller() {
    let mut s = setup(2, 2);
    let signature = Signer::sign(&s.keys[0], &s.raw);
    let other = s.keys[1].address();

    let result =
        s.ledger
            .submit_signature(&s.gate, &EcdsaRecovery, other, signature.as_bytes(), &s.raw);
    assert!(matches!(result, Err(BridgeError::Authorization(_))));
    assert!(!s.ledger.message_signed_by(&other, &MessageHash::of(&s.raw)));
}

#[test]
fn test_non_validator_signature_rejected() {
    let mut s = setup(2, 1);
    let outsider = Keypair::generate();
    let signature = Signer::sign(&outsider, &s.raw);

    let result = s.ledger.submit_signature(
        &s.gate,
        &EcdsaRecovery,
        outsider.address(),
        signature.as_bytes(),
        &s.raw,
    );
    assert!(matches!(result, Err(BridgeError::Authorization(_))));
}

#[test]
fn test_threshold_raise_during_collection() {
    let mut s = setup(3, 2);

    submit(&mut s, 0).unwrap();
    s.set.set_required_signatures(3).unwrap();

    assert!(matches!(
        submit(&mut s, 1).unwrap(),
        SignatureVote::Recorded { signatures: 2, .. }
    ));
    assert!(matches!(
        submit(&mut s, 2).unwrap(),
        SignatureVote::Collected { signatures: 3, .. }
    ));
}
