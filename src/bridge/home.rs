// Home bridge - owns the ledgers, the limiter and the gateway, and runs
// every operation as one atomic step

use crate::bridge::{BridgeConfig, BridgeError, BridgeEvent, LedgerSnapshot};
use crate::consensus::{
    AffirmationVote, Claim, ClaimKey, ConsensusLedger, RawCounter, TxHash,
};
use crate::gateway::{AssetGateway, TokenCollaborator};
use crate::identity::{Address, SignerRecovery};
use crate::limits::{LimitsConfig, OverflowEntry, RateLimiter, ReleaseDecision};
use crate::relay::{
    MessageHash, RelayBundle, ReleaseMessage, RequestLedger, SignatureVote, MESSAGE_LENGTH,
};
use crate::validators::ValidatorGate;
use parking_lot::ReentrantMutex;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{info, warn};

/// Outcome of an accepted affirmation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AffirmationStatus {
    /// Vote recorded; the claim is still open
    Pending { votes: u32 },
    /// Quorum reached and the amount was credited
    Released,
    /// Quorum reached but the amount went to the overflow pool
    Deferred,
}

/// Outcome of an accepted signature
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignatureStatus {
    /// Signature stored; more are needed
    Pending { signatures: u32 },
    /// Quorum reached; `responsible` should relay the bundle
    Collected { responsible: Address },
}

/// Calls to collaborators, performed only after the state change commits
#[derive(Debug)]
enum Interaction {
    Execute {
        recipient: Address,
        amount: u128,
    },
    Sweep {
        asset: Address,
        holder: Address,
        to: Address,
    },
}

#[derive(Clone, Debug)]
struct BridgeState {
    bridge_id: Address,
    owner: Address,
    gas_price: u128,
    required_block_confirmations: u32,
    consensus: ConsensusLedger,
    requests: RequestLedger,
    limiter: RateLimiter,
    gateway: AssetGateway,
    events: Vec<BridgeEvent>,
}

impl BridgeState {
    fn emit(&mut self, event: BridgeEvent) {
        self.events.push(event);
    }

    fn ensure_owner(&self, caller: &Address) -> Result<(), BridgeError> {
        if *caller == self.owner {
            Ok(())
        } else {
            Err(BridgeError::Authorization(format!(
                "{} is not the bridge owner",
                caller
            )))
        }
    }

    /// Build a release message for `recipient` and ask validators to sign it
    fn raise_request(&mut self, recipient: Address, amount: u128) -> ReleaseMessage {
        let message = self
            .requests
            .on_transfer_received(recipient, amount, self.bridge_id);
        info!(%recipient, amount, transfer_id = %message.transfer_id(), "release requested");
        self.emit(BridgeEvent::UserRequestForSignature {
            recipient,
            amount,
            transfer_id: *message.transfer_id(),
            message: message.encode().to_vec(),
        });
        message
    }
}

/// The home side of the bridge.
///
/// Whole operations, collaborator calls included, run one at a time behind
/// `operation`, which the running thread may take again when a collaborator
/// re-enters. Inside an operation the state lock is held only while state is
/// validated and committed; collaborators run after it is released, so a
/// re-entrant call observes fully committed state. If a collaborator call
/// fails, the bridge is put back exactly as it was before the operation,
/// events included.
pub struct HomeBridge {
    gate: ValidatorGate,
    recovery: Arc<dyn SignerRecovery>,
    operation: ReentrantMutex<()>,
    state: Mutex<BridgeState>,
}

impl HomeBridge {
    /// Build a bridge from a validated configuration
    pub fn initialize(config: BridgeConfig) -> Result<Self, BridgeError> {
        config.validate()?;
        let (gate, token) = Self::collaborators(&config)?;
        let limiter = RateLimiter::new(config.limits, config.clock.clone())?;

        info!(bridge_id = %config.bridge_id, owner = %config.owner, "bridge initialized");

        Ok(Self {
            gate,
            recovery: config.recovery,
            operation: ReentrantMutex::new(()),
            state: Mutex::new(BridgeState {
                bridge_id: config.bridge_id,
                owner: config.owner,
                gas_price: config.gas_price,
                required_block_confirmations: config.required_block_confirmations,
                consensus: ConsensusLedger::new(),
                requests: RequestLedger::new(),
                limiter,
                gateway: AssetGateway::new(token),
                events: Vec::new(),
            }),
        })
    }

    /// Rebuild a bridge from persisted state, with collaborators from `config`
    pub fn from_snapshot(config: BridgeConfig, snapshot: LedgerSnapshot) -> Result<Self, BridgeError> {
        config.validate()?;
        if snapshot.bridge_id != config.bridge_id {
            return Err(BridgeError::Validation(format!(
                "snapshot belongs to bridge {}, not {}",
                snapshot.bridge_id, config.bridge_id
            )));
        }
        snapshot.limiter.config().validate()?;
        let (gate, token) = Self::collaborators(&config)?;

        let mut gateway = AssetGateway::new(token);
        gateway.set_forwarding_address(snapshot.forwarding);

        Ok(Self {
            gate,
            recovery: config.recovery,
            operation: ReentrantMutex::new(()),
            state: Mutex::new(BridgeState {
                bridge_id: snapshot.bridge_id,
                owner: snapshot.owner,
                gas_price: snapshot.gas_price,
                required_block_confirmations: snapshot.required_block_confirmations,
                consensus: snapshot.consensus,
                requests: snapshot.requests,
                limiter: snapshot.limiter.with_clock(config.clock),
                gateway,
                events: Vec::new(),
            }),
        })
    }

    fn collaborators(
        config: &BridgeConfig,
    ) -> Result<(ValidatorGate, Arc<dyn TokenCollaborator>), BridgeError> {
        let validators = config
            .validators
            .clone()
            .ok_or_else(|| BridgeError::Validation("validator registry is required".to_string()))?;
        let token = config
            .token
            .clone()
            .ok_or_else(|| BridgeError::Validation("token collaborator is required".to_string()))?;
        Ok((ValidatorGate::new(validators), token))
    }

    fn lock(&self) -> MutexGuard<'_, BridgeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run one operation: apply state changes under the state lock, then
    /// perform the collaborator calls they produced with it released. Any
    /// failure restores the state captured at entry. Other threads wait on
    /// the operation lock until this returns.
    fn transact<T>(
        &self,
        operation: &'static str,
        apply: impl FnOnce(&mut BridgeState) -> Result<(T, Vec<Interaction>), BridgeError>,
    ) -> Result<T, BridgeError> {
        let _operation = self.operation.lock();
        let (value, interactions, gateway, snapshot) = {
            let mut state = self.lock();
            let snapshot = state.clone();
            match apply(&mut *state) {
                Ok((value, interactions)) => {
                    let gateway = state.gateway.clone();
                    (value, interactions, gateway, snapshot)
                }
                Err(err) => {
                    *state = snapshot;
                    warn!(operation, %err, "operation rejected");
                    return Err(err);
                }
            }
        };

        for interaction in interactions {
            let result = match &interaction {
                Interaction::Execute { recipient, amount } => gateway.execute(recipient, *amount),
                Interaction::Sweep { asset, holder, to } => {
                    gateway.sweep(asset, holder, to).map(|swept| {
                        info!(%asset, %to, swept, "unrelated asset swept");
                    })
                }
            };
            if let Err(err) = result {
                *self.lock() = snapshot;
                warn!(operation, ?interaction, %err, "collaborator failed; operation reverted");
                return Err(err.into());
            }
        }

        Ok(value)
    }

    // ========================================================================
    // VALIDATOR OPERATIONS
    // ========================================================================

    /// Affirm that `amount` was deposited for `recipient` on the counterpart
    /// chain in transaction `external_tx_id`.
    ///
    /// The vote that brings the claim to the threshold in effect at that
    /// moment finalizes it and releases or defers the amount.
    pub fn affirm(
        &self,
        caller: &Address,
        recipient: Address,
        amount: u128,
        external_tx_id: TxHash,
    ) -> Result<AffirmationStatus, BridgeError> {
        let signer = *caller;
        let _operation = self.operation.lock();
        let gate = self.gate.pinned(&signer);
        self.transact("affirm", |state| {
            let vote = state
                .consensus
                .affirm(&gate, signer, recipient, amount, external_tx_id)?;
            state.emit(BridgeEvent::SignedForAffirmation {
                signer,
                external_tx_id,
            });

            let votes = match vote {
                AffirmationVote::Recorded { votes, .. } => {
                    return Ok((AffirmationStatus::Pending { votes }, Vec::new()));
                }
                AffirmationVote::Finalized { votes, .. } => votes,
            };

            let decision = state.limiter.try_release(recipient, amount, external_tx_id);
            info!(%recipient, amount, ?external_tx_id, votes, ?decision, "claim finalized");
            state.emit(BridgeEvent::AffirmationCompleted {
                recipient,
                amount,
                external_tx_id,
                decision,
            });

            match decision {
                ReleaseDecision::Released => Ok((
                    AffirmationStatus::Released,
                    vec![Interaction::Execute { recipient, amount }],
                )),
                ReleaseDecision::Deferred => {
                    state.emit(BridgeEvent::AmountLimitExceeded {
                        recipient,
                        amount,
                        external_tx_id,
                    });
                    Ok((AffirmationStatus::Deferred, Vec::new()))
                }
            }
        })
    }

    /// Submit `caller`'s signature over a 104-byte release message
    pub fn submit_signature(
        &self,
        caller: &Address,
        signature: &[u8],
        message: &[u8],
    ) -> Result<SignatureStatus, BridgeError> {
        let caller = *caller;
        let _operation = self.operation.lock();
        let gate = self.gate.pinned(&caller);
        self.transact("submit_signature", |state| {
            let vote = state.requests.submit_signature(
                &gate,
                self.recovery.as_ref(),
                caller,
                signature,
                message,
            )?;

            let hash = match &vote {
                SignatureVote::Recorded { hash, .. } | SignatureVote::Collected { hash, .. } => *hash,
            };
            state.emit(BridgeEvent::SignedForUserRequest {
                signer: caller,
                message_hash: hash,
            });

            match vote {
                SignatureVote::Recorded { signatures, .. } => {
                    Ok((SignatureStatus::Pending { signatures }, Vec::new()))
                }
                SignatureVote::Collected {
                    signatures,
                    responsible,
                    ..
                } => {
                    info!(?hash, signatures, %responsible, "signatures collected; ready to relay");
                    state.emit(BridgeEvent::CollectedSignatures {
                        responsible_signer: responsible,
                        message_hash: hash,
                        signatures,
                    });
                    Ok((SignatureStatus::Collected { responsible }, Vec::new()))
                }
            }
        })
    }

    // ========================================================================
    // DEPOSITS
    // ========================================================================

    /// Called by the token (directly, or through the forwarding address)
    /// when `amount` arrives from `sender` with a transfer-and-notify.
    ///
    /// If `extra` is exactly 20 bytes it names the counterpart-chain
    /// recipient; otherwise the sender is the recipient.
    pub fn on_inbound_notification(
        &self,
        caller: &Address,
        sender: Address,
        amount: u128,
        extra: &[u8],
    ) -> Result<ReleaseMessage, BridgeError> {
        let caller = *caller;
        self.transact("on_inbound_notification", |state| {
            state.gateway.ensure_notifier(&caller)?;
            state.limiter.check_outbound(amount)?;
            let recipient = state.gateway.resolve_recipient(&sender, extra);
            state.limiter.record_outbound(amount);
            Ok((state.raise_request(recipient, amount), Vec::new()))
        })
    }

    // ========================================================================
    // ADMINISTRATION
    // ========================================================================

    /// Release `amount` of the deferred balance for `external_tx_id`.
    ///
    /// With `forward` set, the released amount is sent back to the
    /// counterpart chain for the original recipient instead of being kept
    /// here. Returns the amount still deferred.
    pub fn fix_assets_above_limits(
        &self,
        caller: &Address,
        external_tx_id: TxHash,
        forward: bool,
        amount: u128,
    ) -> Result<u128, BridgeError> {
        let caller = *caller;
        self.transact("fix_assets_above_limits", |state| {
            state.ensure_owner(&caller)?;
            let entry = state.limiter.reconcile(&external_tx_id, amount)?;
            info!(?external_tx_id, amount, remaining = entry.remaining, forward, "overflow reduced");
            state.emit(BridgeEvent::AssetAboveLimitsFixed {
                external_tx_id,
                released: amount,
                remaining: entry.remaining,
            });
            if forward {
                state.raise_request(entry.recipient, amount);
            }
            Ok((entry.remaining, Vec::new()))
        })
    }

    pub fn set_daily_limit(&self, caller: &Address, limit: u128) -> Result<(), BridgeError> {
        self.transact("set_daily_limit", |state| {
            state.ensure_owner(caller)?;
            state.limiter.set_daily_limit(limit)?;
            state.emit(BridgeEvent::DailyLimitChanged { limit });
            Ok(((), Vec::new()))
        })
    }

    pub fn set_max_per_tx(&self, caller: &Address, max: u128) -> Result<(), BridgeError> {
        self.transact("set_max_per_tx", |state| {
            state.ensure_owner(caller)?;
            state.limiter.set_max_per_tx(max)?;
            state.emit(BridgeEvent::MaxPerTxChanged { max });
            Ok(((), Vec::new()))
        })
    }

    pub fn set_min_per_tx(&self, caller: &Address, min: u128) -> Result<(), BridgeError> {
        self.transact("set_min_per_tx", |state| {
            state.ensure_owner(caller)?;
            state.limiter.set_min_per_tx(min)?;
            state.emit(BridgeEvent::MinPerTxChanged { min });
            Ok(((), Vec::new()))
        })
    }

    pub fn set_execution_daily_limit(&self, caller: &Address, limit: u128) -> Result<(), BridgeError> {
        self.transact("set_execution_daily_limit", |state| {
            state.ensure_owner(caller)?;
            state.limiter.set_execution_daily_limit(limit)?;
            state.emit(BridgeEvent::ExecutionDailyLimitChanged { limit });
            Ok(((), Vec::new()))
        })
    }

    pub fn set_execution_max_per_tx(&self, caller: &Address, max: u128) -> Result<(), BridgeError> {
        self.transact("set_execution_max_per_tx", |state| {
            state.ensure_owner(caller)?;
            state.limiter.set_execution_max_per_tx(max)?;
            state.emit(BridgeEvent::ExecutionMaxPerTxChanged { max });
            Ok(((), Vec::new()))
        })
    }

    pub fn set_gas_price(&self, caller: &Address, gas_price: u128) -> Result<(), BridgeError> {
        self.transact("set_gas_price", |state| {
            state.ensure_owner(caller)?;
            state.gas_price = gas_price;
            state.emit(BridgeEvent::GasPriceChanged { gas_price });
            Ok(((), Vec::new()))
        })
    }

    pub fn set_required_block_confirmations(
        &self,
        caller: &Address,
        confirmations: u32,
    ) -> Result<(), BridgeError> {
        self.transact("set_required_block_confirmations", |state| {
            state.ensure_owner(caller)?;
            state.required_block_confirmations = confirmations;
            state.emit(BridgeEvent::RequiredBlockConfirmationChanged { confirmations });
            Ok(((), Vec::new()))
        })
    }

    /// Route credits through `forwarding`, or credit recipients directly
    /// when `None`
    pub fn set_forwarding_address(
        &self,
        caller: &Address,
        forwarding: Option<Address>,
    ) -> Result<(), BridgeError> {
        self.transact("set_forwarding_address", |state| {
            state.ensure_owner(caller)?;
            state.gateway.set_forwarding_address(forwarding);
            let forwarding = state.gateway.forwarding_address();
            state.emit(BridgeEvent::ForwardingAddressChanged { forwarding });
            Ok(((), Vec::new()))
        })
    }

    /// Sweep an unrelated asset accidentally held by the bridge to `to`
    pub fn claim_tokens(&self, caller: &Address, asset: Address, to: Address) -> Result<(), BridgeError> {
        self.transact("claim_tokens", |state| {
            state.ensure_owner(caller)?;
            if asset == state.gateway.token_address() {
                return Err(BridgeError::Validation(
                    "the bridged token cannot be swept".to_string(),
                ));
            }
            if to.is_zero() {
                return Err(BridgeError::Validation(
                    "sweep destination cannot be zero".to_string(),
                ));
            }
            state.emit(BridgeEvent::TokensClaimed { asset, to });
            let holder = state.bridge_id;
            Ok(((), vec![Interaction::Sweep { asset, holder, to }]))
        })
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    /// Length every release message must have
    pub const fn required_message_length() -> usize {
        MESSAGE_LENGTH
    }

    /// Whether a raw counter carries the processed flag
    pub fn is_already_processed(raw: RawCounter) -> bool {
        crate::consensus::is_already_processed(raw)
    }

    pub fn required_signatures(&self) -> u32 {
        self.gate.required_signatures()
    }

    pub fn claim(&self, key: &ClaimKey) -> Option<Claim> {
        self.lock().consensus.claim(key).cloned()
    }

    /// Raw (count, processed) counter for a claim
    pub fn num_affirmations_signed(&self, key: &ClaimKey) -> RawCounter {
        self.lock().consensus.raw_counter(key)
    }

    pub fn affirmations_signed(&self, validator: &Address, key: &ClaimKey) -> bool {
        self.lock().consensus.affirmation_signed(validator, key)
    }

    /// Raw (count, processed) counter for a release message
    pub fn num_messages_signed(&self, hash: &MessageHash) -> RawCounter {
        self.lock().requests.raw_counter(hash)
    }

    pub fn message_signed_by(&self, validator: &Address, hash: &MessageHash) -> bool {
        self.lock().requests.message_signed_by(validator, hash)
    }

    /// Raw release message as first submitted
    pub fn message(&self, hash: &MessageHash) -> Option<Vec<u8>> {
        self.lock().requests.message(hash).map(<[u8]>::to_vec)
    }

    /// The `index`-th signature collected for `hash`
    pub fn signature(&self, hash: &MessageHash, index: usize) -> Option<Vec<u8>> {
        self.lock().requests.signature(hash, index).map(<[u8]>::to_vec)
    }

    /// Message and signatures for relay, once the message reached quorum
    pub fn relay_bundle(&self, hash: &MessageHash) -> Option<RelayBundle> {
        let state = self.lock();
        state
            .requests
            .get(hash)
            .filter(|message| message.counter().is_processed())
            .map(RelayBundle::from_message)
    }

    pub fn out_of_limit_amount(&self) -> u128 {
        self.lock().limiter.out_of_limit_amount()
    }

    /// Deferred amount still held for `external_tx_id`
    pub fn remaining_out_of_limit(&self, external_tx_id: &TxHash) -> u128 {
        self.lock().limiter.remaining_out_of_limit(external_tx_id)
    }

    pub fn tx_above_limits(&self, external_tx_id: &TxHash) -> Option<OverflowEntry> {
        self.lock().limiter.overflow().entry(external_tx_id).copied()
    }

    pub fn limits(&self) -> LimitsConfig {
        *self.lock().limiter.config()
    }

    /// Inbound volume released today
    pub fn inbound_spent_today(&self) -> u128 {
        let state = self.lock();
        state.limiter.inbound_spent_on(state.limiter.today())
    }

    /// Outbound volume accepted today
    pub fn outbound_spent_today(&self) -> u128 {
        let state = self.lock();
        state.limiter.outbound_spent_on(state.limiter.today())
    }

    pub fn forwarding_address(&self) -> Option<Address> {
        self.lock().gateway.forwarding_address()
    }

    pub fn gas_price(&self) -> u128 {
        self.lock().gas_price
    }

    pub fn required_block_confirmations(&self) -> u32 {
        self.lock().required_block_confirmations
    }

    pub fn owner(&self) -> Address {
        self.lock().owner
    }

    pub fn bridge_id(&self) -> Address {
        self.lock().bridge_id
    }

    /// Drain the event log
    pub fn take_events(&self) -> Vec<BridgeEvent> {
        std::mem::take(&mut self.lock().events)
    }

    /// Copy of the event log
    pub fn events(&self) -> Vec<BridgeEvent> {
        self.lock().events.clone()
    }

    /// Persistable copy of the ledgers and settings
    pub fn snapshot(&self) -> LedgerSnapshot {
        let state = self.lock();
        LedgerSnapshot {
            bridge_id: state.bridge_id,
            owner: state.owner,
            gas_price: state.gas_price,
            required_block_confirmations: state.required_block_confirmations,
            forwarding: state.gateway.forwarding_address(),
            consensus: state.consensus.clone(),
            requests: state.requests.clone(),
            limiter: state.limiter.clone(),
        }
    }
}
