use crate::bridge::BridgeError;
use crate::gateway::TokenCollaborator;
use crate::identity::{Address, EcdsaRecovery, SignerRecovery};
use crate::limits::{Clock, LimitsConfig, SystemClock};
use crate::validators::ValidatorRegistry;
use std::fmt;
use std::sync::Arc;

/// Everything `HomeBridge::initialize` needs, applied once and atomically
#[derive(Clone)]
pub struct BridgeConfig {
    /// Validator registry collaborator
    pub validators: Option<Arc<dyn ValidatorRegistry>>,
    /// Token collaborator
    pub token: Option<Arc<dyn TokenCollaborator>>,
    pub limits: LimitsConfig,
    /// Advisory fee-price hint for relayers; stored only
    pub gas_price: u128,
    /// Advisory confirmation count for validators; stored only
    pub required_block_confirmations: u32,
    /// Administrative controller
    pub owner: Address,
    /// This deployment's own identity, bound into every release message
    pub bridge_id: Address,
    pub clock: Arc<dyn Clock>,
    pub recovery: Arc<dyn SignerRecovery>,
}

impl BridgeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_validators(mut self, validators: Arc<dyn ValidatorRegistry>) -> Self {
        self.validators = Some(validators);
        self
    }

    pub fn with_token(mut self, token: Arc<dyn TokenCollaborator>) -> Self {
        self.token = Some(token);
        self
    }

    pub fn with_limits(mut self, limits: LimitsConfig) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_gas_price(mut self, gas_price: u128) -> Self {
        self.gas_price = gas_price;
        self
    }

    pub fn with_required_block_confirmations(mut self, confirmations: u32) -> Self {
        self.required_block_confirmations = confirmations;
        self
    }

    pub fn with_owner(mut self, owner: Address) -> Self {
        self.owner = owner;
        self
    }

    pub fn with_bridge_id(mut self, bridge_id: Address) -> Self {
        self.bridge_id = bridge_id;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_recovery(mut self, recovery: Arc<dyn SignerRecovery>) -> Self {
        self.recovery = recovery;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), BridgeError> {
        if self.validators.is_none() {
            return Err(BridgeError::Validation(
                "validator registry is required".to_string(),
            ));
        }
        match &self.token {
            None => {
                return Err(BridgeError::Validation(
                    "token collaborator is required".to_string(),
                ))
            }
            Some(token) if token.token_address().is_zero() => {
                return Err(BridgeError::Validation(
                    "token address cannot be zero".to_string(),
                ))
            }
            Some(_) => {}
        }
        if self.owner.is_zero() {
            return Err(BridgeError::Validation("owner cannot be zero".to_string()));
        }
        if self.bridge_id.is_zero() {
            return Err(BridgeError::Validation(
                "bridge_id cannot be zero".to_string(),
            ));
        }
        self.limits.validate()
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            validators: None,
            token: None,
            limits: LimitsConfig::default(),
            gas_price: 1_000_000_000,
            required_block_confirmations: 8,
            owner: Address::ZERO,
            bridge_id: Address::ZERO,
            clock: Arc::new(SystemClock),
            recovery: Arc::new(EcdsaRecovery),
        }
    }
}

impl fmt::Debug for BridgeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeConfig")
            .field("validators", &self.validators.is_some())
            .field("token", &self.token.as_ref().map(|t| t.token_address()))
            .field("limits", &self.limits)
            .field("gas_price", &self.gas_price)
            .field("required_block_confirmations", &self.required_block_confirmations)
            .field("owner", &self.owner)
            .field("bridge_id", &self.bridge_id)
            .finish_non_exhaustive()
    }
}
