// Validator registry - the external collaborator owning the validator set
// and the signature threshold

use crate::identity::Address;
use std::collections::BTreeSet;
use std::sync::{PoisonError, RwLock};
use thiserror::Error;

/// Query surface the bridge needs from the validator registry.
///
/// Both values are shared, mutable state owned by the registry and are read
/// live at the start of every vote, before bridge state is locked, so an
/// implementation may query the bridge.
pub trait ValidatorRegistry: Send + Sync {
    /// Minimum number of distinct validator votes required to finalize
    fn required_signatures(&self) -> u32;

    /// Whether `id` is currently a validator
    fn is_validator(&self, id: &Address) -> bool;
}

/// Errors from registry administration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidatorSetError {
    #[error("Threshold must be at least 1")]
    ZeroThreshold,

    #[error("Threshold {required} exceeds validator count {validators}")]
    ThresholdTooHigh { required: u32, validators: usize },

    #[error("Validator address cannot be zero")]
    ZeroAddress,

    #[error("Already a validator: {0}")]
    AlreadyValidator(Address),

    #[error("Not a validator: {0}")]
    NotValidator(Address),
}

#[derive(Debug)]
struct Inner {
    validators: BTreeSet<Address>,
    required_signatures: u32,
}

impl Inner {
    fn check_threshold(&self, required: u32, validators: usize) -> Result<(), ValidatorSetError> {
        if required == 0 {
            return Err(ValidatorSetError::ZeroThreshold);
        }
        if required as usize > validators {
            return Err(ValidatorSetError::ThresholdTooHigh {
                required,
                validators,
            });
        }
        Ok(())
    }
}

/// In-process validator registry with interior mutability, so the threshold
/// can change while a bridge holds a handle to it.
#[derive(Debug)]
pub struct ValidatorSet {
    inner: RwLock<Inner>,
}

impl ValidatorSet {
    /// Create a registry with the given validators and threshold
    pub fn new(
        validators: impl IntoIterator<Item = Address>,
        required_signatures: u32,
    ) -> Result<Self, ValidatorSetError> {
        let mut set = BTreeSet::new();
        for validator in validators {
            if validator.is_zero() {
                return Err(ValidatorSetError::ZeroAddress);
            }
            if !set.insert(validator) {
                return Err(ValidatorSetError::AlreadyValidator(validator));
            }
        }

        let inner = Inner {
            validators: set,
            required_signatures,
        };
        inner.check_threshold(required_signatures, inner.validators.len())?;

        Ok(Self {
            inner: RwLock::new(inner),
        })
    }

    /// Add a validator
    pub fn add_validator(&self, validator: Address) -> Result<(), ValidatorSetError> {
        if validator.is_zero() {
            return Err(ValidatorSetError::ZeroAddress);
        }
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if !inner.validators.insert(validator) {
            return Err(ValidatorSetError::AlreadyValidator(validator));
        }
        Ok(())
    }

    /// Remove a validator; the threshold must still be reachable afterwards
    pub fn remove_validator(&self, validator: &Address) -> Result<(), ValidatorSetError> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if !inner.validators.contains(validator) {
            return Err(ValidatorSetError::NotValidator(*validator));
        }
        inner.check_threshold(inner.required_signatures, inner.validators.len() - 1)?;
        inner.validators.remove(validator);
        Ok(())
    }

    /// Change the signature threshold
    pub fn set_required_signatures(&self, required: u32) -> Result<(), ValidatorSetError> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.check_threshold(required, inner.validators.len())?;
        inner.required_signatures = required;
        Ok(())
    }

    /// Current validators in address order
    pub fn validators(&self) -> Vec<Address> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.validators.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .validators
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ValidatorRegistry for ValidatorSet {
    fn required_signatures(&self) -> u32 {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .required_signatures
    }

    fn is_validator(&self, id: &Address) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .validators
            .contains(id)
    }
}
