use crate::bridge::BridgeError;
use crate::identity::Address;
use crate::validators::ValidatorRegistry;
use std::fmt;
use std::sync::Arc;

/// Where the gate gets its answers
#[derive(Clone)]
enum Source {
    /// Ask the registry on every call
    Live(Arc<dyn ValidatorRegistry>),
    /// Answers read from the registry once, for one caller
    Pinned {
        caller: Address,
        is_validator: bool,
        required: u32,
    },
}

/// Thin query facade over the validator registry.
///
/// Nothing is cached across operations: a threshold change takes effect on
/// the very next vote. `pinned` takes one reading for a single operation so
/// the registry is never queried while bridge state is locked.
#[derive(Clone)]
pub struct ValidatorGate {
    source: Source,
}

impl ValidatorGate {
    pub fn new(registry: Arc<dyn ValidatorRegistry>) -> Self {
        Self {
            source: Source::Live(registry),
        }
    }

    /// Read `caller`'s standing and the threshold now, and answer from that
    /// reading afterwards
    pub fn pinned(&self, caller: &Address) -> Self {
        Self {
            source: Source::Pinned {
                caller: *caller,
                is_validator: self.is_validator(caller),
                required: self.required_signatures(),
            },
        }
    }

    pub fn required_signatures(&self) -> u32 {
        match &self.source {
            Source::Live(registry) => registry.required_signatures(),
            Source::Pinned { required, .. } => *required,
        }
    }

    /// A pinned gate only knows about the caller it was pinned for
    pub fn is_validator(&self, id: &Address) -> bool {
        match &self.source {
            Source::Live(registry) => registry.is_validator(id),
            Source::Pinned {
                caller,
                is_validator,
                ..
            } => caller == id && *is_validator,
        }
    }

    /// Fail with an authorization error unless `id` is a current validator
    pub fn ensure_validator(&self, id: &Address) -> Result<(), BridgeError> {
        if self.is_validator(id) {
            Ok(())
        } else {
            Err(BridgeError::Authorization(format!("{} is not a validator", id)))
        }
    }

    /// Whether `votes` distinct signatures satisfy the threshold in effect now
    pub fn quorum_reached(&self, votes: u32) -> bool {
        votes >= self.required_signatures()
    }
}

impl fmt::Debug for ValidatorGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorGate")
            .field("pinned", &matches!(self.source, Source::Pinned { .. }))
            .field("required_signatures", &self.required_signatures())
            .finish()
    }
}
