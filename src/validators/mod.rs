// Validators module - registry collaborator and the gate the ledgers query

mod gate;
mod registry;

pub use gate::ValidatorGate;
pub use registry::{ValidatorRegistry, ValidatorSet, ValidatorSetError};
