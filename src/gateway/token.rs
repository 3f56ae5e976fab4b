// Token collaborator - the asset the bridge credits, plus an in-process
// implementation used by the simulator and tests

use crate::identity::Address;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

/// Errors reported by the token collaborator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Credit rejected: {0}")]
    CreditRejected(String),

    #[error("Notification rejected: {0}")]
    NotificationRejected(String),

    #[error("Nothing to sweep for asset {0}")]
    NothingToSweep(Address),

    #[error("Balance would overflow")]
    BalanceOverflow,
}

/// Operations the bridge needs from the bridged asset.
///
/// Implementations may call back into the bridge from the calling thread; by
/// the time any of these methods runs, the calling operation has already
/// committed its own state. Each method either applies fully or fails with
/// no effect.
pub trait TokenCollaborator: Send + Sync {
    /// Address of the bridged asset
    fn token_address(&self) -> Address;

    /// Mint-like credit of `amount` to `recipient`
    fn credit(&self, recipient: &Address, amount: u128) -> Result<(), TokenError>;

    /// Credit `amount` to `forwarder` and tell it which final recipient the
    /// funds are for. Either both happen or neither does.
    fn credit_forwarded(
        &self,
        forwarder: &Address,
        recipient: &Address,
        amount: u128,
    ) -> Result<(), TokenError>;

    /// Move the whole balance of an unrelated `asset` held by `holder` to `to`.
    /// Returns the amount moved.
    fn sweep(&self, asset: &Address, holder: &Address, to: &Address) -> Result<u128, TokenError>;
}

/// A forwarding notification as recorded by `InMemoryToken`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForwardNotice {
    pub forwarder: Address,
    pub recipient: Address,
    pub amount: u128,
}

#[derive(Debug, Default)]
struct Ledger {
    balances: HashMap<Address, u128>,
    /// (asset, holder) -> balance of unrelated assets
    foreign: HashMap<(Address, Address), u128>,
    notices: Vec<ForwardNotice>,
}

/// In-memory token keeping balances and forwarding notices
#[derive(Debug)]
pub struct InMemoryToken {
    address: Address,
    ledger: Mutex<Ledger>,
}

impl InMemoryToken {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            ledger: Mutex::new(Ledger::default()),
        }
    }

    fn ledger(&self) -> std::sync::MutexGuard<'_, Ledger> {
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn balance_of(&self, holder: &Address) -> u128 {
        self.ledger().balances.get(holder).copied().unwrap_or(0)
    }

    /// Total credited across all holders
    pub fn total_supply(&self) -> u128 {
        self.ledger().balances.values().sum()
    }

    /// Forwarding notices received so far
    pub fn notices(&self) -> Vec<ForwardNotice> {
        self.ledger().notices.clone()
    }

    /// Give `holder` a balance of some unrelated asset
    pub fn deposit_foreign(&self, asset: Address, holder: Address, amount: u128) {
        *self.ledger().foreign.entry((asset, holder)).or_insert(0) += amount;
    }

    pub fn foreign_balance(&self, asset: &Address, holder: &Address) -> u128 {
        self.ledger()
            .foreign
            .get(&(*asset, *holder))
            .copied()
            .unwrap_or(0)
    }
}

impl TokenCollaborator for InMemoryToken {
    fn token_address(&self) -> Address {
        self.address
    }

    fn credit(&self, recipient: &Address, amount: u128) -> Result<(), TokenError> {
        let mut ledger = self.ledger();
        let balance = ledger.balances.entry(*recipient).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or(TokenError::BalanceOverflow)?;
        Ok(())
    }

    fn credit_forwarded(
        &self,
        forwarder: &Address,
        recipient: &Address,
        amount: u128,
    ) -> Result<(), TokenError> {
        let mut ledger = self.ledger();
        let balance = ledger.balances.entry(*forwarder).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or(TokenError::BalanceOverflow)?;
        ledger.notices.push(ForwardNotice {
            forwarder: *forwarder,
            recipient: *recipient,
            amount,
        });
        Ok(())
    }

    fn sweep(&self, asset: &Address, holder: &Address, to: &Address) -> Result<u128, TokenError> {
        let mut ledger = self.ledger();
        let amount = ledger
            .foreign
            .remove(&(*asset, *holder))
            .filter(|&amount| amount > 0)
            .ok_or(TokenError::NothingToSweep(*asset))?;
        *ledger.foreign.entry((*asset, *to)).or_insert(0) += amount;
        Ok(amount)
    }
}
