// Asset gateway - performs the credit/forward action for released claims
// and recognizes incoming deposits destined for relay

use crate::bridge::BridgeError;
use crate::gateway::{TokenCollaborator, TokenError};
use crate::identity::{Address, ADDRESS_LENGTH};
use std::fmt;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct AssetGateway {
    token: Arc<dyn TokenCollaborator>,
    forwarding: Option<Address>,
}

impl AssetGateway {
    pub fn new(token: Arc<dyn TokenCollaborator>) -> Self {
        Self {
            token,
            forwarding: None,
        }
    }

    pub fn token_address(&self) -> Address {
        self.token.token_address()
    }

    pub fn forwarding_address(&self) -> Option<Address> {
        self.forwarding
    }

    /// Set or clear the forwarding address; a zero address clears it
    pub fn set_forwarding_address(&mut self, forwarding: Option<Address>) {
        self.forwarding = forwarding.filter(|addr| !addr.is_zero());
    }

    /// Credit `amount` to `recipient`.
    ///
    /// With a forwarding address configured, the forwarder is credited
    /// instead, together with a notice naming the final recipient.
    pub fn execute(&self, recipient: &Address, amount: u128) -> Result<(), TokenError> {
        match self.forwarding {
            Some(forwarder) => {
                self.token.credit_forwarded(&forwarder, recipient, amount)?;
                info!(%recipient, %forwarder, amount, "credit forwarded");
            }
            None => {
                self.token.credit(recipient, amount)?;
                info!(%recipient, amount, "credit executed");
            }
        }
        Ok(())
    }

    /// Sweep an unrelated asset held by `holder` to `to`
    pub fn sweep(&self, asset: &Address, holder: &Address, to: &Address) -> Result<u128, TokenError> {
        self.token.sweep(asset, holder, to)
    }

    /// Only the token itself, or the forwarding address on its behalf, may
    /// announce an incoming deposit
    pub fn ensure_notifier(&self, caller: &Address) -> Result<(), BridgeError> {
        if *caller == self.token_address() || Some(*caller) == self.forwarding {
            Ok(())
        } else {
            Err(BridgeError::Authorization(format!(
                "{} may not announce deposits",
                caller
            )))
        }
    }

    /// Counterpart-chain recipient of a deposit: `extra` names it when it is
    /// exactly one address long, otherwise the sender receives
    pub fn resolve_recipient(&self, sender: &Address, extra: &[u8]) -> Address {
        if extra.len() == ADDRESS_LENGTH {
            Address::from_slice(extra).unwrap_or(*sender)
        } else {
            *sender
        }
    }
}

impl fmt::Debug for AssetGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetGateway")
            .field("token", &self.token_address())
            .field("forwarding", &self.forwarding)
            .finish()
    }
}
