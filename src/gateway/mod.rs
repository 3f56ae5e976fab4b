// Gateway module - the token collaborator and the asset gateway that
// credits released claims and recognizes deposits

mod asset;
mod token;

pub use asset::AssetGateway;
pub use token::{ForwardNotice, InMemoryToken, TokenCollaborator, TokenError};
