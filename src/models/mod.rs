pub mod dto;
pub mod error;
pub mod role;
pub mod token_claim;
pub mod user;
pub use error::{ClientError, Error};
pub use role::{Role, RoleEntity};
pub use token_claim::TokenClaim;
pub use user::User;
