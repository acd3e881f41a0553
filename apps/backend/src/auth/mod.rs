pub mod claims;
pub mod error;
pub mod google;
pub mod jwt;

pub use claims::AuthenticatedUser;
pub use error::AuthError;
pub use google::{GoogleIdentityVerifier, IdentityVerifier};
pub use jwt::{mint_session_token, verify_session_token};
