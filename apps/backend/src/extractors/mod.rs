pub mod auth_token;
pub mod current_user;

pub use auth_token::AuthToken;
pub use current_user::CurrentUser;
