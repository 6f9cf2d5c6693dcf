pub mod microsoft;
pub mod relay;

pub use microsoft::{AuthCallbackError, MicrosoftOAuth, OauthResult};
