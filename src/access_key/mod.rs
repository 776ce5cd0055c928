//! Access-Key tokens for service-to-service calls.
//!
//! A caller mints `<secret>@<unix seconds>` under the shared key and sends it
//! as the `Access-Key` header; the receiver decrypts it, checks the secret
//! and rejects anything outside the freshness window.

pub mod frontend;
pub mod minter;
pub mod validator;

pub use frontend::{BypassRule, FrontendPolicy};
pub use minter::AccessKeyMinter;
pub use validator::{AccessKeyValidator, Decision, Stage};

/// Inbound and outbound header carrying the token.
pub const ACCESS_KEY_HEADER: &str = "access-key";
