//! Credential primitives shared across the relay.

pub mod credentials;
pub mod secret;

pub use credentials::{CredentialPair, RotatedTokens};
pub use secret::TokenSecret;
