//! keyturn — Okta SSO session broker.
//!
//! Authenticates a user against an Okta-style identity provider
//! (multi-factor capable), caches the resulting session on disk, and
//! retrieves SAML assertions from applications using that session.

pub mod config;
pub mod cookies;
pub mod error;
pub mod okta;
pub mod prompt;
pub mod saml;
pub mod session;

pub use error::{Error, Result};
