//! Error types shared across the crate.

use thiserror::Error;

/// Result type alias for keyturn operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy for the login flow, session cache, and app connector.
///
/// Cache *read* problems never surface here — a corrupt or stale cache
/// always degrades to a miss. Cache *write* problems do surface: losing
/// a freshly established session silently is not acceptable.
#[derive(Debug, Error)]
pub enum Error {
    /// The account's first factor is of a kind this tool cannot drive.
    /// Permanent until a supported factor is enabled on the account.
    #[error("MFA factor type '{0}' is not implemented; enable a TOTP or SMS factor for this account")]
    UnsupportedFactor(String),

    /// The provider refused the request (bad credentials, bad code,
    /// revoked session). Retrying the whole flow may succeed.
    #[error("identity provider rejected the request: {0}")]
    ProviderRejected(String),

    /// The provider answered 2xx but without the fields the flow needs
    /// (missing state token, empty factor list, no session token).
    #[error("unexpected identity provider response: {0}")]
    ProviderContract(String),

    /// The application page came back without a SAMLResponse input.
    #[error("application response contains no SAMLResponse field")]
    MissingSamlAssertion,

    /// The application URL answered with a non-success status.
    #[error("application returned HTTP {0}")]
    AppStatus(reqwest::StatusCode),

    /// Missing or unusable configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// The terminal prompt could not be read.
    #[error("prompt failed: {0}")]
    Prompt(String),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
