//! Identity provider protocol: transaction types, the capability trait,
//! the blocking HTTP client behind it, and the MFA flow driving it.
//!
//! The provider's authn API is a state machine: `authenticate` opens a
//! transaction, `verify_factor` advances it, and a successful
//! transaction yields a one-shot session token that `establish_session`
//! trades for a session ID plus cookies. Everything above this module
//! talks to [`IdentityProvider`], never to HTTP directly.

pub mod client;
pub mod mfa;

pub use client::OktaClientFactory;
pub use mfa::{obtain_session, NewSession};

use crate::cookies::CookieJar;
use crate::error::Result;

/// Outcome status of an authentication transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStatus {
    /// Credentials accepted, session token issued.
    Success,
    /// Credentials accepted, a second factor must be verified.
    MfaRequired,
    /// Any other provider status (locked out, password expired, ...).
    Other(String),
}

impl AuthStatus {
    /// Map the provider's status string onto the closed set the flow
    /// handles.
    pub fn from_wire(raw: &str) -> Self {
        match raw {
            "SUCCESS" => Self::Success,
            "MFA_REQUIRED" => Self::MfaRequired,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Kind of a second-authentication factor.
///
/// Closed variant set with the raw provider string preserved for
/// anything we cannot drive, so adding support for a new factor type is
/// a compile-time-checked change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FactorKind {
    /// Time-based one-time password from an authenticator app.
    Totp,
    /// Code delivered by SMS; must be triggered before it can be entered.
    Sms,
    /// A factor type this tool does not implement.
    Unsupported(String),
}

impl FactorKind {
    pub fn from_wire(raw: &str) -> Self {
        match raw {
            "token:software:totp" => Self::Totp,
            "sms" => Self::Sms,
            other => Self::Unsupported(other.to_string()),
        }
    }
}

/// A second-authentication method enrolled on the user's account,
/// discovered from the provider's response.
#[derive(Debug, Clone)]
pub struct Factor {
    pub id: String,
    pub kind: FactorKind,
}

/// One step of an authentication transaction, as reported by the
/// provider.
#[derive(Debug, Clone)]
pub struct AuthTransaction {
    pub status: AuthStatus,
    /// Opaque state token; required for factor-verification calls.
    pub state_token: Option<String>,
    /// One-shot token exchanged for a session once status is Success.
    pub session_token: Option<String>,
    /// Factors enrolled on the account, in provider order.
    pub factors: Vec<Factor>,
}

/// An established provider session: the ID plus the cookie jar backing
/// it.
#[derive(Debug, Clone)]
pub struct ProviderSession {
    pub id: String,
    pub cookies: CookieJar,
}

/// Capability interface over the provider's authn and session APIs.
///
/// The MFA flow and the session cache are written against this trait;
/// tests substitute an in-memory fake to assert call sequences and
/// outcomes without any network.
pub trait IdentityProvider {
    /// Open an authentication transaction with primary credentials.
    fn authenticate(&self, username: &str, password: &str) -> Result<AuthTransaction>;

    /// Advance a transaction by verifying a factor. `pass_code: None`
    /// asks the provider to issue a challenge (e.g. send the SMS)
    /// rather than verify one.
    fn verify_factor(
        &self,
        state_token: &str,
        factor_id: &str,
        pass_code: Option<&str>,
    ) -> Result<AuthTransaction>;

    /// Trade a one-shot session token for a session ID and cookies.
    fn establish_session(&self, session_token: &str) -> Result<ProviderSession>;

    /// Confirm that a previously issued session is still active.
    fn validate_session(&self, cookies: &CookieJar, session_id: &str) -> Result<()>;

    /// Resolve the provider login owning the session behind `cookies`.
    fn current_user(&self, cookies: &CookieJar) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_maps_known_strings() {
        assert_eq!(AuthStatus::from_wire("SUCCESS"), AuthStatus::Success);
        assert_eq!(AuthStatus::from_wire("MFA_REQUIRED"), AuthStatus::MfaRequired);
        assert_eq!(
            AuthStatus::from_wire("LOCKED_OUT"),
            AuthStatus::Other("LOCKED_OUT".to_string())
        );
    }

    #[test]
    fn factor_kind_maps_known_strings() {
        assert_eq!(FactorKind::from_wire("token:software:totp"), FactorKind::Totp);
        assert_eq!(FactorKind::from_wire("sms"), FactorKind::Sms);
        assert_eq!(
            FactorKind::from_wire("push"),
            FactorKind::Unsupported("push".to_string())
        );
    }
}
