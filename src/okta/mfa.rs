//! MFA challenge/response flow.
//!
//! Drives an authentication transaction to completion: password first,
//! then — when the provider demands it — exactly one factor challenge.
//! Only the first enrolled factor is attempted; the provider lists
//! factors in the account's preference order.

use crate::error::{Error, Result};
use crate::okta::{AuthStatus, AuthTransaction, FactorKind, IdentityProvider};
use crate::cookies::CookieJar;
use crate::prompt::Prompter;

/// A freshly established session, paired with the username that earned
/// it so the cache can key on it.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub session_id: String,
    pub cookies: CookieJar,
    pub username: String,
}

/// Authenticate `username` interactively and establish a provider
/// session.
///
/// Prompts for the password (and an MFA code when required), then
/// trades the resulting one-shot session token for a session ID and
/// cookie jar.
pub fn obtain_session<P, T>(provider: &P, prompter: &T, username: &str) -> Result<NewSession>
where
    P: IdentityProvider + ?Sized,
    T: Prompter + ?Sized,
{
    let password = prompter.password(username)?;
    let opened = provider.authenticate(username, &password)?;

    let completed = match opened.status {
        AuthStatus::Success => opened,
        AuthStatus::MfaRequired => challenge_first_factor(provider, prompter, opened)?,
        AuthStatus::Other(raw) => {
            return Err(Error::ProviderContract(format!(
                "authentication ended in status '{raw}'"
            )))
        }
    };

    let session_token = completed.session_token.ok_or_else(|| {
        Error::ProviderContract("completed transaction carried no session token".to_string())
    })?;

    let session = provider.establish_session(&session_token)?;
    tracing::info!(username, "new provider session established");

    Ok(NewSession {
        session_id: session.id,
        cookies: session.cookies,
        username: username.to_string(),
    })
}

/// Run the challenge for the first enrolled factor.
///
/// TOTP is a single verification call; SMS is exactly two (trigger,
/// then verify). Anything else is a permanent configuration gap — no
/// verification call is made at all.
fn challenge_first_factor<P, T>(
    provider: &P,
    prompter: &T,
    opened: AuthTransaction,
) -> Result<AuthTransaction>
where
    P: IdentityProvider + ?Sized,
    T: Prompter + ?Sized,
{
    let state_token = opened.state_token.ok_or_else(|| {
        Error::ProviderContract("MFA required but no state token issued".to_string())
    })?;
    let factor = opened.factors.into_iter().next().ok_or_else(|| {
        Error::ProviderContract("MFA required but no factors enrolled".to_string())
    })?;

    match factor.kind {
        FactorKind::Totp => {
            let code = prompter.mfa_code("authenticator code")?;
            provider.verify_factor(&state_token, &factor.id, Some(&code))
        }
        FactorKind::Sms => {
            // First call (no code) asks the provider to send the SMS.
            provider.verify_factor(&state_token, &factor.id, None)?;
            let code = prompter.mfa_code("SMS code")?;
            provider.verify_factor(&state_token, &factor.id, Some(&code))
        }
        FactorKind::Unsupported(raw) => {
            tracing::warn!(factor_type = %raw, "account's first factor is unsupported");
            Err(Error::UnsupportedFactor(raw))
        }
    }
}
