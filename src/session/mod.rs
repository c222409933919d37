//! Session lifecycle: cache-first acquisition and forced login.

pub mod cache;

pub use cache::SessionCache;

use crate::cookies::CookieJar;
use crate::error::Result;
use crate::okta::mfa::{self, NewSession};
use crate::okta::IdentityProvider;
use crate::prompt::Prompter;

/// Get a usable session: cached if it still revalidates, fresh
/// otherwise. A fresh session is cached before being returned; a cache
/// write failure fails the whole call.
pub fn acquire<P, T>(
    provider: &P,
    prompter: &T,
    cache: &SessionCache,
    username: Option<&str>,
) -> Result<(String, CookieJar)>
where
    P: IdentityProvider + ?Sized,
    T: Prompter + ?Sized,
{
    if let Some((session_id, cookies)) = cache.lookup(provider, username) {
        tracing::info!("reusing cached session");
        return Ok((session_id, cookies));
    }

    let fresh = login(provider, prompter, cache, username)?;
    Ok((fresh.session_id, fresh.cookies))
}

/// Run the interactive login flow unconditionally and cache the result.
pub fn login<P, T>(
    provider: &P,
    prompter: &T,
    cache: &SessionCache,
    username: Option<&str>,
) -> Result<NewSession>
where
    P: IdentityProvider + ?Sized,
    T: Prompter + ?Sized,
{
    let username = match username {
        Some(username) => username.to_string(),
        None => prompter.username()?,
    };

    let fresh = mfa::obtain_session(provider, prompter, &username)?;
    cache.store(&fresh.username, &fresh.cookies)?;
    Ok(fresh)
}
