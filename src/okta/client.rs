//! Blocking HTTP client for the provider's authn and sessions APIs.
//!
//! [`OktaClientFactory`] carries the base URL and API token and builds
//! per-call clients in three header configurations:
//!
//! - auth client: `Authorization` only — initial login
//! - sessions client: `Authorization` + `Cookie` (full jar) — session
//!   creation/validation
//! - users client: `Authorization` + `Cookie: sid=<value>` — user
//!   context calls scoped to one session
//!
//! No process-wide client state; every configuration is derived from
//! the factory value on demand.

use crate::cookies::{CookieJar, SESSION_COOKIE};
use crate::error::{Error, Result};
use crate::okta::{AuthStatus, AuthTransaction, Factor, FactorKind, IdentityProvider, ProviderSession};
use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, COOKIE, SET_COOKIE};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Builds provider API clients preconfigured with base URL, API token,
/// and auth headers.
#[derive(Debug, Clone)]
pub struct OktaClientFactory {
    base_url: String,
    api_token: String,
}

impl OktaClientFactory {
    pub fn new(base_url: &str, api_token: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token: api_token.to_string(),
        }
    }

    /// Client for the authn endpoints: `Authorization` header only.
    fn auth_client(&self) -> Result<Client> {
        self.build_client(None)
    }

    /// Client for the sessions endpoints: `Authorization` plus the full
    /// cookie jar.
    fn sessions_client(&self, cookies: &CookieJar) -> Result<Client> {
        self.build_client(Some(cookies.header_value()))
    }

    /// Client for user-context endpoints: `Authorization` plus only the
    /// `sid` cookie pair.
    fn users_client(&self, cookies: &CookieJar) -> Result<Client> {
        self.build_client(Some(cookies.session_only().header_value()))
    }

    fn build_client(&self, cookie_header: Option<String>) -> Result<Client> {
        let mut headers = HeaderMap::new();

        let mut auth = HeaderValue::from_str(&format!("SSWS {}", self.api_token))
            .map_err(|_| Error::Config("API token contains invalid header characters".to_string()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        // An empty Cookie header helps nobody; omit it.
        if let Some(cookie) = cookie_header.filter(|c| !c.is_empty()) {
            let value = HeaderValue::from_str(&cookie).map_err(|_| {
                Error::ProviderContract("session cookie is not a valid header value".to_string())
            })?;
            headers.insert(COOKIE, value);
        }

        Ok(Client::builder().default_headers(headers).build()?)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

impl IdentityProvider for OktaClientFactory {
    fn authenticate(&self, username: &str, password: &str) -> Result<AuthTransaction> {
        tracing::debug!(username, "opening authentication transaction");
        let response = self
            .auth_client()?
            .post(self.endpoint("/api/v1/authn"))
            .json(&AuthnRequest { username, password })
            .send()?;
        let authn: AuthnResponse = read_json(response)?;
        Ok(authn.into())
    }

    fn verify_factor(
        &self,
        state_token: &str,
        factor_id: &str,
        pass_code: Option<&str>,
    ) -> Result<AuthTransaction> {
        tracing::debug!(factor_id, challenge = pass_code.is_none(), "verifying factor");
        let response = self
            .auth_client()?
            .post(self.endpoint(&format!("/api/v1/authn/factors/{factor_id}/verify")))
            .json(&VerifyRequest {
                state_token,
                pass_code,
            })
            .send()?;
        let authn: AuthnResponse = read_json(response)?;
        Ok(authn.into())
    }

    fn establish_session(&self, session_token: &str) -> Result<ProviderSession> {
        let response = self
            .sessions_client(&CookieJar::new())?
            .post(self.endpoint("/api/v1/sessions"))
            .json(&SessionRequest { session_token })
            .send()?;

        let mut cookies = CookieJar::from_set_cookie(
            response
                .headers()
                .get_all(SET_COOKIE)
                .iter()
                .filter_map(|v| v.to_str().ok()),
        );
        let session: SessionResponse = read_json(response)?;

        // Some deployments return the session ID only in the body.
        if cookies.session_id().is_none() {
            cookies.insert(SESSION_COOKIE, &session.id);
        }

        tracing::debug!("provider session established");
        Ok(ProviderSession {
            id: session.id,
            cookies,
        })
    }

    fn validate_session(&self, cookies: &CookieJar, session_id: &str) -> Result<()> {
        let response = self
            .sessions_client(cookies)?
            .get(self.endpoint(&format!("/api/v1/sessions/{session_id}")))
            .send()?;
        read_ok(response)
    }

    fn current_user(&self, cookies: &CookieJar) -> Result<String> {
        let response = self
            .users_client(cookies)?
            .get(self.endpoint("/api/v1/users/me"))
            .send()?;
        let user: UserResponse = read_json(response)?;
        user.profile
            .and_then(|p| p.login)
            .ok_or_else(|| Error::ProviderContract("user record has no login".to_string()))
    }
}

// ── Wire types ──────────────────────────────────────────────────────

#[derive(Serialize)]
struct AuthnRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct VerifyRequest<'a> {
    #[serde(rename = "stateToken")]
    state_token: &'a str,
    #[serde(rename = "passCode", skip_serializing_if = "Option::is_none")]
    pass_code: Option<&'a str>,
}

#[derive(Serialize)]
struct SessionRequest<'a> {
    #[serde(rename = "sessionToken")]
    session_token: &'a str,
}

#[derive(Deserialize)]
struct AuthnResponse {
    status: String,
    #[serde(rename = "stateToken")]
    state_token: Option<String>,
    #[serde(rename = "sessionToken")]
    session_token: Option<String>,
    #[serde(rename = "_embedded")]
    embedded: Option<Embedded>,
}

#[derive(Default, Deserialize)]
struct Embedded {
    #[serde(default)]
    factors: Vec<WireFactor>,
}

#[derive(Deserialize)]
struct WireFactor {
    id: String,
    #[serde(rename = "factorType")]
    factor_type: String,
}

#[derive(Deserialize)]
struct SessionResponse {
    id: String,
}

#[derive(Deserialize)]
struct UserResponse {
    profile: Option<UserProfile>,
}

#[derive(Deserialize)]
struct UserProfile {
    login: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    #[serde(rename = "errorSummary")]
    error_summary: Option<String>,
}

impl From<AuthnResponse> for AuthTransaction {
    fn from(wire: AuthnResponse) -> Self {
        Self {
            status: AuthStatus::from_wire(&wire.status),
            state_token: wire.state_token,
            session_token: wire.session_token,
            factors: wire
                .embedded
                .unwrap_or_default()
                .factors
                .into_iter()
                .map(|f| Factor {
                    id: f.id,
                    kind: FactorKind::from_wire(&f.factor_type),
                })
                .collect(),
        }
    }
}

// ── Response handling ───────────────────────────────────────────────

/// Deserialize a 2xx body; map anything else onto the provider's
/// `errorSummary` when it sends one.
fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json()?);
    }
    Err(rejection(status, response))
}

fn read_ok(response: Response) -> Result<()> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    Err(rejection(status, response))
}

fn rejection(status: reqwest::StatusCode, response: Response) -> Error {
    let summary = response
        .json::<ApiError>()
        .ok()
        .and_then(|e| e.error_summary)
        .unwrap_or_else(|| format!("HTTP {status}"));
    Error::ProviderRejected(summary)
}
