//! On-disk session cache.
//!
//! One well-known file owned exclusively by this module, overwritten
//! wholesale on every store. A cached session is only ever handed out
//! after the provider confirms it is still alive — there is no local
//! expiry timestamp; staleness IS revalidation failure.
//!
//! Read-side problems (missing file, garbage contents, wrong user,
//! dead session) all degrade to a miss. Write-side problems propagate:
//! the user must know their fresh session was not saved.

use crate::cookies::CookieJar;
use crate::error::Result;
use crate::okta::IdentityProvider;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

/// The persisted shape: which user the session belongs to, and the
/// cookies backing it.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionRecord {
    username: String,
    cookies: CookieJar,
}

/// File-backed cache of the most recent provider session.
#[derive(Debug)]
pub struct SessionCache {
    path: PathBuf,
}

impl SessionCache {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Return the cached session if it belongs to `username` (any user
    /// when `None`) and still revalidates against the provider.
    ///
    /// Never errors: every failure mode is a miss.
    pub fn lookup<P>(&self, provider: &P, username: Option<&str>) -> Option<(String, CookieJar)>
    where
        P: IdentityProvider + ?Sized,
    {
        let record = self.read_record()?;

        if let Some(requested) = username {
            if requested != record.username {
                tracing::debug!(
                    requested,
                    cached = %record.username,
                    "cached session belongs to a different user"
                );
                return None;
            }
        }

        let session_id = record.cookies.session_id()?.to_string();
        match provider.validate_session(&record.cookies, &session_id) {
            Ok(()) => {
                tracing::debug!("cached session revalidated");
                Some((session_id, record.cookies))
            }
            Err(err) => {
                tracing::debug!(error = %err, "cached session failed revalidation");
                None
            }
        }
    }

    /// Overwrite the cache with a fresh session. Errors propagate.
    pub fn store(&self, username: &str, cookies: &CookieJar) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let record = SessionRecord {
            username: username.to_string(),
            cookies: cookies.clone(),
        };
        let body = serde_json::to_vec(&record)?;

        // Permissions are applied at open time, before any byte of the
        // session hits disk; a reader never observes a world-readable
        // window.
        let mut file = open_owner_only(&self.path)?;
        file.write_all(&body)?;
        file.flush()?;

        tracing::debug!(path = %self.path.display(), "session cached");
        Ok(())
    }

    /// Remove the cache file. A file that was never written is fine.
    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn read_record(&self) -> Option<SessionRecord> {
        let bytes = std::fs::read(&self.path).ok()?;
        match serde_json::from_slice(&bytes) {
            Ok(record) => Some(record),
            Err(err) => {
                tracing::debug!(error = %err, "session cache unreadable, treating as empty");
                None
            }
        }
    }
}

#[cfg(unix)]
fn open_owner_only(path: &std::path::Path) -> std::io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_owner_only(path: &std::path::Path) -> std::io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::okta::{AuthTransaction, ProviderSession};
    use std::cell::RefCell;
    use tempfile::TempDir;

    /// Provider fake that only cares about validate_session.
    #[derive(Default)]
    struct ValidatingProvider {
        reject: bool,
        validated: RefCell<Vec<(String, String)>>,
    }

    impl IdentityProvider for ValidatingProvider {
        fn authenticate(&self, _: &str, _: &str) -> Result<AuthTransaction> {
            unreachable!("cache lookup must not authenticate")
        }

        fn verify_factor(&self, _: &str, _: &str, _: Option<&str>) -> Result<AuthTransaction> {
            unreachable!("cache lookup must not verify factors")
        }

        fn establish_session(&self, _: &str) -> Result<ProviderSession> {
            unreachable!("cache lookup must not establish sessions")
        }

        fn validate_session(&self, cookies: &CookieJar, session_id: &str) -> Result<()> {
            self.validated
                .borrow_mut()
                .push((cookies.header_value(), session_id.to_string()));
            if self.reject {
                return Err(Error::ProviderRejected("session expired".to_string()));
            }
            Ok(())
        }

        fn current_user(&self, _: &CookieJar) -> Result<String> {
            unreachable!()
        }
    }

    fn jar() -> CookieJar {
        let mut jar = CookieJar::new();
        jar.insert("sid", "expected-session");
        jar.insert("DT", "device-token");
        jar
    }

    fn cache_in(tmp: &TempDir) -> SessionCache {
        SessionCache::new(tmp.path().join("session.json"))
    }

    #[test]
    fn store_then_lookup_round_trips() {
        let tmp = TempDir::new().unwrap();
        let cache = cache_in(&tmp);
        let provider = ValidatingProvider::default();

        cache.store("username", &jar()).unwrap();
        let (session_id, cookies) = cache.lookup(&provider, Some("username")).unwrap();

        assert_eq!(session_id, "expected-session");
        assert_eq!(cookies, jar());
    }

    #[test]
    fn lookup_without_requested_username_skips_the_check() {
        let tmp = TempDir::new().unwrap();
        let cache = cache_in(&tmp);
        let provider = ValidatingProvider::default();

        cache.store("whoever", &jar()).unwrap();
        let (session_id, _) = cache.lookup(&provider, None).unwrap();
        assert_eq!(session_id, "expected-session");
    }

    #[test]
    fn mismatched_username_misses_without_revalidating() {
        let tmp = TempDir::new().unwrap();
        let cache = cache_in(&tmp);
        let provider = ValidatingProvider::default();

        cache.store("username", &jar()).unwrap();
        assert!(cache.lookup(&provider, Some("wrong-username")).is_none());
        assert!(provider.validated.borrow().is_empty());
    }

    #[test]
    fn failed_revalidation_is_a_miss() {
        let tmp = TempDir::new().unwrap();
        let cache = cache_in(&tmp);
        let provider = ValidatingProvider {
            reject: true,
            ..ValidatingProvider::default()
        };

        cache.store("username", &jar()).unwrap();
        assert!(cache.lookup(&provider, Some("username")).is_none());
        assert_eq!(provider.validated.borrow().len(), 1);
    }

    #[test]
    fn revalidation_sees_stored_cookies_and_derived_session_id() {
        let tmp = TempDir::new().unwrap();
        let cache = cache_in(&tmp);
        let provider = ValidatingProvider::default();

        cache.store("username", &jar()).unwrap();
        cache.lookup(&provider, None).unwrap();

        let calls = provider.validated.borrow();
        assert_eq!(
            calls[0],
            (jar().header_value(), "expected-session".to_string())
        );
    }

    #[test]
    fn missing_file_is_a_miss() {
        let tmp = TempDir::new().unwrap();
        let cache = cache_in(&tmp);
        assert!(cache.lookup(&ValidatingProvider::default(), None).is_none());
    }

    #[test]
    fn corrupt_file_is_a_miss() {
        let tmp = TempDir::new().unwrap();
        let cache = cache_in(&tmp);
        std::fs::write(tmp.path().join("session.json"), b"{not json").unwrap();
        assert!(cache.lookup(&ValidatingProvider::default(), None).is_none());
    }

    #[test]
    fn record_without_sid_cookie_is_a_miss() {
        let tmp = TempDir::new().unwrap();
        let cache = cache_in(&tmp);
        let provider = ValidatingProvider::default();

        let mut no_sid = CookieJar::new();
        no_sid.insert("DT", "device-token");
        cache.store("username", &no_sid).unwrap();

        assert!(cache.lookup(&provider, None).is_none());
        assert!(provider.validated.borrow().is_empty());
    }

    #[test]
    fn store_overwrites_wholesale() {
        let tmp = TempDir::new().unwrap();
        let cache = cache_in(&tmp);
        let provider = ValidatingProvider::default();

        cache.store("first-user", &jar()).unwrap();
        let mut second = CookieJar::new();
        second.insert("sid", "second-session");
        cache.store("second-user", &second).unwrap();

        assert!(cache.lookup(&provider, Some("first-user")).is_none());
        let (session_id, cookies) = cache.lookup(&provider, Some("second-user")).unwrap();
        assert_eq!(session_id, "second-session");
        assert_eq!(cookies.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn cache_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let cache = cache_in(&tmp);
        cache.store("username", &jar()).unwrap();

        let mode = std::fs::metadata(tmp.path().join("session.json"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn store_failure_propagates() {
        let tmp = TempDir::new().unwrap();
        // Parent "directory" is a plain file, so the open must fail.
        let blocker = tmp.path().join("blocker");
        std::fs::write(&blocker, b"").unwrap();
        let cache = SessionCache::new(blocker.join("session.json"));

        assert!(cache.store("username", &jar()).is_err());
    }

    #[test]
    fn clear_removes_the_file_and_tolerates_absence() {
        let tmp = TempDir::new().unwrap();
        let cache = cache_in(&tmp);

        cache.store("username", &jar()).unwrap();
        cache.clear().unwrap();
        assert!(cache.lookup(&ValidatingProvider::default(), None).is_none());

        // Second clear: nothing left to remove, still fine.
        cache.clear().unwrap();
    }
}
