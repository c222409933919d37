//! App connector: retrieve the SAML assertion an application page
//! embeds after a successful SSO handoff.
//!
//! The application answers a cookie-authenticated GET with an HTML
//! interstitial containing `<input name="SAMLResponse" value="..."/>`.
//! The value is handed back verbatim — it is opaque here and never
//! cached.

use crate::cookies::CookieJar;
use crate::error::{Error, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use reqwest::header::COOKIE;

/// GET `app_url` with the session cookies attached and pull the SAML
/// assertion out of the returned page.
///
/// Fails fast: any non-success status or a page without the form field
/// is a hard error, never retried.
pub fn fetch_saml_assertion(app_url: &str, cookies: &CookieJar) -> Result<String> {
    let client = reqwest::blocking::Client::new();

    let mut request = client.get(app_url);
    if !cookies.is_empty() {
        request = request.header(COOKIE, cookies.header_value());
    }

    let response = request.send()?;
    let status = response.status();
    if !status.is_success() {
        tracing::warn!(%status, "application URL refused the session");
        return Err(Error::AppStatus(status));
    }

    extract_saml_assertion(&response.text()?)
}

/// Scan an HTML document for the `SAMLResponse` input and return its
/// `value` attribute.
pub fn extract_saml_assertion(html: &str) -> Result<String> {
    let mut reader = Reader::from_str(html);
    let config = reader.config_mut();
    config.trim_text(true);
    // App pages are HTML, not XML; unmatched end tags are expected.
    config.check_end_names = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e))
                if e.local_name().as_ref() == b"input" =>
            {
                if let Some(value) = saml_input_value(e) {
                    return Ok(value);
                }
            }
            Ok(Event::Eof) => return Err(Error::MissingSamlAssertion),
            // Tag soup the scanner cannot tokenize past: if the field
            // was not seen by this point, the page is unusable.
            Err(_) => return Err(Error::MissingSamlAssertion),
            Ok(_) => {}
        }
    }
}

/// `value` attribute of an input element, if its `name` is
/// `SAMLResponse`.
fn saml_input_value(element: &BytesStart) -> Option<String> {
    let mut is_saml_field = false;
    let mut value = None;

    for attr in element.attributes().flatten() {
        match attr.key.as_ref() {
            b"name" => is_saml_field = attr.value.as_ref() == b"SAMLResponse",
            b"value" => {
                value = Some(match attr.unescape_value() {
                    Ok(unescaped) => unescaped.into_owned(),
                    Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
                })
            }
            _ => {}
        }
    }

    if is_saml_field {
        value
    } else {
        None
    }
}
