//! One-shot flash messages carried in a cookie.
//!
//! A handler that recovers an error (or wants to confirm a write) sets the
//! flash cookie alongside its redirect. The page handler that renders next
//! reads the cookie, clears it in the same response, and hands the message to
//! the template. One redirect, one display, then gone.

use axum::{
    http::{header, HeaderMap},
    response::{IntoResponse, Redirect, Response},
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const FLASH_COOKIE: &str = "flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Error,
}

/// A message queued for the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            message: message.into(),
        }
    }

    /// Cookie value: JSON wrapped in url-safe base64 so the message can hold
    /// arbitrary text without fighting cookie syntax.
    fn encode(&self) -> String {
        let json = serde_json::to_string(self).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(json)
    }

    fn decode(value: &str) -> Option<Self> {
        let bytes = URL_SAFE_NO_PAD.decode(value).ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    /// Set-Cookie header value that queues this flash.
    pub fn set_cookie(&self) -> String {
        format!("{}={}; Path=/; HttpOnly; SameSite=Lax", FLASH_COOKIE, self.encode())
    }
}

/// Set-Cookie header value that clears any queued flash.
pub fn clear_cookie() -> String {
    format!("{FLASH_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// Read a queued flash from the request's cookie header, if any.
///
/// Corrupt cookie values decode to `None` and get cleared on the next render
/// like any consumed flash.
pub fn from_headers(headers: &HeaderMap) -> Option<Flash> {
    let cookie_str = headers.get(header::COOKIE)?.to_str().ok()?;

    for cookie in cookie_str.split(';') {
        let cookie = cookie.trim();
        if let Some((name, value)) = cookie.split_once('=') {
            if name == FLASH_COOKIE {
                let flash = Flash::decode(value);
                if flash.is_none() {
                    debug!("discarding undecodable flash cookie");
                }
                return flash;
            }
        }
    }
    None
}

/// Redirect to `location` with a flash queued for the page that renders there.
pub fn redirect_with_flash(location: &str, flash: Flash) -> Response {
    ([(header::SET_COOKIE, flash.set_cookie())], Redirect::to(location)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_cookie(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_flash_roundtrip_through_cookie() {
        let flash = Flash::error("Please fill in all the fields");
        let set_cookie = flash.set_cookie();

        // Simulate the browser echoing the cookie back
        let pair = set_cookie.split(';').next().unwrap();
        let headers = headers_with_cookie(pair);

        assert_eq!(from_headers(&headers), Some(flash));
    }

    #[test]
    fn test_flash_survives_cookie_hostile_characters() {
        let flash = Flash::success("producto \"añadido\"; ok=sí");
        let pair = flash.set_cookie().split(';').next().unwrap().to_string();
        let headers = headers_with_cookie(&pair);

        assert_eq!(from_headers(&headers), Some(flash));
    }

    #[test]
    fn test_flash_found_among_other_cookies() {
        let flash = Flash::success("done");
        let pair = flash.set_cookie().split(';').next().unwrap().to_string();
        let headers = headers_with_cookie(&format!("session=abc; {pair}; theme=dark"));

        assert_eq!(from_headers(&headers), Some(flash));
    }

    #[test]
    fn test_garbage_cookie_is_none() {
        let headers = headers_with_cookie("flash=not-base64!!");
        assert_eq!(from_headers(&headers), None);

        let headers = headers_with_cookie("other=value");
        assert_eq!(from_headers(&headers), None);
    }

    #[test]
    fn test_clear_cookie_expires_immediately() {
        assert!(clear_cookie().contains("Max-Age=0"));
    }
}
