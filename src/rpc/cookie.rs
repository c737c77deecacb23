//! `Set-Cookie` values for browser clients.
//!
//! Cookies are written on sign-in and refresh and cleared on sign-out; they
//! are read back by `auth::extract_access_token` and friends.

use axum::http::HeaderValue;
use axum::http::header::InvalidHeaderValue;
use chrono::{DateTime, Utc};

use crate::auth::{ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE, Token, TokenPair};

/// Cookies carrying both tokens of `pair`, each expiring with its token.
pub fn set_cookies(pair: &TokenPair) -> Result<[HeaderValue; 2], InvalidHeaderValue> {
    Ok([
        token_cookie(ACCESS_TOKEN_COOKIE, &pair.access)?,
        token_cookie(REFRESH_TOKEN_COOKIE, &pair.refresh)?,
    ])
}

/// Cookies that overwrite both tokens with empty, already-expired values.
pub fn clear_cookies() -> [HeaderValue; 2] {
    [
        HeaderValue::from_static("access_token=; Path=/; Expires=Thu, 01 Jan 1970 00:00:00 GMT; HttpOnly; Secure"),
        HeaderValue::from_static("refresh_token=; Path=/; Expires=Thu, 01 Jan 1970 00:00:00 GMT; HttpOnly; Secure"),
    ]
}

fn token_cookie(name: &str, token: &Token) -> Result<HeaderValue, InvalidHeaderValue> {
    HeaderValue::from_str(&format_cookie(name, &token.value, &http_date(token.expires_at)))
}

fn format_cookie(name: &str, value: &str, expires: &str) -> String {
    format!("{}={}; Path=/; Expires={}; HttpOnly; Secure", name, value, expires)
}

/// IMF-fixdate, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`.
fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::extract_access_token;
    use axum::http::HeaderMap;
    use axum::http::header::COOKIE;

    fn pair() -> TokenPair {
        TokenPair {
            access: Token {
                value: "aaa.bbb.ccc".to_string(),
                expires_at: DateTime::from_timestamp(784111777, 0).unwrap(),
            },
            refresh: Token {
                value: "ddd.eee.fff".to_string(),
                expires_at: DateTime::from_timestamp(785321377, 0).unwrap(),
            },
        }
    }

    #[test]
    fn test_set_cookies_format() {
        let [access, refresh] = set_cookies(&pair()).unwrap();

        assert_eq!(
            access.to_str().unwrap(),
            "access_token=aaa.bbb.ccc; Path=/; Expires=Sun, 06 Nov 1994 08:49:37 GMT; HttpOnly; Secure"
        );
        assert_eq!(
            refresh.to_str().unwrap(),
            "refresh_token=ddd.eee.fff; Path=/; Expires=Sun, 20 Nov 1994 08:49:37 GMT; HttpOnly; Secure"
        );
    }

    const EPOCH: &str = "Thu, 01 Jan 1970 00:00:00 GMT";

    #[test]
    fn test_clear_cookies_match_format() {
        let [access, refresh] = clear_cookies();
        assert_eq!(access.to_str().unwrap(), format_cookie(ACCESS_TOKEN_COOKIE, "", EPOCH));
        assert_eq!(refresh.to_str().unwrap(), format_cookie(REFRESH_TOKEN_COOKIE, "", EPOCH));
    }

    #[test]
    fn test_cleared_cookie_is_not_an_access_token() {
        let [access, _] = clear_cookies();
        let cookie = access.to_str().unwrap().split(';').next().unwrap().to_string();

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(&cookie).unwrap());
        assert_eq!(extract_access_token(&headers), None);
    }

    #[test]
    fn test_invalid_value_is_rejected() {
        let mut bad = pair();
        bad.access.value = "line\nbreak".to_string();
        assert!(set_cookies(&bad).is_err());
    }
}
