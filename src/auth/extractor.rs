//! Token extraction from inbound request headers.
//!
//! An access token may arrive as `Authorization: Bearer <jwt>` or as an
//! `access_token=<jwt>` cookie; the header wins when both are present. The
//! refresh flows read `refresh_token=<jwt>` from the cookie header.

use http::HeaderMap;
use http::header::{AUTHORIZATION, COOKIE};

/// Cookie carrying the access token.
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Cookie carrying the refresh token.
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

/// Pull the access token out of `headers`, preferring a bearer token.
pub fn extract_access_token(headers: &HeaderMap) -> Option<String> {
    bearer_token(headers).or_else(|| cookie_value(headers, ACCESS_TOKEN_COOKIE))
}

/// Pull the refresh token out of the cookie header.
pub fn extract_refresh_token(headers: &HeaderMap) -> Option<String> {
    cookie_value(headers, REFRESH_TOKEN_COOKIE)
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();

    (!token.is_empty()).then(|| token.to_string())
}

/// Find `name=<value>` across every `Cookie` header.
///
/// Segments are split on `;` and trimmed, then matched by prefix.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let prefix = format!("{}=", name);

    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .map(str::trim)
        .find_map(|segment| segment.strip_prefix(prefix.as_str()))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    fn headers(pairs: &[(http::header::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_bearer_token() {
        let h = headers(&[(AUTHORIZATION, "Bearer abc.def.ghi")]);
        assert_eq!(extract_access_token(&h).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_non_bearer_scheme_is_ignored() {
        let h = headers(&[(AUTHORIZATION, "Basic dXNlcjpwdw==")]);
        assert_eq!(extract_access_token(&h), None);
    }

    #[test]
    fn test_cookie_fallback() {
        let h = headers(&[(COOKIE, "theme=dark;  access_token=tok123 ; other=x")]);
        assert_eq!(extract_access_token(&h).as_deref(), Some("tok123"));
    }

    #[test]
    fn test_bearer_preferred_over_cookie() {
        let h = headers(&[
            (AUTHORIZATION, "Bearer from-header"),
            (COOKIE, "access_token=from-cookie"),
        ]);
        assert_eq!(extract_access_token(&h).as_deref(), Some("from-header"));
    }

    #[test]
    fn test_refresh_cookie_is_not_an_access_token() {
        let h = headers(&[(COOKIE, "refresh_token=r1")]);
        assert_eq!(extract_access_token(&h), None);
        assert_eq!(extract_refresh_token(&h).as_deref(), Some("r1"));
    }

    #[test]
    fn test_multiple_cookie_headers() {
        let h = headers(&[(COOKIE, "a=1"), (COOKIE, "refresh_token=r2")]);
        assert_eq!(extract_refresh_token(&h).as_deref(), Some("r2"));
    }

    #[test]
    fn test_empty_values_are_absent() {
        let h = headers(&[(AUTHORIZATION, "Bearer "), (COOKIE, "access_token=")]);
        assert_eq!(extract_access_token(&h), None);
        assert_eq!(extract_access_token(&HeaderMap::new()), None);
    }
}
