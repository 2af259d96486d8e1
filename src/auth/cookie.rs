//! Auth token cookie construction and extraction.
//!
//! The token travels in a single `HttpOnly` cookie named `token`. Cookie
//! lifetime is configured separately from token lifetime; `SameSite` is left
//! to the deployment.

use axum::http::{HeaderMap, HeaderValue};

use crate::config::SecurityConfig;

pub const TOKEN_COOKIE: &str = "token";

/// Build the `Set-Cookie` value carrying a freshly issued token.
pub fn auth_cookie(token: &str, security: &SecurityConfig) -> HeaderValue {
    let max_age_secs = security.cookie_ttl_hours * 60 * 60;
    let mut cookie = format!(
        "{}={}; Max-Age={}; Path=/; HttpOnly",
        TOKEN_COOKIE, token, max_age_secs
    );
    if security.cookie_secure {
        cookie.push_str("; Secure");
    }

    // Token values are base64url segments, always header-safe
    HeaderValue::from_str(&cookie)
        .unwrap_or_else(|_| HeaderValue::from_static("token=; Max-Age=0; Path=/; HttpOnly"))
}

/// Build the `Set-Cookie` value that clears the auth cookie on logout.
pub fn clear_cookie() -> HeaderValue {
    HeaderValue::from_static("token=; Max-Age=0; Path=/; HttpOnly")
}

/// Extract the token cookie value from a request's `Cookie` header.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get("cookie")
        .and_then(|v| v.to_str().ok())
        .and_then(|cookies| {
            cookies.split(';').find_map(|cookie| {
                let mut parts = cookie.trim().splitn(2, '=');
                let name = parts.next()?.trim();
                let value = parts.next()?.trim();
                if name == TOKEN_COOKIE {
                    Some(value.to_string())
                } else {
                    None
                }
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn auth_cookie_is_http_only_with_configured_max_age() {
        let mut security = AppConfig::development().security;
        security.cookie_ttl_hours = 2;

        let value = auth_cookie("abc.def.ghi", &security);
        let s = value.to_str().unwrap();
        assert!(s.starts_with("token=abc.def.ghi;"));
        assert!(s.contains("Max-Age=7200"));
        assert!(s.contains("HttpOnly"));
        assert!(!s.contains("Secure"));
    }

    #[test]
    fn secure_flag_follows_config() {
        let mut security = AppConfig::development().security;
        security.cookie_secure = true;

        let value = auth_cookie("t", &security);
        assert!(value.to_str().unwrap().contains("Secure"));
    }

    #[test]
    fn clear_cookie_expires_immediately() {
        let s = clear_cookie();
        let s = s.to_str().unwrap();
        assert!(s.starts_with("token=;"));
        assert!(s.contains("Max-Age=0"));
    }

    #[test]
    fn extracts_token_among_other_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "cookie",
            HeaderValue::from_static("theme=dark; token=abc123; lang=en"),
        );
        assert_eq!(token_from_headers(&headers).as_deref(), Some("abc123"));
    }

    #[test]
    fn missing_cookie_yields_none() {
        let headers = HeaderMap::new();
        assert!(token_from_headers(&headers).is_none());

        let mut headers = HeaderMap::new();
        headers.insert("cookie", HeaderValue::from_static("theme=dark"));
        assert!(token_from_headers(&headers).is_none());
    }
}
