//! httpOnly token cookies for browser sign-in.
//!
//! The OAuth callback hands tokens to the browser through cookies instead of
//! a JSON body. The user extractor reads the access token back from them.

use axum::http::{
    header::{COOKIE, SET_COOKIE},
    HeaderMap, HeaderValue,
};

use crate::config::CookieConfig;

const EXPIRED: &str = "Thu, 01 Jan 1970 00:00:00 GMT";

/// Builds and reads the access/refresh token cookies.
#[derive(Debug, Clone)]
pub struct CookieHelper {
    config: CookieConfig,
    access_max_age: i64,
    refresh_max_age: i64,
}

impl CookieHelper {
    pub fn new(config: CookieConfig, access_max_age: i64, refresh_max_age: i64) -> Self {
        Self {
            config,
            access_max_age,
            refresh_max_age,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// `Set-Cookie` values carrying a fresh token pair.
    pub fn session_cookies(&self, access_token: &str, refresh_token: &str) -> [String; 2] {
        [
            self.render(
                &self.config.access_token_name,
                access_token,
                &self.config.access_token_path,
                Some(self.access_max_age),
            ),
            self.render(
                &self.config.refresh_token_name,
                refresh_token,
                &self.config.refresh_token_path,
                Some(self.refresh_max_age),
            ),
        ]
    }

    /// `Set-Cookie` values that remove both token cookies.
    pub fn clearing_cookies(&self) -> [String; 2] {
        [
            self.render(
                &self.config.access_token_name,
                "",
                &self.config.access_token_path,
                None,
            ),
            self.render(
                &self.config.refresh_token_name,
                "",
                &self.config.refresh_token_path,
                None,
            ),
        ]
    }

    /// Appends the session cookies to `headers`. No-op when cookies are disabled.
    pub fn set_session(&self, headers: &mut HeaderMap, access_token: &str, refresh_token: &str) {
        if self.config.enabled {
            append_all(headers, &self.session_cookies(access_token, refresh_token));
        }
    }

    /// Appends cookies that clear the session. No-op when cookies are disabled.
    pub fn clear_session(&self, headers: &mut HeaderMap) {
        if self.config.enabled {
            append_all(headers, &self.clearing_cookies());
        }
    }

    pub fn access_token<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
        if !self.config.enabled {
            return None;
        }
        read_cookie(headers, &self.config.access_token_name)
    }

    pub fn refresh_token<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
        if !self.config.enabled {
            return None;
        }
        read_cookie(headers, &self.config.refresh_token_name)
    }

    /// Renders one cookie. `max_age: None` produces an expired cookie.
    fn render(&self, name: &str, value: &str, path: &str, max_age: Option<i64>) -> String {
        let mut cookie = match max_age {
            Some(secs) => format!("{}={}; Path={}; Max-Age={}", name, value, path, secs),
            None => format!("{}=; Path={}; Max-Age=0; Expires={}", name, path, EXPIRED),
        };
        cookie.push_str("; HttpOnly");
        if self.config.secure {
            cookie.push_str("; Secure");
        }
        cookie.push_str("; SameSite=");
        cookie.push_str(&self.config.same_site);
        if !self.config.domain.is_empty() {
            cookie.push_str("; Domain=");
            cookie.push_str(&self.config.domain);
        }
        cookie
    }
}

fn append_all(headers: &mut HeaderMap, cookies: &[String]) {
    for cookie in cookies {
        if let Ok(value) = HeaderValue::from_str(cookie) {
            headers.append(SET_COOKIE, value);
        }
    }
}

/// Finds a cookie by name across all `Cookie` headers.
pub fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}
