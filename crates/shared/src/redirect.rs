//! Redirect target sanitizing for the OAuth callback.

/// Returns `next` when it is a same-origin absolute path, otherwise `fallback`.
///
/// Only paths beginning with a single `/` are accepted. Protocol-relative
/// (`//host`) and backslash (`/\host`) forms are rejected because browsers
/// resolve them against another origin.
pub fn safe_redirect_path<'a>(next: Option<&'a str>, fallback: &'a str) -> &'a str {
    match next {
        Some(path)
            if path.starts_with('/')
                && !path.starts_with("//")
                && !path.starts_with("/\\")
                && !path.chars().any(|c| c.is_control()) =>
        {
            path
        }
        _ => fallback,
    }
}

/// Chooses the origin to redirect to after a successful sign-in.
///
/// Development always uses the configured base URL. Behind a proxy in
/// production the `X-Forwarded-Host` header names the public host.
pub fn redirect_origin(base_url: &str, is_development: bool, forwarded_host: Option<&str>) -> String {
    let base = base_url.trim_end_matches('/');
    if is_development {
        return base.to_string();
    }
    match forwarded_host.map(str::trim).filter(|h| !h.is_empty()) {
        Some(host) => format!("https://{}", host),
        None => base.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_relative_path() {
        assert_eq!(safe_redirect_path(Some("/events/1"), "/events"), "/events/1");
        assert_eq!(
            safe_redirect_path(Some("/invite/AB12CD34?x=1"), "/events"),
            "/invite/AB12CD34?x=1"
        );
    }

    #[test]
    fn test_falls_back_when_missing() {
        assert_eq!(safe_redirect_path(None, "/events"), "/events");
    }

    #[test]
    fn test_rejects_absolute_and_protocol_relative_urls() {
        assert_eq!(safe_redirect_path(Some("https://evil.example"), "/events"), "/events");
        assert_eq!(safe_redirect_path(Some("//evil.example"), "/events"), "/events");
        assert_eq!(safe_redirect_path(Some("/\\evil.example"), "/events"), "/events");
        assert_eq!(safe_redirect_path(Some("events"), "/events"), "/events");
    }

    #[test]
    fn test_rejects_control_characters() {
        assert_eq!(safe_redirect_path(Some("/a\r\nLocation: x"), "/events"), "/events");
    }

    #[test]
    fn test_redirect_origin_development_ignores_forwarded_host() {
        assert_eq!(
            redirect_origin("http://localhost:3000/", true, Some("public.example")),
            "http://localhost:3000"
        );
    }

    #[test]
    fn test_redirect_origin_production_prefers_forwarded_host() {
        assert_eq!(
            redirect_origin("http://internal:3000", false, Some("meetup.example")),
            "https://meetup.example"
        );
        assert_eq!(
            redirect_origin("https://meetup.example", false, None),
            "https://meetup.example"
        );
        assert_eq!(
            redirect_origin("https://meetup.example", false, Some("  ")),
            "https://meetup.example"
        );
    }
}
