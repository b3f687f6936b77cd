use crate::config::AuthCenterConfig;

pub const SESSION_COOKIE: &str = "token";

/// `Set-Cookie` value carrying the session JWT back to the dashboard.
pub fn session_cookie(cfg: &AuthCenterConfig, token: &str, max_age_secs: i64) -> String {
    let mut cookie = format!(
        "{SESSION_COOKIE}={token}; Path=/; Max-Age={max_age_secs}; HttpOnly; SameSite=Strict"
    );
    if cfg.cookie_secure {
        cookie.push_str("; Secure");
    }
    if let Some(domain) = &cfg.cookie_domain {
        cookie.push_str("; Domain=");
        cookie.push_str(domain);
    }
    cookie
}

/// Value of the session cookie in a `Cookie` request header, if present.
pub fn read_session_cookie(header: &str) -> Option<&str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value)
        .filter(|v| !v.is_empty())
}
