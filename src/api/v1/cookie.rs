//! Cookie names and attribute formatting for the credential transport.
//! All credential cookies are `HttpOnly`; the session cookie additionally
//! carries an explicit `Max-Age` matching its server-side expiry window.

pub const ACCESS_COOKIE: &str = "accessToken";
pub const REFRESH_COOKIE: &str = "refreshToken";
pub const SESSION_COOKIE: &str = "session";

pub fn http_only(name: &str, value: &str) -> String {
    format!("{}={}; HttpOnly; Path=/", name, value)
}

pub fn http_only_max_age(name: &str, value: &str, max_age_secs: i64) -> String {
    format!(
        "{}={}; HttpOnly; Path=/; Max-Age={}",
        name,
        value,
        max_age_secs.max(0)
    )
}

pub fn expired(name: &str) -> String {
    format!("{}=; HttpOnly; Path=/; Max-Age=0", name)
}
