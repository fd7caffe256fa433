//! services/api/src/web/middleware.rs
//!
//! Session middleware. The session cookie is parsed once per request into a
//! `SessionState` that handlers receive through request extensions.

use axum::{
    extract::Request,
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use campus_support_core::session::{Role, SessionState};
use tracing::warn;

pub const SESSION_COOKIE: &str = "session";

/// Reads the percent-encoded session cookie. A missing or unreadable cookie is anonymous.
pub fn session_from_headers(headers: &HeaderMap) -> SessionState {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|c| c.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, raw)| urlencoding::decode(raw).ok())
        .map(|value| value.parse::<SessionState>().unwrap_or_default())
        .unwrap_or_default()
}

/// Attaches the caller's `SessionState` to every request.
pub async fn load_session(mut req: Request, next: Next) -> Response {
    let session = session_from_headers(req.headers());
    req.extensions_mut().insert(session);
    next.run(req).await
}

/// Rejects callers not logged in as a counsellor.
pub async fn require_counsellor(req: Request, next: Next) -> Result<Response, StatusCode> {
    require_role(Role::Counsellor, req, next).await
}

/// Rejects callers not logged in as a student.
pub async fn require_student(req: Request, next: Next) -> Result<Response, StatusCode> {
    require_role(Role::Student, req, next).await
}

async fn require_role(role: Role, req: Request, next: Next) -> Result<Response, StatusCode> {
    let allowed = req
        .extensions()
        .get::<SessionState>()
        .is_some_and(|s| s.has_role(role));
    if !allowed {
        warn!(required = role.as_str(), path = %req.uri().path(), "Session gate rejected request");
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn session_cookie_is_found_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; session=student:CS21B001; lang=en"),
        );
        assert_eq!(
            session_from_headers(&headers),
            SessionState::Student("CS21B001".to_string())
        );
    }

    #[test]
    fn encoded_student_id_keeps_separators() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("session=student%3ACS21%3BB001%2C2; lang=en"),
        );
        assert_eq!(
            session_from_headers(&headers),
            SessionState::Student("CS21;B001,2".to_string())
        );
    }

    #[test]
    fn missing_cookie_is_anonymous() {
        assert_eq!(session_from_headers(&HeaderMap::new()), SessionState::Anonymous);
    }
}
