use axum::body::Body;
use axum::http::{header, HeaderValue, Request, Response};
use axum::middleware::Next;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::Rng;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockWriteGuard};
use std::time::{Duration, Instant};

pub const CSRF_COOKIE: &str = "folio_csrf";

pub fn security_headers<B>(mut response: Response<B>) -> Response<B> {
    let headers = response.headers_mut();

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    // routes that set a stricter policy of their own keep it
    headers
        .entry(header::CONTENT_SECURITY_POLICY)
        .or_insert(HeaderValue::from_static(
            "default-src 'self'; script-src 'self' 'unsafe-inline'; style-src 'self' 'unsafe-inline'; img-src 'self' data: https:; font-src 'self'; frame-ancestors 'none'; base-uri 'self'; form-action 'self'",
        ));

    response
}

pub async fn apply_security_headers(request: Request<Body>, next: Next) -> Response<Body> {
    let response = next.run(request).await;
    security_headers(response)
}

/// Failed-login throttle keyed by client address.
pub struct RateLimiter {
    attempts: RwLock<HashMap<String, Vec<Instant>>>,
    max_attempts: usize,
    lockout: Duration,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(5, Duration::from_secs(900))
    }
}

impl RateLimiter {
    pub fn new(max_attempts: usize, lockout: Duration) -> Self {
        Self {
            attempts: RwLock::new(HashMap::new()),
            max_attempts,
            lockout,
        }
    }

    // a panic while holding the lock leaves plain data behind, still usable
    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Vec<Instant>>> {
        self.attempts.write().unwrap_or_else(|e| e.into_inner())
    }

    /// False while `key` has used up its attempts within the lockout window.
    pub fn check(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut attempts = self.write();
        let entry = attempts.entry(key.to_string()).or_default();
        entry.retain(|t| now.duration_since(*t) < self.lockout);
        entry.len() < self.max_attempts
    }

    pub fn record_attempt(&self, key: &str) {
        self.write()
            .entry(key.to_string())
            .or_default()
            .push(Instant::now());
    }

    pub fn clear(&self, key: &str) {
        self.write().remove(key);
    }

    pub fn cleanup(&self) {
        let now = Instant::now();
        self.write().retain(|_, v| {
            v.retain(|t| now.duration_since(*t) < self.lockout);
            !v.is_empty()
        });
    }
}

/// Double-submit token: the form field must equal the cookie.
pub struct CsrfManager;

impl CsrfManager {
    pub fn generate(&self) -> String {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }

    pub fn validate(&self, form_token: &str, cookie_token: &str) -> bool {
        !form_token.is_empty() && form_token == cookie_token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_security_headers_keep_existing_csp() {
        let response = security_headers(Response::new(()));
        let csp = response.headers()[header::CONTENT_SECURITY_POLICY].to_str().unwrap();
        assert!(csp.starts_with("default-src 'self'"));

        let mut response = Response::new(());
        response.headers_mut().insert(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static("sandbox"),
        );
        let response = security_headers(response);
        assert_eq!(response.headers()[header::CONTENT_SECURITY_POLICY], "sandbox");
        assert_eq!(response.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    }

    #[test]
    fn test_rate_limiter_locks_after_max_attempts() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        for _ in 0..3 {
            assert!(limiter.check("10.0.0.1"));
            limiter.record_attempt("10.0.0.1");
        }
        assert!(!limiter.check("10.0.0.1"));
        assert!(limiter.check("10.0.0.2"));

        limiter.clear("10.0.0.1");
        assert!(limiter.check("10.0.0.1"));
    }

    #[test]
    fn test_csrf_validation() {
        let csrf = CsrfManager;
        let token = csrf.generate();
        assert!(csrf.validate(&token, &token));
        assert!(!csrf.validate("", ""));
        assert!(!csrf.validate(&token, "other"));
    }
}
