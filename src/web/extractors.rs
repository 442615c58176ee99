use crate::models::User;
use crate::services::auth;
use crate::services::gate::GateState;
use crate::services::identity::{ClientStorage, SESSION_ID_KEY};
use crate::web::state::AppState;
use axum::body::Body;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, HeaderValue, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{Html, IntoResponse, Json, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use tera::Context;

pub const SESSION_COOKIE: &str = "folio_session";
const ADMIN_API_PREFIX: &str = "/admin/api";

/// Visitor storage backed by the request's cookies. Writes accumulate in the
/// jar, which the handler must return for them to reach the browser.
pub struct CookieStorage {
    jar: CookieJar,
    cross_site: bool,
}

impl CookieStorage {
    pub fn new(jar: CookieJar) -> Self {
        Self {
            jar,
            cross_site: false,
        }
    }

    /// Cookies for a front end served from another origin. Browsers only send
    /// `SameSite=None` cookies on cross-site requests, and only over HTTPS.
    pub fn cross_site(mut self, cross_site: bool) -> Self {
        self.cross_site = cross_site;
        self
    }

    pub fn into_jar(self) -> CookieJar {
        self.jar
    }
}

impl ClientStorage for CookieStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.jar.get(key).map(|c| c.value().to_string())
    }

    fn set(&mut self, key: &str, value: &str) {
        let mut cookie = Cookie::build((key.to_string(), value.to_string()))
            .path("/")
            .http_only(true);
        cookie = if self.cross_site {
            cookie.same_site(SameSite::None).secure(true)
        } else {
            cookie.same_site(SameSite::Lax)
        };
        // the session id lives for the browser session only
        if key != SESSION_ID_KEY {
            cookie = cookie.max_age(time::Duration::days(365));
        }
        self.jar = std::mem::take(&mut self.jar).add(cookie);
    }

    fn remove(&mut self, key: &str) {
        let cookie = Cookie::build((key.to_string(), "")).path("/");
        self.jar = std::mem::take(&mut self.jar).remove(cookie);
    }
}

pub fn session_cookie(token: String, lifetime_days: i64) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::days(lifetime_days))
        .build()
}

/// Slot the admin gate fills when it extends a session, so the response can
/// carry a cookie with the new lifetime.
#[derive(Clone, Default)]
pub struct SessionRenewal(Arc<Mutex<Option<(String, i64)>>>);

impl SessionRenewal {
    fn fill(&self, token: String, lifetime_days: i64) {
        if let Ok(mut slot) = self.0.lock() {
            *slot = Some((token, lifetime_days));
        }
    }

    fn take(&self) -> Option<(String, i64)> {
        self.0.lock().ok().and_then(|mut slot| slot.take())
    }
}

/// Re-issues the session cookie after the gate has refreshed the session.
pub async fn renew_session_cookie(mut request: Request<Body>, next: Next) -> Response {
    let renewal = SessionRenewal::default();
    request.extensions_mut().insert(renewal.clone());

    let mut response = next.run(request).await;
    if let Some((token, lifetime_days)) = renewal.take() {
        let cookie = session_cookie(token, lifetime_days);
        match HeaderValue::from_str(&cookie.to_string()) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => tracing::warn!("Could not re-issue session cookie: {}", e),
        }
    }
    response
}

fn session_token(parts: &Parts) -> Option<String> {
    CookieJar::from_headers(&parts.headers)
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
}

/// Why the admin gate turned a request away.
#[derive(Debug, thiserror::Error)]
pub enum GateRejection {
    #[error("sign in required")]
    Unauthenticated { next: String, json: bool },
    #[error("{email} is not allowed to use the admin panel")]
    Unauthorized {
        email: String,
        json: bool,
        page: Option<String>,
    },
    #[error("could not verify session")]
    Internal { json: bool },
}

pub fn login_redirect(next: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(next.as_bytes()).collect();
    format!("/admin/login?next={}", encoded)
}

impl IntoResponse for GateRejection {
    fn into_response(self) -> Response {
        let message = self.to_string();
        match self {
            GateRejection::Unauthenticated { json: true, .. } => (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({ "error": "Unauthorized", "message": message })),
            )
                .into_response(),
            GateRejection::Unauthenticated { next, json: false } => {
                Redirect::to(&login_redirect(&next)).into_response()
            }
            GateRejection::Unauthorized { json: true, .. } => (
                StatusCode::FORBIDDEN,
                Json(serde_json::json!({ "error": "Forbidden", "message": message })),
            )
                .into_response(),
            GateRejection::Unauthorized { page, .. } => {
                let body = page.unwrap_or_else(|| "<h1>Unauthorized</h1>".to_string());
                (StatusCode::FORBIDDEN, Html(body)).into_response()
            }
            GateRejection::Internal { json: true } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "Internal server error" })),
            )
                .into_response(),
            GateRejection::Internal { json: false } => {
                crate::web::error::error_panel(StatusCode::INTERNAL_SERVER_ERROR, None)
            }
        }
    }
}

/// A request that made it through the admin gate.
pub struct AdminUser(pub User);

impl FromRequestParts<Arc<AppState>> for AdminUser {
    type Rejection = GateRejection;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        state: &'life1 Arc<AppState>,
    ) -> Pin<Box<dyn Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>>
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        let state = state.clone();
        let token = session_token(parts);
        let renewal = parts.extensions.get::<SessionRenewal>().cloned();
        let json = parts.uri.path().starts_with(ADMIN_API_PREFIX);
        let next = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| "/admin".to_string());

        Box::pin(async move {
            let outcome = state.gate().check(token.as_deref()).map_err(|e| {
                tracing::error!("Gate check failed: {}", e);
                GateRejection::Internal { json }
            })?;

            match (outcome.state, outcome.user) {
                (GateState::Authorized, Some(user)) => {
                    if let (Some(renewal), Some(token)) = (renewal, token) {
                        renewal.fill(token, state.config.auth.session_lifetime_days);
                    }
                    Ok(AdminUser(user))
                }
                (GateState::Unauthorized, Some(user)) => {
                    let page = if json {
                        None
                    } else {
                        let mut ctx = Context::new();
                        ctx.insert("site", &state.config.site);
                        ctx.insert("email", &user.email);
                        state.templates.render("admin/unauthorized.html", &ctx).ok()
                    };
                    Err(GateRejection::Unauthorized {
                        email: user.email,
                        json,
                        page,
                    })
                }
                _ => Err(GateRejection::Unauthenticated { next, json }),
            }
        })
    }
}

/// The signed-in user, if any, without the admin check.
pub struct OptionalUser(pub Option<User>);

impl FromRequestParts<Arc<AppState>> for OptionalUser {
    type Rejection = StatusCode;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        state: &'life1 Arc<AppState>,
    ) -> Pin<Box<dyn Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>>
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        let state = state.clone();
        let token = session_token(parts);
        Box::pin(async move {
            let user = match token {
                Some(t) => auth::validate_session(&state.db, &t).ok().flatten(),
                None => None,
            };
            Ok(OptionalUser(user))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::identity::{visitor_id, HAS_VISITED_KEY};

    #[test]
    fn test_cookie_storage_round_trip() {
        let mut storage = CookieStorage::new(CookieJar::new());
        let id = visitor_id(&mut storage);
        assert_eq!(storage.get(crate::services::identity::VISITOR_ID_KEY), Some(id));

        storage.set(HAS_VISITED_KEY, "true");
        storage.remove(HAS_VISITED_KEY);
        assert_eq!(storage.get(HAS_VISITED_KEY), None);
    }

    #[test]
    fn test_session_id_cookie_has_no_max_age() {
        let mut storage = CookieStorage::new(CookieJar::new());
        storage.set(SESSION_ID_KEY, "session_1_abc");
        storage.set(HAS_VISITED_KEY, "true");
        let jar = storage.into_jar();
        assert!(jar.get(SESSION_ID_KEY).and_then(|c| c.max_age()).is_none());
        assert!(jar.get(HAS_VISITED_KEY).and_then(|c| c.max_age()).is_some());
    }

    #[test]
    fn test_cross_site_cookies_are_secure_and_samesite_none() {
        let mut storage = CookieStorage::new(CookieJar::new()).cross_site(true);
        storage.set(SESSION_ID_KEY, "session_1_abc");
        let jar = storage.into_jar();
        let cookie = jar.get(SESSION_ID_KEY).unwrap();
        assert_eq!(cookie.same_site(), Some(SameSite::None));
        assert_eq!(cookie.secure(), Some(true));

        let mut storage = CookieStorage::new(CookieJar::new());
        storage.set(SESSION_ID_KEY, "session_1_abc");
        let jar = storage.into_jar();
        let cookie = jar.get(SESSION_ID_KEY).unwrap();
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_ne!(cookie.secure(), Some(true));
    }

    #[test]
    fn test_session_renewal_is_taken_once() {
        let renewal = SessionRenewal::default();
        assert!(renewal.take().is_none());
        renewal.clone().fill("tok".to_string(), 7);
        assert_eq!(renewal.take(), Some(("tok".to_string(), 7)));
        assert!(renewal.take().is_none());
    }

    #[test]
    fn test_login_redirect_encodes_next() {
        assert_eq!(
            login_redirect("/admin/projects?x=1"),
            "/admin/login?next=%2Fadmin%2Fprojects%3Fx%3D1"
        );
    }
}
