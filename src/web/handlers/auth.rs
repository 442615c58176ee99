use crate::services::auth;
use crate::services::gate::is_admin_email;
use crate::web::error::AppResult;
use crate::web::extractors::{session_cookie, SESSION_COOKIE};
use crate::web::security::CSRF_COOKIE;
use crate::web::state::AppState;
use axum::extract::{ConnectInfo, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tera::Context;
use time::Duration;

const DEFAULT_NEXT: &str = "/admin";

/// Only local admin paths are honoured, so the login form cannot be used as
/// an open redirect.
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(n) if (n == "/admin" || n.starts_with("/admin/") || n.starts_with("/admin?"))
            && !n.starts_with("/admin/login") =>
        {
            n
        }
        _ => DEFAULT_NEXT,
    }
}

fn render_login(
    state: &AppState,
    jar: CookieJar,
    status: StatusCode,
    next: &str,
    email: &str,
    error: Option<&str>,
) -> AppResult<Response> {
    let csrf_token = state.csrf.generate();
    let cookie = Cookie::build((CSRF_COOKIE, csrf_token.clone()))
        .path("/admin")
        .http_only(true)
        .same_site(SameSite::Strict)
        .build();

    let mut ctx = Context::new();
    ctx.insert("site", &state.config.site);
    ctx.insert("next", next);
    ctx.insert("email", email);
    ctx.insert("csrf_token", &csrf_token);
    if let Some(error) = error {
        ctx.insert("error", error);
    }
    let html = state.templates.render("admin/login.html", &ctx)?;
    Ok((status, jar.add(cookie), Html(html)).into_response())
}

#[derive(Deserialize)]
pub struct LoginQuery {
    next: Option<String>,
}

pub async fn login_form(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(query): Query<LoginQuery>,
) -> AppResult<Response> {
    let next = safe_next(query.next.as_deref());
    render_login(&state, jar, StatusCode::OK, next, "", None)
}

#[derive(Deserialize)]
pub struct LoginForm {
    email: String,
    password: String,
    #[serde(default)]
    next: Option<String>,
    #[serde(default)]
    csrf_token: String,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    addr: Option<ConnectInfo<SocketAddr>>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    let next = safe_next(form.next.as_deref()).to_string();
    let client = addr
        .map(|ConnectInfo(a)| a.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let cookie_token = jar.get(CSRF_COOKIE).map(|c| c.value().to_string()).unwrap_or_default();
    if !state.csrf.validate(&form.csrf_token, &cookie_token) {
        return render_login(
            &state,
            jar,
            StatusCode::BAD_REQUEST,
            &next,
            &form.email,
            Some("Your session expired, please try again"),
        );
    }

    if !state.rate_limiter.check(&client) {
        tracing::warn!("Login rate limit hit for {}", client);
        return render_login(
            &state,
            jar,
            StatusCode::TOO_MANY_REQUESTS,
            &next,
            &form.email,
            Some("Too many attempts, try again later"),
        );
    }

    match auth::authenticate(&state.db, &form.email, &form.password)? {
        Some(user) => {
            state.rate_limiter.clear(&client);
            let lifetime = state.config.auth.session_lifetime_days;
            let token = auth::create_session(&state.db, user.id, lifetime)?;
            tracing::info!("{} signed in", user.email);

            // non-admins still get a session; the gate shows them the unauthorized view
            let target = if is_admin_email(state.config.auth.admin_email.as_deref(), &user.email) {
                next
            } else {
                DEFAULT_NEXT.to_string()
            };
            Ok((jar.add(session_cookie(token, lifetime)), Redirect::to(&target)).into_response())
        }
        None => {
            state.rate_limiter.record_attempt(&client);
            render_login(
                &state,
                jar,
                StatusCode::UNAUTHORIZED,
                &next,
                &form.email,
                Some("Invalid email or password"),
            )
        }
    }
}

pub async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> AppResult<Response> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if let Err(e) = auth::delete_session(&state.db, cookie.value()) {
            tracing::warn!("Failed to delete session on logout: {}", e);
        }
    }

    let cookie = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .max_age(Duration::ZERO)
        .build();

    Ok((jar.remove(cookie), Redirect::to("/admin/login")).into_response())
}
