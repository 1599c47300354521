//! Authentication routes: magic link, social sign-in, session, sign-out.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use serde_json::json;
use tracing::{error, info};

use crate::AppState;
use crate::auth::{AuthError, SESSION_COOKIE};
use stowage_shared::AppError;
use stowage_shared::auth::{MagicLinkRequest, SocialSignInRequest, VerifyMagicLinkQuery};

/// Creates the auth router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/magic-link", post(send_magic_link))
        .route("/auth/magic-link/verify", get(verify_magic_link))
        .route("/auth/social", post(social_sign_in))
        .route("/auth/sign-out", post(sign_out))
        .route("/auth/session", get(get_session))
}

fn auth_error_response(err: &AuthError) -> Response {
    let app_error = match err {
        AuthError::InvalidEmail
        | AuthError::UnsupportedProvider(_)
        | AuthError::ProviderNotConfigured(_) => AppError::Validation(err.to_string()),
        AuthError::InvalidLink => AppError::Unauthorized(err.to_string()),
        AuthError::Email(_) => AppError::ExternalService(err.to_string()),
        AuthError::Token(_) => AppError::Internal(err.to_string()),
    };
    let status =
        StatusCode::from_u16(app_error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    (
        status,
        Json(json!({
            "error": app_error.error_code(),
            "message": err.to_string()
        })),
    )
        .into_response()
}

/// POST /auth/magic-link - Email a sign-in link.
async fn send_magic_link(
    State(state): State<AppState>,
    Json(payload): Json<MagicLinkRequest>,
) -> Response {
    match state.auth.sign_in_magic_link(&payload.email).await {
        Ok(()) => Json(json!({ "success": true })).into_response(),
        Err(e) => {
            error!(error = %e, "Magic link sign-in failed");
            auth_error_response(&e)
        }
    }
}

/// GET /auth/magic-link/verify - Exchange a link token for a session cookie.
async fn verify_magic_link(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<VerifyMagicLinkQuery>,
) -> Response {
    match state.auth.complete_magic_link(&query.token).await {
        Ok(issued) => {
            let lifetime = (issued.session.expires_at - Utc::now()).num_seconds().max(0);
            let cookie = Cookie::build((SESSION_COOKIE, issued.token))
                .path("/")
                .http_only(true)
                .secure(true)
                .same_site(SameSite::Lax)
                .max_age(time::Duration::seconds(lifetime));
            (jar.add(cookie), Json(issued.session)).into_response()
        }
        Err(e) => {
            info!(error = %e, "Magic link rejected");
            auth_error_response(&e)
        }
    }
}

/// POST /auth/social - Get the provider's authorization URL.
async fn social_sign_in(
    State(state): State<AppState>,
    Json(payload): Json<SocialSignInRequest>,
) -> Response {
    match state.auth.sign_in_social(&payload.provider).await {
        Ok(redirect) => Json(redirect).into_response(),
        Err(e) => auth_error_response(&e),
    }
}

/// POST /auth/sign-out - Clear the session cookie.
async fn sign_out(State(state): State<AppState>, headers: HeaderMap, jar: CookieJar) -> Response {
    if let Err(e) = state.auth.sign_out(&headers).await {
        error!(error = %e, "Sign-out failed");
        return auth_error_response(&e);
    }
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, Json(json!({ "success": true }))).into_response()
}

/// GET /auth/session - The caller's session, or `null`.
async fn get_session(State(state): State<AppState>, headers: HeaderMap) -> Response {
    match state.auth.get_session(&headers).await {
        Ok(session) => Json(session).into_response(),
        Err(e) => auth_error_response(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create_router;
    use crate::test_support::{StaticAuth, state};
    use axum::{
        body::Body,
        http::{Request, header::SET_COOKIE},
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn json_body(response: Response) -> serde_json::Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_session_is_null_when_signed_out() {
        let (_, state) = state(StaticAuth::signed_out());

        let response = create_router(state)
            .oneshot(
                Request::builder()
                    .uri("/api/v1/auth/session")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(json_body(response).await.is_null());
    }

    #[tokio::test]
    async fn test_session_when_signed_in() {
        let (_, state) = state(StaticAuth::signed_in());

        let response = create_router(state)
            .oneshot(
                Request::builder()
                    .uri("/api/v1/auth/session")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let json = json_body(response).await;
        assert_eq!(json["user"]["email"], "ada@example.com");
    }

    #[tokio::test]
    async fn test_sign_out_clears_cookie() {
        let (_, state) = state(StaticAuth::signed_in());

        let response = create_router(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/auth/sign-out")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response
            .headers()
            .get(SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap()
            .to_string();
        assert!(cookie.starts_with("stowage_session="));
        assert!(cookie.contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn test_unknown_social_provider_is_bad_request() {
        let (_, state) = state(StaticAuth::signed_out());

        let response = create_router(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/auth/social")
                    .header("Content-Type", "application/json")
                    .body(Body::from(r#"{"provider":"myspace"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert_eq!(json["error"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_verified_link_sets_persistent_secure_cookie() {
        let (_, state) = state(StaticAuth::signed_in());

        let response = create_router(state)
            .oneshot(
                Request::builder()
                    .uri("/api/v1/auth/magic-link/verify?token=valid-link")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response
            .headers()
            .get(SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap()
            .to_string();
        assert!(cookie.starts_with("stowage_session=session-token"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));

        let max_age: i64 = cookie
            .split(';')
            .map(str::trim)
            .find_map(|attr| attr.strip_prefix("Max-Age="))
            .unwrap()
            .parse()
            .unwrap();
        assert!((3500..=3600).contains(&max_age), "{cookie}");

        let json = json_body(response).await;
        assert_eq!(json["user"]["email"], "ada@example.com");
    }

    #[tokio::test]
    async fn test_bad_magic_link_is_unauthorized() {
        let (_, state) = state(StaticAuth::signed_out());

        let response = create_router(state)
            .oneshot(
                Request::builder()
                    .uri("/api/v1/auth/magic-link/verify?token=bogus")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
