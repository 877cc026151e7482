use axum::{
    extract::{rejection::FormRejection, FromRef, State},
    routing::post,
    Form, Json, Router,
};
use tracing::{error, info, instrument, warn};

use super::{
    dto::{TokenForm, TokenResponse},
    jwt::JwtKeys,
    password::verify_password,
};
use crate::{error::AppError, state::AppState};

pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/token", post(login_for_access_token))
}

#[instrument(skip_all)]
pub async fn login_for_access_token(
    State(state): State<AppState>,
    form: Result<Form<TokenForm>, FormRejection>,
) -> Result<Json<TokenResponse>, AppError> {
    let Form(form) = form?;
    let email = form.username.trim();

    let user = match state.store.find_user_by_email(email).await? {
        Some(u) => u,
        None => {
            warn!("login unknown email");
            return Err(AppError::Unauthenticated);
        }
    };

    let ok = verify_password(&form.password, &user.password_hash).map_err(|e| {
        error!(error = %e, user_id = user.id, "verify_password failed");
        AppError::Internal(e)
    })?;
    if !ok {
        warn!(user_id = user.id, "login invalid password");
        return Err(AppError::Unauthenticated);
    }

    let token = JwtKeys::from_ref(&state).issue(&user.email)?;

    info!(user_id = user.id, "user logged in");
    Ok(Json(TokenResponse::bearer(token)))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::test_support::{form_request, json_request, send, TestApp};

    #[tokio::test]
    async fn issued_token_resolves_to_the_same_user() {
        let app = TestApp::new();
        let client = app.seed_user("client@example.com", "hunter2hunter2", false).await;

        let (status, body) = send(
            &app.router(),
            form_request("/token", &[("username", "client@example.com"), ("password", "hunter2hunter2")]),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["token_type"], "bearer");
        let token = body["access_token"].as_str().unwrap().to_string();

        let (status, me) = send(&app.router(), json_request("GET", "/users/me", Some(&token), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["id"], client.id);
        assert_eq!(me["email"], "client@example.com");
        assert!(me.get("password_hash").is_none());
    }

    #[tokio::test]
    async fn bad_credentials_are_uniformly_unauthenticated() {
        let app = TestApp::new();
        app.seed_user("client@example.com", "hunter2hunter2", false).await;

        for (user, pass) in [("client@example.com", "wrong-password"), ("nobody@example.com", "hunter2hunter2")] {
            let (status, body) =
                send(&app.router(), form_request("/token", &[("username", user), ("password", pass)])).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body["kind"], "not_authenticated");
        }
    }

    #[tokio::test]
    async fn email_match_is_case_sensitive() {
        let app = TestApp::new();
        app.seed_user("Client@example.com", "hunter2hunter2", false).await;

        let (status, _) = send(
            &app.router(),
            form_request("/token", &[("username", "client@example.com"), ("password", "hunter2hunter2")]),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn missing_expired_and_tampered_tokens_share_one_response() {
        let app = TestApp::new();
        let user = app.seed_user("client@example.com", "hunter2hunter2", false).await;
        let expired = app.expired_token_for(&user.email);
        let mut tampered = app.token_for(&user.email);
        tampered.push('x');

        let mut bodies = Vec::new();
        for token in [None, Some(expired.as_str()), Some(tampered.as_str()), Some("garbage")] {
            let (status, body) = send(&app.router(), json_request("GET", "/users/me", token, None)).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            bodies.push(body);
        }
        assert!(bodies.windows(2).all(|w| w[0] == w[1]));
    }

    #[tokio::test]
    async fn token_for_unknown_subject_is_unauthenticated() {
        let app = TestApp::new();
        let token = app.token_for("ghost@example.com");
        let (status, body) = send(&app.router(), json_request("GET", "/users/me", Some(&token), None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["kind"], "not_authenticated");
    }
}
