use super::cookie;
use super::error::*;
use crate::application_port::*;
use crate::domain_model::{User, UserId};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::http::header::{HeaderValue, SET_COOKIE};
use warp::reply::{Reply, Response};
use warp::{self, reject};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(code: ApiErrorCode, message: impl Into<String>) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(ApiError {
                code,
                message: message.into(),
            }),
        }
    }
}

/// Queue `Set-Cookie` headers on a response. Credential cookies have to
/// be attached before the body goes out; appending to the response
/// headers guarantees that ordering.
fn append_cookies(res: &mut Response, cookies: &[String]) -> Result<(), warp::Rejection> {
    for raw in cookies {
        let value = HeaderValue::from_str(raw)
            .map_err(|e| reject::custom(ApiRejection::new(ApiErrorCode::internal(e))))?;
        res.headers_mut().append(SET_COOKIE, value);
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub user_id: UserId,
}

pub async fn sign_up(
    body: SignupRequest,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let user_id = auth_service
        .signup(SignupInput {
            email: body.email,
            password: body.password,
        })
        .await
        .map_err(ApiErrorCode::from)
        .map_err(ApiRejection::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(SignupResponse {
        user_id,
    })))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: UserId,
}

pub async fn login(
    body: LoginRequest,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let result = auth_service
        .login(LoginInput {
            email: body.email,
            password: body.password,
        })
        .await
        .map_err(ApiErrorCode::from)
        .map_err(ApiRejection::from)
        .map_err(reject::custom)?;

    let mut res = warp::reply::json(&ApiResponse::ok(LoginResponse {
        user_id: result.user_id,
    }))
    .into_response();

    append_cookies(
        &mut res,
        &[
            cookie::http_only(cookie::ACCESS_COOKIE, &result.tokens.access_token.0),
            cookie::http_only(cookie::REFRESH_COOKIE, &result.tokens.refresh_token.0),
        ],
    )?;
    Ok(res)
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: User,
}

pub async fn me(
    outcome: AuthOutcome,
    user_service: Arc<dyn UserService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let user = user_service
        .get_user(outcome.principal().user_id)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(ApiRejection::from)
        .map_err(reject::custom)?;

    let mut res = warp::reply::json(&ApiResponse::ok(MeResponse { user })).into_response();

    // A silent reissue looks identical to the caller except for the
    // refreshed cookies.
    if let AuthOutcome::AuthenticatedAndReissued { tokens, .. } = outcome {
        let mut cookies = vec![cookie::http_only(
            cookie::ACCESS_COOKIE,
            &tokens.access_token.0,
        )];
        if let Some(refresh_token) = &tokens.refresh_token {
            cookies.push(cookie::http_only(cookie::REFRESH_COOKIE, &refresh_token.0));
        }
        append_cookies(&mut res, &cookies)?;
    }
    Ok(res)
}

#[derive(Debug, Serialize)]
pub struct SessionLoginResponse {
    pub user_id: UserId,
}

pub async fn session_login(
    body: LoginRequest,
    auth_service: Arc<dyn AuthService>,
    session_service: Arc<dyn SessionService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let user_id = auth_service
        .verify_credentials(LoginInput {
            email: body.email,
            password: body.password,
        })
        .await
        .map_err(ApiErrorCode::from)
        .map_err(ApiRejection::from)
        .map_err(reject::custom)?;

    let started = session_service
        .start_session(user_id)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(ApiRejection::from)
        .map_err(reject::custom)?;

    let max_age = (started.expires_at - Utc::now()).num_seconds();
    let mut res =
        warp::reply::json(&ApiResponse::ok(SessionLoginResponse { user_id })).into_response();
    append_cookies(
        &mut res,
        &[cookie::http_only_max_age(
            cookie::SESSION_COOKIE,
            &started.key.0,
            max_age,
        )],
    )?;
    Ok(res)
}

pub async fn session_me(
    auth: SessionAuth,
    user_service: Arc<dyn UserService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let user = user_service
        .get_user(auth.user_id)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(ApiRejection::from)
        .map_err(reject::custom)?;

    let mut res = warp::reply::json(&ApiResponse::ok(MeResponse { user })).into_response();

    // Same key, refreshed max-age: the cookie mirrors the slid expiry.
    let max_age = (auth.expires_at - Utc::now()).num_seconds();
    append_cookies(
        &mut res,
        &[cookie::http_only_max_age(
            cookie::SESSION_COOKIE,
            &auth.key.0,
            max_age,
        )],
    )?;
    Ok(res)
}
