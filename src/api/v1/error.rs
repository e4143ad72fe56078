use crate::api::v1::cookie;
use crate::api::v1::handler::ApiResponse;
use crate::application_port::AuthError;
use serde::Serialize;
use std::convert::Infallible;
use thiserror::Error;
use tracing::{debug, warn};
use warp::http::StatusCode;
use warp::http::header::{HeaderValue, SET_COOKIE};
use warp::reply::Reply;
use warp::{Rejection, reject};

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
}

/// External error vocabulary. Every authenticator failure branch maps to
/// the single `Unauthenticated` code so callers cannot tell missing,
/// malformed, expired, and forged credentials apart.
#[derive(Debug, Clone, Error, Serialize)]
pub enum ApiErrorCode {
    #[error("Unauthorized")]
    Unauthenticated,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Email already registered")]
    EmailTaken,
    #[error("Invalid input")]
    InvalidInput,
    #[error("Internal error")]
    InternalError,
}

impl ApiErrorCode {
    pub fn internal<E: std::fmt::Display>(error: E) -> ApiErrorCode {
        warn!("Internal error: {}", error);
        ApiErrorCode::InternalError
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiErrorCode::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiErrorCode::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiErrorCode::EmailTaken => StatusCode::CONFLICT,
            ApiErrorCode::InvalidInput => StatusCode::BAD_REQUEST,
            ApiErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Which credential cookies a failure response must expire. Only the
/// terminal verify-failure branches clear anything; a merely absent
/// cookie leaves client state alone.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ClearCookies {
    None,
    TokenPair,
    Session,
}

#[derive(Debug)]
pub struct ApiRejection {
    pub code: ApiErrorCode,
    pub clear: ClearCookies,
}

impl reject::Reject for ApiRejection {}

impl ApiRejection {
    pub fn new(code: ApiErrorCode) -> Self {
        ApiRejection {
            code,
            clear: ClearCookies::None,
        }
    }
}

impl From<ApiErrorCode> for ApiRejection {
    fn from(code: ApiErrorCode) -> Self {
        ApiRejection::new(code)
    }
}

impl From<AuthError> for ApiErrorCode {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::MissingCredential
            | AuthError::TokenInvalid
            | AuthError::TokenExpired
            | AuthError::SessionNotFound
            | AuthError::SessionExpired
            | AuthError::UserNotFound => {
                debug!("authentication failed: {}", error);
                ApiErrorCode::Unauthenticated
            }
            AuthError::InvalidCredentials => ApiErrorCode::InvalidCredentials,
            AuthError::EmailTaken => ApiErrorCode::EmailTaken,
            AuthError::Validation(reason) => {
                debug!("input rejected: {}", reason);
                ApiErrorCode::InvalidInput
            }
            AuthError::Store(e) => ApiErrorCode::internal(e),
            AuthError::InternalError(e) => ApiErrorCode::internal(e),
        }
    }
}

pub async fn recover_error(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    if let Some(rejection) = err.find::<ApiRejection>() {
        let json = warp::reply::json(&ApiResponse::<()>::err(
            rejection.code.clone(),
            rejection.code.to_string(),
        ));
        let mut res = warp::reply::with_status(json, rejection.code.status()).into_response();

        // Expired Set-Cookie headers go out ahead of the error body.
        let expired: &[&str] = match rejection.clear {
            ClearCookies::None => &[],
            ClearCookies::TokenPair => &[cookie::ACCESS_COOKIE, cookie::REFRESH_COOKIE],
            ClearCookies::Session => &[cookie::SESSION_COOKIE],
        };
        for name in expired.iter().copied() {
            if let Ok(value) = HeaderValue::from_str(&cookie::expired(name)) {
                res.headers_mut().append(SET_COOKIE, value);
            }
        }
        Ok(res)
    } else if err.is_not_found() {
        let json = warp::reply::json(&ApiResponse::<()>::err(
            ApiErrorCode::InvalidInput,
            "Not found".to_string(),
        ));
        Ok(warp::reply::with_status(json, StatusCode::NOT_FOUND).into_response())
    } else {
        warn!("Unhandled rejection: {:?}", err);
        let json = warp::reply::json(&ApiResponse::<()>::err(
            ApiErrorCode::InternalError,
            "Internal server error".to_string(),
        ));
        Ok(warp::reply::with_status(json, StatusCode::INTERNAL_SERVER_ERROR).into_response())
    }
}
