use super::cookie;
use super::error::*;
use super::handler;
use crate::application_port::{AuthError, AuthOutcome, AuthService, SessionAuth, SessionService};
use crate::server::Server;
use std::convert::Infallible;
use std::sync::Arc;
use warp::{Filter, reject};

pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let sign_up = warp::post()
        .and(warp::path("sign-up"))
        .and(warp::path::end())
        .and(warp::body::json())
        .and(with(server.auth_service.clone()))
        .and_then(handler::sign_up);

    let login = warp::post()
        .and(warp::path("login"))
        .and(warp::path::end())
        .and(warp::body::json())
        .and(with(server.auth_service.clone()))
        .and_then(handler::login);

    let me = warp::get()
        .and(warp::path("me"))
        .and(warp::path::end())
        .and(with_token_auth(server.auth_service.clone()))
        .and(with(server.user_service.clone()))
        .and_then(handler::me);

    let session_login = warp::post()
        .and(warp::path("session"))
        .and(warp::path("login"))
        .and(warp::path::end())
        .and(warp::body::json())
        .and(with(server.auth_service.clone()))
        .and(with(server.session_service.clone()))
        .and_then(handler::session_login);

    let session_me = warp::get()
        .and(warp::path("session"))
        .and(warp::path("me"))
        .and(warp::path::end())
        .and(with_session_auth(server.session_service.clone()))
        .and(with(server.user_service.clone()))
        .and_then(handler::session_me);

    sign_up.or(login).or(me).or(session_login).or(session_me)
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

/// Gate for the stateless dual-token variant. Downstream filters only
/// ever see an [`AuthOutcome`]; every failure becomes a rejection here.
fn with_token_auth(
    auth_service: Arc<dyn AuthService>,
) -> impl Filter<Extract = (AuthOutcome,), Error = warp::Rejection> + Clone {
    warp::cookie::optional::<String>(cookie::ACCESS_COOKIE)
        .and(warp::cookie::optional::<String>(cookie::REFRESH_COOKIE))
        .and_then(
            move |access_token: Option<String>, refresh_token: Option<String>| {
                let auth_service = auth_service.clone();
                async move {
                    auth_service
                        .authenticate(access_token, refresh_token)
                        .await
                        .map_err(|err| {
                            // Only the terminal refresh-verify failure
                            // wipes client cookie state.
                            let clear = match &err {
                                AuthError::MissingCredential
                                | AuthError::Store(_)
                                | AuthError::InternalError(_) => ClearCookies::None,
                                _ => ClearCookies::TokenPair,
                            };
                            reject::custom(ApiRejection {
                                code: ApiErrorCode::from(err),
                                clear,
                            })
                        })
                }
            },
        )
}

/// Gate for the database-backed variant. A valid session comes back with
/// its expiry already slid forward.
fn with_session_auth(
    session_service: Arc<dyn SessionService>,
) -> impl Filter<Extract = (SessionAuth,), Error = warp::Rejection> + Clone {
    warp::cookie::optional::<String>(cookie::SESSION_COOKIE).and_then(
        move |key: Option<String>| {
            let session_service = session_service.clone();
            async move {
                session_service.authenticate(key).await.map_err(|err| {
                    let clear = match &err {
                        AuthError::SessionNotFound | AuthError::SessionExpired => {
                            ClearCookies::Session
                        }
                        _ => ClearCookies::None,
                    };
                    reject::custom(ApiRejection {
                        code: ApiErrorCode::from(err),
                        clear,
                    })
                })
            }
        },
    )
}
