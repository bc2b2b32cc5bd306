//! [`Context`]-related definitions.
use std::sync::{
    atomic::{self, AtomicU16},
    Arc,
};

use axum::{async_trait, extract::FromRequestParts, RequestPartsExt as _};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use juniper::{
    http::{GraphQLBatchResponse, GraphQLResponse},
    IntoFieldError as _,
};
use secrecy::{ExposeSecret as _, SecretString};
use tokio::sync::OnceCell;

use crate::{define_error, AsError as _, Error, Hub, JuniperResponse};

/// Bearer token guarding GraphQL mutations, if any is configured.
#[derive(Clone, Debug, Default)]
pub struct ApiToken(pub Option<Arc<SecretString>>);

/// Application context.
#[derive(Debug)]
pub struct Context {
    /// [`Hub`] instance.
    hub: Hub,

    /// Error status code.
    error_status_code: AtomicU16,

    /// Parts of the HTTP request.
    parts: http::request::Parts,

    /// Configured [`ApiToken`].
    api_token: ApiToken,

    /// Result of the authorization of the current HTTP request.
    authorization: OnceCell<Result<(), Error>>,
}

impl Context {
    /// Returns [`Hub`] instance of this [`Context`].
    #[must_use]
    pub fn hub(&self) -> &Hub {
        &self.hub
    }

    /// Returns the error status code of this [`Context`].
    #[expect(clippy::missing_panics_doc, reason = "infallible")]
    #[must_use]
    pub fn error_status_code(&self) -> http::StatusCode {
        http::StatusCode::from_u16(
            self.error_status_code.load(atomic::Ordering::Relaxed),
        )
        .expect("invalid status code")
    }

    /// Sets the error status code for this [`Context`].
    ///
    /// Provided [`http::StatusCode`] will be applied to the response.
    pub fn set_error_status_code(&self, status_code: http::StatusCode) {
        self.error_status_code
            .store(status_code.as_u16(), atomic::Ordering::Relaxed);
    }

    /// Helper method calling [`Context::set_error_status_code()`] inside
    /// [`Result::map_err()`] closure.
    pub fn error(&self) -> impl FnOnce(Error) -> Error + '_ {
        move |err| {
            self.set_error_status_code(err.status_code);
            err
        }
    }

    /// Ensures the current HTTP request carries the configured
    /// [`ApiToken`], if any.
    ///
    /// # Errors
    ///
    /// Errors if:
    /// - the current HTTP request is not authorized;
    /// - the provided token doesn't match the configured one.
    pub async fn authorize(&self) -> Result<(), Error> {
        self.authorization
            .get_or_init(|| async { self.do_authorization().await })
            .await
            .clone()
            .map_err(self.error())
    }

    /// Performs the authorization of the current HTTP request.
    async fn do_authorization(&self) -> Result<(), Error> {
        let Some(expected) = &self.api_token.0 else {
            return Ok(());
        };

        match self
            .parts
            .clone()
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
        {
            Ok(TypedHeader(Authorization(bearer))) => {
                if bearer.token() == expected.expose_secret() {
                    Ok(())
                } else {
                    Err(AuthError::InvalidToken.into())
                }
            }
            Err(e) if e.is_missing() => {
                Err(AuthError::AuthorizationRequired.into())
            }
            Err(e) => Err(e.into_error()),
        }
    }
}

impl juniper::Context for Context {}

#[async_trait]
impl<S> FromRequestParts<S> for Context
where
    S: Send + Sync,
{
    type Rejection = JuniperResponse;

    async fn from_request_parts(
        parts: &mut http::request::Parts,
        _: &S,
    ) -> Result<Self, Self::Rejection> {
        let hub = parts.extensions.get::<Hub>().cloned().ok_or_else(|| {
            JuniperResponse {
                status_code: http::StatusCode::INTERNAL_SERVER_ERROR,
                response: GraphQLBatchResponse::Single(GraphQLResponse::error(
                    Error::internal(&"missing `Hub` extension")
                        .into_field_error(),
                )),
            }
        })?;
        let api_token =
            parts.extensions.get::<ApiToken>().cloned().unwrap_or_default();

        Ok(Self {
            hub,
            error_status_code: AtomicU16::new(
                http::StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            ),
            parts: parts.clone(),
            api_token,
            authorization: OnceCell::new(),
        })
    }
}

define_error! {
    enum AuthError {
        #[code = "AUTHORIZATION_REQUIRED"]
        #[status = UNAUTHORIZED]
        #[message = "Authorization required"]
        AuthorizationRequired,

        #[code = "INVALID_TOKEN"]
        #[status = UNAUTHORIZED]
        #[message = "Provided API token is invalid"]
        InvalidToken,
    }
}
