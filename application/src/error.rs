//! [`Error`]-related definitions.

use std::{convert::Infallible, fmt};

use axum_extra::typed_header::TypedHeaderRejection;
use derive_more::Error as StdError;
use hub::infra::database;
use juniper::IntoFieldError;
use tracerr::{Trace, Traced};
use tracing as log;

/// Defines a new error enum, each variant of which maps to a client-facing
/// [`Error`] with the given code, HTTP status and message.
#[expect(clippy::module_name_repetitions, reason = "more readable")]
#[macro_export]
macro_rules! define_error {
    (
        enum $name:ident {
            $(
                #[code = $code:literal]
                #[status = $status_code:ident]
                #[message = $message:literal]
                $variant:ident
            ),* $(,)?
        }
    ) => {
        /// Error type.
        #[derive(
            Clone,
            Copy,
            Debug,
            ::derive_more::Display,
            ::derive_more::Error
        )]
        #[repr(u16)]
        pub enum $name {
            $(
                #[display($message)]
                #[doc = $message]
                $variant,
            )*
        }

        impl From<$name> for $crate::Error {
            fn from(err: $name) -> Self {
                match err {
                    $(
                        $name::$variant => Self::new(
                            $code,
                            ::http::StatusCode::$status_code,
                            $message,
                        ),
                    )*
                }
            }
        }
    };
}

/// Error returned to GraphQL API clients.
#[derive(Clone, Debug, StdError)]
pub struct Error {
    /// [`Error`] code.
    pub code: Code,

    /// [`http::StatusCode`] of this [`Error`].
    pub status_code: http::StatusCode,

    /// Backtrace of this [`Error`].
    #[error(not(backtrace))]
    pub backtrace: Option<Trace>,

    /// [`Error`] message.
    pub message: String,
}

impl Error {
    /// Creates a new [`Error`] without a backtrace.
    #[must_use]
    pub fn new(
        code: Code,
        status_code: http::StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code,
            status_code,
            backtrace: None,
            message: message.into(),
        }
    }

    /// Creates a new [`Error`] representing an internal server error.
    #[must_use]
    pub fn internal(msg: &impl ToString) -> Self {
        Self::new(
            "INTERNAL_SERVER_ERROR",
            http::StatusCode::INTERNAL_SERVER_ERROR,
            msg.to_string(),
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            code,
            status_code: _,
            backtrace,
            message,
        } = self;

        write!(f, "[{code}]: {message}")?;
        if let Some(trace) = backtrace {
            write!(f, "\n{trace}")?;
        }
        Ok(())
    }
}

impl<S> IntoFieldError<S> for Error
where
    S: From<String>,
{
    fn into_field_error(self) -> juniper::FieldError<S> {
        let Self {
            code,
            status_code: _,
            backtrace,
            message,
        } = self;

        let mut ext = juniper::Object::with_capacity(2);
        _ = ext.add_field("code", juniper::Value::scalar(code.to_owned()));
        if let Some(trace) = backtrace {
            _ = ext.add_field(
                "backtrace",
                juniper::Value::list(
                    trace
                        .iter()
                        .map(|frame| juniper::Value::scalar(frame.to_string()))
                        .collect(),
                ),
            );
        }
        juniper::FieldError::new(message, juniper::Value::object(ext))
    }
}

/// [`Error`] code.
pub type Code = &'static str;

/// Helper trait for converting types into [`Error`]s.
pub trait AsError {
    /// Tries to convert the type into an [`Error`].
    ///
    /// [`None`] is returned if the type cannot be converted into an [`Error`].
    fn try_as_error(&self) -> Option<Error>;

    /// Converts the type into an [`Error`], falling back to an internal
    /// server one.
    fn as_error(&self) -> Error
    where
        Self: fmt::Display,
    {
        self.try_as_error().unwrap_or_else(|| {
            log::error!("internal server error: {self}");
            Error::internal(&self)
        })
    }

    /// Converts the type into an [`Error`] by consuming it.
    fn into_error(self) -> Error
    where
        Self: fmt::Display + Sized,
    {
        self.as_error()
    }
}

impl<E: AsError> AsError for Traced<E> {
    fn try_as_error(&self) -> Option<Error> {
        let mut error = self.as_ref().try_as_error()?;
        error.backtrace = Some(self.trace().clone());
        Some(error)
    }
}

impl AsError for TypedHeaderRejection {
    fn try_as_error(&self) -> Option<Error> {
        Some(Error::new(
            "BAD_REQUEST",
            http::StatusCode::BAD_REQUEST,
            self.to_string(),
        ))
    }
}

impl AsError for database::Error {
    fn try_as_error(&self) -> Option<Error> {
        None
    }
}

impl AsError for Infallible {
    fn try_as_error(&self) -> Option<Error> {
        match *self {}
    }
}

#[cfg(test)]
mod spec {
    use std::fmt;

    use juniper::{DefaultScalarValue, IntoFieldError};

    use super::{AsError, Error};

    crate::define_error! {
        enum TestError {
            #[code = "SERVICE_EXPIRED"]
            #[status = CONFLICT]
            #[message = "`Service` is expired"]
            Expired,
        }
    }

    #[test]
    fn maps_defined_error() {
        let err = Error::from(TestError::Expired);

        assert_eq!(err.code, "SERVICE_EXPIRED");
        assert_eq!(err.status_code, http::StatusCode::CONFLICT);
        assert_eq!(err.to_string(), "[SERVICE_EXPIRED]: `Service` is expired");
    }

    #[test]
    fn exposes_code_in_extensions() {
        let field = IntoFieldError::<DefaultScalarValue>::into_field_error(
            Error::from(TestError::Expired),
        );

        assert_eq!(field.message(), "`Service` is expired");
        let code = field
            .extensions()
            .as_object_value()
            .and_then(|o| o.get_field_value("code"))
            .and_then(|v| v.as_string_value());
        assert_eq!(code, Some("SERVICE_EXPIRED"));
    }

    #[test]
    fn falls_back_to_internal_error() {
        struct Opaque;

        impl fmt::Display for Opaque {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("connection reset")
            }
        }

        impl AsError for Opaque {
            fn try_as_error(&self) -> Option<Error> {
                None
            }
        }

        let err = Opaque.as_error();

        assert_eq!(err.code, "INTERNAL_SERVER_ERROR");
        assert_eq!(err.message, "connection reset");
    }
}
