//! GraphQL scalar definitions.

use std::{fmt, marker::PhantomData, str::FromStr};

use juniper::{
    GraphQLType, InputValue, ParseScalarResult, ParseScalarValue, ScalarToken,
    ScalarValue, Value,
};

/// Helper type to use in `#[graphql(with = ..)]` attribute for newtypes over
/// validated domain values.
///
/// The scalar is represented as a GraphQL string, converted via the
/// [`FromStr`]/[`Display`] impls of the `As` domain type, so the domain
/// validation rules apply to GraphQL inputs too.
///
/// Target type must implement [`TryFrom`] and [`AsRef`] for `As` type.
///
/// [`Display`]: fmt::Display
#[derive(Debug)]
pub struct Via<As>(PhantomData<As>);

impl<As> Via<As> {
    /// Converts the target type into a string scalar [`Value`].
    pub fn to_output<T, S>(value: &T) -> Value<S>
    where
        As: fmt::Display,
        T: AsRef<As>,
        S: ScalarValue,
    {
        Value::from(value.as_ref().to_string())
    }

    /// Constructs the target type from a string scalar [`InputValue`].
    ///
    /// # Errors
    ///
    /// If the `input` is not a string, or is rejected by the `As` type
    /// validation, or cannot be converted into the target type.
    pub fn from_input<T, S>(input: &InputValue<S>) -> Result<T, String>
    where
        As: FromStr,
        As::Err: fmt::Display,
        T: TryFrom<As> + GraphQLType<S, TypeInfo = ()>,
        T::Error: fmt::Display,
        S: ScalarValue,
    {
        let invalid = |reason: &dyn fmt::Display| {
            format!("Invalid `{}` scalar: {reason}", name_of::<T, S>())
        };

        let s = input.as_string_value().ok_or_else(|| {
            invalid(&format_args!("expected string, found: {input}"))
        })?;
        s.parse::<As>()
            .map_err(|e| invalid(&format_args!("\"{s}\": {e}")))?
            .try_into()
            .map_err(|e| invalid(&e))
    }

    /// Parses the provided [`ScalarToken`] as a [`String`].
    ///
    /// # Errors
    ///
    /// If the token is not a string.
    pub fn parse_token<S: ScalarValue>(
        value: ScalarToken<'_>,
    ) -> ParseScalarResult<S> {
        <String as ParseScalarValue<S>>::from_str(value)
    }
}

/// Returns the GraphQL name of the `T` type.
fn name_of<T, S>() -> String
where
    T: GraphQLType<S, TypeInfo = ()>,
    S: ScalarValue,
{
    T::name(&()).map_or_else(|| "<unnamed>".to_owned(), |n| n.to_string())
}

#[cfg(test)]
mod spec {
    use hub::domain;
    use juniper::{DefaultScalarValue, InputValue};

    use crate::api::client::Email;

    use super::Via;

    fn parse(input: &InputValue) -> Result<Email, String> {
        Via::<domain::client::Email>::from_input::<Email, DefaultScalarValue>(
            input,
        )
    }

    #[test]
    fn accepts_valid_domain_value() {
        let email = parse(&InputValue::scalar("ops@example.com".to_owned()))
            .expect("valid email");

        assert_eq!(email.to_string(), "ops@example.com");
    }

    #[test]
    fn rejects_invalid_domain_value() {
        let err = parse(&InputValue::scalar("not an email".to_owned()))
            .expect_err("invalid email");

        assert!(err.starts_with("Invalid `ClientEmail` scalar"), "{err}");
    }

    #[test]
    fn rejects_non_string_input() {
        let err = parse(&InputValue::scalar(42)).expect_err("not a string");

        assert!(err.contains("expected string"), "{err}");
    }
}
