//! Shared validation helpers for inbound HTTP adapters.
//!
//! Identifier parse failures become validation errors whose details name the
//! offending JSON field, so scanner clients can highlight the right input.

use std::str::FromStr;

use serde_json::json;

use crate::domain::{Error, IdentifierValidationError};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValidationCode {
    InvalidIdentifier,
    InvalidValue,
    EmptyList,
}

impl ValidationCode {
    const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidIdentifier => "invalid_identifier",
            Self::InvalidValue => "invalid_value",
            Self::EmptyList => "empty_list",
        }
    }
}

/// Newtype wrapper for HTTP field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    const fn as_str(self) -> &'static str {
        self.0
    }
}

fn field_error(field: FieldName, message: String, code: ValidationCode, value: &str) -> Error {
    Error::validation(message).with_details(json!({
        "field": field.as_str(),
        "value": value,
        "code": code.as_str(),
    }))
}

/// Parse an identifier newtype, naming `field` on failure.
pub(crate) fn parse_identifier<T>(value: String, field: FieldName) -> Result<T, Error>
where
    T: TryFrom<String, Error = IdentifierValidationError>,
{
    let raw = value.clone();
    T::try_from(value).map_err(|error| {
        field_error(
            field,
            format!("{}: {error}", field.as_str()),
            ValidationCode::InvalidIdentifier,
            &raw,
        )
    })
}

/// Parse an optional identifier newtype.
pub(crate) fn parse_optional_identifier<T>(
    value: Option<String>,
    field: FieldName,
) -> Result<Option<T>, Error>
where
    T: TryFrom<String, Error = IdentifierValidationError>,
{
    value.map(|raw| parse_identifier(raw, field)).transpose()
}

/// Parse a label such as a status or channel through its `FromStr` impl.
pub(crate) fn parse_label<T>(value: &str, field: FieldName) -> Result<T, Error>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.parse::<T>().map_err(|error| {
        field_error(
            field,
            format!("{}: {error}", field.as_str()),
            ValidationCode::InvalidValue,
            value,
        )
    })
}

/// Reject empty bulk request lists.
pub(crate) fn require_non_empty<T>(values: &[T], field: FieldName) -> Result<(), Error> {
    if values.is_empty() {
        return Err(Error::validation(format!(
            "{} must contain at least one entry",
            field.as_str()
        ))
        .with_details(json!({
            "field": field.as_str(),
            "code": ValidationCode::EmptyList.as_str(),
        })));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::Value;

    use super::*;
    use crate::domain::{ErrorCode, HoldStatus, OperatorId, TripId};

    #[rstest]
    fn identifiers_are_parsed_and_trimmed() {
        let operator: OperatorId =
            parse_identifier(" OP7 ".to_owned(), FieldName::new("operatorId")).expect("operator");
        assert_eq!(operator.as_str(), "OP7");
    }

    #[rstest]
    fn invalid_identifier_names_the_field() {
        let error = parse_identifier::<TripId>("??".to_owned(), FieldName::new("tripId"))
            .expect_err("trip is invalid");

        assert_eq!(error.code(), ErrorCode::ValidationError);
        let details = error.details().expect("details");
        assert_eq!(details.get("field").and_then(Value::as_str), Some("tripId"));
        assert_eq!(
            details.get("code").and_then(Value::as_str),
            Some("invalid_identifier")
        );
    }

    #[rstest]
    fn absent_optional_identifier_is_none() {
        let parsed =
            parse_optional_identifier::<OperatorId>(None, FieldName::new("operatorId")).expect("ok");
        assert!(parsed.is_none());
    }

    #[rstest]
    #[case("scanned", Some(HoldStatus::Scanned))]
    #[case("shipped", None)]
    fn labels_parse_through_from_str(#[case] raw: &str, #[case] expected: Option<HoldStatus>) {
        let parsed = parse_label::<HoldStatus>(raw, FieldName::new("status")).ok();
        assert_eq!(parsed, expected);
    }

    #[rstest]
    fn empty_lists_are_rejected() {
        let error = require_non_empty::<u8>(&[], FieldName::new("items")).expect_err("empty");
        assert_eq!(error.code(), ErrorCode::ValidationError);
    }
}
