//! Identifier newtypes for dollies, VINs, stations, sessions, batches, and
//! shipments.
//!
//! Text identifiers are trimmed on construction and rejected when blank or
//! longer than [`IDENTIFIER_MAX`]. Trip and plate identifiers additionally
//! normalise their input and enforce the formats the carrier accepts.

use std::fmt;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Maximum accepted length for free-form identifiers.
pub const IDENTIFIER_MAX: usize = 64;

/// Validation errors returned by identifier constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentifierValidationError {
    Empty { kind: &'static str },
    TooLong { kind: &'static str, max: usize },
    InvalidTrip { value: String },
    InvalidPlate { value: String },
    InvalidBatch { value: String },
}

impl fmt::Display for IdentifierValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { kind } => write!(f, "{kind} must not be empty"),
            Self::TooLong { kind, max } => write!(f, "{kind} must be at most {max} characters"),
            Self::InvalidTrip { value } => write!(
                f,
                "trip id {value} must be 2-5 letters followed by 4-10 digits, or 5-20 letters and digits"
            ),
            Self::InvalidPlate { value } => write!(
                f,
                "plate id {value} must be 2 digits, 1-3 letters, then 2-5 digits"
            ),
            Self::InvalidBatch { value } => {
                write!(f, "batch id {value} must look like PTYYYYMMDDNNNN")
            }
        }
    }
}

impl std::error::Error for IdentifierValidationError {}

fn validate_text(kind: &'static str, raw: String) -> Result<String, IdentifierValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(IdentifierValidationError::Empty { kind });
    }
    if trimmed.chars().count() > IDENTIFIER_MAX {
        return Err(IdentifierValidationError::TooLong {
            kind,
            max: IDENTIFIER_MAX,
        });
    }
    if trimmed.len() == raw.len() {
        Ok(raw)
    } else {
        Ok(trimmed.to_owned())
    }
}

macro_rules! text_identifier {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Validate and construct the identifier from borrowed input.
            pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierValidationError> {
                Self::from_owned(value.as_ref().to_owned())
            }

            fn from_owned(value: String) -> Result<Self, IdentifierValidationError> {
                validate_text($kind, value).map(Self)
            }

            /// Borrow the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.0.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdentifierValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::from_owned(value)
            }
        }
    };
}

text_identifier!(
    /// Physical transport unit identifier.
    DollyId,
    "dolly id"
);
text_identifier!(
    /// Vehicle identification number carried on a dolly.
    VinId,
    "vin"
);
text_identifier!(
    /// Grouping station (end-of-line) name.
    StationId,
    "station"
);
text_identifier!(
    /// Loading session identifier.
    SessionId,
    "session id"
);
text_identifier!(
    /// Operator identity as supplied by the authentication layer.
    OperatorId,
    "operator id"
);

impl SessionId {
    /// Build the default `LOAD_{YYYYMMDD_HHMMSS}_{operator}` session id.
    ///
    /// # Examples
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use dolly_backend::domain::{OperatorId, SessionId};
    ///
    /// let at = Utc.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).single().expect("valid time");
    /// let operator = OperatorId::new("forklift-7").expect("operator");
    /// let session = SessionId::default_for(&operator, at);
    /// assert_eq!(session.as_str(), "LOAD_20260304_050607_forklift-7");
    /// ```
    pub fn default_for(operator: &OperatorId, at: chrono::DateTime<chrono::Utc>) -> Self {
        Self(format!("LOAD_{}_{}", at.format("%Y%m%d_%H%M%S"), operator))
    }
}

/// Surrogate identifier of a scan hold row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HoldId(i64);

impl HoldId {
    /// Wrap a raw row id.
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Access the raw row id.
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for HoldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

static BATCH_RE: OnceLock<Regex> = OnceLock::new();

fn batch_regex() -> &'static Regex {
    BATCH_RE.get_or_init(|| {
        Regex::new(r"^PT(\d{8})(\d{4})$")
            .unwrap_or_else(|error| panic!("batch regex failed to compile: {error}"))
    })
}

/// Batch identifier assigned once per completed loading session.
///
/// Format: `PT{YYYYMMDD}{counter:04}`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BatchId(String);

impl BatchId {
    /// Validate and construct a batch id from borrowed input.
    pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierValidationError> {
        Self::from_owned(value.as_ref().trim().to_owned())
    }

    /// Compose the batch id for `date` and a per-day `counter`.
    ///
    /// # Examples
    /// ```
    /// use chrono::NaiveDate;
    /// use dolly_backend::domain::BatchId;
    ///
    /// let date = NaiveDate::from_ymd_opt(2026, 1, 9).expect("date");
    /// assert_eq!(BatchId::compose(date, 12).as_str(), "PT202601090012");
    /// ```
    pub fn compose(date: NaiveDate, counter: u32) -> Self {
        Self(format!("PT{}{:04}", date.format("%Y%m%d"), counter))
    }

    /// Prefix shared by every batch id assigned on `date`.
    pub fn prefix_for(date: NaiveDate) -> String {
        format!("PT{}", date.format("%Y%m%d"))
    }

    /// Per-day counter encoded in the id.
    pub fn counter(&self) -> u32 {
        batch_regex()
            .captures(&self.0)
            .and_then(|captures| captures.get(2))
            .and_then(|counter| counter.as_str().parse().ok())
            .unwrap_or(0)
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    fn from_owned(value: String) -> Result<Self, IdentifierValidationError> {
        if batch_regex().is_match(&value) {
            Ok(Self(value))
        } else {
            Err(IdentifierValidationError::InvalidBatch { value })
        }
    }
}

impl AsRef<str> for BatchId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<BatchId> for String {
    fn from(value: BatchId) -> Self {
        value.0
    }
}

impl TryFrom<String> for BatchId {
    type Error = IdentifierValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

static TRIP_RE: OnceLock<Regex> = OnceLock::new();

fn trip_regex() -> &'static Regex {
    TRIP_RE.get_or_init(|| {
        Regex::new(r"^[A-Z]{2,5}\d{4,10}$|^[A-Z0-9]{5,20}$")
            .unwrap_or_else(|error| panic!("trip regex failed to compile: {error}"))
    })
}

/// Carrier trip identifier, trimmed and upper-cased.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TripId(String);

impl TripId {
    /// Normalise and validate a trip identifier.
    ///
    /// # Examples
    /// ```
    /// use dolly_backend::domain::TripId;
    ///
    /// let trip = TripId::new(" sfr20250001 ").expect("valid trip");
    /// assert_eq!(trip.as_str(), "SFR20250001");
    /// assert!(TripId::new("A1").is_err());
    /// ```
    pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierValidationError> {
        let normalised = value.as_ref().trim().to_uppercase();
        if trip_regex().is_match(&normalised) {
            Ok(Self(normalised))
        } else {
            Err(IdentifierValidationError::InvalidTrip { value: normalised })
        }
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for TripId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for TripId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<TripId> for String {
    fn from(value: TripId) -> Self {
        value.0
    }
}

impl TryFrom<String> for TripId {
    type Error = IdentifierValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

static PLATE_RE: OnceLock<Regex> = OnceLock::new();

fn plate_regex() -> &'static Regex {
    PLATE_RE.get_or_init(|| {
        Regex::new(r"^\d{2}[A-Z]{1,3}\d{2,5}$")
            .unwrap_or_else(|error| panic!("plate regex failed to compile: {error}"))
    })
}

/// Vehicle plate identifier with whitespace removed and letters upper-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PlateId(String);

impl PlateId {
    /// Normalise and validate a plate identifier.
    ///
    /// # Examples
    /// ```
    /// use dolly_backend::domain::PlateId;
    ///
    /// let plate = PlateId::new("34 abc 123").expect("valid plate");
    /// assert_eq!(plate.as_str(), "34ABC123");
    /// ```
    pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierValidationError> {
        let normalised: String = value
            .as_ref()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_uppercase();
        if plate_regex().is_match(&normalised) {
            Ok(Self(normalised))
        } else {
            Err(IdentifierValidationError::InvalidPlate { value: normalised })
        }
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for PlateId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for PlateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<PlateId> for String {
    fn from(value: PlateId) -> Self {
        value.0
    }
}

impl TryFrom<String> for PlateId {
    type Error = IdentifierValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

#[cfg(test)]
#[path = "identifiers_tests.rs"]
mod tests;
