//! Scalar text conversion between wire form and typed values.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, NaiveDateTime};
use thiserror::Error;
use uuid::Uuid;

use crate::model::ScalarKind;
use crate::value::ScalarValue;

/// Wire format of `Edm.DateTime` values, fractional seconds optional.
const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// A scalar conversion failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ConvertError {
    message: String,
}

impl ConvertError {
    /// Creates a conversion error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the failure message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Converts scalar property text to and from typed values.
///
/// The materializer consults a converter for every scalar it applies, so a
/// custom implementation can widen accepted wire forms or change how values
/// are rendered back.
pub trait ValueConverter {
    /// Parses wire text into a value of the given kind.
    fn from_text(&self, kind: ScalarKind, text: &str) -> Result<ScalarValue, ConvertError>;

    /// Renders a value back to its wire text.
    fn to_text(&self, value: &ScalarValue) -> String;
}

/// The stock converter, covering all fourteen scalar kinds.
///
/// Numeric and temporal text is trimmed before parsing; `String` values are
/// taken verbatim. Non-finite floats use the wire spellings `INF`, `-INF`
/// and `NaN`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultConverter;

impl ValueConverter for DefaultConverter {
    fn from_text(&self, kind: ScalarKind, text: &str) -> Result<ScalarValue, ConvertError> {
        match kind {
            ScalarKind::Boolean => match text.trim() {
                "true" | "1" => Ok(ScalarValue::Boolean(true)),
                "false" | "0" => Ok(ScalarValue::Boolean(false)),
                _ => Err(bad(kind, text)),
            },
            ScalarKind::Byte => parse_with(kind, text).map(ScalarValue::Byte),
            ScalarKind::SByte => parse_with(kind, text).map(ScalarValue::SByte),
            ScalarKind::Int16 => parse_with(kind, text).map(ScalarValue::Int16),
            ScalarKind::Int32 => parse_with(kind, text).map(ScalarValue::Int32),
            ScalarKind::Int64 => parse_with(kind, text).map(ScalarValue::Int64),
            ScalarKind::Single => parse_with(kind, text).map(ScalarValue::Single),
            ScalarKind::Double => parse_with(kind, text).map(ScalarValue::Double),
            ScalarKind::Decimal => {
                let trimmed = text.trim();
                if valid_decimal(trimmed) {
                    Ok(ScalarValue::Decimal(trimmed.to_string()))
                } else {
                    Err(bad(kind, text))
                }
            }
            ScalarKind::String => Ok(ScalarValue::String(text.to_string())),
            ScalarKind::Binary => STANDARD
                .decode(text.trim())
                .map(ScalarValue::Binary)
                .map_err(|_| bad(kind, text)),
            ScalarKind::Guid => Uuid::parse_str(text.trim())
                .map(ScalarValue::Guid)
                .map_err(|_| bad(kind, text)),
            ScalarKind::DateTime => NaiveDateTime::parse_from_str(text.trim(), DATETIME_FORMAT)
                .map(ScalarValue::DateTime)
                .map_err(|_| bad(kind, text)),
            ScalarKind::DateTimeOffset => DateTime::parse_from_rfc3339(text.trim())
                .map(ScalarValue::DateTimeOffset)
                .map_err(|_| bad(kind, text)),
        }
    }

    fn to_text(&self, value: &ScalarValue) -> String {
        match value {
            ScalarValue::Boolean(b) => if *b { "true" } else { "false" }.to_string(),
            ScalarValue::Byte(n) => n.to_string(),
            ScalarValue::SByte(n) => n.to_string(),
            ScalarValue::Int16(n) => n.to_string(),
            ScalarValue::Int32(n) => n.to_string(),
            ScalarValue::Int64(n) => n.to_string(),
            ScalarValue::Single(f) => single_text(*f),
            ScalarValue::Double(f) => double_text(*f),
            ScalarValue::Decimal(s) | ScalarValue::String(s) => s.clone(),
            ScalarValue::Binary(b) => STANDARD.encode(b),
            ScalarValue::Guid(g) => g.to_string(),
            ScalarValue::DateTime(dt) => dt.format(DATETIME_FORMAT).to_string(),
            ScalarValue::DateTimeOffset(dt) => dt.to_rfc3339(),
        }
    }
}

fn parse_with<T: std::str::FromStr>(kind: ScalarKind, text: &str) -> Result<T, ConvertError> {
    text.trim().parse().map_err(|_| bad(kind, text))
}

fn bad(kind: ScalarKind, text: &str) -> ConvertError {
    ConvertError::new(format!("{:?} is not a valid {}", text, kind.name()))
}

/// Accepts an optional sign, digits and at most one decimal point.
fn valid_decimal(text: &str) -> bool {
    let rest = text.strip_prefix(['-', '+']).unwrap_or(text);
    if rest.is_empty() {
        return false;
    }
    let mut digits = 0usize;
    let mut dots = 0usize;
    for c in rest.chars() {
        match c {
            '0'..='9' => digits += 1,
            '.' => dots += 1,
            _ => return false,
        }
    }
    digits > 0 && dots <= 1
}

fn single_text(value: f32) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value.is_sign_positive() { "INF" } else { "-INF" }.to_string()
    } else {
        value.to_string()
    }
}

fn double_text(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value.is_sign_positive() { "INF" } else { "-INF" }.to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn convert(kind: ScalarKind, text: &str) -> ScalarValue {
        DefaultConverter.from_text(kind, text).unwrap()
    }

    #[test]
    fn boolean_forms() {
        assert_eq!(
            convert(ScalarKind::Boolean, "true"),
            ScalarValue::Boolean(true)
        );
        assert_eq!(convert(ScalarKind::Boolean, "1"), ScalarValue::Boolean(true));
        assert_eq!(
            convert(ScalarKind::Boolean, " false "),
            ScalarValue::Boolean(false)
        );
        assert_eq!(
            convert(ScalarKind::Boolean, "0"),
            ScalarValue::Boolean(false)
        );
        assert!(DefaultConverter.from_text(ScalarKind::Boolean, "yes").is_err());
    }

    #[test]
    fn integer_kinds_parse_and_overflow() {
        assert_eq!(convert(ScalarKind::Byte, "255"), ScalarValue::Byte(255));
        assert_eq!(convert(ScalarKind::SByte, "-128"), ScalarValue::SByte(-128));
        assert_eq!(convert(ScalarKind::Int16, "-300"), ScalarValue::Int16(-300));
        assert_eq!(convert(ScalarKind::Int32, " 42 "), ScalarValue::Int32(42));
        assert_eq!(
            convert(ScalarKind::Int64, "9007199254740993"),
            ScalarValue::Int64(9_007_199_254_740_993)
        );

        let err = DefaultConverter
            .from_text(ScalarKind::Byte, "256")
            .unwrap_err();
        assert!(err.message().contains("Byte"));
        assert!(DefaultConverter.from_text(ScalarKind::Int32, "4.5").is_err());
    }

    #[test]
    fn non_finite_floats_use_wire_spellings() {
        assert_eq!(
            convert(ScalarKind::Double, "INF"),
            ScalarValue::Double(f64::INFINITY)
        );
        assert_eq!(
            convert(ScalarKind::Single, "-INF"),
            ScalarValue::Single(f32::NEG_INFINITY)
        );
        let nan = convert(ScalarKind::Double, "NaN");
        assert!(matches!(nan, ScalarValue::Double(f) if f.is_nan()));

        let converter = DefaultConverter;
        assert_eq!(converter.to_text(&ScalarValue::Double(f64::INFINITY)), "INF");
        assert_eq!(
            converter.to_text(&ScalarValue::Single(f32::NEG_INFINITY)),
            "-INF"
        );
        assert_eq!(converter.to_text(&ScalarValue::Double(f64::NAN)), "NaN");
        assert_eq!(converter.to_text(&ScalarValue::Double(2.5)), "2.5");
    }

    #[test]
    fn decimal_keeps_text() {
        assert_eq!(
            convert(ScalarKind::Decimal, " -12.50 "),
            ScalarValue::Decimal("-12.50".into())
        );
        assert_eq!(
            convert(ScalarKind::Decimal, "+3"),
            ScalarValue::Decimal("+3".into())
        );
        for bad in ["1e5", "1.2.3", ".", "", "12,5"] {
            assert!(
                DefaultConverter.from_text(ScalarKind::Decimal, bad).is_err(),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn string_is_taken_verbatim() {
        assert_eq!(
            convert(ScalarKind::String, "  padded  "),
            ScalarValue::String("  padded  ".into())
        );
    }

    #[test]
    fn binary_round_trips_base64() {
        let value = convert(ScalarKind::Binary, "AQID");
        assert_eq!(value, ScalarValue::Binary(vec![1, 2, 3]));
        assert_eq!(DefaultConverter.to_text(&value), "AQID");
        assert!(DefaultConverter.from_text(ScalarKind::Binary, "!!").is_err());
    }

    #[test]
    fn guid_parses() {
        let value = convert(ScalarKind::Guid, "6dcbf4a9-20ea-4cf9-a0d1-10dcbbca5abc");
        assert_eq!(
            DefaultConverter.to_text(&value),
            "6dcbf4a9-20ea-4cf9-a0d1-10dcbbca5abc"
        );
        assert!(DefaultConverter.from_text(ScalarKind::Guid, "not-a-guid").is_err());
    }

    #[test]
    fn datetime_with_and_without_fraction() {
        let plain = convert(ScalarKind::DateTime, "2010-03-10T08:38:10");
        if let ScalarValue::DateTime(dt) = plain {
            assert_eq!(dt.year(), 2010);
            assert_eq!(dt.second(), 10);
            assert_eq!(dt.nanosecond(), 0);
        } else {
            panic!("expected DateTime");
        }

        let fractional = convert(ScalarKind::DateTime, "2010-03-10T08:38:10.125");
        assert_eq!(
            DefaultConverter.to_text(&fractional),
            "2010-03-10T08:38:10.125"
        );
        assert!(DefaultConverter
            .from_text(ScalarKind::DateTime, "03/10/2010")
            .is_err());
    }

    #[test]
    fn datetimeoffset_accepts_zulu_and_offsets() {
        let zulu = convert(ScalarKind::DateTimeOffset, "2002-10-10T17:00:00Z");
        if let ScalarValue::DateTimeOffset(dt) = &zulu {
            assert_eq!(dt.offset().local_minus_utc(), 0);
        } else {
            panic!("expected DateTimeOffset");
        }

        let plus = convert(ScalarKind::DateTimeOffset, "2002-10-10T17:00:00+05:00");
        assert_eq!(
            DefaultConverter.to_text(&plus),
            "2002-10-10T17:00:00+05:00"
        );
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(64))]

            #[test]
            fn int64_text_round_trips(value in proptest::num::i64::ANY) {
                let converter = DefaultConverter;
                let text = converter.to_text(&ScalarValue::Int64(value));
                let back = converter.from_text(ScalarKind::Int64, &text).unwrap();
                prop_assert_eq!(back, ScalarValue::Int64(value));
            }

            #[test]
            fn binary_text_round_trips(bytes in proptest::collection::vec(proptest::num::u8::ANY, 0..64)) {
                let converter = DefaultConverter;
                let text = converter.to_text(&ScalarValue::Binary(bytes.clone()));
                let back = converter.from_text(ScalarKind::Binary, &text).unwrap();
                prop_assert_eq!(back, ScalarValue::Binary(bytes));
            }
        }
    }
}
