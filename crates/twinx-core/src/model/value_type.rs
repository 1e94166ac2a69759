use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat};
use serde::{Deserialize, Serialize};

use crate::errors::{Result, TwinError};

/// XSD data types a scalar element value can carry
///
/// Values are stored in their lexical form; `normalize` validates a raw
/// lexical value against the type and returns its canonical spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DataTypeDefXsd {
    #[default]
    #[serde(rename = "xs:string")]
    String,
    #[serde(rename = "xs:boolean")]
    Boolean,
    #[serde(rename = "xs:int")]
    Int,
    #[serde(rename = "xs:integer")]
    Integer,
    #[serde(rename = "xs:long")]
    Long,
    #[serde(rename = "xs:short")]
    Short,
    #[serde(rename = "xs:byte")]
    Byte,
    #[serde(rename = "xs:unsignedInt")]
    UnsignedInt,
    #[serde(rename = "xs:unsignedLong")]
    UnsignedLong,
    #[serde(rename = "xs:unsignedShort")]
    UnsignedShort,
    #[serde(rename = "xs:unsignedByte")]
    UnsignedByte,
    #[serde(rename = "xs:double")]
    Double,
    #[serde(rename = "xs:float")]
    Float,
    #[serde(rename = "xs:decimal")]
    Decimal,
    #[serde(rename = "xs:dateTime")]
    DateTime,
    #[serde(rename = "xs:date")]
    Date,
    #[serde(rename = "xs:time")]
    Time,
    #[serde(rename = "xs:anyURI")]
    AnyUri,
    #[serde(rename = "xs:base64Binary")]
    Base64Binary,
}

impl DataTypeDefXsd {
    /// The `xs:` name of the type
    pub fn xsd_name(&self) -> &'static str {
        match self {
            DataTypeDefXsd::String => "xs:string",
            DataTypeDefXsd::Boolean => "xs:boolean",
            DataTypeDefXsd::Int => "xs:int",
            DataTypeDefXsd::Integer => "xs:integer",
            DataTypeDefXsd::Long => "xs:long",
            DataTypeDefXsd::Short => "xs:short",
            DataTypeDefXsd::Byte => "xs:byte",
            DataTypeDefXsd::UnsignedInt => "xs:unsignedInt",
            DataTypeDefXsd::UnsignedLong => "xs:unsignedLong",
            DataTypeDefXsd::UnsignedShort => "xs:unsignedShort",
            DataTypeDefXsd::UnsignedByte => "xs:unsignedByte",
            DataTypeDefXsd::Double => "xs:double",
            DataTypeDefXsd::Float => "xs:float",
            DataTypeDefXsd::Decimal => "xs:decimal",
            DataTypeDefXsd::DateTime => "xs:dateTime",
            DataTypeDefXsd::Date => "xs:date",
            DataTypeDefXsd::Time => "xs:time",
            DataTypeDefXsd::AnyUri => "xs:anyURI",
            DataTypeDefXsd::Base64Binary => "xs:base64Binary",
        }
    }

    /// True for the integral types
    pub fn is_integral(&self) -> bool {
        matches!(
            self,
            DataTypeDefXsd::Int
                | DataTypeDefXsd::Integer
                | DataTypeDefXsd::Long
                | DataTypeDefXsd::Short
                | DataTypeDefXsd::Byte
                | DataTypeDefXsd::UnsignedInt
                | DataTypeDefXsd::UnsignedLong
                | DataTypeDefXsd::UnsignedShort
                | DataTypeDefXsd::UnsignedByte
        )
    }

    /// True for the floating point / decimal types
    pub fn is_numeric(&self) -> bool {
        self.is_integral()
            || matches!(
                self,
                DataTypeDefXsd::Double | DataTypeDefXsd::Float | DataTypeDefXsd::Decimal
            )
    }

    /// Validate `raw` as a lexical value of this type and return its canonical form
    ///
    /// `name` only feeds the error message.
    ///
    /// # Errors
    /// * `CoercionFailed` - if `raw` is not a valid lexical value of this type
    pub fn normalize(&self, name: &str, raw: &str) -> Result<String> {
        let fail = || TwinError::CoercionFailed {
            name: name.to_string(),
            value_type: self.xsd_name().to_string(),
            value: raw.to_string(),
        };
        let trimmed = raw.trim();

        match self {
            DataTypeDefXsd::String | DataTypeDefXsd::AnyUri => Ok(raw.to_string()),
            DataTypeDefXsd::Boolean => match trimmed {
                "true" | "1" | "True" | "TRUE" => Ok("true".to_string()),
                "false" | "0" | "False" | "FALSE" => Ok("false".to_string()),
                _ => Err(fail()),
            },
            DataTypeDefXsd::Int => parse_in_range(trimmed, i32::MIN as i128, i32::MAX as i128)
                .ok_or_else(fail),
            DataTypeDefXsd::Integer => trimmed
                .parse::<i128>()
                .map(|v| v.to_string())
                .map_err(|_| fail()),
            DataTypeDefXsd::Long => parse_in_range(trimmed, i64::MIN as i128, i64::MAX as i128)
                .ok_or_else(fail),
            DataTypeDefXsd::Short => parse_in_range(trimmed, i16::MIN as i128, i16::MAX as i128)
                .ok_or_else(fail),
            DataTypeDefXsd::Byte => {
                parse_in_range(trimmed, i8::MIN as i128, i8::MAX as i128).ok_or_else(fail)
            }
            DataTypeDefXsd::UnsignedInt => {
                parse_in_range(trimmed, 0, u32::MAX as i128).ok_or_else(fail)
            }
            DataTypeDefXsd::UnsignedLong => {
                parse_in_range(trimmed, 0, u64::MAX as i128).ok_or_else(fail)
            }
            DataTypeDefXsd::UnsignedShort => {
                parse_in_range(trimmed, 0, u16::MAX as i128).ok_or_else(fail)
            }
            DataTypeDefXsd::UnsignedByte => {
                parse_in_range(trimmed, 0, u8::MAX as i128).ok_or_else(fail)
            }
            DataTypeDefXsd::Double => canonical_float::<f64>(trimmed).ok_or_else(fail),
            DataTypeDefXsd::Float => canonical_float::<f32>(trimmed).ok_or_else(fail),
            DataTypeDefXsd::Decimal => canonical_decimal(trimmed).ok_or_else(fail),
            // the timezone is optional in xs:dateTime
            DataTypeDefXsd::DateTime => match DateTime::parse_from_rfc3339(trimmed) {
                Ok(dt) => Ok(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
                Err(_) => NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
                    .map(|dt| dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
                    .map_err(|_| fail()),
            },
            DataTypeDefXsd::Date => NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .map(|d| d.format("%Y-%m-%d").to_string())
                .map_err(|_| fail()),
            DataTypeDefXsd::Time => NaiveTime::parse_from_str(trimmed, "%H:%M:%S%.f")
                .map(|t| t.format("%H:%M:%S%.f").to_string())
                .map_err(|_| fail()),
            DataTypeDefXsd::Base64Binary => {
                use base64::Engine;
                base64::engine::general_purpose::STANDARD
                    .decode(trimmed)
                    .map(|_| trimmed.to_string())
                    .map_err(|_| fail())
            }
        }
    }
}

impl std::fmt::Display for DataTypeDefXsd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.xsd_name())
    }
}

fn parse_in_range(raw: &str, min: i128, max: i128) -> Option<String> {
    let digits = raw.strip_prefix('+').unwrap_or(raw);
    let v = digits.parse::<i128>().ok()?;
    (min..=max).contains(&v).then(|| v.to_string())
}

/// Canonical spelling of an `xs:double` / `xs:float` lexical value
///
/// Only the XSD spellings of the special values are accepted (`INF`,
/// `-INF`, `NaN`); values past the type's range become infinite.
fn canonical_float<F>(raw: &str) -> Option<String>
where
    F: std::str::FromStr + std::fmt::Display + Copy + Into<f64>,
{
    match raw {
        "INF" | "+INF" => return Some("INF".to_string()),
        "-INF" => return Some("-INF".to_string()),
        "NaN" => return Some("NaN".to_string()),
        _ => {}
    }
    let lexical = !raw.is_empty()
        && raw
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'));
    if !lexical {
        return None;
    }

    let v: F = raw.parse().ok()?;
    let wide: f64 = v.into();
    let out = if wide.is_infinite() {
        let spelling = if wide < 0.0 { "-INF" } else { "INF" };
        spelling.to_string()
    } else if wide.fract() == 0.0 && wide.abs() < 1e15 {
        // keep "21.0" distinguishable from an integer lexical form
        format!("{:.1}", v)
    } else {
        v.to_string()
    };
    Some(out)
}

/// Canonical spelling of an `xs:decimal` lexical value
///
/// Works on the digits directly so no precision is lost. Leading zeros of
/// the integer part and trailing zeros of the fraction are dropped.
fn canonical_decimal(raw: &str) -> Option<String> {
    let (negative, body) = match raw.as_bytes().first() {
        Some(b'-') => (true, &raw[1..]),
        Some(b'+') => (false, &raw[1..]),
        _ => (false, raw),
    };
    let (int_part, frac_part) = body.split_once('.').unwrap_or((body, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(int_part) || !all_digits(frac_part) {
        return None;
    }

    let int_part = match int_part.trim_start_matches('0') {
        "" => "0",
        digits => digits,
    };
    let frac_part = match frac_part.trim_end_matches('0') {
        "" => "0",
        digits => digits,
    };
    let sign = if negative && (int_part != "0" || frac_part != "0") {
        "-"
    } else {
        ""
    };
    Some(format!("{}{}.{}", sign, int_part, frac_part))
}
