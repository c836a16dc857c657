//! Primitive type and `format` mapping.
//!
//! `format` is advisory: an unrecognized format leaves a plain string, never an error.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use base64::Engine as _;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

use crate::model::TypeKind;
use crate::schema::JsonSchema;

/// A recognized string `format`, with any refinement the format implies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatKind {
    Date,
    Time,
    DateTime,
    Duration,
    Email,
    /// `uri`, optionally restricted to the schemes of the `scheme` keyword.
    Uri { schemes: Option<Vec<String>> },
    /// `uuid` or `uuidN`; the version is checked when given.
    Uuid { version: Option<usize> },
    Ipv4,
    Ipv6,
    IpAny,
    Base64,
    Binary,
    /// Secret string: validated as a plain string, masked when displayed.
    Password,
    /// A string holding a JSON document.
    JsonString,
    Regex,
}

/// Returns the semantic kind of a primitive `type` name, or `None` when the
/// name is not a primitive (`object`, `array`, or unknown).
#[must_use]
pub fn map_primitive(type_name: &str, node: &JsonSchema) -> Option<TypeKind> {
    let kind: TypeKind = match type_name {
        "string" => TypeKind::String(node.format.as_deref().and_then(|f| map_format(f, node))),
        "integer" => TypeKind::Integer,
        "number" => TypeKind::Number,
        "boolean" => TypeKind::Boolean,
        "null" => TypeKind::Null,
        _ => return None,
    };
    Some(kind)
}

/// Maps a `format` value to its refinement. Unknown formats map to `None`.
#[must_use]
pub fn map_format(format: &str, node: &JsonSchema) -> Option<FormatKind> {
    let kind: FormatKind = match format {
        "date" => FormatKind::Date,
        "time" => FormatKind::Time,
        "date-time" => FormatKind::DateTime,
        "duration" => FormatKind::Duration,
        "email" | "idn-email" => FormatKind::Email,
        "uri" => FormatKind::Uri {
            schemes: node.scheme.clone().filter(|s| !s.is_empty()),
        },
        "ipv4" => FormatKind::Ipv4,
        "ipv6" => FormatKind::Ipv6,
        "ipvanyaddress" => FormatKind::IpAny,
        "base64" => FormatKind::Base64,
        "binary" => FormatKind::Binary,
        "password" => FormatKind::Password,
        "json-string" => FormatKind::JsonString,
        "regex" => FormatKind::Regex,
        other => return uuid_format(other),
    };
    Some(kind)
}

/// `uuid`, `uuid1` .. `uuid8`, case-insensitive.
fn uuid_format(format: &str) -> Option<FormatKind> {
    let lower: String = format.to_lowercase();
    let rest: &str = lower.strip_prefix("uuid")?;
    if rest.is_empty() {
        return Some(FormatKind::Uuid { version: None });
    }
    match rest.parse::<usize>() {
        Ok(version) if (1..=8).contains(&version) => Some(FormatKind::Uuid {
            version: Some(version),
        }),
        _ => None,
    }
}

/// Checks a string against a recognized format.
///
/// # Errors
///
/// Returns a short reason when the string does not conform.
pub fn check(kind: &FormatKind, text: &str) -> Result<(), String> {
    match kind {
        FormatKind::Date => NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .map(|_| ())
            .map_err(|e| e.to_string()),
        FormatKind::Time => check_time(text),
        FormatKind::DateTime => check_date_time(text),
        FormatKind::Duration => check_duration(text),
        FormatKind::Email => check_email(text),
        FormatKind::Uri { schemes } => {
            let url: url::Url = url::Url::parse(text).map_err(|e| e.to_string())?;
            match schemes {
                Some(allowed) if !allowed.iter().any(|s| s == url.scheme()) => Err(format!(
                    "scheme `{}` is not one of {}",
                    url.scheme(),
                    allowed.join(", ")
                )),
                _ => Ok(()),
            }
        }
        FormatKind::Uuid { version } => {
            let parsed: uuid::Uuid = uuid::Uuid::parse_str(text).map_err(|e| e.to_string())?;
            match version {
                Some(expected) if parsed.get_version_num() != *expected => Err(format!(
                    "expected UUID version {expected}, found version {}",
                    parsed.get_version_num()
                )),
                _ => Ok(()),
            }
        }
        FormatKind::Ipv4 => text
            .parse::<Ipv4Addr>()
            .map(|_| ())
            .map_err(|e| e.to_string()),
        FormatKind::Ipv6 => text
            .parse::<Ipv6Addr>()
            .map(|_| ())
            .map_err(|e| e.to_string()),
        FormatKind::IpAny => text
            .parse::<IpAddr>()
            .map(|_| ())
            .map_err(|e| e.to_string()),
        FormatKind::Base64 => base64::engine::general_purpose::STANDARD
            .decode(text)
            .map(|_| ())
            .map_err(|e| e.to_string()),
        FormatKind::JsonString => serde_json::from_str::<serde_json::Value>(text)
            .map(|_| ())
            .map_err(|e| e.to_string()),
        FormatKind::Regex => regress::Regex::new(text)
            .map(|_| ())
            .map_err(|e| e.to_string()),
        FormatKind::Binary | FormatKind::Password => Ok(()),
    }
}

/// RFC 3339 timestamps, plus naive `YYYY-MM-DDTHH:MM:SS[.f]` without an offset.
fn check_date_time(text: &str) -> Result<(), String> {
    match DateTime::parse_from_rfc3339(text) {
        Ok(_) => Ok(()),
        Err(rfc_error) => NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|_| ())
            .map_err(|_| rfc_error.to_string()),
    }
}

/// `HH:MM[:SS[.f]]` with an optional `Z` or `+HH:MM` offset.
fn check_time(text: &str) -> Result<(), String> {
    let (clock, offset): (&str, Option<&str>) = if let Some(stripped) = text
        .strip_suffix('Z')
        .or_else(|| text.strip_suffix('z'))
    {
        (stripped, None)
    } else if let Some(pos) = text.rfind(['+', '-']) {
        (&text[..pos], Some(&text[pos + 1..]))
    } else {
        (text, None)
    };
    if let Some(offset) = offset {
        NaiveTime::parse_from_str(offset, "%H:%M").map_err(|e| format!("offset: {e}"))?;
    }
    NaiveTime::parse_from_str(clock, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(clock, "%H:%M"))
        .map(|_| ())
        .map_err(|e| e.to_string())
}

/// ISO 8601 durations such as `P3DT12H30M5S` or `PT0.5S`.
fn check_duration(text: &str) -> Result<(), String> {
    let body: &str = text
        .strip_prefix('P')
        .ok_or_else(|| "must start with `P`".to_string())?;
    let (date_part, time_part): (&str, Option<&str>) = match body.split_once('T') {
        Some((date, time)) => (date, Some(time)),
        None => (body, None),
    };
    let mut components: usize = count_components(date_part, &['Y', 'M', 'W', 'D'], false)?;
    if let Some(time) = time_part {
        let time_components: usize = count_components(time, &['H', 'M', 'S'], true)?;
        if time_components == 0 {
            return Err("`T` must be followed by a time component".to_string());
        }
        components += time_components;
    }
    if components == 0 {
        return Err("no duration components".to_string());
    }
    Ok(())
}

/// Counts `<number><designator>` pairs, requiring designators in the given order.
fn count_components(
    part: &str,
    designators: &[char],
    fractional_seconds: bool,
) -> Result<usize, String> {
    let mut count: usize = 0;
    let mut next_designator: usize = 0;
    let mut digits: String = String::new();
    for c in part.chars() {
        if c.is_ascii_digit() || (fractional_seconds && c == '.') {
            digits.push(c);
            continue;
        }
        let Some(offset) = designators[next_designator..].iter().position(|d| *d == c) else {
            return Err(format!("unexpected `{c}`"));
        };
        if digits.is_empty() {
            return Err(format!("`{c}` has no value"));
        }
        if digits.contains('.') && c != 'S' {
            return Err(format!("only seconds may be fractional, found `{digits}{c}`"));
        }
        digits.clear();
        next_designator += offset + 1;
        count += 1;
    }
    if !digits.is_empty() {
        return Err(format!("`{digits}` has no designator"));
    }
    Ok(count)
}

/// A pragmatic address check: one `@`, a non-empty local part, a dotted domain, no spaces.
fn check_email(text: &str) -> Result<(), String> {
    let Some((local, domain)) = text.split_once('@') else {
        return Err("missing `@`".to_string());
    };
    if local.is_empty() || domain.contains('@') {
        return Err("malformed local part".to_string());
    }
    if text.chars().any(char::is_whitespace) {
        return Err("contains whitespace".to_string());
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|label| label.is_empty()) {
        return Err(format!("`{domain}` is not a valid domain"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node() -> JsonSchema {
        JsonSchema::default()
    }

    #[test]
    fn primitives_map_to_kinds() {
        assert_eq!(Some(TypeKind::Integer), map_primitive("integer", &node()));
        assert_eq!(Some(TypeKind::Number), map_primitive("number", &node()));
        assert_eq!(Some(TypeKind::Boolean), map_primitive("boolean", &node()));
        assert_eq!(Some(TypeKind::Null), map_primitive("null", &node()));
        assert_eq!(Some(TypeKind::String(None)), map_primitive("string", &node()));
        assert_eq!(None, map_primitive("object", &node()));
        assert_eq!(None, map_primitive("decimal", &node()));
    }

    #[test]
    fn unknown_format_degrades_to_plain_string() {
        let schema: JsonSchema =
            serde_json::from_value(serde_json::json!({ "type": "string", "format": "color" }))
                .expect("valid schema");
        assert_eq!(Some(TypeKind::String(None)), map_primitive("string", &schema));
    }

    #[test]
    fn uri_format_carries_schemes() {
        let schema: JsonSchema = serde_json::from_value(
            serde_json::json!({ "type": "string", "format": "uri", "scheme": ["https"] }),
        )
        .expect("valid schema");
        let expected = FormatKind::Uri {
            schemes: Some(vec!["https".to_string()]),
        };
        assert_eq!(Some(expected), map_format("uri", &schema));
    }

    #[test]
    fn uuid_formats_are_versioned() {
        assert_eq!(Some(FormatKind::Uuid { version: None }), uuid_format("uuid"));
        assert_eq!(Some(FormatKind::Uuid { version: Some(4) }), uuid_format("UUID4"));
        assert_eq!(None, uuid_format("uuid9"));
        assert_eq!(None, uuid_format("uuidx"));
    }

    #[test]
    fn date_time_checks() {
        assert!(check(&FormatKind::DateTime, "2022-01-01T12:34:56Z").is_ok());
        assert!(check(&FormatKind::DateTime, "2022-01-01T12:34:56.250+02:00").is_ok());
        assert!(check(&FormatKind::DateTime, "2022-01-01T12:34:56").is_ok());
        assert!(check(&FormatKind::DateTime, "My favorite day").is_err());
        assert!(check(&FormatKind::Date, "2022-01-01").is_ok());
        assert!(check(&FormatKind::Date, "invalid-date").is_err());
    }

    #[test]
    fn time_checks() {
        assert!(check(&FormatKind::Time, "12:34:56").is_ok());
        assert!(check(&FormatKind::Time, "12:34").is_ok());
        assert!(check(&FormatKind::Time, "12:34:56.5Z").is_ok());
        assert!(check(&FormatKind::Time, "12:34:56-05:00").is_ok());
        assert!(check(&FormatKind::Time, "invalid-time").is_err());
        assert!(check(&FormatKind::Time, "25:00:00").is_err());
    }

    #[test]
    fn duration_checks() {
        assert!(check(&FormatKind::Duration, "P3DT12H30M5S").is_ok());
        assert!(check(&FormatKind::Duration, "PT0.5S").is_ok());
        assert!(check(&FormatKind::Duration, "P1Y2M").is_ok());
        assert!(check(&FormatKind::Duration, "P2W").is_ok());
        assert!(check(&FormatKind::Duration, "invalid-duration").is_err());
        assert!(check(&FormatKind::Duration, "P").is_err());
        assert!(check(&FormatKind::Duration, "P1DT").is_err());
        assert!(check(&FormatKind::Duration, "P1D2Y").is_err());
        assert!(check(&FormatKind::Duration, "P1.5D").is_err());
    }

    #[test]
    fn email_checks() {
        assert!(check(&FormatKind::Email, "user@example.com").is_ok());
        assert!(check(&FormatKind::Email, "invalid-email").is_err());
        assert!(check(&FormatKind::Email, "a@b@c.com").is_err());
        assert!(check(&FormatKind::Email, "user@localhost").is_err());
        assert!(check(&FormatKind::Email, "us er@example.com").is_err());
    }

    #[test]
    fn network_checks() {
        assert!(check(&FormatKind::Ipv4, "192.168.0.1").is_ok());
        assert!(check(&FormatKind::Ipv4, "invalid-ipv4").is_err());
        assert!(check(&FormatKind::Ipv6, "2001:db8::8a2e:370:7334").is_ok());
        assert!(check(&FormatKind::IpAny, "2001:db8::8a2e:370:7334").is_ok());
        assert!(check(&FormatKind::IpAny, "invalid-ipv6").is_err());
    }

    #[test]
    fn uri_checks() {
        let any = FormatKind::Uri { schemes: None };
        assert!(check(&any, "https://example.com").is_ok());
        assert!(check(&any, "invalid-uri").is_err());

        let http_only = FormatKind::Uri {
            schemes: Some(vec!["http".to_string()]),
        };
        assert!(check(&http_only, "http://example.com").is_ok());
        assert!(check(&http_only, "file:///tmp/x").is_err());
    }

    #[test]
    fn uuid_checks() {
        let any = FormatKind::Uuid { version: None };
        assert!(check(&any, "123e4567-e89b-12d3-a456-426614174000").is_ok());
        assert!(check(&any, "Z23e4567-e89b-12d3-a456-426614174003").is_err());

        let v4 = FormatKind::Uuid { version: Some(4) };
        assert!(check(&v4, "3dd68ce0-91af-4782-8fe0-3e5fd4ff9a57").is_ok());
        assert!(check(&v4, "9073926b-929f-31c2-abc9-fad77ae3e8eb").is_err());
    }

    #[test]
    fn encoded_string_checks() {
        assert!(check(&FormatKind::Base64, "aGVsbG8=").is_ok());
        assert!(check(&FormatKind::Base64, "not base64!").is_err());
        assert!(check(&FormatKind::JsonString, "{\"a\": 1}").is_ok());
        assert!(check(&FormatKind::JsonString, "{").is_err());
        assert!(check(&FormatKind::Regex, "^a+$").is_ok());
        assert!(check(&FormatKind::Regex, "(").is_err());
    }
}
