//! Front-matter splitting and typed parsing

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use chrono_tz::Tz;
use serde::de::DeserializeOwned;
use serde::Deserializer;

/// Deserializes a tag-like field given either as a single scalar or as a list.
/// Numeric and boolean scalars are kept as their string form, nulls are skipped.
pub fn string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, Deserialize};
    use serde_yaml::Value;

    fn scalar(value: &Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    match Value::deserialize(deserializer)? {
        Value::Null => Ok(Vec::new()),
        Value::Sequence(items) => items
            .iter()
            .filter(|v| !v.is_null())
            .map(|v| {
                scalar(v).ok_or_else(|| <D::Error as de::Error>::custom("expected a scalar list item"))
            })
            .filter(|r| !matches!(r, Ok(s) if s.is_empty()))
            .collect(),
        other => match scalar(&other) {
            Some(s) if s.is_empty() => Ok(Vec::new()),
            Some(s) => Ok(vec![s]),
            None => Err(de::Error::custom("expected a string or a list of strings")),
        },
    }
}

/// Deserializes an optional scalar (string, number or bool) into a string.
pub fn opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, Deserialize};
    use serde_yaml::Value;

    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        _ => Err(de::Error::custom("expected a scalar value")),
    }
}

/// A YAML front-matter block at the top of a content file
pub struct FrontMatter;

impl FrontMatter {
    /// Split content into the raw YAML block (if any) and the body.
    pub fn split(content: &str) -> (Option<&str>, &str) {
        let trimmed = content.trim_start();
        let Some(rest) = trimmed.strip_prefix("---") else {
            return (None, content);
        };
        let rest = rest.trim_start_matches([' ', '\t']);
        let Some(rest) = rest
            .strip_prefix("\r\n")
            .or_else(|| rest.strip_prefix('\n'))
        else {
            // `---something` on the first line is not a fence
            return (None, content);
        };

        // Empty block: the closing fence follows immediately
        if let Some(body) = rest.strip_prefix("---") {
            return (Some(""), body.trim_start_matches(['\n', '\r']));
        }

        let Some(end) = rest.find("\n---") else {
            return (None, content);
        };
        let yaml = &rest[..end];
        let after = &rest[end + 4..];
        // Skip the remainder of the closing fence line
        let body = match after.find('\n') {
            Some(nl) if after[..nl].trim().is_empty() => &after[nl + 1..],
            None if after.trim().is_empty() => "",
            _ => after,
        };

        if yaml.trim().is_empty() {
            return (Some(""), body);
        }
        if !looks_like_yaml(yaml) {
            // A markdown horizontal rule, not a front-matter fence
            return (None, content);
        }
        (Some(yaml), body)
    }

    /// Parse the front-matter of `content` into `T`.
    ///
    /// A file without a block yields `T::default()`. A block that does not
    /// deserialize into `T` is an error so the caller can drop the record.
    pub fn parse<T>(content: &str) -> Result<(T, &str)>
    where
        T: DeserializeOwned + Default,
    {
        match Self::split(content) {
            (Some(yaml), body) if yaml.trim().is_empty() => Ok((T::default(), body)),
            (Some(yaml), body) => {
                let data = serde_yaml::from_str::<T>(yaml)
                    .context("invalid front-matter")?;
                Ok((data, body))
            }
            (None, body) => Ok((T::default(), body)),
        }
    }
}

/// Whether a fenced block has at least one `key: value` line.
fn looks_like_yaml(block: &str) -> bool {
    block.lines().any(|line| {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return false;
        }
        let Some(colon) = trimmed.find(':') else {
            return false;
        };
        let key = &trimmed[..colon];
        let valid_key = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
            && !matches!(key, "http" | "https" | "ftp" | "mailto");
        let after = &trimmed[colon + 1..];
        valid_key && (after.is_empty() || after.starts_with(' '))
    })
}

/// Parse a front-matter date.
///
/// Values carrying an offset keep it; values without one are read as wall
/// time in `tz`. The result is always UTC.
pub fn parse_date(s: &str, tz: Tz) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    const WITH_OFFSET: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S %z",
        "%Y-%m-%d %H:%M:%S%z",
        "%Y-%m-%dT%H:%M:%S%z",
        "%Y-%m-%dT%H:%M:%S%.f%z",
    ];
    for fmt in WITH_OFFSET {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    const DATE_TIME: [&str; 6] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
    ];
    for fmt in DATE_TIME {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return localize(naive, tz);
        }
    }

    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return localize(d.and_hms_opt(0, 0, 0)?, tz);
        }
    }

    None
}

fn localize(naive: NaiveDateTime, tz: Tz) -> Option<DateTime<Utc>> {
    // Ambiguous wall times (DST fold) take the earlier instant
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Canonical timestamp string: RFC 3339, UTC, millisecond precision.
pub fn canonical(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Serde adapter writing dates in the canonical form.
pub mod timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::canonical(dt))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            dt: &Option<DateTime<Utc>>,
            s: S,
        ) -> Result<S::Ok, S::Error> {
            match dt {
                Some(dt) => s.serialize_str(&super::super::canonical(dt)),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            d: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            let raw = Option::<String>::deserialize(d)?;
            raw.map(|r| {
                DateTime::parse_from_rfc3339(&r)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(serde::de::Error::custom)
            })
            .transpose()
        }
    }
}
