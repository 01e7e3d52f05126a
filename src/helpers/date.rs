//! Date helper functions

use chrono::{DateTime, FixedOffset, TimeZone};
use chrono_tz::Tz;

/// Locale used for month and weekday names and page messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    PtBr,
    En,
}

impl Locale {
    /// Resolve a language tag such as `pt-BR` or `en-US`
    pub fn from_tag(tag: &str) -> Self {
        let primary = tag.split(['-', '_']).next().unwrap_or("").to_ascii_lowercase();
        match primary.as_str() {
            "pt" => Locale::PtBr,
            "en" => Locale::En,
            _ => {
                tracing::warn!("Unsupported language {:?}, falling back to pt-BR", tag);
                Locale::PtBr
            }
        }
    }

    /// chrono locale providing month and weekday names
    pub fn chrono_locale(&self) -> chrono::Locale {
        match self {
            Locale::PtBr => chrono::Locale::pt_BR,
            Locale::En => chrono::Locale::en_US,
        }
    }
}

/// Parse a timestamp as sent by the content API (`2021-03-15T19:25:28+0000`)
/// or RFC 3339
pub fn parse_timestamp(s: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%z")
        .or_else(|_| DateTime::parse_from_rfc3339(s))
        .ok()
}

/// Resolve a time zone name; empty or unknown names mean UTC
pub fn resolve_timezone(name: &str) -> Tz {
    if name.trim().is_empty() {
        return Tz::UTC;
    }
    match name.parse::<Tz>() {
        Ok(tz) => tz,
        Err(e) => {
            tracing::warn!("Unknown timezone {:?} ({}), using UTC", name, e);
            Tz::UTC
        }
    }
}

/// Format a publication date that may be missing
///
/// A missing date yields `None` so the caller can leave the item out.
pub fn format_publication_date(
    date: Option<&DateTime<FixedOffset>>,
    pattern: &str,
    locale: Locale,
    tz: Tz,
) -> Option<String> {
    date.map(|d| format_date(&d.with_timezone(&tz), pattern, locale))
}

/// Format a date using date-fns style tokens
///
/// # Examples
/// ```ignore
/// format_date(&date, "dd MMM yyyy", Locale::PtBr) // -> "15 mar 2021"
/// ```
pub fn format_date<Tz2: TimeZone>(date: &DateTime<Tz2>, pattern: &str, locale: Locale) -> String
where
    Tz2::Offset: std::fmt::Display,
{
    let chrono_format = date_fns_to_chrono_format(pattern);
    date.format_localized(&chrono_format, locale.chrono_locale())
        .to_string()
}

/// Translate date-fns tokens (`dd`, `MMM`, `yyyy`, `EEEE`, ...) into chrono
/// specifiers; quoted text and unknown letters are kept literally
fn date_fns_to_chrono_format(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\'' {
            // Quoted literal; '' is an escaped quote
            if chars.get(i + 1) == Some(&'\'') {
                out.push('\'');
                i += 2;
                continue;
            }
            i += 1;
            while i < chars.len() {
                if chars[i] == '\'' {
                    if chars.get(i + 1) == Some(&'\'') {
                        out.push('\'');
                        i += 2;
                        continue;
                    }
                    break;
                }
                push_literal(&mut out, chars[i]);
                i += 1;
            }
            i += 1;
            continue;
        }

        let mut run = 1;
        while i + run < chars.len() && chars[i + run] == c {
            run += 1;
        }

        let specifier = match (c, run) {
            ('d', 1) => Some("%-d"),
            ('d', _) => Some("%d"),
            ('M', 1) => Some("%-m"),
            ('M', 2) => Some("%m"),
            ('M', 3) => Some("%b"),
            ('M', _) => Some("%B"),
            ('y', 2) => Some("%y"),
            ('y', _) => Some("%Y"),
            ('E', 1..=3) => Some("%a"),
            ('E', _) => Some("%A"),
            ('H', 1) => Some("%-H"),
            ('H', _) => Some("%H"),
            ('m', 1) => Some("%-M"),
            ('m', _) => Some("%M"),
            ('s', 1) => Some("%-S"),
            ('s', _) => Some("%S"),
            _ => None,
        };

        match specifier {
            Some(spec) => out.push_str(spec),
            None => (0..run).for_each(|_| push_literal(&mut out, c)),
        }
        i += run;
    }

    out
}

fn push_literal(out: &mut String, c: char) {
    if c == '%' {
        out.push_str("%%");
    } else {
        out.push(c);
    }
}

/// Format a date in ISO 8601 / XML format
pub fn date_xml<Tz2: TimeZone>(date: &DateTime<Tz2>) -> String
where
    Tz2::Offset: std::fmt::Display,
{
    date.format("%Y-%m-%dT%H:%M:%S%:z").to_string()
}
