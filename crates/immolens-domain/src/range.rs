//! German number and numeric range parsing
//!
//! Listing text uses German conventions: `.` separates thousands and `,`
//! is the decimal mark, so "100.000,50" is one hundred thousand and a half.
//! Ranges such as "40-140", "40 bis 140", "40~140", or "40 to 140" resolve to
//! their lower bound so costs and sizes are never overstated.

use std::fmt;

/// Why a piece of text did not yield a number
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Nothing but whitespace
    Empty,
    /// Text contains no usable number
    NotNumeric(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Empty => f.write_str("empty input"),
            ParseError::NotNumeric(s) => write!(f, "not a number: {:?}", s),
        }
    }
}

impl std::error::Error for ParseError {}

/// Parse a single German-formatted number
///
/// Whitespace is ignored, trailing separators are dropped, every `.` is a
/// thousands separator and `,` becomes the decimal point.
///
/// # Examples
///
/// ```
/// use immolens_domain::parse_german_number;
///
/// assert_eq!(parse_german_number("100.000,50"), Ok(100000.5));
/// assert_eq!(parse_german_number("2,5"), Ok(2.5));
/// ```
pub fn parse_german_number(s: &str) -> Result<f64, ParseError> {
    let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Err(ParseError::Empty);
    }

    let compact = compact.trim_end_matches(['.', ',']);
    let (negative, digits) = match compact
        .strip_prefix('-')
        .or_else(|| compact.strip_prefix('\u{2212}'))
    {
        Some(rest) => (true, rest),
        None => (false, compact),
    };

    let well_formed = digits.starts_with(|c: char| c.is_ascii_digit())
        && digits.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',');
    if !well_formed {
        return Err(ParseError::NotNumeric(s.to_string()));
    }

    let normalized = digits.replace('.', "").replace(',', ".");
    normalized
        .parse::<f64>()
        .map(|v| if negative { -v } else { v })
        .map_err(|_| ParseError::NotNumeric(s.to_string()))
}

/// Separators accepted between the two ends of a range
const RANGE_SEPARATORS: [&str; 6] = ["-", "\u{2013}", "\u{2014}", "~", "bis", "to"];

/// A number as written in listing text: either one value or a span
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RangeValue {
    /// Plain number
    Single(f64),
    /// Two numbers joined by a range separator
    Span {
        /// First number as written
        start: f64,
        /// Second number as written
        end: f64,
    },
}

impl RangeValue {
    /// Parse the first number in `s`, and a second one if a range separator
    /// follows it
    ///
    /// Text after the number that is not a range is ignored, so
    /// "145,00 € / Monat" parses as `Single(145.0)`.
    pub fn parse(s: &str) -> Result<Self, ParseError> {
        let text = s.trim();
        if text.is_empty() {
            return Err(ParseError::Empty);
        }

        let start_idx = text
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| ParseError::NotNumeric(s.to_string()))?;
        let prefix = text[..start_idx].trim();
        let negative = prefix == "-" || prefix == "\u{2212}";

        let (first, rest) = take_number(&text[start_idx..]);
        let mut start = parse_german_number(first)?;
        if negative {
            start = -start;
        }

        let rest = rest.trim_start();
        for sep in RANGE_SEPARATORS {
            let Some(head) = rest.get(..sep.len()) else {
                continue;
            };
            if !head.eq_ignore_ascii_case(sep) {
                continue;
            }
            let after = rest[sep.len()..].trim_start();
            if !after.starts_with(|c: char| c.is_ascii_digit()) {
                break;
            }
            let (second, _) = take_number(after);
            if let Ok(end) = parse_german_number(second) {
                return Ok(RangeValue::Span { start, end });
            }
            break;
        }

        Ok(RangeValue::Single(start))
    }

    /// Resolve to one number: the lower bound as written
    ///
    /// An inverted span ("200-100") still yields its first number.
    pub fn resolve(&self) -> f64 {
        match self {
            RangeValue::Single(v) => *v,
            RangeValue::Span { start, .. } => *start,
        }
    }

    /// Whether this is a span whose end is below its start
    pub fn is_inverted(&self) -> bool {
        matches!(self, RangeValue::Span { start, end } if end < start)
    }
}

/// Parse text that may hold a single number or a range, resolving ranges
/// to their lower bound
///
/// # Examples
///
/// ```
/// use immolens_domain::parse_number_with_range;
///
/// assert_eq!(parse_number_with_range("50"), Ok(50.0));
/// assert_eq!(parse_number_with_range("40-140"), Ok(40.0));
/// assert_eq!(parse_number_with_range("200-100"), Ok(200.0));
/// ```
pub fn parse_number_with_range(s: &str) -> Result<f64, ParseError> {
    RangeValue::parse(s).map(|r| r.resolve())
}

fn take_number(s: &str) -> (&str, &str) {
    let end = s
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == ','))
        .unwrap_or(s.len());
    s.split_at(end)
}
