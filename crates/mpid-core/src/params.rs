//! Query-string extraction and tracking-id validation.

use url::{form_urlencoded, Url};

/// Query parameter carrying the tracking id.
pub const TRACKING_PARAM: &str = "mpid";

/// Stand-in for `.` in query values, restored in `normalized_query`.
pub const PERIOD_ESCAPE: &str = "IAMAPERIOD";

/// Marker in page templates replaced by `&mpid={id}` or removed.
pub const PLACEHOLDER_TOKEN: &str = "&CLOUDFLARE_MPID";

/// Result of inspecting a request's query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterOutcome {
    pub has_params: bool,
    /// Query re-serialized as `application/x-www-form-urlencoded`.
    pub raw_query: String,
    /// `raw_query` with every [`PERIOD_ESCAPE`] replaced by `.`.
    pub normalized_query: String,
    /// Present only when `mpid` is integer-like and longer than 5 characters.
    pub tracking_id: Option<String>,
}

impl ParameterOutcome {
    /// Whether the lookup-and-rewrite path applies.
    #[must_use]
    pub fn should_rewrite(&self) -> bool {
        self.has_params && self.tracking_id.is_some()
    }
}

/// Inspect the request URL's query string.
///
/// Never fails: malformed input yields `has_params: true` with no tracking id.
#[must_use]
pub fn extract_parameters(url: &Url) -> ParameterOutcome {
    let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    if pairs.is_empty() {
        return ParameterOutcome::default();
    }

    let raw_query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(&pairs)
        .finish();
    let normalized_query = raw_query.replace(PERIOD_ESCAPE, ".");

    let tracking_id = pairs
        .iter()
        .find(|(key, _)| key == TRACKING_PARAM)
        .map(|(_, value)| value)
        .filter(|value| utf16_len(value) > 5 && parses_as_integer(value))
        .cloned();

    ParameterOutcome {
        has_params: true,
        raw_query,
        normalized_query,
        tracking_id,
    }
}

/// Second check applied right before the placeholder is substituted.
///
/// Looser than extraction (length of at least 5 rather than more than 5).
#[must_use]
pub fn placeholder_substitution_allowed(tracking_id: &str) -> bool {
    parses_as_integer(tracking_id) && utf16_len(tracking_id) >= 5
}

/// True when `value` starts (after whitespace) with an optional sign and at
/// least one ASCII digit. Trailing characters are ignored.
#[must_use]
pub fn parses_as_integer(value: &str) -> bool {
    leading_digits(value).is_some()
}

/// Integer value of the leading digit run, as used for the catalog's
/// `masterProductIds`. `None` when there is no leading integer or it
/// overflows `i64`.
#[must_use]
pub fn leading_integer(value: &str) -> Option<i64> {
    let (negative, digits) = leading_digits(value)?;
    let magnitude: i64 = digits.parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// The sign and leading digit run of `value`, as written. `"123456abc"`
/// yields `"123456"`; a plain numeric id comes back unchanged.
#[must_use]
pub fn integer_prefix(value: &str) -> Option<&str> {
    let trimmed = value.trim_start();
    let (_, digits) = leading_digits(trimmed)?;
    let sign_len = usize::from(trimmed.starts_with(['+', '-']));
    Some(&trimmed[..sign_len + digits.len()])
}

fn leading_digits(value: &str) -> Option<(bool, &str)> {
    let trimmed = value.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    (end > 0).then(|| (negative, &rest[..end]))
}

/// Length in UTF-16 code units, the unit page scripts count in.
fn utf16_len(value: &str) -> usize {
    value.encode_utf16().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(url: &str) -> ParameterOutcome {
        extract_parameters(&Url::parse(url).unwrap())
    }

    #[test]
    fn no_query_has_no_params() {
        assert_eq!(outcome("https://www.justfab.com/page"), ParameterOutcome::default());
        assert_eq!(outcome("https://www.justfab.com/page?"), ParameterOutcome::default());
    }

    #[test]
    fn valid_mpid_is_extracted() {
        let out = outcome("https://www.justfab.com/page?mpid=123456&utm=x");
        assert!(out.has_params);
        assert!(out.should_rewrite());
        assert_eq!(out.tracking_id.as_deref(), Some("123456"));
        assert_eq!(out.raw_query, "mpid=123456&utm=x");
    }

    #[test]
    fn short_mpid_is_rejected() {
        let out = outcome("https://www.justfab.com/page?mpid=12345");
        assert!(out.has_params);
        assert!(out.tracking_id.is_none());
        assert!(!out.should_rewrite());
    }

    #[test]
    fn non_numeric_mpid_is_rejected() {
        let out = outcome("https://www.justfab.com/page?mpid=abcdefgh");
        assert!(out.tracking_id.is_none());
    }

    #[test]
    fn mpid_with_trailing_garbage_is_integer_like() {
        let out = outcome("https://www.justfab.com/page?mpid=123456abc");
        assert_eq!(out.tracking_id.as_deref(), Some("123456abc"));
    }

    #[test]
    fn first_mpid_value_wins() {
        let out = outcome("https://www.justfab.com/page?mpid=abc&mpid=123456");
        assert!(out.tracking_id.is_none());
    }

    #[test]
    fn period_escape_is_normalized() {
        let out = outcome("https://www.justfab.com/page?email=janeIAMAPERIODdoe&x=1IAMAPERIOD5");
        assert_eq!(out.raw_query, "email=janeIAMAPERIODdoe&x=1IAMAPERIOD5");
        assert_eq!(out.normalized_query, "email=jane.doe&x=1.5");
        assert!(out.tracking_id.is_none());
    }

    #[test]
    fn query_is_reserialized_form_encoded() {
        let out = outcome("https://www.justfab.com/page?q=a%20b&flag");
        assert_eq!(out.raw_query, "q=a+b&flag=");
    }

    #[test]
    fn parses_as_integer_follows_leading_integer_rules() {
        assert!(parses_as_integer("42"));
        assert!(parses_as_integer("  -42"));
        assert!(parses_as_integer("+7x"));
        assert!(!parses_as_integer(""));
        assert!(!parses_as_integer("-"));
        assert!(!parses_as_integer("x42"));
    }

    #[test]
    fn leading_integer_parses_prefix() {
        assert_eq!(leading_integer("123456abc"), Some(123_456));
        assert_eq!(leading_integer(" -9"), Some(-9));
        assert_eq!(leading_integer("abc"), None);
        assert_eq!(leading_integer("99999999999999999999999"), None);
    }

    #[test]
    fn integer_prefix_keeps_only_sign_and_digits() {
        assert_eq!(integer_prefix("123456"), Some("123456"));
        assert_eq!(integer_prefix("0123456"), Some("0123456"));
        assert_eq!(integer_prefix("123456\"><script>"), Some("123456"));
        assert_eq!(integer_prefix("  -42x"), Some("-42"));
        assert_eq!(integer_prefix("+7"), Some("+7"));
        assert_eq!(integer_prefix("--7"), None);
        assert_eq!(integer_prefix("abc"), None);
    }

    #[test]
    fn placeholder_check_accepts_length_five() {
        assert!(placeholder_substitution_allowed("12345"));
        assert!(!placeholder_substitution_allowed("1234"));
        assert!(!placeholder_substitution_allowed("abcde"));
    }
}
