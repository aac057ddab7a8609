//! Parsing selectors and option assignments from command-line words.

use common_error::{QuarryError, QuarryResult};
use quarry_core::HostValue;

/// Interpret one word as a selector.
///
/// Integers become indices (`-1` is the wildcard), comma-separated integers
/// with optional brackets become index vectors, anything else is a field
/// name.
pub fn parse_selector(word: &str) -> HostValue {
    let trimmed = word.trim();
    if let Ok(index) = trimmed.parse::<i64>() {
        return HostValue::from(index);
    }
    let inner = trimmed
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .unwrap_or(trimmed);
    if inner.contains(',') {
        let indices: Result<Vec<i64>, _> = inner
            .split(',')
            .map(|part| part.trim().parse::<i64>())
            .collect();
        if let Ok(indices) = indices {
            return HostValue::from(indices);
        }
    }
    HostValue::from(word)
}

pub fn parse_selectors<S: AsRef<str>>(words: &[S]) -> Vec<HostValue> {
    words.iter().map(|word| parse_selector(word.as_ref())).collect()
}

/// Parse a `NAME=VALUE` option assignment; the value is `0`/`1` or
/// `true`/`false`.
pub fn parse_option(assignment: &str) -> QuarryResult<(String, bool)> {
    let (name, value) = assignment.split_once('=').ok_or_else(|| {
        QuarryError::invalid_argument(format!("expected NAME=VALUE, got '{assignment}'"))
    })?;
    let value = match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" => true,
        "0" | "false" | "off" => false,
        other => {
            return Err(QuarryError::invalid_argument(format!(
                "option value '{other}' is not a boolean"
            )))
        }
    };
    Ok((name.trim().to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_core::Scalar;

    #[test]
    fn test_parse_selector_kinds() {
        assert_eq!(parse_selector("3"), HostValue::from(3_i64));
        assert_eq!(parse_selector("-1"), HostValue::from(-1_i64));
        assert_eq!(parse_selector("1,-1"), HostValue::from(vec![1_i64, -1]));
        assert_eq!(parse_selector("[0, 2, 1]"), HostValue::from(vec![0_i64, 2, 1]));
        assert_eq!(
            parse_selector("records"),
            HostValue::Scalar(Scalar::String("records".into()))
        );
        // not all integers, so a field name
        assert_eq!(parse_selector("a,b"), HostValue::from("a,b"));
    }

    #[test]
    fn test_parse_option() {
        assert_eq!(
            parse_option("SwapDimensions=0").unwrap(),
            ("SwapDimensions".to_string(), false)
        );
        assert_eq!(
            parse_option("verbose = true").unwrap(),
            ("verbose".to_string(), true)
        );
        assert_eq!(parse_option("Verbose").unwrap_err().code(), -100);
        assert_eq!(parse_option("Verbose=maybe").unwrap_err().code(), -100);
    }
}
