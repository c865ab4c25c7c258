//! Lenient numeric parsing for form inputs.
//!
//! Inputs are read by their leading numeric prefix ("120 mmHg" reads as
//! 120). Blank, unparseable, non-finite and zero readings are all absent.

/// Parse a measurement as a float; `None` when blank, invalid or zero.
pub fn parse_measurement(text: &str) -> Option<f64> {
    let prefix = leading_number(text, true)?;
    prefix
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v != 0.0)
}

/// Parse a whole-number reading; fractional digits are dropped.
///
/// Negative, zero or out-of-range readings are absent.
pub fn parse_whole(text: &str) -> Option<u16> {
    parse_integer(text).filter(|v| *v != 0)
}

/// Leading non-negative integer of `text`; zero is kept.
pub fn parse_integer(text: &str) -> Option<u16> {
    leading_number(text, false)?.parse::<u16>().ok()
}

/// The longest numeric prefix of `text` after leading whitespace.
fn leading_number(text: &str, allow_fraction: bool) -> Option<&str> {
    let s = text.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if allow_fraction && end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if frac_end > frac_start || digits > 0 {
            digits += frac_end - frac_start;
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }

    if allow_fraction && end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    Some(&s[..end])
}
