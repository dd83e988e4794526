//! Parsing of the `weight` field reported by devices.
//!
//! Device firmware has been observed appending units (`"12.5kg"`), so the
//! default mode takes the longest leading decimal number and ignores the
//! rest. Strict mode requires the whole field to be a number.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    Lenient,
    Strict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum WeightError {
    #[error("weight is missing")]
    Missing,

    #[error("weight is not a number")]
    NotANumber,

    #[error("weight is not finite")]
    NotFinite,

    #[error("weight is negative")]
    Negative,
}

/// Parses a weight, rejecting anything that is not a finite number `>= 0`.
/// Negative zero comes back as `0.0`.
pub fn parse_weight(raw: &str, mode: ParseMode) -> Result<f64, WeightError> {
    let value = match mode {
        ParseMode::Lenient => parse_lenient(raw)?,
        ParseMode::Strict => parse_strict(raw)?,
    };

    if !value.is_finite() {
        return Err(WeightError::NotFinite);
    }
    if value < 0.0 {
        return Err(WeightError::Negative);
    }

    Ok(value + 0.0)
}

fn parse_strict(raw: &str) -> Result<f64, WeightError> {
    if raw.is_empty() {
        return Err(WeightError::Missing);
    }
    raw.parse::<f64>().map_err(|_| WeightError::NotANumber)
}

fn parse_lenient(raw: &str) -> Result<f64, WeightError> {
    let trimmed = raw.trim_start();
    if trimmed.is_empty() {
        return Err(WeightError::Missing);
    }

    let unsigned = trimmed.strip_prefix(['+', '-']).unwrap_or(trimmed);
    if unsigned.starts_with("Infinity") {
        return Err(WeightError::NotFinite);
    }

    let prefix = decimal_prefix(trimmed);
    if prefix.is_empty() {
        return Err(WeightError::NotANumber);
    }
    prefix.parse::<f64>().map_err(|_| WeightError::NotANumber)
}

/// Longest prefix of `s` shaped like `[+-]digits[.digits][(e|E)[+-]digits]`
/// with at least one mantissa digit, or `""` when there is none.
fn decimal_prefix(s: &str) -> &str {
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }

    let int_digits = count_digits(&bytes[end..]);
    end += int_digits;

    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = count_digits(&bytes[end + 1..]);
        if int_digits > 0 || frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }

    if int_digits == 0 && frac_digits == 0 {
        return "";
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits = count_digits(&bytes[exp_end..]);
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }

    &s[..end]
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}
