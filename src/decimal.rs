use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Fixed-point decimal number: `mantissa * 10^-scale`.
///
/// The scale is kept as written, so `2.10` and `2.1` render differently but
/// compare equal, which is what a report needs to show.
#[derive(Clone, Copy, Debug)]
pub struct Decimal {
    mantissa: i128,
    scale: u32,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid decimal literal: {0:?}")]
pub struct ParseDecimalError(pub String);

fn pow10(n: u32) -> Option<i128> {
    10i128.checked_pow(n)
}

impl Decimal {
    pub fn new(mantissa: i128, scale: u32) -> Self {
        Self { mantissa, scale }
    }

    pub fn mantissa(&self) -> i128 {
        self.mantissa
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    /// Round to `dp` places, ties to even.
    pub fn round_dp(&self, dp: u32) -> Decimal {
        if self.scale <= dp {
            return *self;
        }
        let Some(factor) = pow10(self.scale - dp) else {
            return Decimal::new(0, dp);
        };
        let mut quotient = self.mantissa / factor;
        let remainder = (self.mantissa % factor).abs();
        let half = factor / 2;
        let sign = self.mantissa.signum();
        if remainder > half || (remainder == half && quotient % 2 != 0) {
            quotient += sign;
        }
        Decimal::new(quotient, dp)
    }

    pub fn to_f64(&self) -> f64 {
        self.mantissa as f64 / 10f64.powi(self.scale as i32)
    }

    fn rescaled(&self, scale: u32) -> Option<i128> {
        pow10(scale - self.scale).and_then(|f| self.mantissa.checked_mul(f))
    }
}

impl FromStr for Decimal {
    type Err = ParseDecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseDecimalError(s.to_string());
        let t = s.trim();
        let (negative, body) = match t.as_bytes().first() {
            Some(b'-') => (true, &t[1..]),
            Some(b'+') => (false, &t[1..]),
            _ => (false, t),
        };
        let (int_part, frac_part) = body.split_once('.').unwrap_or((body, ""));
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(err());
        }
        if !int_part.chars().chain(frac_part.chars()).all(|c| c.is_ascii_digit()) {
            return Err(err());
        }
        let digits = format!("{int_part}{frac_part}");
        let mantissa: i128 = if digits.is_empty() {
            0
        } else {
            digits.parse().map_err(|_| err())?
        };
        let scale = u32::try_from(frac_part.len()).map_err(|_| err())?;
        Ok(Decimal::new(if negative { -mantissa } else { mantissa }, scale))
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.mantissa < 0 { "-" } else { "" };
        let digits = self.mantissa.unsigned_abs().to_string();
        let scale = self.scale as usize;
        if scale == 0 {
            return write!(f, "{sign}{digits}");
        }
        let padded = format!("{digits:0>width$}", width = scale + 1);
        let (int_part, frac_part) = padded.split_at(padded.len() - scale);
        write!(f, "{sign}{int_part}.{frac_part}")
    }
}

impl PartialEq for Decimal {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Decimal {}

impl PartialOrd for Decimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Decimal {
    fn cmp(&self, other: &Self) -> Ordering {
        let scale = self.scale.max(other.scale);
        match (self.rescaled(scale), other.rescaled(scale)) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => self.to_f64().total_cmp(&other.to_f64()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn parses_and_displays() {
        assert_eq!(d("2.001").to_string(), "2.001");
        assert_eq!(d("-0.05").to_string(), "-0.05");
        assert_eq!(d("12").to_string(), "12");
        assert_eq!(d(".5").to_string(), "0.5");
        assert!("1.2.3".parse::<Decimal>().is_err());
        assert!("".parse::<Decimal>().is_err());
    }

    #[test]
    fn equality_ignores_trailing_zeros() {
        assert_eq!(d("2.10"), d("2.1"));
        assert!(d("2.001") < d("2.009"));
    }

    #[test]
    fn rounds_half_to_even() {
        assert_eq!(d("2.001").round_dp(2).to_string(), "2.00");
        assert_eq!(d("2.009").round_dp(2).to_string(), "2.01");
        assert_eq!(d("2.125").round_dp(2).to_string(), "2.12");
        assert_eq!(d("2.135").round_dp(2).to_string(), "2.14");
        assert_eq!(d("-1.555").round_dp(2).to_string(), "-1.56");
        assert_eq!(d("1.5").round_dp(3).to_string(), "1.5");
    }
}
