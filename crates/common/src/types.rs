use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of fractional digits carried by [`TokenAmount`].
pub const TOKEN_DECIMALS: u32 = 6;

const UNIT: u128 = 10u128.pow(TOKEN_DECIMALS);

/// Errors produced when parsing a [`TokenAmount`] from text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("amount is empty")]
    Empty,

    #[error("amount cannot be negative")]
    Negative,

    #[error("invalid amount: {0}")]
    InvalidDigit(String),

    #[error("amount has more than {max} fractional digits")]
    TooPrecise { max: u32 },

    #[error("amount overflows the supported range")]
    Overflow,
}

// --- NewTypes ---

/// Fixed-point token quantity, stored as an integer count of base units.
///
/// One whole token is `10^TOKEN_DECIMALS` base units, so balances never
/// accumulate floating point drift.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TokenAmount(u128);

impl TokenAmount {
    pub const ZERO: TokenAmount = TokenAmount(0);

    pub const fn from_base_units(units: u128) -> Self {
        TokenAmount(units)
    }

    /// Whole tokens, e.g. `from_tokens(100)` is `100.000000`.
    pub const fn from_tokens(tokens: u64) -> Self {
        TokenAmount(tokens as u128 * UNIT)
    }

    pub const fn base_units(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: TokenAmount) -> Option<TokenAmount> {
        self.0.checked_add(other.0).map(TokenAmount)
    }

    pub fn checked_sub(self, other: TokenAmount) -> Option<TokenAmount> {
        self.0.checked_sub(other.0).map(TokenAmount)
    }
}

impl FromStr for TokenAmount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(AmountError::Empty);
        }
        if trimmed.starts_with('-') {
            return Err(AmountError::Negative);
        }

        // "500,000" and "500_000" are both accepted
        let digits: String = trimmed.chars().filter(|c| *c != '_' && *c != ',').collect();
        let (whole, frac) = match digits.split_once('.') {
            Some((w, f)) => (w, f),
            None => (digits.as_str(), ""),
        };

        if whole.is_empty() && frac.is_empty() {
            return Err(AmountError::InvalidDigit(trimmed.to_string()));
        }
        if !whole.chars().chain(frac.chars()).all(|c| c.is_ascii_digit()) {
            return Err(AmountError::InvalidDigit(trimmed.to_string()));
        }
        if frac.len() > TOKEN_DECIMALS as usize {
            return Err(AmountError::TooPrecise { max: TOKEN_DECIMALS });
        }

        let whole_units = if whole.is_empty() {
            0
        } else {
            whole.parse::<u128>().map_err(|_| AmountError::Overflow)?
        };
        let frac_units = if frac.is_empty() {
            0
        } else {
            let scale = 10u128.pow(TOKEN_DECIMALS - frac.len() as u32);
            frac.parse::<u128>().map_err(|_| AmountError::Overflow)? * scale
        };

        whole_units
            .checked_mul(UNIT)
            .and_then(|w| w.checked_add(frac_units))
            .map(TokenAmount)
            .ok_or(AmountError::Overflow)
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / UNIT;
        let frac = self.0 % UNIT;
        if frac == 0 {
            return write!(f, "{}", whole);
        }
        let frac = format!("{:0width$}", frac, width = TOKEN_DECIMALS as usize);
        write!(f, "{}.{}", whole, frac.trim_end_matches('0'))
    }
}

impl fmt::Debug for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenAmount({})", self)
    }
}

impl Serialize for TokenAmount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TokenAmount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(TokenAmountVisitor)
    }
}

struct TokenAmountVisitor;

impl<'de> Visitor<'de> for TokenAmountVisitor {
    type Value = TokenAmount;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a non-negative decimal token amount")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<TokenAmount, E> {
        v.parse().map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<TokenAmount, E> {
        Ok(TokenAmount::from_tokens(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<TokenAmount, E> {
        u64::try_from(v)
            .map(TokenAmount::from_tokens)
            .map_err(|_| E::custom(AmountError::Negative))
    }

    // config files may write `250.5` as a float literal
    fn visit_f64<E: de::Error>(self, v: f64) -> Result<TokenAmount, E> {
        v.to_string().parse().map_err(E::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let amount: TokenAmount = "250.5".parse().unwrap();
        assert_eq!(amount.base_units(), 250_500_000);
        assert_eq!(amount.to_string(), "250.5");

        let reserve: TokenAmount = "500,000".parse().unwrap();
        assert_eq!(reserve, TokenAmount::from_tokens(500_000));
        assert_eq!(reserve.to_string(), "500000");

        let dust: TokenAmount = ".000001".parse().unwrap();
        assert_eq!(dust.base_units(), 1);
        assert_eq!(dust.to_string(), "0.000001");
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!("".parse::<TokenAmount>(), Err(AmountError::Empty));
        assert_eq!("-5".parse::<TokenAmount>(), Err(AmountError::Negative));
        assert_eq!(
            "1.0000001".parse::<TokenAmount>(),
            Err(AmountError::TooPrecise { max: TOKEN_DECIMALS })
        );
        assert!(matches!("12a".parse::<TokenAmount>(), Err(AmountError::InvalidDigit(_))));
        assert!(matches!(".".parse::<TokenAmount>(), Err(AmountError::InvalidDigit(_))));
        assert_eq!(
            "999999999999999999999999999999999999999".parse::<TokenAmount>(),
            Err(AmountError::Overflow)
        );
    }

    #[test]
    fn test_checked_arithmetic() {
        let reserve = TokenAmount::from_tokens(500_000);
        let claim = TokenAmount::from_tokens(100);

        let after = reserve.checked_sub(claim).unwrap();
        assert_eq!(after.to_string(), "499900");
        assert_eq!(claim.checked_sub(reserve), None);
        assert_eq!(
            "250.5".parse::<TokenAmount>().unwrap().checked_add(claim).unwrap().to_string(),
            "350.5"
        );
        assert_eq!(TokenAmount::from_base_units(u128::MAX).checked_add(claim), None);
    }

    #[test]
    fn test_serde_accepts_strings_and_numbers() {
        let json = serde_json::to_string(&TokenAmount::from_tokens(100)).unwrap();
        assert_eq!(json, "\"100\"");

        let from_str: TokenAmount = serde_json::from_str("\"250.5\"").unwrap();
        let from_int: TokenAmount = serde_json::from_str("350").unwrap();
        let from_float: TokenAmount = serde_json::from_str("250.5").unwrap();
        assert_eq!(from_str, from_float);
        assert_eq!(from_int, TokenAmount::from_tokens(350));
        assert!(serde_json::from_str::<TokenAmount>("-1").is_err());
    }
}
