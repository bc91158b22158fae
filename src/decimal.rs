use rust_decimal::{Decimal, RoundingStrategy};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::Add;
use std::str::FromStr;

/// decimal places kept for monetary amounts
pub const MONEY_DP: u32 = 2;

/// decimal places kept for interest rates
pub const RATE_DP: u32 = 4;

/// round half away from zero
pub fn round_half_up(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Money type with cent precision.
///
/// Every constructor rounds once to [`MONEY_DP`] places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// create from decimal, rounding to cents
    pub fn from_decimal(d: Decimal) -> Self {
        Money(round_half_up(d, MONEY_DP))
    }

    /// create from string with exact parsing
    pub fn from_str_exact(s: &str) -> Result<Self, rust_decimal::Error> {
        Ok(Money::from_decimal(Decimal::from_str(s.trim())?))
    }

    /// create from integer amount (pesos, dollars, etc)
    pub fn from_major(amount: i64) -> Self {
        Money(Decimal::from(amount))
    }

    /// get underlying decimal
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// strictly greater than zero
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Money::from_str_exact(s)
    }
}

impl From<Decimal> for Money {
    fn from(d: Decimal) -> Self {
        Money::from_decimal(d)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, other: Money) -> Money {
        Money(self.0 + other.0)
    }
}

// the remote service speaks JSON numbers, so amounts go out as floats
impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_lenient(deserializer).map(Money::from_decimal)
    }
}

/// rate type for interest rates expressed as decimal fractions (0.38, not 38)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Rate(Decimal);

impl Rate {
    pub const ZERO: Rate = Rate(Decimal::ZERO);

    /// create from decimal fraction, rounding to four places
    pub fn from_decimal(d: Decimal) -> Self {
        Rate(round_half_up(d, RATE_DP))
    }

    /// create from percentage (e.g., 38 for 38%)
    pub fn from_percentage(p: u32) -> Self {
        Rate::from_decimal(Decimal::from(p) / Decimal::from(100))
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn as_percentage(&self) -> Decimal {
        self.0 * Decimal::from(100)
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.as_percentage().normalize())
    }
}

impl From<Decimal> for Rate {
    fn from(d: Decimal) -> Self {
        Rate::from_decimal(d)
    }
}

impl Serialize for Rate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Rate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_lenient(deserializer).map(Rate::from_decimal)
    }
}

/// accept a JSON number or a numeric string (postgres numerics come back as text)
fn deserialize_lenient<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(serde_json::Number),
        Text(String),
    }

    let text = match Repr::deserialize(deserializer)? {
        Repr::Number(n) => n.to_string(),
        Repr::Text(s) => s,
    };
    let text = text.trim();

    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .map_err(|e| D::Error::custom(format!("invalid decimal '{}': {}", text, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_precision() {
        let m = Money::from_str_exact("100.125").unwrap();
        assert_eq!(m.as_decimal(), dec!(100.13)); // half away from zero

        let m = Money::from_str_exact("100.124").unwrap();
        assert_eq!(m.as_decimal(), dec!(100.12));
    }

    #[test]
    fn test_rate_rounds_to_four_places() {
        let rate = Rate::from_decimal(dec!(0.123456));
        assert_eq!(rate.as_decimal(), dec!(0.1235));
        assert_eq!(Rate::from_percentage(38).as_decimal(), dec!(0.38));
    }

    #[test]
    fn test_money_serializes_as_json_number() {
        let json = serde_json::to_string(&Money::from_major(1380)).unwrap();
        assert_eq!(json, "1380.0");

        let json = serde_json::to_string(&Rate::from_percentage(38)).unwrap();
        assert_eq!(json, "0.38");
    }

    #[test]
    fn test_lenient_deserialization() {
        let from_number: Money = serde_json::from_str("92.5").unwrap();
        assert_eq!(from_number.as_decimal(), dec!(92.5));

        let from_text: Money = serde_json::from_str("\"1000.00\"").unwrap();
        assert_eq!(from_text, Money::from_major(1000));

        let rate: Rate = serde_json::from_str("\"0.3800\"").unwrap();
        assert_eq!(rate, Rate::from_percentage(38));

        assert!(serde_json::from_str::<Money>("\"abc\"").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_str_exact("1380.00").unwrap().to_string(), "1380");
        assert_eq!(Rate::from_percentage(38).to_string(), "38%");
    }
}
