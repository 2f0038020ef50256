use crate::types::errors::MonetaryError;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// A signed amount of money.
///
/// On the wire an amount is a plain JSON number carrying every decimal digit, so nothing is
/// rounded between the amount that was validated and the amount that gets applied. Numeric
/// strings are accepted when deserializing.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Monetary(Decimal);

impl Monetary {
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn checked_add(self, rhs: Monetary) -> Option<Monetary> {
        self.0.checked_add(rhs.0).map(Monetary)
    }
}

impl From<Decimal> for Monetary {
    fn from(value: Decimal) -> Self {
        Monetary(value)
    }
}

impl From<i64> for Monetary {
    fn from(value: i64) -> Self {
        Monetary(Decimal::from(value))
    }
}

impl Display for Monetary {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, formatter)
    }
}

impl FromStr for Monetary {
    type Err = MonetaryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();

        if value.is_empty() {
            return Err(MonetaryError::InvalidFormat("Value is an empty string".to_string()));
        }

        Ok(Monetary(Decimal::from_str(value)?))
    }
}

impl Serialize for Monetary {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        //NOTE: Trailing zeros are dropped so whole amounts go out as integers
        rust_decimal::serde::arbitrary_precision::serialize(&self.0.normalize(), serializer)
    }
}

impl<'de> Deserialize<'de> for Monetary {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        rust_decimal::serde::arbitrary_precision::deserialize(deserializer).map(Monetary)
    }
}
