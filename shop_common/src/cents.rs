use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const CURRENCY_CODE: &str = "USD";

//--------------------------------------        Cents          ---------------------------------------------------------
/// A monetary amount in integer minor units (cents). All order arithmetic happens in this type so that the value that
/// is computed is exactly the value that gets stored.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Cents(i64);

op!(binary Cents, Add, add);
op!(binary Cents, Sub, sub);
op!(inplace Cents, AddAssign, add_assign);
op!(inplace Cents, SubAssign, sub_assign);
op!(unary Cents, Neg, neg);

impl Sum for Cents {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Value cannot be represented in cents: {0}")]
pub struct CentsConversionError(String);

impl From<i64> for Cents {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl TryFrom<u64> for Cents {
    type Error = CentsConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        i64::try_from(value)
            .map(Self)
            .map_err(|_| CentsConversionError(format!("Value {value} is too large to convert to Cents")))
    }
}

impl Display for Cents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl Cents {
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    /// Whole currency units, e.g. `Cents::from_major(20)` is 20.00
    pub fn from_major(units: i64) -> Self {
        Self(units * 100)
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// Multiplies a unit price by a quantity, returning `None` on overflow.
    pub fn checked_mul_qty(self, qty: i64) -> Option<Self> {
        self.0.checked_mul(qty).map(Self)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(Cents::from(7600).to_string(), "76.00");
        assert_eq!(Cents::from(5).to_string(), "0.05");
        assert_eq!(Cents::from(-1050).to_string(), "-10.50");
        assert_eq!(Cents::from_major(20).to_string(), "20.00");
    }

    #[test]
    fn arithmetic() {
        let mut a = Cents::from(1_000);
        a += Cents::from(250);
        a -= Cents::from(50);
        assert_eq!(a, Cents::from(1_200));
        let total: Cents = [Cents::from(1), Cents::from(2), Cents::from(3)].into_iter().sum();
        assert_eq!(total, Cents::from(6));
        assert_eq!(Cents::from(i64::MAX).checked_mul_qty(2), None);
        assert_eq!(Cents::from(i64::MAX).checked_add(Cents::from(1)), None);
        assert!(Cents::try_from(u64::MAX).is_err());
    }

    #[test]
    fn serde_is_transparent() {
        let json = serde_json::to_string(&Cents::from(42)).unwrap();
        assert_eq!(json, "42");
    }
}
