use serde::{Deserialize, Serialize};

/// Money amount represented in integer minor units (cents) to avoid
/// floating point drift in financial arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money {
    /// Amount in cents (e.g., 1000 = $10.00)
    cents: i64,
}

impl Money {
    /// Creates a new Money amount from cents.
    pub fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    /// Creates a new Money amount from a whole major-unit value.
    pub fn from_dollars(dollars: i64) -> Self {
        Self {
            cents: dollars * 100,
        }
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self { cents: 0 }
    }

    /// Returns the amount in cents.
    pub fn cents(&self) -> i64 {
        self.cents
    }

    /// Returns the major-unit portion (whole number).
    pub fn dollars(&self) -> i64 {
        self.cents / 100
    }

    /// Returns the minor-unit portion (remainder after dollars).
    pub fn cents_part(&self) -> i64 {
        self.cents.abs() % 100
    }

    /// Returns true if the amount is positive.
    pub fn is_positive(&self) -> bool {
        self.cents > 0
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.cents == 0
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        self.cents < 0
    }

    /// Returns the absolute value.
    pub fn abs(&self) -> Money {
        Money {
            cents: self.cents.abs(),
        }
    }

    /// Multiplies by a quantity.
    pub fn multiply(&self, quantity: u32) -> Money {
        Money {
            cents: self.cents * quantity as i64,
        }
    }

    /// Returns the proportional share `self * part / whole`, rounded
    /// half-up at minor-unit precision.
    ///
    /// Used for splitting a line's tax across removed units. Returns zero
    /// when `whole` is zero.
    pub fn prorate(&self, part: u32, whole: u32) -> Money {
        if whole == 0 {
            return Money::zero();
        }
        let numerator = self.cents as i128 * part as i128 * 2 + whole as i128;
        let denominator = whole as i128 * 2;
        Money {
            cents: (numerator / denominator) as i64,
        }
    }

    /// Subtracts `other`, clamping the result at zero.
    pub fn saturating_sub(&self, other: Money) -> Money {
        let cents = self.cents - other.cents;
        Money {
            cents: cents.max(0),
        }
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.cents < 0 {
            write!(f, "-${}.{:02}", self.dollars().abs(), self.cents_part())
        } else {
            write!(f, "${}.{:02}", self.dollars(), self.cents_part())
        }
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money {
            cents: self.cents + rhs.cents,
        }
    }
}

impl std::ops::Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Self) -> Self::Output {
        Money {
            cents: self.cents - rhs.cents,
        }
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.cents += rhs.cents;
    }
}

impl std::ops::SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.cents -= rhs.cents;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_from_cents() {
        let money = Money::from_cents(1234);
        assert_eq!(money.cents(), 1234);
        assert_eq!(money.dollars(), 12);
        assert_eq!(money.cents_part(), 34);
    }

    #[test]
    fn test_money_from_dollars() {
        let money = Money::from_dollars(50);
        assert_eq!(money.cents(), 5000);
    }

    #[test]
    fn test_money_display() {
        assert_eq!(Money::from_cents(1234).to_string(), "$12.34");
        assert_eq!(Money::from_cents(5).to_string(), "$0.05");
        assert_eq!(Money::from_cents(-1234).to_string(), "-$12.34");
    }

    #[test]
    fn test_money_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!(a.multiply(3).cents(), 3000);
    }

    #[test]
    fn test_money_comparison() {
        assert!(Money::from_cents(100).is_positive());
        assert!(Money::from_cents(0).is_zero());
        assert!(Money::from_cents(-100).is_negative());
        assert_eq!(Money::from_cents(-100).abs().cents(), 100);
    }

    #[test]
    fn test_prorate_exact_split() {
        // $4.00 of tax on 2 units, remove 1 -> $2.00
        let tax = Money::from_cents(400);
        assert_eq!(tax.prorate(1, 2).cents(), 200);
    }

    #[test]
    fn test_prorate_rounds_half_up() {
        // $1.00 over 3 units: one unit's share is 33.33 -> 33,
        // two units' share is 66.67 -> 67
        let tax = Money::from_cents(100);
        assert_eq!(tax.prorate(1, 3).cents(), 33);
        assert_eq!(tax.prorate(2, 3).cents(), 67);
        // exact half rounds up
        assert_eq!(Money::from_cents(1).prorate(1, 2).cents(), 1);
    }

    #[test]
    fn test_prorate_zero_whole() {
        assert_eq!(Money::from_cents(100).prorate(1, 0).cents(), 0);
    }

    #[test]
    fn test_saturating_sub_clamps_at_zero() {
        let a = Money::from_cents(100);
        assert_eq!(a.saturating_sub(Money::from_cents(40)).cents(), 60);
        assert_eq!(a.saturating_sub(Money::from_cents(150)).cents(), 0);
    }

    #[test]
    fn test_add_assign_and_sub_assign() {
        let mut money = Money::from_cents(100);
        money += Money::from_cents(50);
        assert_eq!(money.cents(), 150);
        money -= Money::from_cents(30);
        assert_eq!(money.cents(), 120);
    }
}
