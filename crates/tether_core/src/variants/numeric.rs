//! Arithmetic on integer and floating point properties
//!
//! Arithmetic methods are pure: they compute from the current value and
//! return the result without touching the property. Feed the result back
//! through `set` to store it. Only `increment` and `decrement` mutate.
//!
//! Operand types promote the usual way: `i64` with `i64` stays `i64`, and
//! any `f64` operand makes the result `f64`. `divide` always produces `f64`;
//! `truncating_divide` is the integer division.
//!
//! ```
//! use tether_core::ViewModel;
//!
//! let vm = ViewModel::new();
//! let count = vm.property("count", 7i64);
//! assert_eq!(count.add(3i64), 10i64);
//! assert_eq!(count.add(0.5), 7.5);
//! assert_eq!(count.divide(2i64), 3.5);
//! assert_eq!(count.truncating_divide(2).unwrap(), 3);
//! assert_eq!(count.value(), 7);
//! ```
//!
//! The nullable forms fail with [`TetherError::NullValue`] from every
//! arithmetic method while the value is absent.

use crate::error::{Result, TetherError};
use crate::property::Property;

/// Operand promotion for property arithmetic
pub trait Promote<Rhs>: Copy {
    type Output;

    fn add(self, rhs: Rhs) -> Self::Output;
    fn sub(self, rhs: Rhs) -> Self::Output;
    fn mul(self, rhs: Rhs) -> Self::Output;
    /// Euclidean remainder; `None` for an integer zero divisor
    fn rem(self, rhs: Rhs) -> Option<Self::Output>;
}

impl Promote<i64> for i64 {
    type Output = i64;

    fn add(self, rhs: i64) -> i64 {
        self.wrapping_add(rhs)
    }

    fn sub(self, rhs: i64) -> i64 {
        self.wrapping_sub(rhs)
    }

    fn mul(self, rhs: i64) -> i64 {
        self.wrapping_mul(rhs)
    }

    fn rem(self, rhs: i64) -> Option<i64> {
        (rhs != 0).then(|| self.wrapping_rem_euclid(rhs))
    }
}

macro_rules! float_promotion {
    ($lhs:ty, $rhs:ty) => {
        impl Promote<$rhs> for $lhs {
            type Output = f64;

            fn add(self, rhs: $rhs) -> f64 {
                self as f64 + rhs as f64
            }

            fn sub(self, rhs: $rhs) -> f64 {
                self as f64 - rhs as f64
            }

            fn mul(self, rhs: $rhs) -> f64 {
                self as f64 * rhs as f64
            }

            fn rem(self, rhs: $rhs) -> Option<f64> {
                Some((self as f64).rem_euclid(rhs as f64))
            }
        }
    };
}

float_promotion!(i64, f64);
float_promotion!(f64, i64);
float_promotion!(f64, f64);

/// A number usable as a `divide` operand
pub trait Numeric: Copy {
    fn to_f64(self) -> f64;
}

impl Numeric for i64 {
    fn to_f64(self) -> f64 {
        self as f64
    }
}

impl Numeric for f64 {
    fn to_f64(self) -> f64 {
        self
    }
}

/// Pure arithmetic shared by `i64` and `f64` properties
macro_rules! arithmetic {
    ($ty:ty) => {
        impl Property<$ty> {
            pub fn add<R>(&self, rhs: R) -> <$ty as Promote<R>>::Output
            where
                $ty: Promote<R>,
            {
                <$ty as Promote<R>>::add(self.value(), rhs)
            }

            pub fn subtract<R>(&self, rhs: R) -> <$ty as Promote<R>>::Output
            where
                $ty: Promote<R>,
            {
                <$ty as Promote<R>>::sub(self.value(), rhs)
            }

            pub fn multiply<R>(&self, rhs: R) -> <$ty as Promote<R>>::Output
            where
                $ty: Promote<R>,
            {
                <$ty as Promote<R>>::mul(self.value(), rhs)
            }

            /// Euclidean remainder, never negative for a positive divisor
            pub fn modulo<R>(&self, rhs: R) -> Result<<$ty as Promote<R>>::Output>
            where
                $ty: Promote<R>,
            {
                <$ty as Promote<R>>::rem(self.value(), rhs).ok_or_else(|| {
                    TetherError::DivisionByZero {
                        name: self.display_name(),
                    }
                })
            }

            /// Exact division
            pub fn divide<R: Numeric>(&self, rhs: R) -> f64 {
                self.value().to_f64() / rhs.to_f64()
            }

            pub fn is_negative(&self) -> bool {
                self.value() < (0 as $ty)
            }

            pub fn to_double(&self) -> f64 {
                self.value().to_f64()
            }
        }

        impl Property<Option<$ty>> {
            fn present(&self, operation: &'static str) -> Result<$ty> {
                self.value().ok_or_else(|| TetherError::NullValue {
                    name: self.display_name(),
                    operation,
                })
            }

            pub fn is_null(&self) -> bool {
                self.with_value(Option::is_none)
            }

            pub fn is_not_null(&self) -> bool {
                !self.is_null()
            }

            pub fn value_or(&self, default: $ty) -> $ty {
                self.value().unwrap_or(default)
            }

            pub fn add<R>(&self, rhs: R) -> Result<<$ty as Promote<R>>::Output>
            where
                $ty: Promote<R>,
            {
                Ok(<$ty as Promote<R>>::add(self.present("add")?, rhs))
            }

            pub fn subtract<R>(&self, rhs: R) -> Result<<$ty as Promote<R>>::Output>
            where
                $ty: Promote<R>,
            {
                Ok(<$ty as Promote<R>>::sub(self.present("subtract")?, rhs))
            }

            pub fn multiply<R>(&self, rhs: R) -> Result<<$ty as Promote<R>>::Output>
            where
                $ty: Promote<R>,
            {
                Ok(<$ty as Promote<R>>::mul(self.present("multiply")?, rhs))
            }

            pub fn modulo<R>(&self, rhs: R) -> Result<<$ty as Promote<R>>::Output>
            where
                $ty: Promote<R>,
            {
                let value = self.present("modulo")?;
                <$ty as Promote<R>>::rem(value, rhs).ok_or_else(|| {
                    TetherError::DivisionByZero {
                        name: self.display_name(),
                    }
                })
            }

            pub fn divide<R: Numeric>(&self, rhs: R) -> Result<f64> {
                Ok(self.present("divide")?.to_f64() / rhs.to_f64())
            }

            pub fn to_double(&self) -> Result<f64> {
                Ok(self.present("convert")?.to_f64())
            }
        }
    };
}

arithmetic!(i64);
arithmetic!(f64);

impl Property<i64> {
    /// Add one and notify
    pub fn increment(&self) -> Result<i64> {
        self.update(|value| value.wrapping_add(1))
    }

    /// Subtract one and notify
    pub fn decrement(&self) -> Result<i64> {
        self.update(|value| value.wrapping_sub(1))
    }

    pub fn truncating_divide(&self, rhs: i64) -> Result<i64> {
        if rhs == 0 {
            return Err(TetherError::DivisionByZero {
                name: self.display_name(),
            });
        }
        Ok(self.value().wrapping_div(rhs))
    }

    pub fn abs(&self) -> i64 {
        self.value().wrapping_abs()
    }

    pub fn is_even(&self) -> bool {
        self.value() % 2 == 0
    }

    pub fn is_odd(&self) -> bool {
        !self.is_even()
    }
}

impl Property<f64> {
    /// Integer part of the quotient
    pub fn truncating_divide(&self, rhs: f64) -> Result<i64> {
        if rhs == 0.0 {
            return Err(TetherError::DivisionByZero {
                name: self.display_name(),
            });
        }
        Ok((self.value() / rhs).trunc() as i64)
    }

    pub fn abs(&self) -> f64 {
        self.value().abs()
    }

    pub fn round(&self) -> f64 {
        self.value().round()
    }

    pub fn floor(&self) -> f64 {
        self.value().floor()
    }

    pub fn ceil(&self) -> f64 {
        self.value().ceil()
    }

    pub fn truncate(&self) -> f64 {
        self.value().trunc()
    }

    pub fn is_nan(&self) -> bool {
        self.value().is_nan()
    }
}

impl Property<Option<i64>> {
    pub fn increment(&self) -> Result<i64> {
        let next = self.present("increment")?.wrapping_add(1);
        self.set(Some(next))?;
        Ok(next)
    }

    pub fn decrement(&self) -> Result<i64> {
        let next = self.present("decrement")?.wrapping_sub(1);
        self.set(Some(next))?;
        Ok(next)
    }

    pub fn truncating_divide(&self, rhs: i64) -> Result<i64> {
        let value = self.present("divide")?;
        if rhs == 0 {
            return Err(TetherError::DivisionByZero {
                name: self.display_name(),
            });
        }
        Ok(value.wrapping_div(rhs))
    }

    pub fn abs(&self) -> Result<i64> {
        Ok(self.present("abs")?.wrapping_abs())
    }
}

impl Property<Option<f64>> {
    pub fn abs(&self) -> Result<f64> {
        Ok(self.present("abs")?.abs())
    }

    pub fn round(&self) -> Result<f64> {
        Ok(self.present("round")?.round())
    }
}

#[cfg(test)]
mod tests {
    use crate::{ChangeKind, TetherError, ViewModel};

    #[test]
    fn test_int_promotion() {
        let vm = ViewModel::new();
        let count = vm.property("count", 7i64);

        assert_eq!(count.add(3i64), 10i64);
        assert_eq!(count.subtract(10i64), -3i64);
        assert_eq!(count.multiply(1.5), 10.5);
        assert_eq!(count.divide(2i64), 3.5);
        assert_eq!(count.truncating_divide(2).unwrap(), 3);
        // Pure arithmetic leaves the property alone
        assert_eq!(count.value(), 7);
    }

    #[test]
    fn test_modulo_is_euclidean() {
        let vm = ViewModel::new();
        let count = vm.property("count", -7i64);
        assert_eq!(count.modulo(3i64).unwrap(), 2);
        assert_eq!(count.modulo(3.0).unwrap(), 2.0);
        assert_eq!(
            count.modulo(0i64).unwrap_err(),
            TetherError::DivisionByZero {
                name: "count".into()
            }
        );
        assert!(count.truncating_divide(0).is_err());
    }

    #[test]
    fn test_increment_notifies() {
        let vm = ViewModel::new();
        let count = vm.property("count", 1i64);
        let mut rx = vm.subscribe_changes().unwrap();

        assert_eq!(count.increment().unwrap(), 2);
        assert_eq!(count.decrement().unwrap(), 1);

        let first = rx.try_recv().unwrap();
        assert_eq!(first[0].kind(), ChangeKind::Set);
        assert_eq!(first[0].next::<i64>(), Some(&2));
        let second = rx.try_recv().unwrap();
        assert_eq!(second[0].next::<i64>(), Some(&1));
    }

    #[test]
    fn test_int_predicates() {
        let vm = ViewModel::new();
        let count = vm.property("count", -4i64);
        assert!(count.is_negative());
        assert!(count.is_even());
        assert!(!count.is_odd());
        assert_eq!(count.abs(), 4);
        assert_eq!(count.to_double(), -4.0);
    }

    #[test]
    fn test_double_helpers() {
        let vm = ViewModel::new();
        let price = vm.property("price", 2.5f64);

        assert_eq!(price.add(1i64), 3.5);
        assert_eq!(price.multiply(2.0), 5.0);
        assert_eq!(price.round(), 3.0);
        assert_eq!(price.floor(), 2.0);
        assert_eq!(price.ceil(), 3.0);
        assert_eq!(price.truncate(), 2.0);
        assert_eq!(price.truncating_divide(2.0).unwrap(), 1);
        assert!(!price.is_nan());
        assert!(price.divide(0i64).is_infinite());
    }

    #[test]
    fn test_nullable_arithmetic_requires_value() {
        let vm = ViewModel::new();
        let total = vm.property("total", None::<i64>);

        let err = total.add(5i64).unwrap_err();
        assert_eq!(
            err,
            TetherError::NullValue {
                name: "total".into(),
                operation: "add",
            }
        );
        assert!(total.increment().is_err());
        assert!(total.divide(2i64).is_err());
        assert!(total.is_null());
        assert_eq!(total.value_or(3), 3);

        total.set(Some(10)).unwrap();
        assert_eq!(total.add(5i64).unwrap(), 15);
        assert_eq!(total.value(), Some(10));
        assert_eq!(total.increment().unwrap(), 11);
        assert!(total.is_not_null());
    }

    #[test]
    fn test_nullable_double() {
        let vm = ViewModel::new();
        let ratio = vm.property("ratio", None::<f64>);
        assert!(matches!(
            ratio.multiply(2i64),
            Err(TetherError::NullValue { operation: "multiply", .. })
        ));

        ratio.set(Some(-1.25)).unwrap();
        assert_eq!(ratio.abs().unwrap(), 1.25);
        assert_eq!(ratio.subtract(0.75).unwrap(), -2.0);
    }
}
