//! Ordering and equality of values under a column kind.

use super::convert::Converter;
use super::value::Value;
use crate::types::ColumnKind;
use std::cmp::Ordering;
use std::sync::Arc;

impl Converter {
    /// Total order of two cells viewed as `kind`.
    ///
    /// Nulls sort first, then values convertible to `kind` in the kind's
    /// natural order, then unconvertible values ordered by their text form.
    pub fn compare(&self, kind: ColumnKind, a: Option<&Value>, b: Option<&Value>) -> Ordering {
        let (a, b) = match (a, b) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(a), Some(b)) => (a, b),
        };
        if std::ptr::eq(a, b) {
            return Ordering::Equal;
        }
        match (self.convert_value(kind, a), self.convert_value(kind, b)) {
            (Some(x), Some(y)) => compare_same_kind(&x, &y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.to_text(a).cmp(&self.to_text(b)),
        }
    }

    /// Equality consistent with [`Converter::compare`].
    pub fn equals(&self, kind: ColumnKind, a: Option<&Value>, b: Option<&Value>) -> bool {
        if let (Some(a), Some(b)) = (a, b) {
            if std::ptr::eq(a, b) {
                return true;
            }
        }
        self.compare(kind, a, b) == Ordering::Equal
    }
}

fn compare_same_kind(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Text(x), Value::Text(y)) => x
            .to_lowercase()
            .cmp(&y.to_lowercase())
            .then_with(|| x.cmp(y)),
        (Value::Integer(x), Value::Integer(y)) => x.cmp(y),
        (Value::Float(x), Value::Float(y)) => unsigned_zero(*x).total_cmp(&unsigned_zero(*y)),
        (Value::Colour(x), Value::Colour(y)) => x.to_rgb().cmp(&y.to_rgb()),
        (Value::Image(x), Value::Image(y)) => x.cmp(y),
        (Value::Duration(x), Value::Duration(y)) => x.cmp(y),
        (Value::Geometry(x), Value::Geometry(y)) => {
            if Arc::ptr_eq(x, y) {
                Ordering::Equal
            } else {
                x.to_wkt().cmp(&y.to_wkt())
            }
        }
        // Both sides were converted to the same kind by the caller.
        _ => unreachable!("compare_same_kind called with {:?} and {:?}", a.kind(), b.kind()),
    }
}

/// `-0.0` becomes `0.0`; everything else is unchanged.
fn unsigned_zero(f: f64) -> f64 {
    f + 0.0
}

/// Compare with the default converter.
pub fn compare(kind: ColumnKind, a: Option<&Value>, b: Option<&Value>) -> Ordering {
    Converter::default().compare(kind, a, b)
}

/// Equality with the default converter.
pub fn equals(kind: ColumnKind, a: Option<&Value>, b: Option<&Value>) -> bool {
    Converter::default().equals(kind, a, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values::{Colour, Geometry, TimeDuration};

    #[test]
    fn test_nulls_first() {
        let one = Value::Integer(1);
        assert_eq!(compare(ColumnKind::Integer64, None, Some(&one)), Ordering::Less);
        assert_eq!(compare(ColumnKind::Integer64, Some(&one), None), Ordering::Greater);
        assert!(equals(ColumnKind::Text, None, None));
    }

    #[test]
    fn test_numeric_not_lexical() {
        let nine = Value::text("9");
        let ten = Value::text("10");
        assert_eq!(compare(ColumnKind::Integer64, Some(&nine), Some(&ten)), Ordering::Less);
        assert_eq!(compare(ColumnKind::Text, Some(&nine), Some(&ten)), Ordering::Greater);
    }

    #[test]
    fn test_cross_kind_equality() {
        assert!(equals(
            ColumnKind::Float64,
            Some(&Value::Integer(3)),
            Some(&Value::text("3.0"))
        ));
        assert!(equals(
            ColumnKind::Colour,
            Some(&Value::text("red")),
            Some(&Value::Colour(Colour::new(255, 0, 0)))
        ));
        assert!(!equals(
            ColumnKind::Text,
            Some(&Value::text("Abc")),
            Some(&Value::text("abc"))
        ));
    }

    #[test]
    fn test_text_case_insensitive_first() {
        let a = Value::text("apple");
        let b = Value::text("Banana");
        assert_eq!(compare(ColumnKind::Text, Some(&a), Some(&b)), Ordering::Less);
    }

    #[test]
    fn test_unconvertible_sort_last() {
        let good = Value::Integer(1_000_000);
        let bad = Value::text("n/a");
        assert_eq!(compare(ColumnKind::Integer64, Some(&good), Some(&bad)), Ordering::Less);
        assert_eq!(compare(ColumnKind::Integer64, Some(&bad), Some(&bad.clone())), Ordering::Equal);
    }

    #[test]
    fn test_chronological() {
        let short = Value::Duration(TimeDuration::from_hms(0, 59, 0));
        let long = Value::text("01:00");
        assert_eq!(
            compare(ColumnKind::TimeDuration, Some(&short), Some(&long)),
            Ordering::Less
        );
    }

    #[test]
    fn test_signed_zero_equal() {
        let pos = Value::Float(0.0);
        let neg = Value::Float(-0.0);
        assert!(equals(ColumnKind::Float64, Some(&pos), Some(&neg)));
        assert_eq!(
            compare(ColumnKind::Float64, Some(&neg), Some(&Value::Float(f64::MIN_POSITIVE))),
            Ordering::Less
        );
    }

    #[test]
    fn test_same_reference_short_circuit() {
        let g = Value::from(Geometry::point(0.0, 0.0));
        assert!(equals(ColumnKind::Geometry, Some(&g), Some(&g)));
        let nan = Value::Float(f64::NAN);
        assert!(equals(ColumnKind::Float64, Some(&nan), Some(&nan)));
    }
}
