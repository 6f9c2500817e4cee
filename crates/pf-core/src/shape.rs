//! Port shapes.

use core::fmt;

/// Number of hourly values in one operating year.
pub const HOURS_PER_YEAR: usize = 8760;

/// Declared shape of a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Shape {
    /// A single value.
    Scalar,
    /// A fixed-length series (canonically [`HOURS_PER_YEAR`] hourly values).
    Series(usize),
    /// Shape copied from whatever the port is connected to.
    Dynamic,
}

impl Shape {
    /// The canonical hourly series for one operating year.
    pub fn hourly() -> Self {
        Shape::Series(HOURS_PER_YEAR)
    }

    /// Whether a port of shape `self` may be wired to a port of shape `other`.
    ///
    /// Scalars pair with scalars, series with equal-length series, and a
    /// dynamic port adopts its partner's shape.
    pub fn compatible_with(self, other: Shape) -> bool {
        match (self, other) {
            (Shape::Dynamic, _) | (_, Shape::Dynamic) => true,
            (Shape::Scalar, Shape::Scalar) => true,
            (Shape::Series(a), Shape::Series(b)) => a == b,
            _ => false,
        }
    }

    /// Whether a runtime value of this length fits the declared shape.
    pub fn admits_len(self, len: Option<usize>) -> bool {
        match (self, len) {
            (Shape::Dynamic, _) => true,
            (Shape::Scalar, None) => true,
            (Shape::Series(n), Some(m)) => n == m,
            _ => false,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Scalar => f.write_str("scalar"),
            Shape::Series(n) => write!(f, "series[{}]", n),
            Shape::Dynamic => f.write_str("dynamic"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compatibility_rules() {
        assert!(Shape::Scalar.compatible_with(Shape::Scalar));
        assert!(Shape::hourly().compatible_with(Shape::Series(8760)));
        assert!(!Shape::Series(24).compatible_with(Shape::Series(8760)));
        assert!(!Shape::Scalar.compatible_with(Shape::hourly()));
        assert!(Shape::Dynamic.compatible_with(Shape::hourly()));
        assert!(Shape::Scalar.compatible_with(Shape::Dynamic));
    }

    #[test]
    fn runtime_lengths() {
        assert!(Shape::Scalar.admits_len(None));
        assert!(!Shape::Scalar.admits_len(Some(3)));
        assert!(Shape::Series(3).admits_len(Some(3)));
        assert!(Shape::Dynamic.admits_len(Some(99)));
    }
}
