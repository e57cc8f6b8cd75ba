pub trait FloatExt {
    /// Equality within the crate-wide [`crate::EPSILON`].
    fn approximately_eq(self, other: Self) -> bool;
    /// Equality within a caller-supplied absolute tolerance.
    fn approximately_eq_eps(self, other: Self, eps: Self) -> bool;
}

impl FloatExt for f64 {
    fn approximately_eq(self, other: Self) -> bool {
        (self - other).abs() < crate::EPSILON
    }

    fn approximately_eq_eps(self, other: Self, eps: Self) -> bool {
        (self - other).abs() < eps
    }
}
