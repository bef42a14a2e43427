/// Loading packed lanes out of a slice.
pub trait SimdLoad<T> {
    /// Loads one vector's worth of leading elements of `slice`.
    ///
    /// # Panics
    ///
    /// Panics if `slice` holds fewer elements than the vector has lanes.
    fn load(slice: &[T]) -> Self;
}

/// Packed dot product accumulated into a 32-bit sum.
///
/// This is the `sumdotp` family of instructions found on DSP-extended cores:
/// every lane pair is multiplied, the products are summed and added to an
/// accumulator in one step.
pub trait SumDotProduct<Rhs = Self> {
    /// Returns `Σ self[l] * rhs[l]` over all lanes.
    fn dot_p(self, rhs: Rhs) -> i32;

    /// Returns `acc + Σ self[l] * rhs[l]`, wrapping on overflow.
    fn sum_dot_p(self, rhs: Rhs, acc: i32) -> i32;
}
