//! The strength-versus-toughness wound table.

/// The unmodified wound roll needed for `strength` against `toughness`.
///
/// | Comparison          | Roll |
/// |---------------------|------|
/// | S ≥ 2×T             | 2+   |
/// | S > T               | 3+   |
/// | S = T               | 4+   |
/// | S < T, 2×S > T      | 5+   |
/// | 2×S ≤ T             | 6+   |
pub fn wound_threshold(strength: u32, toughness: u32) -> u8 {
    if strength >= toughness.saturating_mul(2) {
        2
    } else if strength > toughness {
        3
    } else if strength == toughness {
        4
    } else if strength.saturating_mul(2) <= toughness {
        6
    } else {
        5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_rows() {
        assert_eq!(wound_threshold(8, 4), 2);
        assert_eq!(wound_threshold(10, 4), 2);
        assert_eq!(wound_threshold(5, 4), 3);
        assert_eq!(wound_threshold(7, 4), 3);
        assert_eq!(wound_threshold(4, 4), 4);
        assert_eq!(wound_threshold(3, 4), 5);
        assert_eq!(wound_threshold(5, 9), 5);
        assert_eq!(wound_threshold(2, 4), 6);
        assert_eq!(wound_threshold(4, 10), 6);
    }

    #[test]
    fn thresholds_never_leave_two_to_six() {
        for s in 1..=20 {
            for t in 1..=20 {
                assert!((2..=6).contains(&wound_threshold(s, t)));
            }
        }
    }
}
