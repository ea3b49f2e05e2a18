//! Integer math types and glam re-exports.
//!
//! We re-export [glam](https://docs.rs/glam)'s `IVec2` so users don't need to
//! depend on it directly. Everything in the atlas pipeline is integer pixels;
//! the only fractional values are FreeType's 26.6 fixed-point metrics, which
//! [`round_26_6`] converts at the boundary.

pub use glam::IVec2;

/// An axis-aligned rectangle in integer pixel coordinates.
///
/// Stored as min/max corners, with (0,0) at the top-left and Y increasing
/// downward. `min` is inclusive, `max` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IntRect {
    pub min: IVec2,
    pub max: IVec2,
}

impl IntRect {
    /// Build from a top-left corner and a size.
    pub fn from_min_size(min: IVec2, size: IVec2) -> Self {
        Self {
            min,
            max: min + size,
        }
    }

    pub fn width(&self) -> i32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> i32 {
        self.max.y - self.min.y
    }

    pub fn size(&self) -> IVec2 {
        self.max - self.min
    }

    /// True if `other` shares any area with this rectangle.
    pub fn intersects(&self, other: &IntRect) -> bool {
        self.min.x < other.max.x
            && other.min.x < self.max.x
            && self.min.y < other.max.y
            && other.min.y < self.max.y
    }

    /// True if `other` lies entirely inside this rectangle.
    pub fn contains_rect(&self, other: &IntRect) -> bool {
        self.min.x <= other.min.x
            && self.min.y <= other.min.y
            && other.max.x <= self.max.x
            && other.max.y <= self.max.y
    }
}

/// Round a signed 26.6 fixed-point value to the nearest integer pixel,
/// ties rounding up.
///
/// The tempting `(v + 32) >> 6` overflows for values near the representable
/// maximum, so the fractional part is inspected instead. The shift is an
/// arithmetic shift, i.e. division toward negative infinity, which is what
/// FreeType's metrics expect.
pub fn round_26_6(v: i64) -> i32 {
    ((v >> 6) + ((v & 63) >= 32) as i64) as i32
}

/// Unpack a `0xAABBGGRR` color into `[r, g, b, a]` bytes.
///
/// The low byte is red; alpha sits in the top byte. All color options in the
/// build settings use this encoding.
pub fn unpack_abgr(color: u32) -> [u8; 4] {
    [
        (color & 0xff) as u8,
        ((color >> 8) & 0xff) as u8,
        ((color >> 16) & 0xff) as u8,
        ((color >> 24) & 0xff) as u8,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_matches_reference_formula() {
        // Reference: trunc toward -inf of v/64, plus one when the fractional
        // part is >= 32/64.
        for &v in &[
            0i64,
            1,
            31,
            32,
            33,
            63,
            64,
            65,
            -1,
            -31,
            -32,
            -33,
            -63,
            -64,
            -65,
            12345,
            -12345,
            (1 << 31) - 65,
            -((1 << 31) - 65),
        ] {
            let expected = v.div_euclid(64) + ((v.rem_euclid(64) >= 32) as i64);
            assert_eq!(round_26_6(v) as i64, expected, "v = {v}");
        }
    }

    #[test]
    fn round_ties_go_up() {
        assert_eq!(round_26_6(32), 1); // 0.5 -> 1
        assert_eq!(round_26_6(96), 2); // 1.5 -> 2
        assert_eq!(round_26_6(-32), 0); // -0.5 -> 0
        assert_eq!(round_26_6(-96), -1); // -1.5 -> -1
    }

    #[test]
    fn round_survives_extremes() {
        // The naive (v + 32) >> 6 would overflow an i32-ranged input here.
        let near_max = (1i64 << 31) - 64;
        assert_eq!(round_26_6(near_max) as i64, near_max / 64);
    }

    #[test]
    fn rect_queries() {
        let a = IntRect::from_min_size(IVec2::new(10, 10), IVec2::new(4, 6));
        assert_eq!(a.width(), 4);
        assert_eq!(a.height(), 6);
        assert_eq!(a.size(), IVec2::new(4, 6));

        let b = IntRect::from_min_size(IVec2::new(13, 15), IVec2::new(4, 4));
        let c = IntRect::from_min_size(IVec2::new(14, 16), IVec2::new(1, 1));
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert!(b.contains_rect(&c));
        assert!(!c.contains_rect(&b));
    }

    #[test]
    fn abgr_channel_order() {
        let [r, g, b, a] = unpack_abgr(0xFF00_80FF);
        assert_eq!((r, g, b, a), (0xFF, 0x80, 0x00, 0xFF));
    }
}
