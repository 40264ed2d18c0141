//! Color samples and the blend rules used by the paint engine

use serde::{Deserialize, Serialize};

/// One LED color sample, 8 bits per channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rgb {
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
}

impl Rgb {
    /// All channels off
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };
    /// All channels full
    pub const WHITE: Rgb = Rgb {
        r: 255,
        g: 255,
        b: 255,
    };

    /// Create a color from channel values
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Linear interpolation toward `target` by factor `t` in `[0, 1]`.
    ///
    /// Channel math truncates toward the target, so repeated fades toward
    /// black reach exactly zero rather than stalling one step above it.
    pub fn lerp_toward(self, target: Rgb, t: f32) -> Rgb {
        Rgb {
            r: lerp_channel(self.r, target.r, t),
            g: lerp_channel(self.g, target.g, t),
            b: lerp_channel(self.b, target.b, t),
        }
    }

    /// Per-channel maximum against an incoming paint color.
    ///
    /// Painting never decreases brightness: each channel keeps whichever of
    /// the current and incoming values is larger.
    pub fn max_blend(self, incoming: Rgb) -> Rgb {
        Rgb {
            r: self.r.max(incoming.r),
            g: self.g.max(incoming.g),
            b: self.b.max(incoming.b),
        }
    }

    /// True if every channel is zero
    pub fn is_black(self) -> bool {
        self == Rgb::BLACK
    }
}

impl From<[u8; 3]> for Rgb {
    fn from(c: [u8; 3]) -> Self {
        Rgb::new(c[0], c[1], c[2])
    }
}

fn lerp_channel(from: u8, to: u8, t: f32) -> u8 {
    (from as f32 + (to as f32 - from as f32) * t) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lerp_toward_black_reaches_zero() {
        let mut c = Rgb::new(255, 3, 90);
        for _ in 0..200 {
            c = c.lerp_toward(Rgb::BLACK, 0.1);
        }
        assert_eq!(c, Rgb::BLACK);
    }

    #[test]
    fn test_lerp_toward_is_monotonic() {
        let mut c = Rgb::new(200, 120, 7);
        for _ in 0..50 {
            let next = c.lerp_toward(Rgb::BLACK, 0.25);
            assert!(next.r <= c.r && next.g <= c.g && next.b <= c.b);
            c = next;
        }
    }

    #[test]
    fn test_lerp_zero_factor_is_noop() {
        let c = Rgb::new(13, 200, 77);
        assert_eq!(c.lerp_toward(Rgb::BLACK, 0.0), c);
    }

    #[test]
    fn test_lerp_full_factor_hits_target() {
        let c = Rgb::new(13, 200, 77);
        assert_eq!(c.lerp_toward(Rgb::BLACK, 1.0), Rgb::BLACK);
    }

    #[test]
    fn test_max_blend_never_decreases() {
        let current = Rgb::new(100, 50, 200);
        let incoming = Rgb::new(50, 150, 25);
        assert_eq!(current.max_blend(incoming), Rgb::new(100, 150, 200));
    }

    #[test]
    fn test_max_blend_blue_uses_blue_channel() {
        // Each output channel compares like against like; the blue channel
        // is independent of the red channel.
        let current = Rgb::new(255, 0, 10);
        let incoming = Rgb::new(0, 0, 5);
        assert_eq!(current.max_blend(incoming).b, 10);

        let dim_red = Rgb::new(0, 0, 10);
        let bright_blue = Rgb::new(0, 0, 200);
        assert_eq!(dim_red.max_blend(bright_blue).b, 200);
    }
}
