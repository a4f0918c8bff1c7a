//! Color helpers for prizes and animated tints.

use rand::Rng;

/// Convert HSL (all components in 0..1) to linear-ish RGB.
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> [f32; 3] {
    let h = h.rem_euclid(1.0);
    if s <= 0.0 {
        return [l, l, l];
    }
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    let hue = |mut t: f32| -> f32 {
        t = t.rem_euclid(1.0);
        if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 0.5 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        }
    };
    [hue(h + 1.0 / 3.0), hue(h), hue(h - 1.0 / 3.0)]
}

/// Random prize tint in the blue/violet/pink band.
pub fn random_prize_color<R: Rng>(rng: &mut R) -> [f32; 4] {
    let h = rng.gen_range(0.6..0.9);
    let s = rng.gen_range(0.7..1.0);
    let l = rng.gen_range(0.5..0.7);
    let [r, g, b] = hsl_to_rgb(h, s, l);
    [r, g, b, 1.0]
}

/// Hue-cycling tint for color-shift display pieces.
pub fn color_shift(elapsed: f32) -> [f32; 4] {
    let [r, g, b] = hsl_to_rgb(elapsed * 0.1, 0.8, 0.6);
    [r, g, b, 1.0]
}
