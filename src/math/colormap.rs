//! Jet color mapping for heat layers

use image::Rgb;

/// Map an intensity in [0, 1] onto the jet gradient
///
/// Runs dark blue → cyan → yellow → dark red. Inputs outside the unit
/// interval are clamped first, NaN maps like zero.
pub fn jet(value: f32) -> Rgb<u8> {
    let v = if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    };

    let channel = |offset: f32| -> u8 {
        let level = (1.5 - 4.0f32.mul_add(v, -offset).abs()).clamp(0.0, 1.0);
        (level * 255.0).round() as u8
    };

    Rgb([channel(3.0), channel(2.0), channel(1.0)])
}

/// Alpha blend a heat color over an original pixel
///
/// `alpha` is the share of the heat color, the original keeps `1 - alpha`.
pub fn blend(heat: Rgb<u8>, original: Rgb<u8>, alpha: f32) -> Rgb<u8> {
    let mut out = [0u8; 3];
    for ((o, &h), &p) in out.iter_mut().zip(heat.0.iter()).zip(original.0.iter()) {
        let mixed = alpha.mul_add(f32::from(h), (1.0 - alpha) * f32::from(p));
        *o = mixed.round().clamp(0.0, 255.0) as u8;
    }
    Rgb(out)
}
