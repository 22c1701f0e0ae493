//! `modify_image`: produces the near-identical "modified" companion image
//! that Rang-JPEG's difference-set embedding consumes. Algorithmically
//! equivalent to duplicating the layer, running a 0.1-pixel-radius Gaussian
//! blur on the copy, setting its opacity to 1%, and merging it down — done
//! here as one direct integer pass per channel instead of through a
//! compositor.

/// Separable blur kernel `[2, 255, 2] / 259`, with edges clamped (the pixel
/// at the border repeats) rather than wrapped or zero-padded. Only the
/// first `active_channels` of each `stride`-wide pixel are touched — alpha
/// is never blurred, matching `gaussian_blur_tripple`'s hardcoded 3-channel
/// loop.
fn blur_axis(plane: &[u8], width: usize, height: usize, stride: usize, active_channels: usize, vertical: bool) -> Vec<u8> {
    let mut out = plane.to_vec();

    for y in 0..height {
        for x in 0..width {
            for c in 0..active_channels {
                let sample = |y: isize, x: isize| -> i32 {
                    let y = y.clamp(0, height as isize - 1) as usize;
                    let x = x.clamp(0, width as isize - 1) as usize;
                    plane[(y * width + x) * stride + c] as i32
                };

                let (prev, here, next) = if vertical {
                    (sample(y as isize - 1, x as isize), sample(y as isize, x as isize), sample(y as isize + 1, x as isize))
                } else {
                    (sample(y as isize, x as isize - 1), sample(y as isize, x as isize), sample(y as isize, x as isize + 1))
                };

                let blended = (2 * prev + 255 * here + 2 * next + 129) / 259;
                out[(y * width + x) * stride + c] = blended.clamp(0, 255) as u8;
            }
        }
    }

    out
}

/// Produces the modified companion image for an RGBA buffer: per-channel
/// vertical-then-horizontal blur, merged back down onto the original at 1%
/// opacity. Alpha is left untouched by the blur and forced to `0xff` in the
/// output, matching `merge_colours`'s hardcoded `result = 0xff000000`.
pub fn modify_image(width: usize, height: usize, rgba: &[u8]) -> Vec<u8> {
    const CHANNELS: usize = 4;
    const COLOR_CHANNELS: usize = 3;
    debug_assert_eq!(rgba.len(), width * height * CHANNELS);

    let vertical = blur_axis(rgba, width, height, CHANNELS, COLOR_CHANNELS, true);
    let blurred = blur_axis(&vertical, width, height, CHANNELS, COLOR_CHANNELS, false);

    let mut out = vec![0u8; rgba.len()];
    for pixel in 0..(width * height) {
        for c in 0..COLOR_CHANNELS {
            let i = pixel * CHANNELS + c;
            let foreground = blurred[i] as f64;
            let background = rgba[i] as f64;
            let merged = foreground * (2.0 / 255.0) + background * (253.0 / 255.0) + 0.0001;
            out[i] = merged.trunc().clamp(0.0, 255.0) as u8;
        }
        out[pixel * CHANNELS + 3] = 0xff;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_pixel_is_unchanged() {
        let out = modify_image(1, 1, &[100, 100, 100, 255]);
        assert_eq!(out, vec![100, 100, 100, 255]);
    }

    #[test]
    fn uniform_image_color_is_unchanged() {
        let mut pixels = vec![42u8; 5 * 5 * 4];
        for i in (3..pixels.len()).step_by(4) {
            pixels[i] = 255;
        }
        let out = modify_image(5, 5, &pixels);
        assert_eq!(out, pixels);
    }

    #[test]
    fn output_stays_in_byte_range_on_high_contrast_input() {
        let mut pixels = vec![0u8; 4 * 4 * 4];
        for (i, p) in pixels.iter_mut().enumerate() {
            *p = if i % 2 == 0 { 0 } else { 255 };
        }
        let out = modify_image(4, 4, &pixels);
        assert_eq!(out.len(), pixels.len());
    }

    #[test]
    fn alpha_is_always_forced_opaque_and_never_blended() {
        // Non-uniform, non-255 alpha: if alpha were blurred/merged like a
        // color channel, neighboring pixels' differing alpha would leak into
        // each other. It must instead come out as a flat 0xff everywhere.
        let mut pixels = vec![200u8; 3 * 3 * 4];
        for y in 0..3 {
            for x in 0..3 {
                let i = (y * 3 + x) * 4;
                pixels[i + 3] = if (x + y) % 2 == 0 { 0 } else { 128 };
            }
        }
        let out = modify_image(3, 3, &pixels);
        for pixel in 0..9 {
            assert_eq!(out[pixel * 4 + 3], 0xff);
        }
    }
}
