//! Separable convolution resampler for kernels `image::imageops` lacks

use image::{Rgba, RgbaImage};
use std::f32::consts::PI;

/// A symmetric 1-D reconstruction kernel
#[derive(Clone, Copy)]
pub(crate) struct Kernel {
    pub support: f32,
    pub weight: fn(f32) -> f32,
}

impl Kernel {
    pub const MITCHELL: Kernel = Kernel { support: 2.0, weight: mitchell };
    pub const LANCZOS2: Kernel = Kernel { support: 2.0, weight: lanczos2 };
}

/// Mitchell-Netravali family with parameters (b, c)
fn bc_cubic(x: f32, b: f32, c: f32) -> f32 {
    let x = x.abs();
    let k = if x < 1.0 {
        (12.0 - 9.0 * b - 6.0 * c) * x.powi(3)
            + (-18.0 + 12.0 * b + 6.0 * c) * x.powi(2)
            + (6.0 - 2.0 * b)
    } else if x < 2.0 {
        (-b - 6.0 * c) * x.powi(3)
            + (6.0 * b + 30.0 * c) * x.powi(2)
            + (-12.0 * b - 48.0 * c) * x
            + (8.0 * b + 24.0 * c)
    } else {
        0.0
    };
    k / 6.0
}

fn mitchell(x: f32) -> f32 {
    bc_cubic(x, 1.0 / 3.0, 1.0 / 3.0)
}

fn sinc(x: f32) -> f32 {
    if x == 0.0 {
        1.0
    } else {
        let px = PI * x;
        px.sin() / px
    }
}

fn lanczos2(x: f32) -> f32 {
    if x.abs() < 2.0 { sinc(x) * sinc(x / 2.0) } else { 0.0 }
}

/// Contributing source range and normalized weights for one output sample
struct Contribution {
    start: usize,
    weights: Vec<f32>,
}

fn contributions(src_len: u32, dst_len: u32, kernel: Kernel) -> Vec<Contribution> {
    let ratio = src_len as f32 / dst_len as f32;
    let scale = ratio.max(1.0);
    let support = kernel.support * scale;

    (0..dst_len)
        .map(|i| {
            let center = (i as f32 + 0.5) * ratio;
            let left = ((center - support).floor().max(0.0)) as usize;
            let right = ((center + support).ceil() as usize).min(src_len as usize);

            let mut weights: Vec<f32> = (left..right)
                .map(|j| (kernel.weight)((j as f32 + 0.5 - center) / scale))
                .collect();
            let sum: f32 = weights.iter().sum();

            if sum.abs() > f32::EPSILON {
                weights.iter_mut().for_each(|w| *w /= sum);
                Contribution { start: left, weights }
            } else {
                let nearest = (center as usize).min(src_len as usize - 1);
                Contribution { start: nearest, weights: vec![1.0] }
            }
        })
        .collect()
}

/// Resize `src` to exactly `width` x `height` using `kernel`.
///
/// Both target dimensions must be non-zero and already bounded by the caller.
pub(crate) fn resample(src: &RgbaImage, width: u32, height: u32, kernel: Kernel) -> RgbaImage {
    let (src_w, src_h) = src.dimensions();
    let row_len = width as usize;

    let horizontal = contributions(src_w, width, kernel);
    let mut row_pass = vec![[0f32; 4]; row_len * src_h as usize];
    for y in 0..src_h {
        for (x, c) in horizontal.iter().enumerate() {
            let mut acc = [0f32; 4];
            for (k, w) in c.weights.iter().enumerate() {
                let px = src.get_pixel((c.start + k) as u32, y);
                for ch in 0..4 {
                    acc[ch] += px[ch] as f32 * w;
                }
            }
            row_pass[y as usize * row_len + x] = acc;
        }
    }

    let vertical = contributions(src_h, height, kernel);
    let mut out = RgbaImage::new(width, height);
    for (y, c) in vertical.iter().enumerate() {
        for x in 0..width {
            let mut acc = [0f32; 4];
            for (k, w) in c.weights.iter().enumerate() {
                let px = row_pass[(c.start + k) * row_len + x as usize];
                for ch in 0..4 {
                    acc[ch] += px[ch] * w;
                }
            }
            out.put_pixel(x, y as u32, Rgba(acc.map(|v| v.round().clamp(0.0, 255.0) as u8)));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kernels_peak_at_zero() {
        assert_eq!(lanczos2(0.0), 1.0);
        assert!((mitchell(0.0) - 8.0 / 9.0).abs() < 1e-6);
    }

    #[test]
    fn test_kernels_vanish_outside_support() {
        assert_eq!(lanczos2(2.5), 0.0);
        assert_eq!(lanczos2(-2.0), 0.0);
        assert_eq!(mitchell(2.0), 0.0);
    }

    #[test]
    fn test_contribution_weights_are_normalized() {
        for c in contributions(100, 37, Kernel::MITCHELL) {
            let sum: f32 = c.weights.iter().sum();
            assert!((sum - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_resample_uniform_image_stays_uniform() {
        let src = RgbaImage::from_pixel(16, 9, Rgba([120, 40, 200, 255]));
        let out = resample(&src, 7, 5, Kernel::LANCZOS2);

        assert_eq!(out.dimensions(), (7, 5));
        for px in out.pixels() {
            assert_eq!(*px, Rgba([120, 40, 200, 255]));
        }
    }

    #[test]
    fn test_resample_upscale() {
        let src = RgbaImage::from_pixel(2, 2, Rgba([10, 20, 30, 255]));
        let out = resample(&src, 8, 6, Kernel::MITCHELL);
        assert_eq!(out.dimensions(), (8, 6));
    }
}
