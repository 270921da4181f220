//! Blur filters over 8-bit planes.

use crate::renderer::buffer::{AlphaMask, RgbImage};

/// Box blur of one channel of an interleaved 8-bit image, in place.
///
/// `channels` is the number of interleaved channels and `channel` the one
/// being filtered. The window is `2·radius + 1` wide, edges are clamped.
fn box_blur_plane(data: &mut [u8], width: usize, height: usize, channels: usize, channel: usize, radius: usize) {
    if radius == 0 || width == 0 || height == 0 {
        return;
    }
    let window = (2 * radius + 1) as u32;
    let mut line: Vec<u8> = Vec::with_capacity(width.max(height));

    let mut pass = |data: &mut [u8], len: usize, lines: usize, at: &dyn Fn(usize, usize) -> usize| {
        for l in 0..lines {
            line.clear();
            line.extend((0..len).map(|i| data[at(l, i)]));
            let clamped = |i: isize| line[i.clamp(0, len as isize - 1) as usize] as u32;

            let r = radius as isize;
            let mut sum: u32 = (-r..=r).map(&clamped).sum();
            for i in 0..len {
                data[at(l, i)] = ((sum + window / 2) / window) as u8;
                let i = i as isize;
                sum = sum + clamped(i + r + 1) - clamped(i - r);
            }
        }
    };

    pass(data, width, height, &|y, x| (y * width + x) * channels + channel);
    pass(data, height, width, &|x, y| (y * width + x) * channels + channel);
}

/// Box blur an alpha mask in place.
pub fn box_blur(mask: &mut AlphaMask, radius: u32) {
    let (w, h) = (mask.width() as usize, mask.height() as usize);
    box_blur_plane(mask.data_mut(), w, h, 1, 0, radius as usize);
}

/// Box blur every channel of an RGB image in place.
pub fn box_blur_rgb(image: &mut RgbImage, radius: u32) {
    let (w, h) = (image.width() as usize, image.height() as usize);
    let bytes = image.as_bytes_mut();
    for channel in 0..3 {
        box_blur_plane(bytes, w, h, 3, channel, radius as usize);
    }
}

/// Mirror an out-of-range index back into `0..len` (`d c b a | a b c d | d c b a`).
fn reflect(mut i: isize, len: isize) -> usize {
    loop {
        if i < 0 {
            i = -i - 1;
        } else if i >= len {
            i = 2 * len - i - 1;
        } else {
            return i as usize;
        }
    }
}

/// Gaussian blur of a row-major `f32` plane in place, with the kernel
/// truncated at four deviations and reflected edges.
pub fn gaussian_blur(data: &mut [f32], width: usize, height: usize, sigma: f64) {
    if sigma <= 0.0 || width == 0 || height == 0 {
        return;
    }
    let radius = (4.0 * sigma + 0.5) as isize;
    let mut kernel: Vec<f32> = (-radius..=radius)
        .map(|k| (-0.5 * (k as f64 / sigma).powi(2)).exp() as f32)
        .collect();
    let total: f32 = kernel.iter().sum();
    kernel.iter_mut().for_each(|k| *k /= total);

    let mut line: Vec<f32> = Vec::with_capacity(width.max(height));
    let mut pass = |data: &mut [f32], len: usize, lines: usize, at: &dyn Fn(usize, usize) -> usize| {
        for l in 0..lines {
            line.clear();
            line.extend((0..len).map(|i| data[at(l, i)]));
            for i in 0..len {
                let mut acc = 0.0;
                for (k, weight) in kernel.iter().enumerate() {
                    let src = reflect(i as isize + k as isize - radius, len as isize);
                    acc += line[src] * weight;
                }
                data[at(l, i)] = acc;
            }
        }
    };

    pass(data, width, height, &|y, x| y * width + x);
    pass(data, height, width, &|x, y| y * width + x);
}
