use std::io::Cursor;

use image::{imageops, DynamicImage, GrayImage, ImageError, ImageFormat};

const SHARPEN_SIGMA: f32 = 1.0;
const SHARPEN_THRESHOLD: i32 = 2;

/// Decode, greyscale, stretch contrast and sharpen. Returns PNG bytes.
pub fn preprocess(bytes: &[u8]) -> Result<Vec<u8>, ImageError> {
    let img = image::load_from_memory(bytes)?;
    let mut luma = img.to_luma8();
    stretch_contrast(&mut luma);
    let sharpened = imageops::unsharpen(&luma, SHARPEN_SIGMA, SHARPEN_THRESHOLD);

    let mut out = Vec::new();
    DynamicImage::ImageLuma8(sharpened).write_to(&mut Cursor::new(&mut out), ImageFormat::Png)?;
    Ok(out)
}

/// Linearly map the darkest pixel to 0 and the brightest to 255.
fn stretch_contrast(img: &mut GrayImage) {
    let (min, max) = img
        .pixels()
        .fold((u8::MAX, u8::MIN), |(lo, hi), p| (lo.min(p.0[0]), hi.max(p.0[0])));
    if max <= min {
        return;
    }
    let range = u16::from(max - min);
    for p in img.pixels_mut() {
        let v = u16::from(p.0[0] - min);
        p.0[0] = (v * 255 / range) as u8;
    }
}
