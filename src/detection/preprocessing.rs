use image::DynamicImage;
use image::imageops::FilterType;

/// Resize to a square model input and lay pixels out as normalized planar RGB.
///
/// Returns `3 * size * size` values in channel-major (CHW) order, each in [0, 1].
pub fn to_chw_tensor_data(img: &DynamicImage, size: u32) -> Vec<f32> {
    let resized = img.resize_exact(size, size, FilterType::Triangle).to_rgb8();
    let plane = (size * size) as usize;
    let mut data = vec![0.0f32; 3 * plane];

    for (x, y, pixel) in resized.enumerate_pixels() {
        let offset = (y * size + x) as usize;
        for channel in 0..3 {
            data[channel * plane + offset] = f32::from(pixel[channel]) / 255.0;
        }
    }

    data
}

/// Scale factors mapping model-input coordinates back to the source image
pub fn scale_factors(img: &DynamicImage, size: u32) -> (f32, f32) {
    (
        img.width() as f32 / size as f32,
        img.height() as f32 / size as f32,
    )
}
