use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::models::RawBox;

const PALETTE: [[u8; 3]; 8] = [
    [255, 56, 56],
    [255, 157, 151],
    [255, 112, 31],
    [255, 178, 29],
    [72, 249, 10],
    [26, 147, 52],
    [0, 194, 255],
    [132, 56, 255],
];

const THICKNESS: i32 = 2;

/// Colour of a class, stable across images
pub fn class_color(class_index: Option<usize>) -> Rgb<u8> {
    match class_index {
        Some(index) => Rgb(PALETTE[index % PALETTE.len()]),
        None => Rgb([200, 200, 200]),
    }
}

/// Draw every box on a copy of the image
pub fn annotate(img: &DynamicImage, boxes: &[RawBox]) -> RgbImage {
    let mut canvas = img.to_rgb8();
    let (width, height) = canvas.dimensions();
    if width == 0 || height == 0 {
        return canvas;
    }

    for raw in boxes.iter().filter(|b| !b.bbox.is_degenerate()) {
        let color = class_color(raw.class_index);
        let x = (raw.bbox.x.round() as i32).clamp(0, width as i32 - 1);
        let y = (raw.bbox.y.round() as i32).clamp(0, height as i32 - 1);
        let w = (raw.bbox.width.round() as i32).max(1) as u32;
        let h = (raw.bbox.height.round() as i32).max(1) as u32;

        for inset in 0..THICKNESS {
            let inner_w = w.saturating_sub(2 * inset as u32);
            let inner_h = h.saturating_sub(2 * inset as u32);
            if inner_w == 0 || inner_h == 0 {
                break;
            }
            let rect = Rect::at(x + inset, y + inset).of_size(inner_w, inner_h);
            draw_hollow_rect_mut(&mut canvas, rect, color);
        }
    }

    canvas
}
