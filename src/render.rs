//! Software rasterization of strokes and hand overlays onto RGBA pixel buffers.

use image::{Rgba, RgbaImage};

use crate::{
    gesture::{HandLandmarks, HAND_CONNECTIONS},
    math::{vec2, Vec2i},
    palette::PaintColor,
    stroke::Strokes,
};

pub const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

const SKELETON: Rgba<u8> = Rgba([224, 224, 224, 255]);
const LANDMARK: Rgba<u8> = Rgba([255, 0, 0, 255]);
const FINGERTIP: Rgba<u8> = Rgba([0, 255, 0, 255]);

pub fn blank_canvas(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_pixel(width, height, BACKGROUND)
}

pub fn paint(color: PaintColor) -> Rgba<u8> {
    let [r, g, b] = color.rgb();
    Rgba([r, g, b, 255])
}

/// Draws a line from `a` to `b` with round caps.
///
/// Every pixel whose center lies within `thickness / 2` of the segment is overwritten with
/// `color`. Parts of the segment outside of `img` are clipped.
pub fn draw_segment(img: &mut RgbaImage, a: Vec2i, b: Vec2i, color: Rgba<u8>, thickness: u32) {
    let radius = thickness.max(1) as f32 / 2.0;
    let reach = radius.ceil() as i32;
    let (width, height) = img.dimensions();

    // Landmarks far off-frame saturate to the `i32` range.
    let x_min = a.x().min(b.x()).saturating_sub(reach).max(0);
    let x_max = a.x().max(b.x()).saturating_add(reach).min(width as i32 - 1);
    let y_min = a.y().min(b.y()).saturating_sub(reach).max(0);
    let y_max = a.y().max(b.y()).saturating_add(reach).min(height as i32 - 1);
    if x_min > x_max || y_min > y_max {
        return;
    }

    let start = a.as_f32();
    let dir = b.as_f32() - start;
    let len_sq = dir.dot(dir);

    for y in y_min..=y_max {
        for x in x_min..=x_max {
            let p = vec2(x as f32, y as f32);
            let t = if len_sq == 0.0 {
                0.0
            } else {
                ((p - start).dot(dir) / len_sq).clamp(0.0, 1.0)
            };
            if p.dist(start + dir * t) <= radius {
                img.put_pixel(x as u32, y as u32, color);
            }
        }
    }
}

pub fn draw_dot(img: &mut RgbaImage, center: Vec2i, radius: u32, color: Rgba<u8>) {
    draw_segment(img, center, center, color, radius * 2);
}

/// Renders every segment of every stroke onto each of `targets`.
///
/// Colors are drawn in bucket order and strokes in the order they were started, so later
/// segments cover earlier ones.
pub fn render_strokes(strokes: &Strokes, targets: &mut [&mut RgbaImage]) {
    for (color, bucket) in strokes.iter() {
        let color = paint(color);
        for stroke in bucket.strokes() {
            for (newer, older) in stroke.segments() {
                for target in targets.iter_mut() {
                    draw_segment(target, newer.pos, older.pos, color, newer.size);
                }
            }
        }
    }
}

/// Draws the hand skeleton and highlights the index fingertip.
pub fn draw_hand(img: &mut RgbaImage, hand: &HandLandmarks) {
    for (from, to) in HAND_CONNECTIONS {
        draw_segment(img, hand.pixel(from), hand.pixel(to), SKELETON, 2);
    }
    for point in hand.points() {
        draw_dot(img, point.as_i32(), 2, LANDMARK);
    }
    draw_dot(img, hand.index_tip(), 3, FINGERTIP);
}
