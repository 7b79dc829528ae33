//! Flattened preview of a session.
//!
//! The real drawing surface belongs to the canvas collaborator. This module
//! produces a thumbnail good enough for order previews and for checking the
//! layer stack: blades, clipped image decorations, then ribs on top.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use crate::composite::{FanKind, Transform};
use crate::image::TRANSPARENT;
use crate::session::{Decoration, Session};

/// Render `session` at its canvas size over `backdrop` (transparent if `None`).
#[must_use]
pub fn compose(session: &Session, backdrop: Option<Rgba<u8>>) -> RgbaImage {
    let (width, height) = session.canvas_size();
    let mut canvas = RgbaImage::from_pixel(width, height, backdrop.unwrap_or(TRANSPARENT));

    match session.kind() {
        FanKind::Polymer => {
            if let Some(background) = session.background_layer() {
                draw(&mut canvas, background.rendered(), background.transform());
            }
        }
        FanKind::Cloth => {
            if let Some(geometry) = session.geometry() {
                draw_outline_fill(&mut canvas, session, geometry);
            }
        }
    }

    for decoration in session.decorations() {
        draw_decoration(&mut canvas, decoration);
    }

    if let Some(frame) = session.frame_layer() {
        draw(&mut canvas, frame.rendered(), frame.transform());
    }

    canvas
}

fn draw_outline_fill(canvas: &mut RgbaImage, session: &Session, geometry: &Transform) {
    let outline = session.outline();
    let fill = outline.rasterize(geometry.scale_x, session.blade_color().to_rgba());
    let (w, h) = outline.size();
    let (x0, y0) = geometry.top_left(w, h);
    imageops::overlay(canvas, &fill, round_i64(x0), round_i64(y0));
}

fn draw_decoration(canvas: &mut RgbaImage, decoration: &Decoration) {
    let Some(pixels) = decoration.rendered_pixels() else {
        tracing::debug!("Preview skips text decoration {}", decoration.id());
        return;
    };

    let Some((mut placed, x, y)) = place(&pixels, decoration.transform()) else {
        return;
    };

    if let Some(clip) = decoration.clip() {
        for (px, py, pixel) in placed.enumerate_pixels_mut() {
            #[allow(clippy::cast_precision_loss)]
            let (cx, cy) = ((x + i64::from(px)) as f32 + 0.5, (y + i64::from(py)) as f32 + 0.5);
            if !clip.covers(cx, cy) {
                pixel.0[3] = 0;
            }
        }
    }

    imageops::overlay(canvas, &placed, x, y);
}

fn draw(canvas: &mut RgbaImage, img: &RgbaImage, transform: &Transform) {
    if let Some((placed, x, y)) = place(img, transform) {
        imageops::overlay(canvas, &placed, x, y);
    }
}

/// Resample `img` to its transformed size and find its canvas offset.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn place(img: &RgbaImage, transform: &Transform) -> Option<(RgbaImage, i64, i64)> {
    let (w, h) = (img.width() as f32, img.height() as f32);
    let target_w = (w * transform.scale_x).round();
    let target_h = (h * transform.scale_y).round();
    if !(target_w >= 1.0 && target_h >= 1.0) {
        return None;
    }

    let resized = imageops::resize(img, target_w as u32, target_h as u32, FilterType::Triangle);
    let (x0, y0) = transform.top_left(w, h);
    Some((resized, round_i64(x0), round_i64(y0)))
}

#[allow(clippy::cast_possible_truncation)]
fn round_i64(v: f32) -> i64 {
    v.round() as i64
}
