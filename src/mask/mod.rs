//! Fan silhouettes and the clip regions attached to decorations.
//!
//! Both fan kinds derive their placement from one function of the canvas size,
//! so the background, the frame, the outline and every clip region can be
//! moved together from a single computed [`Transform`].

mod clip;
mod outline;

pub use clip::{ClipRegion, ClipShape};
pub use outline::FanOutline;

use crate::composite::{fit_scale, FanKind, Transform};

/// Placement of the cloth outline: bottom-center anchored, vertically centered.
#[must_use]
pub fn cloth_geometry(canvas_width: f32, canvas_height: f32, outline: &FanOutline) -> Transform {
    let (width, height) = outline.size();
    let scale = fit_scale(
        canvas_width,
        canvas_height,
        width,
        height,
        FanKind::Cloth.margin_factor(),
    );
    let left = canvas_width / 2.0;
    let top = (height * scale).mul_add(0.5, canvas_height / 2.0);
    Transform::anchored_bottom(left, top, scale)
}

/// Placement of polymer template layers: centered on the canvas.
#[must_use]
pub fn polymer_geometry(canvas_width: f32, canvas_height: f32, natural: (f32, f32)) -> Transform {
    let scale = fit_scale(
        canvas_width,
        canvas_height,
        natural.0,
        natural.1,
        FanKind::Polymer.margin_factor(),
    );
    Transform::centered(canvas_width / 2.0, canvas_height / 2.0, scale)
}
