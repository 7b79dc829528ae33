//! Pixel classification: white-background removal and frame/background splitting.
//!
//! Both passes are pure functions over an immutable source buffer. They never
//! fail: an empty or fully transparent source simply yields empty output.

mod split;
mod white;

pub use split::{classify_pixel, split_layers, PixelClass, SplitLayers};
pub use white::{remove_white_background, remove_white_background_in_place, WhiteRemoval};

use crate::error::{Error, Result};
use crate::image::VISIBLE_ALPHA;

/// Color thresholds used by the classifier.
///
/// The defaults match the red/yellow and red/black polymer templates in use.
/// Templates with a different color convention need their own values; the
/// split is a heuristic and a mismatched template silently produces a wrong
/// split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    /// Pixels with alpha below this are treated as absent.
    pub visibility_alpha: u8,

    /// A pixel is "white" when all of R, G and B are strictly above this.
    pub white_level: u8,

    /// A pixel is "red" when R exceeds both G and B by strictly more than this.
    pub red_margin: u8,

    /// A pixel is "dark" (and so part of the frame) when all channels are
    /// strictly below this. `None` disables the dark rule.
    pub dark_level: Option<u8>,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            visibility_alpha: VISIBLE_ALPHA,
            white_level: 230,
            red_margin: 20,
            dark_level: Some(60),
        }
    }
}

impl Thresholds {
    /// Validate the thresholds.
    ///
    /// # Errors
    ///
    /// Returns an error if a threshold makes a rule unsatisfiable.
    pub fn validate(&self) -> Result<()> {
        if self.visibility_alpha == 0 {
            return Err(Error::InvalidParameter {
                name: "visibility_alpha".to_string(),
                reason: "must be at least 1 so fully transparent pixels stay absent".to_string(),
            });
        }

        if self.white_level == u8::MAX {
            return Err(Error::InvalidParameter {
                name: "white_level".to_string(),
                reason: "must be below 255".to_string(),
            });
        }

        if self.dark_level == Some(0) {
            return Err(Error::InvalidParameter {
                name: "dark_level".to_string(),
                reason: "must be greater than 0 (use None to disable)".to_string(),
            });
        }

        Ok(())
    }

    /// Whether a pixel is visible enough to be classified.
    #[inline]
    #[must_use]
    pub const fn is_visible(&self, alpha: u8) -> bool {
        alpha >= self.visibility_alpha
    }
}
