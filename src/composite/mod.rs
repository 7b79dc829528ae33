//! Layer compositing: filter chains, uniform fitting, and placed layers.

mod filter;
mod layer;

pub use filter::{Filter, FilterChain, FilterKind, GrayscaleMode};
pub use layer::{fit_scale, FanKind, LayerRole, Origin, PlacedLayer, Transform};
