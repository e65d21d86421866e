mod depth;
mod ramp;

pub use depth::DepthColorMapper;
pub use ramp::{to_rgb8, ColorRamp, Palette, Rgb};
