use std::fmt::Write;

use crate::prelude::*;

use super::ramp::{to_rgb8, ColorRamp, Rgb};

/// Maps a depth to a color so that `center` lands on the middle of the ramp.
///
/// Depths shallower than the center are squeezed into the lower half of the ramp and
/// deeper ones into the upper half, which makes a diverging ramp pivot on a reference
/// depth instead of on the middle of the depth range.
#[derive(Debug, Clone)]
pub struct DepthColorMapper {
    min: f64,
    max: f64,
    center: f64,
    ramp: ColorRamp,
}

impl DepthColorMapper {
    pub fn new(range: std::ops::Range<f64>, center: f64, ramp: ColorRamp) -> Result<Self> {
        if !(range.start.is_finite() && range.end.is_finite() && range.start < range.end) {
            return Err(Error::InvalidInput(format!(
                "depth range must satisfy min < max, got {}..{}",
                range.start, range.end
            )));
        }
        if !center.is_finite() {
            return Err(Error::InvalidInput(format!("center depth {}", center)));
        }
        Ok(DepthColorMapper {
            min: range.start,
            max: range.end,
            center: center.clamp(range.start, range.end),
            ramp,
        })
    }

    pub fn range(&self) -> std::ops::Range<f64> {
        self.min..self.max
    }

    pub fn center(&self) -> f64 {
        self.center
    }

    fn normalize(&self, depth: f64) -> f64 {
        ((depth - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
    }

    /// Position on the ramp, in `[0, 1]`, at which `depth` is sampled.
    pub fn position(&self, depth: f64) -> f64 {
        pivot(self.normalize(depth), self.normalize(self.center))
    }

    pub fn color(&self, depth: f64) -> Rgb {
        self.ramp.sample(self.position(depth))
    }

    /// `size` colors evenly spaced over the depth range, shallowest first.
    pub fn lookup_table(&self, size: usize) -> Vec<Rgb> {
        let x_c = self.normalize(self.center);
        match size {
            0 => vec![],
            1 => vec![self.ramp.sample(pivot(0.0, x_c))],
            _ => (0..size)
                .map(|i| i as f64 / (size - 1) as f64)
                .map(|x| self.ramp.sample(pivot(x, x_c)))
                .collect(),
        }
    }

    /// GMT color palette table with `slices` constant-color bands over the depth range.
    pub fn to_cpt(&self, slices: usize) -> String {
        let slices = slices.max(1);
        let step = (self.max - self.min) / slices as f64;
        let mut cpt = String::from("# depth [km]\n");
        for i in 0..slices {
            let low = self.min + step * i as f64;
            let high = if i + 1 == slices { self.max } else { low + step };
            let (r, g, b) = to_rgb8(self.color((low + high) / 2.0));
            let _ = writeln!(cpt, "{low:.4}\t{r}/{g}/{b}\t{high:.4}\t{r}/{g}/{b}");
        }
        let (r, g, b) = to_rgb8(self.color(self.min));
        let _ = writeln!(cpt, "B\t{r}/{g}/{b}");
        let (r, g, b) = to_rgb8(self.color(self.max));
        let _ = writeln!(cpt, "F\t{r}/{g}/{b}");
        cpt.push_str("N\t128/128/128\n");
        cpt
    }
}

fn pivot(x: f64, x_c: f64) -> f64 {
    if x < x_c {
        x / x_c * 0.5
    } else if x_c >= 1.0 {
        // center sits on the deepest value, nothing is left for the warm half
        1.0
    } else {
        0.5 + (x - x_c) / (1.0 - x_c) * 0.5
    }
}
