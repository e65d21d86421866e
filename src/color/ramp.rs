use crate::prelude::*;

/// Red, green and blue in `[0, 1]`.
pub type Rgb = [f64; 3];

// Moreland's cool-warm diverging map, 9 evenly spaced anchors.
const COOLWARM: [Rgb; 9] = [
    [0.2314, 0.2980, 0.7529],
    [0.3843, 0.5098, 0.9176],
    [0.5529, 0.6902, 0.9961],
    [0.7216, 0.8157, 0.9765],
    [0.8667, 0.8667, 0.8667],
    [0.9608, 0.7686, 0.6784],
    [0.9569, 0.6039, 0.4824],
    [0.8706, 0.3765, 0.3020],
    [0.7059, 0.0157, 0.1490],
];

const GNUPLOT: [Rgb; 9] = [
    [0.0, 0.0, 0.5],
    [0.0, 0.0, 1.0],
    [0.0, 0.5, 1.0],
    [0.0, 1.0, 1.0],
    [0.5, 1.0, 0.5],
    [1.0, 1.0, 0.0],
    [1.0, 0.5, 0.0],
    [1.0, 0.0, 0.0],
    [0.5, 0.0, 0.0],
];

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Palette {
    CoolWarm,
    Gnuplot,
}

impl Palette {
    pub fn ramp(self) -> ColorRamp {
        match self {
            Palette::CoolWarm => ColorRamp {
                anchors: COOLWARM.to_vec(),
            },
            Palette::Gnuplot => ColorRamp {
                anchors: GNUPLOT.to_vec(),
            },
        }
    }
}

/// Ordered color anchors sampled by linear interpolation over `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorRamp {
    anchors: Vec<Rgb>,
}

impl ColorRamp {
    pub fn new(anchors: Vec<Rgb>) -> Result<Self> {
        if anchors.len() < 2 {
            return Err(Error::InvalidInput(format!(
                "a color ramp needs at least 2 anchors, got {}",
                anchors.len()
            )));
        }
        if anchors
            .iter()
            .flatten()
            .any(|c| !(0.0..=1.0).contains(c))
        {
            return Err(Error::InvalidInput(
                "color components must lie in [0, 1]".to_owned(),
            ));
        }
        Ok(ColorRamp { anchors })
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn first(&self) -> Rgb {
        self.anchors[0]
    }

    pub fn last(&self) -> Rgb {
        self.anchors[self.anchors.len() - 1]
    }

    pub fn sample(&self, x: f64) -> Rgb {
        let x = if x.is_nan() { 0.0 } else { x.clamp(0.0, 1.0) };
        let position = x * (self.anchors.len() - 1) as f64;
        let lower = position.floor() as usize;
        if lower >= self.anchors.len() - 1 {
            return self.last();
        }
        let ratio = position - lower as f64;
        let (a, b) = (self.anchors[lower], self.anchors[lower + 1]);
        [
            a[0] + ratio * (b[0] - a[0]),
            a[1] + ratio * (b[1] - a[1]),
            a[2] + ratio * (b[2] - a[2]),
        ]
    }
}

pub fn to_rgb8(color: Rgb) -> (u8, u8, u8) {
    let channel = |c: f64| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    (channel(color[0]), channel(color[1]), channel(color[2]))
}
