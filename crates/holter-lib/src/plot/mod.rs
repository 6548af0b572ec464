use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::annotation::Annotation;
use crate::signal::Sample;
use crate::window::WindowSpec;

mod bitmap;

pub use bitmap::BitmapPlotBackend;

/// Amplitude bounds shared by the review plot and the report figures, in mV.
pub const LOCKED_Y_RANGE: [f64; 2] = [-1.0, 1.0];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Axis {
    pub label: Option<String>,
    /// Fixed bounds; fitted to the data when absent.
    pub range: Option<[f64; 2]>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Style {
    pub width: f32,
    pub dash: Option<[f32; 2]>,
    pub color: Color,
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
pub struct Color(pub u32);

impl Color {
    pub fn rgb(self) -> (u8, u8, u8) {
        (
            ((self.0 >> 16) & 0xFF) as u8,
            ((self.0 >> 8) & 0xFF) as u8,
            (self.0 & 0xFF) as u8,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineSeries {
    pub name: String,
    pub points: Vec<[f64; 2]>,
    pub style: Style,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Series {
    Line(LineSeries),
}

/// What the core hands to a drawing surface: data plus axis setup, no pixels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Figure {
    pub title: Option<String>,
    pub x: Axis,
    pub y: Axis,
    pub series: Vec<Series>,
}

impl Figure {
    pub fn new(title: impl Into<Option<String>>) -> Self {
        Self {
            title: title.into(),
            x: Axis {
                label: None,
                range: None,
            },
            y: Axis {
                label: None,
                range: None,
            },
            series: Vec::new(),
        }
    }

    pub fn add_series(&mut self, series: Series) {
        self.series.push(series);
    }

    pub fn point_count(&self) -> usize {
        self.series
            .iter()
            .map(|s| match s {
                Series::Line(line) => line.points.len(),
            })
            .sum()
    }

    /// Axis bounds: the fixed range when set, else the data extent, else `[0, 1]`.
    pub fn bounds(&self) -> ([f64; 2], [f64; 2]) {
        let fitted = |axis: &Axis, pick: fn(&[f64; 2]) -> f64| -> [f64; 2] {
            if let Some(range) = axis.range {
                return widen(range);
            }
            let mut lo = f64::INFINITY;
            let mut hi = f64::NEG_INFINITY;
            for series in &self.series {
                let Series::Line(line) = series;
                for p in &line.points {
                    lo = lo.min(pick(p));
                    hi = hi.max(pick(p));
                }
            }
            if lo.is_finite() && hi.is_finite() {
                widen([lo, hi])
            } else {
                [0.0, 1.0]
            }
        };
        (fitted(&self.x, |p| p[0]), fitted(&self.y, |p| p[1]))
    }
}

fn widen(range: [f64; 2]) -> [f64; 2] {
    if range[1] > range[0] {
        range
    } else {
        [range[0], range[0] + 1.0]
    }
}

/// Rasterizes a [`Figure`] to an image file.
pub trait PlotBackend {
    fn draw(&mut self, fig: &Figure, path: &Path, size: (u32, u32)) -> anyhow::Result<()>;
}

pub fn decimate_points(points: &[[f64; 2]], max_points: usize) -> Vec<[f64; 2]> {
    if points.len() <= max_points {
        return points.to_vec();
    }
    let bucket_size = points.len() as f64 / max_points as f64;
    let mut result = Vec::with_capacity(max_points);
    for i in 0..max_points {
        let start = (i as f64 * bucket_size).floor() as usize;
        if start >= points.len() {
            break;
        }
        let sample = points[start];
        result.push(sample);
    }
    result
}

fn trace(name: &str, samples: &[Sample], max_points: usize, style: Style) -> Series {
    let points: Vec<[f64; 2]> = samples.iter().map(|s| [s.time, s.value]).collect();
    Series::Line(LineSeries {
        name: name.into(),
        points: decimate_points(&points, max_points),
        style,
    })
}

/// Live-review plot of one window, amplitude locked to [`LOCKED_Y_RANGE`].
pub fn figure_from_window(window: &WindowSpec, samples: &[Sample], max_points: usize) -> Figure {
    let mut fig = Figure::new(Some(format!("ECG Hour {}", window.hour_index)));
    fig.x.label = Some("Time (s)".into());
    fig.y.label = Some("mV".into());
    fig.y.range = Some(LOCKED_Y_RANGE);
    fig.add_series(trace(
        "ECG",
        samples,
        max_points,
        Style {
            width: 0.5,
            dash: None,
            color: Color(0x1F77B4),
        },
    ));
    fig
}

/// Report figure for one finding. The x-axis spans the annotation even when
/// `samples` is empty.
pub fn figure_from_annotation(annotation: &Annotation, samples: &[Sample]) -> Figure {
    let mut fig = Figure::new(Some(format!(
        "{} ({:.2}-{:.2}s)",
        annotation.label, annotation.start_time, annotation.end_time
    )));
    fig.x.label = Some("Time (s)".into());
    fig.x.range = Some([annotation.start_time, annotation.end_time]);
    fig.y.label = Some("mV".into());
    fig.y.range = Some(LOCKED_Y_RANGE);
    fig.add_series(trace(
        &annotation.label,
        samples,
        usize::MAX,
        Style {
            width: 0.7,
            dash: None,
            color: Color(0x000000),
        },
    ));
    fig
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(n: usize) -> Vec<Sample> {
        (0..n).map(|i| Sample::new(i as f64 * 0.005, 0.2)).collect()
    }

    #[test]
    fn decimation_caps_point_count() {
        let points: Vec<[f64; 2]> = (0..10_000).map(|i| [i as f64, 0.0]).collect();
        let out = decimate_points(&points, 1000);
        assert_eq!(out.len(), 1000);
        assert_eq!(out[0], [0.0, 0.0]);
        assert_eq!(decimate_points(&points[..10], 1000).len(), 10);
    }

    #[test]
    fn window_figure_locks_amplitude() {
        let window = WindowSpec {
            hour_index: 3,
            start_sample: 0,
            end_sample: 5000,
        };
        let fig = figure_from_window(&window, &samples(5000), 2048);
        assert_eq!(fig.title.as_deref(), Some("ECG Hour 3"));
        assert_eq!(fig.y.range, Some([-1.0, 1.0]));
        assert_eq!(fig.x.label.as_deref(), Some("Time (s)"));
        assert_eq!(fig.point_count(), 2048);
    }

    #[test]
    fn annotation_figure_title_and_bounds() {
        let ann = Annotation::new(100.0, 109.5, "Pause");
        let fig = figure_from_annotation(&ann, &[]);
        assert_eq!(fig.title.as_deref(), Some("Pause (100.00-109.50s)"));
        assert_eq!(fig.point_count(), 0);
        let (x, y) = fig.bounds();
        assert_eq!(x, [100.0, 109.5]);
        assert_eq!(y, [-1.0, 1.0]);
    }

    #[test]
    fn bounds_fall_back_for_degenerate_data() {
        let fig = Figure::new(None::<String>);
        assert_eq!(fig.bounds(), ([0.0, 1.0], [0.0, 1.0]));
        let mut single = Figure::new(None::<String>);
        single.add_series(trace(
            "one",
            &[Sample::new(2.0, 0.5)],
            10,
            Style {
                width: 1.0,
                dash: None,
                color: Color(0),
            },
        ));
        assert_eq!(single.bounds(), ([2.0, 3.0], [0.5, 1.5]));
    }
}
