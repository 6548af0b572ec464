use anyhow::Result;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::Path;

use super::{Figure, PlotBackend, Series};

const GRID_COLOR: RGBColor = RGBColor(0xDD, 0xDD, 0xDD);

/// PNG rasterizer built on `plotters`.
///
/// Plain output draws no text, so it runs without system fonts; report
/// figures use it and carry their titles as document captions. With
/// `labels` set, the figure title, axis descriptions and tick values are
/// drawn too, falling back to plain output when no font can be loaded.
#[derive(Debug, Clone)]
pub struct BitmapPlotBackend {
    pub grid_lines: usize,
    pub labels: bool,
}

impl Default for BitmapPlotBackend {
    fn default() -> Self {
        Self {
            grid_lines: 4,
            labels: false,
        }
    }
}

impl BitmapPlotBackend {
    pub fn labeled() -> Self {
        Self {
            labels: true,
            ..Self::default()
        }
    }

    fn draw_chart(
        &self,
        root: &DrawingArea<BitMapBackend<'_>, Shift>,
        fig: &Figure,
        labeled: bool,
    ) -> Result<()> {
        root.fill(&WHITE)?;
        let ([x_min, x_max], [y_min, y_max]) = fig.bounds();
        let mut builder = ChartBuilder::on(root);
        builder.margin(10);
        if labeled {
            builder
                .caption(fig.title.clone().unwrap_or_default(), ("sans-serif", 20))
                .x_label_area_size(30)
                .y_label_area_size(40);
        }
        let mut chart = builder.build_cartesian_2d(x_min..x_max, y_min..y_max)?;

        if labeled {
            chart
                .configure_mesh()
                .x_labels(self.grid_lines.max(1) + 1)
                .y_labels(self.grid_lines.max(1) + 1)
                .light_line_style(WHITE)
                .bold_line_style(GRID_COLOR)
                .x_desc(fig.x.label.clone().unwrap_or_default())
                .y_desc(fig.y.label.clone().unwrap_or_default())
                .draw()?;
        } else {
            let steps = self.grid_lines.max(1);
            for i in 0..=steps {
                let y = y_min + (y_max - y_min) * i as f64 / steps as f64;
                chart.draw_series(LineSeries::new(
                    [(x_min, y), (x_max, y)],
                    GRID_COLOR.stroke_width(1),
                ))?;
            }
        }
        for series in &fig.series {
            match series {
                Series::Line(line) => {
                    let (r, g, b) = line.style.color.rgb();
                    let width = line.style.width.ceil().max(1.0) as u32;
                    chart.draw_series(LineSeries::new(
                        line.points
                            .iter()
                            .map(|p| (p[0], p[1].clamp(y_min, y_max))),
                        RGBColor(r, g, b).stroke_width(width),
                    ))?;
                }
            }
        }
        Ok(())
    }
}

impl PlotBackend for BitmapPlotBackend {
    fn draw(&mut self, fig: &Figure, path: &Path, size: (u32, u32)) -> Result<()> {
        let root = BitMapBackend::new(path, size).into_drawing_area();
        if self.labels {
            if let Err(err) = self.draw_chart(&root, fig, true) {
                log::warn!("drawing labels failed ({}); writing an unlabeled plot", err);
                self.draw_chart(&root, fig, false)?;
            }
        } else {
            self.draw_chart(&root, fig, false)?;
        }
        root.present()?;
        Ok(())
    }
}
