use serde::{Deserialize, Serialize};
use std::fs;

use crate::annotation::Annotation;
use crate::error::{ReviewError, Result};
use crate::plot::{figure_from_annotation, PlotBackend};
use crate::signal::SignalStore;

mod pdf;

pub use pdf::PdfRenderer;

pub const SUMMARY_HEADER: [&str; 3] = ["Start Time (s)", "End Time (s)", "Label"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    pub title: String,
    /// Display size of each embedded figure, in points.
    pub figure_width: f32,
    pub figure_height: f32,
    /// Pixel size figures are rasterized at.
    pub raster_width: u32,
    pub raster_height: u32,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            title: "ECG Abnormality Report".into(),
            figure_width: 400.0,
            figure_height: 120.0,
            raster_width: 900,
            raster_height: 300,
        }
    }
}

/// One block of the document, in reading order.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportElement {
    Title(String),
    Spacer(f32),
    Table {
        header: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    Figure {
        title: String,
        png: Vec<u8>,
        pixel_size: (u32, u32),
        width: f32,
        height: f32,
    },
}

/// Per-annotation problem that did not stop the build.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportAnomaly {
    /// No samples fall inside the annotation; its figure is drawn empty.
    EmptySelectionData { index: usize, label: String },
}

/// Turns an element list into an exportable byte stream.
pub trait DocumentRenderer {
    fn render(&mut self, title: &str, elements: &[ReportElement]) -> Result<Vec<u8>>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportDocument {
    pub title: String,
    pub elements: Vec<ReportElement>,
    pub anomalies: Vec<ReportAnomaly>,
}

impl ReportDocument {
    /// Body rows of the summary table, header excluded.
    pub fn summary_rows(&self) -> &[Vec<String>] {
        self.elements
            .iter()
            .find_map(|e| match e {
                ReportElement::Table { rows, .. } => Some(rows.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    pub fn figure_count(&self) -> usize {
        self.elements
            .iter()
            .filter(|e| matches!(e, ReportElement::Figure { .. }))
            .count()
    }

    pub fn render(&self, renderer: &mut dyn DocumentRenderer) -> Result<Vec<u8>> {
        renderer.render(&self.title, &self.elements)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReportBuilder {
    pub settings: ReportSettings,
}

impl ReportBuilder {
    pub fn new(settings: ReportSettings) -> Self {
        Self { settings }
    }

    /// Title, summary table, then one figure per annotation in log order.
    ///
    /// Figures are rasterized into a scratch directory that is removed before
    /// returning.
    pub fn build(
        &self,
        store: &SignalStore,
        annotations: &[Annotation],
        backend: &mut dyn PlotBackend,
    ) -> Result<ReportDocument> {
        let s = &self.settings;
        let mut elements = vec![
            ReportElement::Title(s.title.clone()),
            ReportElement::Spacer(12.0),
            ReportElement::Table {
                header: SUMMARY_HEADER.iter().map(|h| h.to_string()).collect(),
                rows: annotations.iter().map(summary_row).collect(),
            },
            ReportElement::Spacer(24.0),
        ];
        let mut anomalies = Vec::new();

        let scratch = tempfile::tempdir()?;
        for (index, annotation) in annotations.iter().enumerate() {
            let samples = store.samples_in_range(annotation.start_time, annotation.end_time);
            if samples.is_empty() {
                log::warn!(
                    "annotation {} '{}' ({:.2}-{:.2}s) has no samples; embedding empty figure",
                    index,
                    annotation.label,
                    annotation.start_time,
                    annotation.end_time
                );
                anomalies.push(ReportAnomaly::EmptySelectionData {
                    index,
                    label: annotation.label.clone(),
                });
            }
            let fig = figure_from_annotation(annotation, samples);
            let path = scratch.path().join(format!("figure-{}.png", index));
            backend
                .draw(&fig, &path, (s.raster_width, s.raster_height))
                .map_err(|e| ReviewError::Report(format!("figure {}: {:#}", index, e)))?;
            let png = fs::read(&path)?;
            fs::remove_file(&path)?;
            elements.push(ReportElement::Figure {
                title: fig.title.unwrap_or_default(),
                png,
                pixel_size: (s.raster_width, s.raster_height),
                width: s.figure_width,
                height: s.figure_height,
            });
            elements.push(ReportElement::Spacer(12.0));
        }
        scratch.close()?;

        log::info!(
            "built report: {} annotations, {} anomalies",
            annotations.len(),
            anomalies.len()
        );
        Ok(ReportDocument {
            title: s.title.clone(),
            elements,
            anomalies,
        })
    }
}

fn summary_row(annotation: &Annotation) -> Vec<String> {
    vec![
        format!("{:.2}", annotation.start_time),
        format!("{:.2}", annotation.end_time),
        annotation.label.clone(),
    ]
}
