use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::error::{ReviewError, Result};

/// A confirmed, labeled abnormality finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub start_time: f64,
    pub end_time: f64,
    pub label: String,
}

impl Annotation {
    pub fn new(start_time: f64, end_time: f64, label: impl Into<String>) -> Self {
        Self {
            start_time,
            end_time,
            label: label.into(),
        }
    }

    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}

/// Every appended entry, including ones later retracted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub annotation: Annotation,
    pub retracted: bool,
}

/// Append-only record of the findings made during one review session.
///
/// Overlapping and duplicate entries are kept as entered. Retraction hides an
/// entry from [`AnnotationLog::all`] without erasing it from
/// [`AnnotationLog::history`].
#[derive(Debug, Clone, Default)]
pub struct AnnotationLog {
    entries: Vec<LogEntry>,
}

impl AnnotationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finding. Does not apply the selection policy.
    pub fn append(
        &mut self,
        start_time: f64,
        end_time: f64,
        label: impl Into<String>,
    ) -> Result<Annotation> {
        if !start_time.is_finite() || !end_time.is_finite() || start_time >= end_time {
            return Err(ReviewError::range(format!(
                "annotation bounds {}..{} are not an increasing interval",
                start_time, end_time
            )));
        }
        let annotation = Annotation::new(start_time, end_time, label);
        self.entries.push(LogEntry {
            annotation: annotation.clone(),
            retracted: false,
        });
        Ok(annotation)
    }

    /// Active annotations in creation order.
    pub fn all(&self) -> Vec<Annotation> {
        self.active().cloned().collect()
    }

    pub fn history(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.active().count()
    }

    pub fn is_empty(&self) -> bool {
        self.active().next().is_none()
    }

    /// Hide the `index`-th active annotation (as numbered by [`Self::all`]).
    pub fn retract(&mut self, index: usize) -> Result<Annotation> {
        let active = self.len();
        let entry = self
            .entries
            .iter_mut()
            .filter(|e| !e.retracted)
            .nth(index)
            .ok_or_else(|| {
                ReviewError::range(format!(
                    "annotation index {} outside 0..{}",
                    index, active
                ))
            })?;
        entry.retracted = true;
        Ok(entry.annotation.clone())
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn to_csv<W: Write>(&self, writer: W) -> Result<()> {
        crate::io::csv::write_annotations_csv(writer, &self.all())
    }

    fn active(&self) -> impl Iterator<Item = &Annotation> {
        self.entries
            .iter()
            .filter(|e| !e.retracted)
            .map(|e| &e.annotation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_insertion_order() {
        let mut log = AnnotationLog::new();
        log.append(1.0, 10.0, "PVC").unwrap();
        log.append(20.0, 30.0, "AFib").unwrap();
        assert_eq!(
            log.all(),
            vec![
                Annotation::new(1.0, 10.0, "PVC"),
                Annotation::new(20.0, 30.0, "AFib"),
            ]
        );
    }

    #[test]
    fn keeps_duplicates_and_overlaps() {
        let mut log = AnnotationLog::new();
        log.append(1.0, 10.0, "PVC").unwrap();
        log.append(1.0, 10.0, "PVC").unwrap();
        log.append(5.0, 15.0, "").unwrap();
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn append_ignores_duration_policy() {
        let mut log = AnnotationLog::new();
        assert!(log.append(0.0, 600.0, "long").is_ok());
    }

    #[test]
    fn rejects_inverted_bounds() {
        let mut log = AnnotationLog::new();
        assert!(matches!(log.append(5.0, 5.0, "x"), Err(ReviewError::Range(_))));
        assert!(matches!(log.append(f64::NAN, 5.0, "x"), Err(ReviewError::Range(_))));
        assert!(log.is_empty());
    }

    #[test]
    fn snapshot_is_detached() {
        let mut log = AnnotationLog::new();
        log.append(1.0, 10.0, "PVC").unwrap();
        let snapshot = log.all();
        log.append(20.0, 30.0, "AFib").unwrap();
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn retract_hides_but_keeps_history() {
        let mut log = AnnotationLog::new();
        log.append(1.0, 10.0, "PVC").unwrap();
        log.append(20.0, 30.0, "typo").unwrap();
        log.append(40.0, 50.0, "Pause").unwrap();

        let removed = log.retract(1).unwrap();
        assert_eq!(removed.label, "typo");
        let labels: Vec<String> = log.all().into_iter().map(|a| a.label).collect();
        assert_eq!(labels, vec!["PVC", "Pause"]);
        assert_eq!(log.history().len(), 3);
        assert!(log.history()[1].retracted);

        // indices follow the active list
        assert_eq!(log.retract(1).unwrap().label, "Pause");
        assert!(matches!(log.retract(1), Err(ReviewError::Range(_))));
        assert_eq!(log.len(), 1);
    }
}
