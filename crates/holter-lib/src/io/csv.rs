use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use crate::annotation::Annotation;
use crate::error::{ReviewError, Result};
use crate::signal::Sample;

pub const TIME_COLUMN: &str = "time";
pub const DATA_COLUMN: &str = "data";

/// Read `time`/`data` rows from a headered CSV into typed samples.
///
/// Extra columns are ignored. Any missing column or unparsable cell fails the
/// whole load.
pub fn read_signal_csv<R: Read>(reader: R) -> Result<Vec<Sample>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(reader);
    let headers = reader
        .headers()
        .map_err(|e| ReviewError::format(format!("reading header: {}", e)))?
        .clone();
    let time_idx = locate_column(&headers, TIME_COLUMN)?;
    let data_idx = locate_column(&headers, DATA_COLUMN)?;

    let mut samples = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ReviewError::format(format!("reading record: {}", e)))?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let time = parse_cell(&record, time_idx, TIME_COLUMN, line)?;
        let value = parse_cell(&record, data_idx, DATA_COLUMN, line)?;
        samples.push(Sample { time, value });
    }
    if samples.is_empty() {
        return Err(ReviewError::format("recording contains no samples"));
    }
    Ok(samples)
}

pub fn read_signal_csv_path(path: &Path) -> Result<Vec<Sample>> {
    let file = File::open(path)?;
    read_signal_csv(file)
}

/// Write annotations as `start_time,end_time,label` rows.
pub fn write_annotations_csv<W: Write>(writer: W, annotations: &[Annotation]) -> Result<()> {
    let mut writer = WriterBuilder::new().from_writer(writer);
    let map_err = |e: csv::Error| ReviewError::format(format!("writing annotations: {}", e));
    writer
        .write_record(["start_time", "end_time", "label"])
        .map_err(map_err)?;
    for ann in annotations {
        writer
            .write_record([
                ann.start_time.to_string(),
                ann.end_time.to_string(),
                ann.label.clone(),
            ])
            .map_err(map_err)?;
    }
    writer.flush()?;
    Ok(())
}

fn locate_column(headers: &StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| ReviewError::format(format!("missing required column '{}'", name)))
}

fn parse_cell(record: &StringRecord, idx: usize, column: &str, line: u64) -> Result<f64> {
    let raw = record
        .get(idx)
        .ok_or_else(|| ReviewError::format(format!("line {}: missing {} value", line, column)))?;
    let value: f64 = raw.parse().map_err(|_| {
        ReviewError::format(format!("line {}: {} is not a number: '{}'", line, column, raw))
    })?;
    if !value.is_finite() {
        return Err(ReviewError::format(format!(
            "line {}: {} is not finite: '{}'",
            line, column, raw
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_time_and_data_columns() {
        let text = "index,time,data\n0,0.000,0.12\n1,0.005,-0.30\n2,0.010,0.05\n";
        let samples = read_signal_csv(text.as_bytes()).unwrap();
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[1], Sample::new(0.005, -0.30));
    }

    #[test]
    fn trims_header_and_cells() {
        let text = " time , data \n 0.0 , 0.5 \n";
        let samples = read_signal_csv(text.as_bytes()).unwrap();
        assert_eq!(samples, vec![Sample::new(0.0, 0.5)]);
    }

    #[test]
    fn missing_column_is_format_error() {
        let err = read_signal_csv("time,value\n0,1\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ReviewError::Format(_)));
        assert!(err.to_string().contains("'data'"));
    }

    #[test]
    fn header_only_is_format_error() {
        let err = read_signal_csv("time,data\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("no samples"));
    }

    #[test]
    fn malformed_cell_names_line() {
        let err = read_signal_csv("time,data\n0,1\n0.005,abc\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("line 3"), "{}", err);
    }

    #[test]
    fn rejects_non_finite_values() {
        let err = read_signal_csv("time,data\n0,NaN\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("not finite"));
    }

    #[test]
    fn writes_annotation_table() {
        let annotations = vec![
            Annotation::new(1.0, 10.0, "PVC"),
            Annotation::new(20.5, 30.0, "AFib, paroxysmal"),
        ];
        let mut out = Vec::new();
        write_annotations_csv(&mut out, &annotations).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "start_time,end_time,label\n1,10,PVC\n20.5,30,\"AFib, paroxysmal\"\n"
        );
    }
}
