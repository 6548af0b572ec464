use anyhow::{Context, Result};
use std::path::Path;

use crate::session::ReviewEvent;

/// Parse one JSON event per line, ignoring blank/comment lines.
pub fn parse_event_queue(text: &str) -> Result<Vec<ReviewEvent>> {
    let mut out = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let event: ReviewEvent = serde_json::from_str(trimmed)
            .with_context(|| format!("line {} is not a review event: {}", idx + 1, trimmed))?;
        out.push(event);
    }
    Ok(out)
}

/// Read an event queue from disk.
pub fn read_event_queue(path: &Path) -> Result<Vec<ReviewEvent>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_event_queue(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_each_event_kind() {
        let text = r#"
# hour 2, then mark a pause
{"event": "set_window", "hour": 2}
{"event": "capture_selection", "start": 100.0, "end": 109.5}
{"event": "confirm", "label": "Pause"}
{"event": "confirm"}
{"event": "cancel_selection"}
{"event": "retract", "index": 0}
{"event": "reset"}
"#;
        let events = parse_event_queue(text).unwrap();
        assert_eq!(
            events,
            vec![
                ReviewEvent::SetWindow { hour: 2 },
                ReviewEvent::CaptureSelection {
                    start: 100.0,
                    end: 109.5
                },
                ReviewEvent::Confirm {
                    label: "Pause".into()
                },
                ReviewEvent::Confirm {
                    label: String::new()
                },
                ReviewEvent::CancelSelection,
                ReviewEvent::Retract { index: 0 },
                ReviewEvent::Reset,
            ]
        );
    }

    #[test]
    fn reports_bad_line_number() {
        let err = parse_event_queue("{\"event\": \"set_window\", \"hour\": 0}\n{\"event\": \"zoom\"}\n")
            .unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
