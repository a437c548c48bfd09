//! Raw intake lines and their pre-save validation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One line of a stock-intake or assignment batch, as typed by the
/// operator.
///
/// Everything is optional at entry time; [`verify_lines`] reports what is
/// missing before a save is attempted. `part_type` is filled in by the
/// matcher (or by the operator picking a candidate) and suppresses creation
/// of a new catalog entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawPart {
    /// Matched catalog entry; `None` means a new part type gets created.
    pub part_type: Option<i64>,
    /// Free-text description used for candidate matching.
    pub search_name: String,
    pub name: String,
    pub summary: String,
    pub description: String,
    pub footprint: String,
    pub pins: i64,
    pub manufacturer: String,
    pub sku: String,
    pub count: i64,
    pub date: Option<NaiveDate>,
    pub unit_price: Option<f64>,
    /// VAT in percent, `None` when included in the price.
    pub vat: Option<f64>,
    pub source: Option<i64>,
    pub datasheet: String,
}

impl RawPart {
    /// The name a new part type would get: the explicit name when entered,
    /// otherwise the free-text search name.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.search_name
        } else {
            &self.name
        }
    }
}

/// A validation complaint about one intake line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineError {
    /// Zero-based index into the submitted batch.
    pub line: usize,
    pub message: String,
}

impl LineError {
    fn new(line: usize, message: &str) -> Self {
        Self {
            line,
            message: message.to_string(),
        }
    }
}

/// Check intake lines before saving.
///
/// Lines already bound to an existing part type pass unconditionally; a
/// line that would create a new part type must name it, give a footprint,
/// and have a positive pin count. An empty result means the batch can be
/// saved. This is expected user-input state, not an error condition.
pub fn verify_lines(lines: &[RawPart]) -> Vec<LineError> {
    let mut errors = Vec::new();

    for (line, part) in lines.iter().enumerate() {
        if part.part_type.is_some() {
            continue;
        }

        if part.display_name().is_empty() {
            errors.push(LineError::new(line, "Part name is missing"));
        }

        if part.footprint.is_empty() {
            errors.push(LineError::new(line, "Part footprint is missing"));
        }

        if part.pins <= 0 {
            errors.push(LineError::new(line, "Part must have more than 0 pins"));
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_line() -> RawPart {
        RawPart {
            search_name: "10k resistor".into(),
            name: "10k resistor".into(),
            footprint: "0805".into(),
            pins: 2,
            count: 100,
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_line_passes() {
        assert!(verify_lines(&[valid_line()]).is_empty());
    }

    #[test]
    fn test_matched_line_skips_checks() {
        let line = RawPart {
            part_type: Some(7),
            ..Default::default()
        };
        assert!(verify_lines(&[line]).is_empty());
    }

    #[test]
    fn test_missing_fields_reported_with_index() {
        let bad = RawPart {
            search_name: String::new(),
            ..valid_line()
        };
        let bad = RawPart {
            name: String::new(),
            footprint: String::new(),
            pins: 0,
            ..bad
        };
        let errors = verify_lines(&[valid_line(), bad]);
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().all(|e| e.line == 1));
        assert!(errors.iter().any(|e| e.message.contains("name")));
        assert!(errors.iter().any(|e| e.message.contains("footprint")));
        assert!(errors.iter().any(|e| e.message.contains("pins") || e.message.contains("0 pins")));
    }

    #[test]
    fn test_search_name_counts_as_name() {
        let line = RawPart {
            name: String::new(),
            ..valid_line()
        };
        assert!(verify_lines(&[line]).is_empty());
    }

    #[test]
    fn test_raw_part_json_defaults() {
        let line: RawPart =
            serde_json::from_str(r#"{"search_name": "1u cap", "footprint": "0603"}"#).unwrap();
        assert_eq!(line.search_name, "1u cap");
        assert_eq!(line.count, 0);
        assert!(line.part_type.is_none());
    }
}
