// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use anyhow::Context;
use regex::Regex;
use serde::Serialize;

/// One line where the report departs from the golden file. Line numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GoldenMismatch {
    pub line: usize,
    pub expected: Option<String>,
    pub actual: Option<String>,
}

enum Pattern {
    Exact(String),
    Regex(Regex),
}

impl Pattern {
    fn matches(&self, line: &str) -> bool {
        match self {
            Pattern::Exact(text) => text == line,
            Pattern::Regex(re) => re.is_match(line),
        }
    }

    fn source(&self) -> String {
        match self {
            Pattern::Exact(text) => text.clone(),
            Pattern::Regex(re) => re.as_str().to_string(),
        }
    }
}

/// Ordered line-by-line comparison of a report against a golden file.
///
/// With `use_regex` every golden line is a regular expression that must
/// match the whole report line. Surplus or missing lines are mismatches.
pub fn compare(golden: &str, report: &str, use_regex: bool) -> anyhow::Result<Vec<GoldenMismatch>> {
    let patterns = golden
        .lines()
        .enumerate()
        .map(|(i, line)| {
            let line = line.trim_end_matches('\r');
            if use_regex {
                Regex::new(&format!("^(?:{})$", line))
                    .map(Pattern::Regex)
                    .with_context(|| format!("Invalid regex on golden line {}", i + 1))
            } else {
                Ok(Pattern::Exact(line.to_string()))
            }
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    let lines: Vec<&str> = report.lines().collect();

    let mut mismatches = Vec::new();
    for i in 0..patterns.len().max(lines.len()) {
        match (patterns.get(i), lines.get(i)) {
            (Some(p), Some(l)) if p.matches(l) => {}
            (p, l) => mismatches.push(GoldenMismatch {
                line: i + 1,
                expected: p.map(Pattern::source),
                actual: l.map(|l| l.to_string()),
            }),
        }
    }
    Ok(mismatches)
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = "I2C start\nI2C address 0x98 (0x4c write)\nI2C ack\nVERDICT: PASS\n";

    #[test]
    fn test_exact_match() {
        assert!(compare(REPORT, REPORT, false).unwrap().is_empty());
    }

    #[test]
    fn test_regex_whole_line() {
        let golden = "I2C start\nI2C address 0x[0-9a-f]{2} \\(.*\\)\nI2C (ack|nack)\nVERDICT: PASS\n";
        assert!(compare(golden, REPORT, true).unwrap().is_empty());
        // A partial match is not enough.
        let partial = "I2C\nI2C address\nI2C ack\nVERDICT: PASS\n";
        assert_eq!(compare(partial, REPORT, true).unwrap().len(), 2);
    }

    #[test]
    fn test_missing_and_surplus_lines() {
        let golden = "I2C start\nI2C address 0x98 (0x4c write)\n";
        let mismatches = compare(golden, REPORT, false).unwrap();
        assert_eq!(
            mismatches,
            vec![
                GoldenMismatch {
                    line: 3,
                    expected: None,
                    actual: Some("I2C ack".to_string())
                },
                GoldenMismatch {
                    line: 4,
                    expected: None,
                    actual: Some("VERDICT: PASS".to_string())
                },
            ]
        );
        let longer = format!("{}I2C stop\n", REPORT);
        let mismatches = compare(&longer, REPORT, false).unwrap();
        assert_eq!(mismatches[0].expected.as_deref(), Some("I2C stop"));
        assert_eq!(mismatches[0].actual, None);
    }

    #[test]
    fn test_bad_regex() {
        assert!(compare("I2C (start\n", REPORT, true).is_err());
    }
}
