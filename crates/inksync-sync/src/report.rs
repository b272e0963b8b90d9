//! Aggregate outcome of a whole-tree sync.

use std::fmt;

use inksync_core::SyncResult;
use serde::Serialize;

/// The result of syncing one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileOutcome {
    pub filepath: String,
    pub result: SyncResult,
}

/// Every per-file outcome of a sync run. There is no overall pass/fail flag;
/// callers inspect the individual results.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    /// Outcomes in completion order, pull pass first.
    pub results: Vec<FileOutcome>,
    /// Why the pull pass could not list remote updates, if it could not.
    pub pull_error: Option<String>,
    /// Whether the last-full-pull watermark moved forward.
    pub watermark_advanced: bool,
}

impl SyncReport {
    pub fn push(&mut self, filepath: impl Into<String>, result: SyncResult) {
        self.results.push(FileOutcome {
            filepath: filepath.into(),
            result,
        });
    }

    /// The outcome for one path, if it was synced.
    pub fn get(&self, filepath: &str) -> Option<&SyncResult> {
        self.results
            .iter()
            .find(|o| o.filepath == filepath)
            .map(|o| &o.result)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn good_count(&self) -> usize {
        self.results.iter().filter(|o| o.result.is_good()).count()
    }

    pub fn bad_count(&self) -> usize {
        self.results.len() - self.good_count()
    }

    /// Number of outcomes of a given kind (`"pushed"`, `"conflict"`, ...).
    pub fn count(&self, kind: &str) -> usize {
        self.results.iter().filter(|o| o.result.kind() == kind).count()
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for outcome in &self.results {
            writeln!(f, "{}: {}", outcome.filepath, outcome.result)?;
        }
        if let Some(err) = &self.pull_error {
            writeln!(f, "pull pass failed: {err}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_and_lines() {
        let mut report = SyncReport::default();
        report.push("a.txt", SyncResult::Pushed);
        report.push(
            "b.txt",
            SyncResult::ClientError {
                detail: "disk full".into(),
            },
        );
        report.push(
            "c.txt",
            SyncResult::Conflict {
                conflict_file: "c.txt.1.conflict".into(),
            },
        );

        assert_eq!(report.len(), 3);
        assert_eq!(report.good_count(), 2);
        assert_eq!(report.bad_count(), 1);
        assert_eq!(report.count("conflict"), 1);
        assert_eq!(report.get("a.txt"), Some(&SyncResult::Pushed));

        let text = report.to_string();
        assert_eq!(text.lines().count(), 3);
        assert!(text.contains("b.txt: client-error: disk full"));
    }
}
