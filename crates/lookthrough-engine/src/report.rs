//! Structured run reports.
//!
//! The caller (CLI subcommand or HTTP endpoint in the surrounding
//! application) receives one of these, never a raw error: partial success is
//! a normal, reportable outcome.

use crate::run_state::RunState;
use crate::validator::Finding;
use lookthrough_model::{EntityRef, PassId};
use lookthrough_resolver::SkippedRef;
use serde::{Deserialize, Serialize};

/// A snapshot write the store rejected. The entity stays on its previous
/// snapshot; siblings were written independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteFailure {
    pub entity: EntityRef,
    pub reason: String,
}

/// Outcome summary of one propagation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Pass id stamped on every snapshot this run derived.
    pub run_id: PassId,
    /// Human-readable scope label ("all funds" / "fund <id>").
    pub scope: String,
    /// Terminal lifecycle state.
    pub state: RunState,
    /// Entities visited during bottom-up aggregation (all three tiers).
    pub processed: usize,
    /// References excluded during resolution, with reasons.
    pub skipped: Vec<SkippedRef>,
    /// Data-quality findings from the consistency validator.
    pub flagged: Vec<Finding>,
    /// Per-entity write rejections (siblings still written).
    pub failed_writes: Vec<WriteFailure>,
    /// Wall-clock duration of the run.
    pub duration_ms: u64,
}

impl RunReport {
    /// A run passed when it completed and every staged write landed.
    /// Skips and findings are warnings, not failures.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.state == RunState::Completed && self.failed_writes.is_empty()
    }

    /// Human-readable rendering for CLI output.
    #[must_use]
    pub fn generate_text(&self) -> String {
        use std::fmt::Write;

        let mut out = String::new();
        let _ = writeln!(out, "Propagation Run Report");
        let _ = writeln!(out, "======================");
        let _ = writeln!(out, "Run:        {}", self.run_id);
        let _ = writeln!(out, "Scope:      {}", self.scope);
        let _ = writeln!(out, "State:      {:?}", self.state);
        let _ = writeln!(out, "Processed:  {}", self.processed);
        let _ = writeln!(out, "Duration:   {} ms", self.duration_ms);

        if !self.skipped.is_empty() {
            let _ = writeln!(out, "\nSkipped references ({}):", self.skipped.len());
            for skip in &self.skipped {
                let _ = writeln!(
                    out,
                    "  {} -> {} ({})",
                    skip.parent, skip.child, skip.reason
                );
            }
        }

        if !self.flagged.is_empty() {
            let _ = writeln!(out, "\nConsistency findings ({}):", self.flagged.len());
            for finding in &self.flagged {
                let _ = writeln!(out, "  {} [{:?}]: {}", finding.entity, finding.kind, finding.detail);
            }
        }

        if !self.failed_writes.is_empty() {
            let _ = writeln!(out, "\nFailed writes ({}):", self.failed_writes.len());
            for failure in &self.failed_writes {
                let _ = writeln!(out, "  {}: {}", failure.entity, failure.reason);
            }
        }

        let _ = writeln!(
            out,
            "\nResult: {}",
            if self.passed() { "PASS" } else { "PARTIAL" }
        );
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lookthrough_model::{CompanyId, EntityRef};

    fn report() -> RunReport {
        RunReport {
            run_id: PassId::new(),
            scope: "all funds".to_string(),
            state: RunState::Completed,
            processed: 7,
            skipped: vec![],
            flagged: vec![],
            failed_writes: vec![],
            duration_ms: 12,
        }
    }

    #[test]
    fn clean_run_passes() {
        assert!(report().passed());
    }

    #[test]
    fn failed_write_downgrades_to_partial() {
        let mut r = report();
        r.failed_writes.push(WriteFailure {
            entity: EntityRef::company(&CompanyId::new("c-1")),
            reason: "rejected".to_string(),
        });
        assert!(!r.passed());
        assert!(r.generate_text().contains("PARTIAL"));
        assert!(r.generate_text().contains("Failed writes (1):"));
    }

    #[test]
    fn text_rendering_lists_sections() {
        let text = report().generate_text();
        assert!(text.contains("Propagation Run Report"));
        assert!(text.contains("Processed:  7"));
        assert!(text.contains("PASS"));
    }

    #[test]
    fn report_serializes_to_json() {
        let json = serde_json::to_string(&report()).unwrap();
        assert!(json.contains("\"state\":\"completed\""));
        assert!(json.contains("\"processed\":7"));
    }
}
