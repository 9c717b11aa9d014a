//! ObservationScope for begin/complete logging around an operation
//!
//! - Logs `{name}_BEGIN` on creation (TRACE)
//! - Logs `{name}_COMPLETE` with `elapsed_us` when completed (INFO)
//! - Logs `{name}_FAILED` when failed (WARN)
//! - Logs `{name}_INCOMPLETE` if dropped without either (WARN)

use std::time::Instant;

use super::logger::Logger;

/// A scope that logs the start and outcome of an operation
///
/// ```ignore
/// let scope = ObservationScope::with_fields("QUERY_COMPILE", &[("record_space", slug)]);
/// // ... do work ...
/// scope.complete_with_fields(&[("clauses", "2")]);
/// ```
pub struct ObservationScope {
    name: &'static str,
    fields: Vec<(&'static str, String)>,
    started: Instant,
    finished: bool,
}

impl ObservationScope {
    pub fn new(name: &'static str) -> Self {
        Self::with_fields(name, &[])
    }

    /// Create a scope whose fields are repeated on every event it logs
    pub fn with_fields(name: &'static str, fields: &[(&'static str, &str)]) -> Self {
        Logger::trace(&format!("{}_BEGIN", name), fields);

        Self {
            name,
            fields: fields.iter().map(|(k, v)| (*k, v.to_string())).collect(),
            started: Instant::now(),
            finished: false,
        }
    }

    pub fn complete(self) {
        self.complete_with_fields(&[]);
    }

    pub fn complete_with_fields(mut self, extra_fields: &[(&str, &str)]) {
        self.finished = true;
        let elapsed = self.elapsed_us();
        let mut fields = self.field_refs();
        fields.extend(extra_fields.iter().copied());
        fields.push(("elapsed_us", elapsed.as_str()));
        Logger::info(&format!("{}_COMPLETE", self.name), &fields);
    }

    /// Mark the scope as failed with a reason
    pub fn fail(mut self, reason: &str) {
        self.finished = true;
        let mut fields = self.field_refs();
        fields.push(("reason", reason));
        Logger::warn(&format!("{}_FAILED", self.name), &fields);
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn elapsed_us(&self) -> String {
        self.started.elapsed().as_micros().to_string()
    }

    fn field_refs(&self) -> Vec<(&str, &str)> {
        self.fields.iter().map(|(k, v)| (*k, v.as_str())).collect()
    }
}

impl Drop for ObservationScope {
    fn drop(&mut self) {
        if !self.finished {
            let mut fields = self.field_refs();
            fields.push(("reason", "scope dropped without completion"));
            Logger::warn(&format!("{}_INCOMPLETE", self.name), &fields);
        }
    }
}
