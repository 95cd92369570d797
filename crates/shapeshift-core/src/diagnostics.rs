//! Observers for the diagnostics mapping variant
//!
//! The diagnostics variant reports every primitive or enum member assignment
//! and every object allocation to a [`MappingObserver`]. Observers are a side
//! channel only and cannot influence the mapped result.
//!
//! Copyright (c) 2025 Shapeshift Team
//! Licensed under the Apache-2.0 license

use crate::error::Result;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Receiver of diagnostics events
///
/// Labels are expression paths rooted at type names, for example
/// `Order.customer.name` or `Order.lines[]`.
pub trait MappingObserver {
    /// A member assignment produced a value different from the previous one
    fn value_changed(&self, source_label: &str, old_value: &str, target_label: &str, new_value: &str);

    /// A member assignment produced the value the member already held
    fn value_unchanged(&self, source_label: &str, old_value: &str, target_label: &str, new_value: &str) {
        let _ = (source_label, old_value, target_label, new_value);
    }

    /// A new target object was allocated
    fn object_created(&self, source_label: &str, target_label: &str, type_name: &str);
}

/// A recorded diagnostics event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DiagnosticEvent {
    ValueChanged {
        source: String,
        target: String,
        old_value: String,
        new_value: String,
        timestamp: DateTime<Utc>,
    },
    ValueUnchanged {
        source: String,
        target: String,
        value: String,
        timestamp: DateTime<Utc>,
    },
    ObjectCreated {
        source: String,
        target: String,
        type_name: String,
        timestamp: DateTime<Utc>,
    },
}

impl DiagnosticEvent {
    /// Target expression label of the event
    pub fn target(&self) -> &str {
        match self {
            DiagnosticEvent::ValueChanged { target, .. }
            | DiagnosticEvent::ValueUnchanged { target, .. }
            | DiagnosticEvent::ObjectCreated { target, .. } => target,
        }
    }

    pub fn is_change(&self) -> bool {
        matches!(self, DiagnosticEvent::ValueChanged { .. })
    }
}

/// Observer that records every event in order
#[derive(Debug, Default)]
pub struct AuditTrail {
    events: Mutex<Vec<DiagnosticEvent>>,
}

impl AuditTrail {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded events
    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.events.lock().clone()
    }

    /// Recorded value changes only
    pub fn changes(&self) -> Vec<DiagnosticEvent> {
        self.events
            .lock()
            .iter()
            .filter(|event| event.is_change())
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }

    /// Export the trail as pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&*self.events.lock())?)
    }

    fn record(&self, event: DiagnosticEvent) {
        self.events.lock().push(event);
    }
}

impl MappingObserver for AuditTrail {
    fn value_changed(&self, source_label: &str, old_value: &str, target_label: &str, new_value: &str) {
        self.record(DiagnosticEvent::ValueChanged {
            source: source_label.to_string(),
            target: target_label.to_string(),
            old_value: old_value.to_string(),
            new_value: new_value.to_string(),
            timestamp: Utc::now(),
        });
    }

    fn value_unchanged(&self, source_label: &str, _old_value: &str, target_label: &str, new_value: &str) {
        self.record(DiagnosticEvent::ValueUnchanged {
            source: source_label.to_string(),
            target: target_label.to_string(),
            value: new_value.to_string(),
            timestamp: Utc::now(),
        });
    }

    fn object_created(&self, source_label: &str, target_label: &str, type_name: &str) {
        self.record(DiagnosticEvent::ObjectCreated {
            source: source_label.to_string(),
            target: target_label.to_string(),
            type_name: type_name.to_string(),
            timestamp: Utc::now(),
        });
    }
}

/// Observer forwarding events to the `log` facade at trace level
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl MappingObserver for LogObserver {
    fn value_changed(&self, source_label: &str, old_value: &str, target_label: &str, new_value: &str) {
        log::trace!("{target_label}: {old_value} -> {new_value} (from {source_label})");
    }

    fn value_unchanged(&self, source_label: &str, old_value: &str, target_label: &str, _new_value: &str) {
        log::trace!("{target_label}: unchanged {old_value} (from {source_label})");
    }

    fn object_created(&self, source_label: &str, target_label: &str, type_name: &str) {
        log::trace!("{target_label}: created {type_name} (from {source_label})");
    }
}
