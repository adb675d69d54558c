//! Structured audit logging.
//!
//! State transitions an operator may need to reconstruct later are built as
//! [`AuditRecord`]s and emitted with [`audit_log!`](crate::audit_log). Every
//! record becomes one `tracing` event on the `audit` target, with the whole
//! record attached as JSON in the `audit_json` field.
//!
//! Records carry a UTC timestamp, the emitting component, the action, its
//! outcome, the affected object and free-form details.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tracing target used for every audit event.
pub const AUDIT_TARGET: &str = "audit";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditCategory {
    /// Per-port or global monitor settings changed
    ConfigurationChange,
    ResourceCreate,
    ResourceModify,
    ResourceDelete,
    /// Startup and teardown
    SystemLifecycle,
    /// Store or hardware failure that lost work
    ErrorCondition,
    /// Operator requests such as clears
    AdminAction,
}

impl AuditCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ConfigurationChange => "CONFIGURATION_CHANGE",
            Self::ResourceCreate => "RESOURCE_CREATE",
            Self::ResourceModify => "RESOURCE_MODIFY",
            Self::ResourceDelete => "RESOURCE_DELETE",
            Self::SystemLifecycle => "SYSTEM_LIFECYCLE",
            Self::ErrorCondition => "ERROR_CONDITION",
            Self::AdminAction => "ADMIN_ACTION",
        }
    }
}

impl fmt::Display for AuditCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    Success,
    Failure,
    InProgress,
}

impl fmt::Display for AuditOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::InProgress => "in_progress",
        })
    }
}

/// One audit event. The outcome starts as `InProgress`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub timestamp: DateTime<Utc>,
    pub category: AuditCategory,
    /// Emitting component, e.g. "ErrorMonitorOrch"
    pub source: String,
    pub action: String,
    pub outcome: AuditOutcome,
    /// Affected object, e.g. a port alias
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuditRecord {
    pub fn new(
        category: AuditCategory,
        source: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            category,
            source: source.into(),
            action: action.into(),
            outcome: AuditOutcome::InProgress,
            object_id: None,
            object_type: None,
            details: None,
            error: None,
        }
    }

    pub fn with_outcome(mut self, outcome: AuditOutcome) -> Self {
        self.outcome = outcome;
        self
    }

    pub fn with_object_id(mut self, id: impl Into<String>) -> Self {
        self.object_id = Some(id.into());
        self
    }

    pub fn with_object_type(mut self, object_type: impl Into<String>) -> Self {
        self.object_type = Some(object_type.into());
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Sets the failure reason; the outcome becomes `Failure`.
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self.outcome = AuditOutcome::Failure;
        self
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|e| format!(r#"{{"error":"serialization_failed","message":"{}"}}"#, e))
    }
}

/// Emits `record` on [`AUDIT_TARGET`].
///
/// Successes go out at info, in-progress records at debug, failures at warn.
pub fn emit(record: &AuditRecord) {
    let json = record.to_json();
    let object = record.object_id.as_deref().unwrap_or("-");
    match record.outcome {
        AuditOutcome::Success => tracing::info!(
            target: AUDIT_TARGET,
            category = %record.category,
            audit_json = %json,
            "AUDIT {} {} {}",
            record.source,
            record.action,
            object
        ),
        AuditOutcome::InProgress => tracing::debug!(
            target: AUDIT_TARGET,
            category = %record.category,
            audit_json = %json,
            "AUDIT {} {} {} (in progress)",
            record.source,
            record.action,
            object
        ),
        AuditOutcome::Failure => tracing::warn!(
            target: AUDIT_TARGET,
            category = %record.category,
            error = record.error.as_deref().unwrap_or(""),
            audit_json = %json,
            "AUDIT {} {} {} failed",
            record.source,
            record.action,
            object
        ),
    }
}

/// Builds and emits an audit record.
///
/// ```ignore
/// audit_log!(AuditRecord::new(AuditCategory::ResourceModify, "ErrorMonitorOrch", "enable")
///     .with_outcome(AuditOutcome::Success)
///     .with_object_id("Ethernet0"));
/// ```
#[macro_export]
macro_rules! audit_log {
    ($record:expr) => {
        $crate::audit::emit(&$record)
    };
}

/// Installs a JSON `tracing` subscriber filtered by `RUST_LOG` or `log_level`.
///
/// `log` records from the rest of the process land in the same subscriber.
pub fn init_logging(log_level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).json())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_builder() {
        let record = AuditRecord::new(AuditCategory::ResourceModify, "ErrorMonitorOrch", "enable")
            .with_outcome(AuditOutcome::Success)
            .with_object_id("Ethernet0")
            .with_object_type("port");

        assert_eq!(record.category, AuditCategory::ResourceModify);
        assert_eq!(record.source, "ErrorMonitorOrch");
        assert_eq!(record.outcome, AuditOutcome::Success);
        assert_eq!(record.object_id.as_deref(), Some("Ethernet0"));
        assert_eq!(record.object_type.as_deref(), Some("port"));
    }

    #[test]
    fn test_with_error_marks_failure() {
        let record = AuditRecord::new(AuditCategory::ErrorCondition, "ErrorMonitorOrch", "flush")
            .with_error("commit rejected");

        assert_eq!(record.outcome, AuditOutcome::Failure);
        assert_eq!(record.error.as_deref(), Some("commit rejected"));
    }

    #[test]
    fn test_json_layout() {
        let record = AuditRecord::new(
            AuditCategory::ConfigurationChange,
            "ErrorMonitorOrch",
            "set_poll_interval",
        )
        .with_outcome(AuditOutcome::Success)
        .with_details(serde_json::json!({ "poll_interval": 30 }));

        let value: serde_json::Value = serde_json::from_str(&record.to_json()).unwrap();
        assert_eq!(value["category"], "CONFIGURATION_CHANGE");
        assert_eq!(value["outcome"], "success");
        assert_eq!(value["details"]["poll_interval"], 30);
        assert!(value.get("object_id").is_none());
    }

    #[test]
    fn test_display() {
        assert_eq!(AuditCategory::AdminAction.to_string(), "ADMIN_ACTION");
        assert_eq!(AuditOutcome::InProgress.to_string(), "in_progress");
    }

    #[test]
    fn test_macro_without_subscriber() {
        audit_log!(AuditRecord::new(AuditCategory::SystemLifecycle, "test", "noop")
            .with_outcome(AuditOutcome::Success));
        audit_log!(AuditRecord::new(AuditCategory::SystemLifecycle, "test", "noop")
            .with_error("boom"));
    }
}
