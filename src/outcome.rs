//! Per-feature result type handed to the rendering boundary.
//!
//! Nothing in the pipeline aborts the session: a source that cannot be read,
//! a column that is missing or a join key that does not exist only disables
//! the feature that depends on it. Those conditions travel as [`Warning`]s
//! inside an [`Outcome`] so the caller can show them next to whatever still
//! worked.

use std::fmt;

use itertools::Itertools;
use serde::Serialize;

/// Category of a non-fatal pipeline problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// A declared source file could not be opened or parsed.
    MissingSource,
    /// A referenced column is absent from an otherwise loaded table.
    MissingColumn,
    /// An auxiliary table lacks the column it is supposed to join on.
    JoinKeyMismatch,
    /// Several rows share a key where one row per key is expected.
    DuplicateKey,
}

impl WarningKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WarningKind::MissingSource => "missing_source",
            WarningKind::MissingColumn => "missing_column",
            WarningKind::JoinKeyMismatch => "join_key_mismatch",
            WarningKind::DuplicateKey => "duplicate_key",
        }
    }
}

/// Human-readable, non-fatal problem scoped to one source or feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub kind: WarningKind,
    /// Source table or feature the warning belongs to (e.g. `"tags"`).
    pub source: String,
    pub message: String,
}

impl Warning {
    pub fn new(kind: WarningKind, source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            source: source.into(),
            message: message.into(),
        }
    }

    pub fn missing_column(source: impl Into<String>, column: &str) -> Self {
        let source = source.into();
        let message = format!("column '{column}' is not available in {source}");
        Self::new(WarningKind::MissingColumn, source, message)
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind.as_str(), self.source, self.message)
    }
}

/// Result of one feature computation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome<T> {
    /// Computed from everything the feature asked for.
    Ready { data: T },
    /// Computed, but part of the input was missing and got skipped.
    Degraded { data: T, warnings: Vec<Warning> },
    /// The feature cannot be computed at all.
    Unavailable { reason: String },
}

impl<T> Outcome<T> {
    pub fn ready(data: T) -> Self {
        Outcome::Ready { data }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Outcome::Unavailable {
            reason: reason.into(),
        }
    }

    /// `Ready` when no warnings were collected, `Degraded` otherwise.
    pub fn with_warnings(data: T, warnings: Vec<Warning>) -> Self {
        if warnings.is_empty() {
            Outcome::Ready { data }
        } else {
            Outcome::Degraded { data, warnings }
        }
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Outcome::Ready { data } | Outcome::Degraded { data, .. } => Some(data),
            Outcome::Unavailable { .. } => None,
        }
    }

    pub fn into_data(self) -> Option<T> {
        match self {
            Outcome::Ready { data } | Outcome::Degraded { data, .. } => Some(data),
            Outcome::Unavailable { .. } => None,
        }
    }

    pub fn warnings(&self) -> &[Warning] {
        match self {
            Outcome::Degraded { warnings, .. } => warnings,
            _ => &[],
        }
    }

    pub fn is_available(&self) -> bool {
        !matches!(self, Outcome::Unavailable { .. })
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Ready { data } => Outcome::Ready { data: f(data) },
            Outcome::Degraded { data, warnings } => Outcome::Degraded {
                data: f(data),
                warnings,
            },
            Outcome::Unavailable { reason } => Outcome::Unavailable { reason },
        }
    }

    /// Chain a computation that needs this outcome's data. Warnings from both
    /// steps are kept; if the second step is unavailable, the earlier
    /// warnings are appended to its reason.
    pub fn and_then<U>(self, f: impl FnOnce(T) -> Outcome<U>) -> Outcome<U> {
        match self {
            Outcome::Ready { data } => f(data),
            Outcome::Degraded { data, warnings } => match f(data) {
                Outcome::Ready { data } => Outcome::Degraded { data, warnings },
                Outcome::Degraded {
                    data,
                    warnings: more,
                } => {
                    let mut all = warnings;
                    all.extend(more);
                    Outcome::Degraded {
                        data,
                        warnings: all,
                    }
                }
                Outcome::Unavailable { reason } => Outcome::Unavailable {
                reason: format!(
                    "{reason} (after: {})",
                    warnings.iter().map(ToString::to_string).join("; ")
                ),
            },
            },
            Outcome::Unavailable { reason } => Outcome::Unavailable { reason },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_warnings_picks_variant() {
        let ready: Outcome<u8> = Outcome::with_warnings(1, Vec::new());
        assert_eq!(ready, Outcome::Ready { data: 1 });

        let w = Warning::missing_column("catalog", "price");
        let degraded = Outcome::with_warnings(2, vec![w.clone()]);
        assert_eq!(degraded.data(), Some(&2));
        assert_eq!(degraded.warnings(), &[w]);
    }

    #[test]
    fn and_then_keeps_earlier_warnings() {
        let first = Outcome::with_warnings(3, vec![Warning::missing_column("catalog", "tags")]);
        let chained = first.and_then(|n| Outcome::ready(n * 2));
        assert_eq!(chained.data(), Some(&6));
        assert_eq!(chained.warnings().len(), 1);

        let gone: Outcome<i32> = Outcome::ready(1).and_then(|_| Outcome::unavailable("no data"));
        assert!(!gone.is_available());
    }

    #[test]
    fn unavailable_step_reports_earlier_warnings() {
        let first = Outcome::with_warnings(3, vec![Warning::missing_column("catalog", "tags")]);
        let chained: Outcome<i32> = first.and_then(|_| Outcome::unavailable("price column missing"));
        match chained {
            Outcome::Unavailable { reason } => {
                assert!(reason.starts_with("price column missing"));
                assert!(reason.contains("column 'tags' is not available in catalog"));
            }
            other => panic!("expected unavailable, got {other:?}"),
        }
    }

    #[test]
    fn serializes_with_status_tag() {
        let value = serde_json::to_value(Outcome::<u8>::unavailable("price column missing"))
            .unwrap();
        assert_eq!(value["status"], "unavailable");
        assert_eq!(value["reason"], "price column missing");

        let ready = serde_json::to_value(Outcome::ready(vec![1, 2])).unwrap();
        assert_eq!(ready["status"], "ready");
        assert_eq!(ready["data"][1], 2);
    }

    #[test]
    fn warning_display_is_readable() {
        let w = Warning::new(WarningKind::JoinKeyMismatch, "media", "no 'steam_appid' column");
        assert_eq!(w.to_string(), "[join_key_mismatch] media: no 'steam_appid' column");
    }
}
