//! Device trigger definitions for the busyness observables
//!
//! Four trigger kinds keyed off the two observable values, mapped onto two
//! generic primitives: a numeric-state crossing on capacity and a state
//! transition on status. Purely declarative — evaluation compares two
//! consecutive snapshots and reports which configured rules fired; acting
//! on a fired trigger is the host's business.

use gym_api::BusynessSnapshot;
use serde::{Deserialize, Serialize};

/// Status value the open transition fires on.
pub const STATUS_OPEN: &str = "open";

/// Status value the closed transition fires on.
pub const STATUS_CLOSED: &str = "closed";

/// The four trigger kinds offered for a busyness device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    CapacityAbove,
    CapacityBelow,
    StatusOpen,
    StatusClosed,
}

impl TriggerKind {
    /// Kind label for config, logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerKind::CapacityAbove => "capacity_above",
            TriggerKind::CapacityBelow => "capacity_below",
            TriggerKind::StatusOpen => "status_open",
            TriggerKind::StatusClosed => "status_closed",
        }
    }
}

/// Observable a trigger keys off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Observable {
    Capacity,
    Status,
}

/// Declarative description of one trigger kind, for host discovery.
#[derive(Debug, Clone, Serialize)]
pub struct TriggerDescriptor {
    #[serde(rename = "type")]
    pub kind: TriggerKind,
    pub observable: Observable,
    pub requires_threshold: bool,
}

/// The trigger kinds a busyness device offers.
pub fn available_triggers() -> Vec<TriggerDescriptor> {
    vec![
        TriggerDescriptor {
            kind: TriggerKind::CapacityAbove,
            observable: Observable::Capacity,
            requires_threshold: true,
        },
        TriggerDescriptor {
            kind: TriggerKind::CapacityBelow,
            observable: Observable::Capacity,
            requires_threshold: true,
        },
        TriggerDescriptor {
            kind: TriggerKind::StatusOpen,
            observable: Observable::Status,
            requires_threshold: false,
        },
        TriggerDescriptor {
            kind: TriggerKind::StatusClosed,
            observable: Observable::Status,
            requires_threshold: false,
        },
    ]
}

/// Errors from trigger rule validation.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("trigger {kind} requires `{field}`")]
    MissingThreshold {
        kind: &'static str,
        field: &'static str,
    },

    #[error("trigger {kind} does not take a threshold")]
    UnexpectedThreshold { kind: &'static str },
}

/// A configured trigger instance.
///
/// Capacity kinds carry their bound in `above`/`below`; status kinds carry
/// nothing beyond the kind itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerRule {
    #[serde(rename = "type")]
    pub kind: TriggerKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub above: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub below: Option<u32>,
}

impl TriggerRule {
    /// Check the rule carries exactly the parameters its kind needs.
    pub fn validate(&self) -> Result<(), RuleError> {
        match self.kind {
            TriggerKind::CapacityAbove => {
                if self.above.is_none() {
                    return Err(RuleError::MissingThreshold {
                        kind: self.kind.as_str(),
                        field: "above",
                    });
                }
            }
            TriggerKind::CapacityBelow => {
                if self.below.is_none() {
                    return Err(RuleError::MissingThreshold {
                        kind: self.kind.as_str(),
                        field: "below",
                    });
                }
            }
            TriggerKind::StatusOpen | TriggerKind::StatusClosed => {
                if self.above.is_some() || self.below.is_some() {
                    return Err(RuleError::UnexpectedThreshold {
                        kind: self.kind.as_str(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Whether this rule fires for the given snapshot replacement.
    ///
    /// The first snapshot ever seen fires nothing — there is no previous
    /// value to cross or transition from.
    pub fn fires(&self, previous: Option<&BusynessSnapshot>, current: &BusynessSnapshot) -> bool {
        let Some(previous) = previous else {
            return false;
        };
        match self.kind {
            TriggerKind::CapacityAbove => self.above.is_some_and(|bound| {
                crossed_above(previous.current_capacity, current.current_capacity, bound)
            }),
            TriggerKind::CapacityBelow => self.below.is_some_and(|bound| {
                crossed_below(previous.current_capacity, current.current_capacity, bound)
            }),
            TriggerKind::StatusOpen => {
                transitioned_to(&previous.status, &current.status, STATUS_OPEN)
            }
            TriggerKind::StatusClosed => {
                transitioned_to(&previous.status, &current.status, STATUS_CLOSED)
            }
        }
    }
}

/// Evaluate all configured rules for one snapshot replacement.
pub fn evaluate(
    rules: &[TriggerRule],
    previous: Option<&BusynessSnapshot>,
    current: &BusynessSnapshot,
) -> Vec<TriggerKind> {
    rules
        .iter()
        .filter(|rule| rule.fires(previous, current))
        .map(|rule| rule.kind)
        .collect()
}

/// Numeric-state primitive: fires when the value enters the `> bound` range.
fn crossed_above(previous: u32, current: u32, bound: u32) -> bool {
    previous <= bound && current > bound
}

/// Numeric-state primitive: fires when the value enters the `< bound` range.
fn crossed_below(previous: u32, current: u32, bound: u32) -> bool {
    previous >= bound && current < bound
}

/// State-transition primitive: fires when the status changes to `target`.
fn transitioned_to(previous: &str, current: &str, target: &str) -> bool {
    previous != target && current == target
}
