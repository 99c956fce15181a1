//! Projection of a trace into input and output lanes

use serde::{Deserialize, Serialize};

use super::message::{render_message, DisplayUnit};
use crate::models::{Role, Trace};

/// Where messages with an unrecognized role are placed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownRolePolicy {
    /// Shown in neither lane
    #[default]
    Drop,
    /// Shown with the inputs
    Input,
    /// Shown with the outputs
    Output,
}

/// One of the two display columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LaneSide {
    /// System, user and tool messages
    Input,
    /// Assistant messages
    Output,
}

impl LaneSide {
    /// Column title
    pub fn title(self) -> &'static str {
        match self {
            Self::Input => "Input",
            Self::Output => "Output",
        }
    }

    /// Text shown when the lane has no messages
    pub fn placeholder(self) -> &'static str {
        match self {
            Self::Input => "No input messages",
            Self::Output => "No output messages",
        }
    }

    /// The other lane
    pub fn other(self) -> Self {
        match self {
            Self::Input => Self::Output,
            Self::Output => Self::Input,
        }
    }
}

/// Lane placement for a role
pub fn lane_for(role: &Role, policy: UnknownRolePolicy) -> Option<LaneSide> {
    match role {
        Role::System | Role::User | Role::Tool => Some(LaneSide::Input),
        Role::Assistant => Some(LaneSide::Output),
        Role::Other(_) => match policy {
            UnknownRolePolicy::Drop => None,
            UnknownRolePolicy::Input => Some(LaneSide::Input),
            UnknownRolePolicy::Output => Some(LaneSide::Output),
        },
    }
}

/// An entry in a lane
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaneEntry {
    /// A rendered message
    Message(DisplayUnit),
    /// Stand-in shown instead of an empty lane
    Placeholder(&'static str),
}

/// A rendered column; never empty
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lane {
    /// Which column this is
    pub side: LaneSide,
    /// Entries in original message order
    pub entries: Vec<LaneEntry>,
}

impl Lane {
    fn from_units(side: LaneSide, units: Vec<DisplayUnit>) -> Self {
        let entries = if units.is_empty() {
            vec![LaneEntry::Placeholder(side.placeholder())]
        } else {
            units.into_iter().map(LaneEntry::Message).collect()
        };
        Self { side, entries }
    }

    /// Rendered messages, skipping the placeholder
    pub fn messages(&self) -> impl Iterator<Item = &DisplayUnit> {
        self.entries.iter().filter_map(|entry| match entry {
            LaneEntry::Message(unit) => Some(unit),
            LaneEntry::Placeholder(_) => None,
        })
    }

    /// Whether the lane only holds its placeholder
    pub fn is_placeholder(&self) -> bool {
        matches!(self.entries.as_slice(), [LaneEntry::Placeholder(_)])
    }
}

/// Both lanes of one trace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceView {
    /// System, user and tool messages
    pub input: Lane,
    /// Assistant messages
    pub output: Lane,
}

impl TraceView {
    /// Lane by side
    pub fn lane(&self, side: LaneSide) -> &Lane {
        match side {
            LaneSide::Input => &self.input,
            LaneSide::Output => &self.output,
        }
    }
}

/// Stable partition of a trace's messages into lanes.
pub fn project(trace: &Trace, policy: UnknownRolePolicy) -> TraceView {
    let mut input = Vec::new();
    let mut output = Vec::new();

    for message in &trace.messages {
        match lane_for(&message.role, policy) {
            Some(LaneSide::Input) => input.push(render_message(message)),
            Some(LaneSide::Output) => output.push(render_message(message)),
            None => {}
        }
    }

    TraceView {
        input: Lane::from_units(LaneSide::Input, input),
        output: Lane::from_units(LaneSide::Output, output),
    }
}
