//! Verdict codes returned to the mail host.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SbError;

/// Action the host should take for a message.
///
/// `Dunno` is the pass-through verdict: no opinion, let other filters decide.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// No opinion.
    #[default]
    Dunno,
    /// Accept the message, skipping further checks.
    Accept,
    /// Silently drop the message.
    Delete,
    /// Reject the message.
    Reject,
    /// Temporarily refuse the message.
    Defer,
}

impl Action {
    /// Returns the canonical config string for this action.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Dunno => "dunno",
            Action::Accept => "accept",
            Action::Delete => "delete",
            Action::Reject => "reject",
            Action::Defer => "defer",
        }
    }

    /// Returns true for the pass-through verdict.
    pub fn is_dunno(&self) -> bool {
        matches!(self, Action::Dunno)
    }
}

impl FromStr for Action {
    type Err = SbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "dunno" => Ok(Action::Dunno),
            "accept" | "ok" => Ok(Action::Accept),
            "delete" | "discard" => Ok(Action::Delete),
            "reject" => Ok(Action::Reject),
            "defer" | "tempfail" => Ok(Action::Defer),
            _ => Err(SbError::InvalidAction(s.to_string())),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_uppercase())
    }
}
