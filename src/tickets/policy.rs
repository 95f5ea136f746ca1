//! Business policy knobs for the ticket workflow.
//!
//! None of these are fixed by the help desk rules, so they are read from
//! configuration at startup and never change afterwards.

use chrono::Duration;
use std::fmt;
use std::str::FromStr;

/// Default period after closing during which a ticket may be reopened (7 days).
pub const DEFAULT_REOPEN_WINDOW_HOURS: i64 = 24 * 7;

/// What `submit` does when the user already has an open ticket in the same category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Append the new text to the existing open ticket
    #[default]
    Append,
    /// Refuse with `DuplicateOpenTicket`
    Reject,
    /// Always open a new ticket
    Allow,
}

impl DuplicatePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DuplicatePolicy::Append => "append",
            DuplicatePolicy::Reject => "reject",
            DuplicatePolicy::Allow => "allow",
        }
    }
}

impl fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DuplicatePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "append" => Ok(DuplicatePolicy::Append),
            "reject" => Ok(DuplicatePolicy::Reject),
            "allow" => Ok(DuplicatePolicy::Allow),
            _ => Err(format!("Unknown duplicate ticket policy: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketPolicy {
    /// How long after closing the owner (or an admin) may reopen a ticket
    pub reopen_window: Duration,
    pub duplicate: DuplicatePolicy,
    /// Drop the assigned responder when a ticket is reopened
    pub reopen_clears_assignee: bool,
}

impl Default for TicketPolicy {
    fn default() -> Self {
        Self {
            reopen_window: Duration::hours(DEFAULT_REOPEN_WINDOW_HOURS),
            duplicate: DuplicatePolicy::default(),
            reopen_clears_assignee: false,
        }
    }
}

impl TicketPolicy {
    #[must_use]
    pub fn reopen_window(mut self, window: Duration) -> Self {
        self.reopen_window = window;
        self
    }

    #[must_use]
    pub fn duplicate(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate = policy;
        self
    }

    #[must_use]
    pub fn reopen_clears_assignee(mut self, clear: bool) -> Self {
        self.reopen_clears_assignee = clear;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = TicketPolicy::default();
        assert_eq!(policy.reopen_window, Duration::days(7));
        assert_eq!(policy.duplicate, DuplicatePolicy::Append);
        assert!(!policy.reopen_clears_assignee);
    }

    #[test]
    fn test_duplicate_policy_parse() {
        assert_eq!("Reject".parse::<DuplicatePolicy>(), Ok(DuplicatePolicy::Reject));
        assert_eq!(" allow ".parse::<DuplicatePolicy>(), Ok(DuplicatePolicy::Allow));
        assert!("merge".parse::<DuplicatePolicy>().is_err());
    }
}
