use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a content item
///
/// ```text
///            +-----------------------------+
///            |                             v
///  draft --> reviewed <--> revised --> approved --> posted
///            |                             ^
///            +-----------------------------+
/// ```
///
/// `draft` may also jump straight to `approved` when the reviewer has no
/// feedback. `posted` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Draft,
    Reviewed,
    Revised,
    Approved,
    Posted,
}

impl Status {
    /// Whether moving from `self` to `to` is a legal transition.
    ///
    /// Same-state moves are not transitions and return `false`.
    pub fn can_transition(self, to: Status) -> bool {
        use Status::*;
        matches!(
            (self, to),
            (Draft, Reviewed)
                | (Revised, Reviewed)
                | (Reviewed, Revised)
                | (Draft, Approved)
                | (Reviewed, Approved)
                | (Revised, Approved)
                | (Approved, Posted)
        )
    }

    pub fn is_terminal(self) -> bool {
        self == Status::Posted
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Draft => "draft",
            Status::Reviewed => "reviewed",
            Status::Revised => "revised",
            Status::Approved => "approved",
            Status::Posted => "posted",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(Status::Draft),
            "reviewed" => Ok(Status::Reviewed),
            "revised" => Ok(Status::Revised),
            "approved" => Ok(Status::Approved),
            "posted" => Ok(Status::Posted),
            other => Err(format!("unknown status '{}'", other)),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const ALL: [Status; 5] = [
        Status::Draft,
        Status::Reviewed,
        Status::Revised,
        Status::Approved,
        Status::Posted,
    ];

    #[test]
    fn test_posted_is_terminal() {
        for to in ALL {
            assert!(!Status::Posted.can_transition(to));
        }
        assert!(Status::Posted.is_terminal());
    }

    #[test]
    fn test_only_approved_reaches_posted() {
        for from in ALL {
            assert_eq!(from.can_transition(Status::Posted), from == Status::Approved);
        }
    }

    #[test]
    fn test_feedback_loop() {
        assert!(Status::Reviewed.can_transition(Status::Revised));
        assert!(Status::Revised.can_transition(Status::Reviewed));
        assert!(Status::Draft.can_transition(Status::Approved));
        assert!(!Status::Draft.can_transition(Status::Revised));
        assert!(!Status::Approved.can_transition(Status::Reviewed));
    }

    #[test]
    fn test_nothing_returns_to_draft() {
        for from in ALL {
            assert!(!from.can_transition(Status::Draft));
        }
    }

    #[test]
    fn test_parse_display() {
        for status in ALL {
            assert_eq!(status.to_string().parse::<Status>().unwrap(), status);
        }
        assert!("published".parse::<Status>().is_err());
    }
}
