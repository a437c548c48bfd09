//! Audit event taxonomy for part piles and built items.

use serde::{Deserialize, Serialize};

/// What happened to a pile or a built item.
///
/// Stored as the integer code; the string forms serve display and CLI
/// input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryEvent {
    /// Stock arrived from a vendor.
    Incoming,
    /// A new item was started.
    New,
    Moved,
    Updated,
    Used,
    Destroyed,
    Tested,
    Shipped,
}

impl HistoryEvent {
    /// All event variants, in storage-code order.
    pub const ALL: &'static [HistoryEvent] = &[
        HistoryEvent::Incoming,
        HistoryEvent::New,
        HistoryEvent::Moved,
        HistoryEvent::Updated,
        HistoryEvent::Used,
        HistoryEvent::Destroyed,
        HistoryEvent::Tested,
        HistoryEvent::Shipped,
    ];

    /// Storage code for the event.
    pub fn code(self) -> i64 {
        match self {
            Self::Incoming => 0,
            Self::New => 1,
            Self::Moved => 2,
            Self::Updated => 3,
            Self::Used => 4,
            Self::Destroyed => 5,
            Self::Tested => 6,
            Self::Shipped => 7,
        }
    }

    /// Decode a storage code.
    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.get(usize::try_from(code).ok()?).copied()
    }
}

impl std::fmt::Display for HistoryEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Incoming => write!(f, "incoming"),
            Self::New => write!(f, "new"),
            Self::Moved => write!(f, "moved"),
            Self::Updated => write!(f, "updated"),
            Self::Used => write!(f, "used"),
            Self::Destroyed => write!(f, "destroyed"),
            Self::Tested => write!(f, "tested"),
            Self::Shipped => write!(f, "shipped"),
        }
    }
}

/// Parse error for [`HistoryEvent`] string forms.
#[derive(Debug, Clone, thiserror::Error)]
#[error("Invalid history event: {0}")]
pub struct ParseEventError(pub String);

impl std::str::FromStr for HistoryEvent {
    type Err = ParseEventError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "incoming" => Ok(Self::Incoming),
            "new" => Ok(Self::New),
            "moved" => Ok(Self::Moved),
            "updated" => Ok(Self::Updated),
            "used" => Ok(Self::Used),
            "destroyed" => Ok(Self::Destroyed),
            "tested" => Ok(Self::Tested),
            "shipped" => Ok(Self::Shipped),
            _ => Err(ParseEventError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_codes_round_trip() {
        for event in HistoryEvent::ALL {
            assert_eq!(HistoryEvent::from_code(event.code()), Some(*event));
        }
        assert_eq!(HistoryEvent::from_code(8), None);
        assert_eq!(HistoryEvent::from_code(-1), None);
    }

    #[test]
    fn test_event_parse() {
        assert_eq!(
            "incoming".parse::<HistoryEvent>().unwrap(),
            HistoryEvent::Incoming
        );
        assert_eq!(
            "destroyed".parse::<HistoryEvent>().unwrap(),
            HistoryEvent::Destroyed
        );
        assert!("melted".parse::<HistoryEvent>().is_err());
    }

    #[test]
    fn test_event_display() {
        assert_eq!(HistoryEvent::Incoming.to_string(), "incoming");
        assert_eq!(HistoryEvent::Shipped.to_string(), "shipped");
    }
}
