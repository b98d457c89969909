use crate::error::PacketError;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

/// Verdict for a single packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Pass,
    Drop,
}

impl Action {
    /// Canonical short name written to the output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Pass => "PASS",
            Action::Drop => "DROP",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive range of IPv4 source addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRange {
    pub start: Ipv4Addr,
    pub end: Ipv4Addr,
}

impl SourceRange {
    pub fn new(start: Ipv4Addr, end: Ipv4Addr) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        self.start <= addr && addr <= self.end
    }
}

/// Sources outside every allowed range are dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterPolicy {
    pub allowed_sources: Vec<SourceRange>,
}

impl Default for FilterPolicy {
    fn default() -> Self {
        Self {
            allowed_sources: vec![
                SourceRange::new(Ipv4Addr::new(10, 0, 0, 0), Ipv4Addr::new(10, 255, 255, 255)),
                SourceRange::new(Ipv4Addr::new(172, 16, 0, 0), Ipv4Addr::new(172, 31, 255, 255)),
                SourceRange::new(
                    Ipv4Addr::new(192, 168, 0, 0),
                    Ipv4Addr::new(192, 168, 255, 255),
                ),
            ],
        }
    }
}

impl FilterPolicy {
    pub fn validate(&self) -> Result<(), PacketError> {
        for range in &self.allowed_sources {
            if range.start > range.end {
                return Err(PacketError::InvalidRange {
                    start: range.start.to_string(),
                    end: range.end.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn classify(&self, source: Ipv4Addr) -> Action {
        if self.allowed_sources.iter().any(|r| r.contains(source)) {
            Action::Pass
        } else {
            Action::Drop
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_admits_private_ranges() {
        let policy = FilterPolicy::default();
        assert_eq!(policy.classify(Ipv4Addr::new(10, 9, 8, 7)), Action::Pass);
        assert_eq!(policy.classify(Ipv4Addr::new(172, 31, 255, 255)), Action::Pass);
        assert_eq!(policy.classify(Ipv4Addr::new(192, 168, 1, 1)), Action::Pass);
        assert_eq!(policy.classify(Ipv4Addr::new(172, 32, 0, 0)), Action::Drop);
        assert_eq!(policy.classify(Ipv4Addr::new(8, 8, 8, 8)), Action::Drop);
    }

    #[test]
    fn test_range_bounds_are_inclusive() {
        let range = SourceRange::new(Ipv4Addr::new(1, 0, 0, 5), Ipv4Addr::new(1, 0, 0, 9));
        assert!(range.contains(Ipv4Addr::new(1, 0, 0, 5)));
        assert!(range.contains(Ipv4Addr::new(1, 0, 0, 9)));
        assert!(!range.contains(Ipv4Addr::new(1, 0, 0, 10)));
    }

    #[test]
    fn test_empty_policy_drops_everything() {
        let policy = FilterPolicy {
            allowed_sources: Vec::new(),
        };
        assert_eq!(policy.classify(Ipv4Addr::new(10, 0, 0, 1)), Action::Drop);
    }

    #[test]
    fn test_policy_from_json() {
        let policy: FilterPolicy = serde_json::from_str(
            r#"{"allowed_sources": [{"start": "1.2.3.0", "end": "1.2.3.255"}]}"#,
        )
        .unwrap();
        assert!(policy.validate().is_ok());
        assert_eq!(policy.classify(Ipv4Addr::new(1, 2, 3, 4)), Action::Pass);
        assert_eq!(policy.classify(Ipv4Addr::new(10, 0, 0, 1)), Action::Drop);
    }

    #[test]
    fn test_inverted_range_rejected() {
        let policy = FilterPolicy {
            allowed_sources: vec![SourceRange::new(
                Ipv4Addr::new(9, 0, 0, 0),
                Ipv4Addr::new(1, 0, 0, 0),
            )],
        };
        assert!(matches!(
            policy.validate(),
            Err(PacketError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_action_names() {
        assert_eq!(Action::Pass.to_string(), "PASS");
        assert_eq!(Action::Drop.as_str(), "DROP");
    }
}
