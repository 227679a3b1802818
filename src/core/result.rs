//! Results of a link-fetch run

use crate::error::CtError;

/// What a single user agent got back
#[derive(Debug)]
pub enum AttemptStatus {
    /// The API returned a `downurl`
    Found(String),
    /// The API answered without a `downurl`
    NoLink,
    /// The request itself failed
    Failed(CtError),
}

/// One request of the rotation
#[derive(Debug)]
pub struct AttemptOutcome {
    /// Position in the rotation
    pub index: usize,
    /// Rendered user agent that was sent
    pub user_agent: String,
    pub status: AttemptStatus,
}

impl AttemptOutcome {
    pub fn link(&self) -> Option<&str> {
        match &self.status {
            AttemptStatus::Found(link) => Some(link),
            _ => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.status, AttemptStatus::Failed(_))
    }
}

/// Links found so far, in arrival order, plus every attempt made
#[derive(Debug, Default)]
pub struct DownloadResult {
    links: Vec<String>,
    attempts: Vec<AttemptOutcome>,
}

impl DownloadResult {
    /// Append an attempt
    pub fn record(&mut self, outcome: AttemptOutcome) {
        if let Some(link) = outcome.link() {
            self.links.push(link.to_string());
        }
        self.attempts.push(outcome);
    }

    pub fn links(&self) -> &[String] {
        &self.links
    }

    pub fn attempts(&self) -> &[AttemptOutcome] {
        &self.attempts
    }

    /// Number of attempts that failed at the transport level
    pub fn failures(&self) -> usize {
        self.attempts.iter().filter(|a| a.is_failure()).count()
    }

    /// True when at least one attempt was made and none succeeded at the
    /// transport level
    pub fn all_failed(&self) -> bool {
        !self.attempts.is_empty() && self.failures() == self.attempts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(index: usize, status: AttemptStatus) -> AttemptOutcome {
        AttemptOutcome {
            index,
            user_agent: format!("agent-{}", index),
            status,
        }
    }

    #[test]
    fn test_record_keeps_arrival_order() {
        let mut result = DownloadResult::default();
        result.record(outcome(0, AttemptStatus::Found("https://x/2".to_string())));
        result.record(outcome(1, AttemptStatus::NoLink));
        result.record(outcome(2, AttemptStatus::Found("https://x/1".to_string())));

        assert_eq!(result.links(), ["https://x/2", "https://x/1"]);
        assert_eq!(result.attempts().len(), 3);
        assert_eq!(result.failures(), 0);
        assert!(!result.all_failed());
    }

    #[test]
    fn test_all_failed() {
        let mut result = DownloadResult::default();
        assert!(!result.all_failed());

        result.record(outcome(0, AttemptStatus::Failed(CtError::Decode("x".to_string()))));
        assert!(result.all_failed());

        result.record(outcome(1, AttemptStatus::NoLink));
        assert!(!result.all_failed());
        assert_eq!(result.failures(), 1);
        assert!(result.links().is_empty());
    }
}
