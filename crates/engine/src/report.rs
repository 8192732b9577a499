use crate::types::{JoinOutcome, JoinResult};

/// Tally of join outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutcomeCounts {
    pub joined: usize,
    pub already_member: usize,
    pub rate_limited: usize,
    pub failed: usize,
}

/// Everything a batch produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// One entry per processed pair, in processing order.
    pub results: Vec<JoinResult>,
    /// Number of inter-channel pauses taken.
    pub delays: usize,
}

impl BatchReport {
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn counts(&self) -> OutcomeCounts {
        self.results
            .iter()
            .fold(OutcomeCounts::default(), |mut counts, result| {
                match result.outcome {
                    JoinOutcome::Joined => counts.joined += 1,
                    JoinOutcome::AlreadyMember => counts.already_member += 1,
                    JoinOutcome::RateLimited { .. } => counts.rate_limited += 1,
                    JoinOutcome::Failed { .. } => counts.failed += 1,
                }
                counts
            })
    }

    #[must_use]
    pub fn actions_applied(&self) -> usize {
        self.results.iter().filter(|r| r.action_applied).count()
    }

    #[must_use]
    pub fn notified(&self) -> usize {
        self.results.iter().filter(|r| r.notified).count()
    }
}
