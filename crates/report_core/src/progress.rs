/// Amount the synthetic counter advances on every progress tick.
pub const PROGRESS_STEP: u8 = 2;

/// The synthetic counter never passes this value before a real outcome.
pub const PROGRESS_CEILING: u8 = 85;

pub const STAGE_MESSAGES: [&str; 6] = [
    "Collecting market data...",
    "Analyzing competitors...",
    "Evaluating pricing and budget...",
    "Identifying target audience...",
    "Drafting strategic recommendations...",
    "Finalizing the report...",
];

/// Index into [`STAGE_MESSAGES`] for a counter value.
pub fn stage_index(counter: u8) -> usize {
    usize::from(counter / 15).min(STAGE_MESSAGES.len() - 1)
}

/// Time-based progress surrogate; it does not measure backend work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgressSimulation {
    counter: u8,
}

impl ProgressSimulation {
    pub fn counter(&self) -> u8 {
        self.counter
    }

    /// Advance one tick and return the stage message to show.
    pub fn advance(&mut self) -> &'static str {
        self.counter = self
            .counter
            .saturating_add(PROGRESS_STEP)
            .min(PROGRESS_CEILING);
        STAGE_MESSAGES[stage_index(self.counter)]
    }
}
