//! Skip-vote bookkeeping and the quorum rules that decide when a song is skipped.
//!
//! Votes are scoped to the song at the head of the queue and must be reset whenever the
//! head changes.

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoteState {
    pub count: u32,
}

impl VoteState {
    pub fn cast(&mut self) -> u32 {
        self.count = self.count.saturating_add(1);
        self.count
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }
}

/// Strategy that maps the current occupancy to the number of votes needed to skip.
pub trait SkipPolicy: Send + Sync + std::fmt::Debug {
    fn threshold(&self, occupant_count: usize) -> u32;

    fn is_reached(&self, votes: u32, occupant_count: usize) -> bool {
        votes >= self.threshold(occupant_count)
    }
}

/// Skip once `min(cap, occupants)` votes are in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CappedQuorum {
    pub cap: u32,
}

impl Default for CappedQuorum {
    fn default() -> Self {
        Self { cap: 3 }
    }
}

impl SkipPolicy for CappedQuorum {
    fn threshold(&self, occupant_count: usize) -> u32 {
        let occupants = u32::try_from(occupant_count).unwrap_or(u32::MAX);
        self.cap.min(occupants)
    }
}

/// Skip once at least half of the occupants (rounded up) voted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MajorityQuorum;

impl SkipPolicy for MajorityQuorum {
    fn threshold(&self, occupant_count: usize) -> u32 {
        let occupants = u32::try_from(occupant_count).unwrap_or(u32::MAX);
        occupants.div_ceil(2)
    }
}

/// Policy selector used by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipPolicyKind {
    Capped { cap: u32 },
    Majority,
}

impl Default for SkipPolicyKind {
    fn default() -> Self {
        SkipPolicyKind::Capped { cap: 3 }
    }
}

impl SkipPolicyKind {
    pub fn build(self) -> Box<dyn SkipPolicy> {
        match self {
            SkipPolicyKind::Capped { cap } => Box::new(CappedQuorum { cap }),
            SkipPolicyKind::Majority => Box::new(MajorityQuorum),
        }
    }
}
