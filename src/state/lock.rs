use chrono::{DateTime, Utc};

pub const LOCKED_BANNER: &str = "Bracket Locked!";
pub const MASTER_BANNER: &str = "Master bracket - Always Unlocked";

/// User brackets stop accepting edits at the deadline. The master never locks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockGate {
    pub deadline: DateTime<Utc>,
}

impl LockGate {
    pub fn new(deadline: DateTime<Utc>) -> Self {
        Self { deadline }
    }

    pub fn is_locked_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.deadline
    }

    pub fn is_locked(&self) -> bool {
        self.is_locked_at(Utc::now())
    }

    /// `"2d 3h 4m 5s"` until the deadline, or the locked banner once it passes.
    pub fn countdown_at(&self, now: DateTime<Utc>) -> String {
        let remaining = self.deadline - now;
        if remaining <= chrono::TimeDelta::zero() {
            return LOCKED_BANNER.to_string();
        }
        let secs = remaining.num_seconds();
        format!("{}d {}h {}m {}s", secs / 86_400, secs / 3_600 % 24, secs / 60 % 60, secs % 60)
    }
}
