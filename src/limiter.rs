//! Submission attempt limiting.
//!
//! An [`AttemptLimiter`] watches a record's submit count. The first time the
//! count reaches a finite ceiling it freezes the shared dialog context, and
//! while the context is disabled every dirty or invalid field is reverted to
//! its committed value on each observation.

use crate::dialog::FormDialog;
use crate::record::{LiveRecord, ResetFieldOptions};
use tracing::{debug, info};

/// Maximum number of submission attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ceiling {
    #[default]
    Unbounded,
    Finite(u32),
}

impl Ceiling {
    /// Non-finite or non-positive limits are unbounded; fractional limits
    /// round up.
    pub fn from_limit(limit: f64) -> Self {
        if !limit.is_finite() || limit <= 0.0 {
            return Ceiling::Unbounded;
        }
        let rounded = limit.ceil();
        if rounded >= u32::MAX as f64 {
            Ceiling::Finite(u32::MAX)
        } else {
            Ceiling::Finite(rounded as u32)
        }
    }

    pub fn limit(&self) -> Option<u32> {
        match self {
            Ceiling::Unbounded => None,
            Ceiling::Finite(limit) => Some(*limit),
        }
    }

    pub fn is_reached(&self, count: u32) -> bool {
        match self {
            Ceiling::Unbounded => false,
            Ceiling::Finite(limit) => count >= *limit,
        }
    }
}

impl From<u32> for Ceiling {
    fn from(limit: u32) -> Self {
        if limit == 0 {
            Ceiling::Unbounded
        } else {
            Ceiling::Finite(limit)
        }
    }
}

impl From<i32> for Ceiling {
    fn from(limit: i32) -> Self {
        u32::try_from(limit).map(Ceiling::from).unwrap_or(Ceiling::Unbounded)
    }
}

impl From<Option<u32>> for Ceiling {
    fn from(limit: Option<u32>) -> Self {
        limit.map(Ceiling::from).unwrap_or(Ceiling::Unbounded)
    }
}

/// Observable attempt bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptState {
    pub count: u32,
    pub ceiling: Ceiling,
    pub frozen: bool,
}

impl AttemptState {
    /// Attempts left before freezing; `None` when unbounded
    pub fn remaining(&self) -> Option<u32> {
        self.ceiling.limit().map(|limit| limit.saturating_sub(self.count))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimiterPhase {
    Active,
    Frozen,
}

pub struct AttemptLimiter {
    ceiling: Ceiling,
    phase: LimiterPhase,
    count: u32,
    dialog: FormDialog,
}

impl AttemptLimiter {
    pub fn new(ceiling: impl Into<Ceiling>, dialog: FormDialog) -> Self {
        Self {
            ceiling: ceiling.into(),
            phase: LimiterPhase::Active,
            count: 0,
            dialog,
        }
    }

    pub fn phase(&self) -> LimiterPhase {
        self.phase
    }

    pub fn is_frozen(&self) -> bool {
        self.phase == LimiterPhase::Frozen
    }

    pub fn state(&self) -> AttemptState {
        AttemptState {
            count: self.count,
            ceiling: self.ceiling,
            frozen: self.is_frozen(),
        }
    }

    /// Reacts to the record's current state; returns the fields reverted.
    pub fn observe<R: LiveRecord + ?Sized>(&mut self, record: &mut R) -> Vec<String> {
        self.count = record.submit_count();

        if self.phase == LimiterPhase::Active && self.ceiling.is_reached(self.count) {
            self.phase = LimiterPhase::Frozen;
            self.dialog.set_disabled(true);
            info!(count = self.count, ceiling = ?self.ceiling, "submission attempts exhausted, form frozen");
        }

        if !self.dialog.is_disabled() {
            return Vec::new();
        }

        let names = record.dirty_or_invalid_field_names();
        for name in &names {
            record.reset_field(name, ResetFieldOptions { keep_touched: true });
        }
        if !names.is_empty() {
            debug!(fields = ?names, "reverted fields on disabled form");
        }
        names
    }
}
