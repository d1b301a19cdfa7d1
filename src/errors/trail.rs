use alloc::collections::VecDeque;
use core::fmt::{self, Display, Formatter};

use crate::{strategy::ExportKey, types::TypeRef};

/// One step of a failed resolution: what was requested, for which type, at what depth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrailEntry {
    pub requested: ExportKey,
    pub target: Option<TypeRef>,
    pub depth: u16,
}

impl Display for TrailEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.target {
            Some(target) => write!(f, "resolving {} for {} (depth {})", self.requested, target, self.depth),
            None => write!(f, "resolving {} (depth {})", self.requested, self.depth),
        }
    }
}

/// Bounded ring buffer of [`TrailEntry`].
///
/// Entries are pushed while a failure unwinds, so the deepest step comes first.
/// Once the capacity is reached the oldest entry is dropped and counted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationTrail {
    entries: VecDeque<TrailEntry>,
    capacity: usize,
    dropped: usize,
}

impl LocationTrail {
    #[inline]
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(16)),
            capacity,
            dropped: 0,
        }
    }

    pub fn push(&mut self, entry: TrailEntry) {
        if self.capacity == 0 {
            self.dropped += 1;
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
            self.dropped += 1;
        }
        self.entries.push_back(entry);
    }

    #[inline]
    pub fn entries(&self) -> impl Iterator<Item = &TrailEntry> {
        self.entries.iter()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    #[must_use]
    pub const fn dropped(&self) -> usize {
        self.dropped
    }
}

impl Display for LocationTrail {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            write!(f, "\n  while {entry}")?;
        }
        if self.dropped > 0 {
            write!(f, "\n  ... {} more", self.dropped)?;
        }
        Ok(())
    }
}
