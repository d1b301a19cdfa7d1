use core::ops::BitOr;

/// Set of environments a strategy is visible in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExportEnvironment(u8);

impl ExportEnvironment {
    pub const RUN_TIME: Self = Self(1);
    pub const UNIT_TEST: Self = Self(1 << 1);
    pub const DESIGN_TIME: Self = Self(1 << 2);
    pub const ANY: Self = Self(Self::RUN_TIME.0 | Self::UNIT_TEST.0 | Self::DESIGN_TIME.0);

    #[inline]
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[inline]
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    #[inline]
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }
}

impl Default for ExportEnvironment {
    #[inline]
    fn default() -> Self {
        Self::ANY
    }
}

impl BitOr for ExportEnvironment {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}
