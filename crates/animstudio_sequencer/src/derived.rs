// SPDX-License-Identifier: MIT OR Apache-2.0
//! Lazily recomputed derived state.

/// Derived data that is either up to date or invalidated
#[derive(Debug, Clone, PartialEq)]
pub enum Derived<T> {
    /// Up to date with its source
    Clean(T),
    /// Must be recomputed before the next read
    Dirty,
}

impl<T> Default for Derived<T> {
    fn default() -> Self {
        Self::Dirty
    }
}

impl<T> Derived<T> {
    /// Drop the cached value
    pub fn invalidate(&mut self) {
        *self = Self::Dirty;
    }

    /// Whether a recompute is pending
    pub fn is_dirty(&self) -> bool {
        matches!(self, Self::Dirty)
    }

    /// The cached value, if clean
    pub fn get(&self) -> Option<&T> {
        match self {
            Self::Clean(value) => Some(value),
            Self::Dirty => None,
        }
    }

    /// The cached value, recomputing it first when dirty
    pub fn get_or_update(&mut self, recompute: impl FnOnce() -> T) -> &T {
        if let Self::Dirty = self {
            *self = Self::Clean(recompute());
        }
        match self {
            Self::Clean(value) => value,
            Self::Dirty => unreachable!("derived state was just recomputed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recompute_only_when_dirty() {
        let mut calls = 0;
        let mut derived: Derived<u32> = Derived::Dirty;

        assert_eq!(
            *derived.get_or_update(|| {
                calls += 1;
                7
            }),
            7
        );
        assert_eq!(
            *derived.get_or_update(|| {
                calls += 1;
                8
            }),
            7
        );
        assert_eq!(calls, 1);

        derived.invalidate();
        assert!(derived.is_dirty());
        assert_eq!(derived.get(), None);
        assert_eq!(*derived.get_or_update(|| 9), 9);
        assert!(!derived.is_dirty());
    }
}
