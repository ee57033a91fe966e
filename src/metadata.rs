use serde::Serialize;

/// Position within the active (possibly filtered) navigable range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Metadata {
    current_index: usize,
    total: usize,
}

impl Metadata {
    /// Builds a snapshot, clamping `current_index` into `0..total`
    pub fn new(current_index: usize, total: usize) -> Self {
        let current_index = if total == 0 {
            0
        } else {
            current_index.min(total - 1)
        };
        Self {
            current_index,
            total,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_is_clamped_into_range() {
        let metadata = Metadata::new(12, 10);
        assert_eq!(metadata.current_index(), 9);
        assert_eq!(metadata.total(), 10);
    }

    #[test]
    fn empty_range_pins_index_to_zero() {
        let metadata = Metadata::new(3, 0);
        assert_eq!(metadata.current_index(), 0);
        assert!(metadata.is_empty());
        assert_eq!(metadata, Metadata::empty());
    }
}
