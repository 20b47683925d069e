/// Bounded buffer for one chip-select window of captured bytes.

pub const DEFAULT_CAPACITY: usize = 64;

/// MOSI and MISO bytes shifted in over the same eight capture edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BytePair {
    pub mosi: u8,
    pub miso: u8,
}

impl BytePair {
    pub fn new(mosi: u8, miso: u8) -> Self {
        BytePair { mosi, miso }
    }

    /// Both lines zero. Rendered as an idle slot by the formatter.
    pub fn is_idle(&self) -> bool {
        self.mosi == 0 && self.miso == 0
    }
}

/// Storage is reserved up front and `push` never grows it, so appending is
/// safe to do from an edge handler.
#[derive(Debug, Clone)]
pub struct Transaction {
    pairs: Vec<BytePair>,
    capacity: usize,
    overflowed: usize,
}

impl Transaction {
    pub fn with_capacity(capacity: usize) -> Self {
        Transaction {
            pairs: Vec::with_capacity(capacity),
            capacity,
            overflowed: 0,
        }
    }

    /// Append a pair. Once full, further pairs are dropped and counted;
    /// stored entries are never overwritten.
    pub fn push(&mut self, pair: BytePair) -> bool {
        if self.pairs.len() < self.capacity {
            self.pairs.push(pair);
            true
        } else {
            self.overflowed = self.overflowed.saturating_add(1);
            false
        }
    }

    pub fn clear(&mut self) {
        self.pairs.clear();
        self.overflowed = 0;
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Pairs dropped since the last `clear`.
    pub fn overflowed(&self) -> usize {
        self.overflowed
    }

    pub fn pairs(&self) -> &[BytePair] {
        &self.pairs
    }
}

impl Default for Transaction {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_until_full() {
        let mut tx = Transaction::with_capacity(3);
        assert!(tx.is_empty());
        for i in 0..3u8 {
            assert!(tx.push(BytePair::new(i, 0xF0 | i)));
        }
        assert!(!tx.push(BytePair::new(0xAA, 0xBB)));
        assert!(!tx.push(BytePair::new(0xCC, 0xDD)));

        assert_eq!(tx.len(), 3);
        assert_eq!(tx.overflowed(), 2);
        assert_eq!(
            tx.pairs(),
            &[BytePair::new(0, 0xF0), BytePair::new(1, 0xF1), BytePair::new(2, 0xF2)]
        );
    }

    #[test]
    fn test_push_does_not_reallocate() {
        let mut tx = Transaction::with_capacity(8);
        let reserved = tx.pairs.capacity();
        for i in 0..20u8 {
            tx.push(BytePair::new(i, i));
        }
        assert_eq!(tx.pairs.capacity(), reserved);
    }

    #[test]
    fn test_clear() {
        let mut tx = Transaction::with_capacity(1);
        tx.push(BytePair::new(1, 2));
        tx.push(BytePair::new(3, 4));
        tx.clear();
        assert_eq!(tx.len(), 0);
        assert_eq!(tx.overflowed(), 0);
        assert_eq!(tx.capacity(), 1);
    }

    #[test]
    fn test_idle_pair() {
        assert!(BytePair::new(0, 0).is_idle());
        assert!(!BytePair::new(0x41, 0).is_idle());
        assert_eq!(Transaction::default().capacity(), DEFAULT_CAPACITY);
    }
}
