//! Bounded position over a non-empty trace list

/// Index into a non-empty, immutable list. Steps that would leave
/// `[0, len - 1]` are refused rather than clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    index: usize,
    len: usize,
}

#[allow(clippy::len_without_is_empty)]
impl Cursor {
    /// Cursor at the first item; `None` for an empty list
    pub fn new(len: usize) -> Option<Self> {
        (len > 0).then_some(Self { index: 0, len })
    }

    /// Current zero-based index
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of items
    pub fn len(&self) -> usize {
        self.len
    }

    /// Index `delta` steps away, if it is in range
    pub fn target(&self, delta: isize) -> Option<usize> {
        self.index
            .checked_add_signed(delta)
            .filter(|next| *next < self.len)
    }

    /// Move by `delta`; returns false and leaves the cursor alone when out of range
    pub fn step(&mut self, delta: isize) -> bool {
        match self.target(delta) {
            Some(next) => {
                self.index = next;
                true
            }
            None => false,
        }
    }

    /// Whether a backward step is possible
    pub fn can_step_back(&self) -> bool {
        self.index > 0
    }

    /// Whether a forward step is possible
    pub fn can_step_forward(&self) -> bool {
        self.index + 1 < self.len
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_list_has_no_cursor() {
        assert!(Cursor::new(0).is_none());
    }

    #[test]
    fn test_len_is_fixed_and_positive() {
        let mut cursor = Cursor::new(4).unwrap();
        assert_eq!(cursor.len(), 4);
        cursor.step(3);
        cursor.step(9);
        assert_eq!(cursor.len(), 4);
        assert_eq!(Cursor::new(1).map(|c| c.len()), Some(1));
    }

    #[test]
    fn test_boundaries() {
        let mut cursor = Cursor::new(3).unwrap();
        assert!(!cursor.can_step_back());
        assert!(cursor.can_step_forward());

        assert!(!cursor.step(-1));
        assert_eq!(cursor.index(), 0);

        assert!(cursor.step(2));
        assert!(cursor.can_step_back());
        assert!(!cursor.can_step_forward());

        assert!(!cursor.step(1));
        assert_eq!(cursor.index(), 2);
    }

    #[test]
    fn test_single_item() {
        let mut cursor = Cursor::new(1).unwrap();
        assert!(!cursor.can_step_back());
        assert!(!cursor.can_step_forward());
        assert!(!cursor.step(1));
        assert!(cursor.step(0));
    }

    proptest! {
        #[test]
        fn prop_index_stays_in_bounds(
            len in 1usize..50,
            deltas in proptest::collection::vec(-60isize..60, 0..40),
        ) {
            let mut cursor = Cursor::new(len).unwrap();
            for delta in deltas {
                let before = cursor.index();
                let moved = cursor.step(delta);
                prop_assert!(cursor.index() < len);
                if !moved {
                    prop_assert_eq!(cursor.index(), before);
                }
            }
        }
    }
}
