//! Reservations
//!
//! The two claim shapes embedded in shared resources: an exclusive holder
//! (vehicle reservation, driver seat, maintenance, airlock operator,
//! medical aid) and a counted slot pool (garage bays, lab researchers).

/// A single-holder claim.
///
/// Acquiring twice with the same holder is a no-op success; a different
/// holder is refused until the claim is released.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusiveClaim<H> {
    holder: Option<H>,
}

impl<H> Default for ExclusiveClaim<H> {
    fn default() -> Self {
        Self { holder: None }
    }
}

impl<H: PartialEq + Clone> ExclusiveClaim<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&mut self, holder: &H) -> bool {
        match &self.holder {
            Some(current) => current == holder,
            None => {
                self.holder = Some(holder.clone());
                true
            }
        }
    }

    /// Releases the claim if `holder` owns it. Returns whether it did.
    pub fn release(&mut self, holder: &H) -> bool {
        if self.is_held_by(holder) {
            self.holder = None;
            true
        } else {
            false
        }
    }

    pub fn holder(&self) -> Option<&H> {
        self.holder.as_ref()
    }

    pub fn is_held(&self) -> bool {
        self.holder.is_some()
    }

    pub fn is_held_by(&self, holder: &H) -> bool {
        self.holder.as_ref() == Some(holder)
    }
}

/// A counted pool of identical slots.
///
/// Never exceeds its capacity. Callers must pair every successful
/// `try_enter` with exactly one `leave`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotCounter {
    occupied: u32,
    capacity: u32,
}

impl SlotCounter {
    pub fn new(capacity: u32) -> Self {
        Self {
            occupied: 0,
            capacity,
        }
    }

    pub fn try_enter(&mut self) -> bool {
        if self.occupied < self.capacity {
            self.occupied += 1;
            true
        } else {
            false
        }
    }

    /// Frees one slot. Returns false (and changes nothing) when none is held.
    pub fn leave(&mut self) -> bool {
        if self.occupied == 0 {
            tracing::warn!(capacity = self.capacity, "slot released with no occupants");
            return false;
        }
        self.occupied -= 1;
        true
    }

    pub fn occupied(&self) -> u32 {
        self.occupied
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn available(&self) -> u32 {
        self.capacity - self.occupied
    }

    pub fn is_full(&self) -> bool {
        self.occupied >= self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exclusive_claim_refuses_second_holder() {
        let mut claim = ExclusiveClaim::new();
        assert!(claim.try_acquire(&"a"));
        assert!(claim.try_acquire(&"a"));
        assert!(!claim.try_acquire(&"b"));
        assert_eq!(claim.holder(), Some(&"a"));

        assert!(!claim.release(&"b"));
        assert!(claim.release(&"a"));
        assert!(!claim.is_held());
        assert!(claim.try_acquire(&"b"));
    }

    #[test]
    fn test_slot_counter_never_exceeds_capacity() {
        let mut slots = SlotCounter::new(2);
        assert!(slots.try_enter());
        assert!(slots.try_enter());
        assert!(!slots.try_enter());
        assert!(slots.is_full());
        assert_eq!(slots.occupied(), 2);

        assert!(slots.leave());
        assert_eq!(slots.available(), 1);
        assert!(slots.leave());
        assert!(!slots.leave());
        assert_eq!(slots.occupied(), 0);
    }
}
