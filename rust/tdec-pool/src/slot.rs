use tokio::sync::watch;

/// A single-assignment cell holding a value, with a completion wait.
///
/// This is the Rust-idiomatic stand-in for the reference implementation's
/// `Future` class (a `Lock` + `Event` pair): readers block until the first
/// writer sets it, and every write after the first is silently discarded.
/// `watch` gives us that for free plus multi-reader support, which a plain
/// `oneshot` channel cannot (the pool's target slot is read by both
/// `block_until_target_successes` and `join`, and either may be called
/// from more than one task).
pub struct FutureSlot<T> {
    tx: watch::Sender<Option<T>>,
    rx: watch::Receiver<Option<T>>,
}

impl<T: Clone> FutureSlot<T> {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(None);
        Self { tx, rx }
    }

    /// Sets the slot if unset. Returns `true` if this call performed the
    /// assignment, `false` if the slot was already set.
    pub fn set(&self, value: T) -> bool {
        let mut assigned = false;
        self.tx.send_if_modified(|slot| {
            if slot.is_none() {
                *slot = Some(value);
                assigned = true;
                true
            } else {
                false
            }
        });
        assigned
    }

    pub fn is_set(&self) -> bool {
        self.rx.borrow().is_some()
    }

    /// Returns the value without blocking if already set.
    pub fn peek(&self) -> Option<T> {
        self.rx.borrow().clone()
    }

    /// Blocks (asynchronously) until the slot is set, then returns the value.
    pub async fn get(&self) -> T {
        let mut rx = self.rx.clone();
        loop {
            if let Some(v) = rx.borrow().clone() {
                return v;
            }
            // The sender is held alive by the Pool for its entire lifetime,
            // so a `changed()` error here would indicate a bug elsewhere.
            if rx.changed().await.is_err() {
                if let Some(v) = rx.borrow().clone() {
                    return v;
                }
                std::future::pending::<()>().await;
            }
        }
    }
}

impl<T: Clone> Default for FutureSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get_returns_value() {
        let slot: FutureSlot<u32> = FutureSlot::new();
        assert!(!slot.is_set());
        assert!(slot.set(42));
        assert!(slot.is_set());
        assert_eq!(slot.get().await, 42);
    }

    #[tokio::test]
    async fn second_set_is_a_no_op() {
        let slot: FutureSlot<u32> = FutureSlot::new();
        assert!(slot.set(1));
        assert!(!slot.set(2));
        assert_eq!(slot.get().await, 1);
    }

    #[tokio::test]
    async fn get_blocks_until_set() {
        let slot = std::sync::Arc::new(FutureSlot::<u32>::new());
        let reader = {
            let slot = slot.clone();
            tokio::spawn(async move { slot.get().await })
        };
        tokio::task::yield_now().await;
        slot.set(7);
        assert_eq!(reader.await.unwrap(), 7);
    }
}
