//! Extension trait to ignore mutex poisoning.
//!
//! The locks in this crate guard plain values (a verdict enum, a map of preference strings) that
//! stay consistent even if a holder panicked, so poison carries no information here.

use std::sync::{Mutex, MutexGuard};

pub trait IgnorePoison<T> {
    /// Locks the mutex, recovering the guard if a previous holder panicked.
    fn lock_ignore_poison(&self) -> MutexGuard<'_, T>;
}

impl<T> IgnorePoison<T> for Mutex<T> {
    fn lock_ignore_poison(&self) -> MutexGuard<'_, T> {
        self.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_lock_survives_panicking_holder() {
        let value = Arc::new(Mutex::new(7));
        let cloned = Arc::clone(&value);
        let _ = std::thread::spawn(move || {
            let _guard = cloned.lock().unwrap();
            panic!("poison the lock");
        })
        .join();

        assert!(value.is_poisoned());
        assert_eq!(*value.lock_ignore_poison(), 7);
    }
}
