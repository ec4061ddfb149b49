//! Shared utility functions

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a mutex, recovering the guard if a previous holder panicked.
///
/// Instance state is only ever touched from lifecycle hooks; a panic inside a
/// user render function must not wedge every later unmount.
pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Build a container display name, e.g. `withData(Base)`.
///
/// # Examples
///
/// ```
/// use enhancer::util::wrap_display_name;
///
/// assert_eq!(wrap_display_name("withData", "Base"), "withData(Base)");
/// ```
pub fn wrap_display_name(enhancer: &str, inner: &str) -> String {
    format!("{}({})", enhancer, inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_lock_recovers_from_poison() {
        let mutex = Arc::new(Mutex::new(1));
        let poisoner = mutex.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("poison");
        })
        .join();

        assert!(mutex.is_poisoned());
        *lock(&mutex) += 1;
        assert_eq!(*lock(&mutex), 2);
    }

    #[test]
    fn test_wrap_display_name_nests() {
        let inner = wrap_display_name("onlyUpdateForKeys", "Base");
        assert_eq!(
            wrap_display_name("withData", &inner),
            "withData(onlyUpdateForKeys(Base))"
        );
    }
}
