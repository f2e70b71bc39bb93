//! Interrupt-masking spin lock.
//!
//! Acquiring the lock disables interrupts on the current CPU first, so an
//! interrupt handler can never spin on a lock its own CPU already holds.
//! The previous interrupt state is restored when the guard is dropped.

use core::{
    marker::PhantomData,
    mem::ManuallyDrop,
    ops::{Deref, DerefMut},
};

use cons_hal::Cpu;

/// A spin lock that disables interrupts while held.
///
/// # Example
///
/// ```ignore
/// let lock = SpinLock::new(0u32, cpu);
/// {
///     let mut guard = lock.lock();
///     *guard += 1;
/// } // lock released, interrupts restored
/// ```
pub struct SpinLock<T, C> {
    /// The protected data.
    data: spin::Mutex<T>,
    /// The CPU whose interrupt flag is managed.
    cpu: C,
}

impl<T, C: Cpu> SpinLock<T, C> {
    /// Create a new unlocked spin lock protecting the given data.
    pub const fn new(data: T, cpu: C) -> Self {
        Self {
            data: spin::Mutex::new(data),
            cpu,
        }
    }

    /// Returns the CPU handle this lock masks interrupts on.
    pub fn cpu(&self) -> &C {
        &self.cpu
    }

    /// Returns whether some context currently holds the lock.
    pub fn is_locked(&self) -> bool {
        self.data.is_locked()
    }

    /// Acquire the lock, spinning until it is free.
    ///
    /// Interrupts are disabled before spinning and stay disabled until the
    /// returned guard is dropped.
    pub fn lock(&self) -> SpinLockGuard<'_, T, C> {
        let irq_was_enabled = self.cpu.interrupts_enabled();
        self.cpu.disable_interrupts();
        SpinLockGuard {
            lock: self,
            guard: ManuallyDrop::new(self.data.lock()),
            irq_was_enabled,
            _not_send: PhantomData,
        }
    }

    /// Attempt to acquire the lock without spinning.
    ///
    /// Returns `None` if the lock is held, leaving the interrupt state as it
    /// was.
    pub fn try_lock(&self) -> Option<SpinLockGuard<'_, T, C>> {
        let irq_was_enabled = self.cpu.interrupts_enabled();
        self.cpu.disable_interrupts();
        match self.data.try_lock() {
            Some(guard) => Some(SpinLockGuard {
                lock: self,
                guard: ManuallyDrop::new(guard),
                irq_was_enabled,
                _not_send: PhantomData,
            }),
            None => {
                if irq_was_enabled {
                    self.cpu.enable_interrupts();
                }
                None
            }
        }
    }

    /// Acquire the lock even if another context holds it.
    ///
    /// Interrupts are disabled and stay disabled after the guard is dropped.
    ///
    /// # Safety
    ///
    /// Any existing holder must never touch the data again. Only the fatal
    /// path may call this, once the governor guarantees every other context
    /// halts at its next output.
    pub unsafe fn steal(&self) -> SpinLockGuard<'_, T, C> {
        self.cpu.disable_interrupts();
        if self.data.is_locked() {
            // SAFETY: the caller guarantees the current holder is abandoned.
            unsafe { self.data.force_unlock() };
        }
        SpinLockGuard {
            lock: self,
            guard: ManuallyDrop::new(self.data.lock()),
            irq_was_enabled: false,
            _not_send: PhantomData,
        }
    }
}

/// RAII guard that releases the lock and restores interrupts when dropped.
pub struct SpinLockGuard<'a, T, C: Cpu> {
    lock: &'a SpinLock<T, C>,
    guard: ManuallyDrop<spin::MutexGuard<'a, T>>,
    irq_was_enabled: bool,
    /// Guards must be released on the CPU that took them.
    _not_send: PhantomData<*const ()>,
}

impl<'a, T, C: Cpu> SpinLockGuard<'a, T, C> {
    /// Releases the lock and returns it so it can be re-acquired later.
    pub fn unlock(guard: Self) -> &'a SpinLock<T, C> {
        let lock = guard.lock;
        drop(guard);
        lock
    }
}

impl<T, C: Cpu> Deref for SpinLockGuard<'_, T, C> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

impl<T, C: Cpu> DerefMut for SpinLockGuard<'_, T, C> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.guard
    }
}

impl<T, C: Cpu> Drop for SpinLockGuard<'_, T, C> {
    fn drop(&mut self) {
        // SAFETY: `guard` is dropped exactly once, here, and never used after.
        unsafe { ManuallyDrop::drop(&mut self.guard) };
        if self.irq_was_enabled {
            self.lock.cpu.enable_interrupts();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cons_hal::mock::MockCpu;

    #[test]
    fn test_lock_masks_interrupts() {
        let lock = SpinLock::new(42, MockCpu::new(0));
        let cpu = *lock.cpu();
        assert!(cpu.interrupts_enabled());

        let guard = lock.lock();
        assert_eq!(*guard, 42);
        assert!(!cpu.interrupts_enabled());
        drop(guard);

        assert!(cpu.interrupts_enabled());
    }

    #[test]
    fn test_nested_locks_restore_outer_state() {
        let outer = SpinLock::new((), MockCpu::new(0));
        let inner = SpinLock::new((), MockCpu::new(0));

        let a = outer.lock();
        let b = inner.lock();
        drop(b);
        assert!(!outer.cpu().interrupts_enabled());
        drop(a);
        assert!(outer.cpu().interrupts_enabled());
    }

    #[test]
    fn test_try_lock_fails_when_locked() {
        let lock = SpinLock::new(0u32, MockCpu::new(0));

        let _guard = lock.try_lock().expect("should acquire lock");
        assert!(lock.is_locked());
        assert!(lock.try_lock().is_none());
    }

    #[test]
    fn test_guard_deref_mut() {
        let lock = SpinLock::new(0u32, MockCpu::new(0));

        {
            let mut guard = lock.lock();
            *guard = 100;
        }

        let guard = lock.try_lock().expect("should acquire lock");
        assert_eq!(*guard, 100);
    }

    #[test]
    fn test_unlock_returns_lock() {
        let lock = SpinLock::new(7u32, MockCpu::new(0));
        let guard = lock.lock();
        let again = SpinLockGuard::unlock(guard);
        assert!(!again.is_locked());
        assert_eq!(*again.lock(), 7);
    }

    #[test]
    fn test_steal_takes_held_lock() {
        let lock = SpinLock::new(1u32, MockCpu::new(0));
        let held = lock.lock();
        core::mem::forget(held);

        let mut stolen = unsafe { lock.steal() };
        *stolen = 2;
        drop(stolen);

        assert!(!lock.cpu().interrupts_enabled());
        lock.cpu().enable_interrupts();
        assert_eq!(*lock.lock(), 2);
    }
}
