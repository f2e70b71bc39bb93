//! Broadcast condition variable for [`SpinLock`] holders.
//!
//! Notifications bump a generation counter. A waiter samples the counter
//! while still holding the lock, so a notification issued any time after it
//! releases the lock is never lost.

use core::sync::atomic::{AtomicU64, Ordering};

use cons_common::WaitError;
use cons_hal::{Cpu, WaitContext};

use super::{SpinLock, SpinLockGuard};

/// A condition that lock holders can wait on until another context signals it.
pub struct CondVar {
    /// Number of notifications issued so far.
    generation: AtomicU64,
}

impl CondVar {
    /// Create a new condition with no pending notifications.
    pub const fn new() -> Self {
        Self {
            generation: AtomicU64::new(0),
        }
    }

    /// Wake every context currently waiting.
    ///
    /// No ordering among the woken waiters is defined.
    pub fn notify_all(&self) {
        self.generation.fetch_add(1, Ordering::Release);
    }

    /// Release the lock, sleep until notified, and re-acquire the lock.
    ///
    /// Returns early with [`WaitError::Killed`] if `ctx` is marked for
    /// termination; the lock is released in that case. Callers must re-check
    /// their condition after every return.
    pub fn wait<'a, T, C: Cpu, W: WaitContext>(
        &self,
        guard: SpinLockGuard<'a, T, C>,
        ctx: &W,
    ) -> Result<SpinLockGuard<'a, T, C>, WaitError> {
        let seen = self.generation.load(Ordering::Acquire);
        let lock: &'a SpinLock<T, C> = SpinLockGuard::unlock(guard);

        loop {
            if ctx.killed() {
                return Err(WaitError::Killed);
            }
            if self.generation.load(Ordering::Acquire) != seen {
                break;
            }
            ctx.sleep();
        }

        Ok(lock.lock())
    }
}

impl Default for CondVar {
    fn default() -> Self {
        Self::new()
    }
}
