//! Synchronization primitives for the console.
//!
//! The console is shared between interrupt handlers, which must never block,
//! and processes, which may. This module provides the pieces that make that
//! work without a scheduler of its own.
//!
//! # Primitives
//!
//! - [`SpinLock<T, C>`]: Exclusive lock that masks interrupts while held
//! - [`CondVar`]: Broadcast condition a lock holder can wait on
//! - [`Governor`]: One-way `Running -> Halted` switch for fatal errors
//!
//! # Discipline
//!
//! A [`SpinLockGuard`] cannot be sent to another context, and the only way to
//! suspend while holding one is [`CondVar::wait`], which consumes the guard
//! and releases the lock before sleeping.
//!
//! # Example
//!
//! ```ignore
//! use cons_kernel::sync::{CondVar, SpinLock};
//!
//! let queue = SpinLock::new(0u32, cpu);
//! let ready = CondVar::new();
//!
//! // Producer (may run in an interrupt handler):
//! *queue.lock() += 1;
//! ready.notify_all();
//!
//! // Consumer (process context):
//! let mut guard = queue.lock();
//! while *guard == 0 {
//!     guard = ready.wait(guard, &process)?;
//! }
//! ```

mod condvar;
pub mod panic;
mod spinlock;

pub use condvar::CondVar;
pub use panic::{Governor, PanicState};
pub use spinlock::{SpinLock, SpinLockGuard};
