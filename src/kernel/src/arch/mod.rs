//! Architecture-specific implementations.
//!
//! Hardware backends for the console traits in `cons_hal`. Only built for
//! bare-metal targets; host builds and tests use `cons_hal::mock` instead.
//! Currently supported: x86_64.

#[cfg(all(target_arch = "x86_64", target_os = "none"))]
pub mod x86_64;

#[cfg(all(target_arch = "x86_64", target_os = "none"))]
pub use self::x86_64::*;
