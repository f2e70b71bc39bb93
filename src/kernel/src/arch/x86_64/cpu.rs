//! The local CPU and the boot task's wait context.

use core::arch::asm;
use core::arch::x86_64::__cpuid;

use cons_hal::{Cpu, WaitContext};
use x86_64::instructions::interrupts;

/// The CPU executing the current context.
#[derive(Debug, Clone, Copy, Default)]
pub struct X86Cpu;

impl Cpu for X86Cpu {
    fn id(&self) -> u32 {
        // SAFETY: CPUID leaf 1 exists on every x86_64 processor.
        let leaf = unsafe { __cpuid(1) };
        leaf.ebx >> 24
    }

    fn interrupts_enabled(&self) -> bool {
        interrupts::are_enabled()
    }

    fn disable_interrupts(&self) {
        interrupts::disable();
    }

    fn enable_interrupts(&self) {
        interrupts::enable();
    }

    /// Walks the saved frame-pointer chain. The kernel is built with
    /// `force-frame-pointers`, so every frame starts with the caller's `rbp`
    /// followed by the return address.
    fn caller_pcs(&self, pcs: &mut [usize]) {
        let mut rbp: usize;
        // SAFETY: reading rbp has no side effects.
        unsafe { asm!("mov {}, rbp", out(reg) rbp, options(nomem, nostack, preserves_flags)) };

        let mut slots = pcs.iter_mut();
        for pc in slots.by_ref() {
            if rbp == 0 || rbp % core::mem::align_of::<usize>() != 0 {
                *pc = 0;
                break;
            }
            let frame = rbp as *const usize;
            // SAFETY: `frame` is a saved frame pointer on the current stack;
            // slot 0 holds the caller's rbp and slot 1 the return address.
            let (next, ret) = unsafe { (*frame, *frame.add(1)) };
            *pc = ret;
            // The stack grows down, so callers' frames are at higher addresses.
            if next <= rbp {
                rbp = 0;
            } else {
                rbp = next;
            }
        }
        slots.for_each(|pc| *pc = 0);
    }

    fn halt(&self) -> ! {
        interrupts::disable();
        super::halt_loop()
    }
}

/// Wait context of the single boot task.
///
/// There is no scheduler: sleeping idles the CPU until the next interrupt,
/// which is where input arrives from. The task is never killed.
#[derive(Debug, Clone, Copy, Default)]
pub struct HaltWait;

impl WaitContext for HaltWait {
    fn killed(&self) -> bool {
        false
    }

    fn sleep(&self) {
        interrupts::enable_and_hlt();
    }
}
