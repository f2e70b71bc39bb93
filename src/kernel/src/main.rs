//! Console kernel entry point.
//!
//! Boots, brings up the console and then echoes every line typed on the
//! keyboard until the machine is switched off.

#![cfg_attr(target_os = "none", no_std)]
#![cfg_attr(target_os = "none", no_main)]

#[cfg(target_os = "none")]
use bootloader::{entry_point, BootInfo};
#[cfg(target_os = "none")]
use cons_common::ReadError;
#[cfg(target_os = "none")]
use cons_kernel::arch::x86_64::{self, HaltWait, KernelConsole};
#[cfg(target_os = "none")]
use cons_kernel::console::INPUT_BUF;
#[cfg(target_os = "none")]
use cons_kernel::{println, serial_println};
#[cfg(target_os = "none")]
use core::panic::PanicInfo;
#[cfg(target_os = "none")]
use log::{info, warn};

#[cfg(target_os = "none")]
entry_point!(kernel_main);

/// Kernel entry point.
///
/// Called by the bootloader after setting up the initial environment.
#[cfg(target_os = "none")]
fn kernel_main(_boot_info: &'static BootInfo) -> ! {
    cons_kernel::init();

    let Some(console) = x86_64::console() else {
        serial_println!("console did not come up");
        x86_64::halt_loop();
    };
    console.on_process_dump(dump_processes);

    println!("cons-kernel console");
    println!("^U kill line, {{ }} home/end, ^P processes, ^D end of input");
    info!("boot complete");

    let task = HaltWait;
    let mut line = [0u8; INPUT_BUF];
    loop {
        match console.read(&task, &mut line) {
            Ok(0) => {
                println!("<end of input>");
                info!("console: end of input");
            }
            Ok(n) => {
                console.write(b"echo: ");
                console.write(&line[..n]);
            }
            Err(ReadError::Cancelled) => warn!("console: read cancelled"),
        }
    }
}

/// Process table printed for `^P`. The boot task is the only process.
#[cfg(target_os = "none")]
fn dump_processes(console: &KernelConsole) {
    console.print(format_args!("\n1 run    echo\n"));
}

/// Panic handler.
///
/// Reports through the console's fatal path once it exists.
#[cfg(target_os = "none")]
#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    match x86_64::console() {
        Some(console) => console.fatal(format_args!("{}", info.message())),
        None => {
            serial_println!("KERNEL PANIC: {}", info);
            x86_64::halt_loop()
        }
    }
}

#[cfg(not(target_os = "none"))]
fn main() {
    eprintln!("cons-kernel runs on bare-metal x86_64 only; build it for x86_64-unknown-none");
}
