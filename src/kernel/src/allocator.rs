//! Kernel heap allocation.
//!
//! The only heap user is the keyboard scancode queue, so a small static
//! arena is enough and no page mapping is needed.

use core::ptr::addr_of_mut;

use linked_list_allocator::LockedHeap;

/// The size of the kernel heap.
pub const HEAP_SIZE: usize = 16 * 1024; // 16 KiB

static mut HEAP: [u8; HEAP_SIZE] = [0; HEAP_SIZE];

static HEAP_READY: spin::Once<()> = spin::Once::new();

#[global_allocator]
static ALLOCATOR: LockedHeap = LockedHeap::empty();

/// Initialize the kernel heap. Later calls do nothing.
pub fn init_heap() {
    HEAP_READY.call_once(|| {
        // SAFETY: HEAP is handed to the allocator exactly once, guarded by
        // HEAP_READY, and nothing else ever references it.
        unsafe {
            ALLOCATOR
                .lock()
                .init(addr_of_mut!(HEAP).cast::<u8>(), HEAP_SIZE);
        }
    });
}
