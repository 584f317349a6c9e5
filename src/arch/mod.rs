//! x86_64 architecture-specific initialization.

mod idt;
pub mod interrupts;
pub mod pit;

/// Initialize the IDT and the PIC. Interrupts stay disabled.
pub fn init() {
    idt::init();
    interrupts::init_pic();
}

/// Critical sections mask interrupts on the only core.
struct InterruptMask;

critical_section::set_impl!(InterruptMask);

unsafe impl critical_section::Impl for InterruptMask {
    unsafe fn acquire() -> critical_section::RawRestoreState {
        let was_enabled = x86_64::instructions::interrupts::are_enabled();
        x86_64::instructions::interrupts::disable();
        was_enabled
    }

    unsafe fn release(was_enabled: critical_section::RawRestoreState) {
        if was_enabled {
            x86_64::instructions::interrupts::enable();
        }
    }
}
