//! Hardware interrupt handling — PIC8259 and the scheduler tick.
//!
//! Remaps IRQ 0-15 to interrupt vectors 32-47 to avoid
//! conflicts with CPU exception vectors (0-31).

use pic8259::ChainedPics;
use spin::Mutex;
use x86_64::structures::idt::InterruptStackFrame;

/// PIC1 starts at vector 32 (right after CPU exceptions 0-31).
pub const PIC_1_OFFSET: u8 = 32;
/// PIC2 starts at vector 40.
pub const PIC_2_OFFSET: u8 = PIC_1_OFFSET + 8;

/// Hardware interrupt vector indices.
#[derive(Debug, Clone, Copy)]
#[repr(u8)]
pub enum InterruptIndex {
    Timer = PIC_1_OFFSET, // IRQ0 → vector 32
}

impl InterruptIndex {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn as_usize(self) -> usize {
        usize::from(self.as_u8())
    }
}

/// Global PIC instance.
pub static PICS: Mutex<ChainedPics> =
    Mutex::new(unsafe { ChainedPics::new(PIC_1_OFFSET, PIC_2_OFFSET) });

/// Initialize the 8259 PIC.
pub fn init_pic() {
    unsafe {
        PICS.lock().initialize();
    }
}

/// Enable hardware interrupts.
pub fn enable() {
    x86_64::instructions::interrupts::enable();
}

/// Timer interrupt handler (IRQ0, vector 32).
///
/// Runs the scheduler's tick handler through the PIT tick source.
pub extern "x86-interrupt" fn timer_handler(_stack_frame: InterruptStackFrame) {
    super::pit::fire();

    // Send EOI directly via port I/O to avoid locking PICS mutex
    unsafe {
        x86_64::instructions::port::Port::<u8>::new(0x20).write(0x20);
    }
}
