//! Serial port output for QEMU debugging.

use lazy_static::lazy_static;
use spin::Mutex;
use stratos::{Diagnostic, DiagnosticSink};
use uart_16550::SerialPort;

lazy_static! {
    pub static ref SERIAL1: Mutex<SerialPort> = {
        let mut serial_port = unsafe { SerialPort::new(0x3F8) };
        serial_port.init();
        Mutex::new(serial_port)
    };
}

/// Initialize serial output.
pub fn init() {
    // Serial is initialized lazily, just force it here
    let _ = SERIAL1.lock();
}

#[doc(hidden)]
pub fn _print(args: ::core::fmt::Arguments) {
    use core::fmt::Write;
    // The tick handler may report diagnostics, so never take the serial
    // lock with interrupts enabled.
    x86_64::instructions::interrupts::without_interrupts(|| {
        let _ = SERIAL1.lock().write_fmt(args);
    });
}

/// Print to serial (QEMU console).
#[macro_export]
macro_rules! print {
    ($($arg:tt)*) => ($crate::serial::_print(format_args!($($arg)*)));
}

/// Print to serial with newline.
#[macro_export]
macro_rules! println {
    () => ($crate::print!("\n"));
    ($($arg:tt)*) => ($crate::print!("{}\n", format_args!($($arg)*)));
}

/// Scheduler diagnostics on the serial console.
pub struct SerialDiagnostics;

pub static CONSOLE: SerialDiagnostics = SerialDiagnostics;

impl DiagnosticSink for SerialDiagnostics {
    fn emit(&self, diagnostic: &Diagnostic) {
        crate::println!("[SCHED] {}", diagnostic);
    }
}
