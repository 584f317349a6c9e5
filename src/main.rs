//! StratOS kernel.
//!
//! Boots, brings up the serial console and the timer interrupt, then hands
//! the CPU to the cooperative scheduler for good.

#![no_std]
#![no_main]
#![feature(abi_x86_interrupt)]

mod arch;
mod serial;

use core::panic::PanicInfo;

use bootloader_api::{entry_point, BootInfo};
use stratos::{Config, Scheduler, TaskDefinition};

const CONFIG: Config = Config::DEFAULT;

static SCHEDULER: Scheduler = Scheduler::with_config(CONFIG);

/// Kernel tasks, in selection priority order.
static KERNEL_TASKS: [TaskDefinition; 2] = [
    TaskDefinition::new("heartbeat", CONFIG.ticks_from_ms(1000), heartbeat),
    TaskDefinition::new("sched_stats", CONFIG.ticks_from_ms(5000), sched_stats),
];

entry_point!(kernel_main);

fn kernel_main(_boot_info: &'static mut BootInfo) -> ! {
    // Initialize serial output first (for debugging in QEMU)
    serial::init();

    println!("StratOS v{}", env!("CARGO_PKG_VERSION"));
    println!("===========================");

    arch::init();
    println!("[OK] IDT and PIC initialized");

    SCHEDULER.set_diagnostics(&serial::CONSOLE);
    match SCHEDULER.init(&KERNEL_TASKS, &arch::pit::Pit) {
        Ok(timer) => println!("[OK] Scheduler initialized on {}", timer),
        Err(e) => {
            println!("[FAIL] {}", e);
            halt();
        }
    }

    arch::interrupts::enable();
    println!("Kernel initialized, entering scheduler");

    SCHEDULER.run_with(x86_64::instructions::hlt)
}

fn heartbeat() {
    println!("[heartbeat] tick {}", SCHEDULER.now());
}

fn sched_stats() {
    println!(
        "[sched] {} tasks, {} overruns",
        SCHEDULER.task_count(),
        SCHEDULER.overrun_count()
    );
}

fn halt() -> ! {
    loop {
        x86_64::instructions::hlt();
    }
}

/// Panic handler for kernel panics.
#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    println!("\n!!! KERNEL PANIC !!!");
    println!("{}", info);
    halt();
}
