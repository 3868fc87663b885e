//! TrustBeeb: a dynamic binary translator for the BBC Micro's 6502, built
//! the way `nes`/`gameboy` wrap their interpreters — a small top-level
//! struct owning guest state plus a `load_rom`-shaped entry point — but
//! compiling guest code into the `arena` instead of stepping an
//! interpreter loop (spec §1, §5.11).

mod abi;
mod arena;
mod control_flow;
mod emit;
mod encode;
mod entry;
mod error;
mod invalidate;
mod memory;
mod rom;
mod state;
mod supervisor;
mod translate;

use alloc::vec::Vec;

use arena::Arena;
use memory::GuestMemory;
use rom::RomSet;
use state::CpuState;
pub use error::{BeebJitError, ExitReason};
pub use supervisor::StopReason;

/// Top-level handle for one running BBC Micro instance: guest memory, the
/// translation arena, CPU register state, and the interrupt-pending
/// bookkeeping `entry::enter` itself has no fields for (spec §4.6) —
/// mirroring `NesEmulator`'s own `dma_pending`-style sibling fields kept
/// outside the CPU struct proper.
pub struct BeebMachine {
    mem: GuestMemory,
    arena: Arena,
    state: CpuState,
    irq_pending: bool,
    nmi_pending: bool,
    cycles: u64,
    rom_loaded: bool,
}

impl BeebMachine {
    pub fn new() -> Self {
        let roms = RomSet::new(Vec::new());
        let mem = GuestMemory::new(roms);
        let arena = Arena::new();
        let state = CpuState::reset(|addr| mem.read16(addr));
        Self {
            mem,
            arena,
            state,
            irq_pending: false,
            nmi_pending: false,
            cycles: 0,
            rom_loaded: false,
        }
    }

    /// Loads the OS ROM image and resets the machine against it (spec
    /// §5.9, §5.11) — the OS ROM has to be known before `CpuState::reset`
    /// can read the `0xFFFC` reset vector out of it. Any sideways ROMs
    /// must be re-inserted afterward; this rebuilds `RomSet` from scratch
    /// the same way `NesEmulator::load_rom` rebuilds its whole bus rather
    /// than patching one region of it.
    pub fn load_os_rom(&mut self, data: Vec<u8>) {
        let roms = RomSet::new(data);
        self.mem = GuestMemory::new(roms);
        self.arena = Arena::new();
        self.state = CpuState::reset(|addr| self.mem.read16(addr));
        self.irq_pending = false;
        self.nmi_pending = false;
        self.cycles = 0;
        self.rom_loaded = true;
    }

    /// Loads a sideways ROM image into `slot` (spec §5.10).
    pub fn insert_sideways_rom(&mut self, slot: u8, data: Vec<u8>) {
        self.mem.load_sideways_rom(slot, data);
    }

    /// Writes ROMSEL (`0xFE30`), switching the visible `0x8000-0xBFFF`
    /// window and invalidating any slots translated against the old bank
    /// (spec §4.5, §5.10).
    pub fn select_sideways_bank(&mut self, bank: u8) {
        if self.mem.select_sideways_bank(bank) {
            invalidate::invalidate_sideways_window(&mut self.arena, &mut self.mem);
        }
    }

    /// Resets the CPU to the OS ROM's reset vector without reloading any
    /// ROM image (spec §5.9).
    pub fn reset(&mut self) {
        self.state = CpuState::reset(|addr| self.mem.read16(addr));
        self.irq_pending = false;
        self.nmi_pending = false;
    }

    pub fn rom_loaded(&self) -> bool {
        self.rom_loaded
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Runs translated code until a terminal exit (spec §4.7): BRK, a
    /// host-requested stop, an unsupported opcode, or a guard-page fault.
    pub fn run_until_trap(&mut self) -> error::Result<StopReason> {
        supervisor::run(
            &mut self.arena,
            &mut self.mem,
            &mut self.state,
            &mut self.irq_pending,
            &mut self.nmi_pending,
        )
    }

    /// Raises IRQL — serviced at the next cooperative check point between
    /// slots if the interrupt-disable flag is clear (spec §4.6).
    pub fn raise_irq(&mut self) {
        self.irq_pending = true;
    }

    /// Raises NMI — serviced at the next cooperative check point
    /// regardless of the interrupt-disable flag (spec §4.6).
    pub fn raise_nmi(&mut self) {
        self.nmi_pending = true;
    }

    /// Host-side key press, forwarded into whatever the OS ROM's
    /// keyboard-matrix convention is. Stubbed until a keyboard peripheral
    /// model exists (spec §5.11 Non-goals); kept as a no-op entry point so
    /// callers built against it compile unchanged once one lands.
    pub fn handle_key(&mut self, _key: u8) {}

    pub fn handle_key_release(&mut self, _key: u8) {}
}
