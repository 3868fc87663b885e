//! Supervisor loop (spec §4.6, §4.7): the only place that calls
//! `entry::enter`, services the exit it returns, and decides whether to
//! re-enter a slot, re-translate one, or hand control back to the caller.
//!
//! Grounded on `hypervisor::vm::VirtualMachine::run_loop`/
//! `handle_vm_exit`'s shape: a loop around the actual hardware transition
//! (`vmlaunch`/`vmresume` there, `entry::enter` here) with a match over
//! the exit reason deciding whether to keep looping.

use super::abi::STACK_PAGE_OFFSET;
use super::arena::Arena;
use super::emit;
use super::entry;
use super::error::{ExitDescriptor, ExitReason, Result};
use super::memory::{CodeHint, GuestMemory};
use super::state::CpuState;
use super::translate;

/// Why `run` returned control to its caller.
pub enum StopReason {
    /// The guest executed `BRK`.
    Brk,
    /// Host code asked the supervisor to stop (spec §4.7 `ExitRequested`).
    ExitRequested,
    /// A translated slot tried to run code the translator cannot emit.
    UnsupportedOpcode(u8),
    /// The JIT wrote past a guard page; the arena is no longer trustworthy.
    GuardPageFault,
}

/// Runs translated code starting at `state.pc` until one of the
/// terminal exit reasons above is reached, transparently handling
/// IRQ/NMI delivery, I/O-strip accesses, and stale-slot re-translation
/// along the way.
pub fn run(
    arena: &mut Arena,
    mem: &mut GuestMemory,
    state: &mut CpuState,
    irq_pending: &mut bool,
    nmi_pending: &mut bool,
) -> Result<StopReason> {
    let mem_base = mem.base_ptr();
    let arena_base = arena.base_addr();

    loop {
        // `entry::enter` never synthesizes Irq/Nmi itself (see entry.rs);
        // servicing one is the supervisor's own job, performed at this
        // cooperative check point between slots (spec §4.6).
        if *nmi_pending {
            *nmi_pending = false;
            service_interrupt(state, mem, 0xFFFA, false);
        } else if *irq_pending && !state.flags.irq_disable {
            *irq_pending = false;
            service_interrupt(state, mem, 0xFFFE, false);
        }

        ensure_translated(arena, mem, state.pc)?;
        let slot_addr = arena.slot_addr(state.pc);

        // SAFETY: `slot_addr` was just (re)built by `ensure_translated`
        // above for exactly `state.pc`; `mem_base`/`arena_base` are the
        // live buffers that translated code's MEM_BASE/ARENA_BASE-relative
        // addressing is computed against.
        let exit: ExitDescriptor = unsafe { entry::enter(slot_addr, state, mem_base, arena_base) };
        state.pc = exit.guest_pc;

        match exit.reason {
            ExitReason::IoAccess { addr, value, is_write } => {
                dispatch_io(mem, addr, value, is_write);
                // The guard traps before the instruction's own read/write
                // completes, and I/O-strip peripherals aren't modeled
                // (spec Non-goal), so there is no register-level value to
                // fold back in. Skip past the instruction that trapped
                // rather than re-enter its slot and trap on the same
                // access forever.
                state.pc = state.pc.wrapping_add(io_instruction_len(mem, state.pc));
            }
            ExitReason::SlotInvalidated => {
                translate::translate_range(arena, mem, exit.guest_pc, 1)?;
                mem.set_hint((exit.guest_pc >> 8) as u8, CodeHint::Translated);
            }
            ExitReason::Brk => return Ok(StopReason::Brk),
            ExitReason::ExitRequested => return Ok(StopReason::ExitRequested),
            ExitReason::UnsupportedOpcode { .. } => {
                // entry.rs deliberately leaves `opcode` as 0; the
                // supervisor is the one holding `GuestMemory` and re-reads
                // the byte that actually tripped the exit.
                let opcode = mem.read(exit.guest_pc);
                return Ok(StopReason::UnsupportedOpcode(opcode));
            }
            ExitReason::GuardPageFault => return Ok(StopReason::GuardPageFault),
            // Never produced by `enter` in practice (see entry.rs); kept
            // only so this match stays exhaustive against `ExitReason`.
            ExitReason::Irq | ExitReason::Nmi => {}
        }
    }
}

/// Pushes PC and P onto the guest stack and jumps through `vector` — the
/// same sequence `control_flow::emit_brk` generates into a slot, run
/// directly against `CpuState`/`GuestMemory` instead since no slot exists
/// for an interrupt delivered between instructions.
fn service_interrupt(state: &mut CpuState, mem: &mut GuestMemory, vector: u16, break_flag: bool) {
    let pc = state.pc;
    push8(state, mem, (pc >> 8) as u8);
    push8(state, mem, (pc & 0xFF) as u8);
    push8(state, mem, state.flags.to_p_byte(break_flag));
    state.flags.irq_disable = true;
    state.pc = mem.read16(vector);
}

fn push8(state: &mut CpuState, mem: &mut GuestMemory, val: u8) {
    mem.write(STACK_PAGE_OFFSET as u16 | state.sp as u16, val);
    state.sp = state.sp.wrapping_sub(1);
}

/// Services an access that landed in the I/O strip (spec §6). Real
/// peripheral emulation (VIA, CRTC, ...) plugs in here; for now this is
/// the same flat-buffer read/write `GuestMemory` already does for every
/// other address, just routed through the supervisor instead of a bare
/// `mov` so a future peripheral model has a single seam to hook.
pub fn dispatch_io(mem: &mut GuestMemory, addr: u16, value: u8, is_write: bool) -> u8 {
    if is_write {
        mem.write(addr, value);
        value
    } else {
        mem.read(addr)
    }
}

/// Re-derives the length of the instruction at `pc` so the supervisor can
/// skip over an I/O-strip access without re-entering (and re-trapping on)
/// its slot. Only the addressing-mode families that ever touch memory —
/// cc01 (ALU) and cc10 (shift/STX/LDX/INC/DEC) — can land here; anything
/// else reports length 1, which a real I/O trap never reaches.
fn io_instruction_len(mem: &GuestMemory, pc: u16) -> u16 {
    let opcode = mem.read(pc);
    match opcode & 0b11 {
        0b01 => emit::instr_len(emit::decode_cc01_mode((opcode >> 2) & 0b111, pc, mem)),
        0b10 => {
            let stx_ldx = matches!(opcode, 0x86 | 0x96 | 0x8E | 0xA2 | 0xA6 | 0xB6 | 0xAE | 0xBE);
            emit::instr_len(emit::decode_cc10_mode((opcode >> 2) & 0b111, pc, mem, stx_ldx))
        }
        _ => match opcode {
            0x2C | 0x8C | 0xAC | 0xBC | 0xCC | 0xEC => 3,
            0x24 | 0x84 | 0x94 | 0xA4 | 0xB4 | 0xC4 | 0xE4 => 2,
            _ => 1,
        },
    }
}

/// Builds (or rebuilds) the slot at `pc` if it isn't already known-good.
fn ensure_translated(arena: &mut Arena, mem: &mut GuestMemory, pc: u16) -> Result<()> {
    let page = (pc >> 8) as u8;
    match mem.hint(page) {
        CodeHint::Translated => Ok(()),
        CodeHint::Untranslated | CodeHint::Stale => {
            translate::translate_range(arena, mem, pc, 1)?;
            mem.set_hint(page, CodeHint::Translated);
            Ok(())
        }
    }
}
