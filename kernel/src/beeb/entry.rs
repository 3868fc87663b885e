//! The entry boundary: the one place host and guest execution actually
//! cross (spec §4.3, §6). Everything above pins guest state to host
//! registers by construction; this function is where that convention is
//! made real with an `asm!` block, the same way `vmx`'s `vmlaunch`/
//! `vmresume` wrappers are the sole crossing point into guest-mode
//! execution for the hypervisor.

use super::error::{ExitDescriptor, ExitReason};
use super::state::CpuState;

/// Loads `state` into its pinned host registers, jumps into the slot at
/// `slot_addr`, and returns the `ExitDescriptor` the slot left behind in
/// the exit-protocol registers (`cl`/`r15d`) once it executes `ret`.
///
/// The ZN shard lives in `bpl` (`rbp`'s low byte), but stable `asm!`
/// refuses to bind `rbp` as an operand — it's reserved as the frame
/// pointer. Rather than change the ABI, this shuttles `zn_result`
/// through `rbp` by hand: save the host's own `rbp` with a plain `push`,
/// move the value in/out via a pointer operand, and `pop` it back before
/// the block ends, all inside the asm text where the restriction doesn't
/// apply.
///
/// # Safety
/// `slot_addr` must point at a slot built by `Arena` (executable,
/// ending in a tag/pc write and `ret`), `mem_base` must be a valid
/// pointer to the guest's flat memory window, and `arena_base` must be
/// `Arena::base_addr()` for the same arena `slot_addr` belongs to. The
/// caller must also guarantee host interrupts are masked for the
/// duration of the call — a host interrupt landing mid-slot would see
/// guest state split across registers with no frame describing it.
pub unsafe fn enter(
    slot_addr: u64,
    state: &mut CpuState,
    mem_base: u64,
    arena_base: u64,
) -> ExitDescriptor {
    let mut a = state.a;
    let mut x = state.x;
    let mut y = state.y;
    let mut s = state.sp;
    let mut c = state.flags.carry as u8;
    let mut flags_packed = state.flags.packed_bits();
    let zn_ptr: *mut u8 = &mut state.flags.zn_result;
    let exit_tag: u8;
    let exit_pc: u32;
    // EXIT_IO_VALUE / EXIT_IO_ADDR (spec §6): only meaningful when
    // `exit_tag == 3` (`ExitReason::IoAccess`), the reused SCRATCH0/
    // SCRATCH1 registers otherwise hold whatever garbage the last
    // translated instruction left in them.
    let io_value: u8;
    let io_addr_and_write_bit: u32;

    core::arch::asm!(
        "push rbp",
        "mov bpl, [{zn_ptr}]",
        "call {slot}",
        "mov [{zn_ptr}], bpl",
        "pop rbp",
        zn_ptr = in(reg) zn_ptr,
        slot = in(reg) slot_addr,
        inout("al") a,
        inout("bl") x,
        inout("dl") y,
        inout("sil") s,
        inout("dil") c,
        inout("r8b") flags_packed,
        in("r13") mem_base,
        in("r14") arena_base,
        out("cl") exit_tag,
        out("r15d") exit_pc,
        out("r9b") io_value,
        out("r10d") io_addr_and_write_bit,
        out("r11") _, out("r12") _,
    );

    state.a = a;
    state.x = x;
    state.y = y;
    state.sp = s;
    state.flags.carry = c != 0;
    state.flags.set_packed_bits(flags_packed);
    // zn_result was updated in place through zn_ptr.

    let guest_pc = exit_pc as u16;
    state.pc = guest_pc;
    let reason = decode_tag(exit_tag, guest_pc, io_value, io_addr_and_write_bit);
    ExitDescriptor { reason, guest_pc }
}

/// Turns the raw `EXIT_TAG` byte back into an `ExitReason`. `Irq`/`Nmi`
/// are never written by translated code — they're synthesized by
/// `supervisor::run` itself at the cooperative check point between slots
/// (spec §4.6) — but the match still has to stay exhaustive against
/// every tag `ExitReason::tag` can produce, so those arms exist purely
/// to satisfy that and are unreachable from this function in practice.
///
/// `UnsupportedOpcode`, `SlotInvalidated`, `Brk`, `ExitRequested` and
/// `GuardPageFault` are written by `control_flow::emit_exit`/`emit_brk`
/// and `arena::write_untranslated_stub`. `IoAccess` (tag 3) is written
/// per-access by `emit::emit_io_guard` on every instruction that touches
/// the `0xFC00-0xFEFF` strip (spec §7) — its address and write bit are
/// packed into `EXIT_IO_ADDR` (`r10d`, bit 16 is the write flag, bits
/// 0-15 the guest address) and its value, for a store, into
/// `EXIT_IO_VALUE` (`r9b`). `UnsupportedOpcode`'s `opcode` field is still
/// left `0` here — filled in by the supervisor, which has `GuestMemory`
/// in hand to re-read `mem.read(guest_pc)`.
fn decode_tag(tag: u8, guest_pc: u16, io_value: u8, io_addr_and_write_bit: u32) -> ExitReason {
    match tag {
        1 => ExitReason::UnsupportedOpcode { opcode: 0 },
        2 => ExitReason::SlotInvalidated,
        3 => ExitReason::IoAccess {
            addr: (io_addr_and_write_bit & 0xFFFF) as u16,
            value: io_value,
            is_write: io_addr_and_write_bit & 0x1_0000 != 0,
        },
        4 => ExitReason::Irq,
        5 => ExitReason::Nmi,
        6 => ExitReason::Brk,
        7 => ExitReason::ExitRequested,
        _ => ExitReason::GuardPageFault,
    }
}
