//! Branches, jumps, subroutine calls, and the stack — everything that
//! can end a slot (spec §4.4 Fall-Through Protocol, §5.5).
//!
//! A slot ends one of three ways: a direct branch/jump to a
//! translate-time-known target (emitted as a single `lea` + `jmp`, no
//! runtime multiply needed, since `arena_base + target*STRIDE` always
//! fits a 32-bit displacement), a computed jump (RTS, `JMP (abs)`) that
//! needs a runtime `shl reg, 6` to scale the 16-bit address by
//! `SLOT_STRIDE`, or falling off the end of the slot into the next
//! sequential address's slot — which `translate_range` handles by simply
//! emitting that next slot's instructions right after this one's (spec's
//! "emit linearly": a fall-through is not a jump at all, just more bytes
//! in the same 64KiB-worth-of-slots backing store), except that
//! `SLOT_STRIDE` is reserved per guest *address*, not per instruction, so
//! a fall-through still needs an explicit `jmp` to the next address's
//! slot start to stay correct when re-JITting has changed what that slot
//! contains since this one was built.

use super::abi::{reg, STACK_PAGE_OFFSET};
use super::arena::Emitter;
use super::encode::{self, AluOp8, Cc};
use super::error::{ExitReason, Result};

/// Pushes `STACK_PAGE_OFFSET + sp` as the effective address into
/// `SCRATCH1`, then decrements `sp` with 8-bit wraparound — the push half
/// of PHA/PHP/JSR/BRK/IRQ/NMI (spec §4.4, §4.7 "S implies page 1").
fn push8(em: &mut Emitter, value_reg: u8) -> Result<()> {
    encode::movzx_r32_r8(em, reg::SCRATCH1, reg::S)?;
    encode::add_r32_imm32(em, reg::SCRATCH1, STACK_PAGE_OFFSET)?;
    encode::mov_mem_sib_r8(em, reg::MEM_BASE, reg::SCRATCH1, 0, value_reg)?;
    encode::dec_r8(em, reg::S)
}

fn pop8(em: &mut Emitter, dst_reg: u8) -> Result<()> {
    encode::inc_r8(em, reg::S)?;
    encode::movzx_r32_r8(em, reg::SCRATCH1, reg::S)?;
    encode::add_r32_imm32(em, reg::SCRATCH1, STACK_PAGE_OFFSET)?;
    encode::mov_r8_mem_sib(em, dst_reg, reg::MEM_BASE, reg::SCRATCH1, 0)
}

pub fn emit_pha(em: &mut Emitter) -> Result<()> {
    push8(em, reg::A)
}
pub fn emit_pla(em: &mut Emitter) -> Result<()> {
    pop8(em, reg::A)?;
    super::emit::set_zn_after_pull(em)
}

/// PHP: assembles a full P byte from the C/ZN shards and the FLAGS packed
/// bits, with the B and U bits forced set (spec §4.4: PHP always pushes
/// B=1, unlike an IRQ/NMI-triggered push which pushes B=0).
pub fn emit_php(em: &mut Emitter) -> Result<()> {
    assemble_p_byte(em, reg::SCRATCH2, true)?;
    push8(em, reg::SCRATCH2)
}

pub fn emit_plp(em: &mut Emitter) -> Result<()> {
    pop8(em, reg::SCRATCH2)?;
    disassemble_p_byte(em, reg::SCRATCH2)
}

/// Builds a 6502 P byte into `dst` from the live shards. `SCRATCH0` and
/// `SCRATCH3` are clobbered.
fn assemble_p_byte(em: &mut Emitter, dst: u8, break_flag: bool) -> Result<()> {
    encode::mov_r8_r8(em, dst, reg::FLAGS)?;
    encode::alu_r8_imm8(em, AluOp8::Or, dst, reg::FLAG_U_BIT)?;
    if break_flag {
        encode::alu_r8_imm8(em, AluOp8::Or, dst, reg::FLAG_B_BIT)?;
    } else {
        encode::alu_r8_imm8(em, AluOp8::And, dst, !reg::FLAG_B_BIT)?;
    }
    encode::alu_r8_r8(em, AluOp8::Or, dst, reg::C)?;
    super::emit::fold_zn_into_p_byte(em, dst)
}

fn disassemble_p_byte(em: &mut Emitter, src: u8) -> Result<()> {
    encode::mov_r8_r8(em, reg::C, src)?;
    encode::alu_r8_imm8(em, AluOp8::And, reg::C, 1)?;
    encode::mov_r8_r8(em, reg::FLAGS, src)?;
    encode::alu_r8_imm8(em, AluOp8::And, reg::FLAGS, reg::FLAG_V_BIT | reg::FLAG_I_BIT | reg::FLAG_D_BIT)?;
    super::emit::set_zn_from_p_byte(em, src)
}

/// Conditions a branch tests. `Z`/`Nz` read the ZN shard; `Sign`/`NotSign`
/// also read it (N is the same byte's top bit); `Carry`/`NotCarry` read
/// the C shard; `Overflow`/`NotOverflow` test the packed V bit.
#[derive(Clone, Copy)]
pub enum BranchCond {
    Eq, Ne, Cs, Cc, Mi, Pl, Vs, Vc,
}

/// Emits a conditional branch. `target` is the guest address branched to
/// (`pc + 2 + offset`, already resolved by the caller); `fallthrough_pc`
/// is the next sequential instruction. Both are translate-time constants
/// since a 6502 branch target never depends on runtime state.
pub fn emit_branch(
    em: &mut Emitter,
    arena_base_imm: u64,
    cond: BranchCond,
    target: u16,
    fallthrough_pc: u16,
) -> Result<()> {
    match cond {
        BranchCond::Eq => encode::test_r8_r8(em, reg::ZN, reg::ZN)?,
        BranchCond::Ne => encode::test_r8_r8(em, reg::ZN, reg::ZN)?,
        BranchCond::Mi => encode::test_r8_r8(em, reg::ZN, reg::ZN)?,
        BranchCond::Pl => encode::test_r8_r8(em, reg::ZN, reg::ZN)?,
        BranchCond::Cs | BranchCond::Cc => encode::test_r8_r8(em, reg::C, reg::C)?,
        BranchCond::Vs | BranchCond::Vc => {
            encode::mov_r8_r8(em, reg::SCRATCH0, reg::FLAGS)?;
            encode::alu_r8_imm8(em, AluOp8::And, reg::SCRATCH0, reg::FLAG_V_BIT)?;
            encode::test_r8_r8(em, reg::SCRATCH0, reg::SCRATCH0)?;
        }
    }
    let cc = match cond {
        BranchCond::Eq => Cc::Z,
        BranchCond::Ne => Cc::Nz,
        BranchCond::Mi => Cc::S,
        BranchCond::Pl => Cc::Ns,
        BranchCond::Cs => Cc::Nz,
        BranchCond::Cc => Cc::Z,
        BranchCond::Vs => Cc::Nz,
        BranchCond::Vc => Cc::Z,
    };
    let patch_at = encode::jcc_rel32_placeholder(em, cc)?;
    emit_direct_jump_to(em, arena_base_imm, fallthrough_pc)?;
    let taken_target = em.len() as i32;
    em.patch_i32(patch_at, taken_target - (patch_at as i32 + 4));
    emit_direct_jump_to(em, arena_base_imm, target)
}

/// Unconditional jump to a translate-time-known guest address: a single
/// `lea rax, [arena_base_imm]` (folded as an absolute `mov`) followed by
/// `jmp rax`, since the target slot address is just
/// `arena_base + target*STRIDE`, already a compile-time constant.
fn emit_direct_jump_to(em: &mut Emitter, arena_base_imm: u64, target: u16) -> Result<()> {
    let slot_addr = arena_base_imm.wrapping_add(target as u64 * super::arena::SLOT_STRIDE as u64);
    emit_jmp_abs64(em, slot_addr)
}

/// `movabs rax, imm64 ; jmp rax` — used for both direct jumps (target
/// known at translate time) and the exit path's final return, giving the
/// arena its only truly unconditional control transfer primitive.
fn emit_jmp_abs64(em: &mut Emitter, addr: u64) -> Result<()> {
    em.push(0x48)?; // REX.W, rax needs no B/R/X extension bits
    em.push(0xB8)?; // mov rax, imm64
    em.push_slice(&addr.to_le_bytes())?;
    em.push(0xFF)?; // jmp rax (/4)
    em.push(0xE0)
}

/// JMP absolute: translate-time-known target, so this is just a direct
/// jump like a taken branch.
pub fn emit_jmp_absolute(em: &mut Emitter, arena_base_imm: u64, target: u16) -> Result<()> {
    emit_direct_jump_to(em, arena_base_imm, target)
}

/// Ends a non-control-transfer instruction's emission by jumping to the
/// next sequential instruction's slot (spec §4.5/§5.5 Fall-Through
/// Protocol). `target_addr` is `addr + instruction_length`, computed by
/// the caller. Reuses the same `movabs+jmp` absolute jump every other
/// control transfer in this module already uses, rather than a second
/// relative-displacement path just for this one case — the target is
/// just as translate-time-constant here as it is for a taken branch or a
/// direct JMP.
pub fn emit_fallthrough(em: &mut Emitter, arena_base_imm: u64, target_addr: u16) -> Result<()> {
    emit_direct_jump_to(em, arena_base_imm, target_addr)
}

/// JMP (abs) and RTS share the same "computed jump" shape: compute a
/// 16-bit guest address at runtime, scale it by `SLOT_STRIDE`
/// (`SLOT_STRIDE == 64 == 1 << 6`, so this is a `shl reg, 6`), add the
/// arena base, and jump through the register.
fn emit_computed_jump(em: &mut Emitter, addr_reg32: u8) -> Result<()> {
    encode::shl_r32_imm8(em, addr_reg32, 6)?;
    // Zero-extend happens for free: `shl r32` already cleared the upper
    // 32 bits of the 64-bit register on the prior 32-bit mov/movzx.
    encode::add_r64_r64(em, addr_reg32, reg::ARENA_BASE)?;
    encode::jmp_r64(em, addr_reg32)
}

/// `JMP (abs)`, including the page-wrap bug: the pointer's high byte is
/// always fetched from `(abs & 0xFF00) | ((abs+1) & 0x00FF)`, matching
/// `GuestMemory::read16_bug` (spec §4.4 Design Note, §7 JMP indirect bug).
pub fn emit_jmp_indirect(em: &mut Emitter, ptr: u16) -> Result<()> {
    let hi_addr = (ptr & 0xFF00) | (ptr.wrapping_add(1) & 0x00FF);
    encode::mov_r32_imm32(em, reg::SCRATCH1, ptr as u32)?;
    encode::mov_r8_mem_sib(em, reg::SCRATCH0, reg::MEM_BASE, reg::SCRATCH1, 0)?;
    encode::mov_r32_imm32(em, reg::SCRATCH1, hi_addr as u32)?;
    encode::mov_r8_mem_sib(em, reg::SCRATCH2, reg::MEM_BASE, reg::SCRATCH1, 0)?;
    encode::shl_r32_imm8(em, reg::SCRATCH2, 8)?;
    encode::mov_r8_r8(em, reg::SCRATCH1, reg::SCRATCH0)?;
    encode::alu_r8_r8(em, AluOp8::Or, reg::SCRATCH1, reg::SCRATCH2)?;
    emit_computed_jump(em, reg::SCRATCH1)
}

/// JSR: pushes `return_pc - 1` (the address of JSR's own last byte, per
/// the 6502's documented-quirky convention RTS relies on), then jumps.
pub fn emit_jsr(em: &mut Emitter, arena_base_imm: u64, target: u16, return_pc: u16) -> Result<()> {
    let pushed = return_pc.wrapping_sub(1);
    encode::mov_r8_imm8(em, reg::SCRATCH3, (pushed >> 8) as u8)?;
    push8(em, reg::SCRATCH3)?;
    encode::mov_r8_imm8(em, reg::SCRATCH3, pushed as u8)?;
    push8(em, reg::SCRATCH3)?;
    emit_direct_jump_to(em, arena_base_imm, target)
}

/// RTS: pops a 16-bit address and jumps to `addr + 1` — a computed jump,
/// since the popped value is only known once the slot actually runs.
pub fn emit_rts(em: &mut Emitter) -> Result<()> {
    pop8(em, reg::SCRATCH0)?; // low byte
    pop8(em, reg::SCRATCH3)?; // high byte
    encode::movzx_r32_r8(em, reg::SCRATCH1, reg::SCRATCH0)?;
    encode::movzx_r32_r8(em, reg::SCRATCH2, reg::SCRATCH3)?;
    encode::shl_r32_imm8(em, reg::SCRATCH2, 8)?;
    encode::alu_r8_r8(em, AluOp8::Or, reg::SCRATCH1, reg::SCRATCH2)?;
    encode::add_r32_imm32(em, reg::SCRATCH1, 1)?;
    encode::and_r32_imm32(em, reg::SCRATCH1, 0xFFFF)?;
    emit_computed_jump(em, reg::SCRATCH1)
}

/// RTI: pops P then a 16-bit PC, restoring interrupted state exactly
/// (unlike RTS, no `+1` adjustment — the pushed PC already points at the
/// instruction to resume, spec §4.4).
pub fn emit_rti(em: &mut Emitter) -> Result<()> {
    pop8(em, reg::SCRATCH3)?;
    disassemble_p_byte(em, reg::SCRATCH3)?;
    pop8(em, reg::SCRATCH0)?;
    pop8(em, reg::SCRATCH3)?;
    encode::movzx_r32_r8(em, reg::SCRATCH1, reg::SCRATCH0)?;
    encode::movzx_r32_r8(em, reg::SCRATCH2, reg::SCRATCH3)?;
    encode::shl_r32_imm8(em, reg::SCRATCH2, 8)?;
    encode::alu_r8_r8(em, AluOp8::Or, reg::SCRATCH1, reg::SCRATCH2)?;
    emit_computed_jump(em, reg::SCRATCH1)
}

/// BRK always traps to the supervisor rather than running the guest IRQ
/// vector inline: on the real machine BRK is how the OS implements
/// software-interrupt-based calls (OSWORD/OSBYTE-style errors), which
/// need arbitrarily complex host-side handling the arena has no business
/// inlining (spec §8 `ExitReason::Brk`).
pub fn emit_brk(em: &mut Emitter, guest_pc: u16) -> Result<()> {
    let return_pc = guest_pc.wrapping_add(2);
    encode::mov_r8_imm8(em, reg::SCRATCH3, (return_pc >> 8) as u8)?;
    push8(em, reg::SCRATCH3)?;
    encode::mov_r8_imm8(em, reg::SCRATCH3, return_pc as u8)?;
    push8(em, reg::SCRATCH3)?;
    assemble_p_byte(em, reg::SCRATCH2, true)?;
    push8(em, reg::SCRATCH2)?;
    encode::mov_r32_imm32(em, reg::EXIT_PC, return_pc as u32)?;
    encode::mov_r8_imm8(em, reg::EXIT_TAG, ExitReason::Brk.tag())?;
    encode::ret(em)
}

/// The generic "stop translating, hand control to the supervisor" exit
/// used for IO-strip hits, guard faults, and unsupported opcodes.
pub fn emit_exit(em: &mut Emitter, reason: ExitReason, guest_pc: u16) -> Result<()> {
    encode::mov_r32_imm32(em, reg::EXIT_PC, guest_pc as u32)?;
    encode::mov_r8_imm8(em, reg::EXIT_TAG, reason.tag())?;
    encode::ret(em)
}
