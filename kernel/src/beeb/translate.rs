//! Opcode dispatch (spec §4.2, §5.4): decodes one guest instruction and
//! drives the per-opcode emitters in `emit.rs`/`control_flow.rs` to fill
//! its slot, then appends the fall-through jump to the next address
//! unless the instruction already ends the slot itself.
//!
//! Mirrors `nes::cpu::Cpu::step`'s instruction table in spirit — same
//! official/unofficial opcode coverage, same "explicit match for the
//! irregular ops, bit-decomposition for the regular families" split
//! `emit.rs`'s own module doc describes for `decode_cc01_mode`/
//! `decode_cc10_mode` — but emitting host bytes into a slot instead of
//! interpreting directly.

use super::abi::reg;
use super::arena::{Arena, Emitter};
use super::control_flow::{self, BranchCond};
use super::emit::{self, AddrMode};
use super::encode::{self, AluOp8};
use super::error::{ExitReason, Result};
use super::memory::GuestMemory;

/// What the dispatched instruction leaves for `translate_one` to close out
/// the slot with: either it already ended in its own control transfer, or
/// it fell off the end and still needs the fall-through jump to
/// `pc + len`.
enum Flow {
    Continues(u16),
    Diverted,
}

/// Translates `n` consecutive guest addresses starting at `g0` (spec
/// §5.1 `translate_range`) — called both with `n == 1` by the
/// supervisor's re-JIT-on-exit path and available for eager warmup.
pub fn translate_range(arena: &mut Arena, mem: &GuestMemory, g0: u16, n: usize) -> Result<()> {
    let mut pc = g0;
    for _ in 0..n {
        translate_one(arena, mem, pc)?;
        pc = pc.wrapping_add(1);
    }
    Ok(())
}

/// Decodes and emits the single instruction at `pc` into its own slot.
pub fn translate_one(arena: &mut Arena, mem: &GuestMemory, pc: u16) -> Result<()> {
    let arena_base = arena.base_addr();
    let opcode = mem.read(pc);
    let slot = arena.slice_mut(pc);
    let mut em = Emitter::new(slot, pc);
    match translate_byte(&mut em, mem, pc, opcode, arena_base)? {
        Flow::Continues(len) => control_flow::emit_fallthrough(&mut em, arena_base, pc.wrapping_add(len)),
        Flow::Diverted => Ok(()),
    }
}

fn m_zp(pc: u16, mem: &GuestMemory) -> AddrMode { AddrMode::ZeroPage(mem.read(pc.wrapping_add(1))) }
fn m_zpx(pc: u16, mem: &GuestMemory) -> AddrMode { AddrMode::ZeroPageX(mem.read(pc.wrapping_add(1))) }
fn m_zpy(pc: u16, mem: &GuestMemory) -> AddrMode { AddrMode::ZeroPageY(mem.read(pc.wrapping_add(1))) }
fn m_abs(pc: u16, mem: &GuestMemory) -> AddrMode { AddrMode::Absolute(mem.read16(pc.wrapping_add(1))) }
fn m_abx(pc: u16, mem: &GuestMemory) -> AddrMode { AddrMode::AbsoluteX(mem.read16(pc.wrapping_add(1))) }
fn m_aby(pc: u16, mem: &GuestMemory) -> AddrMode { AddrMode::AbsoluteY(mem.read16(pc.wrapping_add(1))) }
fn m_izx(pc: u16, mem: &GuestMemory) -> AddrMode { AddrMode::IndirectX(mem.read(pc.wrapping_add(1))) }
fn m_izy(pc: u16, mem: &GuestMemory) -> AddrMode { AddrMode::IndirectY(mem.read(pc.wrapping_add(1))) }
fn m_imm(pc: u16, mem: &GuestMemory) -> AddrMode { AddrMode::Immediate(mem.read(pc.wrapping_add(1))) }

fn cc01_mode(opcode: u8, pc: u16, mem: &GuestMemory) -> AddrMode {
    emit::decode_cc01_mode((opcode >> 2) & 0b111, pc, mem)
}
fn cc10_mode(opcode: u8, pc: u16, mem: &GuestMemory, stx_ldx: bool) -> AddrMode {
    emit::decode_cc10_mode((opcode >> 2) & 0b111, pc, mem, stx_ldx)
}

/// The seven RMW-style unofficial opcodes (SLO/RLA/SRE/RRA/DCP/ISB) all
/// share the same addressing-mode family laid out at the same `opcode &
/// 0x1F` offsets relative to their own family base (0x00/0x20/0x40/0x60/
/// 0xC0/0xE0) — the same kind of bit pattern `decode_cc01_mode` exploits
/// for the official ALU group.
fn unofficial_rmw_mode(opcode: u8, pc: u16, mem: &GuestMemory) -> AddrMode {
    match opcode & 0x1F {
        0x03 => m_izx(pc, mem),
        0x07 => m_zp(pc, mem),
        0x0F => m_abs(pc, mem),
        0x13 => m_izy(pc, mem),
        0x17 => m_zpx(pc, mem),
        0x1B => m_aby(pc, mem),
        _ => m_abx(pc, mem),
    }
}

fn lax_mode(opcode: u8, pc: u16, mem: &GuestMemory) -> AddrMode {
    match opcode {
        0xA7 => m_zp(pc, mem),
        0xB7 => m_zpy(pc, mem),
        0xAF => m_abs(pc, mem),
        0xBF => m_aby(pc, mem),
        0xA3 => m_izx(pc, mem),
        _ => m_izy(pc, mem),
    }
}

fn sax_mode(opcode: u8, pc: u16, mem: &GuestMemory) -> AddrMode {
    match opcode {
        0x87 => m_zp(pc, mem),
        0x97 => m_zpy(pc, mem),
        0x8F => m_abs(pc, mem),
        _ => m_izx(pc, mem),
    }
}

/// LAX: LDA+LDX combined — loads the operand into A and mirrors it into X
/// without a second memory access.
fn emit_lax(em: &mut Emitter, mode: AddrMode, guest_pc: u16) -> Result<()> {
    emit::emit_load(em, reg::A, mode, guest_pc)?;
    emit::emit_transfer(em, reg::X, reg::A, false)
}

/// SAX: stores `A & X`, touching no flags.
fn emit_sax(em: &mut Emitter, mode: AddrMode, guest_pc: u16) -> Result<()> {
    encode::mov_r8_r8(em, reg::SCRATCH3, reg::A)?;
    encode::alu_r8_r8(em, AluOp8::And, reg::SCRATCH3, reg::X)?;
    emit::emit_store(em, reg::SCRATCH3, mode, guest_pc)
}

/// SLO: `ASL operand`, then `A |= operand`.
fn emit_slo(em: &mut Emitter, mode: AddrMode, guest_pc: u16) -> Result<()> {
    let operand = emit::resolve(em, mode)?;
    emit::load_operand(em, &operand, reg::SCRATCH0, guest_pc)?;
    encode::shift_r8_by1(em, encode::ShiftOp::Shl, reg::SCRATCH0)?;
    emit::save_carry_to_shard(em)?;
    emit::store_operand(em, &operand, reg::SCRATCH0, guest_pc)?;
    encode::alu_r8_r8(em, AluOp8::Or, reg::A, reg::SCRATCH0)?;
    emit::set_zn_from(em, reg::A)
}

/// RLA: `ROL operand` through carry, then `A &= operand`.
fn emit_rla(em: &mut Emitter, mode: AddrMode, guest_pc: u16) -> Result<()> {
    let operand = emit::resolve(em, mode)?;
    emit::load_operand(em, &operand, reg::SCRATCH0, guest_pc)?;
    emit::restore_carry_from_shard(em)?;
    encode::rotate_through_carry_by1(em, true, reg::SCRATCH0)?;
    emit::save_carry_to_shard(em)?;
    emit::store_operand(em, &operand, reg::SCRATCH0, guest_pc)?;
    encode::alu_r8_r8(em, AluOp8::And, reg::A, reg::SCRATCH0)?;
    emit::set_zn_from(em, reg::A)
}

/// SRE: `LSR operand`, then `A ^= operand`.
fn emit_sre(em: &mut Emitter, mode: AddrMode, guest_pc: u16) -> Result<()> {
    let operand = emit::resolve(em, mode)?;
    emit::load_operand(em, &operand, reg::SCRATCH0, guest_pc)?;
    encode::shift_r8_by1(em, encode::ShiftOp::Shr, reg::SCRATCH0)?;
    emit::save_carry_to_shard(em)?;
    emit::store_operand(em, &operand, reg::SCRATCH0, guest_pc)?;
    encode::alu_r8_r8(em, AluOp8::Xor, reg::A, reg::SCRATCH0)?;
    emit::set_zn_from(em, reg::A)
}

/// RRA: `ROR operand` through carry, then `A = ADC(A, operand)` using the
/// carry the rotate just produced — the two carry shuttles chain exactly
/// like the interpreter's `ror_val` followed by `adc`.
fn emit_rra(em: &mut Emitter, mode: AddrMode, guest_pc: u16) -> Result<()> {
    let operand = emit::resolve(em, mode)?;
    emit::load_operand(em, &operand, reg::SCRATCH0, guest_pc)?;
    emit::restore_carry_from_shard(em)?;
    encode::rotate_through_carry_by1(em, false, reg::SCRATCH0)?;
    emit::save_carry_to_shard(em)?;
    emit::store_operand(em, &operand, reg::SCRATCH0, guest_pc)?;
    emit::restore_carry_from_shard(em)?;
    encode::alu_r8_r8(em, AluOp8::Adc, reg::A, reg::SCRATCH0)?;
    emit::save_carry_to_shard(em)?;
    emit::set_zn_from(em, reg::A)
}

/// DCP: `DEC operand`, then `CMP(A, operand)` against the already-loaded
/// decremented value (no second, guard-tripping re-read of the address).
fn emit_dcp(em: &mut Emitter, mode: AddrMode, guest_pc: u16) -> Result<()> {
    let operand = emit::resolve(em, mode)?;
    emit::load_operand(em, &operand, reg::SCRATCH0, guest_pc)?;
    encode::dec_r8(em, reg::SCRATCH0)?;
    emit::store_operand(em, &operand, reg::SCRATCH0, guest_pc)?;
    encode::mov_r8_r8(em, reg::SCRATCH2, reg::A)?;
    encode::alu_r8_r8(em, AluOp8::Sub, reg::SCRATCH2, reg::SCRATCH0)?;
    encode::alu_r8_r8(em, AluOp8::Sbb, reg::C, reg::C)?;
    encode::alu_r8_imm8(em, AluOp8::Xor, reg::C, 0xFF)?;
    encode::alu_r8_imm8(em, AluOp8::And, reg::C, 1)?;
    emit::set_zn_from(em, reg::SCRATCH2)
}

/// ISB/ISC: `INC operand`, then `A = SBC(A, operand)` (SBC is ADC of the
/// inverted operand, same trick `emit_sbc` uses).
fn emit_isb(em: &mut Emitter, mode: AddrMode, guest_pc: u16) -> Result<()> {
    let operand = emit::resolve(em, mode)?;
    emit::load_operand(em, &operand, reg::SCRATCH0, guest_pc)?;
    encode::inc_r8(em, reg::SCRATCH0)?;
    emit::store_operand(em, &operand, reg::SCRATCH0, guest_pc)?;
    emit::restore_carry_from_shard(em)?;
    encode::alu_r8_imm8(em, AluOp8::Xor, reg::SCRATCH0, 0xFF)?;
    encode::alu_r8_r8(em, AluOp8::Adc, reg::A, reg::SCRATCH0)?;
    emit::save_carry_to_shard(em)?;
    emit::set_zn_from(em, reg::A)
}

/// Decodes and emits opcode `opcode` at `pc`. Returns whether the slot
/// needs the caller to append a fall-through jump.
fn translate_byte(
    em: &mut Emitter,
    mem: &GuestMemory,
    pc: u16,
    opcode: u8,
    arena_base: u64,
) -> Result<Flow> {
    match opcode {
        // ── ORA/AND/EOR/ADC/STA/LDA/CMP/SBC (cc == 01) ──────────────────
        0x09 | 0x05 | 0x15 | 0x0D | 0x1D | 0x19 | 0x01 | 0x11 => {
            let mode = cc01_mode(opcode, pc, mem);
            let len = emit::instr_len(mode);
            emit::emit_ora(em, mode, pc)?;
            Ok(Flow::Continues(len))
        }
        0x29 | 0x25 | 0x35 | 0x2D | 0x3D | 0x39 | 0x21 | 0x31 => {
            let mode = cc01_mode(opcode, pc, mem);
            let len = emit::instr_len(mode);
            emit::emit_and(em, mode, pc)?;
            Ok(Flow::Continues(len))
        }
        0x49 | 0x45 | 0x55 | 0x4D | 0x5D | 0x59 | 0x41 | 0x51 => {
            let mode = cc01_mode(opcode, pc, mem);
            let len = emit::instr_len(mode);
            emit::emit_eor(em, mode, pc)?;
            Ok(Flow::Continues(len))
        }
        0x69 | 0x65 | 0x75 | 0x6D | 0x7D | 0x79 | 0x61 | 0x71 => {
            let mode = cc01_mode(opcode, pc, mem);
            let len = emit::instr_len(mode);
            emit::emit_adc(em, mode, pc, cfg!(feature = "beeb-jit-decimal"))?;
            Ok(Flow::Continues(len))
        }
        0x85 | 0x95 | 0x8D | 0x9D | 0x99 | 0x81 | 0x91 => {
            let mode = cc01_mode(opcode, pc, mem);
            let len = emit::instr_len(mode);
            emit::emit_store(em, reg::A, mode, pc)?;
            Ok(Flow::Continues(len))
        }
        0xA9 | 0xA5 | 0xB5 | 0xAD | 0xBD | 0xB9 | 0xA1 | 0xB1 => {
            let mode = cc01_mode(opcode, pc, mem);
            let len = emit::instr_len(mode);
            emit::emit_load(em, reg::A, mode, pc)?;
            Ok(Flow::Continues(len))
        }
        0xC9 | 0xC5 | 0xD5 | 0xCD | 0xDD | 0xD9 | 0xC1 | 0xD1 => {
            let mode = cc01_mode(opcode, pc, mem);
            let len = emit::instr_len(mode);
            emit::emit_cmp(em, mode, pc)?;
            Ok(Flow::Continues(len))
        }
        0xE9 | 0xE5 | 0xF5 | 0xED | 0xFD | 0xF9 | 0xE1 | 0xF1 => {
            let mode = cc01_mode(opcode, pc, mem);
            let len = emit::instr_len(mode);
            emit::emit_sbc(em, mode, pc, cfg!(feature = "beeb-jit-decimal"))?;
            Ok(Flow::Continues(len))
        }

        // ── ASL/ROL/LSR/ROR/STX/LDX/DEC/INC (cc == 10) ──────────────────
        0x0A | 0x06 | 0x16 | 0x0E | 0x1E => {
            let mode = cc10_mode(opcode, pc, mem, false);
            let len = emit::instr_len(mode);
            emit::emit_asl(em, mode, pc)?;
            Ok(Flow::Continues(len))
        }
        0x2A | 0x26 | 0x36 | 0x2E | 0x3E => {
            let mode = cc10_mode(opcode, pc, mem, false);
            let len = emit::instr_len(mode);
            emit::emit_rol(em, mode, pc)?;
            Ok(Flow::Continues(len))
        }
        0x4A | 0x46 | 0x56 | 0x4E | 0x5E => {
            let mode = cc10_mode(opcode, pc, mem, false);
            let len = emit::instr_len(mode);
            emit::emit_lsr(em, mode, pc)?;
            Ok(Flow::Continues(len))
        }
        0x6A | 0x66 | 0x76 | 0x6E | 0x7E => {
            let mode = cc10_mode(opcode, pc, mem, false);
            let len = emit::instr_len(mode);
            emit::emit_ror(em, mode, pc)?;
            Ok(Flow::Continues(len))
        }
        0x86 | 0x96 | 0x8E => {
            let mode = cc10_mode(opcode, pc, mem, true);
            let len = emit::instr_len(mode);
            emit::emit_store(em, reg::X, mode, pc)?;
            Ok(Flow::Continues(len))
        }
        0xA2 | 0xA6 | 0xB6 | 0xAE | 0xBE => {
            let mode = cc10_mode(opcode, pc, mem, true);
            let len = emit::instr_len(mode);
            emit::emit_load(em, reg::X, mode, pc)?;
            Ok(Flow::Continues(len))
        }
        0xC6 | 0xD6 | 0xCE | 0xDE => {
            let mode = cc10_mode(opcode, pc, mem, false);
            let len = emit::instr_len(mode);
            emit::emit_dec(em, mode, pc)?;
            Ok(Flow::Continues(len))
        }
        0xE6 | 0xF6 | 0xEE | 0xFE => {
            let mode = cc10_mode(opcode, pc, mem, false);
            let len = emit::instr_len(mode);
            emit::emit_inc(em, mode, pc)?;
            Ok(Flow::Continues(len))
        }

        // ── BIT / STY / LDY / CPY / CPX (irregular cc == 00 ALU-ish) ────
        0x24 => { let mode = m_zp(pc, mem); emit::emit_bit(em, mode, pc)?; Ok(Flow::Continues(emit::instr_len(mode))) }
        0x2C => { let mode = m_abs(pc, mem); emit::emit_bit(em, mode, pc)?; Ok(Flow::Continues(emit::instr_len(mode))) }
        0x84 => { let mode = m_zp(pc, mem); emit::emit_store(em, reg::Y, mode, pc)?; Ok(Flow::Continues(emit::instr_len(mode))) }
        0x94 => { let mode = m_zpx(pc, mem); emit::emit_store(em, reg::Y, mode, pc)?; Ok(Flow::Continues(emit::instr_len(mode))) }
        0x8C => { let mode = m_abs(pc, mem); emit::emit_store(em, reg::Y, mode, pc)?; Ok(Flow::Continues(emit::instr_len(mode))) }
        0xA0 => { let mode = m_imm(pc, mem); emit::emit_load(em, reg::Y, mode, pc)?; Ok(Flow::Continues(emit::instr_len(mode))) }
        0xA4 => { let mode = m_zp(pc, mem); emit::emit_load(em, reg::Y, mode, pc)?; Ok(Flow::Continues(emit::instr_len(mode))) }
        0xB4 => { let mode = m_zpx(pc, mem); emit::emit_load(em, reg::Y, mode, pc)?; Ok(Flow::Continues(emit::instr_len(mode))) }
        0xAC => { let mode = m_abs(pc, mem); emit::emit_load(em, reg::Y, mode, pc)?; Ok(Flow::Continues(emit::instr_len(mode))) }
        0xBC => { let mode = m_abx(pc, mem); emit::emit_load(em, reg::Y, mode, pc)?; Ok(Flow::Continues(emit::instr_len(mode))) }
        0xC0 => { let mode = m_imm(pc, mem); emit::emit_cpy(em, mode, pc)?; Ok(Flow::Continues(emit::instr_len(mode))) }
        0xC4 => { let mode = m_zp(pc, mem); emit::emit_cpy(em, mode, pc)?; Ok(Flow::Continues(emit::instr_len(mode))) }
        0xCC => { let mode = m_abs(pc, mem); emit::emit_cpy(em, mode, pc)?; Ok(Flow::Continues(emit::instr_len(mode))) }
        0xE0 => { let mode = m_imm(pc, mem); emit::emit_cpx(em, mode, pc)?; Ok(Flow::Continues(emit::instr_len(mode))) }
        0xE4 => { let mode = m_zp(pc, mem); emit::emit_cpx(em, mode, pc)?; Ok(Flow::Continues(emit::instr_len(mode))) }
        0xEC => { let mode = m_abs(pc, mem); emit::emit_cpx(em, mode, pc)?; Ok(Flow::Continues(emit::instr_len(mode))) }

        // ── branches ─────────────────────────────────────────────────
        0x10 | 0x30 | 0x50 | 0x70 | 0x90 | 0xB0 | 0xD0 | 0xF0 => {
            let disp = mem.read(pc.wrapping_add(1)) as i8;
            let fallthrough_pc = pc.wrapping_add(2);
            let target = fallthrough_pc.wrapping_add(disp as u16);
            let cond = match opcode {
                0x10 => BranchCond::Pl,
                0x30 => BranchCond::Mi,
                0x50 => BranchCond::Vc,
                0x70 => BranchCond::Vs,
                0x90 => BranchCond::Cc,
                0xB0 => BranchCond::Cs,
                0xD0 => BranchCond::Ne,
                _ => BranchCond::Eq,
            };
            control_flow::emit_branch(em, arena_base, cond, target, fallthrough_pc)?;
            Ok(Flow::Diverted)
        }

        // ── jumps, subroutine calls, returns ─────────────────────────
        0x4C => {
            let target = mem.read16(pc.wrapping_add(1));
            control_flow::emit_jmp_absolute(em, arena_base, target)?;
            Ok(Flow::Diverted)
        }
        0x6C => {
            let ptr = mem.read16(pc.wrapping_add(1));
            control_flow::emit_jmp_indirect(em, ptr)?;
            Ok(Flow::Diverted)
        }
        0x20 => {
            let target = mem.read16(pc.wrapping_add(1));
            let return_pc = pc.wrapping_add(3);
            control_flow::emit_jsr(em, arena_base, target, return_pc)?;
            Ok(Flow::Diverted)
        }
        0x60 => { control_flow::emit_rts(em)?; Ok(Flow::Diverted) }
        0x40 => { control_flow::emit_rti(em)?; Ok(Flow::Diverted) }
        0x00 => { control_flow::emit_brk(em, pc)?; Ok(Flow::Diverted) }

        // ── stack ops ─────────────────────────────────────────────────
        0x48 => { control_flow::emit_pha(em)?; Ok(Flow::Continues(1)) }
        0x08 => { control_flow::emit_php(em)?; Ok(Flow::Continues(1)) }
        0x68 => { control_flow::emit_pla(em)?; Ok(Flow::Continues(1)) }
        0x28 => { control_flow::emit_plp(em)?; Ok(Flow::Continues(1)) }

        // ── flag ops ──────────────────────────────────────────────────
        0x18 => { emit::emit_set_carry(em, false)?; Ok(Flow::Continues(1)) }
        0x38 => { emit::emit_set_carry(em, true)?; Ok(Flow::Continues(1)) }
        0x58 => { emit::emit_set_flag_bit(em, reg::FLAG_I_BIT, false)?; Ok(Flow::Continues(1)) }
        0x78 => { emit::emit_set_flag_bit(em, reg::FLAG_I_BIT, true)?; Ok(Flow::Continues(1)) }
        0xB8 => { emit::emit_set_flag_bit(em, reg::FLAG_V_BIT, false)?; Ok(Flow::Continues(1)) }
        0xD8 => { emit::emit_set_flag_bit(em, reg::FLAG_D_BIT, false)?; Ok(Flow::Continues(1)) }
        0xF8 => {
            // SED: only legal to actually set D when the decimal-mode
            // feature is on (see DESIGN.md); otherwise it traps to the
            // supervisor rather than leave D-mode silently unimplemented.
            if cfg!(feature = "beeb-jit-decimal") {
                emit::emit_set_flag_bit(em, reg::FLAG_D_BIT, true)?;
                Ok(Flow::Continues(1))
            } else {
                control_flow::emit_exit(em, ExitReason::UnsupportedOpcode { opcode: 0xF8 }, pc)?;
                Ok(Flow::Diverted)
            }
        }

        // ── transfers, INX/INY/DEX/DEY, NOP ──────────────────────────
        0xAA => { emit::emit_transfer(em, reg::X, reg::A, true)?; Ok(Flow::Continues(1)) }
        0xA8 => { emit::emit_transfer(em, reg::Y, reg::A, true)?; Ok(Flow::Continues(1)) }
        0x8A => { emit::emit_transfer(em, reg::A, reg::X, true)?; Ok(Flow::Continues(1)) }
        0x98 => { emit::emit_transfer(em, reg::A, reg::Y, true)?; Ok(Flow::Continues(1)) }
        0xBA => { emit::emit_transfer(em, reg::X, reg::S, true)?; Ok(Flow::Continues(1)) }
        0x9A => { emit::emit_transfer(em, reg::S, reg::X, false)?; Ok(Flow::Continues(1)) }
        0xE8 => { emit::emit_inc_reg(em, reg::X)?; Ok(Flow::Continues(1)) }
        0xC8 => { emit::emit_inc_reg(em, reg::Y)?; Ok(Flow::Continues(1)) }
        0xCA => { emit::emit_dec_reg(em, reg::X)?; Ok(Flow::Continues(1)) }
        0x88 => { emit::emit_dec_reg(em, reg::Y)?; Ok(Flow::Continues(1)) }
        0xEA => Ok(Flow::Continues(1)),

        // ── unofficial NOPs: decode nothing, just skip the right width ──
        0x1A | 0x3A | 0x5A | 0x7A | 0xDA | 0xFA => Ok(Flow::Continues(1)),
        0x04 | 0x44 | 0x64 => Ok(Flow::Continues(2)),
        0x0C => Ok(Flow::Continues(3)),
        0x14 | 0x34 | 0x54 | 0x74 | 0xD4 | 0xF4 => Ok(Flow::Continues(2)),
        0x1C | 0x3C | 0x5C | 0x7C | 0xDC | 0xFC => Ok(Flow::Continues(3)),
        0x80 | 0x82 | 0x89 | 0xC2 | 0xE2 => Ok(Flow::Continues(2)),

        // ── unofficial combined ops ───────────────────────────────────
        0x03 | 0x07 | 0x17 | 0x0F | 0x1F | 0x1B | 0x13 => {
            let mode = unofficial_rmw_mode(opcode, pc, mem);
            let len = emit::instr_len(mode);
            emit_slo(em, mode, pc)?;
            Ok(Flow::Continues(len))
        }
        0x23 | 0x27 | 0x37 | 0x2F | 0x3F | 0x3B | 0x33 => {
            let mode = unofficial_rmw_mode(opcode, pc, mem);
            let len = emit::instr_len(mode);
            emit_rla(em, mode, pc)?;
            Ok(Flow::Continues(len))
        }
        0x43 | 0x47 | 0x57 | 0x4F | 0x5F | 0x5B | 0x53 => {
            let mode = unofficial_rmw_mode(opcode, pc, mem);
            let len = emit::instr_len(mode);
            emit_sre(em, mode, pc)?;
            Ok(Flow::Continues(len))
        }
        0x63 | 0x67 | 0x77 | 0x6F | 0x7F | 0x7B | 0x73 => {
            let mode = unofficial_rmw_mode(opcode, pc, mem);
            let len = emit::instr_len(mode);
            emit_rra(em, mode, pc)?;
            Ok(Flow::Continues(len))
        }
        0xC3 | 0xC7 | 0xD7 | 0xCF | 0xDF | 0xDB | 0xD3 => {
            let mode = unofficial_rmw_mode(opcode, pc, mem);
            let len = emit::instr_len(mode);
            emit_dcp(em, mode, pc)?;
            Ok(Flow::Continues(len))
        }
        0xE3 | 0xE7 | 0xF7 | 0xEF | 0xFF | 0xFB | 0xF3 => {
            let mode = unofficial_rmw_mode(opcode, pc, mem);
            let len = emit::instr_len(mode);
            emit_isb(em, mode, pc)?;
            Ok(Flow::Continues(len))
        }
        0xA7 | 0xB7 | 0xAF | 0xBF | 0xA3 | 0xB3 => {
            let mode = lax_mode(opcode, pc, mem);
            let len = emit::instr_len(mode);
            emit_lax(em, mode, pc)?;
            Ok(Flow::Continues(len))
        }
        0x87 | 0x97 | 0x8F | 0x83 => {
            let mode = sax_mode(opcode, pc, mem);
            let len = emit::instr_len(mode);
            emit_sax(em, mode, pc)?;
            Ok(Flow::Continues(len))
        }

        // Everything else (KIL/JAM and the handful of unstable undocumented
        // opcodes nobody ships working code against) traps to the
        // supervisor instead of guessing at a behavior (spec §5.4).
        _ => {
            control_flow::emit_exit(em, ExitReason::UnsupportedOpcode { opcode }, pc)?;
            Ok(Flow::Diverted)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beeb::arena::Arena;
    use crate::beeb::rom::RomSet;
    use alloc::vec;

    fn fresh_memory() -> GuestMemory {
        GuestMemory::new(RomSet::new(vec![0u8; 0x4000]))
    }

    #[test]
    fn nop_translates_and_falls_through() {
        let mut arena = Arena::new();
        let mut mem = fresh_memory();
        mem.write(0x0200, 0xEA); // NOP
        translate_one(&mut arena, &mem, 0x0200).unwrap();
        let slot = arena.slice_mut(0x0200);
        assert!(slot.iter().any(|&b| b == 0xE9)); // jmp rax fallthrough tail
    }

    #[test]
    fn unknown_opcode_emits_an_exit_not_a_panic() {
        let mut arena = Arena::new();
        let mut mem = fresh_memory();
        mem.write(0x0300, 0x02); // KIL/JAM
        translate_one(&mut arena, &mem, 0x0300).unwrap();
        let slot = arena.slice_mut(0x0300);
        assert!(slot.iter().any(|&b| b == 0xC3)); // ret ends the exit path
    }

    #[test]
    fn sed_traps_without_the_decimal_feature() {
        let mut arena = Arena::new();
        let mut mem = fresh_memory();
        mem.write(0x0400, 0xF8); // SED
        translate_one(&mut arena, &mem, 0x0400).unwrap();
        let slot = arena.slice_mut(0x0400);
        assert!(slot.iter().any(|&b| b == 0xC3));
    }

    #[test]
    fn jsr_ends_the_slot_without_a_fallthrough_jump() {
        let mut arena = Arena::new();
        let mut mem = fresh_memory();
        mem.write(0x0500, 0x20); // JSR
        mem.write(0x0501, 0x00);
        mem.write(0x0502, 0x10);
        translate_one(&mut arena, &mem, 0x0500).unwrap();
    }
}
