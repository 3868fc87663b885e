//! Minimal x86_64 machine-code encoding primitives. Nothing here knows
//! anything about the 6502; `emit.rs` and `control_flow.rs` are the only
//! callers. Kept separate so the REX/ModRM bit-twiddling (the fiddly,
//! easy-to-get-wrong part) lives in one small, heavily commented place
//! (spec §4.3 Design Note, REX prefix constraint — see abi.rs).

use super::arena::Emitter;
use super::error::Result;

/// r8-r15 need REX.B/R/X; this also forces the REX-qualified meaning of
/// `sil`/`dil`/`bpl`/`spl` for *every* register operand in the same
/// instruction, which is exactly why TrustBeeb's ABI never relies on the
/// legacy `ah`/`bh`/`ch`/`dh` high-byte encodings (see abi.rs).
fn needs_rex_ext(reg: u8) -> bool {
    reg >= 8
}

/// True for the four registers that are only reachable as an 8-bit
/// operand when a REX prefix is present (`spl`, `bpl`, `sil`, `dil`).
fn needs_rex_for_low_byte(reg: u8) -> bool {
    (4..8).contains(&reg)
}

fn rex(w: bool, r: u8, x: u8, b: u8) -> u8 {
    0x40 | ((w as u8) << 3) | (((r >> 3) & 1) << 2) | (((x >> 3) & 1) << 1) | ((b >> 3) & 1)
}

fn modrm(md: u8, reg: u8, rm: u8) -> u8 {
    (md << 6) | ((reg & 7) << 3) | (rm & 7)
}

/// Emits a REX prefix for an 8-bit-operand instruction with register
/// fields `reg_field`/`rm_field` only if encoding requires one (either
/// register is r8-r15, or either needs the REX-qualified low-byte form).
fn maybe_rex8(em: &mut Emitter, reg_field: u8, rm_field: u8) -> Result<()> {
    if needs_rex_ext(reg_field) || needs_rex_ext(rm_field)
        || needs_rex_for_low_byte(reg_field) || needs_rex_for_low_byte(rm_field)
    {
        em.push(rex(false, reg_field, 0, rm_field))?;
    }
    Ok(())
}

fn rex64(reg_field: u8, rm_field: u8) -> u8 {
    rex(true, reg_field, 0, rm_field)
}

/// `mov r8, imm8`
pub fn mov_r8_imm8(em: &mut Emitter, dst: u8, imm: u8) -> Result<()> {
    if needs_rex_ext(dst) || needs_rex_for_low_byte(dst) {
        em.push(rex(false, 0, 0, dst))?;
    }
    em.push(0xB0 | (dst & 7))?;
    em.push(imm)
}

/// `mov r8, r8`
pub fn mov_r8_r8(em: &mut Emitter, dst: u8, src: u8) -> Result<()> {
    maybe_rex8(em, src, dst)?;
    em.push(0x88)?;
    em.push(modrm(0b11, src, dst))
}

/// `al/cl/dl/bl op reg8, reg8`-shaped two-operand ALU ops (add/sub/and/or/xor/cmp),
/// operating `dst = dst OP src` except `cmp`, which only sets flags.
#[derive(Clone, Copy)]
pub enum AluOp8 {
    Add, Or, Adc, Sbb, And, Sub, Xor, Cmp,
}

impl AluOp8 {
    fn opcode(self) -> u8 {
        match self {
            AluOp8::Add => 0x00,
            AluOp8::Or => 0x08,
            AluOp8::Adc => 0x10,
            AluOp8::Sbb => 0x18,
            AluOp8::And => 0x20,
            AluOp8::Sub => 0x28,
            AluOp8::Xor => 0x30,
            AluOp8::Cmp => 0x38,
        }
    }
}

pub fn alu_r8_r8(em: &mut Emitter, op: AluOp8, dst: u8, src: u8) -> Result<()> {
    maybe_rex8(em, src, dst)?;
    em.push(op.opcode())?;
    em.push(modrm(0b11, src, dst))
}

pub fn alu_r8_imm8(em: &mut Emitter, op: AluOp8, dst: u8, imm: u8) -> Result<()> {
    if needs_rex_ext(dst) || needs_rex_for_low_byte(dst) {
        em.push(rex(false, 0, 0, dst))?;
    }
    em.push(0x80)?;
    let reg_field = op.opcode() >> 3;
    em.push(modrm(0b11, reg_field, dst))?;
    em.push(imm)
}

pub fn test_r8_r8(em: &mut Emitter, a: u8, b: u8) -> Result<()> {
    maybe_rex8(em, b, a)?;
    em.push(0x84)?;
    em.push(modrm(0b11, b, a))
}

/// `inc r8` / `dec r8`
pub fn inc_r8(em: &mut Emitter, reg: u8) -> Result<()> {
    if needs_rex_ext(reg) || needs_rex_for_low_byte(reg) {
        em.push(rex(false, 0, 0, reg))?;
    }
    em.push(0xFE)?;
    em.push(modrm(0b11, 0, reg))
}

pub fn dec_r8(em: &mut Emitter, reg: u8) -> Result<()> {
    if needs_rex_ext(reg) || needs_rex_for_low_byte(reg) {
        em.push(rex(false, 0, 0, reg))?;
    }
    em.push(0xFE)?;
    em.push(modrm(0b11, 1, reg))
}

/// Shift/rotate group (`shl`/`shr`/`sar`/`rol`/`ror`), by 1 (uses the
/// implicit-1 `/D0` form, which also sets CF from the bit shifted out —
/// exactly the value 6502 ASL/LSR/ROL/ROR need).
#[derive(Clone, Copy)]
pub enum ShiftOp {
    Rol, Ror, Shl, Shr, Sar,
}

impl ShiftOp {
    fn reg_field(self) -> u8 {
        match self {
            ShiftOp::Rol => 0,
            ShiftOp::Ror => 1,
            ShiftOp::Shl => 4,
            ShiftOp::Shr => 5,
            ShiftOp::Sar => 7,
        }
    }
}

pub fn shift_r8_by1(em: &mut Emitter, op: ShiftOp, reg: u8) -> Result<()> {
    if needs_rex_ext(reg) || needs_rex_for_low_byte(reg) {
        em.push(rex(false, 0, 0, reg))?;
    }
    em.push(0xD0)?;
    em.push(modrm(0b11, op.reg_field(), reg))
}

/// `rcl`/`rcr` by 1 — rotate-through-carry, used for ROL/ROR so the guest
/// C flag participates exactly like the 6502's 9-bit rotate.
pub fn rotate_through_carry_by1(em: &mut Emitter, left: bool, reg: u8) -> Result<()> {
    if needs_rex_ext(reg) || needs_rex_for_low_byte(reg) {
        em.push(rex(false, 0, 0, reg))?;
    }
    em.push(0xD0)?;
    em.push(modrm(0b11, if left { 2 } else { 3 }, reg))
}

/// `movzx reg32, r8` — zero-extends an 8-bit shard into a scratch
/// register for address computation (spec's "S implies page 1" rule).
pub fn movzx_r32_r8(em: &mut Emitter, dst: u8, src: u8) -> Result<()> {
    if needs_rex_ext(dst) || needs_rex_ext(src) || needs_rex_for_low_byte(src) {
        em.push(rex(false, dst, 0, src))?;
    }
    em.push(0x0F)?;
    em.push(0xB6)?;
    em.push(modrm(0b11, dst, src))
}

/// `lea dst64, [base64 + disp32]`
pub fn lea_disp32(em: &mut Emitter, dst: u8, base: u8, disp: i32) -> Result<()> {
    em.push(rex64(dst, base))?;
    em.push(0x8D)?;
    if base & 7 == 4 {
        em.push(modrm(0b10, dst, base))?;
        em.push(0x24)?;
    } else {
        em.push(modrm(0b10, dst, base))?;
    }
    em.push_i32(disp)
}

/// `mov dst8, [base64 + disp32]`
pub fn mov_r8_mem_disp32(em: &mut Emitter, dst: u8, base: u8, disp: i32) -> Result<()> {
    if needs_rex_ext(dst) || needs_rex_ext(base) || needs_rex_for_low_byte(dst) {
        em.push(rex(false, dst, 0, base))?;
    }
    em.push(0x8A)?;
    if base & 7 == 4 {
        em.push(modrm(0b10, dst, base))?;
        em.push(0x24)?;
    } else {
        em.push(modrm(0b10, dst, base))?;
    }
    em.push_i32(disp)
}

/// `mov [base64 + disp32], src8`
pub fn mov_mem_disp32_r8(em: &mut Emitter, base: u8, disp: i32, src: u8) -> Result<()> {
    if needs_rex_ext(src) || needs_rex_ext(base) || needs_rex_for_low_byte(src) {
        em.push(rex(false, src, 0, base))?;
    }
    em.push(0x88)?;
    if base & 7 == 4 {
        em.push(modrm(0b10, src, base))?;
        em.push(0x24)?;
    } else {
        em.push(modrm(0b10, src, base))?;
    }
    em.push_i32(disp)
}

/// `add dst32, src32` (used on scratch registers doing 16-bit-wrapping
/// address math — callers use the 32-bit form and then mask/truncate as
/// the addressing mode requires).
pub fn add_r32_r32(em: &mut Emitter, dst: u8, src: u8) -> Result<()> {
    if needs_rex_ext(dst) || needs_rex_ext(src) {
        em.push(rex(false, src, 0, dst))?;
    }
    em.push(0x01)?;
    em.push(modrm(0b11, src, dst))
}

pub fn add_r32_imm32(em: &mut Emitter, dst: u8, imm: i32) -> Result<()> {
    if needs_rex_ext(dst) {
        em.push(rex(false, 0, 0, dst))?;
    }
    em.push(0x81)?;
    em.push(modrm(0b11, 0, dst))?;
    em.push_i32(imm)
}

/// `and dst32, imm32` — used to mask address math to 8 or 16 bits so
/// zero-page and absolute-indexed wraparound each match `u8`/`u16`
/// `wrapping_add` exactly (spec §4.4).
pub fn and_r32_imm32(em: &mut Emitter, dst: u8, imm: i32) -> Result<()> {
    if needs_rex_ext(dst) {
        em.push(rex(false, 0, 0, dst))?;
    }
    em.push(0x81)?;
    em.push(modrm(0b11, 4, dst))?;
    em.push_i32(imm)
}

/// `cmp dst32, imm32` (0x81 /7) — flags only, no write.
pub fn cmp_r32_imm32(em: &mut Emitter, dst: u8, imm: i32) -> Result<()> {
    if needs_rex_ext(dst) {
        em.push(rex(false, 0, 0, dst))?;
    }
    em.push(0x81)?;
    em.push(modrm(0b11, 7, dst))?;
    em.push_i32(imm)
}

pub fn mov_r32_imm32(em: &mut Emitter, dst: u8, imm: u32) -> Result<()> {
    if needs_rex_ext(dst) {
        em.push(rex(false, 0, 0, dst))?;
    }
    em.push(0xB8 | (dst & 7))?;
    em.push_u32(imm)
}

/// `ret`
pub fn ret(em: &mut Emitter) -> Result<()> {
    em.push(0xC3)
}

/// `jmp rel32` placeholder with a fixed-size encoding so callers can patch
/// the displacement after the rest of the slot is known (control_flow.rs).
pub fn jmp_rel32_placeholder(em: &mut Emitter) -> Result<usize> {
    em.push(0xE9)?;
    let at = em.len();
    em.push_i32(0)?;
    Ok(at)
}

#[derive(Clone, Copy)]
pub enum Cc {
    Z, Nz, S, Ns, C, Nc, O, No,
    /// Unsigned above (CF=0 and ZF=0) — used for the I/O-strip range
    /// check, the one place TrustBeeb needs a two-flag condition.
    A,
}

impl Cc {
    fn tttn(self) -> u8 {
        match self {
            Cc::O => 0x0, Cc::No => 0x1,
            Cc::C => 0x2, Cc::Nc => 0x3,
            Cc::Z => 0x4, Cc::Nz => 0x5,
            Cc::A => 0x7,
            Cc::S => 0x8, Cc::Ns => 0x9,
        }
    }
}

/// `jcc rel32` placeholder (0F 8x form, always 6 bytes, to keep patch
/// offsets uniform regardless of how near the target turns out to be).
pub fn jcc_rel32_placeholder(em: &mut Emitter, cc: Cc) -> Result<usize> {
    em.push(0x0F)?;
    em.push(0x80 | cc.tttn())?;
    let at = em.len();
    em.push_i32(0)?;
    Ok(at)
}

fn sib(scale: u8, index: u8, base: u8) -> u8 {
    (scale << 6) | ((index & 7) << 3) | (base & 7)
}

/// `mov dst8, [base64 + index64*1 + disp32]` — the effective-address form
/// every memory-operand addressing mode resolves to: `base` is always the
/// pinned memory-base register, `index` the scratch register holding the
/// 16-bit guest address (spec §4.4 addressing resolution).
pub fn mov_r8_mem_sib(em: &mut Emitter, dst: u8, base: u8, index: u8, disp: i32) -> Result<()> {
    if needs_rex_ext(dst) || needs_rex_ext(base) || needs_rex_ext(index) || needs_rex_for_low_byte(dst) {
        em.push(rex(false, dst, index, base))?;
    }
    em.push(0x8A)?;
    em.push(modrm(0b10, dst, 0b100))?;
    em.push(sib(0, index, base))?;
    em.push_i32(disp)
}

/// `shl reg32, imm8`
pub fn shl_r32_imm8(em: &mut Emitter, reg: u8, imm: u8) -> Result<()> {
    if needs_rex_ext(reg) {
        em.push(rex(false, 0, 0, reg))?;
    }
    em.push(0xC1)?;
    em.push(modrm(0b11, 4, reg))?;
    em.push(imm)
}

/// `add dst64, src64`
pub fn add_r64_r64(em: &mut Emitter, dst: u8, src: u8) -> Result<()> {
    em.push(rex(true, src, 0, dst))?;
    em.push(0x01)?;
    em.push(modrm(0b11, src, dst))
}

/// `jmp reg64` (`FF /4`)
pub fn jmp_r64(em: &mut Emitter, reg: u8) -> Result<()> {
    if needs_rex_ext(reg) {
        em.push(rex(false, 0, 0, reg))?;
    }
    em.push(0xFF)?;
    em.push(modrm(0b11, 4, reg))
}

pub fn mov_mem_sib_r8(em: &mut Emitter, base: u8, index: u8, disp: i32, src: u8) -> Result<()> {
    if needs_rex_ext(src) || needs_rex_ext(base) || needs_rex_ext(index) || needs_rex_for_low_byte(src) {
        em.push(rex(false, src, index, base))?;
    }
    em.push(0x88)?;
    em.push(modrm(0b10, src, 0b100))?;
    em.push(sib(0, index, base))?;
    em.push_i32(disp)
}
