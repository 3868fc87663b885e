//! Register and flag ABI pinned across every translated slot.
//!
//! x86_64's REX prefix makes the distilled ABI's "pack two shards into one
//! register's high/low byte" trick (as a 16-bit real-mode host would) a
//! trap: once an instruction references any r8-r15 register, or needs a
//! bare REX byte to reach `sil`/`dil`/`bpl`, the `ah`/`bh`/`ch`/`dh`
//! high-byte encodings for *that same instruction* silently become
//! `spl`/`bpl`/`sil`/`dil` instead — there is no encoding that combines a
//! high-byte register with an r8-r15 operand. Since almost every guest
//! memory access needs the memory-base register (itself r13, so always
//! REX-qualified), TrustBeeb gives every shard its own low byte register
//! instead of packing two shards per 16-bit register. This keeps every
//! shard mutually combinable with the base/arena/scratch registers in a
//! single instruction, at the cost of a couple of extra registers — the
//! host has 15 usable GPRs (everything but `rsp`) against ~10 pinned
//! shards, so there is room to spare.
//!
//! | Guest | Host register | Notes |
//! |---|---|---|
//! | A | `al` | |
//! | X | `bl` | |
//! | Y | `dl` | |
//! | S | `sil` | zero-extended + `0x100` added at address-compute time (the
//! |   |        | "ch pinned to 1" trick, done via an immediate instead of a
//! |   |        | register since 16-bit registers can't appear in x86_64
//! |   |        | addressing) |
//! | C flag | `dil` | 0 or 1 |
//! | Z and N flags | `bpl` | last ALU/transfer result byte; `test bpl,bpl`
//! |   |               | then `jz`/`jnz` (Z) or `js`/`jns` (N) materializes
//! |   |               | both from one instruction, matching spec's own
//! |   |               | invariant that C and "N/Z" are reconstructible
//! |   |               | together at any boundary |
//! | V, I, D, B, U | `r8b` | packed bits, materialized only on PHP/BRK/IRQ |
//! | PC | not live between slots | implicit in current slot identity |
//! | Memory base | `r13` | guest memory base, pinned for the whole run |
//! | Arena base | `r14` | for computed (non-compile-time-constant) jumps |
//! | Scratch | `r9`, `r10`, `r11`, `r12` | addressing math, clobbered freely
//! |   |                                | within a slot |
//!
//! `rcx`, `rdi`, `rbp` (beyond the low bytes above) and `r15` are unused —
//! left free for a future register-allocator pass (see DESIGN.md).

pub mod reg {
    pub const A: u8 = RegId::Al as u8;
    pub const X: u8 = RegId::Bl as u8;
    pub const Y: u8 = RegId::Dl as u8;
    pub const S: u8 = RegId::Sil as u8;
    pub const C: u8 = RegId::Dil as u8;
    pub const ZN: u8 = RegId::Bpl as u8;
    pub const FLAGS: u8 = RegId::R8 as u8;
    pub const MEM_BASE: u8 = RegId::R13 as u8;
    pub const ARENA_BASE: u8 = RegId::R14 as u8;
    pub const SCRATCH0: u8 = RegId::R9 as u8;
    pub const SCRATCH1: u8 = RegId::R10 as u8;
    pub const SCRATCH2: u8 = RegId::R11 as u8;
    pub const SCRATCH3: u8 = RegId::R12 as u8;

    /// Unused by any guest shard, reserved for the host's own exit
    /// protocol: a translated slot that wants to return control to the
    /// supervisor writes a reason tag here and the guest PC to resume at
    /// in `EXIT_PC`, then executes `ret`. `entry()` reads both out of the
    /// caller-saved registers they land in once the call returns.
    pub const EXIT_TAG: u8 = RegId::Cl as u8;
    pub const EXIT_PC: u8 = RegId::R15 as u8;

    /// Numeric register field (0-15), used by `encode::modrm`/REX logic.
    /// The 8-bit "low byte" encodings below are distinguished from the
    /// legacy `ah`/`ch`/`dh`/`bh` meaning purely by REX presence; TrustBeeb
    /// never emits the legacy high-byte form for any of these fields.
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[repr(u8)]
    pub enum RegId {
        Al = 0, Cl = 1, Dl = 2, Bl = 3,
        Spl = 4, Bpl = 5, Sil = 6, Dil = 7,
        R8 = 8, R9 = 9, R10 = 10, R11 = 11,
        R12 = 12, R13 = 13, R14 = 14, R15 = 15,
    }

    /// Packed-flags bit positions within `FLAGS` (`r8b`), mirroring the
    /// 6502 P register's own layout so PHP/PLP can move them in one shot
    /// for the bits that live here (V, I, D, B, U — C/Z/N are assembled
    /// separately from their own shards).
    pub const FLAG_V_BIT: u8 = 0x40;
    pub const FLAG_I_BIT: u8 = 0x04;
    pub const FLAG_D_BIT: u8 = 0x08;
    pub const FLAG_B_BIT: u8 = 0x10;
    pub const FLAG_U_BIT: u8 = 0x20;
}

/// `[mem_base + sp + STACK_PAGE_OFFSET]` is the guest stack address for
/// 8-bit stack pointer `sp` — the concrete realization of the "ch pinned to
/// 0x01" rule.
pub const STACK_PAGE_OFFSET: i32 = 0x0100;
