//! TrustBeeb error types and trap exit reasons.
//!
//! Two separate enums, matching how `hypervisor` keeps VM-exit handling
//! (a normal, expected control-flow outcome) distinct from `HypervisorError`
//! (a setup failure): `BeebJitError` is returned by the build/translate path,
//! `ExitReason` is the normal return value of the run path and is never
//! wrapped in a `Result`.

/// Fatal errors from building or translating code. Never produced by
/// running already-translated code — see `ExitReason` for that.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeebJitError {
    /// An emitter needed more than `arena::SLOT_STRIDE` bytes.
    StrideOverflow { guest_pc: u16, opcode: u8 },
    /// A computed jump landed outside the mapped arena.
    GuardPageFault { host_addr: usize },
    /// Build-time configuration the running host can't satisfy.
    UnsupportedHostFeature(&'static str),
}

pub type Result<T> = core::result::Result<T, BeebJitError>;

/// Why translated code returned control to the supervisor.
///
/// `SlotInvalidated` is the one variant beyond spec's literal exit-reason
/// list: it keeps "re-translate and continue" (routine) distinct at the
/// type level from `UnsupportedOpcode` (fatal unless a fallback kicks in),
/// per spec's own insistence that the two not be confused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    UnsupportedOpcode { opcode: u8 },
    SlotInvalidated,
    IoAccess { addr: u16, value: u8, is_write: bool },
    Irq,
    Nmi,
    Brk,
    ExitRequested,
    GuardPageFault,
}

impl ExitReason {
    /// Low-byte tag used in the raw `enter()` ABI word (spec §6).
    pub fn tag(self) -> u8 {
        match self {
            ExitReason::UnsupportedOpcode { .. } => 1,
            ExitReason::SlotInvalidated => 2,
            ExitReason::IoAccess { .. } => 3,
            ExitReason::Irq => 4,
            ExitReason::Nmi => 5,
            ExitReason::Brk => 6,
            ExitReason::ExitRequested => 7,
            ExitReason::GuardPageFault => 8,
        }
    }
}

/// The Entry Descriptor: what translated code hands back to the supervisor.
#[derive(Debug, Clone, Copy)]
pub struct ExitDescriptor {
    pub reason: ExitReason,
    pub guest_pc: u16,
}
