/// The conditions under which the CPU refuses to continue. None of these are recoverable: the
/// instruction that raised one has not touched the processor, and the caller decides whether to
/// halt, log, or report it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum CpuError {
    /// A push (PUSH, CALL, RST or an interrupt) with fewer than two bytes left below SP.
    #[display("stack overflow, SP=0x{sp:0>4X} (PC=0x{pc:0>4X})")]
    StackOverflow { sp: u16, pc: u16 },
    /// A pop (POP, RET or XTHL) that would read past the end of memory.
    #[display("stack underflow, SP=0x{sp:0>4X} (PC=0x{pc:0>4X})")]
    StackUnderflow { sp: u16, pc: u16 },
    #[display("jump to invalid address 0x{target:0>4X} (PC=0x{pc:0>4X})")]
    InvalidJumpTarget { target: u16, pc: u16 },
    #[display("address 0x{addr:0>4X} is past the end of memory (PC=0x{pc:0>4X})")]
    InvalidAddress { addr: u16, pc: u16 },
    #[display("cannot load {len} bytes at offset 0x{offset:0>4X} into {capacity} bytes of memory")]
    OversizedLoad {
        offset: usize,
        len: usize,
        capacity: usize,
    },
}

impl CpuError {
    /// The program counter of the instruction that failed, if the error came from executing one.
    pub fn pc(&self) -> Option<u16> {
        match self {
            CpuError::StackOverflow { pc, .. }
            | CpuError::StackUnderflow { pc, .. }
            | CpuError::InvalidJumpTarget { pc, .. }
            | CpuError::InvalidAddress { pc, .. } => Some(*pc),
            CpuError::OversizedLoad { .. } => None,
        }
    }
}
