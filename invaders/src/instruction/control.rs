#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
pub enum ControlOp {
    #[display("NOP")]
    Noop,
    /// Holds the PC in place. Re-executed until an interrupt moves the PC elsewhere.
    #[display("HLT")]
    Halt,
    #[display("EI")]
    EnableInterrupts,
    #[display("DI")]
    DisableInterrupts,
    /// Set carry
    #[display("STC")]
    SetCarry,
    /// Complement carry
    #[display("CMC")]
    ComplementCarry,
}

impl ControlOp {
    /// Returns the number of clock cycles this instruction takes. A halted CPU consumes none.
    pub fn cycles(&self) -> u32 {
        match self {
            ControlOp::Halt => 0,
            _ => 4,
        }
    }
}
