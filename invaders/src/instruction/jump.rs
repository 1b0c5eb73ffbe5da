use super::*;

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
pub enum JumpOp {
    /// Op Code: 0xC3
    #[display("JMP 0x{_0:0>4X}")]
    Absolute(u16),
    /// Op Codes: 0xC2, 0xCA, ..., 0xFA
    #[display("J{_0} 0x{_1:0>4X}")]
    ConditionalAbsolute(Condition, u16),
    /// Op Code: 0xCD
    #[display("CALL 0x{_0:0>4X}")]
    Call(u16),
    /// Op Codes: 0xC4, 0xCC, ..., 0xFC
    #[display("C{_0} 0x{_1:0>4X}")]
    ConditionalCall(Condition, u16),
    /// Op Code: 0xC9
    #[display("RET")]
    Return,
    /// Op Codes: 0xC0, 0xC8, ..., 0xF8
    #[display("R{_0}")]
    ConditionalReturn(Condition),
    /// Op Codes: 0xC7, 0xCF, ..., 0xFF
    #[display("{_0}")]
    Restart(Restart),
    /// Op Code: 0xE9
    #[display("PCHL")]
    JumpToHL,
}

impl JumpOp {
    /// Returns the number of clock cycles this instruction takes. Conditional calls and returns
    /// take longer when their condition passes.
    pub fn cycles(&self, flags: &Flags) -> u32 {
        match self {
            JumpOp::Absolute(_) | JumpOp::ConditionalAbsolute(_, _) => 10,
            JumpOp::Call(_) => 17,
            JumpOp::ConditionalCall(cond, _) => 11 + 6 * cond.passed(flags) as u32,
            JumpOp::Return => 10,
            JumpOp::ConditionalReturn(cond) => 5 + 6 * cond.passed(flags) as u32,
            JumpOp::Restart(_) => Restart::CYCLES,
            JumpOp::JumpToHL => 5,
        }
    }

    /// Returns the number of bytes used to encode this instruction.
    pub const fn size(&self) -> u8 {
        match self {
            JumpOp::Absolute(_)
            | JumpOp::ConditionalAbsolute(_, _)
            | JumpOp::Call(_)
            | JumpOp::ConditionalCall(_, _) => 3,
            JumpOp::Return
            | JumpOp::ConditionalReturn(_)
            | JumpOp::Restart(_)
            | JumpOp::JumpToHL => 1,
        }
    }
}
