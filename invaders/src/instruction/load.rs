use super::*;

/// Data movement between registers, memory, immediates and the stack. None of these touch the
/// flags (except `POP PSW`, which restores them).
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
pub enum LoadOp {
    /// Used for opcodes in 0x40..0x80 (except 0x76)
    #[display("MOV {dest}, {src}")]
    Move { dest: Operand, src: Operand },
    /// Used for opcodes 0x_6 and 0x_E
    #[display("MVI {_0}, 0x{_1:0>2X}")]
    Immediate(Operand, u8),
    /// Used for opcodes 0x_1
    #[display("LXI {_0}, 0x{_1:0>4X}")]
    Immediate16(RegisterPair, u16),
    /// Opcode: 0x32
    #[display("STA 0x{_0:0>4X}")]
    StoreA(u16),
    /// Opcode: 0x3A
    #[display("LDA 0x{_0:0>4X}")]
    LoadA(u16),
    /// Opcode: 0x22
    /// Store L at the address and H at the address + 1.
    #[display("SHLD 0x{_0:0>4X}")]
    StoreHL(u16),
    /// Opcode: 0x2A
    #[display("LHLD 0x{_0:0>4X}")]
    LoadHL(u16),
    /// Opcodes: 0x02, 0x12
    #[display("STAX {_0}")]
    StoreIndirect(RegisterPair),
    /// Opcodes: 0x0A, 0x1A
    #[display("LDAX {_0}")]
    LoadIndirect(RegisterPair),
    /// Opcode: 0xEB
    #[display("XCHG")]
    Exchange,
    /// Opcode: 0xE3
    /// Swap HL with the word on top of the stack.
    #[display("XTHL")]
    ExchangeStack,
    /// Opcode: 0xF9
    #[display("SPHL")]
    HLIntoSP,
    /// Used for opcodes 0x_5
    #[display("PUSH {_0}")]
    Push(StackPair),
    /// Used for opcodes 0x_1
    #[display("POP {_0}")]
    Pop(StackPair),
}

impl LoadOp {
    /// Returns the number of clock cycles this instruction takes.
    pub fn cycles(&self) -> u32 {
        match self {
            LoadOp::Move { dest, src } if dest.is_memory() || src.is_memory() => 7,
            LoadOp::Move { .. } => 5,
            LoadOp::Immediate(Operand::Memory, _) => 10,
            LoadOp::Immediate(_, _) => 7,
            LoadOp::Immediate16(_, _) => 10,
            LoadOp::StoreA(_) | LoadOp::LoadA(_) => 13,
            LoadOp::StoreHL(_) | LoadOp::LoadHL(_) => 16,
            LoadOp::StoreIndirect(_) | LoadOp::LoadIndirect(_) => 7,
            LoadOp::Exchange => 5,
            LoadOp::ExchangeStack => 18,
            LoadOp::HLIntoSP => 5,
            LoadOp::Push(_) => 11,
            LoadOp::Pop(_) => 10,
        }
    }

    /// Returns the number of bytes used to encode this instruction.
    pub const fn size(&self) -> u8 {
        match self {
            LoadOp::Immediate(_, _) => 2,
            LoadOp::Immediate16(_, _)
            | LoadOp::StoreA(_)
            | LoadOp::LoadA(_)
            | LoadOp::StoreHL(_)
            | LoadOp::LoadHL(_) => 3,
            _ => 1,
        }
    }
}
