//! The decoded form of every 8080 opcode. Each family of operations lives in its own module and
//! knows its encoded size and its cost in clock cycles. Decoding from raw bytes happens in
//! [`crate::lookup`].

use crate::cpu::Flags;

mod arithmetic;
mod control;
mod jump;
mod load;

pub use arithmetic::*;
pub use control::*;
pub use jump::*;
pub use load::*;

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
#[display("{_variant}")]
pub enum Instruction {
    #[display("{_0}")]
    Load(LoadOp),
    #[display("{_0}")]
    Arithmetic(ArithmeticOp),
    #[display("{_0}")]
    Rotate(RotateOp),
    #[display("{_0}")]
    Jump(JumpOp),
    #[display("{_0}")]
    Control(ControlOp),
    /// Copy an input port into the accumulator.
    #[display("IN 0x{_0:0>2X}")]
    Input(u8),
    /// Copy the accumulator into an output port.
    #[display("OUT 0x{_0:0>2X}")]
    Output(u8),
}

impl Instruction {
    /// Returns the number of clock cycles this instruction takes. Takes the current flags in order
    /// to determine if a conditional call or return will be taken.
    pub fn cycles(&self, flags: &Flags) -> u32 {
        match self {
            Instruction::Load(op) => op.cycles(),
            Instruction::Arithmetic(op) => op.cycles(),
            Instruction::Rotate(_) => 4,
            Instruction::Jump(op) => op.cycles(flags),
            Instruction::Control(op) => op.cycles(),
            Instruction::Input(_) | Instruction::Output(_) => 10,
        }
    }

    /// Returns the number of bytes used to encode this instruction.
    pub const fn size(&self) -> u8 {
        match self {
            Instruction::Load(op) => op.size(),
            Instruction::Arithmetic(op) => op.size(),
            Instruction::Rotate(_) => 1,
            Instruction::Jump(op) => op.size(),
            Instruction::Control(_) => 1,
            Instruction::Input(_) | Instruction::Output(_) => 2,
        }
    }
}

macro_rules! instruction_from {
    ($($op:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$op> for Instruction {
                fn from(op: $op) -> Self {
                    Instruction::$variant(op)
                }
            }
        )*
    };
}

instruction_from! {
    LoadOp => Load,
    ArithmeticOp => Arithmetic,
    RotateOp => Rotate,
    JumpOp => Jump,
    ControlOp => Control,
}

/// One of the seven 8-bit registers.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
pub enum HalfRegister {
    #[display("A")]
    A,
    #[display("B")]
    B,
    #[display("C")]
    C,
    #[display("D")]
    D,
    #[display("E")]
    E,
    #[display("H")]
    H,
    #[display("L")]
    L,
}

/// The 3-bit register field used by MOV, MVI, INR, DCR and the accumulator ALU group. Code 6 does
/// not name a register; it refers to the byte in memory addressed by HL (the "M" operand).
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display, derive_more::From)]
pub enum Operand {
    #[display("{_0}")]
    Reg(HalfRegister),
    #[display("M")]
    Memory,
}

impl Operand {
    /// Decodes the low three bits of `bits` in the order B, C, D, E, H, L, M, A.
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0x07 {
            0 => Operand::Reg(HalfRegister::B),
            1 => Operand::Reg(HalfRegister::C),
            2 => Operand::Reg(HalfRegister::D),
            3 => Operand::Reg(HalfRegister::E),
            4 => Operand::Reg(HalfRegister::H),
            5 => Operand::Reg(HalfRegister::L),
            6 => Operand::Memory,
            _ => Operand::Reg(HalfRegister::A),
        }
    }

    pub const fn is_memory(&self) -> bool {
        matches!(self, Operand::Memory)
    }
}

/// The 2-bit register pair field used by LXI, INX, DCX, DAD, STAX and LDAX.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
pub enum RegisterPair {
    #[display("B")]
    BC,
    #[display("D")]
    DE,
    #[display("H")]
    HL,
    #[display("SP")]
    SP,
}

impl RegisterPair {
    /// Decodes the low two bits of `bits` in the order BC, DE, HL, SP.
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => RegisterPair::BC,
            1 => RegisterPair::DE,
            2 => RegisterPair::HL,
            _ => RegisterPair::SP,
        }
    }
}

/// The 2-bit register pair field used by PUSH and POP. Identical to [`RegisterPair`] except that
/// the last code names the accumulator and packed flag byte rather than the stack pointer.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
pub enum StackPair {
    #[display("B")]
    BC,
    #[display("D")]
    DE,
    #[display("H")]
    HL,
    #[display("PSW")]
    PSW,
}

impl StackPair {
    /// Decodes the low two bits of `bits` in the order BC, DE, HL, PSW.
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => StackPair::BC,
            1 => StackPair::DE,
            2 => StackPair::HL,
            _ => StackPair::PSW,
        }
    }
}

/// The 3-bit condition field of the conditional jumps, calls and returns. The top two bits pick
/// the flag (zero, carry, parity, sign) and the bottom bit picks whether that flag must be set.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
pub enum Condition {
    #[display("NZ")]
    NotZero,
    #[display("Z")]
    Zero,
    #[display("NC")]
    NoCarry,
    #[display("C")]
    Carry,
    #[display("PO")]
    ParityOdd,
    #[display("PE")]
    ParityEven,
    #[display("P")]
    Plus,
    #[display("M")]
    Minus,
}

impl Condition {
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0x07 {
            0 => Condition::NotZero,
            1 => Condition::Zero,
            2 => Condition::NoCarry,
            3 => Condition::Carry,
            4 => Condition::ParityOdd,
            5 => Condition::ParityEven,
            6 => Condition::Plus,
            _ => Condition::Minus,
        }
    }

    pub fn passed(&self, flags: &Flags) -> bool {
        match self {
            Condition::NotZero => !flags.zero,
            Condition::Zero => flags.zero,
            Condition::NoCarry => !flags.carry,
            Condition::Carry => flags.carry,
            Condition::ParityOdd => !flags.parity,
            Condition::ParityEven => flags.parity,
            Condition::Plus => !flags.sign,
            Condition::Minus => flags.sign,
        }
    }
}

/// The eight single-byte restart instructions. The discriminant is the op code; the target
/// address is encoded in bits 3..5 of it.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
#[repr(u8)]
pub enum Restart {
    #[display("RST 0")]
    Rst0 = 0xC7,
    #[display("RST 1")]
    Rst1 = 0xCF,
    #[display("RST 2")]
    Rst2 = 0xD7,
    #[display("RST 3")]
    Rst3 = 0xDF,
    #[display("RST 4")]
    Rst4 = 0xE7,
    #[display("RST 5")]
    Rst5 = 0xEF,
    #[display("RST 6")]
    Rst6 = 0xF7,
    #[display("RST 7")]
    Rst7 = 0xFF,
}

impl Restart {
    /// The cost of pushing the PC and jumping, whether through the instruction or an interrupt.
    pub const CYCLES: u32 = 11;

    /// Decodes the 3-bit restart field, bits 3..5 of the op code.
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0x07 {
            0 => Restart::Rst0,
            1 => Restart::Rst1,
            2 => Restart::Rst2,
            3 => Restart::Rst3,
            4 => Restart::Rst4,
            5 => Restart::Rst5,
            6 => Restart::Rst6,
            _ => Restart::Rst7,
        }
    }

    pub const fn opcode(self) -> u8 {
        self as u8
    }

    /// The address jumped to: 0x00, 0x08, ..., 0x38.
    pub const fn vector(self) -> u16 {
        (self as u8 & 0x38) as u16
    }
}
