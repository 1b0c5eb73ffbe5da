use std::fmt;

use super::*;

/// The second operand of an accumulator operation: either a register (or M), or the byte that
/// follows the op code.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::From, derive_more::Display)]
pub enum Source {
    #[display("{_0}")]
    Operand(Operand),
    #[display("0x{_0:0>2X}")]
    Immediate(u8),
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum ArithmeticOp {
    /// ADD/ADI
    Add(Source),
    /// ADC/ACI
    Adc(Source),
    /// SUB/SUI
    Sub(Source),
    /// SBB/SBI
    Sbb(Source),
    /// ANA/ANI
    And(Source),
    /// XRA/XRI
    Xor(Source),
    /// ORA/ORI
    Or(Source),
    /// CMP/CPI. Subtracts for the flags only; the accumulator is left alone.
    Compare(Source),
    /// INR
    Inc(Operand),
    /// DCR
    Dec(Operand),
    /// INX
    Inc16(RegisterPair),
    /// DCX
    Dec16(RegisterPair),
    /// DAD. Adds the pair into HL.
    Add16(RegisterPair),
    /// DAA
    DecimalAdjust,
    /// CMA
    Complement,
}

impl ArithmeticOp {
    /// The assembler spelling. The accumulator group changes name when given an immediate.
    pub const fn mnemonic(&self) -> &'static str {
        use Source::Immediate as I;
        match self {
            ArithmeticOp::Add(I(_)) => "ADI",
            ArithmeticOp::Add(_) => "ADD",
            ArithmeticOp::Adc(I(_)) => "ACI",
            ArithmeticOp::Adc(_) => "ADC",
            ArithmeticOp::Sub(I(_)) => "SUI",
            ArithmeticOp::Sub(_) => "SUB",
            ArithmeticOp::Sbb(I(_)) => "SBI",
            ArithmeticOp::Sbb(_) => "SBB",
            ArithmeticOp::And(I(_)) => "ANI",
            ArithmeticOp::And(_) => "ANA",
            ArithmeticOp::Xor(I(_)) => "XRI",
            ArithmeticOp::Xor(_) => "XRA",
            ArithmeticOp::Or(I(_)) => "ORI",
            ArithmeticOp::Or(_) => "ORA",
            ArithmeticOp::Compare(I(_)) => "CPI",
            ArithmeticOp::Compare(_) => "CMP",
            ArithmeticOp::Inc(_) => "INR",
            ArithmeticOp::Dec(_) => "DCR",
            ArithmeticOp::Inc16(_) => "INX",
            ArithmeticOp::Dec16(_) => "DCX",
            ArithmeticOp::Add16(_) => "DAD",
            ArithmeticOp::DecimalAdjust => "DAA",
            ArithmeticOp::Complement => "CMA",
        }
    }

    /// Returns the accumulator operand, if this is one of the accumulator group.
    pub const fn source(&self) -> Option<Source> {
        match self {
            ArithmeticOp::Add(src)
            | ArithmeticOp::Adc(src)
            | ArithmeticOp::Sub(src)
            | ArithmeticOp::Sbb(src)
            | ArithmeticOp::And(src)
            | ArithmeticOp::Xor(src)
            | ArithmeticOp::Or(src)
            | ArithmeticOp::Compare(src) => Some(*src),
            _ => None,
        }
    }

    /// Returns the number of clock cycles this instruction takes.
    pub fn cycles(&self) -> u32 {
        match self {
            ArithmeticOp::Inc(Operand::Memory) | ArithmeticOp::Dec(Operand::Memory) => 10,
            ArithmeticOp::Inc(_) | ArithmeticOp::Dec(_) => 5,
            ArithmeticOp::Inc16(_) | ArithmeticOp::Dec16(_) => 5,
            ArithmeticOp::Add16(_) => 10,
            ArithmeticOp::DecimalAdjust | ArithmeticOp::Complement => 4,
            op => match op.source() {
                Some(Source::Operand(Operand::Reg(_))) => 4,
                _ => 7,
            },
        }
    }

    /// Returns the number of bytes used to encode this instruction.
    pub const fn size(&self) -> u8 {
        match self.source() {
            Some(Source::Immediate(_)) => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for ArithmeticOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.mnemonic();
        match self {
            ArithmeticOp::Inc(reg) | ArithmeticOp::Dec(reg) => write!(f, "{name} {reg}"),
            ArithmeticOp::Inc16(pair) | ArithmeticOp::Dec16(pair) | ArithmeticOp::Add16(pair) => {
                write!(f, "{name} {pair}")
            }
            ArithmeticOp::DecimalAdjust | ArithmeticOp::Complement => write!(f, "{name}"),
            op => match op.source() {
                Some(src) => write!(f, "{name} {src}"),
                None => write!(f, "{name}"),
            },
        }
    }
}

/// The accumulator rotates. RLC/RRC wrap the outgoing bit around while RAL/RAR rotate through
/// the carry flag.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
pub enum RotateOp {
    /// Opcode: 0x07
    #[display("RLC")]
    Rlc,
    /// Opcode: 0x0F
    #[display("RRC")]
    Rrc,
    /// Opcode: 0x17
    #[display("RAL")]
    Ral,
    /// Opcode: 0x1F
    #[display("RAR")]
    Rar,
}
