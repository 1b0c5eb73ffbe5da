use crate::instruction::*;

/// Decodes the instruction whose op code is `bytes[0]`. The remaining two bytes are the operand
/// window; instructions shorter than three bytes ignore what they do not need.
pub fn parse_instruction(bytes: [u8; 3]) -> Instruction {
    let [op, lo, hi] = bytes;
    let word = u16::from_le_bytes([lo, hi]);
    // Bits 5..3 name the destination (or condition, or restart) and bits 2..0 name the source.
    let dest = Operand::from_bits(op >> 3);
    let src = Operand::from_bits(op);
    let pair = RegisterPair::from_bits(op >> 4);
    let cond = Condition::from_bits(op >> 3);
    match op {
        // The undocumented op codes all behave as NOP.
        0x00 | 0x08 | 0x10 | 0x18 | 0x20 | 0x28 | 0x30 | 0x38 => ControlOp::Noop.into(),
        0xCB | 0xD9 | 0xDD | 0xED | 0xFD => ControlOp::Noop.into(),

        // Block 0
        0x01 | 0x11 | 0x21 | 0x31 => LoadOp::Immediate16(pair, word).into(),
        0x02 | 0x12 => LoadOp::StoreIndirect(pair).into(),
        0x0A | 0x1A => LoadOp::LoadIndirect(pair).into(),
        0x22 => LoadOp::StoreHL(word).into(),
        0x2A => LoadOp::LoadHL(word).into(),
        0x32 => LoadOp::StoreA(word).into(),
        0x3A => LoadOp::LoadA(word).into(),
        0x03 | 0x13 | 0x23 | 0x33 => ArithmeticOp::Inc16(pair).into(),
        0x0B | 0x1B | 0x2B | 0x3B => ArithmeticOp::Dec16(pair).into(),
        0x09 | 0x19 | 0x29 | 0x39 => ArithmeticOp::Add16(pair).into(),
        0x04 | 0x0C | 0x14 | 0x1C | 0x24 | 0x2C | 0x34 | 0x3C => ArithmeticOp::Inc(dest).into(),
        0x05 | 0x0D | 0x15 | 0x1D | 0x25 | 0x2D | 0x35 | 0x3D => ArithmeticOp::Dec(dest).into(),
        0x06 | 0x0E | 0x16 | 0x1E | 0x26 | 0x2E | 0x36 | 0x3E => {
            LoadOp::Immediate(dest, lo).into()
        }
        0x07 => RotateOp::Rlc.into(),
        0x0F => RotateOp::Rrc.into(),
        0x17 => RotateOp::Ral.into(),
        0x1F => RotateOp::Rar.into(),
        0x27 => ArithmeticOp::DecimalAdjust.into(),
        0x2F => ArithmeticOp::Complement.into(),
        0x37 => ControlOp::SetCarry.into(),
        0x3F => ControlOp::ComplementCarry.into(),

        // Block 1
        0x76 => ControlOp::Halt.into(),
        0x40..=0x7F => LoadOp::Move { dest, src }.into(),

        // Block 2
        0x80..=0xBF => {
            let src = Source::Operand(src);
            alu_op(op >> 3, src).into()
        }

        // Block 3
        0xC6 | 0xCE | 0xD6 | 0xDE | 0xE6 | 0xEE | 0xF6 | 0xFE => {
            alu_op(op >> 3, Source::Immediate(lo)).into()
        }
        0xC0 | 0xC8 | 0xD0 | 0xD8 | 0xE0 | 0xE8 | 0xF0 | 0xF8 => {
            JumpOp::ConditionalReturn(cond).into()
        }
        0xC2 | 0xCA | 0xD2 | 0xDA | 0xE2 | 0xEA | 0xF2 | 0xFA => {
            JumpOp::ConditionalAbsolute(cond, word).into()
        }
        0xC4 | 0xCC | 0xD4 | 0xDC | 0xE4 | 0xEC | 0xF4 | 0xFC => {
            JumpOp::ConditionalCall(cond, word).into()
        }
        0xC1 | 0xD1 | 0xE1 | 0xF1 => LoadOp::Pop(StackPair::from_bits(op >> 4)).into(),
        0xC5 | 0xD5 | 0xE5 | 0xF5 => LoadOp::Push(StackPair::from_bits(op >> 4)).into(),
        0xC3 => JumpOp::Absolute(word).into(),
        0xC9 => JumpOp::Return.into(),
        0xCD => JumpOp::Call(word).into(),
        0xC7 | 0xCF | 0xD7 | 0xDF | 0xE7 | 0xEF | 0xF7 | 0xFF => {
            JumpOp::Restart(Restart::from_bits(op >> 3)).into()
        }
        0xD3 => Instruction::Output(lo),
        0xDB => Instruction::Input(lo),
        0xE3 => LoadOp::ExchangeStack.into(),
        0xE9 => JumpOp::JumpToHL.into(),
        0xEB => LoadOp::Exchange.into(),
        0xF3 => ControlOp::DisableInterrupts.into(),
        0xF9 => LoadOp::HLIntoSP.into(),
        0xFB => ControlOp::EnableInterrupts.into(),
    }
}

/// Decodes the 3-bit operation field shared by the register and immediate accumulator groups.
const fn alu_op(bits: u8, src: Source) -> ArithmeticOp {
    match bits & 0x07 {
        0 => ArithmeticOp::Add(src),
        1 => ArithmeticOp::Adc(src),
        2 => ArithmeticOp::Sub(src),
        3 => ArithmeticOp::Sbb(src),
        4 => ArithmeticOp::And(src),
        5 => ArithmeticOp::Xor(src),
        6 => ArithmeticOp::Or(src),
        _ => ArithmeticOp::Compare(src),
    }
}
