//! The arithmetic and flag unit. Every function here is pure: it takes the operands and the
//! current flags, and returns the result while updating the flags in place. Nothing here touches
//! memory or the rest of the register file.
//!
//! The 8-bit operations are carried out in 16 bits so that the carry out of bit 7 is visible in
//! the intermediate result.

use crate::instruction::RotateOp;

use super::Flags;

/// Returns true when `val` has an even number of set bits.
pub const fn parity(val: u8) -> bool {
    val.count_ones() % 2 == 0
}

/// Sets zero, sign, parity and carry from a (possibly overflowing) 8-bit result. The auxiliary
/// carry is left to the caller since it depends on the operands rather than the result.
pub(crate) fn set_result_flags(res: u16, flags: &mut Flags) {
    let byte = res as u8;
    flags.zero = byte == 0;
    flags.sign = byte & 0x80 != 0;
    flags.parity = parity(byte);
    flags.carry = res > 0xFF;
}

fn add_with_carry_in(acc: u8, op: u8, carry_in: bool, flags: &mut Flags) -> u8 {
    let res = acc as u16 + op as u16 + carry_in as u16;
    flags.aux_carry = (acc & 0x0F) + (op & 0x0F) + carry_in as u8 > 0x0F;
    set_result_flags(res, flags);
    res as u8
}

/// ADD and ADC (with `carry_in` set to the current carry).
pub fn addition(acc: u8, op: u8, carry_in: bool, flags: &mut Flags) -> u8 {
    add_with_carry_in(acc, op, carry_in, flags)
}

/// SUB and SBB (with `borrow_in` set to the current carry). The operand is complemented and
/// added along with the inverted borrow, then the carry is flipped so that it reports a borrow.
/// The auxiliary carry is left as the addition produced it.
pub fn subtraction(acc: u8, op: u8, borrow_in: bool, flags: &mut Flags) -> u8 {
    let val = add_with_carry_in(acc, !op, !borrow_in, flags);
    flags.carry = !flags.carry;
    val
}

/// CMP. Computes the flags of `acc - op` without producing a value.
pub fn compare(acc: u8, op: u8, flags: &mut Flags) {
    subtraction(acc, op, false, flags);
}

/// ANA. The auxiliary carry is the OR of bit 3 of both operands.
pub fn and(acc: u8, op: u8, flags: &mut Flags) -> u8 {
    let val = acc & op;
    set_result_flags(val as u16, flags);
    flags.aux_carry = (acc | op) & 0x08 != 0;
    val
}

pub fn xor(acc: u8, op: u8, flags: &mut Flags) -> u8 {
    let val = acc ^ op;
    set_result_flags(val as u16, flags);
    flags.aux_carry = false;
    val
}

pub fn or(acc: u8, op: u8, flags: &mut Flags) -> u8 {
    let val = acc | op;
    set_result_flags(val as u16, flags);
    flags.aux_carry = false;
    val
}

/// INR. The carry is preserved.
pub fn increment(val: u8, flags: &mut Flags) -> u8 {
    let carry = flags.carry;
    flags.aux_carry = val & 0x0F == 0x0F;
    let val = val.wrapping_add(1);
    set_result_flags(val as u16, flags);
    flags.carry = carry;
    val
}

/// DCR. The carry is preserved.
pub fn decrement(val: u8, flags: &mut Flags) -> u8 {
    let carry = flags.carry;
    flags.aux_carry = val & 0x0F != 0x00;
    let val = val.wrapping_sub(1);
    set_result_flags(val as u16, flags);
    flags.carry = carry;
    val
}

/// DAA. Two independent nibble corrections. The low correction decides the auxiliary carry; the
/// high correction can only set the carry, never clear it.
pub fn decimal_adjust(acc: u8, flags: &mut Flags) -> u8 {
    let mut val = acc as u16;
    let mut carry = flags.carry;
    if val & 0x0F > 0x09 || flags.aux_carry {
        flags.aux_carry = val & 0x0F > 0x09;
        val += 0x06;
    }
    if val >= 0xA0 || flags.carry {
        val += 0x60;
        carry = true;
    }
    set_result_flags(val, flags);
    flags.carry = carry;
    val as u8
}

/// The accumulator rotates. Only the carry is affected.
pub fn rotate(op: RotateOp, acc: u8, flags: &mut Flags) -> u8 {
    match op {
        RotateOp::Rlc => {
            flags.carry = acc & 0x80 != 0;
            acc.rotate_left(1)
        }
        RotateOp::Rrc => {
            flags.carry = acc & 0x01 != 0;
            acc.rotate_right(1)
        }
        RotateOp::Ral => {
            let carry = flags.carry;
            flags.carry = acc & 0x80 != 0;
            (acc << 1) | carry as u8
        }
        RotateOp::Rar => {
            let carry = flags.carry;
            flags.carry = acc & 0x01 != 0;
            (acc >> 1) | ((carry as u8) << 7)
        }
    }
}

/// DAD. Only the carry is affected, and only by a carry out of bit 15.
pub fn wide_addition(hl: u16, op: u16, flags: &mut Flags) -> u16 {
    let (val, carry) = hl.overflowing_add(op);
    flags.carry = carry;
    val
}
