use std::ops::Index;
use std::ops::IndexMut;

use serde::Deserialize;
use serde::Serialize;
use serde_with::serde_as;
use tracing::debug;

use crate::error::CpuError;
use crate::instruction::HalfRegister;
use crate::instruction::Operand;
use crate::instruction::RegisterPair;
use crate::instruction::Restart;
use crate::instruction::StackPair;

pub mod alu;
mod execute;

pub use execute::Step;

#[cfg(test)]
mod cpu_tests;

/// The number of I/O ports addressable by IN and OUT.
pub const PORT_COUNT: usize = 256;

/// The complete processor state: the register file, flags, stack pointer and program counter,
/// the interrupt enable latch, the memory buffer, and the I/O port cells.
///
/// The CPU owns its memory. Its size is chosen at construction and never changes. Every access
/// is bounds-checked against it.
#[serde_as]
#[derive(Debug, Hash, Clone, PartialEq, Eq, derive_more::Display, Serialize, Deserialize)]
#[display(
    "CPU {{ A=0x{:0>2X} B=0x{:0>2X} C=0x{:0>2X} D=0x{:0>2X} E=0x{:0>2X} H=0x{:0>2X} L=0x{:0>2X} SP=0x{:0>4X} PC=0x{:0>4X} {} IE={} }}",
    a,
    b,
    c,
    d,
    e,
    h,
    l,
    sp,
    pc,
    flags,
    interrupt_enable
)]
pub struct Cpu {
    /// The accumulator
    pub a: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
    pub flags: Flags,
    /// The SP register
    pub sp: u16,
    /// The PC register
    pub pc: u16,
    /// Set by EI and cleared by DI. While clear, interrupts are ignored.
    pub interrupt_enable: bool,
    #[serde_as(as = "serde_with::Bytes")]
    memory: Vec<u8>,
    #[serde_as(as = "serde_with::Bytes")]
    ports: [u8; PORT_COUNT],
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Hash, derive_more::Display, Serialize, Deserialize,
)]
#[display(
    "Flags(S={} Z={} AC={} P={} CY={})",
    *sign as u8,
    *zero as u8,
    *aux_carry as u8,
    *parity as u8,
    *carry as u8
)]
pub struct Flags {
    /// Set when the low byte of a result is zero
    pub zero: bool,
    /// Bit 7 of the result
    pub sign: bool,
    /// Set when the result has an even number of set bits
    pub parity: bool,
    /// The carry (or borrow, after a subtraction) out of bit 7
    pub carry: bool,
    /// The carry out of bit 3
    pub aux_carry: bool,
}

impl From<u8> for Flags {
    fn from(value: u8) -> Self {
        Self {
            sign: check_bit_const::<7>(value),
            zero: check_bit_const::<6>(value),
            aux_carry: check_bit_const::<4>(value),
            parity: check_bit_const::<2>(value),
            carry: check_bit_const::<0>(value),
        }
    }
}

impl Flags {
    /// Packs the flags into the byte pushed by `PUSH PSW`. Bits 5 and 3 are always clear and bit
    /// 1 is always set.
    pub fn as_byte(&self) -> u8 {
        bool_to_mask::<7>(self.sign)
            | bool_to_mask::<6>(self.zero)
            | bool_to_mask::<4>(self.aux_carry)
            | bool_to_mask::<2>(self.parity)
            | bool_to_mask::<1>(true)
            | bool_to_mask::<0>(self.carry)
    }
}

const fn bit_select<const B: u8>() -> u8 {
    const {
        match B {
            n @ 0..=7 => 0x1 << n,
            _ => panic!("You must select between the 0th and 7th bit!"),
        }
    }
}

const fn bool_to_mask<const B: u8>(val: bool) -> u8 {
    (val as u8) << B
}

pub const fn check_bit_const<const B: u8>(src: u8) -> bool {
    (src & bit_select::<B>()) == bit_select::<B>()
}

impl Cpu {
    /// Constructs a new CPU with `memory_size` bytes of zeroed memory. Every register, flag and
    /// port starts at zero and interrupts start disabled.
    pub fn new(memory_size: usize) -> Self {
        Self {
            a: 0,
            b: 0,
            c: 0,
            d: 0,
            e: 0,
            h: 0,
            l: 0,
            flags: Flags::default(),
            sp: 0,
            pc: 0,
            interrupt_enable: false,
            memory: vec![0; memory_size],
            ports: [0; PORT_COUNT],
        }
    }

    /// Copies `bytes` into memory starting at `offset`. Nothing is written if they do not fit.
    pub fn load(&mut self, offset: usize, bytes: &[u8]) -> Result<(), CpuError> {
        let capacity = self.memory.len();
        let dest = offset
            .checked_add(bytes.len())
            .filter(|end| *end <= capacity)
            .map(|end| &mut self.memory[offset..end])
            .ok_or(CpuError::OversizedLoad {
                offset,
                len: bytes.len(),
                capacity,
            })?;
        dest.copy_from_slice(bytes);
        Ok(())
    }

    pub fn memory(&self) -> &[u8] {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut [u8] {
        &mut self.memory
    }

    pub fn memory_size(&self) -> usize {
        self.memory.len()
    }

    pub fn ports(&self) -> &[u8; PORT_COUNT] {
        &self.ports
    }

    pub fn port(&self, port: u8) -> u8 {
        self.ports[port as usize]
    }

    pub fn set_port(&mut self, port: u8, val: u8) {
        self.ports[port as usize] = val;
    }

    fn check_address(&self, addr: u16) -> Result<usize, CpuError> {
        let index = addr as usize;
        if index < self.memory.len() {
            Ok(index)
        } else {
            Err(CpuError::InvalidAddress { addr, pc: self.pc })
        }
    }

    /// Reads a byte of memory. Fails if the address is past the end of memory.
    pub fn read_byte(&self, addr: u16) -> Result<u8, CpuError> {
        self.check_address(addr).map(|i| self.memory[i])
    }

    /// Writes a byte of memory. Fails without writing if the address is past the end of memory.
    pub fn write_byte(&mut self, addr: u16, val: u8) -> Result<(), CpuError> {
        let index = self.check_address(addr)?;
        self.memory[index] = val;
        Ok(())
    }

    /// Checks that both bytes of a little-endian word fit in memory.
    fn check_word(&self, addr: u16) -> Result<usize, CpuError> {
        let index = self.check_address(addr)?;
        if index + 1 < self.memory.len() {
            Ok(index)
        } else {
            Err(CpuError::InvalidAddress {
                addr: addr.wrapping_add(1),
                pc: self.pc,
            })
        }
    }

    pub fn read_word(&self, addr: u16) -> Result<u16, CpuError> {
        let index = self.check_word(addr)?;
        Ok(u16::from_le_bytes([
            self.memory[index],
            self.memory[index + 1],
        ]))
    }

    pub fn write_word(&mut self, addr: u16, val: u16) -> Result<(), CpuError> {
        let index = self.check_word(addr)?;
        self.memory[index..index + 2].copy_from_slice(&val.to_le_bytes());
        Ok(())
    }

    /// Reads the opcode at PC along with the two bytes that follow it. Operand bytes that would
    /// fall past the end of memory read as zero.
    pub(crate) fn fetch(&self) -> Result<[u8; 3], CpuError> {
        let start = self.check_address(self.pc)?;
        let mut window = [0; 3];
        for (dest, src) in window.iter_mut().zip(&self.memory[start..]) {
            *dest = *src;
        }
        Ok(window)
    }

    /// Returns the value of one of the 3-bit operands, which is either a register or the byte
    /// in memory that HL points to.
    pub fn read_operand(&self, operand: Operand) -> Result<u8, CpuError> {
        match operand {
            Operand::Reg(reg) => Ok(self[reg]),
            Operand::Memory => self.read_byte(self.hl()),
        }
    }

    pub fn write_operand(&mut self, operand: Operand, val: u8) -> Result<(), CpuError> {
        match operand {
            Operand::Reg(reg) => {
                self[reg] = val;
                Ok(())
            }
            Operand::Memory => self.write_byte(self.hl(), val),
        }
    }

    pub fn bc(&self) -> u16 {
        u16::from_be_bytes([self.b, self.c])
    }

    pub fn de(&self) -> u16 {
        u16::from_be_bytes([self.d, self.e])
    }

    pub fn hl(&self) -> u16 {
        u16::from_be_bytes([self.h, self.l])
    }

    /// The accumulator and the packed flag byte, as pushed by `PUSH PSW`.
    pub fn psw(&self) -> u16 {
        u16::from_be_bytes([self.a, self.flags.as_byte()])
    }

    pub fn set_bc(&mut self, val: u16) {
        [self.b, self.c] = val.to_be_bytes();
    }

    pub fn set_de(&mut self, val: u16) {
        [self.d, self.e] = val.to_be_bytes();
    }

    pub fn set_hl(&mut self, val: u16) {
        [self.h, self.l] = val.to_be_bytes();
    }

    fn set_psw(&mut self, val: u16) {
        let [a, f] = val.to_be_bytes();
        self.a = a;
        self.flags = f.into();
    }

    pub fn read_pair(&self, pair: RegisterPair) -> u16 {
        match pair {
            RegisterPair::BC => self.bc(),
            RegisterPair::DE => self.de(),
            RegisterPair::HL => self.hl(),
            RegisterPair::SP => self.sp,
        }
    }

    pub fn write_pair(&mut self, pair: RegisterPair, val: u16) {
        match pair {
            RegisterPair::BC => self.set_bc(val),
            RegisterPair::DE => self.set_de(val),
            RegisterPair::HL => self.set_hl(val),
            RegisterPair::SP => self.sp = val,
        }
    }

    pub fn read_stack_pair(&self, pair: StackPair) -> u16 {
        match pair {
            StackPair::BC => self.bc(),
            StackPair::DE => self.de(),
            StackPair::HL => self.hl(),
            StackPair::PSW => self.psw(),
        }
    }

    pub fn write_stack_pair(&mut self, pair: StackPair, val: u16) {
        match pair {
            StackPair::BC => self.set_bc(val),
            StackPair::DE => self.set_de(val),
            StackPair::HL => self.set_hl(val),
            StackPair::PSW => self.set_psw(val),
        }
    }

    /// Pushes a word onto the stack, low byte at the new SP and high byte above it. Fails without
    /// writing if there is no room below SP or if SP is already past the end of memory.
    pub fn push_word(&mut self, val: u16) -> Result<(), CpuError> {
        if self.sp < 2 {
            return Err(CpuError::StackOverflow {
                sp: self.sp,
                pc: self.pc,
            });
        }
        let sp = self.sp - 2;
        self.write_word(sp, val)?;
        self.sp = sp;
        Ok(())
    }

    /// Returns the word on top of the stack without moving SP.
    pub fn peek_word(&self) -> Result<u16, CpuError> {
        if self.sp as usize + 2 > self.memory.len() {
            return Err(CpuError::StackUnderflow {
                sp: self.sp,
                pc: self.pc,
            });
        }
        self.read_word(self.sp)
    }

    pub fn pop_word(&mut self) -> Result<u16, CpuError> {
        let val = self.peek_word()?;
        self.sp = self.sp.wrapping_add(2);
        Ok(val)
    }

    /// Checks that `target` is somewhere the PC can legally go.
    pub fn check_jump(&self, target: u16) -> Result<u16, CpuError> {
        if (target as usize) < self.memory.len() {
            Ok(target)
        } else {
            Err(CpuError::InvalidJumpTarget {
                target,
                pc: self.pc,
            })
        }
    }

    /// Pushes the PC and jumps to `target`, as CALL and RST do. `ret` is the address pushed.
    pub(crate) fn call(&mut self, ret: u16, target: u16) -> Result<(), CpuError> {
        let target = self.check_jump(target)?;
        self.push_word(ret)?;
        self.pc = target;
        Ok(())
    }

    /// Pops the return address into the PC.
    pub(crate) fn ret(&mut self) -> Result<(), CpuError> {
        let target = self.check_jump(self.peek_word()?)?;
        self.sp = self.sp.wrapping_add(2);
        self.pc = target;
        Ok(())
    }

    /// Raises an external interrupt that jams `rst` onto the data bus. If interrupts are enabled,
    /// the current PC is pushed and the PC moves to the restart vector. Returns the number of
    /// cycles taken, which is zero when the interrupt was ignored.
    ///
    /// Accepting an interrupt does not clear the interrupt enable latch. Guest interrupt handlers
    /// are expected to manage it with DI and EI themselves.
    pub fn interrupt(&mut self, rst: Restart) -> Result<u32, CpuError> {
        if !self.interrupt_enable {
            debug!("{rst} ignored, interrupts disabled (PC=0x{:0>4X})", self.pc);
            return Ok(0);
        }
        debug!("{rst} accepted (PC=0x{:0>4X})", self.pc);
        self.call(self.pc, rst.vector())?;
        Ok(Restart::CYCLES)
    }
}

impl Index<HalfRegister> for Cpu {
    type Output = u8;

    fn index(&self, index: HalfRegister) -> &Self::Output {
        match index {
            HalfRegister::A => &self.a,
            HalfRegister::B => &self.b,
            HalfRegister::C => &self.c,
            HalfRegister::D => &self.d,
            HalfRegister::E => &self.e,
            HalfRegister::H => &self.h,
            HalfRegister::L => &self.l,
        }
    }
}

impl IndexMut<HalfRegister> for Cpu {
    fn index_mut(&mut self, index: HalfRegister) -> &mut Self::Output {
        match index {
            HalfRegister::A => &mut self.a,
            HalfRegister::B => &mut self.b,
            HalfRegister::C => &mut self.c,
            HalfRegister::D => &mut self.d,
            HalfRegister::E => &mut self.e,
            HalfRegister::H => &mut self.h,
            HalfRegister::L => &mut self.l,
        }
    }
}
