use tracing::error;
use tracing::trace;

use crate::error::CpuError;
use crate::instruction::ArithmeticOp;
use crate::instruction::ControlOp;
use crate::instruction::Instruction;
use crate::instruction::JumpOp;
use crate::instruction::LoadOp;
use crate::instruction::RegisterPair;
use crate::instruction::Source;
use crate::lookup::parse_instruction;

use super::alu;
use super::Cpu;

/// The outcome of executing a single instruction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Step {
    /// How far the PC was advanced. Zero for instructions that set the PC themselves (taken
    /// jumps, calls, returns, RST, PCHL) and for HLT.
    pub bytes: u8,
    /// The clock cycles the instruction took.
    pub cycles: u32,
    /// The port written, if the instruction was an OUT.
    pub output_port: Option<u8>,
}

impl Step {
    /// Returns true if this step was a halted CPU standing still.
    pub fn is_halted(&self) -> bool {
        self.bytes == 0 && self.cycles == 0
    }
}

impl Cpu {
    /// Decodes the instruction at the PC without executing it.
    pub fn read_op(&self) -> Result<Instruction, CpuError> {
        self.fetch().map(parse_instruction)
    }

    /// Fetches, decodes and executes one instruction. If an error is returned, the processor is
    /// exactly as it was before the call.
    pub fn step(&mut self) -> Result<Step, CpuError> {
        let instr = self.read_op().inspect_err(|e| error!("{e}: {self}"))?;
        trace!("0x{:0>4X}: {instr}", self.pc);
        self.execute(instr).inspect_err(|e| error!("{e} while executing {instr}: {self}"))
    }

    /// Executes an already decoded instruction as if it were located at the PC.
    pub fn execute(&mut self, instr: Instruction) -> Result<Step, CpuError> {
        // The cost of conditional calls and returns depends on the flags before execution.
        let cycles = instr.cycles(&self.flags);
        let mut output_port = None;
        let advance = match instr {
            Instruction::Load(op) => self.execute_load_op(op)?,
            Instruction::Arithmetic(op) => self.execute_arithmetic_op(op)?,
            Instruction::Rotate(op) => {
                self.a = alu::rotate(op, self.a, &mut self.flags);
                true
            }
            Instruction::Jump(op) => self.execute_jump_op(op)?,
            Instruction::Control(op) => self.execute_control_op(op),
            Instruction::Input(port) => {
                self.a = self.port(port);
                true
            }
            Instruction::Output(port) => {
                self.set_port(port, self.a);
                output_port = Some(port);
                true
            }
        };
        let bytes = if advance { instr.size() } else { 0 };
        self.pc = self.pc.wrapping_add(bytes as u16);
        Ok(Step {
            bytes,
            cycles,
            output_port,
        })
    }

    fn execute_load_op(&mut self, op: LoadOp) -> Result<bool, CpuError> {
        match op {
            LoadOp::Move { dest, src } => {
                let val = self.read_operand(src)?;
                self.write_operand(dest, val)?;
            }
            LoadOp::Immediate(dest, val) => self.write_operand(dest, val)?,
            LoadOp::Immediate16(pair, val) => self.write_pair(pair, val),
            LoadOp::StoreA(addr) => self.write_byte(addr, self.a)?,
            LoadOp::LoadA(addr) => self.a = self.read_byte(addr)?,
            LoadOp::StoreHL(addr) => self.write_word(addr, self.hl())?,
            LoadOp::LoadHL(addr) => {
                let val = self.read_word(addr)?;
                self.set_hl(val);
            }
            LoadOp::StoreIndirect(pair) => self.write_byte(self.read_pair(pair), self.a)?,
            LoadOp::LoadIndirect(pair) => self.a = self.read_byte(self.read_pair(pair))?,
            LoadOp::Exchange => {
                std::mem::swap(&mut self.h, &mut self.d);
                std::mem::swap(&mut self.l, &mut self.e);
            }
            LoadOp::ExchangeStack => {
                let top = self.peek_word()?;
                self.write_word(self.sp, self.hl())?;
                self.set_hl(top);
            }
            LoadOp::HLIntoSP => self.sp = self.hl(),
            LoadOp::Push(pair) => self.push_word(self.read_stack_pair(pair))?,
            LoadOp::Pop(pair) => {
                let val = self.pop_word()?;
                self.write_stack_pair(pair, val);
            }
        }
        Ok(true)
    }

    fn read_source(&self, src: Source) -> Result<u8, CpuError> {
        match src {
            Source::Operand(operand) => self.read_operand(operand),
            Source::Immediate(val) => Ok(val),
        }
    }

    fn execute_arithmetic_op(&mut self, op: ArithmeticOp) -> Result<bool, CpuError> {
        match op {
            ArithmeticOp::Add(src) => {
                let val = self.read_source(src)?;
                self.a = alu::addition(self.a, val, false, &mut self.flags);
            }
            ArithmeticOp::Adc(src) => {
                let val = self.read_source(src)?;
                self.a = alu::addition(self.a, val, self.flags.carry, &mut self.flags);
            }
            ArithmeticOp::Sub(src) => {
                let val = self.read_source(src)?;
                self.a = alu::subtraction(self.a, val, false, &mut self.flags);
            }
            ArithmeticOp::Sbb(src) => {
                let val = self.read_source(src)?;
                self.a = alu::subtraction(self.a, val, self.flags.carry, &mut self.flags);
            }
            ArithmeticOp::And(src) => {
                let val = self.read_source(src)?;
                self.a = alu::and(self.a, val, &mut self.flags);
            }
            ArithmeticOp::Xor(src) => {
                let val = self.read_source(src)?;
                self.a = alu::xor(self.a, val, &mut self.flags);
            }
            ArithmeticOp::Or(src) => {
                let val = self.read_source(src)?;
                self.a = alu::or(self.a, val, &mut self.flags);
            }
            ArithmeticOp::Compare(src) => {
                let val = self.read_source(src)?;
                alu::compare(self.a, val, &mut self.flags);
            }
            ArithmeticOp::Inc(operand) => {
                let mut flags = self.flags;
                let val = alu::increment(self.read_operand(operand)?, &mut flags);
                self.write_operand(operand, val)?;
                self.flags = flags;
            }
            ArithmeticOp::Dec(operand) => {
                let mut flags = self.flags;
                let val = alu::decrement(self.read_operand(operand)?, &mut flags);
                self.write_operand(operand, val)?;
                self.flags = flags;
            }
            ArithmeticOp::Inc16(pair) => {
                self.write_pair(pair, self.read_pair(pair).wrapping_add(1));
            }
            ArithmeticOp::Dec16(pair) => {
                self.write_pair(pair, self.read_pair(pair).wrapping_sub(1));
            }
            ArithmeticOp::Add16(pair) => {
                let val = alu::wide_addition(self.hl(), self.read_pair(pair), &mut self.flags);
                self.write_pair(RegisterPair::HL, val);
            }
            ArithmeticOp::DecimalAdjust => {
                self.a = alu::decimal_adjust(self.a, &mut self.flags);
            }
            ArithmeticOp::Complement => self.a = !self.a,
        }
        Ok(true)
    }

    /// Returns false if the PC was moved and should not be advanced.
    fn execute_jump_op(&mut self, op: JumpOp) -> Result<bool, CpuError> {
        let ret = self.pc.wrapping_add(op.size() as u16);
        match op {
            JumpOp::Absolute(target) => self.pc = self.check_jump(target)?,
            JumpOp::ConditionalAbsolute(cond, target) => {
                if !cond.passed(&self.flags) {
                    return Ok(true);
                }
                self.pc = self.check_jump(target)?;
            }
            JumpOp::Call(target) => self.call(ret, target)?,
            JumpOp::ConditionalCall(cond, target) => {
                if !cond.passed(&self.flags) {
                    return Ok(true);
                }
                self.call(ret, target)?;
            }
            JumpOp::Return => self.ret()?,
            JumpOp::ConditionalReturn(cond) => {
                if !cond.passed(&self.flags) {
                    return Ok(true);
                }
                self.ret()?;
            }
            JumpOp::Restart(rst) => self.call(ret, rst.vector())?,
            JumpOp::JumpToHL => self.pc = self.check_jump(self.hl())?,
        }
        Ok(false)
    }

    /// Returns false for HLT, which holds the PC in place.
    fn execute_control_op(&mut self, op: ControlOp) -> bool {
        match op {
            ControlOp::Noop => {}
            ControlOp::Halt => return false,
            ControlOp::EnableInterrupts => self.interrupt_enable = true,
            ControlOp::DisableInterrupts => self.interrupt_enable = false,
            ControlOp::SetCarry => self.flags.carry = true,
            ControlOp::ComplementCarry => self.flags.carry = !self.flags.carry,
        }
        true
    }
}
