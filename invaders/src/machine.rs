//! The arcade board around the CPU: 16K of memory with the video RAM at the top, three input
//! latches, a hardware barrel shifter on the I/O bus, and a video circuit that interrupts the CPU
//! twice per frame (once when the beam reaches the middle of the screen and once at vblank).

use serde::{Deserialize, Serialize};
use tracing::{debug, info_span, trace, warn};

use crate::config::MachineConfig;
use crate::cpu::Cpu;
use crate::error::CpuError;
use crate::instruction::Restart;

/// The size of the board's memory. The first 8K is ROM, though nothing enforces that.
pub const MEMORY_SIZE: usize = 0x4000;
/// The start of video RAM.
pub const FRAMEBUFFER_START: usize = 0x2400;
/// The size of video RAM: 224 columns of 256 pixels, one bit per pixel.
pub const FRAMEBUFFER_LEN: usize = 0x1C00;
pub const SCREEN_WIDTH: usize = 224;
pub const SCREEN_HEIGHT: usize = 256;

/// The number of input latches, mapped to ports 0 through 2.
pub const INPUT_PORTS: usize = 3;
/// Reading this port returns a window of the shift register.
pub const SHIFT_RESULT_PORT: u8 = 3;
/// Writing this port sets the shift amount.
pub const SHIFT_AMOUNT_PORT: u8 = 2;
/// Writing this port shifts a new byte into the shift register.
pub const SHIFT_DATA_PORT: u8 = 4;

/// Raised when the beam reaches the middle of the screen.
pub const MID_FRAME_INTERRUPT: Restart = Restart::Rst1;
/// Raised at vblank.
pub const END_OF_FRAME_INTERRUPT: Restart = Restart::Rst2;

/// The cabinet's controls. Pressing a button sets its bit in an input latch; releasing it clears
/// the bit.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display, Serialize, Deserialize)]
pub enum Button {
    Coin,
    Start1P,
    Start2P,
    Fire1P,
    Left1P,
    Right1P,
    Fire2P,
    Left2P,
    Right2P,
    Tilt,
}

impl Button {
    /// The input port whose latch holds this button.
    pub const fn port(&self) -> u8 {
        match self {
            Button::Coin
            | Button::Start1P
            | Button::Start2P
            | Button::Fire1P
            | Button::Left1P
            | Button::Right1P => 1,
            Button::Fire2P | Button::Left2P | Button::Right2P | Button::Tilt => 2,
        }
    }

    /// The bit within the latch.
    pub const fn mask(&self) -> u8 {
        match self {
            Button::Coin => 0x01,
            Button::Start2P => 0x02,
            Button::Start1P | Button::Tilt => 0x04,
            Button::Fire1P | Button::Fire2P => 0x10,
            Button::Left1P | Button::Left2P => 0x20,
            Button::Right1P | Button::Right2P => 0x40,
        }
    }
}

/// The external 16-bit shift register. Bytes are shifted in from the top, and the CPU reads back
/// an 8-bit window whose position is set by the shift amount.
#[derive(Debug, Default, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftRegister {
    value: u16,
    amount: u8,
}

impl ShiftRegister {
    pub fn value(&self) -> u16 {
        self.value
    }

    pub fn amount(&self) -> u8 {
        self.amount
    }

    /// The new byte becomes the high byte. The old high byte moves to the low byte and the old low
    /// byte is lost.
    pub fn shift_in(&mut self, byte: u8) {
        self.value = (self.value >> 8) | ((byte as u16) << 8);
    }

    /// Only the low three bits are used.
    pub fn set_amount(&mut self, amount: u8) {
        self.amount = amount & 0x07;
    }

    /// The result read during the first half of a frame.
    pub fn read_upper(&self) -> u8 {
        (self.value >> (8 - self.amount)) as u8
    }

    /// The result read during the second half of a frame.
    pub fn read_lower(&self) -> u8 {
        (((self.value as u32) << self.amount) >> 8) as u8
    }
}

/// The two halves of a frame. Each one ends in its own interrupt and reads the shift register
/// differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Upper,
    Lower,
}

impl Phase {
    fn shift_result(&self, shift: &ShiftRegister) -> u8 {
        match self {
            Phase::Upper => shift.read_upper(),
            Phase::Lower => shift.read_lower(),
        }
    }

    fn interrupt(&self) -> Restart {
        match self {
            Phase::Upper => MID_FRAME_INTERRUPT,
            Phase::Lower => END_OF_FRAME_INTERRUPT,
        }
    }
}

/// A summary of one call to [`Machine::step_frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameReport {
    /// The cycles executed. The last instruction of each half can carry this a few cycles past
    /// the frame budget; the excess is not carried over into the next frame.
    pub cycles: u32,
    /// The interrupts raised, in order, and whether the CPU accepted each one.
    pub interrupts: [(Restart, bool); 2],
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Machine {
    cpu: Cpu,
    shift: ShiftRegister,
    inputs: [u8; INPUT_PORTS],
    config: MachineConfig,
    /// The number of frames completed.
    frames: u64,
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

impl Machine {
    pub fn new() -> Self {
        Self::with_config(MachineConfig::default())
    }

    pub fn with_config(config: MachineConfig) -> Self {
        Self {
            cpu: Cpu::new(MEMORY_SIZE),
            shift: ShiftRegister::default(),
            inputs: config.dip_switches,
            config,
            frames: 0,
        }
    }

    /// Copies a ROM image into memory. This is a thin wrapper around [`Cpu::load`].
    pub fn load(&mut self, offset: usize, rom: &[u8]) -> Result<(), CpuError> {
        self.cpu.load(offset, rom)
    }

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Cpu {
        &mut self.cpu
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    pub fn shift_register(&self) -> &ShiftRegister {
        &self.shift
    }

    /// The current state of the input latches.
    pub fn inputs(&self) -> [u8; INPUT_PORTS] {
        self.inputs
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Presses or releases a button. The change is seen by the CPU starting with its next
    /// instruction.
    pub fn set_button(&mut self, button: Button, pressed: bool) {
        let latch = &mut self.inputs[button.port() as usize];
        if pressed {
            *latch |= button.mask();
        } else {
            *latch &= !button.mask();
        }
        trace!("{button} {}", if pressed { "pressed" } else { "released" });
    }

    /// Video RAM, for the display to read after a frame. Each byte holds eight vertically
    /// adjacent pixels, least significant bit lowest on the screen.
    pub fn framebuffer(&self) -> &[u8] {
        self.cpu
            .memory()
            .get(FRAMEBUFFER_START..FRAMEBUFFER_START + FRAMEBUFFER_LEN)
            .unwrap_or(&[])
    }

    /// Runs the CPU for one frame's worth of cycles, raising the mid-frame interrupt halfway
    /// through and the end-of-frame interrupt at the end.
    pub fn step_frame(&mut self) -> Result<FrameReport, CpuError> {
        let span = info_span!("frame", n = self.frames);
        let _guard = span.enter();
        let budget = self.config.cycles_per_frame();
        let mut interrupts = [(MID_FRAME_INTERRUPT, false), (END_OF_FRAME_INTERRUPT, false)];
        let mut cycles = 0;
        let phases = [(Phase::Upper, budget / 2), (Phase::Lower, budget)];
        for (report, (phase, target)) in interrupts.iter_mut().zip(phases) {
            cycles = self.run_until(phase, cycles, target)?;
            let rst = phase.interrupt();
            *report = (rst, self.cpu.interrupt(rst)? != 0);
        }
        self.frames += 1;
        debug!("frame complete after {cycles} cycles");
        Ok(FrameReport { cycles, interrupts })
    }

    /// Steps the CPU until `cycles` reaches `target`, servicing the I/O ports around each step.
    /// Returns the new cycle count.
    fn run_until(&mut self, phase: Phase, mut cycles: u32, target: u32) -> Result<u32, CpuError> {
        while cycles < target {
            self.poll(phase);
            let step = self.cpu.step()?;
            if step.is_halted() {
                warn!(
                    "CPU halted at 0x{:0>4X}, idling until {}",
                    self.cpu.pc,
                    phase.interrupt()
                );
                return Ok(target);
            }
            cycles = cycles.saturating_add(step.cycles);
            if let Some(port) = step.output_port {
                self.handle_output(port);
            }
        }
        Ok(cycles)
    }

    /// Presents the input latches and the shift register result to the CPU.
    fn poll(&mut self, phase: Phase) {
        for (port, latch) in self.inputs.into_iter().enumerate() {
            self.cpu.set_port(port as u8, latch);
        }
        self.cpu
            .set_port(SHIFT_RESULT_PORT, phase.shift_result(&self.shift));
    }

    /// Reacts to an OUT. The port cell is cleared once its value has been consumed, whether or
    /// not a device listens on it.
    fn handle_output(&mut self, port: u8) {
        let val = self.cpu.port(port);
        match port {
            SHIFT_AMOUNT_PORT => {
                self.shift.set_amount(val);
                debug!("shift amount set to {}", self.shift.amount());
            }
            SHIFT_DATA_PORT => {
                self.shift.shift_in(val);
                debug!("shift register now 0x{:0>4X}", self.shift.value());
            }
            _ => trace!("unhandled write of 0x{val:0>2X} to port {port}"),
        }
        self.cpu.set_port(port, 0);
    }
}
