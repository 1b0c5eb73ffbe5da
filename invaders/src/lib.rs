//! Invaders is the core of an emulator for Intel 8080 based arcade boards. It contains the CPU,
//! with cycle counts for every instruction, and the board that wraps it: the memory map, the input
//! latches, the external shift register, and the two interrupts raised each video frame.
//!
//! This crate does no I/O of its own. Loading ROM images, drawing the framebuffer, reading the
//! keyboard, and pacing frames against the wall clock are left to whatever embeds it.
//!
//! # Notes
//! The 8080 is little endian. Register pairs are named by their high register (B is BC).

pub mod config;
pub mod cpu;
pub mod error;
pub mod instruction;
pub mod lookup;
pub mod machine;

pub use config::MachineConfig;
pub use cpu::{Cpu, Flags, Step};
pub use error::CpuError;
pub use instruction::{Instruction, Restart};
pub use machine::{Button, FrameReport, Machine};
