use crate::error::CpuError;
use crate::instruction::Restart;

use super::{Cpu, Flags, Step};

const MEM_SIZE: usize = 0x4000;

/// Builds a CPU with `program` loaded at `pc` and the stack at 0x2000.
fn setup(pc: u16, program: &[u8]) -> Cpu {
    let mut cpu = Cpu::new(MEM_SIZE);
    cpu.load(pc as usize, program).unwrap();
    cpu.pc = pc;
    cpu.sp = 0x2000;
    cpu
}

/// Steps once and checks that the PC moved by the reported byte count.
#[track_caller]
fn step(cpu: &mut Cpu) -> Step {
    let pc = cpu.pc;
    let step = cpu.step().unwrap();
    if step.bytes != 0 {
        assert_eq!(cpu.pc, pc.wrapping_add(step.bytes as u16));
    }
    step
}

#[test]
fn new_cpu_is_zeroed() {
    let cpu = Cpu::new(0x100);
    assert_eq!(cpu.memory_size(), 0x100);
    assert!(cpu.memory().iter().all(|b| *b == 0));
    assert!(cpu.ports().iter().all(|b| *b == 0));
    assert_eq!(cpu.flags, Flags::default());
    assert_eq!((cpu.pc, cpu.sp), (0, 0));
    assert!(!cpu.interrupt_enable);
}

#[test]
fn add_register() {
    // ADD B
    let mut cpu = setup(0, &[0x80]);
    cpu.a = 0x01;
    cpu.b = 0x02;
    let Step { bytes, cycles, .. } = step(&mut cpu);
    assert_eq!((bytes, cycles), (1, 4));
    assert_eq!(cpu.a, 0x03);
    assert!(!cpu.flags.carry);
    assert!(!cpu.flags.zero);

    let mut cpu = setup(0, &[0x80]);
    cpu.a = 0xF0;
    cpu.b = 0x10;
    step(&mut cpu);
    assert_eq!(cpu.a, 0x00);
    assert!(cpu.flags.carry);
    assert!(cpu.flags.zero);
}

#[test]
fn add_family_is_modular() {
    // ADD B, ADC B, ADI, ACI
    for (program, with_carry) in [
        (vec![0x80], false),
        (vec![0x88], true),
        (vec![0xC6, 0x00], false),
        (vec![0xCE, 0x00], true),
    ] {
        for acc in (0..=255u8).step_by(17) {
            for op in (0..=255u8).step_by(23) {
                let mut program = program.clone();
                if program.len() == 2 {
                    program[1] = op;
                }
                let mut cpu = setup(0, &program);
                cpu.a = acc;
                cpu.b = op;
                cpu.flags.carry = true;
                step(&mut cpu);
                let sum = acc as u16 + op as u16 + with_carry as u16;
                assert_eq!(cpu.a, sum as u8);
                assert_eq!(cpu.flags.carry, sum > 0xFF);
            }
        }
    }
}

#[test]
fn sub_family_carry_is_borrow() {
    // SUB B, SBB B, SUI, SBI, CMP B, CPI
    for (program, with_borrow, writes_back) in [
        (vec![0x90], false, true),
        (vec![0x98], true, true),
        (vec![0xD6, 0x00], false, true),
        (vec![0xDE, 0x00], true, true),
        (vec![0xB8], false, false),
        (vec![0xFE, 0x00], false, false),
    ] {
        for acc in (0..=255u8).step_by(19) {
            for op in (0..=255u8).step_by(29) {
                let mut program = program.clone();
                if program.len() == 2 {
                    program[1] = op;
                }
                let mut cpu = setup(0, &program);
                cpu.a = acc;
                cpu.b = op;
                cpu.flags.carry = true;
                step(&mut cpu);
                let subtrahend = op as u16 + with_borrow as u16;
                if writes_back {
                    assert_eq!(cpu.a, (acc as u16).wrapping_sub(subtrahend) as u8);
                } else {
                    assert_eq!(cpu.a, acc);
                }
                assert_eq!(cpu.flags.carry, (acc as u16) < subtrahend);
                assert_eq!(cpu.flags.zero, acc as u16 == subtrahend % 0x100);
            }
        }
    }
}

#[test]
fn subtract_immediate() {
    // SUI 0x0F
    let mut cpu = setup(0x100, &[0xD6, 0x0F]);
    cpu.a = 0xFF;
    let Step { bytes, cycles, .. } = step(&mut cpu);
    assert_eq!((bytes, cycles), (2, 7));
    assert_eq!(cpu.a, 0xF0);
    assert_eq!(cpu.pc, 0x102);
    assert!(!cpu.flags.carry);
}

#[test]
fn decimal_adjust() {
    // DAA
    let mut cpu = setup(0, &[0x27]);
    cpu.a = 0x9B;
    step(&mut cpu);
    assert_eq!(cpu.a, 0x01);
    assert!(cpu.flags.carry);
    assert!(cpu.flags.aux_carry);
}

#[test]
fn increment_and_decrement_keep_carry() {
    // INR B, DCR M, INR A, DCR C
    for carry in [false, true] {
        let mut cpu = setup(0, &[0x04, 0x35, 0x3C, 0x0D]);
        cpu.flags.carry = carry;
        cpu.b = 0xFF;
        cpu.set_hl(0x3000);
        cpu.write_byte(0x3000, 0x00).unwrap();
        cpu.a = 0x7F;
        cpu.c = 0x01;

        assert_eq!(step(&mut cpu).cycles, 5);
        assert_eq!(cpu.b, 0x00);
        assert!(cpu.flags.zero && cpu.flags.aux_carry);
        assert_eq!(cpu.flags.carry, carry);

        assert_eq!(step(&mut cpu).cycles, 10);
        assert_eq!(cpu.read_byte(0x3000).unwrap(), 0xFF);
        assert!(cpu.flags.sign && !cpu.flags.zero);
        assert_eq!(cpu.flags.carry, carry);

        step(&mut cpu);
        assert_eq!(cpu.a, 0x80);
        assert!(cpu.flags.sign);
        assert_eq!(cpu.flags.carry, carry);

        step(&mut cpu);
        assert_eq!(cpu.c, 0x00);
        assert!(cpu.flags.zero);
        assert_eq!(cpu.flags.carry, carry);
    }
}

#[test]
fn logical_ops_aux_carry() {
    // ANA B, XRA C, ORI 0x01
    let mut cpu = setup(0, &[0xA0, 0xA9, 0xF6, 0x01]);
    cpu.a = 0x0C;
    cpu.b = 0x03;
    cpu.c = 0xFF;
    cpu.flags.carry = true;
    step(&mut cpu);
    assert_eq!(cpu.a, 0x00);
    assert!(cpu.flags.zero);
    assert!(cpu.flags.aux_carry);
    assert!(!cpu.flags.carry);

    step(&mut cpu);
    assert_eq!(cpu.a, 0xFF);
    assert!(!cpu.flags.aux_carry);
    assert!(cpu.flags.sign && cpu.flags.parity);

    cpu.flags.aux_carry = true;
    step(&mut cpu);
    assert_eq!(cpu.a, 0xFF);
    assert!(!cpu.flags.aux_carry);
}

#[test]
fn push_register_pair() {
    // PUSH B
    let mut cpu = setup(0, &[0xC5]);
    cpu.sp = 8192;
    cpu.b = 0x11;
    cpu.c = 0x22;
    let Step { bytes, cycles, .. } = step(&mut cpu);
    assert_eq!((bytes, cycles), (1, 11));
    assert_eq!(cpu.sp, 8190);
    assert_eq!(cpu.memory()[8190], 0x22);
    assert_eq!(cpu.memory()[8191], 0x11);
}

#[test]
fn push_then_pop_restores_every_pair() {
    // PUSH B, PUSH D, PUSH H, PUSH PSW, then the POPs in reverse into scrambled registers
    let mut cpu = setup(0, &[0xC5, 0xD5, 0xE5, 0xF5, 0xF1, 0xE1, 0xD1, 0xC1]);
    cpu.set_bc(0x1234);
    cpu.set_de(0x5678);
    cpu.set_hl(0x9ABC);
    cpu.a = 0xDE;
    cpu.flags = Flags {
        zero: true,
        sign: false,
        parity: true,
        carry: true,
        aux_carry: false,
    };
    let before = cpu.clone();
    for _ in 0..4 {
        step(&mut cpu);
    }
    assert_eq!(cpu.sp, 0x2000 - 8);
    cpu.set_bc(0);
    cpu.set_de(0);
    cpu.set_hl(0);
    cpu.a = 0;
    cpu.flags = Flags::default();
    for _ in 0..4 {
        assert_eq!(step(&mut cpu).cycles, 10);
    }
    assert_eq!(cpu.sp, before.sp);
    assert_eq!((cpu.bc(), cpu.de(), cpu.hl()), (0x1234, 0x5678, 0x9ABC));
    assert_eq!(cpu.a, 0xDE);
    assert_eq!(cpu.flags, before.flags);
}

#[test]
fn psw_layout() {
    // PUSH PSW
    let mut cpu = setup(0, &[0xF5]);
    cpu.a = 0x42;
    cpu.flags = Flags {
        zero: false,
        sign: true,
        parity: true,
        carry: true,
        aux_carry: true,
    };
    step(&mut cpu);
    assert_eq!(cpu.memory()[0x1FFE], 0b1001_0111);
    assert_eq!(cpu.memory()[0x1FFF], 0x42);
    assert_eq!(Flags::from(0b1001_0111), cpu.flags);
    assert_eq!(Flags::default().as_byte(), 0x02);
}

#[test]
fn call_pushes_return_address() {
    // CALL 0x0BCD
    let mut cpu = setup(0x0ABC, &[0xCD, 0xCD, 0x0B]);
    cpu.sp = 8192;
    let Step { bytes, cycles, .. } = step(&mut cpu);
    assert_eq!((bytes, cycles), (0, 17));
    assert_eq!(cpu.pc, 0x0BCD);
    assert_eq!(cpu.sp, 8190);
    assert_eq!(cpu.memory()[cpu.sp as usize], 0xBF);
    assert_eq!(cpu.memory()[cpu.sp as usize + 1], 0x0A);
}

#[test]
fn call_then_return() {
    // CALL 0x0200; ...; RET at 0x0200
    let mut cpu = setup(0x0100, &[0xCD, 0x00, 0x02]);
    cpu.load(0x0200, &[0xC9]).unwrap();
    let sp = cpu.sp;
    step(&mut cpu);
    assert_eq!(cpu.pc, 0x0200);
    let Step { bytes, cycles, .. } = step(&mut cpu);
    assert_eq!((bytes, cycles), (0, 10));
    assert_eq!(cpu.pc, 0x0103);
    assert_eq!(cpu.sp, sp);
}

#[test]
fn conditional_timing() {
    // CZ 0x0200, RZ, JZ 0x0300
    let mut cpu = setup(0, &[0xCC, 0x00, 0x02, 0xC8, 0xCA, 0x00, 0x03]);
    let Step { bytes, cycles, .. } = step(&mut cpu);
    assert_eq!((bytes, cycles), (3, 11));
    let Step { bytes, cycles, .. } = step(&mut cpu);
    assert_eq!((bytes, cycles), (1, 5));
    let Step { bytes, cycles, .. } = step(&mut cpu);
    assert_eq!((bytes, cycles), (3, 10));
    assert_eq!(cpu.pc, 7);

    cpu.pc = 0;
    cpu.flags.zero = true;
    cpu.load(0x0200, &[0xC8]).unwrap();
    let Step { bytes, cycles, .. } = step(&mut cpu);
    assert_eq!((bytes, cycles), (0, 17));
    assert_eq!(cpu.pc, 0x0200);
    let Step { bytes, cycles, .. } = step(&mut cpu);
    assert_eq!((bytes, cycles), (0, 11));
    assert_eq!(cpu.pc, 3);
}

#[test]
fn conditions_follow_flags() {
    // JNZ, JZ, JNC, JC, JPO, JPE, JP, JM; all to 0x0100
    let ops = [0xC2, 0xCA, 0xD2, 0xDA, 0xE2, 0xEA, 0xF2, 0xFA];
    let check = |flags: Flags, expected: [bool; 8]| {
        for (op, taken) in ops.into_iter().zip(expected) {
            let mut cpu = setup(0, &[op, 0x00, 0x01]);
            cpu.flags = flags;
            step(&mut cpu);
            assert_eq!(cpu.pc == 0x0100, taken, "0x{op:0>2X} with {flags}");
        }
    };
    check(
        Flags::default(),
        [true, false, true, false, true, false, true, false],
    );
    check(
        Flags {
            zero: true,
            sign: true,
            parity: true,
            carry: true,
            aux_carry: false,
        },
        [false, true, false, true, false, true, false, true],
    );
}

#[test]
fn restart_pushes_next_address() {
    // RST 5
    let mut cpu = setup(0x0123, &[0xEF]);
    let Step { bytes, cycles, .. } = step(&mut cpu);
    assert_eq!((bytes, cycles), (0, 11));
    assert_eq!(cpu.pc, 0x28);
    assert_eq!(cpu.peek_word().unwrap(), 0x0124);
}

#[test]
fn pchl_sphl_xchg_xthl() {
    // XCHG, SPHL, XTHL, PCHL
    let mut cpu = setup(0, &[0xEB, 0xF9, 0xE3, 0xE9]);
    cpu.set_de(0x1000);
    cpu.set_hl(0x2222);
    assert_eq!(step(&mut cpu).cycles, 5);
    assert_eq!((cpu.de(), cpu.hl()), (0x2222, 0x1000));

    step(&mut cpu);
    assert_eq!(cpu.sp, 0x1000);

    cpu.write_word(0x1000, 0x0ABC).unwrap();
    assert_eq!(step(&mut cpu).cycles, 18);
    assert_eq!(cpu.hl(), 0x0ABC);
    assert_eq!(cpu.read_word(0x1000).unwrap(), 0x1000);
    assert_eq!(cpu.sp, 0x1000);

    let Step { bytes, cycles, .. } = step(&mut cpu);
    assert_eq!((bytes, cycles), (0, 5));
    assert_eq!(cpu.pc, 0x0ABC);
}

#[test]
fn direct_and_indirect_memory() {
    // LXI B, 0x3000; MVI A, 0x5A; STAX B; STA 0x3001; LHLD 0x3000; SHLD 0x3010; LDAX D; LDA 0x3011
    let mut cpu = setup(
        0,
        &[
            0x01, 0x00, 0x30, 0x3E, 0x5A, 0x02, 0x32, 0x01, 0x30, 0x2A, 0x00, 0x30, 0x22, 0x10,
            0x30, 0x1A, 0x3A, 0x11, 0x30,
        ],
    );
    cpu.set_de(0x3010);
    let cycles = (0..8).map(|_| step(&mut cpu).cycles).collect::<Vec<_>>();
    assert_eq!(cycles, vec![10, 7, 7, 13, 16, 16, 7, 13]);
    assert_eq!(cpu.bc(), 0x3000);
    assert_eq!(cpu.hl(), 0x5A5A);
    assert_eq!(cpu.read_word(0x3010).unwrap(), 0x5A5A);
    assert_eq!(cpu.a, 0x5A);
    assert_eq!(cpu.pc, 19);
}

#[test]
fn wide_ops_flags() {
    // DAD B; INX H; DCX D
    let mut cpu = setup(0, &[0x09, 0x23, 0x1B]);
    cpu.set_hl(0xFFFF);
    cpu.set_bc(0x0001);
    cpu.set_de(0x0000);
    step(&mut cpu);
    assert_eq!(cpu.hl(), 0x0000);
    assert!(cpu.flags.carry);
    assert!(!cpu.flags.zero);

    cpu.flags.carry = false;
    cpu.set_hl(0xFFFF);
    step(&mut cpu);
    assert_eq!(cpu.hl(), 0x0000);
    step(&mut cpu);
    assert_eq!(cpu.de(), 0xFFFF);
    assert_eq!(cpu.flags, Flags::default());
}

#[test]
fn rotates_and_carry_ops() {
    // RLC, RAR, STC, CMC, CMA
    let mut cpu = setup(0, &[0x07, 0x1F, 0x37, 0x3F, 0x2F]);
    cpu.a = 0x80;
    step(&mut cpu);
    assert_eq!(cpu.a, 0x01);
    assert!(cpu.flags.carry);
    step(&mut cpu);
    assert_eq!(cpu.a, 0x80);
    assert!(cpu.flags.carry);
    step(&mut cpu);
    assert!(cpu.flags.carry);
    step(&mut cpu);
    assert!(!cpu.flags.carry);
    let flags = cpu.flags;
    step(&mut cpu);
    assert_eq!(cpu.a, 0x7F);
    assert_eq!(cpu.flags, flags);
}

#[test]
fn io_ports() {
    // IN 0x01; OUT 0x05; NOP
    let mut cpu = setup(0, &[0xDB, 0x01, 0xD3, 0x05, 0x00]);
    cpu.set_port(0x01, 0x99);
    let step_in = step(&mut cpu);
    assert_eq!(cpu.a, 0x99);
    assert_eq!(step_in.output_port, None);
    assert_eq!(step_in.cycles, 10);

    let step_out = step(&mut cpu);
    assert_eq!(step_out.output_port, Some(0x05));
    assert_eq!(cpu.port(0x05), 0x99);

    assert_eq!(step(&mut cpu).output_port, None);
    assert_eq!(cpu.port(0x05), 0x99);
}

#[test]
fn halt_stands_still() {
    // HLT
    let mut cpu = setup(0x40, &[0x76]);
    for _ in 0..10 {
        let step = cpu.step().unwrap();
        assert!(step.is_halted());
        assert_eq!(cpu.pc, 0x40);
    }
    cpu.interrupt_enable = true;
    assert_eq!(cpu.interrupt(Restart::Rst1).unwrap(), 11);
    assert_eq!(cpu.pc, 0x08);
    assert_eq!(cpu.pop_word().unwrap(), 0x40);
}

#[test]
fn interrupts_are_gated() {
    let mut cpu = setup(0x1234, &[]);
    let before = cpu.clone();
    assert_eq!(cpu.interrupt(Restart::Rst2).unwrap(), 0);
    assert_eq!(cpu, before);

    // EI
    let mut cpu = setup(0x1234, &[0xFB]);
    step(&mut cpu);
    assert!(cpu.interrupt_enable);
    assert_eq!(cpu.interrupt(Restart::Rst2).unwrap(), 11);
    assert_eq!(cpu.pc, 0x10);
    assert_eq!(cpu.sp, 0x1FFE);
    assert_eq!(cpu.memory()[0x1FFE], 0x35);
    assert_eq!(cpu.memory()[0x1FFF], 0x12);
    assert!(cpu.interrupt_enable);

    // DI
    cpu.load(0x10, &[0xF3]).unwrap();
    step(&mut cpu);
    assert!(!cpu.interrupt_enable);
}

#[test]
fn undocumented_op_codes_run_as_noops() {
    for op in [0xCB, 0xD9, 0xDD, 0xED, 0xFD] {
        let mut cpu = setup(0x10, &[op]);
        let mut expected = cpu.clone();
        expected.pc = 0x11;
        assert_eq!(
            cpu.step(),
            Ok(Step {
                bytes: 1,
                cycles: 4,
                output_port: None
            })
        );
        assert_eq!(cpu, expected);
    }
}

#[test]
fn stack_overflow_leaves_state_untouched() {
    // PUSH H, CALL 0x0000, RST 0
    for program in [vec![0xE5], vec![0xCD, 0x00, 0x00], vec![0xC7]] {
        let mut cpu = setup(0x20, &program);
        cpu.sp = 1;
        let before = cpu.clone();
        assert_eq!(
            cpu.step(),
            Err(CpuError::StackOverflow { sp: 1, pc: 0x20 })
        );
        assert_eq!(cpu, before);
    }

    let mut cpu = setup(0x20, &[]);
    cpu.interrupt_enable = true;
    cpu.sp = 0;
    assert_eq!(
        cpu.interrupt(Restart::Rst1),
        Err(CpuError::StackOverflow { sp: 0, pc: 0x20 })
    );
}

#[test]
fn stack_underflow_leaves_state_untouched() {
    // POP B, RET, XTHL
    for program in [vec![0xC1], vec![0xC9], vec![0xE3]] {
        let mut cpu = setup(0x20, &program);
        cpu.sp = (MEM_SIZE - 1) as u16;
        let before = cpu.clone();
        assert_eq!(
            cpu.step(),
            Err(CpuError::StackUnderflow {
                sp: (MEM_SIZE - 1) as u16,
                pc: 0x20
            })
        );
        assert_eq!(cpu, before);
    }

    // The very top of memory still holds a word.
    let mut cpu = setup(0x20, &[0xC1]);
    cpu.sp = (MEM_SIZE - 2) as u16;
    step(&mut cpu);
    assert_eq!(cpu.sp as usize, MEM_SIZE);
}

#[test]
fn invalid_jump_targets() {
    // JMP 0x4000, CALL 0x8000, PCHL, JC 0xFFFF (taken)
    let mut cpu = setup(0, &[0xC3, 0x00, 0x40]);
    assert_eq!(
        cpu.step(),
        Err(CpuError::InvalidJumpTarget {
            target: 0x4000,
            pc: 0
        })
    );

    let mut cpu = setup(0, &[0xCD, 0x00, 0x80]);
    let before = cpu.clone();
    assert!(matches!(
        cpu.step(),
        Err(CpuError::InvalidJumpTarget { target: 0x8000, .. })
    ));
    assert_eq!(cpu, before);

    let mut cpu = setup(0, &[0xE9]);
    cpu.set_hl(0x5000);
    assert!(matches!(
        cpu.step(),
        Err(CpuError::InvalidJumpTarget { target: 0x5000, .. })
    ));

    // Untaken jumps are never checked.
    let mut cpu = setup(0, &[0xDA, 0xFF, 0xFF]);
    assert_eq!(step(&mut cpu).bytes, 3);
    cpu.pc = 0;
    cpu.flags.carry = true;
    assert!(cpu.step().is_err());
    assert_eq!(cpu.pc, 0);
}

#[test]
fn return_to_invalid_address() {
    // RET with 0x9000 on the stack
    let mut cpu = setup(0, &[0xC9]);
    cpu.push_word(0x9000).unwrap();
    let before = cpu.clone();
    assert!(matches!(
        cpu.step(),
        Err(CpuError::InvalidJumpTarget { target: 0x9000, .. })
    ));
    assert_eq!(cpu, before);
}

#[test]
fn invalid_addresses() {
    // STA 0x4000, MOV A, M with HL past the end, SHLD 0x3FFF
    let mut cpu = setup(0, &[0x32, 0x00, 0x40]);
    assert_eq!(
        cpu.step(),
        Err(CpuError::InvalidAddress {
            addr: 0x4000,
            pc: 0
        })
    );

    let mut cpu = setup(0, &[0x7E]);
    cpu.set_hl(0xFFFF);
    assert!(matches!(
        cpu.step(),
        Err(CpuError::InvalidAddress { addr: 0xFFFF, .. })
    ));

    let mut cpu = setup(0, &[0x22, 0xFF, 0x3F]);
    let before = cpu.clone();
    assert!(cpu.step().is_err());
    assert_eq!(cpu, before);

    // The PC itself walking off the end
    let mut cpu = Cpu::new(0x10);
    cpu.pc = 0x10;
    assert_eq!(
        cpu.step(),
        Err(CpuError::InvalidAddress {
            addr: 0x10,
            pc: 0x10
        })
    );
}

#[test]
fn operands_past_the_end_read_as_zero() {
    // MVI B at the last byte of memory
    let mut cpu = Cpu::new(0x10);
    cpu.load(0x0F, &[0x06]).unwrap();
    cpu.b = 0xFF;
    cpu.pc = 0x0F;
    assert_eq!(cpu.step().unwrap().bytes, 2);
    assert_eq!(cpu.b, 0x00);
    assert_eq!(cpu.pc, 0x11);
}

#[test]
fn oversized_load() {
    let mut cpu = Cpu::new(0x100);
    assert_eq!(
        cpu.load(0xF0, &[0xAA; 0x20]),
        Err(CpuError::OversizedLoad {
            offset: 0xF0,
            len: 0x20,
            capacity: 0x100
        })
    );
    assert!(cpu.memory().iter().all(|b| *b == 0));
    assert!(cpu.load(usize::MAX, &[0x01]).is_err());
    cpu.load(0xF0, &[0xAA; 0x10]).unwrap();
    assert_eq!(cpu.memory()[0xFF], 0xAA);
}

#[test]
fn cpu_display() {
    let mut cpu = Cpu::new(0x10);
    cpu.a = 0xAB;
    cpu.pc = 0x0102;
    cpu.flags.carry = true;
    let text = cpu.to_string();
    assert!(text.contains("A=0xAB"), "{text}");
    assert!(text.contains("PC=0x0102"), "{text}");
    assert!(text.contains("CY=1"), "{text}");
}
