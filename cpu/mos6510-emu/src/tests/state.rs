use super::{BusCycle, PROGRAM_START, TestBus, clock_instruction, new_cpu};
use crate::config::Mos6510Config;
use crate::{Mos6510, serialize};
use test_log::test;

#[test]
fn reset_abandons_instruction() {
    let mut bus = TestBus::new();
    // LDX #$10; INC $3000
    bus.load(PROGRAM_START, "A210 EE0030");
    // NOP at the power-up PC
    bus.memory[0xFFFC] = 0xEA;
    let mut cpu = new_cpu(PROGRAM_START);

    clock_instruction(&mut cpu, &mut bus);
    cpu.clock(&mut bus);
    cpu.clock(&mut bus);
    cpu.clock(&mut bus);
    assert!(cpu.is_mid_instruction());

    cpu.reset();

    let registers = cpu.registers();
    assert_eq!(0xFFFC, registers.pc());
    assert_eq!(0b0000_0100, registers.status.to_byte());
    assert_eq!((0, 0, 0, 0), (registers.sp, registers.accumulator, registers.x, registers.y));
    assert!(!cpu.is_mid_instruction());
    assert_eq!(0, cpu.queue_len());
    assert_eq!(0, cpu.pins().address);

    bus.cycles.clear();
    cpu.clock(&mut bus);
    assert_eq!(0xFFFC, cpu.pins().address);
    assert_eq!(0xEA, cpu.latches().instruction);
    assert_eq!(vec![BusCycle::Read(0xFFFC, 0xEA)], bus.cycles);
    assert_eq!(0, bus.memory[0x3000]);
}

#[test]
fn reset_drops_pending_interrupts() {
    let mut cpu = new_cpu(PROGRAM_START);
    cpu.non_maskable_interrupt();
    cpu.reset();
    assert!(!cpu.nmi_pending());
    assert!(!cpu.registers().status.break_flag());
}

#[test]
fn load_reset_vector() {
    let mut bus = TestBus::new();
    bus.memory[0xFFFC] = 0x00;
    bus.memory[0xFFFD] = 0xE0;

    let cpu = Mos6510::new_from_vector(&mut bus, Mos6510Config::default());
    assert_eq!(0xE000, cpu.registers().pc());
    assert!(!cpu.is_mid_instruction());
}

#[test]
fn snapshot_does_not_mutate() {
    let mut bus = TestBus::new();
    // LDA #$80; STA $3000,X
    bus.load(PROGRAM_START, "A980 9D0030");
    let mut cpu = new_cpu(PROGRAM_START);
    clock_instruction(&mut cpu, &mut bus);
    cpu.clock(&mut bus);
    cpu.clock(&mut bus);

    let before = cpu.clone();
    let first = cpu.snapshot();
    let second = cpu.snapshot();

    assert_eq!(before, cpu);
    assert_eq!(first, second);
    assert_eq!(0x80, first.accumulator);
    assert_eq!(0x0204, first.pc);
    assert_eq!(3, first.pending_steps);
    assert!(!first.jammed);

    let rendered = first.to_string();
    assert!(rendered.starts_with("PC=0204 A=80 X=00 Y=00 SP=FD P=84 [Nv-bdIzc] IR=9D (STA AbsoluteX)"));
}

#[test]
fn jam_halts_until_reset() {
    let mut bus = TestBus::new();
    // JAM
    bus.load(PROGRAM_START, "02");
    let mut cpu = new_cpu(PROGRAM_START);

    cpu.clock(&mut bus);
    cpu.clock(&mut bus);
    assert!(cpu.is_jammed());

    let accesses = bus.cycles.len();
    for _ in 0..100 {
        cpu.clock(&mut bus);
        assert!(cpu.is_jammed());
        assert!(cpu.is_mid_instruction());
        assert_eq!(0xFFFF, cpu.pins().address);
        assert_eq!(0xFF, cpu.pins().data);
    }
    assert_eq!(accesses, bus.cycles.len());
    assert_eq!(0x0201, cpu.registers().pc());
    assert!(cpu.snapshot().to_string().ends_with("JAMMED"));

    cpu.reset();
    assert!(!cpu.is_jammed());
    assert!(!cpu.is_mid_instruction());
}

#[test]
fn save_state_mid_instruction() {
    let mut bus = TestBus::new();
    // ASL $3000,X
    bus.load(PROGRAM_START, "1E0030");
    bus.memory[0x3001] = 0x21;
    let mut cpu = new_cpu(PROGRAM_START);
    cpu.registers_mut().x = 0x01;

    cpu.clock(&mut bus);
    cpu.clock(&mut bus);
    cpu.clock(&mut bus);

    let mut state: Vec<u8> = Vec::new();
    serialize::save_state(&cpu, &mut state).unwrap();
    let mut restored = serialize::load_state(state.as_slice()).unwrap();
    assert_eq!(cpu, restored);

    let mut restored_bus = TestBus::new();
    restored_bus.memory.copy_from_slice(&bus.memory);

    while cpu.is_mid_instruction() {
        cpu.clock(&mut bus);
        restored.clock(&mut restored_bus);
    }

    assert!(!restored.is_mid_instruction());
    assert_eq!(cpu, restored);
    assert_eq!(0x42, restored_bus.memory[0x3001]);
}

#[test]
fn load_state_rejects_truncated_data() {
    let cpu = new_cpu(PROGRAM_START);
    let mut state: Vec<u8> = Vec::new();
    serialize::save_state(&cpu, &mut state).unwrap();
    state.truncate(state.len() / 2);

    assert!(serialize::load_state(state.as_slice()).is_err());
}

#[test]
fn load_state_rejects_steps_for_another_opcode() {
    let mut bus = TestBus::new();
    // STA $3000,X
    bus.load(PROGRAM_START, "9D0030");
    let mut cpu = new_cpu(PROGRAM_START);
    cpu.clock(&mut bus);
    assert!(cpu.is_mid_instruction());

    // Write steps queued behind an LDA opcode
    cpu.latches.instruction = 0xA9;
    let mut state: Vec<u8> = Vec::new();
    serialize::save_state(&cpu, &mut state).unwrap();

    assert!(matches!(
        serialize::load_state(state.as_slice()),
        Err(serialize::SaveStateError::InconsistentQueue { opcode: 0xA9 })
    ));
}

#[test]
fn load_state_accepts_interrupt_in_progress() {
    let mut bus = TestBus::new();
    bus.load(PROGRAM_START, "EA");
    let mut cpu = new_cpu(PROGRAM_START);
    cpu.non_maskable_interrupt();
    cpu.clock(&mut bus);
    cpu.clock(&mut bus);

    let mut state: Vec<u8> = Vec::new();
    serialize::save_state(&cpu, &mut state).unwrap();
    let restored = serialize::load_state(state.as_slice()).unwrap();
    assert_eq!(cpu, restored);
}

#[test]
fn unstable_opcode_config() {
    let mut bus = TestBus::new();
    // LXA #$FF
    bus.load(PROGRAM_START, "ABFF");
    let mut cpu = Mos6510::new(Mos6510Config { ane_magic: 0xEE, lxa_magic: 0x00 });
    cpu.registers_mut().set_pc(PROGRAM_START);
    cpu.registers_mut().accumulator = 0x0F;

    clock_instruction(&mut cpu, &mut bus);
    assert_eq!(0x0F, cpu.registers().accumulator);
    assert_eq!(0x0F, cpu.registers().x);
    assert_eq!(0x00, cpu.config().lxa_magic);
}
