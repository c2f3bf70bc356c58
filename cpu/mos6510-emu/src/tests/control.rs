use super::{BusCycle, ExpectedState, PROGRAM_START, run_instructions, run_test, run_test_with};
use std::collections::HashMap;
use test_log::test;

#[test]
fn jsr_rts() {
    run_instructions(
        // $0200: JSR $0205
        // $0203: INX
        // $0204: BRK
        // $0205: LDA #$33
        // $0207: RTS
        "200502 E8 00 A933 60",
        4,
        |_, _| {},
        ExpectedState {
            a: Some(0x33),
            x: Some(0x01),
            s: Some(0xFD),
            pc: Some(0x0204),
            cycles: Some(16),
            memory: HashMap::from([(0x01FD, 0x02), (0x01FC, 0x02)]),
            ..ExpectedState::default()
        },
    );
}

#[test]
fn brk_rti() {
    run_instructions(
        // BRK; (padding); INX
        "00 EA E8",
        3,
        |_, bus| {
            bus.memory[0xFFFE] = 0x00;
            bus.memory[0xFFFF] = 0x03;
            // RTI
            bus.memory[0x0300] = 0x40;
        },
        ExpectedState {
            x: Some(0x01),
            p: Some(0x04),
            s: Some(0xFD),
            pc: Some(0x0203),
            cycles: Some(15),
            memory: HashMap::from([(0x01FD, 0x02), (0x01FC, 0x02), (0x01FB, 0x34)]),
            ..ExpectedState::default()
        },
    );
}

#[test]
fn brk_sets_interrupt_disable() {
    run_instructions(
        // CLI; BRK
        "58 00",
        2,
        |_, bus| {
            bus.memory[0xFFFE] = 0x34;
            bus.memory[0xFFFF] = 0x12;
        },
        ExpectedState {
            p: Some(0x04),
            s: Some(0xFA),
            pc: Some(0x1234),
            cycles: Some(9),
            memory: HashMap::from([(0x01FB, 0x30)]),
            ..ExpectedState::default()
        },
    );
}

#[test]
fn pha_pla() {
    run_test(
        // LDA #$80; PHA; LDA #$00; PLA
        "A980 48 A900 68",
        ExpectedState {
            a: Some(0x80),
            p: Some(0x84),
            s: Some(0xFD),
            cycles: Some(11),
            memory: HashMap::from([(0x01FD, 0x80)]),
            ..ExpectedState::default()
        },
    );
}

#[test]
fn php_plp() {
    run_test(
        // SEC; PHP; CLC; PLP
        "38 08 18 28",
        ExpectedState {
            p: Some(0x05),
            s: Some(0xFD),
            cycles: Some(11),
            memory: HashMap::from([(0x01FD, 0x35)]),
            ..ExpectedState::default()
        },
    );
}

#[test]
fn stack_pointer_wraps() {
    run_test_with(
        PROGRAM_START,
        // PHA
        "48",
        |cpu, _| {
            cpu.registers_mut().sp = 0x00;
            cpu.registers_mut().accumulator = 0x5A;
        },
        ExpectedState {
            s: Some(0xFF),
            memory: HashMap::from([(0x0100, 0x5A)]),
            ..ExpectedState::default()
        },
    );
}

#[test]
fn jmp_absolute() {
    run_test(
        // JMP $1234
        "4C3412",
        ExpectedState { pc: Some(0x1234), cycles: Some(3), ..ExpectedState::default() },
    );
}

#[test]
fn branch_not_taken() {
    run_test(
        // BCS +$10
        "B010",
        ExpectedState { pc: Some(0x0202), cycles: Some(2), ..ExpectedState::default() },
    );
}

#[test]
fn branch_taken() {
    let bus = run_test(
        // BCC +$10
        "9010",
        ExpectedState { pc: Some(0x0212), cycles: Some(3), ..ExpectedState::default() },
    );

    assert_eq!(Some(&BusCycle::Read(0x0202, 0x00)), bus.cycles.last());
}

#[test]
fn branch_taken_page_cross() {
    let bus = run_test_with(
        0x02FD,
        // BCC +$10
        "9010",
        |_, _| {},
        ExpectedState { pc: Some(0x030F), cycles: Some(4), ..ExpectedState::default() },
    );

    assert_eq!(
        vec![
            BusCycle::Read(0x02FD, 0x90),
            BusCycle::Read(0x02FE, 0x10),
            BusCycle::Read(0x02FF, 0x00),
            BusCycle::Read(0x020F, 0x00),
        ],
        bus.cycles
    );
}

#[test]
fn branch_backwards() {
    run_instructions(
        // $0200: LDX #$02
        // $0202: DEX
        // $0203: BNE -3
        "A202 CA D0FD",
        5,
        |_, _| {},
        ExpectedState {
            x: Some(0x00),
            p: Some(0x06),
            pc: Some(0x0205),
            cycles: Some(11),
            ..ExpectedState::default()
        },
    );
}

#[test]
fn branch_on_each_flag() {
    // Flags are all clear apart from I, so each "clear" branch is taken and each "set" branch is not
    for (program, taken) in [
        ("1002", true),
        ("3002", false),
        ("5002", true),
        ("7002", false),
        ("9002", true),
        ("B002", false),
        ("D002", true),
        ("F002", false),
    ] {
        let (pc, cycles) = if taken { (0x0204, 3) } else { (0x0202, 2) };
        run_test(program, ExpectedState { pc: Some(pc), cycles: Some(cycles), ..ExpectedState::default() });
    }
}

#[test]
fn plp_drops_break_and_bit_5() {
    run_test(
        // LDA #$FF; PHA; PLP
        "A9FF 48 28",
        ExpectedState {
            a: Some(0xFF),
            p: Some(0xCF),
            s: Some(0xFD),
            cycles: Some(9),
            memory: HashMap::from([(0x01FD, 0xFF)]),
            ..ExpectedState::default()
        },
    );
}
