//! Cycle-stepped MOS 6510 CPU core.
//!
//! Every call to [`Mos6510::clock`] performs exactly one bus transaction. Instructions are decoded
//! into a queue of micro-steps at fetch time and the queue drains one step per clock.

mod addressing;
pub mod bus;
pub mod config;
pub mod debug;
mod microcode;
pub mod opcodes;
mod operations;
pub mod registers;
pub mod serialize;


use crate::bus::BusInterface;
use crate::config::Mos6510Config;
use crate::debug::CpuSnapshot;
use crate::microcode::{MicroOp, StackSource};
use crate::registers::{BusPins, CpuRegisters, InternalLatches};
use bincode::{Decode, Encode};
use std::collections::VecDeque;

pub const NMI_VECTOR: u16 = 0xFFFA;
pub const RESET_VECTOR: u16 = 0xFFFC;
pub const IRQ_VECTOR: u16 = 0xFFFE;

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct Mos6510 {
    registers: CpuRegisters,
    latches: InternalLatches,
    pins: BusPins,
    queue: VecDeque<MicroOp>,
    irq_pending: bool,
    nmi_pending: bool,
    config: Mos6510Config,
}

impl Mos6510 {
    /// Create a CPU in the power-up state: PC = $FFFC, P = $04, all other registers zero.
    #[must_use]
    pub fn new(config: Mos6510Config) -> Self {
        Self {
            registers: CpuRegisters::new(),
            latches: InternalLatches::default(),
            pins: BusPins::default(),
            queue: VecDeque::with_capacity(8),
            irq_pending: false,
            nmi_pending: false,
            config,
        }
    }

    /// Create a CPU and point PC at the RESET vector read from $FFFC/$FFFD.
    pub fn new_from_vector<B: BusInterface>(bus: &mut B, config: Mos6510Config) -> Self {
        let mut cpu = Self::new(config);
        cpu.load_reset_vector(bus);
        cpu
    }

    /// Run the CPU for 1 cycle.
    pub fn clock<B: BusInterface>(&mut self, bus: &mut B) {
        if let Some(op) = self.queue.pop_front() {
            self.execute_micro_op(op, bus);
            return;
        }

        if self.nmi_pending || (self.irq_pending && !self.registers.status.interrupt_disable()) {
            self.begin_interrupt(bus);
        } else {
            self.fetch_opcode(bus);
        }
    }

    /// Return every register to its power-up value and abandon any in-flight instruction.
    ///
    /// This does not run the hardware reset sequence; PC is left at $FFFC rather than loaded from
    /// the vector. Call [`Self::load_reset_vector`] afterwards for that.
    pub fn reset(&mut self) {
        self.registers = CpuRegisters::new();
        self.latches = InternalLatches::default();
        self.pins = BusPins::default();
        self.queue.clear();
        self.irq_pending = false;
        self.nmi_pending = false;
    }

    pub fn load_reset_vector<B: BusInterface>(&mut self, bus: &mut B) {
        let low = self.read_bus(bus, RESET_VECTOR);
        let high = self.read_bus(bus, RESET_VECTOR + 1);
        self.registers.set_pc(u16::from_le_bytes([low, high]));
    }

    /// IRQ line. Ignored while the I flag is set; otherwise sets B and latches the request until
    /// the next instruction boundary.
    pub fn interrupt_request(&mut self) {
        if !self.registers.status.interrupt_disable() {
            self.registers.status.set_break_flag(true);
            self.irq_pending = true;
        }
    }

    /// NMI line. Always sets B and latches the request.
    pub fn non_maskable_interrupt(&mut self) {
        self.registers.status.set_break_flag(true);
        self.nmi_pending = true;
    }

    /// SO pin.
    pub fn set_overflow(&mut self) {
        self.registers.status.set_overflow(true);
    }

    #[inline]
    #[must_use]
    pub fn registers(&self) -> &CpuRegisters {
        &self.registers
    }

    #[inline]
    pub fn registers_mut(&mut self) -> &mut CpuRegisters {
        &mut self.registers
    }

    #[inline]
    #[must_use]
    pub fn latches(&self) -> &InternalLatches {
        &self.latches
    }

    #[inline]
    #[must_use]
    pub fn pins(&self) -> &BusPins {
        &self.pins
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &Mos6510Config {
        &self.config
    }

    #[must_use]
    pub fn is_mid_instruction(&self) -> bool {
        !self.queue.is_empty()
    }

    /// Return whether a JAM opcode has halted the CPU. Only [`Self::reset`] recovers.
    #[must_use]
    pub fn is_jammed(&self) -> bool {
        self.queue.front() == Some(&MicroOp::Jam)
    }

    #[must_use]
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn irq_pending(&self) -> bool {
        self.irq_pending
    }

    #[must_use]
    pub fn nmi_pending(&self) -> bool {
        self.nmi_pending
    }

    #[must_use]
    pub fn snapshot(&self) -> CpuSnapshot {
        CpuSnapshot::capture(self)
    }

    fn fetch_opcode<B: BusInterface>(&mut self, bus: &mut B) {
        let pc = self.registers.pc();
        let opcode = self.read_bus(bus, pc);
        self.registers.increment_pc();

        self.latches = InternalLatches { instruction: opcode, ..InternalLatches::default() };

        let (mode, operation) = opcodes::decode(opcode);
        log::trace!(
            "Fetched opcode {opcode:02X} at {pc:04X}: {} {mode:?}",
            operation.mnemonic()
        );

        self.decode(mode, operation);
    }

    // Hardware interrupts replace the opcode fetch: PC is read but not incremented and IR is
    // forced to BRK ($00)
    fn begin_interrupt<B: BusInterface>(&mut self, bus: &mut B) {
        let pc = self.registers.pc();
        self.read_bus(bus, pc);

        let vector = if self.nmi_pending {
            self.nmi_pending = false;
            NMI_VECTOR
        } else {
            self.irq_pending = false;
            IRQ_VECTOR
        };
        log::debug!("Servicing interrupt with vector {vector:04X}, return address {pc:04X}");

        self.latches = InternalLatches::default();
        self.registers.status.set_break_flag(false);

        self.enqueue(&[
            MicroOp::DummyReadPc,
            MicroOp::Push(StackSource::Pch),
            MicroOp::Push(StackSource::Pcl),
            MicroOp::Push(StackSource::InterruptStatus),
            MicroOp::VectorLow(vector),
            MicroOp::VectorHigh(vector),
        ]);
    }

    /// Prepend an ordered batch of steps to the queue; the first step in `ops` runs next.
    fn enqueue(&mut self, ops: &[MicroOp]) {
        for &op in ops.iter().rev() {
            self.queue.push_front(op);
        }
    }

    fn read_bus<B: BusInterface>(&mut self, bus: &mut B, address: u16) -> u8 {
        self.pins.address = address;
        self.pins.data = bus.read(address);
        self.pins.data
    }

    fn write_bus<B: BusInterface>(&mut self, bus: &mut B, address: u16, value: u8) {
        self.pins.address = address;
        self.pins.data = value;
        bus.write(address, value);
    }

    fn fetch_operand<B: BusInterface>(&mut self, bus: &mut B) -> u8 {
        let operand = self.read_bus(bus, self.registers.pc());
        self.registers.increment_pc();
        operand
    }
}
