/// Memory collaborator the CPU drives through its address and data pins.
///
/// Reads and writes are assumed to be total over the 16-bit address space; mapping, mirroring and
/// open-bus behavior are the implementor's concern.
pub trait BusInterface {
    fn read(&mut self, address: u16) -> u8;

    fn write(&mut self, address: u16, value: u8);
}
