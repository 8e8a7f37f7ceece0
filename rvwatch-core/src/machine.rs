//! Machine state the monitor inspects
//!
//! The monitor never owns CPU or memory semantics. It reads registers and
//! memory through [`Machine`], and [`SimpleMachine`] is the in-process
//! implementation used by the server and by tests.

use std::collections::BTreeMap;

use thiserror::Error;

/// RISC-V ABI register names in x0..x31 order
pub const REGISTER_NAMES: [&str; 32] = [
    "$0", "ra", "sp", "gp", "tp", "t0", "t1", "t2", "s0", "s1", "a0", "a1", "a2", "a3", "a4", "a5",
    "a6", "a7", "s2", "s3", "s4", "s5", "s6", "s7", "s8", "s9", "s10", "s11", "t3", "t4", "t5", "t6",
];

/// Width of a memory read issued by the dereference operator
pub const WORD_BYTES: u32 = 4;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown register: '{name}'")]
pub struct UnknownRegister {
    pub name: String,
}

impl UnknownRegister {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MachineError {
    #[error(transparent)]
    UnknownRegister(#[from] UnknownRegister),

    #[error("Unsupported access width: {width} bytes")]
    UnsupportedWidth { width: u32 },
}

/// Register and memory access the evaluator relies on
pub trait Machine {
    /// Read a register by ABI name, without the leading `$`.
    fn read_register(&self, name: &str) -> Result<u32, UnknownRegister>;

    /// Read `width` bytes at `address`. Address validity is up to the machine.
    fn read_memory(&self, address: u32, width: u32) -> u32;
}

impl<M: Machine + ?Sized> Machine for &M {
    fn read_register(&self, name: &str) -> Result<u32, UnknownRegister> {
        (**self).read_register(name)
    }

    fn read_memory(&self, address: u32, width: u32) -> u32 {
        (**self).read_memory(address, width)
    }
}

/// Index of a register in x0..x31 order
pub fn register_index(name: &str) -> Option<usize> {
    REGISTER_NAMES.iter().position(|r| *r == name)
}

/// Register file plus sparse little-endian byte memory
#[derive(Debug, Clone, Default)]
pub struct SimpleMachine {
    gpr: [u32; 32],
    memory: BTreeMap<u32, u8>,
}

impl SimpleMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a register. Writes to `$0` are dropped.
    pub fn set_register(&mut self, name: &str, value: u32) -> Result<(), UnknownRegister> {
        let index = register_index(name).ok_or_else(|| UnknownRegister::new(name))?;
        if index != 0 {
            self.gpr[index] = value;
        }
        Ok(())
    }

    pub fn write_memory(&mut self, address: u32, width: u32, value: u32) -> Result<(), MachineError> {
        check_width(width)?;
        for (i, byte) in value.to_le_bytes().iter().take(width as usize).enumerate() {
            self.memory.insert(address.wrapping_add(i as u32), *byte);
        }
        Ok(())
    }

    pub fn write_word(&mut self, address: u32, value: u32) {
        for (i, byte) in value.to_le_bytes().iter().enumerate() {
            self.memory.insert(address.wrapping_add(i as u32), *byte);
        }
    }

    fn read_bytes(&self, address: u32, width: u32) -> u32 {
        (0..width).rev().fold(0u32, |acc, i| {
            let byte = self
                .memory
                .get(&address.wrapping_add(i))
                .copied()
                .unwrap_or(0);
            (acc << 8) | byte as u32
        })
    }
}

fn check_width(width: u32) -> Result<(), MachineError> {
    match width {
        1 | 2 | 4 => Ok(()),
        _ => Err(MachineError::UnsupportedWidth { width }),
    }
}

impl Machine for SimpleMachine {
    fn read_register(&self, name: &str) -> Result<u32, UnknownRegister> {
        register_index(name)
            .map(|i| self.gpr[i])
            .ok_or_else(|| UnknownRegister::new(name))
    }

    fn read_memory(&self, address: u32, width: u32) -> u32 {
        // Wider reads are truncated to a word
        self.read_bytes(address, width.min(WORD_BYTES))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registers_round_trip_by_name() {
        let mut m = SimpleMachine::new();
        m.set_register("a0", 5).unwrap();
        m.set_register("s11", 0xdead_beef).unwrap();
        assert_eq!(m.read_register("a0").unwrap(), 5);
        assert_eq!(m.read_register("s11").unwrap(), 0xdead_beef);
        assert_eq!(m.read_register("t6").unwrap(), 0);
    }

    #[test]
    fn test_zero_register_ignores_writes() {
        let mut m = SimpleMachine::new();
        m.set_register("$0", 42).unwrap();
        assert_eq!(m.read_register("$0").unwrap(), 0);
    }

    #[test]
    fn test_unknown_register() {
        let m = SimpleMachine::new();
        assert_eq!(m.read_register("pc"), Err(UnknownRegister::new("pc")));
        assert_eq!(m.read_register("s12"), Err(UnknownRegister::new("s12")));
    }

    #[test]
    fn test_memory_is_little_endian() {
        let mut m = SimpleMachine::new();
        m.write_word(0x8000_0000, 0x1122_3344);
        assert_eq!(m.read_memory(0x8000_0000, 4), 0x1122_3344);
        assert_eq!(m.read_memory(0x8000_0000, 1), 0x44);
        assert_eq!(m.read_memory(0x8000_0002, 2), 0x1122);
        assert_eq!(m.read_memory(0x8000_0004, 4), 0);
    }

    #[test]
    fn test_partial_write() {
        let mut m = SimpleMachine::new();
        m.write_word(100, 0xffff_ffff);
        m.write_memory(100, 2, 0xabcd_1234).unwrap();
        assert_eq!(m.read_memory(100, 4), 0xffff_1234);
        assert_eq!(
            m.write_memory(100, 3, 0),
            Err(MachineError::UnsupportedWidth { width: 3 })
        );
    }

    #[test]
    fn test_register_names_are_unique() {
        for (i, name) in REGISTER_NAMES.iter().enumerate() {
            assert_eq!(register_index(name), Some(i));
        }
    }
}
