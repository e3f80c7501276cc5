//! The opcode dispatch table.
//!
//! Indexed by `u16`: entries below [`crate::opcodes::NUM_RESERVED`] are the
//! fixed built-ins, entries above are appended during module setup, one per
//! registered host function with a unique qualified name. Execution is a
//! single indexed lookup per instruction.

use crate::charge::ChargeAmount;
use crate::error::VmResult;
use crate::opcodes;
use crate::vm::Vm;
use hashbrown::HashMap;
use std::rc::Rc;

/// An opcode handler. Host-function handlers may capture registration
/// context (type ids, element types), hence the shared closure type.
pub type OpcodeHandler = Rc<dyn Fn(&mut Vm) -> VmResult<()>>;

/// One dispatch-table entry.
#[derive(Clone)]
pub struct OpcodeInfo {
    /// Qualified name, unique across the table
    pub unique_name: String,

    /// The handler invoked for this opcode
    pub handler: OpcodeHandler,

    /// Charge applied before every invocation
    pub static_charge: ChargeAmount,
}

/// The indexed handler registry.
#[derive(Clone, Default)]
pub struct OpcodeTable {
    infos: Vec<Option<OpcodeInfo>>,
    name_map: HashMap<String, u16>,
}

impl OpcodeTable {
    /// Creates a table with the built-in range reserved but empty.
    pub fn new() -> Self {
        Self {
            infos: (0..opcodes::NUM_RESERVED).map(|_| None).collect(),
            name_map: HashMap::new(),
        }
    }

    /// Installs a built-in handler at a reserved opcode.
    pub(crate) fn set(
        &mut self,
        opcode: u16,
        unique_name: &str,
        handler: OpcodeHandler,
        static_charge: ChargeAmount,
    ) {
        debug_assert!(opcode < opcodes::NUM_RESERVED);
        self.name_map.insert(unique_name.to_string(), opcode);
        self.infos[usize::from(opcode)] = Some(OpcodeInfo {
            unique_name: unique_name.to_string(),
            handler,
            static_charge,
        });
    }

    /// Appends a host-function handler, returning its assigned opcode.
    pub fn register_function(
        &mut self,
        unique_name: String,
        handler: OpcodeHandler,
        static_charge: ChargeAmount,
    ) -> u16 {
        let opcode = self.infos.len() as u16;
        let previous = self.name_map.insert(unique_name.clone(), opcode);
        assert!(
            previous.is_none(),
            "duplicate opcode registration: {unique_name}"
        );
        self.infos.push(Some(OpcodeInfo {
            unique_name,
            handler,
            static_charge,
        }));
        opcode
    }

    /// Looks up an entry by opcode.
    pub fn get(&self, opcode: u16) -> Option<&OpcodeInfo> {
        self.infos.get(usize::from(opcode))?.as_ref()
    }

    /// Looks up an opcode by its unique name.
    pub fn find_opcode(&self, unique_name: &str) -> Option<u16> {
        self.name_map.get(unique_name).copied()
    }

    /// Total number of table slots, reserved range included.
    pub fn len(&self) -> usize {
        self.infos.len()
    }

    /// Returns whether the table holds no entries at all.
    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }

    /// Re-prices opcodes by unique name, for embedders that version their
    /// charge schedules.
    pub fn update_charges(&mut self, charges: &HashMap<String, ChargeAmount>) {
        for info in self.infos.iter_mut().flatten() {
            if let Some(amount) = charges.get(&info.unique_name) {
                info.static_charge = *amount;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nop(_vm: &mut Vm) -> VmResult<()> {
        Ok(())
    }

    #[test]
    fn host_functions_start_at_the_reserved_boundary() {
        let mut table = OpcodeTable::new();
        let opcode = table.register_function("test()".to_string(), Rc::new(nop), 1);
        assert_eq!(opcode, opcodes::NUM_RESERVED);
        assert_eq!(table.find_opcode("test()"), Some(opcode));
        assert!(table.get(opcode).is_some());
        assert!(table.get(opcodes::PUSH_NULL).is_none());
    }

    #[test]
    fn charges_are_updatable_by_name() {
        let mut table = OpcodeTable::new();
        table.register_function("test()".to_string(), Rc::new(nop), 1);
        let mut charges = HashMap::new();
        charges.insert("test()".to_string(), 40u64);
        table.update_charges(&charges);
        let opcode = table.find_opcode("test()").unwrap();
        assert_eq!(table.get(opcode).unwrap().static_charge, 40);
    }
}
