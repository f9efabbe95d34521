//! Global variable storage
//!
//! One [`GlobalStore`] exists per run and is threaded through the VM; there
//! is no process-wide mutable state.

use super::value::Value;
use crate::parser::ast::Type;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalStore {
    values: Vec<Value>,
}

impl GlobalStore {
    /// A store with one zeroed slot per declared global
    pub fn new(types: &[Type]) -> Self {
        GlobalStore {
            values: types.iter().map(|ty| Value::zero(*ty)).collect(),
        }
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        self.values.get(index).copied()
    }

    /// Overwrite a slot; returns false if `index` is out of range
    pub fn set(&mut self, index: usize, value: Value) -> bool {
        match self.values.get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_globals_start_zeroed() {
        let store = GlobalStore::new(&[Type::Int, Type::Char]);
        assert_eq!(store.values(), &[Value::Int(0), Value::Char(0)]);
    }

    #[test]
    fn test_set_out_of_range() {
        let mut store = GlobalStore::new(&[Type::Int]);
        assert!(store.set(0, Value::Int(15)));
        assert!(!store.set(1, Value::Int(1)));
        assert_eq!(store.get(0), Some(Value::Int(15)));
        assert_eq!(store.get(1), None);
    }
}
