//! Local-variable slot allocation for one method activation
//!
//! Bindings are a stack: `push` appends at the running size, `pop` drops
//! the latest binding and rewinds the size to its offset. Scopes checkpoint
//! the size so a block's locals are released when it closes.

use super::error::BytecodeError;
use crate::consts::slot_width;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    /// `None` for temporaries
    pub name: Option<String>,
    pub offset: u16,
    pub width: u16,
    /// Field descriptor when the binding was made through [`Slots::bind`]
    pub descriptor: Option<String>,
    pub is_final: bool,
}

#[derive(Debug, Default, Clone)]
pub struct Slots {
    bindings: Vec<Binding>,
    size: u16,
    max_size: u16,
    scopes: Vec<u16>,
}

impl Slots {
    pub fn new() -> Self {
        Self::default()
    }

    /// `this` at slot 0 unless static, then one binding per parameter in
    /// order; parameters are `(name, source type)`.
    pub fn for_method<'p>(
        is_static: bool,
        params: impl IntoIterator<Item = (&'p str, &'p str)>,
    ) -> Result<Self, BytecodeError> {
        let mut slots = Self::new();
        if !is_static {
            slots.push("this", 1)?;
        }
        for (name, ty) in params {
            slots.push(name, slot_width(ty))?;
        }
        Ok(slots)
    }

    fn append(&mut self, binding: Binding) -> Result<u16, BytecodeError> {
        let next = u32::from(self.size) + u32::from(binding.width);
        if next > u32::from(u16::MAX) {
            return Err(BytecodeError::LocalOutOfRange(next));
        }
        let offset = self.size;
        self.size = next as u16;
        self.max_size = self.max_size.max(self.size);
        self.bindings.push(Binding { offset, ..binding });
        Ok(offset)
    }

    pub fn push(&mut self, name: &str, width: u16) -> Result<u16, BytecodeError> {
        self.append(Binding { name: Some(name.to_string()), offset: 0, width, descriptor: None, is_final: false })
    }

    pub fn push_temp(&mut self, width: u16) -> Result<u16, BytecodeError> {
        self.append(Binding { name: None, offset: 0, width, descriptor: None, is_final: false })
    }

    /// Named binding that remembers its descriptor; width follows from it.
    pub fn bind(&mut self, name: &str, descriptor: &str) -> Result<u16, BytecodeError> {
        let width = super::descriptor::Kind::of(descriptor).width();
        self.append(Binding {
            name: Some(name.to_string()),
            offset: 0,
            width,
            descriptor: Some(descriptor.to_string()),
            is_final: false,
        })
    }

    /// Latest binding named `name` may no longer be assigned.
    pub fn set_final(&mut self, name: &str) {
        if let Some(binding) = self.bindings.iter_mut().rev().find(|b| b.name.as_deref() == Some(name)) {
            binding.is_final = true;
        }
    }

    /// Remove the latest binding; the size rewinds to its offset.
    pub fn pop(&mut self) -> Option<Binding> {
        let binding = self.bindings.pop();
        self.size = binding.as_ref().map(|b| b.offset).unwrap_or(0);
        binding
    }

    /// Slot of the most recent binding named `name`.
    pub fn get(&self, name: &str) -> Option<u16> {
        self.lookup(name).map(|b| b.offset)
    }

    pub fn lookup(&self, name: &str) -> Option<&Binding> {
        self.bindings.iter().rev().find(|b| b.name.as_deref() == Some(name))
    }

    /// Attach a descriptor to a binding made with a bare width (parameters).
    pub fn set_descriptor(&mut self, name: &str, descriptor: &str) {
        if let Some(binding) = self.bindings.iter_mut().rev().find(|b| b.name.as_deref() == Some(name)) {
            binding.descriptor = Some(descriptor.to_string());
        }
    }

    pub fn new_scope(&mut self) {
        self.scopes.push(self.size);
    }

    /// Pop bindings until the size is back at the latest checkpoint.
    pub fn clear_scope(&mut self) {
        let Some(checkpoint) = self.scopes.pop() else { return };
        while self.size > checkpoint {
            if self.pop().is_none() {
                break;
            }
        }
    }

    pub fn size(&self) -> u16 {
        self.size
    }

    /// High-water mark, the method's `max_locals`.
    pub fn max_size(&self) -> u16 {
        self.max_size
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_methods_bind_this_first() {
        let slots = Slots::for_method(false, [("a", "int"), ("b", "double"), ("c", "String")]).unwrap();
        assert_eq!(slots.get("this"), Some(0));
        assert_eq!(slots.get("a"), Some(1));
        assert_eq!(slots.get("b"), Some(2));
        assert_eq!(slots.get("c"), Some(4));
        assert_eq!(slots.size(), 5);
    }

    #[test]
    fn static_methods_start_at_zero() {
        let slots = Slots::for_method(true, [("x", "long")]).unwrap();
        assert_eq!(slots.get("x"), Some(0));
        assert_eq!(slots.get("this"), None);
        assert_eq!(slots.size(), 2);
    }

    #[test]
    fn pop_rewinds_to_offset() {
        let mut slots = Slots::new();
        slots.push("a", 1).unwrap();
        slots.push("d", 2).unwrap();
        assert_eq!(slots.size(), 3);
        let popped = slots.pop().unwrap();
        assert_eq!(popped.offset, 1);
        assert_eq!(slots.size(), 1);
        slots.pop();
        assert_eq!(slots.pop(), None);
        assert_eq!(slots.size(), 0);
        assert_eq!(slots.max_size(), 3);
    }

    #[test]
    fn anonymous_temps_take_slots_without_names() {
        let mut slots = Slots::for_method(true, [("n", "int")]).unwrap();
        assert_eq!(slots.push_temp(2).unwrap(), 1);
        assert_eq!(slots.push_temp(1).unwrap(), 3);
        assert_eq!(slots.size(), 4);
        assert_eq!(slots.len(), 3);
        assert_eq!(slots.get("n"), Some(0));
        assert!(slots.lookup("").is_none());
        let temp = slots.pop().unwrap();
        assert_eq!((temp.name, temp.offset), (None, 3));
        assert_eq!(slots.size(), 3);
        assert_eq!(slots.max_size(), 4);
    }

    #[test]
    fn scope_restores_size() {
        let mut slots = Slots::for_method(false, [("p", "int")]).unwrap();
        slots.new_scope();
        for name in ["x", "y", "z"] {
            slots.push(name, 1).unwrap();
        }
        assert_eq!(slots.size(), 5);
        slots.clear_scope();
        assert_eq!(slots.size(), 2);
        assert_eq!(slots.len(), 2);
        assert_eq!(slots.get("x"), None);
    }

    #[test]
    fn shadowing_returns_latest() {
        let mut slots = Slots::new();
        slots.push("v", 1).unwrap();
        slots.new_scope();
        slots.bind("v", "J").unwrap();
        assert_eq!(slots.get("v"), Some(1));
        assert_eq!(slots.lookup("v").and_then(|b| b.descriptor.as_deref()), Some("J"));
        slots.set_final("v");
        assert!(slots.lookup("v").map_or(false, |b| b.is_final));
        slots.clear_scope();
        assert_eq!(slots.get("v"), Some(0));
        assert!(!slots.lookup("v").map_or(true, |b| b.is_final));
    }
}
