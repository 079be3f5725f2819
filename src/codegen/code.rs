//! Bytecode buffer with operand-stack tracking and label patching
//!
//! Emission after an unconditional transfer (return, throw, goto, switch)
//! is dropped until a label that some jump targets is placed, the same
//! alive/dead discipline javac's `Code` keeps.

use super::descriptor::Kind;
use super::error::BytecodeError;
use super::opcodes::{self, stack_effect};

type Result<T> = std::result::Result<T, BytecodeError>;

/// Jump target handed out by [`Code::new_label`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Label(usize);

#[derive(Debug, Default, Clone)]
struct LabelState {
    pc: Option<usize>,
    /// Stack depth on arrival, recorded by the first jump or placement
    stack: Option<u16>,
}

#[derive(Debug, Clone)]
struct Fixup {
    /// Offsets are relative to the instruction's opcode
    opcode_pc: usize,
    operand_pc: usize,
    label: Label,
    wide: bool,
}

#[derive(Debug, Clone)]
pub struct Code {
    code: Vec<u8>,
    stack: u16,
    max_stack: u16,
    alive: bool,
    labels: Vec<LabelState>,
    fixups: Vec<Fixup>,
}

impl Default for Code {
    fn default() -> Self {
        Self::new()
    }
}

impl Code {
    pub fn new() -> Self {
        Self { code: Vec::new(), stack: 0, max_stack: 0, alive: true, labels: Vec::new(), fixups: Vec::new() }
    }

    pub fn cur_pc(&self) -> usize {
        self.code.len()
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn mark_dead(&mut self) {
        self.alive = false;
    }

    pub fn stack_depth(&self) -> u16 {
        self.stack
    }

    pub fn max_stack(&self) -> u16 {
        self.max_stack
    }

    // ------------------------------------------------------------------
    // raw emission and stack bookkeeping

    fn emit1(&mut self, od: u8) {
        self.code.push(od);
    }

    fn emit2(&mut self, od: u16) {
        self.code.extend_from_slice(&od.to_be_bytes());
    }

    fn emit4(&mut self, od: u32) {
        self.code.extend_from_slice(&od.to_be_bytes());
    }

    fn pop(&mut self, n: u16) -> Result<()> {
        self.stack = self.stack.checked_sub(n).ok_or(BytecodeError::StackUnderflow)?;
        Ok(())
    }

    fn push(&mut self, n: u16) {
        self.stack += n;
        self.max_stack = self.max_stack.max(self.stack);
    }

    fn effect(&mut self, pops: u16, pushes: u16) -> Result<()> {
        self.pop(pops)?;
        self.push(pushes);
        Ok(())
    }

    fn after_transfer(&mut self, op: u8) {
        if opcodes::is_return(op) || op == opcodes::ATHROW || op == opcodes::GOTO {
            self.alive = false;
        }
    }

    // ------------------------------------------------------------------
    // instructions

    /// Emit an operand-less instruction with a fixed stack effect.
    pub fn emitop(&mut self, op: u8) -> Result<()> {
        if !self.alive {
            return Ok(());
        }
        let (pops, pushes) = stack_effect(op).ok_or(BytecodeError::NeedsOperands(op))?;
        self.emit1(op);
        self.effect(pops, pushes)?;
        self.after_transfer(op);
        Ok(())
    }

    /// `bipush`, `newarray`: one operand byte, fixed stack effect.
    pub fn emitop1(&mut self, op: u8, od: u8) -> Result<()> {
        if !self.alive {
            return Ok(());
        }
        let (pops, pushes) = stack_effect(op).ok_or(BytecodeError::NeedsOperands(op))?;
        self.emit1(op);
        self.emit1(od);
        self.effect(pops, pushes)
    }

    /// `sipush`, `new`, `anewarray`, `checkcast`: two operand bytes, fixed
    /// stack effect.
    pub fn emitop2(&mut self, op: u8, od: u16) -> Result<()> {
        if !self.alive {
            return Ok(());
        }
        let (pops, pushes) = stack_effect(op).ok_or(BytecodeError::NeedsOperands(op))?;
        self.emit1(op);
        self.emit2(od);
        self.effect(pops, pushes)
    }

    /// Push an int with `iconst`, `bipush` or `sipush`; `false` when the
    /// value needs a pool constant instead.
    pub fn emit_int(&mut self, value: i32) -> Result<bool> {
        match value {
            -1..=5 => self.emitop((opcodes::ICONST_0 as i32 + value) as u8)?,
            -128..=127 => self.emitop1(opcodes::BIPUSH, value as i8 as u8)?,
            -32768..=32767 => self.emitop2(opcodes::SIPUSH, value as i16 as u16)?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    /// Load a constant pool entry; `width` 2 selects `ldc2_w`.
    pub fn emit_ldc(&mut self, index: u16, width: u16) -> Result<()> {
        if !self.alive {
            return Ok(());
        }
        if width == 2 {
            self.emit1(opcodes::LDC2_W);
            self.emit2(index);
        } else if index <= 0xFF {
            self.emit1(opcodes::LDC);
            self.emit1(index as u8);
        } else {
            self.emit1(opcodes::LDC_W);
            self.emit2(index);
        }
        self.push(width);
        Ok(())
    }

    fn local_op(&mut self, base: u8, short_base: u8, kind: Kind, slot: u16) {
        let offset = kind.family_offset();
        if slot <= 3 {
            self.emit1(short_base + offset * 4 + slot as u8);
        } else if slot <= 0xFF {
            self.emit1(base + offset);
            self.emit1(slot as u8);
        } else {
            self.emit1(opcodes::WIDE);
            self.emit1(base + offset);
            self.emit2(slot);
        }
    }

    /// Width-aware local load: `iload`, `lload`, `fload`, `dload`, `aload`.
    pub fn emit_load(&mut self, kind: Kind, slot: u16) -> Result<()> {
        if !self.alive {
            return Ok(());
        }
        self.local_op(opcodes::ILOAD, opcodes::ILOAD_0, kind, slot);
        self.push(kind.width());
        Ok(())
    }

    pub fn emit_store(&mut self, kind: Kind, slot: u16) -> Result<()> {
        if !self.alive {
            return Ok(());
        }
        self.local_op(opcodes::ISTORE, opcodes::ISTORE_0, kind, slot);
        self.pop(kind.width())
    }

    pub fn emit_return(&mut self, kind: Kind) -> Result<()> {
        match kind {
            Kind::Void => self.emitop(opcodes::RETURN),
            _ => self.emitop(opcodes::IRETURN + kind.family_offset()),
        }
    }

    /// Method invocation; `arg_slots` excludes the receiver.
    pub fn emit_invoke(&mut self, op: u8, index: u16, arg_slots: u16, return_slots: u16) -> Result<()> {
        if !self.alive {
            return Ok(());
        }
        self.emit1(op);
        self.emit2(index);
        let receiver = u16::from(op != opcodes::INVOKESTATIC);
        if op == opcodes::INVOKEINTERFACE {
            self.emit1((arg_slots + 1) as u8);
            self.emit1(0);
        }
        self.effect(arg_slots + receiver, return_slots)
    }

    /// `getstatic`, `putstatic`, `getfield`, `putfield` on a field of `width` slots.
    pub fn emit_field(&mut self, op: u8, index: u16, width: u16) -> Result<()> {
        if !self.alive {
            return Ok(());
        }
        self.emit1(op);
        self.emit2(index);
        match op {
            opcodes::GETSTATIC => self.effect(0, width),
            opcodes::PUTSTATIC => self.effect(width, 0),
            opcodes::GETFIELD => self.effect(1, width),
            _ => self.effect(width + 1, 0),
        }
    }

    // ------------------------------------------------------------------
    // labels and jumps

    pub fn new_label(&mut self) -> Label {
        self.labels.push(LabelState::default());
        Label(self.labels.len() - 1)
    }

    fn record_arrival(&mut self, label: Label) {
        let state = &mut self.labels[label.0];
        if state.stack.is_none() {
            state.stack = Some(self.stack);
        }
    }

    /// Bind `label` to the current pc. Dead code comes back to life when
    /// some jump already targets the label.
    pub fn place(&mut self, label: Label) {
        if self.alive {
            self.record_arrival(label);
        } else if let Some(depth) = self.labels[label.0].stack {
            self.stack = depth;
            self.alive = true;
        }
        self.labels[label.0].pc = Some(self.cur_pc());
    }

    /// Conditional or unconditional jump with a 16-bit offset.
    pub fn emit_jump(&mut self, op: u8, label: Label) -> Result<()> {
        if !self.alive {
            return Ok(());
        }
        let (pops, _) = stack_effect(op).ok_or(BytecodeError::NeedsOperands(op))?;
        let opcode_pc = self.cur_pc();
        self.emit1(op);
        self.fixups.push(Fixup { opcode_pc, operand_pc: self.cur_pc(), label, wide: false });
        self.emit2(0);
        self.pop(pops)?;
        self.record_arrival(label);
        self.after_transfer(op);
        Ok(())
    }

    /// `lookupswitch` over the int on top of the stack; `pairs` must be
    /// sorted by key.
    pub fn emit_lookupswitch(&mut self, default: Label, pairs: &[(i32, Label)]) -> Result<()> {
        if !self.alive {
            return Ok(());
        }
        let opcode_pc = self.cur_pc();
        self.emit1(opcodes::LOOKUPSWITCH);
        while self.cur_pc() % 4 != 0 {
            self.emit1(0);
        }
        self.pop(1)?;
        self.fixups.push(Fixup { opcode_pc, operand_pc: self.cur_pc(), label: default, wide: true });
        self.emit4(0);
        self.emit4(pairs.len() as u32);
        self.record_arrival(default);
        for (key, label) in pairs {
            self.emit4(*key as u32);
            self.fixups.push(Fixup { opcode_pc, operand_pc: self.cur_pc(), label: *label, wide: true });
            self.emit4(0);
            self.record_arrival(*label);
        }
        self.alive = false;
        Ok(())
    }

    /// Patch every jump and hand back the finished bytes.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        for fixup in &self.fixups {
            let target = self.labels[fixup.label.0].pc.ok_or(BytecodeError::UnplacedLabel(fixup.label.0))?;
            let offset = target as i64 - fixup.opcode_pc as i64;
            let at = fixup.operand_pc;
            if fixup.wide {
                self.code[at..at + 4].copy_from_slice(&(offset as i32).to_be_bytes());
            } else {
                let short = i16::try_from(offset).map_err(|_| BytecodeError::BranchTooFar(offset))?;
                self.code[at..at + 2].copy_from_slice(&short.to_be_bytes());
            }
        }
        if self.code.len() > u16::MAX as usize {
            return Err(BytecodeError::CodeTooLarge);
        }
        Ok(self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::opcodes::*;

    #[test]
    fn tracks_max_stack() {
        let mut code = Code::new();
        code.emit_load(Kind::Double, 0).unwrap();
        code.emit_load(Kind::Double, 2).unwrap();
        code.emitop(DADD).unwrap();
        code.emit_return(Kind::Double).unwrap();
        assert_eq!(code.max_stack(), 4);
        assert_eq!(code.stack_depth(), 0);
        assert_eq!(code.finish().unwrap(), vec![DLOAD_0, DLOAD_2, DADD, DRETURN]);
    }

    #[test]
    fn underflow_is_reported() {
        let mut code = Code::new();
        assert_eq!(code.emitop(POP), Err(BytecodeError::StackUnderflow));
    }

    #[test]
    fn forward_jump_is_patched() {
        let mut code = Code::new();
        let end = code.new_label();
        code.emit_load(Kind::Int, 1).unwrap();
        code.emit_jump(IFEQ, end).unwrap();
        code.emitop(ICONST_1).unwrap();
        code.emitop(POP).unwrap();
        code.place(end);
        code.emitop(RETURN).unwrap();
        let bytes = code.finish().unwrap();
        assert_eq!(bytes, vec![ILOAD_1, IFEQ, 0, 5, ICONST_1, POP, RETURN]);
    }

    #[test]
    fn dead_code_is_dropped_until_a_target() {
        let mut code = Code::new();
        let skip = code.new_label();
        code.emitop(RETURN).unwrap();
        code.emitop(ICONST_0).unwrap();
        assert_eq!(code.cur_pc(), 1);
        code.place(skip);
        assert!(!code.is_alive());
    }

    #[test]
    fn wide_locals_use_prefix() {
        let mut code = Code::new();
        code.emit_load(Kind::Reference, 4).unwrap();
        code.emit_store(Kind::Reference, 300).unwrap();
        assert_eq!(code.finish().unwrap(), vec![ALOAD, 4, WIDE, ASTORE, 1, 44]);
    }

    #[test]
    fn unplaced_label_fails() {
        let mut code = Code::new();
        let nowhere = code.new_label();
        code.emit_jump(GOTO, nowhere).unwrap();
        assert_eq!(code.finish(), Err(BytecodeError::UnplacedLabel(0)));
    }

    #[test]
    fn int_constants_pick_shortest_form() {
        let mut code = Code::new();
        code.emit_int(-1).unwrap();
        code.emit_int(100).unwrap();
        code.emit_int(1000).unwrap();
        assert!(!code.emit_int(100_000).unwrap());
        assert_eq!(code.finish().unwrap(), vec![ICONST_M1, BIPUSH, 100, SIPUSH, 0x03, 0xE8]);
    }
}
