//! Compile-time symbol table.
//!
//! Mirrors the run-time frame chain. Every frame pushed with
//! [`CompileScope::push`] becomes exactly one `Env` at run time and numbers
//! its slots from zero. Frames pushed with [`CompileScope::push_lexical`]
//! only scope names; slots declared in them belong to the nearest run-time
//! frame. A name resolves to its symbol plus the number of run-time frames
//! between the use and the declaration, which is the `depth` a compiled
//! lookup walks.

use mica_ir::{Name, TypeDesc};
use mica_value::Value;
use rustc_hash::FxHashMap;

/// Where a symbol's value lives.
#[derive(Clone, Debug, PartialEq)]
pub enum StorageKind {
    /// A mutable slot.
    Var,
    /// A slot holding a declared function.
    Func,
    /// Folded at compile time; occupies no slot.
    Constant(Value),
}

/// A declared name.
#[derive(Clone, Debug, PartialEq)]
pub struct Symbol {
    pub name: Name,
    /// `None` for constants.
    pub slot: Option<usize>,
    pub ty: TypeDesc,
    pub storage: StorageKind,
}

impl Symbol {
    pub fn is_constant(&self) -> bool {
        matches!(self.storage, StorageKind::Constant(_))
    }
}

#[derive(Clone)]
struct Frame {
    symbols: FxHashMap<Name, Symbol>,
    next_slot: usize,
    /// Whether the frame exists at run time.
    runtime: bool,
}

impl Frame {
    fn new(runtime: bool) -> Self {
        Frame {
            symbols: FxHashMap::default(),
            next_slot: 0,
            runtime,
        }
    }
}

/// The whole scope at one point in time, for undoing a failed unit.
#[derive(Clone)]
pub struct ScopeSnapshot(Vec<Frame>);

/// Nested compile-time frames. The outermost frame holds the globals.
pub struct CompileScope {
    frames: Vec<Frame>,
}

impl CompileScope {
    pub fn new() -> Self {
        CompileScope {
            frames: vec![Frame::new(true)],
        }
    }

    /// Enter a frame that will exist at run time.
    pub fn push(&mut self) {
        self.frames.push(Frame::new(true));
    }

    /// Enter a scope with no run-time frame of its own.
    pub fn push_lexical(&mut self) {
        self.frames.push(Frame::new(false));
    }

    /// Leave the innermost frame, returning its slot count (always zero for
    /// a lexical frame). The global frame is never popped.
    pub fn pop(&mut self) -> usize {
        if self.frames.len() > 1 {
            self.frames.pop().map_or(0, |frame| frame.next_slot)
        } else {
            self.frame_size()
        }
    }

    /// Number of frames, lexical ones included.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Slots allocated so far in the innermost run-time frame.
    pub fn frame_size(&self) -> usize {
        self.frames
            .iter()
            .rev()
            .find(|frame| frame.runtime)
            .map_or(0, |frame| frame.next_slot)
    }

    pub fn snapshot(&self) -> ScopeSnapshot {
        ScopeSnapshot(self.frames.clone())
    }

    pub fn restore(&mut self, snapshot: ScopeSnapshot) {
        self.frames = snapshot.0;
    }

    /// Whether `name` is already declared in the innermost frame.
    pub fn declared_here(&self, name: Name) -> bool {
        self.frames
            .last()
            .is_some_and(|frame| frame.symbols.contains_key(&name))
    }

    /// Declare `name` in the innermost frame, allocating the next slot of the
    /// innermost run-time frame unless it is a constant. Redeclaring in the
    /// same frame replaces the symbol; callers that forbid it check
    /// [`CompileScope::declared_here`] first.
    pub fn declare(&mut self, name: Name, ty: TypeDesc, storage: StorageKind) -> Symbol {
        if self.frames.is_empty() {
            self.frames.push(Frame::new(true));
        }
        let slot = match storage {
            StorageKind::Constant(_) => None,
            StorageKind::Var | StorageKind::Func => {
                self.frames.iter_mut().rev().find(|frame| frame.runtime).map(|owner| {
                    let slot = owner.next_slot;
                    owner.next_slot += 1;
                    slot
                })
            }
        };
        let symbol = Symbol {
            name,
            slot,
            ty,
            storage,
        };
        if let Some(frame) = self.frames.last_mut() {
            frame.symbols.insert(name, symbol.clone());
        }
        symbol
    }

    /// Find `name`, innermost frame first. Returns the symbol and its
    /// distance in run-time frames from the innermost one.
    pub fn resolve(&self, name: Name) -> Option<(&Symbol, usize)> {
        let mut depth = 0;
        for frame in self.frames.iter().rev() {
            if let Some(symbol) = frame.symbols.get(&name) {
                return Some((symbol, depth));
            }
            if frame.runtime {
                depth += 1;
            }
        }
        None
    }
}

impl Default for CompileScope {
    fn default() -> Self {
        Self::new()
    }
}
