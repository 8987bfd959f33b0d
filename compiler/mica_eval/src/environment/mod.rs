//! Run-time frames.
//!
//! A frame is a fixed number of indexed slots plus a link to the enclosing
//! frame. The compiler resolves every variable to a `(depth, slot)` pair, so
//! evaluation never looks anything up by name.
//!
//! Frames are shared (`Arc`) because a function literal captures the frame
//! it was created in and may outlive the call that created it. Walking the
//! chain during a lookup only borrows the links.

use std::fmt;
use std::sync::Arc;

use mica_value::{missing_frame, slot_out_of_range, EvalResult, Value};
use parking_lot::RwLock;

pub struct Env {
    slots: RwLock<Vec<Value>>,
    outer: Option<Arc<Env>>,
}

impl Env {
    /// A frame with no enclosing frame, all slots `Nil`.
    pub fn root(size: usize) -> Arc<Env> {
        Arc::new(Env {
            slots: RwLock::new(vec![Value::Nil; size]),
            outer: None,
        })
    }

    /// A frame nested in `outer`.
    pub fn child(outer: &Arc<Env>, size: usize) -> Arc<Env> {
        Arc::new(Env {
            slots: RwLock::new(vec![Value::Nil; size]),
            outer: Some(Arc::clone(outer)),
        })
    }

    /// Number of slots in this frame.
    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn outer(&self) -> Option<&Arc<Env>> {
        self.outer.as_ref()
    }

    /// The frame `depth` links out; `0` is this frame.
    pub fn frame(&self, depth: usize) -> EvalResult<&Env> {
        let mut frame = self;
        for _ in 0..depth {
            frame = frame.outer.as_deref().ok_or_else(|| missing_frame(depth))?;
        }
        Ok(frame)
    }

    /// Read slot `slot` of the frame `depth` links out.
    #[inline]
    pub fn lookup(&self, slot: usize, depth: usize) -> EvalResult<Value> {
        let frame = self.frame(depth)?;
        let slots = frame.slots.read();
        slots
            .get(slot)
            .cloned()
            .ok_or_else(|| slot_out_of_range(slot, slots.len()))
    }

    /// Store into slot `slot` of this frame.
    #[inline]
    pub fn bind(&self, slot: usize, value: Value) -> EvalResult<()> {
        let mut slots = self.slots.write();
        let len = slots.len();
        match slots.get_mut(slot) {
            Some(cell) => {
                *cell = value;
                Ok(())
            }
            None => Err(slot_out_of_range(slot, len)),
        }
    }

    /// Store into slot `slot` of the frame `depth` links out.
    pub fn assign(&self, slot: usize, depth: usize, value: Value) -> EvalResult<()> {
        self.frame(depth)?.bind(slot, value)
    }
}

impl fmt::Debug for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut depth = 0;
        let mut frame = self.outer.as_deref();
        while let Some(outer) = frame {
            depth += 1;
            frame = outer.outer.as_deref();
        }
        f.debug_struct("Env")
            .field("slots", &*self.slots.read())
            .field("enclosing_frames", &depth)
            .finish()
    }
}
