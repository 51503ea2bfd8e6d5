//! Interned identifiers.
//!
//! Locks runs strictly single-threaded (no `fn`-spawned tasks, no shared
//! mutable state across threads — see the concurrency model), so the
//! interner needs none of the locking the teacher's multi-threaded
//! compiler pipeline carried; a single [`std::cell::RefCell`] behind a
//! `thread_local!` is enough.

use crate::FxHashMap;
use bumpalo::Bump;
use std::cell::RefCell;
use std::fmt;

/// A compact, `Copy` handle to an interned string.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(u32);

thread_local! {
    static INTERNER: RefCell<Interner> = RefCell::new(Interner::new());
}

struct Interner {
    arena: Bump,
    strings: Vec<&'static str>,
    lookup: FxHashMap<&'static str, u32>,
}

impl Interner {
    fn new() -> Self {
        Self { arena: Bump::new(), strings: Vec::new(), lookup: FxHashMap::default() }
    }

    fn intern(&mut self, s: &str) -> u32 {
        if let Some(&idx) = self.lookup.get(s) {
            return idx;
        }
        let allocated: &str = self.arena.alloc_str(s);
        // SAFETY: the arena is never reset or dropped while the interner
        // lives (it lives for the whole process via `thread_local!`), so
        // this reference is valid for as long as anyone can observe it.
        let allocated: &'static str = unsafe { std::mem::transmute(allocated) };
        let idx = self.strings.len() as u32;
        self.strings.push(allocated);
        self.lookup.insert(allocated, idx);
        idx
    }

    fn resolve(&self, idx: u32) -> &'static str {
        self.strings[idx as usize]
    }
}

impl Symbol {
    pub fn intern(s: &str) -> Self {
        INTERNER.with(|i| Symbol(i.borrow_mut().intern(s)))
    }

    pub fn as_str(self) -> &'static str {
        INTERNER.with(|i| i.borrow().resolve(self.0))
    }

    pub fn eq_str(self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({:?})", self.as_str())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_text_interns_to_same_symbol() {
        let a = Symbol::intern("foo");
        let b = Symbol::intern("foo");
        let c = Symbol::intern("bar");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.as_str(), "foo");
    }
}
