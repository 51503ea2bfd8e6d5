//! Scoped symbol table.
//!
//! Only a function body opens a new rib — `if`/`while`/bare `{ }` bodies
//! resolve and declare straight into the enclosing function (or module)
//! scope, matching the original analyzer exactly: a variable declared
//! inside an `if` stays visible for the rest of the function after it.

use lockc_util::{define_idx, DefId, FxHashMap, Idx, IndexVec};

define_idx!(RibId);

#[derive(Debug, Clone, Copy)]
pub enum RibKind {
    Module,
    Function,
}

#[derive(Debug, Clone, Copy)]
pub enum Binding {
    Var(DefId),
    Fun { def_id: DefId, arity: usize },
}

#[derive(Debug)]
pub struct Rib {
    bindings: FxHashMap<String, Binding>,
    parent: Option<RibId>,
    #[allow(dead_code)]
    kind: RibKind,
}

pub struct ScopeTree {
    ribs: IndexVec<RibId, Rib>,
    current: RibId,
}

impl ScopeTree {
    pub fn new() -> Self {
        let mut ribs = IndexVec::new();
        let root = ribs.push(Rib { bindings: FxHashMap::default(), parent: None, kind: RibKind::Module });
        Self { ribs, current: root }
    }

    pub fn enter_function(&mut self) {
        let rib = Rib { bindings: FxHashMap::default(), parent: Some(self.current), kind: RibKind::Function };
        self.current = self.ribs.push(rib);
    }

    pub fn exit_scope(&mut self) {
        if let Some(parent) = self.ribs[self.current].parent {
            self.current = parent;
        }
    }

    /// Declares `name` in the *current* rib, overwriting any existing
    /// binding; callers check [`declared_in_current_scope`] first when the
    /// duplicate check needs to differ (restricted for variables, full
    /// chain for functions).
    pub fn declare(&mut self, name: &str, binding: Binding) {
        self.ribs[self.current].bindings.insert(name.to_string(), binding);
    }

    pub fn declared_in_current_scope(&self, name: &str) -> bool {
        self.ribs[self.current].bindings.contains_key(name)
    }

    pub fn resolve(&self, name: &str) -> Option<Binding> {
        let mut rib_id = self.current;
        loop {
            let rib = &self.ribs[rib_id];
            if let Some(binding) = rib.bindings.get(name) {
                return Some(*binding);
            }
            match rib.parent {
                Some(parent) => rib_id = parent,
                None => return None,
            }
        }
    }
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_scopes_do_not_shadow_function_scope() {
        let mut tree = ScopeTree::new();
        tree.enter_function();
        tree.declare("x", Binding::Var(DefId(0)));
        assert!(tree.resolve("x").is_some());
        assert!(tree.declared_in_current_scope("x"));
    }

    #[test]
    fn unresolved_name_returns_none() {
        let tree = ScopeTree::new();
        assert!(tree.resolve("nope").is_none());
    }
}
