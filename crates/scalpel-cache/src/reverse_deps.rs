//! Reverse-dependency tracking for single-file invalidation (spec.md
//! §4.4: "The reverse-dependency set is recomputed from import edges in
//! the graph engine; invalidation evicts any cached artifact whose
//! inputs include an evicted key."). The graph engine calls
//! `record_dependency` as it discovers import edges; this crate only
//! owns the closure computation so C4 need not depend on C5 (dependency
//! order in spec.md §2 runs cache before graph).

use dashmap::DashMap;
use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;

#[derive(Default)]
pub struct ReverseDeps {
    /// depends_on -> set of paths that depend on it.
    dependents: DashMap<PathBuf, HashSet<PathBuf>>,
}

impl ReverseDeps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `dependent` imports/reads `depends_on`.
    pub fn record_dependency(&self, dependent: PathBuf, depends_on: PathBuf) {
        self.dependents
            .entry(depends_on)
            .or_default()
            .insert(dependent);
    }

    pub fn forget_path(&self, path: &PathBuf) {
        self.dependents.remove(path);
        for mut entry in self.dependents.iter_mut() {
            entry.value_mut().remove(path);
        }
    }

    /// Transitive closure of everything that (directly or indirectly)
    /// depends on `path`, including `path` itself.
    pub fn closure(&self, path: &PathBuf) -> HashSet<PathBuf> {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        visited.insert(path.clone());
        queue.push_back(path.clone());

        while let Some(current) = queue.pop_front() {
            if let Some(dependents) = self.dependents.get(&current) {
                for dependent in dependents.value() {
                    if visited.insert(dependent.clone()) {
                        queue.push_back(dependent.clone());
                    }
                }
            }
        }

        visited
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closure_follows_transitive_imports() {
        let deps = ReverseDeps::new();
        let a = PathBuf::from("a.py");
        let b = PathBuf::from("b.py");
        let c = PathBuf::from("c.py");
        // c imports b, b imports a
        deps.record_dependency(b.clone(), a.clone());
        deps.record_dependency(c.clone(), b.clone());

        let closure = deps.closure(&a);
        assert!(closure.contains(&a));
        assert!(closure.contains(&b));
        assert!(closure.contains(&c));
    }

    #[test]
    fn closure_of_unrelated_path_is_itself() {
        let deps = ReverseDeps::new();
        let a = PathBuf::from("a.py");
        let closure = deps.closure(&a);
        assert_eq!(closure.len(), 1);
    }
}
