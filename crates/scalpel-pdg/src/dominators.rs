//! Post-dominator tree, used by control-dependence computation
//! (spec.md §4.6). `petgraph::algo::dominators` computes dominators from
//! a root over a directed graph; post-dominators are dominators of the
//! graph with every edge reversed, rooted at the CFG's exit node.

use crate::cfg::Cfg;
use petgraph::algo::dominators::{simple_fast, Dominators};
use petgraph::graph::NodeIndex;
use petgraph::visit::Reversed;

pub struct PostDominators {
    inner: Dominators<NodeIndex>,
}

impl PostDominators {
    pub fn compute(cfg: &Cfg) -> Self {
        let reversed = Reversed(&cfg.graph);
        Self {
            inner: simple_fast(reversed, cfg.exit),
        }
    }

    /// The immediate post-dominator of `node`, or `None` for the exit
    /// node itself or for nodes unreachable from the exit (dead code).
    pub fn immediate(&self, node: NodeIndex) -> Option<NodeIndex> {
        self.inner.immediate_dominator(node)
    }

    /// Does `a` post-dominate `b`? (every path from `b` to the function
    /// exit passes through `a`.)
    pub fn post_dominates(&self, a: NodeIndex, b: NodeIndex) -> bool {
        if a == b {
            return true;
        }
        self.inner
            .strict_dominators(b)
            .map(|mut doms| doms.any(|d| d == a))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg::build_cfg;
    use scalpel_core::Language;

    #[test]
    fn exit_post_dominates_every_reachable_node() {
        let src = b"def f():\n    x = 1\n    return x\n";
        let tree = scalpel_parse::parse_and_lower(Language::Python, src, "m").unwrap();
        let cfg = build_cfg(&tree, tree.root);
        let pdom = PostDominators::compute(&cfg);
        assert!(pdom.post_dominates(cfg.exit, cfg.entry));
    }
}
