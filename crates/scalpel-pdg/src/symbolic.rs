//! Bounded symbolic interpreter (spec.md §4.6 "Symbolic interpreter"),
//! grounded on `codegraph-ir/src/features/smt`'s orchestrator: a
//! single-threaded cooperative scheduler over a priority queue of
//! states, value summaries instead of solver-level sum types (guarded
//! unions, never `ite`-over-typed-vars), and the Bug-Likely path
//! prioritization heuristic from spec.md's formula verbatim.

use crate::cfg::{build_cfg, Cfg, CfgEdgeKind};
use crate::solver::{SatResult, Solver};
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use scalpel_core::cancel::CancellationToken;
use scalpel_core::config::SymbolicConfig;
use scalpel_core::finding::{Finding, Severity, UirNodeRef};
use scalpel_core::uir::{NodeId, UirTree};
use scalpel_core::SymbolId;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap, HashMap, HashSet, VecDeque};
use std::path::Path;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct SymbolicFinding {
    pub sink: NodeId,
    pub path_condition: String,
    /// 1.0 when the solver proved the path feasible; reduced (but never
    /// dropped) when the solver returned `unknown` for any branch along
    /// the path, per spec.md §4.6 "fails-closed".
    pub confidence: f32,
}

impl SymbolicFinding {
    /// Lower this into the shared `Finding` model. `file`/`tree`/`source`
    /// supply the location the engine itself doesn't carry.
    pub fn into_finding(self, file: &Path, tree: &UirTree, source: &[u8]) -> Finding {
        let location = node_ref(file, tree, source, self.sink);
        Finding {
            id: format!("symbolic:{}:{}", file.display(), self.sink.0),
            severity: Severity::High,
            kind: "symbolic_reachable_sink".to_string(),
            primary_location: location.clone(),
            trace: vec![location],
            confidence: self.confidence,
            evidence: self.path_condition,
            fix_hint: None,
        }
    }
}

pub(crate) fn node_ref(file: &Path, tree: &UirTree, source: &[u8], node: NodeId) -> UirNodeRef {
    let byte_range = tree.get(node).byte_range;
    UirNodeRef {
        file: file.to_path_buf(),
        node,
        byte_range,
        line: line_of(source, byte_range.start),
    }
}

/// 1-based line number of the byte offset, counting newlines that precede it.
pub(crate) fn line_of(source: &[u8], offset: u32) -> u32 {
    source[..(offset as usize).min(source.len())]
        .iter()
        .filter(|&&b| b == b'\n')
        .count() as u32
        + 1
}

/// Guarded union of possible values for one variable: each entry pairs a
/// path condition (the guard under which the assignment happened) with
/// the source text of the assigned expression. Merging two summaries
/// unions their guards rather than collapsing to one value, so a later
/// branch doesn't erase what an earlier one proved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueSummary {
    guards: Vec<(String, String)>,
}

impl ValueSummary {
    fn assign(path_condition: &str, value_text: &str) -> Self {
        Self { guards: vec![(path_condition.to_string(), value_text.to_string())] }
    }

    fn merge(&self, other: &Self) -> Self {
        let mut guards = self.guards.clone();
        for pair in &other.guards {
            if !guards.contains(pair) {
                guards.push(pair.clone());
            }
        }
        Self { guards }
    }
}

type Store = BTreeMap<SymbolId, ValueSummary>;

fn merge_store(into: &mut Store, from: &Store) {
    for (symbol, summary) in from {
        into.entry(symbol.clone())
            .and_modify(|existing| *existing = existing.merge(summary))
            .or_insert_with(|| summary.clone());
    }
}

#[derive(Debug, Default)]
pub struct SymbolicResult {
    pub findings: Vec<SymbolicFinding>,
    pub budget_exhausted: bool,
    pub cancelled: bool,
}

#[derive(Clone)]
struct State {
    pc: NodeIndex,
    path_condition: String,
    depth: usize,
    confidence: f32,
    priority: f64,
    store: Store,
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority
    }
}
impl Eq for State {}
impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority.partial_cmp(&other.priority).unwrap_or(Ordering::Equal)
    }
}

#[allow(clippy::too_many_arguments)]
pub fn symbolic_execute(
    tree: &UirTree,
    function_root: NodeId,
    sinks: &[NodeId],
    source: &[u8],
    config: &SymbolicConfig,
    solver: &dyn Solver,
    cancellation: &CancellationToken,
) -> SymbolicResult {
    let cfg = build_cfg(tree, function_root);
    let sink_set: HashSet<NodeId> = sinks.iter().copied().collect();
    let cyclomatic = cyclomatic_complexity(&cfg);
    let dist_to_sink = distance_to_sinks(&cfg, &sink_set);

    let mut result = SymbolicResult::default();
    let started = Instant::now();
    let mut explored: HashMap<(NodeIndex, String), Store> = HashMap::new();
    let mut states_seen = 0usize;

    let mut queue = BinaryHeap::new();
    queue.push(State {
        pc: cfg.entry,
        path_condition: "true".to_string(),
        depth: 0,
        confidence: 1.0,
        priority: priority_of(cfg.entry, 0, cyclomatic, &dist_to_sink, config),
        store: Store::new(),
    });

    while let Some(mut state) = queue.pop() {
        if cancellation.is_cancelled() {
            result.cancelled = true;
            break;
        }
        if started.elapsed().as_millis() as u64 >= config.wall_clock_budget_ms
            || states_seen >= config.max_states
        {
            result.budget_exhausted = true;
            break;
        }
        states_seen += 1;

        let key = (state.pc, state.path_condition.clone());
        if let Some(existing) = explored.get_mut(&key) {
            // Same (pc, path_condition) reached again: union the stores
            // instead of dropping this path's contribution.
            merge_store(existing, &state.store);
            continue;
        }

        let stmt = cfg.graph[state.pc];
        let node = tree.get(stmt);
        if node.kind == scalpel_core::uir::UirNodeKind::Assign {
            if let (Some(&target), Some(&value)) = (node.children.first(), node.children.get(1)) {
                if let Some(symbol) = tree.get(target).symbol.clone() {
                    let range = tree.get(value).byte_range;
                    let text = std::str::from_utf8(&source[range.start as usize..range.end as usize]).unwrap_or("");
                    state
                        .store
                        .insert(symbol, ValueSummary::assign(&state.path_condition, text));
                }
            }
        }

        explored.insert(key, state.store.clone());

        if sink_set.contains(&stmt) {
            result.findings.push(SymbolicFinding {
                sink: stmt,
                path_condition: state.path_condition.clone(),
                confidence: state.confidence,
            });
        }

        if state.depth >= config.max_depth {
            continue;
        }

        let successors: Vec<_> = cfg.graph.edges_directed(state.pc, Direction::Outgoing).collect();
        if successors.len() <= 1 {
            for edge in successors {
                queue.push(next_state(&state, edge.target(), state.path_condition.clone(), cyclomatic, &dist_to_sink, config));
            }
            continue;
        }

        for (i, edge) in successors.iter().enumerate() {
            let branch_atom = format!("branch_{}_{} == 1", stmt.0, i);
            let path_condition = if state.path_condition == "true" {
                branch_atom
            } else {
                format!("{} && {}", state.path_condition, branch_atom)
            };
            let (feasible, confidence) = match solver.check_sat(&path_condition) {
                SatResult::Sat => (true, state.confidence),
                SatResult::Unsat => (false, state.confidence),
                SatResult::Unknown => (true, state.confidence * 0.5),
            };
            if !feasible {
                continue;
            }
            queue.push(next_state(
                &State { confidence, ..state.clone() },
                edge.target(),
                path_condition,
                cyclomatic,
                &dist_to_sink,
                config,
            ));
        }
    }

    result
}

fn next_state(
    from: &State,
    target: NodeIndex,
    path_condition: String,
    cyclomatic: usize,
    dist_to_sink: &HashMap<NodeIndex, usize>,
    config: &SymbolicConfig,
) -> State {
    let depth = from.depth + 1;
    State {
        pc: target,
        path_condition,
        depth,
        confidence: from.confidence,
        priority: priority_of(target, depth, cyclomatic, dist_to_sink, config),
        store: from.store.clone(),
    }
}

fn priority_of(
    node: NodeIndex,
    depth: usize,
    cyclomatic: usize,
    dist_to_sink: &HashMap<NodeIndex, usize>,
    config: &SymbolicConfig,
) -> f64 {
    let dist = dist_to_sink.get(&node).copied().unwrap_or(usize::MAX);
    let sink_term = if dist == usize::MAX {
        0.0
    } else {
        1.0 / (dist as f64 + 1.0)
    };
    config.weight_sink * sink_term
        + config.weight_complexity * cyclomatic as f64
        + config.weight_depth * -(depth as f64)
}

fn cyclomatic_complexity(cfg: &Cfg) -> usize {
    let edges = cfg.graph.edge_count();
    let nodes = cfg.graph.node_count();
    (edges as isize - nodes as isize + 2).max(1) as usize
}

fn distance_to_sinks(cfg: &Cfg, sinks: &HashSet<NodeId>) -> HashMap<NodeIndex, usize> {
    let mut dist = HashMap::new();
    let mut queue = VecDeque::new();
    for idx in cfg.graph.node_indices() {
        if sinks.contains(&cfg.graph[idx]) {
            dist.insert(idx, 0);
            queue.push_back(idx);
        }
    }
    while let Some(node) = queue.pop_front() {
        let d = dist[&node];
        for pred in cfg.graph.edges_directed(node, Direction::Incoming) {
            let kind = *pred.weight();
            if kind != CfgEdgeKind::Normal && kind != CfgEdgeKind::Exception {
                continue;
            }
            let p = pred.source();
            if !dist.contains_key(&p) {
                dist.insert(p, d + 1);
                queue.push_back(p);
            }
        }
    }
    dist
}
