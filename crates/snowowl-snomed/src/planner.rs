//! Import planning over the dependency graph of one slice.
//!
//! Components are grouped into strongly connected components with Tarjan's
//! algorithm. A concept and its descriptions and relationships depend on each
//! other, so they always land in the same group. Groups come out
//! dependencies first and are packed into batches that are committed one by
//! one.

use snowowl_types::SctId;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Orders the nodes of `dependencies` into batches.
///
/// Every node appears in exactly one batch. A node's dependencies are in the
/// same or an earlier batch. A strongly connected component is never split,
/// so a batch can exceed `batch_size` when one component is larger.
pub fn import_plan(
    dependencies: &BTreeMap<SctId, BTreeSet<SctId>>,
    batch_size: usize,
) -> Vec<Vec<SctId>> {
    let batch_size = batch_size.max(1);
    let mut batches = Vec::new();
    let mut current: Vec<SctId> = Vec::new();

    for component in strongly_connected_components(dependencies) {
        if !current.is_empty() && current.len() + component.len() > batch_size {
            batches.push(std::mem::take(&mut current));
        }
        current.extend(component);
    }
    if !current.is_empty() {
        batches.push(current);
    }
    batches
}

/// Strongly connected components in dependency order.
///
/// Iterative, so deep dependency chains cannot overflow the stack.
pub fn strongly_connected_components(
    dependencies: &BTreeMap<SctId, BTreeSet<SctId>>,
) -> Vec<Vec<SctId>> {
    let mut tarjan = Tarjan::new(dependencies);
    for &root in dependencies.keys() {
        if !tarjan.index.contains_key(&root) {
            tarjan.run(root);
        }
    }
    tarjan.components
}

struct Frame {
    node: SctId,
    successors: Vec<SctId>,
    next: usize,
}

struct Tarjan<'a> {
    dependencies: &'a BTreeMap<SctId, BTreeSet<SctId>>,
    index: HashMap<SctId, usize>,
    lowlink: HashMap<SctId, usize>,
    stack: Vec<SctId>,
    on_stack: HashSet<SctId>,
    next_index: usize,
    components: Vec<Vec<SctId>>,
}

impl<'a> Tarjan<'a> {
    fn new(dependencies: &'a BTreeMap<SctId, BTreeSet<SctId>>) -> Self {
        Self {
            dependencies,
            index: HashMap::new(),
            lowlink: HashMap::new(),
            stack: Vec::new(),
            on_stack: HashSet::new(),
            next_index: 0,
            components: Vec::new(),
        }
    }

    fn enter(&mut self, node: SctId) -> Frame {
        self.index.insert(node, self.next_index);
        self.lowlink.insert(node, self.next_index);
        self.next_index += 1;
        self.stack.push(node);
        self.on_stack.insert(node);
        Frame {
            node,
            successors: self
                .dependencies
                .get(&node)
                .map(|deps| deps.iter().copied().collect())
                .unwrap_or_default(),
            next: 0,
        }
    }

    fn lower(&mut self, node: SctId, value: usize) {
        if let Some(low) = self.lowlink.get_mut(&node) {
            *low = (*low).min(value);
        }
    }

    fn run(&mut self, root: SctId) {
        let mut call_stack = vec![self.enter(root)];

        while let Some(frame) = call_stack.last_mut() {
            if let Some(&successor) = frame.successors.get(frame.next) {
                frame.next += 1;
                let node = frame.node;
                match self.index.get(&successor).copied() {
                    None => call_stack.push(self.enter(successor)),
                    Some(successor_index) if self.on_stack.contains(&successor) => {
                        self.lower(node, successor_index);
                    }
                    Some(_) => {}
                }
                continue;
            }

            let node = frame.node;
            call_stack.pop();

            let low = self.lowlink.get(&node).copied().unwrap_or(0);
            if Some(&low) == self.index.get(&node) {
                let mut component = Vec::new();
                while let Some(member) = self.stack.pop() {
                    self.on_stack.remove(&member);
                    component.push(member);
                    if member == node {
                        break;
                    }
                }
                component.sort_unstable();
                self.components.push(component);
            }

            if let Some(parent) = call_stack.last() {
                let parent = parent.node;
                self.lower(parent, low);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_graph(edges: &[(SctId, SctId)]) -> BTreeMap<SctId, BTreeSet<SctId>> {
        let mut graph: BTreeMap<SctId, BTreeSet<SctId>> = BTreeMap::new();
        for &(from, to) in edges {
            graph.entry(from).or_default().insert(to);
        }
        graph
    }

    fn batch_of(plan: &[Vec<SctId>], id: SctId) -> usize {
        plan.iter().position(|batch| batch.contains(&id)).unwrap()
    }

    #[test]
    fn test_dependencies_come_first() {
        // 3 depends on 2, 2 depends on 1
        let graph = make_graph(&[(3, 2), (2, 1)]);
        let plan = import_plan(&graph, 1);
        assert_eq!(plan, vec![vec![1], vec![2], vec![3]]);
    }

    #[test]
    fn test_cycles_stay_together() {
        let graph = make_graph(&[(10, 20), (20, 10), (20, 30), (40, 10)]);
        let plan = import_plan(&graph, 1);
        assert_eq!(plan, vec![vec![30], vec![10, 20], vec![40]]);
    }

    #[test]
    fn test_batches_are_packed() {
        let graph = make_graph(&[(1, 100), (2, 100), (3, 100), (4, 100)]);
        let plan = import_plan(&graph, 3);
        assert_eq!(plan.len(), 2);
        assert_eq!(plan.iter().map(Vec::len).sum::<usize>(), 5);
        assert_eq!(batch_of(&plan, 100), 0);

        let single = import_plan(&graph, 60_000);
        assert_eq!(single.len(), 1);
    }

    #[test]
    fn test_every_dependency_is_planned_no_later() {
        let edges = [
            (73211009, 900000000000207008),
            (754786011, 73211009),
            (73211009, 754786011),
            (100000028, 73211009),
            (73211009, 100000028),
            (100000028, 116680003),
            (116680003, 900000000000207008),
        ];
        let graph = make_graph(&edges);
        let plan = import_plan(&graph, 2);
        for (from, to) in edges {
            assert!(batch_of(&plan, to) <= batch_of(&plan, from), "{} before {}", to, from);
        }
        assert_eq!(batch_of(&plan, 73211009), batch_of(&plan, 754786011));
        assert_eq!(batch_of(&plan, 73211009), batch_of(&plan, 100000028));
    }

    #[test]
    fn test_long_chain_does_not_recurse() {
        let edges: Vec<(SctId, SctId)> = (1..50_000).map(|i| (i + 1, i)).collect();
        let graph = make_graph(&edges);
        let components = strongly_connected_components(&graph);
        assert_eq!(components.len(), 50_000);
        assert_eq!(components[0], vec![1]);
    }
}
