use crate::graph::Graph;
use ahash::{AHashMap, AHashSet};
use std::collections::VecDeque;

/// Block ids visitable from the start block, following every branch of every
/// transition. References to missing blocks are skipped.
pub fn reachable_from_start(graph: &Graph) -> AHashSet<&str> {
    let start = graph.start_block_id();
    if !graph.contains(start) {
        return AHashSet::new();
    }

    let mut visited = AHashSet::new();
    let mut stack = vec![start];
    while let Some(id) = stack.pop() {
        if !visited.insert(id) {
            continue;
        }
        if let Some(block) = graph.block(id) {
            // Reverse so the first declared branch is explored first.
            stack.extend(
                block
                    .targets()
                    .into_iter()
                    .rev()
                    .filter(|target| graph.contains(target) && !visited.contains(target)),
            );
        }
    }
    visited
}

/// Reachable blocks from which no `final` block can be reached, in insertion
/// order. These are cycles (or dead ends) without an escape.
pub fn blocks_without_exit<'a>(graph: &'a Graph, reachable: &AHashSet<&'a str>) -> Vec<&'a str> {
    let mut incoming: AHashMap<&str, Vec<&str>> = AHashMap::new();
    for block in graph.blocks().iter().filter(|b| reachable.contains(b.id.as_str())) {
        for target in block.targets() {
            incoming.entry(target).or_default().push(block.id.as_str());
        }
    }

    let mut exits: AHashSet<&str> = AHashSet::new();
    let mut queue: VecDeque<&str> = graph
        .blocks()
        .iter()
        .filter(|b| b.is_final() && reachable.contains(b.id.as_str()))
        .map(|b| b.id.as_str())
        .collect();
    while let Some(id) = queue.pop_front() {
        if !exits.insert(id) {
            continue;
        }
        if let Some(sources) = incoming.get(id) {
            queue.extend(sources.iter().filter(|s| !exits.contains(*s)));
        }
    }

    graph
        .blocks()
        .iter()
        .map(|b| b.id.as_str())
        .filter(|id| reachable.contains(id) && !exits.contains(id))
        .collect()
}
