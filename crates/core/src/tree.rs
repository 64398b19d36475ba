use std::collections::HashMap;

use crate::model::span::SpanRecord;

/// A span placed in its causal tree: depth 0 for roots, parent's depth + 1
/// otherwise. Rebuilt from scratch on every call, never mutated by callers.
#[derive(Debug, Clone, PartialEq)]
pub struct SpanNode {
    pub span: SpanRecord,
    pub depth: usize,
}

/// Reconstructs the causal forest from a flat span list and flattens it
/// pre-order, children sorted chronologically.
///
/// Parentage degrades rather than errors: a missing or dangling
/// `parent_span_id`, a span naming itself as its parent, and the span that
/// would close a multi-hop reference cycle are all treated as roots. Real
/// traces routinely arrive partial, so the result is best-effort by design.
///
/// The output always contains every input span exactly once, in a
/// deterministic order: siblings are sorted by `start_ts` ascending with ties
/// keeping their relative input order.
pub fn build_ordered_spans(spans: &[SpanRecord]) -> Vec<SpanNode> {
    // Arena of parallel index vectors; parent links double as the ancestor
    // chain for cycle detection.
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(spans.len());
    for (i, span) in spans.iter().enumerate() {
        index.insert(span.span_id.as_str(), i);
    }

    let mut parent: Vec<Option<usize>> = vec![None; spans.len()];
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); spans.len()];
    let mut roots: Vec<usize> = Vec::new();

    for (i, span) in spans.iter().enumerate() {
        let resolved = span
            .parent_span_id
            .as_deref()
            .and_then(|pid| index.get(pid).copied())
            .filter(|&p| p != i && !would_cycle(&parent, p, i));
        match resolved {
            Some(p) => {
                parent[i] = Some(p);
                children[p].push(i);
            }
            None => {
                if span.parent_span_id.is_some() {
                    tracing::debug!(span_id = %span.span_id, "unresolvable or cyclic parent, treating as root");
                }
                roots.push(i);
            }
        }
    }

    // Stable sorts keep input order among equal timestamps.
    roots.sort_by_key(|&i| spans[i].start_ts);
    for kids in &mut children {
        kids.sort_by_key(|&i| spans[i].start_ts);
    }

    let mut flat = Vec::with_capacity(spans.len());
    let mut stack: Vec<(usize, usize)> = roots.iter().rev().map(|&i| (i, 0)).collect();
    while let Some((i, depth)) = stack.pop() {
        flat.push(SpanNode {
            span: spans[i].clone(),
            depth,
        });
        for &child in children[i].iter().rev() {
            stack.push((child, depth + 1));
        }
    }
    flat
}

// True when attaching `node` under `from` would close a cycle, i.e. `node`
// already sits on `from`'s ancestor chain. Only previously assigned parent
// links are walked, so the walk always terminates.
fn would_cycle(parent: &[Option<usize>], from: usize, node: usize) -> bool {
    let mut cursor = Some(from);
    while let Some(i) = cursor {
        if i == node {
            return true;
        }
        cursor = parent[i];
    }
    false
}
