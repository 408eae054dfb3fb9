//! Exact backward induction over a built [`SearchTree`].
//!
//! No pruning and no depth limit: every leaf is scored and every internal node takes the
//! extremal child value for its [`NodeKind`](crate::tree::NodeKind). Among equal values the
//! child enumerated first wins.

use crate::state::GameState;
use crate::tree::{NodeId, SearchTree};

/// Leaf reached by optimal play from a node, and its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Solution {
    pub leaf: NodeId,
    pub value: i32,
}

/// Solves the whole tree and returns the root's solution.
pub fn solve<S: GameState>(tree: &SearchTree<S>) -> Solution {
    backup(tree)[NodeId::ROOT.index()]
}

/// Solutions for every node, indexed by [`NodeId::index`].
pub fn backup<S: GameState>(tree: &SearchTree<S>) -> Vec<Solution> {
    let mut solved = vec![
        Solution {
            leaf: NodeId::ROOT,
            value: 0,
        };
        tree.len()
    ];

    // Children sit at higher indices than their parents, so a reverse sweep sees them first.
    for id in tree.ids().rev() {
        let node = tree.node(id);
        solved[id.index()] = match node.children().split_first() {
            None => Solution {
                leaf: id,
                value: node.reward(),
            },
            Some((first, rest)) => {
                let kind = node.kind();
                rest.iter()
                    .map(|child| solved[child.index()])
                    .fold(solved[first.index()], |best, candidate| {
                        if kind.improves(candidate.value, best.value) {
                            candidate
                        } else {
                            best
                        }
                    })
            }
        };
    }
    solved
}
