/*
 * Length-limited canonical prefix-code construction.
 *
 * This is not classical Huffman. Symbols are inserted into an in-order tree
 * in descending frequency order; each insertion splices a new branch above
 * the deepest subtree still heavier than the new leaf, then re-balances the
 * path to the root so the heavier subtree stays on the left. The resulting
 * depth histogram is repaired for the length limit afterwards: every
 * over-deep entry is folded into the limit bin, and the histogram is then
 * redistributed until the Kraft sum is exactly one again. Depths come out
 * close to Huffman-optimal while construction needs only a small fixed
 * arena.
 */

use crate::mdeflate_constants::MAX_CW_LENGTH;
use crate::MdeflateError;

/// Per-symbol encoder state for one prefix code.
#[derive(Copy, Clone, Default)]
pub struct EncNode {
    pub code_word: u32,
    pub code_word_length: u32,
    pub count: u32,
    /// Frequency rank, 0 = most frequent; -1 while unassigned.
    pub order: i32,
}

/* Worst case is 33 participating symbols, so 65 tree nodes. */
const TREE_ARENA_NODES: usize = 64 * 2;

const NO_CHILD: i16 = -1;
/* Parent marker of the tree root. */
const HEAD: i16 = -2;

#[derive(Copy, Clone, Default)]
struct TreeNode {
    order: i32,
    count: u32,
    parent: i16,
    children: [i16; 2],
}

/// Scratch state for code construction. Reused across trees and blocks;
/// every call starts by clearing it.
pub struct CodeBuilder {
    arena: [TreeNode; TREE_ARENA_NODES],
    arena_len: usize,
    root: i16,
    max_depth: usize,
    num_overflow: i32,
    cw_length_counts: [i32; MAX_CW_LENGTH + 1],
}

impl CodeBuilder {
    pub fn new() -> Self {
        Self {
            arena: [TreeNode::default(); TREE_ARENA_NODES],
            arena_len: 0,
            root: NO_CHILD,
            max_depth: 0,
            num_overflow: 0,
            cw_length_counts: [0; MAX_CW_LENGTH + 1],
        }
    }

    fn alloc_node(&mut self) -> i16 {
        let idx = self.arena_len;
        self.arena_len += 1;
        idx as i16
    }

    /// Fill in `code_word_length` for every symbol from its `count`, limited
    /// to `max_cw_length` bits. Returns the number of participating symbols;
    /// zero means the code is unused and carries an all-zero length vector.
    pub fn construct_tree(
        &mut self,
        nodes: &mut [EncNode],
        max_cw_length: usize,
    ) -> Result<usize, MdeflateError> {
        let num_nodes = nodes.len();

        let mut non_zero = 0usize;
        let mut last_non_zero = 0usize;
        for (idx, node) in nodes.iter_mut().enumerate() {
            node.code_word = 0;
            node.code_word_length = 0;
            node.order = -1;
            if node.count > 0 {
                non_zero += 1;
                last_non_zero = idx;
            }
        }

        self.cw_length_counts = [0; MAX_CW_LENGTH + 1];
        self.arena = [TreeNode::default(); TREE_ARENA_NODES];
        self.arena_len = 0;
        self.root = NO_CHILD;
        self.num_overflow = 0;
        self.max_depth = max_cw_length;

        if non_zero == 0 {
            return Ok(0);
        }

        /* A prefix code needs at least two participants; conscript a
         * companion symbol with count 1. */
        if non_zero == 1 {
            if last_non_zero < num_nodes - 1 {
                nodes[num_nodes - 1].count = 1;
            } else {
                nodes[num_nodes - 2].count = 1;
            }
            non_zero += 1;
        }

        /* Rank by descending count, ties to the smaller symbol index. */
        let mut order_zero = 0usize;
        for rank in 0..non_zero {
            let mut highest: i32 = -1;
            let mut highest_count = 0u32;
            for (idx, node) in nodes.iter().enumerate() {
                if node.order < 0 && node.count > highest_count {
                    highest_count = node.count;
                    highest = idx as i32;
                }
            }
            if highest < 0 {
                return Err(MdeflateError::OrderSort);
            }
            nodes[highest as usize].order = rank as i32;
            if rank == 0 {
                order_zero = highest as usize;
            }
        }

        /* Seed the tree with the most frequent symbol. */
        let seed = self.alloc_node();
        self.arena[seed as usize] = TreeNode {
            order: 0,
            count: nodes[order_zero].count,
            parent: HEAD,
            children: [NO_CHILD; 2],
        };
        self.root = seed;

        for rank in 1..non_zero {
            let symbol = match nodes.iter().position(|n| n.order == rank as i32) {
                Some(symbol) => symbol,
                None => return Err(MdeflateError::OrderSort),
            };

            let leaf = self.alloc_node();
            let branch = self.alloc_node();
            let leaf_count = nodes[symbol].count;
            self.arena[leaf as usize] = TreeNode {
                order: rank as i32,
                count: leaf_count,
                parent: branch,
                children: [NO_CHILD; 2],
            };

            /* Deepest right-spine subtree still heavier than the new leaf. */
            let mut target = self.root;
            while self.arena[target as usize].order < 0
                && self.arena[target as usize].count > leaf_count
            {
                target = self.arena[target as usize].children[1];
            }

            /* Splice the branch in place of the target. */
            let target_parent = self.arena[target as usize].parent;
            self.arena[branch as usize] = TreeNode {
                order: -1,
                count: self.arena[target as usize].count,
                parent: target_parent,
                children: [target, leaf],
            };
            self.arena[target as usize].parent = branch;
            if target_parent == HEAD {
                self.root = branch;
            } else if self.arena[target_parent as usize].children[0] == target {
                self.arena[target_parent as usize].children[0] = branch;
            } else {
                self.arena[target_parent as usize].children[1] = branch;
            }

            /* Propagate the new count upwards, keeping the heavier subtree
             * on the left at every visited ancestor. */
            let mut node = branch;
            while self.arena[node as usize].parent != HEAD {
                self.arena[node as usize].count += leaf_count;
                let parent = self.arena[node as usize].parent as usize;
                let [left, right] = self.arena[parent].children;
                if self.arena[left as usize].count < self.arena[right as usize].count {
                    self.arena[parent].children = [right, left];
                }
                node = parent as i16;
            }
        }

        self.count_depths(self.root, 0);

        /* Fold code-words past the depth limit back in. Each step trades one
         * code at depth d for two at d+1 and retires one limit-depth slot,
         * shrinking the Kraft sum by 2^-max_depth. */
        while self.num_overflow > 0 {
            for depth in (1..self.max_depth).rev() {
                if self.cw_length_counts[depth] > 0 {
                    self.cw_length_counts[depth] -= 1;
                    self.cw_length_counts[depth + 1] += 2;
                    self.cw_length_counts[self.max_depth] -= 1;
                    self.num_overflow -= 2;
                    break;
                }
            }
        }

        /* Hand out lengths by frequency rank: shorter codes to better
         * ranks. */
        let mut order = 0i32;
        for depth in 1..=self.max_depth {
            for _ in 0..self.cw_length_counts[depth] {
                let symbol = match nodes.iter().position(|n| n.order == order) {
                    Some(symbol) => symbol,
                    None => return Err(MdeflateError::OrderSort),
                };
                nodes[symbol].code_word_length = depth as u32;
                order += 1;
            }
        }

        Ok(non_zero)
    }

    /* Depth histogram. Leaves past the limit are recorded at the limit;
     * every node past the limit (internal ones too) feeds the overflow
     * counter, which keeps the total even and makes the redistribution
     * above land on a complete code. */
    fn count_depths(&mut self, node: i16, depth: usize) {
        if depth > self.max_depth {
            self.num_overflow += 1;
        }
        let current = self.arena[node as usize];
        if current.order >= 0 {
            if depth > self.max_depth {
                self.cw_length_counts[self.max_depth] += 1;
            } else {
                self.cw_length_counts[depth] += 1;
            }
        } else {
            self.count_depths(current.children[0], depth + 1);
            self.count_depths(current.children[1], depth + 1);
        }
    }

    /// Canonical code-word assignment over the lengths produced by
    /// `construct_tree`: ascending length, then ascending symbol index.
    pub fn assign_code_words(&self, nodes: &mut [EncNode]) -> Result<(), MdeflateError> {
        let mut code_word = 0u32;
        for length in 1..=self.max_depth {
            code_word <<= 1;
            for node in nodes.iter_mut() {
                if node.code_word_length as usize == length {
                    node.code_word = code_word;
                    code_word += 1;
                }
            }
        }
        /* A complete code walks the cursor to exactly 2^max_depth. */
        if code_word != 1 << self.max_depth {
            return Err(MdeflateError::CodeConstruction);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{CodeBuilder, EncNode};
    use crate::mdeflate_constants::{MAX_BL_CW_LENGTH, MAX_CW_LENGTH};

    fn build(counts: &[u32], max_cw_length: usize) -> (usize, Vec<EncNode>) {
        let mut nodes: Vec<EncNode> = counts
            .iter()
            .map(|&count| EncNode {
                count,
                ..EncNode::default()
            })
            .collect();
        let mut builder = CodeBuilder::new();
        let participants = builder.construct_tree(&mut nodes, max_cw_length).unwrap();
        if participants != 0 {
            builder.assign_code_words(&mut nodes).unwrap();
        }
        (participants, nodes)
    }

    fn kraft_numerator(nodes: &[EncNode], max_cw_length: usize) -> u32 {
        nodes
            .iter()
            .filter(|n| n.code_word_length > 0)
            .map(|n| 1u32 << (max_cw_length as u32 - n.code_word_length))
            .sum()
    }

    #[test]
    fn kraft_sum_is_exactly_one() {
        let cases: [&[u32]; 5] = [
            &[5, 5, 5, 5],
            &[1, 2, 4, 8, 16, 32, 64, 128],
            &[1000, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1],
            &[7, 0, 0, 3, 0, 9, 2, 0, 1, 1, 4, 6],
            &[1, 1],
        ];
        for counts in cases {
            let (_, nodes) = build(counts, MAX_CW_LENGTH);
            assert_eq!(
                kraft_numerator(&nodes, MAX_CW_LENGTH),
                1 << MAX_CW_LENGTH,
                "counts {counts:?}"
            );
        }
    }

    #[test]
    fn overflow_redistribution_respects_the_limit() {
        /* Fibonacci counts force depths past any small limit. */
        let mut counts = vec![1u32, 1];
        while counts.len() < 25 {
            let next = counts[counts.len() - 1] + counts[counts.len() - 2];
            counts.push(next);
        }
        for limit in [MAX_BL_CW_LENGTH, MAX_CW_LENGTH] {
            let (_, nodes) = build(&counts, limit);
            assert!(nodes.iter().all(|n| n.code_word_length as usize <= limit));
            assert_eq!(kraft_numerator(&nodes, limit), 1 << limit);
        }
    }

    #[test]
    fn construction_is_deterministic() {
        let counts = [3u32, 0, 17, 9, 9, 1, 0, 250, 4, 4, 4, 30];
        let (_, first) = build(&counts, MAX_CW_LENGTH);
        let (_, second) = build(&counts, MAX_CW_LENGTH);
        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.code_word_length, b.code_word_length);
            assert_eq!(a.code_word, b.code_word);
        }
    }

    #[test]
    fn canonical_assignment_is_monotonic() {
        let counts = [40u32, 2, 0, 13, 13, 5, 1, 90, 0, 21, 3, 3, 7, 11];
        let (_, nodes) = build(&counts, MAX_CW_LENGTH);
        for i in 0..nodes.len() {
            for j in (i + 1)..nodes.len() {
                let (a, b) = (&nodes[i], &nodes[j]);
                if a.code_word_length == 0 || b.code_word_length == 0 {
                    continue;
                }
                if a.code_word_length == b.code_word_length {
                    assert!(a.code_word < b.code_word);
                } else {
                    /* longer codes sort strictly after every shorter one */
                    let (short, long) = if a.code_word_length < b.code_word_length {
                        (a, b)
                    } else {
                        (b, a)
                    };
                    let prefix = long.code_word >> (long.code_word_length - short.code_word_length);
                    assert!(prefix > short.code_word);
                }
            }
        }
    }

    #[test]
    fn empty_frequency_vector_is_unused() {
        let counts = [0u32; 32];
        let (participants, nodes) = build(&counts, MAX_CW_LENGTH);
        assert_eq!(participants, 0);
        assert!(nodes.iter().all(|n| n.code_word_length == 0));
    }

    #[test]
    fn single_symbol_gets_a_companion() {
        let mut counts = [0u32; 16];
        counts[3] = 5;
        let (participants, nodes) = build(&counts, MAX_CW_LENGTH);
        assert_eq!(participants, 2);
        assert_eq!(nodes[3].code_word_length, 1);
        assert_eq!(nodes[3].code_word, 0);
        assert_eq!(nodes[15].code_word_length, 1);
        assert_eq!(nodes[15].code_word, 1);

        /* the companion moves down one slot when the real symbol is last */
        let mut counts = [0u32; 16];
        counts[15] = 1;
        let (participants, nodes) = build(&counts, MAX_CW_LENGTH);
        assert_eq!(participants, 2);
        assert_eq!(nodes[14].code_word_length, 1);
        assert_eq!(nodes[15].code_word_length, 1);
    }
}
