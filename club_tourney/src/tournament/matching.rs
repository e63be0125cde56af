//! Perfect matching feasibility on general graphs.
//!
//! Swiss pairing asks "can the remaining players still be paired without a
//! rematch?" after every tentative pairing. That is a perfect matching question
//! on the graph of allowed pairings, answered here with Edmonds' blossom
//! algorithm in O(V^3).

use std::collections::VecDeque;

const NONE: usize = usize::MAX;

/// Whether `vertices` can be split into disjoint pairs using only allowed edges
///
/// `allowed` is a symmetric adjacency matrix over all participants; `vertices`
/// selects the subset to consider. An empty subset is trivially matchable and an
/// odd one never is.
pub fn perfect_matching_exists(allowed: &[Vec<bool>], vertices: &[usize]) -> bool {
    let n = vertices.len();
    if n % 2 == 1 {
        return false;
    }
    if n == 0 {
        return true;
    }

    let adj: Vec<Vec<usize>> = (0..n)
        .map(|i| {
            (0..n)
                .filter(|&j| j != i && allowed[vertices[i]][vertices[j]])
                .collect()
        })
        .collect();

    if adj.iter().any(Vec::is_empty) {
        return false;
    }

    Blossom::new(&adj).maximum_matching() * 2 == n
}

struct Blossom<'a> {
    adj: &'a [Vec<usize>],
    mate: Vec<usize>,
    parent: Vec<usize>,
    base: Vec<usize>,
    used: Vec<bool>,
    in_blossom: Vec<bool>,
    queue: VecDeque<usize>,
}

impl<'a> Blossom<'a> {
    fn new(adj: &'a [Vec<usize>]) -> Self {
        let n = adj.len();
        Self {
            adj,
            mate: vec![NONE; n],
            parent: vec![NONE; n],
            base: (0..n).collect(),
            used: vec![false; n],
            in_blossom: vec![false; n],
            queue: VecDeque::with_capacity(n),
        }
    }

    fn maximum_matching(mut self) -> usize {
        let n = self.adj.len();

        // Greedy seed, then augment from every vertex left exposed
        for v in 0..n {
            if self.mate[v] != NONE {
                continue;
            }
            let free = self.adj[v].iter().copied().find(|&u| self.mate[u] == NONE);
            if let Some(u) = free {
                self.mate[v] = u;
                self.mate[u] = v;
            }
        }

        for root in 0..n {
            if self.mate[root] == NONE {
                let end = self.find_augmenting_path(root);
                self.augment(end);
            }
        }

        self.mate.iter().filter(|&&m| m != NONE).count() / 2
    }

    fn augment(&mut self, mut v: usize) {
        while v != NONE {
            let pv = self.parent[v];
            let next = self.mate[pv];
            self.mate[v] = pv;
            self.mate[pv] = v;
            v = next;
        }
    }

    fn lowest_common_ancestor(&self, mut a: usize, mut b: usize) -> usize {
        let mut seen = vec![false; self.adj.len()];
        loop {
            a = self.base[a];
            seen[a] = true;
            if self.mate[a] == NONE {
                break;
            }
            a = self.parent[self.mate[a]];
        }
        loop {
            b = self.base[b];
            if seen[b] {
                return b;
            }
            b = self.parent[self.mate[b]];
        }
    }

    fn mark_path(&mut self, mut v: usize, b: usize, mut child: usize) {
        while self.base[v] != b {
            self.in_blossom[self.base[v]] = true;
            self.in_blossom[self.base[self.mate[v]]] = true;
            self.parent[v] = child;
            child = self.mate[v];
            v = self.parent[self.mate[v]];
        }
    }

    /// Exposed vertex reached by an augmenting path from `root`, or `NONE`
    fn find_augmenting_path(&mut self, root: usize) -> usize {
        let n = self.adj.len();
        let adj = self.adj;

        self.used.fill(false);
        self.parent.fill(NONE);
        for (i, b) in self.base.iter_mut().enumerate() {
            *b = i;
        }

        self.used[root] = true;
        self.queue.clear();
        self.queue.push_back(root);

        while let Some(v) = self.queue.pop_front() {
            for &to in &adj[v] {
                if self.base[v] == self.base[to] || self.mate[v] == to {
                    continue;
                }

                if to == root || (self.mate[to] != NONE && self.parent[self.mate[to]] != NONE) {
                    let current_base = self.lowest_common_ancestor(v, to);
                    self.in_blossom.fill(false);
                    self.mark_path(v, current_base, to);
                    self.mark_path(to, current_base, v);

                    for i in 0..n {
                        if self.in_blossom[self.base[i]] {
                            self.base[i] = current_base;
                            if !self.used[i] {
                                self.used[i] = true;
                                self.queue.push_back(i);
                            }
                        }
                    }
                } else if self.parent[to] == NONE {
                    self.parent[to] = v;
                    if self.mate[to] == NONE {
                        return to;
                    }
                    let next = self.mate[to];
                    self.used[next] = true;
                    self.queue.push_back(next);
                }
            }
        }

        NONE
    }
}
