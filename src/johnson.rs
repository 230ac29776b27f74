use bit_set::BitSet;

use crate::cycles::CycleSet;
use crate::graph::RpGraph;
use crate::scc;

/// Johnson-style enumeration of elementary cycles, component by component
/// starting from the least unprocessed vertex. Only cycles containing at
/// least one strict edge are reported; all-weak cycles are not revealed-
/// preference violations and are passed over. Self-loops never enter the
/// path (the length-1 scanner owns them).
///
/// In breaking mode every reported cycle also removes the last strict edge
/// on its path from further traversal, which keeps the enumeration from
/// exploding on dense violation clusters while still producing one fresh
/// uncovered cycle per removed edge. Without breaking, the enumeration is
/// exhaustive: each elementary cycle is visited exactly once, anchored at
/// its least vertex.
pub fn enumerate_strict_cycles(
    g: &RpGraph,
    removed: &BitSet,
    mut on_cycle: impl FnMut(&[usize]),
) {
    let mut walker = Walker::new(g, removed.clone(), false);
    walker.run(&mut on_cycle);
}

/// Breaking mode over `removed`; discovered cycles are appended to `out`.
/// Returns how many cycles were recorded.
pub fn break_strict_cycles(g: &RpGraph, removed: &BitSet, out: &mut CycleSet) -> usize {
    let mut found = 0;
    let mut walker = Walker::new(g, removed.clone(), true);
    walker.run(&mut |cycle: &[usize]| {
        out.push(cycle);
        found += 1;
    });
    found
}

struct Walker<'a> {
    g: &'a RpGraph,
    removed: BitSet,
    break_strict: bool,
    blocked: Vec<bool>,
    block_list: Vec<Vec<usize>>,
    in_comp: Vec<bool>,
    path: Vec<usize>,
    start: usize,
}

impl<'a> Walker<'a> {
    fn new(g: &'a RpGraph, removed: BitSet, break_strict: bool) -> Walker<'a> {
        Walker {
            g,
            removed,
            break_strict,
            blocked: vec![false; g.n],
            block_list: vec![Vec::new(); g.n],
            in_comp: vec![false; g.n],
            path: Vec::new(),
            start: 0,
        }
    }

    fn run(&mut self, on_cycle: &mut impl FnMut(&[usize])) {
        let mut s = 0;
        while s < self.g.n {
            let comp = scc::least_vertex_component(self.g, s, &self.removed);
            if comp.is_empty() {
                break;
            }
            let least = *comp.last().expect("component is non-empty");
            for &v in &comp {
                self.in_comp[v] = true;
                self.blocked[v] = false;
                self.block_list[v].clear();
            }
            self.start = least;
            self.circuit(least, on_cycle);
            for &v in &comp {
                self.in_comp[v] = false;
            }
            s = least + 1;
        }
    }

    fn circuit(&mut self, v: usize, on_cycle: &mut impl FnMut(&[usize])) -> bool {
        let mut found = false;
        self.blocked[v] = true;
        for e in self.g.out(v) {
            if self.removed.contains(e) {
                continue;
            }
            let u = self.g.head[e];
            if u == v || !self.in_comp[u] {
                continue;
            }
            if u == self.start {
                self.path.push(e);
                self.close(on_cycle);
                self.path.pop();
                found = true;
            } else if !self.blocked[u] {
                self.path.push(e);
                if self.circuit(u, on_cycle) {
                    found = true;
                }
                self.path.pop();
            }
        }
        if found {
            self.unblock(v);
        } else {
            for e in self.g.out(v) {
                if self.removed.contains(e) {
                    continue;
                }
                let u = self.g.head[e];
                if u == v || !self.in_comp[u] {
                    continue;
                }
                if !self.block_list[u].contains(&v) {
                    self.block_list[u].push(v);
                }
            }
        }
        found
    }

    fn close(&mut self, on_cycle: &mut impl FnMut(&[usize])) {
        let last_strict = self
            .path
            .iter()
            .rposition(|&e| self.g.is_strict(e));
        if let Some(pos) = last_strict {
            on_cycle(&self.path);
            if self.break_strict {
                self.removed.insert(self.path[pos]);
            }
        }
    }

    fn unblock(&mut self, v: usize) {
        self.blocked[v] = false;
        let waiting = std::mem::take(&mut self.block_list[v]);
        for w in waiting {
            if self.blocked[w] {
                self.unblock(w);
            }
        }
    }
}
