use crate::obs::Observations;
use crate::symmetric;

/// Weights at or below this tolerance are treated as weak (exactly
/// budget-tight) revealed preferences.
pub const WEIGHT_TOL: f64 = 1e-9;

/// The weighted revealed-preference graph in CSR form. Vertex v is
/// observation v; an edge v→u means bundle u was affordable when v was
/// chosen, with weight `(p_v·(x_v − x_u)) / (p_v·x_v)` in [0, 1].
///
/// Out-edges of vertex v occupy `head[offsets[v]..offsets[v+1]]` and are
/// stably sorted by (weight ascending, head ascending), which pins the
/// tie-breaks of every downstream traversal. `tail[i]` maps edge i back to
/// its source for O(1) cycle reconstruction.
///
/// The graph is built once per dataset and immutable afterwards; subgraph
/// restriction downstream happens through edge masks or induced copies.
#[derive(Debug, Clone)]
pub struct RpGraph {
    pub n: usize,
    pub offsets: Vec<usize>,
    pub head: Vec<usize>,
    pub weight: Vec<f64>,
    pub tail: Vec<usize>,
}

/// Reverse adjacency: for each vertex, the forward edge ids of its
/// incoming edges, sorted by (weight ascending, tail ascending). Built per
/// graph when an index needs per-vertex in-edge levels.
#[derive(Debug)]
pub struct ReverseAdjacency {
    pub offsets: Vec<usize>,
    pub edges: Vec<usize>,
}

impl RpGraph {
    /// Builds the revealed-preference graph of a dataset.
    pub fn from_observations(obs: &Observations) -> RpGraph {
        let exp = obs.expenditure_matrix();
        Self::from_expenditure(&exp, &obs.incomes())
    }

    /// Builds the symmetric-utility graph: expenditures are maximized over
    /// all G! relabelings of the bundles before the same CSR construction.
    /// Fails when G is too large for the permutation sweep.
    pub fn symmetric_from_observations(obs: &Observations) -> Result<RpGraph, crate::Error> {
        let exp = symmetric::symmetric_expenditure(obs)?;
        Ok(Self::from_expenditure(&exp, &obs.incomes()))
    }

    /// CSR construction from a T×T expenditure matrix (row-major). An edge
    /// v→u exists iff `exp[v,u] ≥ 0` for v≠u; diagonal entries become
    /// self-loops only when strictly positive, so the exact-zero diagonal
    /// hits of the identity relabeling never produce a trivial loop.
    pub fn from_expenditure(exp: &[f64], incomes: &[f64]) -> RpGraph {
        let n = incomes.len();
        let mut per_vertex: Vec<Vec<(f64, usize)>> = vec![Vec::new(); n];
        for v in 0..n {
            let wv = incomes[v];
            for u in 0..n {
                let e = exp[v * n + u];
                let keep = if v == u {
                    e > WEIGHT_TOL * wv
                } else {
                    e >= -WEIGHT_TOL * wv
                };
                if keep {
                    per_vertex[v].push(((e / wv).clamp(0.0, 1.0), u));
                }
            }
            per_vertex[v].sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        }

        let mut offsets = vec![0usize; n + 1];
        for v in 0..n {
            offsets[v + 1] = offsets[v] + per_vertex[v].len();
        }
        let m = offsets[n];
        let mut head = vec![0usize; m];
        let mut weight = vec![0.0f64; m];
        let mut tail = vec![0usize; m];
        for v in 0..n {
            for (k, &(w, u)) in per_vertex[v].iter().enumerate() {
                let i = offsets[v] + k;
                head[i] = u;
                weight[i] = w;
                tail[i] = v;
            }
        }
        RpGraph {
            n,
            offsets,
            head,
            weight,
            tail,
        }
    }

    #[inline(always)]
    pub fn out(&self, v: usize) -> std::ops::Range<usize> {
        self.offsets[v]..self.offsets[v + 1]
    }

    pub fn edge_count(&self) -> usize {
        self.head.len()
    }

    pub fn is_strict(&self, e: usize) -> bool {
        self.weight[e] > WEIGHT_TOL
    }

    pub fn has_weak_edges(&self) -> bool {
        self.weight.iter().any(|&w| w <= WEIGHT_TOL)
    }

    /// Constructs the subgraph induced by `subset`. Vertex i of the result
    /// corresponds to `subset[i]` in the original graph; weights carry over
    /// and self-loops survive.
    pub fn induced(&self, subset: &[usize]) -> RpGraph {
        let mut imp: Vec<isize> = vec![-1; self.n];
        for (i, &v) in subset.iter().enumerate() {
            imp[v] = i as isize;
        }
        let mut adj: Vec<Vec<(f64, usize)>> = vec![Vec::new(); subset.len()];
        for (i, &v) in subset.iter().enumerate() {
            for e in self.out(v) {
                let nu = imp[self.head[e]];
                if nu != -1 {
                    adj[i].push((self.weight[e], nu as usize));
                }
            }
            adj[i].sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        }
        let mut offsets = vec![0usize; subset.len() + 1];
        for i in 0..subset.len() {
            offsets[i + 1] = offsets[i] + adj[i].len();
        }
        let m = offsets[subset.len()];
        let mut head = vec![0usize; m];
        let mut weight = vec![0.0f64; m];
        let mut tail = vec![0usize; m];
        for (i, list) in adj.iter().enumerate() {
            for (k, &(w, u)) in list.iter().enumerate() {
                let idx = offsets[i] + k;
                head[idx] = u;
                weight[idx] = w;
                tail[idx] = i;
            }
        }
        RpGraph {
            n: subset.len(),
            offsets,
            head,
            weight,
            tail,
        }
    }

    /// Reverse adjacency with per-vertex in-edges ordered by (weight
    /// ascending, tail ascending). The inverse-Varian reduction depends on
    /// this ordering being on the incoming side, so the forward CSR is not
    /// reused through transposition tricks.
    pub fn reverse(&self) -> ReverseAdjacency {
        let mut per_vertex: Vec<Vec<usize>> = vec![Vec::new(); self.n];
        for e in 0..self.edge_count() {
            per_vertex[self.head[e]].push(e);
        }
        for list in per_vertex.iter_mut() {
            list.sort_by(|&a, &b| {
                self.weight[a]
                    .total_cmp(&self.weight[b])
                    .then(self.tail[a].cmp(&self.tail[b]))
            });
        }
        let mut offsets = vec![0usize; self.n + 1];
        for v in 0..self.n {
            offsets[v + 1] = offsets[v] + per_vertex[v].len();
        }
        let edges = per_vertex.into_iter().flatten().collect();
        ReverseAdjacency { offsets, edges }
    }
}

impl ReverseAdjacency {
    #[inline(always)]
    pub fn in_edges(&self, v: usize) -> &[usize] {
        &self.edges[self.offsets[v]..self.offsets[v + 1]]
    }
}
