use bit_set::BitSet;
use itertools::Itertools;

use crate::cycles::{self, CycleSet};
use crate::error::Error;
use crate::graph::{ReverseAdjacency, RpGraph, WEIGHT_TOL};
use crate::ilp;
use crate::johnson;
use crate::measures::SolveOptions;

/// Unnormalized optima of one nontrivial component: removal counts for the
/// ordinal indices, summed removal levels for the continuous ones (one per
/// alpha). The caller adds components up and divides by T.
#[derive(Debug)]
pub struct ComponentIndices {
    pub houtman_maks: f64,
    pub swaps: f64,
    pub varian: Vec<f64>,
    pub inv_varian: Vec<f64>,
    pub nmci: Vec<f64>,
}

/// Runs the five cover-based indices on one strongly connected component.
///
/// Every solver shares one growing cycle collection: cycles surfaced while
/// solving one index seed the constraint matrices of the next, and within
/// the continuous indices cycles found for one alpha carry to the next.
/// Correctness never depends on the sharing; each solver keeps iterating
/// until its own residual search comes up dry.
pub fn component_indices(
    g: &RpGraph,
    alphas: &[f64],
    opts: &SolveOptions,
) -> Result<ComponentIndices, Error> {
    let mut cycles = CycleSet::new();
    cycles::seed_cycles(g, &mut cycles);
    let rev = g.reverse();

    let swaps = solve_swaps(g, &mut cycles, opts)?;
    let houtman_maks = solve_houtman_maks(g, &mut cycles, opts)?;
    let mut varian = Vec::with_capacity(alphas.len());
    let mut inv_varian = Vec::with_capacity(alphas.len());
    let mut nmci = Vec::with_capacity(alphas.len());
    for &alpha in alphas {
        varian.push(solve_varian(g, alpha, &mut cycles, opts)?);
        inv_varian.push(solve_inv_varian(g, &rev, alpha, &mut cycles, opts)?);
        nmci.push(solve_nmci(g, alpha, &mut cycles, opts)?);
    }
    Ok(ComponentIndices {
        houtman_maks,
        swaps,
        varian,
        inv_varian,
        nmci,
    })
}

/// The cycle-cover outer loop every ILP-backed index runs:
///
/// 1. turn cycles the collection gained since the last pass into cover
///    rows via the index's private reduction,
/// 2. ask the oracle for a cheapest removal set,
/// 3. expand that set into per-edge residual costs and hunt for cycles the
///    set fails to break,
/// 4. stop when the hunt comes up empty; the oracle's objective is the
///    component's optimum.
///
/// Indices whose search ignores weak edges pass a fallback that expands
/// the removal set into an edge mask for Johnson enumeration, which
/// catches weak cycles closed by a remaining strict edge.
fn cover_loop(
    g: &RpGraph,
    costs: &[f64],
    cycles: &mut CycleSet,
    opts: &SolveOptions,
    row_of: impl Fn(&[usize]) -> Vec<usize>,
    residual_of: impl Fn(&BitSet, &mut Vec<f64>),
    weak_fallback: Option<&dyn Fn(&BitSet) -> BitSet>,
) -> Result<f64, Error> {
    let cap = 5 * g.n.max(1);
    let mut rows: Vec<Vec<usize>> = Vec::new();
    let mut processed = 0;
    let mut residual = vec![0.0; g.edge_count()];

    for iteration in 0..cap {
        opts.bail_if_cancelled()?;
        for cycle in cycles.iter().skip(processed) {
            rows.push(row_of(cycle));
        }
        processed = cycles.len();

        let sol = ilp::solve_cover(costs, &rows, None)?;
        residual_of(&sol.chosen, &mut residual);

        let before = cycles.len();
        cycles::critical_cycles(g, &mut residual, cycles);
        if cycles.len() == before {
            if let Some(mask_of) = weak_fallback {
                if g.has_weak_edges() {
                    johnson::break_strict_cycles(g, &mask_of(&sol.chosen), cycles);
                }
            }
        }
        if cycles.len() == before {
            // A dry search leaves the residual costs untouched, so this
            // re-verifies acyclicity of what survives the solution.
            debug_assert!(!cycles::has_residual_cycle(g, &residual));
            tracing::debug!(
                iteration,
                rows = rows.len(),
                objective = sol.objective,
                "cycle cover converged"
            );
            return Ok(sol.objective);
        }
    }
    Err(Error::NonConvergence(cap))
}

fn distinct_edges(cycle: &[usize]) -> Vec<usize> {
    cycle.iter().copied().sorted().dedup().collect_vec()
}

/// Swaps: whole edges are removed at unit cost, one row entry per edge on
/// the cycle.
fn solve_swaps(g: &RpGraph, cycles: &mut CycleSet, opts: &SolveOptions) -> Result<f64, Error> {
    let costs = vec![1.0; g.edge_count()];
    cover_loop(
        g,
        &costs,
        cycles,
        opts,
        distinct_edges,
        |chosen, residual| {
            for e in 0..g.edge_count() {
                residual[e] = if chosen.contains(e) { 0.0 } else { g.weight[e] };
            }
        },
        Some(&|chosen: &BitSet| chosen.clone()),
    )
}

/// Houtman–Maks: whole observations are removed at unit cost. An edge is
/// gone once its head vertex is dropped, which suffices to cut every cycle
/// through a dropped vertex.
fn solve_houtman_maks(
    g: &RpGraph,
    cycles: &mut CycleSet,
    opts: &SolveOptions,
) -> Result<f64, Error> {
    let costs = vec![1.0; g.n];
    cover_loop(
        g,
        &costs,
        cycles,
        opts,
        |cycle| cycle.iter().map(|&e| g.head[e]).sorted().dedup().collect_vec(),
        |chosen, residual| {
            for e in 0..g.edge_count() {
                residual[e] = if chosen.contains(g.head[e]) {
                    0.0
                } else {
                    g.weight[e]
                };
            }
        },
        Some(&|chosen: &BitSet| {
            let mut mask = BitSet::new();
            for e in 0..g.edge_count() {
                if chosen.contains(g.head[e]) {
                    mask.insert(e);
                }
            }
            mask
        }),
    )
}

/// Varian: choosing edge i of vertex t sets t's removal level to w(i),
/// discarding that edge and every cheaper out-edge of t. A cycle is
/// covered by any choice at least as heavy as one of its edges from the
/// same source, so the row for edge i holds the whole ≥-w(i) tail of t's
/// out-list. The residual for re-seeding is the extra level still needed
/// beyond the current solution.
fn solve_varian(
    g: &RpGraph,
    alpha: f64,
    cycles: &mut CycleSet,
    opts: &SolveOptions,
) -> Result<f64, Error> {
    let costs = g.weight.iter().map(|w| w.powf(alpha)).collect_vec();
    cover_loop(
        g,
        &costs,
        cycles,
        opts,
        |cycle| {
            cycle
                .iter()
                .flat_map(|&i| {
                    g.out(g.tail[i])
                        .filter(move |&j| g.weight[j] >= g.weight[i] - WEIGHT_TOL)
                })
                .sorted()
                .dedup()
                .collect_vec()
        },
        |chosen, residual| {
            let mut level = vec![0.0; g.n];
            for e in chosen.iter() {
                let t = g.tail[e];
                if g.weight[e] > level[t] {
                    level[t] = g.weight[e];
                }
            }
            for e in 0..g.edge_count() {
                residual[e] = g.weight[e] - level[g.tail[e]];
            }
        },
        None,
    )
}

/// Inverse Varian: the mirror of [`solve_varian`] along in-edges, driven
/// by the weight-ordered reverse adjacency.
fn solve_inv_varian(
    g: &RpGraph,
    rev: &ReverseAdjacency,
    alpha: f64,
    cycles: &mut CycleSet,
    opts: &SolveOptions,
) -> Result<f64, Error> {
    let costs = g.weight.iter().map(|w| w.powf(alpha)).collect_vec();
    cover_loop(
        g,
        &costs,
        cycles,
        opts,
        |cycle| {
            cycle
                .iter()
                .flat_map(|&i| {
                    rev.in_edges(g.head[i])
                        .iter()
                        .copied()
                        .filter(move |&j| g.weight[j] >= g.weight[i] - WEIGHT_TOL)
                })
                .sorted()
                .dedup()
                .collect_vec()
        },
        |chosen, residual| {
            let mut level = vec![0.0; g.n];
            for e in chosen.iter() {
                let y = g.head[e];
                if g.weight[e] > level[y] {
                    level[y] = g.weight[e];
                }
            }
            for e in 0..g.edge_count() {
                residual[e] = g.weight[e] - level[g.head[e]];
            }
        },
        None,
    )
}

/// Normalized minimum cost: edges are removed one by one at cost w^α; the
/// row is simply the cycle's edge set.
fn solve_nmci(
    g: &RpGraph,
    alpha: f64,
    cycles: &mut CycleSet,
    opts: &SolveOptions,
) -> Result<f64, Error> {
    let costs = g.weight.iter().map(|w| w.powf(alpha)).collect_vec();
    cover_loop(
        g,
        &costs,
        cycles,
        opts,
        distinct_edges,
        |chosen, residual| {
            for e in 0..g.edge_count() {
                residual[e] = if chosen.contains(e) { 0.0 } else { g.weight[e] };
            }
        },
        None,
    )
}
