use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::cycles;
use crate::error::Error;
use crate::graph::RpGraph;
use crate::indices;
use crate::obs::Observations;
use crate::scc;

/// Cooperative cancellation handle. Solvers poll it between outer
/// iterations, the Monte-Carlo driver before each draw; partial results
/// are discarded on cancellation.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> CancelToken {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SolveOptions {
    pub cancel: Option<CancelToken>,
}

impl SolveOptions {
    pub fn bail_if_cancelled(&self) -> Result<(), Error> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => Err(Error::Cancelled),
            _ => Ok(()),
        }
    }

    #[cfg(test)]
    pub(crate) fn cancelled_for_test() -> SolveOptions {
        let token = CancelToken::new();
        token.cancel();
        SolveOptions {
            cancel: Some(token),
        }
    }
}

/// Computes the full battery of rationality indices for a dataset.
///
/// The result holds `[Afriat, Houtman–Maks, Swaps]` followed by the triple
/// `(Varian, inverse Varian, NMCI)` for each alpha, so its length is
/// `3 + 3·alphas.len()`. Houtman–Maks and Swaps are removal counts divided
/// by T; the continuous indices are summed removal levels divided by T;
/// Afriat is the max-min cycle weight and is already in [0, 1].
pub fn rationality_measures(obs: &Observations, alphas: &[f64]) -> Result<Vec<f64>, Error> {
    rationality_measures_with(obs, alphas, &SolveOptions::default())
}

/// [`rationality_measures`] with cancellation support.
pub fn rationality_measures_with(
    obs: &Observations,
    alphas: &[f64],
    opts: &SolveOptions,
) -> Result<Vec<f64>, Error> {
    validate_alphas(alphas)?;
    let graph = RpGraph::from_observations(obs);
    measures_on_graph(&graph, obs.periods(), alphas, opts)
}

/// The same battery under the assumption that the rationalizing utility is
/// symmetric in the goods: the revealed-preference graph is augmented by
/// the permutation maximum over bundle relabelings, then fed to the
/// identical pipeline.
pub fn rationality_measures_symmetric(
    obs: &Observations,
    alphas: &[f64],
) -> Result<Vec<f64>, Error> {
    rationality_measures_symmetric_with(obs, alphas, &SolveOptions::default())
}

pub fn rationality_measures_symmetric_with(
    obs: &Observations,
    alphas: &[f64],
    opts: &SolveOptions,
) -> Result<Vec<f64>, Error> {
    validate_alphas(alphas)?;
    let graph = RpGraph::symmetric_from_observations(obs)?;
    measures_on_graph(&graph, obs.periods(), alphas, opts)
}

/// Whether the dataset satisfies GARP: no revealed-preference cycle closes
/// with a strict edge. Weak cycles alone (every comparison budget-tight)
/// are fine. Equivalent formulation on the graph: a strict edge whose
/// endpoints share a nontrivial strongly connected component lies on a
/// cycle, and conversely.
pub fn data_rationalizable(obs: &Observations) -> Result<bool, Error> {
    let graph = RpGraph::from_observations(obs);
    Ok(graph_rationalizable(&graph))
}

pub(crate) fn graph_rationalizable(graph: &RpGraph) -> bool {
    let comps = scc::components(graph);
    for e in 0..graph.edge_count() {
        if !graph.is_strict(e) {
            continue;
        }
        let (v, u) = (graph.tail[e], graph.head[e]);
        if v == u {
            return false;
        }
        if comps.labels[v] != 0 && comps.labels[v] == comps.labels[u] {
            return false;
        }
    }
    true
}

pub(crate) fn measures_on_graph(
    graph: &RpGraph,
    periods: usize,
    alphas: &[f64],
    opts: &SolveOptions,
) -> Result<Vec<f64>, Error> {
    let afriat = cycles::afriat_estimate(graph);

    let mut houtman_maks = 0.0;
    let mut swaps = 0.0;
    let mut varian = vec![0.0; alphas.len()];
    let mut inv_varian = vec![0.0; alphas.len()];
    let mut nmci = vec![0.0; alphas.len()];

    let comps = scc::components(graph);
    for members in &comps.members {
        opts.bail_if_cancelled()?;
        let sub = graph.induced(members);
        let ix = indices::component_indices(&sub, alphas, opts)?;
        houtman_maks += ix.houtman_maks;
        swaps += ix.swaps;
        for j in 0..alphas.len() {
            varian[j] += ix.varian[j];
            inv_varian[j] += ix.inv_varian[j];
            nmci[j] += ix.nmci[j];
        }
    }

    let t = periods as f64;
    let mut values = Vec::with_capacity(3 + 3 * alphas.len());
    values.push(afriat);
    values.push(houtman_maks / t);
    values.push(swaps / t);
    for j in 0..alphas.len() {
        values.push(varian[j] / t);
        values.push(inv_varian[j] / t);
        values.push(nmci[j] / t);
    }
    Ok(values)
}

fn validate_alphas(alphas: &[f64]) -> Result<(), Error> {
    for &a in alphas {
        if !a.is_finite() || a <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "alpha {} is not strictly positive; the hybrid alpha = 0 \
                 formulation is not offered by this driver",
                a
            )));
        }
    }
    Ok(())
}

/// Indices 1 and 2 of the measure vector (Houtman–Maks and Swaps) are
/// counts over T; the Monte-Carlo driver rounds them back to integers
/// before comparing draws so float noise cannot flip a tally.
pub(crate) fn comparison_key(index: usize, value: f64, periods: usize) -> f64 {
    if index == 1 || index == 2 {
        (value * periods as f64).round()
    } else {
        value
    }
}
