use rand::Rng;
use rand_distr::Exp1;
use rayon::prelude::*;

use crate::error::Error;
use crate::measures::{self, SolveOptions};
use crate::obs::Observations;

/// Percentile score of a dataset against uniform random choice on its own
/// budget lines.
///
/// `weak[k]` is the share of draws whose k-th index is at least the
/// observed one, `strict[k]` the share strictly above it, and `garp` the
/// share of draws that are themselves rationalizable. `failed` draws were
/// dropped from every denominator and `draws` is what remains.
#[derive(Debug, Clone)]
pub struct PercentileScore {
    pub weak: Vec<f64>,
    pub strict: Vec<f64>,
    pub garp: f64,
    pub draws: usize,
    pub failed: usize,
}

/// Scores the dataset against `n` uniform-budget-line draws using the
/// thread-local generator.
pub fn percentile_score(
    obs: &Observations,
    alphas: &[f64],
    n: usize,
) -> Result<PercentileScore, Error> {
    percentile_score_with_rng(obs, alphas, n, &mut rand::thread_rng(), &SolveOptions::default())
}

/// Deterministic variant: all randomness comes from `rng`, so a seeded
/// generator reproduces the score exactly. Draws are prepared up front and
/// solved in parallel; each draw re-runs the full index battery on an
/// immutable copy of the prices.
pub fn percentile_score_with_rng(
    obs: &Observations,
    alphas: &[f64],
    n: usize,
    rng: &mut impl Rng,
    opts: &SolveOptions,
) -> Result<PercentileScore, Error> {
    if n == 0 {
        return Err(Error::InvalidInput("need at least one draw".into()));
    }
    let observed = measures::rationality_measures_with(obs, alphas, opts)?;
    let periods = obs.periods();

    let draws: Vec<Observations> = (0..n)
        .map(|_| obs.with_quantities(sample_quantities(obs, rng)))
        .collect::<Result<_, _>>()?;

    let outcomes: Vec<Result<(Vec<f64>, bool), Error>> = draws
        .par_iter()
        .map(|draw| {
            opts.bail_if_cancelled()?;
            let values = measures::rationality_measures_with(draw, alphas, opts)?;
            let garp = measures::data_rationalizable(draw)?;
            Ok((values, garp))
        })
        .collect();

    let mut weak = vec![0usize; observed.len()];
    let mut strict = vec![0usize; observed.len()];
    let mut garp = 0usize;
    let mut ok = 0usize;
    let mut failed = 0usize;
    for outcome in outcomes {
        match outcome {
            Ok((values, rationalizable)) => {
                ok += 1;
                if rationalizable {
                    garp += 1;
                }
                for (k, (&draw_v, &obs_v)) in values.iter().zip(&observed).enumerate() {
                    let d = measures::comparison_key(k, draw_v, periods);
                    let o = measures::comparison_key(k, obs_v, periods);
                    if d >= o {
                        weak[k] += 1;
                    }
                    if d > o {
                        strict[k] += 1;
                    }
                }
            }
            Err(Error::Cancelled) => return Err(Error::Cancelled),
            Err(e) => {
                tracing::debug!(error = %e, "draw failed and was dropped");
                failed += 1;
            }
        }
    }
    if ok == 0 {
        return Err(Error::InvalidInput("every draw failed".into()));
    }

    let denom = ok as f64;
    Ok(PercentileScore {
        weak: weak.into_iter().map(|c| c as f64 / denom).collect(),
        strict: strict.into_iter().map(|c| c as f64 / denom).collect(),
        garp: garp as f64 / denom,
        draws: ok,
        failed,
    })
}

/// One uniform draw on every period's budget line: G i.i.d. Exp(1)
/// variates normalize to uniform income shares on the simplex, and
/// dividing by the prices maps the shares onto `{x ≥ 0 : p_t·x = w_t}`.
fn sample_quantities(obs: &Observations, rng: &mut impl Rng) -> Vec<f64> {
    let goods = obs.goods();
    let mut quantities = Vec::with_capacity(goods * obs.periods());
    for t in 0..obs.periods() {
        let income = obs.income(t);
        let shares: Vec<f64> = (0..goods).map(|_| rng.sample::<f64, _>(Exp1)).collect();
        let total: f64 = shares.iter().sum();
        for (g, share) in shares.iter().enumerate() {
            quantities.push(share / total * income / obs.price(g, t));
        }
    }
    quantities
}
