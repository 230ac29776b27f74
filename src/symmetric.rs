use itertools::Itertools;

use crate::error::Error;
use crate::obs::Observations;

/// The permutation sweep walks all G! relabelings; beyond this many goods
/// the sweep is refused rather than left to run for hours.
const MAX_SYMMETRIC_GOODS: usize = 8;

/// Expenditure matrix under the symmetric-utility assumption: each entry
/// `E[v,u]` is maximized over all G! relabelings of bundle u,
///
///   E[v,u] = max_π (p_v·x_v − p_v·π(x_u)).
///
/// Relabeling only the bundles suffices; permuting prices as well would
/// revisit the same comparisons. Diagonal entries are kept: a strictly
/// positive self-comparison means some relabeling of a period's own bundle
/// was strictly cheaper, which downstream becomes a trivial 1-cycle. The
/// identity relabeling puts an exact zero on the diagonal; those are
/// masked negative so no weak self-loop survives.
pub fn symmetric_expenditure(obs: &Observations) -> Result<Vec<f64>, Error> {
    let g = obs.goods();
    let t = obs.periods();
    if g > MAX_SYMMETRIC_GOODS {
        return Err(Error::InvalidInput(format!(
            "symmetric mode walks {}! bundle relabelings; at most {} goods are supported",
            g, MAX_SYMMETRIC_GOODS
        )));
    }

    let mut exp = vec![f64::NEG_INFINITY; t * t];
    for perm in (0..g).permutations(g) {
        for v in 0..t {
            let wv = obs.income(v);
            for u in 0..t {
                let mut cost = 0.0;
                for (good, &relabeled) in perm.iter().enumerate() {
                    cost += obs.price(good, v) * obs.quantity(relabeled, u);
                }
                let e = wv - cost;
                if e > exp[v * t + u] {
                    exp[v * t + u] = e;
                }
            }
        }
    }
    // Suppress the exact-zero diagonal of the identity relabeling.
    for v in 0..t {
        if exp[v * t + v] <= 0.0 {
            exp[v * t + v] = -1.0;
        }
    }
    Ok(exp)
}
