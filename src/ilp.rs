use bit_set::BitSet;
use highs::{HighsModelStatus, RowProblem, Sense};
use itertools::Itertools;

use crate::error::Error;

/// Outcome of one cover solve: the chosen removal set and its cost.
pub struct CoverSolution {
    pub chosen: BitSet,
    pub objective: f64,
}

/// Solves the shared cycle-cover program
///
///   min Σ cᵢ·xᵢ   s.t.  Σ_{i ∈ row} xᵢ ≥ 1 for every row,  xᵢ ∈ {0,1},
///
/// optionally under a cardinality bound Σ xᵢ ≤ k. Rows are sparse index
/// lists over the candidate removals; each says "at least one of these
/// must go". The solver is [HiGHS], forced single-threaded so repeated
/// solves of the same program break ties identically.
///
/// [HiGHS]: https://highs.dev/
pub fn solve_cover(
    costs: &[f64],
    rows: &[Vec<usize>],
    cardinality: Option<usize>,
) -> Result<CoverSolution, Error> {
    if rows.is_empty() {
        return Ok(CoverSolution {
            chosen: BitSet::new(),
            objective: 0.0,
        });
    }

    let mut problem = RowProblem::new();
    let cols = costs
        .iter()
        .map(|&c| problem.add_integer_column(c, 0..=1))
        .collect_vec();
    for row in rows {
        problem.add_row(1.., &row.iter().map(|&i| (cols[i], 1.0)).collect_vec());
    }
    if let Some(k) = cardinality {
        problem.add_row(..=k as f64, &cols.iter().map(|&c| (c, 1.0)).collect_vec());
    }

    let mut model = problem.optimise(Sense::Minimise);
    model.set_option("output_flag", false);
    model.set_option("parallel", "off");
    model.set_option("threads", 1);

    let solved = model.solve();
    if solved.status() != HighsModelStatus::Optimal {
        return Err(Error::IlpFailure(format!("{:?}", solved.status())));
    }
    let values = solved.get_solution().columns().to_vec();

    let mut chosen = BitSet::new();
    let mut objective = 0.0;
    for (i, &x) in values.iter().enumerate() {
        if x.round() as i64 == 1 {
            chosen.insert(i);
            objective += costs[i];
        }
    }
    tracing::debug!(rows = rows.len(), cols = costs.len(), objective, "cover solved");
    Ok(CoverSolution { chosen, objective })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_program_is_free() {
        let sol = solve_cover(&[1.0, 1.0], &[], None).unwrap();
        assert_eq!(sol.objective, 0.0);
        assert!(sol.chosen.is_empty());
    }

    #[test]
    fn picks_the_cheap_common_element() {
        // Element 2 hits both rows at cost 0.5; anything else costs >= 1.
        let costs = vec![1.0, 1.0, 0.5];
        let rows = vec![vec![0, 2], vec![1, 2]];
        let sol = solve_cover(&costs, &rows, None).unwrap();
        assert!(sol.chosen.contains(2));
        assert!((sol.objective - 0.5).abs() < 1e-9);
    }

    #[test]
    fn disjoint_rows_need_two_removals() {
        let costs = vec![1.0; 4];
        let rows = vec![vec![0, 1], vec![2, 3]];
        let sol = solve_cover(&costs, &rows, None).unwrap();
        assert!((sol.objective - 2.0).abs() < 1e-9);
    }

    #[test]
    fn cardinality_bound_forces_overlap() {
        // Unbounded optimum picks the two cheap singletons; capped at one
        // removal only the shared element remains feasible.
        let costs = vec![0.1, 0.1, 5.0];
        let rows = vec![vec![0, 2], vec![1, 2]];
        let free = solve_cover(&costs, &rows, None).unwrap();
        assert!((free.objective - 0.2).abs() < 1e-9);
        let capped = solve_cover(&costs, &rows, Some(1)).unwrap();
        assert!(capped.chosen.contains(2));
        assert!((capped.objective - 5.0).abs() < 1e-9);
    }
}
