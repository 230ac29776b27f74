use bit_set::BitSet;

use crate::error::Error;
use crate::graph::RpGraph;
use crate::johnson;
use crate::obs::Observations;

/// Money-pump statistics over all elementary violation cycles.
#[derive(Debug, Clone, PartialEq)]
pub struct MoneyPump {
    pub avg_mpi: f64,
    pub normalized_mpi: f64,
    pub cycles: usize,
}

/// Enumerates every elementary cycle with at least one strict edge, each
/// exactly once anchored at its least vertex, and averages two money-pump
/// readings over them: the pooled surplus of the cycle relative to its
/// pooled expenditure, and the mean per-step surplus share. Both are zero
/// when the data admits no violation cycle.
///
/// The cycle count can be exponential in the number of observations;
/// this is inherent to the statistic, not an implementation shortcut.
pub fn money_pump_index(obs: &Observations) -> Result<MoneyPump, Error> {
    let graph = RpGraph::from_observations(obs);
    let incomes = obs.incomes();

    let mut cycles = 0usize;
    let mut avg_sum = 0.0;
    let mut normalized_sum = 0.0;
    johnson::enumerate_strict_cycles(&graph, &BitSet::new(), |cycle| {
        // Edge weights are surplus over income, so w(e)·w_tail recovers
        // the raw surplus p_t·(x_t − x_next) of each step.
        let mut surplus = 0.0;
        let mut expenditure = 0.0;
        let mut share_sum = 0.0;
        for &e in cycle {
            let t = graph.tail[e];
            surplus += graph.weight[e] * incomes[t];
            expenditure += incomes[t];
            share_sum += graph.weight[e];
        }
        avg_sum += surplus / expenditure;
        normalized_sum += share_sum / cycle.len() as f64;
        cycles += 1;
    });

    if cycles == 0 {
        return Ok(MoneyPump {
            avg_mpi: 0.0,
            normalized_mpi: 0.0,
            cycles: 0,
        });
    }
    Ok(MoneyPump {
        avg_mpi: avg_sum / cycles as f64,
        normalized_mpi: normalized_sum / cycles as f64,
        cycles,
    })
}
