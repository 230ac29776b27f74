use std::io::BufRead;

use crate::error::Error;

/// A finite set of consumer choice observations: for each of T periods a
/// strictly positive price vector and a non-negative purchased bundle over
/// G goods. Both matrices are stored column-major, one column per period.
#[derive(Debug, Clone)]
pub struct Observations {
    goods: usize,
    periods: usize,
    prices: Vec<f64>,
    quantities: Vec<f64>,
}

impl Observations {
    /// Validates and wraps a dataset. `prices` and `quantities` hold
    /// `goods * periods` entries, column-major (period t occupies
    /// `t*goods..(t+1)*goods`).
    pub fn new(
        goods: usize,
        periods: usize,
        prices: Vec<f64>,
        quantities: Vec<f64>,
    ) -> Result<Observations, Error> {
        if goods == 0 || periods == 0 {
            return Err(Error::InvalidInput(
                "need at least one good and one period".into(),
            ));
        }
        if prices.len() != goods * periods || quantities.len() != goods * periods {
            return Err(Error::InvalidInput(format!(
                "expected {} entries per matrix, got {} prices and {} quantities",
                goods * periods,
                prices.len(),
                quantities.len()
            )));
        }
        for (i, &p) in prices.iter().enumerate() {
            if !p.is_finite() || p <= 0.0 {
                return Err(Error::InvalidInput(format!(
                    "price {} at good {} period {} is not strictly positive",
                    p,
                    i % goods,
                    i / goods
                )));
            }
        }
        for (i, &q) in quantities.iter().enumerate() {
            if !q.is_finite() || q < 0.0 {
                return Err(Error::InvalidInput(format!(
                    "quantity {} at good {} period {} is negative or non-finite",
                    q,
                    i % goods,
                    i / goods
                )));
            }
        }
        let obs = Observations {
            goods,
            periods,
            prices,
            quantities,
        };
        for t in 0..periods {
            if obs.income(t) <= 0.0 {
                return Err(Error::InvalidInput(format!(
                    "zero expenditure at period {}",
                    t
                )));
            }
        }
        Ok(obs)
    }

    pub fn goods(&self) -> usize {
        self.goods
    }

    pub fn periods(&self) -> usize {
        self.periods
    }

    pub fn price(&self, good: usize, period: usize) -> f64 {
        self.prices[period * self.goods + good]
    }

    pub fn quantity(&self, good: usize, period: usize) -> f64 {
        self.quantities[period * self.goods + good]
    }

    fn price_column(&self, period: usize) -> &[f64] {
        &self.prices[period * self.goods..(period + 1) * self.goods]
    }

    fn quantity_column(&self, period: usize) -> &[f64] {
        &self.quantities[period * self.goods..(period + 1) * self.goods]
    }

    /// Expenditure `p_v · x_u`: the cost of period u's bundle at period v's
    /// prices.
    pub fn cost(&self, v: usize, u: usize) -> f64 {
        self.price_column(v)
            .iter()
            .zip(self.quantity_column(u))
            .map(|(p, q)| p * q)
            .sum()
    }

    /// Income at period t, `w_t = p_t · x_t`.
    pub fn income(&self, t: usize) -> f64 {
        self.cost(t, t)
    }

    pub fn incomes(&self) -> Vec<f64> {
        (0..self.periods).map(|t| self.income(t)).collect()
    }

    /// The T×T matrix `E[v,u] = p_v·x_v − p_v·x_u`, row-major. The diagonal
    /// is masked negative so the graph builder never emits self-loops from
    /// the plain pipeline.
    pub fn expenditure_matrix(&self) -> Vec<f64> {
        let t = self.periods;
        let mut exp = vec![0.0; t * t];
        for v in 0..t {
            let wv = self.income(v);
            for u in 0..t {
                exp[v * t + u] = if v == u { -1.0 } else { wv - self.cost(v, u) };
            }
        }
        exp
    }

    /// Same observations with replacement bundles at unchanged prices.
    /// Used by the Monte-Carlo driver for its prefab draws.
    pub fn with_quantities(&self, quantities: Vec<f64>) -> Result<Observations, Error> {
        Observations::new(self.goods, self.periods, self.prices.clone(), quantities)
    }

    pub fn new_from_stdin() -> Result<(Observations, Vec<f64>), Error> {
        Self::new_from_reader(std::io::stdin().lock())
    }

    /// Parses the line format used by the bundled binary: `c` comment
    /// lines, a `p rp G T` header, an optional `a α...` line, then T price
    /// rows and T quantity rows of G values each.
    pub fn new_from_reader(reader: impl BufRead) -> Result<(Observations, Vec<f64>), Error> {
        let mut shape: Option<(usize, usize)> = None;
        let mut alphas: Vec<f64> = Vec::new();
        let mut rows: Vec<Vec<f64>> = Vec::new();
        for line in reader.lines() {
            let line = line?;
            let ll: Vec<&str> = line.split_whitespace().collect();
            if ll.is_empty() {
                continue;
            }
            match ll[0] {
                "c" => {} // skip comments
                "p" => {
                    if ll.len() < 4 {
                        return Err(Error::InvalidInput("malformed p-line".into()));
                    }
                    let g = parse_usize(ll[2])?;
                    let t = parse_usize(ll[3])?;
                    shape = Some((g, t));
                }
                "a" => {
                    alphas = ll[1..]
                        .iter()
                        .map(|s| parse_f64(s))
                        .collect::<Result<_, _>>()?;
                }
                _ => {
                    if shape.is_none() {
                        return Err(Error::InvalidInput(
                            "found a matrix row before the p-line".into(),
                        ));
                    }
                    rows.push(ll.iter().map(|s| parse_f64(s)).collect::<Result<_, _>>()?);
                }
            }
        }
        let (g, t) = shape.ok_or_else(|| Error::InvalidInput("missing p-line".into()))?;
        if rows.len() != 2 * t || rows.iter().any(|r| r.len() != g) {
            return Err(Error::InvalidInput(format!(
                "expected {} rows of {} values, got {} rows",
                2 * t,
                g,
                rows.len()
            )));
        }
        let prices: Vec<f64> = rows[..t].iter().flatten().copied().collect();
        let quantities: Vec<f64> = rows[t..].iter().flatten().copied().collect();
        if alphas.is_empty() {
            alphas.push(1.0);
        }
        Ok((Observations::new(g, t, prices, quantities)?, alphas))
    }
}

fn parse_usize(s: &str) -> Result<usize, Error> {
    s.parse::<usize>()
        .map_err(|e| Error::InvalidInput(format!("bad integer {:?}: {}", s, e)))
}

fn parse_f64(s: &str) -> Result<f64, Error> {
    s.parse::<f64>()
        .map_err(|e| Error::InvalidInput(format!("bad number {:?}: {}", s, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_shapes_and_signs() {
        assert!(Observations::new(2, 2, vec![1.0; 4], vec![1.0; 4]).is_ok());
        assert!(Observations::new(2, 2, vec![1.0; 3], vec![1.0; 4]).is_err());
        assert!(Observations::new(2, 1, vec![1.0, -1.0], vec![1.0, 1.0]).is_err());
        assert!(Observations::new(2, 1, vec![1.0, 1.0], vec![-0.5, 1.0]).is_err());
        // zero income at the single period
        assert!(Observations::new(2, 1, vec![1.0, 1.0], vec![0.0, 0.0]).is_err());
    }

    #[test]
    fn cost_and_income() {
        let obs = Observations::new(2, 2, vec![1.0, 2.0, 2.0, 1.0], vec![1.0, 2.0, 2.0, 1.0])
            .unwrap();
        assert_eq!(obs.income(0), 5.0);
        assert_eq!(obs.income(1), 5.0);
        assert_eq!(obs.cost(0, 1), 4.0);
        assert_eq!(obs.cost(1, 0), 4.0);
    }

    #[test]
    fn expenditure_matrix_masks_diagonal() {
        let obs = Observations::new(2, 2, vec![1.0, 2.0, 2.0, 1.0], vec![1.0, 2.0, 2.0, 1.0])
            .unwrap();
        let e = obs.expenditure_matrix();
        assert!(e[0] < 0.0 && e[3] < 0.0);
        assert_eq!(e[1], 1.0);
        assert_eq!(e[2], 1.0);
    }

    #[test]
    fn parses_reader_format() {
        let input = "c classical two-period violation\n\
                     p rp 2 2\n\
                     a 0.5 1\n\
                     1 2\n\
                     2 1\n\
                     1 2\n\
                     2 1\n";
        let (obs, alphas) = Observations::new_from_reader(input.as_bytes()).unwrap();
        assert_eq!(obs.goods(), 2);
        assert_eq!(obs.periods(), 2);
        assert_eq!(alphas, vec![0.5, 1.0]);
        assert_eq!(obs.price(1, 0), 2.0);
        assert_eq!(obs.quantity(0, 1), 2.0);
    }

    #[test]
    fn reader_rejects_rows_before_header() {
        let input = "1 2\np rp 2 1\n";
        assert!(Observations::new_from_reader(input.as_bytes()).is_err());
    }
}
