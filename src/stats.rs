//! Pearson's chi-square test of independence on an r×c table of counts.

use statrs::distribution::{ChiSquared, ContinuousCDF};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct ChiSquareResult {
    pub chi2: f64,
    pub p_value: f64,
    pub degrees_of_freedom: usize,
    /// Expected counts under independence, same shape as the observed table.
    pub expected: Vec<Vec<f64>>,
}

/// Chi-square test of independence.
///
/// With one degree of freedom Yates' continuity correction is applied. A table
/// with zero degrees of freedom (a single row or column) yields `chi2 = 0` and
/// `p = 1`. Sparse tables are not special-cased: the statistic is whatever the
/// counts produce.
/// # Example
/// ```
/// use yt_comment_analysis::chi2_contingency;
/// let r = chi2_contingency(&[vec![10, 20], vec![20, 10]]).unwrap();
/// assert_eq!(r.degrees_of_freedom, 1);
/// assert!((r.chi2 - 5.4).abs() < 1e-9);
/// ```
pub fn chi2_contingency(observed: &[Vec<usize>]) -> Result<ChiSquareResult> {
    let rows = observed.len();
    let cols = observed.first().map_or(0, Vec::len);
    if rows == 0 || cols == 0 {
        return Err(Error::Stats("contingency table is empty".to_string()));
    }
    if observed.iter().any(|row| row.len() != cols) {
        return Err(Error::Stats("contingency table rows differ in length".to_string()));
    }

    let row_totals: Vec<f64> = observed
        .iter()
        .map(|row| row.iter().sum::<usize>() as f64)
        .collect();
    let col_totals: Vec<f64> = (0..cols)
        .map(|j| observed.iter().map(|row| row[j]).sum::<usize>() as f64)
        .collect();
    let total: f64 = row_totals.iter().sum();

    let expected: Vec<Vec<f64>> = row_totals
        .iter()
        .map(|r| col_totals.iter().map(|c| r * c / total).collect())
        .collect();
    if expected.iter().flatten().any(|&e| e == 0.0 || e.is_nan()) {
        return Err(Error::Stats(
            "expected frequencies contain a zero element".to_string(),
        ));
    }

    let degrees_of_freedom = (rows - 1) * (cols - 1);
    if degrees_of_freedom == 0 {
        return Ok(ChiSquareResult {
            chi2: 0.0,
            p_value: 1.0,
            degrees_of_freedom,
            expected,
        });
    }

    let mut chi2 = 0.0;
    for (obs_row, exp_row) in observed.iter().zip(&expected) {
        for (&o, &e) in obs_row.iter().zip(exp_row) {
            let mut diff = (o as f64 - e).abs();
            if degrees_of_freedom == 1 {
                // Yates: move each observation towards its expectation by at most 0.5
                diff -= diff.min(0.5);
            }
            chi2 += diff * diff / e;
        }
    }

    let dist = ChiSquared::new(degrees_of_freedom as f64)
        .map_err(|e| Error::Stats(format!("chi-squared distribution: {e}")))?;
    Ok(ChiSquareResult {
        chi2,
        p_value: dist.sf(chi2),
        degrees_of_freedom,
        expected,
    })
}
