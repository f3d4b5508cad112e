//! Hypothesis tests for contingency tables and independent samples.
//!
//! All tests are two-sided.

use super::distributions::{Hypergeometric, chi2_sf, normal_sf};
use super::error::StatsError;
use serde::Serialize;

/// Relative tolerance used when comparing hypergeometric probabilities.
const FISHER_RELATIVE_TOLERANCE: f64 = 1e-7;
/// Largest sample size (of the smaller sample) for which `Auto` uses the exact U distribution.
const MWU_EXACT_MAX_SIZE: usize = 8;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContingencyResult {
    pub statistic: f64,
    pub p_value: f64,
    pub dof: usize,
    #[serde(skip)]
    pub expected: Vec<Vec<f64>>,
}

/// Pearson chi-squared test of independence on an `r x c` table of counts.
///
/// With `yates_correction`, tables with one degree of freedom have each observed
/// count moved up to 0.5 towards its expected count.
pub fn chi2_contingency(
    observed: &[Vec<u64>],
    yates_correction: bool,
) -> Result<ContingencyResult, StatsError> {
    let rows = observed.len();
    let cols = observed.first().map_or(0, Vec::len);
    if rows == 0 || cols == 0 {
        return Err(StatsError::EmptyTable);
    }
    if observed.iter().any(|row| row.len() != cols) {
        return Err(StatsError::RaggedTable);
    }

    let row_sums: Vec<f64> = observed
        .iter()
        .map(|row| row.iter().sum::<u64>() as f64)
        .collect();
    let col_sums: Vec<f64> = (0..cols)
        .map(|j| observed.iter().map(|row| row[j]).sum::<u64>() as f64)
        .collect();
    let total: f64 = row_sums.iter().sum();

    let mut expected = vec![vec![0.0; cols]; rows];
    for (i, row) in expected.iter_mut().enumerate() {
        for (j, cell) in row.iter_mut().enumerate() {
            *cell = row_sums[i] * col_sums[j] / total;
            if cell.is_nan() || *cell <= 0.0 {
                return Err(StatsError::ZeroExpectedFrequency { row: i, column: j });
            }
        }
    }

    let dof = (rows - 1) * (cols - 1);
    if dof == 0 {
        return Ok(ContingencyResult {
            statistic: 0.0,
            p_value: 1.0,
            dof,
            expected,
        });
    }

    let mut statistic = 0.0;
    for (obs_row, exp_row) in observed.iter().zip(&expected) {
        for (&obs, &exp) in obs_row.iter().zip(exp_row) {
            let mut obs = obs as f64;
            if dof == 1 && yates_correction {
                let diff = exp - obs;
                obs += diff.signum() * diff.abs().min(0.5);
            }
            statistic += (obs - exp).powi(2) / exp;
        }
    }

    Ok(ContingencyResult {
        statistic,
        p_value: chi2_sf(statistic, dof as f64),
        dof,
        expected,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FisherResult {
    pub odds_ratio: f64,
    pub p_value: f64,
}

/// Fisher's exact test on the 2x2 table `[[a, b], [c, d]]`.
///
/// The p-value sums the probabilities of every table with the same margins that is
/// at most as likely as the observed one.
pub fn fisher_exact(table: [[u64; 2]; 2]) -> FisherResult {
    let [[a, b], [c, d]] = table;
    let row0 = a + b;
    let row1 = c + d;
    let col0 = a + c;
    let col1 = b + d;
    if row0 == 0 || row1 == 0 || col0 == 0 || col1 == 0 {
        return FisherResult {
            odds_ratio: f64::NAN,
            p_value: 1.0,
        };
    }

    let odds_ratio = if b > 0 && c > 0 {
        (a as f64 * d as f64) / (b as f64 * c as f64)
    } else {
        f64::INFINITY
    };

    let dist = Hypergeometric::new(row0 + row1, row0, col0);
    let threshold = dist.pmf(a) * (1.0 + FISHER_RELATIVE_TOLERANCE);
    let (lo, hi) = dist.support();
    let p_value: f64 = (lo..=hi)
        .map(|k| dist.pmf(k))
        .filter(|&p| p <= threshold)
        .sum();

    FisherResult {
        odds_ratio,
        p_value: p_value.min(1.0),
    }
}

/// Assigns 1-based ranks, averaging over ties. Also returns `sum(t^3 - t)` over tie groups.
pub fn rank_with_ties(values: &[f64]) -> (Vec<f64>, f64) {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut tie_term = 0.0;
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        let average = (start + 1 + end) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = average;
        }
        let t = (end - start) as f64;
        tie_term += t * t * t - t;
        start = end;
    }
    (ranks, tie_term)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KruskalResult {
    pub statistic: f64,
    pub p_value: f64,
    pub dof: usize,
}

impl KruskalResult {
    fn undefined(dof: usize) -> Self {
        Self {
            statistic: f64::NAN,
            p_value: f64::NAN,
            dof,
        }
    }
}

/// Kruskal-Wallis H-test for independent samples, with tie correction.
///
/// An empty sample, a NaN value, or data that are all identical yield a NaN result.
pub fn kruskal(groups: &[Vec<f64>]) -> Result<KruskalResult, StatsError> {
    if groups.len() < 2 {
        return Err(StatsError::TooFewGroups {
            required: 2,
            found: groups.len(),
        });
    }
    let dof = groups.len() - 1;
    if groups.iter().any(|g| g.is_empty() || g.iter().any(|v| v.is_nan())) {
        return Ok(KruskalResult::undefined(dof));
    }

    let pooled: Vec<f64> = groups.iter().flatten().copied().collect();
    let n = pooled.len() as f64;
    let (ranks, tie_term) = rank_with_ties(&pooled);

    let mut offset = 0;
    let mut weighted = 0.0;
    for group in groups {
        let rank_sum: f64 = ranks[offset..offset + group.len()].iter().sum();
        weighted += rank_sum * rank_sum / group.len() as f64;
        offset += group.len();
    }

    let tie_correction = 1.0 - tie_term / (n * n * n - n);
    if tie_correction <= 0.0 {
        return Ok(KruskalResult::undefined(dof));
    }
    let statistic = (12.0 / (n * (n + 1.0)) * weighted - 3.0 * (n + 1.0)) / tie_correction;

    Ok(KruskalResult {
        statistic,
        p_value: chi2_sf(statistic, dof as f64),
        dof,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MannWhitneyMethod {
    /// Exact when either sample is small and there are no ties, otherwise asymptotic.
    #[default]
    Auto,
    Exact,
    Asymptotic,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MannWhitneyResult {
    /// U statistic of the first sample.
    pub statistic: f64,
    pub p_value: f64,
    pub method: MannWhitneyMethod,
}

/// Two-sided Mann-Whitney U test using automatic method selection.
pub fn mann_whitney_u(x: &[f64], y: &[f64]) -> MannWhitneyResult {
    mann_whitney_u_with(x, y, MannWhitneyMethod::Auto)
}

/// Two-sided Mann-Whitney U test.
///
/// The asymptotic method uses a tie-corrected variance and a continuity correction.
/// Empty samples or NaN values yield a NaN result.
pub fn mann_whitney_u_with(x: &[f64], y: &[f64], method: MannWhitneyMethod) -> MannWhitneyResult {
    let has_nan = x.iter().chain(y).any(|v| v.is_nan());
    if x.is_empty() || y.is_empty() || has_nan {
        return MannWhitneyResult {
            statistic: f64::NAN,
            p_value: f64::NAN,
            method,
        };
    }

    let n1 = x.len();
    let n2 = y.len();
    let pooled: Vec<f64> = x.iter().chain(y).copied().collect();
    let (ranks, tie_term) = rank_with_ties(&pooled);

    let rank_sum_x: f64 = ranks[..n1].iter().sum();
    let u1 = rank_sum_x - (n1 * (n1 + 1)) as f64 / 2.0;
    let u2 = (n1 * n2) as f64 - u1;
    let u = u1.max(u2);

    let method = match method {
        MannWhitneyMethod::Auto => {
            if (n1 > MWU_EXACT_MAX_SIZE && n2 > MWU_EXACT_MAX_SIZE) || tie_term > 0.0 {
                MannWhitneyMethod::Asymptotic
            } else {
                MannWhitneyMethod::Exact
            }
        }
        explicit => explicit,
    };

    let p_value = match method {
        MannWhitneyMethod::Exact => 2.0 * exact_u_sf(u, n1, n2),
        _ => {
            let n = (n1 + n2) as f64;
            let mu = (n1 * n2) as f64 / 2.0;
            let variance = ((n1 * n2) as f64 / 12.0 * ((n + 1.0) - tie_term / (n * (n - 1.0))))
                .max(0.0);
            let z = (u - mu - 0.5) / variance.sqrt();
            2.0 * normal_sf(z)
        }
    };

    MannWhitneyResult {
        statistic: u1,
        p_value: p_value.clamp(0.0, 1.0),
        method,
    }
}

/// `P(U >= u)` under the null distribution of U for samples of size `n1` and `n2`
/// without ties.
///
/// The frequencies are the coefficients of the Gaussian binomial coefficient
/// `[n1 + n2 choose m]_q = prod_{i=1..m} (1 - q^(n+i)) / (1 - q^i)`.
fn exact_u_sf(u: f64, n1: usize, n2: usize) -> f64 {
    let (m, n) = if n1 <= n2 { (n1, n2) } else { (n2, n1) };
    let len = m * n + m + 1;
    let mut freq = vec![0.0_f64; len];
    freq[0] = 1.0;

    for i in 1..=m {
        let shift = n + i;
        for k in (shift..len).rev() {
            freq[k] -= freq[k - shift];
        }
        for k in i..len {
            freq[k] += freq[k - i];
        }
    }

    let total: f64 = freq.iter().sum();
    let start = (u.ceil().max(0.0) as usize).min(len);
    let upper: f64 = freq[start..].iter().sum();
    upper / total
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn chi2_contingency_applies_yates_correction_for_2x2() {
        let result = chi2_contingency(&[vec![10, 20], vec![30, 40]], true).unwrap();
        assert_eq!(result.dof, 1);
        assert_close(result.statistic, 0.446_428_571_428_571_4, 1e-12);
        assert_close(result.p_value, 0.504_035_866_452_504_8, 1e-9);
    }

    #[test]
    fn chi2_contingency_without_correction_on_2x3() {
        let result = chi2_contingency(&[vec![10, 20, 30], vec![30, 20, 10]], true).unwrap();
        assert_eq!(result.dof, 2);
        assert_close(result.statistic, 20.0, 1e-12);
        assert_close(result.p_value, 4.539_992_976_248_485e-5, 1e-12);
        assert_close(result.expected[0][0], 20.0, 1e-12);
    }

    #[test]
    fn chi2_contingency_with_zero_dof_is_trivial() {
        let result = chi2_contingency(&[vec![5, 7]], true).unwrap();
        assert_eq!(result.dof, 0);
        assert_eq!(result.statistic, 0.0);
        assert_eq!(result.p_value, 1.0);
    }

    #[test]
    fn chi2_contingency_rejects_degenerate_tables() {
        assert_eq!(
            chi2_contingency(&[], true).unwrap_err(),
            StatsError::EmptyTable
        );
        assert_eq!(
            chi2_contingency(&[vec![1, 2], vec![3]], true).unwrap_err(),
            StatsError::RaggedTable
        );
        assert_eq!(
            chi2_contingency(&[vec![0, 2], vec![0, 3]], true).unwrap_err(),
            StatsError::ZeroExpectedFrequency { row: 0, column: 0 }
        );
    }

    #[test]
    fn fisher_exact_reference_values() {
        let result = fisher_exact([[8, 2], [1, 5]]);
        assert_close(result.odds_ratio, 20.0, 1e-12);
        assert_close(result.p_value, 0.034_965_034_965_034_97, 1e-10);

        assert_close(fisher_exact([[3, 1], [1, 3]]).p_value, 0.485_714_285_714_285_7, 1e-10);
        assert_close(fisher_exact([[2, 3], [4, 1]]).p_value, 0.523_809_523_809_523_8, 1e-10);
    }

    #[test]
    fn fisher_exact_with_zero_margin_returns_one() {
        let result = fisher_exact([[0, 0], [3, 4]]);
        assert_eq!(result.p_value, 1.0);
        assert!(result.odds_ratio.is_nan());
    }

    #[test]
    fn fisher_exact_with_zero_off_diagonal_has_infinite_odds() {
        let result = fisher_exact([[4, 0], [0, 4]]);
        assert!(result.odds_ratio.is_infinite());
        assert_close(result.p_value, 2.0 / 70.0, 1e-12);
    }

    #[test]
    fn rank_with_ties_averages_and_counts_ties() {
        let (ranks, tie_term) = rank_with_ties(&[10.0, 20.0, 10.0, 30.0]);
        assert_eq!(ranks, vec![1.5, 3.0, 1.5, 4.0]);
        assert_eq!(tie_term, 6.0);
    }

    #[test]
    fn kruskal_reference_values() {
        let result = kruskal(&[
            vec![1.0, 2.0, 3.0],
            vec![4.0, 5.0, 6.0],
            vec![7.0, 8.0, 9.0],
        ])
        .unwrap();
        assert_eq!(result.dof, 2);
        assert_close(result.statistic, 7.2, 1e-12);
        assert_close(result.p_value, 0.027_323_722_447_292_52, 1e-10);
    }

    #[test]
    fn kruskal_applies_tie_correction() {
        let result = kruskal(&[
            vec![1.0, 1.0, 2.0],
            vec![2.0, 3.0, 3.0],
            vec![4.0, 4.0, 5.0],
        ])
        .unwrap();
        assert_close(result.statistic, 7.057_471_264_367_809, 1e-10);
        assert_close(result.p_value, 0.029_341_991_493_191_49, 1e-10);
    }

    #[test]
    fn kruskal_degenerate_inputs() {
        assert_eq!(
            kruskal(&[vec![1.0]]).unwrap_err(),
            StatsError::TooFewGroups {
                required: 2,
                found: 1
            }
        );
        assert!(kruskal(&[vec![1.0], vec![]]).unwrap().p_value.is_nan());
        assert!(
            kruskal(&[vec![2.0, 2.0], vec![2.0]])
                .unwrap()
                .statistic
                .is_nan()
        );
    }

    #[test]
    fn mann_whitney_small_samples_use_exact_distribution() {
        let result = mann_whitney_u(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]);
        assert_eq!(result.method, MannWhitneyMethod::Exact);
        assert_eq!(result.statistic, 0.0);
        assert_close(result.p_value, 0.1, 1e-12);

        let result = mann_whitney_u(&[1.0, 4.0, 7.0], &[2.0, 3.0, 5.0, 6.0, 8.0]);
        assert_eq!(result.statistic, 6.0);
        assert_close(result.p_value, 0.785_714_285_714_285_7, 1e-12);
    }

    #[test]
    fn mann_whitney_exact_when_only_one_sample_is_small() {
        let x: Vec<f64> = (1..=12).map(|v| v as f64 * 10.0).collect();
        let result = mann_whitney_u(&x, &[5.0, 15.0, 25.0]);
        assert_eq!(result.method, MannWhitneyMethod::Exact);
        assert_eq!(result.statistic, 33.0);
        assert_close(result.p_value, 0.030_769_230_769_230_77, 1e-12);
    }

    #[test]
    fn mann_whitney_large_samples_use_normal_approximation() {
        let x: Vec<f64> = (1..=10).map(f64::from).collect();
        let y: Vec<f64> = (11..=20).map(f64::from).collect();
        let result = mann_whitney_u(&x, &y);
        assert_eq!(result.method, MannWhitneyMethod::Asymptotic);
        assert_eq!(result.statistic, 0.0);
        assert_close(result.p_value, 1.826_717_911_095_504e-4, 1e-10);

        let result = mann_whitney_u(
            &[1.1, 2.5, 3.3, 4.8, 5.2, 6.9, 7.1, 8.4, 9.6],
            &[2.0, 3.9, 4.1, 5.5, 6.0, 7.7, 8.8, 9.9, 10.5, 11.2],
        );
        assert_eq!(result.statistic, 31.0);
        assert_close(result.p_value, 0.270_344_140_654_780_1, 1e-9);
    }

    #[test]
    fn mann_whitney_ties_force_normal_approximation() {
        let result = mann_whitney_u(&[1.0, 2.0, 2.0, 3.0], &[2.0, 3.0, 4.0, 5.0]);
        assert_eq!(result.method, MannWhitneyMethod::Asymptotic);
        assert_eq!(result.statistic, 2.5);
        assert_close(result.p_value, 0.136_658_247_738_147_53, 1e-9);
    }

    #[test]
    fn mann_whitney_identical_samples_give_p_of_one() {
        let result = mann_whitney_u(&[3.0, 3.0, 3.0], &[3.0, 3.0]);
        assert_eq!(result.p_value, 1.0);
    }

    #[test]
    fn mann_whitney_empty_sample_is_nan() {
        let result = mann_whitney_u(&[], &[1.0, 2.0]);
        assert!(result.statistic.is_nan());
        assert!(result.p_value.is_nan());
    }

    #[test]
    fn exact_distribution_matches_known_counts() {
        // For n1 = n2 = 2 the U frequencies are 1, 1, 2, 1, 1.
        assert_close(exact_u_sf(0.0, 2, 2), 1.0, 1e-15);
        assert_close(exact_u_sf(3.0, 2, 2), 2.0 / 6.0, 1e-15);
        assert_close(exact_u_sf(4.0, 2, 2), 1.0 / 6.0, 1e-15);
        assert_close(exact_u_sf(5.0, 2, 2), 0.0, 1e-15);
    }
}
