//! Association between structural clusters (groups) and per-protein features.
//!
//! Categorical features are tested with a chi-squared omnibus test and pairwise
//! Fisher exact tests; numeric features with a Kruskal-Wallis omnibus test followed
//! by pairwise Mann-Whitney U tests when the omnibus test is significant. Pairwise
//! p-values are FDR-corrected across the whole family of comparisons.

use super::config::StatsConfig;
use super::error::EngineError;
use crate::core::models::table::Table;
use crate::core::stats::correction::false_discovery_control;
use crate::core::stats::descriptive::{FiveNumberSummary, median};
use crate::core::stats::hypothesis::{chi2_contingency, fisher_exact, kruskal, mann_whitney_u};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, warn};

/// How groups are contrasted in pairwise categorical tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComparisonMode {
    /// Every pair of groups against each other.
    #[default]
    OneVsOne,
    /// Every group against all remaining rows.
    OneVsRest,
}

impl fmt::Display for ComparisonMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComparisonMode::OneVsOne => write!(f, "one-vs-one"),
            ComparisonMode::OneVsRest => write!(f, "one-vs-rest"),
        }
    }
}

impl FromStr for ComparisonMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.replace('_', "-").to_ascii_lowercase().as_str() {
            "one-vs-one" => Ok(ComparisonMode::OneVsOne),
            "one-vs-rest" => Ok(ComparisonMode::OneVsRest),
            other => Err(format!(
                "unknown comparison mode '{}', expected 'one-vs-one' or 'one-vs-rest'",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OmnibusChi2 {
    pub test: &'static str,
    pub feature: String,
    pub statistic: f64,
    pub p_value: f64,
    pub dof: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OneVsOneRow {
    pub comparison: String,
    pub feature: String,
    pub count_g1: u64,
    pub count_g2: u64,
    pub odds_ratio: f64,
    pub p_value: f64,
    pub p_adj: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OneVsRestRow {
    pub group: String,
    pub feature: String,
    pub in_group_count: u64,
    pub out_group_count: u64,
    pub odds_ratio: f64,
    pub p_value: f64,
    pub p_adj: f64,
}

/// Rows of a pairwise categorical analysis, sorted by adjusted p-value.
#[derive(Debug, Clone, PartialEq)]
pub enum PairwiseCategorical {
    OneVsOne(Vec<OneVsOneRow>),
    OneVsRest(Vec<OneVsRestRow>),
}

impl PairwiseCategorical {
    pub fn len(&self) -> usize {
        match self {
            PairwiseCategorical::OneVsOne(rows) => rows.len(),
            PairwiseCategorical::OneVsRest(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KruskalOmnibus {
    pub test: &'static str,
    pub value: String,
    pub statistic: f64,
    pub p_value: f64,
    pub dof: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairwiseNumerical {
    pub comparison: String,
    pub median_1: f64,
    pub median_2: f64,
    pub statistic: f64,
    pub p_value: f64,
    pub p_adj: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumericalAnalysis {
    pub omnibus: KruskalOmnibus,
    /// Empty unless the omnibus p-value is below the configured alpha.
    pub pairwise: Vec<PairwiseNumerical>,
}

/// Group x feature contingency counts, optionally normalised to row proportions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossTab {
    pub groups: Vec<String>,
    pub features: Vec<String>,
    pub values: Vec<Vec<f64>>,
    pub normalized: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub group: String,
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// Orders by value with NaN last.
fn cmp_nan_last(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        (true, true) => Ordering::Equal,
        (false, true) => Ordering::Less,
        (true, false) => Ordering::Greater,
    }
}

/// Distinct non-missing values in order of first appearance.
fn unique_in_order(column: &[Option<String>]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    column
        .iter()
        .flatten()
        .filter(|v| seen.insert(v.as_str()))
        .cloned()
        .collect()
}

fn unordered_pairs(groups: &[String]) -> Vec<(usize, usize)> {
    (0..groups.len())
        .flat_map(|i| (i + 1..groups.len()).map(move |j| (i, j)))
        .collect()
}

/// Per-group and per-feature tallies used to fill 2x2 tables without rescanning rows.
struct CategoricalCounts {
    /// (group, feature) -> rows with both values.
    joint: HashMap<(String, String), u64>,
    /// group -> rows in the group, whatever their feature value.
    group_totals: HashMap<String, u64>,
    /// feature -> rows with the feature, whatever their group value.
    feature_totals: HashMap<String, u64>,
    rows: u64,
}

impl CategoricalCounts {
    fn tally(groups: &[Option<String>], features: &[Option<String>]) -> Self {
        let mut joint = HashMap::new();
        let mut group_totals = HashMap::new();
        let mut feature_totals = HashMap::new();
        for (group, feature) in groups.iter().zip(features) {
            if let Some(g) = group {
                *group_totals.entry(g.clone()).or_insert(0) += 1;
            }
            if let Some(f) = feature {
                *feature_totals.entry(f.clone()).or_insert(0) += 1;
            }
            if let (Some(g), Some(f)) = (group, feature) {
                *joint.entry((g.clone(), f.clone())).or_insert(0) += 1;
            }
        }
        Self {
            joint,
            group_totals,
            feature_totals,
            rows: groups.len() as u64,
        }
    }

    fn joint(&self, group: &str, feature: &str) -> u64 {
        self.joint
            .get(&(group.to_string(), feature.to_string()))
            .copied()
            .unwrap_or(0)
    }

    fn group_total(&self, group: &str) -> u64 {
        self.group_totals.get(group).copied().unwrap_or(0)
    }

    fn feature_total(&self, feature: &str) -> u64 {
        self.feature_totals.get(feature).copied().unwrap_or(0)
    }
}

/// Statistical comparison of groups over the columns of a feature table.
#[derive(Debug, Clone)]
pub struct GroupAnalysis {
    table: Table,
    config: StatsConfig,
}

impl GroupAnalysis {
    pub fn new(table: Table, config: StatsConfig) -> Self {
        Self { table, config }
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn config(&self) -> &StatsConfig {
        &self.config
    }

    /// Feature levels observed more than `min_obs` times, most frequent first.
    fn feature_levels(&self, feature_col: &str, min_obs: usize) -> Result<Vec<String>, EngineError> {
        let column = self.table.column(feature_col)?;
        let order = unique_in_order(column);
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for value in column.iter().flatten() {
            *counts.entry(value.as_str()).or_insert(0) += 1;
        }
        let mut levels: Vec<(usize, String)> = order
            .into_iter()
            .filter_map(|level| {
                let count = counts.get(level.as_str()).copied().unwrap_or(0);
                (count > min_obs).then_some((count, level))
            })
            .collect();
        // Stable sort keeps first-appearance order among equal counts.
        levels.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(levels.into_iter().map(|(_, level)| level).collect())
    }

    /// Global chi-squared test of association between `feature_col` and `group_col`.
    pub fn run_omnibus_chi2(
        &self,
        group_col: &str,
        feature_col: &str,
    ) -> Result<OmnibusChi2, EngineError> {
        let crosstab = self.crosstab(group_col, feature_col, false)?;
        if crosstab.groups.is_empty() {
            return Err(EngineError::EmptyColumn {
                column: feature_col.to_string(),
            });
        }

        // Features as rows, groups as columns.
        let observed: Vec<Vec<u64>> = (0..crosstab.features.len())
            .map(|f| {
                (0..crosstab.groups.len())
                    .map(|g| crosstab.values[g][f] as u64)
                    .collect()
            })
            .collect();

        let result = chi2_contingency(&observed, true)?;
        info!(
            "Chi2 omnibus for '{}' by '{}': chi2 = {:.4}, dof = {}, p = {:.4e}",
            feature_col, group_col, result.statistic, result.dof, result.p_value
        );
        Ok(OmnibusChi2 {
            test: "Chi2 Omnibus",
            feature: feature_col.to_string(),
            statistic: result.statistic,
            p_value: result.p_value,
            dof: result.dof,
        })
    }

    /// Pairwise Fisher exact tests for every feature level.
    ///
    /// Rows whose feature value is missing count as "not the feature". In one-vs-rest
    /// mode rows with a missing group belong to the rest.
    pub fn run_pairwise_categorical(
        &self,
        group_col: &str,
        feature_col: &str,
        mode: ComparisonMode,
        min_obs: Option<usize>,
    ) -> Result<PairwiseCategorical, EngineError> {
        let min_obs = min_obs.unwrap_or(self.config.min_obs);
        let group_values = self.table.column(group_col)?;
        let feature_values = self.table.column(feature_col)?;

        let features = self.feature_levels(feature_col, min_obs)?;
        if features.is_empty() {
            warn!(
                "No features in '{}' met the >{} observation threshold.",
                feature_col, min_obs
            );
            return Ok(match mode {
                ComparisonMode::OneVsOne => PairwiseCategorical::OneVsOne(Vec::new()),
                ComparisonMode::OneVsRest => PairwiseCategorical::OneVsRest(Vec::new()),
            });
        }

        let groups = unique_in_order(group_values);
        let counts = CategoricalCounts::tally(group_values, feature_values);
        debug!(
            "Pairwise {} tests over {} groups and {} feature levels",
            mode,
            groups.len(),
            features.len()
        );

        let result = match mode {
            ComparisonMode::OneVsOne => {
                let tasks: Vec<(usize, usize, usize)> = unordered_pairs(&groups)
                    .into_iter()
                    .flat_map(|(i, j)| (0..features.len()).map(move |f| (i, j, f)))
                    .collect();
                let mut rows: Vec<OneVsOneRow> = tasks
                    .par_iter()
                    .map(|&(i, j, f)| {
                        let (g1, g2, feat) = (&groups[i], &groups[j], &features[f]);
                        let a = counts.joint(g1, feat);
                        let b = counts.group_total(g1) - a;
                        let c = counts.joint(g2, feat);
                        let d = counts.group_total(g2) - c;
                        let fisher = fisher_exact([[a, b], [c, d]]);
                        OneVsOneRow {
                            comparison: format!("{} vs {}", g1, g2),
                            feature: feat.clone(),
                            count_g1: a,
                            count_g2: c,
                            odds_ratio: fisher.odds_ratio,
                            p_value: fisher.p_value,
                            p_adj: f64::NAN,
                        }
                    })
                    .collect();

                let p: Vec<f64> = rows.iter().map(|r| r.p_value).collect();
                let adjusted = false_discovery_control(&p, self.config.fdr_method);
                for (row, p_adj) in rows.iter_mut().zip(adjusted) {
                    row.p_adj = p_adj;
                }
                rows.sort_by(|x, y| cmp_nan_last(x.p_adj, y.p_adj));
                PairwiseCategorical::OneVsOne(rows)
            }
            ComparisonMode::OneVsRest => {
                let tasks: Vec<(usize, usize)> = (0..groups.len())
                    .flat_map(|g| (0..features.len()).map(move |f| (g, f)))
                    .collect();
                let mut rows: Vec<OneVsRestRow> = tasks
                    .par_iter()
                    .map(|&(g, f)| {
                        let (group, feat) = (&groups[g], &features[f]);
                        let in_group = counts.group_total(group);
                        let a = counts.joint(group, feat);
                        let b = in_group - a;
                        let c = counts.feature_total(feat) - a;
                        let d = (counts.rows - in_group) - c;
                        let fisher = fisher_exact([[a, b], [c, d]]);
                        OneVsRestRow {
                            group: group.clone(),
                            feature: feat.clone(),
                            in_group_count: a,
                            out_group_count: c,
                            odds_ratio: fisher.odds_ratio,
                            p_value: fisher.p_value,
                            p_adj: f64::NAN,
                        }
                    })
                    .collect();

                let p: Vec<f64> = rows.iter().map(|r| r.p_value).collect();
                let adjusted = false_discovery_control(&p, self.config.fdr_method);
                for (row, p_adj) in rows.iter_mut().zip(adjusted) {
                    row.p_adj = p_adj;
                }
                rows.sort_by(|x, y| cmp_nan_last(x.p_adj, y.p_adj));
                PairwiseCategorical::OneVsRest(rows)
            }
        };

        info!(
            "Computed {} pairwise comparisons for '{}' by '{}'",
            result.len(),
            feature_col,
            group_col
        );
        Ok(result)
    }

    /// Non-missing values of `value_col` per group, groups in order of first appearance.
    fn grouped_values(
        &self,
        group_col: &str,
        value_col: &str,
    ) -> Result<Vec<(String, Vec<f64>)>, EngineError> {
        let group_values = self.table.column(group_col)?;
        let values = self.table.numeric_column(value_col)?;
        let groups = unique_in_order(group_values);

        let mut grouped: Vec<(String, Vec<f64>)> =
            groups.iter().map(|g| (g.clone(), Vec::new())).collect();
        let index: HashMap<&str, usize> = groups
            .iter()
            .enumerate()
            .map(|(i, g)| (g.as_str(), i))
            .collect();
        for (group, value) in group_values.iter().zip(values) {
            if let (Some(g), Some(v)) = (group, value) {
                if v.is_nan() {
                    continue;
                }
                grouped[index[g.as_str()]].1.push(v);
            }
        }
        Ok(grouped)
    }

    /// Kruskal-Wallis across groups, then pairwise Mann-Whitney U tests if significant.
    pub fn run_numerical_distributions(
        &self,
        group_col: &str,
        value_col: &str,
    ) -> Result<NumericalAnalysis, EngineError> {
        let grouped = self.grouped_values(group_col, value_col)?;
        let samples: Vec<Vec<f64>> = grouped.iter().map(|(_, v)| v.clone()).collect();

        let omnibus = kruskal(&samples)?;
        info!(
            "Kruskal-Wallis for '{}' by '{}': H = {:.4}, p = {:.4e}",
            value_col, group_col, omnibus.statistic, omnibus.p_value
        );
        let omnibus_row = KruskalOmnibus {
            test: "Kruskal-Wallis",
            value: value_col.to_string(),
            statistic: omnibus.statistic,
            p_value: omnibus.p_value,
            dof: omnibus.dof,
        };

        if !(omnibus.p_value < self.config.alpha) {
            debug!(
                "Omnibus p-value not below alpha = {}; skipping pairwise tests",
                self.config.alpha
            );
            return Ok(NumericalAnalysis {
                omnibus: omnibus_row,
                pairwise: Vec::new(),
            });
        }

        let names: Vec<String> = grouped.iter().map(|(g, _)| g.clone()).collect();
        let mut pairwise: Vec<PairwiseNumerical> = unordered_pairs(&names)
            .par_iter()
            .map(|&(i, j)| {
                let (g1, d1) = &grouped[i];
                let (g2, d2) = &grouped[j];
                let test = mann_whitney_u(d1, d2);
                PairwiseNumerical {
                    comparison: format!("{} vs {}", g1, g2),
                    median_1: median(d1),
                    median_2: median(d2),
                    statistic: test.statistic,
                    p_value: test.p_value,
                    p_adj: f64::NAN,
                }
            })
            .collect();

        let p: Vec<f64> = pairwise.iter().map(|r| r.p_value).collect();
        let adjusted = false_discovery_control(&p, self.config.fdr_method);
        for (row, p_adj) in pairwise.iter_mut().zip(adjusted) {
            row.p_adj = p_adj;
        }

        Ok(NumericalAnalysis {
            omnibus: omnibus_row,
            pairwise,
        })
    }

    /// Group x feature counts over rows with both values present.
    ///
    /// Groups and features are sorted lexicographically. With `normalize`, each
    /// group row is divided by its total.
    pub fn crosstab(
        &self,
        group_col: &str,
        feature_col: &str,
        normalize: bool,
    ) -> Result<CrossTab, EngineError> {
        let group_values = self.table.column(group_col)?;
        let feature_values = self.table.column(feature_col)?;

        let pairs: Vec<(&str, &str)> = group_values
            .iter()
            .zip(feature_values)
            .filter_map(|(g, f)| Some((g.as_deref()?, f.as_deref()?)))
            .collect();

        let groups: Vec<String> = pairs
            .iter()
            .map(|(g, _)| *g)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect();
        let features: Vec<String> = pairs
            .iter()
            .map(|(_, f)| *f)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect();

        let group_index: HashMap<&str, usize> = groups
            .iter()
            .enumerate()
            .map(|(i, g)| (g.as_str(), i))
            .collect();
        let feature_index: HashMap<&str, usize> = features
            .iter()
            .enumerate()
            .map(|(i, f)| (f.as_str(), i))
            .collect();

        let mut values = vec![vec![0.0; features.len()]; groups.len()];
        for (g, f) in &pairs {
            values[group_index[g]][feature_index[f]] += 1.0;
        }

        if normalize {
            for row in &mut values {
                let total: f64 = row.iter().sum();
                if total > 0.0 {
                    row.iter_mut().for_each(|v| *v /= total);
                }
            }
        }

        Ok(CrossTab {
            groups,
            features,
            values,
            normalized: normalize,
        })
    }

    /// Five-number summary of `value_col` for every group.
    pub fn summarize_distribution(
        &self,
        group_col: &str,
        value_col: &str,
    ) -> Result<Vec<GroupSummary>, EngineError> {
        Ok(self
            .grouped_values(group_col, value_col)?
            .into_iter()
            .map(|(group, values)| {
                let s = FiveNumberSummary::from_values(&values);
                GroupSummary {
                    group,
                    count: s.count,
                    min: s.min,
                    q1: s.q1,
                    median: s.median,
                    q3: s.q3,
                    max: s.max,
                }
            })
            .collect())
    }
}
