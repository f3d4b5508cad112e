use crate::cli::{OutputFormat, StatsArgs, StatsCommands, TableArgs};
use crate::config::FileConfig;
use crate::config::builder::{StatsOverrides, build_stats_config};
use crate::error::{CliError, Result};
use crate::output::{TextTable, write_json, write_records};
use serde::Serialize;
use std::io::Write;
use tracing::info;
use wzyclust::core::io::table::TableFile;
use wzyclust::engine::analysis::{CrossTab, GroupAnalysis, NumericalAnalysis, PairwiseCategorical};

pub async fn run(args: StatsArgs, file_config: &FileConfig) -> Result<()> {
    let stdout = std::io::stdout();
    tokio::task::block_in_place(|| execute(args, file_config, &mut stdout.lock()))
}

/// Runs one statistics command and writes its report to `out`.
pub fn execute(args: StatsArgs, file_config: &FileConfig, out: &mut impl Write) -> Result<()> {
    match args.command {
        StatsCommands::Chi2(a) => {
            let analysis = load_analysis(&a.table, &StatsOverrides::default(), file_config)?;
            let result = analysis.run_omnibus_chi2(&a.table.group, &a.feature)?;
            write_records(std::slice::from_ref(&result), a.table.format, out)
        }
        StatsCommands::Pairwise(a) => {
            let overrides = StatsOverrides {
                min_obs: a.min_obs,
                fdr_method: a.fdr,
                ..Default::default()
            };
            let analysis = load_analysis(&a.table, &overrides, file_config)?;
            let result =
                analysis.run_pairwise_categorical(&a.table.group, &a.feature, a.mode, None)?;
            match result {
                PairwiseCategorical::OneVsOne(rows) => write_records(&rows, a.table.format, out),
                PairwiseCategorical::OneVsRest(rows) => write_records(&rows, a.table.format, out),
            }
        }
        StatsCommands::Numeric(a) => {
            let overrides = StatsOverrides {
                alpha: a.alpha,
                fdr_method: a.fdr,
                ..Default::default()
            };
            let analysis = load_analysis(&a.table, &overrides, file_config)?;
            let result = analysis.run_numerical_distributions(&a.table.group, &a.value)?;
            write_numerical(&result, analysis.config().alpha, a.table.format, out)
        }
        StatsCommands::Crosstab(a) => {
            let analysis = load_analysis(&a.table, &StatsOverrides::default(), file_config)?;
            let crosstab = analysis.crosstab(&a.table.group, &a.feature, a.normalize)?;
            write_crosstab(&crosstab, &a.table.group, a.table.format, out)
        }
        StatsCommands::Summary(a) => {
            let analysis = load_analysis(&a.table, &StatsOverrides::default(), file_config)?;
            let summary = analysis.summarize_distribution(&a.table.group, &a.value)?;
            write_records(&summary, a.table.format, out)
        }
    }
}

fn load_analysis(
    table_args: &TableArgs,
    overrides: &StatsOverrides,
    file_config: &FileConfig,
) -> Result<GroupAnalysis> {
    let config = build_stats_config(overrides, file_config)?;
    info!("Loading table from {:?}", &table_args.input);
    let table = TableFile::read_from_path(&table_args.input).map_err(|e| CliError::FileParsing {
        path: table_args.input.clone(),
        source: e.into(),
    })?;
    info!(
        "Loaded {} rows x {} columns.",
        table.num_rows(),
        table.num_columns()
    );
    Ok(GroupAnalysis::new(table, config))
}

#[derive(Serialize)]
struct NumericalReport<'a> {
    omnibus: &'a wzyclust::engine::analysis::KruskalOmnibus,
    pairwise: &'a [wzyclust::engine::analysis::PairwiseNumerical],
}

fn write_numerical(
    result: &NumericalAnalysis,
    alpha: f64,
    format: OutputFormat,
    out: &mut impl Write,
) -> Result<()> {
    if format == OutputFormat::Json {
        return write_json(
            &NumericalReport {
                omnibus: &result.omnibus,
                pairwise: &result.pairwise,
            },
            out,
        );
    }

    write_records(std::slice::from_ref(&result.omnibus), format, out)?;
    if result.pairwise.is_empty() {
        if format == OutputFormat::Text {
            writeln!(
                out,
                "\nNo pairwise comparisons: Kruskal-Wallis p-value is not below alpha = {}.",
                alpha
            )?;
        }
        return Ok(());
    }
    writeln!(out)?;
    write_records(&result.pairwise, format, out)
}

fn write_crosstab(
    crosstab: &CrossTab,
    group_col: &str,
    format: OutputFormat,
    out: &mut impl Write,
) -> Result<()> {
    if format == OutputFormat::Json {
        return write_json(crosstab, out);
    }

    let headers = std::iter::once(group_col.to_string())
        .chain(crosstab.features.iter().cloned())
        .collect();
    let rows = crosstab
        .groups
        .iter()
        .zip(&crosstab.values)
        .map(|(group, values)| {
            std::iter::once(group.clone())
                .chain(values.iter().map(|v| v.to_string()))
                .collect()
        })
        .collect();
    TextTable::new(headers, rows).write(format, out)
}
