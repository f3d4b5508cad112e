use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use wzyclust::core::stats::correction::FdrMethod;
use wzyclust::engine::analysis::ComparisonMode;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Wzy Structural Clustering Contributors",
    version,
    about = "wzyclust - Helper tooling for structure-based clustering of bacterial Wzy polymerases: AlphaFold3 job generation, Merizo-search submission, and cluster/feature association statistics.",
    help_template = HELP_TEMPLATE,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel statistical tests.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,

    /// Path to a configuration file in TOML format.
    /// Defaults to `config.toml` in the user configuration directory, if present.
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S merizo.database=cath
    #[arg(short = 'S', long = "set", global = true, value_name = "KEY=VALUE")]
    pub set_values: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write one AlphaFold3 input JSON per FASTA record.
    Af3Json(Af3JsonArgs),
    /// Submit PDB structures to the Merizo-search domain search service.
    MerizoSubmit(MerizoSubmitArgs),
    /// Test association between structural clusters and protein features.
    Stats(StatsArgs),
    /// Inspect the configuration file location.
    Config(ConfigArgs),
}

/// Arguments for the `af3-json` subcommand.
#[derive(Args, Debug)]
pub struct Af3JsonArgs {
    /// FASTA files to convert.
    #[arg(required = true, value_name = "FASTA")]
    pub fastas: Vec<PathBuf>,

    /// Directory for the generated job files; created if missing.
    #[arg(short, long, default_value = ".", value_name = "DIR")]
    pub outdir: PathBuf,

    /// Indent the generated JSON.
    #[arg(long)]
    pub pretty: bool,

    /// Model seed to request. Can be used multiple times.
    #[arg(long = "seed", value_name = "N")]
    pub seeds: Vec<u64>,

    /// Chain identifier assigned to each protein.
    #[arg(long, value_name = "ID")]
    pub chain_id: Option<String>,
}

/// Arguments for the `merizo-submit` subcommand.
#[derive(Args, Debug)]
pub struct MerizoSubmitArgs {
    /// Structure files to submit; only `.pdb` files are sent.
    #[arg(required = true, value_name = "PDB")]
    pub pdbs: Vec<PathBuf>,

    /// Email address registered with the submission.
    #[arg(short, long, value_name = "EMAIL")]
    pub email: Option<String>,

    /// Chain to search.
    #[arg(long, value_name = "ID")]
    pub chain: Option<String>,

    /// Domain database to search against (e.g., 'ted', 'cath').
    #[arg(long, value_name = "NAME")]
    pub db: Option<String>,

    /// Override the submission endpoint.
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// Per-request timeout in seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

/// Arguments for the `stats` subcommand.
#[derive(Args, Debug)]
pub struct StatsArgs {
    #[command(subcommand)]
    pub command: StatsCommands,
}

#[derive(Subcommand, Debug)]
pub enum StatsCommands {
    /// Chi-squared omnibus test of a categorical feature against the groups.
    Chi2(CategoricalArgs),
    /// Pairwise Fisher exact tests for every level of a categorical feature.
    Pairwise(PairwiseArgs),
    /// Kruskal-Wallis test of a numeric value, with pairwise Mann-Whitney U follow-up.
    Numeric(NumericArgs),
    /// Group x feature contingency table.
    Crosstab(CrosstabArgs),
    /// Per-group five-number summary of a numeric value.
    Summary(SummaryArgs),
}

/// Input table and output options shared by all `stats` commands.
#[derive(Args, Debug, Clone)]
pub struct TableArgs {
    /// Input table (CSV, or TSV for `.tsv`/`.tab` files) with a header row.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Column holding the group (cluster) label of each row.
    #[arg(short, long, required = true, value_name = "COLUMN")]
    pub group: String,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Args, Debug)]
pub struct CategoricalArgs {
    #[command(flatten)]
    pub table: TableArgs,

    /// Categorical feature column.
    #[arg(short, long, required = true, value_name = "COLUMN")]
    pub feature: String,
}

#[derive(Args, Debug)]
pub struct PairwiseArgs {
    #[command(flatten)]
    pub table: TableArgs,

    /// Categorical feature column.
    #[arg(short, long, required = true, value_name = "COLUMN")]
    pub feature: String,

    /// Compare every pair of groups, or every group against the rest.
    #[arg(long, default_value = "one-vs-one", value_name = "MODE")]
    pub mode: ComparisonMode,

    /// Only test feature levels observed more often than this.
    #[arg(long, value_name = "N")]
    pub min_obs: Option<usize>,

    /// False discovery rate procedure ('bh' or 'by').
    #[arg(long, value_name = "METHOD")]
    pub fdr: Option<FdrMethod>,
}

#[derive(Args, Debug)]
pub struct NumericArgs {
    #[command(flatten)]
    pub table: TableArgs,

    /// Numeric value column.
    #[arg(short = 'V', long, required = true, value_name = "COLUMN")]
    pub value: String,

    /// Significance level of the Kruskal-Wallis test that gates pairwise tests.
    #[arg(long, value_name = "FLOAT")]
    pub alpha: Option<f64>,

    /// False discovery rate procedure ('bh' or 'by').
    #[arg(long, value_name = "METHOD")]
    pub fdr: Option<FdrMethod>,
}

#[derive(Args, Debug)]
pub struct CrosstabArgs {
    #[command(flatten)]
    pub table: TableArgs,

    /// Categorical feature column.
    #[arg(short, long, required = true, value_name = "COLUMN")]
    pub feature: String,

    /// Report row proportions instead of counts.
    #[arg(long)]
    pub normalize: bool,
}

#[derive(Args, Debug)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub table: TableArgs,

    /// Numeric value column.
    #[arg(short = 'V', long, required = true, value_name = "COLUMN")]
    pub value: String,
}

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Aligned columns for reading in a terminal.
    #[default]
    Text,
    Csv,
    Json,
}

/// Arguments for the `config` subcommand.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the path of the default configuration file.
    Path,
    /// Print the effective configuration after merging file, --set values and defaults.
    Show,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_are_accepted_after_subcommand() {
        let cli = Cli::try_parse_from([
            "wzyclust",
            "af3-json",
            "a.fasta",
            "-vv",
            "-S",
            "af3.dialect=alphafold3",
            "--seed",
            "1",
            "--seed",
            "2",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.set_values, vec!["af3.dialect=alphafold3"]);
        let Commands::Af3Json(args) = cli.command else {
            panic!("expected af3-json");
        };
        assert_eq!(args.seeds, vec![1, 2]);
        assert_eq!(args.outdir, PathBuf::from("."));
    }

    #[test]
    fn stats_numeric_uses_short_v_for_value_column() {
        let cli = Cli::try_parse_from([
            "wzyclust", "stats", "numeric", "-i", "t.csv", "-g", "cluster", "-V", "length",
            "--format", "json",
        ])
        .unwrap();
        let Commands::Stats(StatsArgs {
            command: StatsCommands::Numeric(args),
        }) = cli.command
        else {
            panic!("expected stats numeric");
        };
        assert_eq!(args.value, "length");
        assert_eq!(args.table.format, OutputFormat::Json);
    }

    #[test]
    fn pairwise_mode_parses() {
        let cli = Cli::try_parse_from([
            "wzyclust", "stats", "pairwise", "-i", "t.csv", "-g", "c", "-f", "fold", "--mode",
            "one-vs-rest", "--fdr", "by",
        ])
        .unwrap();
        let Commands::Stats(StatsArgs {
            command: StatsCommands::Pairwise(args),
        }) = cli.command
        else {
            panic!("expected stats pairwise");
        };
        assert_eq!(args.mode, ComparisonMode::OneVsRest);
        assert_eq!(args.fdr, Some(FdrMethod::By));
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["wzyclust", "-q", "-v", "config", "path"]).is_err());
    }
}
