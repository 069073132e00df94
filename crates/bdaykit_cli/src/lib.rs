//! `bdaykit` command line: read a contact export, write the birthday workbook.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bdaykit_birthday::{
    C_COL_MEMBERSHIP, N_TARGET_YEAR_DEFAULT, N_TARGET_YEAR_MAX, N_TARGET_YEAR_MIN,
    SpecBirthdayReportOptions, build_birthday_report,
};
use bdaykit_io_xlsx::read_table_from_path;
use clap::{ArgAction, Parser};
use polars::prelude::{AnyValue, DataFrame, IdxCa, IdxSize, PolarsResult};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Membership token kept by `--only-active`.
pub const C_TOKEN_ACTIVE: &str = "Aktiv";

#[derive(Parser, Debug)]
#[command(
    name = "bdaykit",
    version,
    about = "Build a birthday list workbook (one sheet per month) from a contact export."
)]
pub struct Args {
    /// Contact export (.xlsx, .xls or .ods); the first sheet is read.
    pub input: PathBuf,

    /// Year ages are computed for.
    #[arg(
        long,
        default_value_t = N_TARGET_YEAR_DEFAULT,
        value_parser = clap::value_parser!(i32)
            .range(i64::from(N_TARGET_YEAR_MIN)..=i64::from(N_TARGET_YEAR_MAX))
    )]
    pub year: i32,

    /// Do not emit the `Ohne_Geburtsdatum` sheet.
    #[arg(long)]
    pub no_undated_sheet: bool,

    /// Keep only rows whose membership contains "Aktiv".
    #[arg(long, conflicts_with = "filter_membership")]
    pub only_active: bool,

    /// Keep only rows whose membership contains TEXT (case-sensitive).
    #[arg(long, value_name = "TEXT")]
    pub filter_membership: Option<String>,

    /// Output path [default: Geburtstagsliste_<YEAR>.xlsx].
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Print the input's column names and exit.
    #[arg(long)]
    pub list_columns: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace). `RUST_LOG` wins.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Membership token to pre-filter by, if any.
    pub fn membership_token(&self) -> Option<&str> {
        if self.only_active {
            return Some(C_TOKEN_ACTIVE);
        }
        self.filter_membership.as_deref()
    }

    /// Resolved output path.
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| PathBuf::from(derive_default_output_name(self.year)))
    }
}

/// Default download name of the workbook.
pub fn derive_default_output_name(target_year: i32) -> String {
    format!("Geburtstagsliste_{target_year}.xlsx")
}

/// Install the stderr `tracing` subscriber.
pub fn init_logging(verbose: u8) {
    let c_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(c_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Keep rows whose `Mitgliedschaft` text contains `token`.
///
/// Null memberships are dropped. Without a membership column the table is
/// returned unchanged.
pub fn filter_rows_by_membership(df: &DataFrame, token: &str) -> PolarsResult<DataFrame> {
    let Ok(col) = df.column(C_COL_MEMBERSHIP) else {
        debug!(token, "no membership column, filter skipped");
        return Ok(df.clone());
    };

    let mut l_idx: Vec<IdxSize> = Vec::new();
    for n_idx in 0..df.height() {
        let if_keep = match col.get(n_idx)? {
            AnyValue::Null => false,
            AnyValue::String(s) => s.contains(token),
            AnyValue::StringOwned(s) => s.contains(token),
            other => other.to_string().contains(token),
        };
        if if_keep {
            l_idx.push(n_idx as IdxSize);
        }
    }
    debug!(token, n_rows_in = df.height(), n_rows_out = l_idx.len(), "membership filter");
    df.take(&IdxCa::from_vec("idx".into(), l_idx))
}

/// Execute one invocation; user-facing lines go to `out`.
pub fn run(args: &Args, out: &mut impl Write) -> Result<()> {
    let df_raw = read_table_from_path(&args.input)
        .with_context(|| format!("Cannot read input table {}", args.input.display()))?;
    info!(
        path = %args.input.display(),
        n_rows = df_raw.height(),
        n_cols = df_raw.width(),
        "input loaded"
    );

    if args.list_columns {
        for c_col in df_raw.get_column_names_str() {
            writeln!(out, "{c_col}")?;
        }
        return Ok(());
    }

    let df_input = match args.membership_token() {
        Some(token) => filter_rows_by_membership(&df_raw, token)
            .context("Cannot filter rows by membership")?,
        None => df_raw,
    };

    let options = SpecBirthdayReportOptions {
        target_year: args.year,
        include_undated_sheet: !args.no_undated_sheet,
    };
    let output = build_birthday_report(&df_input, &options).context("Cannot build report")?;

    let path_out = args.output_path();
    write_output(&path_out, &output.bytes)?;

    writeln!(
        out,
        "wrote {} ({})",
        path_out.display(),
        output.sheet_names().join(", ")
    )?;
    writeln!(out, "{}", output.stats)?;
    Ok(())
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(dir_parent) = path.parent()
        && !dir_parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(dir_parent)
            .with_context(|| format!("Cannot create directory {}", dir_parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("Cannot write {}", path.display()))
}
