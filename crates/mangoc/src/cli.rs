// crates/mangoc/src/cli.rs

use clap::{builder::ValueHint, Parser, Subcommand};
use mango::{parse_condition_bounded, parse_find_options, Compiler, IndexDefinition, Sort};
use serde::Serialize;
use serde_json::Value as Json;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, error, info};

use crate::settings::Settings;
use crate::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// mangoc: Mango query compiler
#[tracing::instrument(skip_all)]
pub fn start() -> ExitCode {
    let cli = Cli::parse();

    run(&cli).map_or_else(
        |e| {
            error!("mangoc failed: {}", e);
            ExitCode::FAILURE
        },
        |out| {
            println!("{out}");
            info!("mangoc finished successfully");
            ExitCode::SUCCESS
        },
    )
}

#[derive(Parser, Debug)]
#[command(
    name = "mangoc",
    version,
    about = "Compile filter conditions into Mango query documents"
)]
pub struct Cli {
    /// Settings file (or set MANGOC_CONFIG)
    #[arg(
        long,
        global = true,
        value_name = "FILE",
        env = "MANGOC_CONFIG",
        value_hint = ValueHint::FilePath
    )]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile a condition into a query document
    Compile(CompileCmd),
    /// Print the index definition for a field or a sort key
    Index(IndexCmd),
}

#[derive(Parser, Debug)]
pub struct CompileCmd {
    /// Condition in tuple form, e.g. `["task_name", "==", "task2"]`
    ///
    /// Reads stdin when omitted or `-`.
    #[arg(value_name = "INPUT", value_hint = ValueHint::FilePath)]
    pub input: Option<PathBuf>,

    /// JSON file holding `limit` and `sort`
    #[arg(long, value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub options: Option<PathBuf>,

    /// Maximum number of documents; overrides --options
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    pub limit: Option<u64>,

    /// Sort key as FIELD:DIR (asc|desc); overrides --options
    #[arg(long, value_name = "FIELD:DIR", value_parser = parse_sort_arg)]
    pub sort: Option<Sort>,

    /// Pretty-print the document
    #[arg(long)]
    pub pretty: bool,
}

#[derive(Parser, Debug)]
pub struct IndexCmd {
    /// Field to index
    #[arg(value_name = "FIELD", required_unless_present = "sort", conflicts_with = "sort")]
    pub field: Option<String>,

    /// Index backing a sort key given as FIELD:DIR
    #[arg(long, value_name = "FIELD:DIR", value_parser = parse_sort_arg)]
    pub sort: Option<Sort>,

    /// Pretty-print the definition
    #[arg(long)]
    pub pretty: bool,
}

fn parse_sort_arg(s: &str) -> std::result::Result<Sort, String> {
    let (field, dir) = s
        .rsplit_once(':')
        .ok_or_else(|| format!("expected FIELD:DIR, got {s:?}"))?;
    if field.is_empty() {
        return Err(format!("missing sort field in {s:?}"));
    }
    Sort::parse(field, dir).map_err(|e| e.to_string())
}

/// Execute a parsed command line and return what should be printed.
#[tracing::instrument(skip_all)]
pub fn run(cli: &Cli) -> Result<String> {
    let settings = Settings::load(cli.config.as_deref())?;

    match &cli.command {
        Commands::Compile(cmd) => do_compile(cmd, &settings),
        Commands::Index(cmd) => do_index(cmd, &settings),
    }
}

fn do_index(cmd: &IndexCmd, settings: &Settings) -> Result<String> {
    let def = match (&cmd.field, &cmd.sort) {
        (Some(field), _) => IndexDefinition::for_field(field.clone()),
        (None, Some(sort)) => IndexDefinition::for_sort(sort),
        (None, None) => return Err(Error::InvalidArgument("no index field given".into())),
    };
    debug!(name = %def.name, "index definition built");
    render(&def, cmd.pretty || settings.output.pretty)
}

fn do_compile(cmd: &CompileCmd, settings: &Settings) -> Result<String> {
    let text = read_input(cmd.input.as_deref())?;
    if text.trim().is_empty() {
        return Err(Error::InvalidArgument("no condition given".into()));
    }

    let condition_json: Json = serde_json::from_str(&text)?;
    let condition = parse_condition_bounded(&condition_json, settings.compiler.max_depth)?;

    let mut opts = match &cmd.options {
        Some(path) => {
            let options_json: Json = serde_json::from_str(&std::fs::read_to_string(path)?)?;
            parse_find_options(&options_json)?
        }
        None => Default::default(),
    };
    if let Some(limit) = cmd.limit {
        opts.limit = Some(limit);
    }
    if let Some(sort) = &cmd.sort {
        opts.sort = Some(sort.clone());
    }
    debug!(?opts, "find options resolved");

    let doc = Compiler::new(settings.compiler).compile(&condition, &opts)?;
    render(&doc, cmd.pretty || settings.output.pretty)
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(p) if p != Path::new("-") => Ok(std::fs::read_to_string(p)?),
        _ => {
            let mut s = String::new();
            std::io::stdin().read_to_string(&mut s)?;
            Ok(s)
        }
    }
}

fn render<T: Serialize>(value: &T, pretty: bool) -> Result<String> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(out)
}
