use anyhow::{Context, Result};
use clap::Parser;
use fngraph_graph::cg::{CallGraph, CallGraphResolver};
use fngraph_graph::cg_dot::{CgToDot, DotExportConfig};
use fngraph_graph::cg_json::{CgToJson, JsonExportConfig};
use fngraph_graph::entry::select_entry;
use fngraph_graph::ignore::IgnoreSet;
use fngraph_graph::loader::load_sources;
use fngraph_graph::model::ContractRegistry;
use fngraph_language::get_language_for_file;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::{stdout, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about = "Builds the function call graph reachable from one Solidity function", long_about = None)]
struct Cli {
    /// Solidity source file. Its imports are followed.
    file: PathBuf,

    /// Contract to start from. Defaults to the file name up to its first '.'.
    contract: Option<String>,

    /// Function to start from. Defaults to the fallback function.
    function: Option<String>,

    /// Parameter count of the entry function, to pick between overloads.
    param_count: Option<usize>,

    /// Function to keep as a leaf, as Contract:FunctionName:ParamCount. Repeatable.
    #[arg(short, long, value_name = "SPEC")]
    ignore: Vec<String>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Dot)]
    format: OutputFormat,

    /// Output file path. If not specified, output goes to stdout.
    #[arg(short, long)]
    output_file: Option<PathBuf>,

    /// Export settings (format: key=value,key2=value2).
    /// Keys: cluster_color, edge_color, cross_context_edge_color, graph_name, pretty, metadata
    #[arg(long)]
    config: Option<String>,

    /// Log resolution details to stderr.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Dot,
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Dot => write!(f, "dot"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug)]
enum Sol2FgError {
    InvalidConfigValue { key: String, value: String },
    OutputWriteError(PathBuf, std::io::Error),
    StdoutWriteError(std::io::Error),
}

impl std::error::Error for Sol2FgError {}

impl fmt::Display for Sol2FgError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sol2FgError::InvalidConfigValue { key, value } => {
                write!(f, "Invalid value '{}' for config key '{}'", value, key)
            }
            Sol2FgError::OutputWriteError(path, err) => write!(
                f,
                "Failed to write output to file '{}': {}",
                path.display(),
                err
            ),
            Sol2FgError::StdoutWriteError(err) => {
                write!(f, "Failed to write output to stdout: {}", err)
            }
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    fngraph_logging::init_subscriber(cli.verbose);

    if get_language_for_file(&cli.file).is_none() {
        warn!(
            "{} has no .sol extension; parsing it as Solidity anyway",
            cli.file.display()
        );
    }

    let contract = cli
        .contract
        .clone()
        .unwrap_or_else(|| default_contract_name(&cli.file));
    let function = cli.function.clone().unwrap_or_default();
    let ignore = IgnoreSet::from_specs(&cli.ignore)?;
    let config = parse_config_params(cli.config.as_deref());

    let graph = build_graph(&cli.file, &contract, &function, cli.param_count, &ignore)?;
    info!(
        "Call graph from {} has {} nodes and {} edges",
        graph.entry,
        graph.node_count(),
        graph.edge_count()
    );

    let output_string = match cli.format {
        OutputFormat::Dot => graph.to_dot(&ignore, &dot_config(&config)),
        OutputFormat::Json => graph.to_json(&ignore, &json_config(&config)?),
    };

    match cli.output_file {
        Some(ref path) => {
            fs::write(path, &output_string)
                .map_err(|e| Sol2FgError::OutputWriteError(path.clone(), e))?;
            info!("Wrote {} output to {}", cli.format, path.display());
        }
        None => {
            let mut handle = stdout().lock();
            handle
                .write_all(output_string.as_bytes())
                .map_err(Sol2FgError::StdoutWriteError)?;
            handle.flush().map_err(Sol2FgError::StdoutWriteError)?;
        }
    }

    Ok(())
}

fn build_graph(
    file: &Path,
    contract: &str,
    function: &str,
    param_count: Option<usize>,
    ignore: &IgnoreSet,
) -> Result<CallGraph> {
    let sources = load_sources(file)?;
    info!("Loaded {} source file(s)", sources.len());
    let registry = ContractRegistry::from_sources(&sources)
        .context("Failed to build the contract model")?;
    let entry = select_entry(&registry, contract, function, param_count)?;
    Ok(CallGraphResolver::new(&registry, ignore).resolve(entry))
}

/// `Token.sol` and `Token.t.sol` both default to contract `Token`.
fn default_contract_name(file: &Path) -> String {
    file.file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| name.split('.').next())
        .unwrap_or_default()
        .to_string()
}

/// Parse configuration parameters from a string in the format "key=value,key2=value2"
fn parse_config_params(config_str: Option<&str>) -> HashMap<String, String> {
    let mut config = HashMap::new();

    if let Some(config_str) = config_str {
        for param in config_str.split(',') {
            if let Some((key, value)) = param.split_once('=') {
                let key = key.trim().to_string();
                let value = value.trim().to_string();
                if !key.is_empty() {
                    config.insert(key, value);
                }
            }
        }
    }

    config
}

fn dot_config(config: &HashMap<String, String>) -> DotExportConfig {
    let mut dot = DotExportConfig::default();
    for (key, value) in config {
        match key.as_str() {
            "graph_name" => dot.graph_name = value.clone(),
            "cluster_color" => dot.cluster_color = value.clone(),
            "edge_color" => dot.edge_color = value.clone(),
            "cross_context_edge_color" => dot.cross_context_edge_color = value.clone(),
            "pretty" | "metadata" => {}
            other => warn!("Ignoring unknown config key '{}'", other),
        }
    }
    dot
}

fn json_config(config: &HashMap<String, String>) -> Result<JsonExportConfig, Sol2FgError> {
    let mut json = JsonExportConfig::default();
    for (key, value) in config {
        match key.as_str() {
            "pretty" => json.pretty_print = parse_bool(key, value)?,
            "metadata" => json.include_metadata = parse_bool(key, value)?,
            "graph_name" | "cluster_color" | "edge_color" | "cross_context_edge_color" => {}
            other => warn!("Ignoring unknown config key '{}'", other),
        }
    }
    Ok(json)
}

fn parse_bool(key: &str, value: &str) -> Result<bool, Sol2FgError> {
    match value {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(Sol2FgError::InvalidConfigValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_contract_name() {
        assert_eq!(default_contract_name(Path::new("src/Token.sol")), "Token");
        assert_eq!(default_contract_name(Path::new("Token.t.sol")), "Token");
    }

    #[test]
    fn test_parse_config_params() {
        let config = parse_config_params(Some("edge_color=gray, pretty=false,=x,junk"));
        assert_eq!(config.len(), 2);
        assert_eq!(dot_config(&config).edge_color, "gray");
        assert!(!json_config(&config).unwrap().pretty_print);

        let bad = parse_config_params(Some("pretty=maybe"));
        assert!(json_config(&bad).is_err());
    }
}
