//! Command-line interface for the screenplay parser
//!
//! Usage:
//!   screenplay parse `<path>` [-o `<out.json>`]   - Write the project breakdown as JSON
//!   screenplay tokens `<path>`                  - Print the cleaned token stream
//!   screenplay rules                          - Print the selected rule graph
//!   screenplay compare `<left>` `<right>`         - Report the differences between two breakdowns
//!
//! Every command exits with status 1 and prints the error to stderr on failure,
//! so that host applications can run it as a subprocess and read the JSON file.

use clap::builder::PossibleValuesParser;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use screenplay::{Loader, ParserConfig, ProjectDiscrepancies, RuleGraph, ScreenplayParser};
use std::error::Error;
use std::fs;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

type CliResult = Result<(), Box<dyn Error>>;

fn main() {
    let matches = build_cli().get_matches();

    init_logging(matches.get_flag("verbose"));

    let result = match matches.subcommand() {
        Some(("parse", sub)) => handle_parse_command(sub),
        Some(("tokens", sub)) => handle_tokens_command(sub),
        Some(("rules", sub)) => handle_rules_command(sub),
        Some(("compare", sub)) => handle_compare_command(sub),
        _ => Err("unknown command".into()),
    };

    if let Err(err) = result {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

fn build_cli() -> Command {
    Command::new("screenplay")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Break plain-text screenplays down into sequences and assets")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Log debug information to stderr")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(
            Command::new("parse")
                .about("Parse a screenplay and write its project breakdown as JSON")
                .arg(path_arg("path", "Path to the screenplay text file", 1))
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .help("Write the JSON to this file instead of stdout")
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(keep_undefined_assets_arg())
                .args(parser_args()),
        )
        .subcommand(
            Command::new("tokens")
                .about("Print the cleaned token stream of a screenplay")
                .arg(path_arg("path", "Path to the screenplay text file", 1))
                .args(parser_args()),
        )
        .subcommand(
            Command::new("rules")
                .about("Print the token rule graph")
                .arg(rules_arg())
                .arg(rules_file_arg())
                .arg(config_arg()),
        )
        .subcommand(
            Command::new("compare")
                .about("Report the differences between the breakdowns of two screenplays")
                .arg(path_arg("left", "Path to the left screenplay", 1))
                .arg(path_arg("right", "Path to the right screenplay", 2))
                .arg(keep_undefined_assets_arg())
                .args(parser_args()),
        )
}

fn path_arg(id: &'static str, help: &'static str, index: usize) -> Arg {
    Arg::new(id)
        .help(help)
        .required(true)
        .index(index)
        .value_parser(value_parser!(PathBuf))
}

fn parser_args() -> Vec<Arg> {
    vec![
        rules_arg(),
        rules_file_arg(),
        Arg::new("multiple-characters")
            .long("multiple-characters")
            .help("How to store a cue naming several characters")
            .value_parser(PossibleValuesParser::new(["keep_first_character", "keep_all"])),
        config_arg(),
    ]
}

fn rules_arg() -> Arg {
    Arg::new("rules")
        .long("rules")
        .help("Built-in token rules")
        .value_parser(PossibleValuesParser::new(["default", "blank_line_not_delimiter"]))
}

fn rules_file_arg() -> Arg {
    Arg::new("rules-file")
        .long("rules-file")
        .help("Custom token rules file, takes precedence over --rules")
        .value_parser(value_parser!(PathBuf))
}

fn config_arg() -> Arg {
    Arg::new("config")
        .long("config")
        .short('c')
        .help("TOML configuration file layered over the defaults")
        .value_parser(value_parser!(PathBuf))
}

fn keep_undefined_assets_arg() -> Arg {
    Arg::new("keep-undefined-assets")
        .long("keep-undefined-assets")
        .help("Keep uppercase names never introduced by a cue, as undefined assets")
        .action(ArgAction::SetTrue)
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Could not set up logging: {}", err);
    }
}

/// Layer the config file and the command-line flags over the defaults.
///
/// Subcommands only define some of the flags, hence `try_get_*`.
fn load_config(matches: &ArgMatches) -> Result<ParserConfig, Box<dyn Error>> {
    let mut loader = Loader::new();
    if let Some(path) = matches.try_get_one::<PathBuf>("config").ok().flatten() {
        loader = loader.with_file(path);
    }
    if let Some(rules) = matches.try_get_one::<String>("rules").ok().flatten() {
        loader = loader.set_override("rules", rules.as_str())?;
    }
    if let Some(path) = matches.try_get_one::<PathBuf>("rules-file").ok().flatten() {
        loader = loader.set_override("rules_file", path.to_string_lossy().into_owned())?;
    }
    if let Some(policy) = matches
        .try_get_one::<String>("multiple-characters")
        .ok()
        .flatten()
    {
        loader = loader.set_override("multiple_characters", policy.as_str())?;
    }
    if matches
        .try_get_one::<bool>("keep-undefined-assets")
        .ok()
        .flatten()
        .copied()
        .unwrap_or(false)
    {
        loader = loader.set_override("keep_undefined_assets", true)?;
    }
    Ok(loader.build()?)
}

fn required_path<'a>(matches: &'a ArgMatches, id: &str) -> Result<&'a PathBuf, Box<dyn Error>> {
    matches
        .get_one::<PathBuf>(id)
        .ok_or_else(|| format!("missing <{}> argument", id).into())
}

fn handle_parse_command(matches: &ArgMatches) -> CliResult {
    let config = load_config(matches)?;
    let parser = ScreenplayParser::new(required_path(matches, "path")?, config)?;
    let json = parser.configured_json()?;

    match matches.get_one::<PathBuf>("output") {
        Some(output) => fs::write(output, json)
            .map_err(|err| format!("could not write {}: {}", output.display(), err))?,
        None => println!("{}", json),
    }
    Ok(())
}

fn handle_tokens_command(matches: &ArgMatches) -> CliResult {
    let config = load_config(matches)?;
    let parser = ScreenplayParser::new(required_path(matches, "path")?, config)?;
    for token in parser.tokens()? {
        println!("{}", token);
    }
    Ok(())
}

fn handle_rules_command(matches: &ArgMatches) -> CliResult {
    let config = load_config(matches)?;
    let graph = match &config.rules_file {
        Some(path) => RuleGraph::from_file(path)?,
        None => RuleGraph::builtin(config.rules)?,
    };
    print!("{}", graph);
    Ok(())
}

fn handle_compare_command(matches: &ArgMatches) -> CliResult {
    let config = load_config(matches)?;
    let left = ScreenplayParser::new(required_path(matches, "left")?, config.clone())?
        .configured_project()?;
    let right = ScreenplayParser::new(required_path(matches, "right")?, config)?
        .configured_project()?;

    let discrepancies = ProjectDiscrepancies::analyze(&left, &right);
    if discrepancies.is_empty() {
        println!("No discrepancies between {} and {}", left, right);
    } else {
        print!("{}", discrepancies.report());
    }
    Ok(())
}
