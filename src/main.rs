//! statekit CLI
//!
//! Usage:
//!   statekit [OPTIONS] <COMMAND>
//!
//! Commands:
//!   strip        Remove the credit-text block from every SVG in a directory
//!   tag          Annotate district elements with their state name
//!   recolor      Restyle stroked elements in every SVG in a directory
//!   filter       Keep only each state's own district paths
//!   interactive  Add accessibility attributes to district elements
//!   states       Print the state code table

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use svg_statekit::config::Config;
use svg_statekit::states::{code_slug, STATE_CODES};
use svg_statekit::tools::{filter, interactive, recolor, strip, tag};
use svg_statekit::{BatchReport, Error, ParseMode, UnknownSlugPolicy};

#[derive(Parser, Debug)]
#[command(name = "statekit", version, about = "Batch tools for US state map SVGs")]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file (TOML format)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Remove the credit-text block from every SVG in a directory (in place)
    Strip(StripArgs),

    /// Annotate district elements with their state name
    Tag(TagArgs),

    /// Restyle stroked elements in every SVG in a directory (in place)
    Recolor(RecolorArgs),

    /// Keep only each state's own district paths, writing to a new directory
    Filter(FilterArgs),

    /// Add tabindex/role/aria-label to district elements (in place)
    Interactive(InteractiveArgs),

    /// Print the state code table
    States,
}

#[derive(Args, Debug)]
struct StripArgs {
    /// Directory of SVG files
    #[arg(long)]
    dir: Option<PathBuf>,

    /// id of the text element to remove
    #[arg(long)]
    marker_id: Option<String>,
}

#[derive(Args, Debug)]
struct TagArgs {
    /// Input SVG file
    input: PathBuf,

    /// Output SVG file
    output: PathBuf,

    /// Attribute receiving the state name
    #[arg(long)]
    attribute: Option<String>,

    #[arg(long, value_enum)]
    parse_mode: Option<ParseMode>,

    /// Ids listed per category in the summary
    #[arg(long)]
    report_limit: Option<usize>,
}

#[derive(Args, Debug)]
struct RecolorArgs {
    /// Directory of SVG files
    #[arg(long)]
    dir: Option<PathBuf>,

    /// Stroke color
    #[arg(long)]
    stroke: Option<String>,

    /// Stroke width
    #[arg(long)]
    stroke_width: Option<String>,

    #[arg(long, value_enum)]
    parse_mode: Option<ParseMode>,
}

#[derive(Args, Debug)]
struct FilterArgs {
    /// Directory of state SVGs named by slug (e.g. texas.svg)
    #[arg(long)]
    input_dir: Option<PathBuf>,

    /// Directory receiving the filtered SVGs
    #[arg(long)]
    output_dir: Option<PathBuf>,

    #[arg(long, value_enum)]
    parse_mode: Option<ParseMode>,

    /// What to do with files not named after a state
    #[arg(long, value_enum)]
    on_unknown_slug: Option<UnknownSlugPolicy>,
}

#[derive(Args, Debug)]
struct InteractiveArgs {
    /// Directory of state SVGs named by slug (e.g. texas.svg)
    #[arg(long)]
    dir: Option<PathBuf>,

    #[arg(long, value_enum)]
    parse_mode: Option<ParseMode>,

    /// What to do with files not named after a state
    #[arg(long, value_enum)]
    on_unknown_slug: Option<UnknownSlugPolicy>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let env_filter = match cli.verbose {
        0 => EnvFilter::new("info"),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(report) = e.report() {
                eprintln!("{}", report);
            }
            tracing::error!("{e}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> Result<(), Error> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    apply_overrides(&mut config, &cli.command);
    config.validate()?;

    match cli.command {
        Commands::Strip(_) => {
            let report = strip::strip_dir(&config.strip)?;
            log_batch("strip", &report);
        }
        Commands::Tag(args) => {
            let (doc, report) = tag::tag_input(&args.input, &config.tag)?;
            println!("{}", report.summary(config.tag.report_limit));
            tag::save_tagged(&args.output, &doc)?;
        }
        Commands::Recolor(_) => {
            let report = recolor::recolor_dir(&config.recolor)?;
            log_batch("recolor", &report);
        }
        Commands::Filter(_) => {
            let report = filter::filter_dir(&config.filter)?;
            log_batch("filter", &report);
        }
        Commands::Interactive(_) => {
            let report = interactive::annotate_dir(&config.interactive)?;
            log_batch("interactive", &report);
        }
        Commands::States => print_states(),
    }
    Ok(())
}

/// Command-line flags take precedence over the config file
fn apply_overrides(config: &mut Config, command: &Commands) {
    match command {
        Commands::Strip(args) => {
            override_with(&mut config.strip.dir, &args.dir);
            override_with(&mut config.strip.marker_id, &args.marker_id);
        }
        Commands::Tag(args) => {
            override_with(&mut config.tag.attribute, &args.attribute);
            override_with(&mut config.tag.parse_mode, &args.parse_mode);
            override_with(&mut config.tag.report_limit, &args.report_limit);
        }
        Commands::Recolor(args) => {
            override_with(&mut config.recolor.dir, &args.dir);
            override_with(&mut config.recolor.stroke, &args.stroke);
            override_with(&mut config.recolor.stroke_width, &args.stroke_width);
            override_with(&mut config.recolor.parse_mode, &args.parse_mode);
        }
        Commands::Filter(args) => {
            override_with(&mut config.filter.input_dir, &args.input_dir);
            override_with(&mut config.filter.output_dir, &args.output_dir);
            override_with(&mut config.filter.parse_mode, &args.parse_mode);
            override_with(&mut config.filter.on_unknown_slug, &args.on_unknown_slug);
        }
        Commands::Interactive(args) => {
            override_with(&mut config.interactive.dir, &args.dir);
            override_with(&mut config.interactive.parse_mode, &args.parse_mode);
            override_with(&mut config.interactive.on_unknown_slug, &args.on_unknown_slug);
        }
        Commands::States => {}
    }
}

fn override_with<T: Clone>(target: &mut T, value: &Option<T>) {
    if let Some(value) = value {
        *target = value.clone();
    }
}

fn log_batch(tool: &str, report: &BatchReport) {
    tracing::info!(
        "{}: {} file(s) processed, {} skipped",
        tool,
        report.processed.len(),
        report.skipped.len()
    );
}

fn print_states() {
    for (code, name) in STATE_CODES {
        match code_slug(code) {
            Some(slug) => println!("{}  {:<26} {}", code, name, slug),
            None => println!("{}  {}", code, name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parse_tag_positional_args() {
        let cli = Cli::try_parse_from(["statekit", "tag", "in.svg", "out.svg"]).unwrap();
        if let Commands::Tag(args) = cli.command {
            assert_eq!(args.input, PathBuf::from("in.svg"));
            assert_eq!(args.output, PathBuf::from("out.svg"));
            assert!(args.parse_mode.is_none());
        } else {
            panic!("expected tag command");
        }
    }

    #[test]
    fn cli_parse_tag_requires_both_paths() {
        assert!(Cli::try_parse_from(["statekit", "tag", "in.svg"]).is_err());
        assert!(Cli::try_parse_from(["statekit", "tag"]).is_err());
    }

    #[test]
    fn cli_parse_filter_options() {
        let cli = Cli::try_parse_from([
            "statekit",
            "filter",
            "--input-dir",
            "maps",
            "--output-dir",
            "out",
            "--parse-mode",
            "lenient",
            "--on-unknown-slug",
            "skip",
        ])
        .unwrap();
        let mut config = Config::default();
        apply_overrides(&mut config, &cli.command);
        assert_eq!(config.filter.input_dir, PathBuf::from("maps"));
        assert_eq!(config.filter.output_dir, PathBuf::from("out"));
        assert_eq!(config.filter.parse_mode, ParseMode::Lenient);
        assert_eq!(config.filter.on_unknown_slug, UnknownSlugPolicy::Skip);
    }

    #[test]
    fn cli_parse_recolor_overrides_only_given_fields() {
        let cli = Cli::try_parse_from(["statekit", "recolor", "--stroke", "#000"]).unwrap();
        let mut config = Config::default();
        apply_overrides(&mut config, &cli.command);
        assert_eq!(config.recolor.stroke, "#000");
        assert_eq!(config.recolor.stroke_width, "0.3");
        assert_eq!(config.recolor.dir, PathBuf::from("states"));
    }

    #[test]
    fn cli_parse_verbose_and_config() {
        let cli =
            Cli::try_parse_from(["statekit", "-vv", "--config", "kit.toml", "states"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config, Some(PathBuf::from("kit.toml")));
        assert!(matches!(cli.command, Commands::States));
    }

    #[test]
    fn cli_parse_rejects_unknown_parse_mode() {
        let result = Cli::try_parse_from(["statekit", "recolor", "--parse-mode", "sloppy"]);
        assert!(result.is_err());
    }

    #[test]
    fn cli_parse_no_subcommand_errors() {
        assert!(Cli::try_parse_from(["statekit"]).is_err());
    }
}
