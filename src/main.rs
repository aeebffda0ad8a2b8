use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use compose_graph::details::summary_lines;
use compose_graph::export::{OutputFormat, svg_to_pdf, svg_to_png, write_output};
use compose_graph::fonts::{ApproxMeasure, CosmicTextMeasure};
use compose_graph::render::{DiagramStyle, JsonSurface, RenderAdapter, SvgOptions, SvgSurface};
use compose_graph::selection::{Selection, SelectionReceiver, selection_channel};
use compose_graph::theme::Theme;
use compose_graph::{
    ConfigModel, Error, Graph, GridSpacing, LayoutParams, Result, load_compose, parse_compose,
    recompute,
};

/// Docker-compose service graphs as SVG, PNG, PDF or JSON
#[derive(Parser, Debug)]
#[command(name = "compose-graph", version)]
#[command(about = "Render docker-compose service dependencies on a grouped grid", long_about = None)]
#[command(args_conflicts_with_subcommands = true, subcommand_negates_reqs = true)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Input compose file (use "-" for stdin)
    #[arg(value_name = "INPUT", required = true)]
    input: Option<PathBuf>,

    /// Output file path (extension determines format: .svg, .png, .pdf or .json)
    #[arg(short, long, value_name = "OUTPUT", required = true)]
    output: Option<PathBuf>,

    /// Alacritty theme file (YAML or TOML), native theme TOML, or built-in theme name
    #[arg(short, long, value_name = "THEME")]
    theme: Option<String>,

    /// Layout settings file (TOML or YAML)
    #[arg(long, value_name = "FILE")]
    layout: Option<PathBuf>,

    /// Number of groups per row of the outer grid
    #[arg(long, value_name = "N")]
    groups_per_row: Option<usize>,

    /// Size every group cell by the largest group instead of the running maximum
    #[arg(long)]
    uniform: bool,

    /// Highlight a service and print its details to stdout
    #[arg(long, value_name = "NAME")]
    select: Option<String>,

    /// Raster scale multiplier for PNG output (e.g. 2.0 for sharper output)
    #[arg(long, default_value_t = 1.0)]
    png_scale: f32,

    /// Blank margin around the drawing
    #[arg(long, default_value_t = 20.0, value_parser = non_negative)]
    padding: f32,

    /// Omit the color legend
    #[arg(long)]
    no_legend: bool,

    /// Measure labels with a fixed glyph advance instead of system fonts
    #[arg(long)]
    approx_text: bool,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Some(Command::Completions { shell }) = args.command {
        clap_complete::generate(shell, &mut Args::command(), "compose-graph", &mut io::stdout());
        return ExitCode::SUCCESS;
    }

    init_logging(args.verbose, args.quiet);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn non_negative(value: &str) -> std::result::Result<f32, String> {
    let parsed: f32 = value
        .parse()
        .map_err(|e| format!("invalid number '{value}': {e}"))?;
    if !parsed.is_finite() || parsed < 0.0 {
        return Err(format!("must be a finite, non-negative number, got {value}"));
    }
    Ok(parsed)
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(args: &Args) -> Result<()> {
    let (Some(input), Some(output)) = (args.input.as_deref(), args.output.as_deref()) else {
        return Err(Error::Compose("an input file and --output are required".to_string()));
    };

    let format = OutputFormat::from_path(output)?;
    let config = read_config(input)?;
    let params = layout_params(args)?;
    let theme = match &args.theme {
        Some(theme_arg) => Theme::load(theme_arg)?,
        None => Theme::default(),
    };

    let graph = recompute(&config, &params);
    info!(
        services = graph.nodes.len(),
        edges = graph.edges.len(),
        groups = graph.groups.len(),
        "laid out"
    );

    let (tx, rx) = selection_channel();
    let data = match format {
        OutputFormat::Json => {
            let mut surface = JsonSurface::new(false).with_events(tx);
            draw(&mut surface, &graph, &config, args.select.as_deref(), &rx)?.into_bytes()
        }
        _ => {
            let style = DiagramStyle::from_theme(&theme);
            let mut options = SvgOptions::from_params(&params);
            options.padding = args.padding;
            options.show_legend = !args.no_legend;

            let svg = if args.approx_text {
                let mut surface =
                    SvgSurface::new(ApproxMeasure::default(), style, options).with_events(tx);
                draw(&mut surface, &graph, &config, args.select.as_deref(), &rx)?
            } else {
                let mut surface =
                    SvgSurface::new(CosmicTextMeasure::new(), style, options).with_events(tx);
                draw(&mut surface, &graph, &config, args.select.as_deref(), &rx)?
            };
            convert(format, svg, args.png_scale)?
        }
    };

    write_output(output, &data)?;
    info!("{:?} saved to: {}", format, output.display());

    Ok(())
}

fn read_config(input: &Path) -> Result<ConfigModel> {
    if input.to_str() == Some("-") {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| Error::io("<stdin>", e))?;
        parse_compose(&buffer)
    } else {
        load_compose(input)
    }
}

fn layout_params(args: &Args) -> Result<LayoutParams> {
    let mut params = match &args.layout {
        Some(path) => LayoutParams::load(path)?,
        None => LayoutParams::default(),
    };
    if let Some(n) = args.groups_per_row {
        params.groups_per_row = n;
    }
    if args.uniform {
        params.spacing = GridSpacing::Uniform;
    }
    params.validate()
}

/// Render once, then again with the picked service if `select` names one.
fn draw<R: RenderAdapter<Output = String>>(
    surface: &mut R,
    graph: &Graph,
    config: &ConfigModel,
    select: Option<&str>,
    events: &SelectionReceiver,
) -> Result<String> {
    let first = surface.render(graph, None)?;
    let Some(id) = select else {
        return Ok(first);
    };

    surface.select(id)?;
    let mut selection = Selection::default();
    let mut picked = None;
    for event in events.drain() {
        picked = selection.apply(event, config);
    }

    if let Some(service) = picked {
        for line in summary_lines(service) {
            println!("{line}");
        }
    }
    surface.render(graph, picked)
}

fn convert(format: OutputFormat, svg: String, png_scale: f32) -> Result<Vec<u8>> {
    match format {
        OutputFormat::Svg => Ok(svg.into_bytes()),
        OutputFormat::Png => svg_to_png(&svg, png_scale),
        OutputFormat::Pdf => svg_to_pdf(&svg),
        OutputFormat::Json => Err(Error::UnsupportedFormat("json".to_string())),
    }
}
