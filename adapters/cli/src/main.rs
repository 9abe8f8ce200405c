#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that launches the WFLOP layout editor.

mod app;
mod config;
mod layout_transfer;

use std::{fs, path::PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use log::{error, info};
use wflop_editor_core::{grid::Viewport, Command, Event, Layout, Problem};
use wflop_editor_evaluation::{EvaluationDispatcher, HttpEvaluator};
use wflop_editor_rendering::{palette, svg::render_svg, Presentation, RenderingBackend};
use wflop_editor_rendering_macroquad::MacroquadBackend;
use wflop_editor_world::EditSession;

use crate::{
    app::EditorApp,
    config::{parse_viewport, EditorConfig},
    layout_transfer::LayoutShare,
};

const WINDOW_TITLE: &str = "WFLOP Layout Editor";

#[derive(Debug, Parser)]
#[command(name = "wflop-editor", version, about = "Edit wind farm turbine layouts")]
struct CliArgs {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Subcommand)]
enum Mode {
    /// Opens the interactive editor window.
    Edit(EditArgs),
    /// Writes the scene of a layout to an SVG file.
    Render(RenderArgs),
}

/// Options shared by every mode.
#[derive(Debug, Args)]
struct SessionArgs {
    /// TOML configuration file.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Share string of the layout to start from.
    #[arg(long, value_name = "SHARE", conflicts_with = "empty")]
    layout: Option<String>,
    /// Starts from an empty layout instead of asking the solver.
    #[arg(long)]
    empty: bool,
    /// Overrides the configured viewport.
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_viewport)]
    viewport: Option<Viewport>,
}

#[derive(Debug, Args)]
struct EditArgs {
    #[command(flatten)]
    session: SessionArgs,
    /// Renders as fast as possible instead of waiting for the display refresh.
    #[arg(long)]
    no_vsync: bool,
    /// Logs the frame rate once per second.
    #[arg(long)]
    show_fps: bool,
}

#[derive(Debug, Args)]
struct RenderArgs {
    #[command(flatten)]
    session: SessionArgs,
    /// Destination SVG file.
    #[arg(long, short, value_name = "PATH")]
    output: PathBuf,
    /// Zero-based wind profile used for the wakes.
    #[arg(long, value_name = "INDEX")]
    wind: Option<usize>,
}

/// Entry point for the WFLOP layout editor command-line interface.
fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = CliArgs::parse();
    match cli.mode {
        Mode::Edit(args) => edit(args),
        Mode::Render(args) => render(args),
    }
}

/// Loads the configuration, seeds the session and starts the evaluation runtime.
fn start(args: &SessionArgs) -> Result<(EditorApp, EvaluationDispatcher<HttpEvaluator>)> {
    let config = EditorConfig::load(args.config.as_deref())?;
    let viewport = args.viewport.unwrap_or_else(|| config.viewport());
    let evaluator = HttpEvaluator::new(&config.server_settings())
        .context("failed to create evaluation client")?;
    let dispatcher =
        EvaluationDispatcher::new(evaluator).context("failed to start evaluation runtime")?;

    let problem = config.problem;
    problem.validate().context("configured problem is invalid")?;
    let layout = initial_layout(args, &problem, &dispatcher)?;
    let session = EditSession::new(problem, layout).context("failed to start edit session")?;
    let app = EditorApp::new(session, viewport)?;
    info!(
        "canvas is {0}x{0}px for a {1}x{1} grid",
        app.canvas().canvas_size(),
        app.canvas().dimension()
    );

    Ok((app, dispatcher))
}

fn initial_layout(
    args: &SessionArgs,
    problem: &Problem,
    dispatcher: &EvaluationDispatcher<HttpEvaluator>,
) -> Result<Layout> {
    if let Some(share) = &args.layout {
        let layout = LayoutShare::decode(share)
            .and_then(|share| share.into_layout(problem))
            .context("failed to load shared layout")?;
        return Ok(layout);
    }
    if args.empty {
        return Ok(Layout::empty(problem.dimension));
    }

    info!(
        "requesting initial layout from {}",
        dispatcher.evaluator().base_url()
    );
    let response = dispatcher
        .solve_blocking(problem.clone())
        .context("initial solve failed")?;
    response
        .into_layout(problem.dimension)
        .context("solver returned an invalid layout")
}

fn edit(args: EditArgs) -> Result<()> {
    let (mut app, dispatcher) = start(&args.session)?;
    let presentation = Presentation::new(WINDOW_TITLE, palette::BACKGROUND, app.scene()?);
    let backend = MacroquadBackend::new()
        .with_vsync(!args.no_vsync)
        .with_show_fps(args.show_fps);

    backend.run(presentation, move |input, scene| {
        let completions: Vec<Command> = std::iter::from_fn(|| dispatcher.try_next()).collect();
        let events = app.frame(input, completions);
        let _ = dispatcher.forward(&events);

        if events
            .iter()
            .any(|event| matches!(event, Event::LayoutCommitted { .. }))
        {
            match app.share_string() {
                Ok(share) => info!("share this layout with --layout {share}"),
                Err(error) => error!("failed to encode layout: {error}"),
            }
        }

        match app.scene() {
            Ok(next) => *scene = next,
            Err(error) => error!("{error:#}"),
        }
    })
}

fn render(args: RenderArgs) -> Result<()> {
    let (mut app, _dispatcher) = start(&args.session)?;
    if let Some(index) = args.wind {
        let events = app.apply(Command::SelectWindProfile { index });
        if let Some(Event::WindSelectionRejected { available, .. }) = events.first() {
            bail!("wind profile {index} does not exist; the problem has {available}");
        }
    }

    let scene = app.scene()?;
    fs::write(&args.output, render_svg(&scene))
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    info!(
        "wrote {} turbines to {}",
        scene.turbines.len(),
        args.output.display()
    );
    info!("share this layout with --layout {}", app.share_string()?);

    Ok(())
}
