mod animation;
mod camera;
mod clock;
mod controls;
mod error;
mod geometry;
mod graphics;
mod math;
mod panel;
mod renderer;
mod scene;
mod state;
mod terminal;
mod texture;
mod vertex;
mod viewport;

use clap::Parser;
use crossterm::event;
use log::{error, info};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use error::AppError;
use state::{AppContext, Flow};
use terminal::{Presenter, TerminalGuard};
use viewport::Sizes;

/// Bouncing ball on a textured court, drawn in the terminal
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Directory the textures are loaded from
    #[arg(long, default_value = "static")]
    root: PathBuf,

    /// Target frames per second
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u32).range(1..=240))]
    fps: u32,

    /// Supersampling factor, clamped to 2
    #[arg(long, default_value_t = 2.0)]
    pixel_ratio: f64,

    /// Write log output to this file (logging is off otherwise)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

/// Logs go to a file when one is given. Writing them to the terminal would tear the frame.
fn init_logger(log_file: Option<&Path>) -> Result<(), AppError> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    match log_file {
        Some(path) => {
            let file = File::create(path).map_err(|source| AppError::LogFile {
                path: path.to_path_buf(),
                source,
            })?;
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        None => {
            builder.filter_level(log::LevelFilter::Off);
        }
    }
    builder.init();
    Ok(())
}

fn run(cli: &Cli) -> Result<(), AppError> {
    let _guard = TerminalGuard::enter()?;
    let size = termsize::get().ok_or(AppError::UnknownTerminalSize)?;
    let sizes = Sizes::from_terminal(size.cols, size.rows);

    let mut ctx = AppContext::new(&cli.root, sizes, cli.pixel_ratio);
    let mut presenter = Presenter::new(BufWriter::new(io::stdout()));

    let frame_time = Duration::from_secs_f64(1.0 / cli.fps as f64);
    let mut next_frame = Instant::now();

    info!("started at {} fps", cli.fps);
    loop {
        // Handle input until the next frame is due
        while event::poll(next_frame.saturating_duration_since(Instant::now()))? {
            if ctx.handle_event(event::read()?) == Flow::Quit {
                let stats = ctx.renderer.info();
                info!(
                    "stopped after {} frames, {} triangles in the last one",
                    stats.frame, stats.triangles
                );
                return Ok(());
            }
        }

        next_frame += frame_time;
        let now = Instant::now();
        if next_frame < now {
            next_frame = now;
        }

        ctx.tick();

        let (width, height) = ctx.renderer.output_size();
        let image = ctx.renderer.resolve();
        if ctx.panel.visible {
            let layout = ctx.panel_layout();
            let lines = ctx.panel.lines(&ctx.scene, ctx.frames.fps());
            presenter.present(&image, width, height, Some((&layout, lines.as_slice())))?;
        } else {
            presenter.present(&image, width, height, None)?;
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = init_logger(cli.log_file.as_deref()) {
        eprintln!("error: {err}");
        return ExitCode::FAILURE;
    }

    // The guard inside `run` has restored the terminal by the time we print
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
