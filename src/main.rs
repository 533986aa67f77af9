mod app;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::Parser;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use geodash::config::MapConfig;
use geodash::data::{self, RegistryOpener};
use geodash::logging;
use geodash::map::{BaseLayer, MapSession};
use ratatui::DefaultTerminal;
use std::path::PathBuf;
use std::time::Duration;

/// Terminal map viewer
#[derive(Parser, Debug)]
#[command(name = "geodash", version, about)]
struct Args {
    /// INI configuration file; defaults apply if it does not exist
    #[arg(long, default_value = "geodash.ini")]
    config: PathBuf,

    /// Directory holding the base-layer datasets
    #[arg(long)]
    maps_dir: Option<PathBuf>,

    /// Base layer shown at startup (satellite, streetmap, terrain, topographic)
    #[arg(long)]
    layer: Option<BaseLayer>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = MapConfig::load_from(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    if let Some(dir) = args.maps_dir {
        config.maps_dir = dir;
    }
    if let Some(layer) = args.layer {
        config.initial = layer;
    }

    let _log_guard = logging::init_logging(&config.logging).context("setting up logging")?;
    tracing::info!(maps_dir = %config.maps_dir.display(), initial = %config.initial, "starting");

    data::initialize()?;

    let mut terminal = ratatui::init();
    terminal.clear()?;
    execute!(std::io::stdout(), EnableMouseCapture)?;

    let result = run(&mut terminal, &config);

    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    data::shutdown()?;
    tracing::info!("exiting");
    result
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    app.set_mouse_pos(mouse.column, mouse.row);

    if let MouseEventKind::Down(MouseButton::Left) = mouse.kind {
        if let Some(control) = app.click(mouse.column, mouse.row) {
            tracing::trace!(?control, "control pressed");
        }
    }
}

fn handle_key(app: &mut App, code: KeyCode) {
    if app.search_active() {
        match code {
            KeyCode::Enter => app.type_char('\r'),
            KeyCode::Backspace => app.type_char('\u{8}'),
            KeyCode::Char(c) => app.type_char(c),
            _ => {}
        }
        return;
    }
    if matches!(code, KeyCode::Char('q') | KeyCode::Esc) {
        app.quit();
    }
}

fn run(terminal: &mut DefaultTerminal, config: &MapConfig) -> Result<()> {
    let area = terminal.size()?;
    let size = app::viewport_pixels(area.width, area.height);
    let session = MapSession::new(config, Box::new(RegistryOpener), size.x, size.y);
    let mut app = App::new(session);
    app.session.load_current();

    loop {
        let mouse = app.mouse_pixel_pos();
        if let Some(set) = app.session.render() {
            terminal.draw(|frame| ui::render(frame, &set, mouse))?;
        }

        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(&mut app, key.code),
                Event::Mouse(mouse) => handle_mouse(&mut app, mouse),
                Event::Resize(width, height) => app.resize(width, height),
                _ => {}
            }
        }

        if app.done() {
            break;
        }
    }

    Ok(())
}
