//! Student Hub - courses, assignments and grades in the terminal
//!
//! With no subcommand, opens a terminal dashboard over the LMS. Subcommands
//! run one task (grades, summaries, videos, mail, homework documents) and
//! print the result.

use std::io;
use std::panic;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, Utc};
use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};

use studenthub::aggregator::Aggregator;
use studenthub::app::{App, AppState};
use studenthub::cache::ResponseCache;
use studenthub::cli::{Cli, StartupConfig};
use studenthub::config::Config;
use studenthub::data::LmsClient;
use studenthub::logging::{self, LogTarget};
use studenthub::{commands, ui};

/// Sets up a panic hook that restores the terminal before printing the panic message.
/// This ensures the terminal is usable even if the application panics.
fn setup_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        // Attempt to restore the terminal
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        // Call the original panic hook
        original_hook(panic_info);
    }));
}

/// Renders the UI based on the current application state
fn render_ui(frame: &mut ratatui::Frame, app: &App) {
    match app.state {
        AppState::Loading => render_loading(frame),
        AppState::Dashboard => ui::render_dashboard(frame, app),
        AppState::Assignments => ui::render_assignments(frame, app),
        AppState::Grades => ui::render_grades(frame, app),
    }

    if app.show_help {
        ui::render_help_overlay(frame, app);
    }
}

/// Renders a loading message while data is being fetched
fn render_loading(frame: &mut ratatui::Frame) {
    use ratatui::{
        layout::{Alignment, Constraint, Direction, Layout},
        style::{Color, Style},
        widgets::Paragraph,
    };

    let area = frame.area();

    // Center the loading message vertically
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(45),
            Constraint::Length(3),
            Constraint::Percentage(45),
        ])
        .split(area);

    let loading_text = Paragraph::new("Loading courses and assignments...")
        .style(Style::default().fg(Color::Cyan))
        .alignment(Alignment::Center);

    frame.render_widget(loading_text, chunks[1]);
}

/// Runs the dashboard until the user quits
async fn run_dashboard(
    aggregator: &Aggregator<LmsClient>,
    startup: StartupConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    // Set up panic hook to restore terminal on crash
    setup_panic_hook();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::with_startup_config(startup);

    // Initial render to show loading state
    terminal.draw(|f| render_ui(f, &app))?;

    // Trigger initial data load
    app.load_all_data(aggregator, Local::now().date_naive()).await;

    // Main event loop
    loop {
        // Render UI
        terminal.draw(|f| render_ui(f, &app))?;

        // Poll for keyboard events with 100ms timeout
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key);
            }
        }

        if app.refresh_requested.is_some() {
            app.apply_refresh(aggregator, Local::now().date_naive()).await;
        }

        // Check if we should quit
        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let startup = match StartupConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    // The dashboard owns the terminal, so it logs to a file
    let target = if cli.command.is_some() {
        LogTarget::Stderr
    } else {
        logging::dashboard_target()
    };
    if let Err(e) = logging::init(config.log_level, &target) {
        eprintln!("Warning: logging disabled: {}", e);
    }

    let lms = LmsClient::new(&config.canvas_url, &config.canvas_token);
    let cache = Arc::new(ResponseCache::new(config.cache_ttl));
    let aggregator = Aggregator::new(lms, cache);
    info!(lms = %config.canvas_url, ttl_secs = config.cache_ttl.as_secs(), "Starting");

    match cli.command {
        Some(command) => match commands::run(command, &config, &aggregator, Utc::now()).await {
            Ok(output) => println!("{}", output),
            Err(e) => {
                warn!(error = %e, "Command failed");
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
        None => run_dashboard(&aggregator, startup).await?,
    }

    Ok(())
}
