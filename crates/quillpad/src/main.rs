use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::LevelFilter;
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{env, io, time::Duration};

use quillpad::app::App;
use quillpad::ui;

#[tokio::main]
async fn main() -> Result<()> {
    // Default to info, with crate-level debug for development
    let mut logger = env_logger::Builder::from_default_env();
    if std::env::var_os("RUST_LOG").is_none() {
        logger.filter_level(LevelFilter::Info);
        logger.filter_module("quillpad", LevelFilter::Debug);
    }
    logger.init();

    // Restore the terminal even when we panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_terminal();
        original_hook(panic_info);
    }));

    if let Err(e) = enable_raw_mode() {
        eprintln!("Failed to initialize the terminal: {}", e);
        return Err(e.into());
    }
    let mut stdout = io::stdout();
    if let Err(e) = execute!(stdout, EnterAlternateScreen, EnableMouseCapture) {
        let _ = disable_raw_mode();
        eprintln!("Failed to configure the terminal: {}", e);
        return Err(e.into());
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = match App::new().await {
        Ok(app) => {
            log::info!("Application initialized successfully");
            app
        }
        Err(e) => {
            restore_terminal()?;
            eprintln!("Failed to initialize the application: {}", e);
            if let Some(source) = e.source() {
                eprintln!("Caused by: {}", source);
            }
            return Err(e);
        }
    };

    // Load a file given on the command line
    let args: Vec<String> = env::args().collect();
    if args.len() > 1 {
        let file_path = std::path::PathBuf::from(&args[1]);
        match app.files.open_file(file_path.clone()).await {
            Ok(content) => {
                app.session.load(content);
                app.config.add_recent(file_path);
                if let Err(e) = app.config.save().await {
                    log::warn!("Failed to persist recent file list: {}", e);
                }
                app.ui.set_info_message(format!("Loaded {}", args[1]));
                log::info!("Loaded file from command line: {}", args[1]);
            }
            Err(e) => {
                app.ui
                    .set_error_message(format!("Could not load '{}': {}", args[1], e));
                log::error!("Failed to load file '{}': {}", args[1], e);
            }
        }
    } else {
        log::info!("No file specified, starting with an empty note");
    }

    let res = run_app(&mut terminal, app).await;

    restore_terminal()?;

    if let Err(err) = res {
        eprintln!("The application hit an error: {}", err);
        if let Some(source) = err.source() {
            eprintln!("Caused by: {}", source);
        }
        log::error!("Application error: {}", err);

        if err.to_string().contains("terminal") {
            eprintln!("Hint: check whether the terminal supports raw mode");
        } else if err.to_string().contains("permission") {
            eprintln!("Hint: check file access permissions");
        }
    }

    Ok(())
}

async fn run_app<B: Backend>(terminal: &mut Terminal<B>, mut app: App) -> Result<()> {
    loop {
        if let Err(e) = terminal.draw(|f| ui::draw(f, &mut app)) {
            log::error!("Terminal draw error: {}", e);
            // Keep running; the next frame usually recovers
        }

        app.update_status();

        if app.should_quit() {
            log::info!("Application shutdown requested");
            break;
        }

        if event::poll(Duration::from_millis(100))? {
            match event::read()? {
                Event::Key(key) => {
                    if let Err(e) = app.handle_key_event(key).await {
                        log::error!("Key event handling error: {}", e);
                        app.ui
                            .set_error_message(format!("Key handling error: {}", e));
                    }
                }
                Event::Resize(_, _) => {
                    // Picked up by the next draw
                }
                Event::Mouse(_) => {}
                _ => {}
            }
        }
    }

    log::info!("Application loop ended");
    Ok(())
}

/// Restore the terminal to its normal state.
fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen, DisableMouseCapture)?;
    let _ = execute!(stdout, crossterm::cursor::Show);
    Ok(())
}
