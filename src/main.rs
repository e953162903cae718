use csvex::bridge::{CsvEngine, PythonRunner};
use csvex::cli::{AppConfig, Args};
use csvex::config::{default_log_path, StorePaths, UserConfig};
use csvex::notes::NoteBook;
use csvex::picker::NativeFolderPicker;
use csvex::store::JsonFileStore;
use csvex::{App, AppState, Collaborators, FsDirectoryReader};

use crossterm::{
    event::{DisableBracketedPaste, EnableBracketedPaste},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Arc;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Parse command line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Convert to config
    let config: AppConfig = args.into();

    if let Err(e) = init_logging(&config) {
        eprintln!("Warning: Failed to set up logging: {}", e);
    }

    if let Err(e) = run_app_with_config(&config).await {
        log::error!("Exited with error: {}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Sends log records to a file so they never draw over the TUI
fn init_logging(config: &AppConfig) -> io::Result<()> {
    let path = match config.log_file.clone().or_else(default_log_path) {
        Some(path) => path,
        None => return Ok(()),
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    // RUST_LOG, when set, overrides the -v level
    env_logger::Builder::new()
        .filter_level(config.log_level())
        .parse_default_env()
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

/// Runs the TUI application with configuration
async fn run_app_with_config(config: &AppConfig) -> csvex::Result<()> {
    // Load user configuration
    let user_config = UserConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load user config: {}", e);
        UserConfig::default()
    });

    let stores = StorePaths::resolve()?;
    let settings = Arc::new(JsonFileStore::open(&stores.settings));
    let notes = Arc::new(JsonFileStore::open(&stores.notes));

    let state = Arc::new(AppState::new(
        Arc::new(NativeFolderPicker::with_title("Open directory")),
        settings,
    ));
    let python = config
        .python
        .clone()
        .unwrap_or_else(|| user_config.python_command.clone());
    let collaborators = Collaborators {
        reader: Arc::new(FsDirectoryReader::new(config.show_hidden)),
        engine: Arc::new(CsvEngine::new(user_config.preview_rows)),
        runner: Arc::new(PythonRunner::new(python)),
        notes: NoteBook::new(notes),
    };

    let mut app = App::new(state, collaborators, &config.delimiter);
    app.mount()?;
    app.start(config.directory.as_deref().map(absolute));

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let result = app.run(&mut terminal).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableBracketedPaste,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    result
}

fn absolute(path: &Path) -> std::path::PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
