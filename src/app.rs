//! Application shell: owns the models, wires them to the shared state and
//! the collaborators, and turns terminal input into intents.
//!
//! Every slow call (directory read, parse, note store, picker, code runner)
//! runs on its own task and reports back through a single event channel, so
//! the render loop never blocks.

use crate::bridge::{CodeRunner, CsvData, TabularEngine};
use crate::dashboard::{DashboardModel, ExecutorModel, TableRequest};
use crate::domain::{DirectoryEntry, DirectoryReader};
use crate::error::{Error, Result};
use crate::navigation::{Activation, LoadRequest, NavigationModel};
use crate::notes::NoteBook;
use crate::state::{AppSnapshot, AppState, AppStateWatcher, DirectoryRequest};
use crate::subscriptions::{
    DropChannel, DropEvent, DropListener, DropSubscription, ShortcutAction, ShortcutRegistry,
    ShortcutScope,
};
use crate::tui::{self, handle_key_event, handle_text_input, KeyAction, ViewState};
use crossterm::event::{Event, EventStream, KeyEvent, KeyEventKind};
use futures_util::StreamExt;
use ratatui::{backend::Backend, Terminal};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Owner name under which the application holds its shortcuts
pub const SHORTCUT_OWNER: &str = "explorer";

/// Results reported back by background tasks
#[derive(Debug)]
pub enum AppEvent {
    Listing {
        request: LoadRequest,
        result: Result<Vec<DirectoryEntry>>,
    },
    Table {
        id: u64,
        result: Result<CsvData>,
    },
    NoteLoaded {
        file: PathBuf,
        result: Result<Option<String>>,
    },
    NoteSaved {
        file: PathBuf,
        text: String,
        result: Result<()>,
    },
    DirectoryRequested(Result<DirectoryRequest>),
    Executed(Result<String>),
}

/// The engines and stores the application talks to
#[derive(Clone)]
pub struct Collaborators {
    pub reader: Arc<dyn DirectoryReader>,
    pub engine: Arc<dyn TabularEngine>,
    pub runner: Arc<dyn CodeRunner>,
    pub notes: NoteBook,
}

struct Mounted {
    _shortcuts: ShortcutScope,
    _drops: DropSubscription,
}

pub struct App {
    state: Arc<AppState>,
    watcher: AppStateWatcher,
    collaborators: Collaborators,
    shortcuts: ShortcutRegistry,
    drops: DropChannel,
    mounted: Option<Mounted>,
    pub navigation: NavigationModel,
    pub dashboard: DashboardModel,
    pub executor: ExecutorModel,
    view_state: ViewState,
    input: String,
    opening_dialog: bool,
    status: Option<String>,
    should_quit: bool,
    events_tx: mpsc::UnboundedSender<AppEvent>,
    events_rx: mpsc::UnboundedReceiver<AppEvent>,
}

impl App {
    pub fn new(state: Arc<AppState>, collaborators: Collaborators, delimiter: &str) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let watcher = state.subscribe();
        Self {
            state,
            watcher,
            collaborators,
            shortcuts: ShortcutRegistry::new(),
            drops: DropChannel::new(),
            mounted: None,
            navigation: NavigationModel::new(),
            dashboard: DashboardModel::new(delimiter),
            executor: ExecutorModel::default(),
            view_state: ViewState::Browsing,
            input: String::new(),
            opening_dialog: false,
            status: None,
            should_quit: false,
            events_tx,
            events_rx,
        }
    }

    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    pub fn snapshot(&self) -> AppSnapshot {
        self.state.snapshot()
    }

    pub fn view_state(&self) -> &ViewState {
        &self.view_state
    }

    /// Text being edited in the current prompt
    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Whether this screen is waiting on a folder picker it opened
    pub fn is_opening_dialog(&self) -> bool {
        self.opening_dialog
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn shortcuts(&self) -> &ShortcutRegistry {
        &self.shortcuts
    }

    pub fn drops(&self) -> &DropChannel {
        &self.drops
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }

    /// Attaches the shortcut and drop subscriptions. Mounting twice is a no-op.
    pub fn mount(&mut self) -> Result<()> {
        if self.mounted.is_some() {
            return Ok(());
        }
        let shortcuts = ShortcutScope::mount(&self.shortcuts, SHORTCUT_OWNER)?;
        let drops = DropListener::attach(&self.drops, Arc::clone(&self.state));
        self.mounted = Some(Mounted {
            _shortcuts: shortcuts,
            _drops: drops,
        });
        log::debug!("Subscriptions attached");
        Ok(())
    }

    /// Detaches both subscriptions
    pub fn unmount(&mut self) {
        if self.mounted.take().is_some() {
            log::debug!("Subscriptions detached");
        }
    }

    /// Final teardown on exit: detaches and clears every shortcut, whoever owns it
    pub fn shutdown(&mut self) {
        self.unmount();
        self.shortcuts.unregister_all();
        log::info!("Shut down");
    }

    /// Syncs with the current state and picks the starting directory.
    ///
    /// An explicit `initial` directory is selected like a picker choice;
    /// otherwise the last opened directory is restored from the store.
    pub fn start(&mut self, initial: Option<PathBuf>) {
        let snapshot = self.watcher.current();
        self.sync_with_state(snapshot);

        let state = Arc::clone(&self.state);
        match initial {
            Some(path) => {
                tokio::spawn(async move { state.select_directory(path).await });
            }
            None => {
                tokio::spawn(async move { state.hydrate().await });
            }
        }
    }

    /// Runs the event loop until the user quits
    pub async fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        let mut input = EventStream::new();

        while !self.should_quit {
            terminal.draw(|frame| tui::render(frame, self))?;

            tokio::select! {
                event = input.next() => match event {
                    Some(Ok(event)) => self.handle_terminal_event(event),
                    Some(Err(e)) => {
                        self.shutdown();
                        return Err(e.into());
                    }
                    None => break,
                },
                processed = self.process_next() => {
                    if !processed {
                        break;
                    }
                }
            }
        }

        self.shutdown();
        Ok(())
    }

    /// Waits for one background result or state change and applies it.
    ///
    /// Returns `false` once the shared state is gone.
    pub async fn process_next(&mut self) -> bool {
        tokio::select! {
            Some(event) = self.events_rx.recv() => {
                self.handle_app_event(event);
                true
            }
            snapshot = self.watcher.changed() => match snapshot {
                Some(snapshot) => {
                    self.sync_with_state(snapshot);
                    true
                }
                None => false,
            },
        }
    }

    pub fn handle_terminal_event(&mut self, event: Event) {
        match event {
            Event::Key(key) => self.handle_key(key),
            Event::Paste(text) => self.handle_paste(&text),
            _ => {}
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        if let Some(action) = self.shortcuts.dispatch(&key) {
            match action {
                ShortcutAction::RequestDirectory => self.request_directory(),
            }
            return;
        }

        match self.view_state {
            ViewState::Browsing => self.handle_browsing(handle_key_event(key)),
            // Any key closes help
            ViewState::Help => self.view_state = ViewState::Browsing,
            ViewState::Filter => self.handle_filter(handle_text_input(key)),
            ViewState::Delimiter | ViewState::Note | ViewState::Code => {
                self.handle_prompt(handle_text_input(key))
            }
        }
    }

    /// Pasted text is typed into an open prompt, otherwise read as a file drop
    pub fn handle_paste(&mut self, text: &str) {
        match self.view_state {
            ViewState::Filter => {
                for c in text.chars().filter(|c| !c.is_control()) {
                    self.navigation.push_filter_char(c);
                }
            }
            ViewState::Delimiter | ViewState::Note | ViewState::Code => {
                self.input.push_str(text);
            }
            ViewState::Browsing | ViewState::Help => match DropEvent::from_paste(text) {
                Some(event) => {
                    if self.drops.publish(event) == 0 {
                        self.status = Some("Drop ignored: not listening".to_string());
                    }
                }
                None => {
                    log::debug!("Ignoring paste that is not a list of paths");
                    self.status = Some("Pasted text is not a file path".to_string());
                }
            },
        }
    }

    pub fn handle_app_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Listing { request, result } => {
                self.navigation.apply_listing(&request, result);
            }
            AppEvent::Table { id, result } => {
                self.dashboard.apply_table(id, result);
            }
            AppEvent::NoteLoaded { file, result } => match result {
                Ok(note) => {
                    self.dashboard.apply_note(&file, note);
                }
                Err(e) => log::warn!("Could not load note for {}: {}", file.display(), e),
            },
            AppEvent::NoteSaved { file, text, result } => match result {
                Ok(()) => {
                    self.dashboard.apply_note(&file, Some(text));
                    self.status = Some("Note saved".to_string());
                }
                Err(e) => {
                    log::error!("Could not save note for {}: {}", file.display(), e);
                    self.status = Some(format!("Could not save note: {}", e));
                }
            },
            AppEvent::DirectoryRequested(result) => {
                self.opening_dialog = false;
                match result {
                    Ok(DirectoryRequest::Selected(path)) => {
                        log::debug!("Picker returned {}", path.display());
                        self.status = None;
                    }
                    Ok(DirectoryRequest::Cancelled) => {}
                    Err(Error::PickerBusy) => log::debug!("Folder picker already open"),
                    Err(e) => {
                        log::error!("Directory request failed: {}", e);
                        self.status = Some(e.to_string());
                    }
                }
            }
            AppEvent::Executed(result) => self.executor.finish(result),
        }
    }

    /// Opens the folder picker unless this screen is already waiting on one
    pub fn request_directory(&mut self) {
        if self.opening_dialog {
            log::debug!("Directory request ignored, picker already open");
            return;
        }
        self.opening_dialog = true;

        let state = Arc::clone(&self.state);
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = state.request_directory().await;
            let _ = tx.send(AppEvent::DirectoryRequested(result));
        });
    }

    fn sync_with_state(&mut self, snapshot: AppSnapshot) {
        if let Some(request) = self.navigation.set_directory(snapshot.opened_directory) {
            self.spawn_listing(request);
        }

        let file_changed = self.dashboard.file() != snapshot.opened_file.as_ref();
        if let Some(request) = self.dashboard.set_file(snapshot.opened_file.clone()) {
            self.spawn_table(request);
        }
        if file_changed {
            if let Some(file) = snapshot.opened_file {
                self.spawn_note_load(file);
            }
        }
    }

    fn handle_browsing(&mut self, action: KeyAction) {
        match action {
            KeyAction::Quit => self.should_quit = true,
            KeyAction::Up => self.navigation.select_previous(),
            KeyAction::Down => self.navigation.select_next(),
            KeyAction::Activate => {
                if let Activation::OpenFile(path) = self.navigation.activate() {
                    self.state.open_file(path);
                }
            }
            KeyAction::Back => {
                self.navigation.go_back();
            }
            KeyAction::Refresh => {
                if let Some(request) = self.navigation.refresh() {
                    self.spawn_listing(request);
                }
                if let Some(request) = self.dashboard.reload() {
                    self.spawn_table(request);
                }
            }
            KeyAction::OpenDirectory => self.request_directory(),
            KeyAction::StartFilter => self.view_state = ViewState::Filter,
            KeyAction::StartDelimiter => {
                self.input = self.dashboard.delimiter().to_string();
                self.view_state = ViewState::Delimiter;
            }
            KeyAction::EditNote => {
                if self.dashboard.file().is_none() {
                    self.status = Some("Open a file to write a note".to_string());
                    return;
                }
                self.input = self.dashboard.note().unwrap_or_default().to_string();
                self.view_state = ViewState::Note;
            }
            KeyAction::RunCode => {
                self.input = self.executor.code.clone();
                self.view_state = ViewState::Code;
            }
            KeyAction::Help => self.view_state = ViewState::Help,
            _ => {}
        }
    }

    fn handle_filter(&mut self, action: KeyAction) {
        match action {
            KeyAction::Input(c) => self.navigation.push_filter_char(c),
            KeyAction::DeleteChar => self.navigation.pop_filter_char(),
            KeyAction::Submit => self.view_state = ViewState::Browsing,
            KeyAction::Cancel => {
                self.navigation.set_filter("");
                self.view_state = ViewState::Browsing;
            }
            KeyAction::Quit => self.should_quit = true,
            _ => {}
        }
    }

    fn handle_prompt(&mut self, action: KeyAction) {
        match action {
            KeyAction::Input(c) => self.input.push(c),
            KeyAction::DeleteChar => {
                self.input.pop();
            }
            KeyAction::Cancel => self.close_prompt(),
            KeyAction::Submit => self.submit_prompt(),
            KeyAction::Quit => self.should_quit = true,
            _ => {}
        }
    }

    fn submit_prompt(&mut self) {
        let text = std::mem::take(&mut self.input);
        match self.view_state {
            ViewState::Delimiter => {
                if let Some(request) = self.dashboard.set_delimiter(&text) {
                    self.spawn_table(request);
                }
            }
            ViewState::Note => {
                if let Some(file) = self.dashboard.file().cloned() {
                    self.spawn_note_save(file, text);
                }
            }
            ViewState::Code => {
                self.executor.code = text;
                match self.executor.begin() {
                    Some(code) => self.spawn_execution(code),
                    None => log::debug!("Nothing to execute"),
                }
                // The code view stays open to show the output
                self.input = self.executor.code.clone();
                return;
            }
            ViewState::Browsing | ViewState::Help | ViewState::Filter => {}
        }
        self.view_state = ViewState::Browsing;
    }

    fn close_prompt(&mut self) {
        self.input.clear();
        self.view_state = ViewState::Browsing;
    }

    fn spawn_listing(&self, request: LoadRequest) {
        let reader = Arc::clone(&self.collaborators.reader);
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = reader.read_dir(&request.directory).await;
            let _ = tx.send(AppEvent::Listing { request, result });
        });
    }

    fn spawn_table(&self, request: TableRequest) {
        let engine = Arc::clone(&self.collaborators.engine);
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = engine.open(&request.request).await;
            let _ = tx.send(AppEvent::Table {
                id: request.id,
                result,
            });
        });
    }

    fn spawn_note_load(&self, file: PathBuf) {
        let notes = self.collaborators.notes.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = notes.load(&file).await;
            let _ = tx.send(AppEvent::NoteLoaded { file, result });
        });
    }

    fn spawn_note_save(&self, file: PathBuf, text: String) {
        let notes = self.collaborators.notes.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = notes.save(&file, &text).await;
            let _ = tx.send(AppEvent::NoteSaved { file, text, result });
        });
    }

    fn spawn_execution(&self, code: String) {
        let runner = Arc::clone(&self.collaborators.runner);
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = runner.execute(&code).await;
            let _ = tx.send(AppEvent::Executed(result));
        });
    }
}
