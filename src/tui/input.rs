use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Represents the result of handling a key event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    /// Quit the application
    Quit,
    /// Move the selection up
    Up,
    /// Move the selection down
    Down,
    /// Open the selected file, enter the selected directory or go back
    Activate,
    /// Return to the previous listing
    Back,
    /// Re-read the opened directory
    Refresh,
    /// Open the folder picker
    OpenDirectory,
    /// Start editing the name filter
    StartFilter,
    /// Start editing the delimiter
    StartDelimiter,
    /// Start editing the note of the opened file
    EditNote,
    /// Open the code runner
    RunCode,
    /// Toggle help overlay
    Help,
    /// Text entry: insert a character
    Input(char),
    /// Text entry: delete the last character
    DeleteChar,
    /// Text entry: accept
    Submit,
    /// Text entry: discard
    Cancel,
    /// No action
    None,
}

/// Maps keyboard events to actions while browsing
pub fn handle_key_event(key: KeyEvent) -> KeyAction {
    match (key.code, key.modifiers) {
        // Quit: q or Ctrl+C
        (KeyCode::Char('q'), KeyModifiers::NONE) => KeyAction::Quit,
        (KeyCode::Char('c'), KeyModifiers::CONTROL) => KeyAction::Quit,
        (KeyCode::Esc, KeyModifiers::NONE) => KeyAction::Quit,

        // Navigation
        (KeyCode::Up, KeyModifiers::NONE) => KeyAction::Up,
        (KeyCode::Down, KeyModifiers::NONE) => KeyAction::Down,
        (KeyCode::Char('k'), KeyModifiers::NONE) => KeyAction::Up,
        (KeyCode::Char('j'), KeyModifiers::NONE) => KeyAction::Down,

        // Drill down / back
        (KeyCode::Enter, KeyModifiers::NONE) => KeyAction::Activate,
        (KeyCode::Right, KeyModifiers::NONE) => KeyAction::Activate,
        (KeyCode::Char('l'), KeyModifiers::NONE) => KeyAction::Activate,
        (KeyCode::Backspace, KeyModifiers::NONE) => KeyAction::Back,
        (KeyCode::Left, KeyModifiers::NONE) => KeyAction::Back,
        (KeyCode::Char('h'), KeyModifiers::NONE) => KeyAction::Back,

        (KeyCode::Char('r'), KeyModifiers::NONE) => KeyAction::Refresh,
        (KeyCode::Char('o'), KeyModifiers::NONE) => KeyAction::OpenDirectory,
        (KeyCode::Char('/'), KeyModifiers::NONE) => KeyAction::StartFilter,
        (KeyCode::Char('d'), KeyModifiers::NONE) => KeyAction::StartDelimiter,
        (KeyCode::Char('n'), KeyModifiers::NONE) => KeyAction::EditNote,
        (KeyCode::Char('x'), KeyModifiers::NONE) => KeyAction::RunCode,

        // Help: ?
        (KeyCode::Char('?'), _) => KeyAction::Help,

        _ => KeyAction::None,
    }
}

/// Maps keyboard events to actions while a text field has focus
pub fn handle_text_input(key: KeyEvent) -> KeyAction {
    match (key.code, key.modifiers) {
        (KeyCode::Char('c'), KeyModifiers::CONTROL) => KeyAction::Quit,
        (KeyCode::Enter, _) => KeyAction::Submit,
        (KeyCode::Esc, _) => KeyAction::Cancel,
        (KeyCode::Backspace, _) => KeyAction::DeleteChar,
        (KeyCode::Tab, _) => KeyAction::Input('\t'),
        (KeyCode::Char(c), KeyModifiers::NONE) | (KeyCode::Char(c), KeyModifiers::SHIFT) => {
            KeyAction::Input(c)
        }
        _ => KeyAction::None,
    }
}
