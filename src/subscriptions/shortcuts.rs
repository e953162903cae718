//! Application-wide shortcut table

use crate::error::{Error, Result};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// The fixed "open directory" binding
pub const OPEN_DIRECTORY: &str = "CmdOrControl+O";

/// A parsed key chord such as `CmdOrControl+O`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Accelerator {
    modifiers: KeyModifiers,
    code: KeyCode,
}

impl Accelerator {
    pub fn parse(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split('+').map(|p| p.trim()).collect();
        let (key, modifier_parts) = match parts.split_last() {
            Some((key, rest)) if !key.is_empty() => (*key, rest),
            _ => return Err(Error::Shortcut(s.to_string())),
        };

        let mut modifiers = KeyModifiers::NONE;
        for part in modifier_parts {
            modifiers |= match part.to_lowercase().as_str() {
                "cmdorcontrol" | "cmdorctrl" | "commandorcontrol" | "ctrl" | "control" => {
                    KeyModifiers::CONTROL
                }
                "cmd" | "command" | "super" | "meta" => KeyModifiers::SUPER,
                "alt" | "option" => KeyModifiers::ALT,
                "shift" => KeyModifiers::SHIFT,
                _ => return Err(Error::Shortcut(s.to_string())),
            };
        }

        let code = parse_key(key).ok_or_else(|| Error::Shortcut(s.to_string()))?;
        Ok(Self { modifiers, code })
    }

    pub fn matches(&self, key: &KeyEvent) -> bool {
        key.kind == KeyEventKind::Press
            && key.modifiers == self.modifiers
            && normalize(key.code) == self.code
    }
}

fn parse_key(s: &str) -> Option<KeyCode> {
    let lower = s.to_lowercase();
    let code = match lower.as_str() {
        "space" => KeyCode::Char(' '),
        "enter" | "return" => KeyCode::Enter,
        "tab" => KeyCode::Tab,
        "backspace" => KeyCode::Backspace,
        "escape" | "esc" => KeyCode::Esc,
        f if f.len() > 1 && f.starts_with('f') => KeyCode::F(f[1..].parse().ok()?),
        _ => {
            let mut chars = lower.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => KeyCode::Char(c),
                _ => return None,
            }
        }
    };
    Some(code)
}

fn normalize(code: KeyCode) -> KeyCode {
    match code {
        KeyCode::Char(c) => KeyCode::Char(c.to_ascii_lowercase()),
        other => other,
    }
}

/// What a shortcut triggers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    RequestDirectory,
}

#[derive(Debug)]
struct Binding {
    owner: String,
    action: ShortcutAction,
    holds: usize,
}

/// Shared table of active shortcuts
#[derive(Debug, Clone, Default)]
pub struct ShortcutRegistry {
    bindings: Arc<Mutex<HashMap<Accelerator, Binding>>>,
}

impl ShortcutRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> MutexGuard<'_, HashMap<Accelerator, Binding>> {
        self.bindings.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn is_registered(&self, accelerator: &Accelerator) -> bool {
        self.table().contains_key(accelerator)
    }

    /// Number of distinct active bindings
    pub fn active_bindings(&self) -> usize {
        self.table().len()
    }

    /// Registers a binding. Fails if the chord is already taken.
    pub fn register(
        &self,
        accelerator: Accelerator,
        owner: &str,
        action: ShortcutAction,
    ) -> Result<()> {
        if self.hold(accelerator, owner, action, false) {
            Ok(())
        } else {
            Err(Error::Shortcut(format!("{:?} is already registered", accelerator)))
        }
    }

    /// Takes a hold on a binding, creating it if absent.
    ///
    /// With `join` set, an owner that already holds the chord adds a hold
    /// instead of creating a second binding.
    fn hold(
        &self,
        accelerator: Accelerator,
        owner: &str,
        action: ShortcutAction,
        join: bool,
    ) -> bool {
        let mut table = self.table();
        match table.get_mut(&accelerator) {
            Some(binding) if join && binding.owner == owner => {
                binding.holds += 1;
                true
            }
            Some(_) => false,
            None => {
                table.insert(
                    accelerator,
                    Binding {
                        owner: owner.to_string(),
                        action,
                        holds: 1,
                    },
                );
                true
            }
        }
    }

    fn release(&self, accelerator: &Accelerator, owner: &str) {
        let mut table = self.table();
        let remove = match table.get_mut(accelerator) {
            Some(binding) if binding.owner == owner => {
                binding.holds = binding.holds.saturating_sub(1);
                binding.holds == 0
            }
            _ => false,
        };
        if remove {
            table.remove(accelerator);
        }
    }

    /// Drops every binding regardless of owner
    pub fn unregister_all(&self) {
        self.table().clear();
    }

    /// Action bound to the pressed chord, if any
    pub fn dispatch(&self, key: &KeyEvent) -> Option<ShortcutAction> {
        self.table()
            .iter()
            .find(|(accelerator, _)| accelerator.matches(key))
            .map(|(_, binding)| binding.action)
    }
}

/// The app's shortcuts, held for as long as this value lives
#[derive(Debug)]
pub struct ShortcutScope {
    registry: ShortcutRegistry,
    owner: String,
    held: Vec<Accelerator>,
}

impl ShortcutScope {
    /// Binds [`OPEN_DIRECTORY`] unless another owner already has it.
    /// Mounting again under the same owner never adds a second binding.
    pub fn mount(registry: &ShortcutRegistry, owner: &str) -> Result<Self> {
        let accelerator = Accelerator::parse(OPEN_DIRECTORY)?;
        let mut held = Vec::new();

        if registry.hold(accelerator, owner, ShortcutAction::RequestDirectory, true) {
            held.push(accelerator);
        } else {
            log::warn!("{} is bound by another owner; not rebinding", OPEN_DIRECTORY);
        }

        Ok(Self {
            registry: registry.clone(),
            owner: owner.to_string(),
            held,
        })
    }

    pub fn is_holding(&self) -> bool {
        !self.held.is_empty()
    }
}

impl Drop for ShortcutScope {
    fn drop(&mut self) {
        for accelerator in &self.held {
            self.registry.release(accelerator, &self.owner);
        }
    }
}
