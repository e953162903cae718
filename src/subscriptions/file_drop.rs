//! Drag-and-drop of files onto the application
//!
//! Terminals deliver a drag-and-drop as a bracketed paste of the dropped
//! paths, quoted or backslash-escaped, or as `file://` URIs.
//! [`DropEvent::from_paste`] turns such a paste into a drop event.

use crate::state::AppState;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use url::Url;

const CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropEvent {
    Hover(Vec<PathBuf>),
    Drop(Vec<PathBuf>),
    Cancelled,
}

impl DropEvent {
    /// A drop of the pasted paths, or `None` if the paste is not a list of paths
    pub fn from_paste(text: &str) -> Option<Self> {
        let paths = parse_dropped_paths(text)?;
        Some(DropEvent::Drop(paths))
    }
}

/// Splits pasted text into paths. Every token must be an absolute path.
pub fn parse_dropped_paths(text: &str) -> Option<Vec<PathBuf>> {
    let tokens = tokenize(text);
    if tokens.is_empty() {
        return None;
    }

    tokens
        .into_iter()
        .map(|token| {
            if token.starts_with("file:") {
                return file_uri_to_path(&token);
            }
            let path = expand_home(PathBuf::from(token));
            path.is_absolute().then_some(path)
        })
        .collect()
}

/// Local path of a `file:` URI; URIs naming a remote host are rejected
fn file_uri_to_path(token: &str) -> Option<PathBuf> {
    Url::parse(token).ok()?.to_file_path().ok()
}

fn expand_home(path: PathBuf) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path
}

fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), c) => current.push(c),
            (None, '\'' | '"') => {
                quote = Some(c);
                in_token = true;
            }
            (None, '\\') => {
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
                in_token = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            (None, c) => {
                current.push(c);
                in_token = true;
            }
        }
    }
    if in_token {
        tokens.push(current);
    }

    tokens
}

/// Handles one drop event; returns the path that was opened, if any
pub fn handle_drop_event(state: &AppState, event: &DropEvent) -> Option<PathBuf> {
    match event {
        DropEvent::Hover(paths) => {
            log::info!("User hovering {:?}", paths);
            None
        }
        DropEvent::Drop(paths) => {
            log::info!("User dropped {:?}", paths);
            let first = paths.first()?.clone();
            state.open_file(first.clone());
            Some(first)
        }
        DropEvent::Cancelled => {
            log::info!("File drop cancelled");
            None
        }
    }
}

/// Broadcast stream of drop events
#[derive(Debug, Clone)]
pub struct DropChannel {
    tx: broadcast::Sender<DropEvent>,
}

impl Default for DropChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl DropChannel {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Delivers the event to every listener; returns how many received it
    pub fn publish(&self, event: DropEvent) -> usize {
        match self.tx.send(event) {
            Ok(receivers) => receivers,
            Err(broadcast::error::SendError(event)) => {
                log::debug!("No drop listener attached, ignoring {:?}", event);
                0
            }
        }
    }

    pub fn listeners(&self) -> usize {
        self.tx.receiver_count()
    }

    fn subscribe(&self) -> broadcast::Receiver<DropEvent> {
        self.tx.subscribe()
    }
}

pub struct DropListener;

impl DropListener {
    /// Starts forwarding drop events to `state` until the returned handle is dropped
    pub fn attach(channel: &DropChannel, state: Arc<AppState>) -> DropSubscription {
        let mut rx = channel.subscribe();
        let handle = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        handle_drop_event(&state, &event);
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        log::warn!("Drop listener skipped {} events", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        DropSubscription { handle }
    }
}

/// Live drop listener; detaches when dropped
#[derive(Debug)]
pub struct DropSubscription {
    handle: JoinHandle<()>,
}

impl DropSubscription {
    pub fn is_active(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for DropSubscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::tests::ScriptedPicker;
    use crate::store::MemoryStore;

    fn new_state() -> Arc<AppState> {
        Arc::new(AppState::new(
            Arc::new(ScriptedPicker::new(vec![])),
            Arc::new(MemoryStore::new()),
        ))
    }

    mod paste_parsing_tests {
        use super::*;

        #[test]
        fn test_single_plain_path() {
            assert_eq!(
                parse_dropped_paths("/tmp/data.csv"),
                Some(vec![PathBuf::from("/tmp/data.csv")])
            );
        }

        #[test]
        fn test_quoted_paths_with_spaces() {
            assert_eq!(
                parse_dropped_paths("'/tmp/my data.csv' '/tmp/other.csv' "),
                Some(vec![
                    PathBuf::from("/tmp/my data.csv"),
                    PathBuf::from("/tmp/other.csv"),
                ])
            );
        }

        #[test]
        fn test_escaped_spaces() {
            assert_eq!(
                parse_dropped_paths(r"/tmp/my\ data.csv"),
                Some(vec![PathBuf::from("/tmp/my data.csv")])
            );
        }

        #[test]
        fn test_file_uris() {
            assert_eq!(
                parse_dropped_paths("file:///tmp/my%20data.csv\nfile:///tmp/b.tsv\n"),
                Some(vec![
                    PathBuf::from("/tmp/my data.csv"),
                    PathBuf::from("/tmp/b.tsv"),
                ])
            );
        }

        #[test]
        fn test_plain_text_is_not_a_drop() {
            assert_eq!(parse_dropped_paths("hello world"), None);
            assert_eq!(parse_dropped_paths("/tmp/a.csv and more"), None);
            assert_eq!(parse_dropped_paths("   "), None);
            assert_eq!(DropEvent::from_paste("relative/path.csv"), None);
        }

        #[test]
        fn test_file_uri_with_localhost_authority() {
            assert_eq!(
                parse_dropped_paths("file://localhost/tmp/data.csv"),
                Some(vec![PathBuf::from("/tmp/data.csv")])
            );
        }

        #[test]
        fn test_file_uri_with_multibyte_name() {
            assert_eq!(
                parse_dropped_paths("file:///tmp/r%C3%A9sum%C3%A9.csv"),
                Some(vec![PathBuf::from("/tmp/résumé.csv")])
            );
        }

        #[test]
        fn test_file_uri_on_remote_host_is_not_a_drop() {
            assert_eq!(parse_dropped_paths("file://server/share/data.csv"), None);
        }
    }

    mod handling_tests {
        use super::*;

        #[tokio::test]
        async fn test_drop_opens_first_path_only() {
            let state = new_state();
            let event = DropEvent::Drop(vec![
                PathBuf::from("/tmp/data.csv"),
                PathBuf::from("/tmp/other.csv"),
            ]);

            let opened = handle_drop_event(&state, &event);
            assert_eq!(opened, Some(PathBuf::from("/tmp/data.csv")));
            assert_eq!(
                state.snapshot().opened_file,
                Some(PathBuf::from("/tmp/data.csv"))
            );
        }

        #[tokio::test]
        async fn test_hover_and_cancel_change_nothing() {
            let state = new_state();
            handle_drop_event(&state, &DropEvent::Hover(vec![PathBuf::from("/tmp/a.csv")]));
            handle_drop_event(&state, &DropEvent::Cancelled);
            handle_drop_event(&state, &DropEvent::Drop(vec![]));

            assert_eq!(state.snapshot().opened_file, None);
        }
    }

    mod listener_tests {
        use super::*;

        #[tokio::test]
        async fn test_listener_forwards_drops() {
            let state = new_state();
            let channel = DropChannel::new();
            let mut watcher = state.subscribe();
            let subscription = DropListener::attach(&channel, state.clone());

            assert_eq!(channel.publish(DropEvent::Drop(vec![PathBuf::from("/tmp/data.csv")])), 1);
            let snapshot = watcher.changed().await.unwrap();

            assert_eq!(snapshot.opened_file, Some(PathBuf::from("/tmp/data.csv")));
            assert!(subscription.is_active());
        }

        #[tokio::test]
        async fn test_dropping_subscription_detaches() {
            let state = new_state();
            let channel = DropChannel::new();
            let subscription = DropListener::attach(&channel, state.clone());
            assert_eq!(channel.listeners(), 1);

            drop(subscription);
            // Give the aborted task a chance to release its receiver
            for _ in 0..10 {
                if channel.listeners() == 0 {
                    break;
                }
                tokio::task::yield_now().await;
            }

            assert_eq!(channel.listeners(), 0);
            assert_eq!(channel.publish(DropEvent::Drop(vec![PathBuf::from("/tmp/x.csv")])), 0);
            assert_eq!(state.snapshot().opened_file, None);
        }
    }
}
