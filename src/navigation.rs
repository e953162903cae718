//! Directory navigation model: the listing shown in the explorer pane
//!
//! Holds the prepared root listing for the opened directory, a text filter
//! applied at view time and an explicit stack of the levels replaced by
//! drill-down. The ".." row is derived from that stack, never stored as an
//! entry.

use crate::domain::{
    filter_entries, name_matches, prepare_listing, DirectoryEntry, DirectoryReader,
};
use crate::error::Result;
use std::mem;
use std::path::PathBuf;

/// A read the owner should perform and hand back to [`NavigationModel::apply_listing`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub directory: PathBuf,
    pub generation: u64,
}

/// One row of the rendered listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Row<'a> {
    /// Return to the level replaced by the last drill-down
    Back,
    Entry(&'a DirectoryEntry),
}

impl Row<'_> {
    pub fn name(&self) -> &str {
        match self {
            Row::Back => "..",
            Row::Entry(entry) => &entry.name,
        }
    }
}

/// Outcome of activating the selected row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    OpenFile(PathBuf),
    Entered(String),
    WentBack,
    Nothing,
}

#[derive(Debug, Clone)]
struct Level {
    name: String,
    entries: Vec<DirectoryEntry>,
    selected: usize,
}

#[derive(Debug, Default)]
pub struct NavigationModel {
    directory: Option<PathBuf>,
    entries: Vec<DirectoryEntry>,
    back_stack: Vec<Level>,
    filter_text: String,
    selected: usize,
    generation: u64,
    loading: bool,
}

impl NavigationModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn directory(&self) -> Option<&PathBuf> {
        self.directory.as_ref()
    }

    /// Entries of the current level, before the text filter
    pub fn entries(&self) -> &[DirectoryEntry] {
        &self.entries
    }

    pub fn filter_text(&self) -> &str {
        &self.filter_text
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn can_go_back(&self) -> bool {
        !self.back_stack.is_empty()
    }

    /// Names of the directories drilled into, outermost first
    pub fn breadcrumb(&self) -> Vec<&str> {
        self.back_stack.iter().map(|l| l.name.as_str()).collect()
    }

    /// Follows the opened directory. A new identity resets the whole view.
    pub fn set_directory(&mut self, directory: Option<PathBuf>) -> Option<LoadRequest> {
        if directory == self.directory {
            return None;
        }

        self.directory = directory;
        self.entries.clear();
        self.back_stack.clear();
        self.filter_text.clear();
        self.selected = 0;
        self.loading = false;
        self.generation += 1;

        self.directory.clone().map(|dir| self.begin_load(dir))
    }

    /// Re-reads the opened directory; the result returns the view to the root level
    pub fn refresh(&mut self) -> Option<LoadRequest> {
        self.directory.clone().map(|dir| self.begin_load(dir))
    }

    fn begin_load(&mut self, directory: PathBuf) -> LoadRequest {
        self.generation += 1;
        self.loading = true;
        LoadRequest {
            directory,
            generation: self.generation,
        }
    }

    /// Applies the outcome of a read. Returns whether the listing changed.
    ///
    /// Results for superseded requests are dropped. A failed read is logged
    /// and leaves the current entries in place.
    pub fn apply_listing(
        &mut self,
        request: &LoadRequest,
        result: Result<Vec<DirectoryEntry>>,
    ) -> bool {
        if request.generation != self.generation
            || self.directory.as_ref() != Some(&request.directory)
        {
            log::debug!(
                "Discarding stale listing of {}",
                request.directory.display()
            );
            return false;
        }
        self.loading = false;

        match result {
            Ok(raw) => {
                self.entries = prepare_listing(raw);
                self.back_stack.clear();
                self.selected = 0;
                log::debug!(
                    "Loaded {} entries from {}",
                    self.entries.len(),
                    request.directory.display()
                );
                true
            }
            Err(e) => {
                log::error!(
                    "Failed to read directory {}: {}",
                    request.directory.display(),
                    e
                );
                false
            }
        }
    }

    /// Reads the opened directory with `reader` and applies the result
    pub async fn load(&mut self, reader: &dyn DirectoryReader) -> bool {
        match self.refresh() {
            Some(request) => {
                let result = reader.read_dir(&request.directory).await;
                self.apply_listing(&request, result)
            }
            None => false,
        }
    }

    /// Rows to display: the back row when drilled in, then the entries.
    ///
    /// The filter applies to every row by name, the ".." row included.
    pub fn visible_rows(&self) -> Vec<Row<'_>> {
        let mut rows = Vec::with_capacity(self.entries.len() + 1);
        if self.can_go_back() && name_matches(Row::Back.name(), &self.filter_text) {
            rows.push(Row::Back);
        }
        rows.extend(
            filter_entries(&self.entries, &self.filter_text)
                .into_iter()
                .map(Row::Entry),
        );
        rows
    }

    pub fn selected_row(&self) -> Option<Row<'_>> {
        self.visible_rows().get(self.selected).copied()
    }

    pub fn select_next(&mut self) {
        let count = self.visible_rows().len();
        if self.selected + 1 < count {
            self.selected += 1;
        }
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Shows `entry`'s children, remembering the current level
    pub fn enter_directory(&mut self, entry: &DirectoryEntry) -> bool {
        let Some(children) = entry.children.as_ref() else {
            return false;
        };

        let previous = mem::replace(&mut self.entries, children.clone());
        self.back_stack.push(Level {
            name: entry.name.clone(),
            entries: previous,
            selected: self.selected,
        });
        self.selected = 0;
        true
    }

    /// Restores the level replaced by the last drill-down
    pub fn go_back(&mut self) -> bool {
        match self.back_stack.pop() {
            Some(level) => {
                self.entries = level.entries;
                self.selected = level.selected;
                self.clamp_selection();
                true
            }
            None => false,
        }
    }

    pub fn activate(&mut self) -> Activation {
        let target = match self.selected_row() {
            None => return Activation::Nothing,
            Some(Row::Back) => None,
            Some(Row::Entry(entry)) => Some(entry.clone()),
        };

        match target {
            None => {
                self.go_back();
                Activation::WentBack
            }
            Some(entry) if entry.is_dir() => {
                self.enter_directory(&entry);
                Activation::Entered(entry.name)
            }
            Some(entry) => Activation::OpenFile(entry.path),
        }
    }

    pub fn set_filter(&mut self, text: impl Into<String>) {
        self.filter_text = text.into();
        self.selected = 0;
    }

    pub fn push_filter_char(&mut self, c: char) {
        self.filter_text.push(c);
        self.selected = 0;
    }

    pub fn pop_filter_char(&mut self) {
        self.filter_text.pop();
        self.selected = 0;
    }

    fn clamp_selection(&mut self) {
        let count = self.visible_rows().len();
        if self.selected >= count {
            self.selected = count.saturating_sub(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use async_trait::async_trait;
    use std::io;
    use std::path::Path;
    use std::sync::Mutex;

    fn file(name: &str) -> DirectoryEntry {
        DirectoryEntry::file(name, format!("/data/{}", name))
    }

    fn dir(name: &str, children: Vec<DirectoryEntry>) -> DirectoryEntry {
        DirectoryEntry::directory(name, format!("/data/{}", name), children)
    }

    fn raw_tree() -> Vec<DirectoryEntry> {
        vec![
            file("b.csv"),
            dir(
                "A",
                vec![file("x.csv"), dir("inner", vec![file("deep.tsv")])],
            ),
            file("a.txt"),
            file("c.tsv"),
        ]
    }

    fn loaded_model() -> NavigationModel {
        let mut model = NavigationModel::new();
        let request = model.set_directory(Some(PathBuf::from("/data"))).unwrap();
        assert!(model.apply_listing(&request, Ok(raw_tree())));
        model
    }

    fn row_names(model: &NavigationModel) -> Vec<String> {
        model
            .visible_rows()
            .iter()
            .map(|r| r.name().to_string())
            .collect()
    }

    struct ScriptedReader {
        results: Mutex<Vec<Result<Vec<DirectoryEntry>>>>,
    }

    #[async_trait]
    impl DirectoryReader for ScriptedReader {
        async fn read_dir(&self, _path: &Path) -> Result<Vec<DirectoryEntry>> {
            self.results.lock().unwrap().remove(0)
        }
    }

    mod loading_tests {
        use super::*;

        #[test]
        fn test_set_directory_issues_request() {
            let mut model = NavigationModel::new();
            let request = model.set_directory(Some(PathBuf::from("/data"))).unwrap();
            assert_eq!(request.directory, PathBuf::from("/data"));
            assert!(model.is_loading());
        }

        #[test]
        fn test_same_directory_is_noop() {
            let mut model = loaded_model();
            assert!(model.set_directory(Some(PathBuf::from("/data"))).is_none());
            assert_eq!(row_names(&model), vec!["A", "b.csv", "c.tsv"]);
        }

        #[test]
        fn test_clearing_directory_resets_view() {
            let mut model = loaded_model();
            assert!(model.set_directory(None).is_none());
            assert!(model.visible_rows().is_empty());
        }

        #[test]
        fn test_new_directory_resets_drill_down_and_filter() {
            let mut model = loaded_model();
            model.set_filter("a");
            model.activate();
            let _ = model.set_directory(Some(PathBuf::from("/other")));

            assert!(!model.can_go_back());
            assert_eq!(model.filter_text(), "");
            assert!(model.entries().is_empty());
        }

        #[test]
        fn test_failed_read_keeps_previous_entries() {
            let mut model = loaded_model();
            let request = model.refresh().unwrap();
            let failure = Err(Error::Io(io::Error::new(io::ErrorKind::Other, "boom")));

            assert!(!model.apply_listing(&request, failure));
            assert_eq!(row_names(&model), vec!["A", "b.csv", "c.tsv"]);
            assert!(!model.is_loading());
        }

        #[test]
        fn test_stale_result_is_discarded() {
            let mut model = NavigationModel::new();
            let first = model.set_directory(Some(PathBuf::from("/one"))).unwrap();
            let second = model.set_directory(Some(PathBuf::from("/two"))).unwrap();

            assert!(!model.apply_listing(&first, Ok(vec![file("old.csv")])));
            assert!(model.entries().is_empty());

            assert!(model.apply_listing(&second, Ok(vec![file("new.csv")])));
            assert_eq!(row_names(&model), vec!["new.csv"]);
        }

        #[test]
        fn test_refresh_returns_to_root() {
            let mut model = loaded_model();
            model.activate();
            assert!(model.can_go_back());

            let request = model.refresh().unwrap();
            assert!(model.apply_listing(&request, Ok(raw_tree())));
            assert!(!model.can_go_back());
            assert_eq!(row_names(&model), vec!["A", "b.csv", "c.tsv"]);
        }

        #[test]
        fn test_refresh_without_directory() {
            let mut model = NavigationModel::new();
            assert!(model.refresh().is_none());
        }

        #[tokio::test]
        async fn test_load_with_reader() {
            let mut model = NavigationModel::new();
            let _ = model.set_directory(Some(PathBuf::from("/data")));
            let reader = ScriptedReader {
                results: Mutex::new(vec![
                    Ok(raw_tree()),
                    Err(Error::Io(io::Error::new(io::ErrorKind::NotFound, "gone"))),
                ]),
            };

            assert!(model.load(&reader).await);
            assert_eq!(row_names(&model), vec!["A", "b.csv", "c.tsv"]);

            assert!(!model.load(&reader).await);
            assert_eq!(row_names(&model), vec!["A", "b.csv", "c.tsv"]);
        }
    }

    mod drill_down_tests {
        use super::*;

        #[test]
        fn test_enter_then_back_restores_listing() {
            let mut model = loaded_model();
            let before = model.entries().to_vec();
            let target = model.entries()[0].clone();

            assert!(model.enter_directory(&target));
            assert_eq!(row_names(&model), vec!["..", "inner", "x.csv"]);
            assert_eq!(model.breadcrumb(), vec!["A"]);

            assert!(model.go_back());
            assert_eq!(model.entries(), before.as_slice());
            assert!(!model.can_go_back());
        }

        #[test]
        fn test_nested_drill_down_unwinds_in_order() {
            let mut model = loaded_model();
            assert_eq!(model.activate(), Activation::Entered("A".to_string()));
            model.select_next();
            assert_eq!(model.activate(), Activation::Entered("inner".to_string()));
            assert_eq!(model.breadcrumb(), vec!["A", "inner"]);
            assert_eq!(row_names(&model), vec!["..", "deep.tsv"]);

            assert_eq!(model.activate(), Activation::WentBack);
            assert_eq!(row_names(&model), vec!["..", "inner", "x.csv"]);
            assert_eq!(model.selected(), 1);
            assert_eq!(model.breadcrumb(), vec!["A"]);
        }

        #[test]
        fn test_back_row_never_nests() {
            let mut model = loaded_model();
            model.activate();
            assert_eq!(model.selected_row(), Some(Row::Back));

            assert_eq!(model.activate(), Activation::WentBack);
            assert!(model.breadcrumb().is_empty());
            assert!(!model.visible_rows().contains(&Row::Back));
        }

        #[test]
        fn test_enter_file_is_rejected() {
            let mut model = loaded_model();
            assert!(!model.enter_directory(&file("b.csv")));
            assert!(!model.can_go_back());
        }

        #[test]
        fn test_go_back_at_root() {
            let mut model = loaded_model();
            assert!(!model.go_back());
        }

        #[test]
        fn test_activate_file_opens_it() {
            let mut model = loaded_model();
            model.select_next();
            assert_eq!(
                model.activate(),
                Activation::OpenFile(PathBuf::from("/data/b.csv"))
            );
        }

        #[test]
        fn test_activate_empty_listing() {
            let mut model = NavigationModel::new();
            assert_eq!(model.activate(), Activation::Nothing);
        }
    }

    mod filter_and_selection_tests {
        use super::*;

        #[test]
        fn test_filter_applies_at_view_time() {
            let mut model = loaded_model();
            model.set_filter("TSV");
            assert_eq!(row_names(&model), vec!["c.tsv"]);
            assert_eq!(model.entries().len(), 3);

            model.set_filter("");
            assert_eq!(row_names(&model), vec!["A", "b.csv", "c.tsv"]);
        }

        #[test]
        fn test_back_row_is_filtered_by_name() {
            let mut model = loaded_model();
            model.activate();
            model.push_filter_char('x');
            assert_eq!(row_names(&model), vec!["x.csv"]);
            assert!(model.can_go_back());

            model.set_filter(".");
            assert_eq!(row_names(&model), vec!["..", "x.csv"]);

            model.set_filter("");
            assert_eq!(row_names(&model), vec!["..", "inner", "x.csv"]);
        }

        #[test]
        fn test_selection_is_clamped() {
            let mut model = loaded_model();
            for _ in 0..10 {
                model.select_next();
            }
            assert_eq!(model.selected(), 2);
            for _ in 0..10 {
                model.select_previous();
            }
            assert_eq!(model.selected(), 0);
        }

        #[test]
        fn test_filter_change_resets_selection() {
            let mut model = loaded_model();
            model.select_next();
            model.push_filter_char('c');
            assert_eq!(model.selected(), 0);
        }
    }
}
