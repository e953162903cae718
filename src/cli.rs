// CLI module for argument parsing and configuration

use crate::dashboard::{DEFAULT_DELIMITER, MAX_DELIMITER_LEN};
use clap::{ArgAction, Parser};
use log::LevelFilter;
use std::path::PathBuf;

/// Csvex - browse a directory of CSV/TSV files from the terminal
///
/// Pick a directory, drill into it, open tabular files to see their fields
/// and first rows, and keep a note per file.
#[derive(Parser, Debug, Clone)]
#[command(name = "csvex")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Directory to open on start
    ///
    /// If not specified, the last opened directory is restored.
    pub directory: Option<PathBuf>,

    /// Field delimiter (at most two characters, `\t` for tab)
    ///
    /// The default `,` lets the file extension decide.
    #[arg(short = 'd', long = "delimiter", default_value = DEFAULT_DELIMITER)]
    pub delimiter: String,

    /// Interpreter used by the code runner (overrides the user config)
    #[arg(long = "python")]
    pub python: Option<String>,

    /// Write logs to this file instead of the default cache location
    #[arg(long = "log-file")]
    pub log_file: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    /// Include hidden files and directories (names starting with .)
    #[arg(long = "hidden", action = ArgAction::SetTrue)]
    pub show_hidden: bool,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Args::parse()
    }

    /// Validate the arguments and return any errors
    pub fn validate(&self) -> Result<(), String> {
        if let Some(ref directory) = self.directory {
            if !directory.exists() {
                return Err(format!(
                    "Directory does not exist: {}",
                    directory.display()
                ));
            }

            if !directory.is_dir() {
                return Err(format!(
                    "Path is not a directory: {}",
                    directory.display()
                ));
            }
        }

        let delimiter_len = self.delimiter.chars().count();
        if delimiter_len == 0 || delimiter_len > MAX_DELIMITER_LEN {
            return Err(format!(
                "Invalid delimiter: '{}'. Use one or two characters, e.g. ';' or '\\t'",
                self.delimiter
            ));
        }

        Ok(())
    }
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub directory: Option<PathBuf>,
    pub delimiter: String,
    pub python: Option<String>,
    pub log_file: Option<PathBuf>,
    pub verbose: u8,
    pub show_hidden: bool,
}

impl AppConfig {
    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

impl From<Args> for AppConfig {
    fn from(args: Args) -> Self {
        AppConfig {
            directory: args.directory,
            delimiter: args.delimiter,
            python: args.python,
            log_file: args.log_file,
            verbose: args.verbose,
            show_hidden: args.show_hidden,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            directory: None,
            delimiter: DEFAULT_DELIMITER.to_string(),
            python: None,
            log_file: None,
            verbose: 0,
            show_hidden: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn args_with(directory: Option<PathBuf>, delimiter: &str) -> Args {
        Args {
            directory,
            delimiter: delimiter.to_string(),
            python: None,
            log_file: None,
            verbose: 0,
            show_hidden: false,
        }
    }

    mod args_tests {
        use super::*;

        #[test]
        fn test_parse_defaults() {
            let args = Args::try_parse_from(["csvex"]).unwrap();
            assert_eq!(args.directory, None);
            assert_eq!(args.delimiter, ",");
            assert_eq!(args.verbose, 0);
            assert!(!args.show_hidden);
        }

        #[test]
        fn test_parse_all_flags() {
            let args = Args::try_parse_from([
                "csvex",
                "/data",
                "-d",
                ";",
                "--python",
                "python3",
                "--log-file",
                "/tmp/csvex.log",
                "-vv",
                "--hidden",
            ])
            .unwrap();

            assert_eq!(args.directory, Some(PathBuf::from("/data")));
            assert_eq!(args.delimiter, ";");
            assert_eq!(args.python.as_deref(), Some("python3"));
            assert_eq!(args.log_file, Some(PathBuf::from("/tmp/csvex.log")));
            assert_eq!(args.verbose, 2);
            assert!(args.show_hidden);
        }

        #[test]
        fn test_validate_without_directory() {
            assert!(args_with(None, ",").validate().is_ok());
        }

        #[test]
        fn test_validate_nonexistent_directory() {
            let result = args_with(Some(PathBuf::from("/nonexistent/path/12345")), ",").validate();
            assert!(result.unwrap_err().contains("does not exist"));
        }

        #[test]
        fn test_validate_file_is_not_directory() {
            let temp_dir = TempDir::new().unwrap();
            let file = temp_dir.path().join("a.csv");
            std::fs::write(&file, "a").unwrap();

            let result = args_with(Some(file), ",").validate();
            assert!(result.unwrap_err().contains("not a directory"));
        }

        #[test]
        fn test_validate_delimiter_length() {
            assert!(args_with(None, "").validate().is_err());
            assert!(args_with(None, ";;;").validate().is_err());
            assert!(args_with(None, "\\t").validate().is_ok());
        }
    }

    mod config_tests {
        use super::*;

        #[test]
        fn test_app_config_from_args() {
            let temp_dir = TempDir::new().unwrap();
            let mut args = args_with(Some(temp_dir.path().to_path_buf()), "|");
            args.verbose = 1;
            args.show_hidden = true;

            let config: AppConfig = args.into();
            assert_eq!(config.directory, Some(temp_dir.path().to_path_buf()));
            assert_eq!(config.delimiter, "|");
            assert_eq!(config.log_level(), LevelFilter::Debug);
            assert!(config.show_hidden);
        }

        #[test]
        fn test_app_config_default() {
            let config = AppConfig::default();
            assert!(config.directory.is_none());
            assert_eq!(config.delimiter, ",");
            assert_eq!(config.log_level(), LevelFilter::Info);
        }

        #[test]
        fn test_log_level_saturates() {
            let config = AppConfig {
                verbose: 7,
                ..AppConfig::default()
            };
            assert_eq!(config.log_level(), LevelFilter::Trace);
        }
    }
}
