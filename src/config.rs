use log::warn;
use serde::Deserialize;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::cli::Cli;
use crate::error::{Result, SessionizeError};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Output path used when neither the CLI nor the config file names one.
pub const DEFAULT_OUTPUT_PATH: &str = "./output/sessionization.txt";

// ---------------------------------------------------------------------------
// Inactivity period
// ---------------------------------------------------------------------------

/// Maximum allowed gap, in seconds, between a session's last request and
/// the next observed timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct InactivityPeriod(u64);

impl InactivityPeriod {
    pub fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// `true` if a gap of `gap` seconds strictly exceeds the period.
    pub fn is_exceeded_by(&self, gap: i64) -> bool {
        // Negative gaps never exceed; the cast is safe once gap > 0.
        gap > 0 && gap as u64 > self.0
    }
}

impl FromStr for InactivityPeriod {
    type Err = SessionizeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        let value: i64 = trimmed
            .parse()
            .map_err(|_| SessionizeError::InvalidPeriod {
                value: trimmed.to_string(),
            })?;
        if value < 0 {
            return Err(SessionizeError::NegativePeriod { value });
        }
        Ok(Self(value as u64))
    }
}

/// Read the inactivity period from the first line of a side file.
pub fn read_inactivity_period(path: &Path) -> Result<InactivityPeriod> {
    let file = std::fs::File::open(path)?;
    let mut first_line = String::new();
    std::io::BufReader::new(file).read_line(&mut first_line)?;
    first_line.parse()
}

// ---------------------------------------------------------------------------
// TOML-deserializable config (intermediate representation)
// ---------------------------------------------------------------------------

/// Raw config as parsed from the TOML file.
/// All fields are optional so that missing keys fall through to defaults.
/// Unknown keys are silently ignored by serde.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct FileConfig {
    verbose: Option<bool>,
    output: Option<PathBuf>,
    fields: FileFieldsConfig,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct FileFieldsConfig {
    key: Option<String>,
    date: Option<String>,
    time: Option<String>,
}

// ---------------------------------------------------------------------------
// Effective (merged) config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub output: PathBuf,
    pub verbose: bool,
    pub fields: FieldNames,
}

/// Header names of the columns a record is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldNames {
    pub key: String,
    pub date: String,
    pub time: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from(DEFAULT_OUTPUT_PATH),
            verbose: false,
            fields: FieldNames::default(),
        }
    }
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            key: "ip".to_string(),
            date: "date".to_string(),
            time: "time".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Returns the default config file path: `~/.config/sessionize/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("sessionize").join("config.toml"))
}

/// Load the config file from the given path.
/// Returns `None` if the file does not exist or cannot be parsed.
fn load_file_config(path: &Path) -> Option<FileConfig> {
    if !path.exists() {
        return None;
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str::<FileConfig>(&contents) {
            Ok(cfg) => Some(cfg),
            Err(e) => {
                warn!("failed to parse config file {}: {}", path.display(), e);
                None
            }
        },
        Err(e) => {
            warn!("failed to read config file {}: {}", path.display(), e);
            None
        }
    }
}

/// Build the effective `AppConfig` by merging defaults, config file, and CLI args.
///
/// Precedence (highest wins):
/// 1. CLI flags (if explicitly provided)
/// 2. Config file values
/// 3. Hardcoded defaults
pub fn build_config(cli: &Cli) -> AppConfig {
    let mut config = AppConfig::default();

    let config_path = cli.config.clone().or_else(default_config_path);

    if let Some(ref path) = config_path {
        if let Some(file_cfg) = load_file_config(path) {
            if let Some(v) = file_cfg.verbose {
                config.verbose = v;
            }
            if let Some(output) = file_cfg.output {
                config.output = output;
            }
            if let Some(key) = file_cfg.fields.key {
                config.fields.key = key;
            }
            if let Some(date) = file_cfg.fields.date {
                config.fields.date = date;
            }
            if let Some(time) = file_cfg.fields.time {
                config.fields.time = time;
            }
        } else if cli.config.is_some() && !path.exists() {
            // An explicit --config that is missing is worth a warning; the
            // default location is allowed to be absent.
            warn!("config file not found: {}", path.display());
        }
    }

    if let Some(ref output) = cli.output {
        config.output = output.clone();
    }
    if cli.verbose {
        config.verbose = true;
    }

    config
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Helper: parse a TOML string into a FileConfig
    fn parse_file_config(toml_str: &str) -> Option<FileConfig> {
        toml::from_str::<FileConfig>(toml_str).ok()
    }

    /// Helper: write text to a temp file
    fn temp_file(contents: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    /// Helper: build a minimal Cli struct for testing
    fn default_cli() -> Cli {
        Cli {
            input: PathBuf::from("input/log.csv"),
            inactivity_period: PathBuf::from("input/inactivity_period.txt"),
            output: None,
            config: Some(PathBuf::from("/tmp/sessionize-nonexistent-54321.toml")),
            verbose: false,
        }
    }

    // -- Inactivity period ------------------------------------------------

    #[rstest]
    #[case("2", 2)]
    #[case("0", 0)]
    #[case("  86400 \n", 86400)]
    fn test_period_parses(#[case] text: &str, #[case] secs: u64) {
        let period: InactivityPeriod = text.parse().unwrap();
        assert_eq!(period.as_secs(), secs);
    }

    #[test]
    fn test_period_negative_is_rejected() {
        let err = "-1".parse::<InactivityPeriod>().unwrap_err();
        assert!(matches!(err, SessionizeError::NegativePeriod { value: -1 }));
    }

    #[rstest]
    #[case("")]
    #[case("two")]
    #[case("2.5")]
    fn test_period_not_an_integer(#[case] text: &str) {
        let err = text.parse::<InactivityPeriod>().unwrap_err();
        assert!(matches!(err, SessionizeError::InvalidPeriod { .. }));
    }

    #[rstest]
    #[case(4, false)]
    #[case(5, false)]
    #[case(6, true)]
    #[case(-3, false)]
    fn test_period_strictly_exceeded(#[case] gap: i64, #[case] exceeded: bool) {
        assert_eq!(InactivityPeriod::from_secs(5).is_exceeded_by(gap), exceeded);
    }

    #[test]
    fn test_read_period_uses_first_line_only() {
        let f = temp_file("7\n99\n");
        let period = read_inactivity_period(f.path()).unwrap();
        assert_eq!(period, InactivityPeriod::from_secs(7));
    }

    #[test]
    fn test_read_period_missing_file() {
        let err =
            read_inactivity_period(Path::new("/tmp/sessionize-no-such-period.txt")).unwrap_err();
        assert!(matches!(err, SessionizeError::Io(_)));
    }

    // -- TOML parsing ----------------------------------------------------

    #[test]
    fn test_parse_valid_full_config() {
        let toml = r#"
verbose = true
output = "/var/out/sessions.txt"

[fields]
key = "client"
date = "day"
time = "clock"
"#;
        let cfg = parse_file_config(toml).unwrap();
        assert_eq!(cfg.verbose, Some(true));
        assert_eq!(cfg.output, Some(PathBuf::from("/var/out/sessions.txt")));
        assert_eq!(cfg.fields.key.as_deref(), Some("client"));
        assert_eq!(cfg.fields.date.as_deref(), Some("day"));
        assert_eq!(cfg.fields.time.as_deref(), Some("clock"));
    }

    #[test]
    fn test_parse_empty_config() {
        let cfg = parse_file_config("").unwrap();
        assert_eq!(cfg.verbose, None);
        assert_eq!(cfg.output, None);
        assert_eq!(cfg.fields.key, None);
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let toml = r#"
verbose = false
delimiter = ";"

[fields]
key = "ip"
zone = "zone"

[unknown_section]
foo = "bar"
"#;
        let cfg = parse_file_config(toml).unwrap();
        assert_eq!(cfg.verbose, Some(false));
        assert_eq!(cfg.fields.key.as_deref(), Some("ip"));
    }

    #[test]
    fn test_malformed_toml_returns_none() {
        assert!(parse_file_config("this is not valid toml [[[").is_none());
        let f = temp_file("not valid {{{{ toml");
        assert!(load_file_config(f.path()).is_none());
    }

    #[test]
    fn test_load_missing_file() {
        let path = Path::new("/tmp/sessionize-test-nonexistent-config-12345.toml");
        assert!(load_file_config(path).is_none());
    }

    // -- build_config merge ----------------------------------------------

    #[test]
    fn test_build_config_defaults_no_file() {
        let config = build_config(&default_cli());
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.output, PathBuf::from(DEFAULT_OUTPUT_PATH));
        assert_eq!(config.fields, FieldNames::default());
    }

    #[test]
    fn test_build_config_file_overrides_defaults() {
        let f = temp_file(
            r#"
verbose = true
output = "out/s.txt"

[fields]
key = "client"
"#,
        );
        let cli = Cli {
            config: Some(f.path().to_path_buf()),
            ..default_cli()
        };
        let config = build_config(&cli);

        assert!(config.verbose);
        assert_eq!(config.output, PathBuf::from("out/s.txt"));
        assert_eq!(config.fields.key, "client");
        assert_eq!(config.fields.date, "date"); // default
        assert_eq!(config.fields.time, "time"); // default
    }

    #[test]
    fn test_build_config_cli_overrides_file() {
        let f = temp_file(
            r#"
verbose = false
output = "from-file.txt"
"#,
        );
        let cli = Cli {
            config: Some(f.path().to_path_buf()),
            output: Some(PathBuf::from("from-cli.txt")),
            verbose: true,
            ..default_cli()
        };
        let config = build_config(&cli);

        assert!(config.verbose);
        assert_eq!(config.output, PathBuf::from("from-cli.txt"));
    }

    #[test]
    fn test_build_config_cli_verbose_false_does_not_override_file() {
        let f = temp_file("verbose = true\n");
        let cli = Cli {
            config: Some(f.path().to_path_buf()),
            verbose: false,
            ..default_cli()
        };
        assert!(build_config(&cli).verbose);
    }

    #[test]
    fn test_build_config_malformed_file_uses_defaults() {
        let f = temp_file("[fields\nkey = ");
        let cli = Cli {
            config: Some(f.path().to_path_buf()),
            ..default_cli()
        };
        assert_eq!(build_config(&cli), AppConfig::default());
    }
}
