use std::path::{Path, PathBuf};
use std::{env, fs, io};

use anyhow::Context;
use thiserror::Error;

use crate::factory::Granularity;
use crate::storage::errors::ErrorType;
use crate::storage::validate_format;
use crate::time::Zone;

pub use crate::storage::DEFAULT_AUTO_CLEAN_THRESHOLD;

/// The default config file name
pub const DEFAULT_FILENAME: &str = ".datecontainer.toml";

pub const DEFAULT_GRANULARITY: Granularity = Granularity::Second;
pub const DEFAULT_AUTO_CLEAN: bool = true;

const KEY_STORAGE: &str = "storage";
const KEY_FORMAT: &str = "format";
const KEY_GRANULARITY: &str = "granularity";
const KEY_AUTO_CLEAN: &str = "auto_clean";
const KEY_AUTO_CLEAN_THRESHOLD: &str = "auto_clean_threshold";
const KEY_ZONE: &str = "zone";
const KEY_ZONE_NAME: &str = "name";
const KEY_ZONE_OFFSET: &str = "offset_seconds";

/// Finds the config file that applies to `dir`.
///
/// The nearest [`DEFAULT_FILENAME`] in `dir` or any of its ancestors wins; the one in
/// the home directory is the last resort.
pub fn find_config(dir: &Path) -> Option<PathBuf> {
    dir.ancestors()
        .map(|ancestor| ancestor.join(DEFAULT_FILENAME))
        .find(|candidate| candidate.is_file())
        .or_else(home_config)
}

/// [`DEFAULT_FILENAME`] in the home directory, if it exists
pub fn home_config() -> Option<PathBuf> {
    home::home_dir()
        .map(|home| home.join(DEFAULT_FILENAME))
        .filter(|path| path.is_file())
}

/// Parses a file at path into a toml table
pub fn read_file(path: &Path) -> Result<toml::Table, ReadError> {
    let contents = fs::read_to_string(path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => ReadError::NotFound(path.to_path_buf()),
        _ => ReadError::Io(err),
    })?;
    Ok(contents.parse::<toml::Table>()?)
}

/// Represents an error during reading a config file
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Malformed TOML: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Represents a malformed value inside an otherwise readable config
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Expected {expected} for key '{key}'")]
    WrongType { key: String, expected: &'static str },

    #[error("Invalid value for key '{key}': {source}")]
    InvalidValue {
        key: String,
        #[source]
        source: ErrorType,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Identity format; overrides `granularity` when both are configured
    pub format: String,
    pub zone: Zone,
    pub auto_clean: bool,
    /// In percentage, how much of the storage the vacant slots must take up before
    /// auto clean kicks in
    pub auto_clean_threshold: u8,
}

impl StoreConfig {
    pub fn new() -> Self {
        Self {
            format: DEFAULT_GRANULARITY.format().to_string(),
            zone: Zone::utc(),
            auto_clean: DEFAULT_AUTO_CLEAN,
            auto_clean_threshold: DEFAULT_AUTO_CLEAN_THRESHOLD,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses storage configurations from a toml table
/// Any missing or malformed values will be replaced with defaults
pub fn parse_config(toml: &toml::Table) -> StoreConfig {
    let mut conf = StoreConfig::new();

    if let Some(storage_cfg) = toml.get(KEY_STORAGE) {
        if let Some(granularity) = storage_cfg
            .get(KEY_GRANULARITY)
            .and_then(toml::Value::as_str)
            .and_then(|val| val.parse::<Granularity>().ok())
        {
            conf.format = granularity.format().to_string();
        }
        if let Some(val) = storage_cfg
            .get(KEY_FORMAT)
            .and_then(toml::Value::as_str)
            .filter(|val| validate_format(val).is_ok())
        {
            conf.format = val.to_string();
        }
        if let Some(val) = storage_cfg.get(KEY_AUTO_CLEAN).and_then(toml::Value::as_bool) {
            conf.auto_clean = val;
        }
        if let Some(val) = storage_cfg
            .get(KEY_AUTO_CLEAN_THRESHOLD)
            .and_then(toml::Value::as_integer)
            .and_then(|val| u8::try_from(val).ok())
            .filter(|val| *val <= 100)
        {
            conf.auto_clean_threshold = val;
        }
    }

    if let Some(zone_cfg) = toml.get(KEY_ZONE) {
        let name = zone_cfg.get(KEY_ZONE_NAME).and_then(toml::Value::as_str);
        let offset = zone_cfg
            .get(KEY_ZONE_OFFSET)
            .and_then(toml::Value::as_integer)
            .and_then(|val| i32::try_from(val).ok())
            .unwrap_or(0);
        if let Some(zone) = name.and_then(|name| Zone::new(name, offset).ok()) {
            conf.zone = zone;
        }
    }

    conf
}

/// Like [parse_config], but malformed values are reported instead of replaced
pub fn try_parse_config(toml: &toml::Table) -> Result<StoreConfig, ParseError> {
    let mut conf = StoreConfig::new();

    if let Some(storage_cfg) = toml.get(KEY_STORAGE) {
        if let Some(val) = typed(storage_cfg, KEY_GRANULARITY, "a string", toml::Value::as_str)? {
            let granularity = val
                .parse::<Granularity>()
                .map_err(|source| invalid(KEY_GRANULARITY, source))?;
            conf.format = granularity.format().to_string();
        }
        if let Some(val) = typed(storage_cfg, KEY_FORMAT, "a string", toml::Value::as_str)? {
            validate_format(val).map_err(|source| invalid(KEY_FORMAT, source))?;
            conf.format = val.to_string();
        }
        if let Some(val) = typed(storage_cfg, KEY_AUTO_CLEAN, "a boolean", toml::Value::as_bool)? {
            conf.auto_clean = val;
        }
        if let Some(val) = typed(
            storage_cfg,
            KEY_AUTO_CLEAN_THRESHOLD,
            "an integer",
            toml::Value::as_integer,
        )? {
            conf.auto_clean_threshold = u8::try_from(val)
                .ok()
                .filter(|val| *val <= 100)
                .ok_or_else(|| {
                    invalid(
                        KEY_AUTO_CLEAN_THRESHOLD,
                        ErrorType::InvalidArgument(format!("{val} is not a percentage")),
                    )
                })?;
        }
    }

    if let Some(zone_cfg) = toml.get(KEY_ZONE) {
        let name = typed(zone_cfg, KEY_ZONE_NAME, "a string", toml::Value::as_str)?
            .ok_or_else(|| ParseError::WrongType {
                key: KEY_ZONE_NAME.to_string(),
                expected: "a string",
            })?;
        let offset = typed(zone_cfg, KEY_ZONE_OFFSET, "an integer", toml::Value::as_integer)?
            .unwrap_or(0);
        let offset = i32::try_from(offset).map_err(|_| {
            invalid(
                KEY_ZONE_OFFSET,
                ErrorType::InvalidArgument(format!("{offset} is out of range")),
            )
        })?;
        conf.zone = Zone::new(name, offset).map_err(|source| invalid(KEY_ZONE, source))?;
    }

    Ok(conf)
}

/// Reads and strictly parses a config.
///
/// `path` may name the file itself or a directory to search from with [find_config].
/// Without a path the search starts at the current directory. When no file is found
/// the defaults apply.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<StoreConfig> {
    let found = match path {
        Some(path) if path.is_dir() => find_config(path),
        Some(path) => Some(path.to_path_buf()),
        None => env::current_dir()
            .ok()
            .and_then(|dir| find_config(&dir)),
    };
    let Some(path) = found else {
        return Ok(StoreConfig::default());
    };

    let toml = read_file(&path).with_context(|| format!("reading {}", path.display()))?;
    let conf =
        try_parse_config(&toml).with_context(|| format!("parsing {}", path.display()))?;
    Ok(conf)
}

fn typed<'a, V>(
    table: &'a toml::Value,
    key: &str,
    expected: &'static str,
    get: fn(&'a toml::Value) -> Option<V>,
) -> Result<Option<V>, ParseError> {
    match table.get(key) {
        None => Ok(None),
        Some(val) => get(val).map(Some).ok_or_else(|| ParseError::WrongType {
            key: key.to_string(),
            expected,
        }),
    }
}

fn invalid(key: &str, source: ErrorType) -> ParseError {
    ParseError::InvalidValue {
        key: key.to_string(),
        source,
    }
}
