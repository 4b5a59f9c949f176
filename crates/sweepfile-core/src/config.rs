//! Sweep configuration types and the properties file loader.

use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use derive_builder::Builder;
use java_properties::PropertiesIter;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Keys recognised in the configuration file.
pub mod keys {
    /// Directory holding the configured top-level folders.
    pub const ROOT_PATH: &str = "ROOT_PATH";
    /// Archive root that aged entries are moved into.
    pub const TEMP_PATH: &str = "TEMP_PATH";
    /// Age threshold and sweep interval, in days.
    pub const DELETION_FREQUENCY_DAYS: &str = "DELETION_FREQUENCY_DAYS";
    /// Comma-separated folder names relative to `ROOT_PATH`.
    pub const FOLDER_NAMES: &str = "FOLDER_NAMES";
    /// Optional archive layout (`flat` or `mirrored`).
    pub const ARCHIVE_LAYOUT: &str = "ARCHIVE_LAYOUT";
    /// Optional dry-run switch.
    pub const DRY_RUN: &str = "DRY_RUN";
}

const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// Where an archived entry lands under the archive root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveLayout {
    /// Only the final path component is kept: `archive/<name>`.
    ///
    /// Two entries with the same name from different folders replace each
    /// other.
    #[default]
    Flat,
    /// The path relative to the root is kept: `archive/<folder>/<sub>/<name>`.
    Mirrored,
}

impl fmt::Display for ArchiveLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flat => write!(f, "flat"),
            Self::Mirrored => write!(f, "mirrored"),
        }
    }
}

impl FromStr for ArchiveLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flat" => Ok(Self::Flat),
            "mirrored" => Ok(Self::Mirrored),
            other => Err(format!("unknown archive layout '{other}', expected flat or mirrored")),
        }
    }
}

/// Configuration for the archival sweep.
///
/// Loaded once at startup and never mutated afterwards.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct SweepConfig {
    /// Directory containing the configured folders.
    pub root_path: PathBuf,

    /// Archive root. Must neither contain nor be inside `root_path`.
    pub archive_path: PathBuf,

    /// Age threshold in days, also used as the pause between sweeps.
    pub frequency_days: u32,

    /// Top-level folder names under `root_path`, swept in this order.
    pub folder_names: Vec<String>,

    /// Placement of archived entries.
    #[builder(default)]
    #[serde(default)]
    pub layout: ArchiveLayout,

    /// Log what would be archived without touching the filesystem.
    #[builder(default = "false")]
    #[serde(default)]
    pub dry_run: bool,
}

impl SweepConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        let root = match self.root_path {
            Some(ref root) if !root.as_os_str().is_empty() => root,
            Some(_) => return Err("Root path cannot be empty".to_string()),
            None => return Err("Root path is required".to_string()),
        };
        let archive = match self.archive_path {
            Some(ref archive) if !archive.as_os_str().is_empty() => archive,
            Some(_) => return Err("Archive path cannot be empty".to_string()),
            None => return Err("Archive path is required".to_string()),
        };
        let (root_norm, archive_norm) = (normalize_path(root), normalize_path(archive));
        if archive_norm.starts_with(&root_norm) {
            return Err(format!(
                "Archive path {} must not be inside root path {}",
                archive.display(),
                root.display()
            ));
        }
        if root_norm.starts_with(&archive_norm) {
            return Err(format!(
                "Root path {} must not be inside archive path {}",
                root.display(),
                archive.display()
            ));
        }
        if self.frequency_days == Some(0) {
            return Err("Frequency must be a positive number of days".to_string());
        }
        match self.folder_names {
            Some(ref names) if names.is_empty() => {
                return Err("At least one folder name is required".to_string());
            }
            Some(ref names) => {
                if let Some(bad) = names.iter().find(|n| !is_plain_name(n)) {
                    return Err(format!("Invalid folder name: {bad:?}"));
                }
            }
            None => {}
        }
        Ok(())
    }
}

/// Resolve `.` and `..` components without touching the filesystem.
///
/// `..` never climbs above the root of an absolute path.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// A folder name must stay below the root.
fn is_plain_name(name: &str) -> bool {
    let path = Path::new(name);
    !name.is_empty()
        && !path.is_absolute()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
}

impl SweepConfig {
    /// Create a new config builder.
    pub fn builder() -> SweepConfigBuilder {
        SweepConfigBuilder::default()
    }

    /// Load configuration from a Java-style `.properties` file.
    ///
    /// Both `KEY=VALUE` and `KEY : VALUE` lines are accepted, values keep
    /// their inner spaces, and the file is read as UTF-8.
    pub fn from_properties(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                ConfigError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        let mut pairs = HashMap::new();
        PropertiesIter::new_with_encoding(BufReader::new(file), encoding_rs::UTF_8)
            .read_into(|key, value| {
                pairs.insert(key, value);
            })
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        Self::from_pairs(pairs)
    }

    /// Build configuration from already parsed key-value pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let pairs: HashMap<String, String> = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        let root_path = required(&pairs, keys::ROOT_PATH)?;
        let archive_path = required(&pairs, keys::TEMP_PATH)?;

        let raw_days = required(&pairs, keys::DELETION_FREQUENCY_DAYS)?;
        let frequency_days: u32 = raw_days
            .trim()
            .parse()
            .map_err(|e| ConfigError::invalid_value(keys::DELETION_FREQUENCY_DAYS, raw_days, e))?;
        if frequency_days == 0 {
            return Err(ConfigError::invalid_value(
                keys::DELETION_FREQUENCY_DAYS,
                raw_days,
                "must be a positive number of days",
            ));
        }

        let folder_names = parse_folder_names(required(&pairs, keys::FOLDER_NAMES)?);

        let layout: ArchiveLayout = match pairs.get(keys::ARCHIVE_LAYOUT) {
            Some(raw) => raw
                .parse::<ArchiveLayout>()
                .map_err(|e| ConfigError::invalid_value(keys::ARCHIVE_LAYOUT, raw.as_str(), e))?,
            None => ArchiveLayout::default(),
        };

        let dry_run: bool = match pairs.get(keys::DRY_RUN) {
            Some(raw) => raw
                .trim()
                .to_ascii_lowercase()
                .parse::<bool>()
                .map_err(|e| ConfigError::invalid_value(keys::DRY_RUN, raw.as_str(), e))?,
            None => false,
        };

        Self::builder()
            .root_path(root_path)
            .archive_path(archive_path)
            .frequency_days(frequency_days)
            .folder_names(folder_names)
            .layout(layout)
            .dry_run(dry_run)
            .build()
            .map_err(|e| ConfigError::Invalid {
                message: e.to_string(),
            })
    }

    /// Absolute paths of the configured top-level folders, in order.
    pub fn folder_paths(&self) -> impl Iterator<Item = PathBuf> + '_ {
        self.folder_names
            .iter()
            .map(|name| self.root_path.join(name))
    }

    /// Pause between two sweeps.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.frequency_days) * SECS_PER_DAY)
    }

    /// Return a copy with dry-run forced on.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

fn required<'a>(pairs: &'a HashMap<String, String>, key: &'static str) -> Result<&'a str, ConfigError> {
    pairs
        .get(key)
        .map(String::as_str)
        .ok_or(ConfigError::MissingKey { key })
}

/// Split on commas, trimming whitespace and dropping empty entries.
fn parse_folder_names(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_pairs() -> Vec<(&'static str, &'static str)> {
        vec![
            (keys::ROOT_PATH, "/data/shared"),
            (keys::TEMP_PATH, "/data/archive"),
            (keys::DELETION_FREQUENCY_DAYS, "30"),
            (keys::FOLDER_NAMES, "Reports, Scans,,Exports"),
        ]
    }

    #[test]
    fn test_config_builder() {
        let config = SweepConfig::builder()
            .root_path("/srv/root")
            .archive_path("/srv/archive")
            .frequency_days(7u32)
            .folder_names(vec!["A".to_string()])
            .build()
            .unwrap();

        assert_eq!(config.root_path, PathBuf::from("/srv/root"));
        assert_eq!(config.frequency_days, 7);
        assert_eq!(config.layout, ArchiveLayout::Flat);
        assert!(!config.dry_run);
    }

    #[test]
    fn test_builder_rejects_archive_inside_root() {
        let err = SweepConfig::builder()
            .root_path("/srv/root")
            .archive_path("/srv/root/archive")
            .frequency_days(7u32)
            .folder_names(vec!["A".to_string()])
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("must not be inside"));
    }

    #[test]
    fn test_builder_rejects_root_inside_archive() {
        let err = SweepConfig::builder()
            .root_path("/data/shared")
            .archive_path("/data")
            .frequency_days(7u32)
            .folder_names(vec!["Scans".to_string()])
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("Root path"));

        let err = SweepConfig::builder()
            .root_path("/data/archive/../shared")
            .archive_path("/data/./shared/..")
            .frequency_days(7u32)
            .folder_names(vec!["Scans".to_string()])
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("must not be inside"));
    }

    #[test]
    fn test_builder_accepts_sibling_with_common_prefix() {
        let config = SweepConfig::builder()
            .root_path("/data/shared")
            .archive_path("/data/shared-archive")
            .frequency_days(7u32)
            .folder_names(vec!["Scans".to_string()])
            .build();
        assert!(config.is_ok());
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
        assert_eq!(normalize_path(Path::new("/../a")), PathBuf::from("/a"));
        assert_eq!(normalize_path(Path::new("../a/..")), PathBuf::from(".."));
        assert!(normalize_path(Path::new("/data/x/../shared")).starts_with("/data"));
        assert!(!Path::new("/data/ab").starts_with("/data/a"));
    }

    #[test]
    fn test_builder_rejects_escaping_folder_name() {
        let result = SweepConfig::builder()
            .root_path("/srv/root")
            .archive_path("/srv/archive")
            .frequency_days(7u32)
            .folder_names(vec!["../etc".to_string()])
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_from_pairs() {
        let config = SweepConfig::from_pairs(base_pairs()).unwrap();
        assert_eq!(config.root_path, PathBuf::from("/data/shared"));
        assert_eq!(config.archive_path, PathBuf::from("/data/archive"));
        assert_eq!(config.frequency_days, 30);
        assert_eq!(config.folder_names, vec!["Reports", "Scans", "Exports"]);
        assert_eq!(config.interval(), Duration::from_secs(30 * 86_400));
    }

    #[test]
    fn test_folder_paths_keep_order() {
        let config = SweepConfig::from_pairs(base_pairs()).unwrap();
        let paths: Vec<PathBuf> = config.folder_paths().collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/data/shared/Reports"),
                PathBuf::from("/data/shared/Scans"),
                PathBuf::from("/data/shared/Exports"),
            ]
        );
    }

    #[test]
    fn test_missing_key() {
        let pairs: Vec<_> = base_pairs()
            .into_iter()
            .filter(|(k, _)| *k != keys::TEMP_PATH)
            .collect();
        let err = SweepConfig::from_pairs(pairs).unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey { key } if key == keys::TEMP_PATH));
    }

    #[test]
    fn test_invalid_frequency() {
        for bad in ["abc", "-3", "0", ""] {
            let mut pairs = base_pairs();
            pairs[2] = (keys::DELETION_FREQUENCY_DAYS, bad);
            let err = SweepConfig::from_pairs(pairs).unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidValue { key, .. } if key == keys::DELETION_FREQUENCY_DAYS),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_optional_keys() {
        let mut pairs = base_pairs();
        pairs.push((keys::ARCHIVE_LAYOUT, "Mirrored"));
        pairs.push((keys::DRY_RUN, "TRUE"));
        let config = SweepConfig::from_pairs(pairs).unwrap();
        assert_eq!(config.layout, ArchiveLayout::Mirrored);
        assert!(config.dry_run);

        let mut pairs = base_pairs();
        pairs.push((keys::ARCHIVE_LAYOUT, "nested"));
        assert!(SweepConfig::from_pairs(pairs).is_err());
    }

    #[test]
    fn test_empty_folder_list_is_invalid() {
        let mut pairs = base_pairs();
        pairs[3] = (keys::FOLDER_NAMES, " , ");
        let err = SweepConfig::from_pairs(pairs).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_serde_roundtrip() {
        let config = SweepConfig::from_pairs(base_pairs()).unwrap();
        let serialized = serde_json::to_string(&config).unwrap();
        let deserialized: SweepConfig = serde_json::from_str(&serialized).unwrap();

        assert_eq!(config.root_path, deserialized.root_path);
        assert_eq!(config.folder_names, deserialized.folder_names);
        assert_eq!(config.layout, deserialized.layout);
    }
}
