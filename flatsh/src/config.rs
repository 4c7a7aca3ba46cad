// SPDX-License-Identifier: MIT

use serde::Deserialize;
use std::fs;
use std::path::Path;

use flatfs::flat::*;

/// Volume settings read from an optional TOML file.
///
/// ```toml
/// [volume]
/// block_size = 4096
/// total_blocks = 256
/// capacity = 128
///
/// [options]
/// overwrite = "reclaim"   # or "leak"
/// full_format = true
/// ```
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub volume: VolumeConfig,
    pub options: OptionsConfig,
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct VolumeConfig {
    pub block_size: u32,
    pub total_blocks: u32,
    pub capacity: u32,
}

impl Default for VolumeConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            total_blocks: DEFAULT_TOTAL_BLOCKS,
            capacity: DEFAULT_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OverwriteMode {
    #[default]
    Reclaim,
    Leak,
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct OptionsConfig {
    pub overwrite: OverwriteMode,
    pub full_format: bool,
}

impl Default for OptionsConfig {
    fn default() -> Self {
        Self {
            overwrite: OverwriteMode::Reclaim,
            full_format: true,
        }
    }
}

impl Config {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn meta(&self) -> anyhow::Result<FlatMeta> {
        let v = &self.volume;
        FlatMeta::new(v.block_size, v.total_blocks, v.capacity)
            .map_err(|e| anyhow::anyhow!("Invalid volume geometry: {e}"))
    }

    pub fn fs_options(&self) -> FlatOptions {
        FlatOptions {
            overwrite: match self.options.overwrite {
                OverwriteMode::Reclaim => OverwritePolicy::Reclaim,
                OverwriteMode::Leak => OverwritePolicy::Leak,
            },
            full_format: self.options.full_format,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = Config::from_toml("").unwrap();
        assert_eq!(cfg, Config::default());
        let meta = cfg.meta().unwrap();
        assert_eq!(meta.block_size, DEFAULT_BLOCK_SIZE);
        assert_eq!(cfg.fs_options(), FlatOptions::default());
    }

    #[test]
    fn parses_both_sections() {
        let cfg = Config::from_toml(
            r#"
            [volume]
            block_size = 64
            total_blocks = 16
            capacity = 4

            [options]
            overwrite = "leak"
            full_format = false
            "#,
        )
        .unwrap();
        assert_eq!(cfg.meta().unwrap(), FlatMeta::new(64, 16, 4).unwrap());
        assert_eq!(cfg.fs_options().overwrite, OverwritePolicy::Leak);
        assert!(!cfg.fs_options().full_format);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(Config::from_toml("[volume]\nblock_sise = 1").is_err());
        assert!(Config::from_toml("[options]\noverwrite = \"never\"").is_err());

        let zero = Config::from_toml("[volume]\nblock_size = 0").unwrap();
        assert!(zero.meta().is_err());
    }

    #[test]
    fn reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("volume.toml");
        std::fs::write(&path, "[volume]\ncapacity = 8\n").unwrap();
        let cfg = Config::from_file(&path).unwrap();
        assert_eq!(cfg.volume.capacity, 8);
        assert_eq!(cfg.volume.total_blocks, DEFAULT_TOTAL_BLOCKS);
    }
}
