use crate::filesystem::Compression;
use serde::Deserialize;

#[derive(Clone, Copy, Deserialize, Debug, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotCompression {
    #[default]
    None,
    Zstd,
}

impl From<SnapshotCompression> for Compression {
    fn from(value: SnapshotCompression) -> Self {
        match value {
            SnapshotCompression::None => Compression::None,
            SnapshotCompression::Zstd => Compression::Zstd(1),
        }
    }
}

#[derive(Clone, Deserialize, Debug, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
#[serde(tag = "type")]
pub enum StoreConfig {
    #[default]
    Memory,
    Filesystem {
        base_dir: String,
        #[serde(default = "default_filename")]
        filename: String,
        #[serde(default)]
        compression: SnapshotCompression,
    },
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("segment_store.base_dir cannot be empty")]
    EmptyBaseDir,
    #[error("segment_store.filename cannot be empty")]
    EmptyFilename,
}

impl StoreConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let StoreConfig::Filesystem {
            base_dir, filename, ..
        } = self
        {
            if base_dir.trim().is_empty() {
                return Err(ValidationError::EmptyBaseDir);
            }
            if filename.trim().is_empty() {
                return Err(ValidationError::EmptyFilename);
            }
        }
        Ok(())
    }
}

fn default_filename() -> String {
    "segment_groups.json".into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let config: StoreConfig = serde_yaml::from_str(
            r#"
            type: filesystem
            base_dir: /var/lib/console
            compression: zstd
            "#,
        )
        .unwrap();
        assert_eq!(
            config,
            StoreConfig::Filesystem {
                base_dir: "/var/lib/console".into(),
                filename: "segment_groups.json".into(),
                compression: SnapshotCompression::Zstd,
            }
        );
        assert!(config.validate().is_ok());

        let config: StoreConfig = serde_yaml::from_str("type: memory").unwrap();
        assert_eq!(config, StoreConfig::Memory);

        assert!(serde_yaml::from_str::<StoreConfig>("type: gcs").is_err());
    }

    #[test]
    fn test_validate() {
        let config = StoreConfig::Filesystem {
            base_dir: "".into(),
            filename: "x".into(),
            compression: SnapshotCompression::None,
        };
        assert_eq!(config.validate(), Err(ValidationError::EmptyBaseDir));
    }
}
