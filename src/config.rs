use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DevstrapError, Result};

/// Environment variable that points at a config file.
pub const CONFIG_ENV: &str = "DEVSTRAP_CONFIG";

/// System-wide config location, used when present.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/devstrap/config.yaml";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProvisionConfig {
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Base packages installed with the OS package manager
    #[serde(default = "default_packages")]
    pub packages: Vec<String>,
    #[serde(default = "default_log_file")]
    pub log_file: String,
    /// Shell config that receives the nvm init lines
    #[serde(default = "default_profile_path")]
    pub profile_path: String,
    #[serde(default)]
    pub nvm: NvmConfig,
    #[serde(default)]
    pub node: NodeConfig,
    #[serde(default = "default_true")]
    pub yarn: bool,
    #[serde(default)]
    pub php: PhpConfig,
    #[serde(default = "default_true")]
    pub composer: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NvmConfig {
    /// Release tag of the nvm installer script
    #[serde(default = "default_nvm_version")]
    pub version: String,
    /// Exported as NVM_DIR
    #[serde(default = "default_nvm_dir")]
    pub dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeConfig {
    /// Anything `nvm install` accepts ("20", "lts/iron", "v22.11.0")
    #[serde(default = "default_node_version")]
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PhpConfig {
    /// Versioned package prefix, e.g. "8.3" gives php8.3-*. Empty uses the
    /// distribution's unversioned php-* packages.
    #[serde(default = "default_php_version")]
    pub version: String,
    #[serde(default = "default_php_extensions")]
    pub extensions: Vec<String>,
}

fn default_true() -> bool {
    true
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_packages() -> Vec<String> {
    [
        "vim",
        "nano",
        "git",
        "curl",
        "wget",
        "unzip",
        "zip",
        "ca-certificates",
        "build-essential",
        "software-properties-common",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_log_file() -> String {
    "/var/log/devstrap.log".to_string()
}

fn default_profile_path() -> String {
    "/etc/bash.bashrc".to_string()
}

fn default_nvm_version() -> String {
    "v0.39.7".to_string()
}

fn default_nvm_dir() -> String {
    "/usr/local/nvm".to_string()
}

fn default_node_version() -> String {
    "20".to_string()
}

fn default_php_version() -> String {
    "8.3".to_string()
}

fn default_php_extensions() -> Vec<String> {
    ["cli", "mbstring", "xml", "curl", "zip", "mysql"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for NvmConfig {
    fn default() -> Self {
        Self {
            version: default_nvm_version(),
            dir: default_nvm_dir(),
        }
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            version: default_node_version(),
        }
    }
}

impl Default for PhpConfig {
    fn default() -> Self {
        Self {
            version: default_php_version(),
            extensions: default_php_extensions(),
        }
    }
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            packages: default_packages(),
            log_file: default_log_file(),
            profile_path: default_profile_path(),
            nvm: NvmConfig::default(),
            node: NodeConfig::default(),
            yarn: true,
            php: PhpConfig::default(),
            composer: true,
        }
    }
}

impl ProvisionConfig {
    /// Pick the config file to read.
    ///
    /// An explicit path wins, then `$DEVSTRAP_CONFIG`, then the system file if
    /// it exists. `None` means built-in defaults.
    pub fn resolve_path(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(expand(&path.to_string_lossy()));
        }

        if let Ok(path) = std::env::var(CONFIG_ENV) {
            if !path.trim().is_empty() {
                return Some(expand(&path));
            }
        }

        let system = PathBuf::from(SYSTEM_CONFIG_PATH);
        system.exists().then_some(system)
    }

    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match Self::resolve_path(explicit) {
            Some(path) => Self::load_from(&path),
            None => {
                tracing::debug!("No config file found, using built-in defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(DevstrapError::Config(format!(
                "Config file not found: {}. Run 'devstrap config init' first.",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        let config: ProvisionConfig = if content.trim().is_empty() {
            ProvisionConfig::default()
        } else {
            serde_yaml::from_str(&content)
                .map_err(|e| DevstrapError::Config(format!("Invalid config: {}", e)))?
        };

        tracing::debug!("Loaded config from {}", path.display());
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let content = serde_yaml::to_string(self)
            .map_err(|e| DevstrapError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(path)?.permissions();
            perms.set_mode(0o644);
            std::fs::set_permissions(path, perms)?;
        }

        Ok(())
    }

    /// Validate the configuration.
    ///
    /// Every value here ends up inside a shell script, so only plain tokens
    /// are accepted.
    pub fn validate(&self) -> Result<()> {
        let timezone = regex("^[A-Za-z0-9_+-]+(/[A-Za-z0-9_+-]+)*$")?;
        if !timezone.is_match(&self.timezone) {
            return Err(DevstrapError::Config(format!(
                "Invalid timezone '{}'. Use a zoneinfo name like 'UTC' or 'Europe/Berlin'",
                self.timezone
            )));
        }

        let package = regex("^[a-z0-9][a-z0-9+.-]*$")?;
        if let Some(bad) = self.packages.iter().find(|p| !package.is_match(p)) {
            return Err(DevstrapError::Config(format!("Invalid package name '{}'", bad)));
        }

        let ext = regex("^[a-z0-9][a-z0-9+.-]*$")?;
        if let Some(bad) = self.php.extensions.iter().find(|e| !ext.is_match(e)) {
            return Err(DevstrapError::Config(format!("Invalid PHP extension '{}'", bad)));
        }

        let version = regex("^[A-Za-z0-9._/-]+$")?;
        for (field, value) in [
            ("nvm.version", &self.nvm.version),
            ("node.version", &self.node.version),
        ] {
            if !version.is_match(value) {
                return Err(DevstrapError::Config(format!("Invalid {} '{}'", field, value)));
            }
        }

        let php_version = regex("^[0-9]+(\\.[0-9]+)*$")?;
        if !self.php.version.is_empty() && !php_version.is_match(&self.php.version) {
            return Err(DevstrapError::Config(format!(
                "Invalid php.version '{}'. Use a number like '8.3' or leave it empty",
                self.php.version
            )));
        }

        let path = regex("^[A-Za-z0-9_./~-]+$")?;
        for (field, value) in [
            ("nvm.dir", &self.nvm.dir),
            ("log_file", &self.log_file),
            ("profile_path", &self.profile_path),
        ] {
            if !path.is_match(value) {
                return Err(DevstrapError::Config(format!("Invalid {} '{}'", field, value)));
            }
        }

        Ok(())
    }

    pub fn log_path(&self) -> PathBuf {
        expand(&self.log_file)
    }

    pub fn profile_path(&self) -> PathBuf {
        expand(&self.profile_path)
    }

    pub fn nvm_dir(&self) -> String {
        shellexpand::tilde(&self.nvm.dir).to_string()
    }

    /// Package names for PHP and its extensions.
    pub fn php_packages(&self) -> Vec<String> {
        let prefix = format!("php{}", self.php.version);
        std::iter::once(prefix.clone())
            .chain(
                self.php
                    .extensions
                    .iter()
                    .map(|ext| format!("{}-{}", prefix, ext)),
            )
            .collect()
    }
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).to_string())
}

fn regex(pattern: &str) -> Result<regex_lite::Regex> {
    regex_lite::Regex::new(pattern)
        .map_err(|e| DevstrapError::Config(format!("Bad validation pattern: {}", e)))
}
