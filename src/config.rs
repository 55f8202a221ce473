use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Defaults that can be persisted in a flag file.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub json: bool,
    pub verbose: bool,
    pub sandbox_dir: Option<PathBuf>,
}

impl ConfigFlags {
    pub fn union(&self, other: &Self) -> Self {
        Self {
            json: self.json || other.json,
            verbose: self.verbose || other.verbose,
            sandbox_dir: other
                .sandbox_dir
                .clone()
                .or_else(|| self.sandbox_dir.clone()),
        }
    }
}

fn home_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        if let Some(profile) = std::env::var_os("USERPROFILE") {
            return Some(PathBuf::from(profile));
        }
    }
    std::env::var_os("HOME").map(PathBuf::from)
}

pub fn global_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("codepane").join("config");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = home_dir() {
            return home
                .join("Library")
                .join("Application Support")
                .join("codepane")
                .join("config");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("codepane").join("config");
        }
        if let Some(home) = home_dir() {
            return home.join(".config").join("codepane").join("config");
        }
    }

    local_override_path()
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(".codepanerc")
}

/// Directory offered when saving a document that has no file yet.
pub fn default_sandbox_dir() -> PathBuf {
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".codepane")
        .join("sandbox")
        .join("sources")
}

pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(line_tokens)
        .collect::<Vec<_>>();
    Ok(parse_flag_tokens(&tokens))
}

/// Split a flag-file line into tokens. A path option takes the rest of the
/// line as its value so paths may contain spaces.
fn line_tokens(line: &str) -> Vec<String> {
    if let Some(rest) = line.strip_prefix("--sandbox-dir")
        && rest.starts_with(char::is_whitespace)
    {
        return vec!["--sandbox-dir".to_string(), rest.trim().to_string()];
    }
    if line.starts_with("--sandbox-dir=") {
        return vec![line.to_string()];
    }
    line.split_whitespace().map(ToOwned::to_owned).collect()
}

pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = vec!["# codepane defaults (saved with --save)".to_string()];
    if flags.json {
        lines.push("--json".to_string());
    }
    if flags.verbose {
        lines.push("--verbose".to_string());
    }
    if let Some(dir) = &flags.sandbox_dir {
        lines.push(format!("--sandbox-dir {}", dir.display()));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        match token {
            "--json" => flags.json = true,
            "--verbose" | "-v" => flags.verbose = true,
            "--sandbox-dir" => {
                if let Some(next) = tokens.get(i + 1) {
                    flags.sandbox_dir = Some(PathBuf::from(next));
                    i += 1;
                }
            }
            _ => {
                if let Some(value) = token.strip_prefix("--sandbox-dir=") {
                    flags.sandbox_dir = Some(PathBuf::from(value));
                }
            }
        }
        i += 1;
    }
    flags
}
