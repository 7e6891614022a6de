use camino::Utf8Path;
use indexmap::IndexSet;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Directory names excluded from every scan by default
pub const DEFAULT_EXCLUDED_DIR_NAMES: [&str; 3] = [".git", "node_modules", "steamapps"];

/// Persisted settings from `config.json`
///
/// The core only loads, saves and seeds this structure. Everything except
/// `shortCutEnd` is consumed by the external search engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Fraction of available CPU threads the search engine may use (0-1)
    #[serde(rename = "maxCPUThreadPercentage")]
    pub max_cpu_thread_percentage: f64,

    /// Key that completes the in-app shortcut; not wired to the global hotkey
    pub short_cut_end: String,

    /// Seconds between rebuilds of the default-directory cache
    pub default_dirs_cache_update_time: u64,

    /// Seconds between rebuilds of the extended-directory cache
    pub extended_dirs_cache_update_time: u64,

    pub default_dirs: Vec<String>,
    pub extended_dirs: Vec<String>,
    pub exclude_from_default_dirs: Rules,
    pub exclude_dirs: Rules,
}

impl Config {
    /// Build the canonical default configuration for the given home directory.
    pub fn default_for_home(home: &Utf8Path) -> Self {
        let home = home.as_str().trim_end_matches(['/', '\\']);

        let mut exclude_from_default_dirs = Rules::default();
        exclude_from_default_dirs
            .regex
            .insert(home_dotfile_pattern(home));

        let mut exclude_dirs = Rules::default();
        exclude_dirs
            .name
            .extend(DEFAULT_EXCLUDED_DIR_NAMES.iter().map(|name| name.to_string()));

        Self {
            max_cpu_thread_percentage: 0.25,
            short_cut_end: "space".to_string(),
            default_dirs_cache_update_time: 30,
            extended_dirs_cache_update_time: 600,
            default_dirs: vec![format!("{home}/")],
            extended_dirs: vec![platform_root().to_string()],
            exclude_from_default_dirs,
            exclude_dirs,
        }
    }

    /// Number of worker threads the search engine may use out of `available`.
    ///
    /// Always rounds up and never returns less than one thread.
    pub fn thread_budget(&self, available: usize) -> usize {
        let available = available.max(1);
        let fraction = self.max_cpu_thread_percentage.clamp(0.0, 1.0);
        let budget = (available as f64 * fraction).ceil() as usize;
        budget.clamp(1, available)
    }
}

/// Regex matching dotfiles and dot-directories directly under `home`
fn home_dotfile_pattern(home: &str) -> String {
    format!(r"^{}[/\\]\.[^/\\]+[/\\]?$", regex::escape(home))
}

fn platform_root() -> &'static str {
    if cfg!(windows) { "C:\\" } else { "/" }
}

/// Exclusion rules for a directory scan
///
/// An entry is excluded when it matches any rule in any of the three sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rules {
    /// Literal basenames
    #[serde(default)]
    pub name: IndexSet<String>,

    /// Literal path fragments
    #[serde(default)]
    pub path: IndexSet<String>,

    /// Regex patterns matched against the full path
    #[serde(default)]
    pub regex: IndexSet<String>,
}

impl Rules {
    /// Compile the regex set so the rules can be evaluated
    pub fn compile(&self) -> Result<CompiledRules, regex::Error> {
        let patterns = self
            .regex
            .iter()
            .map(|pattern| Regex::new(pattern))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CompiledRules {
            names: self.name.clone(),
            fragments: self.path.iter().cloned().collect(),
            patterns,
        })
    }
}

/// [`Rules`] with pre-compiled regex patterns
#[derive(Debug, Clone)]
pub struct CompiledRules {
    names: IndexSet<String>,
    fragments: Vec<String>,
    patterns: Vec<Regex>,
}

impl CompiledRules {
    pub fn is_excluded(&self, path: &Utf8Path) -> bool {
        if let Some(name) = path.file_name() {
            if self.names.contains(name) {
                return true;
            }
        }

        let full = path.as_str();
        self.fragments.iter().any(|fragment| full.contains(fragment.as_str()))
            || self.patterns.iter().any(|pattern| pattern.is_match(full))
    }
}
