use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use directories::BaseDirs;
use serde::Deserialize;

const CONFIG_FILE_NAME: &str = "config.toml";
const TILES_FILE_NAME: &str = "tiles.json";
const APP_NAME: &str = "qtiles";

#[derive(Debug, Clone)]
pub struct Config {
    /// Path the configuration was loaded from, `None` when running on
    /// defaults without a file.
    pub config_path: Option<PathBuf>,
    /// Location of the persisted tile list.
    pub tiles_path: PathBuf,
    pub keys: Keys,
    pub commands: Commands,
}

impl Config {
    /// Built-in defaults, used when no configuration file exists.
    pub fn defaults() -> Result<Self> {
        Ok(Self {
            config_path: None,
            tiles_path: default_tiles_path()?,
            keys: Keys::default(),
            commands: Commands::default(),
        })
    }
}

// =============================================================================
// Commands config
// =============================================================================

#[derive(Debug, Clone)]
pub struct Commands {
    /// Program used to open the rewritten search URL.
    pub open: CommandExec,
}

#[derive(Debug, Clone)]
pub struct CommandExec {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for Commands {
    fn default() -> Self {
        Self {
            open: default_opener(),
        }
    }
}

#[cfg(target_os = "macos")]
fn default_opener() -> CommandExec {
    CommandExec {
        program: "open".to_string(),
        args: Vec::new(),
    }
}

#[cfg(not(target_os = "macos"))]
fn default_opener() -> CommandExec {
    CommandExec {
        program: "xdg-open".to_string(),
        args: Vec::new(),
    }
}

// =============================================================================
// Key Bindings - context-aware with multiple bindings per action
// =============================================================================

/// All key bindings organized by context
#[derive(Debug, Clone, Default)]
pub struct Keys {
    /// Keys that work anywhere outside a modal
    pub global: GlobalKeys,
    /// Keys for moving through the form and the tile row
    pub form: FormKeys,
    /// Keys inside the option and help popups
    pub modal: ModalKeys,
}

#[derive(Debug, Clone)]
pub struct GlobalKeys {
    pub quit: Vec<String>,
    pub apply: Vec<String>,
    pub reset: Vec<String>,
    pub help: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct FormKeys {
    pub next: Vec<String>,
    pub prev: Vec<String>,
    pub confirm: Vec<String>,
    pub remove: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ModalKeys {
    pub cancel: Vec<String>,
    pub confirm: Vec<String>,
    pub next: Vec<String>,
    pub prev: Vec<String>,
}

impl Default for GlobalKeys {
    fn default() -> Self {
        Self {
            quit: vec!["Escape".into()],
            apply: vec!["F2".into()],
            reset: vec!["F5".into()],
            help: vec!["F1".into()],
        }
    }
}

impl Default for FormKeys {
    fn default() -> Self {
        Self {
            next: vec!["Tab".into(), "Down".into()],
            prev: vec!["Backtab".into(), "Up".into()],
            confirm: vec!["Enter".into()],
            remove: vec!["Delete".into(), "x".into()],
        }
    }
}

impl Default for ModalKeys {
    fn default() -> Self {
        Self {
            cancel: vec!["Escape".into(), "q".into()],
            confirm: vec!["Enter".into()],
            next: vec!["j".into(), "Down".into(), "Tab".into()],
            prev: vec!["k".into(), "Up".into(), "Backtab".into()],
        }
    }
}

// =============================================================================
// Serde deserialization types (support both single string and array)
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum KeyBinding {
    Single(String),
    Multiple(Vec<String>),
}

impl KeyBinding {
    fn into_vec(self) -> Vec<String> {
        match self {
            KeyBinding::Single(s) => vec![s],
            KeyBinding::Multiple(v) => v,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct KeysFile {
    global: GlobalKeysFile,
    form: FormKeysFile,
    modal: ModalKeysFile,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct GlobalKeysFile {
    quit: KeyBinding,
    apply: KeyBinding,
    reset: KeyBinding,
    help: KeyBinding,
}

impl Default for GlobalKeysFile {
    fn default() -> Self {
        let defaults = GlobalKeys::default();
        Self {
            quit: KeyBinding::Multiple(defaults.quit),
            apply: KeyBinding::Multiple(defaults.apply),
            reset: KeyBinding::Multiple(defaults.reset),
            help: KeyBinding::Multiple(defaults.help),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct FormKeysFile {
    next: KeyBinding,
    prev: KeyBinding,
    confirm: KeyBinding,
    remove: KeyBinding,
}

impl Default for FormKeysFile {
    fn default() -> Self {
        let defaults = FormKeys::default();
        Self {
            next: KeyBinding::Multiple(defaults.next),
            prev: KeyBinding::Multiple(defaults.prev),
            confirm: KeyBinding::Multiple(defaults.confirm),
            remove: KeyBinding::Multiple(defaults.remove),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct ModalKeysFile {
    cancel: KeyBinding,
    confirm: KeyBinding,
    next: KeyBinding,
    prev: KeyBinding,
}

impl Default for ModalKeysFile {
    fn default() -> Self {
        let defaults = ModalKeys::default();
        Self {
            cancel: KeyBinding::Multiple(defaults.cancel),
            confirm: KeyBinding::Multiple(defaults.confirm),
            next: KeyBinding::Multiple(defaults.next),
            prev: KeyBinding::Multiple(defaults.prev),
        }
    }
}

impl From<KeysFile> for Keys {
    fn from(file: KeysFile) -> Self {
        Self {
            global: GlobalKeys {
                quit: file.global.quit.into_vec(),
                apply: file.global.apply.into_vec(),
                reset: file.global.reset.into_vec(),
                help: file.global.help.into_vec(),
            },
            form: FormKeys {
                next: file.form.next.into_vec(),
                prev: file.form.prev.into_vec(),
                confirm: file.form.confirm.into_vec(),
                remove: file.form.remove.into_vec(),
            },
            modal: ModalKeys {
                cancel: file.modal.cancel.into_vec(),
                confirm: file.modal.confirm.into_vec(),
                next: file.modal.next.into_vec(),
                prev: file.modal.prev.into_vec(),
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct CommandsFile {
    open: Option<CommandDef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum CommandDef {
    Simple(String),
    List(Vec<String>),
}

impl From<CommandsFile> for Commands {
    fn from(file: CommandsFile) -> Self {
        Self {
            open: file
                .open
                .and_then(CommandExec::from_def)
                .unwrap_or_else(default_opener),
        }
    }
}

impl CommandExec {
    fn from_def(def: CommandDef) -> Option<Self> {
        match def {
            CommandDef::Simple(cmd) => {
                let trimmed = cmd.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(Self {
                        program: trimmed.to_string(),
                        args: Vec::new(),
                    })
                }
            }
            CommandDef::List(mut parts) => {
                if parts.is_empty() {
                    return None;
                }
                let program = parts.remove(0);
                Some(Self {
                    program,
                    args: parts,
                })
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    tiles_path: Option<PathBuf>,
    keys: KeysFile,
    commands: CommandsFile,
}

// =============================================================================
// Paths
// =============================================================================

/// Expand ~ to home directory in paths
fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = home::home_dir() {
            return home.join(stripped);
        }
    }
    path.to_path_buf()
}

fn config_root() -> Result<PathBuf> {
    let base = BaseDirs::new().context("unable to determine base directories")?;
    Ok(base.config_dir().join(APP_NAME))
}

pub fn config_path() -> Result<PathBuf> {
    Ok(config_root()?.join(CONFIG_FILE_NAME))
}

fn default_tiles_path() -> Result<PathBuf> {
    let base = BaseDirs::new().context("unable to determine base directories")?;
    Ok(base.data_dir().join(APP_NAME).join(TILES_FILE_NAME))
}

// =============================================================================
// Loading
// =============================================================================

/// Load configuration. An explicit path must exist; the implicit default
/// path falls back to built-in defaults when no file is present.
pub fn load(explicit: Option<&Path>) -> Result<Config> {
    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                bail!("configuration file not found at {}", path.display());
            }
            path.to_path_buf()
        }
        None => {
            let path = config_path()?;
            if !path.exists() {
                return Config::defaults();
            }
            path
        }
    };

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read configuration file at {}", path.display()))?;

    let value: toml::Value = toml::from_str(&raw)
        .with_context(|| format!("failed to parse {} as TOML", path.display()))?;

    warn_unknown_keys(&value);

    let cfg_file: ConfigFile = value
        .try_into()
        .with_context(|| format!("failed to deserialize config from {}", path.display()))?;

    let tiles_path = match cfg_file.tiles_path {
        Some(ref configured) => expand_tilde(configured),
        None => default_tiles_path()?,
    };

    let keys: Keys = cfg_file.keys.into();
    validate_key_bindings(&keys)?;

    Ok(Config {
        config_path: Some(path),
        tiles_path,
        keys,
        commands: cfg_file.commands.into(),
    })
}

// =============================================================================
// Unknown key warnings
// =============================================================================

fn warn_unknown_keys(value: &toml::Value) {
    let Some(table) = value.as_table() else {
        return;
    };

    let known = HashSet::from(["tiles_path", "keys", "commands"]);
    for key in table.keys() {
        if !known.contains(key.as_str()) {
            log::warn!("unknown configuration key `{key}`");
        }
    }

    if let Some(keys_val) = table.get("keys") {
        warn_unknown_keys_section(keys_val);
    }
}

fn warn_unknown_keys_section(value: &toml::Value) {
    let Some(table) = value.as_table() else {
        return;
    };

    let known_sections: HashMap<&str, HashSet<&str>> = HashMap::from([
        ("global", HashSet::from(["quit", "apply", "reset", "help"])),
        (
            "form",
            HashSet::from(["next", "prev", "confirm", "remove"]),
        ),
        (
            "modal",
            HashSet::from(["cancel", "confirm", "next", "prev"]),
        ),
    ]);

    for (section, section_val) in table {
        let Some(known) = known_sections.get(section.as_str()) else {
            log::warn!("unknown key binding section `keys.{section}`");
            continue;
        };
        let Some(section_table) = section_val.as_table() else {
            continue;
        };
        for action in section_table.keys() {
            if !known.contains(action.as_str()) {
                log::warn!("unknown key binding `keys.{section}.{action}`");
            }
        }
    }
}

// =============================================================================
// Key binding validation
// =============================================================================

/// Reject a binding assigned to two actions that are live at the same time.
/// Global and form bindings share a context; modal bindings are their own.
fn validate_key_bindings(keys: &Keys) -> Result<()> {
    let form_context: [(&str, &[String]); 8] = [
        ("global.quit", &keys.global.quit),
        ("global.apply", &keys.global.apply),
        ("global.reset", &keys.global.reset),
        ("global.help", &keys.global.help),
        ("form.next", &keys.form.next),
        ("form.prev", &keys.form.prev),
        ("form.confirm", &keys.form.confirm),
        ("form.remove", &keys.form.remove),
    ];
    check_collisions(&form_context)?;

    let modal_context: [(&str, &[String]); 4] = [
        ("modal.cancel", &keys.modal.cancel),
        ("modal.confirm", &keys.modal.confirm),
        ("modal.next", &keys.modal.next),
        ("modal.prev", &keys.modal.prev),
    ];
    check_collisions(&modal_context)
}

fn check_collisions(actions: &[(&str, &[String])]) -> Result<()> {
    let mut seen: HashMap<String, &str> = HashMap::new();
    for (action, bindings) in actions.iter().copied() {
        for binding in bindings {
            let normalized = binding.trim().to_ascii_lowercase();
            if normalized.is_empty() {
                continue;
            }
            if let Some(previous) = seen.insert(normalized, action) {
                bail!(
                    "key `{}` is bound to both `{}` and `{}`",
                    binding,
                    previous,
                    action
                );
            }
        }
    }
    Ok(())
}
