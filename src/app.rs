//! Terminal application recognition
//!
//! Focus objects come from the host and may lack an application name, or
//! fail when asked for one. Every such failure classifies as `Unknown`
//! instead of propagating.

use thiserror::Error;
use tracing::debug;

/// Executable names treated as terminals, lowercase without `.exe`
const TERMINAL_APPS: &[&str] = &[
    "windowsterminal",
    "cmd",
    "powershell",
    "pwsh",
    "conhost",
    "openconsole",
    "wsl",
    "bash",
    "mintty",
    "putty",
    "kitty",
    "alacritty",
    "wezterm-gui",
    "tabby",
    "hyper",
    "cmder",
    "conemu",
    "conemu64",
];

/// Failure reading an attribute of a host object
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttributeError {
    #[error("attribute has an unexpected type")]
    TypeMismatch,

    #[error("attribute access failed: {0}")]
    Raised(String),
}

/// The application a focus object belongs to
pub trait AppModule {
    /// `Ok(None)` when the attribute does not exist
    fn app_name(&self) -> Result<Option<String>, AttributeError>;
}

/// A host object that can receive focus
pub trait FocusObject {
    fn app_module(&self) -> Option<&dyn AppModule>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AppClass {
    /// Known terminal, with its normalized name
    Terminal(String),
    Other(String),
    /// Name could not be read
    Unknown,
}

/// Normalized application name, or `None` if it cannot be determined
pub fn app_name(obj: Option<&dyn FocusObject>) -> Option<String> {
    let module = obj?.app_module()?;
    match module.app_name() {
        Ok(Some(name)) => Some(normalize(&name)),
        Ok(None) => {
            debug!("focus object has no application name");
            None
        }
        Err(err) => {
            debug!(error = %err, "could not read application name");
            None
        }
    }
}

pub fn classify(obj: Option<&dyn FocusObject>) -> AppClass {
    match app_name(obj) {
        Some(name) if TERMINAL_APPS.contains(&name.as_str()) => AppClass::Terminal(name),
        Some(name) => AppClass::Other(name),
        None => AppClass::Unknown,
    }
}

pub fn is_terminal_app(obj: Option<&dyn FocusObject>) -> bool {
    matches!(classify(obj), AppClass::Terminal(_))
}

fn normalize(name: &str) -> String {
    let lower = name.trim().to_lowercase();
    match lower.strip_suffix(".exe") {
        Some(stem) => stem.to_string(),
        None => lower,
    }
}
