use crate::core::config::ConfigError;

// Represents errors that can occur while running a soft input session.
//
// Errors are returned from the Rust API; the C ABI layer turns every one of
// them into a sentinel value after logging it.
#[derive(Debug)]
pub enum SoftInputError {
    /// The dialog template buffer of the given size could not be reserved.
    TemplateAllocation(usize),
    /// The dialog template would exceed the size the dialog manager accepts.
    TemplateTooLarge(usize),
    /// The owner window reference is null or no longer valid.
    NoOwnerWindow,
    /// The dialog thread ended before the dialog finished initialising.
    DialogStartFailed(String),
    /// The dialog thread could not be spawned.
    ThreadSpawn(String),
    /// A backend operation failed.
    Platform(String),
    /// An error originating from the Windows API.
    #[cfg(target_os = "windows")]
    Win32(windows::core::Error),
    Config(ConfigError),
    /// A file outside the configuration layer, such as the log file, could not be used.
    Io(std::io::Error),
    /// A global logger was already installed.
    Logging(log::SetLoggerError),
}

#[cfg(target_os = "windows")]
impl From<windows::core::Error> for SoftInputError {
    fn from(err: windows::core::Error) -> Self {
        SoftInputError::Win32(err)
    }
}

impl From<ConfigError> for SoftInputError {
    fn from(err: ConfigError) -> Self {
        SoftInputError::Config(err)
    }
}

impl From<log::SetLoggerError> for SoftInputError {
    fn from(err: log::SetLoggerError) -> Self {
        SoftInputError::Logging(err)
    }
}

impl From<std::io::Error> for SoftInputError {
    fn from(err: std::io::Error) -> Self {
        SoftInputError::Io(err)
    }
}

impl From<serde_json::Error> for SoftInputError {
    fn from(err: serde_json::Error) -> Self {
        SoftInputError::Config(ConfigError::Json(err))
    }
}

impl std::fmt::Display for SoftInputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SoftInputError::TemplateAllocation(size) => {
                write!(f, "Could not allocate a {size} byte dialog template")
            }
            SoftInputError::TemplateTooLarge(size) => {
                write!(f, "Dialog template of {size} bytes is too large")
            }
            SoftInputError::NoOwnerWindow => write!(f, "No valid owner window"),
            SoftInputError::DialogStartFailed(s) => write!(f, "Dialog start failed: {s}"),
            SoftInputError::ThreadSpawn(s) => write!(f, "Dialog thread spawn failed: {s}"),
            SoftInputError::Platform(s) => write!(f, "Platform operation failed: {s}"),
            #[cfg(target_os = "windows")]
            SoftInputError::Win32(e) => write!(f, "Win32 Error: {e}"),
            SoftInputError::Config(e) => write!(f, "{e}"),
            SoftInputError::Io(e) => write!(f, "I/O error: {e}"),
            SoftInputError::Logging(e) => write!(f, "Logger initialization failed: {e}"),
        }
    }
}

impl std::error::Error for SoftInputError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            #[cfg(target_os = "windows")]
            SoftInputError::Win32(e) => Some(e),
            SoftInputError::Config(e) => Some(e),
            SoftInputError::Io(e) => Some(e),
            SoftInputError::Logging(e) => Some(e),
            _ => None,
        }
    }
}

/// A specialized `Result` type for soft input operations.
pub type Result<T> = std::result::Result<T, SoftInputError>;
