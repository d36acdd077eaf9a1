use std::fmt;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures surfaced by the device layer.
///
/// Unresolvable uniform/attribute names are deliberately absent: they indicate
/// a shader/engine mismatch and abort the calling task instead.
#[derive(Debug)]
pub enum Error {
    /// The device library could not be initialized.
    Init(anyhow::Error),

    /// A process-wide context already exists.
    AlreadyInitialized,

    /// Handle allocation or post-creation validation failed.
    Creation {
        kind: &'static str,
        reason: String,
    },

    /// Shader compilation failed; carries the device diagnostic log.
    Compile(String),

    /// Program linking failed.
    Link(String),

    /// The device reported an error code after a pixel read-back.
    ReadPixels(u32),

    /// Pixel data does not cover the region it is written to.
    PixelData {
        needed: Option<usize>,
        len: usize,
    },

    /// The unit of work could not be handed to (or answered by) the device thread.
    Dispatch(String),
}

impl Error {
    pub(crate) fn creation(kind: &'static str, reason: impl Into<String>) -> Self {
        Self::Creation { kind, reason: reason.into() }
    }

    pub(crate) fn dispatch(reason: impl Into<String>) -> Self {
        Self::Dispatch(reason.into())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init(err) => write!(f, "gl: initializing error: {err:#}"),
            Self::AlreadyInitialized => f.write_str("gl: context is already initialized"),
            Self::Creation { kind, reason } => {
                write!(f, "gl: creating {kind} failed: {reason}")
            }
            Self::Compile(log) => write!(f, "gl: shader compile failed: {log}"),
            Self::Link(log) => write!(f, "gl: program link failed: {log}"),
            Self::ReadPixels(code) => write!(f, "gl: read pixels failed: error {code:#06x}"),
            Self::PixelData { needed: Some(needed), len } => {
                write!(f, "gl: region needs {needed} bytes of pixel data, got {len}")
            }
            Self::PixelData { needed: None, len } => {
                write!(f, "gl: invalid region for {len} bytes of pixel data")
            }
            Self::Dispatch(reason) => write!(f, "gl: dispatch failed: {reason}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Init(err) => Some(&**err),
            _ => None,
        }
    }
}
