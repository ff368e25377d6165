// src/platform.rs

//! Platform-family differences that strategies and callers need to know.

use std::path::PathBuf;

pub fn is_windows() -> bool {
    cfg!(windows)
}

pub fn is_unix() -> bool {
    !is_windows()
}

/// Name of the executable search path variable.
pub fn path_key() -> &'static str {
    if is_windows() { "Path" } else { "PATH" }
}

/// Separator between entries of the search path variable.
pub fn path_separator() -> char {
    if is_windows() { ';' } else { ':' }
}

pub fn line_separator() -> &'static str {
    if is_windows() { "\r\n" } else { "\n" }
}

/// The null device, usable as a redirect target that discards output.
pub fn dev_null() -> PathBuf {
    if is_windows() {
        PathBuf::from("nul")
    } else {
        PathBuf::from("/dev/null")
    }
}
