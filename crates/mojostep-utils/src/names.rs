//! Module-name normalization helpers.
//!
//! The host debugger reports module names inconsistently: sometimes with the
//! `.dll` extension, sometimes without, and with arbitrary casing. The hooking
//! engine keys its state on normalized names so that `Chrome`, `chrome` and
//! `chrome.dll` all refer to the same module.

/// Append `.dll` when the name carries no extension.
#[must_use]
pub fn ensure_dll_extension(name: &str) -> String
{
    let lower = name.to_ascii_lowercase();
    if lower.ends_with(".dll") {
        lower
    } else {
        format!("{lower}.dll")
    }
}

/// Remove the extension from a file name, leaving directory-like dots alone.
#[must_use]
pub fn strip_file_extension(filename: &str) -> &str
{
    let Some(last_dot) = filename.rfind('.') else {
        return filename;
    };
    // A leading dot is a hidden file, not an extension
    if last_dot == 0 {
        return filename;
    }
    // A separator after the last dot means the dot belongs to a directory name
    if let Some(last_sep) = filename.rfind(['/', '\\']) {
        if last_sep > last_dot {
            return filename;
        }
    }
    &filename[..last_dot]
}

/// Case-insensitive substring test.
#[must_use]
pub fn contains_ci(haystack: &str, needle: &str) -> bool
{
    if needle.is_empty() {
        return true;
    }
    haystack.to_ascii_lowercase().contains(&needle.to_ascii_lowercase())
}
