//! Current source position as reported by the host.

/// Source file and line for the current instruction pointer.
///
/// Recomputed on every query; the stepping machinery never caches it because
/// every step can land in a different translation unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceInfo
{
    /// File name without any directory components (e.g. `widget.mojom.cc`).
    pub file_name: String,
    /// Directory portion of the path, if the host reported one.
    pub file_path: String,
    /// 1-based line number.
    pub line: u32,
}

impl SourceInfo
{
    /// Build a `SourceInfo` from a full path, splitting off the file name.
    #[must_use]
    pub fn from_full_path(full_path: &str, line: u32) -> Self
    {
        match full_path.rfind(['/', '\\']) {
            Some(last_sep) => Self {
                file_name: full_path[last_sep + 1..].to_string(),
                file_path: full_path[..last_sep].to_string(),
                line,
            },
            None => Self {
                file_name: full_path.to_string(),
                file_path: String::new(),
                line,
            },
        }
    }

    /// True when the file name carries the given suffix (e.g. `.mojom.cc`).
    #[must_use]
    pub fn file_name_ends_with(&self, suffix: &str) -> bool
    {
        self.file_name.ends_with(suffix)
    }
}
