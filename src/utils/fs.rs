//! Filesystem utilities.

use std::path::Path;

/// File name without its extension, or the whole path when there is none.
pub fn file_stem_string(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_stem_string_strips_extension() {
        assert_eq!(file_stem_string(Path::new("/a/b/sess-1.jsonl")), "sess-1");
    }

    #[test]
    fn file_stem_string_keeps_dotted_ids() {
        assert_eq!(file_stem_string(Path::new("agent.v2.jsonl")), "agent.v2");
    }
}
