//! Language tags derived from file extensions.

use std::path::Path;

/// Tag used when a path has no extension.
pub const PLAIN_TEXT: &str = "text";

/// Returns the language tag for `path`: its lowercased extension, or `text`.
///
/// Dotfiles such as `.gitignore` have no extension and map to `text`.
pub fn language_for_path(path: &str) -> String {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_else(|| PLAIN_TEXT.to_owned())
}

/// Human-readable language name used in assistant prompts.
pub fn display_name(tag: &str) -> &str {
    match tag {
        "rs" => "Rust",
        "py" => "Python",
        "js" | "mjs" | "cjs" | "jsx" => "JavaScript",
        "ts" | "tsx" => "TypeScript",
        "go" => "Go",
        "java" => "Java",
        "kt" => "Kotlin",
        "rb" => "Ruby",
        "php" => "PHP",
        "c" | "h" => "C",
        "cpp" | "cc" | "hpp" => "C++",
        "cs" => "C#",
        "swift" => "Swift",
        "md" => "Markdown",
        "json" => "JSON",
        "toml" => "TOML",
        "yml" | "yaml" => "YAML",
        "html" => "HTML",
        "css" => "CSS",
        "sh" => "Shell",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_or_text() {
        assert_eq!(language_for_path("README.md"), "md");
        assert_eq!(language_for_path("src/Lib.RS"), "rs");
        assert_eq!(language_for_path("Makefile"), "text");
        assert_eq!(language_for_path(".gitignore"), "text");
        assert_eq!(language_for_path("dir.v2/file"), "text");
    }
}
