use std::path::Path;
use tree_sitter::{Language as TreeSitterLanguage, Parser, Tree};

/// Language trait to define parsing behavior for the supported source languages
pub trait Language {
    /// Name of the language (e.g., "Solidity").
    fn name(&self) -> &str;

    /// Supported file extensions for this language.
    fn extensions(&self) -> &[&str];

    /// Returns the Tree-sitter language instance for this language.
    fn get_tree_sitter_language(&self) -> TreeSitterLanguage;

    /// Parses the provided source code into a Tree-sitter `Tree`.
    ///
    /// Returns `None` if the grammar cannot be loaded or parsing is aborted.
    fn parse(&self, source_code: &str) -> Option<Tree> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.get_tree_sitter_language())
            .ok()?;
        parser.parse(source_code, None)
    }
}

/// Solidity language implementation
pub struct Solidity;

impl Language for Solidity {
    fn name(&self) -> &str {
        "Solidity"
    }

    fn extensions(&self) -> &[&str] {
        &[".sol"]
    }

    fn get_tree_sitter_language(&self) -> TreeSitterLanguage {
        tree_sitter_solidity::LANGUAGE.into()
    }
}

/// Factory function to get a language implementation by file extension
pub fn get_language_by_extension(ext: &str) -> Option<Box<dyn Language>> {
    let dotted = format!(".{}", ext.trim_start_matches('.'));
    if Solidity.extensions().contains(&dotted.as_str()) {
        Some(Box::new(Solidity))
    } else {
        None
    }
}

/// Factory function to get a language implementation for a file
pub fn get_language_for_file(file_path: &Path) -> Option<Box<dyn Language>> {
    file_path
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(get_language_by_extension)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_solidity_language() {
        let solidity = Solidity;
        assert_eq!(solidity.name(), "Solidity");
        assert_eq!(solidity.extensions(), &[".sol"]);
    }

    #[test]
    fn test_get_language_by_extension() {
        let lang = get_language_by_extension("sol");
        assert!(lang.is_some());
        assert_eq!(lang.unwrap().name(), "Solidity");

        assert!(get_language_by_extension(".sol").is_some());
        assert!(get_language_by_extension("mmd").is_none());
        assert!(get_language_by_extension("unknown").is_none());
    }

    #[test]
    fn test_get_language_for_file() {
        let lang = get_language_for_file(Path::new("Token.sol"));
        assert!(lang.is_some());
        assert_eq!(lang.unwrap().name(), "Solidity");

        assert!(get_language_for_file(Path::new("Token.txt")).is_none());
        assert!(get_language_for_file(Path::new("Token")).is_none());
    }

    #[test]
    fn test_language_parsing() {
        let solidity = Solidity;
        let tree = solidity.parse("pragma solidity ^0.8.0; contract Test { }");
        assert!(tree.is_some(), "Failed to parse Solidity code");
        assert_eq!(tree.unwrap().root_node().kind(), "source_file");
    }
}
