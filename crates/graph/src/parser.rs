use anyhow::{Context, Result};
use fngraph_language::{Language, Solidity};
use tree_sitter::Tree;

/// Represents a parsed Solidity concrete syntax tree together with its source text.
#[derive(Debug)]
pub struct SolidityAST {
    pub tree: Tree,
    pub source: String,
}

impl SolidityAST {
    /// True when tree-sitter had to recover from at least one syntax error.
    pub fn has_errors(&self) -> bool {
        self.tree.root_node().has_error()
    }
}

/// Parse Solidity source code into a tree-sitter tree
pub fn parse_solidity(source: &str) -> Result<SolidityAST> {
    let tree = Solidity
        .parse(source)
        .context("Failed to parse Solidity source")?;

    Ok(SolidityAST {
        tree,
        source: source.to_string(),
    })
}

/// Helper function to get the source text for a node
pub fn get_node_text<'a>(node: &tree_sitter::Node, source: &'a str) -> &'a str {
    &source[node.start_byte()..node.end_byte()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_solidity() {
        let source = r#"
        pragma solidity ^0.8.0;

        contract SimpleStorage {
            uint256 private value;

            function setValue(uint256 _value) public {
                value = _value;
            }

            function getValue() public view returns (uint256) {
                return value;
            }
        }
        "#;

        let ast = parse_solidity(source).unwrap();
        let root_node = ast.tree.root_node();

        assert_eq!(root_node.kind(), "source_file");
        assert!(root_node.child_count() > 0);
        assert!(!ast.has_errors());
    }

    #[test]
    fn test_node_text() {
        let source = "contract A {}";
        let ast = parse_solidity(source).unwrap();
        let root = ast.tree.root_node();
        assert_eq!(get_node_text(&root, &ast.source).trim(), "contract A {}");
    }
}
