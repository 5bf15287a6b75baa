//! # razor-syntax
//!
//! An error-tolerant parser for Razor templates: HTML-like markup with
//! embedded C#-like code, switched into with the `@` transition character.
//!
//! ## What Comes Out
//!
//! Parsing produces a [`ParserResults`]: a tree of [`Block`]s and [`Span`]s
//! plus an ordered list of [`RazorError`] diagnostics. Parsing never fails.
//! Malformed input still yields a complete tree whose spans cover every byte
//! of the source, and the problems are reported as diagnostics with exact
//! positions.
//!
//! ## Architecture Overview
//!
//! ```text
//! Source Text → Lexer ⇄ Markup Grammar ⇄ Code Grammar → Block Tree → Rewriter
//!               (Logos)        (shared Parser context)    (TreeBuilder)
//! ```
//!
//! ### 1. Lexer ([`lexer`] module)
//!
//! Two [Logos] tokenizers, one per [`Mode`]. Tokens are lexed lazily at the
//! parser's cursor because the active mode can change at any transition.
//!
//! ### 2. Parser ([`parser`] module)
//!
//! The markup and code grammars are plain functions over one [`parser::Parser`]
//! context. They accept tokens into spans, open and close blocks through the
//! tree builder, and hand control to each other at transitions.
//!
//! ### 3. Rewriter ([`rewriter`] module)
//!
//! Post-passes over the sealed tree: leading expression whitespace is moved
//! back to markup, and fully literal attributes are collapsed.
//!
//! ### 4. Consumers
//!
//! [`visitor::ParserVisitor`] walks results in document order, and
//! [`Block::to_syntax_node`] exports a [Rowan] tree for editor tooling.
//!
//! [Logos]: https://docs.rs/logos
//! [Rowan]: https://docs.rs/rowan
//!
//! ## Quick Start
//!
//! ```
//! use razor_syntax::{parse, BlockType};
//!
//! let results = parse("<p>Hello @name!</p>");
//! assert!(results.success());
//!
//! // The tree preserves all text
//! assert_eq!(results.document.content(), "<p>Hello @name!</p>");
//!
//! // `@name` is an implicit expression
//! let blocks = results.document.blocks();
//! assert!(blocks.iter().any(|b| b.block_type == BlockType::Expression));
//! ```

pub mod cst;
pub mod errors;
pub mod lexer;
pub mod location;
pub mod parser;
pub mod rewriter;
pub mod syntax_kind;
pub mod tree;
pub mod visitor;

use log::debug;

pub use errors::{ErrorKind, RazorError};
pub use lexer::Mode;
pub use location::SourceLocation;
pub use parser::ParserOptions;
pub use syntax_kind::{RazorLang, SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken};
pub use tree::{Block, BlockType, ChunkGenerator, Span, SpanKind, Symbol, SyntaxTreeNode};
pub use visitor::ParserVisitor;

/// The tree and diagnostics of one parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserResults {
    pub document: Block,
    pub errors: Vec<RazorError>,
}

impl ParserResults {
    /// True when no diagnostics were reported.
    pub fn success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Visit the tree in document order, then every error, then complete.
    pub fn accept<V: ParserVisitor + ?Sized>(&self, visitor: &mut V) {
        visitor.visit_block(&self.document);
        for error in &self.errors {
            visitor.visit_error(error);
        }
        visitor.on_complete();
    }
}

/// Parse a document with default options.
pub fn parse(source: &str) -> ParserResults {
    parse_with(source, &ParserOptions::default())
}

/// Parse a document and run the rewrite passes.
pub fn parse_with(source: &str, options: &ParserOptions) -> ParserResults {
    let (mut document, errors) = parser::parse_document(source, options);
    rewriter::rewrite(&mut document, options);
    debug!(
        "parsed {} bytes: {} blocks, {} errors",
        source.len(),
        document.blocks().len(),
        errors.len()
    );
    ParserResults { document, errors }
}

/// Parse one block with the given grammar's block entry point.
///
/// No rewrite passes run; this is the harness for checking a single
/// construct in isolation.
pub fn parse_block(source: &str, mode: Mode, options: &ParserOptions) -> ParserResults {
    let (document, errors) = parser::parse_block(source, mode, options);
    ParserResults { document, errors }
}
