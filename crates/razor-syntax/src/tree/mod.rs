//! # Tree - Blocks and Spans
//!
//! The parser's output is a tree of [`Block`]s (internal nodes grouping
//! children under a semantic category) and [`Span`]s (leaves holding a run of
//! [`Symbol`]s lexed in one mode).
//!
//! ## Coverage
//!
//! Spans never overlap and never leave gaps: concatenating every span's
//! content in document order gives back the source text exactly. This is
//! what [`Block::content`] computes, and what the tests check for every
//! input they parse.
//!
//! ## Dumps
//!
//! `Display` on a block renders the indented tree, one node per line. It is
//! the format used by the CLI's `--dump` mode and by the snapshot tests.

mod chunk;
mod span;

use std::fmt;

pub use chunk::{ChunkGenerator, LocationTagged};
pub use span::{AcceptedCharacters, EditHandler, EditHandlerKind, Span, SpanKind, Symbol};

use crate::location::SourceLocation;
use crate::syntax_kind::SyntaxKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockType {
    Markup,
    Statement,
    Expression,
    Directive,
    Comment,
    Functions,
    Section,
    Template,
    Tag,
}

impl BlockType {
    pub fn syntax_kind(self) -> SyntaxKind {
        match self {
            BlockType::Markup => SyntaxKind::MARKUP_BLOCK,
            BlockType::Statement => SyntaxKind::STATEMENT_BLOCK,
            BlockType::Expression => SyntaxKind::EXPRESSION_BLOCK,
            BlockType::Directive => SyntaxKind::DIRECTIVE_BLOCK,
            BlockType::Comment => SyntaxKind::COMMENT_BLOCK,
            BlockType::Functions => SyntaxKind::FUNCTIONS_BLOCK,
            BlockType::Section => SyntaxKind::SECTION_BLOCK,
            BlockType::Template => SyntaxKind::TEMPLATE_BLOCK,
            BlockType::Tag => SyntaxKind::TAG_BLOCK,
        }
    }
}

/// A child of a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxTreeNode {
    Block(Block),
    Span(Span),
}

impl SyntaxTreeNode {
    pub fn start(&self) -> SourceLocation {
        match self {
            SyntaxTreeNode::Block(block) => block.start,
            SyntaxTreeNode::Span(span) => span.start,
        }
    }

    pub fn length(&self) -> usize {
        match self {
            SyntaxTreeNode::Block(block) => block.length(),
            SyntaxTreeNode::Span(span) => span.length(),
        }
    }

    pub fn as_block(&self) -> Option<&Block> {
        match self {
            SyntaxTreeNode::Block(block) => Some(block),
            SyntaxTreeNode::Span(_) => None,
        }
    }

    pub fn as_span(&self) -> Option<&Span> {
        match self {
            SyntaxTreeNode::Span(span) => Some(span),
            SyntaxTreeNode::Block(_) => None,
        }
    }
}

/// An internal node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub block_type: BlockType,
    pub chunk_generator: ChunkGenerator,
    pub start: SourceLocation,
    pub children: Vec<SyntaxTreeNode>,
}

impl Block {
    pub fn new(block_type: BlockType, start: SourceLocation) -> Self {
        Self {
            block_type,
            chunk_generator: ChunkGenerator::None,
            start,
            children: Vec::new(),
        }
    }

    /// All leaf spans in document order.
    pub fn spans(&self) -> Spans<'_> {
        Spans {
            stack: vec![self.children.iter()],
        }
    }

    /// Direct and nested child blocks, depth first.
    pub fn blocks(&self) -> Vec<&Block> {
        let mut out = Vec::new();
        collect_blocks(self, &mut out);
        out
    }

    pub fn content(&self) -> String {
        self.spans().map(|span| span.content()).collect()
    }

    pub fn length(&self) -> usize {
        self.spans().map(Span::length).sum()
    }

    /// Start of the first child, falling back to where the block was opened.
    pub(crate) fn recompute_start(&mut self) {
        if let Some(first) = self.children.first() {
            self.start = first.start();
        }
    }

    fn write_tree(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let indent = "    ".repeat(depth);
        write!(
            f,
            "{indent}{:?} block at {}::{}",
            self.block_type,
            self.start,
            self.length()
        )?;
        if !matches!(self.chunk_generator, ChunkGenerator::None) {
            write!(f, " gen<{}>", self.chunk_generator)?;
        }
        writeln!(f)?;
        for child in &self.children {
            match child {
                SyntaxTreeNode::Block(block) => block.write_tree(f, depth + 1)?,
                SyntaxTreeNode::Span(span) => writeln!(f, "{indent}    {span}")?,
            }
        }
        Ok(())
    }
}

fn collect_blocks<'a>(block: &'a Block, out: &mut Vec<&'a Block>) {
    for child in &block.children {
        if let SyntaxTreeNode::Block(inner) = child {
            out.push(inner);
            collect_blocks(inner, out);
        }
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_tree(f, 0)
    }
}

/// Depth-first iterator over the spans of a block.
pub struct Spans<'a> {
    stack: Vec<std::slice::Iter<'a, SyntaxTreeNode>>,
}

impl<'a> Iterator for Spans<'a> {
    type Item = &'a Span;

    fn next(&mut self) -> Option<&'a Span> {
        loop {
            let iter = self.stack.last_mut()?;
            match iter.next() {
                Some(SyntaxTreeNode::Span(span)) => return Some(span),
                Some(SyntaxTreeNode::Block(block)) => self.stack.push(block.children.iter()),
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Mode;
    use pretty_assertions::assert_eq;

    fn span(kind: SpanKind, offset: usize, text: &str) -> SyntaxTreeNode {
        let start = SourceLocation::new(offset, 0, offset);
        SyntaxTreeNode::Span(Span {
            kind,
            start,
            symbols: vec![Symbol::new(SyntaxKind::TEXT, Mode::Markup, start, text)],
            edit_handler: EditHandler::default(),
            chunk_generator: ChunkGenerator::Markup,
        })
    }

    fn sample() -> Block {
        let mut inner = Block::new(BlockType::Expression, SourceLocation::new(3, 0, 3));
        inner.children.push(span(SpanKind::Transition, 3, "@"));
        inner.children.push(span(SpanKind::Code, 4, "foo"));
        let mut root = Block::new(BlockType::Markup, SourceLocation::ZERO);
        root.children.push(span(SpanKind::Markup, 0, "<p>"));
        root.children.push(SyntaxTreeNode::Block(inner));
        root.children.push(span(SpanKind::Markup, 7, "</p>"));
        root
    }

    #[test]
    fn spans_iterate_in_document_order() {
        let root = sample();
        let contents: Vec<String> = root.spans().map(Span::content).collect();
        assert_eq!(contents, vec!["<p>", "@", "foo", "</p>"]);
        assert_eq!(root.content(), "<p>@foo</p>");
        assert_eq!(root.length(), 11);
    }

    #[test]
    fn blocks_are_collected_depth_first() {
        let root = sample();
        let types: Vec<BlockType> = root.blocks().iter().map(|b| b.block_type).collect();
        assert_eq!(types, vec![BlockType::Expression]);
    }

    #[test]
    fn display_renders_indented_tree() {
        let dump = sample().to_string();
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines.len(), 6);
        assert!(lines[0].starts_with("Markup block at (0:0,0)::11"));
        assert!(lines[2].starts_with("    Expression block"));
        assert!(lines[3].starts_with("        Transition span"));
    }

    #[test]
    fn empty_block_keeps_creation_start() {
        let mut block = Block::new(BlockType::Statement, SourceLocation::new(5, 1, 0));
        block.recompute_start();
        assert_eq!(block.start, SourceLocation::new(5, 1, 0));
    }
}
