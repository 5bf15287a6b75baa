//! Block stack and the must-complete block marker.
//!
//! The first block started becomes the root. Ending any other block pops it
//! and appends it to its parent; ending the root seals the tree, after which
//! nothing may be added.

use crate::location::SourceLocation;
use crate::tree::{AcceptedCharacters, Block, BlockType, Span, SpanKind, SyntaxTreeNode};

use super::Parser;

#[derive(Debug, Default)]
pub struct TreeBuilder {
    stack: Vec<Block>,
    terminated: bool,
    last_span: Option<(SpanKind, AcceptedCharacters)>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_block(&mut self, block_type: BlockType, start: SourceLocation) -> usize {
        assert!(!self.terminated, "cannot start a block after the root was ended");
        self.stack.push(Block::new(block_type, start));
        self.stack.len()
    }

    pub fn end_block(&mut self) {
        assert!(!self.stack.is_empty(), "end_block called without a matching start_block");
        if self.stack.len() == 1 {
            self.terminated = true;
            if let Some(root) = self.stack.last_mut() {
                root.recompute_start();
            }
            return;
        }
        if let Some(mut block) = self.stack.pop() {
            block.recompute_start();
            if let Some(parent) = self.stack.last_mut() {
                parent.children.push(SyntaxTreeNode::Block(block));
            }
        }
    }

    pub fn add_span(&mut self, span: Span) {
        assert!(!self.terminated, "cannot add a span after the root was ended");
        self.last_span = Some((span.kind, span.edit_handler.accepted));
        match self.stack.last_mut() {
            Some(block) => block.children.push(SyntaxTreeNode::Span(span)),
            None => panic!("add_span called with no open block"),
        }
    }

    /// Append to the root after it was ended; only for unparsed leftovers.
    pub fn add_trailing(&mut self, span: Span) {
        match self.stack.first_mut() {
            Some(root) => root.children.push(SyntaxTreeNode::Span(span)),
            None => panic!("add_trailing called with no root block"),
        }
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn current_block(&self) -> Option<&Block> {
        self.stack.last()
    }

    pub fn current_block_mut(&mut self) -> Option<&mut Block> {
        self.stack.last_mut()
    }

    /// Whether any open block has the given type.
    pub fn is_within(&self, block_type: BlockType) -> bool {
        self.stack.iter().any(|b| b.block_type == block_type)
    }

    pub fn last_span_kind(&self) -> Option<SpanKind> {
        self.last_span.map(|(kind, _)| kind)
    }

    /// Accepted characters of the last span output; `None` before any span.
    pub fn last_accepted_characters(&self) -> AcceptedCharacters {
        self.last_span
            .map(|(_, accepted)| accepted)
            .unwrap_or(AcceptedCharacters::None)
    }

    /// The most recent auto-complete span output directly into the current block.
    pub fn last_auto_complete_span_mut(&mut self) -> Option<&mut Span> {
        let block = self.stack.last_mut()?;
        block.children.iter_mut().rev().find_map(|child| match child {
            SyntaxTreeNode::Span(span) if span.edit_handler.is_auto_complete() => Some(span),
            _ => None,
        })
    }

    pub fn finish(mut self) -> Block {
        assert_eq!(self.stack.len(), 1, "parse finished with unclosed blocks");
        assert!(self.terminated, "parse finished without ending the root block");
        match self.stack.pop() {
            Some(root) => root,
            None => unreachable!(),
        }
    }
}

/// An open block that must be ended with [`BlockMarker::end`].
///
/// Dropping a marker never ends its block; it panics. Grammar code that can
/// leave early uses [`Parser::in_block`], which ends the block on every exit
/// from its closure. Raw markers are for blocks whose end is decided by a
/// callee, such as the tag blocks of markup in code.
#[must_use = "Block markers must be ended, dropping them is a bug"]
pub struct BlockMarker {
    depth: usize,
    completed: bool,
}

impl BlockMarker {
    pub(super) fn new(depth: usize) -> Self {
        Self {
            depth,
            completed: false,
        }
    }

    pub fn end(mut self, p: &mut Parser<'_>) {
        self.completed = true;
        assert_eq!(
            p.builder.depth(),
            self.depth,
            "blocks must be ended in the order they were started"
        );
        p.builder.end_block();
    }
}

impl Drop for BlockMarker {
    fn drop(&mut self) {
        if !self.completed && !std::thread::panicking() {
            panic!("BlockMarker must be ended");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Mode;
    use crate::parser::ParserOptions;
    use crate::syntax_kind::SyntaxKind;
    use crate::tree::{ChunkGenerator, EditHandler, Symbol};
    use pretty_assertions::assert_eq;

    fn span(offset: usize, text: &str) -> Span {
        let start = SourceLocation::new(offset, 0, offset);
        Span {
            kind: SpanKind::Markup,
            start,
            symbols: vec![Symbol::new(SyntaxKind::TEXT, Mode::Markup, start, text)],
            edit_handler: EditHandler::default(),
            chunk_generator: ChunkGenerator::Markup,
        }
    }

    #[test]
    fn nested_blocks_attach_to_parent() {
        let mut builder = TreeBuilder::new();
        builder.start_block(BlockType::Markup, SourceLocation::ZERO);
        builder.add_span(span(0, "a"));
        builder.start_block(BlockType::Expression, SourceLocation::new(1, 0, 1));
        assert!(builder.is_within(BlockType::Markup));
        builder.add_span(span(1, "b"));
        builder.end_block();
        builder.end_block();
        let root = builder.finish();
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.content(), "ab");
    }

    #[test]
    fn tracks_last_span() {
        let mut builder = TreeBuilder::new();
        assert_eq!(builder.last_accepted_characters(), AcceptedCharacters::None);
        builder.start_block(BlockType::Markup, SourceLocation::ZERO);
        builder.add_span(span(0, "a"));
        assert_eq!(builder.last_span_kind(), Some(SpanKind::Markup));
        assert_eq!(builder.last_accepted_characters(), AcceptedCharacters::Any);
    }

    #[test]
    fn finds_last_auto_complete_span() {
        let mut builder = TreeBuilder::new();
        builder.start_block(BlockType::Markup, SourceLocation::ZERO);
        assert!(builder.last_auto_complete_span_mut().is_none());
        let mut code = span(0, "{");
        code.edit_handler = EditHandler::auto_complete(AcceptedCharacters::Any, false);
        builder.add_span(code);
        builder.add_span(span(1, "x"));
        let found = builder.last_auto_complete_span_mut().map(|s| s.content());
        assert_eq!(found, Some("{".to_string()));
    }

    #[test]
    #[should_panic(expected = "no open block")]
    fn add_span_without_block_panics() {
        TreeBuilder::new().add_span(span(0, "a"));
    }

    #[test]
    #[should_panic(expected = "without a matching start_block")]
    fn end_without_start_panics() {
        TreeBuilder::new().end_block();
    }

    #[test]
    #[should_panic(expected = "BlockMarker must be ended")]
    fn dropped_marker_panics() {
        let mut p = Parser::new("a", Mode::Markup, ParserOptions::default());
        drop(p.start_block(BlockType::Markup));
    }

    #[test]
    fn in_block_ends_the_block_on_early_return() {
        let mut p = Parser::new("a", Mode::Markup, ParserOptions::default());
        let root = p.start_block(BlockType::Markup);
        let depth = p.builder.depth();
        let finished = p.in_block(BlockType::Tag, |p| {
            if !p.at_end() {
                return false;
            }
            p.bump();
            true
        });
        assert!(!finished);
        assert_eq!(p.builder.depth(), depth);
        root.end(&mut p);
    }

    #[test]
    #[should_panic(expected = "unclosed blocks")]
    fn finish_with_open_blocks_panics() {
        let mut builder = TreeBuilder::new();
        builder.start_block(BlockType::Markup, SourceLocation::ZERO);
        builder.start_block(BlockType::Statement, SourceLocation::ZERO);
        builder.finish();
    }
}
