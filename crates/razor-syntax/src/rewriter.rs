//! Post-parse tree rewrites.
//!
//! Two passes run over a finished document before it is handed out:
//!
//! - [`WhitespaceRewriter`] moves whitespace the code parser picked up at the
//!   front of an expression back into the surrounding markup.
//! - [`ConditionalAttributeCollapser`] turns attribute blocks that turned out
//!   to be entirely literal into one plain markup span.
//!
//! Both are idempotent, so [`rewrite`] can be applied to an already
//! rewritten tree without changing it.

use log::debug;

use crate::lexer::{Mode, lex};
use crate::location::SourceLocation;
use crate::parser::ParserOptions;
use crate::tree::{
    Block, BlockType, ChunkGenerator, EditHandler, Span, SpanKind, Symbol, SyntaxTreeNode,
};

/// A single bottom-up transform over a block tree.
pub trait TreeRewriter {
    /// Rewrites `block` in place and returns how many nodes changed.
    fn rewrite(&self, block: &mut Block) -> usize;
}

/// Moves a leading whitespace-only code span out of an expression block.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceRewriter;

impl TreeRewriter for WhitespaceRewriter {
    fn rewrite(&self, block: &mut Block) -> usize {
        let mut changed = 0;
        let children = std::mem::take(&mut block.children);
        for child in children {
            let SyntaxTreeNode::Block(mut inner) = child else {
                block.children.push(child);
                continue;
            };
            changed += self.rewrite(&mut inner);
            if inner.block_type == BlockType::Expression {
                while let Some(whitespace) = take_leading_whitespace(&mut inner) {
                    block
                        .children
                        .push(SyntaxTreeNode::Span(retokenize_as_markup(&whitespace)));
                    changed += 1;
                }
                inner.recompute_start();
            }
            block.children.push(SyntaxTreeNode::Block(inner));
        }
        changed
    }
}

fn take_leading_whitespace(block: &mut Block) -> Option<Span> {
    match block.children.first() {
        Some(SyntaxTreeNode::Span(span))
            if span.kind == SpanKind::Code && span.length() > 0 && span.is_whitespace_only() => {}
        _ => return None,
    }
    match block.children.remove(0) {
        SyntaxTreeNode::Span(span) => Some(span),
        SyntaxTreeNode::Block(_) => None,
    }
}

/// Collapses attribute blocks made only of literal spans.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConditionalAttributeCollapser;

impl ConditionalAttributeCollapser {
    fn can_collapse(block: &Block) -> bool {
        matches!(block.chunk_generator, ChunkGenerator::Attribute { .. })
            && !block.children.is_empty()
            && block.children.iter().all(is_literal_attribute_part)
    }
}

fn is_literal_attribute_part(node: &SyntaxTreeNode) -> bool {
    match node {
        SyntaxTreeNode::Block(_) => false,
        SyntaxTreeNode::Span(span) => matches!(
            span.chunk_generator,
            ChunkGenerator::None | ChunkGenerator::Markup | ChunkGenerator::LiteralAttribute { .. }
        ),
    }
}

impl TreeRewriter for ConditionalAttributeCollapser {
    fn rewrite(&self, block: &mut Block) -> usize {
        let mut changed = 0;
        for child in &mut block.children {
            let SyntaxTreeNode::Block(inner) = child else {
                continue;
            };
            if Self::can_collapse(inner) {
                let start = inner.start;
                let content = inner.content();
                *child = SyntaxTreeNode::Span(markup_span(start, &content));
                changed += 1;
            } else {
                changed += self.rewrite(inner);
            }
        }
        changed
    }
}

fn retokenize_as_markup(span: &Span) -> Span {
    markup_span(span.start, &span.content())
}

fn markup_span(start: SourceLocation, content: &str) -> Span {
    let symbols = lex(content, Mode::Markup)
        .into_iter()
        .map(|token| {
            let location = start.advance(&content[..token.offset]);
            Symbol::new(token.kind, Mode::Markup, location, token.text)
        })
        .collect();
    Span {
        kind: SpanKind::Markup,
        start,
        symbols,
        edit_handler: EditHandler::default(),
        chunk_generator: ChunkGenerator::Markup,
    }
}

/// Run every rewrite pass that applies under `options`.
pub fn rewrite(block: &mut Block, options: &ParserOptions) {
    let moved = WhitespaceRewriter.rewrite(block);
    let collapsed = if options.design_time {
        0
    } else {
        ConditionalAttributeCollapser.rewrite(block)
    };
    if moved + collapsed > 0 {
        debug!("rewrote tree: {moved} whitespace spans moved, {collapsed} attributes collapsed");
    }
}
