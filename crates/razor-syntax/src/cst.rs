//! Export of the block tree as a Rowan concrete syntax tree.
//!
//! Each block becomes a node of its [`BlockType::syntax_kind`], each span a
//! node of its [`SpanKind::syntax_kind`], and each symbol a token. Rowan
//! gives the result cheap cloning, parent pointers and text ranges, which
//! editor-style consumers want; the exported text is always the source.
//!
//! [`BlockType::syntax_kind`]: crate::tree::BlockType::syntax_kind
//! [`SpanKind::syntax_kind`]: crate::tree::SpanKind::syntax_kind

use rowan::GreenNodeBuilder;

use crate::syntax_kind::SyntaxNode;
use crate::tree::{Block, Span, SyntaxTreeNode};

impl Block {
    /// Build a Rowan tree rooted at this block.
    pub fn to_syntax_node(&self) -> SyntaxNode {
        let mut builder = GreenNodeBuilder::new();
        build_block(&mut builder, self);
        SyntaxNode::new_root(builder.finish())
    }
}

fn build_block(builder: &mut GreenNodeBuilder<'static>, block: &Block) {
    builder.start_node(block.block_type.syntax_kind().into());
    for child in &block.children {
        match child {
            SyntaxTreeNode::Block(inner) => build_block(builder, inner),
            SyntaxTreeNode::Span(span) => build_span(builder, span),
        }
    }
    builder.finish_node();
}

fn build_span(builder: &mut GreenNodeBuilder<'static>, span: &Span) {
    builder.start_node(span.kind.syntax_kind().into());
    for symbol in &span.symbols {
        builder.token(symbol.kind.into(), &symbol.content);
    }
    builder.finish_node();
}
