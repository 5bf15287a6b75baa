//! # Grammar Rules
//!
//! The two grammars that drive parsing. Each function takes a `&mut Parser`
//! and uses its methods to:
//!
//! 1. Inspect the current token (`p.current()`, `p.at()`, `p.nth()`)
//! 2. Consume tokens into the current span (`p.bump()`, `p.eat()`)
//! 3. Seal spans (`p.output(kind)`) and open blocks (`p.in_block(..)`)
//!
//! ## Module Structure
//!
//! - [`markup`] - Document scan, markup blocks inside code, sections
//! - [`tag`] - Tags, attributes, comments and the other `<...>` forms
//! - [`code`] - Transitions, expressions, statements and bracket balancing
//! - [`keywords`] - `if`, `for`, `try`, `using` and the other keyword blocks
//! - [`directives`] - `section`, `functions`, `inherits` and the tag helper
//!   directives
//!
//! ## Writing Grammar Rules
//!
//! A typical grammar function looks like:
//!
//! ```ignore
//! fn explicit_expression(p: &mut Parser<'_>) {
//!     p.bump();                                        // 1. Accept "("
//!     p.output_with(SpanKind::MetaCode, AcceptedCharacters::None);
//!     balance(p, Balancing::EXPLICIT);                 // 2. Consume the body
//!     p.output(SpanKind::Code);                        // 3. Seal it
//! }
//! ```
//!
//! ## Error Recovery
//!
//! Grammar functions are lenient: they always produce a tree that covers
//! every byte of input. When something unexpected happens they record a
//! diagnostic with `p.error(..)` and keep going, usually by accepting input
//! up to the next point where parsing can resume (a `<`, a newline, a `}`).

pub(crate) mod code;
mod directives;
mod keywords;
pub(crate) mod markup;
mod tag;

use crate::errors::ErrorKind;
use crate::lexer::{Mode, Token};
use crate::parser::{Parser, SpanConfig};
use crate::syntax_kind::SyntaxKind;
use crate::tree::{AcceptedCharacters, BlockType, ChunkGenerator, EditHandler, SpanKind};

const RAZOR_COMMENT_END: &str = "*@";

/// Predicate for whitespace, optionally newlines, optionally code comments.
pub(crate) fn spacing(newlines: bool, comments: bool) -> impl Fn(&Token<'_>) -> bool {
    move |t| {
        t.kind == SyntaxKind::WHITESPACE
            || (newlines && t.kind == SyntaxKind::NEWLINE)
            || (comments && t.kind == SyntaxKind::COMMENT)
    }
}

/// `@* ... *@`, in either mode, as a Comment block.
///
/// The `@*` token is split into a Transition and a MetaCode span, the body
/// becomes a Comment span (a marker when empty) and the closing `*@` is split
/// the same way. A missing terminator is reported at the opening `@*`.
pub(crate) fn razor_comment(p: &mut Parser<'_>) {
    match p.mode() {
        Mode::Markup => p.output(SpanKind::Markup),
        Mode::Code => {
            p.add_marker_symbol_if_necessary();
            p.output(SpanKind::Code);
        }
    }

    let config = SpanConfig::new(EditHandler::default(), ChunkGenerator::None);
    p.with_span_config(config, |p| {
        p.in_block(BlockType::Comment, |p| {
            p.current_block_mut().chunk_generator = ChunkGenerator::RazorComment;
            let start = p.location();

            p.bump_raw(SyntaxKind::TRANSITION, 1);
            p.output_with(SpanKind::Transition, AcceptedCharacters::None);
            p.bump_raw(SyntaxKind::RAZOR_COMMENT_STAR, 1);
            p.output_with(SpanKind::MetaCode, AcceptedCharacters::None);

            let rest = p.remainder();
            let body = rest.find(RAZOR_COMMENT_END).unwrap_or(rest.len());
            if body > 0 {
                p.bump_raw(SyntaxKind::RAZOR_COMMENT, body);
            }
            p.add_marker_symbol_if_necessary();
            p.output(SpanKind::Comment);

            let mut reported = false;
            if p.remainder().starts_with('*') {
                p.bump_raw(SyntaxKind::RAZOR_COMMENT_STAR, 1);
                p.output_with(SpanKind::MetaCode, AcceptedCharacters::None);
            } else {
                reported = true;
                p.error(ErrorKind::RazorCommentNotTerminated, start, 2);
            }
            if p.remainder().starts_with('@') {
                p.bump_raw(SyntaxKind::TRANSITION, 1);
                p.output_with(SpanKind::Transition, AcceptedCharacters::None);
            } else if !reported {
                p.error(ErrorKind::RazorCommentNotTerminated, start, 2);
            }
        });
    });
    p.initialize_span();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ParserOptions;
    use crate::tree::Block;
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> (Block, Vec<crate::errors::RazorError>) {
        crate::parser::parse_document(source, &ParserOptions::default())
    }

    fn comment_block(root: &Block) -> &Block {
        root.blocks()
            .into_iter()
            .find(|b| b.block_type == BlockType::Comment)
            .expect("comment block")
    }

    #[test]
    fn razor_comment_splits_delimiters() {
        let (root, errors) = parse("a@* note *@b");
        assert!(errors.is_empty());
        let kinds: Vec<SpanKind> = comment_block(&root).spans().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SpanKind::Transition,
                SpanKind::MetaCode,
                SpanKind::Comment,
                SpanKind::MetaCode,
                SpanKind::Transition,
            ]
        );
        assert_eq!(root.content(), "a@* note *@b");
    }

    #[test]
    fn empty_razor_comment_keeps_a_marker_span() {
        let (root, errors) = parse("@**@");
        assert!(errors.is_empty());
        let body: Vec<String> = comment_block(&root).spans().map(|s| s.content()).collect();
        assert_eq!(body, vec!["@", "*", "", "*", "@"]);
    }

    #[test]
    fn unterminated_razor_comment_reported_once_at_start() {
        let (root, errors) = parse("x @* open");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::RazorCommentNotTerminated);
        assert_eq!(errors[0].location.absolute_index, 2);
        assert_eq!(errors[0].length, 2);
        assert_eq!(root.content(), "x @* open");
    }

    #[test]
    fn razor_comment_inside_code_block() {
        let (root, errors) = parse("@{ var a = 1; @* skip *@ }");
        assert!(errors.is_empty());
        assert_eq!(comment_block(&root).content(), "@* skip *@");
        assert_eq!(root.content(), "@{ var a = 1; @* skip *@ }");
    }
}
