//! Markup grammar: the document scan, markup blocks inside code, sections.
//!
//! Markup is mostly passed through. The grammar only cares about three
//! things while it scans:
//!
//! - `@` transitions, which hand the cursor to the code grammar,
//! - `@* *@` comments,
//! - tags, which it tracks closely enough to know where a markup block that
//!   started inside code ends (see [`super::tag`]).

use crate::errors::ErrorKind;
use crate::lexer::Token;
use crate::parser::{Parser, SpanConfig};
use crate::syntax_kind::SyntaxKind;
use crate::tree::{AcceptedCharacters, BlockType, ChunkGenerator, EditHandler, SpanKind};

use super::{code, razor_comment, spacing, tag};

/// Stop predicate for [`skip_to_and_parse_code`] matching one token kind.
pub(super) fn until(kind: SyntaxKind) -> impl Fn(&Parser<'_>, &Token<'_>) -> bool {
    move |_, t| t.kind == kind
}

/// Accept markup up to the first token matching `stop`, running the code
/// grammar at every transition and the comment rule at every `@*`.
///
/// Indentation in front of a transition or a comment that starts a line is
/// handed to whatever follows instead of staying in the markup span.
pub(super) fn skip_to_and_parse_code<'s>(
    p: &mut Parser<'s>,
    stop: impl Fn(&Parser<'s>, &Token<'s>) -> bool,
) {
    let mut last: Option<Token<'s>> = None;
    let mut start_of_line = false;

    while let Some(token) = p.current_token() {
        if stop(&*p, &token) {
            break;
        }
        if p.null_generate_whitespace_and_newline {
            p.null_generate_whitespace_and_newline = false;
            p.span_mut().chunk_generator = ChunkGenerator::None;
            p.accept_while(|t| t.kind == SyntaxKind::WHITESPACE);
            p.eat(SyntaxKind::NEWLINE);
            p.output(SpanKind::Markup);
            continue;
        }

        match token.kind {
            SyntaxKind::NEWLINE => {
                if let Some(previous) = last.take() {
                    p.accept(previous);
                }
                start_of_line = true;
                p.bump();
            }
            SyntaxKind::TRANSITION => {
                if p.next_is(SyntaxKind::TRANSITION) {
                    // `@@` is a literal `@`; the first one is not generated
                    if let Some(previous) = last.take() {
                        p.accept(previous);
                    }
                    p.output(SpanKind::Markup);
                    p.bump();
                    p.span_mut().chunk_generator = ChunkGenerator::None;
                    p.output(SpanKind::Markup);
                    p.bump();
                    continue;
                }
                if let Some(previous) = last.take() {
                    if !p.design_time() && previous.kind == SyntaxKind::WHITESPACE && start_of_line {
                        start_of_line = false;
                        p.put_back_token(previous);
                    } else {
                        p.accept(previous);
                    }
                }
                other_parser_block(p);
            }
            SyntaxKind::RAZOR_COMMENT_START => {
                if let Some(previous) = last.take() {
                    if start_of_line && previous.kind == SyntaxKind::WHITESPACE {
                        p.add_marker_symbol_if_necessary();
                        p.output(SpanKind::Markup);
                        p.span_mut().chunk_generator = ChunkGenerator::None;
                    }
                    p.accept(previous);
                }
                p.add_marker_symbol_if_necessary();
                p.output(SpanKind::Markup);
                razor_comment(p);

                let line_ends = p.at(SyntaxKind::NEWLINE)
                    || (p.at(SyntaxKind::WHITESPACE) && p.next_is(SyntaxKind::NEWLINE));
                if start_of_line && line_ends {
                    p.accept_while(spacing(false, false));
                    p.bump();
                    p.span_mut().chunk_generator = ChunkGenerator::None;
                    p.output(SpanKind::Markup);
                }
            }
            _ => {
                start_of_line &= token.kind == SyntaxKind::WHITESPACE;
                if let Some(previous) = last.take() {
                    p.accept(previous);
                }
                last = Some(token);
                p.skip();
            }
        }
    }

    if let Some(previous) = last {
        p.accept(previous);
    }
}

/// Hand the cursor to the code grammar at an `@`.
pub(super) fn other_parser_block(p: &mut Parser<'_>) {
    p.add_marker_symbol_if_necessary();
    p.output(SpanKind::Markup);
    p.with_other_parser(|p| p.guarded(code::parse_block));
}

/// The whole document: text, tags and transitions until end of input.
pub(crate) fn parse_document(p: &mut Parser<'_>) {
    p.with_span_config(SpanConfig::markup(), |p| {
        p.in_block(BlockType::Markup, |p| {
            while !p.at_end() {
                skip_to_and_parse_code(p, until(SyntaxKind::L_ANGLE));
                tag::scan_tag_in_document_context(p);
            }
            p.add_marker_symbol_if_necessary();
            p.output(SpanKind::Markup);
        });
    });
}

/// One markup block inside code: a tag with everything up to its end tag,
/// `@<tag>..</tag>`, or `@:` up to the end of the line.
pub(crate) fn parse_block(p: &mut Parser<'_>) {
    p.with_span_config(SpanConfig::markup(), |p| {
        p.in_block(BlockType::Markup, |p| {
            if p.at_end() {
                return;
            }
            p.accept_while(spacing(true, false));

            match p.current() {
                SyntaxKind::L_ANGLE => tag::tag_block(p),
                SyntaxKind::TRANSITION => {
                    p.output(SpanKind::Markup);
                    p.bump();
                    p.span_mut().set_accepted(AcceptedCharacters::None);
                    p.span_mut().chunk_generator = ChunkGenerator::None;
                    p.output(SpanKind::Transition);
                    if p.at(SyntaxKind::TRANSITION) {
                        p.span_mut().chunk_generator = ChunkGenerator::None;
                        p.bump();
                        p.output(SpanKind::MetaCode);
                    }
                    after_transition(p);
                }
                _ => {
                    let length = p.current_text().len().max(1);
                    p.error_here(ErrorKind::MarkupBlockMustStartWithTag, length);
                }
            }
            p.output(SpanKind::Markup);
        });
    });
}

fn after_transition(p: &mut Parser<'_>) {
    if p.at(SyntaxKind::TEXT) && p.current_text().starts_with(':') {
        p.bump_raw(SyntaxKind::COLON, 1);
        p.span_mut().chunk_generator = ChunkGenerator::None;
        p.output(SpanKind::MetaCode);
        single_line_markup(p);
    } else if p.at(SyntaxKind::L_ANGLE) {
        tag::tag_block(p);
    }
}

/// `@:` content: markup to the end of the line, newline included.
fn single_line_markup(p: &mut Parser<'_>) {
    let significant = p.whitespace_significant_to_ancestor;
    p.whitespace_significant_to_ancestor = true;
    p.span_mut().edit_handler = EditHandler::default();

    skip_to_and_parse_code(p, until(SyntaxKind::NEWLINE));
    if p.eat(SyntaxKind::NEWLINE) {
        p.span_mut().set_accepted(AcceptedCharacters::None);
    }

    p.whitespace_significant_to_ancestor = significant;
    p.output(SpanKind::Markup);
}

fn is_brace(token: &Token<'_>) -> bool {
    token.kind == SyntaxKind::TEXT && matches!(token.text, "{" | "}")
}

/// Body of `@section name { ... }`, up to (not including) the `}` that
/// balances the section's opening brace.
pub(super) fn parse_section(p: &mut Parser<'_>) {
    p.with_span_config(SpanConfig::markup(), |p| {
        p.in_block(BlockType::Markup, |p| {
            let mut nesting = 1usize;
            while nesting > 0 && !p.at_end() {
                skip_to_and_parse_code(p, |_, t| t.kind == SyntaxKind::L_ANGLE || is_brace(t));
                match p.current_token() {
                    Some(t) if is_brace(&t) && t.text == "{" => {
                        nesting += 1;
                        p.bump();
                    }
                    Some(t) if is_brace(&t) => {
                        nesting -= 1;
                        if nesting > 0 {
                            p.bump();
                        }
                    }
                    _ => tag::scan_tag_in_document_context(p),
                }
            }
            p.add_marker_symbol_if_necessary();
            p.output(SpanKind::Markup);
        });
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RazorError;
    use crate::lexer::Mode;
    use crate::parser::{ParserOptions, parse_block as parse_with, parse_document as document};
    use crate::tree::{Block, Span};
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> (Block, Vec<RazorError>) {
        document(source, &ParserOptions::default())
    }

    fn markup(source: &str) -> (Block, Vec<RazorError>) {
        parse_with(source, Mode::Markup, &ParserOptions::default())
    }

    fn spans(block: &Block) -> Vec<(SpanKind, String)> {
        block.spans().map(|s| (s.kind, s.content())).collect()
    }

    #[test]
    fn plain_text_is_one_markup_span() {
        let (root, errors) = parse("Hello, world!");
        assert!(errors.is_empty());
        assert_eq!(spans(&root), vec![(SpanKind::Markup, "Hello, world!".to_string())]);
        assert_eq!(root.block_type, BlockType::Markup);
    }

    #[test]
    fn empty_document_has_a_marker_span() {
        let (root, errors) = parse("");
        assert!(errors.is_empty());
        assert_eq!(spans(&root), vec![(SpanKind::Markup, String::new())]);
    }

    #[test]
    fn expression_splits_markup() {
        let (root, errors) = parse("a @foo b");
        assert!(errors.is_empty());
        assert_eq!(
            spans(&root),
            vec![
                (SpanKind::Markup, "a ".to_string()),
                (SpanKind::Transition, "@".to_string()),
                (SpanKind::Code, "foo".to_string()),
                (SpanKind::Markup, " b".to_string()),
            ]
        );
    }

    #[test]
    fn email_address_is_not_a_transition() {
        let (root, errors) = parse("mail me@example.com now");
        assert!(errors.is_empty());
        assert!(root.blocks().is_empty());
        assert_eq!(root.content(), "mail me@example.com now");
    }

    #[test]
    fn escaped_transition_yields_literal_at() {
        let (root, errors) = parse("a@@b");
        assert!(errors.is_empty());
        let all: Vec<(String, ChunkGenerator)> = root
            .spans()
            .map(|s| (s.content(), s.chunk_generator.clone()))
            .collect();
        assert_eq!(
            all,
            vec![
                ("a".to_string(), ChunkGenerator::Markup),
                ("@".to_string(), ChunkGenerator::None),
                ("@b".to_string(), ChunkGenerator::Markup),
            ]
        );
    }

    #[test]
    fn indentation_before_code_block_moves_to_code() {
        let (root, errors) = parse("<p>\n    @{ }\n</p>");
        assert!(errors.is_empty());
        let statement = root
            .blocks()
            .into_iter()
            .find(|b| b.block_type == BlockType::Statement)
            .expect("statement block");
        assert_eq!(statement.content(), "    @{ }");
        assert_eq!(root.content(), "<p>\n    @{ }\n</p>");
    }

    #[test]
    fn newline_after_code_block_is_not_generated() {
        let (root, _) = parse("@{ }\nnext");
        let after: Vec<&Span> = root
            .spans()
            .filter(|s| s.kind == SpanKind::Markup && !s.content().is_empty())
            .collect();
        assert_eq!(after[0].content(), "\n");
        assert_eq!(after[0].chunk_generator, ChunkGenerator::None);
        assert_eq!(after[1].content(), "next");
    }

    #[test]
    fn comment_alone_on_a_line_swallows_the_line() {
        let (root, errors) = parse("a\n  @* c *@\nb");
        assert!(errors.is_empty());
        let ungenerated: Vec<String> = root
            .spans()
            .filter(|s| s.kind == SpanKind::Markup && s.chunk_generator == ChunkGenerator::None)
            .map(|s| s.content())
            .collect();
        assert_eq!(ungenerated, vec!["  ".to_string(), "\n".to_string()]);
        assert_eq!(root.content(), "a\n  @* c *@\nb");
    }

    #[test]
    fn markup_block_must_start_with_a_tag() {
        let (_, errors) = markup("hello");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::MarkupBlockMustStartWithTag);
        assert_eq!(errors[0].length, 5);
    }

    #[test]
    fn single_line_markup_runs_to_the_newline() {
        let (root, errors) = parse("@{ @:hi @x\n}");
        assert!(errors.is_empty());
        let template = root
            .blocks()
            .into_iter()
            .find(|b| b.block_type == BlockType::Markup)
            .expect("markup block");
        let kinds: Vec<(SpanKind, String)> = spans(template);
        assert_eq!(kinds[0], (SpanKind::Markup, " ".to_string()));
        assert_eq!(kinds[1], (SpanKind::Transition, "@".to_string()));
        assert_eq!(kinds[2], (SpanKind::MetaCode, ":".to_string()));
        assert_eq!(kinds[3], (SpanKind::Markup, "hi ".to_string()));
        assert_eq!(kinds.last(), Some(&(SpanKind::Markup, "\n".to_string())));
        assert_eq!(root.content(), "@{ @:hi @x\n}");
    }

    #[test]
    fn section_body_balances_braces() {
        let source = "@section foo { a { b } c }";
        let (root, errors) = parse(source);
        assert!(errors.is_empty());
        let section = root
            .blocks()
            .into_iter()
            .find(|b| b.block_type == BlockType::Section)
            .expect("section block");
        let body = section
            .children
            .iter()
            .filter_map(|c| c.as_block())
            .find(|b| b.block_type == BlockType::Markup)
            .expect("section body");
        assert_eq!(body.content(), " a { b } c ");
        assert_eq!(root.content(), source);
    }
}
