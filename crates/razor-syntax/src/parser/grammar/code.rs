//! Code grammar: what follows an `@`, code blocks and statements.
//!
//! The entry point [`parse_block`] opens a Statement block, takes the
//! transition, and dispatches on the next token:
//!
//! - `(` explicit expression, `@(a + b)`
//! - identifier: directive (`section`, `functions`, ...) or implicit
//!   expression, `@foo.bar[0]()`
//! - keyword: control flow or reserved word, `@if (x) { }`
//! - `{` verbatim code block, `@{ var x = 1; }`
//!
//! Markup found inside code is handed back to the markup grammar through
//! [`parse_with_other_parser`].

use crate::errors::ErrorKind;
use crate::lexer::Token;
use crate::location::SourceLocation;
use crate::parser::{Parser, SpanConfig};
use crate::syntax_kind::SyntaxKind;
use crate::tree::{AcceptedCharacters, BlockType, ChunkGenerator, EditHandler, SpanKind};

use super::{directives, keywords, markup, razor_comment, spacing};

/// Name and start of a construct whose closing brace may be missing.
#[derive(Debug, Clone)]
pub(super) struct BlockInfo {
    pub name: String,
    pub start: SourceLocation,
}

impl BlockInfo {
    pub fn new(name: impl Into<String>, start: SourceLocation) -> Self {
        Self {
            name: name.into(),
            start,
        }
    }
}

/// How [`balance`] behaves when the closing bracket never shows up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Balancing {
    /// Rewind to just after the opener instead of accepting what was read
    pub backtrack_on_failure: bool,
    pub no_error_on_failure: bool,
    /// Hand `@<tag>`, `@:` and `@* *@` to the markup grammar mid-balance
    pub allow_templates_and_comments: bool,
}

impl Balancing {
    pub const NONE: Balancing = Balancing {
        backtrack_on_failure: false,
        no_error_on_failure: false,
        allow_templates_and_comments: false,
    };
    pub const NO_ERROR: Balancing = Balancing {
        no_error_on_failure: true,
        ..Balancing::NONE
    };
    pub const BACKTRACK_WITH_TEMPLATES: Balancing = Balancing {
        backtrack_on_failure: true,
        allow_templates_and_comments: true,
        ..Balancing::NONE
    };
    pub const EXPLICIT_EXPRESSION: Balancing = Balancing {
        no_error_on_failure: true,
        ..Balancing::BACKTRACK_WITH_TEMPLATES
    };
}

fn closer(kind: SyntaxKind) -> SyntaxKind {
    match kind {
        SyntaxKind::L_PAREN => SyntaxKind::R_PAREN,
        SyntaxKind::L_BRACKET => SyntaxKind::R_BRACKET,
        SyntaxKind::L_BRACE => SyntaxKind::R_BRACE,
        SyntaxKind::L_ANGLE => SyntaxKind::R_ANGLE,
        other => other,
    }
}

fn bracket_text(kind: SyntaxKind) -> &'static str {
    match kind {
        SyntaxKind::L_PAREN => "(",
        SyntaxKind::R_PAREN => ")",
        SyntaxKind::L_BRACKET => "[",
        SyntaxKind::R_BRACKET => "]",
        SyntaxKind::L_BRACE => "{",
        SyntaxKind::R_BRACE => "}",
        SyntaxKind::L_ANGLE => "<",
        SyntaxKind::R_ANGLE => ">",
        _ => "",
    }
}

/// Accept the opener at the cursor and everything up to its matching closer.
///
/// On success the closer is left as the current token.
pub(super) fn balance(p: &mut Parser<'_>, mode: Balancing) -> bool {
    let left = p.current();
    let right = closer(left);
    let start = p.location();
    p.bump();
    if p.at_end() && !mode.no_error_on_failure {
        p.error(
            ErrorKind::ExpectedCloseBracketBeforeEof {
                open: bracket_text(left).to_string(),
                close: bracket_text(right).to_string(),
            },
            start,
            1,
        );
    }
    balance_from(p, mode, left, right, start)
}

/// Like [`balance`], with the opener already accepted.
pub(super) fn balance_from(
    p: &mut Parser<'_>,
    mode: Balancing,
    left: SyntaxKind,
    right: SyntaxKind,
    start: SourceLocation,
) -> bool {
    let mut nesting = 1usize;
    if p.at_end() {
        return false;
    }

    let mut backtrack_to = p.position();
    let mut pending: Vec<Token<'_>> = Vec::new();
    loop {
        while mode.allow_templates_and_comments && at_embedded_transition(p) {
            p.accept_tokens(pending.drain(..));
            embedded_transition(p);
            // spans were output, so there is nothing before this to rewind to
            backtrack_to = p.position();
        }
        let Some(token) = p.current_token() else {
            break;
        };
        if token.kind == left {
            nesting += 1;
        } else if token.kind == right {
            nesting -= 1;
            if nesting == 0 {
                break;
            }
        }
        pending.push(token);
        p.skip();
    }

    if nesting > 0 {
        if !mode.no_error_on_failure {
            p.error(
                ErrorKind::ExpectedCloseBracketBeforeEof {
                    open: bracket_text(left).to_string(),
                    close: bracket_text(right).to_string(),
                },
                start,
                1,
            );
        }
        if mode.backtrack_on_failure {
            p.seek(backtrack_to);
        } else {
            p.accept_tokens(pending);
        }
        false
    } else {
        p.accept_tokens(pending);
        true
    }
}

fn at_embedded_transition(p: &Parser<'_>) -> bool {
    (p.at(SyntaxKind::TRANSITION)
        && matches!(
            p.nth(1),
            SyntaxKind::L_ANGLE | SyntaxKind::COLON | SyntaxKind::DOUBLE_COLON
        ))
        || p.at(SyntaxKind::RAZOR_COMMENT_START)
}

fn embedded_transition(p: &mut Parser<'_>) {
    if p.at(SyntaxKind::RAZOR_COMMENT_START) {
        razor_comment(p);
    } else {
        template(p);
    }
}

// === Entry point ===

/// Parse one code block starting at the cursor (normally at an `@`).
pub(crate) fn parse_block(p: &mut Parser<'_>) {
    p.with_span_config(SpanConfig::statement(), |p| {
        p.in_block(BlockType::Statement, |p| {
            p.accept_while(spacing(true, true));

            let at_verbatim_string =
                p.at(SyntaxKind::STRING) && p.current_text().starts_with('@');
            if at_verbatim_string || p.at(SyntaxKind::TRANSITION) {
                p.output(SpanKind::Code);
                p.bump_raw(SyntaxKind::TRANSITION, 1);
                p.span_mut().chunk_generator = ChunkGenerator::None;
                p.output_with(SpanKind::Transition, AcceptedCharacters::None);
            }
            after_transition(p);
            p.output(SpanKind::Code);
        });
    });
}

fn after_transition(p: &mut Parser<'_>) {
    p.with_span_config(SpanConfig::statement(), |p| match p.current() {
        SyntaxKind::L_PAREN => {
            let block = p.current_block_mut();
            block.block_type = BlockType::Expression;
            block.chunk_generator = ChunkGenerator::Expression;
            explicit_expression(p);
        }
        SyntaxKind::IDENT => {
            if let Some(directive) = directives::handler_for(p.current_text()) {
                p.span_mut().chunk_generator = ChunkGenerator::None;
                directive(p);
                return;
            }
            if p.current_text() == "helper" {
                let length = p.current_text().len();
                p.error_here(ErrorKind::HelperDirectiveNotAvailable("helper".into()), length);
            }
            implicit_expression(p, AcceptedCharacters::NonWhiteSpace);
        }
        SyntaxKind::KEYWORD => keyword_block(p, true),
        SyntaxKind::L_BRACE => verbatim_block(p),
        _ => invalid_start(p),
    });
}

fn invalid_start(p: &mut Parser<'_>) {
    let block = p.current_block_mut();
    block.block_type = BlockType::Expression;
    block.chunk_generator = ChunkGenerator::Expression;
    p.add_marker_symbol_if_necessary();
    p.span_mut().chunk_generator = ChunkGenerator::Expression;
    p.span_mut().edit_handler =
        EditHandler::implicit_expression(AcceptedCharacters::NonWhiteSpace, p.is_nested);

    let text = p.current_text();
    match p.current() {
        SyntaxKind::WHITESPACE | SyntaxKind::NEWLINE => {
            p.error_here(ErrorKind::UnexpectedWhiteSpaceAtStartOfCodeBlock, text.len());
        }
        SyntaxKind::EOF => p.error_here(ErrorKind::UnexpectedEndOfFileAtStartOfCodeBlock, 1),
        _ => p.error_here(
            ErrorKind::UnexpectedCharacterAtStartOfCodeBlock(text.to_string()),
            text.len(),
        ),
    }
}

fn keyword_block(p: &mut Parser<'_>, top_level: bool) {
    keywords::handle_keyword(p, top_level, |p| {
        let block = p.current_block_mut();
        block.block_type = BlockType::Expression;
        block.chunk_generator = ChunkGenerator::Expression;
        implicit_expression(p, AcceptedCharacters::NonWhiteSpace);
    });
}

// === Expressions ===

/// `@{ ... }`
fn verbatim_block(p: &mut Parser<'_>) {
    let block = BlockInfo::new("code", p.location());
    p.bump();
    p.span_mut().chunk_generator = ChunkGenerator::None;
    p.output_with(SpanKind::MetaCode, AcceptedCharacters::None);

    p.span_mut().edit_handler = EditHandler::auto_complete(AcceptedCharacters::Any, false);
    code_block(p, false, block);
    p.span_mut().chunk_generator = ChunkGenerator::Statement;
    p.add_marker_symbol_if_necessary();
    if !p.at(SyntaxKind::R_BRACE) {
        p.set_auto_complete_string("}");
    }
    p.output(SpanKind::Code);

    if p.eat(SyntaxKind::R_BRACE) {
        p.span_mut().set_accepted(AcceptedCharacters::None);
        p.span_mut().chunk_generator = ChunkGenerator::None;
    }
    if !p.is_nested
        && (p.at(SyntaxKind::NEWLINE)
            || (p.at(SyntaxKind::WHITESPACE) && p.next_is(SyntaxKind::NEWLINE)))
    {
        p.null_generate_whitespace_and_newline = true;
    }
    p.output(SpanKind::MetaCode);
}

/// `@foo.bar(baz)[0]`: identifiers joined by member access, calls and
/// indexers, stopping at anything else.
pub(super) fn implicit_expression(p: &mut Parser<'_>, accepted: AcceptedCharacters) {
    let block = p.current_block_mut();
    block.block_type = BlockType::Expression;
    block.chunk_generator = ChunkGenerator::Expression;

    let config = SpanConfig::new(
        EditHandler::implicit_expression(accepted, p.is_nested),
        ChunkGenerator::Expression,
    );
    p.with_span_config(config, |p| {
        loop {
            if !p.eat(SyntaxKind::IDENT) {
                p.eat(SyntaxKind::KEYWORD);
            }
            if !method_call_or_array_index(p, accepted) {
                break;
            }
        }
        p.output(SpanKind::Code);
    });
}

fn at_identifier(p: &Parser<'_>) -> bool {
    matches!(p.current(), SyntaxKind::IDENT | SyntaxKind::KEYWORD)
}

/// Extend an implicit expression past `(..)`, `[..]`, `?.` and `.`.
/// Returns whether another identifier should be read.
fn method_call_or_array_index(p: &mut Parser<'_>, accepted: AcceptedCharacters) -> bool {
    loop {
        match p.current() {
            SyntaxKind::L_PAREN | SyntaxKind::L_BRACKET => {
                let right = closer(p.current());
                // inside the brackets any edit is fine
                let mut config = p.span_config().clone();
                config.edit_handler.accepted = AcceptedCharacters::Any;
                let balanced =
                    p.with_span_config(config, |p| balance(p, Balancing::BACKTRACK_WITH_TEMPLATES));
                if !balanced {
                    p.accept_until(&[SyntaxKind::L_ANGLE]);
                }
                if p.at(right) {
                    p.bump();
                    p.span_mut().set_accepted(accepted);
                }
            }
            SyntaxKind::QUESTION => match p.nth(1) {
                SyntaxKind::DOT
                    if matches!(p.nth(2), SyntaxKind::IDENT | SyntaxKind::KEYWORD) =>
                {
                    p.bump();
                    p.bump();
                    return true;
                }
                SyntaxKind::L_BRACKET => {
                    p.bump();
                }
                _ => return false,
            },
            SyntaxKind::DOT => {
                let Some(dot) = p.skip() else {
                    return false;
                };
                if at_identifier(p) {
                    p.accept(dot);
                    return true;
                }
                if p.is_nested {
                    p.accept(dot);
                } else {
                    p.put_back_token(dot);
                }
                return false;
            }
            _ => return false,
        }
    }
}

/// `@( ... )`
fn explicit_expression(p: &mut Parser<'_>) {
    let start = p.location();
    p.bump();
    p.span_mut().chunk_generator = ChunkGenerator::None;
    p.output_with(SpanKind::MetaCode, AcceptedCharacters::None);

    let config = SpanConfig::new(EditHandler::default(), ChunkGenerator::Expression);
    p.with_span_config(config, |p| {
        let balanced = balance_from(
            p,
            Balancing::EXPLICIT_EXPRESSION,
            SyntaxKind::L_PAREN,
            SyntaxKind::R_PAREN,
            start,
        );
        if !balanced {
            p.accept_until(&[SyntaxKind::L_ANGLE]);
            p.error(
                ErrorKind::ExpectedEndOfBlockBeforeEof {
                    block_name: "explicit expression".into(),
                    close: ")".into(),
                    open: "(".into(),
                },
                start,
                1,
            );
        }
        if p.span().is_empty() {
            p.add_marker_symbol();
        }
        p.output(SpanKind::Code);
    });

    p.eat(SyntaxKind::R_PAREN);
    p.span_mut().set_accepted(AcceptedCharacters::None);
    p.span_mut().chunk_generator = ChunkGenerator::None;
    complete_block(p, false, false);
    p.output(SpanKind::MetaCode);
}

/// Close a keyword or directive block, optionally keeping a whitespace-only
/// line remainder with the code that ends it.
pub(super) fn complete_block(p: &mut Parser<'_>, insert_marker: bool, capture_whitespace: bool) {
    if insert_marker {
        p.add_marker_symbol_if_necessary();
    }
    if !p.whitespace_significant_to_ancestor
        && p.current_block_type() != Some(BlockType::Expression)
        && capture_whitespace
        && !p.design_time()
        && !p.is_nested
    {
        let whitespace = p.read_while(|t| t.kind == SyntaxKind::WHITESPACE);
        if p.at(SyntaxKind::NEWLINE) {
            p.accept_tokens(whitespace);
            p.bump();
        } else {
            p.put_back(&whitespace);
        }
    }
}

// === Switching to markup ===

/// `@<p>..</p>` or `@:..` inside code, as a Template block.
fn template(p: &mut Parser<'_>) {
    if p.is_within(BlockType::Template) {
        p.error_here(ErrorKind::InlineMarkupBlocksCannotBeNested, 1);
    }
    p.output(SpanKind::Code);
    p.in_block(BlockType::Template, |p| {
        p.current_block_mut().chunk_generator = ChunkGenerator::Template;
        other_parser_block(p);
    });
    p.initialize_span();
}

fn other_parser_block(p: &mut Parser<'_>) {
    parse_with_other_parser(p, markup::parse_block);
}

/// Run a markup entry point at the cursor; nesting resets inside markup.
pub(super) fn parse_with_other_parser(p: &mut Parser<'_>, f: fn(&mut Parser<'_>)) {
    let was_nested = p.is_nested;
    p.is_nested = false;
    p.with_other_parser(|p| p.guarded(f));
    p.is_nested = was_nested;
}

fn nested_block(p: &mut Parser<'_>) {
    p.output(SpanKind::Code);
    let was_nested = p.is_nested;
    p.is_nested = true;
    p.guarded(parse_block);
    p.initialize_span();
    p.is_nested = was_nested;
}

// === Statements ===

/// One statement inside a code block.
pub(super) fn statement(p: &mut Parser<'_>, block: Option<BlockInfo>) {
    p.span_mut().set_accepted(AcceptedCharacters::Any);
    let last_whitespace = accept_whitespace_in_lines(p);
    if p.at_end() {
        if let Some(whitespace) = last_whitespace {
            p.accept(whitespace);
        }
        return;
    }

    let at_transition = p.at(SyntaxKind::TRANSITION);
    let is_single_line_markup =
        at_transition && matches!(p.nth(1), SyntaxKind::COLON | SyntaxKind::DOUBLE_COLON);
    let is_markup = is_single_line_markup
        || p.at(SyntaxKind::L_ANGLE)
        || (at_transition && p.next_is(SyntaxKind::L_ANGLE));
    let transition_location = p.location();

    if let Some(whitespace) = last_whitespace {
        // markup owns its leading whitespace, except before `<text>`
        let precedes_text_tag = p.nth_token(1).is_none_or(|t| t.text == "text");
        if p.design_time() || !is_markup || precedes_text_tag {
            p.accept(whitespace);
        } else {
            p.put_back_token(whitespace);
        }
    }

    if is_markup {
        if at_transition && !is_single_line_markup {
            p.error(
                ErrorKind::AtInCodeMustBeFollowedByColonParenOrIdentifierStart,
                transition_location,
                1,
            );
        }
        p.output(SpanKind::Code);
        other_parser_block(p);
    } else {
        handle_statement(p, block);
    }
}

/// Accept whitespace and newlines, except a trailing whitespace run, which is
/// read and returned.
fn accept_whitespace_in_lines<'s>(p: &mut Parser<'s>) -> Option<Token<'s>> {
    let mut last = None;
    while let Some(token) = p.current_token() {
        match token.kind {
            SyntaxKind::WHITESPACE => {
                if let Some(previous) = last.take() {
                    p.accept(previous);
                }
                last = Some(token);
                p.skip();
            }
            SyntaxKind::NEWLINE => {
                if let Some(previous) = last.take() {
                    p.accept(previous);
                }
                p.bump();
            }
            _ => break,
        }
    }
    last
}

fn handle_statement(p: &mut Parser<'_>, block: Option<BlockInfo>) {
    match p.current() {
        SyntaxKind::RAZOR_COMMENT_START => {
            p.output(SpanKind::Code);
            razor_comment(p);
            statement(p, block);
        }
        SyntaxKind::L_BRACE => {
            let block = block.unwrap_or_else(|| BlockInfo::new("code", p.location()));
            p.bump();
            p.guarded(|p| code_block(p, true, block));
        }
        SyntaxKind::KEYWORD => keywords::handle_keyword(p, false, standard_statement),
        SyntaxKind::TRANSITION => embedded_expression(p),
        SyntaxKind::R_BRACE => {}
        SyntaxKind::COMMENT => {
            p.bump();
        }
        _ => standard_statement(p),
    }
}

/// `@` inside code: `@@` escape or a nested block such as `@foo`.
fn embedded_expression(p: &mut Parser<'_>) {
    let Some(transition) = p.skip() else {
        return;
    };
    if p.at(SyntaxKind::TRANSITION) {
        p.output(SpanKind::Code);
        p.accept(transition);
        p.span_mut().chunk_generator = ChunkGenerator::None;
        p.output(SpanKind::Code);
        p.bump();
        standard_statement(p);
    } else {
        if p.at(SyntaxKind::L_BRACE) {
            p.error_here(ErrorKind::UnexpectedNestedCodeBlock, 1);
        }
        p.put_back_token(transition);
        p.add_marker_symbol_if_necessary();
        nested_block(p);
    }
}

/// A plain statement, read up to `;` or a brace, balancing brackets on the way.
pub(super) fn standard_statement(p: &mut Parser<'_>) {
    while !p.at_end() {
        let bookmark = p.position();
        let read = p.read_while(|t| {
            !matches!(
                t.kind,
                SyntaxKind::SEMICOLON
                    | SyntaxKind::RAZOR_COMMENT_START
                    | SyntaxKind::TRANSITION
                    | SyntaxKind::L_BRACE
                    | SyntaxKind::L_PAREN
                    | SyntaxKind::L_BRACKET
                    | SyntaxKind::R_BRACE
            )
        });
        match p.current() {
            SyntaxKind::L_BRACE | SyntaxKind::L_PAREN | SyntaxKind::L_BRACKET => {
                p.accept_tokens(read);
                if balance(p, Balancing::BACKTRACK_WITH_TEMPLATES) {
                    p.eat(SyntaxKind::R_BRACE);
                } else {
                    p.accept_until(&[SyntaxKind::L_ANGLE, SyntaxKind::R_BRACE]);
                    return;
                }
            }
            SyntaxKind::TRANSITION if matches!(p.nth(1), SyntaxKind::L_ANGLE | SyntaxKind::COLON) => {
                p.accept_tokens(read);
                p.output(SpanKind::Code);
                template(p);
            }
            SyntaxKind::RAZOR_COMMENT_START => {
                p.accept_tokens(read);
                razor_comment(p);
            }
            SyntaxKind::SEMICOLON => {
                p.accept_tokens(read);
                p.bump();
                return;
            }
            SyntaxKind::R_BRACE => {
                p.accept_tokens(read);
                return;
            }
            _ => {
                p.seek(bookmark);
                p.accept_until(&[SyntaxKind::L_ANGLE, SyntaxKind::L_BRACE, SyntaxKind::R_BRACE]);
                return;
            }
        }
    }
}

/// Statements up to the closing `}` of `block`.
pub(super) fn code_block(p: &mut Parser<'_>, accept_terminator: bool, block: BlockInfo) {
    while !p.at_end() && !p.at(SyntaxKind::R_BRACE) {
        let before = p.position();
        statement(p, None);
        if p.position() == before {
            p.bump();
        }
    }
    if p.at_end() {
        p.error(
            ErrorKind::ExpectedEndOfBlockBeforeEof {
                block_name: block.name,
                close: "}".into(),
                open: "{".into(),
            },
            block.start,
            1,
        );
    } else if accept_terminator {
        p.span_mut().set_accepted(AcceptedCharacters::None);
        p.bump();
    }
}
