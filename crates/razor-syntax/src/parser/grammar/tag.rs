//! Tags and the other `<...>` forms.
//!
//! Two entry points with different needs:
//!
//! - [`tag_block`] parses markup that started inside code. It keeps a stack
//!   of open tags, since the markup block ends where the outermost tag is
//!   closed, and reports unbalanced tags.
//! - [`scan_tag_in_document_context`] parses one tag in a document or a
//!   section, where nothing depends on balance.
//!
//! Attributes are parsed into their own Markup blocks in both cases, so
//! values containing code can be told apart from literal ones.

use crate::errors::ErrorKind;
use crate::lexer::Token;
use crate::location::SourceLocation;
use crate::parser::{BlockMarker, Parser};
use crate::syntax_kind::SyntaxKind;
use crate::tree::{
    AcceptedCharacters, Block, BlockType, ChunkGenerator, LocationTagged, Span, SpanKind,
    SyntaxTreeNode,
};

use super::markup::{other_parser_block, skip_to_and_parse_code, until};
use super::spacing;

const TEXT_TAG: &str = "text";
const SCRIPT_TAG: &str = "script";

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "command", "embed", "hr", "img", "input", "keygen", "link",
    "meta", "param", "source", "track", "wbr",
];

fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.iter().any(|void| void.eq_ignore_ascii_case(name))
}

/// An open start tag: its name and the location of its `<`.
#[derive(Debug, Clone)]
struct TagInfo {
    name: String,
    start: SourceLocation,
}

/// Name of the tag at the cursor: `!name` for an escaped tag, empty when
/// no name follows.
fn tag_name(p: &Parser<'_>) -> String {
    match p.current() {
        SyntaxKind::BANG if p.nth(1) == SyntaxKind::TEXT => format!("!{}", p.nth_text(1)),
        SyntaxKind::TEXT => p.current_text().to_string(),
        _ => String::new(),
    }
}

// === Markup blocks inside code ===

/// Tags from the cursor until every start tag seen has been closed.
pub(super) fn tag_block<'s>(p: &mut Parser<'s>) {
    let mut tags: Vec<TagInfo> = Vec::new();
    let mut complete = false;
    loop {
        skip_to_and_parse_code(p, until(SyntaxKind::L_ANGLE));
        p.output(SpanKind::Markup);

        let at_special = at_special_tag(p);
        let mut marker = if !p.at_end() && !at_special {
            Some(p.start_block(BlockType::Tag))
        } else {
            None
        };

        if p.at_end() {
            end_tag_block(p, &mut tags, true);
        } else {
            let tag_start = p.location();
            if let Some(open) = p.skip() {
                if p.at_end() {
                    if tags.is_empty() {
                        p.error_here(ErrorKind::OuterTagMissingName, 1);
                    }
                    p.accept(open);
                    end_tag_block(p, &mut tags, false);
                } else {
                    complete = after_tag_start(p, open, tag_start, &mut tags, at_special, &mut marker);
                }
            }
        }

        if complete {
            p.span_mut().set_accepted(AcceptedCharacters::None);
        }
        p.output(SpanKind::Markup);
        if let Some(marker) = marker.take() {
            marker.end(p);
        }

        if tags.is_empty() {
            break;
        }
    }
    end_tag_block(p, &mut tags, complete);
}

fn after_tag_start<'s>(
    p: &mut Parser<'s>,
    open: Token<'s>,
    tag_start: SourceLocation,
    tags: &mut Vec<TagInfo>,
    at_special: bool,
    marker: &mut Option<BlockMarker>,
) -> bool {
    match p.current() {
        SyntaxKind::SLASH => end_tag(p, open, tag_start, tags, marker),
        SyntaxKind::BANG if at_special => {
            p.accept(open);
            bang_tag(p)
        }
        SyntaxKind::QUESTION => {
            p.accept(open);
            xml_pi(p)
        }
        _ => start_tag(p, open, tag_start, tags, marker),
    }
}

fn start_tag<'s>(
    p: &mut Parser<'s>,
    open: Token<'s>,
    tag_start: SourceLocation,
    tags: &mut Vec<TagInfo>,
    marker: &mut Option<BlockMarker>,
) -> bool {
    let tag = TagInfo {
        name: tag_name(p),
        start: tag_start,
    };

    // `<!text>` is an ordinary escaped tag, only the bare name is special
    if tags.is_empty() && tag.name.eq_ignore_ascii_case(TEXT_TAG) {
        p.output(SpanKind::Markup);
        p.span_mut().chunk_generator = ChunkGenerator::None;
        p.accept(open);
        let text_location = p.location();
        p.bump();

        let mut bookmark = p.position();
        let mut whitespace = p.read_while(spacing(true, false));
        let empty = p.at(SyntaxKind::SLASH);
        if empty {
            p.accept_tokens(whitespace);
            p.bump();
            bookmark = p.position();
            whitespace = p.read_while(spacing(true, false));
        }

        if p.at(SyntaxKind::R_ANGLE) {
            p.accept_tokens(whitespace);
            p.bump();
            p.span_mut().set_accepted(AcceptedCharacters::None);
        } else {
            p.seek(bookmark);
            p.error(ErrorKind::TextTagCannotContainAttributes, text_location, TEXT_TAG.len());
            recover_text_tag(p);
        }

        if !empty {
            tags.push(tag);
        }
        let accepted = p.span().edit_handler.accepted;
        complete_tag_block_with_span(p, marker, accepted, SpanKind::Transition);
        return true;
    }

    p.accept(open);
    optional_bang_escape(p);
    p.eat(SyntaxKind::TEXT);
    rest_of_tag(p, tag, tags, marker)
}

fn rest_of_tag(
    p: &mut Parser<'_>,
    tag: TagInfo,
    tags: &mut Vec<TagInfo>,
    marker: &mut Option<BlockMarker>,
) -> bool {
    tag_content(p);
    if p.at(SyntaxKind::L_ANGLE) {
        return false;
    }

    let is_empty = p.eat(SyntaxKind::SLASH);
    let seen_close = p.eat(SyntaxKind::R_ANGLE);
    if !seen_close {
        p.error(
            ErrorKind::UnfinishedTag(tag.name.clone()),
            tag.start.advance("<"),
            tag.name.len().max(1),
        );
        return false;
    }
    if is_empty {
        return true;
    }

    let name = tag.name.trim().to_string();
    if is_void_element(&name) {
        complete_tag_block_with_span(p, marker, AcceptedCharacters::None, SpanKind::Markup);

        // void elements may still be followed by a stray end tag
        let bookmark = p.position();
        let whitespace = p.read_while(spacing(true, false));
        let at_end_tag = p.at(SyntaxKind::L_ANGLE)
            && p.nth(1) == SyntaxKind::SLASH
            && p.nth(2) == SyntaxKind::TEXT
            && p.nth_text(2).eq_ignore_ascii_case(&name);
        if at_end_tag {
            p.accept_tokens(whitespace);
            p.output(SpanKind::Markup);
            return p.in_block(BlockType::Tag, |p| {
                p.bump();
                p.bump();
                p.bump();
                p.accept_until(&[SyntaxKind::R_ANGLE, SyntaxKind::L_ANGLE]);
                let complete = p.eat(SyntaxKind::R_ANGLE);
                if complete {
                    p.span_mut().set_accepted(AcceptedCharacters::None);
                }
                p.output(SpanKind::Markup);
                complete
            });
        }
        p.seek(bookmark);
    } else if name.eq_ignore_ascii_case(SCRIPT_TAG) && !current_script_tag_expects_html(p) {
        complete_tag_block_with_span(p, marker, AcceptedCharacters::None, SpanKind::Markup);
        skip_to_end_script_and_parse_code(p, AcceptedCharacters::None);
    } else {
        tags.push(tag);
    }
    true
}

fn end_tag<'s>(
    p: &mut Parser<'s>,
    open: Token<'s>,
    tag_start: SourceLocation,
    tags: &mut Vec<TagInfo>,
    marker: &mut Option<BlockMarker>,
) -> bool {
    let Some(slash) = p.skip() else {
        p.accept(open);
        return false;
    };
    if p.at_end() {
        p.accept(open);
        p.accept(slash);
        return false;
    }

    let name = tag_name(p);
    let matched = remove_tag(p, tags, &name, tag_start);
    // `</!text>` is an ordinary escaped end tag
    if tags.is_empty() && matched && name.eq_ignore_ascii_case(TEXT_TAG) {
        return end_text_tag(p, open, slash, marker);
    }

    p.accept(open);
    p.accept(slash);
    optional_bang_escape(p);
    p.accept_until(&[SyntaxKind::R_ANGLE]);
    p.eat(SyntaxKind::R_ANGLE)
}

/// Pop open tags until one named `name`; report what was left unmatched.
fn remove_tag(p: &mut Parser<'_>, tags: &mut Vec<TagInfo>, name: &str, tag_start: SourceLocation) -> bool {
    let mut last = None;
    while let Some(tag) = tags.pop() {
        if tag.name.eq_ignore_ascii_case(name) {
            return true;
        }
        last = Some(tag);
    }
    match last {
        Some(tag) => {
            let length = tag.name.len();
            p.error(ErrorKind::MissingEndTag(tag.name), tag.start.advance("<"), length);
        }
        None => p.error(
            ErrorKind::UnexpectedEndTag(name.to_string()),
            tag_start.advance("</"),
            name.len(),
        ),
    }
    false
}

fn end_text_tag<'s>(
    p: &mut Parser<'s>,
    open: Token<'s>,
    slash: Token<'s>,
    marker: &mut Option<BlockMarker>,
) -> bool {
    p.accept(open);
    p.accept(slash);
    let text_location = p.location();
    p.bump();

    let seen_close = p.eat(SyntaxKind::R_ANGLE);
    if seen_close {
        p.span_mut().set_accepted(AcceptedCharacters::None);
    } else {
        p.error(ErrorKind::TextTagCannotContainAttributes, text_location, TEXT_TAG.len());
        p.span_mut().set_accepted(AcceptedCharacters::Any);
        recover_text_tag(p);
    }

    p.span_mut().chunk_generator = ChunkGenerator::None;
    let accepted = p.span().edit_handler.accepted;
    complete_tag_block_with_span(p, marker, accepted, SpanKind::Transition);
    seen_close
}

fn recover_text_tag(p: &mut Parser<'_>) {
    p.accept_until(&[SyntaxKind::R_ANGLE, SyntaxKind::NEWLINE]);
    p.eat(SyntaxKind::R_ANGLE);
}

fn complete_tag_block_with_span(
    p: &mut Parser<'_>,
    marker: &mut Option<BlockMarker>,
    accepted: AcceptedCharacters,
    kind: SpanKind,
) {
    p.span_mut().set_accepted(accepted);
    p.output(kind);
    if let Some(marker) = marker.take() {
        marker.end(p);
    }
}

/// Close the markup block: report the outermost tag still open, then keep
/// trailing whitespace and one newline unless code follows a `</text>`.
fn end_tag_block(p: &mut Parser<'_>, tags: &mut Vec<TagInfo>, complete: bool) {
    if let Some(outer) = tags.first() {
        let length = outer.name.len();
        let location = outer.start.advance("<");
        p.error(ErrorKind::MissingEndTag(outer.name.clone()), location, length);
    } else if complete {
        p.span_mut().set_accepted(AcceptedCharacters::None);
    }
    tags.clear();

    let accept_trailing = if !p.design_time() {
        let mut markup_follows = true;
        if p.builder.last_span_kind() == Some(SpanKind::Transition) {
            let bookmark = p.position();
            p.read_while(spacing(true, false));
            markup_follows = p.at(SyntaxKind::L_ANGLE)
                || (p.at(SyntaxKind::TRANSITION) && p.nth_text(1).starts_with(':'));
            p.seek(bookmark);
        }
        markup_follows
    } else {
        p.span().edit_handler.accepted == AcceptedCharacters::Any
    };
    if accept_trailing {
        p.accept_while(|t| t.kind == SyntaxKind::WHITESPACE);
        p.eat(SyntaxKind::NEWLINE);
    }

    if !complete {
        p.add_marker_symbol_if_necessary();
    }
    p.output(SpanKind::Markup);
}

// === Special tags ===

/// `<!--`, `<!DOCTYPE`, `<![CDATA[` or `<?` at the cursor.
fn at_special_tag(p: &Parser<'_>) -> bool {
    if !p.at(SyntaxKind::L_ANGLE) {
        return false;
    }
    if p.nth(1) == SyntaxKind::BANG {
        !is_bang_escape(p, 1)
    } else {
        p.nth(1) == SyntaxKind::QUESTION
    }
}

/// `!name` where name is not `DOCTYPE`: a tag the author asked us to treat
/// as plain markup.
fn is_bang_escape(p: &Parser<'_>, lookahead: usize) -> bool {
    p.nth(lookahead) == SyntaxKind::BANG
        && p.nth(lookahead + 1) == SyntaxKind::TEXT
        && !p.nth_text(lookahead + 1).eq_ignore_ascii_case("DOCTYPE")
}

fn optional_bang_escape(p: &mut Parser<'_>) {
    if is_bang_escape(p, 0) {
        p.output(SpanKind::Markup);
        p.bump();
        p.span_mut().chunk_generator = ChunkGenerator::None;
        p.output_with(SpanKind::MetaCode, AcceptedCharacters::None);
    }
}

/// `<? ... ?>`; the `<` is already accepted.
fn xml_pi(p: &mut Parser<'_>) -> bool {
    p.bump();
    accept_until_all(p, &[SyntaxKind::QUESTION, SyntaxKind::R_ANGLE])
}

/// `<!-- -->`, `<![CDATA[ ]]>` or `<!DOCTYPE ...>`; the `<` is already
/// accepted.
fn bang_tag(p: &mut Parser<'_>) -> bool {
    if !p.bump() {
        return false;
    }
    match p.current() {
        SyntaxKind::DOUBLE_HYPHEN => {
            p.bump();
            p.span_mut().set_accepted(AcceptedCharacters::Any);
            while !p.at_end() {
                skip_to_and_parse_code(p, until(SyntaxKind::DOUBLE_HYPHEN));
                if p.at(SyntaxKind::DOUBLE_HYPHEN) {
                    p.accept_while(|t| t.kind == SyntaxKind::DOUBLE_HYPHEN);
                    if p.at(SyntaxKind::TEXT) && p.current_text() == "-" {
                        p.bump();
                    }
                    if p.at(SyntaxKind::R_ANGLE) {
                        p.bump();
                        return true;
                    }
                }
            }
            false
        }
        SyntaxKind::L_BRACKET => p.bump() && cdata(p),
        _ => {
            p.bump();
            accept_until_all(p, &[SyntaxKind::R_ANGLE])
        }
    }
}

fn cdata(p: &mut Parser<'_>) -> bool {
    let at_cdata = p.at(SyntaxKind::TEXT) && p.current_text().eq_ignore_ascii_case("cdata");
    if at_cdata && p.bump() && p.at(SyntaxKind::L_BRACKET) {
        return accept_until_all(p, &[SyntaxKind::R_BRACKET, SyntaxKind::R_BRACKET, SyntaxKind::R_ANGLE]);
    }
    false
}

/// Accept markup (running code found in it) until the whole `sequence` has
/// been accepted in a row.
fn accept_until_all(p: &mut Parser<'_>, sequence: &[SyntaxKind]) -> bool {
    let Some(&first) = sequence.first() else {
        return true;
    };
    while !p.at_end() {
        skip_to_and_parse_code(p, until(first));
        if p.accept_all(sequence) {
            return true;
        }
    }
    p.span_mut().set_accepted(AcceptedCharacters::Any);
    false
}

// === Tag content and attributes ===

fn tag_content(p: &mut Parser<'_>) {
    if !p.at(SyntaxKind::WHITESPACE) && !p.at(SyntaxKind::NEWLINE) {
        // right after the name only whitespace may follow
        recover_to_end_of_tag(p);
        return;
    }
    while !p.at_end() && !is_end_of_tag(p) {
        before_attribute(p);
    }
}

/// At `/>`, `>` or `<`; a stray `/` is accepted on the way.
fn is_end_of_tag(p: &mut Parser<'_>) -> bool {
    if p.at(SyntaxKind::SLASH) {
        if p.next_is(SyntaxKind::R_ANGLE) {
            return true;
        }
        p.bump();
    }
    p.at(SyntaxKind::R_ANGLE) || p.at(SyntaxKind::L_ANGLE)
}

fn is_valid_attribute_name(token: &Token<'_>) -> bool {
    !matches!(
        token.kind,
        SyntaxKind::WHITESPACE
            | SyntaxKind::NEWLINE
            | SyntaxKind::R_ANGLE
            | SyntaxKind::L_ANGLE
            | SyntaxKind::SLASH
            | SyntaxKind::DOUBLE_QUOTE
            | SyntaxKind::SINGLE_QUOTE
            | SyntaxKind::EQ
            | SyntaxKind::TRANSITION
            | SyntaxKind::RAZOR_COMMENT_START
    )
}

fn before_attribute<'s>(p: &mut Parser<'s>) {
    let whitespace = p.read_while(spacing(true, false));
    if !p.current_token().is_some_and(|t| is_valid_attribute_name(&t)) {
        p.accept_tokens(whitespace);
        recover_to_end_of_tag(p);
        return;
    }

    let mut name = Vec::new();
    while let Some(token) = p.current_token() {
        let ends_name = matches!(
            token.kind,
            SyntaxKind::WHITESPACE
                | SyntaxKind::NEWLINE
                | SyntaxKind::EQ
                | SyntaxKind::R_ANGLE
                | SyntaxKind::L_ANGLE
        ) || (token.kind == SyntaxKind::SLASH && p.next_is(SyntaxKind::R_ANGLE));
        if ends_name {
            break;
        }
        name.push(token);
        p.skip();
    }
    let after_name = p.read_while(spacing(true, false));

    if !p.at(SyntaxKind::EQ) {
        // minimized attribute
        p.put_back(&after_name);
        p.output(SpanKind::Markup);
        p.in_block(BlockType::Markup, |p| {
            p.accept_tokens(whitespace);
            p.accept_tokens(name);
            p.output(SpanKind::Markup);
        });
        return;
    }

    p.output(SpanKind::Markup);
    p.in_block(BlockType::Markup, |p| attribute_prefix(p, whitespace, name, after_name));
}

/// `name="value"`. Attributes that may be dropped when their value is
/// null get an Attribute block with one child block or span per value
/// part; `data-` attributes are always written out and stay plain markup.
fn attribute_prefix<'s>(
    p: &mut Parser<'s>,
    whitespace: Vec<Token<'s>>,
    name_tokens: Vec<Token<'s>>,
    after_name: Vec<Token<'s>>,
) {
    let name: String = name_tokens.iter().map(|t| t.text).collect();
    let can_be_conditional = !name
        .get(..5)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("data-"));

    p.accept_tokens(whitespace);
    p.accept_tokens(name_tokens);
    p.accept_tokens(after_name);
    p.bump();

    let after_equals = p.read_while(spacing(true, false));
    let whitespace_after_equals = !after_equals.is_empty();
    let mut quote = None;
    if p.at(SyntaxKind::DOUBLE_QUOTE) || p.at(SyntaxKind::SINGLE_QUOTE) {
        p.accept_tokens(after_equals);
        quote = Some(p.current());
        p.bump();
    } else {
        p.put_back(&after_equals);
    }
    let prefix = LocationTagged::new(p.span().content(), p.span().start);

    if !can_be_conditional {
        p.output(SpanKind::Markup);
        if quote.is_none() && whitespace_after_equals {
            return;
        }
        skip_to_and_parse_code(p, |p, t| is_end_of_attribute_value(p, t, quote));
        p.output(SpanKind::Markup);
        if let Some(quote) = quote {
            p.eat(quote);
        }
        p.output(SpanKind::Markup);
        return;
    }

    p.span_mut().chunk_generator = ChunkGenerator::None;
    p.output(SpanKind::Markup);
    if quote.is_some() || !whitespace_after_equals {
        while !at_end_of_attribute_value(p, quote) {
            attribute_value(p, quote);
        }
    }

    let mut suffix = LocationTagged::new("", p.location());
    if quote.is_some_and(|q| p.at(q)) {
        suffix = LocationTagged::new(p.current_text(), p.location());
        p.bump();
    }
    if !p.span().is_empty() {
        p.span_mut().chunk_generator = ChunkGenerator::None;
        p.output(SpanKind::Markup);
    }
    p.current_block_mut().chunk_generator = ChunkGenerator::Attribute { name, prefix, suffix };
}

/// One part of a conditional attribute value: `@@`, a code transition or a
/// literal word, each with the whitespace in front of it.
fn attribute_value(p: &mut Parser<'_>, quote: Option<SyntaxKind>) {
    let prefix_start = p.location();
    let prefix = p.read_while(spacing(true, false));
    let prefix_text: String = prefix.iter().map(|t| t.text).collect();
    let tagged_prefix = LocationTagged::new(prefix_text, prefix_start);

    if p.at(SyntaxKind::TRANSITION) {
        if p.next_is(SyntaxKind::TRANSITION) {
            p.in_block(BlockType::Markup, |p| {
                p.accept_tokens(prefix);
                let value = LocationTagged::new(p.current_text(), p.location());
                p.span_mut().chunk_generator = ChunkGenerator::LiteralAttribute {
                    prefix: tagged_prefix,
                    value: Some(value),
                };
                p.bump();
                p.output_with(SpanKind::Markup, AcceptedCharacters::None);
                p.span_mut().chunk_generator = ChunkGenerator::None;
                p.bump();
                p.output_with(SpanKind::Markup, AcceptedCharacters::None);
            });
        } else {
            p.accept_tokens(prefix);
            let value_start = p.location();
            p.span_mut().chunk_generator = ChunkGenerator::None;
            p.in_block(BlockType::Markup, |p| {
                p.current_block_mut().chunk_generator = ChunkGenerator::DynamicAttribute {
                    prefix: tagged_prefix,
                    value_start,
                };
                other_parser_block(p);
            });
        }
    } else {
        p.accept_tokens(prefix);
        let value_start = p.location();
        let mut value = String::new();
        while let Some(token) = p.current_token() {
            let ends_value = matches!(
                token.kind,
                SyntaxKind::WHITESPACE | SyntaxKind::NEWLINE | SyntaxKind::TRANSITION
            ) || is_end_of_attribute_value(p, &token, quote);
            if ends_value {
                break;
            }
            value.push_str(token.text);
            p.bump();
        }
        let location = if value.is_empty() { prefix_start } else { value_start };
        p.span_mut().chunk_generator = ChunkGenerator::LiteralAttribute {
            prefix: tagged_prefix,
            value: Some(LocationTagged::new(value, location)),
        };
    }
    p.output(SpanKind::Markup);
}

fn is_end_of_attribute_value(p: &Parser<'_>, token: &Token<'_>, quote: Option<SyntaxKind>) -> bool {
    match quote {
        Some(quote) => token.kind == quote,
        None => {
            matches!(
                token.kind,
                SyntaxKind::DOUBLE_QUOTE
                    | SyntaxKind::SINGLE_QUOTE
                    | SyntaxKind::L_ANGLE
                    | SyntaxKind::EQ
                    | SyntaxKind::R_ANGLE
                    | SyntaxKind::WHITESPACE
                    | SyntaxKind::NEWLINE
            ) || (token.kind == SyntaxKind::SLASH && p.next_is(SyntaxKind::R_ANGLE))
        }
    }
}

fn at_end_of_attribute_value(p: &Parser<'_>, quote: Option<SyntaxKind>) -> bool {
    p.current_token()
        .is_none_or(|t| is_end_of_attribute_value(p, &t, quote))
}

/// Skip to `>`, `/` or `<`, stepping over quoted strings.
fn recover_to_end_of_tag(p: &mut Parser<'_>) {
    while !p.at_end() {
        skip_to_and_parse_code(p, |_, t| {
            matches!(
                t.kind,
                SyntaxKind::R_ANGLE
                    | SyntaxKind::SLASH
                    | SyntaxKind::L_ANGLE
                    | SyntaxKind::SINGLE_QUOTE
                    | SyntaxKind::DOUBLE_QUOTE
            )
        });
        match p.current() {
            SyntaxKind::SINGLE_QUOTE | SyntaxKind::DOUBLE_QUOTE => parse_quoted(p),
            SyntaxKind::R_ANGLE | SyntaxKind::SLASH | SyntaxKind::L_ANGLE | SyntaxKind::EOF => return,
            _ => {
                p.bump();
            }
        }
    }
}

fn parse_quoted(p: &mut Parser<'_>) {
    let quote = p.current();
    p.bump();
    skip_to_and_parse_code(p, until(quote));
    p.eat(quote);
}

// === Script ===

/// `<script>` content is not markup unless the tag says `type="text/html"`.
fn current_script_tag_expects_html(p: &Parser<'_>) -> bool {
    let Some(tag) = p.builder.current_block() else {
        return false;
    };
    let type_attribute = tag
        .children
        .iter()
        .filter_map(SyntaxTreeNode::as_block)
        .filter(|b| matches!(b.chunk_generator, ChunkGenerator::Attribute { .. }) && b.children.len() >= 2)
        .find(|b| is_type_attribute(b));

    type_attribute.is_some_and(|attribute| {
        let value: String = attribute
            .children
            .iter()
            .filter_map(SyntaxTreeNode::as_span)
            .filter(|s| matches!(s.chunk_generator, ChunkGenerator::LiteralAttribute { .. }))
            .map(Span::content)
            .collect();
        value.trim().eq_ignore_ascii_case("text/html")
    })
}

fn is_type_attribute(block: &Block) -> bool {
    let Some(span) = block.children.first().and_then(SyntaxTreeNode::as_span) else {
        return false;
    };
    let content = span.content();
    let trimmed = content.trim_start();
    trimmed.get(..4).is_some_and(|name| name.eq_ignore_ascii_case("type"))
        && trimmed[4..]
            .chars()
            .next()
            .is_none_or(|c| matches!(c, ' ' | '\t' | '\r' | '\n' | '\u{0C}' | '='))
}

/// Script content up to and including `</script>`, with only code
/// transitions recognised inside.
fn skip_to_end_script_and_parse_code(p: &mut Parser<'_>, end_accepted: AcceptedCharacters) {
    let mut seen_end_script = false;
    while !seen_end_script && !p.at_end() {
        skip_to_and_parse_code(p, until(SyntaxKind::L_ANGLE));
        let tag_start = p.location();
        seen_end_script = p.nth(1) == SyntaxKind::SLASH
            && p.nth(2) == SyntaxKind::TEXT
            && p.nth_text(2).eq_ignore_ascii_case(SCRIPT_TAG);

        if seen_end_script {
            p.output(SpanKind::Markup);
            p.in_block(BlockType::Tag, |p| {
                p.span_mut().set_accepted(end_accepted);
                p.bump();
                p.bump();
                skip_to_and_parse_code(p, until(SyntaxKind::R_ANGLE));
                if !p.eat(SyntaxKind::R_ANGLE) {
                    p.error(
                        ErrorKind::UnfinishedTag(SCRIPT_TAG.into()),
                        tag_start.advance("</"),
                        SCRIPT_TAG.len(),
                    );
                }
                p.output(SpanKind::Markup);
            });
        } else {
            p.bump();
        }
    }
}

// === Document context ===

/// One tag in a document or section, where tags need not balance.
pub(super) fn scan_tag_in_document_context(p: &mut Parser<'_>) {
    if !p.at(SyntaxKind::L_ANGLE) {
        return;
    }
    if p.nth(1) == SyntaxKind::BANG {
        if !is_bang_escape(p, 1) {
            p.bump();
            bang_tag(p);
            return;
        }
    } else if p.nth(1) == SyntaxKind::QUESTION {
        p.bump();
        xml_pi(p);
        return;
    }

    p.output(SpanKind::Markup);
    let script_body_follows = p.in_block(BlockType::Tag, |p| {
        p.bump();
        let mut script_body_follows = false;
        if p.at(SyntaxKind::SLASH) {
            p.bump();
            optional_bang_escape(p);
            p.eat(SyntaxKind::TEXT);
            p.eat(SyntaxKind::WHITESPACE);
            p.eat(SyntaxKind::R_ANGLE);
        } else {
            optional_bang_escape(p);
            let script =
                p.at(SyntaxKind::TEXT) && p.current_text().eq_ignore_ascii_case(SCRIPT_TAG);
            p.eat(SyntaxKind::TEXT);
            tag_content(p);
            p.eat(SyntaxKind::SLASH);
            p.eat(SyntaxKind::R_ANGLE);
            script_body_follows = script && !current_script_tag_expects_html(p);
        }
        p.output(SpanKind::Markup);
        script_body_follows
    });
    if script_body_follows {
        skip_to_end_script_and_parse_code(p, AcceptedCharacters::Any);
    }
}
