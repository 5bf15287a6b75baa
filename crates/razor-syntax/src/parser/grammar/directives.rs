//! Directives: identifiers after `@` that change the page rather than
//! produce output.
//!
//! | Directive          | Block     | Chunk generator   |
//! |--------------------|-----------|-------------------|
//! | `section Name { }` | Section   | `Section`         |
//! | `functions { }`    | Functions | `TypeMember`      |
//! | `inherits Type`    | Directive | `SetBaseType`     |
//! | `addTagHelper`     | Directive | `AddTagHelper`    |
//! | `removeTagHelper`  | Directive | `RemoveTagHelper` |
//! | `tagHelperPrefix`  | Directive | `TagHelperPrefix` |

use crate::errors::ErrorKind;
use crate::parser::Parser;
use crate::syntax_kind::SyntaxKind;
use crate::tree::{AcceptedCharacters, BlockType, ChunkGenerator, EditHandler, SpanKind};

use super::code::{Balancing, balance_from, complete_block, parse_with_other_parser};
use super::{markup, spacing};

pub(super) const SECTION: &str = "section";
pub(super) const FUNCTIONS: &str = "functions";
pub(super) const INHERITS: &str = "inherits";
pub(super) const ADD_TAG_HELPER: &str = "addTagHelper";
pub(super) const REMOVE_TAG_HELPER: &str = "removeTagHelper";
pub(super) const TAG_HELPER_PREFIX: &str = "tagHelperPrefix";

/// The parser for a directive name, if it is one.
pub(super) fn handler_for(name: &str) -> Option<fn(&mut Parser<'_>)> {
    let handler: fn(&mut Parser<'_>) = match name {
        SECTION => section,
        FUNCTIONS => functions,
        INHERITS => inherits,
        ADD_TAG_HELPER => |p| tag_helper(p, ADD_TAG_HELPER),
        REMOVE_TAG_HELPER => |p| tag_helper(p, REMOVE_TAG_HELPER),
        TAG_HELPER_PREFIX => |p| tag_helper(p, TAG_HELPER_PREFIX),
        _ => return None,
    };
    Some(handler)
}

/// `@section Name { markup }`
fn section(p: &mut Parser<'_>) {
    let nested = p.is_within(BlockType::Section);
    let mut error_reported = false;
    p.current_block_mut().block_type = BlockType::Section;

    let keyword_start = p.position();
    p.bump();
    if nested {
        // cover the transition too
        let start = match keyword_start.checked_sub(1) {
            Some(at) if p.source().as_bytes().get(at) == Some(&b'@') => at,
            _ => keyword_start,
        };
        let length = p.position() - start;
        let location = p.location_at(start);
        p.error(ErrorKind::SectionsCannotBeNested, location, length);
        error_reported = true;
    }

    let whitespace = p.read_while(spacing(true, false));
    let mut name = String::new();
    if p.required(
        SyntaxKind::IDENT,
        true,
        ErrorKind::UnexpectedCharacterAtSectionNameStart,
    ) {
        p.accept_tokens(whitespace);
        name = p.current_text().to_string();
        p.bump();
    } else {
        error_reported = true;
        p.put_back(&whitespace);
        p.accept_while(spacing(false, false));
    }
    p.current_block_mut().chunk_generator = ChunkGenerator::Section { name: name.clone() };

    let whitespace = p.read_while(spacing(true, false));
    let error_location = p.location();
    if !p.at(SyntaxKind::L_BRACE) {
        if !error_reported {
            p.error(ErrorKind::MissingOpenBraceAfterSection(name), error_location, 1);
        }
        p.put_back(&whitespace);
        p.accept_while(spacing(false, false));
        p.eat(SyntaxKind::NEWLINE);
        p.output(SpanKind::MetaCode);
        complete_block(p, true, true);
        return;
    }
    p.accept_tokens(whitespace);

    let brace_start = p.location();
    p.span_mut().edit_handler = EditHandler::auto_complete(AcceptedCharacters::Any, true);
    p.bump();
    p.output(SpanKind::MetaCode);

    parse_with_other_parser(p, markup::parse_section);

    p.span_mut().chunk_generator = ChunkGenerator::None;
    if p.eat(SyntaxKind::R_BRACE) {
        p.span_mut().set_accepted(AcceptedCharacters::None);
    } else {
        p.set_auto_complete_string("}");
        p.error(
            ErrorKind::ExpectedEndOfBlockBeforeEof {
                block_name: SECTION.into(),
                close: "}".into(),
                open: "{".into(),
            },
            brace_start,
            1,
        );
    }
    complete_block(p, false, true);
    p.output(SpanKind::MetaCode);
}

/// `@functions { members }`
fn functions(p: &mut Parser<'_>) {
    p.current_block_mut().block_type = BlockType::Functions;
    p.bump();
    p.accept_while(spacing(true, false));

    if !p.at(SyntaxKind::L_BRACE) {
        p.error_here(ErrorKind::Expected("{".into()), 1);
        complete_block(p, true, true);
        p.output(SpanKind::MetaCode);
        return;
    }
    p.span_mut().set_accepted(AcceptedCharacters::None);

    let block_start = p.location();
    p.bump();
    p.output(SpanKind::MetaCode);

    p.span_mut().edit_handler = EditHandler::auto_complete(AcceptedCharacters::Any, false);
    balance_from(
        p,
        Balancing::NO_ERROR,
        SyntaxKind::L_BRACE,
        SyntaxKind::R_BRACE,
        block_start,
    );
    p.span_mut().chunk_generator = ChunkGenerator::TypeMember;

    if p.at(SyntaxKind::R_BRACE) {
        p.output(SpanKind::Code);
        p.span_mut().chunk_generator = ChunkGenerator::None;
        p.span_mut().set_accepted(AcceptedCharacters::None);
        p.bump();
        complete_block(p, true, true);
        p.output(SpanKind::MetaCode);
    } else {
        p.set_auto_complete_string("}");
        p.error(
            ErrorKind::ExpectedEndOfBlockBeforeEof {
                block_name: FUNCTIONS.into(),
                close: "}".into(),
                open: "{".into(),
            },
            block_start,
            1,
        );
        complete_block(p, true, true);
        p.output(SpanKind::Code);
    }
}

/// `@inherits Type`, up to the end of the line.
fn inherits(p: &mut Parser<'_>) {
    let keyword_start = p.location();
    p.bump();
    let keyword_length = p.span().content_len();
    p.current_block_mut().block_type = BlockType::Directive;

    // one whitespace character belongs to the keyword
    if p.at(SyntaxKind::WHITESPACE) {
        let first = p.current_text().chars().next().map_or(1, char::len_utf8);
        p.bump_raw(SyntaxKind::WHITESPACE, first);
    }
    if p.span().symbols.len() > 1 {
        p.span_mut().set_accepted(AcceptedCharacters::None);
    }
    p.output(SpanKind::MetaCode);

    p.accept_while(spacing(false, true));
    if p.at_end() || p.at(SyntaxKind::NEWLINE) {
        p.error(
            ErrorKind::InheritsKeywordMustBeFollowedByTypeName,
            keyword_start,
            keyword_length,
        );
    }

    p.accept_until(&[SyntaxKind::NEWLINE]);
    if !p.design_time() {
        p.eat(SyntaxKind::NEWLINE);
    }

    let base_type = p.span().content().trim().to_string();
    p.span_mut().chunk_generator = ChunkGenerator::SetBaseType { base_type };
    complete_block(p, true, true);
    p.output_with(SpanKind::Code, AcceptedCharacters::AnyExceptNewline);
}

/// `@addTagHelper`, `@removeTagHelper`, `@tagHelperPrefix`: one value to the
/// end of the line, optionally quoted.
fn tag_helper(p: &mut Parser<'_>, keyword: &str) {
    let keyword_start = p.location();
    p.bump();
    p.current_block_mut().block_type = BlockType::Directive;
    let keyword_length = p.span().content_len();

    let found_whitespace = p.at(SyntaxKind::WHITESPACE);
    p.accept_while(|t| t.kind == SyntaxKind::WHITESPACE);
    // edits inside that whitespace could split the directive
    let accepted = if found_whitespace {
        AcceptedCharacters::None
    } else {
        AcceptedCharacters::AnyExceptNewline
    };
    p.output_with(SpanKind::MetaCode, accepted);

    let value = if p.at_end() || p.at(SyntaxKind::NEWLINE) {
        p.error(
            ErrorKind::DirectiveMustHaveValue(keyword.to_string()),
            keyword_start,
            keyword_length,
        );
        String::new()
    } else {
        let value_start = p.location();
        p.accept_until(&[SyntaxKind::NEWLINE]);
        let raw = p.span().content();
        let raw = raw.trim();
        let starts_with_quote = raw.starts_with('"');
        let ends_with_quote = raw.ends_with('"');
        if starts_with_quote != ends_with_quote {
            p.error(
                ErrorKind::IncompleteQuotesAroundDirective(keyword.to_string()),
                value_start,
                raw.len(),
            );
            raw.to_string()
        } else if starts_with_quote && raw.len() > 2 {
            raw[1..raw.len() - 1].to_string()
        } else if starts_with_quote {
            String::new()
        } else {
            raw.to_string()
        }
    };

    p.span_mut().chunk_generator = match keyword {
        ADD_TAG_HELPER => ChunkGenerator::AddTagHelper { lookup: value },
        REMOVE_TAG_HELPER => ChunkGenerator::RemoveTagHelper { lookup: value },
        _ => ChunkGenerator::TagHelperPrefix { prefix: value },
    };
    complete_block(p, true, true);
    p.output_with(SpanKind::Code, AcceptedCharacters::AnyExceptNewline);
}
