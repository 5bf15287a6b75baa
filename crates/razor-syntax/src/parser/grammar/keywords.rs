//! Keyword blocks: `if`/`else`, loops, `try`/`catch`, `using`, `do`/`while`.
//!
//! Keyword statements never open blocks of their own. They only decide how
//! far the current code span extends, which braces must follow, and where
//! whitespace between clauses belongs.

use crate::errors::ErrorKind;
use crate::lexer::{Keyword, Token};
use crate::parser::Parser;
use crate::syntax_kind::SyntaxKind;
use crate::tree::{AcceptedCharacters, BlockType, ChunkGenerator, SpanKind};

use super::code::{
    Balancing, BlockInfo, balance, complete_block, implicit_expression, standard_statement,
    statement,
};
use super::{razor_comment, spacing};

/// Dispatch on the keyword at the cursor, or run `fallback` for keywords
/// with no statement form.
pub(super) fn handle_keyword(p: &mut Parser<'_>, top_level: bool, fallback: fn(&mut Parser<'_>)) {
    let Some(keyword) = p.current_keyword() else {
        fallback(p);
        return;
    };
    match keyword {
        Keyword::For | Keyword::Foreach | Keyword::While | Keyword::Switch | Keyword::Lock => {
            let block = keyword_info(p);
            conditional_block(p, block);
            if top_level {
                complete_block(p, true, true);
            }
        }
        Keyword::Case | Keyword::Default => {
            p.bump();
            p.accept_until(&[SyntaxKind::COLON]);
            p.eat(SyntaxKind::COLON);
        }
        Keyword::If => {
            let block = keyword_info(p);
            conditional_block(p, block);
            after_if_clause(p);
            if top_level {
                complete_block(p, true, true);
            }
        }
        Keyword::Try => {
            unconditional_block(p);
            after_try_clause(p);
            if top_level {
                complete_block(p, true, true);
            }
        }
        Keyword::Do => {
            unconditional_block(p);
            while_clause(p);
            if top_level {
                complete_block(p, true, true);
            }
        }
        Keyword::Using => using_keyword(p, top_level),
        Keyword::Namespace | Keyword::Class if top_level => reserved_directive(p),
        Keyword::Await => {
            p.bump();
            p.accept_while(spacing(false, true));
            if top_level {
                implicit_expression(p, AcceptedCharacters::AnyExceptNewline);
            }
        }
        _ => fallback(p),
    }
}

fn keyword_info(p: &Parser<'_>) -> BlockInfo {
    BlockInfo::new(p.current_text(), p.location())
}

/// `@namespace`, `@class`: reserved, reported, kept as a directive.
fn reserved_directive(p: &mut Parser<'_>) {
    let word = p.current_text();
    p.error_here(ErrorKind::ReservedWord(word.to_string()), word.len());
    p.bump();
    p.span_mut().set_accepted(AcceptedCharacters::None);
    p.span_mut().chunk_generator = ChunkGenerator::None;
    p.current_block_mut().block_type = BlockType::Directive;
    complete_block(p, true, true);
    p.output(SpanKind::MetaCode);
}

// === Shared pieces ===

/// A parenthesised condition, if one is at the cursor.
fn accept_condition(p: &mut Parser<'_>) -> bool {
    if !p.at(SyntaxKind::L_PAREN) {
        return true;
    }
    let complete = balance(p, Balancing::BACKTRACK_WITH_TEMPLATES);
    if complete {
        p.eat(SyntaxKind::R_PAREN);
    } else {
        p.accept_until(&[SyntaxKind::NEWLINE]);
    }
    complete
}

/// The body of a keyword statement, which must be a braced block.
fn expect_code_block(p: &mut Parser<'_>, block: BlockInfo) {
    if p.at_end() {
        return;
    }
    if !p.at(SyntaxKind::L_BRACE) {
        let found = p.current_text();
        p.error_here(
            ErrorKind::SingleLineControlFlowStatementsNotAllowed {
                expected: "{".into(),
                found: found.to_string(),
            },
            found.len(),
        );
    }
    statement(p, Some(block));
}

fn unconditional_block(p: &mut Parser<'_>) {
    let block = keyword_info(p);
    p.bump();
    p.accept_while(spacing(true, true));
    expect_code_block(p, block);
}

fn conditional_block(p: &mut Parser<'_>, block: BlockInfo) {
    p.bump();
    p.accept_while(spacing(true, true));
    if accept_condition(p) {
        p.accept_while(spacing(true, true));
        expect_code_block(p, block);
    }
}

/// Read spacing up to the next token that matters, accepting any razor
/// comments found on the way. The final spacing run is returned unaccepted.
fn skip_to_next_important_token<'s>(p: &mut Parser<'s>) -> Vec<Token<'s>> {
    while !p.at_end() {
        let whitespace = p.read_while(spacing(true, true));
        if p.at(SyntaxKind::RAZOR_COMMENT_START) {
            p.accept_tokens(whitespace);
            p.span_mut().set_accepted(AcceptedCharacters::Any);
            razor_comment(p);
        } else {
            return whitespace;
        }
    }
    Vec::new()
}

// === Clauses ===

fn after_if_clause(p: &mut Parser<'_>) {
    let whitespace = skip_to_next_important_token(p);
    if p.at_keyword(Keyword::Else) {
        p.accept_tokens(whitespace);
        else_clause(p);
    } else {
        p.put_back(&whitespace);
        p.span_mut().set_accepted(AcceptedCharacters::Any);
    }
}

fn else_clause(p: &mut Parser<'_>) {
    let mut block = keyword_info(p);
    p.bump();
    p.accept_while(spacing(true, true));
    if p.at_keyword(Keyword::If) {
        block.name = "else if".into();
        conditional_block(p, block);
        after_if_clause(p);
    } else if !p.at_end() {
        expect_code_block(p, block);
    }
}

fn after_try_clause(p: &mut Parser<'_>) {
    loop {
        let whitespace = skip_to_next_important_token(p);
        if p.at_keyword(Keyword::Catch) {
            p.accept_tokens(whitespace);
            filterable_catch_block(p);
        } else if p.at_keyword(Keyword::Finally) {
            p.accept_tokens(whitespace);
            unconditional_block(p);
            return;
        } else {
            p.put_back(&whitespace);
            p.span_mut().set_accepted(AcceptedCharacters::Any);
            return;
        }
    }
}

/// `catch (E e) when (cond) { }`
fn filterable_catch_block(p: &mut Parser<'_>) {
    let block = keyword_info(p);
    p.bump();
    p.accept_while(spacing(true, true));
    if !accept_condition(p) {
        return;
    }
    p.accept_while(spacing(true, true));
    if p.eat_keyword(Keyword::When) {
        p.accept_while(spacing(true, true));
        if !accept_condition(p) {
            return;
        }
        p.accept_while(spacing(true, true));
    }
    expect_code_block(p, block);
}

/// The `while (cond);` that ends a `do` statement.
fn while_clause(p: &mut Parser<'_>) {
    p.span_mut().set_accepted(AcceptedCharacters::Any);
    let whitespace = skip_to_next_important_token(p);
    if p.at_keyword(Keyword::While) {
        p.accept_tokens(whitespace);
        p.bump();
        p.accept_while(spacing(true, true));
        if accept_condition(p) && p.eat(SyntaxKind::SEMICOLON) {
            p.span_mut().set_accepted(AcceptedCharacters::None);
        }
    } else {
        p.put_back(&whitespace);
    }
}

// === using ===

fn using_keyword(p: &mut Parser<'_>, top_level: bool) {
    let block = keyword_info(p);
    p.bump();
    p.accept_while(spacing(false, true));

    if p.at(SyntaxKind::L_PAREN) {
        if accept_condition(p) {
            p.accept_while(spacing(true, true));
            expect_code_block(p, block);
        }
    } else if p.at(SyntaxKind::IDENT) || p.at_keyword(Keyword::Static) {
        if top_level {
            using_declaration(p);
        } else {
            p.error(
                ErrorKind::NamespaceImportWithinCodeBlock,
                block.start,
                block.name.len(),
            );
            standard_statement(p);
        }
    }

    if top_level {
        complete_block(p, true, true);
    }
}

/// `@using System.Text`, `@using Alias = Some.Type`, `@using static Math`.
fn using_declaration(p: &mut Parser<'_>) {
    p.current_block_mut().block_type = BlockType::Directive;

    if p.at(SyntaxKind::IDENT) {
        namespace_or_type_name(p);
        let whitespace = p.read_while(spacing(true, true));
        if p.at(SyntaxKind::EQ) {
            p.accept_tokens(whitespace);
            p.bump();
            p.accept_while(spacing(true, true));
            namespace_or_type_name(p);
        } else {
            p.put_back(&whitespace);
        }
    } else if p.eat_keyword(Keyword::Static) {
        p.accept_while(spacing(false, true));
        namespace_or_type_name(p);
    }

    p.span_mut().set_accepted(AcceptedCharacters::AnyExceptNewline);
    let namespace: String = p
        .span()
        .symbols
        .iter()
        .skip(1)
        .map(|s| s.content.as_str())
        .collect();
    p.span_mut().chunk_generator = ChunkGenerator::AddImport { namespace };

    if !p.at_end() {
        p.eat(SyntaxKind::SEMICOLON);
    }
}

fn namespace_or_type_name(p: &mut Parser<'_>) -> bool {
    if !(p.eat(SyntaxKind::IDENT) || p.eat(SyntaxKind::KEYWORD)) {
        return false;
    }
    if p.eat(SyntaxKind::DOUBLE_COLON) && !p.eat(SyntaxKind::IDENT) {
        p.eat(SyntaxKind::KEYWORD);
    }
    if p.at(SyntaxKind::L_ANGLE) {
        // type argument list
        balance(p, Balancing::NONE);
        p.eat(SyntaxKind::R_ANGLE);
    }
    if p.eat(SyntaxKind::DOT) {
        namespace_or_type_name(p);
    }
    if p.at(SyntaxKind::WHITESPACE) && p.next_is(SyntaxKind::QUESTION) {
        p.bump();
    }
    p.eat(SyntaxKind::QUESTION);
    while p.at(SyntaxKind::L_BRACKET) {
        balance(p, Balancing::NONE);
        p.eat(SyntaxKind::R_BRACKET);
    }
    true
}
