//! Markup-mode token enum.

use logos::{Lexer, Logos};

use crate::syntax_kind::SyntaxKind;

/// Characters that end a run of markup text.
fn is_text_stop(c: char) -> bool {
    matches!(
        c,
        ' ' | '\t'
            | '\u{0C}'
            | '\r'
            | '\n'
            | '<'
            | '>'
            | '/'
            | '!'
            | '?'
            | '='
            | '"'
            | '\''
            | '['
            | ']'
            | '@'
            | '{'
            | '}'
            | '-'
    )
}

/// Extends a text run over `@` when it sits between two alphanumerics, so
/// `name@host.com` stays literal text.
fn email_address(lex: &mut Lexer<MarkupToken>) -> bool {
    loop {
        let prev = lex.slice().chars().next_back();
        let rest = lex.remainder();
        let mut chars = rest.chars();
        if chars.next() != Some('@') {
            return true;
        }
        let next = chars.next();
        if !(prev.is_some_and(char::is_alphanumeric) && next.is_some_and(char::is_alphanumeric)) {
            return true;
        }
        let tail = &rest[1..];
        let run = tail.find(is_text_stop).unwrap_or(tail.len());
        lex.bump(1 + run);
    }
}

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkupToken {
    #[regex(r"[ \t\x0C]+")]
    Whitespace,

    #[regex(r"\r\n|\r|\n")]
    Newline,

    #[token("@")]
    Transition,

    #[token("@*")]
    RazorCommentStart,

    #[token("<")]
    LAngle,

    #[token(">")]
    RAngle,

    #[token("/")]
    Slash,

    #[token("!")]
    Bang,

    #[token("?")]
    Question,

    #[token("=")]
    Eq,

    #[token("\"")]
    DoubleQuote,

    #[token("'")]
    SingleQuote,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token("--")]
    DoubleHyphen,

    /// A lone `-`, `{` or `}`, kept apart from text runs
    #[token("-")]
    #[token("{")]
    #[token("}")]
    Punct,

    #[regex(r#"[^ \t\x0C\r\n<>/!?="'\[\]@{}-]+"#, email_address)]
    Text,
}

impl MarkupToken {
    pub fn to_syntax_kind(self) -> SyntaxKind {
        match self {
            MarkupToken::Whitespace => SyntaxKind::WHITESPACE,
            MarkupToken::Newline => SyntaxKind::NEWLINE,
            MarkupToken::Transition => SyntaxKind::TRANSITION,
            MarkupToken::RazorCommentStart => SyntaxKind::RAZOR_COMMENT_START,
            MarkupToken::LAngle => SyntaxKind::L_ANGLE,
            MarkupToken::RAngle => SyntaxKind::R_ANGLE,
            MarkupToken::Slash => SyntaxKind::SLASH,
            MarkupToken::Bang => SyntaxKind::BANG,
            MarkupToken::Question => SyntaxKind::QUESTION,
            MarkupToken::Eq => SyntaxKind::EQ,
            MarkupToken::DoubleQuote => SyntaxKind::DOUBLE_QUOTE,
            MarkupToken::SingleQuote => SyntaxKind::SINGLE_QUOTE,
            MarkupToken::LBracket => SyntaxKind::L_BRACKET,
            MarkupToken::RBracket => SyntaxKind::R_BRACKET,
            MarkupToken::DoubleHyphen => SyntaxKind::DOUBLE_HYPHEN,
            MarkupToken::Punct | MarkupToken::Text => SyntaxKind::TEXT,
        }
    }
}
