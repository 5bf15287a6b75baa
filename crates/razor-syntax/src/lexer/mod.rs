//! # Lexer - Tokenizing Markup and Code
//!
//! Razor source is tokenized by two [Logos] lexers, one per [`Mode`]. Which
//! one applies depends on which parser is active, and the parsers switch
//! back and forth mid-line, so tokens cannot be produced up front.
//!
//! [Logos]: https://docs.rs/logos
//!
//! ## Lazy Tokens
//!
//! Instead of a token vector, [`lex_at`] lexes exactly one token at any byte
//! offset. The parser keeps only a cursor; "seeking" back to a saved position
//! is just moving the cursor and lexing again. Backtracking therefore can
//! never leave stale tokenizer state behind.
//!
//! ## The Lossless Guarantee
//!
//! As with any lossless tree, every byte lands in exactly one token:
//!
//! ```
//! use razor_syntax::lexer::{lex, Mode};
//!
//! let input = "if (x) { <p>@x</p> }";
//! for mode in [Mode::Markup, Mode::Code] {
//!     let text: String = lex(input, mode).iter().map(|t| t.text).collect();
//!     assert_eq!(input, text);
//! }
//! ```
//!
//! ## Malformed Input
//!
//! Lexing never fails. Characters no rule matches become `TEXT` in markup and
//! `UNKNOWN` in code. Unterminated literals are still single tokens carrying
//! a [`LexError`]; the parser turns that into a diagnostic when the token is
//! accepted into a span.

mod code;
mod markup;

use logos::Logos;

use crate::syntax_kind::SyntaxKind;
pub use code::Keyword;
use code::CodeToken;
use markup::MarkupToken;

/// Which tokenizer applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Markup,
    Code,
}

impl Mode {
    pub fn other(self) -> Mode {
        match self {
            Mode::Markup => Mode::Code,
            Mode::Code => Mode::Markup,
        }
    }
}

/// A malformed literal detected while lexing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexError {
    UnterminatedString,
    UnterminatedVerbatimString,
    UnterminatedBlockComment,
}

/// A token with its kind, text and byte offset in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'s> {
    pub kind: SyntaxKind,
    pub text: &'s str,
    pub offset: usize,
    pub error: Option<LexError>,
}

impl<'s> Token<'s> {
    pub fn end(&self) -> usize {
        self.offset + self.text.len()
    }

    pub fn keyword(&self) -> Option<Keyword> {
        if self.kind == SyntaxKind::KEYWORD {
            Keyword::from_text(self.text)
        } else {
            None
        }
    }
}

/// Lex the single token starting at `offset`, or `None` at end of input.
pub fn lex_at(source: &str, offset: usize, mode: Mode) -> Option<Token<'_>> {
    let rest = source.get(offset..)?;
    if rest.is_empty() {
        return None;
    }
    let (kind, len, error) = match mode {
        Mode::Markup => {
            let mut lexer = MarkupToken::lexer(rest);
            let result = lexer.next()?;
            let kind = match result {
                Ok(token) => token.to_syntax_kind(),
                Err(()) => SyntaxKind::TEXT,
            };
            (kind, lexer.span().end, None)
        }
        Mode::Code => {
            let mut lexer = CodeToken::lexer(rest);
            let result = lexer.next()?;
            let (kind, error) = match result {
                Ok(CodeToken::Identifier) if Keyword::from_text(lexer.slice()).is_some() => {
                    (SyntaxKind::KEYWORD, None)
                }
                Ok(token) => (token.to_syntax_kind(), token.lex_error()),
                Err(()) => (SyntaxKind::UNKNOWN, None),
            };
            (kind, lexer.span().end, error)
        }
    };
    Some(Token {
        kind,
        text: &rest[..len],
        offset,
        error,
    })
}

/// Tokenize a whole string in one mode.
pub fn lex(source: &str, mode: Mode) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut offset = 0;
    while let Some(token) = lex_at(source, offset, mode) {
        offset = token.end();
        tokens.push(token);
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn kinds(input: &str, mode: Mode) -> Vec<(SyntaxKind, &str)> {
        lex(input, mode).into_iter().map(|t| (t.kind, t.text)).collect()
    }

    #[test]
    fn markup_tag_with_transition() {
        assert_eq!(
            kinds("<p>@foo</p>", Mode::Markup),
            vec![
                (SyntaxKind::L_ANGLE, "<"),
                (SyntaxKind::TEXT, "p"),
                (SyntaxKind::R_ANGLE, ">"),
                (SyntaxKind::TRANSITION, "@"),
                (SyntaxKind::TEXT, "foo"),
                (SyntaxKind::L_ANGLE, "<"),
                (SyntaxKind::SLASH, "/"),
                (SyntaxKind::TEXT, "p"),
                (SyntaxKind::R_ANGLE, ">"),
            ]
        );
    }

    #[test]
    fn markup_keeps_email_addresses_as_text() {
        assert_eq!(
            kinds("mail me@example.com", Mode::Markup),
            vec![
                (SyntaxKind::TEXT, "mail"),
                (SyntaxKind::WHITESPACE, " "),
                (SyntaxKind::TEXT, "me@example.com"),
            ]
        );
    }

    #[test]
    fn markup_braces_are_separate_text_tokens() {
        assert_eq!(
            kinds("a{b}", Mode::Markup),
            vec![
                (SyntaxKind::TEXT, "a"),
                (SyntaxKind::TEXT, "{"),
                (SyntaxKind::TEXT, "b"),
                (SyntaxKind::TEXT, "}"),
            ]
        );
    }

    #[test]
    fn markup_comment_delimiters() {
        assert_eq!(
            kinds("<!-- x -->", Mode::Markup),
            vec![
                (SyntaxKind::L_ANGLE, "<"),
                (SyntaxKind::BANG, "!"),
                (SyntaxKind::DOUBLE_HYPHEN, "--"),
                (SyntaxKind::WHITESPACE, " "),
                (SyntaxKind::TEXT, "x"),
                (SyntaxKind::WHITESPACE, " "),
                (SyntaxKind::DOUBLE_HYPHEN, "--"),
                (SyntaxKind::R_ANGLE, ">"),
            ]
        );
    }

    #[test]
    fn code_keywords_and_identifiers() {
        assert_eq!(
            kinds("if (foo.Bar)", Mode::Code),
            vec![
                (SyntaxKind::KEYWORD, "if"),
                (SyntaxKind::WHITESPACE, " "),
                (SyntaxKind::L_PAREN, "("),
                (SyntaxKind::IDENT, "foo"),
                (SyntaxKind::DOT, "."),
                (SyntaxKind::IDENT, "Bar"),
                (SyntaxKind::R_PAREN, ")"),
            ]
        );
    }

    #[rstest]
    #[case::regular("\"abc\"", None)]
    #[case::escaped_quote(r#""a\"b""#, None)]
    #[case::verbatim("@\"a\nb\"", None)]
    #[case::verbatim_doubled_quote("@\"a\"\"b\"", None)]
    #[case::char_literal("'x'", None)]
    #[case::unterminated_verbatim("@\"abc", Some(LexError::UnterminatedVerbatimString))]
    fn code_string_literals(#[case] input: &str, #[case] error: Option<LexError>) {
        let tokens = lex(input, Mode::Code);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, SyntaxKind::STRING);
        assert_eq!(tokens[0].error, error);
    }

    #[test]
    fn unterminated_string_stops_at_newline() {
        let tokens = lex("\"abc\nx", Mode::Code);
        assert_eq!(tokens[0].text, "\"abc");
        assert_eq!(tokens[0].error, Some(LexError::UnterminatedString));
        assert_eq!(tokens[1].kind, SyntaxKind::NEWLINE);
    }

    #[test]
    fn block_comments() {
        let closed = lex("/* a */b", Mode::Code);
        assert_eq!(closed[0].text, "/* a */");
        assert_eq!(closed[0].error, None);

        let open = lex("/* a", Mode::Code);
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].kind, SyntaxKind::COMMENT);
        assert_eq!(open[0].error, Some(LexError::UnterminatedBlockComment));
    }

    #[test]
    fn code_razor_comment_start() {
        assert_eq!(
            kinds("@* x", Mode::Code)[0],
            (SyntaxKind::RAZOR_COMMENT_START, "@*")
        );
    }

    #[test]
    fn lex_at_seeks_anywhere() {
        let source = "abc def";
        let token = lex_at(source, 4, Mode::Code).unwrap();
        assert_eq!(token.text, "def");
        assert_eq!(token.offset, 4);
        assert!(lex_at(source, source.len(), Mode::Code).is_none());
    }

    #[test]
    fn all_bytes_preserved() {
        let input = "@{ var s = \"unterminated\n}\r\n<a href='@Url'>ü &amp; @@ x@y.z</a>\t/* open";
        for mode in [Mode::Markup, Mode::Code] {
            let reconstructed: String = lex(input, mode).iter().map(|t| t.text).collect();
            assert_eq!(input, reconstructed);
        }
    }
}
