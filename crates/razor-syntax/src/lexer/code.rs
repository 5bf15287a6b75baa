//! Code-mode token enum.

use logos::{Lexer, Logos};

use super::LexError;
use crate::syntax_kind::SyntaxKind;

/// Consumes a block comment body after `/*`; reports whether `*/` was found.
fn block_comment(lex: &mut Lexer<CodeToken>) -> Option<bool> {
    let rest = lex.remainder();
    match rest.find("*/") {
        Some(end) => {
            lex.bump(end + 2);
            Some(true)
        }
        None => {
            lex.bump(rest.len());
            Some(false)
        }
    }
}

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeToken {
    #[regex(r"[ \t\x0C]+")]
    Whitespace,

    #[regex(r"\r\n|\r|\n")]
    Newline,

    #[token("@")]
    Transition,

    #[token("@*")]
    RazorCommentStart,

    #[regex(r"[\p{L}_][\p{L}\p{N}_]*")]
    Identifier,

    #[regex(r"[0-9][0-9a-zA-Z_]*(\.[0-9][0-9a-zA-Z_]*)?")]
    Number,

    #[regex(r#""([^"\\\r\n]|\\[^\r\n])*""#)]
    String,

    /// Stops before the line break
    #[regex(r#""([^"\\\r\n]|\\[^\r\n])*\\?"#)]
    UnterminatedString,

    #[regex(r#"@"([^"]|"")*""#)]
    VerbatimString,

    /// Runs to the end of input
    #[regex(r#"@"([^"]|"")*"#)]
    UnterminatedVerbatimString,

    #[regex(r"'([^'\\\r\n]|\\[^\r\n])*'")]
    Char,

    #[regex(r"'([^'\\\r\n]|\\[^\r\n])*\\?")]
    UnterminatedChar,

    #[regex(r"//[^\r\n]*")]
    LineComment,

    #[token("/*", block_comment)]
    BlockComment(bool),

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token("<")]
    LAngle,

    #[token(">")]
    RAngle,

    #[token(";")]
    Semicolon,

    #[token(":")]
    Colon,

    #[token("::")]
    DoubleColon,

    #[token(".")]
    Dot,

    #[token("?")]
    Question,

    #[token("=")]
    Eq,

    #[regex(r"==|=>|!=|<=|>=|&&|\|\||\+\+|--|\?\?=?|->|<<=?|[-+*/%&|^]=|[-+*/%&|^!~,#$\\`]")]
    Operator,
}

impl CodeToken {
    pub fn to_syntax_kind(self) -> SyntaxKind {
        match self {
            CodeToken::Whitespace => SyntaxKind::WHITESPACE,
            CodeToken::Newline => SyntaxKind::NEWLINE,
            CodeToken::Transition => SyntaxKind::TRANSITION,
            CodeToken::RazorCommentStart => SyntaxKind::RAZOR_COMMENT_START,
            CodeToken::Identifier => SyntaxKind::IDENT,
            CodeToken::Number => SyntaxKind::NUMBER,
            CodeToken::String
            | CodeToken::UnterminatedString
            | CodeToken::VerbatimString
            | CodeToken::UnterminatedVerbatimString
            | CodeToken::Char
            | CodeToken::UnterminatedChar => SyntaxKind::STRING,
            CodeToken::LineComment | CodeToken::BlockComment(_) => SyntaxKind::COMMENT,
            CodeToken::LBrace => SyntaxKind::L_BRACE,
            CodeToken::RBrace => SyntaxKind::R_BRACE,
            CodeToken::LParen => SyntaxKind::L_PAREN,
            CodeToken::RParen => SyntaxKind::R_PAREN,
            CodeToken::LBracket => SyntaxKind::L_BRACKET,
            CodeToken::RBracket => SyntaxKind::R_BRACKET,
            CodeToken::LAngle => SyntaxKind::L_ANGLE,
            CodeToken::RAngle => SyntaxKind::R_ANGLE,
            CodeToken::Semicolon => SyntaxKind::SEMICOLON,
            CodeToken::Colon => SyntaxKind::COLON,
            CodeToken::DoubleColon => SyntaxKind::DOUBLE_COLON,
            CodeToken::Dot => SyntaxKind::DOT,
            CodeToken::Question => SyntaxKind::QUESTION,
            CodeToken::Eq => SyntaxKind::EQ,
            CodeToken::Operator => SyntaxKind::OPERATOR,
        }
    }

    /// The malformation carried by this token, if any.
    pub fn lex_error(self) -> Option<LexError> {
        match self {
            CodeToken::UnterminatedString | CodeToken::UnterminatedChar => {
                Some(LexError::UnterminatedString)
            }
            CodeToken::UnterminatedVerbatimString => Some(LexError::UnterminatedVerbatimString),
            CodeToken::BlockComment(false) => Some(LexError::UnterminatedBlockComment),
            _ => None,
        }
    }
}

/// Reserved and contextual keywords of the code language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Abstract,
    As,
    Await,
    Base,
    Bool,
    Break,
    Byte,
    Case,
    Catch,
    Char,
    Checked,
    Class,
    Const,
    Continue,
    Decimal,
    Default,
    Delegate,
    Do,
    Double,
    Else,
    Enum,
    Event,
    Explicit,
    Extern,
    False,
    Finally,
    Fixed,
    Float,
    For,
    Foreach,
    Goto,
    If,
    Implicit,
    In,
    Int,
    Interface,
    Internal,
    Is,
    Lock,
    Long,
    Namespace,
    New,
    Null,
    Object,
    Operator,
    Out,
    Override,
    Params,
    Private,
    Protected,
    Public,
    Readonly,
    Ref,
    Return,
    Sbyte,
    Sealed,
    Short,
    Sizeof,
    Stackalloc,
    Static,
    String,
    Struct,
    Switch,
    This,
    Throw,
    True,
    Try,
    Typeof,
    Uint,
    Ulong,
    Unchecked,
    Unsafe,
    Ushort,
    Using,
    Virtual,
    Void,
    Volatile,
    When,
    While,
}

const KEYWORDS: &[(&str, Keyword)] = &[
    ("abstract", Keyword::Abstract),
    ("as", Keyword::As),
    ("await", Keyword::Await),
    ("base", Keyword::Base),
    ("bool", Keyword::Bool),
    ("break", Keyword::Break),
    ("byte", Keyword::Byte),
    ("case", Keyword::Case),
    ("catch", Keyword::Catch),
    ("char", Keyword::Char),
    ("checked", Keyword::Checked),
    ("class", Keyword::Class),
    ("const", Keyword::Const),
    ("continue", Keyword::Continue),
    ("decimal", Keyword::Decimal),
    ("default", Keyword::Default),
    ("delegate", Keyword::Delegate),
    ("do", Keyword::Do),
    ("double", Keyword::Double),
    ("else", Keyword::Else),
    ("enum", Keyword::Enum),
    ("event", Keyword::Event),
    ("explicit", Keyword::Explicit),
    ("extern", Keyword::Extern),
    ("false", Keyword::False),
    ("finally", Keyword::Finally),
    ("fixed", Keyword::Fixed),
    ("float", Keyword::Float),
    ("for", Keyword::For),
    ("foreach", Keyword::Foreach),
    ("goto", Keyword::Goto),
    ("if", Keyword::If),
    ("implicit", Keyword::Implicit),
    ("in", Keyword::In),
    ("int", Keyword::Int),
    ("interface", Keyword::Interface),
    ("internal", Keyword::Internal),
    ("is", Keyword::Is),
    ("lock", Keyword::Lock),
    ("long", Keyword::Long),
    ("namespace", Keyword::Namespace),
    ("new", Keyword::New),
    ("null", Keyword::Null),
    ("object", Keyword::Object),
    ("operator", Keyword::Operator),
    ("out", Keyword::Out),
    ("override", Keyword::Override),
    ("params", Keyword::Params),
    ("private", Keyword::Private),
    ("protected", Keyword::Protected),
    ("public", Keyword::Public),
    ("readonly", Keyword::Readonly),
    ("ref", Keyword::Ref),
    ("return", Keyword::Return),
    ("sbyte", Keyword::Sbyte),
    ("sealed", Keyword::Sealed),
    ("short", Keyword::Short),
    ("sizeof", Keyword::Sizeof),
    ("stackalloc", Keyword::Stackalloc),
    ("static", Keyword::Static),
    ("string", Keyword::String),
    ("struct", Keyword::Struct),
    ("switch", Keyword::Switch),
    ("this", Keyword::This),
    ("throw", Keyword::Throw),
    ("true", Keyword::True),
    ("try", Keyword::Try),
    ("typeof", Keyword::Typeof),
    ("uint", Keyword::Uint),
    ("ulong", Keyword::Ulong),
    ("unchecked", Keyword::Unchecked),
    ("unsafe", Keyword::Unsafe),
    ("ushort", Keyword::Ushort),
    ("using", Keyword::Using),
    ("virtual", Keyword::Virtual),
    ("void", Keyword::Void),
    ("volatile", Keyword::Volatile),
    ("when", Keyword::When),
    ("while", Keyword::While),
];

impl Keyword {
    pub fn from_text(text: &str) -> Option<Keyword> {
        KEYWORDS
            .binary_search_by(|(name, _)| (*name).cmp(text))
            .ok()
            .map(|i| KEYWORDS[i].1)
    }

    pub fn as_str(self) -> &'static str {
        KEYWORDS
            .iter()
            .find(|(_, keyword)| *keyword == self)
            .map(|(name, _)| *name)
            .unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_table_is_sorted() {
        assert!(KEYWORDS.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn keyword_lookup() {
        assert_eq!(Keyword::from_text("foreach"), Some(Keyword::Foreach));
        assert_eq!(Keyword::from_text("when"), Some(Keyword::When));
        assert_eq!(Keyword::from_text("Foreach"), None);
        assert_eq!(Keyword::from_text("section"), None);
        assert_eq!(Keyword::Namespace.as_str(), "namespace");
    }
}
