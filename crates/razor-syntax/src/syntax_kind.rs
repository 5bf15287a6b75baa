//! SyntaxKind enum for every token and node in the Razor tree.
//!
//! Both tokenizers share one kind enum so the tree, the parser and the Rowan
//! export all speak the same vocabulary. Tokens that exist in both modes
//! (whitespace, newlines, the transition character, brackets) use a single
//! kind; the mode a token was lexed in is recorded on the symbol itself.

/// All syntax kinds for the Razor tree.
///
/// The `repr(u16)` ensures efficient storage in rowan's green tree.
///
/// We use SCREAMING_CASE following the rust-analyzer convention for SyntaxKind.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(non_camel_case_types)]
pub enum SyntaxKind {
    // === Shared tokens ===
    /// Horizontal whitespace
    WHITESPACE,
    /// Line ending (`\n`, `\r\n` or `\r`)
    NEWLINE,
    /// `@`
    TRANSITION,
    /// `@*`, split into `@` and `*` when a razor comment is parsed
    RAZOR_COMMENT_START,
    /// The `*` of `@*` or `*@`
    RAZOR_COMMENT_STAR,
    /// Body of a razor comment
    RAZOR_COMMENT,
    /// `:`
    COLON,
    /// `[`
    L_BRACKET,
    /// `]`
    R_BRACKET,
    /// `<`
    L_ANGLE,
    /// `>`
    R_ANGLE,
    /// `?`
    QUESTION,
    /// `=`
    EQ,
    /// Zero-length placeholder keeping an otherwise empty span addressable
    MARKER,
    /// Character neither tokenizer recognizes
    UNKNOWN,

    // === Markup tokens ===
    /// Run of literal markup text
    TEXT,
    /// `/`
    SLASH,
    /// `!`
    BANG,
    /// `"`
    DOUBLE_QUOTE,
    /// `'`
    SINGLE_QUOTE,
    /// `--`
    DOUBLE_HYPHEN,

    // === Code tokens ===
    /// Identifier
    IDENT,
    /// Reserved or contextual keyword
    KEYWORD,
    /// Numeric literal
    NUMBER,
    /// String, verbatim string or character literal
    STRING,
    /// `//` line comment or `/* */` block comment
    COMMENT,
    /// `{`
    L_BRACE,
    /// `}`
    R_BRACE,
    /// `(`
    L_PAREN,
    /// `)`
    R_PAREN,
    /// `;`
    SEMICOLON,
    /// `::`
    DOUBLE_COLON,
    /// `.`
    DOT,
    /// Any other operator or punctuation
    OPERATOR,
    /// End of file marker
    EOF,

    // === Blocks ===
    MARKUP_BLOCK,
    STATEMENT_BLOCK,
    EXPRESSION_BLOCK,
    DIRECTIVE_BLOCK,
    COMMENT_BLOCK,
    FUNCTIONS_BLOCK,
    SECTION_BLOCK,
    TEMPLATE_BLOCK,
    TAG_BLOCK,

    // === Spans ===
    MARKUP_SPAN,
    CODE_SPAN,
    COMMENT_SPAN,
    META_CODE_SPAN,
    TRANSITION_SPAN,
}

impl SyntaxKind {
    /// Returns true if this kind represents a token (lexer output).
    pub fn is_token(self) -> bool {
        (self as u16) <= (Self::EOF as u16)
    }

    /// Returns true if this kind represents a block or span node.
    pub fn is_node(self) -> bool {
        !self.is_token()
    }

    /// Returns true if this kind is trivia (whitespace/newlines).
    pub fn is_trivia(self) -> bool {
        matches!(self, Self::WHITESPACE | Self::NEWLINE)
    }

    /// Returns the kind of the bracket that closes or opens this one.
    pub fn flip_bracket(self) -> Option<SyntaxKind> {
        Some(match self {
            Self::L_BRACE => Self::R_BRACE,
            Self::R_BRACE => Self::L_BRACE,
            Self::L_PAREN => Self::R_PAREN,
            Self::R_PAREN => Self::L_PAREN,
            Self::L_BRACKET => Self::R_BRACKET,
            Self::R_BRACKET => Self::L_BRACKET,
            Self::L_ANGLE => Self::R_ANGLE,
            Self::R_ANGLE => Self::L_ANGLE,
            _ => return None,
        })
    }

    /// Sample text for punctuation kinds, used in diagnostics.
    pub fn sample(self) -> &'static str {
        match self {
            Self::L_BRACE => "{",
            Self::R_BRACE => "}",
            Self::L_PAREN => "(",
            Self::R_PAREN => ")",
            Self::L_BRACKET => "[",
            Self::R_BRACKET => "]",
            Self::L_ANGLE => "<",
            Self::R_ANGLE => ">",
            Self::SEMICOLON => ";",
            Self::COLON => ":",
            Self::DOUBLE_COLON => "::",
            Self::DOT => ".",
            Self::QUESTION => "?",
            Self::EQ => "=",
            Self::TRANSITION => "@",
            Self::SLASH => "/",
            Self::BANG => "!",
            Self::DOUBLE_QUOTE => "\"",
            Self::SINGLE_QUOTE => "'",
            Self::DOUBLE_HYPHEN => "--",
            _ => "",
        }
    }
}

impl From<SyntaxKind> for rowan::SyntaxKind {
    fn from(kind: SyntaxKind) -> Self {
        Self(kind as u16)
    }
}

/// Language definition for rowan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RazorLang {}

impl rowan::Language for RazorLang {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        assert!(raw.0 <= SyntaxKind::TRANSITION_SPAN as u16);
        // SAFETY: We check bounds above and SyntaxKind is repr(u16)
        unsafe { std::mem::transmute::<u16, SyntaxKind>(raw.0) }
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        kind.into()
    }
}

/// Type alias for our syntax nodes.
pub type SyntaxNode = rowan::SyntaxNode<RazorLang>;
/// Type alias for our syntax tokens.
pub type SyntaxToken = rowan::SyntaxToken<RazorLang>;
/// Type alias for syntax elements (node or token).
pub type SyntaxElement = rowan::SyntaxElement<RazorLang>;
