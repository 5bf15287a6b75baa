//! Parse diagnostics.
//!
//! Malformed input never stops a parse. Each recovery point records one
//! [`RazorError`] in the [`ErrorSink`], in the order the parser detected it,
//! and parsing carries on.

use thiserror::Error;

use crate::location::SourceLocation;

/// Everything the parser can complain about.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    #[error("An opening \"{open}\" is missing the corresponding closing \"{close}\".")]
    ExpectedCloseBracketBeforeEof { open: String, close: String },

    #[error(
        "The {block_name} block is missing a closing \"{close}\" character. Make sure every \"{open}\" in this block has a matching \"{close}\" that is not being read as markup."
    )]
    ExpectedEndOfBlockBeforeEof {
        block_name: String,
        close: String,
        open: String,
    },

    #[error(
        "\"{0}\" is not valid at the start of a code block. Only identifiers, keywords, comments, \"(\" and \"{{\" are valid."
    )]
    UnexpectedCharacterAtStartOfCodeBlock(String),

    #[error(
        "A space or line break was encountered after the \"@\" character. Only identifiers, keywords, comments, \"(\" and \"{{\" may immediately follow \"@\"."
    )]
    UnexpectedWhiteSpaceAtStartOfCodeBlock,

    #[error(
        "End-of-file was found after the \"@\" character. \"@\" must be followed by a valid code block; write \"@@\" to output an \"@\"."
    )]
    UnexpectedEndOfFileAtStartOfCodeBlock,

    #[error(
        "Expected a \"{expected}\" but found a \"{found}\". Block statements must be enclosed in \"{{\" and \"}}\"; single-line control-flow statements are not allowed."
    )]
    SingleLineControlFlowStatementsNotAllowed { expected: String, found: String },

    #[error("Section blocks (\"@section Header {{ ... }}\") cannot be nested. Only one level of section blocks is allowed.")]
    SectionsCannotBeNested,

    #[error("\"{0}\" is not valid at the start of a section name. Only identifiers are valid.")]
    UnexpectedCharacterAtSectionNameStart(String),

    #[error("Expected a \"{{\" after the section name \"{0}\".")]
    MissingOpenBraceAfterSection(String),

    #[error("\"{0}\" is a reserved word and cannot be used in implicit expressions. Use an explicit expression \"@()\" instead.")]
    ReservedWord(String),

    #[error(
        "Unterminated string literal. Strings that start with a quotation mark must end before the end of the line; verbatim strings (@\") may span lines."
    )]
    UnterminatedStringLiteral,

    #[error("End of file was reached before the end of the block comment. Comments started with \"/*\" must end with \"*/\".")]
    BlockCommentNotTerminated,

    #[error("Razor comment is not terminated. Razor comments must end with \"*@\".")]
    RazorCommentNotTerminated,

    #[error("The \"{0}\" element was not closed. Elements must be self-closing or have a matching end tag.")]
    MissingEndTag(String),

    #[error("Encountered end tag \"{0}\" with no matching start tag.")]
    UnexpectedEndTag(String),

    #[error(
        "End of file or an unexpected character was reached before the \"{0}\" tag could be parsed. Elements inside markup blocks must be complete."
    )]
    UnfinishedTag(String),

    #[error(
        "Markup in a code block must start with a tag and all start tags must be matched with end tags. Use self-closing tags like \"<br/>\"."
    )]
    MarkupBlockMustStartWithTag,

    #[error("Outer tag is missing a name. The first character of a markup block must be an HTML tag with a valid name.")]
    OuterTagMissingName,

    #[error("\"<text>\" and \"</text>\" tags cannot contain attributes.")]
    TextTagCannotContainAttributes,

    #[error("The \"@\" character must be followed by a \":\", \"(\", or an identifier. Use an HTML start tag to switch to markup.")]
    AtInCodeMustBeFollowedByColonParenOrIdentifierStart,

    #[error("Unexpected \"{{\" after \"@\" character. Inside the body of a code block you do not need \"@{{\" to switch to code.")]
    UnexpectedNestedCodeBlock,

    #[error("Inline markup blocks (@<p>Content</p>) cannot be nested. Only one level of inline markup is allowed.")]
    InlineMarkupBlocksCannotBeNested,

    #[error("The {0} directive is not supported.")]
    HelperDirectiveNotAvailable(String),

    #[error(
        "Namespace imports and type aliases cannot be placed within code blocks. They must immediately follow an \"@\" character in markup."
    )]
    NamespaceImportWithinCodeBlock,

    #[error("The 'inherits' keyword must be followed by a type name on the same line.")]
    InheritsKeywordMustBeFollowedByTypeName,

    #[error("Directive '{0}' must have a value.")]
    DirectiveMustHaveValue(String),

    #[error("Optional quote around the directive '{0}' is missing the corresponding opening or closing quote.")]
    IncompleteQuotesAroundDirective(String),

    #[error("Expected \"{0}\".")]
    Expected(String),

    #[error("Expected {expected}, found {found}.")]
    ExpectedFound { expected: String, found: String },

    #[error("Input is nested more than {limit} levels deep; the remainder was not parsed.")]
    InputTooDeeplyNested { limit: usize },
}

/// A diagnostic anchored at a source range.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("({}:{}) {kind}", .location.line_index + 1, .location.character_index + 1)]
pub struct RazorError {
    pub kind: ErrorKind,
    pub location: SourceLocation,
    pub length: usize,
}

impl RazorError {
    pub fn new(kind: ErrorKind, location: SourceLocation, length: usize) -> Self {
        Self {
            kind,
            location,
            length,
        }
    }

    pub fn message(&self) -> String {
        self.kind.to_string()
    }
}

/// Collects diagnostics for one parse.
#[derive(Debug, Default)]
pub struct ErrorSink {
    errors: Vec<RazorError>,
}

impl ErrorSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_error(&mut self, error: RazorError) {
        self.errors.push(error);
    }

    pub fn errors(&self) -> &[RazorError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<RazorError> {
        self.errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn display_uses_one_based_line_and_column() {
        let error = RazorError::new(
            ErrorKind::Expected("{".into()),
            SourceLocation::new(12, 2, 4),
            1,
        );
        assert_eq!(error.to_string(), "(3:5) Expected \"{\".");
    }

    #[test]
    fn messages_interpolate_fields() {
        let kind = ErrorKind::ExpectedEndOfBlockBeforeEof {
            block_name: "code".into(),
            close: "}".into(),
            open: "{".into(),
        };
        assert!(kind.to_string().starts_with("The code block is missing a closing \"}\""));
        assert_eq!(
            ErrorKind::SectionsCannotBeNested.to_string(),
            "Section blocks (\"@section Header { ... }\") cannot be nested. Only one level of section blocks is allowed."
        );
    }

    #[test]
    fn sink_preserves_detection_order() {
        let mut sink = ErrorSink::new();
        sink.on_error(RazorError::new(ErrorKind::SectionsCannotBeNested, SourceLocation::new(9, 0, 9), 7));
        sink.on_error(RazorError::new(ErrorKind::OuterTagMissingName, SourceLocation::ZERO, 1));
        let errors = sink.into_errors();
        assert_eq!(errors[0].location.absolute_index, 9);
        assert_eq!(errors[1].location.absolute_index, 0);
    }
}
