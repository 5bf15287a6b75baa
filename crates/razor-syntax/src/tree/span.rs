//! Leaf nodes: symbols grouped into spans.

use std::fmt;

use crate::lexer::Mode;
use crate::location::SourceLocation;
use crate::syntax_kind::SyntaxKind;

use super::ChunkGenerator;

/// One token as stored in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub kind: SyntaxKind,
    pub mode: Mode,
    pub start: SourceLocation,
    pub content: String,
}

impl Symbol {
    pub fn new(kind: SyntaxKind, mode: Mode, start: SourceLocation, content: impl Into<String>) -> Self {
        Self {
            kind,
            mode,
            start,
            content: content.into(),
        }
    }

    /// A zero-length placeholder.
    pub fn marker(mode: Mode, start: SourceLocation) -> Self {
        Self::new(SyntaxKind::MARKER, mode, start, "")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpanKind {
    Markup,
    Code,
    Comment,
    MetaCode,
    Transition,
}

impl SpanKind {
    pub fn syntax_kind(self) -> SyntaxKind {
        match self {
            SpanKind::Markup => SyntaxKind::MARKUP_SPAN,
            SpanKind::Code => SyntaxKind::CODE_SPAN,
            SpanKind::Comment => SyntaxKind::COMMENT_SPAN,
            SpanKind::MetaCode => SyntaxKind::META_CODE_SPAN,
            SpanKind::Transition => SyntaxKind::TRANSITION_SPAN,
        }
    }
}

/// How much trailing input a span may absorb when edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AcceptedCharacters {
    None,
    NewLine,
    WhiteSpace,
    NonWhiteSpace,
    AllWhiteSpace,
    AnyExceptNewline,
    #[default]
    Any,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EditHandlerKind {
    #[default]
    Default,
    ImplicitExpression {
        accept_trailing_dot: bool,
    },
    /// Carries the text that would close an unterminated construct.
    AutoComplete {
        auto_complete_string: Option<String>,
        at_end_of_span: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EditHandler {
    pub accepted: AcceptedCharacters,
    pub kind: EditHandlerKind,
}

impl EditHandler {
    pub fn new(accepted: AcceptedCharacters) -> Self {
        Self {
            accepted,
            kind: EditHandlerKind::Default,
        }
    }

    pub fn implicit_expression(accepted: AcceptedCharacters, accept_trailing_dot: bool) -> Self {
        Self {
            accepted,
            kind: EditHandlerKind::ImplicitExpression { accept_trailing_dot },
        }
    }

    pub fn auto_complete(accepted: AcceptedCharacters, at_end_of_span: bool) -> Self {
        Self {
            accepted,
            kind: EditHandlerKind::AutoComplete {
                auto_complete_string: None,
                at_end_of_span,
            },
        }
    }

    pub fn auto_complete_string(&self) -> Option<&str> {
        match &self.kind {
            EditHandlerKind::AutoComplete {
                auto_complete_string,
                ..
            } => auto_complete_string.as_deref(),
            _ => None,
        }
    }

    /// Sets the completion text; ignored unless this is an auto-complete handler.
    pub fn set_auto_complete_string(&mut self, text: &str) {
        if let EditHandlerKind::AutoComplete {
            auto_complete_string,
            ..
        } = &mut self.kind
        {
            *auto_complete_string = Some(text.to_string());
        }
    }

    pub fn is_auto_complete(&self) -> bool {
        matches!(self.kind, EditHandlerKind::AutoComplete { .. })
    }
}

/// A leaf node: a contiguous single-mode run of symbols.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub kind: SpanKind,
    pub start: SourceLocation,
    pub symbols: Vec<Symbol>,
    pub edit_handler: EditHandler,
    pub chunk_generator: ChunkGenerator,
}

impl Span {
    pub fn content(&self) -> String {
        self.symbols.iter().map(|s| s.content.as_str()).collect()
    }

    pub fn length(&self) -> usize {
        self.symbols.iter().map(|s| s.content.len()).sum()
    }

    pub fn is_whitespace_only(&self) -> bool {
        self.symbols
            .iter()
            .all(|s| s.content.chars().all(char::is_whitespace))
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} span at {}::{} - [{}]",
            self.kind,
            self.start,
            self.length(),
            self.content().escape_debug()
        )?;
        if !matches!(self.chunk_generator, ChunkGenerator::None) {
            write!(f, " gen<{}>", self.chunk_generator)?;
        }
        write!(f, " edit<{:?}", self.edit_handler.accepted)?;
        if let Some(text) = self.edit_handler.auto_complete_string() {
            write!(f, ";AutoComplete:[{text}]")?;
        }
        write!(f, ">")
    }
}
