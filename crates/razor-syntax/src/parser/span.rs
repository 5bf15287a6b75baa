//! The span under construction and the configuration applied to it.

use crate::location::SourceLocation;
use crate::tree::{AcceptedCharacters, ChunkGenerator, EditHandler, Span, SpanKind, Symbol};

/// Edit handler and chunk generator stamped onto each new span.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpanConfig {
    pub edit_handler: EditHandler,
    pub chunk_generator: ChunkGenerator,
}

impl SpanConfig {
    pub fn new(edit_handler: EditHandler, chunk_generator: ChunkGenerator) -> Self {
        Self {
            edit_handler,
            chunk_generator,
        }
    }

    pub fn markup() -> Self {
        Self::new(EditHandler::default(), ChunkGenerator::Markup)
    }

    pub fn statement() -> Self {
        Self::new(EditHandler::default(), ChunkGenerator::Statement)
    }
}

/// Accumulates symbols until the parser outputs them as one [`Span`].
#[derive(Debug)]
pub struct SpanBuilder {
    pub kind: SpanKind,
    pub start: SourceLocation,
    pub symbols: Vec<Symbol>,
    pub edit_handler: EditHandler,
    pub chunk_generator: ChunkGenerator,
}

impl SpanBuilder {
    pub fn new(kind: SpanKind) -> Self {
        Self {
            kind,
            start: SourceLocation::ZERO,
            symbols: Vec::new(),
            edit_handler: EditHandler::default(),
            chunk_generator: ChunkGenerator::None,
        }
    }

    pub fn accept(&mut self, symbol: Symbol) {
        if self.symbols.is_empty() {
            self.start = symbol.start;
        }
        self.symbols.push(symbol);
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn content(&self) -> String {
        self.symbols.iter().map(|s| s.content.as_str()).collect()
    }

    pub fn content_len(&self) -> usize {
        self.symbols.iter().map(|s| s.content.len()).sum()
    }

    pub fn set_accepted(&mut self, accepted: AcceptedCharacters) {
        self.edit_handler.accepted = accepted;
    }

    pub fn configure(&mut self, config: &SpanConfig) {
        self.edit_handler = config.edit_handler.clone();
        self.chunk_generator = config.chunk_generator.clone();
    }

    /// Seals the current symbols into a span and empties the builder.
    pub fn build(&mut self) -> Span {
        Span {
            kind: self.kind,
            start: self.start,
            symbols: std::mem::take(&mut self.symbols),
            edit_handler: std::mem::take(&mut self.edit_handler),
            chunk_generator: std::mem::take(&mut self.chunk_generator),
        }
    }
}
