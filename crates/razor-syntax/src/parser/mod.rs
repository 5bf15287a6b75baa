//! # Parser - Shared Context for the Two Grammars
//!
//! Razor is parsed by two cooperating recursive-descent grammars, one for
//! markup and one for code, that hand control to each other at transition
//! characters. Both run against the single [`Parser`] defined here, which
//! owns everything one parse needs:
//!
//! - the source text and a byte cursor into it,
//! - the active [`Mode`], which decides the tokenizer used at the cursor,
//! - one span builder and span configuration per mode,
//! - the [`TreeBuilder`] block stack and the [`ErrorSink`].
//!
//! ## The Cursor Model
//!
//! Tokens are not stored. [`Parser::current`] lexes the token at the cursor
//! on demand in the active mode; moving the cursor back ([`Parser::seek`],
//! [`Parser::put_back`]) is all backtracking takes. A token that was read
//! but not accepted simply gets lexed again later, possibly in the other mode.
//!
//! Consumption comes in two flavours:
//!
//! - **accepting** (`bump`, `accept`, `eat`, `accept_until`, ...) appends
//!   symbols to the current span,
//! - **reading** (`skip`, `read_while`) moves past tokens without accepting
//!   them; the grammar must accept them later or put them back.
//!
//! ## Blocks
//!
//! Grammar functions open blocks with [`Parser::start_block`], which returns
//! a [`BlockMarker`] that panics when dropped without [`BlockMarker::end`],
//! or with the scoped [`Parser::in_block`]:
//!
//! ```ignore
//! p.in_block(BlockType::Expression, |p| {
//!     p.bump();
//!     p.output(SpanKind::Code);
//! });
//! ```
//!
//! ## Mode Switching
//!
//! [`Parser::with_other_parser`] is the only way to change the active mode.
//! It flips the [`Mode`], runs the other grammar, flips back and re-applies
//! the returning grammar's span configuration.

mod builder;
mod span;

pub(crate) mod grammar;

pub use builder::{BlockMarker, TreeBuilder};
pub use span::{SpanBuilder, SpanConfig};

use crate::errors::{ErrorKind, ErrorSink, RazorError};
use crate::lexer::{Keyword, LexError, Mode, Token, lex_at};
use crate::location::{LineIndex, SourceLocation};
use crate::syntax_kind::SyntaxKind;
use crate::tree::{AcceptedCharacters, Block, BlockType, SpanKind, Symbol};

/// Parser settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserOptions {
    /// Editor mode: whitespace stays with the code that precedes it and
    /// attribute values are never collapsed.
    pub design_time: bool,
    /// How many parser switches and nested code blocks may be open at once.
    pub max_nesting_depth: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            design_time: false,
            max_nesting_depth: 64,
        }
    }
}

/// Span builder and configuration belonging to one grammar.
#[derive(Debug)]
struct ModeState {
    span: SpanBuilder,
    config: SpanConfig,
}

impl ModeState {
    fn new(kind: SpanKind, config: SpanConfig) -> Self {
        let mut span = SpanBuilder::new(kind);
        span.configure(&config);
        Self { span, config }
    }
}

/// The parse context shared by both grammars.
pub struct Parser<'s> {
    source: &'s str,
    lines: LineIndex,
    pos: usize,
    mode: Mode,
    markup: ModeState,
    code: ModeState,
    pub(crate) builder: TreeBuilder,
    errors: ErrorSink,
    options: ParserOptions,
    depth: usize,
    depth_exceeded: bool,
    /// Inside an `@`-expression embedded in code
    pub(crate) is_nested: bool,
    pub(crate) whitespace_significant_to_ancestor: bool,
    pub(crate) null_generate_whitespace_and_newline: bool,
}

impl<'s> Parser<'s> {
    pub fn new(source: &'s str, mode: Mode, options: ParserOptions) -> Self {
        Self {
            source,
            lines: LineIndex::new(source),
            pos: 0,
            mode,
            markup: ModeState::new(SpanKind::Markup, SpanConfig::markup()),
            code: ModeState::new(SpanKind::Code, SpanConfig::statement()),
            builder: TreeBuilder::new(),
            errors: ErrorSink::new(),
            options,
            depth: 0,
            depth_exceeded: false,
            is_nested: false,
            whitespace_significant_to_ancestor: false,
            null_generate_whitespace_and_newline: false,
        }
    }

    /// Seal the tree and hand back the results.
    ///
    /// Input left over after a block-level entry point is kept in a final
    /// span so the tree still covers the whole source.
    pub fn finish(mut self) -> (Block, Vec<RazorError>) {
        if !self.at_end() {
            let rest = self.source.len() - self.pos;
            self.bump_raw(SyntaxKind::UNKNOWN, rest);
            let kind = self.mode_span_kind();
            let state = self.state_mut();
            state.span.kind = kind;
            let span = state.span.build();
            self.builder.add_trailing(span);
        }
        (self.builder.finish(), self.errors.into_errors())
    }

    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    pub fn design_time(&self) -> bool {
        self.options.design_time
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn source(&self) -> &'s str {
        self.source
    }

    fn state(&self) -> &ModeState {
        match self.mode {
            Mode::Markup => &self.markup,
            Mode::Code => &self.code,
        }
    }

    fn state_mut(&mut self) -> &mut ModeState {
        match self.mode {
            Mode::Markup => &mut self.markup,
            Mode::Code => &mut self.code,
        }
    }

    fn mode_span_kind(&self) -> SpanKind {
        match self.mode {
            Mode::Markup => SpanKind::Markup,
            Mode::Code => SpanKind::Code,
        }
    }

    // === Lookahead ===

    pub fn current_token(&self) -> Option<Token<'s>> {
        lex_at(self.source, self.pos, self.mode)
    }

    /// Kind of the current token, or `EOF`.
    pub fn current(&self) -> SyntaxKind {
        self.current_token().map_or(SyntaxKind::EOF, |t| t.kind)
    }

    pub fn current_text(&self) -> &'s str {
        self.current_token().map_or("", |t| t.text)
    }

    pub fn nth_token(&self, n: usize) -> Option<Token<'s>> {
        let mut offset = self.pos;
        let mut token = lex_at(self.source, offset, self.mode)?;
        for _ in 0..n {
            offset = token.end();
            token = lex_at(self.source, offset, self.mode)?;
        }
        Some(token)
    }

    pub fn nth(&self, n: usize) -> SyntaxKind {
        self.nth_token(n).map_or(SyntaxKind::EOF, |t| t.kind)
    }

    pub fn nth_text(&self, n: usize) -> &'s str {
        self.nth_token(n).map_or("", |t| t.text)
    }

    pub fn at(&self, kind: SyntaxKind) -> bool {
        self.current() == kind
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    pub fn at_keyword(&self, keyword: Keyword) -> bool {
        self.current_token().and_then(|t| t.keyword()) == Some(keyword)
    }

    pub fn current_keyword(&self) -> Option<Keyword> {
        self.current_token().and_then(|t| t.keyword())
    }

    /// The token after the current one has this kind.
    pub fn next_is(&self, kind: SyntaxKind) -> bool {
        self.nth(1) == kind
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Location of the cursor.
    pub fn location(&self) -> SourceLocation {
        self.lines.location(self.pos)
    }

    pub fn location_at(&self, offset: usize) -> SourceLocation {
        self.lines.location(offset)
    }

    /// Rest of the source from the cursor.
    pub fn remainder(&self) -> &'s str {
        &self.source[self.pos..]
    }

    // === Consumption ===

    /// Accept the current token and move on. Returns whether input remains.
    pub fn bump(&mut self) -> bool {
        if let Some(token) = self.current_token() {
            self.pos = token.end();
            self.accept(token);
        }
        !self.at_end()
    }

    /// Move past the current token without accepting it.
    pub fn skip(&mut self) -> Option<Token<'s>> {
        let token = self.current_token()?;
        self.pos = token.end();
        Some(token)
    }

    /// Append an already-read token to the current span.
    pub fn accept(&mut self, token: Token<'s>) {
        let start = self.lines.location(token.offset);
        if let Some(error) = token.error {
            let kind = match error {
                LexError::UnterminatedString | LexError::UnterminatedVerbatimString => {
                    ErrorKind::UnterminatedStringLiteral
                }
                LexError::UnterminatedBlockComment => ErrorKind::BlockCommentNotTerminated,
            };
            self.errors.on_error(RazorError::new(kind, start, 1));
        }
        let mode = self.mode;
        self.state_mut()
            .span
            .accept(Symbol::new(token.kind, mode, start, token.text));
    }

    pub fn accept_tokens(&mut self, tokens: impl IntoIterator<Item = Token<'s>>) {
        for token in tokens {
            self.accept(token);
        }
    }

    /// Accept the current token if it has the given kind.
    pub fn eat(&mut self, kind: SyntaxKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    pub fn eat_keyword(&mut self, keyword: Keyword) -> bool {
        if self.at_keyword(keyword) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Accept each kind in sequence, stopping at the first mismatch.
    pub fn accept_all(&mut self, kinds: &[SyntaxKind]) -> bool {
        for &kind in kinds {
            if !self.eat(kind) {
                return false;
            }
        }
        true
    }

    pub fn accept_while(&mut self, mut predicate: impl FnMut(&Token<'s>) -> bool) {
        while let Some(token) = self.current_token() {
            if !predicate(&token) {
                break;
            }
            self.bump();
        }
    }

    /// Accept tokens until one of `kinds` (left current) or end of input.
    pub fn accept_until(&mut self, kinds: &[SyntaxKind]) {
        self.accept_while(|t| !kinds.contains(&t.kind));
    }

    /// Read tokens while the predicate holds, without accepting them.
    pub fn read_while(&mut self, mut predicate: impl FnMut(&Token<'s>) -> bool) -> Vec<Token<'s>> {
        let mut tokens = Vec::new();
        while let Some(token) = self.current_token() {
            if !predicate(&token) {
                break;
            }
            self.pos = token.end();
            tokens.push(token);
        }
        tokens
    }

    /// Rewind so the given read-but-unaccepted tokens are lexed again.
    pub fn put_back(&mut self, tokens: &[Token<'s>]) {
        if let Some(first) = tokens.first() {
            self.seek(first.offset);
        }
    }

    pub fn put_back_token(&mut self, token: Token<'s>) {
        self.seek(token.offset);
    }

    pub fn seek(&mut self, offset: usize) {
        debug_assert!(offset <= self.source.len());
        self.pos = offset;
    }

    /// Accept the next `len` bytes as one symbol of `kind`, splitting tokens
    /// where the grammar needs a finer grain than the tokenizer produces.
    pub fn bump_raw(&mut self, kind: SyntaxKind, len: usize) {
        let end = (self.pos + len).min(self.source.len());
        let start = self.lines.location(self.pos);
        let source = self.source;
        let text = &source[self.pos..end];
        self.pos = end;
        let mode = self.mode;
        self.state_mut()
            .span
            .accept(Symbol::new(kind, mode, start, text));
    }

    /// Report an error unless the current token has the expected kind.
    pub fn required(
        &mut self,
        kind: SyntaxKind,
        error_if_not_found: bool,
        make_error: impl FnOnce(String) -> ErrorKind,
    ) -> bool {
        let found = self.at(kind);
        if !found && error_if_not_found {
            let component = match self.current() {
                SyntaxKind::NEWLINE => "line break".to_string(),
                SyntaxKind::WHITESPACE => "space or line break".to_string(),
                SyntaxKind::EOF => "end of file".to_string(),
                _ => format!("\"{}\" character", self.current_text()),
            };
            let length = self.current_text().len().max(1);
            self.error_here(make_error(component), length);
        }
        found
    }

    // === Spans ===

    pub fn span(&self) -> &SpanBuilder {
        &self.state().span
    }

    pub fn span_mut(&mut self) -> &mut SpanBuilder {
        &mut self.state_mut().span
    }

    /// The active grammar's span configuration.
    pub fn span_config(&self) -> &SpanConfig {
        &self.state().config
    }

    /// Attach the text an editor should insert to close the open construct,
    /// on the current span if it auto-completes, otherwise on the last
    /// auto-complete span of the open block.
    pub fn set_auto_complete_string(&mut self, text: &str) {
        if self.span().edit_handler.is_auto_complete() {
            self.span_mut().edit_handler.set_auto_complete_string(text);
        } else if let Some(span) = self.builder.last_auto_complete_span_mut() {
            span.edit_handler.set_auto_complete_string(text);
        }
    }

    /// Seal the current span (if it has symbols) and add it to the open block.
    pub fn output(&mut self, kind: SpanKind) {
        let state = match self.mode {
            Mode::Markup => &mut self.markup,
            Mode::Code => &mut self.code,
        };
        if state.span.is_empty() {
            return;
        }
        state.span.kind = kind;
        let span = state.span.build();
        state.span.configure(&state.config);
        self.builder.add_span(span);
    }

    pub fn output_with(&mut self, kind: SpanKind, accepted: AcceptedCharacters) {
        self.span_mut().set_accepted(accepted);
        self.output(kind);
    }

    /// Keep an otherwise empty span addressable with a zero-length symbol.
    pub fn add_marker_symbol_if_necessary(&mut self) {
        let location = self.location();
        self.add_marker_symbol_if_necessary_at(location);
    }

    pub fn add_marker_symbol_if_necessary_at(&mut self, location: SourceLocation) {
        if self.span().is_empty()
            && self.builder.last_accepted_characters() != AcceptedCharacters::Any
        {
            self.add_marker_symbol_at(location);
        }
    }

    pub fn add_marker_symbol(&mut self) {
        let location = self.location();
        self.add_marker_symbol_at(location);
    }

    fn add_marker_symbol_at(&mut self, location: SourceLocation) {
        let mode = self.mode;
        self.span_mut().accept(Symbol::marker(mode, location));
    }

    /// Replace the span configuration and apply it to the current span.
    pub fn configure_span(&mut self, config: SpanConfig) {
        let state = self.state_mut();
        state.span.configure(&config);
        state.config = config;
    }

    /// Re-apply the span configuration to the current span.
    pub fn initialize_span(&mut self) {
        let state = self.state_mut();
        state.span.configure(&state.config);
    }

    /// Run `f` with a span configuration pushed; the previous one is restored
    /// afterwards (without touching the current span).
    pub fn with_span_config<R>(&mut self, config: SpanConfig, f: impl FnOnce(&mut Self) -> R) -> R {
        let previous = self.state().config.clone();
        self.configure_span(config);
        let result = f(self);
        self.state_mut().config = previous;
        result
    }

    // === Blocks ===

    pub fn start_block(&mut self, block_type: BlockType) -> BlockMarker {
        let location = self.location();
        let depth = self.builder.start_block(block_type, location);
        BlockMarker::new(depth)
    }

    /// Open a block for the duration of `f`.
    pub fn in_block<R>(&mut self, block_type: BlockType, f: impl FnOnce(&mut Self) -> R) -> R {
        let marker = self.start_block(block_type);
        let result = f(self);
        marker.end(self);
        result
    }

    pub fn current_block_mut(&mut self) -> &mut Block {
        match self.builder.current_block_mut() {
            Some(block) => block,
            None => panic!("no open block"),
        }
    }

    pub fn current_block_type(&self) -> Option<BlockType> {
        self.builder.current_block().map(|b| b.block_type)
    }

    pub fn is_within(&self, block_type: BlockType) -> bool {
        self.builder.is_within(block_type)
    }

    // === Errors ===

    pub fn error(&mut self, kind: ErrorKind, location: SourceLocation, length: usize) {
        self.errors.on_error(RazorError::new(kind, location, length));
    }

    pub fn error_here(&mut self, kind: ErrorKind, length: usize) {
        let location = self.location();
        self.error(kind, location, length);
    }

    pub fn errors(&self) -> &[RazorError] {
        self.errors.errors()
    }

    // === Mode switching and nesting ===

    /// Run the other grammar at the cursor, then return to this one.
    pub fn with_other_parser<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.mode = self.mode.other();
        let result = f(self);
        self.mode = self.mode.other();
        self.initialize_span();
        result
    }

    /// Run a nesting grammar entry point under the depth guard.
    ///
    /// Past the limit, the rest of the input becomes one symbol in the
    /// current span and `f` is not run.
    pub fn guarded(&mut self, f: impl FnOnce(&mut Self)) {
        if self.depth >= self.options.max_nesting_depth {
            self.depth_limit_reached();
            return;
        }
        self.depth += 1;
        f(self);
        self.depth -= 1;
    }

    fn depth_limit_reached(&mut self) {
        if self.at_end() {
            return;
        }
        let rest = self.source.len() - self.pos;
        if !self.depth_exceeded {
            self.depth_exceeded = true;
            let limit = self.options.max_nesting_depth;
            log::warn!(
                "nesting depth limit {limit} reached at byte {}; {rest} bytes left unparsed",
                self.pos
            );
            self.error_here(ErrorKind::InputTooDeeplyNested { limit }, rest);
        }
        self.bump_raw(SyntaxKind::UNKNOWN, rest);
        let kind = self.mode_span_kind();
        self.output(kind);
    }
}

/// Parse a whole document with the markup grammar.
pub fn parse_document(source: &str, options: &ParserOptions) -> (Block, Vec<RazorError>) {
    let mut p = Parser::new(source, Mode::Markup, options.clone());
    grammar::markup::parse_document(&mut p);
    p.finish()
}

/// Parse a single block with the given grammar's block entry point.
pub fn parse_block(source: &str, mode: Mode, options: &ParserOptions) -> (Block, Vec<RazorError>) {
    let mut p = Parser::new(source, mode, options.clone());
    match mode {
        Mode::Markup => grammar::markup::parse_block(&mut p),
        Mode::Code => grammar::code::parse_block(&mut p),
    }
    p.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::ChunkGenerator;
    use pretty_assertions::assert_eq;

    fn parser(source: &str, mode: Mode) -> Parser<'_> {
        Parser::new(source, mode, ParserOptions::default())
    }

    #[test]
    fn lookahead_does_not_move_the_cursor() {
        let p = parser("foo.bar", Mode::Code);
        assert_eq!(p.current(), SyntaxKind::IDENT);
        assert_eq!(p.nth(1), SyntaxKind::DOT);
        assert_eq!(p.nth_text(2), "bar");
        assert_eq!(p.nth(3), SyntaxKind::EOF);
        assert_eq!(p.position(), 0);
    }

    #[test]
    fn read_and_put_back_rewinds() {
        let mut p = parser("a b c", Mode::Code);
        let read = p.read_while(|t| t.kind != SyntaxKind::EOF);
        assert_eq!(read.len(), 5);
        assert!(p.at_end());
        p.put_back(&read[2..]);
        assert_eq!(p.current_text(), "b");
    }

    #[test]
    fn same_offset_lexes_differently_per_mode() {
        let mut p = parser("<p>", Mode::Markup);
        assert_eq!(p.current(), SyntaxKind::L_ANGLE);
        p.mode = Mode::Code;
        assert_eq!(p.nth(1), SyntaxKind::IDENT);
    }

    #[test]
    fn output_skips_empty_spans_and_reapplies_config() {
        let mut p = parser("x", Mode::Code);
        let block = p.start_block(BlockType::Statement);
        p.output(SpanKind::Code);
        p.bump();
        p.span_mut().chunk_generator = ChunkGenerator::Expression;
        p.output(SpanKind::Code);
        assert_eq!(p.span().chunk_generator, ChunkGenerator::Statement);
        block.end(&mut p);
        let (root, errors) = p.finish();
        assert!(errors.is_empty());
        assert_eq!(root.children.len(), 1);
    }

    #[test]
    fn bump_raw_splits_tokens() {
        let mut p = parser("@*x", Mode::Code);
        p.bump_raw(SyntaxKind::TRANSITION, 1);
        assert_eq!(p.current_text(), "*");
        assert_eq!(p.span().symbols[0].content, "@");
    }

    #[test]
    fn unterminated_literal_reported_on_accept() {
        let mut p = parser("\"abc", Mode::Code);
        let token = p.skip().unwrap();
        assert!(p.errors().is_empty());
        p.accept(token);
        assert_eq!(p.errors().len(), 1);
        assert_eq!(p.errors()[0].kind, ErrorKind::UnterminatedStringLiteral);
    }

    #[test]
    fn required_names_what_was_found() {
        let mut p = parser(" x", Mode::Code);
        assert!(!p.required(SyntaxKind::IDENT, true, ErrorKind::UnexpectedCharacterAtSectionNameStart));
        assert_eq!(
            p.errors()[0].kind,
            ErrorKind::UnexpectedCharacterAtSectionNameStart("space or line break".into())
        );
    }

    #[test]
    fn span_config_is_scoped() {
        let mut p = parser("", Mode::Markup);
        p.with_span_config(SpanConfig::statement(), |p| {
            assert_eq!(p.span().chunk_generator, ChunkGenerator::Statement);
        });
        p.initialize_span();
        assert_eq!(p.span().chunk_generator, ChunkGenerator::Markup);
    }

    #[test]
    fn other_parser_keeps_its_own_span() {
        let mut p = parser("ab", Mode::Markup);
        p.with_other_parser(|p| {
            assert_eq!(p.mode(), Mode::Code);
            assert!(p.span().is_empty());
        });
        assert_eq!(p.mode(), Mode::Markup);
    }

    #[test]
    fn block_marker_must_be_ended() {
        let result = std::panic::catch_unwind(|| {
            let mut p = parser("test", Mode::Markup);
            let _marker = p.start_block(BlockType::Markup);
            // Marker dropped without end - should panic
        });
        assert!(result.is_err());
    }

    #[test]
    fn leftover_input_is_kept_after_block_entry() {
        let (root, _) = parse_block("foo bar", Mode::Code, &ParserOptions::default());
        assert_eq!(root.content(), "foo bar");
    }

    #[test]
    fn depth_guard_swallows_the_rest() {
        let options = ParserOptions {
            max_nesting_depth: 0,
            ..ParserOptions::default()
        };
        let mut p = Parser::new("abc", Mode::Markup, options);
        let block = p.start_block(BlockType::Markup);
        let mut ran = false;
        p.guarded(|_| ran = true);
        block.end(&mut p);
        assert!(!ran);
        let (root, errors) = p.finish();
        assert_eq!(root.content(), "abc");
        assert_eq!(errors[0].kind, ErrorKind::InputTooDeeplyNested { limit: 0 });
        assert_eq!(errors[0].length, 3);
    }
}
