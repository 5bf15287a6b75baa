//! Document-order traversal of parse results.

use crate::errors::RazorError;
use crate::tree::{Block, Span, SyntaxTreeNode};

/// Callbacks for walking a finished tree.
///
/// Every method has an empty default, so implementors only override what
/// they care about. Overriding [`visit_block`](Self::visit_block) replaces
/// the recursion into children; call [`walk_block`] to keep it.
pub trait ParserVisitor {
    fn visit_block(&mut self, block: &Block) {
        walk_block(self, block);
    }

    fn visit_start_block(&mut self, _block: &Block) {}

    fn visit_end_block(&mut self, _block: &Block) {}

    fn visit_span(&mut self, _span: &Span) {}

    fn visit_error(&mut self, _error: &RazorError) {}

    fn on_complete(&mut self) {}
}

/// Start callback, children in order, end callback.
pub fn walk_block<V: ParserVisitor + ?Sized>(visitor: &mut V, block: &Block) {
    visitor.visit_start_block(block);
    for child in &block.children {
        match child {
            SyntaxTreeNode::Block(inner) => visitor.visit_block(inner),
            SyntaxTreeNode::Span(span) => visitor.visit_span(span),
        }
    }
    visitor.visit_end_block(block);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl ParserVisitor for Recorder {
        fn visit_start_block(&mut self, block: &Block) {
            self.events.push(format!("start {:?}", block.block_type));
        }

        fn visit_end_block(&mut self, block: &Block) {
            self.events.push(format!("end {:?}", block.block_type));
        }

        fn visit_span(&mut self, span: &Span) {
            self.events.push(format!("span {}", span.content()));
        }

        fn visit_error(&mut self, error: &RazorError) {
            self.events.push(format!("error {}", error.location));
        }

        fn on_complete(&mut self) {
            self.events.push("complete".to_string());
        }
    }

    #[test]
    fn walks_blocks_then_errors_then_completes() {
        let results = parse("a @foo b");
        let mut recorder = Recorder::default();
        results.accept(&mut recorder);
        assert_eq!(
            recorder.events,
            vec![
                "start Markup",
                "span a ",
                "start Expression",
                "span @",
                "span foo",
                "end Expression",
                "span  b",
                "end Markup",
                "complete",
            ]
        );
    }

    #[test]
    fn errors_are_visited_after_the_tree() {
        let results = parse("@(");
        let mut recorder = Recorder::default();
        results.accept(&mut recorder);
        assert!(!results.errors.is_empty());
        let end_of_tree = recorder
            .events
            .iter()
            .position(|e| e == "end Markup")
            .unwrap();
        let first_error = recorder
            .events
            .iter()
            .position(|e| e.starts_with("error"))
            .unwrap();
        assert!(end_of_tree < first_error);
        assert_eq!(recorder.events.last().map(String::as_str), Some("complete"));
    }

    #[test]
    fn overriding_visit_block_can_prune() {
        struct SkipExpressions(usize);
        impl ParserVisitor for SkipExpressions {
            fn visit_block(&mut self, block: &Block) {
                if block.block_type != crate::tree::BlockType::Expression {
                    walk_block(self, block);
                }
            }
            fn visit_span(&mut self, _span: &Span) {
                self.0 += 1;
            }
        }

        let mut visitor = SkipExpressions(0);
        parse("a @foo b").accept(&mut visitor);
        assert_eq!(visitor.0, 2);
    }
}
