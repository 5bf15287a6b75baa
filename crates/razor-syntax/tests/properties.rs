use pretty_assertions::assert_eq;
use razor_syntax::rewriter::rewrite;
use razor_syntax::tree::{Block, SyntaxTreeNode};
use razor_syntax::{
    BlockType, ErrorKind, Mode, ParserOptions, SourceLocation, SpanKind, SyntaxKind, parse,
    parse_block, parse_with,
};
use rstest::rstest;

fn fixture(name: &str) -> String {
    std::fs::read_to_string(format!(
        "{}/tests/fixtures/{name}.cshtml",
        env!("CARGO_MANIFEST_DIR")
    ))
    .unwrap()
}

/// Every non-empty span and symbol starts exactly where the previous one
/// ended. Zero-length markers may point elsewhere.
fn assert_contiguous(source: &str, root: &Block) {
    let mut offset = 0;
    for span in root.spans().filter(|s| s.length() > 0) {
        assert_eq!(
            span.start,
            SourceLocation::ZERO.advance(&source[..offset]),
            "span {span} in {source:?}"
        );
        for symbol in span.symbols.iter().filter(|s| !s.content.is_empty()) {
            assert_eq!(symbol.start.absolute_index, offset, "symbol {symbol:?}");
            offset += symbol.content.len();
        }
    }
    assert_eq!(offset, source.len());
}

fn assert_blocks_start_at_first_child(block: &Block) {
    for child in &block.children {
        if let SyntaxTreeNode::Block(inner) = child {
            if let Some(first) = inner.children.first() {
                assert_eq!(inner.start, first.start(), "{:?} block", inner.block_type);
            }
            assert_blocks_start_at_first_child(inner);
        }
    }
}

#[rstest]
#[case("layout")]
#[case("list")]
#[case("broken")]
fn fixtures_are_covered_exactly(#[case] name: &str) {
    let source = fixture(name);
    let results = parse(&source);
    assert_eq!(results.document.content(), source);
    assert_eq!(results.document.block_type, BlockType::Markup);
    assert_contiguous(&source, &results.document);
    assert_blocks_start_at_first_child(&results.document);
    assert_eq!(results.document.to_syntax_node().text().to_string(), source);
}

#[test]
fn broken_fixture_reports_errors_in_range() {
    let source = fixture("broken");
    let results = parse(&source);
    assert!(!results.success());
    for error in &results.errors {
        assert!(error.location.absolute_index <= source.len(), "{error:?}");
    }
}

#[rstest]
#[case("")]
#[case("@")]
#[case("@@")]
#[case("@{")]
#[case("@}")]
#[case("}")]
#[case("<")]
#[case("</")]
#[case("<p")]
#[case("@*")]
#[case("@:")]
#[case("@<")]
#[case("<text>")]
#[case("@section")]
#[case("@functions")]
#[case("@inherits")]
#[case("@addTagHelper")]
#[case("@(\"")]
#[case("@{ '")]
#[case("@{ /* }")]
#[case("@{ @: x\r\n}")]
#[case("<a b='@@' c=\"@x\" data-d=\"@y\" e>")]
#[case("\u{feff}<p>é @ü</p>")]
fn odd_inputs_are_covered(#[case] source: &str) {
    for options in [
        ParserOptions::default(),
        ParserOptions {
            design_time: true,
            ..ParserOptions::default()
        },
    ] {
        let results = parse_with(source, &options);
        assert_eq!(results.document.content(), source);
        assert_contiguous(source, &results.document);
    }
}

#[rstest]
#[case("layout")]
#[case("list")]
#[case("broken")]
fn rewrite_is_idempotent(#[case] name: &str) {
    let source = fixture(name);
    let options = ParserOptions::default();
    let results = parse_with(&source, &options);
    let mut again = results.document.clone();
    rewrite(&mut again, &options);
    assert_eq!(again, results.document);
}

#[test]
fn open_brace_reports_end_of_block_at_start() {
    let results = parse_block("{", Mode::Code, &ParserOptions::default());
    assert_eq!(results.errors.len(), 1);
    let error = &results.errors[0];
    assert_eq!(
        error.kind,
        ErrorKind::ExpectedEndOfBlockBeforeEof {
            block_name: "code".into(),
            close: "}".into(),
            open: "{".into(),
        }
    );
    assert_eq!(error.location, SourceLocation::new(0, 0, 0));
    assert_eq!(error.length, 1);

    assert_eq!(results.document.block_type, BlockType::Statement);
    let completing: Vec<_> = results
        .document
        .spans()
        .filter(|s| s.edit_handler.auto_complete_string() == Some("}"))
        .collect();
    assert_eq!(completing.len(), 1);
    assert_eq!(completing[0].kind, SpanKind::Code);
    assert_eq!(completing[0].content(), "");
}

#[test]
fn escaped_transition_in_attribute_is_literal() {
    let results = parse("<span foo='@@' />");
    assert!(results.success(), "{:?}", results.errors);
    let ats: Vec<_> = results
        .document
        .spans()
        .filter(|s| s.content() == "@")
        .collect();
    assert_eq!(ats.len(), 2);
    assert!(ats.iter().all(|s| s.kind == SpanKind::Markup));
    assert!(
        results
            .document
            .blocks()
            .iter()
            .all(|b| b.block_type != BlockType::Expression)
    );
}

#[test]
fn nested_section_is_reported_once_and_still_parsed() {
    let source = "@section foo { @section bar { <p>Foo</p> } }";
    let results = parse(source);
    assert_eq!(results.errors.len(), 1);
    assert_eq!(results.errors[0].kind, ErrorKind::SectionsCannotBeNested);
    assert_eq!(results.errors[0].location, SourceLocation::new(15, 0, 15));

    let sections = results
        .document
        .blocks()
        .into_iter()
        .filter(|b| b.block_type == BlockType::Section)
        .count();
    assert_eq!(sections, 2);
    assert_eq!(results.document.content(), source);
}

#[test]
fn unterminated_string_ends_at_newline() {
    let source = "@{ var s = \"abc\n }";
    let results = parse(source);
    let errors: Vec<_> = results
        .errors
        .iter()
        .filter(|e| e.kind == ErrorKind::UnterminatedStringLiteral)
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].location, SourceLocation::new(11, 0, 11));

    let symbols: Vec<_> = results
        .document
        .spans()
        .flat_map(|s| s.symbols.iter())
        .collect();
    let string = symbols
        .iter()
        .position(|s| s.kind == SyntaxKind::STRING)
        .unwrap();
    assert_eq!(symbols[string].content, "\"abc");
    assert_eq!(symbols[string + 1].kind, SyntaxKind::NEWLINE);
}

#[test]
fn deep_nesting_stops_at_the_limit() {
    let source = "@{<p>".repeat(200);
    // 8 MiB, the usual main-thread stack
    let results = std::thread::Builder::new()
        .stack_size(8 << 20)
        .spawn({
            let source = source.clone();
            move || parse(&source)
        })
        .unwrap()
        .join()
        .unwrap();
    let too_deep = results
        .errors
        .iter()
        .filter(|e| matches!(e.kind, ErrorKind::InputTooDeeplyNested { limit: 64 }))
        .count();
    assert_eq!(too_deep, 1);
    assert_eq!(results.document.content(), source);
}

#[test]
fn smaller_limit_is_honoured() {
    let options = ParserOptions {
        max_nesting_depth: 2,
        ..ParserOptions::default()
    };
    let source = "@{<p>@{<p>@{<p>x</p>}</p>}</p>}";
    let results = parse_with(source, &options);
    assert!(
        results
            .errors
            .iter()
            .any(|e| matches!(e.kind, ErrorKind::InputTooDeeplyNested { limit: 2 }))
    );
    assert_eq!(results.document.content(), source);
}
