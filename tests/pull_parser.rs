use pullxml::codec::Utf8Codec;
use pullxml::token::TokenType;
use pullxml::{ParserBuilder, PullParser};

fn events(xml: &str) -> Vec<TokenType> {
    let mut parser = PullParser::<Utf8Codec>::new(xml.as_bytes().to_vec());
    let mut out = Vec::new();
    loop {
        let token = parser.parse_next();
        out.push(token);
        if token.is_terminal() {
            break;
        }
    }
    out
}

#[test]
fn well_formed_document_with_nested_elements() {
    let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<catalog>
  <book id="b1">
    <title>Structure and Interpretation</title>
  </book>
</catalog>"#;
    let result = events(xml);
    assert_eq!(result.last(), Some(&TokenType::CloseDocument));
    assert!(!result.contains(&TokenType::Error));
}

#[test]
fn appending_data_piece_by_piece_reaches_close_document() {
    let whole = b"<root><child>text</child></root>";
    let mut parser = PullParser::<Utf8Codec>::new(Vec::new());
    let mut fed = 0;
    loop {
        let token = parser.parse_next();
        match token {
            TokenType::IncompleteDocument => {
                if fed >= whole.len() {
                    panic!("ran out of input without finishing the document");
                }
                let take = 3.min(whole.len() - fed);
                parser.append_data(&whole[fed..fed + take]);
                fed += take;
            }
            _ if token.is_terminal() => break,
            _ => {}
        }
    }
    assert_eq!(parser.parse_next(), TokenType::CloseDocument);
}

#[test]
fn save_point_allows_replaying_after_a_truncated_tag() {
    let mut parser = PullParser::<Utf8Codec>::new(b"<root><a/>".to_vec());
    assert_eq!(parser.parse_next(), TokenType::OpenDocument);
    assert_eq!(parser.parse_next(), TokenType::OpenTag);
    parser.set_save_point_at_last_tag();

    assert_eq!(parser.parse_next(), TokenType::CloseTag); // <a/>'s close
    assert!(parser.restore_to_save_point());

    parser.append_data(b"<b/></root>");
    assert_eq!(parser.parse_next(), TokenType::CloseTag);
    assert_eq!(parser.current_tag_name(), b"a");
    assert_eq!(parser.parse_next(), TokenType::OpenTag);
    assert_eq!(parser.current_tag_name(), b"b");
    assert_eq!(parser.parse_next(), TokenType::CloseTag);
    assert_eq!(parser.parse_next(), TokenType::CloseTag);
    assert_eq!(parser.parse_next(), TokenType::CloseDocument);
}

#[test]
fn builder_selects_name_matching_variant() {
    let mut parser = ParserBuilder::<Utf8Codec>::new()
        .with_name_matching()
        .build(b"<a><b></garbage></a>".to_vec());
    assert_eq!(parser.parse_next(), TokenType::OpenDocument);
    assert_eq!(parser.parse_next(), TokenType::OpenTag);
    assert_eq!(parser.parse_next(), TokenType::OpenTag);
    assert_eq!(parser.parse_next(), TokenType::CloseTag);
    assert_eq!(parser.current_tag_name(), b"b");
}

#[test]
fn unsupported_declared_encoding_is_rejected() {
    let result = events("<?xml version=\"1.0\" encoding=\"Shift-JIS\"?><r/>");
    assert_eq!(result[0], TokenType::Error);
}

#[test]
fn mismatched_close_tag_is_not_an_error_for_non_validating_parser() {
    // The non-validating variant reports the close tag's own name and never
    // checks it against the open tag: a document with a garbled end tag is
    // still, by its own rules, "well-formed enough" to parse through.
    let result = events("<a><b></totally-different></a>");
    assert_eq!(result.last(), Some(&TokenType::CloseDocument));
    assert!(!result.contains(&TokenType::Error));
}
