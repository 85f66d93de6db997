//! A streaming, non-validating XML 1.x pull parser over a growable,
//! incrementally-fed byte buffer.
//!
//! The parser decodes one token at a time from [`PullParser::parse_next`],
//! and never requires the whole document to be resident: when the buffered
//! input ends in the middle of a valid prefix, `parse_next` reports
//! [`TokenType::IncompleteDocument`] and the caller feeds in more bytes with
//! [`PullParser::append_data`] before retrying. Three source encodings are
//! supported (UTF-8, UTF-16BE, UTF-16LE), selected as a compile-time
//! [`Codec`](codec::Codec) type parameter rather than a runtime flag, so
//! there is no virtual dispatch on the decode hot path.
//!
//! ```
//! use pullxml::{PullParser, codec::Utf8Codec, token::TokenType};
//!
//! let mut parser = PullParser::<Utf8Codec>::new(br#"<greeting lang="en">hi</greeting>"#.to_vec());
//!
//! assert_eq!(parser.parse_next(), TokenType::OpenDocument);
//! assert_eq!(parser.parse_next(), TokenType::OpenTag);
//! assert_eq!(parser.current_tag_name(), b"greeting");
//! assert_eq!(parser.parse_next(), TokenType::Attribute);
//! assert_eq!(parser.current_attribute_name(), b"lang");
//! assert_eq!(parser.parse_next(), TokenType::Text);
//! assert_eq!(parser.parse_next(), TokenType::CloseTag);
//! assert_eq!(parser.parse_next(), TokenType::CloseDocument);
//! ```
//!
//! What this crate deliberately does not do: validate against a DTD or
//! schema, interpret `<!DOCTYPE`/`<!--`/`<![CDATA[`/processing instructions
//! other than the leading `<?xml ... ?>` declaration, resolve namespaces, or
//! read from a file or socket on the caller's behalf. It hands back offsets
//! and decoded bytes; what a caller builds on top (a DOM, a typed
//! deserializer, a validator) is out of scope.

pub mod builder;
pub mod chars;
pub mod codec;
mod error;
pub mod parser;
pub mod text_decoder;
pub mod token;

pub use builder::ParserBuilder;
pub use parser::{NameMatching, NonValidating, PullParser, Variant};
pub use token::TokenType;
