//! The parser's single output type: one [`TokenType`] per [`parse_next`]
//! call.
//!
//! [`parse_next`]: crate::parser::PullParser::parse_next

/// The kind of token the parser last produced, or is latched on.
///
/// `InitialState` is never returned from `parse_next` (see
/// [`PullParser::parse_next`](crate::parser::PullParser::parse_next)); it
/// exists only to describe the parser's state before its first token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    /// Internal-only: the parser hasn't produced a token yet.
    InitialState,
    /// The (optional) XML declaration and any following whitespace have been
    /// consumed; this is always the first token a caller observes.
    OpenDocument,
    /// A start tag `<name ...>` was parsed; [`current_tag_name`] names it.
    ///
    /// [`current_tag_name`]: crate::parser::PullParser::current_tag_name
    OpenTag,
    /// An attribute of the current/most recent open tag was parsed;
    /// [`current_attribute_name`] and [`current_value`] describe it.
    ///
    /// [`current_attribute_name`]: crate::parser::PullParser::current_attribute_name
    /// [`current_value`]: crate::parser::PullParser::current_value
    Attribute,
    /// A run of character data was parsed; [`current_value`] decodes it.
    ///
    /// [`current_value`]: crate::parser::PullParser::current_value
    Text,
    /// A close tag was parsed; [`current_tag_name`] names it (see
    /// `spec.md` §4.3 for how the two parser variants disagree on which
    /// name that is).
    ///
    /// [`current_tag_name`]: crate::parser::PullParser::current_tag_name
    CloseTag,
    /// The outermost element has been closed; parsing is complete.
    /// Terminal: every subsequent `parse_next` call returns this again.
    CloseDocument,
    /// The buffered input ended in the middle of a valid prefix. Append more
    /// bytes with [`append_data`] and call `parse_next` again.
    ///
    /// [`append_data`]: crate::parser::PullParser::append_data
    IncompleteDocument,
    /// The input is not well-formed (or not validly encoded). Terminal:
    /// every subsequent `parse_next` call returns this again.
    Error,
}

impl TokenType {
    /// Whether this token type is latched: once produced, `parse_next` keeps
    /// producing it forever.
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, TokenType::CloseDocument | TokenType::Error)
    }
}
