//! The outer state machine: owns the input buffer, the name scratch area,
//! and the dispatch rules mapping `(current token, next bytes)` to the next
//! [`TokenType`](crate::token::TokenType).
//!
//! This is the component the spec calls "PullParser" (`spec.md` §4.3) — the
//! largest of the three (~60% of the core). [`PullParser`] is generic over a
//! [`Codec`] (monomorphized, never boxed — see `crate::codec`'s module docs)
//! and a [`Variant`] marker type selecting, at compile time, whether close
//! tags report the name that follows `</` verbatim ([`NonValidating`]) or the
//! name peeled off an internal stack of still-open tags ([`NameMatching`]).
//!
//! Positions into both the input buffer and the name scratch area are always
//! integer offsets, never raw references into `self`: that is what lets
//! [`append_data`](PullParser::append_data) grow the buffer, and the name
//! scratch area grow independently, without invalidating any name or value
//! a caller is currently holding (`spec.md` §9, "Moving storage and stable
//! references").

use std::marker::PhantomData;

use crate::chars::{is_name_char, is_name_start_char, is_xml_whitespace};
use crate::codec::{Codec, ParseOutcome};
use crate::error::ParseErrorKind;
use crate::text_decoder::{self, DecodeOutcome, TextType};
use crate::token::TokenType;

mod sealed {
    pub trait Sealed {}
}

/// Selects, at compile time, how close tags report their name.
///
/// Sealed: the two implementations below ([`NonValidating`], [`NameMatching`])
/// are the only ones the spec asks for (`spec.md` §4.3), and the parser's
/// internals rely on there being no third case.
pub trait Variant: sealed::Sealed {
    /// Whether this variant maintains a stack of open-tag names and reports
    /// that stack's top on close, instead of the name that literally follows
    /// `</`.
    #[doc(hidden)]
    const NAME_MATCHING: bool;
}

/// On a close tag, reports whatever name appears between `</` and `>`,
/// regardless of the matching open tag. Does not track a stack of open
/// names.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonValidating;

/// On a close tag, reports the name of the matching open tag, peeled off an
/// internal stack of still-open tag names.
#[derive(Debug, Clone, Copy, Default)]
pub struct NameMatching;

impl sealed::Sealed for NonValidating {}
impl sealed::Sealed for NameMatching {}

impl Variant for NonValidating {
    const NAME_MATCHING: bool = false;
}

impl Variant for NameMatching {
    const NAME_MATCHING: bool = true;
}

/// Which of the parser's two growable byte areas a [`NameRef`] points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NameStorage {
    /// Borrowed directly from the input buffer (UTF-8 sources only).
    Input,
    /// Copied, codepoint by codepoint, into the name scratch area (any
    /// source encoding whose bytes aren't already normalized UTF-8).
    Scratch,
}

impl Default for NameStorage {
    fn default() -> Self {
        NameStorage::Input
    }
}

/// An offset range naming a `Name`, plus which storage area it refers to.
/// Never a slice or a pointer, so it stays valid across `append_data` and
/// name-scratch growth (`spec.md` §9).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct NameRef {
    storage: NameStorage,
    begin: usize,
    end: usize,
}

/// The reader cursor (`spec.md` §3, "Reader state"): everything about *where
/// we are* that is cheap to snapshot and restore as a single `Copy` struct.
/// Deliberately excludes `depth`, `incomplete` and the current token type,
/// which are parser-level state the spec tracks separately (see `SavePoint`,
/// which bundles both together for the public save-point feature).
#[derive(Debug, Clone, Copy, Default)]
struct Cursor {
    read_offset: usize,
    current_char: u32,
    /// Byte offset in the input buffer where `current_char` began. Lets
    /// `parse_text`/`parse_name` recover "the start of the thing I'm
    /// currently looking at" without re-encoding `current_char` to measure
    /// its width.
    char_start: usize,
    tag_name: NameRef,
    attr_name: NameRef,
    value_begin: usize,
    value_end: usize,
    value_decoded_length: usize,
}

/// A snapshot taken at the most recently emitted open or close tag, per
/// `spec.md`'s save-point facility. A plain `Copy` struct of integers, so
/// taking and restoring one is a struct assignment, exactly as the design
/// notes ("snapshot and restore are memcpy-equivalent") call for.
#[derive(Debug, Clone, Copy)]
struct SavePoint {
    cursor: Cursor,
    depth: u32,
    incomplete: bool,
    token: TokenType,
    tag_stack_len: usize,
}

/// Whether a character was successfully decoded and the cursor advanced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Advance {
    Ok,
    Incomplete,
    Error,
}

/// The three-way result of attempting one of the compound grammar
/// productions (a `Name`, an open tag, a close tag, an attribute, a run of
/// text): matched and consumed, definitely not present here (try the next
/// alternative), or blocked/failed partway through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Matched,
    NotMatched,
    Incomplete,
    Error,
}

/// Whether the (optional) XML declaration was consumed, determined absent,
/// or left the parser blocked/failed. Kept distinct from [`Step`] because
/// "absent" and "consumed" both mean "proceed, cursor settled where it
/// should be" but only one of them must roll back the speculative `<?`
/// lookahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeclOutcome {
    Consumed,
    Absent,
    Incomplete,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NameKind {
    Tag,
    Attribute,
}

/// A streaming, non-validating XML pull parser over a growable byte buffer.
///
/// `C` selects the source encoding ([`Utf8Codec`](crate::codec::Utf8Codec),
/// [`Utf16BeCodec`](crate::codec::Utf16BeCodec),
/// [`Utf16LeCodec`](crate::codec::Utf16LeCodec)); `V` selects close-tag
/// reporting ([`NonValidating`] by default, or [`NameMatching`]). Both are
/// compile-time choices — see `spec.md` §4.3 and §9 ("Codec polymorphism").
///
/// Construct with [`PullParser::new`] (or [`ParserBuilder`](crate::builder::ParserBuilder)
/// for more control), then call [`parse_next`](PullParser::parse_next)
/// repeatedly, appending more bytes via [`append_data`](PullParser::append_data)
/// whenever it reports [`TokenType::IncompleteDocument`].
#[derive(Debug)]
pub struct PullParser<C: Codec, V: Variant = NonValidating> {
    buf: Vec<u8>,
    name_scratch: Vec<u8>,
    cursor: Cursor,
    depth: u32,
    incomplete: bool,
    token: TokenType,
    save_point: Option<SavePoint>,
    /// Stack of still-open tag names, by scratch/input offset. Only ever
    /// pushed to or popped from when `V::NAME_MATCHING`; left permanently
    /// empty for [`NonValidating`] parsers.
    tag_stack: Vec<NameRef>,
    last_err: Option<ParseErrorKind>,
    _codec: PhantomData<C>,
    _variant: PhantomData<V>,
}

impl<C: Codec, V: Variant> PullParser<C, V> {
    /// Creates a parser over `initial_bytes`, which may be a partial
    /// document. A byte-order mark matching `C::bom()` at the very start is
    /// recognized and consumed.
    pub fn new(initial_bytes: Vec<u8>) -> Self {
        Self::with_capacity(initial_bytes, 0)
    }

    /// As [`new`](Self::new), but reserves `name_scratch_capacity` bytes in
    /// the name scratch area up front (only useful for non-UTF-8 sources,
    /// where names are copied rather than borrowed).
    pub fn with_capacity(initial_bytes: Vec<u8>, name_scratch_capacity: usize) -> Self {
        let buf = initial_bytes;
        let read_offset = match C::bom() {
            Some(bom) if buf.starts_with(bom) => bom.len(),
            _ => 0,
        };
        let mut parser = PullParser {
            buf,
            name_scratch: Vec::with_capacity(name_scratch_capacity),
            cursor: Cursor {
                read_offset,
                ..Cursor::default()
            },
            depth: 0,
            incomplete: false,
            token: TokenType::InitialState,
            save_point: None,
            tag_stack: Vec::new(),
            last_err: None,
            _codec: PhantomData,
            _variant: PhantomData,
        };
        let _ = parser.advance();
        parser
    }

    /// Decodes and produces the next token. Returns the same value forever
    /// once a terminal token ([`TokenType::Error`] or
    /// [`TokenType::CloseDocument`]) has been produced, or
    /// [`TokenType::IncompleteDocument`] if the buffered input ran out
    /// mid-token and no further bytes have arrived since.
    pub fn parse_next(&mut self) -> TokenType {
        if self.incomplete {
            return TokenType::IncompleteDocument;
        }
        match self.token {
            TokenType::CloseDocument | TokenType::Error => return self.token,
            TokenType::InitialState => self.step_initial(),
            TokenType::OpenDocument => self.step_open_document(),
            TokenType::OpenTag | TokenType::Attribute => self.step_open_tag_or_attribute(),
            TokenType::CloseTag => self.step_close_tag(),
            TokenType::Text => self.step_text(),
            TokenType::IncompleteDocument => unreachable!("never latched as the current token"),
        }
        self.current_token_type()
    }

    /// The token last produced (or latched on), without advancing.
    pub fn current_token_type(&self) -> TokenType {
        match self.token {
            TokenType::Error | TokenType::CloseDocument => self.token,
            _ if self.incomplete => TokenType::IncompleteDocument,
            _ => self.token,
        }
    }

    /// The name of the most recently parsed open or close tag, as UTF-8.
    pub fn current_tag_name(&self) -> &[u8] {
        self.resolve_name(self.cursor.tag_name)
    }

    /// The name of the most recently parsed attribute, as UTF-8.
    pub fn current_attribute_name(&self) -> &[u8] {
        self.resolve_name(self.cursor.attr_name)
    }

    /// Decodes the current attribute value or text run (reference expansion
    /// applied) as UTF-8 into `out`, if given, and reports the decoded
    /// length either way. Call with `out: None` to measure before
    /// allocating.
    pub fn current_value(&self, out: Option<&mut Vec<u8>>) -> Result<usize, ()> {
        let result = text_decoder::decode_text::<C>(
            &self.buf,
            self.cursor.value_begin,
            TextType::Plain,
            Some(self.cursor.value_end),
            out,
        );
        if result.is_error() {
            Err(())
        } else {
            Ok(result.write_count)
        }
    }

    /// Appends more bytes to the input buffer. If the parser last reported
    /// [`TokenType::IncompleteDocument`], the next [`parse_next`](Self::parse_next)
    /// call retries from the position that failed.
    pub fn append_data(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
        self.incomplete = false;
    }

    /// Snapshots the reader state at the most recently emitted open or close
    /// tag. Returns `false` (and snapshots nothing) if the current token
    /// isn't an open or close tag — in particular, if none has been emitted
    /// yet.
    pub fn set_save_point_at_last_tag(&mut self) -> bool {
        if !matches!(self.token, TokenType::OpenTag | TokenType::CloseTag) {
            return false;
        }
        self.save_point = Some(SavePoint {
            cursor: self.cursor,
            depth: self.depth,
            incomplete: self.incomplete,
            token: self.token,
            tag_stack_len: self.tag_stack.len(),
        });
        true
    }

    /// Rewinds to the most recent save point, so the remainder of the event
    /// sequence from that tag onward can be replayed (after, if needed,
    /// appending the bytes that were missing the first time). Returns
    /// `false` if no save point has been set.
    pub fn restore_to_save_point(&mut self) -> bool {
        let Some(sp) = self.save_point else {
            return false;
        };
        self.cursor = sp.cursor;
        self.depth = sp.depth;
        self.incomplete = sp.incomplete;
        self.token = sp.token;
        self.tag_stack.truncate(sp.tag_stack_len);
        true
    }

    /// Transfers ownership of the input buffer back to the caller,
    /// consuming the parser.
    pub fn extract_data(self) -> Vec<u8> {
        self.buf
    }

    #[cfg(test)]
    pub(crate) fn last_error(&self) -> Option<ParseErrorKind> {
        self.last_err
    }

    #[cfg(test)]
    pub(crate) fn depth(&self) -> u32 {
        self.depth
    }

    fn resolve_name(&self, name: NameRef) -> &[u8] {
        match name.storage {
            NameStorage::Input => &self.buf[name.begin..name.end],
            NameStorage::Scratch => &self.name_scratch[name.begin..name.end],
        }
    }

    fn latch_error(&mut self, kind: ParseErrorKind) {
        self.token = TokenType::Error;
        self.last_err = Some(kind);
    }

    /// Decodes exactly one codepoint starting at `cursor.read_offset`,
    /// advancing the cursor on success. Mirrors the original's `nextChar`.
    fn advance(&mut self) -> Advance {
        let start = self.cursor.read_offset;
        match C::parse_next(&self.buf[start..]) {
            ParseOutcome::Ok { codepoint, len } => {
                self.cursor.char_start = start;
                self.cursor.current_char = codepoint;
                self.cursor.read_offset = start + len as usize;
                Advance::Ok
            }
            ParseOutcome::Incomplete => {
                self.incomplete = true;
                Advance::Incomplete
            }
            ParseOutcome::Invalid => {
                self.latch_error(ParseErrorKind::Encoding);
                Advance::Error
            }
        }
    }

    fn skip_whitespace(&mut self) -> Step {
        while is_xml_whitespace(self.cursor.current_char) {
            match self.advance() {
                Advance::Ok => {}
                Advance::Incomplete => return Step::Incomplete,
                Advance::Error => return Step::Error,
            }
        }
        Step::Matched
    }

    /// Parses a `Name` ([4]/[4a]) starting at the current character,
    /// storing the result in `cursor.tag_name` or `cursor.attr_name`
    /// depending on `kind`. Borrows from the input buffer when
    /// `C::borrows_names()`; otherwise copies each decoded codepoint,
    /// re-encoded as UTF-8, into the name scratch area.
    fn parse_name(&mut self, kind: NameKind) -> Step {
        if !is_name_start_char(self.cursor.current_char) {
            return Step::NotMatched;
        }
        let name_ref = if C::borrows_names() {
            let begin = self.cursor.char_start;
            loop {
                match self.advance() {
                    Advance::Ok => {}
                    Advance::Incomplete => return Step::Incomplete,
                    Advance::Error => return Step::Error,
                }
                if !is_name_char(self.cursor.current_char) {
                    break;
                }
            }
            NameRef {
                storage: NameStorage::Input,
                begin,
                end: self.cursor.char_start,
            }
        } else {
            let begin = self.name_scratch.len();
            let _ = C::encode_char(self.cursor.current_char, &mut self.name_scratch);
            loop {
                match self.advance() {
                    Advance::Ok => {}
                    Advance::Incomplete => return Step::Incomplete,
                    Advance::Error => return Step::Error,
                }
                if !is_name_char(self.cursor.current_char) {
                    break;
                }
                let _ = C::encode_char(self.cursor.current_char, &mut self.name_scratch);
            }
            NameRef {
                storage: NameStorage::Scratch,
                begin,
                end: self.name_scratch.len(),
            }
        };
        match kind {
            NameKind::Tag => self.cursor.tag_name = name_ref,
            NameKind::Attribute => self.cursor.attr_name = name_ref,
        }
        Step::Matched
    }

    /// Parses one `Attribute` ([41]): `Name Eq AttValue`. Only sets
    /// `current_token_type` to `Attribute` when `emit_token` — the XML
    /// declaration scanner drives this same routine with `emit_token:
    /// false` (`SPEC_FULL.md`, "XML declaration scanning reuses the
    /// attribute parser"). On anything short of full success, the cursor and
    /// any scratch bytes written in the attempt are rolled back, so a retry
    /// after `append_data` restarts this production from the attribute name
    /// again (mirrors `parse_open_tag`/`parse_close_tag`).
    fn parse_attribute(&mut self, emit_token: bool) -> Step {
        if !is_name_start_char(self.cursor.current_char) {
            return Step::NotMatched;
        }
        let snapshot = self.cursor;
        let scratch_mark = self.name_scratch.len();
        let step = self.try_parse_attribute(emit_token);
        if step != Step::Matched {
            self.cursor = snapshot;
            self.name_scratch.truncate(scratch_mark);
        }
        step
    }

    fn try_parse_attribute(&mut self, emit_token: bool) -> Step {
        match self.parse_name(NameKind::Attribute) {
            Step::Matched => {}
            other => return other,
        }
        match self.skip_whitespace() {
            Step::Matched => {}
            other => return other,
        }
        if self.cursor.current_char != '=' as u32 {
            self.latch_error(ParseErrorKind::MalformedAttribute);
            return Step::Error;
        }
        match self.advance() {
            Advance::Ok => {}
            Advance::Incomplete => return Step::Incomplete,
            Advance::Error => return Step::Error,
        }
        match self.skip_whitespace() {
            Step::Matched => {}
            other => return other,
        }
        let text_type = if self.cursor.current_char == '"' as u32 {
            TextType::AttValueQuote
        } else if self.cursor.current_char == '\'' as u32 {
            TextType::AttValueApos
        } else {
            self.latch_error(ParseErrorKind::MalformedAttribute);
            return Step::Error;
        };
        let content_start = self.cursor.read_offset;
        let result = text_decoder::decode_text::<C>(&self.buf, content_start, text_type, None, None);
        match result.outcome {
            DecodeOutcome::Incomplete => {
                self.incomplete = true;
                return Step::Incomplete;
            }
            DecodeOutcome::Error => {
                self.latch_error(ParseErrorKind::MalformedReference);
                return Step::Error;
            }
            DecodeOutcome::Done => {
                self.cursor.value_begin = result.start_of_text;
                self.cursor.value_end = result.end_of_text;
                self.cursor.value_decoded_length = result.write_count;
                self.cursor.read_offset = result.read_pointer;
            }
        }
        // Consume the closing quote, then advance the lookahead past it, so
        // `current_char` ends up holding the first unconsumed character
        // after the value the way every other production leaves it.
        match self.advance() {
            Advance::Ok => {}
            Advance::Incomplete => return Step::Incomplete,
            Advance::Error => return Step::Error,
        }
        match self.advance() {
            Advance::Ok => {}
            Advance::Incomplete => return Step::Incomplete,
            Advance::Error => return Step::Error,
        }
        match self.skip_whitespace() {
            Step::Matched => {}
            other => return other,
        }
        if emit_token {
            self.token = TokenType::Attribute;
        }
        Step::Matched
    }

    /// Parses a run of character data up to (not including) the next `<`.
    fn parse_text(&mut self) -> Step {
        if self.cursor.current_char == '<' as u32 {
            return Step::NotMatched;
        }
        let start = self.cursor.char_start;
        let result = text_decoder::decode_text::<C>(&self.buf, start, TextType::CharData, None, None);
        match result.outcome {
            DecodeOutcome::Incomplete => {
                self.incomplete = true;
                Step::Incomplete
            }
            DecodeOutcome::Error => {
                self.latch_error(ParseErrorKind::IllegalChar);
                Step::Error
            }
            DecodeOutcome::Done => {
                self.cursor.value_begin = result.start_of_text;
                self.cursor.value_end = result.end_of_text;
                self.cursor.value_decoded_length = result.write_count;
                self.cursor.read_offset = result.read_pointer;
                match self.advance() {
                    Advance::Ok => {}
                    Advance::Incomplete => return Step::Incomplete,
                    Advance::Error => return Step::Error,
                }
                self.token = TokenType::Text;
                Step::Matched
            }
        }
    }

    /// Parses an `STag` ([40]): `'<' Name (S Attribute)* S? '>'`, stopping
    /// just after the trailing (optional) whitespace — the caller is left
    /// to decide, from `cursor.current_char`, whether an attribute, `>` or
    /// `/` follows. On anything short of full success, the cursor and any
    /// scratch bytes written in the attempt are rolled back, so a retry
    /// after `append_data` restarts this production from `<` again.
    fn parse_open_tag(&mut self) -> Step {
        if self.cursor.current_char != '<' as u32 {
            return Step::NotMatched;
        }
        let snapshot = self.cursor;
        let scratch_mark = self.name_scratch.len();
        let step = self.try_parse_open_tag();
        if step != Step::Matched {
            self.cursor = snapshot;
            self.name_scratch.truncate(scratch_mark);
        }
        step
    }

    fn try_parse_open_tag(&mut self) -> Step {
        match self.advance() {
            Advance::Ok => {}
            Advance::Incomplete => return Step::Incomplete,
            Advance::Error => return Step::Error,
        }
        match self.parse_name(NameKind::Tag) {
            Step::Matched => {}
            other => return other,
        }
        match self.skip_whitespace() {
            Step::Matched => {}
            other => return other,
        }
        if V::NAME_MATCHING {
            self.tag_stack.push(self.cursor.tag_name);
        }
        self.depth += 1;
        self.token = TokenType::OpenTag;
        Step::Matched
    }

    /// Parses an `ETag` ([42]): `'</' Name S? '>'`. Reproduces the source's
    /// depth-1 cursor guard (`spec.md` §9, "Open questions"): on the close
    /// tag that brings `depth` back to 0, the cursor is not advanced past
    /// the final `>`, so `CloseDocument` can be emitted on the very next
    /// `parse_next` call without requiring another byte to be available.
    fn parse_close_tag(&mut self) -> Step {
        if self.cursor.current_char != '<' as u32 {
            return Step::NotMatched;
        }
        let snapshot = self.cursor;
        let scratch_mark = self.name_scratch.len();
        let step = self.try_parse_close_tag();
        if step != Step::Matched {
            self.cursor = snapshot;
            self.name_scratch.truncate(scratch_mark);
        }
        step
    }

    fn try_parse_close_tag(&mut self) -> Step {
        match self.advance() {
            Advance::Ok => {}
            Advance::Incomplete => return Step::Incomplete,
            Advance::Error => return Step::Error,
        }
        if self.cursor.current_char != '/' as u32 {
            return Step::NotMatched;
        }
        match self.advance() {
            Advance::Ok => {}
            Advance::Incomplete => return Step::Incomplete,
            Advance::Error => return Step::Error,
        }
        match self.parse_name(NameKind::Tag) {
            Step::Matched => {}
            Step::NotMatched => {
                self.latch_error(ParseErrorKind::MalformedTag);
                return Step::Error;
            }
            other => return other,
        }
        match self.skip_whitespace() {
            Step::Matched => {}
            other => return other,
        }
        if self.cursor.current_char != '>' as u32 {
            self.latch_error(ParseErrorKind::MalformedTag);
            return Step::Error;
        }
        self.finish_close_tag();
        Step::Matched
    }

    /// Shared tail of a real `</tag>` close and a synthesized self-closing
    /// `/>` close: resolve the reported name per the variant, and apply the
    /// depth-1 guard.
    fn finish_close_tag(&mut self) {
        if V::NAME_MATCHING {
            if let Some(name) = self.tag_stack.pop() {
                self.cursor.tag_name = name;
            }
        }
        if self.depth > 1 {
            // Best-effort: ignore the outcome, as the original does ("don't
            // check the error, as we return in any case"). Any incomplete
            // or encoding error this surfaces will be re-observed the next
            // time this position is decoded.
            let _ = self.advance();
        } else {
            self.cursor.current_char = 0;
        }
        self.token = TokenType::CloseTag;
    }

    /// Close tag, open tag, or character data — whichever follows wherever
    /// the cursor currently sits (after a `>` that closed an open tag, or
    /// after processing a close tag that didn't bring depth to 0).
    fn parse_after_tag(&mut self) -> Step {
        match self.parse_close_tag() {
            Step::Matched => return Step::Matched,
            Step::NotMatched => {}
            other => return other,
        }
        match self.parse_open_tag() {
            Step::Matched => return Step::Matched,
            Step::NotMatched => {}
            other => return other,
        }
        self.parse_text()
    }

    /// Speculatively scans an XML declaration (`<?xml ... ?>`) if present,
    /// validating `version`/`encoding` attributes the way the declaration
    /// scanner reuses the ordinary attribute parser
    /// (`SPEC_FULL.md`, "XML declaration scanning reuses the attribute
    /// parser"). Any other attribute is ignored, including `standalone`
    /// (`spec.md` §9, "Open questions").
    fn handle_xml_decl(&mut self) -> DeclOutcome {
        if self.cursor.current_char != '<' as u32 {
            return DeclOutcome::Absent;
        }
        let snapshot = self.cursor;
        let scratch_mark = self.name_scratch.len();
        let outcome = self.try_handle_xml_decl();
        if !matches!(outcome, DeclOutcome::Consumed) {
            self.cursor = snapshot;
            self.name_scratch.truncate(scratch_mark);
        }
        outcome
    }

    fn try_handle_xml_decl(&mut self) -> DeclOutcome {
        match self.advance() {
            Advance::Ok => {}
            Advance::Incomplete => return DeclOutcome::Incomplete,
            Advance::Error => return DeclOutcome::Error,
        }
        if self.cursor.current_char != '?' as u32 {
            return DeclOutcome::Absent;
        }
        match self.advance() {
            Advance::Ok => {}
            Advance::Incomplete => return DeclOutcome::Incomplete,
            Advance::Error => return DeclOutcome::Error,
        }
        match self.parse_name(NameKind::Tag) {
            Step::Matched => {}
            Step::NotMatched => {
                self.latch_error(ParseErrorKind::Declaration);
                return DeclOutcome::Error;
            }
            Step::Incomplete => return DeclOutcome::Incomplete,
            Step::Error => return DeclOutcome::Error,
        }
        if self.current_tag_name() != b"xml" {
            self.latch_error(ParseErrorKind::Declaration);
            return DeclOutcome::Error;
        }
        match self.skip_whitespace() {
            Step::Matched => {}
            Step::Incomplete => return DeclOutcome::Incomplete,
            Step::Error => return DeclOutcome::Error,
            Step::NotMatched => unreachable!("skip_whitespace never reports NotMatched"),
        }
        loop {
            match self.parse_attribute(false) {
                Step::Matched => {
                    let is_version = self.current_attribute_name() == b"version";
                    let is_encoding = self.current_attribute_name() == b"encoding";
                    if is_version || is_encoding {
                        let mut value = Vec::new();
                        if self.current_value(Some(&mut value)).is_err() {
                            self.latch_error(ParseErrorKind::Declaration);
                            return DeclOutcome::Error;
                        }
                        if is_version && !is_valid_xml_decl_version(&value) {
                            self.latch_error(ParseErrorKind::Declaration);
                            return DeclOutcome::Error;
                        }
                        if is_encoding && !C::is_supported_encoding(&value) {
                            self.latch_error(ParseErrorKind::Declaration);
                            return DeclOutcome::Error;
                        }
                    }
                }
                Step::NotMatched => break,
                Step::Incomplete => return DeclOutcome::Incomplete,
                Step::Error => return DeclOutcome::Error,
            }
        }
        if self.cursor.current_char != '?' as u32 {
            self.latch_error(ParseErrorKind::Declaration);
            return DeclOutcome::Error;
        }
        match self.advance() {
            Advance::Ok => {}
            Advance::Incomplete => return DeclOutcome::Incomplete,
            Advance::Error => return DeclOutcome::Error,
        }
        if self.cursor.current_char != '>' as u32 {
            self.latch_error(ParseErrorKind::Declaration);
            return DeclOutcome::Error;
        }
        match self.advance() {
            Advance::Ok => {}
            Advance::Incomplete => return DeclOutcome::Incomplete,
            Advance::Error => return DeclOutcome::Error,
        }
        DeclOutcome::Consumed
    }

    fn step_initial(&mut self) {
        match self.handle_xml_decl() {
            DeclOutcome::Consumed | DeclOutcome::Absent => {}
            DeclOutcome::Incomplete | DeclOutcome::Error => return,
        }
        match self.skip_whitespace() {
            Step::Matched => {}
            Step::Incomplete | Step::Error => return,
            Step::NotMatched => unreachable!("skip_whitespace never reports NotMatched"),
        }
        self.token = TokenType::OpenDocument;
    }

    fn step_open_document(&mut self) {
        match self.parse_open_tag() {
            Step::Matched => {}
            Step::NotMatched => self.latch_error(ParseErrorKind::ExpectedName),
            Step::Incomplete | Step::Error => {}
        }
    }

    fn step_open_tag_or_attribute(&mut self) {
        match self.parse_attribute(true) {
            Step::Matched => return,
            Step::Incomplete | Step::Error => return,
            Step::NotMatched => {}
        }
        if self.cursor.current_char == '>' as u32 {
            match self.advance() {
                Advance::Ok => {}
                Advance::Incomplete | Advance::Error => return,
            }
            match self.parse_after_tag() {
                Step::Matched => {}
                Step::NotMatched => self.latch_error(ParseErrorKind::MalformedTag),
                Step::Incomplete | Step::Error => {}
            }
            return;
        }
        if self.cursor.current_char == '/' as u32 {
            match self.advance() {
                Advance::Ok => {}
                Advance::Incomplete | Advance::Error => return,
            }
            if self.cursor.current_char != '>' as u32 {
                self.latch_error(ParseErrorKind::MalformedTag);
                return;
            }
            self.finish_close_tag();
            return;
        }
        self.latch_error(ParseErrorKind::MalformedTag);
    }

    fn step_close_tag(&mut self) {
        self.depth -= 1;
        if self.depth == 0 {
            self.token = TokenType::CloseDocument;
            return;
        }
        match self.parse_after_tag() {
            Step::Matched => {}
            Step::NotMatched => self.latch_error(ParseErrorKind::MalformedTag),
            Step::Incomplete | Step::Error => {}
        }
    }

    fn step_text(&mut self) {
        match self.parse_close_tag() {
            Step::Matched => return,
            Step::NotMatched => {}
            Step::Incomplete | Step::Error => return,
        }
        match self.parse_open_tag() {
            Step::Matched => {}
            Step::NotMatched => self.latch_error(ParseErrorKind::MalformedTag),
            Step::Incomplete | Step::Error => {}
        }
    }
}

/// `VersionNum` ([26]): `'1.' [0-9]+`, checked as a textual prefix rather
/// than a semantic version comparison (`SPEC_FULL.md`, "Version check is a
/// textual prefix check").
fn is_valid_xml_decl_version(value: &[u8]) -> bool {
    value.len() >= 3 && value[0] == b'1' && value[1] == b'.' && value[2..].iter().all(u8::is_ascii_digit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Utf16BeCodec, Utf16LeCodec, Utf8Codec};
    use pretty_assertions::assert_eq;

    type P = PullParser<Utf8Codec>;
    type PNm = PullParser<Utf8Codec, NameMatching>;

    fn value_of<C: Codec, V: Variant>(p: &PullParser<C, V>) -> String {
        let mut out = Vec::new();
        p.current_value(Some(&mut out)).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn self_closing_root() {
        let mut p = P::new(b"<root/>".to_vec());
        assert_eq!(p.parse_next(), TokenType::OpenDocument);
        assert_eq!(p.parse_next(), TokenType::OpenTag);
        assert_eq!(p.current_tag_name(), b"root");
        assert_eq!(p.parse_next(), TokenType::CloseTag);
        assert_eq!(p.current_tag_name(), b"root");
        assert_eq!(p.parse_next(), TokenType::CloseDocument);
        assert_eq!(p.parse_next(), TokenType::CloseDocument);
    }

    #[test]
    fn text_content() {
        let mut p = P::new(b"<root> </root>".to_vec());
        assert_eq!(p.parse_next(), TokenType::OpenDocument);
        assert_eq!(p.parse_next(), TokenType::OpenTag);
        assert_eq!(p.parse_next(), TokenType::Text);
        assert_eq!(value_of(&p), " ");
        assert_eq!(p.parse_next(), TokenType::CloseTag);
        assert_eq!(p.parse_next(), TokenType::CloseDocument);
    }

    #[test]
    fn attributes() {
        let mut p = P::new(b"<root att1=\"val1\" att2='val2'/>".to_vec());
        assert_eq!(p.parse_next(), TokenType::OpenDocument);
        assert_eq!(p.parse_next(), TokenType::OpenTag);
        assert_eq!(p.parse_next(), TokenType::Attribute);
        assert_eq!(p.current_attribute_name(), b"att1");
        assert_eq!(value_of(&p), "val1");
        assert_eq!(p.parse_next(), TokenType::Attribute);
        assert_eq!(p.current_attribute_name(), b"att2");
        assert_eq!(value_of(&p), "val2");
        assert_eq!(p.parse_next(), TokenType::CloseTag);
        assert_eq!(p.parse_next(), TokenType::CloseDocument);
    }

    #[test]
    fn xml_declaration_accepted() {
        let mut p = P::new(b"<?xml version=\"1.1\" encoding=\"UTF-8\"?><r/>".to_vec());
        assert_eq!(p.parse_next(), TokenType::OpenDocument);
        assert_eq!(p.parse_next(), TokenType::OpenTag);
        assert_eq!(p.current_tag_name(), b"r");
        assert_eq!(p.parse_next(), TokenType::CloseTag);
        assert_eq!(p.parse_next(), TokenType::CloseDocument);
    }

    #[test]
    fn xml_declaration_bad_version() {
        let mut p = P::new(b"<?xml version=\"2.0\"?><r/>".to_vec());
        assert_eq!(p.parse_next(), TokenType::Error);
    }

    #[test]
    fn xml_declaration_bad_encoding() {
        let mut p = P::new(b"<?xml encoding=\"ISO-8859-15\"?><r/>".to_vec());
        assert_eq!(p.parse_next(), TokenType::Error);
    }

    #[test]
    fn xml_declaration_ignores_standalone() {
        let mut p = P::new(b"<?xml version=\"1.0\" standalone=\"yes\"?><r/>".to_vec());
        assert_eq!(p.parse_next(), TokenType::OpenDocument);
        assert_eq!(p.parse_next(), TokenType::OpenTag);
    }

    #[test]
    fn entity_and_numeric_references() {
        let mut p = P::new(b"<root>&amp;&#45;&#x2D;</root>".to_vec());
        assert_eq!(p.parse_next(), TokenType::OpenDocument);
        assert_eq!(p.parse_next(), TokenType::OpenTag);
        assert_eq!(p.parse_next(), TokenType::Text);
        assert_eq!(value_of(&p), "&--");
        assert_eq!(p.parse_next(), TokenType::CloseTag);
        assert_eq!(p.parse_next(), TokenType::CloseDocument);
    }

    #[test]
    fn incremental_input_resumes_and_save_point_replays() {
        let mut p = P::new(b"<root><inner a".to_vec());
        assert_eq!(p.parse_next(), TokenType::OpenDocument);
        assert_eq!(p.parse_next(), TokenType::OpenTag);
        assert_eq!(p.current_tag_name(), b"root");
        assert_eq!(p.parse_next(), TokenType::OpenTag);
        assert_eq!(p.current_tag_name(), b"inner");
        assert!(p.set_save_point_at_last_tag());
        assert_eq!(p.parse_next(), TokenType::IncompleteDocument);
        assert_eq!(p.parse_next(), TokenType::IncompleteDocument);

        assert!(p.restore_to_save_point());
        p.append_data(b"tt=\"1\"/></root>");
        assert_eq!(p.parse_next(), TokenType::OpenTag);
        assert_eq!(p.current_tag_name(), b"inner");
        assert_eq!(p.parse_next(), TokenType::Attribute);
        assert_eq!(p.current_attribute_name(), b"att");
        assert_eq!(value_of(&p), "1");
        assert_eq!(p.parse_next(), TokenType::CloseTag);
        assert_eq!(p.current_tag_name(), b"inner");
        assert_eq!(p.parse_next(), TokenType::CloseTag);
        assert_eq!(p.current_tag_name(), b"root");
        assert_eq!(p.parse_next(), TokenType::CloseDocument);
    }

    #[test]
    fn incremental_without_save_point_matches_one_shot() {
        let whole = b"<root><inner att=\"1\"/></root>";
        let mut one_shot = P::new(whole.to_vec());
        let mut one_shot_events = Vec::new();
        loop {
            let t = one_shot.parse_next();
            one_shot_events.push(t);
            if t.is_terminal() {
                break;
            }
        }

        let mut chunked = P::new(b"<root><inner att=\"".to_vec());
        let mut chunked_events = Vec::new();
        loop {
            let t = chunked.parse_next();
            if t == TokenType::IncompleteDocument {
                chunked.append_data(b"1\"/></root>");
                continue;
            }
            chunked_events.push(t);
            if t.is_terminal() {
                break;
            }
        }

        assert_eq!(one_shot_events, chunked_events);
    }

    #[test]
    fn non_validating_reports_close_tag_name_verbatim() {
        let mut p = P::new(b"<a><b></b></a>".to_vec());
        assert_eq!(p.parse_next(), TokenType::OpenDocument);
        assert_eq!(p.parse_next(), TokenType::OpenTag); // a
        assert_eq!(p.parse_next(), TokenType::OpenTag); // b
        assert_eq!(p.parse_next(), TokenType::CloseTag);
        assert_eq!(p.current_tag_name(), b"b");
        assert_eq!(p.parse_next(), TokenType::CloseTag);
        assert_eq!(p.current_tag_name(), b"a");
        assert_eq!(p.parse_next(), TokenType::CloseDocument);
    }

    #[test]
    fn name_matching_reports_open_tag_name_on_mismatched_close() {
        // Deliberately mismatched close tag name: the non-validating parser
        // doesn't check tag balance, so a reimplementation choosing the
        // name-matching variant must substitute the open tag's own name.
        let mut p = PNm::new(b"<a><b></mismatched></a>".to_vec());
        assert_eq!(p.parse_next(), TokenType::OpenDocument);
        assert_eq!(p.parse_next(), TokenType::OpenTag); // a
        assert_eq!(p.parse_next(), TokenType::OpenTag); // b
        assert_eq!(p.parse_next(), TokenType::CloseTag);
        assert_eq!(p.current_tag_name(), b"b");
        assert_eq!(p.parse_next(), TokenType::CloseTag);
        assert_eq!(p.current_tag_name(), b"a");
        assert_eq!(p.parse_next(), TokenType::CloseDocument);
    }

    #[test]
    fn utf16_sources_agree_with_utf8() {
        let doc = "<root a=\"v\">hi</root>";

        let mut be_bytes = vec![0xFE, 0xFF];
        let mut le_bytes = vec![0xFF, 0xFE];
        for c in doc.encode_utf16() {
            be_bytes.extend_from_slice(&c.to_be_bytes());
            le_bytes.extend_from_slice(&c.to_le_bytes());
        }

        let mut utf8 = PullParser::<Utf8Codec>::new(doc.as_bytes().to_vec());
        let mut be = PullParser::<Utf16BeCodec>::new(be_bytes);
        let mut le = PullParser::<Utf16LeCodec>::new(le_bytes);

        loop {
            let t8 = utf8.parse_next();
            let tbe = be.parse_next();
            let tle = le.parse_next();
            assert_eq!(t8, tbe);
            assert_eq!(t8, tle);
            match t8 {
                TokenType::OpenTag | TokenType::CloseTag => {
                    assert_eq!(utf8.current_tag_name(), be.current_tag_name());
                    assert_eq!(utf8.current_tag_name(), le.current_tag_name());
                }
                TokenType::Attribute => {
                    assert_eq!(utf8.current_attribute_name(), be.current_attribute_name());
                    assert_eq!(value_of(&utf8), value_of(&be));
                    assert_eq!(value_of(&utf8), value_of(&le));
                }
                TokenType::Text => {
                    assert_eq!(value_of(&utf8), value_of(&be));
                    assert_eq!(value_of(&utf8), value_of(&le));
                }
                _ => {}
            }
            if t8.is_terminal() {
                break;
            }
        }
    }

    #[test]
    fn malformed_attribute_latches_error() {
        let mut p = P::new(b"<root att1/>".to_vec());
        assert_eq!(p.parse_next(), TokenType::OpenDocument);
        assert_eq!(p.parse_next(), TokenType::OpenTag);
        assert_eq!(p.parse_next(), TokenType::Error);
        assert_eq!(p.parse_next(), TokenType::Error);
        assert_eq!(p.last_error(), Some(ParseErrorKind::MalformedAttribute));
    }

    #[test]
    fn illegal_char_in_text_latches_error() {
        let mut p = P::new("<root>\u{0}</root>".as_bytes().to_vec());
        assert_eq!(p.parse_next(), TokenType::OpenDocument);
        assert_eq!(p.parse_next(), TokenType::OpenTag);
        assert_eq!(p.parse_next(), TokenType::Error);
    }

    #[test]
    fn depth_tracks_nesting_and_zeroes_at_close_document() {
        let mut p = P::new(b"<a><b/><c/></a>".to_vec());
        assert_eq!(p.parse_next(), TokenType::OpenDocument);
        assert_eq!(p.depth(), 0);
        assert_eq!(p.parse_next(), TokenType::OpenTag); // a
        assert_eq!(p.depth(), 1);
        assert_eq!(p.parse_next(), TokenType::OpenTag); // b
        assert_eq!(p.depth(), 2);
        assert_eq!(p.parse_next(), TokenType::CloseTag); // b
        assert_eq!(p.parse_next(), TokenType::OpenTag); // c
        assert_eq!(p.depth(), 2);
        assert_eq!(p.parse_next(), TokenType::CloseTag); // c
        assert_eq!(p.parse_next(), TokenType::CloseTag); // a
        assert_eq!(p.parse_next(), TokenType::CloseDocument);
        assert_eq!(p.depth(), 0);
    }
}
