//! Configuration surface for constructing a [`PullParser`], modeled on the
//! teacher's `ParserBuilder<P>`/`ReaderBuilder<P>` pair: a builder generic
//! over the same marker-type parameter the parser itself is generic over, so
//! switching variants is a method call (`with_name_matching()`) rather than
//! a runtime flag.

use std::marker::PhantomData;

use crate::codec::Codec;
use crate::parser::{NameMatching, NonValidating, PullParser, Variant};

/// Builds a [`PullParser`] with non-default capacity hints or a non-default
/// variant selection.
///
/// ```
/// use pullxml::{ParserBuilder, codec::Utf8Codec};
///
/// let mut parser = ParserBuilder::<Utf8Codec>::new()
///     .with_name_matching()
///     .name_scratch_capacity(64)
///     .build(b"<root/>".to_vec());
/// ```
#[derive(Debug, Clone)]
pub struct ParserBuilder<C: Codec, V: Variant = NonValidating> {
    name_scratch_capacity: usize,
    _codec: PhantomData<C>,
    _variant: PhantomData<V>,
}

impl<C: Codec> ParserBuilder<C, NonValidating> {
    /// A builder defaulting to the non-validating variant (close tags report
    /// whatever name follows `</`, with no tag-balance bookkeeping).
    pub fn new() -> Self {
        ParserBuilder {
            name_scratch_capacity: 0,
            _codec: PhantomData,
            _variant: PhantomData,
        }
    }
}

impl<C: Codec> Default for ParserBuilder<C, NonValidating> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Codec, V: Variant> ParserBuilder<C, V> {
    /// Reserves `capacity` bytes in the name scratch area up front. Only
    /// useful for non-UTF-8 sources, where names are copied into scratch
    /// rather than borrowed from the input buffer (see
    /// [`Codec::borrows_names`](crate::codec::Codec::borrows_names)).
    pub fn name_scratch_capacity(mut self, capacity: usize) -> Self {
        self.name_scratch_capacity = capacity;
        self
    }

    /// Switches to the name-matching variant: close tags report the name of
    /// their matching open tag, tracked on an internal stack, rather than
    /// whatever name literally follows `</`.
    pub fn with_name_matching(self) -> ParserBuilder<C, NameMatching> {
        ParserBuilder {
            name_scratch_capacity: self.name_scratch_capacity,
            _codec: PhantomData,
            _variant: PhantomData,
        }
    }

    /// Switches to the non-validating variant: close tags report whatever
    /// name literally follows `</`.
    pub fn without_name_matching(self) -> ParserBuilder<C, NonValidating> {
        ParserBuilder {
            name_scratch_capacity: self.name_scratch_capacity,
            _codec: PhantomData,
            _variant: PhantomData,
        }
    }

    /// Consumes the builder, producing a parser over `initial_bytes`.
    pub fn build(self, initial_bytes: Vec<u8>) -> PullParser<C, V> {
        PullParser::with_capacity(initial_bytes, self.name_scratch_capacity)
    }
}
