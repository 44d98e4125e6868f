// Copyright (c) 2026 The vlc-beacon developers
//
// Permission is hereby granted, free of charge, to any person obtaining a
// copy of this software and associated documentation files (the "Software"),
// to deal in the Software without restriction, including without limitation
// the rights to use, copy, modify, merge, publish, distribute, sublicense,
// and/or sell copies of the Software, and to permit persons to whom the
// Software is furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL
// THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
// FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
// DEALINGS IN THE SOFTWARE.

//! Binary symbol sequences.
//!
//! A [`Pattern`] is the ordered, non-empty sequence of [`Symbol`]s that's emitted
//! on the output pin, one symbol per interval, repeating indefinitely. Patterns
//! are stored as a compact symbol array. The textual `0`/`1` representation is
//! only used at the edges, when parsing a [`Pattern`] with [`str::parse`] or when
//! formatting it through [`Display`].
//!
//! [`Display`]: std::fmt::Display

use std::error;
use std::fmt;
use std::result;
use std::slice;
use std::str::FromStr;

/// Errors that can occur when parsing a [`Pattern`].
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Error {
    /// The pattern doesn't contain any symbols.
    Empty,
    /// The pattern contains a character other than `0` or `1`.
    ///
    /// `position` is the zero-based character index of the first offending character.
    InvalidSymbol { position: usize, found: char },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Error::Empty => write!(f, "Pattern is empty"),
            Error::InvalidSymbol { position, found } => write!(
                f,
                "Invalid symbol {:?} at position {} (only 0 and 1 allowed)",
                found, position
            ),
        }
    }
}

impl error::Error for Error {}

/// Result type returned from methods that can have `pattern::Error`s.
pub type Result<T> = result::Result<T, Error>;

/// Binary pattern symbols.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash)]
#[repr(u8)]
pub enum Symbol {
    Zero = 0,
    One = 1,
}

impl Symbol {
    /// Returns the symbol's character representation, `'0'` or `'1'`.
    pub fn as_char(self) -> char {
        match self {
            Symbol::Zero => '0',
            Symbol::One => '1',
        }
    }
}

impl TryFrom<char> for Symbol {
    type Error = char;

    fn try_from(c: char) -> result::Result<Symbol, char> {
        match c {
            '0' => Ok(Symbol::Zero),
            '1' => Ok(Symbol::One),
            _ => Err(c),
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// An ordered, non-empty sequence of binary symbols.
///
/// A `Pattern` can only be constructed through validation, so every instance
/// holds at least one symbol.
#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub struct Pattern {
    symbols: Vec<Symbol>,
}

impl Pattern {
    /// Constructs a new `Pattern` from a slice of symbols.
    ///
    /// Returns `Err(`[`Error::Empty`]`)` if `symbols` is empty.
    pub fn new(symbols: &[Symbol]) -> Result<Pattern> {
        if symbols.is_empty() {
            return Err(Error::Empty);
        }

        Ok(Pattern {
            symbols: symbols.to_vec(),
        })
    }

    /// Returns the number of symbols in the pattern. Always at least 1.
    #[inline]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Always returns `false`. Provided for API symmetry with `len`.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Returns the symbol at `index`, or `None` if `index` is out of bounds.
    #[inline]
    pub fn symbol_at(&self, index: usize) -> Option<Symbol> {
        self.symbols.get(index).copied()
    }

    /// Counts the occurrences of `symbol`.
    ///
    /// Only used for status reporting. The timing path never calls this.
    pub fn count(&self, symbol: Symbol) -> usize {
        self.symbols.iter().filter(|&&s| s == symbol).count()
    }

    /// Returns an iterator over the pattern's symbols.
    pub fn iter(&self) -> slice::Iter<'_, Symbol> {
        self.symbols.iter()
    }
}

impl FromStr for Pattern {
    type Err = Error;

    fn from_str(s: &str) -> Result<Pattern> {
        if s.is_empty() {
            return Err(Error::Empty);
        }

        let symbols = s
            .chars()
            .enumerate()
            .map(|(position, c)| {
                Symbol::try_from(c).map_err(|found| Error::InvalidSymbol { position, found })
            })
            .collect::<Result<Vec<Symbol>>>()?;

        Ok(Pattern { symbols })
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for symbol in &self.symbols {
            write!(f, "{}", symbol)?;
        }

        Ok(())
    }
}

impl<'a> IntoIterator for &'a Pattern {
    type Item = &'a Symbol;
    type IntoIter = slice::Iter<'a, Symbol>;

    fn into_iter(self) -> Self::IntoIter {
        self.symbols.iter()
    }
}
