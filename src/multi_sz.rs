//! Packed multi-strings
//!
//! A multi-string is a sequence of null-terminated strings stored back to back in one buffer,
//! followed by one more null unit. This is the `REG_MULTI_SZ` format, and the format in which
//! the configuration manager and SetupAPI return lists of device IDs and interface paths:
//!
//! ```text
//! A B C \0 D E F \0 \0
//! ```
//!
//! [`MultiString`] owns such a buffer and can be extended without ever breaking the format.
//! [`MultiStringView`] borrows one that was produced elsewhere, typically by a native call.
//! Both hand out [`Cursor`]s and double-ended [`Iter`]ators that walk the buffer by scanning
//! for terminators, so each step costs time proportional to the length of one string.
//!
//! # Examples
//!
//! ```
//! use winwrap::multi_sz::MultiSz;
//!
//! let mut list = MultiSz::new();
//! list.push_str("ABC");
//! list.push_str("DEF");
//! assert_eq!(list.to_strings_lossy(), ["ABC", "DEF"]);
//!
//! let raw = list.take();
//! assert_eq!(String::from_utf16_lossy(&raw), "ABC\0DEF\0\0");
//!
//! assert!(MultiSz::try_from(raw).is_ok());
//! ```

use std::{fmt, iter, iter::FusedIterator, mem, slice};

use thiserror::Error;

/// A fixed-width character unit that can make up a multi-string.
pub trait CharUnit: Copy + Eq + fmt::Debug + 'static {
    /// The terminator unit
    const NUL: Self;
}

impl CharUnit for u8 {
    const NUL: u8 = 0;
}

impl CharUnit for u16 {
    const NUL: u16 = 0;
}

/// A wide (UTF-16) multi-string, as used by the `W` Windows APIs
pub type MultiSz = MultiString<u16>;

/// A borrowed wide (UTF-16) multi-string
pub type MultiSzView<'a> = MultiStringView<'a, u16>;

/// Error returned when a buffer is not a well-formed multi-string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("buffer of {len} units is not a valid multi-string")]
pub struct InvalidMultiSz {
    len: usize,
}

impl InvalidMultiSz {
    /// Return the length, in units, of the rejected buffer
    pub fn buffer_len(&self) -> usize {
        self.len
    }
}

/// Length of the string starting at `start`, excluding its terminator.
fn str_len<C: CharUnit>(units: &[C], start: usize) -> usize {
    let rest = &units[start..];
    rest.iter().position(|&c| c == C::NUL).unwrap_or(rest.len())
}

/// Offset just past the terminator of the string starting at `start`.
fn find_next<C: CharUnit>(units: &[C], start: usize) -> usize {
    (start + str_len(units, start) + 1).min(units.len())
}

/// Start of the string preceding the one that starts at `start`.
fn find_prev<C: CharUnit>(units: &[C], start: usize) -> usize {
    // units[start - 1] terminates the previous string
    units[..start.saturating_sub(1)]
        .iter()
        .rposition(|&c| c == C::NUL)
        .map_or(0, |i| i + 1)
}

/// Offset of the unit that terminates the list, or `units.len()` if there is none.
fn find_last<C: CharUnit>(units: &[C]) -> usize {
    let mut pos = 0;
    while pos < units.len() && units[pos] != C::NUL {
        pos = find_next(units, pos);
    }
    pos
}

/// Return whether `units` is a well-formed multi-string buffer.
///
/// A buffer is accepted if it is:
///
/// * empty, meaning no list at all;
/// * a single terminator, meaning an empty list;
/// * one or more non-empty strings, each terminated, followed by one more terminator and
///   nothing else.
///
/// ```
/// use winwrap::multi_sz::is_valid_multi_string;
///
/// assert!(is_valid_multi_string::<u8>(b""));
/// assert!(is_valid_multi_string::<u8>(b"\0"));
/// assert!(is_valid_multi_string::<u8>(b"ABC\0DEF\0\0"));
/// assert!(!is_valid_multi_string::<u8>(b"ABC"));
/// assert!(!is_valid_multi_string::<u8>(b"ABC\0\0DEF\0\0"));
/// ```
pub fn is_valid_multi_string<C: CharUnit>(units: &[C]) -> bool {
    match units {
        [] => true,
        [only] => *only == C::NUL,
        [.., second_last, last] => {
            *second_last == C::NUL && *last == C::NUL && find_last(units) == units.len() - 1
        }
    }
}

/// An offset into a [`MultiString`] at which a string starts, or at which the list ends.
///
/// Positions are obtained from a [`Cursor`] and name the insertion point for
/// [`MultiString::insert`]. Unlike a cursor, a position does not borrow the buffer. A position
/// taken before a mutation is not updated by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position(usize);

impl Position {
    /// Return the offset in units from the start of the buffer
    pub fn offset(self) -> usize {
        self.0
    }
}

/// A bidirectional cursor over the strings of a multi-string.
///
/// A cursor points either at the start of a string or at the end of the list. It never moves
/// outside the buffer it was created from: moving forward from the end, or backward from the
/// first string, leaves it in place.
///
/// Cursors compare equal when they are at the same offset. Comparing cursors from different
/// buffers is meaningless.
#[derive(Clone, Copy)]
pub struct Cursor<'a, C> {
    units: &'a [C],
    end: usize,
    pos: usize,
}

impl<'a, C: CharUnit> Cursor<'a, C> {
    /// Return the string under the cursor, without its terminator, or `None` at the end.
    pub fn current(&self) -> Option<&'a [C]> {
        if self.is_end() {
            return None;
        }
        let len = str_len(self.units, self.pos);
        Some(&self.units[self.pos..self.pos + len])
    }

    /// Return whether the cursor is past the last string
    pub fn is_end(&self) -> bool {
        self.pos >= self.end
    }

    /// Move to the next string, or to the end
    pub fn move_next(&mut self) {
        if !self.is_end() {
            self.pos = find_next(self.units, self.pos).min(self.end);
        }
    }

    /// Move to the previous string
    pub fn move_prev(&mut self) {
        if self.pos > 0 {
            self.pos = find_prev(self.units, self.pos);
        }
    }

    /// Return the position of the cursor, for use with [`MultiString::insert`]
    pub fn position(&self) -> Position {
        Position(self.pos)
    }
}

impl<C> PartialEq for Cursor<'_, C> {
    fn eq(&self, other: &Self) -> bool {
        self.pos == other.pos
    }
}

impl<C> Eq for Cursor<'_, C> {}

impl<C> fmt::Debug for Cursor<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("pos", &self.pos)
            .field("end", &self.end)
            .finish()
    }
}

/// Iterator over the strings of a multi-string, without their terminators.
///
/// Created by [`MultiString::iter`] and [`MultiStringView::iter`]. Iterating from the back
/// yields the strings in reverse order.
#[derive(Clone)]
pub struct Iter<'a, C> {
    units: &'a [C],
    front: usize,
    back: usize,
}

impl<'a, C: CharUnit> Iterator for Iter<'a, C> {
    type Item = &'a [C];

    fn next(&mut self) -> Option<&'a [C]> {
        if self.front >= self.back {
            return None;
        }
        let start = self.front;
        let len = str_len(self.units, start);
        self.front = find_next(self.units, start).min(self.back);
        Some(&self.units[start..start + len])
    }
}

impl<'a, C: CharUnit> DoubleEndedIterator for Iter<'a, C> {
    fn next_back(&mut self) -> Option<&'a [C]> {
        if self.front >= self.back {
            return None;
        }
        let start = find_prev(self.units, self.back).max(self.front);
        self.back = start;
        let len = str_len(self.units, start);
        Some(&self.units[start..start + len])
    }
}

impl<C: CharUnit> FusedIterator for Iter<'_, C> {}

/// A borrowed multi-string.
///
/// The buffer is trusted to be in the multi-string format and is not validated. The list ends
/// at the first empty string; anything after that is ignored. A view never reads outside the
/// slice it was given, even if the slice is malformed.
#[derive(Clone, Copy)]
pub struct MultiStringView<'a, C = u16> {
    units: &'a [C],
    end: usize,
}

impl<'a, C: CharUnit> MultiStringView<'a, C> {
    /// Create a view over `units`
    pub fn new(units: &'a [C]) -> Self {
        MultiStringView {
            units,
            end: find_last(units),
        }
    }

    /// Create a view over a multi-string returned by a native call.
    ///
    /// # Safety
    ///
    /// `ptr` must point to a multi-string that ends with an empty string (two consecutive
    /// terminators, or a single terminator for an empty list). The memory must be initialized,
    /// aligned, and must stay valid and unmodified for `'a`.
    pub unsafe fn from_ptr(ptr: *const C) -> Self {
        let mut end = 0;
        // SAFETY: Every offset read lies before the final terminator, which the caller
        // guarantees exists
        unsafe {
            while ptr.add(end).read() != C::NUL {
                while ptr.add(end).read() != C::NUL {
                    end += 1;
                }
                end += 1;
            }
        }
        // SAFETY: `end` is the offset of the final terminator, so `end + 1` units are valid
        let units = unsafe { slice::from_raw_parts(ptr, end + 1) };
        MultiStringView { units, end }
    }

    /// Return a cursor at the first string
    pub fn begin(&self) -> Cursor<'a, C> {
        self.cursor(0)
    }

    /// Return a cursor at the end of the list
    pub fn end(&self) -> Cursor<'a, C> {
        self.cursor(self.end)
    }

    fn cursor(&self, pos: usize) -> Cursor<'a, C> {
        Cursor {
            units: self.units,
            end: self.end,
            pos,
        }
    }

    /// Return an iterator over the strings
    pub fn iter(&self) -> Iter<'a, C> {
        Iter {
            units: self.units,
            front: 0,
            back: self.end,
        }
    }

    /// Return whether the list contains no strings
    pub fn is_empty(&self) -> bool {
        self.end == 0
    }

    /// Return the number of strings in the list. This walks the whole list.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Return the units making up the list, including the final terminator if present
    pub fn as_slice(&self) -> &'a [C] {
        &self.units[..(self.end + 1).min(self.units.len())]
    }

    /// Copy the list into an owned [`MultiString`].
    ///
    /// Any content following the list in the underlying slice is not copied.
    pub fn to_multi_string(&self) -> MultiString<C> {
        if self.end < self.units.len() {
            MultiString {
                buffer: self.units[..=self.end].to_vec(),
            }
        } else {
            // No final terminator in the slice; rebuild the list
            self.iter().collect()
        }
    }
}

impl<'a, C: CharUnit> IntoIterator for MultiStringView<'a, C> {
    type Item = &'a [C];
    type IntoIter = Iter<'a, C>;

    fn into_iter(self) -> Iter<'a, C> {
        self.iter()
    }
}

impl<C: CharUnit> fmt::Debug for MultiStringView<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// An owned multi-string buffer.
///
/// The buffer is always well-formed (see [`is_valid_multi_string`]). It starts out *absent*
/// (no units at all), which native calls treat as "no list". The first insertion turns it into
/// an explicit list. Buffers from outside the crate are validated once, by `TryFrom`.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct MultiString<C = u16> {
    buffer: Vec<C>,
}

impl<C: CharUnit> MultiString<C> {
    /// Create an absent multi-string
    pub fn new() -> Self {
        MultiString { buffer: Vec::new() }
    }

    /// Return whether the buffer has no units at all.
    ///
    /// An absent buffer and one holding only the final terminator both contain no strings, but
    /// only the latter is an explicit empty list.
    pub fn is_absent(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Return whether the list contains no strings
    pub fn is_empty(&self) -> bool {
        self.buffer.len() <= 1
    }

    /// Return the number of strings in the list. This walks the whole list.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Return the size of the buffer in units, including terminators
    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }

    /// Return the raw buffer
    pub fn as_slice(&self) -> &[C] {
        &self.buffer
    }

    /// Borrow the list as a [`MultiStringView`]
    pub fn as_view(&self) -> MultiStringView<'_, C> {
        MultiStringView {
            units: &self.buffer,
            end: self.end_offset(),
        }
    }

    /// Return a cursor at the first string
    pub fn begin(&self) -> Cursor<'_, C> {
        self.as_view().begin()
    }

    /// Return a cursor at the end of the list
    pub fn end(&self) -> Cursor<'_, C> {
        self.as_view().end()
    }

    /// Return a cursor at `at`.
    ///
    /// # Panics
    ///
    /// Panics if `at` is not the start of a string or the end of this list.
    #[track_caller]
    pub fn cursor_at(&self, at: Position) -> Cursor<'_, C> {
        self.check_position(at);
        self.as_view().cursor(at.0)
    }

    /// Return an iterator over the strings
    pub fn iter(&self) -> Iter<'_, C> {
        self.as_view().iter()
    }

    /// Insert `s` before the string at `at`, returning the position of the inserted string.
    ///
    /// `s` is read up to its first terminator, if it contains one. An empty list cannot hold an
    /// empty string, so inserting one leaves the list unchanged.
    ///
    /// If the buffer is absent, it first becomes an empty list and `s` is inserted at its
    /// beginning, whatever `at` is.
    ///
    /// # Panics
    ///
    /// Panics if `at` is not the start of a string or the end of this list.
    #[track_caller]
    pub fn insert(&mut self, at: Position, s: impl AsRef<[C]>) -> Position {
        let at = self.materialize_at(at);
        self.splice_str(at.0, s.as_ref());
        at
    }

    /// Insert each of `strings`, in order, before the string at `at`.
    ///
    /// Returns the position of the first inserted string. Each string is handled as by
    /// [`MultiString::insert`].
    ///
    /// # Panics
    ///
    /// Panics if `at` is not the start of a string or the end of this list.
    #[track_caller]
    pub fn insert_many<I>(&mut self, at: Position, strings: I) -> Position
    where
        I: IntoIterator,
        I::Item: AsRef<[C]>,
    {
        let first = self.materialize_at(at);
        let mut next = first.0;
        for s in strings {
            next += self.splice_str(next, s.as_ref());
        }
        first
    }

    /// Append `s` to the end of the list. See [`MultiString::insert`].
    pub fn push_back(&mut self, s: impl AsRef<[C]>) {
        let end = self.end().position();
        self.insert(end, s);
    }

    /// Take the buffer, leaving this multi-string absent.
    ///
    /// The returned buffer is in the exact layout native calls expect.
    pub fn take(&mut self) -> Vec<C> {
        mem::take(&mut self.buffer)
    }

    /// Return the buffer
    pub fn into_vec(self) -> Vec<C> {
        self.buffer
    }

    fn end_offset(&self) -> usize {
        self.buffer.len().saturating_sub(1)
    }

    #[track_caller]
    fn check_position(&self, at: Position) {
        let pos = at.0;
        assert!(
            pos <= self.end_offset() && (pos == 0 || self.buffer[pos - 1] == C::NUL),
            "{at:?} is not a string boundary in a buffer of {} units",
            self.buffer.len()
        );
    }

    /// Turn an absent buffer into an empty list, and validate `at` against the result.
    #[track_caller]
    fn materialize_at(&mut self, at: Position) -> Position {
        if self.buffer.is_empty() {
            self.buffer.push(C::NUL);
            return self.begin().position();
        }
        self.check_position(at);
        at
    }

    /// Splice `s` and a terminator in at `at`. Returns the number of units inserted.
    fn splice_str(&mut self, at: usize, s: &[C]) -> usize {
        let s = match s.iter().position(|&c| c == C::NUL) {
            Some(len) => &s[..len],
            None => s,
        };
        if s.is_empty() {
            return 0;
        }
        self.buffer
            .splice(at..at, s.iter().copied().chain(iter::once(C::NUL)));
        s.len() + 1
    }
}

impl<C: CharUnit> Default for MultiString<C> {
    fn default() -> Self {
        MultiString::new()
    }
}

impl<C: CharUnit> fmt::Debug for MultiString<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.as_view(), f)
    }
}

impl<C: CharUnit> TryFrom<Vec<C>> for MultiString<C> {
    type Error = InvalidMultiSz;

    fn try_from(buffer: Vec<C>) -> Result<Self, InvalidMultiSz> {
        if !is_valid_multi_string(&buffer) {
            return Err(InvalidMultiSz { len: buffer.len() });
        }
        Ok(MultiString { buffer })
    }
}

impl<C: CharUnit> TryFrom<&[C]> for MultiString<C> {
    type Error = InvalidMultiSz;

    fn try_from(units: &[C]) -> Result<Self, InvalidMultiSz> {
        MultiString::try_from(units.to_vec())
    }
}

impl<C> From<MultiString<C>> for Vec<C> {
    fn from(multi_string: MultiString<C>) -> Vec<C> {
        multi_string.buffer
    }
}

impl<C> AsRef<[C]> for MultiString<C> {
    fn as_ref(&self) -> &[C] {
        &self.buffer
    }
}

impl<C: CharUnit, S: AsRef<[C]>> Extend<S> for MultiString<C> {
    fn extend<I: IntoIterator<Item = S>>(&mut self, strings: I) {
        for s in strings {
            self.push_back(s);
        }
    }
}

impl<C: CharUnit, S: AsRef<[C]>> FromIterator<S> for MultiString<C> {
    fn from_iter<I: IntoIterator<Item = S>>(strings: I) -> Self {
        let mut multi_string = MultiString::new();
        multi_string.extend(strings);
        multi_string
    }
}

impl<'a, C: CharUnit> IntoIterator for &'a MultiString<C> {
    type Item = &'a [C];
    type IntoIter = Iter<'a, C>;

    fn into_iter(self) -> Iter<'a, C> {
        self.iter()
    }
}

impl MultiString<u16> {
    /// Create a list from UTF-8 strings
    pub fn from_strs<I>(strings: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut multi_sz = MultiString::new();
        for s in strings {
            multi_sz.push_str(s.as_ref());
        }
        multi_sz
    }

    /// Append a UTF-8 string, converted to UTF-16
    pub fn push_str(&mut self, s: &str) {
        let wide: Vec<u16> = s.encode_utf16().collect();
        self.push_back(wide);
    }

    /// Convert each string to a `String`, replacing invalid UTF-16 with U+FFFD
    pub fn to_strings_lossy(&self) -> Vec<String> {
        self.as_view().to_strings_lossy()
    }
}

impl MultiStringView<'_, u16> {
    /// Convert each string to a `String`, replacing invalid UTF-16 with U+FFFD
    pub fn to_strings_lossy(&self) -> Vec<String> {
        self.iter().map(String::from_utf16_lossy).collect()
    }

    /// Convert each string to an `OsString`
    #[cfg(windows)]
    pub fn to_os_strings(&self) -> Vec<std::ffi::OsString> {
        use std::os::windows::ffi::OsStringExt;

        self.iter().map(std::ffi::OsString::from_wide).collect()
    }
}
