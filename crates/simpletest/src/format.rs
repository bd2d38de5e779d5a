//! Value formatting for failure messages.
//!
//! Every operand that ends up in a failure message is rendered through
//! [`FormatValue`]. Rendering never allocates: dynamic representations are
//! written into the fixed [`STRING_LENGTH`] scratch buffer of a
//! [`TempString`], and values that already are text are borrowed as-is.
//!
//! # Example
//!
//! ```rust
//! use simpletest::FormatValue;
//!
//! assert_eq!((-42i32).format_value().as_str(), "-42");
//! assert_eq!(0.1f64.format_value().as_str(), "0.1");
//! assert_eq!(None::<&str>.format_value().as_str(), "(nullptr)");
//! ```

use std::fmt::{self, Write};

/// Size of the scratch buffer used for dynamic representations.
pub const STRING_LENGTH: usize = 64;

/// Token used for null text and null pointers.
pub const NULL_TEXT: &str = "(nullptr)";

/// Token used for values of unrecognised kind.
pub const UNKNOWN_TEXT: &str = "(unknown type)";

/// A remainder this close to a whole number ends digit generation.
const FLOAT_EPSILON: f64 = 1e-5;

const MAX_FRACTION_DIGITS: usize = 17;

/// Magnitudes at or above this switch to scientific notation.
const SCIENTIFIC_THRESHOLD: f64 = 1e15;

/// Largest index `<= max` that lies on a char boundary of `s`.
pub(crate) fn floor_char_boundary(s: &str, max: usize) -> usize {
    if max >= s.len() {
        return s.len();
    }
    let mut index = max;
    while !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Short text produced for one operand.
///
/// Either borrows existing text or owns a fixed-size inline buffer. Writes
/// past [`STRING_LENGTH`] bytes are truncated on a character boundary.
#[derive(Clone)]
pub struct TempString<'a> {
    borrowed: Option<&'a str>,
    buffer: [u8; STRING_LENGTH],
    len: usize,
    truncated: bool,
}

impl<'a> TempString<'a> {
    /// An empty scratch buffer.
    pub fn new() -> Self {
        Self {
            borrowed: None,
            buffer: [0; STRING_LENGTH],
            len: 0,
            truncated: false,
        }
    }

    /// Points directly at `text` without copying.
    pub fn borrowed(text: &'a str) -> Self {
        Self {
            borrowed: Some(text),
            ..Self::new()
        }
    }

    /// The rendered text.
    pub fn as_str(&self) -> &str {
        match self.borrowed {
            Some(text) => text,
            // Only whole characters are ever copied into the buffer.
            None => std::str::from_utf8(&self.buffer[..self.len]).unwrap_or(UNKNOWN_TEXT),
        }
    }

    /// Length of the rendered text in bytes.
    pub fn len(&self) -> usize {
        self.as_str().len()
    }

    /// Returns true if nothing has been rendered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if a write did not fit into the scratch buffer.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Appends as much of `text` as fits. Returns false on truncation.
    pub fn push_str(&mut self, text: &str) -> bool {
        if let Some(existing) = self.borrowed.take() {
            self.push_owned(existing);
        }
        self.push_owned(text)
    }

    fn push_owned(&mut self, text: &str) -> bool {
        let take = floor_char_boundary(text, STRING_LENGTH - self.len);
        self.buffer[self.len..self.len + take].copy_from_slice(&text.as_bytes()[..take]);
        self.len += take;
        if take < text.len() {
            self.truncated = true;
            return false;
        }
        true
    }
}

impl Default for TempString<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl Write for TempString<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        // Truncation is not an error for failure text.
        self.push_str(s);
        Ok(())
    }
}

impl fmt::Display for TempString<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for TempString<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TempString").field(&self.as_str()).finish()
    }
}

impl PartialEq<&str> for TempString<'_> {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

/// Renders a value as a short token for failure messages.
pub trait FormatValue {
    /// Produces the text representation of `self`.
    fn format_value(&self) -> TempString<'_>;
}

macro_rules! impl_format_integer {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FormatValue for $ty {
                fn format_value(&self) -> TempString<'_> {
                    let mut out = TempString::new();
                    let _ = write!(out, "{self}");
                    out
                }
            }
        )*
    };
}

impl_format_integer!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

impl FormatValue for f64 {
    fn format_value(&self) -> TempString<'_> {
        let mut out = TempString::new();
        format_float(*self, &mut out);
        out
    }
}

impl FormatValue for f32 {
    fn format_value(&self) -> TempString<'_> {
        // Widen through the shortest f32 text so 0.1f32 stays 0.1.
        let mut shortest = TempString::new();
        let _ = write!(shortest, "{self}");
        let widened = shortest
            .as_str()
            .parse::<f64>()
            .unwrap_or_else(|_| f64::from(*self));
        let mut out = TempString::new();
        format_float(widened, &mut out);
        out
    }
}

impl FormatValue for bool {
    fn format_value(&self) -> TempString<'_> {
        TempString::borrowed(if *self { "true" } else { "false" })
    }
}

impl FormatValue for char {
    fn format_value(&self) -> TempString<'_> {
        let mut out = TempString::new();
        out.push_str(self.encode_utf8(&mut [0; 4]));
        out
    }
}

impl FormatValue for str {
    fn format_value(&self) -> TempString<'_> {
        TempString::borrowed(self)
    }
}

impl FormatValue for String {
    fn format_value(&self) -> TempString<'_> {
        TempString::borrowed(self.as_str())
    }
}

impl<T: FormatValue> FormatValue for Option<T> {
    fn format_value(&self) -> TempString<'_> {
        match self {
            Some(value) => value.format_value(),
            None => TempString::borrowed(NULL_TEXT),
        }
    }
}

impl<T: FormatValue + ?Sized> FormatValue for &T {
    fn format_value(&self) -> TempString<'_> {
        (**self).format_value()
    }
}

impl<T: FormatValue + ?Sized> FormatValue for &mut T {
    fn format_value(&self) -> TempString<'_> {
        (**self).format_value()
    }
}

impl<T: FormatValue + ?Sized> FormatValue for Box<T> {
    fn format_value(&self) -> TempString<'_> {
        (**self).format_value()
    }
}

impl<T: ?Sized> FormatValue for *const T {
    fn format_value(&self) -> TempString<'_> {
        if self.is_null() {
            return TempString::borrowed(NULL_TEXT);
        }
        let mut out = TempString::new();
        let _ = write!(out, "{:p}", *self);
        out
    }
}

impl<T: ?Sized> FormatValue for *mut T {
    fn format_value(&self) -> TempString<'_> {
        if self.is_null() {
            return TempString::borrowed(NULL_TEXT);
        }
        let mut out = TempString::new();
        let _ = write!(out, "{:p}", *self);
        out
    }
}

/// Wraps a value whose kind has no text representation.
///
/// Formats as `"(unknown type)"` whatever it holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Unformattable<T>(pub T);

impl<T> FormatValue for Unformattable<T> {
    fn format_value(&self) -> TempString<'_> {
        TempString::borrowed(UNKNOWN_TEXT)
    }
}

/// Writes the shortest faithful decimal form of `value`.
///
/// The integer part is exact. Fractional digits are generated one at a
/// time and generation stops at the first significant digit whose
/// remainder is within 1e-5 of zero, or as soon as the remainder is within
/// 1e-5 of one (in which case the last digit is rounded up). This hides
/// binary representation noise, so `0.1 + 0.2` renders as `0.3`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_float(value: f64, out: &mut TempString<'_>) {
    if value.is_nan() {
        out.push_str("nan");
        return;
    }
    if value.is_infinite() {
        out.push_str(if value > 0.0 { "inf" } else { "-inf" });
        return;
    }

    let magnitude = value.abs();
    if magnitude >= SCIENTIFIC_THRESHOLD {
        let _ = write!(out, "{value:e}");
        return;
    }

    let mut integer = magnitude.trunc() as u64;
    let mut remainder = magnitude.fract();
    let mut digits = [0u8; MAX_FRACTION_DIGITS];
    let mut count = 0;
    let mut significant = integer != 0;

    while count < MAX_FRACTION_DIGITS {
        if remainder == 0.0 || (significant && remainder < FLOAT_EPSILON) {
            break;
        }
        remainder *= 10.0;
        let whole = remainder.trunc();
        remainder -= whole;
        let mut digit = whole as u8;
        let round_up = remainder > 1.0 - FLOAT_EPSILON;
        if round_up {
            digit += 1;
        }
        digits[count] = digit;
        count += 1;
        significant |= digit != 0;
        if round_up {
            break;
        }
    }

    propagate_carry(&mut digits[..count], &mut integer);
    while count > 0 && digits[count - 1] == 0 {
        count -= 1;
    }

    if value < 0.0 && (integer != 0 || count != 0) {
        out.push_str("-");
    }
    let _ = write!(out, "{integer}");
    if count > 0 {
        out.push_str(".");
        for &digit in &digits[..count] {
            out.push_str(char::from(b'0' + digit).encode_utf8(&mut [0; 4]));
        }
    }
}

fn propagate_carry(digits: &mut [u8], integer: &mut u64) {
    for index in (0..digits.len()).rev() {
        if digits[index] < 10 {
            return;
        }
        digits[index] = 0;
        if index == 0 {
            *integer += 1;
        } else {
            digits[index - 1] += 1;
        }
    }
}
