#![feature(error_generic_member_access)]
#![deny(missing_docs)]

//! Error and result types shared by every Quiver crate, plus the macros used to build them.
//!
//! Every domain variant carries a message and the backtrace captured where the error was
//! created. Set `QUIVER_PANIC_ON_ERR=1` to panic at the point an error is constructed instead,
//! which is handy when chasing a decode failure through a debugger.

use std::backtrace::Backtrace;
use std::borrow::Cow;
use std::fmt::{Debug, Display, Formatter};
use std::ops::Deref;
use std::{env, fmt, io};

/// A string that can be used as an error message.
#[derive(Debug)]
pub struct ErrString(Cow<'static, str>);

#[allow(clippy::fallible_impl_from)]
impl<T> From<T> for ErrString
where
    T: Into<Cow<'static, str>>,
{
    #[allow(clippy::panic)]
    fn from(msg: T) -> Self {
        if env::var("QUIVER_PANIC_ON_ERR").as_deref().unwrap_or("") == "1" {
            panic!("{}\nBacktrace:\n{}", msg.into(), Backtrace::capture());
        } else {
            Self(msg.into())
        }
    }
}

impl AsRef<str> for ErrString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for ErrString {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for ErrString {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// The top-level error type for Quiver.
#[derive(thiserror::Error)]
#[non_exhaustive]
pub enum QuiverError {
    /// A message envelope is malformed: bad continuation marker, length overflow, misaligned
    /// padding, or a buffer that points outside its message body.
    #[error("Framing error: {0}\nBacktrace:\n{1}")]
    Framing(ErrString, Backtrace),
    /// The field nodes or buffers of a batch do not match the shape the schema implies.
    #[error("Schema mismatch: {0}\nBacktrace:\n{1}")]
    SchemaMismatch(ErrString, Backtrace),
    /// A dictionary id could not be resolved against the schema or the loaded dictionaries.
    #[error("Dictionary resolution failed: {0}\nBacktrace:\n{1}")]
    DictionaryResolution(ErrString, Backtrace),
    /// The input ended in the middle of a message.
    #[error("Truncated stream: {0}\nBacktrace:\n{1}")]
    TruncatedStream(ErrString, Backtrace),
    /// A reader or writer was driven out of its state order.
    #[error("Sequence error: {0}\nBacktrace:\n{1}")]
    Sequence(ErrString, Backtrace),
    /// An index is out of bounds.
    #[error("index {0} out of bounds from {1} to {2}\nBacktrace:\n{3}")]
    OutOfBounds(usize, usize, usize, Backtrace),
    /// An invalid argument was provided.
    #[error("{0}\nBacktrace:\n{1}")]
    InvalidArgument(ErrString, Backtrace),
    /// Metadata that parsed as a flatbuffer but describes something invalid.
    #[error("{0}\nBacktrace:\n{1}")]
    InvalidSerde(ErrString, Backtrace),
    /// A wire feature this implementation does not handle.
    #[error("{0}\nBacktrace:\n{1}")]
    NotImplemented(ErrString, Backtrace),
    /// An assertion failed.
    #[error("{0}\nBacktrace:\n{1}")]
    AssertionFailed(ErrString, Backtrace),
    /// A wrapper for other errors, carrying additional context.
    #[error("{0}: {1}")]
    Context(ErrString, #[source] Box<QuiverError>),
    /// A wrapper for errors from the standard library's IO module.
    #[error("{0}\nBacktrace:\n{1}")]
    IOError(#[from] io::Error, Backtrace),
    /// A wrapper for errors from the FlatBuffers verifier.
    #[cfg(feature = "flatbuffers")]
    #[error("{0}\nBacktrace:\n{1}")]
    FlatBuffersError(#[from] flatbuffers::InvalidFlatbuffer, Backtrace),
}

impl QuiverError {
    /// Adds additional context to an error.
    pub fn with_context<T: Into<ErrString>>(self, msg: T) -> Self {
        QuiverError::Context(msg.into(), Box::new(self))
    }

    /// Strips any [`QuiverError::Context`] layers and returns the innermost error.
    pub fn root_cause(&self) -> &QuiverError {
        match self {
            QuiverError::Context(_, inner) => inner.root_cause(),
            other => other,
        }
    }
}

impl Debug for QuiverError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

/// A type alias for Results that return [`QuiverError`]s as their error type.
pub type QuiverResult<T> = Result<T, QuiverError>;

/// Construct a [`QuiverError`], optionally naming the variant.
///
/// ```
/// use quiver_error::{QuiverError, quiver_err};
///
/// let err = quiver_err!(Framing: "expected continuation marker, found {:#x}", 7u32);
/// assert!(matches!(err, QuiverError::Framing(..)));
///
/// let err = quiver_err!("missing field {}", "a");
/// assert!(matches!(err, QuiverError::InvalidArgument(..)));
/// ```
#[macro_export]
macro_rules! quiver_err {
    (OutOfBounds: $idx:expr, $start:expr, $stop:expr) => {{
        use std::backtrace::Backtrace;
        $crate::__private::must_use(
            $crate::QuiverError::OutOfBounds($idx, $start, $stop, Backtrace::capture())
        )
    }};
    (Context: $msg:literal, $err:expr) => {{
        $crate::__private::must_use(
            $crate::QuiverError::Context($msg.into(), Box::new($err))
        )
    }};
    ($variant:ident: $fmt:literal $(, $arg:expr)* $(,)?) => {{
        use std::backtrace::Backtrace;
        $crate::__private::must_use(
            $crate::QuiverError::$variant(format!($fmt, $($arg),*).into(), Backtrace::capture())
        )
    }};
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::quiver_err!(InvalidArgument: $fmt, $($arg),*)
    };
}

/// Return early with a [`QuiverError`] built by [`quiver_err!`].
#[macro_export]
macro_rules! quiver_bail {
    ($($tt:tt)+) => {
        return Err($crate::quiver_err!($($tt)+))
    };
}

/// Panic with a [`QuiverError`], either given directly or built from a format string.
#[macro_export]
macro_rules! quiver_panic {
    (OutOfBounds: $idx:expr, $start:expr, $stop:expr) => {{
        $crate::quiver_panic!($crate::quiver_err!(OutOfBounds: $idx, $start, $stop))
    }};
    ($variant:ident: $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::quiver_panic!($crate::quiver_err!($variant: $fmt, $($arg),*))
    };
    ($err:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {{
        let err: $crate::QuiverError = $err;
        panic!("{}", err.with_context(format!($fmt, $($arg),*)))
    }};
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::quiver_panic!($crate::quiver_err!($fmt, $($arg),*))
    };
    ($err:expr) => {{
        let err: $crate::QuiverError = $err;
        panic!("{}", err)
    }};
}

#[doc(hidden)]
pub mod __private {
    #[doc(hidden)]
    #[inline]
    #[cold]
    #[must_use]
    pub const fn must_use(error: crate::QuiverError) -> crate::QuiverError {
        error
    }
}

/// A trait for unwrapping a result, panicking with the error's message.
pub trait QuiverUnwrap {
    /// The type of the value being unwrapped.
    type Output;

    /// Returns the value of the result if it is Ok, otherwise panics with the error.
    /// Should be called only in contexts where the error condition represents a bug.
    fn quiver_unwrap(self) -> Self::Output;
}

impl<T, E> QuiverUnwrap for Result<T, E>
where
    E: Into<QuiverError>,
{
    type Output = T;

    #[inline(always)]
    fn quiver_unwrap(self) -> Self::Output {
        self.map_err(|err| err.into())
            .unwrap_or_else(|err| quiver_panic!(err))
    }
}

/// A trait for expect-ing a result or an option, panicking with a contextualised message.
pub trait QuiverExpect {
    /// The type of the value being expected.
    type Output;

    /// Returns the value if present, otherwise panics with `msg` attached to the error.
    /// Should be called only in contexts where the error condition represents a bug.
    fn quiver_expect(self, msg: &str) -> Self::Output;
}

impl<T, E> QuiverExpect for Result<T, E>
where
    E: Into<QuiverError>,
{
    type Output = T;

    #[inline(always)]
    fn quiver_expect(self, msg: &str) -> Self::Output {
        self.map_err(|err| err.into())
            .unwrap_or_else(|e| quiver_panic!(e.with_context(msg.to_string())))
    }
}

impl<T> QuiverExpect for Option<T> {
    type Output = T;

    #[inline(always)]
    fn quiver_expect(self, msg: &str) -> Self::Output {
        self.unwrap_or_else(|| {
            let err = QuiverError::AssertionFailed(msg.to_string().into(), Backtrace::capture());
            quiver_panic!(err)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    fn bails(n: usize) -> QuiverResult<usize> {
        if n > 3 {
            quiver_bail!(Sequence: "call {n} arrived after the writer ended");
        }
        Ok(n)
    }

    #[test]
    fn bail_returns_named_variant() {
        assert_eq!(bails(2).unwrap(), 2);
        let err = bails(7).unwrap_err();
        assert!(matches!(err, QuiverError::Sequence(..)));
        assert!(err.to_string().contains("call 7 arrived"));
    }

    #[test]
    fn context_wraps_and_unwraps() {
        let err = quiver_err!(TruncatedStream: "read {} of {} bytes", 3, 8)
            .with_context("reading record batch");
        assert!(err.to_string().starts_with("reading record batch: Truncated stream"));
        assert!(matches!(err.root_cause(), QuiverError::TruncatedStream(..)));
    }

    #[test]
    fn io_errors_convert() {
        let err: QuiverError = io::Error::new(io::ErrorKind::UnexpectedEof, "eof").into();
        assert!(matches!(err, QuiverError::IOError(..)));
    }

    #[test]
    fn out_of_bounds_message() {
        let err = quiver_err!(OutOfBounds: 10, 0, 4);
        assert!(err.to_string().starts_with("index 10 out of bounds from 0 to 4"));
    }

    #[test]
    #[should_panic(expected = "missing dictionary")]
    fn expect_on_none_panics() {
        let missing: Option<u8> = None;
        missing.quiver_expect("missing dictionary");
    }
}
