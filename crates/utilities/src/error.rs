use core::error::Error;
use core::fmt::Debug;
use core::fmt::Display;
use std::backtrace::Backtrace;
use std::backtrace::BacktraceStatus;

/// A result whose error is the catch-all [TermaError].
pub type TermaResult<T> = Result<T, TermaError>;

/// Catch-all error for code that combines the errors of several term crates,
/// such as tests and benchmarks. Any [`Error`] converts into it, and a backtrace
/// is captured at the point of conversion.
pub struct TermaError {
    inner: Box<InnerTermaError>,
}

/// Kept behind a single box so that `Result<T, TermaError>` stays pointer sized.
struct InnerTermaError {
    error: Box<dyn Error + Send + Sync + 'static>,
    backtrace: Backtrace,
}

impl TermaError {
    /// Returns the underlying error if it has type `E`.
    pub fn downcast_ref<E: Error + 'static>(&self) -> Option<&E> {
        self.inner.error.downcast_ref::<E>()
    }

    /// Returns true iff the underlying error has type `E`.
    pub fn is<E: Error + 'static>(&self) -> bool {
        self.inner.error.is::<E>()
    }

    /// The backtrace captured when this error was created.
    pub fn backtrace(&self) -> &Backtrace {
        &self.inner.backtrace
    }
}

// Also gives From<&str> and From<String>.
impl<E> From<E> for TermaError
where
    Box<dyn Error + Send + Sync + 'static>: From<E>,
{
    #[cold]
    fn from(error: E) -> Self {
        TermaError {
            inner: Box::new(InnerTermaError {
                error: error.into(),
                backtrace: Backtrace::capture(),
            }),
        }
    }
}

impl Display for TermaError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.inner.error)
    }
}

impl Debug for TermaError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        writeln!(f, "{:?}", self.inner.error)?;
        if let BacktraceStatus::Captured = self.inner.backtrace.status() {
            writeln!(f, "{}", self.inner.backtrace)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fmt;

    use super::*;

    #[derive(Debug)]
    struct ShapeError(usize);

    impl fmt::Display for ShapeError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "bad shape {}", self.0)
        }
    }

    impl Error for ShapeError {}

    fn fails() -> TermaResult<()> {
        Err(ShapeError(3))?
    }

    #[test]
    fn test_downcast() {
        let error = fails().unwrap_err();
        assert!(error.is::<ShapeError>());
        assert_eq!(error.downcast_ref::<ShapeError>().map(|e| e.0), Some(3));
        assert_eq!(error.to_string(), "bad shape 3");
    }

    #[test]
    fn test_from_str() {
        let error = TermaError::from("something went wrong");
        assert_eq!(error.to_string(), "something went wrong");
        assert!(!error.is::<ShapeError>());
    }
}
