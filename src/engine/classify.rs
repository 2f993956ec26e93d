use std::io;

/// Classification of operation errors as transient or permanent
///
/// Transient errors are typically infrastructure failures that might
/// succeed on a later run; permanent errors are data, logic, or
/// configuration problems that will consistently fail. The in-policy
/// retry loop does not consult this classification (every attempt in the
/// budget runs regardless); it drives the wrapper-level
/// [`auto_retry_transient`], which decides whether to issue a whole new
/// execution after a final failure.
///
/// [`auto_retry_transient`]: crate::engine::auto::auto_retry_transient
pub trait TransientError {
    /// Determine whether this error is worth a fresh execution
    fn is_transient(&self) -> bool;
}

/// Check whether an HTTP status signal is worth retrying
///
/// Retries on server errors (5xx) and the client statuses that signal a
/// transient condition; status 0 means a connection error.
pub fn transient_http_status(status: u16) -> bool {
    status >= 500 || status == 429 || status == 408 || status == 0
}

impl TransientError for io::Error {
    fn is_transient(&self) -> bool {
        matches!(
            self.kind(),
            io::ErrorKind::TimedOut
                | io::ErrorKind::ConnectionReset
                | io::ErrorKind::ConnectionRefused
                | io::ErrorKind::ConnectionAborted
                | io::ErrorKind::NotConnected
                | io::ErrorKind::BrokenPipe
                | io::ErrorKind::UnexpectedEof
                | io::ErrorKind::Interrupted
                | io::ErrorKind::WouldBlock
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_http_statuses() {
        assert!(transient_http_status(500));
        assert!(transient_http_status(502));
        assert!(transient_http_status(503));
        assert!(transient_http_status(429));
        assert!(transient_http_status(408));
        assert!(transient_http_status(0));
    }

    #[test]
    fn test_permanent_http_statuses() {
        assert!(!transient_http_status(400));
        assert!(!transient_http_status(401));
        assert!(!transient_http_status(403));
        assert!(!transient_http_status(404));
        assert!(!transient_http_status(200));
    }

    #[test]
    fn test_transient_io_errors() {
        assert!(io::Error::new(io::ErrorKind::TimedOut, "timeout").is_transient());
        assert!(io::Error::new(io::ErrorKind::ConnectionReset, "reset").is_transient());
        assert!(io::Error::new(io::ErrorKind::ConnectionRefused, "refused").is_transient());
        assert!(io::Error::new(io::ErrorKind::BrokenPipe, "pipe").is_transient());
    }

    #[test]
    fn test_permanent_io_errors() {
        assert!(!io::Error::new(io::ErrorKind::NotFound, "missing").is_transient());
        assert!(!io::Error::new(io::ErrorKind::PermissionDenied, "denied").is_transient());
        assert!(!io::Error::new(io::ErrorKind::InvalidInput, "bad input").is_transient());
    }
}
