use thiserror::Error;

/// Coarse error category, used by callers that map failures to responses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Argument had the wrong shape (non-string duration, non-array catalog, bad timestamp)
    InvalidInput,
    /// Duration token did not match the `<n>h<n>m<n>s` grammar
    MalformedDuration,
    /// No catalog items to loop over
    EmptyCatalog,
    /// Every catalog item has zero duration
    ZeroDurationCatalog,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl ErrorKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "Invalid Input",
            ErrorKind::MalformedDuration => "Malformed Duration",
            ErrorKind::EmptyCatalog => "Empty Catalog",
            ErrorKind::ZeroDurationCatalog => "Zero Duration Catalog",
        }
    }

    /// Get actionable suggestion for the caller
    pub fn suggestion(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => {
                "Check the upstream record shape: durations must be strings, catalogs arrays, timestamps RFC 3339."
            }
            ErrorKind::MalformedDuration => {
                "Durations look like 1h2m3s, 90m or 45s. Inspect the offending video record."
            }
            ErrorKind::EmptyCatalog => {
                "The category returned no videos. Try a wider period or another category."
            }
            ErrorKind::ZeroDurationCatalog => {
                "All videos report a zero length. The upstream listing is probably still processing."
            }
        }
    }
}

/// Errors raised by the guide engine. Every variant aborts the whole operation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GuideError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Malformed duration: {0:?}")]
    MalformedDuration(String),

    #[error("Catalog is empty, nothing to schedule")]
    EmptyCatalog,

    #[error("Every catalog item has zero duration, the day can never be filled")]
    ZeroDurationCatalog,
}

impl GuideError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GuideError::InvalidInput(_) => ErrorKind::InvalidInput,
            GuideError::MalformedDuration(_) => ErrorKind::MalformedDuration,
            GuideError::EmptyCatalog => ErrorKind::EmptyCatalog,
            GuideError::ZeroDurationCatalog => ErrorKind::ZeroDurationCatalog,
        }
    }

    /// Get detailed diagnostic information about the error
    pub fn diagnostics(&self) -> String {
        let kind = self.kind();
        match self {
            GuideError::InvalidInput(detail) => {
                format!("{}\nDetail: {}\nSuggestion: {}", kind, detail, kind.suggestion())
            }
            GuideError::MalformedDuration(token) => {
                format!("{}\nToken: {:?}\nSuggestion: {}", kind, token, kind.suggestion())
            }
            GuideError::EmptyCatalog | GuideError::ZeroDurationCatalog => {
                format!("{}\nSuggestion: {}", kind, kind.suggestion())
            }
        }
    }
}
