use std::fmt::{Debug, Display};
use std::path::{Path, PathBuf};

pub trait ErrorType: Display + Debug + PartialEq {}

/// Where something was written down: an optional grammar file and a line
/// number, where line 0 means "no particular line".
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct Location {
    pub file: Option<PathBuf>,
    pub line: usize
}

impl Location {
    pub fn new(file: Option<&Path>, line: usize) -> Self {
        Location {
            file: file.map(Path::to_path_buf),
            line
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.file.is_none() && self.line == 0
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.file, self.line) {
            (Some(file), 0) => write!(f, "{}", file.display()),
            (Some(file), line) => write!(f, "{}:{}", file.display(), line),
            (None, 0) => write!(f, "<input>"),
            (None, line) => write!(f, "line {}", line),
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct Error<T: ErrorType> {
    pub location: Location,
    pub error: T
}

impl<T: ErrorType> Error<T> {
    pub fn new(error: T, location: Location) -> Self {
        Error { location, error }
    }
}

impl<T: ErrorType> Display for Error<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.location.is_unknown() {
            write!(f, "{}", self.error)
        } else {
            write!(f, "{}: {}", self.location, self.error)
        }
    }
}

impl<T: ErrorType> std::error::Error for Error<T> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Oops;

    impl Display for Oops {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "oops")
        }
    }

    impl ErrorType for Oops {}

    #[test]
    fn location_formats() {
        let path = PathBuf::from("rules.grammar");

        assert_eq!(Location::new(Some(&path), 12).to_string(), "rules.grammar:12");
        assert_eq!(Location::new(Some(&path), 0).to_string(), "rules.grammar");
        assert_eq!(Location::new(None, 3).to_string(), "line 3");
        assert_eq!(Location::default().to_string(), "<input>");
    }

    #[test]
    fn error_omits_unknown_location() {
        assert_eq!(Error::new(Oops, Location::default()).to_string(), "oops");
        assert_eq!(Error::new(Oops, Location::new(None, 4)).to_string(), "line 4: oops");
    }
}
