//! Maps a query's `(is_loading, error, count)` to the single branch a view renders.

use std::fmt;

/// Which of the four branches a data view shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewState {
    Loading,
    Error,
    Empty,
    Data,
}

impl ViewState {
    pub fn as_str(self) -> &'static str {
        match self {
            ViewState::Loading => "loading",
            ViewState::Error => "error",
            ViewState::Empty => "empty",
            ViewState::Data => "data",
        }
    }
}

impl fmt::Display for ViewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolves the view state. Loading wins over a stale error, and an error wins over an empty
/// result set.
///
/// Any `Some` error counts, including `Some("")`. Views render a generic message for it.
pub fn resolve(is_loading: bool, error: Option<&str>, count: usize) -> ViewState {
    if is_loading {
        ViewState::Loading
    } else if error.is_some() {
        ViewState::Error
    } else if count == 0 {
        ViewState::Empty
    } else {
        ViewState::Data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documented_scenarios() {
        assert_eq!(resolve(true, Some("network down"), 5), ViewState::Loading);
        assert_eq!(resolve(false, Some("network down"), 0), ViewState::Error);
        assert_eq!(resolve(false, None, 0), ViewState::Empty);
        assert_eq!(resolve(false, None, 3), ViewState::Data);
    }

    #[test]
    fn test_precedence_over_all_inputs() {
        for count in [0, 1, 2, 50, usize::MAX] {
            for error in [None, Some(""), Some("boom")] {
                assert_eq!(resolve(true, error, count), ViewState::Loading);
                if error.is_some() {
                    assert_eq!(resolve(false, error, count), ViewState::Error);
                }
            }
            let expected = if count == 0 { ViewState::Empty } else { ViewState::Data };
            assert_eq!(resolve(false, None, count), expected);
        }
    }

    #[test]
    fn test_empty_error_message_is_still_an_error() {
        assert_eq!(resolve(false, Some(""), 0), ViewState::Error);
        assert_eq!(resolve(false, Some(""), 4), ViewState::Error);
    }

    #[test]
    fn test_display() {
        assert_eq!(ViewState::Empty.to_string(), "empty");
        assert_eq!(format!("{}", ViewState::Loading), "loading");
    }
}
