//! Notices: the transient messages a presentation layer may show.
//!
//! The core only reports what happened. Whether a notice becomes a toast,
//! a status line, or nothing at all is up to the caller.

use std::fmt;

/// How a notice should be styled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

/// A user-visible side outcome of a core operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    AddedToFavorites,
    RemovedFromFavorites,
    FavoriteSaveFailed,
    HistoryCleared,
    HistoryClearFailed,
    /// A check succeeded but could not be written to history.
    HistorySaveFailed,
}

impl Notice {
    pub fn level(&self) -> NoticeLevel {
        match self {
            Notice::AddedToFavorites | Notice::HistoryCleared => NoticeLevel::Success,
            Notice::RemovedFromFavorites => NoticeLevel::Info,
            Notice::FavoriteSaveFailed
            | Notice::HistoryClearFailed
            | Notice::HistorySaveFailed => NoticeLevel::Error,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Notice::AddedToFavorites => "Added to favorites",
            Notice::RemovedFromFavorites => "Removed from favorites",
            Notice::FavoriteSaveFailed => "Could not save favorite status",
            Notice::HistoryCleared => "History cleared successfully",
            Notice::HistoryClearFailed => "Failed to clear history",
            Notice::HistorySaveFailed => "Could not save this check to your history",
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}
