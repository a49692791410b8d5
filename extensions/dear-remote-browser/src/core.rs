use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::service::ServiceError;

/// Listing order requested from the listing service.
///
/// The server applies the ordering; the picker never re-sorts entries.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMethod {
    /// Name, A to Z
    #[default]
    NameAsc,
    /// Name, Z to A
    NameDesc,
    /// Modification date, newest first
    DateDesc,
    /// Modification date, oldest first
    DateAsc,
}

impl SortMethod {
    /// All methods in the order they are offered in the sort combo.
    pub const ALL: [SortMethod; 4] = [
        SortMethod::NameAsc,
        SortMethod::NameDesc,
        SortMethod::DateDesc,
        SortMethod::DateAsc,
    ];

    /// Value sent as the `sort` query parameter.
    pub fn as_wire(self) -> &'static str {
        match self {
            SortMethod::NameAsc => "name_asc",
            SortMethod::NameDesc => "name_desc",
            SortMethod::DateDesc => "date_desc",
            SortMethod::DateAsc => "date_asc",
        }
    }

    /// Short label used by the sort combo.
    pub fn label(self) -> &'static str {
        match self {
            SortMethod::NameAsc => "A \u{2192} Z",
            SortMethod::NameDesc => "Z \u{2192} A",
            SortMethod::DateDesc => "Newest",
            SortMethod::DateAsc => "Oldest",
        }
    }
}

impl fmt::Display for SortMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// Error returned when a sort value received from the server is unknown.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown sort method: {0}")]
pub struct UnknownSortMethod(pub String);

impl FromStr for SortMethod {
    type Err = UnknownSortMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortMethod::ALL
            .into_iter()
            .find(|m| m.as_wire() == s)
            .ok_or_else(|| UnknownSortMethod(s.to_owned()))
    }
}

/// Directory remembered across picker invocations.
///
/// The host owns this value: it is handed to a new session and handed back,
/// possibly updated, when the session closes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LastPath(String);

impl LastPath {
    /// Creates an empty memory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the remembered directory (empty when nothing was picked yet).
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether no directory has been remembered.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Remembers the directory containing `file`.
    pub fn remember_file(&mut self, file: &str) {
        self.0 = crate::path::containing_dir(file).to_owned();
    }
}

impl From<String> for LastPath {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for LastPath {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// How a picker session ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PickerOutcome {
    /// A file was committed.
    Selected {
        /// Absolute path of the chosen file, as built from the listing.
        path: String,
        /// Memory updated with the chosen file's directory.
        last_path: LastPath,
    },
    /// The dialog was dismissed (cancel, close button or escape).
    Cancelled {
        /// Memory as it was handed in.
        last_path: LastPath,
    },
}

impl PickerOutcome {
    /// Returns the chosen path, if any.
    pub fn selected_path(&self) -> Option<&str> {
        match self {
            PickerOutcome::Selected { path, .. } => Some(path),
            PickerOutcome::Cancelled { .. } => None,
        }
    }

    /// Returns the memory to hand to the next session.
    pub fn last_path(&self) -> &LastPath {
        match self {
            PickerOutcome::Selected { last_path, .. } | PickerOutcome::Cancelled { last_path } => {
                last_path
            }
        }
    }

    /// Consumes the outcome and returns the memory.
    pub fn into_last_path(self) -> LastPath {
        match self {
            PickerOutcome::Selected { last_path, .. } | PickerOutcome::Cancelled { last_path } => {
                last_path
            }
        }
    }
}

/// Errors returned by picker operations.
#[derive(Error, Debug)]
pub enum PickerError {
    /// Commit was requested without a selected file
    #[error("no file selected")]
    NoSelection,
    /// The session already closed
    #[error("picker already closed")]
    Closed,
    /// A remote call failed
    #[error(transparent)]
    Service(#[from] ServiceError),
}
