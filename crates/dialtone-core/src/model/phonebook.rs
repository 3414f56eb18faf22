// Shared directory entries pushed to handsets.

use serde::{Deserialize, Serialize};

/// Directory title used by the vendor phonebook renderers.
pub const DEFAULT_PHONEBOOK_TITLE: &str = "Directory";

/// One directory entry. Entries are identified by their 1-based
/// position in the phonebook, reassigned compactly after a removal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhonebookEntry {
    pub name: String,
    pub number: String,
}
