//! Arrival events for maildir entries.

/// A file that appeared in the watched directory.
///
/// Maildir names look like `<unique>:2,<flags>` or `<unique>,S=<size>:2,<flags>`.
/// Every rename of the same delivery (flag changes, `new/` to `cur/`) keeps
/// the part before the last comma, which serves as the base identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrivalEvent {
    name: String,
    base: String,
    deleted: bool,
}

impl ArrivalEvent {
    /// Build an event from a directory entry name.
    ///
    /// A name without a comma is its own base identifier.
    pub fn new(name: impl Into<String>, deleted_marker: char) -> Self {
        let name = name.into();
        let base = match name.rfind(',') {
            Some(pos) => name[..pos].to_string(),
            None => name.clone(),
        };
        let deleted = name.ends_with(deleted_marker);
        Self {
            name,
            base,
            deleted,
        }
    }

    /// The entry name as it appeared.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Identifier shared by every event of the same delivery.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// The name ends with the deletion marker.
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }
}
