//! Mailbox categories: folders and labels.
//!
//! Folders and labels carry different extra fields but share the `Category`
//! capability set, so streams can join them into one `Vec<CategoryRef>` and
//! sort or filter without caring which variant an element is.

use crate::error::Result;
use crate::model::{Model, Named};
use crate::record::{Record, RecordId};
use alloc::rc::Rc;
use alloc::string::{String, ToString};
use core::fmt;

/// Display names starting with this marker denote auto-generated entries
/// (e.g. `[Gmail]/All Mail`).
pub const SYSTEM_NAME_MARKER: char = '[';

/// Roles shown in the standard section of the sidebar.
pub const STANDARD_ROLES: &[&str] = &[
    "inbox",
    "important",
    "snoozed",
    "sent",
    "drafts",
    "all",
    "spam",
    "archive",
    "trash",
];

/// Roles never listed as user categories.
pub const HIDDEN_ROLES: &[&str] = &[
    "sent",
    "drafts",
    "all",
    "archive",
    "starred",
    "important",
    "snoozed",
];

/// Shared handle to any category variant.
pub type CategoryRef = Rc<dyn Category>;

/// Capability set shared by folders and labels.
pub trait Category: Model + Named + fmt::Debug {
    /// Account the category belongs to.
    fn account_id(&self) -> &str;

    /// Well-known role (`"inbox"`, `"trash"`, ...), if any.
    fn role(&self) -> Option<&str>;

    /// Returns true for roles in the standard section. `important` only
    /// counts when the user opted to show it.
    fn is_standard_category(&self, show_important: bool) -> bool {
        match self.role() {
            Some("important") => show_important,
            Some(role) => STANDARD_ROLES.contains(&role),
            None => false,
        }
    }

    fn is_hidden_category(&self) -> bool {
        self.role().map_or(false, |role| HIDDEN_ROLES.contains(&role))
    }

    /// Neither standard nor hidden. `important` is a hidden role, so the
    /// show-important setting never changes the answer.
    fn is_user_category(&self) -> bool {
        !self.is_standard_category(true) && !self.is_hidden_category()
    }

    /// Returns true if the display name starts with the system marker.
    fn is_system_name(&self) -> bool {
        self.display_name().starts_with(SYSTEM_NAME_MARKER)
    }
}

/// A server-side folder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Folder {
    pub id: RecordId,
    pub account_id: String,
    pub display_name: String,
    pub role: Option<String>,
    /// Full path on the server, e.g. `INBOX/Receipts`.
    pub path: String,
}

impl Folder {
    pub const ENTITY_TYPE: &'static str = "folder";

    pub fn new(id: RecordId, account_id: &str, display_name: &str) -> Self {
        Self {
            id,
            account_id: account_id.to_string(),
            display_name: display_name.to_string(),
            role: None,
            path: display_name.to_string(),
        }
    }

    pub fn with_role(mut self, role: &str) -> Self {
        self.role = Some(role.to_string());
        self
    }

    pub fn with_path(mut self, path: &str) -> Self {
        self.path = path.to_string();
        self
    }

    /// Encodes the folder as a store record.
    pub fn to_record(&self) -> Record {
        Record::new(Self::ENTITY_TYPE, self.id)
            .with("account_id", self.account_id.as_str())
            .with("display_name", self.display_name.as_str())
            .with("role", self.role.as_deref())
            .with("path", self.path.as_str())
    }
}

impl Model for Folder {
    fn entity_type() -> &'static str {
        Self::ENTITY_TYPE
    }

    fn id(&self) -> RecordId {
        self.id
    }

    fn from_record(record: &Record) -> Result<Self> {
        let display_name = record.require_str("display_name")?.to_string();
        Ok(Self {
            id: record.id(),
            account_id: record.require_str("account_id")?.to_string(),
            role: record.optional_str("role")?.map(str::to_string),
            path: record
                .optional_str("path")?
                .map(str::to_string)
                .unwrap_or_else(|| display_name.clone()),
            display_name,
        })
    }
}

impl Named for Folder {
    fn display_name(&self) -> &str {
        &self.display_name
    }
}

impl Category for Folder {
    fn account_id(&self) -> &str {
        &self.account_id
    }

    fn role(&self) -> Option<&str> {
        self.role.as_deref()
    }
}

/// A label (Gmail-style tag).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Label {
    pub id: RecordId,
    pub account_id: String,
    pub display_name: String,
    pub role: Option<String>,
    /// Background color as a CSS string, if the provider assigns one.
    pub color: Option<String>,
}

impl Label {
    pub const ENTITY_TYPE: &'static str = "label";

    pub fn new(id: RecordId, account_id: &str, display_name: &str) -> Self {
        Self {
            id,
            account_id: account_id.to_string(),
            display_name: display_name.to_string(),
            role: None,
            color: None,
        }
    }

    pub fn with_role(mut self, role: &str) -> Self {
        self.role = Some(role.to_string());
        self
    }

    pub fn with_color(mut self, color: &str) -> Self {
        self.color = Some(color.to_string());
        self
    }

    /// Encodes the label as a store record.
    pub fn to_record(&self) -> Record {
        Record::new(Self::ENTITY_TYPE, self.id)
            .with("account_id", self.account_id.as_str())
            .with("display_name", self.display_name.as_str())
            .with("role", self.role.as_deref())
            .with("color", self.color.as_deref())
    }
}

impl Model for Label {
    fn entity_type() -> &'static str {
        Self::ENTITY_TYPE
    }

    fn id(&self) -> RecordId {
        self.id
    }

    fn from_record(record: &Record) -> Result<Self> {
        Ok(Self {
            id: record.id(),
            account_id: record.require_str("account_id")?.to_string(),
            display_name: record.require_str("display_name")?.to_string(),
            role: record.optional_str("role")?.map(str::to_string),
            color: record.optional_str("color")?.map(str::to_string),
        })
    }
}

impl Named for Label {
    fn display_name(&self) -> &str {
        &self.display_name
    }
}

impl Category for Label {
    fn account_id(&self) -> &str {
        &self.account_id
    }

    fn role(&self) -> Option<&str> {
        self.role.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use alloc::vec;
    use alloc::vec::Vec;

    #[test]
    fn test_folder_record_roundtrip() {
        let folder = Folder::new(1, "a1", "Receipts").with_path("INBOX/Receipts");
        let decoded = Folder::from_record(&folder.to_record()).unwrap();
        assert_eq!(decoded, folder);
    }

    #[test]
    fn test_folder_path_defaults_to_display_name() {
        let record = Record::new("folder", 2)
            .with("account_id", "a1")
            .with("display_name", "Work");
        assert_eq!(Folder::from_record(&record).unwrap().path, "Work");
    }

    #[test]
    fn test_label_decode_requires_account() {
        let record = Record::new("label", 3).with("display_name", "Travel");
        match Label::from_record(&record) {
            Err(Error::Decode { field, .. }) => assert_eq!(field, "account_id"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_category_roles() {
        let inbox = Folder::new(1, "a1", "Inbox").with_role("inbox");
        let important = Label::new(2, "a1", "Important").with_role("important");
        let sent = Folder::new(3, "a1", "Sent").with_role("sent");
        let travel = Label::new(4, "a1", "Travel");

        assert!(inbox.is_standard_category(false));
        assert!(!inbox.is_hidden_category());
        assert!(!important.is_standard_category(false));
        assert!(important.is_standard_category(true));
        assert!(important.is_hidden_category());
        assert!(sent.is_hidden_category());
        assert!(travel.is_user_category());
        assert!(!inbox.is_user_category());
        assert!(!important.is_user_category());
    }

    #[test]
    fn test_categories_are_interchangeable() {
        let all: Vec<CategoryRef> = vec![
            Rc::new(Folder::new(1, "a1", "[Gmail]/All Mail")),
            Rc::new(Label::new(2, "a2", "Travel")),
        ];
        let names: Vec<&str> = all.iter().map(|c| c.display_name()).collect();
        assert_eq!(names, vec!["[Gmail]/All Mail", "Travel"]);
        assert!(all[0].is_system_name());
        assert_eq!(all[1].account_id(), "a2");
        assert_eq!(all[1].id(), 2);
    }
}
