//! Category and Software definitions.
//!
//! Pure data - no I/O. Numeric codes are part of the host contract and must
//! not change.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Domain of a managed application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Category {
    Documents = 0x01,
    Entities = 0x02,
    Notes = 0x03,
    OsStatus = 0x04,
    Webpages = 0x05,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Documents,
        Category::Entities,
        Category::Notes,
        Category::OsStatus,
        Category::Webpages,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.code() == code)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Documents => "documents",
            Category::Entities => "entities",
            Category::Notes => "notes",
            Category::OsStatus => "os_status",
            Category::Webpages => "webpages",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A specific application within a [`Category`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Software {
    // documents
    FoxitReader = 0xB7,
    WpsWriter = 0xD4,
    WpsPpt = 0x82,
    // entities
    Notifier = 0xA0,
    // notes
    Gedit = 0xF3,
    Typora = 0xB1,
    Sublime = 0xA4,
    // os_status
    Modifier = 0x0B,
    // webpages
    Chrome = 0x04,
    Firefox = 0x02,
}

impl Software {
    pub const ALL: [Software; 10] = [
        Software::FoxitReader,
        Software::WpsWriter,
        Software::WpsPpt,
        Software::Notifier,
        Software::Gedit,
        Software::Typora,
        Software::Sublime,
        Software::Modifier,
        Software::Chrome,
        Software::Firefox,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    /// Resolve a software code within a category.
    ///
    /// Codes are only meaningful together with their category.
    pub fn from_code(category: Category, code: u8) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|s| s.category() == category && s.code() == code)
    }

    /// The category this application belongs to.
    pub fn category(self) -> Category {
        match self {
            Software::FoxitReader | Software::WpsWriter | Software::WpsPpt => Category::Documents,
            Software::Notifier => Category::Entities,
            Software::Gedit | Software::Typora | Software::Sublime => Category::Notes,
            Software::Modifier => Category::OsStatus,
            Software::Chrome | Software::Firefox => Category::Webpages,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Software::FoxitReader => "foxit_reader",
            Software::WpsWriter => "wps_writer",
            Software::WpsPpt => "wps_ppt",
            Software::Notifier => "notifier",
            Software::Gedit => "gedit",
            Software::Typora => "typora",
            Software::Sublime => "sublime",
            Software::Modifier => "modifier",
            Software::Chrome => "chrome",
            Software::Firefox => "firefox",
        }
    }
}

impl fmt::Display for Software {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Identifies exactly one supported application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OperationDescriptor {
    pub category: Category,
    pub software: Software,
}

impl OperationDescriptor {
    pub const fn new(category: Category, software: Software) -> Self {
        Self { category, software }
    }

    /// The canonical descriptor of a software, under its own category.
    pub fn of(software: Software) -> Self {
        Self::new(software.category(), software)
    }

    /// Raw (category, software) byte pair as seen by the host.
    pub fn codes(&self) -> (u8, u8) {
        (self.category.code(), self.software.code())
    }

    /// All canonical descriptors, one per software.
    pub fn all() -> impl Iterator<Item = OperationDescriptor> {
        Software::ALL.into_iter().map(Self::of)
    }
}

impl fmt::Display for OperationDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.category, self.software)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid operation descriptor: {0}")]
pub struct ParseDescriptorError(pub String);

impl FromStr for OperationDescriptor {
    type Err = ParseDescriptorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (category, software) = s
            .split_once('/')
            .ok_or_else(|| ParseDescriptorError(s.to_string()))?;

        let category = Category::ALL
            .into_iter()
            .find(|c| c.label() == category)
            .ok_or_else(|| ParseDescriptorError(s.to_string()))?;
        let software = Software::ALL
            .into_iter()
            .find(|sw| sw.label() == software)
            .ok_or_else(|| ParseDescriptorError(s.to_string()))?;

        Ok(Self::new(category, software))
    }
}

/// Process names of known applications (Linux and Windows builds).
pub const KNOWN_APPLICATIONS: &[(&str, Software)] = &[
    // documents
    ("FoxitReader", Software::FoxitReader),
    ("FoxitReader.exe", Software::FoxitReader),
    ("FoxitPDFReader.exe", Software::FoxitReader),
    ("wps", Software::WpsWriter),
    ("wps.exe", Software::WpsWriter),
    ("wpp", Software::WpsPpt),
    ("wpp.exe", Software::WpsPpt),
    // entities
    ("dunst", Software::Notifier),
    ("notify-osd", Software::Notifier),
    ("ShellExperienceHost.exe", Software::Notifier),
    // notes
    ("gedit", Software::Gedit),
    ("gedit.exe", Software::Gedit),
    ("typora", Software::Typora),
    ("Typora.exe", Software::Typora),
    ("sublime_text", Software::Sublime),
    ("sublime_text.exe", Software::Sublime),
    // os_status
    ("gnome-shell", Software::Modifier),
    ("explorer.exe", Software::Modifier),
    // webpages
    ("chrome", Software::Chrome),
    ("google-chrome", Software::Chrome),
    ("chrome.exe", Software::Chrome),
    ("firefox", Software::Firefox),
    ("firefox.exe", Software::Firefox),
];
