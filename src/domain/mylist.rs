use chrono::{DateTime, Utc};
use clap::ValueEnum;

/// Where a registered copy of a file lives, as the catalog encodes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum FileState {
    Unknown,
    #[default]
    Hdd,
    Cd,
    Deleted,
}

impl FileState {
    pub const fn wire_value(self) -> u8 {
        match self {
            Self::Unknown => 0,
            Self::Hdd => 1,
            Self::Cd => 2,
            Self::Deleted => 3,
        }
    }
}

/// Flag-derived values applied when registering or editing a MyList entry.
/// `None` fields are omitted from the wire command.
#[derive(Debug, Clone, Default)]
pub struct MylistUpdate {
    pub state: FileState,
    pub viewed: Option<bool>,
    pub viewdate: Option<DateTime<Utc>>,
    pub source: Option<String>,
    pub storage: Option<String>,
    pub other: Option<String>,
}
