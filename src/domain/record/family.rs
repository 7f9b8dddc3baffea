//! Logical record file families
//!
//! Each family owns one directory holding one flat text file. Window
//! families hold the rollup summaries for one trailing time span.

use std::fmt;

/// Aggregation window sizes, in minutes.
pub const WINDOW_MINUTES: [u32; 4] = [30, 60, 120, 240];

/// A logical record file: raw transcripts, base summaries, or one
/// aggregation window's rollups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordFamily {
    Transcripts,
    Summaries,
    Window(u32),
}

impl RecordFamily {
    /// Directory name under the data root
    pub fn dir_name(&self) -> String {
        match self {
            Self::Transcripts => "transcripts".to_string(),
            Self::Summaries => "summaries".to_string(),
            Self::Window(minutes) => format!("summaries{minutes}"),
        }
    }

    /// Flat file name inside the family directory; also the logical name
    /// used on the remote store.
    pub fn file_name(&self) -> String {
        match self {
            Self::Transcripts => "transcripts.txt".to_string(),
            Self::Summaries => "summaries.txt".to_string(),
            Self::Window(minutes) => format!("summaries{minutes}.txt"),
        }
    }

    /// Every family that exists on disk, windows included.
    pub fn all() -> impl Iterator<Item = RecordFamily> {
        [Self::Transcripts, Self::Summaries]
            .into_iter()
            .chain(WINDOW_MINUTES.iter().map(|&m| Self::Window(m)))
    }
}

impl fmt::Display for RecordFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_names_embed_minutes() {
        let family = RecordFamily::Window(30);
        assert_eq!(family.dir_name(), "summaries30");
        assert_eq!(family.file_name(), "summaries30.txt");
    }

    #[test]
    fn base_family_names() {
        assert_eq!(RecordFamily::Transcripts.file_name(), "transcripts.txt");
        assert_eq!(RecordFamily::Summaries.file_name(), "summaries.txt");
    }

    #[test]
    fn all_lists_base_families_then_windows() {
        let all: Vec<RecordFamily> = RecordFamily::all().collect();
        assert_eq!(all.len(), 2 + WINDOW_MINUTES.len());
        assert_eq!(all[0], RecordFamily::Transcripts);
        assert_eq!(all[1], RecordFamily::Summaries);
        assert!(all.contains(&RecordFamily::Window(240)));
    }
}
