//! Session artifacts: generated images, audio and scripts.

use serde::{Deserialize, Serialize};

/// Kind of generated artifact; each lives in its own session subdirectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Image,
    Audio,
    Script,
}

impl ArtifactKind {
    /// Subdirectory under the session root.
    pub fn dir(&self) -> &'static str {
        match self {
            ArtifactKind::Image => "images",
            ArtifactKind::Audio => "audio",
            ArtifactKind::Script => "scripts",
        }
    }

    /// Kinds `delete_artifacts` may remove.
    pub fn deletable() -> [ArtifactKind; 2] {
        [ArtifactKind::Image, ArtifactKind::Audio]
    }

    /// Path of `file_name` inside this kind's directory.
    pub fn path_of(&self, file_name: &str) -> String {
        format!("{}/{}", self.dir(), file_name)
    }
}

/// One directory listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactEntry {
    pub name: String,
    pub is_dir: bool,
}

impl ArtifactEntry {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: false,
        }
    }

    pub fn dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: true,
        }
    }
}

/// Number given to the first synthesized line of a fresh workspace.
pub const FIRST_LINE_NUMBER: u32 = 6000;

/// One synthesized line in the workspace-wide line record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineEntry {
    pub number: u32,
    pub session_id: String,
    /// Audio path relative to the session root.
    pub relative_path: String,
    pub text: String,
}

/// Line numbers handed out so far, shared by every session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineRecord {
    pub next_number: u32,
    #[serde(default)]
    pub entries: Vec<LineEntry>,
}

impl LineRecord {
    pub fn empty(first_number: u32) -> Self {
        Self {
            next_number: first_number,
            entries: Vec::new(),
        }
    }

    /// `count` consecutive numbers starting at `next_number`. Does not consume them.
    pub fn reserve(&self, count: usize) -> Vec<u32> {
        (0..count as u32).map(|i| self.next_number + i).collect()
    }

    /// Add `entries` and move `next_number` past them.
    pub fn append(&mut self, entries: impl IntoIterator<Item = LineEntry>) {
        for entry in entries {
            self.next_number = self.next_number.max(entry.number + 1);
            self.entries.push(entry);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        assert_eq!(ArtifactKind::Image.path_of("a.png"), "images/a.png");
        assert_eq!(ArtifactKind::Audio.path_of("1_hi.wav"), "audio/1_hi.wav");
        assert_eq!(ArtifactKind::Script.dir(), "scripts");
    }

    #[test]
    fn test_scripts_are_not_deletable() {
        assert!(!ArtifactKind::deletable().contains(&ArtifactKind::Script));
    }

    fn entry(number: u32, session_id: &str) -> LineEntry {
        LineEntry {
            number,
            session_id: session_id.to_string(),
            relative_path: format!("audio/{}_x.wav", number),
            text: "x".to_string(),
        }
    }

    #[test]
    fn test_line_record_append_advances() {
        let mut record = LineRecord::empty(FIRST_LINE_NUMBER);
        assert_eq!(record.reserve(2), vec![6000, 6001]);
        record.append([entry(6000, "s1"), entry(6001, "s2")]);
        assert_eq!(record.next_number, 6002);
        assert_eq!(record.reserve(1), vec![6002]);
    }

    #[test]
    fn test_line_record_wire_shape() {
        let record: LineRecord = serde_json::from_str(
            r#"{"nextNumber":6003,"entries":[{"number":6002,"sessionId":"s1","relativePath":"audio/6002_hi.wav","text":"hi"}]}"#,
        )
        .unwrap();
        assert_eq!(record.next_number, 6003);
        assert_eq!(record.entries[0].session_id, "s1");
    }
}
