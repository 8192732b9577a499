use std::{io::Read, path::Path};

use {
    indexmap::IndexMap,
    tracing::{info, warn},
};

use crate::{error::Result, reader};

/// Display name and invite token of one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelEntry {
    pub display_name: String,
    pub invite_token: String,
}

/// Channels indexed by id, iterated in source order.
///
/// A repeated id overwrites the earlier row's name and token but keeps the
/// position where the id first appeared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelDirectory {
    entries: IndexMap<String, ChannelEntry>,
}

impl ChannelDirectory {
    /// Load `display name, channel id, invite token` rows from a delimited file.
    pub fn load(path: &Path, delimiter: u8) -> Result<Self> {
        info!(path = %path.display(), "reading channels data");
        let file = reader::open(path)?;
        Self::from_reader(file, path, delimiter)
    }

    /// Parse an already-open source. `origin` is used for error messages.
    pub fn from_reader(source: impl Read, origin: &Path, delimiter: u8) -> Result<Self> {
        let rows = reader::read_rows(source, origin, delimiter)?;
        let mut entries = IndexMap::with_capacity(rows.len());
        for row in &rows {
            let display_name = reader::field(row, origin, 0, 3, "display name")?;
            let id = reader::field(row, origin, 1, 3, "channel id")?;
            let invite_token = reader::field(row, origin, 2, 3, "invite token")?;
            let entry = ChannelEntry {
                display_name: display_name.to_string(),
                invite_token: invite_token.to_string(),
            };
            if let Some(previous) = entries.insert(id.to_string(), entry) {
                warn!(
                    path = %origin.display(),
                    line = row.line,
                    channel_id = id,
                    replaced = %previous.display_name,
                    "duplicate channel id, later row wins"
                );
            }
        }
        Ok(Self { entries })
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ChannelEntry> {
        self.entries.get(id)
    }

    /// `(id, entry)` pairs in source order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ChannelEntry)> {
        self.entries.iter().map(|(id, entry)| (id.as_str(), entry))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, crate::Error, rstest::rstest};

    fn parse(input: &str) -> Result<ChannelDirectory> {
        ChannelDirectory::from_reader(input.as_bytes(), Path::new("channels.csv"), b',')
    }

    #[test]
    fn indexes_by_channel_id() {
        let dir = parse("name,id,hash\nChan1,100,hashX\nChan2,200,hashY\n").unwrap();
        assert_eq!(dir.len(), 2);
        let chan = dir.get("200").unwrap();
        assert_eq!(chan.display_name, "Chan2");
        assert_eq!(chan.invite_token, "hashY");
        let ids: Vec<&str> = dir.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["100", "200"]);
    }

    #[test]
    fn duplicate_id_later_row_wins() {
        let dir = parse("name,id,hash\nOld,100,hashA\nOther,300,hashC\nNew,100,hashB\n").unwrap();
        assert_eq!(dir.len(), 2);
        assert_eq!(
            dir.get("100"),
            Some(&ChannelEntry {
                display_name: "New".into(),
                invite_token: "hashB".into(),
            })
        );
        let ids: Vec<&str> = dir.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["100", "300"]);
    }

    #[test]
    fn surrounding_whitespace_trimmed() {
        let dir = parse("name,id,hash\n Chan1 , 100 , hashX \n").unwrap();
        assert_eq!(dir.get("100").unwrap().invite_token, "hashX");
    }

    #[rstest]
    #[case::too_few_fields("name,id,hash\nChan1,100\n")]
    #[case::single_field("name,id,hash\nChan1\n")]
    fn short_rows_rejected(#[case] input: &str) {
        let err = parse(input).unwrap_err();
        assert!(
            matches!(err, Error::MissingField { line: 2, expected: 3, .. }),
            "{err}"
        );
    }

    #[rstest]
    #[case::blank_name("name,id,hash\n,100,hashX\n", "display name")]
    #[case::blank_id("name,id,hash\nChan1,,hashX\n", "channel id")]
    #[case::blank_token("name,id,hash\nChan1,100,\n", "invite token")]
    fn blank_fields_rejected(#[case] input: &str, #[case] expected: &str) {
        match parse(input).unwrap_err() {
            Error::EmptyField { field, .. } => assert_eq!(field, expected),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("channels.csv");
        std::fs::write(&path, "name,id,hash\nNews,555,abc\n").unwrap();
        let channels = ChannelDirectory::load(&path, b',').unwrap();
        assert_eq!(channels.get("555").unwrap().display_name, "News");
    }

    #[test]
    fn load_missing_file_is_read_error() {
        let err = ChannelDirectory::load(Path::new("/nonexistent/channels.csv"), b',').unwrap_err();
        assert!(matches!(err, Error::Read { .. }));
    }
}
