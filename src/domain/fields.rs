use crate::error::{AnicatError, Result};

/// Requestable FILE fields, one row per mask byte, leftmost name = bit 7.
/// Placeholder slots keep the wire layout and cannot be requested.
const FILE_FIELDS: [[&str; 8]; 5] = [
    [
        "",
        "aid",
        "eid",
        "gid",
        "mylist id",
        "other episodes",
        "IsDeprecated",
        "state",
    ],
    [
        "size",
        "ed2k",
        "md5",
        "sha1",
        "crc32",
        "unused",
        "video colour depth",
        "reserved",
    ],
    [
        "quality",
        "source",
        "audio codec list",
        "audio bitrate list",
        "video codec",
        "video bitrate",
        "video resolution",
        "file type extension",
    ],
    [
        "dub language",
        "sub language",
        "length in seconds",
        "description",
        "aired date",
        "unused",
        "unused",
        "anidb file name",
    ],
    [
        "mylist state",
        "mylist filestate",
        "mylist viewed",
        "mylist viewdate",
        "mylist storage",
        "mylist source",
        "mylist other",
        "unused",
    ],
];

const ANIME_FIELDS: [[&str; 8]; 4] = [
    [
        "anime total episodes",
        "highest episode number",
        "year",
        "type",
        "related aid list",
        "related aid type",
        "category list",
        "category weight list",
    ],
    [
        "romaji name",
        "kanji name",
        "english name",
        "other name",
        "short name list",
        "synonym list",
        "retired",
        "retired",
    ],
    [
        "epno",
        "ep name",
        "ep romaji name",
        "ep kanji name",
        "episode rating",
        "episode vote count",
        "unused",
        "unused",
    ],
    [
        "group name",
        "group short name",
        "unused",
        "unused",
        "unused",
        "unused",
        "unused",
        "date aid record updated",
    ],
];

fn is_placeholder(name: &str) -> bool {
    matches!(name, "" | "unused" | "retired" | "reserved")
}

/// A single field returned by the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldValue {
    pub name: &'static str,
    pub value: String,
}

/// An ordered selection of catalog fields with the derived wire masks.
///
/// Names are kept in mask-bit order (file rows before anime rows, bit 7
/// before bit 0) because that is the order the service returns values in.
#[derive(Debug, Clone)]
pub struct FieldSet {
    names: Vec<&'static str>,
    file_mask: [u8; 5],
    anime_mask: [u8; 4],
}

impl FieldSet {
    /// Parses a comma-delimited field list, matching names
    /// case-insensitively against the catalog tables.
    pub fn parse(spec: &str) -> Result<Self> {
        let requested: Vec<&str> = spec
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        if requested.is_empty() {
            return Err(AnicatError::NoFields);
        }

        for name in &requested {
            let known = FILE_FIELDS
                .iter()
                .chain(ANIME_FIELDS.iter())
                .flatten()
                .any(|f| !is_placeholder(f) && f.eq_ignore_ascii_case(name));
            if !known {
                return Err(AnicatError::UnknownField((*name).to_string()));
            }
        }

        let wanted = |name: &str| requested.iter().any(|r| r.eq_ignore_ascii_case(name));

        let mut names = Vec::new();
        let mut file_mask = [0u8; 5];
        let mut anime_mask = [0u8; 4];

        for (byte, row) in FILE_FIELDS.iter().enumerate() {
            for (bit, name) in row.iter().enumerate() {
                if !is_placeholder(name) && wanted(name) {
                    file_mask[byte] |= 1 << (7 - bit);
                    names.push(*name);
                }
            }
        }
        for (byte, row) in ANIME_FIELDS.iter().enumerate() {
            for (bit, name) in row.iter().enumerate() {
                if !is_placeholder(name) && wanted(name) {
                    anime_mask[byte] |= 1 << (7 - bit);
                    names.push(*name);
                }
            }
        }

        Ok(Self {
            names,
            file_mask,
            anime_mask,
        })
    }

    pub fn names(&self) -> &[&'static str] {
        &self.names
    }

    pub fn file_mask_hex(&self) -> String {
        hex::encode(self.file_mask)
    }

    pub fn anime_mask_hex(&self) -> String {
        hex::encode(self.anime_mask)
    }

    /// Zips a FILE reply data line against the selected names. The line is
    /// pipe-separated and always leads with the file id.
    pub fn zip_values(&self, line: &str) -> Result<Vec<FieldValue>> {
        let mut values = line.split('|');
        let fid = values.next().unwrap_or_default();

        let mut out = vec![FieldValue {
            name: "fid",
            value: fid.to_string(),
        }];
        for name in &self.names {
            let value = values.next().ok_or_else(|| {
                AnicatError::MalformedReply(format!("missing value for field {name}"))
            })?;
            out.push(FieldValue {
                name,
                value: value.to_string(),
            });
        }
        if values.next().is_some() {
            return Err(AnicatError::MalformedReply(
                "more values than requested fields".to_string(),
            ));
        }
        Ok(out)
    }

    /// Every requestable field name, in catalog order.
    pub fn all_names() -> impl Iterator<Item = &'static str> {
        FILE_FIELDS
            .iter()
            .chain(ANIME_FIELDS.iter())
            .flatten()
            .copied()
            .filter(|f| !is_placeholder(f))
    }
}
