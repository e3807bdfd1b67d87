use std::fmt;
use std::io::Read;
use std::path::PathBuf;

use md4::{Digest, Md4};
use serde::{Deserialize, Serialize};

/// ED2K hashes the file in fixed 9500 KiB chunks.
const CHUNK_SIZE: usize = 9_728_000;

const READ_BUF_SIZE: usize = 64 * 1024;

/// Lowercase hex ED2K digest of a file's content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ed2kHash(String);

impl Ed2kHash {
    /// Streams `reader` to the end and computes its ED2K hash: the MD4 of a
    /// single chunk, or the MD4 of the concatenated chunk digests when the
    /// content spans more than one chunk.
    pub fn from_reader<R: Read>(mut reader: R) -> std::io::Result<Self> {
        let mut chunk_digests: Vec<[u8; 16]> = Vec::new();
        let mut chunk = Md4::new();
        let mut in_chunk = 0usize;
        let mut buf = [0u8; READ_BUF_SIZE];

        loop {
            let n = reader.read(&mut buf)?;
            if n == 0 {
                break;
            }
            let mut rest = &buf[..n];
            while !rest.is_empty() {
                let take = rest.len().min(CHUNK_SIZE - in_chunk);
                chunk.update(&rest[..take]);
                in_chunk += take;
                rest = &rest[take..];
                if in_chunk == CHUNK_SIZE {
                    chunk_digests.push(chunk.finalize_reset().into());
                    in_chunk = 0;
                }
            }
        }

        // Content ending exactly on a chunk boundary has no trailing partial
        // chunk; the empty input still hashes as one empty chunk.
        if in_chunk > 0 || chunk_digests.is_empty() {
            chunk_digests.push(chunk.finalize_reset().into());
        }

        let digest: [u8; 16] = if chunk_digests.len() == 1 {
            chunk_digests[0]
        } else {
            let mut outer = Md4::new();
            for d in &chunk_digests {
                outer.update(d);
            }
            outer.finalize().into()
        };

        Ok(Self(hex::encode(digest)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ed2kHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A file that has been hashed and is ready for catalog operations.
#[derive(Debug, Clone)]
pub struct HashedFile {
    pub path: PathBuf,
    pub size: u64,
    pub ed2k: Ed2kHash,
}

impl HashedFile {
    /// Canonical `ed2k://` link for this file.
    pub fn link(&self) -> String {
        let name = self.path.file_name().map_or_else(
            || String::from("unknown"),
            |n| n.to_string_lossy().into_owned(),
        );
        format!("ed2k://|file|{}|{}|{}|/", name, self.size, self.ed2k)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use pretty_assertions::assert_eq;

    use super::*;

    fn ed2k_of(bytes: &[u8]) -> String {
        Ed2kHash::from_reader(Cursor::new(bytes))
            .unwrap()
            .as_str()
            .to_string()
    }

    #[test]
    fn empty_input_hashes_to_empty_md4() {
        assert_eq!(ed2k_of(b""), "31d6cfe0d16ae931b73c59d7e0c089c0");
    }

    #[test]
    fn sub_chunk_input_is_plain_md4() {
        // RFC 1320 test vectors.
        assert_eq!(ed2k_of(b"a"), "bde52cb31de33e46245e05fbdbd6fb24");
        assert_eq!(ed2k_of(b"abc"), "a448017aaf21d8525fc10ae87aa6729d");
        assert_eq!(ed2k_of(b"message digest"), "d9130a8164549fe818874806e1c7014b");
    }

    #[test]
    fn exact_chunk_boundary_is_still_a_single_chunk() {
        let data = vec![0x5au8; CHUNK_SIZE];
        let expected = hex::encode(Md4::digest(&data));
        assert_eq!(ed2k_of(&data), expected);
    }

    #[test]
    fn multi_chunk_input_hashes_the_chunk_digests() {
        let mut data = vec![0x17u8; CHUNK_SIZE];
        data.push(b'x');

        let first: [u8; 16] = Md4::digest(&data[..CHUNK_SIZE]).into();
        let second: [u8; 16] = Md4::digest(b"x").into();
        let mut outer = Md4::new();
        outer.update(first);
        outer.update(second);
        let expected = hex::encode(outer.finalize());

        assert_eq!(ed2k_of(&data), expected);
    }

    #[test]
    fn link_embeds_name_size_and_hash() {
        let file = HashedFile {
            path: PathBuf::from("/media/clip.mkv"),
            size: 3,
            ed2k: Ed2kHash::from_reader(Cursor::new(b"abc")).unwrap(),
        };
        assert_eq!(
            file.link(),
            "ed2k://|file|clip.mkv|3|a448017aaf21d8525fc10ae87aa6729d|/"
        );
    }
}
