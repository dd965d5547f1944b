//! Metadata root (`BSJB`) and stream directory.

use crate::error::{Error, Result};
use crate::reader::Reader;

const METADATA_SIGNATURE: u32 = 0x424a_5342;

#[derive(Debug)]
pub(crate) struct MetadataRoot<'a> {
    pub(crate) version: String,
    pub(crate) tables: &'a [u8],
    pub(crate) strings: &'a [u8],
}

impl<'a> MetadataRoot<'a> {
    pub(crate) fn parse(metadata: &'a [u8]) -> Result<Self> {
        let mut r = Reader::new(metadata);
        let signature = r.u32()?;
        if signature != METADATA_SIGNATURE {
            return Err(Error::InvalidMetadataSignature(signature));
        }
        // MajorVersion, MinorVersion, Reserved
        r.skip(8)?;
        let version_len = r.u32()? as usize;
        let version_bytes = r.bytes(version_len)?;
        let version = String::from_utf8_lossy(version_bytes)
            .trim_end_matches('\0')
            .to_string();
        let _flags = r.u16()?;
        let stream_count = r.u16()?;

        let mut tables = None;
        let mut strings: &[u8] = &[];
        for _ in 0..stream_count {
            let offset = r.u32()? as usize;
            let size = r.u32()? as usize;
            let name = r.padded_name()?;

            let slice = offset
                .checked_add(size)
                .and_then(|end| metadata.get(offset..end))
                .ok_or_else(|| Error::StreamOutOfRange {
                    name: String::from_utf8_lossy(name).into_owned(),
                })?;

            match name {
                b"#~" | b"#-" => tables = Some(slice),
                b"#Strings" => strings = slice,
                _ => {}
            }
        }

        Ok(Self {
            version,
            tables: tables.ok_or(Error::MissingStream("#~"))?,
            strings,
        })
    }
}

/// The `#Strings` heap: NUL-terminated UTF-8 names addressed by byte offset.
#[derive(Clone, Copy, Debug)]
pub(crate) struct StringHeap<'a>(pub(crate) &'a [u8]);

impl<'a> StringHeap<'a> {
    pub(crate) fn get(&self, index: u32) -> Result<&'a str> {
        let rest = self
            .0
            .get(index as usize..)
            .ok_or(Error::InvalidString(index))?;
        let len = rest
            .iter()
            .position(|b| *b == 0)
            .ok_or(Error::InvalidString(index))?;
        std::str::from_utf8(&rest[..len]).map_err(|_| Error::InvalidString(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_heap_lookup() {
        let heap = StringHeap(b"\0System\0Object\0");
        assert_eq!(heap.get(0).unwrap(), "");
        assert_eq!(heap.get(1).unwrap(), "System");
        assert_eq!(heap.get(8).unwrap(), "Object");
        assert_eq!(heap.get(10).unwrap(), "ject");
        assert!(heap.get(100).is_err());
    }

    #[test]
    fn unterminated_string_is_invalid() {
        let heap = StringHeap(b"\0abc");
        assert!(matches!(heap.get(1), Err(Error::InvalidString(1))));
    }

    #[test]
    fn rejects_wrong_signature() {
        let data = [0u8; 32];
        assert!(matches!(
            MetadataRoot::parse(&data),
            Err(Error::InvalidMetadataSignature(0))
        ));
    }

    #[test]
    fn requires_tables_stream() {
        let mut data = Vec::new();
        data.extend_from_slice(&METADATA_SIGNATURE.to_le_bytes());
        data.extend_from_slice(&[1, 0, 1, 0, 0, 0, 0, 0]);
        data.extend_from_slice(&4u32.to_le_bytes());
        data.extend_from_slice(b"v4\0\0");
        data.extend_from_slice(&0u16.to_le_bytes());
        data.extend_from_slice(&1u16.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(b"#US\0");

        assert!(matches!(
            MetadataRoot::parse(&data),
            Err(Error::MissingStream("#~"))
        ));
    }
}
