//! PE/COFF headers, just far enough to find the CLI metadata block.

use crate::error::{Error, Result};
use crate::reader::Reader;

const PE_SIGNATURE: &[u8; 4] = b"PE\0\0";
const PE32_MAGIC: u16 = 0x10b;
const PE32_PLUS_MAGIC: u16 = 0x20b;
const CLI_HEADER_DIRECTORY: u32 = 14;
const SECTION_HEADER_SIZE: usize = 40;

#[derive(Clone, Copy, Debug)]
struct Section {
    virtual_address: u32,
    virtual_size: u32,
    raw_size: u32,
    raw_pointer: u32,
}

impl Section {
    fn contains(&self, rva: u32) -> bool {
        let extent = self.virtual_size.max(self.raw_size);
        rva >= self.virtual_address && (rva - self.virtual_address) < extent
    }
}

#[derive(Debug)]
pub(crate) struct PeImage<'a> {
    data: &'a [u8],
    sections: Vec<Section>,
    cli_header_rva: u32,
}

impl<'a> PeImage<'a> {
    pub(crate) fn parse(data: &'a [u8]) -> Result<Self> {
        if data.len() < 0x40 || &data[..2] != b"MZ" {
            return Err(Error::NotPe);
        }
        let pe_offset = Reader::at(data, 0x3c)?.u32()? as usize;

        let mut r = Reader::at(data, pe_offset).map_err(|_| Error::NotPe)?;
        if r.bytes(4).map_err(|_| Error::NotPe)? != PE_SIGNATURE {
            return Err(Error::NotPe);
        }

        // COFF file header
        let _machine = r.u16()?;
        let section_count = r.u16()? as usize;
        r.skip(12)?;
        let optional_header_size = r.u16()? as usize;
        let _characteristics = r.u16()?;

        let optional_start = r.position();
        let magic = r.u16()?;
        let (count_offset, directories_offset) = match magic {
            PE32_MAGIC => (92, 96),
            PE32_PLUS_MAGIC => (108, 112),
            other => return Err(Error::InvalidOptionalHeader(other)),
        };

        let directory_count = Reader::at(data, optional_start + count_offset)?.u32()?;
        if directory_count <= CLI_HEADER_DIRECTORY {
            return Err(Error::NotManaged);
        }
        let cli_offset = optional_start + directories_offset + CLI_HEADER_DIRECTORY as usize * 8;
        let mut dir = Reader::at(data, cli_offset)?;
        let cli_header_rva = dir.u32()?;
        let cli_header_size = dir.u32()?;
        if cli_header_rva == 0 || cli_header_size == 0 {
            return Err(Error::NotManaged);
        }

        let mut table = Reader::at(data, optional_start + optional_header_size)?;
        let mut sections = Vec::with_capacity(section_count);
        for _ in 0..section_count {
            let header = table.bytes(SECTION_HEADER_SIZE)?;
            let mut s = Reader::at(header, 8)?;
            sections.push(Section {
                virtual_size: s.u32()?,
                virtual_address: s.u32()?,
                raw_size: s.u32()?,
                raw_pointer: s.u32()?,
            });
        }

        Ok(Self {
            data,
            sections,
            cli_header_rva,
        })
    }

    /// File offset of `rva`.
    pub(crate) fn offset_of(&self, rva: u32) -> Result<usize> {
        let section = self
            .sections
            .iter()
            .find(|s| s.contains(rva))
            .ok_or(Error::RvaOutOfRange(rva))?;
        let offset = section.raw_pointer as usize + (rva - section.virtual_address) as usize;
        if offset >= self.data.len() {
            return Err(Error::RvaOutOfRange(rva));
        }
        Ok(offset)
    }

    /// The metadata block named by the CLI header.
    pub(crate) fn metadata(&self) -> Result<&'a [u8]> {
        let mut cli = Reader::at(self.data, self.offset_of(self.cli_header_rva)?)?;
        // cb, MajorRuntimeVersion, MinorRuntimeVersion
        cli.skip(8)?;
        let rva = cli.u32()?;
        let size = cli.u32()? as usize;

        let mut r = Reader::at(self.data, self.offset_of(rva)?)?;
        r.bytes(size)
    }
}
