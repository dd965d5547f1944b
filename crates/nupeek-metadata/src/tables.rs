//! The `#~` tables stream: row counts, column widths and cell access.
//!
//! Row sizes depend on heap index widths and on the row counts of referenced
//! tables, so every table up to the last one present has to be sized even when only
//! a few are read.

use crate::error::{Error, Result};
use crate::reader::Reader;

pub(crate) const MODULE: usize = 0x00;
pub(crate) const TYPE_REF: usize = 0x01;
pub(crate) const TYPE_DEF: usize = 0x02;
pub(crate) const FIELD_PTR: usize = 0x03;
pub(crate) const FIELD: usize = 0x04;
pub(crate) const METHOD_PTR: usize = 0x05;
pub(crate) const METHOD_DEF: usize = 0x06;
const PARAM_PTR: usize = 0x07;
const PARAM: usize = 0x08;
const INTERFACE_IMPL: usize = 0x09;
const MEMBER_REF: usize = 0x0a;
const CONSTANT: usize = 0x0b;
const CUSTOM_ATTRIBUTE: usize = 0x0c;
const FIELD_MARSHAL: usize = 0x0d;
const DECL_SECURITY: usize = 0x0e;
const CLASS_LAYOUT: usize = 0x0f;
const FIELD_LAYOUT: usize = 0x10;
const STAND_ALONE_SIG: usize = 0x11;
pub(crate) const EVENT_MAP: usize = 0x12;
pub(crate) const EVENT_PTR: usize = 0x13;
pub(crate) const EVENT: usize = 0x14;
pub(crate) const PROPERTY_MAP: usize = 0x15;
pub(crate) const PROPERTY_PTR: usize = 0x16;
pub(crate) const PROPERTY: usize = 0x17;
const METHOD_SEMANTICS: usize = 0x18;
const METHOD_IMPL: usize = 0x19;
const MODULE_REF: usize = 0x1a;
const TYPE_SPEC: usize = 0x1b;
const IMPL_MAP: usize = 0x1c;
const FIELD_RVA: usize = 0x1d;
const ENC_LOG: usize = 0x1e;
const ENC_MAP: usize = 0x1f;
const ASSEMBLY: usize = 0x20;
const ASSEMBLY_PROCESSOR: usize = 0x21;
const ASSEMBLY_OS: usize = 0x22;
const ASSEMBLY_REF: usize = 0x23;
const ASSEMBLY_REF_PROCESSOR: usize = 0x24;
const ASSEMBLY_REF_OS: usize = 0x25;
const FILE: usize = 0x26;
const EXPORTED_TYPE: usize = 0x27;
const MANIFEST_RESOURCE: usize = 0x28;
const NESTED_CLASS: usize = 0x29;
const GENERIC_PARAM: usize = 0x2a;
const METHOD_SPEC: usize = 0x2b;
const GENERIC_PARAM_CONSTRAINT: usize = 0x2c;

const KNOWN_TABLES: usize = 0x2d;
const MAX_TABLES: usize = 64;

const HEAP_STRINGS_WIDE: u8 = 0x01;
const HEAP_GUID_WIDE: u8 = 0x02;
const HEAP_BLOB_WIDE: u8 = 0x04;
const HEAP_EXTRA_DATA: u8 = 0x40;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Coded {
    TypeDefOrRef,
    HasConstant,
    HasCustomAttribute,
    HasFieldMarshal,
    HasDeclSecurity,
    MemberRefParent,
    HasSemantics,
    MethodDefOrRef,
    MemberForwarded,
    Implementation,
    CustomAttributeType,
    ResolutionScope,
    TypeOrMethodDef,
}

impl Coded {
    fn tag_bits(self) -> u32 {
        match self {
            Coded::TypeDefOrRef => 2,
            Coded::HasConstant => 2,
            Coded::HasCustomAttribute => 5,
            Coded::HasFieldMarshal => 1,
            Coded::HasDeclSecurity => 2,
            Coded::MemberRefParent => 3,
            Coded::HasSemantics => 1,
            Coded::MethodDefOrRef => 1,
            Coded::MemberForwarded => 1,
            Coded::Implementation => 2,
            Coded::CustomAttributeType => 3,
            Coded::ResolutionScope => 2,
            Coded::TypeOrMethodDef => 1,
        }
    }

    /// Tables the index can refer to. Unused tag values are omitted.
    fn tables(self) -> &'static [usize] {
        match self {
            Coded::TypeDefOrRef => &[TYPE_DEF, TYPE_REF, TYPE_SPEC],
            Coded::HasConstant => &[FIELD, PARAM, PROPERTY],
            Coded::HasCustomAttribute => &[
                METHOD_DEF,
                FIELD,
                TYPE_REF,
                TYPE_DEF,
                PARAM,
                INTERFACE_IMPL,
                MEMBER_REF,
                MODULE,
                DECL_SECURITY,
                PROPERTY,
                EVENT,
                STAND_ALONE_SIG,
                MODULE_REF,
                TYPE_SPEC,
                ASSEMBLY,
                ASSEMBLY_REF,
                FILE,
                EXPORTED_TYPE,
                MANIFEST_RESOURCE,
                GENERIC_PARAM,
                GENERIC_PARAM_CONSTRAINT,
                METHOD_SPEC,
            ],
            Coded::HasFieldMarshal => &[FIELD, PARAM],
            Coded::HasDeclSecurity => &[TYPE_DEF, METHOD_DEF, ASSEMBLY],
            Coded::MemberRefParent => &[TYPE_DEF, TYPE_REF, MODULE_REF, METHOD_DEF, TYPE_SPEC],
            Coded::HasSemantics => &[EVENT, PROPERTY],
            Coded::MethodDefOrRef => &[METHOD_DEF, MEMBER_REF],
            Coded::MemberForwarded => &[FIELD, METHOD_DEF],
            Coded::Implementation => &[FILE, ASSEMBLY_REF, EXPORTED_TYPE],
            Coded::CustomAttributeType => &[METHOD_DEF, MEMBER_REF],
            Coded::ResolutionScope => &[MODULE, MODULE_REF, ASSEMBLY_REF, TYPE_REF],
            Coded::TypeOrMethodDef => &[TYPE_DEF, METHOD_DEF],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Column {
    Fixed(usize),
    Str,
    Guid,
    Blob,
    Table(usize),
    Coded(Coded),
}

use Column::{Blob, Fixed, Guid, Str, Table};

/// Column layout of every table defined by ECMA-335 partition II, section 22.
fn schema(table: usize) -> Option<&'static [Column]> {
    let columns: &'static [Column] = match table {
        MODULE => &[Fixed(2), Str, Guid, Guid, Guid],
        TYPE_REF => &[Column::Coded(Coded::ResolutionScope), Str, Str],
        TYPE_DEF => &[Fixed(4), Str, Str, Column::Coded(Coded::TypeDefOrRef), Table(FIELD), Table(METHOD_DEF)],
        FIELD_PTR => &[Table(FIELD)],
        FIELD => &[Fixed(2), Str, Blob],
        METHOD_PTR => &[Table(METHOD_DEF)],
        METHOD_DEF => &[Fixed(4), Fixed(2), Fixed(2), Str, Blob, Table(PARAM)],
        PARAM_PTR => &[Table(PARAM)],
        PARAM => &[Fixed(2), Fixed(2), Str],
        INTERFACE_IMPL => &[Table(TYPE_DEF), Column::Coded(Coded::TypeDefOrRef)],
        MEMBER_REF => &[Column::Coded(Coded::MemberRefParent), Str, Blob],
        CONSTANT => &[Fixed(2), Column::Coded(Coded::HasConstant), Blob],
        CUSTOM_ATTRIBUTE => &[Column::Coded(Coded::HasCustomAttribute), Column::Coded(Coded::CustomAttributeType), Blob],
        FIELD_MARSHAL => &[Column::Coded(Coded::HasFieldMarshal), Blob],
        DECL_SECURITY => &[Fixed(2), Column::Coded(Coded::HasDeclSecurity), Blob],
        CLASS_LAYOUT => &[Fixed(2), Fixed(4), Table(TYPE_DEF)],
        FIELD_LAYOUT => &[Fixed(4), Table(FIELD)],
        STAND_ALONE_SIG => &[Blob],
        EVENT_MAP => &[Table(TYPE_DEF), Table(EVENT)],
        EVENT_PTR => &[Table(EVENT)],
        EVENT => &[Fixed(2), Str, Column::Coded(Coded::TypeDefOrRef)],
        PROPERTY_MAP => &[Table(TYPE_DEF), Table(PROPERTY)],
        PROPERTY_PTR => &[Table(PROPERTY)],
        PROPERTY => &[Fixed(2), Str, Blob],
        METHOD_SEMANTICS => &[Fixed(2), Table(METHOD_DEF), Column::Coded(Coded::HasSemantics)],
        METHOD_IMPL => &[Table(TYPE_DEF), Column::Coded(Coded::MethodDefOrRef), Column::Coded(Coded::MethodDefOrRef)],
        MODULE_REF => &[Str],
        TYPE_SPEC => &[Blob],
        IMPL_MAP => &[Fixed(2), Column::Coded(Coded::MemberForwarded), Str, Table(MODULE_REF)],
        FIELD_RVA => &[Fixed(4), Table(FIELD)],
        ENC_LOG => &[Fixed(4), Fixed(4)],
        ENC_MAP => &[Fixed(4)],
        ASSEMBLY => &[Fixed(4), Fixed(2), Fixed(2), Fixed(2), Fixed(2), Fixed(4), Blob, Str, Str],
        ASSEMBLY_PROCESSOR => &[Fixed(4)],
        ASSEMBLY_OS => &[Fixed(4), Fixed(4), Fixed(4)],
        ASSEMBLY_REF => &[Fixed(2), Fixed(2), Fixed(2), Fixed(2), Fixed(4), Blob, Str, Str, Blob],
        ASSEMBLY_REF_PROCESSOR => &[Fixed(4), Table(ASSEMBLY_REF)],
        ASSEMBLY_REF_OS => &[Fixed(4), Fixed(4), Fixed(4), Table(ASSEMBLY_REF)],
        FILE => &[Fixed(4), Str, Blob],
        EXPORTED_TYPE => &[Fixed(4), Fixed(4), Str, Str, Column::Coded(Coded::Implementation)],
        MANIFEST_RESOURCE => &[Fixed(4), Fixed(4), Str, Column::Coded(Coded::Implementation)],
        NESTED_CLASS => &[Table(TYPE_DEF), Table(TYPE_DEF)],
        GENERIC_PARAM => &[Fixed(2), Fixed(2), Column::Coded(Coded::TypeOrMethodDef), Str],
        METHOD_SPEC => &[Column::Coded(Coded::MethodDefOrRef), Blob],
        GENERIC_PARAM_CONSTRAINT => &[Table(GENERIC_PARAM), Column::Coded(Coded::TypeDefOrRef)],
        _ => return None,
    };
    Some(columns)
}

/// Widths derived from the stream header.
#[derive(Clone, Debug)]
pub(crate) struct Widths {
    rows: [u32; MAX_TABLES],
    heap_sizes: u8,
}

impl Widths {
    pub(crate) fn new(rows: [u32; MAX_TABLES], heap_sizes: u8) -> Self {
        Self { rows, heap_sizes }
    }

    pub(crate) fn column(&self, column: Column) -> usize {
        let wide = |flag: u8| if self.heap_sizes & flag != 0 { 4 } else { 2 };
        match column {
            Column::Fixed(n) => n,
            Column::Str => wide(HEAP_STRINGS_WIDE),
            Column::Guid => wide(HEAP_GUID_WIDE),
            Column::Blob => wide(HEAP_BLOB_WIDE),
            Column::Table(table) => {
                if self.rows[table] < (1 << 16) {
                    2
                } else {
                    4
                }
            }
            Column::Coded(coded) => {
                let max_rows = coded
                    .tables()
                    .iter()
                    .map(|t| self.rows[*t])
                    .max()
                    .unwrap_or(0);
                if max_rows < (1u32 << (16 - coded.tag_bits())) {
                    2
                } else {
                    4
                }
            }
        }
    }

    pub(crate) fn row(&self, table: usize) -> usize {
        schema(table)
            .map(|columns| columns.iter().map(|c| self.column(*c)).sum())
            .unwrap_or(0)
    }
}

/// Parsed `#~` stream with the byte offset of every known table.
#[derive(Debug)]
pub(crate) struct TableStream<'a> {
    data: &'a [u8],
    widths: Widths,
    offsets: [usize; KNOWN_TABLES],
}

impl<'a> TableStream<'a> {
    pub(crate) fn parse(data: &'a [u8]) -> Result<Self> {
        let mut r = Reader::new(data);
        // Reserved, MajorVersion, MinorVersion
        r.skip(6)?;
        let heap_sizes = r.u8()?;
        let _reserved = r.u8()?;
        let valid = r.u64()?;
        let _sorted = r.u64()?;

        let mut rows = [0u32; MAX_TABLES];
        for (table, count) in rows.iter_mut().enumerate() {
            if valid & (1u64 << table) != 0 {
                *count = r.u32()?;
            }
        }
        if heap_sizes & HEAP_EXTRA_DATA != 0 {
            r.skip(4)?;
        }

        let widths = Widths::new(rows, heap_sizes);
        let mut offsets = [0usize; KNOWN_TABLES];
        let mut cursor = r.position();
        for (table, offset) in offsets.iter_mut().enumerate() {
            *offset = cursor;
            let size = (rows[table] as usize)
                .checked_mul(widths.row(table))
                .ok_or(Error::UnexpectedEof { offset: cursor })?;
            cursor = cursor
                .checked_add(size)
                .ok_or(Error::UnexpectedEof { offset: cursor })?;
        }
        if cursor > data.len() {
            return Err(Error::UnexpectedEof { offset: data.len() });
        }

        Ok(Self {
            data,
            widths,
            offsets,
        })
    }

    pub(crate) fn rows(&self, table: usize) -> u32 {
        self.widths.rows[table]
    }

    /// Value of `column` in 1-based `row` of `table`.
    pub(crate) fn cell(&self, table: usize, row: u32, column: usize) -> Result<u32> {
        let columns = schema(table).ok_or(Error::RowOutOfRange { table, row })?;
        if row == 0 || row > self.rows(table) || column >= columns.len() {
            return Err(Error::RowOutOfRange { table, row });
        }

        let row_start = self.offsets[table] + (row as usize - 1) * self.widths.row(table);
        let column_offset: usize = columns[..column]
            .iter()
            .map(|c| self.widths.column(*c))
            .sum();
        let width = self.widths.column(columns[column]);

        let mut r = Reader::at(self.data, row_start + column_offset)?;
        match width {
            1 => r.u8().map(u32::from),
            2 | 4 => r.index(width),
            _ => Err(Error::RowOutOfRange { table, row }),
        }
    }
}
