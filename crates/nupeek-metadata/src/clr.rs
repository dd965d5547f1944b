use std::ops::Range;
use std::path::Path;

use crate::error::{Error, Result};
use crate::metadata::{MetadataRoot, StringHeap};
use crate::model::{MemberDefinition, MemberKind, ModuleMetadata, TypeDefinition};
use crate::pe::PeImage;
use crate::tables::{
    EVENT, EVENT_MAP, EVENT_PTR, FIELD, FIELD_PTR, METHOD_DEF, METHOD_PTR, PROPERTY, PROPERTY_MAP,
    PROPERTY_PTR, TYPE_DEF, TableStream,
};
use crate::MetadataReader;

// Column positions within the rows that are read.
const TYPE_DEF_NAME: usize = 1;
const TYPE_DEF_NAMESPACE: usize = 2;
const TYPE_DEF_FIELD_LIST: usize = 4;
const TYPE_DEF_METHOD_LIST: usize = 5;
const FIELD_NAME: usize = 1;
const METHOD_DEF_NAME: usize = 3;
const MAP_PARENT: usize = 0;
const MAP_LIST: usize = 1;
const EVENT_NAME: usize = 1;
const PROPERTY_NAME: usize = 1;

/// Reads type definitions straight from the ECMA-335 metadata of a PE image.
#[derive(Clone, Copy, Debug, Default)]
pub struct ClrMetadataReader;

impl ClrMetadataReader {
    pub fn new() -> Self {
        Self
    }

    /// Parse an in-memory image.
    pub fn parse(image: &[u8]) -> Result<ModuleMetadata> {
        let pe = PeImage::parse(image)?;
        let root = MetadataRoot::parse(pe.metadata()?)?;
        let tables = TableStream::parse(root.tables)?;
        let module = Module {
            tables,
            strings: StringHeap(root.strings),
        };

        Ok(ModuleMetadata {
            runtime_version: Some(root.version),
            types: module.types()?,
        })
    }
}

impl MetadataReader for ClrMetadataReader {
    fn read_module(&self, path: &Path) -> Result<ModuleMetadata> {
        let bytes = std::fs::read(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let module = Self::parse(&bytes)?;
        tracing::trace!(path = %path.display(), types = module.types.len(), "read module metadata");
        Ok(module)
    }
}

/// A member list owned by a row: a run of rows in `target`, possibly through `ptr`.
#[derive(Clone, Copy)]
struct MemberList {
    owner: usize,
    column: usize,
    target: usize,
    ptr: usize,
    name_column: usize,
    kind: MemberKind,
}

const FIELDS: MemberList = MemberList {
    owner: TYPE_DEF,
    column: TYPE_DEF_FIELD_LIST,
    target: FIELD,
    ptr: FIELD_PTR,
    name_column: FIELD_NAME,
    kind: MemberKind::Field,
};

const METHODS: MemberList = MemberList {
    owner: TYPE_DEF,
    column: TYPE_DEF_METHOD_LIST,
    target: METHOD_DEF,
    ptr: METHOD_PTR,
    name_column: METHOD_DEF_NAME,
    kind: MemberKind::Method,
};

const PROPERTIES: MemberList = MemberList {
    owner: PROPERTY_MAP,
    column: MAP_LIST,
    target: PROPERTY,
    ptr: PROPERTY_PTR,
    name_column: PROPERTY_NAME,
    kind: MemberKind::Property,
};

const EVENTS: MemberList = MemberList {
    owner: EVENT_MAP,
    column: MAP_LIST,
    target: EVENT,
    ptr: EVENT_PTR,
    name_column: EVENT_NAME,
    kind: MemberKind::Event,
};

struct Module<'a> {
    tables: TableStream<'a>,
    strings: StringHeap<'a>,
}

impl Module<'_> {
    fn types(&self) -> Result<Vec<TypeDefinition>> {
        let count = self.tables.rows(TYPE_DEF);
        let mut types = Vec::with_capacity(count as usize);

        for row in 1..=count {
            let name = self.string(TYPE_DEF, row, TYPE_DEF_NAME)?;
            let namespace = self.string(TYPE_DEF, row, TYPE_DEF_NAMESPACE)?;
            let mut ty = TypeDefinition::new(namespace, name);
            self.push_members(&mut ty, METHODS, row)?;
            self.push_members(&mut ty, FIELDS, row)?;
            types.push(ty);
        }

        for list in [PROPERTIES, EVENTS] {
            for map_row in 1..=self.tables.rows(list.owner) {
                let parent = self.tables.cell(list.owner, map_row, MAP_PARENT)?;
                let ty = parent
                    .checked_sub(1)
                    .and_then(|i| types.get_mut(i as usize))
                    .ok_or(Error::RowOutOfRange {
                        table: TYPE_DEF,
                        row: parent,
                    })?;
                self.push_members(ty, list, map_row)?;
            }
        }

        Ok(types)
    }

    fn push_members(&self, ty: &mut TypeDefinition, list: MemberList, owner_row: u32) -> Result<()> {
        for index in self.list_range(list, owner_row)? {
            let row = if self.tables.rows(list.ptr) > 0 {
                self.tables.cell(list.ptr, index, 0)?
            } else {
                index
            };
            let name = self.string(list.target, row, list.name_column)?;
            ty.members.push(MemberDefinition::new(list.kind, name));
        }
        Ok(())
    }

    /// Rows of `list.target` (or its pointer table) owned by `owner_row`.
    ///
    /// A list runs from the owner's start index up to the next owner's start index,
    /// or to the end of the target table for the last owner.
    fn list_range(&self, list: MemberList, owner_row: u32) -> Result<Range<u32>> {
        let indirect = self.tables.rows(list.ptr);
        let len = if indirect > 0 {
            indirect
        } else {
            self.tables.rows(list.target)
        };

        let start = self.tables.cell(list.owner, owner_row, list.column)?.max(1);
        let end = if owner_row < self.tables.rows(list.owner) {
            self.tables.cell(list.owner, owner_row + 1, list.column)?
        } else {
            len + 1
        };
        let end = end.min(len + 1);

        Ok(start..end.max(start))
    }

    fn string(&self, table: usize, row: u32, column: usize) -> Result<String> {
        let index = self.tables.cell(table, row, column)?;
        Ok(self.strings.get(index)?.to_string())
    }
}
