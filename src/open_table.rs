use std::fmt;
use std::path::PathBuf;

use crate::block::FileId;
use crate::error::{HashFileError, Result};
use crate::layout::HashFileHeader;

/// Opaque descriptor of an open hash file, an index into the [OpenFileTable]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexDesc(usize);

impl IndexDesc {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl From<usize> for IndexDesc {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

impl fmt::Display for IndexDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An open hash file: the block file handle plus its header, which never
/// changes after creation
#[derive(Debug, Clone)]
pub struct OpenIndex {
    pub file: FileId,
    pub header: HashFileHeader,
    pub path: PathBuf,
}

/// Fixed capacity table of open hash files
#[derive(Debug)]
pub struct OpenFileTable {
    slots: Vec<Option<OpenIndex>>,
}

impl OpenFileTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Binds the first free slot
    pub fn bind(&mut self, index: OpenIndex) -> Result<IndexDesc> {
        let capacity = self.capacity();
        let (position, slot) = self
            .slots
            .iter_mut()
            .enumerate()
            .find(|(_, slot)| slot.is_none())
            .ok_or(HashFileError::Capacity { capacity })?;
        *slot = Some(index);
        Ok(IndexDesc(position))
    }

    pub fn get(&self, desc: IndexDesc) -> Result<&OpenIndex> {
        self.slots
            .get(desc.0)
            .and_then(Option::as_ref)
            .ok_or(HashFileError::InvalidHandle(desc))
    }

    pub fn unbind(&mut self, desc: IndexDesc) -> Result<OpenIndex> {
        self.slots
            .get_mut(desc.0)
            .and_then(Option::take)
            .ok_or(HashFileError::InvalidHandle(desc))
    }

    /// Descriptors of every bound slot, in slot order
    pub fn descriptors(&self) -> Vec<IndexDesc> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(position, _)| IndexDesc(position))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(file: u32) -> OpenIndex {
        OpenIndex {
            file: FileId(file),
            header: HashFileHeader::new(4).unwrap(),
            path: PathBuf::from(format!("file{file}.db")),
        }
    }

    #[test]
    fn test_bind_uses_first_free_slot() {
        let mut table = OpenFileTable::new(3);
        assert_eq!(table.bind(entry(10)).unwrap(), IndexDesc(0));
        assert_eq!(table.bind(entry(11)).unwrap(), IndexDesc(1));
        assert_eq!(table.bind(entry(12)).unwrap(), IndexDesc(2));

        let freed = table.unbind(IndexDesc(1)).unwrap();
        assert_eq!(freed.file, FileId(11));
        assert_eq!(table.bind(entry(13)).unwrap(), IndexDesc(1));
        assert_eq!(table.get(IndexDesc(1)).unwrap().file, FileId(13));
    }

    #[test]
    fn test_capacity_error_keeps_entries() {
        let mut table = OpenFileTable::new(2);
        table.bind(entry(1)).unwrap();
        table.bind(entry(2)).unwrap();

        assert!(matches!(
            table.bind(entry(3)),
            Err(HashFileError::Capacity { capacity: 2 })
        ));
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(IndexDesc(0)).unwrap().file, FileId(1));
        assert_eq!(table.get(IndexDesc(1)).unwrap().file, FileId(2));
    }

    #[test]
    fn test_invalid_handles() {
        let mut table = OpenFileTable::new(2);
        assert!(table.is_empty());
        assert!(matches!(
            table.get(IndexDesc(0)),
            Err(HashFileError::InvalidHandle(_))
        ));
        assert!(matches!(
            table.get(IndexDesc(7)),
            Err(HashFileError::InvalidHandle(_))
        ));

        let desc = table.bind(entry(1)).unwrap();
        table.unbind(desc).unwrap();
        assert!(matches!(
            table.unbind(desc),
            Err(HashFileError::InvalidHandle(_))
        ));
        assert!(table.descriptors().is_empty());
    }
}
