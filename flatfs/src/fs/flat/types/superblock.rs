// SPDX-License-Identifier: MIT

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::fs::flat::{constant::*, meta::FlatMeta};

/// Identifies a formatted volume.
#[derive(IntoBytes, FromBytes, KnownLayout, Immutable, Copy, Clone, Debug)]
#[repr(C, packed)]
pub struct FlatHeader {
    pub magic: [u8; 4],
    pub version: u8,
}

impl FlatHeader {
    pub fn current() -> Self {
        Self {
            magic: FLAT_MAGIC,
            version: FLAT_VERSION,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.magic == FLAT_MAGIC && self.version == FLAT_VERSION
    }
}

/// On-disk superblock at offset 0. Sizes are stored little-endian.
#[derive(IntoBytes, FromBytes, KnownLayout, Immutable, Copy, Clone, Debug)]
#[repr(C, packed)]
pub struct FlatSuperBlock {
    pub header: FlatHeader,
    file_table_size: u32,
    free_bitmap_size: u32,
}

impl FlatSuperBlock {
    pub fn from_meta(meta: &FlatMeta) -> Self {
        Self {
            header: FlatHeader::current(),
            file_table_size: meta.table_size.to_le(),
            free_bitmap_size: meta.bitmap_size.to_le(),
        }
    }

    #[inline]
    pub fn file_table_size(&self) -> u32 {
        let size = self.file_table_size;
        u32::from_le(size)
    }

    #[inline]
    pub fn free_bitmap_size(&self) -> u32 {
        let size = self.free_bitmap_size;
        u32::from_le(size)
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        let header = self.header;
        header.is_valid()
    }

    /// `true` if the stored region sizes describe `meta`.
    pub fn matches(&self, meta: &FlatMeta) -> bool {
        self.file_table_size() == meta.table_size && self.free_bitmap_size() == meta.bitmap_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_superblock_layout() {
        assert_eq!(core::mem::size_of::<FlatHeader>(), 5);
        assert_eq!(core::mem::size_of::<FlatSuperBlock>(), FLAT_SUPERBLOCK_SIZE);

        let meta = FlatMeta::new(64, 16, 4).unwrap();
        let sb = FlatSuperBlock::from_meta(&meta);
        let bytes = sb.as_bytes();

        assert_eq!(&bytes[0..4], b"MYFS");
        assert_eq!(bytes[4], 0x03);
        assert_eq!(&bytes[5..9], &272u32.to_le_bytes());
        assert_eq!(&bytes[9..13], &2u32.to_le_bytes());
        assert_eq!(sb.file_table_size(), 272);
        assert_eq!(sb.free_bitmap_size(), 2);

        assert!(sb.is_valid());
        assert!(sb.matches(&meta));
        assert!(!sb.matches(&FlatMeta::new(64, 32, 4).unwrap()));
    }

    #[test]
    fn test_header_validation() {
        let mut raw = [0u8; FLAT_SUPERBLOCK_SIZE];
        raw[..4].copy_from_slice(b"MYFS");
        raw[4] = 0x02;
        let sb = FlatSuperBlock::read_from_bytes(&raw).unwrap();
        assert!(!sb.is_valid());

        let blank = FlatSuperBlock::read_from_bytes(&[0u8; FLAT_SUPERBLOCK_SIZE]).unwrap();
        assert!(!blank.is_valid());
    }
}
