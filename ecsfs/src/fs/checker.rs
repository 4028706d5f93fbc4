// SPDX-License-Identifier: MIT

use alloc::collections::BTreeSet;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use log::warn;

pub use crate::core::checker::*;

use crate::core::errors::FsAllocatorError;
use crate::core::fat::FatEntry;
use crate::core::utils::{Bitmap, name_utils};
use crate::fs::{allocator::AllocationTable, constant::*, meta::*, types::*, volume::Volume};
use ecsio::{BLOCK_SIZE, BlockDevice, BlockIOStructExt};

/// One used directory slot with the outcome of its chain walk.
struct FileChain {
    name: String,
    size: u32,
    head: Option<u16>,
    blocks: Result<Vec<u16>, FsAllocatorError>,
}

/// Consistency checker for a mounted volume.
pub struct EcsChecker<'a, D: BlockDevice> {
    vol: &'a mut Volume<D>,
}

impl<'a, D: BlockDevice> EcsChecker<'a, D> {
    pub fn new(vol: &'a mut Volume<D>) -> Self {
        Self { vol }
    }

    fn walk_files(&self) -> Vec<FileChain> {
        self.vol
            .dir
            .raw_entries()
            .iter()
            .filter(|e| e.is_used())
            .map(|e| FileChain {
                name: name_utils::decode_name(&e.name).into_owned(),
                size: e.size(),
                head: e.first_block(),
                blocks: self.vol.table.chain(e.first_block()).collect(),
            })
            .collect()
    }

    fn check_boot(&mut self, rep: &mut VerifyReport) -> FsCheckerResult {
        let blocks = self.vol.dev.block_count();
        let sb: EcsSuperblock = self.vol.dev.read_struct(ECS_SUPERBLOCK_INDEX)?;

        match EcsMeta::from_superblock(&sb, blocks) {
            Ok(meta) if meta == self.vol.meta => {
                rep.push(Finding::info("SB.OK", format!("Superblock OK, {meta}")));
            }
            Ok(meta) => {
                rep.push(Finding::err(
                    "SB.MEM",
                    format!("Superblock {meta} differs from mounted geometry {}", self.vol.meta),
                ));
            }
            Err(e) => rep.push(Finding::err("SB.GEOM", format!("Superblock: {}", e.msg()))),
        }

        // on-disk table must match the in-memory copy
        let meta = self.vol.meta;
        match AllocationTable::load(&mut self.vol.dev, &meta) {
            Ok(disk) if disk.entries() == self.vol.table.entries() => {}
            Ok(_) => rep.push(Finding::err("FAT.SYNC", "Allocation table on disk differs from memory")),
            Err(e) => rep.push(Finding::err("FAT.READ", format!("Allocation table unreadable: {}", e.msg()))),
        }
        Ok(())
    }

    fn check_chains(&self, files: &[FileChain], rep: &mut VerifyReport) {
        let meta = &self.vol.meta;
        for f in files {
            let expected = (f.size as usize).div_ceil(BLOCK_SIZE).max(1);
            match (&f.blocks, f.head) {
                (_, None) if f.size > 0 => rep.push(Finding::err(
                    "CHAIN.NODATA",
                    format!("{:?}: size {} but no data block", f.name, f.size),
                )),
                (_, None) => {}
                (_, Some(head)) if !meta.is_valid_unit(head) => rep.push(Finding::err(
                    "CHAIN.RSV",
                    format!("{:?}: chain head {head} is not a data block", f.name),
                )),
                (Err(e), Some(head)) => rep.push(Finding::err(
                    "CHAIN.BROKEN",
                    format!("{:?}: chain from {head}: {}", f.name, e.msg()),
                )),
                (Ok(blocks), Some(_)) if blocks.iter().any(|&b| !meta.is_valid_unit(b)) => rep.push(Finding::err(
                    "CHAIN.RSV",
                    format!("{:?}: chain runs through a reserved entry", f.name),
                )),
                (Ok(blocks), Some(_)) if blocks.len() != expected => rep.push(Finding::err(
                    "CHAIN.LEN",
                    format!("{:?}: {} block(s) for {} byte(s), expected {expected}", f.name, blocks.len(), f.size),
                )),
                (Ok(_), Some(_)) => {}
            }
        }
    }

    fn check_crossref(&self, files: &[FileChain], rep: &mut VerifyReport) {
        let entries = self.vol.table.entries();
        let mut claimed = Bitmap::new(entries.len());

        for f in files {
            let Ok(blocks) = &f.blocks else { continue };
            for &b in blocks {
                if claimed.get(b as usize) {
                    rep.push(Finding::err(
                        "XREF.SHARED",
                        format!("Block {b} claimed more than once (last by {:?})", f.name),
                    ));
                }
                claimed.set(b as usize, true);
            }
        }

        match entries.first() {
            Some(FatEntry::EndOfChain) => {}
            Some(e) => rep.push(Finding::warn(
                "XREF.RSV",
                format!("Reserved entry 0 is {e:?}, expected end-of-chain"),
            )),
            None => {}
        }

        let leaked: Vec<usize> = (ECS_FIRST_DATA_UNIT as usize..entries.len())
            .filter(|&i| !entries[i].is_free() && !claimed.get(i))
            .collect();
        if !leaked.is_empty() {
            rep.push(Finding::warn(
                "XREF.LEAK",
                format!("{} block(s) in use but unreachable: {:?}", leaked.len(), leaked),
            ));
        }
    }

    fn check_root(&self, rep: &mut VerifyReport) {
        let mut seen = BTreeSet::new();
        for (slot, e) in self.vol.dir.raw_entries().iter().enumerate() {
            if !e.is_used() {
                continue;
            }
            if !e.name.contains(&0) {
                rep.push(Finding::err("ROOT.NUL", format!("Slot {slot}: name not NUL-terminated")));
            }
            let bytes = name_utils::name_bytes(&e.name);
            if core::str::from_utf8(bytes).is_err() {
                rep.push(Finding::warn("ROOT.UTF8", format!("Slot {slot}: name is not UTF-8")));
            }
            if !seen.insert(bytes) {
                rep.push(Finding::err(
                    "ROOT.DUP",
                    format!("Slot {slot}: duplicate name {:?}", name_utils::decode_name(&e.name)),
                ));
            }
        }
        rep.push(Finding::info(
            "ROOT.COUNT",
            format!("{} file(s), {} slot(s) free", seen.len(), self.vol.dir.free_slots()),
        ));
    }
}

impl<D: BlockDevice> FsChecker for EcsChecker<'_, D> {
    fn check(&mut self, phases: VerifyPhases) -> FsCheckerResult<VerifyReport> {
        let mut rep = VerifyReport::default();

        if phases.contains(VerifyPhases::BOOT) {
            self.check_boot(&mut rep)?;
        }

        let files = self.walk_files();
        if phases.contains(VerifyPhases::CHAIN) {
            self.check_chains(&files, &mut rep);
        }
        if phases.contains(VerifyPhases::CROSSREF) {
            self.check_crossref(&files, &mut rep);
        }
        if phases.contains(VerifyPhases::ROOT) {
            self.check_root(&mut rep);
        }

        if let Some(first) = rep.first_error() {
            warn!(
                "ecsfs: check found {} error(s), first: {} {}",
                rep.count(Severity::Error),
                first.code,
                first.msg
            );
        }
        Ok(rep)
    }
}

#[cfg(all(test, feature = "mem"))]
mod tests {
    use super::*;
    use crate::core::formatter::FsFormatter;
    use crate::fs::{
        formatter::{EcsFormatter, FormatOptions},
        limits::FsLimits,
    };
    use ecsio::prelude::*;

    fn mounted(data_blocks: u16) -> Volume<Disk<MemBlockIO>> {
        let opts = FormatOptions::new(data_blocks);
        let blocks = opts.geometry().unwrap().required_blocks();
        let mut disk = Disk::new(MemBlockIO::with_blocks(blocks)).unwrap();
        EcsFormatter::new(&mut disk, opts).format(false).unwrap();
        Volume::mount(disk, &FsLimits::default()).unwrap()
    }

    fn write_file(vol: &mut Volume<Disk<MemBlockIO>>, name: &str, len: usize) {
        vol.create(name).unwrap();
        let fh = vol.open(name).unwrap();
        assert_eq!(vol.write(fh, &alloc::vec![1u8; len]).unwrap(), len);
        vol.close(fh).unwrap();
    }

    #[test]
    fn test_clean_volume() {
        let mut vol = mounted(32);
        write_file(&mut vol, "a", 10);
        write_file(&mut vol, "b", 3 * BLOCK_SIZE + 1);
        vol.create("empty").unwrap();

        let rep = EcsChecker::new(&mut vol).check_all().unwrap();
        assert!(rep.ok(), "{rep}");
        assert_eq!(rep.count(Severity::Warn), 0);
    }

    #[test]
    fn test_shared_block_and_wrong_length() {
        let mut vol = mounted(32);
        write_file(&mut vol, "a", 10);
        write_file(&mut vol, "b", 10);

        // b now points at a's block
        let head = vol.dir.entry(0).first_block();
        vol.dir.entry_mut(1).set_first_block(head);
        vol.dir.entry_mut(1).set_size(5000);

        let rep = EcsChecker::new(&mut vol).check_all().unwrap();
        assert_eq!(rep.with_code("XREF.SHARED").count(), 1);
        assert_eq!(rep.with_code("CHAIN.LEN").count(), 1);
        // b's original block is no longer referenced
        assert_eq!(rep.with_code("XREF.LEAK").count(), 1);
    }

    #[test]
    fn test_size_without_data() {
        let mut vol = mounted(8);
        vol.create("ghost").unwrap();
        vol.dir.entry_mut(0).set_size(1);

        let rep = EcsChecker::new(&mut vol).check(VerifyPhases::CHAIN).unwrap();
        assert_eq!(rep.first_error().map(|f| f.code), Some("CHAIN.NODATA"));
    }

    #[test]
    fn test_chain_through_reserved_entry() {
        let mut vol = mounted(8);
        write_file(&mut vol, "a", 10);
        write_file(&mut vol, "b", 10);

        vol.dir.entry_mut(0).set_first_block(Some(ECS_RESERVED_ENTRY));
        // b's only block now links into entry 0
        let b_head = vol.dir.entry(1).first_block().unwrap();
        vol.table.force_entry(b_head, FatEntry::Next(ECS_RESERVED_ENTRY));
        vol.dir.entry_mut(1).set_size(5000);

        let rep = EcsChecker::new(&mut vol).check(VerifyPhases::CHAIN).unwrap();
        assert_eq!(rep.with_code("CHAIN.RSV").count(), 2);
        assert_eq!(rep.with_code("CHAIN.LEN").count(), 0);
    }

    #[test]
    fn test_duplicate_names() {
        let mut vol = mounted(8);
        vol.create("a").unwrap();
        vol.create("b").unwrap();
        let name = vol.dir.entry(0).name;
        vol.dir.entry_mut(1).name = name;

        let rep = EcsChecker::new(&mut vol).check(VerifyPhases::ROOT).unwrap();
        assert_eq!(rep.with_code("ROOT.DUP").count(), 1);
    }

    #[test]
    fn test_table_out_of_sync() {
        let mut vol = mounted(8);
        write_file(&mut vol, "a", 10);
        // clobber the table on disk only
        vol.dev.write_block(1, &[0u8; BLOCK_SIZE]).unwrap();

        let rep = EcsChecker::new(&mut vol).check(VerifyPhases::BOOT).unwrap();
        assert_eq!(rep.with_code("FAT.SYNC").count(), 1);
    }
}
