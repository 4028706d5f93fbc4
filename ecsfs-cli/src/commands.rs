// SPDX-License-Identifier: MIT

//! One function per subcommand. Each mounts the image, runs one operation and
//! unmounts, so every invocation leaves a consistent image behind.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, bail};
use ecsfs::fs::constant::ECS_NO_DATA;
use ecsfs::prelude::*;

use crate::config::Config;
use crate::utils::string::{pretty_bytes, printable};
use crate::{log_info, log_verbose};

type ImageFs = FileSystem<FileDisk>;

fn mount(image: &Path, cfg: &Config) -> anyhow::Result<ImageFs> {
    let mut fs = FileSystem::new(cfg.limits);
    fs.mount_path(image)
        .with_context(|| format!("mounting {}", image.display()))?;
    log_verbose!("Mounted {}", image.display());
    Ok(fs)
}

fn unmount(mut fs: ImageFs) -> anyhow::Result<()> {
    fs.unmount().context("unmounting")?;
    Ok(())
}

/// Opens `name`, runs `f` and closes the handle whatever `f` returned.
fn with_file<T>(
    fs: &mut ImageFs,
    name: &str,
    f: impl FnOnce(&mut ImageFs, FileHandle) -> FsResult<T>,
) -> anyhow::Result<T> {
    let fh = fs.open(name).with_context(|| format!("opening {name:?}"))?;
    let out = f(fs, fh);
    fs.close(fh)?;
    Ok(out?)
}

pub fn format(image: &Path, cfg: &Config, data_blocks: Option<u16>, full: bool) -> anyhow::Result<()> {
    let opts = data_blocks.map_or(cfg.format, FormatOptions::new);
    let meta = opts.geometry()?;
    let blocks = meta.required_blocks();

    let mut disk = FileDisk::create(image, blocks)
        .with_context(|| format!("creating {}", image.display()))?;
    EcsFormatter::new(&mut disk, opts).format(full)?;
    disk.close()?;

    log_info!(
        "Formatted {} ({}): {meta}",
        image.display(),
        pretty_bytes((blocks * BLOCK_SIZE) as u64)
    );
    Ok(())
}

pub fn info(image: &Path, cfg: &Config, out: &mut impl Write) -> anyhow::Result<()> {
    let fs = mount(image, cfg)?;
    let info = fs.info()?;
    write!(out, "{info}")?;
    log_verbose!(
        "Free space: {}",
        pretty_bytes((info.free_data_blocks * BLOCK_SIZE) as u64)
    );
    unmount(fs)
}

pub fn ls(image: &Path, cfg: &Config, out: &mut impl Write) -> anyhow::Result<()> {
    let fs = mount(image, cfg)?;
    writeln!(out, "FS Ls:")?;
    for entry in fs.list()? {
        writeln!(
            out,
            "file: {}, size: {}, data_blk: {}",
            entry.name,
            entry.size,
            entry.first_block.unwrap_or(ECS_NO_DATA)
        )?;
    }
    unmount(fs)
}

pub fn create(image: &Path, cfg: &Config, name: &str) -> anyhow::Result<()> {
    let mut fs = mount(image, cfg)?;
    fs.create(name).with_context(|| format!("creating {name:?}"))?;
    log_info!("Created {name:?}");
    unmount(fs)
}

pub fn remove(image: &Path, cfg: &Config, name: &str) -> anyhow::Result<()> {
    let mut fs = mount(image, cfg)?;
    fs.delete(name).with_context(|| format!("deleting {name:?}"))?;
    log_info!("Deleted {name:?}");
    unmount(fs)
}

/// Copies a host file into the volume as a new file.
pub fn add(image: &Path, cfg: &Config, host: &Path, name: Option<&str>) -> anyhow::Result<()> {
    let name = match name {
        Some(name) => name.to_owned(),
        None => host
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("no usable file name in {}", host.display()))?
            .to_owned(),
    };
    let data = fs::read(host).with_context(|| format!("reading {}", host.display()))?;

    let mut fs = mount(image, cfg)?;
    fs.create(&name).with_context(|| format!("creating {name:?}"))?;
    let written = with_file(&mut fs, &name, |fs, fh| fs.write(fh, &data))
        .with_context(|| format!("writing {name:?}"))?;
    unmount(fs)?;

    if written < data.len() {
        bail!("volume full: wrote {written} of {} byte(s) to {name:?}", data.len());
    }
    log_info!("Added {name:?} ({})", pretty_bytes(written as u64));
    Ok(())
}

pub fn cat(image: &Path, cfg: &Config, name: &str, out: &mut impl Write) -> anyhow::Result<()> {
    let mut fs = mount(image, cfg)?;
    let mut content = Vec::new();
    with_file(&mut fs, name, |fs, fh| {
        let mut buf = [0u8; BLOCK_SIZE];
        loop {
            let n = fs.read(fh, &mut buf)?;
            if n == 0 {
                return Ok(());
            }
            content.extend_from_slice(&buf[..n]);
        }
    })
    .with_context(|| format!("reading {name:?}"))?;
    unmount(fs)?;

    out.write_all(&content)?;
    out.flush()?;
    Ok(())
}

pub fn stat(image: &Path, cfg: &Config, name: &str, out: &mut impl Write) -> anyhow::Result<()> {
    let fs = mount(image, cfg)?;
    let size = fs.stat_by_name(name).with_context(|| format!("stat {name:?}"))?;
    writeln!(out, "Size of file '{name}' is {size} bytes")?;
    unmount(fs)
}

/// Writes `text` into an existing file at `offset`.
pub fn write(image: &Path, cfg: &Config, name: &str, offset: u64, text: &str) -> anyhow::Result<()> {
    let mut fs = mount(image, cfg)?;
    let written = with_file(&mut fs, name, |fs, fh| {
        fs.seek(fh, offset)?;
        fs.write(fh, text.as_bytes())
    })
    .with_context(|| format!("writing {name:?} at {offset}"))?;
    unmount(fs)?;

    if written < text.len() {
        bail!("volume full: wrote {written} of {} byte(s)", text.len());
    }
    log_verbose!("Wrote {:?} to {name:?} at {offset}", printable(text.as_bytes()));
    Ok(())
}

pub fn check(image: &Path, cfg: &Config, verbose: bool, out: &mut impl Write) -> anyhow::Result<()> {
    let mut fs = mount(image, cfg)?;
    let rep = fs.check(VerifyPhases::ALL)?;
    unmount(fs)?;

    if verbose {
        write!(out, "{rep}")?;
    } else {
        write!(out, "{}", rep.problems())?;
    }
    if rep.has_error() {
        bail!("{} error(s) found", rep.count(Severity::Error));
    }
    log_info!("Volume is consistent");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn image(data_blocks: u16) -> (TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("disk.fs");
        format(&path, &Config::default(), Some(data_blocks), false).unwrap();
        (dir, path)
    }

    fn output(f: impl FnOnce(&mut Vec<u8>) -> anyhow::Result<()>) -> String {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_format_and_info() {
        let (_dir, path) = image(5);
        let text = output(|out| info(&path, &Config::default(), out));
        assert!(text.starts_with("FS Info:\n"));
        assert!(text.contains("data_blk_count=5\n"));
        assert!(text.contains("fat_free_ratio=4/5\n"));
    }

    #[test]
    fn test_add_cat_ls() {
        let (dir, path) = image(16);
        let cfg = Config::default();
        let host = dir.path().join("hello.txt");
        let body = "hello world\n".repeat(500);
        fs::write(&host, &body).unwrap();

        add(&path, &cfg, &host, None).unwrap();
        assert_eq!(output(|out| cat(&path, &cfg, "hello.txt", out)), body);

        let listing = output(|out| ls(&path, &cfg, out));
        assert_eq!(listing, format!("FS Ls:\nfile: hello.txt, size: {}, data_blk: 1\n", body.len()));
    }

    #[test]
    fn test_write_at_offset() {
        let (_dir, path) = image(8);
        let cfg = Config::default();
        create(&path, &cfg, "f").unwrap();
        write(&path, &cfg, "f", 0, "hello world").unwrap();
        write(&path, &cfg, "f", 6, "rusty").unwrap();

        assert_eq!(output(|out| cat(&path, &cfg, "f", out)), "hello rusty");
        assert!(write(&path, &cfg, "f", 100, "x").is_err());
        assert_eq!(output(|out| stat(&path, &cfg, "f", out)), "Size of file 'f' is 11 bytes\n");
    }

    #[test]
    fn test_remove_and_missing() {
        let (_dir, path) = image(8);
        let cfg = Config::default();
        create(&path, &cfg, "gone").unwrap();
        remove(&path, &cfg, "gone").unwrap();
        assert!(remove(&path, &cfg, "gone").is_err());
        assert!(cat(&path, &cfg, "gone", &mut Vec::new()).is_err());
        assert_eq!(output(|out| ls(&path, &cfg, out)), "FS Ls:\n");
    }

    #[test]
    fn test_add_to_full_volume_fails() {
        let (dir, path) = image(3);
        let host = dir.path().join("big.bin");
        fs::write(&host, vec![7u8; 3 * BLOCK_SIZE]).unwrap();

        let err = add(&path, &Config::default(), &host, Some("big")).unwrap_err();
        assert!(err.to_string().contains("volume full"));
        // the prefix that fit is kept
        let text = output(|out| stat(&path, &Config::default(), "big", out));
        assert_eq!(text, format!("Size of file 'big' is {} bytes\n", 2 * BLOCK_SIZE));
    }

    #[test]
    fn test_check_clean_image() {
        let (_dir, path) = image(8);
        let cfg = Config::default();
        create(&path, &cfg, "a").unwrap();
        write(&path, &cfg, "a", 0, "data").unwrap();
        check(&path, &cfg, false, &mut Vec::new()).unwrap();
    }

    #[test]
    fn test_limits_from_config() {
        let (_dir, path) = image(8);
        let cfg = Config::default().with_overrides(Some(1), None);
        create(&path, &cfg, "one").unwrap();
        assert!(create(&path, &cfg, "two").is_err());
    }

    #[test]
    fn test_mount_missing_image() {
        let dir = tempfile::tempdir().unwrap();
        assert!(info(&dir.path().join("nope.fs"), &Config::default(), &mut Vec::new()).is_err());
    }
}
