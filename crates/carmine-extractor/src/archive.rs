//! Tarball scanning and unpacking.

use crate::error::{ExtractError, Result};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Metadata-relevant contents of a distribution tarball.
#[derive(Debug, Default)]
pub(crate) struct ScannedTarball {
    pub meta_json: Option<Vec<u8>>,
    pub meta_yml: Option<Vec<u8>>,
    pub mymeta_json: Option<Vec<u8>>,
    pub mymeta_yml: Option<Vec<u8>>,
    pub has_makefile_pl: bool,
    pub has_build_pl: bool,
}

/// Scan a tarball for metadata files and configure scripts.
///
/// Only entries exactly one directory deep (`topdir/name`) are considered;
/// metadata nested deeper belongs to bundled sub-distributions and is
/// ignored.
pub(crate) fn scan(tarball: &Path) -> Result<ScannedTarball> {
    let file = File::open(tarball).map_err(|e| ExtractError::io(tarball, &e))?;
    let mut archive = tar::Archive::new(GzDecoder::new(file));

    let mut scanned = ScannedTarball::default();
    for entry in archive
        .entries()
        .map_err(|e| ExtractError::Archive(e.to_string()))?
    {
        let mut entry = entry.map_err(|e| ExtractError::Archive(e.to_string()))?;
        let path = entry
            .path()
            .map_err(|e| ExtractError::Archive(e.to_string()))?
            .to_string_lossy()
            .into_owned();

        let mut parts = path.split('/');
        let (Some(_topdir), Some(name), None) = (parts.next(), parts.next(), parts.next()) else {
            continue;
        };

        match name {
            "META.json" => scanned.meta_json = Some(read_entry(&mut entry, name)?),
            "META.yml" => scanned.meta_yml = Some(read_entry(&mut entry, name)?),
            "MYMETA.json" => scanned.mymeta_json = Some(read_entry(&mut entry, name)?),
            "MYMETA.yml" => scanned.mymeta_yml = Some(read_entry(&mut entry, name)?),
            "Makefile.PL" => scanned.has_makefile_pl = true,
            "Build.PL" => scanned.has_build_pl = true,
            _ => {}
        }
    }

    Ok(scanned)
}

fn read_entry<R: Read>(entry: &mut tar::Entry<'_, R>, name: &str) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    entry
        .read_to_end(&mut buf)
        .map_err(|e| ExtractError::Archive(format!("reading {name}: {e}")))?;
    Ok(buf)
}

/// Unpack a tarball into `dest` and return the extracted root directory,
/// taken from the first path component of the first entry.
pub(crate) fn unpack(tarball: &Path, dest: &Path) -> Result<PathBuf> {
    let file = File::open(tarball).map_err(|e| ExtractError::io(tarball, &e))?;
    let mut archive = tar::Archive::new(GzDecoder::new(file));

    let mut root: Option<String> = None;
    for entry in archive
        .entries()
        .map_err(|e| ExtractError::Archive(e.to_string()))?
    {
        let mut entry = entry.map_err(|e| ExtractError::Archive(e.to_string()))?;
        if root.is_none() {
            let path = entry
                .path()
                .map_err(|e| ExtractError::Archive(e.to_string()))?;
            root = path
                .components()
                .next()
                .map(|c| c.as_os_str().to_string_lossy().into_owned());
        }
        // unpack_in refuses entries that would escape dest.
        entry
            .unpack_in(dest)
            .map_err(|e| ExtractError::Archive(e.to_string()))?;
    }

    let root = root.ok_or_else(|| ExtractError::Archive("empty tarball".to_string()))?;
    Ok(dest.join(root))
}
