use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use tracing::debug;

use crate::common::config::{FILE_HEADER_SIZE, PAGE_SIZE};
use crate::common::PageNumber;
use crate::error::{Error, Result};

/// `DiskManager` owns a single page file: an 8-byte header
/// (`totalPages:i32`, `currentPagePos:i32`) followed by `totalPages`
/// fixed-size pages. It performs the reading and writing of pages to and
/// from disk, with no caching of its own — every call here is an OS I/O.
pub struct DiskManager {
    file: Option<File>,
    file_name: String,
    total_pages: i32,
    current_page_pos: i32,
}

fn page_offset(page_num: PageNumber) -> u64 {
    FILE_HEADER_SIZE as u64 + page_num as u64 * PAGE_SIZE as u64
}

impl DiskManager {
    /// Creates (or truncates) the page file, writing the initial header
    /// (`totalPages = 1`, `currentPagePos = 0`) and one zero-filled page.
    pub fn create_page_file(file_name: &str) -> Result<()> {
        let mut file = File::create(file_name).map_err(|e| Error::WriteFailed {
            detail: format!("creating {file_name}: {e}"),
        })?;

        file.write_all(&1i32.to_ne_bytes())?;
        file.write_all(&0i32.to_ne_bytes())?;
        file.write_all(&[0u8; PAGE_SIZE])?;
        file.flush()?;
        Ok(())
    }

    /// Opens an existing page file for read+write and populates the
    /// in-memory handle from its header. `currentPagePos` is always reset
    /// to `0` on open — the on-disk copy of that field is write-only
    /// bookkeeping, never read back.
    pub fn open_page_file(file_name: &str) -> Result<Self> {
        if !Path::new(file_name).exists() {
            return Err(Error::FileNotFound {
                path: file_name.to_string(),
            });
        }
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(file_name)
            .map_err(|_| Error::FileNotFound {
                path: file_name.to_string(),
            })?;

        file.seek(SeekFrom::Start(0))?;
        let mut buf = [0u8; 4];
        file.read_exact(&mut buf)?;
        let total_pages = i32::from_ne_bytes(buf);

        Ok(Self {
            file: Some(file),
            file_name: file_name.to_string(),
            total_pages,
            current_page_pos: 0,
        })
    }

    /// Releases the OS handle and clears the fields. Idempotent: calling
    /// this again on an already-closed handle returns `FileHandleNotInit`.
    pub fn close(&mut self) -> Result<()> {
        if self.file.take().is_none() {
            return Err(Error::FileHandleNotInit);
        }
        self.current_page_pos = 0;
        Ok(())
    }

    /// Removes the page file from disk.
    pub fn destroy_page_file(file_name: &str) -> Result<()> {
        std::fs::remove_file(file_name).map_err(|_| Error::FileNotFound {
            path: file_name.to_string(),
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn total_pages(&self) -> i32 {
        self.total_pages
    }

    pub fn current_page_pos(&self) -> i32 {
        self.current_page_pos
    }

    fn file_mut(&mut self) -> Result<&mut File> {
        self.file.as_mut().ok_or(Error::FileHandleNotInit)
    }

    /// Reads `pageNum` into `dest`, setting `currentPagePos = pageNum`.
    pub fn read_block(&mut self, page_num: PageNumber, dest: &mut [u8; PAGE_SIZE]) -> Result<()> {
        if page_num < 0 || page_num >= self.total_pages {
            return Err(Error::ReadNonExistingPage { page: page_num });
        }
        let offset = page_offset(page_num);
        let file = self.file_mut()?;
        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(dest)?;
        self.current_page_pos = page_num;
        Ok(())
    }

    pub fn read_first_block(&mut self, dest: &mut [u8; PAGE_SIZE]) -> Result<()> {
        self.read_block(0, dest)
    }

    pub fn read_previous_block(&mut self, dest: &mut [u8; PAGE_SIZE]) -> Result<()> {
        self.read_block(self.current_page_pos - 1, dest)
    }

    pub fn read_current_block(&mut self, dest: &mut [u8; PAGE_SIZE]) -> Result<()> {
        self.read_block(self.current_page_pos, dest)
    }

    pub fn read_next_block(&mut self, dest: &mut [u8; PAGE_SIZE]) -> Result<()> {
        self.read_block(self.current_page_pos + 1, dest)
    }

    pub fn read_last_block(&mut self, dest: &mut [u8; PAGE_SIZE]) -> Result<()> {
        self.read_block(self.total_pages - 1, dest)
    }

    /// Writes `src` at `pageNum`, growing the file first if necessary.
    /// After success, `currentPagePos = pageNum + 1` — writes advance past
    /// the page written, reads land on it; this asymmetry is preserved to
    /// match the original's observable semantics.
    pub fn write_block(&mut self, page_num: PageNumber, src: &[u8; PAGE_SIZE]) -> Result<()> {
        if page_num >= self.total_pages {
            self.ensure_capacity(page_num + 1)?;
        }
        let offset = page_offset(page_num);
        let file = self.file_mut()?;
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(src)?;
        file.flush()?;
        self.current_page_pos = page_num + 1;
        Ok(())
    }

    pub fn write_current_block(&mut self, src: &[u8; PAGE_SIZE]) -> Result<()> {
        self.write_block(self.current_page_pos, src)
    }

    /// Appends one zero-filled page, bumping `totalPages` both in memory
    /// and in the on-disk header, and sets `currentPagePos` to the page
    /// just written.
    pub fn append_empty_block(&mut self) -> Result<()> {
        let new_page_num = self.total_pages;
        {
            let file = self.file_mut()?;
            file.seek(SeekFrom::End(0))?;
            file.write_all(&[0u8; PAGE_SIZE])?;
        }
        self.total_pages += 1;
        self.current_page_pos = new_page_num;

        let total_pages = self.total_pages;
        let file = self.file_mut()?;
        file.seek(SeekFrom::Start(0))?;
        file.write_all(&total_pages.to_ne_bytes())?;
        file.flush()?;
        debug!(total_pages, "appended empty page");
        Ok(())
    }

    /// Grows the file with empty pages until `totalPages >= n`. Idempotent
    /// for `n <= totalPages`.
    pub fn ensure_capacity(&mut self, n: i32) -> Result<()> {
        while self.total_pages < n {
            self.append_empty_block()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    fn temp_db_path(dir: &TempDir) -> String {
        dir.path().join("test.db").to_str().unwrap().to_string()
    }

    #[test]
    fn create_and_open_has_one_page() {
        let dir = TempDir::new("tupledb-storage").unwrap();
        let path = temp_db_path(&dir);
        DiskManager::create_page_file(&path).unwrap();
        let dm = DiskManager::open_page_file(&path).unwrap();
        assert_eq!(dm.total_pages(), 1);
        assert_eq!(dm.current_page_pos(), 0);
    }

    #[test]
    fn write_then_read_round_trips_bytes() {
        let dir = TempDir::new("tupledb-storage").unwrap();
        let path = temp_db_path(&dir);
        DiskManager::create_page_file(&path).unwrap();
        let mut dm = DiskManager::open_page_file(&path).unwrap();

        let mut src = [0u8; PAGE_SIZE];
        src[..5].copy_from_slice(b"hello");
        dm.write_block(0, &src).unwrap();

        let mut dst = [0u8; PAGE_SIZE];
        dm.read_block(0, &mut dst).unwrap();
        assert_eq!(src, dst);
    }

    #[test]
    fn append_empty_block_grows_total_pages_by_one() {
        let dir = TempDir::new("tupledb-storage").unwrap();
        let path = temp_db_path(&dir);
        DiskManager::create_page_file(&path).unwrap();
        let mut dm = DiskManager::open_page_file(&path).unwrap();

        assert_eq!(dm.total_pages(), 1);
        dm.append_empty_block().unwrap();
        assert_eq!(dm.total_pages(), 2);
        assert_eq!(dm.current_page_pos(), 1);

        drop(dm);
        let reopened = DiskManager::open_page_file(&path).unwrap();
        assert_eq!(reopened.total_pages(), 2);
    }

    #[test]
    fn ensure_capacity_is_idempotent() {
        let dir = TempDir::new("tupledb-storage").unwrap();
        let path = temp_db_path(&dir);
        DiskManager::create_page_file(&path).unwrap();
        let mut dm = DiskManager::open_page_file(&path).unwrap();

        dm.ensure_capacity(5).unwrap();
        assert_eq!(dm.total_pages(), 5);
        dm.ensure_capacity(3).unwrap();
        assert_eq!(dm.total_pages(), 5);
        dm.ensure_capacity(5).unwrap();
        assert_eq!(dm.total_pages(), 5);
    }

    #[test]
    fn write_block_beyond_total_pages_grows_the_file() {
        let dir = TempDir::new("tupledb-storage").unwrap();
        let path = temp_db_path(&dir);
        DiskManager::create_page_file(&path).unwrap();
        let mut dm = DiskManager::open_page_file(&path).unwrap();

        let src = [7u8; PAGE_SIZE];
        dm.write_block(4, &src).unwrap();
        assert_eq!(dm.total_pages(), 5);

        let mut dst = [0u8; PAGE_SIZE];
        dm.read_block(4, &mut dst).unwrap();
        assert_eq!(src, dst);
    }

    #[test]
    fn read_beyond_total_pages_fails() {
        let dir = TempDir::new("tupledb-storage").unwrap();
        let path = temp_db_path(&dir);
        DiskManager::create_page_file(&path).unwrap();
        let mut dm = DiskManager::open_page_file(&path).unwrap();

        let mut dst = [0u8; PAGE_SIZE];
        let err = dm.read_block(3, &mut dst).unwrap_err();
        assert!(matches!(err, Error::ReadNonExistingPage { page: 3 }));
    }

    #[test]
    fn close_is_idempotent_and_rejects_double_close() {
        let dir = TempDir::new("tupledb-storage").unwrap();
        let path = temp_db_path(&dir);
        DiskManager::create_page_file(&path).unwrap();
        let mut dm = DiskManager::open_page_file(&path).unwrap();

        dm.close().unwrap();
        let err = dm.close().unwrap_err();
        assert!(matches!(err, Error::FileHandleNotInit));
    }

    #[test]
    fn open_missing_file_fails() {
        let dir = TempDir::new("tupledb-storage").unwrap();
        let path = temp_db_path(&dir);
        let err = DiskManager::open_page_file(&path).unwrap_err();
        assert!(matches!(err, Error::FileNotFound { .. }));
    }

    #[test]
    fn destroy_removes_the_file() {
        let dir = TempDir::new("tupledb-storage").unwrap();
        let path = temp_db_path(&dir);
        DiskManager::create_page_file(&path).unwrap();
        DiskManager::destroy_page_file(&path).unwrap();
        assert!(!Path::new(&path).exists());
    }
}
