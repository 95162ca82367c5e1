//! Batch page operations
//!
//! Merge, split and rotate are thin loops over `get_pages` and the
//! container writer. The stream-level functions work on any seekable
//! streams; the file-level ones open the files and name the outputs.

use log::info;
use std::cell::RefCell;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Cursor, Read, Seek, Write};
use std::path::{Path, PathBuf};

use crate::io::byte_order::ByteOrder;
use crate::io::seekable::SeekableReader;
use crate::pages::container::ContainerWriter;
use crate::pages::page::Page;
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::reader::TiffReader;
use crate::utils::progress::ProgressTracker;

/// Settings shared by the write operations
#[derive(Clone)]
pub struct WriteOptions {
    /// Byte order of newly created containers
    pub byte_order: ByteOrder,
    /// Advanced once per written page
    pub progress: Option<ProgressTracker>,
}

impl Default for WriteOptions {
    fn default() -> Self {
        WriteOptions {
            byte_order: ByteOrder::LittleEndian,
            progress: None,
        }
    }
}

impl WriteOptions {
    fn container<W: Write + Seek>(&self, output: W) -> TiffResult<ContainerWriter<W>> {
        let container = ContainerWriter::new(output, self.byte_order)?;
        Ok(self.track(container))
    }

    fn track<W: Write + Seek>(&self, container: ContainerWriter<W>) -> ContainerWriter<W> {
        match &self.progress {
            Some(progress) => container.with_progress(progress.clone()),
            None => container,
        }
    }
}

/// Parses `source` and wraps each of its directories in a page
pub fn get_pages<R: SeekableReader>(source: &RefCell<R>) -> TiffResult<Vec<Page<'_, R>>> {
    let tiff = {
        let mut reader = source.borrow_mut();
        TiffReader::new().read(&mut *reader)?
    };

    Ok(tiff.ifds.into_iter()
        .map(|ifd| Page::new(ifd, source))
        .collect())
}

/// Writes pages into `output`
///
/// An empty stream receives a new container; a stream that already holds
/// one gets the pages appended after its last page.
pub fn write_pages<'a, R, W>(output: W, pages: Vec<Page<'a, R>>, options: &WriteOptions) -> TiffResult<W>
where
    R: SeekableReader + 'a,
    W: Read + Write + Seek,
{
    let mut container = options.track(ContainerWriter::open(output, options.byte_order)?);
    container.write_pages(pages)?;
    container.into_inner()
}

/// Writes all pages of every input, in order, into one new container
pub fn merge_pages<R, W>(inputs: Vec<R>, output: W, options: &WriteOptions) -> TiffResult<W>
where
    R: SeekableReader,
    W: Write + Seek,
{
    let mut container = options.container(output)?;

    for (index, input) in inputs.into_iter().enumerate() {
        let source = RefCell::new(input);
        let pages = get_pages(&source)?;
        info!("Merging {} page(s) from input #{}", pages.len(), index);

        if let Some(progress) = &options.progress {
            progress.inc_length(pages.len() as u64);
        }
        container.write_pages(pages)?;
    }

    container.into_inner()
}

/// Writes every page of `input` into a container of its own
pub fn split_pages<R: SeekableReader>(input: R, options: &WriteOptions) -> TiffResult<Vec<Vec<u8>>> {
    let source = RefCell::new(input);
    let pages = get_pages(&source)?;
    info!("Splitting {} page(s)", pages.len());

    let mut outputs = Vec::with_capacity(pages.len());
    for page in pages {
        let mut container = options.container(Cursor::new(Vec::new()))?;
        container.write_page(page)?;
        outputs.push(container.into_inner()?.into_inner());
    }

    Ok(outputs)
}

/// Rotates every page of `input` by `degree` and writes them to `output`
pub fn rotate_all_pages<R, W>(input: R, output: W, degree: i32, options: &WriteOptions) -> TiffResult<W>
where
    R: SeekableReader,
    W: Write + Seek,
{
    rotate(input, output, degree, None, options)
}

/// Rotates page `page_index` of `input` by `degree`; other pages are copied
pub fn rotate_page<R, W>(input: R, output: W, degree: i32, page_index: usize, options: &WriteOptions) -> TiffResult<W>
where
    R: SeekableReader,
    W: Write + Seek,
{
    rotate(input, output, degree, Some(page_index), options)
}

fn rotate<R, W>(input: R, output: W, degree: i32, page_index: Option<usize>, options: &WriteOptions) -> TiffResult<W>
where
    R: SeekableReader,
    W: Write + Seek,
{
    let source = RefCell::new(input);
    let mut pages = get_pages(&source)?;

    match page_index {
        Some(index) => {
            let count = pages.len();
            pages.get_mut(index)
                .ok_or(TiffError::PageIndexOutOfRange { index, count })?
                .rotate(degree)?;
        },
        None => {
            for page in pages.iter_mut() {
                page.rotate(degree)?;
            }
        },
    }

    let mut container = options.container(output)?;
    container.write_pages(pages)?;
    container.into_inner()
}

/// Merges the pages of several files into a new file at `output`
pub fn merge_files<P: AsRef<Path>, Q: AsRef<Path>>(inputs: &[P], output: Q, options: &WriteOptions) -> TiffResult<()> {
    let readers = inputs.iter()
        .map(|path| open_input(path.as_ref()))
        .collect::<TiffResult<Vec<_>>>()?;

    let input_paths: Vec<&Path> = inputs.iter().map(|path| path.as_ref()).collect();
    ensure_distinct_output(&input_paths, output.as_ref())?;

    let writer = BufWriter::new(File::create(output.as_ref())?);
    merge_pages(readers, writer, options)?;

    info!("Merged {} file(s) into {}", inputs.len(), output.as_ref().display());
    Ok(())
}

/// Writes each page of `input` to its own file in `output_dir`
///
/// Files are named by page number, starting at 1 and zero-padded to
/// `name_width` digits. Returns the created paths in page order.
pub fn split_file<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output_dir: Q,
    name_width: usize,
    options: &WriteOptions,
) -> TiffResult<Vec<PathBuf>> {
    let source = RefCell::new(open_input(input.as_ref())?);
    let pages = get_pages(&source)?;
    fs::create_dir_all(output_dir.as_ref())?;

    let mut outputs = Vec::with_capacity(pages.len());
    for (index, page) in pages.into_iter().enumerate() {
        let path = output_dir.as_ref().join(format!("{:0width$}.tif", index + 1, width = name_width));

        let mut container = options.container(BufWriter::new(File::create(&path)?))?;
        container.write_page(page)?;
        container.into_inner()?;

        outputs.push(path);
    }

    info!("Split {} into {} file(s)", input.as_ref().display(), outputs.len());
    Ok(outputs)
}

/// Rotates pages of the file at `input` into a new file at `output`
///
/// `page_index` selects a single page; None rotates all of them.
pub fn rotate_file<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    degree: i32,
    page_index: Option<usize>,
    options: &WriteOptions,
) -> TiffResult<()> {
    let reader = open_input(input.as_ref())?;
    ensure_distinct_output(&[input.as_ref()], output.as_ref())?;

    let writer = BufWriter::new(File::create(output.as_ref())?);
    rotate(reader, writer, degree, page_index, options)?;
    Ok(())
}

/// Number of pages in the file at `path`
pub fn count_pages<P: AsRef<Path>>(path: P) -> TiffResult<usize> {
    let mut reader = open_input(path.as_ref())?;
    Ok(TiffReader::new().read(&mut reader)?.ifd_count())
}

/// Fails if `output` names the same file as one of `inputs`
///
/// Creating the output truncates it, which would destroy an input that
/// has not been read yet.
fn ensure_distinct_output(inputs: &[&Path], output: &Path) -> TiffResult<()> {
    let output = match fs::canonicalize(output) {
        Ok(path) => path,
        // Nothing exists there yet
        Err(_) => return Ok(()),
    };

    for input in inputs {
        if fs::canonicalize(input)? == output {
            return Err(TiffError::GenericError(format!(
                "Output {} is also an input", output.display())));
        }
    }

    Ok(())
}

fn open_input(path: &Path) -> TiffResult<BufReader<File>> {
    let file = File::open(path)
        .map_err(|e| TiffError::GenericError(format!("Cannot open {}: {}", path.display(), e)))?;
    Ok(BufReader::with_capacity(1024 * 1024, file))
}
