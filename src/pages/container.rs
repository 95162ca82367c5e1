//! Multi-page container writer
//!
//! Pages are written one after another into an append-only stream. Exactly
//! one next-directory pointer is open at any time: the header's first-IFD
//! field for an empty container, otherwise the zero that follows the last
//! written directory. Each page patches the open pointer with its own
//! directory offset and opens a new one behind itself.

use log::{debug, info};
use std::io::{Cursor, Read, SeekFrom};

use crate::io::byte_order::ByteOrder;
use crate::io::seekable::{SeekableReader, SeekableWriter};
use crate::pages::page::Page;
use crate::tiff::constants::header;
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::validation::to_u32;
use crate::tiff::writer::TiffWriter;
use crate::utils::progress::ProgressTracker;

/// Writes pages into one TIFF container
pub struct ContainerWriter<W: SeekableWriter> {
    output: W,
    writer: TiffWriter,
    /// Position of the open next-directory pointer
    placeholder: u64,
    pages_written: usize,
    progress: Option<ProgressTracker>,
}

impl<W: SeekableWriter> ContainerWriter<W> {
    /// Starts a new container at the beginning of `output`
    ///
    /// Writes the header and opens the first-directory pointer.
    pub fn new(mut output: W, byte_order: ByteOrder) -> TiffResult<Self> {
        let position = output.stream_position()?;
        if position != 0 {
            return Err(TiffError::InvalidContainer(format!(
                "a new container must start at position 0, stream is at {}", position)));
        }

        let writer = TiffWriter::new(byte_order);
        writer.write_header(&mut output)?;
        let placeholder = output.stream_position()?;
        writer.write_u32(&mut output, 0)?;

        debug!("Started {} container, first IFD pointer at {}", byte_order.name(), placeholder);
        Ok(ContainerWriter {
            output,
            writer,
            placeholder,
            pages_written: 0,
            progress: None,
        })
    }

    /// Advances `tracker` once per written page
    pub fn with_progress(mut self, tracker: ProgressTracker) -> Self {
        self.progress = Some(tracker);
        self
    }

    /// Byte order of the container
    pub fn byte_order(&self) -> ByteOrder {
        self.writer.byte_order()
    }

    /// Number of pages written through this writer
    pub fn pages_written(&self) -> usize {
        self.pages_written
    }

    /// Writes one page and links it into the directory chain
    ///
    /// Returns the offset of the page's directory. If the page cannot be
    /// written, the open pointer stays where it was.
    pub fn write_page<R: SeekableReader>(&mut self, page: Page<'_, R>) -> TiffResult<u64> {
        let ifd_offset = page.write(&mut self.output, &self.writer)?;

        self.writer.patch_u32(&mut self.output, self.placeholder, to_u32(ifd_offset)?)?;
        self.placeholder = self.output.stream_position()?;
        self.writer.write_u32(&mut self.output, 0)?;

        self.pages_written += 1;
        if let Some(progress) = &self.progress {
            progress.increment(1);
        }

        debug!("Linked directory at {}, next IFD pointer at {}", ifd_offset, self.placeholder);
        Ok(ifd_offset)
    }

    /// Writes pages in order
    pub fn write_pages<'a, R, I>(&mut self, pages: I) -> TiffResult<()>
    where
        R: SeekableReader + 'a,
        I: IntoIterator<Item = Page<'a, R>>,
    {
        for page in pages {
            self.write_page(page)?;
        }
        Ok(())
    }

    /// Flushes and returns the output stream
    pub fn into_inner(mut self) -> TiffResult<W> {
        self.output.flush()?;
        info!("Finished container with {} new page(s)", self.pages_written);
        Ok(self.output)
    }
}

impl<W: SeekableWriter + Read> ContainerWriter<W> {
    /// Resumes a container that already holds pages
    ///
    /// The stream must start with a classic TIFF header and end with the
    /// open zero pointer left behind by a previous writer. New pages use
    /// the byte order of the existing container.
    pub fn append(mut output: W) -> TiffResult<Self> {
        let length = output.seek(SeekFrom::End(0))?;
        if length < header::HEADER_SIZE {
            return Err(TiffError::InvalidContainer(format!(
                "stream of {} bytes is too short to hold a TIFF container", length)));
        }

        output.seek(SeekFrom::Start(0))?;
        let mut head = [0u8; 4];
        output.read_exact(&mut head)?;
        let byte_order = ByteOrder::from_marker([head[0], head[1]])?;
        let handler = byte_order.create_handler();

        let version = handler.read_u16(&mut Cursor::new([head[2], head[3]]))?;
        if version != header::TIFF_VERSION {
            return Err(TiffError::UnsupportedVersion(version));
        }

        let placeholder = length - 4;
        output.seek(SeekFrom::Start(placeholder))?;
        let mut tail = [0u8; 4];
        output.read_exact(&mut tail)?;
        if tail != [0u8; 4] {
            return Err(TiffError::InvalidContainer(
                "stream does not end with an open next-IFD pointer".to_string()));
        }
        output.seek(SeekFrom::End(0))?;

        debug!("Appending to {} container, open IFD pointer at {}", byte_order.name(), placeholder);
        Ok(ContainerWriter {
            output,
            writer: TiffWriter::new(byte_order),
            placeholder,
            pages_written: 0,
            progress: None,
        })
    }

    /// Starts a new container in an empty stream, or resumes a populated one
    pub fn open(mut output: W, byte_order: ByteOrder) -> TiffResult<Self> {
        match output.seek(SeekFrom::End(0))? {
            0 => Self::new(output, byte_order),
            _ => Self::append(output),
        }
    }
}
