use std::borrow::Cow;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use memmap::{Mmap, MmapOptions};

use errors::Result;

/// The raw bytes of one data file.
///
/// INI files can come from the command line, stdin, or an in-memory string (tests, generated
/// overrides); this hides the difference.  The `text()` method gives back the contents decoded
/// for the INI reader.
pub enum InputBuffer {
    Stdin(Vec<u8>),
    File(Mmap),
    Memory(Vec<u8>),
    /// Zero-length files can't be mapped
    Empty,
}

impl InputBuffer {
    /// Creates an `InputBuffer` and consumes all of `stdin`
    pub fn new_from_stdin() -> Result<InputBuffer> {
        let mut buf = Vec::new();
        io::stdin().read_to_end(&mut buf)?;

        Ok(InputBuffer::Stdin(buf))
    }

    /// Creates an `InputBuffer` by memory-mapping a file
    pub fn new_from_file<P>(path: P) -> Result<InputBuffer>
    where
        P: AsRef<Path>,
    {
        let file = File::open(path)?;
        if file.metadata()?.len() == 0 {
            return Ok(InputBuffer::Empty);
        }
        let mmap = unsafe { MmapOptions::new().map(&file)? };

        Ok(InputBuffer::File(mmap))
    }

    pub fn new_from_bytes<B: Into<Vec<u8>>>(bytes: B) -> InputBuffer {
        InputBuffer::Memory(bytes.into())
    }

    /// Gets the stored buffer of bytes
    pub fn bytes(&self) -> &[u8] {
        match *self {
            InputBuffer::Stdin(ref v) => &*v,
            InputBuffer::File(ref m) => &*m,
            InputBuffer::Memory(ref v) => &*v,
            InputBuffer::Empty => &[],
        }
    }

    pub fn len(&self) -> usize {
        self.bytes().len()
    }

    /// The contents as text.  The shipped data files are mostly ASCII with the odd Latin-1 byte in
    /// a comment, so anything that isn't UTF-8 gets replaced rather than rejected.
    pub fn text(&self) -> Cow<str> {
        String::from_utf8_lossy(self.bytes())
    }
}


#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::InputBuffer;

    #[test]
    fn maps_a_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "Object Foo\nEnd\n").unwrap();
        file.flush().unwrap();

        let input = InputBuffer::new_from_file(file.path()).unwrap();
        assert_eq!(input.len(), 15);
        assert_eq!(input.text(), "Object Foo\nEnd\n");
    }

    #[test]
    fn empty_file() {
        let file = NamedTempFile::new().unwrap();
        let input = InputBuffer::new_from_file(file.path()).unwrap();
        assert_eq!(input.len(), 0);
        assert_eq!(input.text(), "");
    }

    #[test]
    fn lossy_text() {
        let input = InputBuffer::new_from_bytes(&b"; caf\xe9\nEnd"[..]);
        assert_eq!(input.text(), "; caf\u{fffd}\nEnd");
    }
}
