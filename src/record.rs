//! Record views handed from input sources to the key extractor

use bstr::BString;

/// One unit of input: a text line or a tabular row
///
/// Records are reused buffers owned by the pump; implementations only expose
/// borrowed views into them.
pub trait Record {
    /// Number of fields a composite key can select from
    fn field_count(&self) -> usize;

    /// Borrow a single field, `None` if the index is past the end
    fn field(&self, index: usize) -> Option<&[u8]>;

    /// The whole-record key.
    ///
    /// Implementations either borrow their own bytes or encode into `scratch`.
    fn identity_key<'a>(&'a self, scratch: &'a mut Vec<u8>) -> &'a [u8];

    /// Lossy rendering for diagnostics
    fn describe(&self) -> BString;
}

/// A single line with its terminator stripped
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Line {
    bytes: Vec<u8>,
}

impl Line {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub(crate) fn buffer_mut(&mut self) -> &mut Vec<u8> {
        &mut self.bytes
    }
}

impl From<&[u8]> for Line {
    fn from(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
        }
    }
}

impl Record for Line {
    fn field_count(&self) -> usize {
        1
    }

    fn field(&self, index: usize) -> Option<&[u8]> {
        (index == 0).then_some(self.bytes.as_slice())
    }

    fn identity_key<'a>(&'a self, _scratch: &'a mut Vec<u8>) -> &'a [u8] {
        &self.bytes
    }

    fn describe(&self) -> BString {
        BString::from(self.bytes.as_slice())
    }
}

impl Record for csv::ByteRecord {
    fn field_count(&self) -> usize {
        self.len()
    }

    fn field(&self, index: usize) -> Option<&[u8]> {
        self.get(index)
    }

    // Length-prefixed so that ["ab", "c"] and ["a", "bc"] never collide
    fn identity_key<'a>(&'a self, scratch: &'a mut Vec<u8>) -> &'a [u8] {
        scratch.clear();
        for field in self.iter() {
            scratch.extend_from_slice(&(field.len() as u64).to_le_bytes());
            scratch.extend_from_slice(field);
        }
        scratch
    }

    fn describe(&self) -> BString {
        let fields: Vec<&[u8]> = self.iter().collect();
        BString::from(fields.join(&b","[..]))
    }
}
