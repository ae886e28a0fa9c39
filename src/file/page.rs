pub const INT_BYTES: usize = 4;

const UTF16_SIZE: usize = 2;

/// The in-memory image of one disk block, with typed accessors at arbitrary
/// byte offsets. Callers are responsible for offsets; every access must fit
/// inside the block.
///
/// # Format
///
/// - i32: 4 bytes, little-endian
/// - byte array: 4-byte little-endian length, then the raw bytes
/// - string: UTF-16 code units, prefixed by their byte length (2 bytes per
///   code unit), each unit little-endian
#[derive(Debug)]
pub struct Page {
    buf: Vec<u8>,
}

impl Page {
    pub fn new(block_size: usize) -> Self {
        Self {
            buf: vec![0; block_size],
        }
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { buf: bytes }
    }

    pub fn get_int(&self, offset: usize) -> i32 {
        let mut data = [0u8; INT_BYTES];
        data.copy_from_slice(&self.buf[offset..offset + INT_BYTES]);
        i32::from_le_bytes(data)
    }

    pub fn set_int(&mut self, offset: usize, n: i32) {
        self.buf[offset..offset + INT_BYTES].copy_from_slice(&n.to_le_bytes());
    }

    pub fn get_bytes(&self, offset: usize) -> &[u8] {
        let length = self.get_int(offset) as usize;
        &self.buf[offset + INT_BYTES..offset + INT_BYTES + length]
    }

    pub fn set_bytes(&mut self, offset: usize, b: &[u8]) {
        self.set_int(offset, b.len() as i32);
        self.buf[offset + INT_BYTES..offset + INT_BYTES + b.len()].copy_from_slice(b);
    }

    pub fn get_string(&self, offset: usize) -> String {
        let length = self.get_int(offset) as usize / UTF16_SIZE;

        let mut units = Vec::with_capacity(length);
        for i in 0..length {
            units.push(self.get_u16(offset + INT_BYTES + i * UTF16_SIZE));
        }

        String::from_utf16_lossy(&units)
    }

    pub fn set_string(&mut self, offset: usize, s: &str) {
        let units: Vec<u16> = s.encode_utf16().collect();

        self.set_int(offset, (units.len() * UTF16_SIZE) as i32);

        for (i, unit) in units.iter().enumerate() {
            self.set_u16(offset + INT_BYTES + i * UTF16_SIZE, *unit);
        }
    }

    fn get_u16(&self, offset: usize) -> u16 {
        let mut data = [0u8; UTF16_SIZE];
        data.copy_from_slice(&self.buf[offset..offset + UTF16_SIZE]);
        u16::from_le_bytes(data)
    }

    fn set_u16(&mut self, offset: usize, n: u16) {
        self.buf[offset..offset + UTF16_SIZE].copy_from_slice(&n.to_le_bytes());
    }

    /// The raw bytes of the page.
    pub fn contents(&self) -> &[u8] {
        &self.buf
    }

    pub(crate) fn contents_mut(&mut self) -> &mut [u8] {
        &mut self.buf
    }
}

/// The number of bytes a string of `length` UTF-16 code units occupies on a
/// page, including its length prefix.
pub fn max_length(length: usize) -> usize {
    INT_BYTES + length * UTF16_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_round_trip() {
        let mut page = Page::new(400);
        page.set_int(80, -42);
        assert_eq!(page.get_int(80), -42);
        page.set_int(0, i32::MAX);
        assert_eq!(page.get_int(0), i32::MAX);
    }

    #[test]
    fn test_string_round_trip() {
        let mut page = Page::new(400);
        page.set_string(100, "abcdefghijklm");
        assert_eq!(page.get_string(100), "abcdefghijklm");

        // non-ascii text goes through utf-16 code units
        page.set_string(200, "héllo wörld");
        assert_eq!(page.get_string(200), "héllo wörld");
    }

    #[test]
    fn test_bytes_round_trip() {
        let mut page = Page::new(400);
        page.set_bytes(10, &[1, 2, 3, 255]);
        assert_eq!(page.get_bytes(10), &[1, 2, 3, 255]);
    }

    #[test]
    fn test_max_length() {
        assert_eq!(max_length(0), 4);
        assert_eq!(max_length(9), 22);
    }
}
