//! Compact-size integers and a bounds-checked little-endian reader

use super::TxError;

/// Append a compact-size integer (1, 3, 5 or 9 bytes)
pub fn write_varint(buf: &mut Vec<u8>, n: u64) {
    match n {
        0..=0xfc => buf.push(n as u8),
        0xfd..=0xffff => {
            buf.push(0xfd);
            buf.extend_from_slice(&(n as u16).to_le_bytes());
        }
        0x1_0000..=0xffff_ffff => {
            buf.push(0xfe);
            buf.extend_from_slice(&(n as u32).to_le_bytes());
        }
        _ => {
            buf.push(0xff);
            buf.extend_from_slice(&n.to_le_bytes());
        }
    }
}

/// Cursor over a serialized transaction
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], TxError> {
        if len > self.remaining() {
            return Err(TxError::UnexpectedEof {
                needed: len,
                remaining: self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8, TxError> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_u16_le(&mut self) -> Result<u16, TxError> {
        let mut arr = [0u8; 2];
        arr.copy_from_slice(self.read_bytes(2)?);
        Ok(u16::from_le_bytes(arr))
    }

    pub fn read_u32_le(&mut self) -> Result<u32, TxError> {
        let mut arr = [0u8; 4];
        arr.copy_from_slice(self.read_bytes(4)?);
        Ok(u32::from_le_bytes(arr))
    }

    pub fn read_u64_le(&mut self) -> Result<u64, TxError> {
        let mut arr = [0u8; 8];
        arr.copy_from_slice(self.read_bytes(8)?);
        Ok(u64::from_le_bytes(arr))
    }

    pub fn read_array32(&mut self) -> Result<[u8; 32], TxError> {
        let mut arr = [0u8; 32];
        arr.copy_from_slice(self.read_bytes(32)?);
        Ok(arr)
    }

    pub fn read_varint(&mut self) -> Result<u64, TxError> {
        match self.read_u8()? {
            0xfd => Ok(u64::from(self.read_u16_le()?)),
            0xfe => Ok(u64::from(self.read_u32_le()?)),
            0xff => self.read_u64_le(),
            n => Ok(u64::from(n)),
        }
    }

    /// Varint used as a length or count; must fit in what is left of the buffer
    pub fn read_length(&mut self) -> Result<usize, TxError> {
        let n = self.read_varint()?;
        match usize::try_from(n) {
            Ok(len) if len <= self.remaining() => Ok(len),
            _ => Err(TxError::LengthOverflow(n)),
        }
    }

    /// Varint-prefixed byte string
    pub fn read_var_bytes(&mut self) -> Result<&'a [u8], TxError> {
        let len = self.read_length()?;
        self.read_bytes(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(n: u64) -> Vec<u8> {
        let mut buf = Vec::new();
        write_varint(&mut buf, n);
        buf
    }

    #[test]
    fn test_varint_forms() {
        assert_eq!(encoded(0), vec![0x00]);
        assert_eq!(encoded(0xfc), vec![0xfc]);
        assert_eq!(encoded(0xfd), vec![0xfd, 0xfd, 0x00]);
        assert_eq!(encoded(0xffff), vec![0xfd, 0xff, 0xff]);
        assert_eq!(encoded(0x1_0000), vec![0xfe, 0x00, 0x00, 0x01, 0x00]);
        assert_eq!(
            encoded(0x1_0000_0000),
            vec![0xff, 0, 0, 0, 0, 1, 0, 0, 0]
        );
    }

    #[test]
    fn test_varint_boundaries_read_back() {
        let cases = [
            (0, 1),
            (1, 1),
            (0xfc, 1),
            (0xfd, 3),
            (0xffff, 3),
            (0x1_0000, 5),
            (0xffff_ffff, 5),
            (0x1_0000_0000, 9),
            (u64::MAX, 9),
        ];
        for (n, len) in cases {
            let buf = encoded(n);
            assert_eq!(buf.len(), len);
            let mut reader = ByteReader::new(&buf);
            assert_eq!(reader.read_varint().unwrap(), n);
            assert!(reader.is_empty());
        }
    }

    #[test]
    fn test_truncated_read() {
        let mut reader = ByteReader::new(&[0xfd, 0x01]);
        assert_eq!(
            reader.read_varint(),
            Err(TxError::UnexpectedEof {
                needed: 2,
                remaining: 1
            })
        );
    }

    #[test]
    fn test_length_larger_than_buffer() {
        let mut reader = ByteReader::new(&[0x05, 0x01, 0x02]);
        assert_eq!(reader.read_var_bytes(), Err(TxError::LengthOverflow(5)));
    }
}
