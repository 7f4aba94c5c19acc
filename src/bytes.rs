pub trait ByteLength {
    const BYTE_LEN: usize;
}

/// Encodes a value into the front of a block buffer
pub trait IntoBytes: ByteLength {
    fn write_bytes(&self, buf: &mut [u8]);

    fn to_bytes(&self) -> Vec<u8> {
        let mut buf = vec![0; Self::BYTE_LEN];
        self.write_bytes(&mut buf);
        buf
    }
}

/// Decodes a value from the front of a block buffer
pub trait FromBytes: ByteLength + Sized {
    type Error;
    fn from_bytes(bytes: &[u8]) -> Result<Self, Self::Error>;
}

pub fn read_i32(bytes: &[u8], offset: usize) -> i32 {
    let mut raw = [0; 4];
    raw.copy_from_slice(&bytes[offset..offset + 4]);
    i32::from_le_bytes(raw)
}

pub fn write_i32(bytes: &mut [u8], offset: usize, value: i32) {
    bytes[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}
