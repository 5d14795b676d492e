/**
    Reusable scratch buffer of decoded PCM bytes.

    `size` is the write cursor (bytes of valid data), `index` the read cursor
    (bytes already handed to the device). `0 <= index <= size <= capacity`
    always holds, and the chunk wants a refill exactly when `index == size`.

    Only the audio callback thread touches the chunk, so it has no lock.
*/
pub struct DecodedChunk {
    buffer: Box<[u8]>,
    size: usize,
    index: usize,
}

impl DecodedChunk {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0u8; capacity].into_boxed_slice(),
            size: 0,
            index: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /**
        Bytes decoded but not yet copied out.
    */
    pub fn remaining(&self) -> usize {
        self.size - self.index
    }

    pub fn is_drained(&self) -> bool {
        self.index == self.size
    }

    /**
        Copy as much unread data as fits into `out`, advancing the read
        cursor. Returns the number of bytes copied.
    */
    pub fn copy_to(&mut self, out: &mut [u8]) -> usize {
        let count = self.remaining().min(out.len());
        out[..count].copy_from_slice(&self.buffer[self.index..self.index + count]);
        self.index += count;
        count
    }

    /**
        Replace the contents with `data` and reset the read cursor.

        Data beyond the capacity is dropped; returns the bytes stored.
    */
    pub fn refill(&mut self, data: &[u8]) -> usize {
        let count = data.len().min(self.capacity());
        self.buffer[..count].copy_from_slice(&data[..count]);
        self.size = count;
        self.index = 0;
        count
    }

    pub fn clear(&mut self) {
        self.size = 0;
        self.index = 0;
    }
}
