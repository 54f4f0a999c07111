use crate::mdeflate_constants::{BLOCK_SIZE, COMPRESS_CHUNK_SIZE};
use crate::OutStreamResult;
use crc32fast::Hasher;
use nightly_quirks::utils::NightlyUtils;

/*
 * Decode-side sliding window. The buffer starts with a history region that
 * holds the previous block's payload, so back-references can reach across
 * block boundaries; each decoded block is handed to the flush callback and
 * then becomes the new history.
 */
pub struct BlockWindowOutput<'a> {
    buffer: Box<[u8]>,
    history_len: usize,
    crc32: Hasher,
    written: usize,
    func: Box<dyn FnMut(&[u8]) -> Result<(), ()> + 'a>,
}

impl<'a> BlockWindowOutput<'a> {
    pub fn new<F: FnMut(&[u8]) -> Result<(), ()> + 'a>(write_func: F) -> Self {
        Self {
            buffer: unsafe {
                NightlyUtils::box_new_uninit_slice_assume_init(COMPRESS_CHUNK_SIZE + BLOCK_SIZE)
            },
            history_len: 0,
            crc32: Hasher::new(),
            written: 0,
            func: Box::new(write_func),
        }
    }

    /// The whole window plus the position decoding must start at. Everything
    /// before that position is valid history.
    #[inline(always)]
    pub fn window_parts(&mut self) -> (&mut [u8], usize) {
        (&mut self.buffer[..], self.history_len)
    }

    /// Flush a freshly decoded block of `decoded` bytes and slide it into
    /// the history region.
    pub fn commit(&mut self, decoded: usize) -> Result<(), ()> {
        let start = self.history_len;
        self.crc32.update(&self.buffer[start..start + decoded]);
        (self.func)(&self.buffer[start..start + decoded])?;
        self.written += decoded;

        let keep = decoded.min(COMPRESS_CHUNK_SIZE);
        self.buffer.copy_within(start + decoded - keep..start + decoded, 0);
        self.history_len = keep;
        Ok(())
    }

    pub fn final_flush(&mut self) -> OutStreamResult {
        let result = OutStreamResult {
            written: self.written,
            crc32: self.crc32.clone().finalize(),
        };
        self.crc32 = Hasher::new();
        self.written = 0;
        self.history_len = 0;
        result
    }
}
