pub mod bitstream;
pub mod code_builder;
pub mod compress_mdeflate;
pub mod decompress_mdeflate;
pub mod match_finder;
pub mod mdeflate_constants;
pub mod streams;
pub mod symbol_tables;

#[macro_use]
extern crate static_assertions;

use crate::compress_mdeflate::{mdeflate_alloc_compressor, mdeflate_compress_block};
use crate::decompress_mdeflate::{mdeflate_alloc_decompressor, mdeflate_decompress_block};
use crate::mdeflate_constants::{BLOCK_SIZE, COMPRESS_CHUNK_SIZE, MAX_COMPRESSED_BLOCK_SIZE};
use crate::streams::block_window_output::BlockWindowOutput;
use crate::streams::framed_block_input::FramedBlockInput;
use filebuffer::FileBuffer;
use nightly_quirks::utils::NightlyUtils;
use std::path::Path;

/*
 * Result of a call to mdeflate_compress_block(), mdeflate_decompress_block()
 * or one of the buffered drivers.
 */
#[derive(Debug)]
pub enum MdeflateError {
    /* The compressed data was invalid or corrupt. */
    BadData,

    /* The framed stream ended mid-frame or without a terminator. */
    InsufficientData,

    /* The output sink refused data. */
    InsufficientSpace,

    /* Canonical code-word assignment did not close the code (internal
     * error). */
    CodeConstruction,

    /* A frequency rank went unmatched while building a code (internal
     * error). */
    OrderSort,

    /* A low-nibble literal was queued without a literal high nibble
     * following it (internal error). */
    LiteralPairing,
}

/* Decoded-stream accounting returned by the decompression driver. */
pub struct OutStreamResult {
    pub written: usize,
    pub crc32: u32,
}

#[macro_export]
macro_rules! safety_check {
    ($cond:expr) => {
        if !$cond {
            return Err(MdeflateError::BadData);
        }
    };
}

/// Encode one standalone block (no history). The input must not exceed
/// BLOCK_SIZE bytes.
pub fn compress_block(data: &[u8]) -> Result<Vec<u8>, MdeflateError> {
    debug_assert!(data.len() <= BLOCK_SIZE);

    let mut compressor = mdeflate_alloc_compressor();
    let mut output = vec![0u8; MAX_COMPRESSED_BLOCK_SIZE];
    let encoded = mdeflate_compress_block(&mut compressor, data, 0, &mut output)?;
    output.truncate(encoded);
    Ok(output)
}

/// Decode one standalone block (no history).
pub fn decompress_block(data: &[u8]) -> Result<Vec<u8>, MdeflateError> {
    let mut tables = mdeflate_alloc_decompressor();
    let mut output = vec![0u8; BLOCK_SIZE];
    let decoded = mdeflate_decompress_block(&mut tables, data, &mut output, 0)?;
    output.truncate(decoded);
    Ok(output)
}

/// Compress `data` into a framed block stream, handing each frame (and the
/// zero-length terminator) to `func`.
pub fn compress_buffer(
    data: &[u8],
    mut func: impl FnMut(&[u8]) -> Result<(), ()>,
) -> Result<(), MdeflateError> {
    let mut compressor = mdeflate_alloc_compressor();
    let mut frame: Box<[u8]> =
        unsafe { NightlyUtils::box_new_uninit_slice_assume_init(MAX_COMPRESSED_BLOCK_SIZE + 2) };

    let mut block_start = 0usize;
    let mut prev_len = 0usize;
    while block_start < data.len() {
        let block_len = (data.len() - block_start).min(COMPRESS_CHUNK_SIZE);
        /* the previous chunk rides along in front of the block as match
         * history */
        let window = &data[block_start - prev_len..block_start + block_len];
        let encoded = mdeflate_compress_block(&mut compressor, window, prev_len, &mut frame[2..])?;

        frame[..2].copy_from_slice(&(encoded as u16).to_be_bytes());
        func(&frame[..2 + encoded]).map_err(|_| MdeflateError::InsufficientSpace)?;

        block_start += block_len;
        prev_len = block_len;
    }

    func(&[0, 0]).map_err(|_| MdeflateError::InsufficientSpace)?;
    Ok(())
}

/// Decompress a framed block stream, handing each decoded block to `func`.
pub fn decompress_buffer(
    data: &[u8],
    func: impl FnMut(&[u8]) -> Result<(), ()>,
) -> Result<OutStreamResult, MdeflateError> {
    let mut tables = mdeflate_alloc_decompressor();
    let mut input = FramedBlockInput::new(data);
    let mut output = BlockWindowOutput::new(func);

    while let Some(payload) = input.next_frame()? {
        let (window, out_start) = output.window_parts();
        let decoded = mdeflate_decompress_block(&mut tables, payload, window, out_start)?;
        output
            .commit(decoded)
            .map_err(|_| MdeflateError::InsufficientSpace)?;
    }

    Ok(output.final_flush())
}

pub fn compress_file_buffered(
    file: impl AsRef<Path>,
    func: impl FnMut(&[u8]) -> Result<(), ()>,
) -> Result<(), MdeflateError> {
    let data = FileBuffer::open(file).unwrap();
    compress_buffer(&data, func)
}

pub fn decompress_file_buffered(
    file: impl AsRef<Path>,
    func: impl FnMut(&[u8]) -> Result<(), ()>,
) -> Result<OutStreamResult, MdeflateError> {
    let data = FileBuffer::open(file).unwrap();
    decompress_buffer(&data, func)
}
