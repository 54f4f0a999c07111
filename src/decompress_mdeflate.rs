/*
 * Block decoder.
 *
 * Single pass, table driven: each of the three data codes gets a 256-entry
 * table indexed by the top 8 bits of the shift register, plus a parallel
 * per-symbol length array telling the reader how far to shift afterwards.
 * The meta code that describes the length vectors is decoded through the
 * same machinery.
 */

use crate::bitstream::BitReader;
use crate::mdeflate_constants::{
    DECODE_TABLE_SIZE, LENGTH_EXTRA_BITS, LENGTH_SYMBOLS_OFFSET, MATCH_LENGTH_OFFSET,
    MAX_CW_LENGTH, MAX_LITERAL_SYMBOL, NUM_BL_SYMBOLS, NUM_LITERAL_SYMBOLS, NUM_MAIN_SYMBOLS,
    NUM_OFFSET_SYMBOLS, OFFSET_EXTRA_BITS,
};
use crate::symbol_tables::{LENGTH_BASE, OFFSET_BASE};
use crate::{safety_check, MdeflateError};
use nightly_quirks::branch_pred::likely;

/*
 * Decoder lookup state. Rebuilt from the block header on every call; kept in
 * a reusable allocation so repeated block decodes don't churn.
 */
pub struct MdeflateDecodeTables {
    main_lut: [u8; DECODE_TABLE_SIZE],
    main_lengths: [u8; NUM_MAIN_SYMBOLS],
    literal_lut: [u8; DECODE_TABLE_SIZE],
    literal_lengths: [u8; NUM_LITERAL_SYMBOLS],
    offset_lut: [u8; DECODE_TABLE_SIZE],
    offset_lengths: [u8; NUM_OFFSET_SYMBOLS],
    bl_lut: [u8; DECODE_TABLE_SIZE],
    bl_lengths: [u8; NUM_BL_SYMBOLS],
}

pub fn mdeflate_alloc_decompressor() -> Box<MdeflateDecodeTables> {
    Box::new(MdeflateDecodeTables {
        main_lut: [0; DECODE_TABLE_SIZE],
        main_lengths: [0; NUM_MAIN_SYMBOLS],
        literal_lut: [0; DECODE_TABLE_SIZE],
        literal_lengths: [0; NUM_LITERAL_SYMBOLS],
        offset_lut: [0; DECODE_TABLE_SIZE],
        offset_lengths: [0; NUM_OFFSET_SYMBOLS],
        bl_lut: [0; DECODE_TABLE_SIZE],
        bl_lengths: [0; NUM_BL_SYMBOLS],
    })
}

impl MdeflateDecodeTables {
    fn reset(&mut self) {
        self.main_lut.fill(0);
        self.main_lengths.fill(0);
        self.literal_lut.fill(0);
        self.literal_lengths.fill(0);
        self.offset_lut.fill(0);
        self.offset_lengths.fill(0);
        self.bl_lut.fill(0);
        self.bl_lengths.fill(0);
    }
}

/*
 * Canonical table fill, mirroring the encoder's code-word assignment
 * extended to full 8-bit prefixes: every symbol of length L owns
 * 2^(8 - L) consecutive entries.
 */
fn build_decode_table(
    lengths: &[u8],
    lut: &mut [u8; DECODE_TABLE_SIZE],
) -> Result<(), MdeflateError> {
    let mut cursor = 0usize;
    for cw_length in 1..=MAX_CW_LENGTH {
        for (symbol, &length) in lengths.iter().enumerate() {
            if length as usize == cw_length {
                let span = 1usize << (MAX_CW_LENGTH - cw_length);
                safety_check!(cursor + span <= DECODE_TABLE_SIZE);
                lut[cursor..cursor + span].fill(symbol as u8);
                cursor += span;
            }
        }
    }
    Ok(())
}

#[inline(always)]
fn read_symbol(reader: &mut BitReader, lut: &[u8; DECODE_TABLE_SIZE], lengths: &[u8]) -> u8 {
    let symbol = lut[reader.peek_top8() as usize];
    reader.consume(lengths[symbol as usize]);
    symbol
}

fn read_lengths(
    reader: &mut BitReader,
    bl_lut: &[u8; DECODE_TABLE_SIZE],
    bl_lengths: &[u8],
    lengths: &mut [u8],
) {
    for entry in lengths.iter_mut() {
        *entry = read_symbol(reader, bl_lut, bl_lengths);
    }
}

/// Decode one block from `input` into `window[out_start..]`, returning the
/// decoded byte count. `window[..out_start]` must hold the previous block's
/// payload so back-references can reach across the block boundary.
pub fn mdeflate_decompress_block(
    tables: &mut MdeflateDecodeTables,
    input: &[u8],
    window: &mut [u8],
    out_start: usize,
) -> Result<usize, MdeflateError> {
    safety_check!(input.len() >= 2 && out_start <= window.len());

    tables.reset();
    let mut reader = BitReader::new(input);

    /* Meta-tree lengths arrive as fixed 3-bit fields. */
    for idx in 0..NUM_BL_SYMBOLS {
        tables.bl_lengths[idx] = reader.read_bits(3);
    }
    build_decode_table(&tables.bl_lengths, &mut tables.bl_lut)?;

    /* The three data-code length vectors, meta-coded. */
    read_lengths(
        &mut reader,
        &tables.bl_lut,
        &tables.bl_lengths,
        &mut tables.main_lengths,
    );
    read_lengths(
        &mut reader,
        &tables.bl_lut,
        &tables.bl_lengths,
        &mut tables.literal_lengths,
    );
    read_lengths(
        &mut reader,
        &tables.bl_lut,
        &tables.bl_lengths,
        &mut tables.offset_lengths,
    );

    build_decode_table(&tables.main_lengths, &mut tables.main_lut)?;
    build_decode_table(&tables.literal_lengths, &mut tables.literal_lut)?;
    build_decode_table(&tables.offset_lengths, &mut tables.offset_lut)?;

    let mut out_pos = out_start;
    loop {
        let symbol = read_symbol(&mut reader, &tables.main_lut, &tables.main_lengths) as usize;

        if likely(symbol <= MAX_LITERAL_SYMBOL) {
            let high = read_symbol(&mut reader, &tables.literal_lut, &tables.literal_lengths);
            safety_check!(out_pos < window.len());
            window[out_pos] = (high << 4) | symbol as u8;
            out_pos += 1;
        } else if symbol >= LENGTH_SYMBOLS_OFFSET {
            let length_symbol = symbol - LENGTH_SYMBOLS_OFFSET;
            let length = LENGTH_BASE[length_symbol] as usize
                + reader.read_bits(LENGTH_EXTRA_BITS[length_symbol]) as usize
                + MATCH_LENGTH_OFFSET;

            let offset_symbol =
                read_symbol(&mut reader, &tables.offset_lut, &tables.offset_lengths) as usize;
            let offset = OFFSET_BASE[offset_symbol] as usize
                + reader.read_bits(OFFSET_EXTRA_BITS[offset_symbol]) as usize
                + 1;

            safety_check!(offset <= out_pos && out_pos + length <= window.len());
            /* Byte-by-byte on purpose: the regions may overlap, and the copy
             * must see bytes it produced earlier in the same match. */
            for step in 0..length {
                window[out_pos + step] = window[out_pos - offset + step];
            }
            out_pos += length;
        } else {
            /* END_OF_BLOCK */
            break;
        }
    }

    Ok(out_pos - out_start)
}
