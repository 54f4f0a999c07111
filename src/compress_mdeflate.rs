/*
 * Block encoder.
 *
 * One pass turns the input into a symbol stream (nibble literals and
 * length/offset pairs) while counting frequencies, then the four prefix
 * codes are built and everything is serialized: the meta-tree header, the
 * three meta-coded length vectors, and the body.
 */

use crate::bitstream::BitWriter;
use crate::code_builder::{CodeBuilder, EncNode};
use crate::match_finder::{find_match, Match};
use crate::mdeflate_constants::{
    BLOCK_SIZE, END_OF_BLOCK_SYMBOL, LENGTH_EXTRA_BITS, LENGTH_SYMBOLS_OFFSET, MATCH_LENGTH_OFFSET,
    MAX_BL_CW_LENGTH, MAX_CW_LENGTH, MAX_LITERAL_SYMBOL, NUM_BL_SYMBOLS, NUM_LITERAL_SYMBOLS,
    NUM_MAIN_SYMBOLS, NUM_OFFSET_SYMBOLS, OFFSET_EXTRA_BITS,
};
use crate::symbol_tables::{LENGTH_BASE, LENGTH_SYMBOL_LUT, OFFSET_BASE, OFFSET_SYMBOL_LUT};
use crate::MdeflateError;

/*
 * Encoder scratch state. Too large for the stack; allocate once with
 * mdeflate_alloc_compressor() and reuse across blocks — every call to
 * mdeflate_compress_block() re-zeroes the counting state itself.
 */
pub struct MdeflateCompressor {
    main_nodes: [EncNode; NUM_MAIN_SYMBOLS],
    literal_nodes: [EncNode; NUM_LITERAL_SYMBOLS],
    offset_nodes: [EncNode; NUM_OFFSET_SYMBOLS],
    bl_nodes: [EncNode; NUM_BL_SYMBOLS],
    builder: CodeBuilder,
    /* interleaved main/offset symbols; a literal byte contributes its low
     * nibble then its high nibble */
    symbols: Vec<u8>,
    /* length and offset extra-bit values, two per match */
    extras: Vec<u32>,
}

pub fn mdeflate_alloc_compressor() -> Box<MdeflateCompressor> {
    Box::new(MdeflateCompressor {
        main_nodes: [EncNode::default(); NUM_MAIN_SYMBOLS],
        literal_nodes: [EncNode::default(); NUM_LITERAL_SYMBOLS],
        offset_nodes: [EncNode::default(); NUM_OFFSET_SYMBOLS],
        bl_nodes: [EncNode::default(); NUM_BL_SYMBOLS],
        builder: CodeBuilder::new(),
        symbols: Vec::with_capacity(2 * BLOCK_SIZE + 1),
        extras: Vec::with_capacity(BLOCK_SIZE),
    })
}

impl MdeflateCompressor {
    fn reset(&mut self) {
        self.main_nodes = [EncNode::default(); NUM_MAIN_SYMBOLS];
        self.literal_nodes = [EncNode::default(); NUM_LITERAL_SYMBOLS];
        self.offset_nodes = [EncNode::default(); NUM_OFFSET_SYMBOLS];
        self.bl_nodes = [EncNode::default(); NUM_BL_SYMBOLS];
        self.symbols.clear();
        self.extras.clear();
    }
}

/// Encode `window[block_start..]` into `output`, returning the encoded byte
/// count. `window[..block_start]` is the previous payload, available as
/// match history (the codebook-back budget is exactly `block_start`).
///
/// The block must not exceed BLOCK_SIZE bytes and `output` must hold at
/// least MAX_COMPRESSED_BLOCK_SIZE bytes.
pub fn mdeflate_compress_block(
    compressor: &mut MdeflateCompressor,
    window: &[u8],
    block_start: usize,
    output: &mut [u8],
) -> Result<usize, MdeflateError> {
    compressor.reset();

    let end = window.len();
    let mut next_match: Option<Match> = None;
    let mut idx = block_start;

    while idx < end {
        let chosen = match next_match.take() {
            Some(deferred) => Some(deferred),
            None => match find_match(window, idx, end) {
                Some(current) => {
                    /* One-step lookahead: a longer match starting one byte
                     * later wins; the byte in between goes out literally. */
                    let ahead = if idx + 1 < end {
                        find_match(window, idx + 1, end)
                    } else {
                        None
                    };
                    match ahead {
                        Some(better) if better.length > current.length => {
                            next_match = Some(better);
                            None
                        }
                        _ => Some(current),
                    }
                }
                None => None,
            },
        };

        match chosen {
            Some(Match { length, offset }) => {
                let reduced_length = length - MATCH_LENGTH_OFFSET;
                let length_symbol = LENGTH_SYMBOL_LUT[reduced_length] as usize;
                let length_extra = reduced_length - LENGTH_BASE[length_symbol] as usize;
                let main_symbol = length_symbol + LENGTH_SYMBOLS_OFFSET;

                let reduced_offset = offset - 1;
                let offset_symbol = OFFSET_SYMBOL_LUT[reduced_offset] as usize;
                let offset_extra = reduced_offset - OFFSET_BASE[offset_symbol] as usize;

                compressor.main_nodes[main_symbol].count += 1;
                compressor.symbols.push(main_symbol as u8);
                compressor.offset_nodes[offset_symbol].count += 1;
                compressor.symbols.push(offset_symbol as u8);
                compressor.extras.push(length_extra as u32);
                compressor.extras.push(offset_extra as u32);

                idx += length;
            }
            None => {
                let byte = window[idx];
                let low = (byte & 0xf) as usize;
                compressor.main_nodes[low].count += 1;
                compressor.symbols.push(low as u8);

                let high = (byte >> 4) as usize;
                compressor.literal_nodes[high].count += 1;
                compressor.symbols.push(high as u8);

                idx += 1;
            }
        }
    }

    compressor.main_nodes[END_OF_BLOCK_SYMBOL].count += 1;
    compressor.symbols.push(END_OF_BLOCK_SYMBOL as u8);

    /* Build the three data codes at the 8-bit limit. The main code always
     * participates (it carries END_OF_BLOCK); the other two may be empty. */
    compressor
        .builder
        .construct_tree(&mut compressor.main_nodes, MAX_CW_LENGTH)?;
    compressor.builder.assign_code_words(&mut compressor.main_nodes)?;

    if compressor
        .builder
        .construct_tree(&mut compressor.literal_nodes, MAX_CW_LENGTH)?
        != 0
    {
        compressor
            .builder
            .assign_code_words(&mut compressor.literal_nodes)?;
    }
    if compressor
        .builder
        .construct_tree(&mut compressor.offset_nodes, MAX_CW_LENGTH)?
        != 0
    {
        compressor
            .builder
            .assign_code_words(&mut compressor.offset_nodes)?;
    }

    /* The meta code is built over the histogram of all three length
     * vectors, zero lengths included. */
    for idx in 0..NUM_MAIN_SYMBOLS {
        let length = compressor.main_nodes[idx].code_word_length as usize;
        compressor.bl_nodes[length].count += 1;
    }
    for idx in 0..NUM_LITERAL_SYMBOLS {
        let length = compressor.literal_nodes[idx].code_word_length as usize;
        compressor.bl_nodes[length].count += 1;
    }
    for idx in 0..NUM_OFFSET_SYMBOLS {
        let length = compressor.offset_nodes[idx].code_word_length as usize;
        compressor.bl_nodes[length].count += 1;
    }
    compressor
        .builder
        .construct_tree(&mut compressor.bl_nodes, MAX_BL_CW_LENGTH)?;
    compressor.builder.assign_code_words(&mut compressor.bl_nodes)?;

    let mut writer = BitWriter::new(output);

    /* Header: the meta-tree lengths as fixed 3-bit fields. */
    for node in &compressor.bl_nodes {
        writer.write_bits(node.code_word_length, 3);
    }

    /* The three length vectors, meta-coded one symbol per entry. */
    for node in &compressor.main_nodes {
        let meta = &compressor.bl_nodes[node.code_word_length as usize];
        writer.write_bits(meta.code_word, meta.code_word_length);
    }
    for node in &compressor.literal_nodes {
        let meta = &compressor.bl_nodes[node.code_word_length as usize];
        writer.write_bits(meta.code_word, meta.code_word_length);
    }
    for node in &compressor.offset_nodes {
        let meta = &compressor.bl_nodes[node.code_word_length as usize];
        writer.write_bits(meta.code_word, meta.code_word_length);
    }

    /* Body: main-tree code-words interleaved with extras, offset codes and
     * high-nibble literal codes. END_OF_BLOCK consumes nothing further. */
    let mut extra_idx = 0;
    let mut sym_idx = 0;
    while sym_idx < compressor.symbols.len() {
        let symbol = compressor.symbols[sym_idx] as usize;
        let node = &compressor.main_nodes[symbol];
        writer.write_bits(node.code_word, node.code_word_length);

        if symbol > END_OF_BLOCK_SYMBOL {
            writer.write_bits(
                compressor.extras[extra_idx],
                LENGTH_EXTRA_BITS[symbol - LENGTH_SYMBOLS_OFFSET] as u32,
            );
            extra_idx += 1;

            sym_idx += 1;
            let offset_symbol = compressor.symbols[sym_idx] as usize;
            let offset_node = &compressor.offset_nodes[offset_symbol];
            writer.write_bits(offset_node.code_word, offset_node.code_word_length);
            writer.write_bits(
                compressor.extras[extra_idx],
                OFFSET_EXTRA_BITS[offset_symbol] as u32,
            );
            extra_idx += 1;
        } else if symbol <= MAX_LITERAL_SYMBOL {
            sym_idx += 1;
            let high = compressor.symbols[sym_idx] as usize;
            if high > MAX_LITERAL_SYMBOL {
                return Err(MdeflateError::LiteralPairing);
            }
            let literal_node = &compressor.literal_nodes[high];
            writer.write_bits(literal_node.code_word, literal_node.code_word_length);
        }
        sym_idx += 1;
    }

    Ok(writer.finish())
}
