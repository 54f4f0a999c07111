/*
 * Format constants. These are part of the wire format: changing any of them
 * produces streams that are not decodable by other implementations.
 */

/* Nibble literals occupy 0..=15 of the main alphabet. */
pub const MAX_LITERAL_SYMBOL: usize = 15;
pub const NUM_LITERAL_SYMBOLS: usize = 16;

pub const END_OF_BLOCK_SYMBOL: usize = 16;

/* Length symbols sit directly after the end-of-block symbol. */
pub const LENGTH_SYMBOLS_OFFSET: usize = END_OF_BLOCK_SYMBOL + 1;
pub const NUM_LENGTH_SYMBOLS: usize = 8;

pub const NUM_MAIN_SYMBOLS: usize = END_OF_BLOCK_SYMBOL + NUM_LENGTH_SYMBOLS + 1;
pub const NUM_OFFSET_SYMBOLS: usize = 32;

/* Shortest and longest match the encoder will emit. */
pub const MATCH_LENGTH_OFFSET: usize = 3;
pub const MAX_MATCH_LENGTH: usize = 256;

pub const MAX_CODEBOOK_BACK: usize = 1 << 14;

/* Maximum decoded bytes per block (nibble symbols double this). */
pub const BLOCK_SIZE: usize = 1 << 14;

/* Data trees use 8-bit code-words, the meta tree 7-bit ones. */
pub const MAX_CW_LENGTH: usize = 8;
pub const NUM_BL_SYMBOLS: usize = MAX_CW_LENGTH + 1;
pub const MAX_BL_CW_LENGTH: usize = 7;

pub const DECODE_TABLE_SIZE: usize = 1 << MAX_CW_LENGTH;

/*
 * Extra-bit vectors. A length symbol covers 2^extra consecutive reduced
 * lengths, an offset symbol 2^extra consecutive reduced offsets.
 */
pub const LENGTH_EXTRA_BITS: [u8; NUM_LENGTH_SYMBOLS] = [0, 1, 2, 3, 4, 5, 6, 7];
pub const OFFSET_EXTRA_BITS: [u8; NUM_OFFSET_SYMBOLS] = [
    0, 1, 2, 4, 6, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8,
];

const fn extra_bits_coverage(extra: &[u8]) -> usize {
    let mut total = 0;
    let mut idx = 0;
    while idx < extra.len() {
        total += 1 << extra[idx];
        idx += 1;
    }
    total
}

/* Reduced values reachable through (symbol, extra bits) enumeration. */
pub const LENGTH_COVERAGE: usize = extra_bits_coverage(&LENGTH_EXTRA_BITS);
pub const OFFSET_COVERAGE: usize = extra_bits_coverage(&OFFSET_EXTRA_BITS);

/*
 * Exclusive bound for the match scan. The offset enumeration covers fewer
 * distances than MAX_CODEBOOK_BACK; the enumerated total is what the encoder
 * must obey.
 */
pub const MAX_BACK_DISTANCE: usize = OFFSET_COVERAGE - 1;

/* The framing driver feeds half a block of bytes per frame (two nibble
 * symbols per byte). */
pub const COMPRESS_CHUNK_SIZE: usize = BLOCK_SIZE / 2;

/* Worst-case encoded size of one block, header included. */
pub const MAX_COMPRESSED_BLOCK_SIZE: usize = BLOCK_SIZE + BLOCK_SIZE / 5;

const_assert!(NUM_MAIN_SYMBOLS == 25);
const_assert!(DECODE_TABLE_SIZE == 256);
const_assert!(LENGTH_COVERAGE == 255);
const_assert!(OFFSET_COVERAGE == 6999);
const_assert!(OFFSET_COVERAGE <= MAX_CODEBOOK_BACK);

/* The length enumeration reaches past the encoder clamp. */
const_assert!(MATCH_LENGTH_OFFSET + LENGTH_COVERAGE - 1 > MAX_MATCH_LENGTH);
