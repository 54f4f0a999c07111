/*
 * Precomputed mappings between raw lengths/offsets and (symbol, extra bits)
 * pairs, enumerated from the extra-bit vectors.
 *
 * The encoder needs the full reduced-value -> symbol lookups; the decoder
 * only needs the per-symbol base values, locating the extra-bit counts in the
 * fixed vectors.
 */

use crate::mdeflate_constants::{
    LENGTH_COVERAGE, LENGTH_EXTRA_BITS, NUM_LENGTH_SYMBOLS, NUM_OFFSET_SYMBOLS, OFFSET_COVERAGE,
    OFFSET_EXTRA_BITS,
};

/// Reduced match length (raw length - MATCH_LENGTH_OFFSET) to length symbol.
pub static LENGTH_SYMBOL_LUT: [u8; LENGTH_COVERAGE] = build_length_symbol_lut();

/// Reduced offset (raw offset - 1) to offset symbol.
pub static OFFSET_SYMBOL_LUT: [u8; OFFSET_COVERAGE] = build_offset_symbol_lut();

/// First reduced length covered by each length symbol.
pub const LENGTH_BASE: [u16; NUM_LENGTH_SYMBOLS] = build_length_base();

/// First reduced offset covered by each offset symbol.
pub const OFFSET_BASE: [u16; NUM_OFFSET_SYMBOLS] = build_offset_base();

const fn build_length_symbol_lut() -> [u8; LENGTH_COVERAGE] {
    let mut lut = [0u8; LENGTH_COVERAGE];
    let mut reduced = 0;
    let mut symbol = 0;
    while symbol < NUM_LENGTH_SYMBOLS {
        let span = 1usize << LENGTH_EXTRA_BITS[symbol];
        let mut idx = 0;
        while idx < span {
            lut[reduced] = symbol as u8;
            reduced += 1;
            idx += 1;
        }
        symbol += 1;
    }
    lut
}

const fn build_offset_symbol_lut() -> [u8; OFFSET_COVERAGE] {
    let mut lut = [0u8; OFFSET_COVERAGE];
    let mut reduced = 0;
    let mut symbol = 0;
    while symbol < NUM_OFFSET_SYMBOLS {
        let span = 1usize << OFFSET_EXTRA_BITS[symbol];
        let mut idx = 0;
        while idx < span {
            lut[reduced] = symbol as u8;
            reduced += 1;
            idx += 1;
        }
        symbol += 1;
    }
    lut
}

const fn build_length_base() -> [u16; NUM_LENGTH_SYMBOLS] {
    let mut base = [0u16; NUM_LENGTH_SYMBOLS];
    let mut reduced = 0usize;
    let mut symbol = 0;
    while symbol < NUM_LENGTH_SYMBOLS {
        base[symbol] = reduced as u16;
        reduced += 1 << LENGTH_EXTRA_BITS[symbol];
        symbol += 1;
    }
    base
}

const fn build_offset_base() -> [u16; NUM_OFFSET_SYMBOLS] {
    let mut base = [0u16; NUM_OFFSET_SYMBOLS];
    let mut reduced = 0usize;
    let mut symbol = 0;
    while symbol < NUM_OFFSET_SYMBOLS {
        base[symbol] = reduced as u16;
        reduced += 1 << OFFSET_EXTRA_BITS[symbol];
        symbol += 1;
    }
    base
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_bases_match_the_extra_bit_vector() {
        assert_eq!(LENGTH_BASE, [0, 1, 3, 7, 15, 31, 63, 127]);
    }

    #[test]
    fn offset_bases_match_the_extra_bit_vector() {
        assert_eq!(&OFFSET_BASE[..6], &[0, 1, 3, 7, 23, 87]);
        /* remaining symbols advance by 256 each */
        for symbol in 6..NUM_OFFSET_SYMBOLS {
            assert_eq!(OFFSET_BASE[symbol], OFFSET_BASE[symbol - 1] + 256);
        }
    }

    #[test]
    fn luts_are_consistent_with_the_bases() {
        for (reduced, &symbol) in LENGTH_SYMBOL_LUT.iter().enumerate() {
            let symbol = symbol as usize;
            let base = LENGTH_BASE[symbol] as usize;
            assert!(reduced >= base);
            assert!(reduced - base < 1 << LENGTH_EXTRA_BITS[symbol]);
        }
        for (reduced, &symbol) in OFFSET_SYMBOL_LUT.iter().enumerate() {
            let symbol = symbol as usize;
            let base = OFFSET_BASE[symbol] as usize;
            assert!(reduced >= base);
            assert!(reduced - base < 1 << OFFSET_EXTRA_BITS[symbol]);
        }
    }

    #[test]
    fn luts_cover_every_symbol() {
        assert_eq!(LENGTH_SYMBOL_LUT[0], 0);
        assert_eq!(LENGTH_SYMBOL_LUT[LENGTH_COVERAGE - 1], 7);
        assert_eq!(OFFSET_SYMBOL_LUT[0], 0);
        assert_eq!(OFFSET_SYMBOL_LUT[OFFSET_COVERAGE - 1], 31);
    }
}
