/*
 * Brute-force longest-match search.
 *
 * The window is a single slice: bytes before `position` are searchable
 * history (the current block plus up to one previous payload), bytes from
 * `position` to `search_end` are still unencoded. How much history the
 * caller exposes in front of the block start is exactly the codebook-back
 * budget.
 */

use crate::mdeflate_constants::{
    MATCH_LENGTH_OFFSET, MAX_BACK_DISTANCE, MAX_MATCH_LENGTH, OFFSET_EXTRA_BITS,
};
use crate::symbol_tables::OFFSET_SYMBOL_LUT;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Match {
    pub length: usize,
    pub offset: usize,
}

/// Longest back-reference for `window[position..search_end]`, or `None` when
/// nothing of at least MATCH_LENGTH_OFFSET bytes is worth emitting. Ties keep
/// the smallest offset.
pub fn find_match(window: &[u8], position: usize, search_end: usize) -> Option<Match> {
    let max_length = (search_end - position).min(MAX_MATCH_LENGTH);
    let max_back = position.min(MAX_BACK_DISTANCE);

    let mut best_length = 0usize;
    let mut best_offset = 0usize;

    let mut offset = 1usize;
    while offset < max_back {
        if best_length >= max_length {
            break;
        }
        /* Cheap filter: the candidate must match on the first byte and on
         * the byte that would extend the current best. */
        if window[position - offset] == window[position]
            && window[position - offset + best_length] == window[position + best_length]
        {
            let mut length = 1;
            while length < max_length
                && window[position - offset + length] == window[position + length]
            {
                length += 1;
            }
            if length > best_length {
                best_length = length;
                best_offset = offset;
            }
        }
        offset += 1;
    }

    /* At the minimum length the length/offset pair can cost more than the
     * literals it replaces; 14 approximates the two code-word sizes. */
    if best_length == MATCH_LENGTH_OFFSET {
        let offset_symbol = OFFSET_SYMBOL_LUT[best_offset - 1] as usize;
        let extra_bits = OFFSET_EXTRA_BITS[offset_symbol] as usize;
        if extra_bits + 14 > best_length * 8 {
            best_length = 0;
        }
    }

    if best_length >= MATCH_LENGTH_OFFSET {
        Some(Match {
            length: best_length,
            offset: best_offset,
        })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::{find_match, Match};
    use crate::mdeflate_constants::{MATCH_LENGTH_OFFSET, MAX_BACK_DISTANCE, MAX_MATCH_LENGTH};

    fn assert_match_is_real(window: &[u8], position: usize, m: Match) {
        assert!(m.length >= MATCH_LENGTH_OFFSET);
        assert!(m.length <= MAX_MATCH_LENGTH);
        assert!(m.offset >= 1);
        assert!(m.offset <= position);
        assert!(m.offset < MAX_BACK_DISTANCE);
        assert_eq!(
            &window[position..position + m.length],
            &window[position - m.offset..position - m.offset + m.length]
        );
    }

    #[test]
    fn finds_nothing_without_history() {
        assert_eq!(find_match(b"abcabc", 0, 6), None);
    }

    #[test]
    fn finds_a_periodic_match() {
        let window = b"ABABABABABABABABAB";
        /* the scan bound is exclusive, so position 3 is the first place the
         * period-2 reference is reachable */
        assert_eq!(find_match(window, 2, window.len()), None);
        let m = find_match(window, 3, window.len()).unwrap();
        assert_eq!(m.offset, 2);
        assert_eq!(m.length, window.len() - 3);
        assert_match_is_real(window, 3, m);
    }

    #[test]
    fn prefers_the_smallest_offset_on_ties() {
        let window = b"abcXabcYabcdef";
        let m = find_match(window, 8, window.len()).unwrap();
        /* "abc" repeats at offsets 4 and 8; the scan keeps the earlier hit */
        assert_eq!(m.offset, 4);
        assert_eq!(m.length, 3);
    }

    #[test]
    fn clamps_to_the_maximum_length() {
        let window = vec![0u8; MAX_MATCH_LENGTH + 144];
        let m = find_match(&window, 2, window.len()).unwrap();
        assert_eq!(m.offset, 1);
        assert_eq!(m.length, MAX_MATCH_LENGTH);
        assert_match_is_real(&window, 2, m);
    }

    #[test]
    fn stops_at_the_unencoded_tail() {
        let window = b"Xabcde_abcdef";
        let m = find_match(window, 7, 10).unwrap();
        assert_eq!(m.offset, 6);
        assert_eq!(m.length, 3);
    }

    #[test]
    fn every_match_on_noisy_data_is_real() {
        /* small alphabet so matches actually occur */
        let mut state = 0x0123_4567_89AB_CDEFu64;
        let mut window = Vec::with_capacity(4096);
        for _ in 0..4096 {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            window.push((state & 0x3) as u8);
        }
        let mut position = 1;
        while position < window.len() {
            if let Some(m) = find_match(&window, position, window.len()) {
                assert_match_is_real(&window, position, m);
                position += m.length;
            } else {
                position += 1;
            }
        }
    }
}
