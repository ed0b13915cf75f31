//! Bit-history context model with secondary estimation.
//!
//! The model keeps one bit-history state per partial-byte context. A state
//! encodes the recent 0/1 counts seen in that context (see [`STATE_TABLE`]);
//! a state map turns it into a probability, and three adaptive probability
//! maps refine the result using the previous byte, whether the current byte
//! still matches it, and the length of the current byte run.

use crate::apm::AdaptiveProbMap;
use crate::predictor::{PROB_HALF, Predictor};

/// Bit-history state machine.
///
/// Entry `s` holds `[next state on 0, next state on 1, n0, n1]`, where
/// `n0`/`n1` approximate the number of zeros and ones the state stands for.
/// State 0 means no history; states 1-30 spell out every history of up to
/// four bits; the rest track approximate count pairs, discounting the
/// opposite count when a bit is observed. States 253-255 are unused.
pub const STATE_TABLE: [[u8; 4]; 256] = [
    [1, 2, 0, 0], [3, 5, 1, 0], [4, 6, 0, 1], [7, 10, 2, 0],
    [8, 12, 1, 1], [9, 13, 1, 1], [11, 14, 0, 2], [15, 19, 3, 0],
    [16, 23, 2, 1], [17, 24, 2, 1], [18, 25, 2, 1], [20, 27, 1, 2],
    [21, 28, 1, 2], [22, 29, 1, 2], [26, 30, 0, 3], [31, 33, 4, 0],
    [32, 35, 3, 1], [32, 35, 3, 1], [32, 35, 3, 1], [32, 35, 3, 1],
    [34, 37, 2, 2], [34, 37, 2, 2], [34, 37, 2, 2], [34, 37, 2, 2],
    [34, 37, 2, 2], [34, 37, 2, 2], [36, 39, 1, 3], [36, 39, 1, 3],
    [36, 39, 1, 3], [36, 39, 1, 3], [38, 40, 0, 4], [41, 43, 5, 0],
    [42, 45, 4, 1], [42, 45, 4, 1], [44, 47, 3, 2], [44, 47, 3, 2],
    [46, 49, 2, 3], [46, 49, 2, 3], [48, 51, 1, 4], [48, 51, 1, 4],
    [50, 52, 0, 5], [53, 43, 6, 0], [54, 57, 5, 1], [54, 57, 5, 1],
    [56, 59, 4, 2], [56, 59, 4, 2], [58, 61, 3, 3], [58, 61, 3, 3],
    [60, 63, 2, 4], [60, 63, 2, 4], [62, 65, 1, 5], [62, 65, 1, 5],
    [50, 66, 0, 6], [67, 55, 7, 0], [68, 57, 6, 1], [68, 57, 6, 1],
    [70, 73, 5, 2], [70, 73, 5, 2], [72, 75, 4, 3], [72, 75, 4, 3],
    [74, 77, 3, 4], [74, 77, 3, 4], [76, 79, 2, 5], [76, 79, 2, 5],
    [62, 81, 1, 6], [62, 81, 1, 6], [64, 82, 0, 7], [83, 69, 8, 0],
    [84, 71, 7, 1], [84, 71, 7, 1], [86, 73, 6, 2], [86, 73, 6, 2],
    [44, 59, 5, 3], [44, 59, 5, 3], [58, 61, 4, 4], [58, 61, 4, 4],
    [60, 49, 3, 5], [60, 49, 3, 5], [76, 89, 2, 6], [76, 89, 2, 6],
    [78, 91, 1, 7], [78, 91, 1, 7], [80, 92, 0, 8], [93, 69, 9, 0],
    [94, 87, 8, 1], [94, 87, 8, 1], [96, 45, 7, 2], [96, 45, 7, 2],
    [48, 99, 2, 7], [48, 99, 2, 7], [88, 101, 1, 8], [88, 101, 1, 8],
    [80, 102, 0, 9], [103, 69, 10, 0], [104, 87, 9, 1], [104, 87, 9, 1],
    [106, 57, 8, 2], [106, 57, 8, 2], [62, 109, 2, 8], [62, 109, 2, 8],
    [88, 111, 1, 9], [88, 111, 1, 9], [80, 112, 0, 10], [113, 85, 11, 0],
    [114, 87, 10, 1], [114, 87, 10, 1], [116, 57, 9, 2], [116, 57, 9, 2],
    [62, 119, 2, 9], [62, 119, 2, 9], [88, 121, 1, 10], [88, 121, 1, 10],
    [90, 122, 0, 11], [123, 85, 12, 0], [124, 97, 11, 1], [124, 97, 11, 1],
    [126, 57, 10, 2], [126, 57, 10, 2], [62, 129, 2, 10], [62, 129, 2, 10],
    [98, 131, 1, 11], [98, 131, 1, 11], [90, 132, 0, 12], [133, 85, 13, 0],
    [134, 97, 12, 1], [134, 97, 12, 1], [136, 57, 11, 2], [136, 57, 11, 2],
    [62, 139, 2, 11], [62, 139, 2, 11], [98, 141, 1, 12], [98, 141, 1, 12],
    [90, 142, 0, 13], [143, 95, 14, 0], [144, 97, 13, 1], [144, 97, 13, 1],
    [68, 57, 12, 2], [68, 57, 12, 2], [62, 81, 2, 12], [62, 81, 2, 12],
    [98, 147, 1, 13], [98, 147, 1, 13], [100, 148, 0, 14], [149, 95, 15, 0],
    [150, 107, 14, 1], [150, 107, 14, 1], [108, 151, 1, 14], [108, 151, 1, 14],
    [100, 152, 0, 15], [153, 95, 16, 0], [154, 107, 15, 1], [108, 155, 1, 15],
    [100, 156, 0, 16], [157, 95, 17, 0], [158, 107, 16, 1], [108, 159, 1, 16],
    [100, 160, 0, 17], [161, 105, 18, 0], [162, 107, 17, 1], [108, 163, 1, 17],
    [110, 164, 0, 18], [165, 105, 19, 0], [166, 117, 18, 1], [118, 167, 1, 18],
    [110, 168, 0, 19], [169, 105, 20, 0], [170, 117, 19, 1], [118, 171, 1, 19],
    [110, 172, 0, 20], [173, 105, 21, 0], [174, 117, 20, 1], [118, 175, 1, 20],
    [110, 176, 0, 21], [177, 105, 22, 0], [178, 117, 21, 1], [118, 179, 1, 21],
    [110, 180, 0, 22], [181, 115, 23, 0], [182, 117, 22, 1], [118, 183, 1, 22],
    [120, 184, 0, 23], [185, 115, 24, 0], [186, 127, 23, 1], [128, 187, 1, 23],
    [120, 188, 0, 24], [189, 115, 25, 0], [190, 127, 24, 1], [128, 191, 1, 24],
    [120, 192, 0, 25], [193, 115, 26, 0], [194, 127, 25, 1], [128, 195, 1, 25],
    [120, 196, 0, 26], [197, 115, 27, 0], [198, 127, 26, 1], [128, 199, 1, 26],
    [120, 200, 0, 27], [201, 115, 28, 0], [202, 127, 27, 1], [128, 203, 1, 27],
    [120, 204, 0, 28], [205, 115, 29, 0], [206, 127, 28, 1], [128, 207, 1, 28],
    [120, 208, 0, 29], [209, 125, 30, 0], [210, 127, 29, 1], [128, 211, 1, 29],
    [130, 212, 0, 30], [213, 125, 31, 0], [214, 137, 30, 1], [138, 215, 1, 30],
    [130, 216, 0, 31], [217, 125, 32, 0], [218, 137, 31, 1], [138, 219, 1, 31],
    [130, 220, 0, 32], [221, 125, 33, 0], [222, 137, 32, 1], [138, 223, 1, 32],
    [130, 224, 0, 33], [225, 125, 34, 0], [226, 137, 33, 1], [138, 227, 1, 33],
    [130, 228, 0, 34], [229, 125, 35, 0], [230, 137, 34, 1], [138, 231, 1, 34],
    [130, 232, 0, 35], [233, 125, 36, 0], [234, 137, 35, 1], [138, 235, 1, 35],
    [130, 236, 0, 36], [237, 125, 37, 0], [238, 137, 36, 1], [138, 239, 1, 36],
    [130, 240, 0, 37], [241, 125, 38, 0], [242, 137, 37, 1], [138, 243, 1, 37],
    [130, 244, 0, 38], [245, 135, 39, 0], [246, 137, 38, 1], [138, 247, 1, 38],
    [140, 248, 0, 39], [249, 135, 40, 0], [250, 69, 39, 1], [80, 251, 1, 39],
    [140, 252, 0, 40], [249, 135, 41, 0], [250, 69, 40, 1], [80, 251, 1, 40],
    [140, 252, 0, 41], [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0],
];

/// Maps a bit-history state to a probability, adapting as bits are seen.
#[derive(Debug, Clone)]
struct StateMap {
    data: [i32; 256],
    ctx: usize,
}

impl StateMap {
    fn new() -> Self {
        let mut data = [0i32; 256];
        for (slot, entry) in data.iter_mut().zip(STATE_TABLE.iter()) {
            let n0 = entry[2] as i32;
            let n1 = entry[3] as i32;
            *slot = ((n1 + 1) << 16) / (n0 + n1 + 3);
        }
        Self { data, ctx: 0 }
    }

    /// Train the previous state on `bit`, then predict for `state`.
    #[inline]
    fn get(&mut self, bit: u32, state: u8) -> u32 {
        let d = self.data[self.ctx];
        self.data[self.ctx] = d + ((((bit as i32) << 16) - d + 256) >> 9);
        self.ctx = state as usize;
        (self.data[self.ctx] >> 4) as u32
    }
}

/// Context-mixing predictor built on bit histories.
#[derive(Debug, Clone)]
pub struct PaqPredictor {
    states: [u8; 256],
    sm: StateMap,
    apm_match: AdaptiveProbMap,
    apm_run: AdaptiveProbMap,
    apm_order1: AdaptiveProbMap,
    pr: u32,
    /// Bits of the current byte seen so far, behind a leading 1.
    c0: u32,
    /// Last four complete bytes, most recent in the low byte.
    c4: u32,
    /// Number of bits of the current byte seen so far.
    known: u32,
    run: u32,
    run_ctx: usize,
}

impl PaqPredictor {
    /// Create a predictor with no history.
    pub fn new() -> Self {
        Self {
            states: [0; 256],
            sm: StateMap::new(),
            apm_match: AdaptiveProbMap::new(1024),
            apm_run: AdaptiveProbMap::new(1024),
            apm_order1: AdaptiveProbMap::new(65536),
            pr: PROB_HALF,
            c0: 1,
            c4: 0,
            known: 0,
            run: 0,
            run_ctx: 0,
        }
    }

    fn end_of_byte(&mut self) {
        let byte = self.c0 & 0xFF;
        if byte == self.c4 & 0xFF {
            if self.run < 4 && self.run != 2 {
                self.run_ctx += 256;
            }
            self.run += 1;
        } else {
            self.run = 0;
            self.run_ctx = 0;
        }
        self.c4 = (self.c4 << 8) | byte;
        self.c0 = 1;
        self.known = 0;
    }
}

impl Default for PaqPredictor {
    fn default() -> Self {
        Self::new()
    }
}

impl Predictor for PaqPredictor {
    fn update(&mut self, bit: u32) {
        let bit = bit & 1;
        let c0 = self.c0 as usize;
        self.states[c0] = STATE_TABLE[self.states[c0] as usize][bit as usize];

        self.c0 = (self.c0 << 1) | bit;
        if self.c0 > 255 {
            self.end_of_byte();
        } else {
            self.known += 1;
        }

        // 2 when the bits seen so far agree with the previous byte, plus the
        // bit the previous byte has at the next position
        let prev = self.c4 & 0xFF;
        let mut c1d = if ((prev | 256) >> (8 - self.known)) == self.c0 {
            2
        } else {
            0
        };
        c1d += (prev >> (7 - self.known)) & 1;

        let c0 = self.c0 as usize;
        let p = self.sm.get(bit, self.states[c0]);
        let p = self.apm_match.get(bit, p, c0 | ((c1d as usize) << 8));
        let p = (3 * self.apm_run.get(bit, p, prev as usize | self.run_ctx) + p + 2) >> 2;
        let p = (3 * self.apm_order1.get(bit, p, c0 | (self.c4 & 0xFF00) as usize) + p + 2) >> 2;

        // Nudge below-even predictions up by one
        self.pr = if p < PROB_HALF { p + 1 } else { p };
    }

    #[inline]
    fn get(&self) -> u32 {
        self.pr
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predictor::PROB_MAX;

    fn feed_byte(p: &mut PaqPredictor, byte: u8) {
        for shift in (0..8).rev() {
            p.update(((byte >> shift) & 1) as u32);
            assert!(p.get() <= PROB_MAX);
        }
    }

    #[test]
    fn test_state_table_transitions_are_valid() {
        for (state, entry) in STATE_TABLE.iter().enumerate().take(253) {
            assert!(entry[0] < 253, "state {state} has invalid next-0");
            assert!(entry[1] < 253, "state {state} has invalid next-1");
        }
        // Histories of one bit
        assert_eq!(STATE_TABLE[0][0], 1);
        assert_eq!(STATE_TABLE[0][1], 2);
        assert_eq!(STATE_TABLE[1][2..], [1, 0]);
        assert_eq!(STATE_TABLE[2][2..], [0, 1]);
    }

    #[test]
    fn test_initial_prediction() {
        assert_eq!(PaqPredictor::new().get(), 2048);
    }

    #[test]
    fn test_learns_repeated_byte() {
        let mut p = PaqPredictor::new();
        for _ in 0..200 {
            feed_byte(&mut p, 0xFF);
        }
        assert!(p.get() > 3800, "prediction {} did not adapt", p.get());

        let mut p = PaqPredictor::new();
        for _ in 0..200 {
            feed_byte(&mut p, 0x00);
        }
        assert!(p.get() < 300, "prediction {} did not adapt", p.get());
    }

    #[test]
    fn test_deterministic() {
        let data: Vec<u8> = (0..2000u32).map(|i| (i * 7 + i / 13) as u8).collect();
        let mut a = PaqPredictor::new();
        let mut b = PaqPredictor::new();
        for &byte in &data {
            feed_byte(&mut a, byte);
            feed_byte(&mut b, byte);
            assert_eq!(a.get(), b.get());
        }
    }

    #[test]
    fn test_run_context_saturates() {
        let mut p = PaqPredictor::new();
        for _ in 0..10 {
            feed_byte(&mut p, b'a');
        }
        assert!(p.run_ctx < 1024);
        assert_eq!(p.run_ctx, 768);
        feed_byte(&mut p, b'b');
        assert_eq!(p.run_ctx, 0);
        assert_eq!(p.run, 0);
    }
}
