//! Bit probability predictors.
//!
//! A predictor estimates the probability that the next bit is 1, as a 12-bit
//! value in `[0, 4095]` where 4096 stands for certainty. The binary entropy
//! coder asks [`Predictor::get`] before every bit and reports the actual bit
//! through [`Predictor::update`] right after, on both the encode and the
//! decode side. Predictions must be a pure function of the update history.

/// Number of bits in a prediction.
pub const PROB_BITS: u32 = 12;

/// Largest prediction value.
pub const PROB_MAX: u32 = (1 << PROB_BITS) - 1;

/// Neutral prediction (50%).
pub const PROB_HALF: u32 = 1 << (PROB_BITS - 1);

/// Adaptive model of the next bit.
pub trait Predictor {
    /// Train the model on the bit that was just coded.
    fn update(&mut self, bit: u32);

    /// Probability that the next bit is 1, in `[0, 4095]`.
    fn get(&self) -> u32;
}

impl<P: Predictor + ?Sized> Predictor for &mut P {
    #[inline]
    fn update(&mut self, bit: u32) {
        (**self).update(bit);
    }

    #[inline]
    fn get(&self) -> u32 {
        (**self).get()
    }
}

impl<P: Predictor + ?Sized> Predictor for Box<P> {
    #[inline]
    fn update(&mut self, bit: u32) {
        (**self).update(bit);
    }

    #[inline]
    fn get(&self) -> u32 {
        (**self).get()
    }
}

/// Predictor returning the same probability for every bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedPredictor {
    probability: u32,
}

impl FixedPredictor {
    /// Create a predictor with the given probability, clamped to `[0, 4095]`.
    pub fn new(probability: u32) -> Self {
        Self {
            probability: probability.min(PROB_MAX),
        }
    }
}

impl Default for FixedPredictor {
    fn default() -> Self {
        Self::new(PROB_HALF)
    }
}

impl Predictor for FixedPredictor {
    #[inline]
    fn update(&mut self, _bit: u32) {}

    #[inline]
    fn get(&self) -> u32 {
        self.probability
    }
}

/// Shift applied to the counter update.
const ORDER0_RATE: u32 = 6;

/// Order-0 predictor.
///
/// Keeps one 16-bit counter per partial-byte context: the bits of the
/// current byte seen so far, prefixed with a 1 (contexts 1..=255).
#[derive(Debug, Clone)]
pub struct Order0Predictor {
    probs: [u16; 256],
    ctx: usize,
}

impl Order0Predictor {
    /// Create a predictor with every context at 50%.
    pub fn new() -> Self {
        Self {
            probs: [1 << 15; 256],
            ctx: 1,
        }
    }
}

impl Default for Order0Predictor {
    fn default() -> Self {
        Self::new()
    }
}

impl Predictor for Order0Predictor {
    #[inline]
    fn update(&mut self, bit: u32) {
        let p = self.probs[self.ctx] as u32;
        let p = if bit != 0 {
            p + ((65536 - p) >> ORDER0_RATE)
        } else {
            p - (p >> ORDER0_RATE)
        };
        self.probs[self.ctx] = p as u16;

        self.ctx = (self.ctx << 1) | (bit & 1) as usize;
        if self.ctx > 255 {
            self.ctx = 1;
        }
    }

    #[inline]
    fn get(&self) -> u32 {
        (self.probs[self.ctx] >> 4) as u32
    }
}
