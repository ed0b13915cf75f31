//! Logistic helpers and adaptive probability maps.
//!
//! An adaptive probability map (APM, also known as SSE) refines an input
//! prediction under a small context. Each context owns 33 buckets spread
//! evenly over the stretched probability domain; a lookup interpolates
//! between the two buckets surrounding the input and the next call trains
//! both of them on the bit that was actually coded.

/// Logistic function `4096 / (1 + e^-x)` sampled at `x = -8, -7.5, ..., 8`.
const SQUASH_POINTS: [i32; 33] = [
    1, 2, 3, 6, 10, 16, 27, 45, 73, 120, 194, 310, 488, 747, 1101, 1546, 2047, 2549, 2994, 3348,
    3607, 3785, 3901, 3975, 4022, 4050, 4068, 4079, 4085, 4089, 4092, 4093, 4094,
];

/// Logistic function: maps the stretched domain `[-2047, 2047]` onto
/// probabilities in `[0, 4095]`.
pub const fn squash(d: i32) -> i32 {
    if d > 2047 {
        return 4095;
    }
    if d < -2047 {
        return 0;
    }
    let w = d & 127;
    let i = ((d >> 7) + 16) as usize;
    (SQUASH_POINTS[i] * (128 - w) + SQUASH_POINTS[i + 1] * w + 64) >> 7
}

/// Inverse of [`squash`], tabulated for every 12-bit probability.
const STRETCH_TABLE: [i16; 4096] = {
    let mut table = [0i16; 4096];
    let mut next = 0usize;
    let mut x = -2047;
    while x <= 2047 {
        let v = squash(x) as usize;
        while next <= v {
            table[next] = x as i16;
            next += 1;
        }
        x += 1;
    }
    while next < 4096 {
        table[next] = 2047;
        next += 1;
    }
    table
};

/// Logit: maps a probability in `[0, 4095]` to `[-2047, 2047]`.
#[inline]
pub fn stretch(p: u32) -> i32 {
    STRETCH_TABLE[(p & 4095) as usize] as i32
}

/// Buckets per context.
const BUCKETS: usize = 33;

/// Adaptive probability map over `contexts` contexts.
#[derive(Debug, Clone)]
pub struct AdaptiveProbMap {
    table: Vec<u16>,
    index: usize,
    rate: u32,
}

impl AdaptiveProbMap {
    /// Default adaptation rate (shift).
    pub const DEFAULT_RATE: u32 = 7;

    /// Create a map with `contexts` contexts, each starting as the identity.
    pub fn new(contexts: usize) -> Self {
        Self::with_rate(contexts, Self::DEFAULT_RATE)
    }

    /// Create a map with an explicit adaptation rate.
    pub fn with_rate(contexts: usize, rate: u32) -> Self {
        let mut table = vec![0u16; contexts.max(1) * BUCKETS];
        for row in table.chunks_exact_mut(BUCKETS) {
            for (j, slot) in row.iter_mut().enumerate() {
                *slot = (squash((j as i32 - 16) * 128) * 16) as u16;
            }
        }
        Self {
            table,
            index: 0,
            rate,
        }
    }

    /// Train the previous lookup on `bit`, then refine `pr` under `ctx`.
    ///
    /// `ctx` must be below the number of contexts given at construction.
    #[inline]
    pub fn get(&mut self, bit: u32, pr: u32, ctx: usize) -> u32 {
        let bit = (bit & 1) as i32;
        let g = (bit << 16) + (bit << self.rate) - bit - bit;
        for slot in &mut self.table[self.index..self.index + 2] {
            let t = *slot as i32;
            *slot = (t + ((g - t) >> self.rate)) as u16;
        }

        let s = stretch(pr) + 2048;
        let w = s & 127;
        self.index = ctx * BUCKETS + (s >> 7) as usize;
        let lo = self.table[self.index] as i32;
        let hi = self.table[self.index + 1] as i32;
        ((lo * (128 - w) + hi * w) >> 11) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_squash_bounds() {
        assert_eq!(squash(-5000), 0);
        assert_eq!(squash(5000), 4095);
        assert_eq!(squash(0), 2047);
        let mut prev = 0;
        for d in -2047..=2047 {
            let v = squash(d);
            assert!(v >= prev, "squash not monotonic at {d}");
            prev = v;
        }
    }

    #[test]
    fn test_stretch_inverts_squash() {
        for p in [1u32, 100, 1000, 2047, 3000, 4000, 4094] {
            let back = squash(stretch(p));
            assert!((back - p as i32).abs() <= 40, "p={p} back={back}");
        }
        assert_eq!(stretch(4095), 2047);
    }

    #[test]
    fn test_apm_starts_near_identity() {
        let mut apm = AdaptiveProbMap::new(4);
        for p in [200u32, 1024, 2048, 3072, 3900] {
            let out = apm.get(0, p, 1) as i32;
            assert!((out - p as i32).abs() <= 64, "p={p} out={out}");
        }
    }

    #[test]
    fn test_apm_adapts_and_stays_in_range() {
        let mut apm = AdaptiveProbMap::new(2);
        let mut out = 0;
        for _ in 0..2000 {
            out = apm.get(1, 2048, 0);
            assert!(out <= 4095);
        }
        assert!(out > 3500, "APM did not adapt: {out}");

        for _ in 0..2000 {
            out = apm.get(0, 2048, 1);
        }
        assert!(out < 600, "APM did not adapt: {out}");
    }
}
