//! Seedable pseudo-random number generator (xorshift64).
//! Deterministic and allocation free; backs the random bounce curve.

/// Seedable pseudo-random number generator (xorshift64).
#[derive(Debug, Clone)]
pub struct Rng {
    state: u64,
}

impl Rng {
    pub fn new(seed: u64) -> Self {
        Rng {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    /// Generator keyed on a curve sample time. Neighbouring times get
    /// unrelated streams because the raw bits are scrambled first.
    pub fn from_sample(t: f32) -> Self {
        Rng::new(scramble(u64::from(t.to_bits())))
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Generate a random number in [0, upper_bound).
    pub fn next_int(&mut self, upper_bound: u32) -> u32 {
        (self.next_u64() % u64::from(upper_bound.max(1))) as u32
    }

    /// Generate a random number in the inclusive range [low, high].
    /// The bounds may be given in either order.
    pub fn next_in_range(&mut self, low: i32, high: i32) -> i32 {
        let (low, high) = if low <= high { (low, high) } else { (high, low) };
        let span = (i64::from(high) - i64::from(low) + 1) as u64;
        (i64::from(low) + (self.next_u64() % span) as i64) as i32
    }
}

// splitmix64 finalizer
fn scramble(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
