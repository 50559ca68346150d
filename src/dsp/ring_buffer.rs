//! # Ring Buffer
//!
//! A fixed-capacity circular store of past samples. Every time-based effect
//! in this crate (the delay lines, the chorus voices) is a ring buffer with a
//! write head that moves forward one slot per sample and one or more read
//! heads trailing behind it.
//!
//! ## Power-of-two capacity
//!
//! The capacity is always rounded up to a power of two. That turns the
//! wraparound into a bitmask instead of a modulo:
//!
//! ```text
//! index & (capacity - 1)   ==   index % capacity   (when capacity = 2^k)
//! ```
//!
//! An AND is a single cycle; an integer division is not. It also means the
//! write position can be wrapped with `wrapping_sub` and masked, so reading
//! "behind" the write head never needs a negative-index special case.
//!
//! ## Read offsets
//!
//! `read(d)` returns the sample written `d` steps before the most recent
//! write. `read(0.0)` is the newest sample, `read(1.0)` the one before it.
//! For fractional offsets the two nearest samples are blended:
//!
//! ```text
//! result = newer * (1 - frac) + older * frac
//! ```

/// A circular sample buffer with bitmask wraparound.
///
/// Allocated once, up front, to the largest delay the owner will ever
/// need. Nothing in here allocates afterwards.
pub struct RingBuffer {
    /// The stored samples. Length is always a power of two.
    buffer: Vec<f32>,

    /// `buffer.len() - 1`. ANDing an index with this wraps it.
    mask: usize,

    /// Where the next sample will be written.
    write_pos: usize,
}

impl RingBuffer {
    /// Create a buffer holding at least `min_capacity` samples.
    ///
    /// The real capacity is the next power of two (at least 2, so that an
    /// interpolated read always has two slots to look at).
    pub fn new(min_capacity: usize) -> Self {
        let capacity = min_capacity.max(2).next_power_of_two();
        Self {
            buffer: vec![0.0; capacity],
            mask: capacity - 1,
            write_pos: 0,
        }
    }

    /// Number of slots in the buffer.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Store a sample at the write head and advance it.
    #[inline]
    pub fn write(&mut self, sample: f32) {
        self.buffer[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) & self.mask;
    }

    /// Read the sample written `delay` steps before the most recent write.
    ///
    /// `delay` may be fractional, in which case the two neighbouring
    /// samples are linearly interpolated. Offsets outside
    /// `[0, capacity - 1]` are not an error: they wrap around and return
    /// whatever is stored there. Callers clamp at the point where the
    /// delay time is accepted, not here. Negative and non-finite offsets
    /// read the newest sample.
    #[inline]
    pub fn read(&self, delay: f32) -> f32 {
        let delay = if delay.is_finite() { delay.max(0.0) } else { 0.0 };
        // `as usize` saturates for huge offsets; masking first keeps the
        // index arithmetic below from overflowing.
        let whole = (delay as usize) & self.mask;
        let frac = delay.fract();

        // The most recent write sits one slot behind the write head.
        let newer = self.write_pos.wrapping_sub(1 + whole) & self.mask;
        let older = self.write_pos.wrapping_sub(2 + whole) & self.mask;

        self.buffer[newer] * (1.0 - frac) + self.buffer[older] * frac
    }

    /// Zero the contents and rewind the write head.
    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_rounds_to_power_of_two() {
        assert_eq!(RingBuffer::new(100).capacity(), 128);
        assert_eq!(RingBuffer::new(128).capacity(), 128);
        assert_eq!(RingBuffer::new(0).capacity(), 2);
        assert_eq!(RingBuffer::new(120_000).capacity(), 131_072);
    }

    #[test]
    fn test_offset_zero_is_newest_sample() {
        let mut rb = RingBuffer::new(16);
        rb.write(0.25);
        rb.write(0.75);

        assert_eq!(rb.read(0.0), 0.75);
        assert_eq!(rb.read(1.0), 0.25);
    }

    /// An impulse is visible at exactly one offset and silence everywhere
    /// else, for every offset the buffer can hold.
    #[test]
    fn test_impulse_round_trip_at_every_offset() {
        let mut rb = RingBuffer::new(64);
        let capacity = rb.capacity();

        rb.write(1.0);
        for elapsed in 0..=(capacity - 2) {
            for d in 0..=(capacity - 2) {
                let expected = if d == elapsed { 1.0 } else { 0.0 };
                let got = rb.read(d as f32);
                assert_eq!(
                    got, expected,
                    "elapsed {elapsed}, offset {d}: expected {expected}, got {got}"
                );
            }
            rb.write(0.0);
        }
    }

    #[test]
    fn test_half_sample_read_is_mean_of_neighbours() {
        let mut rb = RingBuffer::new(32);
        for i in 0..32 {
            rb.write((i * i) as f32 * 0.01);
        }

        for d in 0..30 {
            let a = rb.read(d as f32);
            let b = rb.read(d as f32 + 1.0);
            let mid = rb.read(d as f32 + 0.5);
            assert!(
                (mid - (a + b) * 0.5).abs() < 1e-6,
                "offset {d}.5: expected {}, got {mid}",
                (a + b) * 0.5
            );
        }
    }

    #[test]
    fn test_wraps_past_end() {
        let mut rb = RingBuffer::new(4);
        for i in 0..6 {
            rb.write(i as f32);
        }

        // The last four writes survive: 2, 3, 4, 5.
        assert_eq!(rb.read(0.0), 5.0);
        assert_eq!(rb.read(1.0), 4.0);
        assert_eq!(rb.read(3.0), 2.0);
    }

    #[test]
    fn test_out_of_range_offset_wraps_instead_of_panicking() {
        let mut rb = RingBuffer::new(4);
        rb.write(1.0);

        // Offset 4 on a 4-slot ring lands back on the newest sample.
        assert_eq!(rb.read(4.0), 1.0);
        assert!(rb.read(1000.5).is_finite());

        for huge in [1e30, f32::MAX, f32::INFINITY, f32::NEG_INFINITY, f32::NAN] {
            let got = rb.read(huge);
            assert!(got.is_finite(), "offset {huge} read {got}");
        }
    }

    #[test]
    fn test_clear() {
        let mut rb = RingBuffer::new(8);
        rb.write(0.5);
        rb.clear();

        for d in 0..8 {
            assert_eq!(rb.read(d as f32), 0.0);
        }
    }
}
