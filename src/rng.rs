//! Randomness behind a single `next_f64` interface, so searches can run seeded, host-random, or from a scripted sequence.

/// A source of uniform floats in `[0, 1)`.
pub trait RandomSource {
    /// The next value in `[0, 1)`.
    fn next_f64(&mut self) -> f64;

    /// A uniform index in `0..bound`. `bound` must be non-zero.
    fn below(&mut self, bound: usize) -> usize {
        // guard against a source that returns exactly 1.0
        ((self.next_f64() * bound as f64).floor() as usize).min(bound - 1)
    }
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn next_f64(&mut self) -> f64 {
        (**self).next_f64()
    }
}

impl<R: RandomSource + ?Sized> RandomSource for Box<R> {
    fn next_f64(&mut self) -> f64 {
        (**self).next_f64()
    }
}

/// The seeded linear congruential generator: `value = (value * 9301 + 49297) mod 233280`.
///
/// Not suitable for anything beyond reproducible shuffles.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Lcg {
    value: u64,
}

impl Lcg {
    const MULTIPLIER: u64 = 9301;
    const INCREMENT: u64 = 49297;
    const MODULUS: u64 = 233280;

    /// Start the sequence at `seed`.
    pub fn new(seed: u64) -> Self {
        // reducing first keeps the arithmetic in range and leaves the sequence unchanged
        Self { value: seed % Self::MODULUS }
    }
}

impl RandomSource for Lcg {
    fn next_f64(&mut self) -> f64 {
        self.value = (self.value * Self::MULTIPLIER + Self::INCREMENT) % Self::MODULUS;
        self.value as f64 / Self::MODULUS as f64
    }
}

/// Randomness from the host: the thread RNG natively, `Math.random()` under WebAssembly.
#[derive(Debug, Default)]
pub struct HostRandom {
    #[cfg(not(target_arch = "wasm32"))]
    rng: rand::rngs::ThreadRng,
}

#[cfg(not(target_arch = "wasm32"))]
impl RandomSource for HostRandom {
    fn next_f64(&mut self) -> f64 {
        use rand::Rng;
        self.rng.gen::<f64>()
    }
}

#[cfg(all(target_arch = "wasm32", feature = "wasm"))]
impl RandomSource for HostRandom {
    fn next_f64(&mut self) -> f64 {
        js_sys::Math::random()
    }
}

#[cfg(all(target_arch = "wasm32", not(feature = "wasm")))]
compile_error!("WebAssembly builds need the `wasm` feature for host randomness");

/// Replays a fixed list of values, wrapping around at the end.
#[derive(Clone, Debug)]
pub struct FixedSequence {
    values: Vec<f64>,
    cursor: usize,
}

impl FixedSequence {
    /// Replay `values`. Each must be in `[0, 1)` and the list must be non-empty.
    pub fn new(values: Vec<f64>) -> Self {
        assert!(!values.is_empty(), "a fixed sequence needs at least one value");
        assert!(values.iter().all(|v| (0.0..1.0).contains(v)), "fixed sequence values must lie in [0, 1)");
        Self { values, cursor: 0 }
    }
}

impl RandomSource for FixedSequence {
    fn next_f64(&mut self) -> f64 {
        let value = self.values[self.cursor];
        self.cursor = (self.cursor + 1) % self.values.len();
        value
    }
}

/// An [`Lcg`] when `seed` is given, host randomness otherwise.
pub fn source_for(seed: Option<u64>) -> Box<dyn RandomSource> {
    match seed {
        Some(seed) => Box::new(Lcg::new(seed)),
        None => Box::new(HostRandom::default()),
    }
}

/// A Fisher-Yates shuffled copy of `items`.
pub fn shuffle<T: Clone, R: RandomSource + ?Sized>(items: &[T], rng: &mut R) -> Vec<T> {
    let mut shuffled = items.to_vec();
    for i in (1..shuffled.len()).rev() {
        let j = rng.below(i + 1);
        shuffled.swap(i, j);
    }
    shuffled
}
