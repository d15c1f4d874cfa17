//! Convoluter core: an offline audio effects-chain engine.
//!
//! The pipeline applies a fixed, ordered chain of effects (filtering,
//! distortion, reverb, equalization, noise/ambience mixing) to a whole
//! in-memory waveform. File I/O and any user interface live outside
//! this crate.

pub mod domain;
