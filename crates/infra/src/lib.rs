//! Convoluter infrastructure: the file-facing collaborators of the
//! core pipeline
//!
//! Core operates purely on in-memory [`Waveform`]s; this crate decodes
//! and encodes WAV files and loads ambience clip directories into the
//! registry the pipeline reads from.
//!
//! [`Waveform`]: convoluter_core::domain::Waveform

pub mod ambience;
pub mod wav;

pub use ambience::load_ambience_dir;
pub use wav::{read_wav, write_wav, WavError};
