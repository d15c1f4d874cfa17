//! Ambience clip loading
//!
//! Walks a directory of WAV files and builds the read-only
//! [`AmbienceRegistry`] the pipeline looks clips up in. The logical
//! name of each clip is the file stem, so `traffic.wav` registers as
//! `traffic`.

use crate::wav::{read_wav, Result};
use convoluter_core::domain::noise::AmbienceClip;
use convoluter_core::domain::AmbienceRegistry;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Load every `*.wav` in `dir` into a fresh registry
pub fn load_ambience_dir<P: AsRef<Path>>(dir: P) -> Result<AmbienceRegistry> {
    let dir = dir.as_ref();
    let mut registry = AmbienceRegistry::new();

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().map(|e| e == "wav").unwrap_or(false) {
            let Some(name) = path.file_stem().and_then(|n| n.to_str()) else {
                debug!(path = %path.display(), "skipping clip with unreadable name");
                continue;
            };
            let waveform = read_wav(&path)?;
            registry.insert(AmbienceClip::new(name, waveform));
        }
    }

    info!(dir = %dir.display(), clips = registry.len(), "ambience registry loaded");
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wav::write_wav;
    use convoluter_core::domain::Waveform;
    use tempfile::TempDir;

    #[test]
    fn test_load_directory() {
        let dir = TempDir::new().unwrap();

        let clip = Waveform::new(vec![100; 64], 8000).unwrap();
        write_wav(&clip, dir.path().join("traffic.wav")).unwrap();
        write_wav(&clip, dir.path().join("chatter.wav")).unwrap();
        std::fs::write(dir.path().join("readme.txt"), "not audio").unwrap();

        let registry = load_ambience_dir(dir.path()).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names(), vec!["chatter", "traffic"]);
        assert_eq!(registry.get("traffic").unwrap().waveform(), &clip);
    }

    #[test]
    fn test_empty_directory() {
        let dir = TempDir::new().unwrap();
        let registry = load_ambience_dir(dir.path()).unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_missing_directory() {
        let dir = TempDir::new().unwrap();
        assert!(load_ambience_dir(dir.path().join("absent")).is_err());
    }
}
