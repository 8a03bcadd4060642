use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use super::model::{KokoroError, STYLE_DIM};

const VOICES_FILE: &str = "voices-v1.0.bin";

/// One style vector per phoneme count.
pub type Style = [f32; STYLE_DIM];

/// Style vectors for every voice in a `voices-v1.0.bin` archive.
///
/// The archive is a numpy `.npz`: one `[N, 256]` float32 array per voice,
/// where row `i` is the style to use for an input of `i` phoneme tokens.
pub struct VoiceStore {
    voices: HashMap<String, Vec<Style>>,
}

impl VoiceStore {
    /// Load `voices-v1.0.bin` from a model directory.
    pub fn open_dir(model_dir: &Path) -> Result<Self, KokoroError> {
        let path = model_dir.join(VOICES_FILE);
        if !path.exists() {
            return Err(KokoroError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("voice archive missing at {}", path.display()),
            )));
        }
        Self::load(&path)
    }

    pub fn load(path: &Path) -> Result<Self, KokoroError> {
        let store = Self::from_reader(File::open(path)?)?;
        log::info!("Loaded {} voices from {}", store.voices.len(), path.display());
        Ok(store)
    }

    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self, KokoroError> {
        let mut zip = zip::ZipArchive::new(reader)
            .map_err(|e| KokoroError::VoiceParse(format!("Failed to open zip archive: {e}")))?;

        let mut voices = HashMap::new();
        for i in 0..zip.len() {
            let mut entry = zip
                .by_index(i)
                .map_err(|e| KokoroError::VoiceParse(format!("Failed to read zip entry {i}: {e}")))?;
            if entry.is_dir() {
                continue;
            }

            let name = entry.name().to_string();
            let voice = name.trim_end_matches(".npy");
            if voice.is_empty() {
                continue;
            }

            let mut data = Vec::with_capacity(entry.size() as usize);
            entry
                .read_to_end(&mut data)
                .map_err(|e| KokoroError::VoiceParse(format!("Failed to read {name}: {e}")))?;
            voices.insert(voice.to_string(), parse_npy(&data, &name)?);
        }

        Ok(Self { voices })
    }

    /// Style for `voice` given an input of `phoneme_count` tokens. Counts past
    /// the end of the table use its last row.
    pub fn style(&self, voice: &str, phoneme_count: usize) -> Result<&Style, KokoroError> {
        let styles = self
            .voices
            .get(voice)
            .filter(|styles| !styles.is_empty())
            .ok_or_else(|| KokoroError::VoiceNotFound(voice.to_string()))?;
        Ok(&styles[phoneme_count.min(styles.len() - 1)])
    }

    pub fn contains(&self, voice: &str) -> bool {
        self.voices.contains_key(voice)
    }

    /// All voice names in sorted order.
    pub fn list_voices(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.voices.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Parse a little-endian float32 `.npy` payload into style rows.
fn parse_npy(data: &[u8], name: &str) -> Result<Vec<Style>, KokoroError> {
    const MAGIC: &[u8] = b"\x93NUMPY";

    if data.len() < 10 || !data.starts_with(MAGIC) {
        return Err(KokoroError::VoiceParse(format!("{name}: not a numpy array")));
    }

    // Version 1.x stores the header length as u16 at [8..10]; 2.x and 3.x as
    // u32 at [8..12].
    let (header_len, preamble) = match data[6] {
        1 => (u16::from_le_bytes([data[8], data[9]]) as usize, 10),
        _ if data.len() >= 12 => (
            u32::from_le_bytes([data[8], data[9], data[10], data[11]]) as usize,
            12,
        ),
        _ => return Err(KokoroError::VoiceParse(format!("{name}: header truncated"))),
    };

    let body = data
        .get(preamble + header_len..)
        .ok_or_else(|| KokoroError::VoiceParse(format!("{name}: header truncated")))?;

    let row_bytes = STYLE_DIM * 4;
    if body.len() % row_bytes != 0 {
        return Err(KokoroError::VoiceParse(format!(
            "{name}: {} data bytes is not a whole number of {STYLE_DIM}-float rows",
            body.len()
        )));
    }

    Ok(body
        .chunks_exact(row_bytes)
        .map(|row| {
            let mut style = [0f32; STYLE_DIM];
            for (value, bytes) in style.iter_mut().zip(row.chunks_exact(4)) {
                *value = f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
            }
            style
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    fn npy(rows: usize, value_of: impl Fn(usize, usize) -> f32) -> Vec<u8> {
        let header = format!("{{'descr': '<f4', 'fortran_order': False, 'shape': ({rows}, {STYLE_DIM}), }}");
        let mut data = b"\x93NUMPY\x01\x00".to_vec();
        data.extend_from_slice(&(header.len() as u16).to_le_bytes());
        data.extend_from_slice(header.as_bytes());
        for r in 0..rows {
            for c in 0..STYLE_DIM {
                data.extend_from_slice(&value_of(r, c).to_le_bytes());
            }
        }
        data
    }

    fn archive(entries: &[(&str, Vec<u8>)]) -> Cursor<Vec<u8>> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in entries {
            writer
                .start_file(*name, zip::write::SimpleFileOptions::default())
                .unwrap();
            writer.write_all(data).unwrap();
        }
        let mut cursor = writer.finish().unwrap();
        cursor.set_position(0);
        cursor
    }

    #[test]
    fn loads_voices_from_npz() {
        let store = VoiceStore::from_reader(archive(&[
            ("af_heart.npy", npy(3, |r, c| (r * 1000 + c) as f32)),
            ("bf_emma.npy", npy(1, |_, _| 0.5)),
        ]))
        .unwrap();

        assert_eq!(store.list_voices(), vec!["af_heart", "bf_emma"]);
        assert!(store.contains("bf_emma"));
        assert_eq!(store.style("af_heart", 1).unwrap()[7], 1007.0);
        // Past the end of the table clamps to the last row.
        assert_eq!(store.style("af_heart", 99).unwrap()[0], 2000.0);
        assert_eq!(store.style("bf_emma", 0).unwrap()[255], 0.5);
    }

    #[test]
    fn unknown_voice_is_an_error() {
        let store = VoiceStore::from_reader(archive(&[("af_heart.npy", npy(1, |_, _| 0.0))])).unwrap();
        assert!(matches!(
            store.style("zz_nobody", 0),
            Err(KokoroError::VoiceNotFound(v)) if v == "zz_nobody"
        ));
    }

    #[test]
    fn opens_archive_from_model_dir() {
        let dir = std::env::temp_dir().join(format!("kokoro-voices-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        assert!(matches!(
            VoiceStore::open_dir(&dir),
            Err(KokoroError::Io(ref e)) if e.kind() == std::io::ErrorKind::NotFound
        ));

        let bytes = archive(&[("pf_dora.npy", npy(2, |_, _| 0.25))]).into_inner();
        std::fs::write(dir.join(VOICES_FILE), bytes).unwrap();
        let store = VoiceStore::open_dir(&dir).unwrap();
        assert!(store.contains("pf_dora"));
        assert!(!store.contains("af_heart"));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn rejects_ragged_arrays() {
        let mut data = npy(1, |_, _| 0.0);
        data.extend_from_slice(&[0, 0, 0, 0]);
        assert!(matches!(parse_npy(&data, "x.npy"), Err(KokoroError::VoiceParse(_))));
        assert!(matches!(parse_npy(b"garbage", "x.npy"), Err(KokoroError::VoiceParse(_))));
    }
}
