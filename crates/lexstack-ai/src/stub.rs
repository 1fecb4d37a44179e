use crate::embedder::ChunkEncoder;

const CLS: u32 = 101;
const SEP: u32 = 102;
const VOCAB: u32 = 30_522;
const FIRST_WORD_ID: u32 = 1_000;

/// Deterministic encoder for tests that exercise the pipeline without model
/// files. Words hash into a BERT-sized vocabulary; each window maps to a
/// sinusoid derived from its ids, so equal windows always give equal vectors.
#[derive(Debug, Clone)]
pub struct StubEncoder {
    hidden_size: usize,
}

impl StubEncoder {
    pub fn new(hidden_size: usize) -> Self {
        Self { hidden_size }
    }
}

impl Default for StubEncoder {
    fn default() -> Self {
        Self::new(768)
    }
}

impl ChunkEncoder for StubEncoder {
    fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    fn tokenize(&self, text: &str) -> anyhow::Result<Vec<u32>> {
        let words: Vec<u32> = text
            .split_whitespace()
            .map(|w| FIRST_WORD_ID + (fnv1a(w.as_bytes()) % u64::from(VOCAB - FIRST_WORD_ID)) as u32)
            .collect();
        if words.is_empty() {
            return Ok(Vec::new());
        }
        let mut ids = Vec::with_capacity(words.len() + 2);
        ids.push(CLS);
        ids.extend(words);
        ids.push(SEP);
        Ok(ids)
    }

    fn encode_chunk(&mut self, ids: &[u32]) -> anyhow::Result<Vec<f32>> {
        let bytes: Vec<u8> = ids.iter().flat_map(|id| id.to_le_bytes()).collect();
        let h = fnv1a(&bytes);
        Ok((0..self.hidden_size)
            .map(|i| ((h >> (i % 32)) as f32 * 0.0001).sin())
            .collect())
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0xcbf2_9ce4_8422_2325, |h, &b| {
        (h ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3)
    })
}
