//! Document embeddings from a fixed-window transformer encoder.
//!
//! Legal documents run far past an encoder's context window, so the token
//! sequence of the whole document is split into consecutive windows, each
//! window is encoded on its own, and the pooled vectors are averaged.

use tracing::debug;

/// Context window of BERT-family encoders.
pub const DEFAULT_WINDOW: usize = 512;

/// A transformer encoder that pools one window of token ids into a vector.
pub trait ChunkEncoder: Send {
    /// Dimensionality of the pooled vector.
    fn hidden_size(&self) -> usize;

    /// Token ids for the whole text, special tokens included, never truncated.
    fn tokenize(&self, text: &str) -> anyhow::Result<Vec<u32>>;

    /// Pooled (`[CLS]`) hidden state of one window of at most the context size.
    fn encode_chunk(&mut self, ids: &[u32]) -> anyhow::Result<Vec<f32>>;
}

/// Split token ids into consecutive windows of at most `window` ids.
pub fn chunk_ids(ids: &[u32], window: usize) -> std::slice::Chunks<'_, u32> {
    ids.chunks(window.max(1))
}

/// Element-wise mean of equally sized vectors.
pub fn mean_pool(vectors: &[Vec<f32>]) -> anyhow::Result<Vec<f32>> {
    let first = vectors
        .first()
        .ok_or_else(|| anyhow::anyhow!("no vectors to pool"))?;
    let dim = first.len();

    let mut pooled = vec![0.0f32; dim];
    for (i, v) in vectors.iter().enumerate() {
        anyhow::ensure!(
            v.len() == dim,
            "vector {i} has dimension {}, expected {dim}",
            v.len()
        );
        for (p, x) in pooled.iter_mut().zip(v) {
            *p += x;
        }
    }
    let n = vectors.len() as f32;
    for p in &mut pooled {
        *p /= n;
    }
    Ok(pooled)
}

/// Embed a whole document: tokenize, encode each window, average the windows.
pub fn embed_document(
    encoder: &mut dyn ChunkEncoder,
    text: &str,
    window: usize,
) -> anyhow::Result<Vec<f32>> {
    let ids = encoder.tokenize(text)?;
    anyhow::ensure!(!ids.is_empty(), "text produced no tokens");

    let mut pooled = Vec::with_capacity(ids.len().div_ceil(window.max(1)));
    for chunk in chunk_ids(&ids, window) {
        let vec = encoder.encode_chunk(chunk)?;
        anyhow::ensure!(
            vec.len() == encoder.hidden_size(),
            "encoder returned {} values, hidden size is {}",
            vec.len(),
            encoder.hidden_size()
        );
        pooled.push(vec);
    }

    debug!(tokens = ids.len(), chunks = pooled.len(), "embedded document");
    mean_pool(&pooled)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Encodes a chunk as `[len, first id]` and records chunk lengths.
    struct LengthEncoder {
        seen: Vec<usize>,
    }

    impl ChunkEncoder for LengthEncoder {
        fn hidden_size(&self) -> usize {
            2
        }

        fn tokenize(&self, text: &str) -> anyhow::Result<Vec<u32>> {
            Ok(text.split_whitespace().map(|w| w.len() as u32).collect())
        }

        fn encode_chunk(&mut self, ids: &[u32]) -> anyhow::Result<Vec<f32>> {
            self.seen.push(ids.len());
            Ok(vec![ids.len() as f32, ids[0] as f32])
        }
    }

    #[test]
    fn chunks_cover_every_token() {
        let ids: Vec<u32> = (0..1100).collect();
        let lens: Vec<usize> = chunk_ids(&ids, 512).map(|c| c.len()).collect();
        assert_eq!(lens, [512, 512, 76]);
    }

    #[test]
    fn short_sequence_is_one_chunk() {
        let ids = [101, 7, 102];
        assert_eq!(chunk_ids(&ids, 512).count(), 1);
    }

    #[test]
    fn zero_window_does_not_panic() {
        let ids = [1, 2];
        assert_eq!(chunk_ids(&ids, 0).count(), 2);
    }

    #[test]
    fn mean_pool_averages() {
        let pooled = mean_pool(&[vec![1.0, 2.0], vec![3.0, 6.0]]).unwrap();
        assert_eq!(pooled, vec![2.0, 4.0]);
    }

    #[test]
    fn mean_pool_rejects_empty_and_ragged() {
        assert!(mean_pool(&[]).is_err());
        assert!(mean_pool(&[vec![1.0], vec![1.0, 2.0]]).is_err());
    }

    #[test]
    fn embed_document_averages_windows() {
        let mut enc = LengthEncoder { seen: vec![] };
        // Five tokens with window 2 -> chunks [3,1] [4,1] [5].
        let v = embed_document(&mut enc, "abc d efgh i jklmn", 2).unwrap();
        assert_eq!(enc.seen, [2, 2, 1]);
        // mean of [2,3], [2,4], [1,5]
        assert!((v[0] - 5.0 / 3.0).abs() < 1e-6);
        assert!((v[1] - 4.0).abs() < 1e-6);
    }

    #[test]
    fn embed_document_rejects_empty_text() {
        let mut enc = LengthEncoder { seen: vec![] };
        assert!(embed_document(&mut enc, "   ", 512).is_err());
        assert!(enc.seen.is_empty());
    }
}
