//! Balanced evaluation groups.
//!
//! Song tracks vastly outnumber instrumentals, so metrics are computed over groups that pair
//! the complete instrumental pool with one equally sized chunk of songs. Songs are chunked in
//! encounter order; every group holds exactly `2 × count_instrumental` pairs.

use crate::dataset::{Label, LabeledPair};

/// What happens to the song that arrives when the current chunk is already full.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FinalizePolicy {
    /// The arriving song closes the full chunk and is itself dropped. A chunk that is full
    /// when the scan ends is dropped too, since nothing arrives to close it. This is how the
    /// published tables were produced.
    #[default]
    DiscardTrigger,
    /// The arriving song opens the next chunk, and a full chunk at the end is kept.
    CarryTrigger,
}

/// Instrumental pool plus the finalized song chunks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partition {
    pub instrumental_pool: Vec<LabeledPair>,
    pub song_chunks: Vec<Vec<LabeledPair>>,
}

impl Partition {
    pub fn count_instrumental(&self) -> usize {
        self.instrumental_pool.len()
    }

    pub fn group_count(&self) -> usize {
        self.song_chunks.len()
    }

    /// Each group is the full instrumental pool followed by one song chunk.
    pub fn groups(&self) -> impl Iterator<Item = Vec<LabeledPair>> + '_ {
        self.song_chunks.iter().map(|chunk| {
            let mut group = Vec::with_capacity(self.instrumental_pool.len() + chunk.len());
            group.extend_from_slice(&self.instrumental_pool);
            group.extend_from_slice(chunk);
            group
        })
    }
}

enum ScanState {
    Accumulating(Vec<LabeledPair>),
    ReadyToFinalize(Vec<LabeledPair>),
}

fn accept(mut chunk: Vec<LabeledPair>, pair: LabeledPair, chunk_size: usize) -> ScanState {
    chunk.push(pair);
    if chunk.len() == chunk_size {
        ScanState::ReadyToFinalize(chunk)
    } else {
        ScanState::Accumulating(chunk)
    }
}

/// Split an ordered pair sequence into the instrumental pool and song chunks.
pub fn partition(pairs: &[LabeledPair], policy: FinalizePolicy) -> Partition {
    let count_instrumental = pairs
        .iter()
        .filter(|p| p.truth == Label::Instrumental)
        .count();

    if count_instrumental == 0 {
        log::debug!("No instrumental tracks, {} songs yield no groups", pairs.len());
        return Partition::default();
    }

    let mut result = Partition {
        instrumental_pool: Vec::with_capacity(count_instrumental),
        song_chunks: Vec::new(),
    };
    let mut state = ScanState::Accumulating(Vec::with_capacity(count_instrumental));

    for &pair in pairs {
        if pair.truth == Label::Instrumental {
            result.instrumental_pool.push(pair);
            continue;
        }

        state = match state {
            ScanState::Accumulating(chunk) => accept(chunk, pair, count_instrumental),
            ScanState::ReadyToFinalize(full) => {
                result.song_chunks.push(full);
                let next = Vec::with_capacity(count_instrumental);
                match policy {
                    FinalizePolicy::DiscardTrigger => ScanState::Accumulating(next),
                    FinalizePolicy::CarryTrigger => accept(next, pair, count_instrumental),
                }
            }
        };
    }

    if let ScanState::ReadyToFinalize(full) = state {
        if policy == FinalizePolicy::CarryTrigger {
            result.song_chunks.push(full);
        }
    }

    result
}
