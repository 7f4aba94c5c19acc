use std::fmt;

use crate::layout::HashFileHeader;

/// Shape of one bucket's chain
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChainSummary {
    pub blocks: u32,
    pub records: u64,
}

/// How records are spread over the buckets of an open hash file
#[derive(Debug, Clone, PartialEq)]
pub struct HashStatistics {
    pub depth: u32,
    pub records_per_block: u32,
    /// Every block of the file, header and directory included
    pub total_blocks: u32,
    pub directory_blocks: u32,
    pub data_blocks: u32,
    pub records: u64,
    pub empty_buckets: u32,
    /// Buckets whose chain is longer than one block
    pub overflow_buckets: u32,
    pub min_bucket_records: u64,
    pub max_bucket_records: u64,
    pub average_bucket_records: f64,
    /// Chain length per bucket, in bucket order
    pub chain_lengths: Vec<u32>,
}

impl HashStatistics {
    pub fn from_chains(header: &HashFileHeader, total_blocks: u32, chains: &[ChainSummary]) -> Self {
        let records: u64 = chains.iter().map(|chain| chain.records).sum();
        let average_bucket_records = if chains.is_empty() {
            0.0
        } else {
            records as f64 / chains.len() as f64
        };

        Self {
            depth: header.depth(),
            records_per_block: header.records_per_block(),
            total_blocks,
            directory_blocks: header.directory_blocks(),
            data_blocks: chains.iter().map(|chain| chain.blocks).sum(),
            records,
            empty_buckets: chains.iter().filter(|chain| chain.blocks == 0).count() as u32,
            overflow_buckets: chains.iter().filter(|chain| chain.blocks > 1).count() as u32,
            min_bucket_records: chains.iter().map(|chain| chain.records).min().unwrap_or(0),
            max_bucket_records: chains.iter().map(|chain| chain.records).max().unwrap_or(0),
            average_bucket_records,
            chain_lengths: chains.iter().map(|chain| chain.blocks).collect(),
        }
    }

    /// Blocks reachable from no bucket, left behind by failed inserts
    pub fn unreachable_blocks(&self) -> u32 {
        self.total_blocks
            .saturating_sub(1 + self.directory_blocks + self.data_blocks)
    }
}

impl fmt::Display for HashStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Buckets: {}", self.depth)?;
        writeln!(f, "Records per block: {}", self.records_per_block)?;
        writeln!(f, "Number of blocks: {}", self.total_blocks)?;
        writeln!(f, "Data blocks: {}", self.data_blocks)?;
        writeln!(f, "Records: {}", self.records)?;
        writeln!(f, "Empty buckets: {}", self.empty_buckets)?;
        writeln!(f, "Buckets with overflow blocks: {}", self.overflow_buckets)?;
        writeln!(f, "Minimum records per bucket: {}", self.min_bucket_records)?;
        writeln!(f, "Maximum records per bucket: {}", self.max_bucket_records)?;
        write!(
            f,
            "Average records per bucket: {:.2}",
            self.average_bucket_records
        )
    }
}
