// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Pure range/batch arithmetic for the pipeline.

use monitor_schema::models::Log;

/// A contiguous chunk of blocks scheduled for one `eth_getLogs` query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlocksRange {
    pub from: u64,
    pub to: u64,
}

/// Logs of exactly one block, in `log_index` order. An empty `logs` list is
/// the sentinel that lets the processor advance over log-free ranges.
#[derive(Debug, Clone)]
pub struct LogsBatch {
    pub block_number: u64,
    pub logs: Vec<Log>,
}

/// Partitions `[from, to]` into consecutive ranges of at most `max_size`
/// blocks. Empty for `from > to`.
pub fn split_block_range(from: u64, to: u64, max_size: u64) -> Vec<BlocksRange> {
    let mut ranges = Vec::new();
    let mut start = from;
    while start <= to {
        let end = start.saturating_add(max_size - 1).min(to);
        ranges.push(BlocksRange { from: start, to: end });
        if end == u64::MAX {
            break;
        }
        start = end + 1;
    }
    ranges
}

/// Partitions an already-sorted log list into runs sharing one block number.
pub fn split_logs_in_batches(logs: Vec<Log>) -> Vec<LogsBatch> {
    let mut batches: Vec<LogsBatch> = Vec::new();
    for log in logs {
        match batches.last_mut() {
            Some(batch) if batch.block_number == log.block_number as u64 => {
                batch.logs.push(log);
            }
            _ => batches.push(LogsBatch {
                block_number: log.block_number as u64,
                logs: vec![log],
            }),
        }
    }
    batches
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    #[test]
    fn test_split_block_range_exact_multiple() {
        let ranges = split_block_range(0, 9, 5);
        assert_eq!(
            ranges,
            vec![
                BlocksRange { from: 0, to: 4 },
                BlocksRange { from: 5, to: 9 },
            ]
        );
    }

    #[test]
    fn test_split_block_range_remainder() {
        let ranges = split_block_range(100, 112, 5);
        assert_eq!(
            ranges,
            vec![
                BlocksRange { from: 100, to: 104 },
                BlocksRange { from: 105, to: 109 },
                BlocksRange { from: 110, to: 112 },
            ]
        );
    }

    #[test]
    fn test_split_block_range_single_block() {
        assert_eq!(
            split_block_range(7, 7, 1000),
            vec![BlocksRange { from: 7, to: 7 }]
        );
    }

    #[test]
    fn test_split_block_range_empty_when_inverted() {
        assert!(split_block_range(10, 9, 5).is_empty());
    }

    #[test]
    fn test_split_block_range_union_covers_input() {
        let (from, to, max) = (3u64, 1234u64, 17u64);
        let ranges = split_block_range(from, to, max);

        let mut expected = from;
        for r in &ranges {
            assert_eq!(r.from, expected);
            assert!(r.to >= r.from);
            assert!(r.to - r.from + 1 <= max);
            expected = r.to + 1;
        }
        assert_eq!(expected, to + 1);
    }

    fn log_at(block_number: i64, log_index: i64) -> Log {
        Log {
            id: block_number * 1000 + log_index,
            chain_id: "1".to_string(),
            address: vec![0u8; 20],
            topic0: None,
            topic1: None,
            topic2: None,
            topic3: None,
            data: vec![],
            block_number,
            log_index,
            transaction_hash: vec![0u8; 32],
            created_at: NaiveDateTime::default(),
            updated_at: NaiveDateTime::default(),
        }
    }

    #[test]
    fn test_split_logs_in_batches() {
        let logs = vec![log_at(5, 0), log_at(5, 1), log_at(7, 0), log_at(9, 2)];
        let batches = split_logs_in_batches(logs.clone());

        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].block_number, 5);
        assert_eq!(batches[0].logs.len(), 2);
        assert_eq!(batches[1].block_number, 7);
        assert_eq!(batches[2].block_number, 9);

        // Concatenation yields the input
        let rebuilt: Vec<i64> = batches
            .iter()
            .flat_map(|b| b.logs.iter().map(|l| l.id))
            .collect();
        let original: Vec<i64> = logs.iter().map(|l| l.id).collect();
        assert_eq!(rebuilt, original);
    }

    #[test]
    fn test_split_logs_in_batches_empty() {
        assert!(split_logs_in_batches(vec![]).is_empty());
    }

    #[test]
    fn test_split_logs_in_batches_single_block() {
        let logs = vec![log_at(42, 0), log_at(42, 1), log_at(42, 2)];
        let batches = split_logs_in_batches(logs);
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].logs.len(), 3);
    }
}
