// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Row types for the monitor tables.
//!
//! `New*` structs are the insertable halves used by the upsert paths; the
//! plain structs mirror full rows including the bookkeeping timestamps.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::schema::*;

#[derive(Debug, Clone, Queryable)]
pub struct Log {
    pub id: i64,
    pub chain_id: String,
    pub address: Vec<u8>,
    pub topic0: Option<Vec<u8>>,
    pub topic1: Option<Vec<u8>>,
    pub topic2: Option<Vec<u8>>,
    pub topic3: Option<Vec<u8>>,
    pub data: Vec<u8>,
    pub block_number: i64,
    pub log_index: i64,
    pub transaction_hash: Vec<u8>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Log {
    /// Topics in order, stopping at the first absent one.
    pub fn topics(&self) -> Vec<&[u8]> {
        [&self.topic0, &self.topic1, &self.topic2, &self.topic3]
            .into_iter()
            .take_while(|t| t.is_some())
            .flatten()
            .map(|t| t.as_slice())
            .collect()
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = logs)]
pub struct NewLog {
    pub chain_id: String,
    pub address: Vec<u8>,
    pub topic0: Option<Vec<u8>>,
    pub topic1: Option<Vec<u8>>,
    pub topic2: Option<Vec<u8>>,
    pub topic3: Option<Vec<u8>>,
    pub data: Vec<u8>,
    pub block_number: i64,
    pub log_index: i64,
    pub transaction_hash: Vec<u8>,
}

#[derive(Debug, Clone, Queryable)]
pub struct BlockTimestamp {
    pub chain_id: String,
    pub block_number: i64,
    pub timestamp: NaiveDateTime,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = block_timestamps)]
pub struct NewBlockTimestamp {
    pub chain_id: String,
    pub block_number: i64,
    pub timestamp: NaiveDateTime,
}

#[derive(Debug, Clone, Queryable)]
pub struct LogsCursor {
    pub chain_id: String,
    pub address: Vec<u8>,
    pub last_fetched_block: i64,
    pub last_processed_block: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = logs_cursors)]
pub struct NewLogsCursor {
    pub chain_id: String,
    pub address: Vec<u8>,
    pub last_fetched_block: i64,
    pub last_processed_block: i64,
}

#[derive(Debug, Clone, Queryable)]
pub struct Message {
    pub id: i64,
    pub bridge_id: String,
    pub msg_hash: Vec<u8>,
    pub message_id: Vec<u8>,
    pub direction: String,
    pub sender: Vec<u8>,
    pub executor: Vec<u8>,
    pub gas_limit: i64,
    pub data_type: i16,
    pub data: Vec<u8>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = messages)]
pub struct NewMessage {
    pub bridge_id: String,
    pub msg_hash: Vec<u8>,
    pub message_id: Vec<u8>,
    pub direction: String,
    pub sender: Vec<u8>,
    pub executor: Vec<u8>,
    pub gas_limit: i64,
    pub data_type: i16,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Queryable)]
pub struct ErcToNativeMessage {
    pub id: i64,
    pub bridge_id: String,
    pub msg_hash: Vec<u8>,
    pub direction: String,
    pub sender: Vec<u8>,
    pub receiver: Vec<u8>,
    pub value: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = erc_to_native_messages)]
pub struct NewErcToNativeMessage {
    pub bridge_id: String,
    pub msg_hash: Vec<u8>,
    pub direction: String,
    pub sender: Vec<u8>,
    pub receiver: Vec<u8>,
    pub value: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = sent_messages)]
pub struct NewSentMessage {
    pub log_id: i64,
    pub bridge_id: String,
    pub msg_hash: Vec<u8>,
}

#[derive(Debug, Clone, Queryable)]
pub struct SentMessage {
    pub log_id: i64,
    pub bridge_id: String,
    pub msg_hash: Vec<u8>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = signed_messages)]
pub struct NewSignedMessage {
    pub log_id: i64,
    pub bridge_id: String,
    pub msg_hash: Vec<u8>,
    pub signer: Vec<u8>,
}

#[derive(Debug, Clone, Queryable)]
pub struct SignedMessage {
    pub log_id: i64,
    pub bridge_id: String,
    pub msg_hash: Vec<u8>,
    pub signer: Vec<u8>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = collected_messages)]
pub struct NewCollectedMessage {
    pub log_id: i64,
    pub bridge_id: String,
    pub msg_hash: Vec<u8>,
    pub responsible_signer: Vec<u8>,
    pub num_signatures: i32,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = executed_messages)]
pub struct NewExecutedMessage {
    pub log_id: i64,
    pub bridge_id: String,
    pub message_id: Vec<u8>,
    pub status: bool,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = information_requests)]
pub struct NewInformationRequest {
    pub bridge_id: String,
    pub message_id: Vec<u8>,
    pub sender: Vec<u8>,
    pub request_selector: Vec<u8>,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = sent_information_requests)]
pub struct NewSentInformationRequest {
    pub log_id: i64,
    pub bridge_id: String,
    pub message_id: Vec<u8>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = signed_information_requests)]
pub struct NewSignedInformationRequest {
    pub log_id: i64,
    pub bridge_id: String,
    pub message_id: Vec<u8>,
    pub signer: Vec<u8>,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = executed_information_requests)]
pub struct NewExecutedInformationRequest {
    pub log_id: i64,
    pub bridge_id: String,
    pub message_id: Vec<u8>,
    pub status: bool,
    pub callback_status: bool,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = bridge_validators)]
pub struct NewBridgeValidator {
    pub log_id: i64,
    pub bridge_id: String,
    pub chain_id: String,
    pub address: Vec<u8>,
    pub removed_log_id: Option<i64>,
}

#[derive(Debug, Clone, Queryable)]
pub struct BridgeValidator {
    pub log_id: i64,
    pub bridge_id: String,
    pub chain_id: String,
    pub address: Vec<u8>,
    pub removed_log_id: Option<i64>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log_with_topics(topics: [Option<Vec<u8>>; 4]) -> Log {
        let [topic0, topic1, topic2, topic3] = topics;
        Log {
            id: 1,
            chain_id: "1".to_string(),
            address: vec![0u8; 20],
            topic0,
            topic1,
            topic2,
            topic3,
            data: vec![],
            block_number: 100,
            log_index: 0,
            transaction_hash: vec![0u8; 32],
            created_at: NaiveDateTime::default(),
            updated_at: NaiveDateTime::default(),
        }
    }

    #[test]
    fn test_topics_stop_at_first_gap() {
        let log = log_with_topics([Some(vec![1]), Some(vec![2]), None, Some(vec![4])]);
        assert_eq!(log.topics(), vec![&[1u8][..], &[2u8][..]]);
    }

    #[test]
    fn test_topics_empty() {
        let log = log_with_topics([None, None, None, None]);
        assert!(log.topics().is_empty());
    }

    #[test]
    fn test_topics_full() {
        let log = log_with_topics([
            Some(vec![0]),
            Some(vec![1]),
            Some(vec![2]),
            Some(vec![3]),
        ]);
        assert_eq!(log.topics().len(), 4);
    }
}
