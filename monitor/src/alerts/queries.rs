// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Raw-SQL anomaly probes behind the alert jobs.
//!
//! Unknown-counterpart queries are gated on the minimum processed timestamp
//! across both sides' cursors: an orphan is only reported once both monitors
//! have processed past the orphan's block time, which suppresses false
//! positives during catch-up. Stuck-message queries instead use a fixed grace
//! interval so in-flight messages are not flagged the moment they appear.

use diesel::sql_types::{Array, BigInt, Bytea, Text};
use diesel_async::RunQueryDsl;
use monitor_pg_db::Db;
use serde::Serialize;

use super::jobs::AlertKind;
use crate::error::{MonitorError, MonitorResult};

/// Identifies the bridge and its two cursors inside the SQL probes.
#[derive(Debug, Clone)]
pub struct AlertQueryParams {
    pub bridge_id: String,
    pub home_chain_id: String,
    pub home_address: Vec<u8>,
    pub foreign_chain_id: String,
    pub foreign_address: Vec<u8>,
    pub whitelisted_senders: Vec<Vec<u8>>,
}

#[derive(Debug, diesel::QueryableByName, Serialize)]
pub struct SignerRow {
    #[diesel(sql_type = Text)]
    pub chain_id: String,
    #[diesel(sql_type = BigInt)]
    pub block_number: i64,
    #[diesel(sql_type = Text)]
    pub tx_hash: String,
    #[diesel(sql_type = Text)]
    pub signer: String,
    #[diesel(sql_type = Text)]
    pub msg_hash: String,
    #[diesel(sql_type = Text)]
    pub _value: String,
}

#[derive(Debug, diesel::QueryableByName, Serialize)]
pub struct ExecutionRow {
    #[diesel(sql_type = Text)]
    pub chain_id: String,
    #[diesel(sql_type = BigInt)]
    pub block_number: i64,
    #[diesel(sql_type = Text)]
    pub tx_hash: String,
    #[diesel(sql_type = Text)]
    pub message_id: String,
    #[diesel(sql_type = Text)]
    pub _value: String,
}

#[derive(Debug, diesel::QueryableByName, Serialize)]
pub struct StuckMessageRow {
    #[diesel(sql_type = Text)]
    pub chain_id: String,
    #[diesel(sql_type = BigInt)]
    pub block_number: i64,
    #[diesel(sql_type = Text)]
    pub tx_hash: String,
    #[diesel(sql_type = Text)]
    pub msg_hash: String,
    #[diesel(sql_type = Text)]
    pub _value: String,
}

#[derive(Debug, diesel::QueryableByName, Serialize)]
pub struct FailedExecutionRow {
    #[diesel(sql_type = Text)]
    pub chain_id: String,
    #[diesel(sql_type = BigInt)]
    pub block_number: i64,
    #[diesel(sql_type = Text)]
    pub tx_hash: String,
    #[diesel(sql_type = Text)]
    pub sender: String,
    #[diesel(sql_type = Text)]
    pub executor: String,
    #[diesel(sql_type = Text)]
    pub _value: String,
}

#[derive(Debug, diesel::QueryableByName, Serialize)]
pub struct InformationSignerRow {
    #[diesel(sql_type = Text)]
    pub chain_id: String,
    #[diesel(sql_type = BigInt)]
    pub block_number: i64,
    #[diesel(sql_type = Text)]
    pub tx_hash: String,
    #[diesel(sql_type = Text)]
    pub signer: String,
    #[diesel(sql_type = Text)]
    pub message_id: String,
    #[diesel(sql_type = Text)]
    pub _value: String,
}

#[derive(Debug, diesel::QueryableByName, Serialize)]
pub struct InformationRow {
    #[diesel(sql_type = Text)]
    pub chain_id: String,
    #[diesel(sql_type = BigInt)]
    pub block_number: i64,
    #[diesel(sql_type = Text)]
    pub tx_hash: String,
    #[diesel(sql_type = Text)]
    pub message_id: String,
    #[diesel(sql_type = Text)]
    pub _value: String,
}

#[derive(Debug, diesel::QueryableByName, Serialize)]
pub struct FailedInformationRow {
    #[diesel(sql_type = Text)]
    pub chain_id: String,
    #[diesel(sql_type = BigInt)]
    pub block_number: i64,
    #[diesel(sql_type = Text)]
    pub tx_hash: String,
    #[diesel(sql_type = Text)]
    pub sender: String,
    #[diesel(sql_type = Text)]
    pub message_id: String,
    #[diesel(sql_type = Text)]
    pub _value: String,
}

#[derive(Debug, diesel::QueryableByName, Serialize)]
pub struct DifferentSignaturesRow {
    #[diesel(sql_type = Text)]
    pub chain_id: String,
    #[diesel(sql_type = BigInt)]
    pub block_number: i64,
    #[diesel(sql_type = Text)]
    pub tx_hash: String,
    #[diesel(sql_type = Text)]
    pub message_id: String,
    #[diesel(sql_type = Text)]
    pub count: String,
    #[diesel(sql_type = Text)]
    pub _value: String,
}

#[derive(Debug, diesel::QueryableByName, Serialize)]
pub struct StuckErcToNativeRow {
    #[diesel(sql_type = Text)]
    pub chain_id: String,
    #[diesel(sql_type = BigInt)]
    pub block_number: i64,
    #[diesel(sql_type = Text)]
    pub tx_hash: String,
    #[diesel(sql_type = Text)]
    pub msg_hash: String,
    #[diesel(sql_type = Text)]
    pub sender: String,
    #[diesel(sql_type = Text)]
    pub value: String,
    #[diesel(sql_type = Text)]
    pub _value: String,
}

#[derive(Debug, diesel::QueryableByName, Serialize)]
pub struct ValidatorActivityRow {
    #[diesel(sql_type = Text)]
    pub chain_id: String,
    #[diesel(sql_type = Text)]
    pub address: String,
    #[diesel(sql_type = Text)]
    pub _value: String,
}

const UNKNOWN_MESSAGE_CONFIRMATION: &str = "\
WITH min_processed AS (
    SELECT MIN(sub.ts) AS ts FROM (
        SELECT (
            SELECT MAX(bt.timestamp) FROM block_timestamps bt
            WHERE bt.chain_id = c.chain_id AND bt.block_number <= c.last_processed_block
        ) AS ts
        FROM logs_cursors c
        WHERE (c.chain_id = $2 AND c.address = $3) OR (c.chain_id = $4 AND c.address = $5)
    ) sub
)
SELECT l.chain_id,
       l.block_number,
       encode(l.transaction_hash, 'hex') AS tx_hash,
       encode(sm.signer, 'hex') AS signer,
       encode(sm.msg_hash, 'hex') AS msg_hash,
       (EXTRACT(EPOCH FROM ((NOW() AT TIME ZONE 'utc') - bt.timestamp))::bigint)::text AS _value
FROM signed_messages sm
JOIN logs l ON l.id = sm.log_id
JOIN block_timestamps bt ON bt.chain_id = l.chain_id AND bt.block_number = l.block_number
LEFT JOIN messages m ON m.bridge_id = sm.bridge_id AND m.msg_hash = sm.msg_hash
WHERE sm.bridge_id = $1
  AND m.id IS NULL
  AND bt.timestamp <= (SELECT ts FROM min_processed)
ORDER BY l.block_number";

const UNKNOWN_MESSAGE_EXECUTION: &str = "\
WITH min_processed AS (
    SELECT MIN(sub.ts) AS ts FROM (
        SELECT (
            SELECT MAX(bt.timestamp) FROM block_timestamps bt
            WHERE bt.chain_id = c.chain_id AND bt.block_number <= c.last_processed_block
        ) AS ts
        FROM logs_cursors c
        WHERE (c.chain_id = $2 AND c.address = $3) OR (c.chain_id = $4 AND c.address = $5)
    ) sub
)
SELECT l.chain_id,
       l.block_number,
       encode(l.transaction_hash, 'hex') AS tx_hash,
       encode(em.message_id, 'hex') AS message_id,
       (EXTRACT(EPOCH FROM ((NOW() AT TIME ZONE 'utc') - bt.timestamp))::bigint)::text AS _value
FROM executed_messages em
JOIN logs l ON l.id = em.log_id
JOIN block_timestamps bt ON bt.chain_id = l.chain_id AND bt.block_number = l.block_number
LEFT JOIN messages m ON m.bridge_id = em.bridge_id AND m.message_id = em.message_id
WHERE em.bridge_id = $1
  AND m.id IS NULL
  AND bt.timestamp <= (SELECT ts FROM min_processed)
ORDER BY l.block_number";

const STUCK_MESSAGE_CONFIRMATION: &str = "\
SELECT l.chain_id,
       l.block_number,
       encode(l.transaction_hash, 'hex') AS tx_hash,
       encode(m.msg_hash, 'hex') AS msg_hash,
       (EXTRACT(EPOCH FROM ((NOW() AT TIME ZONE 'utc') - bt.timestamp))::bigint)::text AS _value
FROM sent_messages s
JOIN messages m ON m.bridge_id = s.bridge_id AND m.msg_hash = s.msg_hash
JOIN logs l ON l.id = s.log_id
JOIN block_timestamps bt ON bt.chain_id = l.chain_id AND bt.block_number = l.block_number
WHERE s.bridge_id = $1
  AND bt.timestamp <= (NOW() AT TIME ZONE 'utc') - INTERVAL '10 minutes'
  AND (
    (m.direction = 'home_to_foreign' AND NOT EXISTS (
        SELECT 1 FROM collected_messages cm
        WHERE cm.bridge_id = s.bridge_id AND cm.msg_hash = s.msg_hash))
    OR (m.direction = 'home_to_foreign' AND m.data_type = 0 AND m.sender = ANY($2) AND NOT EXISTS (
        SELECT 1 FROM executed_messages em
        WHERE em.bridge_id = s.bridge_id AND em.message_id = m.message_id))
    OR (m.direction = 'foreign_to_home' AND NOT EXISTS (
        SELECT 1 FROM executed_messages em
        WHERE em.bridge_id = s.bridge_id AND em.message_id = m.message_id))
  )
ORDER BY l.block_number";

const FAILED_MESSAGE_EXECUTION: &str = "\
SELECT l.chain_id,
       l.block_number,
       encode(l.transaction_hash, 'hex') AS tx_hash,
       encode(m.sender, 'hex') AS sender,
       encode(m.executor, 'hex') AS executor,
       (EXTRACT(EPOCH FROM ((NOW() AT TIME ZONE 'utc') - bt.timestamp))::bigint)::text AS _value
FROM executed_messages em
JOIN messages m ON m.bridge_id = em.bridge_id AND m.message_id = em.message_id
JOIN logs l ON l.id = em.log_id
JOIN block_timestamps bt ON bt.chain_id = l.chain_id AND bt.block_number = l.block_number
WHERE em.bridge_id = $1
  AND em.status = false
  AND m.data_type IN (0, 128)
ORDER BY l.block_number";

const UNKNOWN_INFORMATION_SIGNATURE: &str = "\
WITH min_processed AS (
    SELECT MIN(sub.ts) AS ts FROM (
        SELECT (
            SELECT MAX(bt.timestamp) FROM block_timestamps bt
            WHERE bt.chain_id = c.chain_id AND bt.block_number <= c.last_processed_block
        ) AS ts
        FROM logs_cursors c
        WHERE (c.chain_id = $2 AND c.address = $3) OR (c.chain_id = $4 AND c.address = $5)
    ) sub
)
SELECT l.chain_id,
       l.block_number,
       encode(l.transaction_hash, 'hex') AS tx_hash,
       encode(sir.signer, 'hex') AS signer,
       encode(sir.message_id, 'hex') AS message_id,
       (EXTRACT(EPOCH FROM ((NOW() AT TIME ZONE 'utc') - bt.timestamp))::bigint)::text AS _value
FROM signed_information_requests sir
JOIN logs l ON l.id = sir.log_id
JOIN block_timestamps bt ON bt.chain_id = l.chain_id AND bt.block_number = l.block_number
LEFT JOIN information_requests ir
    ON ir.bridge_id = sir.bridge_id AND ir.message_id = sir.message_id
WHERE sir.bridge_id = $1
  AND ir.id IS NULL
  AND bt.timestamp <= (SELECT ts FROM min_processed)
ORDER BY l.block_number";

const UNKNOWN_INFORMATION_EXECUTION: &str = "\
WITH min_processed AS (
    SELECT MIN(sub.ts) AS ts FROM (
        SELECT (
            SELECT MAX(bt.timestamp) FROM block_timestamps bt
            WHERE bt.chain_id = c.chain_id AND bt.block_number <= c.last_processed_block
        ) AS ts
        FROM logs_cursors c
        WHERE (c.chain_id = $2 AND c.address = $3) OR (c.chain_id = $4 AND c.address = $5)
    ) sub
)
SELECT l.chain_id,
       l.block_number,
       encode(l.transaction_hash, 'hex') AS tx_hash,
       encode(eir.message_id, 'hex') AS message_id,
       (EXTRACT(EPOCH FROM ((NOW() AT TIME ZONE 'utc') - bt.timestamp))::bigint)::text AS _value
FROM executed_information_requests eir
JOIN logs l ON l.id = eir.log_id
JOIN block_timestamps bt ON bt.chain_id = l.chain_id AND bt.block_number = l.block_number
LEFT JOIN information_requests ir
    ON ir.bridge_id = eir.bridge_id AND ir.message_id = eir.message_id
WHERE eir.bridge_id = $1
  AND ir.id IS NULL
  AND bt.timestamp <= (SELECT ts FROM min_processed)
ORDER BY l.block_number";

const STUCK_INFORMATION_REQUEST: &str = "\
SELECT l.chain_id,
       l.block_number,
       encode(l.transaction_hash, 'hex') AS tx_hash,
       encode(sir.message_id, 'hex') AS message_id,
       (EXTRACT(EPOCH FROM ((NOW() AT TIME ZONE 'utc') - bt.timestamp))::bigint)::text AS _value
FROM sent_information_requests sir
JOIN logs l ON l.id = sir.log_id
JOIN block_timestamps bt ON bt.chain_id = l.chain_id AND bt.block_number = l.block_number
WHERE sir.bridge_id = $1
  AND bt.timestamp <= (NOW() AT TIME ZONE 'utc') - INTERVAL '10 minutes'
  AND NOT EXISTS (
    SELECT 1 FROM executed_information_requests eir
    WHERE eir.bridge_id = sir.bridge_id AND eir.message_id = sir.message_id)
ORDER BY l.block_number";

const FAILED_INFORMATION_REQUEST: &str = "\
SELECT l.chain_id,
       l.block_number,
       encode(l.transaction_hash, 'hex') AS tx_hash,
       COALESCE(encode(ir.sender, 'hex'), '') AS sender,
       encode(eir.message_id, 'hex') AS message_id,
       (EXTRACT(EPOCH FROM ((NOW() AT TIME ZONE 'utc') - bt.timestamp))::bigint)::text AS _value
FROM executed_information_requests eir
JOIN logs l ON l.id = eir.log_id
JOIN block_timestamps bt ON bt.chain_id = l.chain_id AND bt.block_number = l.block_number
LEFT JOIN information_requests ir
    ON ir.bridge_id = eir.bridge_id AND ir.message_id = eir.message_id
WHERE eir.bridge_id = $1
  AND (eir.status = false OR eir.callback_status = false)
ORDER BY l.block_number";

const DIFFERENT_INFORMATION_SIGNATURES: &str = "\
SELECT MIN(l.chain_id) AS chain_id,
       MAX(l.block_number) AS block_number,
       encode(MIN(l.transaction_hash), 'hex') AS tx_hash,
       encode(sir.message_id, 'hex') AS message_id,
       (COUNT(DISTINCT sir.data))::text AS count,
       (EXTRACT(EPOCH FROM ((NOW() AT TIME ZONE 'utc') - MIN(bt.timestamp)))::bigint)::text AS _value
FROM signed_information_requests sir
JOIN logs l ON l.id = sir.log_id
JOIN block_timestamps bt ON bt.chain_id = l.chain_id AND bt.block_number = l.block_number
WHERE sir.bridge_id = $1
GROUP BY sir.message_id
HAVING COUNT(DISTINCT sir.data) >= 2";

const UNKNOWN_ERC_TO_NATIVE_CONFIRMATION: &str = "\
WITH min_processed AS (
    SELECT MIN(sub.ts) AS ts FROM (
        SELECT (
            SELECT MAX(bt.timestamp) FROM block_timestamps bt
            WHERE bt.chain_id = c.chain_id AND bt.block_number <= c.last_processed_block
        ) AS ts
        FROM logs_cursors c
        WHERE (c.chain_id = $2 AND c.address = $3) OR (c.chain_id = $4 AND c.address = $5)
    ) sub
)
SELECT l.chain_id,
       l.block_number,
       encode(l.transaction_hash, 'hex') AS tx_hash,
       encode(sm.signer, 'hex') AS signer,
       encode(sm.msg_hash, 'hex') AS msg_hash,
       (EXTRACT(EPOCH FROM ((NOW() AT TIME ZONE 'utc') - bt.timestamp))::bigint)::text AS _value
FROM signed_messages sm
JOIN logs l ON l.id = sm.log_id
JOIN block_timestamps bt ON bt.chain_id = l.chain_id AND bt.block_number = l.block_number
LEFT JOIN erc_to_native_messages enm
    ON enm.bridge_id = sm.bridge_id AND enm.msg_hash = sm.msg_hash
WHERE sm.bridge_id = $1
  AND enm.id IS NULL
  AND bt.timestamp <= (SELECT ts FROM min_processed)
ORDER BY l.block_number";

const UNKNOWN_ERC_TO_NATIVE_EXECUTION: &str = "\
WITH min_processed AS (
    SELECT MIN(sub.ts) AS ts FROM (
        SELECT (
            SELECT MAX(bt.timestamp) FROM block_timestamps bt
            WHERE bt.chain_id = c.chain_id AND bt.block_number <= c.last_processed_block
        ) AS ts
        FROM logs_cursors c
        WHERE (c.chain_id = $2 AND c.address = $3) OR (c.chain_id = $4 AND c.address = $5)
    ) sub
)
SELECT l.chain_id,
       l.block_number,
       encode(l.transaction_hash, 'hex') AS tx_hash,
       encode(em.message_id, 'hex') AS message_id,
       (EXTRACT(EPOCH FROM ((NOW() AT TIME ZONE 'utc') - bt.timestamp))::bigint)::text AS _value
FROM executed_messages em
JOIN logs l ON l.id = em.log_id
JOIN block_timestamps bt ON bt.chain_id = l.chain_id AND bt.block_number = l.block_number
LEFT JOIN erc_to_native_messages enm
    ON enm.bridge_id = em.bridge_id AND enm.msg_hash = em.message_id
WHERE em.bridge_id = $1
  AND enm.id IS NULL
  AND bt.timestamp <= (SELECT ts FROM min_processed)
ORDER BY l.block_number";

const STUCK_ERC_TO_NATIVE_CONFIRMATION: &str = "\
SELECT l.chain_id,
       l.block_number,
       encode(l.transaction_hash, 'hex') AS tx_hash,
       encode(enm.msg_hash, 'hex') AS msg_hash,
       encode(enm.sender, 'hex') AS sender,
       enm.value AS value,
       (EXTRACT(EPOCH FROM ((NOW() AT TIME ZONE 'utc') - bt.timestamp))::bigint)::text AS _value
FROM sent_messages s
JOIN erc_to_native_messages enm
    ON enm.bridge_id = s.bridge_id AND enm.msg_hash = s.msg_hash
JOIN logs l ON l.id = s.log_id
JOIN block_timestamps bt ON bt.chain_id = l.chain_id AND bt.block_number = l.block_number
WHERE s.bridge_id = $1
  AND bt.timestamp <= (NOW() AT TIME ZONE 'utc') - INTERVAL '10 minutes'
  AND (
    (enm.direction = 'home_to_foreign' AND NOT EXISTS (
        SELECT 1 FROM collected_messages cm
        WHERE cm.bridge_id = s.bridge_id AND cm.msg_hash = s.msg_hash))
    OR (enm.direction = 'foreign_to_home' AND enm.value::numeric > 0 AND NOT EXISTS (
        SELECT 1 FROM executed_messages em
        WHERE em.bridge_id = s.bridge_id AND em.message_id = enm.msg_hash))
  )
ORDER BY l.block_number";

const LAST_VALIDATOR_ACTIVITY: &str = "\
SELECT bv.chain_id,
       encode(bv.address, 'hex') AS address,
       COALESCE((EXTRACT(EPOCH FROM ((NOW() AT TIME ZONE 'utc') - COALESCE(
           (SELECT MAX(bt2.timestamp)
            FROM signed_messages sm
            JOIN logs l2 ON l2.id = sm.log_id
            JOIN block_timestamps bt2
                ON bt2.chain_id = l2.chain_id AND bt2.block_number = l2.block_number
            WHERE sm.bridge_id = bv.bridge_id AND sm.signer = bv.address),
           (SELECT bt3.timestamp
            FROM logs l3
            JOIN block_timestamps bt3
                ON bt3.chain_id = l3.chain_id AND bt3.block_number = l3.block_number
            WHERE l3.id = bv.log_id)))))::bigint, 0)::text AS _value
FROM bridge_validators bv
WHERE bv.bridge_id = $1
  AND bv.removed_log_id IS NULL
ORDER BY bv.log_id";

/// Executes the probe for one alert kind and serializes the rows, so the
/// scheduler can project heterogeneous row shapes through one generic
/// `(labels, value)` path.
pub struct AlertQueries {
    db: Db,
    params: AlertQueryParams,
}

impl AlertQueries {
    pub fn new(db: Db, params: AlertQueryParams) -> Self {
        Self { db, params }
    }

    pub fn params(&self) -> &AlertQueryParams {
        &self.params
    }

    pub async fn execute(&self, kind: AlertKind) -> MonitorResult<Vec<serde_json::Value>> {
        match kind {
            AlertKind::UnknownMessageConfirmation => {
                self.gated_rows::<SignerRow>(UNKNOWN_MESSAGE_CONFIRMATION).await
            }
            AlertKind::UnknownMessageExecution => {
                self.gated_rows::<ExecutionRow>(UNKNOWN_MESSAGE_EXECUTION).await
            }
            AlertKind::StuckMessageConfirmation => self.stuck_message_rows().await,
            AlertKind::FailedMessageExecution => {
                self.simple_rows::<FailedExecutionRow>(FAILED_MESSAGE_EXECUTION).await
            }
            AlertKind::UnknownInformationSignature => {
                self.gated_rows::<InformationSignerRow>(UNKNOWN_INFORMATION_SIGNATURE)
                    .await
            }
            AlertKind::UnknownInformationExecution => {
                self.gated_rows::<InformationRow>(UNKNOWN_INFORMATION_EXECUTION).await
            }
            AlertKind::StuckInformationRequest => {
                self.simple_rows::<InformationRow>(STUCK_INFORMATION_REQUEST).await
            }
            AlertKind::FailedInformationRequest => {
                self.simple_rows::<FailedInformationRow>(FAILED_INFORMATION_REQUEST).await
            }
            AlertKind::DifferentInformationSignatures => {
                self.simple_rows::<DifferentSignaturesRow>(DIFFERENT_INFORMATION_SIGNATURES)
                    .await
            }
            AlertKind::UnknownErcToNativeMessageConfirmation => {
                self.gated_rows::<SignerRow>(UNKNOWN_ERC_TO_NATIVE_CONFIRMATION).await
            }
            AlertKind::UnknownErcToNativeMessageExecution => {
                self.gated_rows::<ExecutionRow>(UNKNOWN_ERC_TO_NATIVE_EXECUTION).await
            }
            AlertKind::StuckErcToNativeMessageConfirmation => {
                self.simple_rows::<StuckErcToNativeRow>(STUCK_ERC_TO_NATIVE_CONFIRMATION)
                    .await
            }
            AlertKind::LastValidatorActivity => {
                self.simple_rows::<ValidatorActivityRow>(LAST_VALIDATOR_ACTIVITY).await
            }
        }
    }

    async fn conn(&self) -> MonitorResult<monitor_pg_db::Connection<'_>> {
        self.db
            .connect()
            .await
            .map_err(|e| MonitorError::Storage(e.to_string()))
    }

    /// Probes bound to `$1 = bridge_id` only.
    async fn simple_rows<R>(&self, sql: &'static str) -> MonitorResult<Vec<serde_json::Value>>
    where
        R: diesel::QueryableByName<diesel::pg::Pg> + Serialize + Send + 'static,
    {
        let mut conn = self.conn().await?;
        let rows: Vec<R> = diesel::sql_query(sql)
            .bind::<Text, _>(&self.params.bridge_id)
            .load(&mut conn)
            .await?;
        serialize_rows(rows)
    }

    /// Probes carrying the min-processed gate: `$1 = bridge_id`, `$2..$5` the
    /// two cursor keys.
    async fn gated_rows<R>(&self, sql: &'static str) -> MonitorResult<Vec<serde_json::Value>>
    where
        R: diesel::QueryableByName<diesel::pg::Pg> + Serialize + Send + 'static,
    {
        let mut conn = self.conn().await?;
        let rows: Vec<R> = diesel::sql_query(sql)
            .bind::<Text, _>(&self.params.bridge_id)
            .bind::<Text, _>(&self.params.home_chain_id)
            .bind::<Bytea, _>(&self.params.home_address)
            .bind::<Text, _>(&self.params.foreign_chain_id)
            .bind::<Bytea, _>(&self.params.foreign_address)
            .load(&mut conn)
            .await?;
        serialize_rows(rows)
    }

    async fn stuck_message_rows(&self) -> MonitorResult<Vec<serde_json::Value>> {
        let mut conn = self.conn().await?;
        let rows: Vec<StuckMessageRow> = diesel::sql_query(STUCK_MESSAGE_CONFIRMATION)
            .bind::<Text, _>(&self.params.bridge_id)
            .bind::<Array<Bytea>, _>(&self.params.whitelisted_senders)
            .load(&mut conn)
            .await?;
        serialize_rows(rows)
    }
}

fn serialize_rows<R: Serialize>(rows: Vec<R>) -> MonitorResult<Vec<serde_json::Value>> {
    rows.into_iter()
        .map(|r| serde_json::to_value(r).map_err(|e| MonitorError::Storage(e.to_string())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::jobs::ALL_ALERT_KINDS;

    fn query_text(kind: AlertKind) -> &'static str {
        match kind {
            AlertKind::UnknownMessageConfirmation => UNKNOWN_MESSAGE_CONFIRMATION,
            AlertKind::UnknownMessageExecution => UNKNOWN_MESSAGE_EXECUTION,
            AlertKind::StuckMessageConfirmation => STUCK_MESSAGE_CONFIRMATION,
            AlertKind::FailedMessageExecution => FAILED_MESSAGE_EXECUTION,
            AlertKind::UnknownInformationSignature => UNKNOWN_INFORMATION_SIGNATURE,
            AlertKind::UnknownInformationExecution => UNKNOWN_INFORMATION_EXECUTION,
            AlertKind::StuckInformationRequest => STUCK_INFORMATION_REQUEST,
            AlertKind::FailedInformationRequest => FAILED_INFORMATION_REQUEST,
            AlertKind::DifferentInformationSignatures => DIFFERENT_INFORMATION_SIGNATURES,
            AlertKind::UnknownErcToNativeMessageConfirmation => UNKNOWN_ERC_TO_NATIVE_CONFIRMATION,
            AlertKind::UnknownErcToNativeMessageExecution => UNKNOWN_ERC_TO_NATIVE_EXECUTION,
            AlertKind::StuckErcToNativeMessageConfirmation => STUCK_ERC_TO_NATIVE_CONFIRMATION,
            AlertKind::LastValidatorActivity => LAST_VALIDATOR_ACTIVITY,
        }
    }

    #[test]
    fn test_every_query_selects_the_declared_labels() {
        for kind in ALL_ALERT_KINDS {
            let sql = query_text(*kind);
            for label in kind.label_names() {
                assert!(
                    sql.contains(&format!("AS {}", label)) || sql.contains(&format!("l.{}", label))
                        || sql.contains(&format!("bv.{}", label)),
                    "{}: label {} not selected",
                    kind.as_str(),
                    label
                );
            }
            assert!(sql.contains("AS _value"), "{}: no _value", kind.as_str());
        }
    }

    #[test]
    fn test_unknown_queries_carry_the_gate() {
        for kind in [
            AlertKind::UnknownMessageConfirmation,
            AlertKind::UnknownMessageExecution,
            AlertKind::UnknownInformationSignature,
            AlertKind::UnknownInformationExecution,
            AlertKind::UnknownErcToNativeMessageConfirmation,
            AlertKind::UnknownErcToNativeMessageExecution,
        ] {
            assert!(
                query_text(kind).contains("min_processed"),
                "{} must be gated on the min processed timestamp",
                kind.as_str()
            );
        }
    }

    #[test]
    fn test_stuck_queries_have_grace_interval() {
        for kind in [
            AlertKind::StuckMessageConfirmation,
            AlertKind::StuckInformationRequest,
            AlertKind::StuckErcToNativeMessageConfirmation,
        ] {
            assert!(query_text(kind).contains("INTERVAL '10 minutes'"));
        }
    }
}
