// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use monitor_schema::models::{
    ErcToNativeMessage, Message, NewCollectedMessage, NewErcToNativeMessage, NewExecutedMessage,
    NewMessage, NewSentMessage, NewSignedMessage, SentMessage, SignedMessage,
};
use monitor_schema::schema::{
    collected_messages, erc_to_native_messages, executed_messages, messages, sent_messages,
    signed_messages,
};

use super::RepoCore;
use crate::error::MonitorResult;

#[derive(Clone)]
pub struct MessagesRepo {
    core: RepoCore,
}

impl MessagesRepo {
    pub(super) fn new(core: RepoCore) -> Self {
        Self { core }
    }

    pub async fn ensure(&self, row: NewMessage) -> MonitorResult<()> {
        let _t = self.core.timer("messages_ensure");
        let mut conn = self.core.conn().await?;
        diesel::insert_into(messages::table)
            .values(&row)
            .on_conflict((messages::bridge_id, messages::msg_hash))
            .do_update()
            .set(messages::updated_at.eq(diesel::dsl::now))
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    pub async fn find_by_msg_hash(
        &self,
        bridge_id: &str,
        msg_hash: &[u8],
    ) -> MonitorResult<Option<Message>> {
        let _t = self.core.timer("messages_find_by_msg_hash");
        let mut conn = self.core.conn().await?;
        Ok(messages::table
            .filter(messages::bridge_id.eq(bridge_id))
            .filter(messages::msg_hash.eq(msg_hash))
            .first(&mut conn)
            .await
            .optional()?)
    }

    pub async fn find_by_msg_hashes(
        &self,
        bridge_id: &str,
        msg_hashes: &[Vec<u8>],
    ) -> MonitorResult<Vec<Message>> {
        let _t = self.core.timer("messages_find_by_msg_hashes");
        let mut conn = self.core.conn().await?;
        Ok(messages::table
            .filter(messages::bridge_id.eq(bridge_id))
            .filter(messages::msg_hash.eq_any(msg_hashes))
            .load(&mut conn)
            .await?)
    }
}

#[derive(Clone)]
pub struct ErcToNativeMessagesRepo {
    core: RepoCore,
}

impl ErcToNativeMessagesRepo {
    pub(super) fn new(core: RepoCore) -> Self {
        Self { core }
    }

    pub async fn ensure(&self, row: NewErcToNativeMessage) -> MonitorResult<()> {
        let _t = self.core.timer("erc_to_native_messages_ensure");
        let mut conn = self.core.conn().await?;
        diesel::insert_into(erc_to_native_messages::table)
            .values(&row)
            .on_conflict((
                erc_to_native_messages::bridge_id,
                erc_to_native_messages::msg_hash,
            ))
            .do_update()
            .set(erc_to_native_messages::updated_at.eq(diesel::dsl::now))
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    pub async fn find_by_msg_hash(
        &self,
        bridge_id: &str,
        msg_hash: &[u8],
    ) -> MonitorResult<Option<ErcToNativeMessage>> {
        let _t = self.core.timer("erc_to_native_messages_find_by_msg_hash");
        let mut conn = self.core.conn().await?;
        Ok(erc_to_native_messages::table
            .filter(erc_to_native_messages::bridge_id.eq(bridge_id))
            .filter(erc_to_native_messages::msg_hash.eq(msg_hash))
            .first(&mut conn)
            .await
            .optional()?)
    }

    pub async fn find_by_msg_hashes(
        &self,
        bridge_id: &str,
        msg_hashes: &[Vec<u8>],
    ) -> MonitorResult<Vec<ErcToNativeMessage>> {
        let _t = self.core.timer("erc_to_native_messages_find_by_msg_hashes");
        let mut conn = self.core.conn().await?;
        Ok(erc_to_native_messages::table
            .filter(erc_to_native_messages::bridge_id.eq(bridge_id))
            .filter(erc_to_native_messages::msg_hash.eq_any(msg_hashes))
            .load(&mut conn)
            .await?)
    }
}

#[derive(Clone)]
pub struct SentMessagesRepo {
    core: RepoCore,
}

impl SentMessagesRepo {
    pub(super) fn new(core: RepoCore) -> Self {
        Self { core }
    }

    pub async fn ensure(&self, row: NewSentMessage) -> MonitorResult<()> {
        let _t = self.core.timer("sent_messages_ensure");
        let mut conn = self.core.conn().await?;
        diesel::insert_into(sent_messages::table)
            .values(&row)
            .on_conflict(sent_messages::log_id)
            .do_update()
            .set(sent_messages::updated_at.eq(diesel::dsl::now))
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    pub async fn find_by_log_ids(&self, log_ids: &[i64]) -> MonitorResult<Vec<SentMessage>> {
        let _t = self.core.timer("sent_messages_find_by_log_ids");
        let mut conn = self.core.conn().await?;
        Ok(sent_messages::table
            .filter(sent_messages::log_id.eq_any(log_ids))
            .load(&mut conn)
            .await?)
    }
}

#[derive(Clone)]
pub struct SignedMessagesRepo {
    core: RepoCore,
}

impl SignedMessagesRepo {
    pub(super) fn new(core: RepoCore) -> Self {
        Self { core }
    }

    pub async fn ensure(&self, row: NewSignedMessage) -> MonitorResult<()> {
        let _t = self.core.timer("signed_messages_ensure");
        let mut conn = self.core.conn().await?;
        diesel::insert_into(signed_messages::table)
            .values(&row)
            .on_conflict(signed_messages::log_id)
            .do_update()
            .set(signed_messages::updated_at.eq(diesel::dsl::now))
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    /// Single vectorized finder covering the one-hash case as well.
    pub async fn find_by_msg_hashes(
        &self,
        bridge_id: &str,
        msg_hashes: &[Vec<u8>],
    ) -> MonitorResult<Vec<SignedMessage>> {
        let _t = self.core.timer("signed_messages_find_by_msg_hashes");
        let mut conn = self.core.conn().await?;
        Ok(signed_messages::table
            .filter(signed_messages::bridge_id.eq(bridge_id))
            .filter(signed_messages::msg_hash.eq_any(msg_hashes))
            .load(&mut conn)
            .await?)
    }
}

#[derive(Clone)]
pub struct CollectedMessagesRepo {
    core: RepoCore,
}

impl CollectedMessagesRepo {
    pub(super) fn new(core: RepoCore) -> Self {
        Self { core }
    }

    pub async fn ensure(&self, row: NewCollectedMessage) -> MonitorResult<()> {
        let _t = self.core.timer("collected_messages_ensure");
        let mut conn = self.core.conn().await?;
        diesel::insert_into(collected_messages::table)
            .values(&row)
            .on_conflict(collected_messages::log_id)
            .do_update()
            .set(collected_messages::updated_at.eq(diesel::dsl::now))
            .execute(&mut conn)
            .await?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct ExecutedMessagesRepo {
    core: RepoCore,
}

impl ExecutedMessagesRepo {
    pub(super) fn new(core: RepoCore) -> Self {
        Self { core }
    }

    pub async fn ensure(&self, row: NewExecutedMessage) -> MonitorResult<()> {
        let _t = self.core.timer("executed_messages_ensure");
        let mut conn = self.core.conn().await?;
        diesel::insert_into(executed_messages::table)
            .values(&row)
            .on_conflict(executed_messages::log_id)
            .do_update()
            .set(executed_messages::updated_at.eq(diesel::dsl::now))
            .execute(&mut conn)
            .await?;
        Ok(())
    }
}
