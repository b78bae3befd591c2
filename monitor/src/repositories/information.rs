// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use monitor_schema::models::{
    NewExecutedInformationRequest, NewInformationRequest, NewSentInformationRequest,
    NewSignedInformationRequest,
};
use monitor_schema::schema::{
    executed_information_requests, information_requests, sent_information_requests,
    signed_information_requests,
};

use super::RepoCore;
use crate::error::MonitorResult;

/// Repositories for the information-request sub-protocol. The four tables are
/// small and always written together from the same handler set, so they share
/// one repo.
#[derive(Clone)]
pub struct InformationRequestsRepo {
    core: RepoCore,
}

impl InformationRequestsRepo {
    pub(super) fn new(core: RepoCore) -> Self {
        Self { core }
    }

    pub async fn ensure(&self, row: NewInformationRequest) -> MonitorResult<()> {
        let _t = self.core.timer("information_requests_ensure");
        let mut conn = self.core.conn().await?;
        diesel::insert_into(information_requests::table)
            .values(&row)
            .on_conflict((
                information_requests::bridge_id,
                information_requests::message_id,
            ))
            .do_update()
            .set(information_requests::updated_at.eq(diesel::dsl::now))
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    pub async fn ensure_sent(&self, row: NewSentInformationRequest) -> MonitorResult<()> {
        let _t = self.core.timer("sent_information_requests_ensure");
        let mut conn = self.core.conn().await?;
        diesel::insert_into(sent_information_requests::table)
            .values(&row)
            .on_conflict(sent_information_requests::log_id)
            .do_update()
            .set(sent_information_requests::updated_at.eq(diesel::dsl::now))
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    pub async fn ensure_signed(&self, row: NewSignedInformationRequest) -> MonitorResult<()> {
        let _t = self.core.timer("signed_information_requests_ensure");
        let mut conn = self.core.conn().await?;
        diesel::insert_into(signed_information_requests::table)
            .values(&row)
            .on_conflict(signed_information_requests::log_id)
            .do_update()
            .set(signed_information_requests::updated_at.eq(diesel::dsl::now))
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    pub async fn ensure_executed(&self, row: NewExecutedInformationRequest) -> MonitorResult<()> {
        let _t = self.core.timer("executed_information_requests_ensure");
        let mut conn = self.core.conn().await?;
        diesel::insert_into(executed_information_requests::table)
            .values(&row)
            .on_conflict(executed_information_requests::log_id)
            .do_update()
            .set(executed_information_requests::updated_at.eq(diesel::dsl::now))
            .execute(&mut conn)
            .await?;
        Ok(())
    }
}
