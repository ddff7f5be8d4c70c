// SPDX-FileCopyrightText: 2026 Pitcrew Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The work-order state machine.
//!
//! States: OPEN (initial) -> DONE | CANCELLED (terminal). The soft-delete
//! flag is an orthogonal sub-machine: active -> cleared -> active
//! (recovered); purging expired cleared rows belongs to an external sweep.
//!
//! Every operation:
//! 1. loads the current row (NotFound if absent or in another guild),
//! 2. re-validates the permission predicate against freshly loaded state,
//! 3. applies a conditional update whose WHERE clause re-asserts the
//!    precondition, treating zero affected rows as a lost race,
//! 4. appends one best-effort audit record,
//! 5. returns the updated entity or a typed failure.

use pitcrew_core::audit::AuditDetail;
use pitcrew_core::{
    permissions, ActorContext, PitcrewError, Priority, WorkOrder, WorkOrderStatus, WorkOrderUpdate,
};
use pitcrew_storage::database::now_rfc3339;
use pitcrew_storage::queries;
use tracing::info;

use crate::audit_sink::{self, GUILD_WIDE};
use crate::OrderService;

/// Input for `create`.
#[derive(Debug, Clone)]
pub struct CreateWorkOrder {
    pub title: String,
    pub description: String,
    pub subsystem_id: String,
    pub priority: Priority,
    pub cad_link: Option<String>,
    pub notify_user_ids: Vec<String>,
    pub notify_role_ids: Vec<String>,
}

impl OrderService {
    /// Load a work order, treating rows from other guilds as absent.
    async fn load_in_guild(
        &self,
        actor: &ActorContext,
        id: &str,
    ) -> Result<WorkOrder, PitcrewError> {
        let wo = queries::work_orders::get(self.db(), id)
            .await?
            .ok_or_else(|| PitcrewError::work_order_not_found(id))?;
        if wo.guild_id != actor.guild_id {
            return Err(PitcrewError::work_order_not_found(id));
        }
        Ok(wo)
    }

    /// Derive the precise error after a conditional update affected zero
    /// rows: the precondition no longer held at write time.
    async fn lost_race(
        &self,
        actor: &ActorContext,
        id: &str,
        predicate: fn(&ActorContext, &WorkOrder) -> Result<(), PitcrewError>,
    ) -> PitcrewError {
        match self.load_in_guild(actor, id).await {
            Ok(fresh) => match predicate(actor, &fresh) {
                Err(e) => e,
                // The row changed and changed back between our write and
                // this read; the caller can simply retry.
                Ok(()) => PitcrewError::InvalidState(
                    "work order changed concurrently, try again".into(),
                ),
            },
            Err(e) => e,
        }
    }

    /// Create a new work order. Any authenticated member may create.
    pub async fn create(
        &self,
        actor: &ActorContext,
        req: CreateWorkOrder,
    ) -> Result<WorkOrder, PitcrewError> {
        let title = req.title.trim();
        if title.is_empty() {
            return Err(PitcrewError::Validation("title must not be empty".into()));
        }
        let subsystem = queries::subsystems::get(self.db(), &req.subsystem_id)
            .await?
            .filter(|s| s.guild_id == actor.guild_id)
            .ok_or(PitcrewError::NotFound {
                what: "subsystem",
                id: req.subsystem_id.clone(),
            })?;

        let now = now_rfc3339();
        let wo = WorkOrder {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.to_string(),
            description: req.description,
            subsystem_id: subsystem.id,
            priority: req.priority,
            status: WorkOrderStatus::Open,
            created_by_user_id: actor.user_id.clone(),
            assigned_to_user_id: None,
            claimed_by_user_id: None,
            discord_message_id: None,
            discord_channel_id: None,
            discord_thread_id: None,
            guild_id: actor.guild_id.clone(),
            is_deleted: false,
            cleared_at: None,
            cad_link: req.cad_link,
            notify_user_ids: req.notify_user_ids,
            notify_role_ids: req.notify_role_ids,
            created_at: now.clone(),
            updated_at: now,
        };
        queries::work_orders::insert(self.db(), &wo).await?;
        info!(id = %wo.id, guild = %wo.guild_id, "work order created");

        audit_sink::record(
            self.db(),
            &wo.guild_id,
            &wo.id,
            &actor.user_id,
            &AuditDetail::Created {
                title: wo.title.clone(),
                subsystem_id: wo.subsystem_id.clone(),
                priority: wo.priority,
            },
        )
        .await;
        Ok(wo)
    }

    /// Get a work order by id, scoped to the actor's guild.
    pub async fn get(&self, actor: &ActorContext, id: &str) -> Result<WorkOrder, PitcrewError> {
        self.load_in_guild(actor, id).await
    }

    /// Non-deleted work orders for the guild, newest first, optionally
    /// filtered by status.
    pub async fn list(
        &self,
        guild_id: &str,
        status: Option<WorkOrderStatus>,
    ) -> Result<Vec<WorkOrder>, PitcrewError> {
        queries::work_orders::list(self.db(), guild_id, status).await
    }

    /// Open work orders for the guild, newest first.
    pub async fn list_open(&self, guild_id: &str) -> Result<Vec<WorkOrder>, PitcrewError> {
        self.list(guild_id, Some(WorkOrderStatus::Open)).await
    }

    /// Claim an open, unclaimed work order for the actor.
    pub async fn claim(&self, actor: &ActorContext, id: &str) -> Result<WorkOrder, PitcrewError> {
        let wo = self.load_in_guild(actor, id).await?;
        permissions::can_claim(actor, &wo)?;

        let n = queries::work_orders::claim(self.db(), id, &actor.user_id).await?;
        if n == 0 {
            return Err(self.lost_race(actor, id, permissions::can_claim).await);
        }

        audit_sink::record(self.db(), &wo.guild_id, id, &actor.user_id, &AuditDetail::Claimed)
            .await;
        self.load_in_guild(actor, id).await
    }

    /// Release a claim. The claimer or an admin may unclaim.
    pub async fn unclaim(&self, actor: &ActorContext, id: &str) -> Result<WorkOrder, PitcrewError> {
        let wo = self.load_in_guild(actor, id).await?;
        permissions::can_unclaim(actor, &wo)?;
        // The predicate guarantees a claimer exists on the loaded row; the
        // write only applies while that same claimer still holds it.
        let previous_claimer = wo
            .claimed_by_user_id
            .clone()
            .ok_or_else(|| PitcrewError::InvalidState("work order is not claimed".into()))?;

        let n = queries::work_orders::unclaim(self.db(), id, &previous_claimer).await?;
        if n == 0 {
            return Err(self.lost_race(actor, id, permissions::can_unclaim).await);
        }

        audit_sink::record(
            self.db(),
            &wo.guild_id,
            id,
            &actor.user_id,
            &AuditDetail::Unclaimed { previous_claimer },
        )
        .await;
        self.load_in_guild(actor, id).await
    }

    /// Mark an open work order DONE. Claimer, assignee, or admin.
    pub async fn finish(&self, actor: &ActorContext, id: &str) -> Result<WorkOrder, PitcrewError> {
        let wo = self.load_in_guild(actor, id).await?;
        permissions::can_finish(actor, &wo)?;

        let n = queries::work_orders::set_status(
            self.db(),
            id,
            WorkOrderStatus::Open,
            WorkOrderStatus::Done,
        )
        .await?;
        if n == 0 {
            return Err(self.lost_race(actor, id, permissions::can_finish).await);
        }

        audit_sink::record(
            self.db(),
            &wo.guild_id,
            id,
            &actor.user_id,
            &AuditDetail::StatusChanged {
                from: WorkOrderStatus::Open,
                to: WorkOrderStatus::Done,
            },
        )
        .await;
        self.load_in_guild(actor, id).await
    }

    /// Cancel an open work order. Creator or admin.
    pub async fn cancel(&self, actor: &ActorContext, id: &str) -> Result<WorkOrder, PitcrewError> {
        let wo = self.load_in_guild(actor, id).await?;
        permissions::can_cancel(actor, &wo)?;

        let n = queries::work_orders::set_status(
            self.db(),
            id,
            WorkOrderStatus::Open,
            WorkOrderStatus::Cancelled,
        )
        .await?;
        if n == 0 {
            return Err(self.lost_race(actor, id, permissions::can_cancel).await);
        }

        audit_sink::record(
            self.db(),
            &wo.guild_id,
            id,
            &actor.user_id,
            &AuditDetail::Cancelled {
                from: WorkOrderStatus::Open,
                to: WorkOrderStatus::Cancelled,
            },
        )
        .await;
        self.load_in_guild(actor, id).await
    }

    /// Assign a work order to a member. Admin only.
    pub async fn assign(
        &self,
        actor: &ActorContext,
        id: &str,
        assignee_user_id: &str,
    ) -> Result<WorkOrder, PitcrewError> {
        let wo = self.load_in_guild(actor, id).await?;
        permissions::can_assign(actor, &wo)?;

        queries::users::get(self.db(), assignee_user_id)
            .await?
            .ok_or(PitcrewError::NotFound {
                what: "user",
                id: assignee_user_id.to_string(),
            })?;

        queries::work_orders::assign(self.db(), id, Some(assignee_user_id)).await?;

        audit_sink::record(
            self.db(),
            &wo.guild_id,
            id,
            &actor.user_id,
            &AuditDetail::Assigned {
                assigned_to: assignee_user_id.to_string(),
            },
        )
        .await;
        self.load_in_guild(actor, id).await
    }

    /// Apply a partial edit. Creator or admin; at least one field required.
    pub async fn edit(
        &self,
        actor: &ActorContext,
        id: &str,
        update: WorkOrderUpdate,
    ) -> Result<WorkOrder, PitcrewError> {
        if update.is_empty() {
            // Rejected before any store mutation; no audit record.
            return Err(PitcrewError::Validation("no changes provided".into()));
        }
        if let Some(title) = &update.title {
            if title.trim().is_empty() {
                return Err(PitcrewError::Validation("title must not be empty".into()));
            }
        }

        let wo = self.load_in_guild(actor, id).await?;
        permissions::can_edit(actor, &wo)?;

        if let Some(subsystem_id) = &update.subsystem_id {
            queries::subsystems::get(self.db(), subsystem_id)
                .await?
                .filter(|s| s.guild_id == actor.guild_id)
                .ok_or(PitcrewError::NotFound {
                    what: "subsystem",
                    id: subsystem_id.clone(),
                })?;
        }

        let changed_fields = update.changed_fields();
        queries::work_orders::apply_update(self.db(), id, &update).await?;

        audit_sink::record(
            self.db(),
            &wo.guild_id,
            id,
            &actor.user_id,
            &AuditDetail::Edited { changed_fields },
        )
        .await;
        self.load_in_guild(actor, id).await
    }

    /// Soft-delete a single work order. Admin only.
    pub async fn remove(&self, actor: &ActorContext, id: &str) -> Result<WorkOrder, PitcrewError> {
        let wo = self.load_in_guild(actor, id).await?;
        permissions::can_remove(actor, &wo)?;

        queries::work_orders::soft_delete(self.db(), id).await?;
        info!(id, guild = %wo.guild_id, "work order removed");

        audit_sink::record(self.db(), &wo.guild_id, id, &actor.user_id, &AuditDetail::Removed)
            .await;
        self.load_in_guild(actor, id).await
    }

    /// Soft-delete all non-deleted work orders in the actor's guild
    /// matching the selected statuses, stamping one shared `cleared_at`.
    /// Returns the number of rows cleared. Admin only.
    pub async fn bulk_clear(
        &self,
        actor: &ActorContext,
        statuses: &[WorkOrderStatus],
    ) -> Result<usize, PitcrewError> {
        if !actor.is_admin {
            return Err(PitcrewError::PermissionDenied("admin role required".into()));
        }
        if statuses.is_empty() {
            return Err(PitcrewError::Validation(
                "select at least one status to clear".into(),
            ));
        }

        let cleared_at = now_rfc3339();
        let count =
            queries::work_orders::bulk_clear(self.db(), &actor.guild_id, statuses, &cleared_at)
                .await?;
        info!(count, guild = %actor.guild_id, "work orders cleared");

        audit_sink::record(
            self.db(),
            &actor.guild_id,
            GUILD_WIDE,
            &actor.user_id,
            &AuditDetail::Cleared {
                statuses: statuses.to_vec(),
                count,
            },
        )
        .await;
        Ok(count)
    }

    /// Restore every cleared work order in the actor's guild (all-or-nothing
    /// undo of prior clears still inside the recovery window). Returns the
    /// number of rows restored. Admin only.
    pub async fn recover(&self, actor: &ActorContext) -> Result<usize, PitcrewError> {
        if !actor.is_admin {
            return Err(PitcrewError::PermissionDenied("admin role required".into()));
        }

        let count = queries::work_orders::recover_cleared(self.db(), &actor.guild_id).await?;
        info!(count, guild = %actor.guild_id, "work orders recovered");

        audit_sink::record(
            self.db(),
            &actor.guild_id,
            GUILD_WIDE,
            &actor.user_id,
            &AuditDetail::Recovered { count },
        )
        .await;
        Ok(count)
    }
}
