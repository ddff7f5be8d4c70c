// SPDX-FileCopyrightText: 2026 Pitcrew Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pure permission predicates for work-order transitions.
//!
//! Each predicate decides from `(actor, work order)` alone whether a
//! transition is allowed. Status problems surface as `InvalidState` and
//! actor problems as `PermissionDenied`, so front-ends can render the two
//! distinctly. The lifecycle layer re-runs these against freshly loaded
//! rows; callers must never pass cached state.

use crate::error::PitcrewError;
use crate::types::{ActorContext, WorkOrder, WorkOrderStatus};

fn require_open(wo: &WorkOrder) -> Result<(), PitcrewError> {
    if wo.status != WorkOrderStatus::Open {
        return Err(PitcrewError::InvalidState(format!(
            "work order is {}",
            wo.status.label().to_lowercase()
        )));
    }
    Ok(())
}

/// A member may claim an open, unclaimed work order. Re-claiming your own
/// claim is rejected rather than treated as a silent success.
pub fn can_claim(actor: &ActorContext, wo: &WorkOrder) -> Result<(), PitcrewError> {
    require_open(wo)?;
    match wo.claimed_by_user_id.as_deref() {
        None => Ok(()),
        Some(claimer) if claimer == actor.user_id => Err(PitcrewError::InvalidState(
            "you have already claimed this work order".into(),
        )),
        Some(_) => Err(PitcrewError::PermissionDenied(
            "already claimed by another member".into(),
        )),
    }
}

/// The claimer, or an admin, may release a claim on an open work order.
pub fn can_unclaim(actor: &ActorContext, wo: &WorkOrder) -> Result<(), PitcrewError> {
    require_open(wo)?;
    match wo.claimed_by_user_id.as_deref() {
        None => Err(PitcrewError::InvalidState(
            "work order is not claimed".into(),
        )),
        Some(claimer) if claimer == actor.user_id || actor.is_admin => Ok(()),
        Some(_) => Err(PitcrewError::PermissionDenied(
            "you can only unclaim your own work orders".into(),
        )),
    }
}

/// The claimer, the assignee, or an admin may mark an open work order done.
pub fn can_finish(actor: &ActorContext, wo: &WorkOrder) -> Result<(), PitcrewError> {
    require_open(wo)?;
    let allowed = wo.claimed_by_user_id.as_deref() == Some(actor.user_id.as_str())
        || wo.assigned_to_user_id.as_deref() == Some(actor.user_id.as_str())
        || actor.is_admin;
    if allowed {
        Ok(())
    } else {
        Err(PitcrewError::PermissionDenied(
            "only the claimer, assignee, or an admin can finish this work order".into(),
        ))
    }
}

/// The creator or an admin may edit, in any status.
pub fn can_edit(actor: &ActorContext, wo: &WorkOrder) -> Result<(), PitcrewError> {
    if wo.created_by_user_id == actor.user_id || actor.is_admin {
        Ok(())
    } else {
        Err(PitcrewError::PermissionDenied(
            "only the creator or an admin can edit this work order".into(),
        ))
    }
}

/// Assignment is admin-only, unconditionally.
pub fn can_assign(actor: &ActorContext, _wo: &WorkOrder) -> Result<(), PitcrewError> {
    if actor.is_admin {
        Ok(())
    } else {
        Err(PitcrewError::PermissionDenied("admin role required".into()))
    }
}

/// Removal (soft delete) is admin-only, unconditionally.
pub fn can_remove(actor: &ActorContext, _wo: &WorkOrder) -> Result<(), PitcrewError> {
    if actor.is_admin {
        Ok(())
    } else {
        Err(PitcrewError::PermissionDenied("admin role required".into()))
    }
}

/// The creator or an admin may cancel an open work order.
pub fn can_cancel(actor: &ActorContext, wo: &WorkOrder) -> Result<(), PitcrewError> {
    require_open(wo)?;
    if wo.created_by_user_id == actor.user_id || actor.is_admin {
        Ok(())
    } else {
        Err(PitcrewError::PermissionDenied(
            "only the creator or an admin can cancel this work order".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Priority;

    fn open_wo() -> WorkOrder {
        WorkOrder {
            id: "wo-1".into(),
            title: "Fix drivetrain belt".into(),
            description: String::new(),
            subsystem_id: "sub-1".into(),
            priority: Priority::Medium,
            status: WorkOrderStatus::Open,
            created_by_user_id: "creator".into(),
            assigned_to_user_id: None,
            claimed_by_user_id: None,
            discord_message_id: None,
            discord_channel_id: None,
            discord_thread_id: None,
            guild_id: "g1".into(),
            is_deleted: false,
            cleared_at: None,
            cad_link: None,
            notify_user_ids: vec![],
            notify_role_ids: vec![],
            created_at: "2026-01-01T00:00:00.000Z".into(),
            updated_at: "2026-01-01T00:00:00.000Z".into(),
        }
    }

    fn member(id: &str) -> ActorContext {
        ActorContext::new(id, "g1", false)
    }

    fn admin(id: &str) -> ActorContext {
        ActorContext::new(id, "g1", true)
    }

    #[test]
    fn claim_allowed_on_open_unclaimed() {
        assert!(can_claim(&member("u1"), &open_wo()).is_ok());
    }

    #[test]
    fn claim_rejected_when_claimed_by_other() {
        let mut wo = open_wo();
        wo.claimed_by_user_id = Some("u2".into());
        let err = can_claim(&member("u1"), &wo).unwrap_err();
        assert!(matches!(err, PitcrewError::PermissionDenied(_)));
    }

    #[test]
    fn claim_rejected_when_already_claimed_by_self() {
        let mut wo = open_wo();
        wo.claimed_by_user_id = Some("u1".into());
        let err = can_claim(&member("u1"), &wo).unwrap_err();
        assert!(matches!(err, PitcrewError::InvalidState(_)));
    }

    #[test]
    fn claim_rejected_on_terminal_status() {
        for status in [WorkOrderStatus::Done, WorkOrderStatus::Cancelled] {
            let mut wo = open_wo();
            wo.status = status;
            let err = can_claim(&member("u1"), &wo).unwrap_err();
            assert!(matches!(err, PitcrewError::InvalidState(_)));
        }
    }

    #[test]
    fn unclaim_by_claimer_and_admin_only() {
        let mut wo = open_wo();
        wo.claimed_by_user_id = Some("u1".into());
        assert!(can_unclaim(&member("u1"), &wo).is_ok());
        assert!(can_unclaim(&admin("boss"), &wo).is_ok());
        assert!(matches!(
            can_unclaim(&member("u2"), &wo).unwrap_err(),
            PitcrewError::PermissionDenied(_)
        ));
    }

    #[test]
    fn unclaim_rejected_when_not_claimed() {
        assert!(matches!(
            can_unclaim(&member("u1"), &open_wo()).unwrap_err(),
            PitcrewError::InvalidState(_)
        ));
    }

    #[test]
    fn finish_by_claimer_assignee_or_admin() {
        let mut wo = open_wo();
        wo.claimed_by_user_id = Some("claimer".into());
        wo.assigned_to_user_id = Some("assignee".into());
        assert!(can_finish(&member("claimer"), &wo).is_ok());
        assert!(can_finish(&member("assignee"), &wo).is_ok());
        assert!(can_finish(&admin("boss"), &wo).is_ok());
        assert!(matches!(
            can_finish(&member("bystander"), &wo).unwrap_err(),
            PitcrewError::PermissionDenied(_)
        ));
    }

    #[test]
    fn finish_rejected_on_cancelled() {
        let mut wo = open_wo();
        wo.status = WorkOrderStatus::Cancelled;
        assert!(matches!(
            can_finish(&admin("boss"), &wo).unwrap_err(),
            PitcrewError::InvalidState(_)
        ));
    }

    #[test]
    fn edit_by_creator_or_admin() {
        let wo = open_wo();
        assert!(can_edit(&member("creator"), &wo).is_ok());
        assert!(can_edit(&admin("boss"), &wo).is_ok());
        assert!(can_edit(&member("u2"), &wo).is_err());
    }

    #[test]
    fn assign_and_remove_are_admin_only() {
        let wo = open_wo();
        assert!(can_assign(&admin("boss"), &wo).is_ok());
        assert!(can_assign(&member("creator"), &wo).is_err());
        assert!(can_remove(&admin("boss"), &wo).is_ok());
        assert!(can_remove(&member("creator"), &wo).is_err());
    }

    #[test]
    fn cancel_by_creator_or_admin_while_open() {
        let wo = open_wo();
        assert!(can_cancel(&member("creator"), &wo).is_ok());
        assert!(can_cancel(&admin("boss"), &wo).is_ok());
        assert!(matches!(
            can_cancel(&member("u2"), &wo).unwrap_err(),
            PitcrewError::PermissionDenied(_)
        ));

        let mut done = open_wo();
        done.status = WorkOrderStatus::Done;
        assert!(matches!(
            can_cancel(&member("creator"), &done).unwrap_err(),
            PitcrewError::InvalidState(_)
        ));
    }
}
