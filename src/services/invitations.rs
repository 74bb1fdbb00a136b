use std::str::FromStr;

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::invitation::{Invitation, InvitationStatus, InvitationView};
use crate::models::membership::Role;
use crate::models::user::is_valid_email;
use crate::services::email::EmailService;
use crate::services::metrics;
use crate::services::notifications::NotificationService;

pub struct InvitationService;

impl InvitationService {
    /// Invite a registered account into a building as children. All guards
    /// run before the invitation row exists, and the row exists before any
    /// notification goes out: a rejected invite never notifies anyone.
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        pool: &PgPool,
        email_svc: Option<&EmailService>,
        notifications: &NotificationService,
        building_id: &str,
        invited_by: &str,
        target_email: &str,
        app_base_url: &str,
    ) -> Result<Invitation, ApiError> {
        let target_email = target_email.trim().to_lowercase();
        if !is_valid_email(&target_email) {
            return Err(ApiError::Validation("Malformed email address".into()));
        }

        let registered: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(&target_email)
                .fetch_one(pool)
                .await?;
        if !registered {
            return Err(ApiError::Validation(
                "No registered account with this email".into(),
            ));
        }

        let already_member: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM user_buildings
                           WHERE building_id = $1 AND user_email = $2)",
        )
        .bind(building_id)
        .bind(&target_email)
        .fetch_one(pool)
        .await?;
        if already_member {
            return Err(ApiError::Conflict(
                "This user already has access to the building".into(),
            ));
        }

        let pending: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM invitations
                           WHERE building_id = $1 AND email = $2 AND status = $3)",
        )
        .bind(building_id)
        .bind(&target_email)
        .bind(InvitationStatus::Invited.to_string())
        .fetch_one(pool)
        .await?;
        if pending {
            return Err(ApiError::Conflict(
                "An invitation for this user is already pending".into(),
            ));
        }

        let invitation = sqlx::query_as::<_, Invitation>(
            "INSERT INTO invitations (building_id, email, invited_by)
             VALUES ($1, $2, $3)
             RETURNING *",
        )
        .bind(building_id)
        .bind(&target_email)
        .bind(invited_by)
        .fetch_one(pool)
        .await?;

        metrics::INVITATIONS_COUNTER
            .with_label_values(&[building_id])
            .inc();

        let building_name: String =
            sqlx::query_scalar("SELECT name FROM buildings WHERE id = $1")
                .bind(building_id)
                .fetch_optional(pool)
                .await
                .ok()
                .flatten()
                .unwrap_or_else(|| building_id.to_string());

        // Best-effort fan-out, no retry: the durable row is the source of
        // truth, a failed send just costs the invitee a ping.
        if let Some(svc) = email_svc {
            if let Err(e) = svc
                .send_invitation(&target_email, &building_name, invited_by, app_base_url)
                .await
            {
                tracing::warn!("Invitation email to {} failed: {}", target_email, e);
            }
        }
        if let Err(e) = notifications
            .notify_user(
                pool,
                &target_email,
                "Building invitation",
                &format!("{invited_by} invited you to {building_name}"),
                Some(serde_json::json!({ "invitation_id": invitation.id })),
            )
            .await
        {
            tracing::warn!("Invitation push to {} failed: {}", target_email, e);
        }

        Ok(invitation)
    }

    /// Pending invitations of a building, for the parents' management view.
    pub async fn list_for_building(
        pool: &PgPool,
        building_id: &str,
    ) -> Result<Vec<Invitation>, ApiError> {
        let invitations = sqlx::query_as::<_, Invitation>(
            "SELECT * FROM invitations
             WHERE building_id = $1 AND status = $2
             ORDER BY created_at DESC",
        )
        .bind(building_id)
        .bind(InvitationStatus::Invited.to_string())
        .fetch_all(pool)
        .await?;
        Ok(invitations)
    }

    /// The invitee's inbox: pending invitations addressed to them.
    pub async fn list_for_user(pool: &PgPool, email: &str) -> Result<Vec<InvitationView>, ApiError> {
        let invitations = sqlx::query_as::<_, InvitationView>(
            "SELECT i.id, i.building_id, b.name AS building_name,
                    i.invited_by, i.status, i.created_at
             FROM invitations i
             JOIN buildings b ON b.id = i.building_id
             WHERE i.email = $1 AND i.status = $2
             ORDER BY i.created_at DESC",
        )
        .bind(email)
        .bind(InvitationStatus::Invited.to_string())
        .fetch_all(pool)
        .await?;
        Ok(invitations)
    }

    /// Accept or decline. Only the invitee may answer, only once; accepting
    /// creates the children membership (empty allowlist) atomically with
    /// the status flip.
    pub async fn respond(
        pool: &PgPool,
        invitation_id: Uuid,
        acting_email: &str,
        accept: bool,
    ) -> Result<Invitation, ApiError> {
        let invitation: Invitation =
            sqlx::query_as("SELECT * FROM invitations WHERE id = $1")
                .bind(invitation_id)
                .fetch_optional(pool)
                .await?
                .ok_or_else(|| ApiError::NotFound("Invitation not found".into()))?;

        if invitation.email != acting_email {
            return Err(ApiError::PermissionDenied(
                "Only the invited user can answer this invitation".into(),
            ));
        }

        let current = InvitationStatus::from_str(&invitation.status)
            .map_err(|e| ApiError::Internal(e.to_string()))?;
        let next = if accept {
            InvitationStatus::Accepted
        } else {
            InvitationStatus::Declined
        };
        if !current.can_transition_to(next) {
            return Err(ApiError::Conflict(
                "Invitation has already been answered".into(),
            ));
        }

        let mut tx = pool.begin().await?;

        // Status guard repeated in SQL: two concurrent answers race on the
        // row, only one flips it.
        let updated = sqlx::query_as::<_, Invitation>(
            "UPDATE invitations SET status = $2, responded_at = NOW()
             WHERE id = $1 AND status = $3
             RETURNING *",
        )
        .bind(invitation_id)
        .bind(next.to_string())
        .bind(InvitationStatus::Invited.to_string())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ApiError::Conflict("Invitation has already been answered".into()))?;

        if accept {
            sqlx::query(
                "INSERT INTO user_buildings (user_email, building_id, role)
                 VALUES ($1, $2, $3)
                 ON CONFLICT (user_email, building_id) DO NOTHING",
            )
            .bind(acting_email)
            .bind(&invitation.building_id)
            .bind(Role::Children.to_string())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(updated)
    }
}
