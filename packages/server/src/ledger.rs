//! Persistence of deployment results onto project rows.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DbErr, EntityTrait, Set};
use tracing::error;
use uuid::Uuid;

use crate::entity::project;
use crate::error::AppError;

/// Token metadata used when a deployment has no existing project row.
#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
    pub ticker: String,
    pub initial_supply: String,
    pub description: Option<String>,
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DeploymentRecord {
    pub user_id: Uuid,
    pub project_id: Option<i32>,
    pub chain_id: u64,
    pub contract_address: String,
    pub tx_hash: String,
    pub owner_address: String,
    /// Required when `project_id` is absent or points at a missing row.
    pub metadata: Option<NewProject>,
}

impl DeploymentRecord {
    /// Whether this record describes the deployment already stored on `project`.
    pub fn is_replay_of(&self, project: &project::Model) -> bool {
        project.chain_id == self.chain_id as i64
            && project
                .contract_address
                .as_deref()
                .is_some_and(|a| a.eq_ignore_ascii_case(&self.contract_address))
            && project
                .tx_hash
                .as_deref()
                .is_some_and(|h| h.eq_ignore_ascii_case(&self.tx_hash))
            && project
                .owner_address
                .as_deref()
                .is_some_and(|o| o.eq_ignore_ascii_case(&self.owner_address))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("project {0} belongs to another user")]
    Forbidden(i32),
    #[error("project metadata is required to record a new deployment")]
    MissingMetadata,
    #[error("project {0} is already deployed")]
    AlreadyDeployed(i32),
    #[error("project {0} has not been paid for")]
    NotPaid(i32),
    #[error(transparent)]
    Db(#[from] DbErr),
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Forbidden(_) => AppError::PermissionDenied,
            LedgerError::MissingMetadata => AppError::Validation(err.to_string()),
            LedgerError::AlreadyDeployed(_) => AppError::Conflict(err.to_string()),
            LedgerError::NotPaid(_) => AppError::ProjectNotPaid,
            LedgerError::Db(e) => e.into(),
        }
    }
}

pub struct LedgerWriter<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> LedgerWriter<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// Write the deployment onto its project, inserting the project when it
    /// does not exist yet.
    ///
    /// A deployed project is never rewritten: recording the same deployment
    /// again returns the stored row, any other deployment is a conflict. An
    /// existing draft must be paid before a deployment can be attached.
    pub async fn record(&self, rec: &DeploymentRecord) -> Result<project::Model, LedgerError> {
        let now = Utc::now();

        let existing = match rec.project_id {
            Some(id) => project::Entity::find_by_id(id).one(self.conn).await?,
            None => None,
        };

        if let Some(existing) = existing {
            if existing.user_id != rec.user_id {
                return Err(LedgerError::Forbidden(existing.id));
            }
            if existing.is_deployed() {
                return if rec.is_replay_of(&existing) {
                    Ok(existing)
                } else {
                    Err(LedgerError::AlreadyDeployed(existing.id))
                };
            }
            if !existing.is_paid {
                return Err(LedgerError::NotPaid(existing.id));
            }
            let mut active: project::ActiveModel = existing.into();
            active.chain_id = Set(rec.chain_id as i64);
            active.contract_address = Set(Some(rec.contract_address.clone()));
            active.tx_hash = Set(Some(rec.tx_hash.clone()));
            active.owner_address = Set(Some(rec.owner_address.clone()));
            active.deployed_at = Set(Some(now));
            active.updated_at = Set(now);
            return Ok(active.update(self.conn).await?);
        }

        let meta = rec.metadata.as_ref().ok_or(LedgerError::MissingMetadata)?;
        let model = project::ActiveModel {
            user_id: Set(rec.user_id),
            name: Set(meta.name.clone()),
            ticker: Set(meta.ticker.clone()),
            description: Set(meta.description.clone()),
            logo_url: Set(meta.logo_url.clone()),
            chain_id: Set(rec.chain_id as i64),
            initial_supply: Set(meta.initial_supply.clone()),
            owner_address: Set(Some(rec.owner_address.clone())),
            contract_address: Set(Some(rec.contract_address.clone())),
            tx_hash: Set(Some(rec.tx_hash.clone())),
            deployed_at: Set(Some(now)),
            is_paid: Set(true),
            is_renounced: Set(false),
            is_locked: Set(false),
            website: Set(None),
            twitter: Set(None),
            telegram: Set(None),
            discord: Set(None),
            market_cap: Set(None),
            volume_24h: Set(None),
            liquidity_usd: Set(None),
            price_usd: Set(None),
            market_updated_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        Ok(model.insert(self.conn).await?)
    }

    /// Record a deployment that is already on chain. A failure here cannot be
    /// undone, so it is logged with everything needed to reconcile by hand and
    /// `None` is returned instead of an error.
    pub async fn record_submitted(&self, rec: &DeploymentRecord) -> Option<project::Model> {
        match self.record(rec).await {
            Ok(model) => Some(model),
            Err(e) => {
                error!(
                    critical = true,
                    user_id = %rec.user_id,
                    project_id = ?rec.project_id,
                    chain_id = rec.chain_id,
                    contract_address = %rec.contract_address,
                    tx_hash = %rec.tx_hash,
                    owner_address = %rec.owner_address,
                    error = %e,
                    "Deployment submitted on chain but not persisted; manual reconciliation required"
                );
                None
            }
        }
    }
}
