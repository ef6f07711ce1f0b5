// src/services/lead_service.rs

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::LeadRepository,
    models::leads::{CreateLeadPayload, Lead, LeadStatus, UpdateLeadPayload},
};

#[derive(Clone)]
pub struct LeadService {
    repo: LeadRepository,
}

impl LeadService {
    pub fn new(repo: LeadRepository) -> Self {
        Self { repo }
    }

    pub async fn capture(&self, payload: &CreateLeadPayload) -> Result<Lead, AppError> {
        let lead = self.repo.create_lead(payload).await?;
        tracing::info!(lead_id = %lead.id, source = ?lead.source, "📨 Novo lead capturado");
        Ok(lead)
    }

    pub async fn list(&self, status: Option<LeadStatus>) -> Result<Vec<Lead>, AppError> {
        self.repo.list_leads(status).await
    }

    pub async fn update(&self, id: Uuid, payload: &UpdateLeadPayload) -> Result<Lead, AppError> {
        self.repo
            .update_lead(id, payload.status, payload.notes.as_deref())
            .await?
            .ok_or(AppError::LeadNotFound)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        match self.repo.delete_lead(id).await? {
            0 => Err(AppError::LeadNotFound),
            _ => Ok(()),
        }
    }
}
