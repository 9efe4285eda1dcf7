//! Database queries for final document deliveries.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::entity::delivery::{self, ActiveModel, Entity as DeliveryEntity};
use crate::error::{AppError, AppResult};
use crate::models::Delivery;

use super::DbPool;

/// Delivery rows always carry this status; the column exists for reporting.
const DELIVERED: &str = "COMPLETED";

impl DbPool {
    /// Insert a delivery row for a published final document.
    pub async fn insert_delivery(
        &self,
        request_id: Uuid,
        pdf_url: &str,
        file_name: &str,
        admin_id: Uuid,
        feri_ref: Option<&str>,
    ) -> AppResult<Delivery> {
        let model = ActiveModel {
            id: Set(Uuid::now_v7()),
            request_id: Set(request_id),
            pdf_url: Set(pdf_url.to_string()),
            file_name: Set(file_name.to_string()),
            admin_id: Set(admin_id),
            feri_ref: Set(feri_ref.map(String::from)),
            status: Set(DELIVERED.to_string()),
            delivered_at: Set(Utc::now()),
        };

        let result = model
            .insert(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert delivery: {}", e)))?;

        Ok(model_to_delivery(result))
    }

    /// List a request's deliveries, newest first.
    pub async fn list_deliveries_for_request(&self, request_id: Uuid) -> AppResult<Vec<Delivery>> {
        let rows = DeliveryEntity::find()
            .filter(delivery::Column::RequestId.eq(request_id))
            .order_by_desc(delivery::Column::DeliveredAt)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list deliveries: {}", e)))?;

        Ok(rows.into_iter().map(model_to_delivery).collect())
    }
}

pub(crate) fn model_to_delivery(m: delivery::Model) -> Delivery {
    Delivery {
        id: m.id,
        request_id: m.request_id,
        pdf_url: m.pdf_url,
        file_name: m.file_name,
        admin_id: m.admin_id,
        feri_ref: m.feri_ref,
        status: m.status,
        delivered_at: m.delivered_at,
    }
}
