//! Database queries for shipment requests.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::entity::request::{self, ActiveModel, Entity as Request};
use crate::error::{AppError, AppResult};
use crate::models::{CreateRequestRequest, ListRequestsQuery, RequestStatus, ShipmentRequest};

use super::DbPool;

impl DbPool {
    /// Insert a new request in `CREATED` status.
    pub async fn insert_request(
        &self,
        id: Uuid,
        user_id: Uuid,
        input: &CreateRequestRequest,
    ) -> AppResult<ShipmentRequest> {
        let now = Utc::now();

        let model = ActiveModel {
            id: Set(id),
            user_id: Set(user_id),
            request_type: Set(input.request_type.as_str().to_string()),
            status: Set(RequestStatus::Created.as_str().to_string()),
            bl_number: Set(input.bl_number.clone()),
            extracted_bl: Set(None),
            manual_bl: Set(None),
            cargo_route: Set(input.cargo_route.clone()),
            customer_ref: Set(input.customer_ref.clone()),
            origin: Set(input.origin.clone()),
            destination: Set(input.destination.clone()),
            cargo_description: Set(input.cargo_description.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let result = model
            .insert(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert request: {}", e)))?;

        model_to_request(result)
    }

    /// Get a request by ID.
    pub async fn get_request_by_id(&self, id: Uuid) -> AppResult<Option<ShipmentRequest>> {
        let result = Request::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get request: {}", e)))?;

        result.map(model_to_request).transpose()
    }

    /// Persist a new status for a request.
    pub async fn update_request_status(
        &self,
        id: Uuid,
        status: RequestStatus,
    ) -> AppResult<ShipmentRequest> {
        let found = Request::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get request: {}", e)))?
            .ok_or_else(|| AppError::NotFound(format!("Request {}", id)))?;

        let mut active: ActiveModel = found.into();
        active.status = Set(status.as_str().to_string());
        active.updated_at = Set(Utc::now());

        let result = active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to update request status: {}", e)))?;

        model_to_request(result)
    }

    /// Persist a generated manual BL reference into both `manual_bl` and
    /// `bl_number` in one update.
    pub async fn set_manual_bl(&self, id: Uuid, reference: &str) -> AppResult<ShipmentRequest> {
        let found = Request::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get request: {}", e)))?
            .ok_or_else(|| AppError::NotFound(format!("Request {}", id)))?;

        let mut active: ActiveModel = found.into();
        active.manual_bl = Set(Some(reference.to_string()));
        active.bl_number = Set(Some(reference.to_string()));
        active.updated_at = Set(Utc::now());

        let result = active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to set manual BL: {}", e)))?;

        model_to_request(result)
    }

    /// Collect every stored BL reference starting with `prefix`, across the
    /// generated and manually entered columns.
    pub async fn bl_references_with_prefix(&self, prefix: &str) -> AppResult<Vec<String>> {
        let rows = Request::find()
            .filter(
                Condition::any()
                    .add(request::Column::ManualBl.starts_with(prefix))
                    .add(request::Column::BlNumber.starts_with(prefix)),
            )
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to scan BL references: {}", e)))?;

        let mut refs = Vec::new();
        for row in rows {
            for value in [row.manual_bl, row.bl_number].into_iter().flatten() {
                if value.starts_with(prefix) && !refs.contains(&value) {
                    refs.push(value);
                }
            }
        }

        Ok(refs)
    }

    /// List requests with optional status filter, newest first.
    ///
    /// `owner` restricts results to one client's requests (admin listings
    /// pass `None`).
    pub async fn list_requests(
        &self,
        query: &ListRequestsQuery,
        owner: Option<Uuid>,
    ) -> AppResult<(Vec<ShipmentRequest>, u64)> {
        let mut select = Request::find();

        if let Some(status) = query.status {
            select = select.filter(request::Column::Status.eq(status.as_str()));
        }

        if let Some(user_id) = owner {
            select = select.filter(request::Column::UserId.eq(user_id));
        }

        // Count total before pagination
        let total = select
            .clone()
            .count(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to count requests: {}", e)))?;

        let limit = query.limit.clamp(1, 100) as u64;
        let offset = query.offset.max(0) as u64;

        let rows = select
            .order_by_desc(request::Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list requests: {}", e)))?;

        let requests = rows
            .into_iter()
            .map(model_to_request)
            .collect::<AppResult<Vec<_>>>()?;

        Ok((requests, total))
    }
}

pub(crate) fn model_to_request(m: request::Model) -> AppResult<ShipmentRequest> {
    let status = RequestStatus::parse(&m.status)
        .ok_or_else(|| AppError::Database(format!("Unknown request status '{}'", m.status)))?;
    let request_type = crate::models::RequestType::parse(&m.request_type).ok_or_else(|| {
        AppError::Database(format!("Unknown request type '{}'", m.request_type))
    })?;

    Ok(ShipmentRequest {
        id: m.id,
        user_id: m.user_id,
        request_type,
        status,
        bl_number: m.bl_number,
        extracted_bl: m.extracted_bl,
        manual_bl: m.manual_bl,
        cargo_route: m.cargo_route,
        customer_ref: m.customer_ref,
        origin: m.origin,
        destination: m.destination,
        cargo_description: m.cargo_description,
        created_at: m.created_at,
        updated_at: m.updated_at,
    })
}
