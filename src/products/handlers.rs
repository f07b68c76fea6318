use axum::{
    extract::{rejection::JsonRejection, rejection::PathRejection, Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::dto::{validate_id, ProductRequest, ProductResponse};
use crate::{
    error::{ApiError, FieldError},
    state::AppState,
};

pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
}

#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let products = state
        .store
        .list()
        .await
        .map_err(|e| ApiError::internal("An error occurred while retrieving products", e))?;

    info!(count = products.len(), "listed products");
    Ok(Json(products.into_iter().map(ProductResponse::from).collect()))
}

#[instrument(skip(state, id))]
pub async fn get_product(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<ProductResponse>, ApiError> {
    let id = product_id(id)?;

    match state.store.get_by_id(id).await {
        Ok(Some(product)) => {
            info!(product_id = id, "retrieved product");
            Ok(Json(product.into()))
        }
        Ok(None) => {
            warn!(product_id = id, "product not found");
            Err(ApiError::NotFound(id))
        }
        Err(e) => Err(ApiError::internal(
            "An error occurred while retrieving the product",
            e,
        )),
    }
}

#[instrument(skip(state, payload))]
pub async fn create_product(
    State(state): State<AppState>,
    payload: Result<Json<ProductRequest>, JsonRejection>,
) -> Result<(StatusCode, HeaderMap, Json<ProductResponse>), ApiError> {
    let Json(payload) = json_body(payload)?;

    if let Err(errors) = payload.validate() {
        warn!(name = %payload.name, "validation failed for product creation");
        return Err(ApiError::Validation(errors));
    }

    let created = state
        .store
        .create(&payload.into_new_product())
        .await
        .map_err(|e| ApiError::internal("An error occurred while creating the product", e))?;

    let mut headers = HeaderMap::new();
    let location = HeaderValue::from_str(&format!("/products/{}", created.id))
        .map_err(|e| ApiError::internal("An error occurred while creating the product", e.into()))?;
    headers.insert(header::LOCATION, location);

    info!(product_id = created.id, "created product");
    Ok((StatusCode::CREATED, headers, Json(created.into())))
}

#[instrument(skip(state, id, payload))]
pub async fn update_product(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
    payload: Result<Json<ProductRequest>, JsonRejection>,
) -> Result<Json<ProductResponse>, ApiError> {
    let id = path_id(id)?;
    let Json(payload) = json_body(payload)?;

    if let Err(errors) = payload.validate() {
        warn!(product_id = id, "validation failed for product update");
        return Err(ApiError::Validation(errors));
    }

    let exists = state
        .store
        .exists(id)
        .await
        .map_err(|e| ApiError::internal("An error occurred while updating the product", e))?;
    if !exists {
        warn!(product_id = id, "product not found for update");
        return Err(ApiError::NotFound(id));
    }

    match state.store.update(id, &payload.into_new_product()).await {
        Ok(Some(updated)) => {
            info!(product_id = id, "updated product");
            Ok(Json(updated.into()))
        }
        Ok(None) => {
            warn!(product_id = id, "product vanished before update");
            Err(ApiError::NotFound(id))
        }
        Err(e) => Err(ApiError::internal(
            "An error occurred while updating the product",
            e,
        )),
    }
}

#[instrument(skip(state, id))]
pub async fn delete_product(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let id = product_id(id)?;

    let exists = state
        .store
        .exists(id)
        .await
        .map_err(|e| ApiError::internal("An error occurred while deleting the product", e))?;
    if !exists {
        warn!(product_id = id, "product not found for deletion");
        return Err(ApiError::NotFound(id));
    }

    let deleted = state
        .store
        .delete(id)
        .await
        .map_err(|e| ApiError::internal("An error occurred while deleting the product", e))?;
    if !deleted {
        warn!(product_id = id, "product vanished before delete");
        return Err(ApiError::NotFound(id));
    }

    info!(product_id = id, "deleted product");
    Ok(StatusCode::NO_CONTENT)
}

fn path_id(id: Result<Path<i32>, PathRejection>) -> Result<i32, ApiError> {
    let Path(id) = id.map_err(|e| {
        warn!(error = %e, "rejected product id");
        ApiError::Validation(vec![FieldError::general(e.body_text())])
    })?;
    Ok(id)
}

fn product_id(id: Result<Path<i32>, PathRejection>) -> Result<i32, ApiError> {
    let id = path_id(id)?;
    validate_id(id).map_err(ApiError::Validation)?;
    Ok(id)
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<Json<T>, ApiError> {
    payload.map_err(|e| {
        warn!(error = %e, "rejected request body");
        ApiError::Validation(vec![FieldError::general(e.body_text())])
    })
}
