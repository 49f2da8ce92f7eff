use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::adapter::driver::caller::AuthenticatedCaller;
use crate::adapter::driver::json_body::JsonBody;
use crate::adapter::driver::request_dto::{
    CategoryRequest, CreateOrderItemRequest, CreateProductRequest, RestockRequest,
    UpdateOrderItemRequest, UpdateProductRequest,
};
use crate::adapter::driver::response_dto::{
    CategoryResponse, CheckoutResponse, OrderDetailResponse, OrderItemResponse, OrderResponse,
    ProductResponse,
};
use crate::application::service::{
    CatalogApplicationService, CatalogQueryService, OrderApplicationService,
    OrderItemApplicationService, OrderQueryService,
};
use crate::application::ApplicationError;
use crate::domain::error::DomainError;
use crate::domain::model::{CategoryId, CheckoutOutcome, OrderId, OrderItemId, ProductId};
use crate::domain::port::{CatalogRepository, OrderRepository, RepositoryError, UnitOfWorkFactory};

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
}

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

fn api_error(status: StatusCode, error: impl Into<String>, code: &str) -> (StatusCode, Json<ApiError>) {
    (
        status,
        Json(ApiError {
            error: error.into(),
            code: code.to_string(),
        }),
    )
}

// アプリケーションサービスを含む状態
#[derive(Clone)]
pub struct AppState {
    pub order_item_service: Arc<OrderItemApplicationService>,
    pub order_service: Arc<OrderApplicationService>,
    pub catalog_service: Arc<CatalogApplicationService>,
    pub catalog_query_service: Arc<CatalogQueryService>,
    pub order_query_service: Arc<OrderQueryService>,
}

impl AppState {
    /// ポートの実装からアプリケーションサービス一式を組み立てる
    pub fn new(
        unit_of_work_factory: Arc<dyn UnitOfWorkFactory>,
        catalog_repository: Arc<dyn CatalogRepository>,
        order_repository: Arc<dyn OrderRepository>,
    ) -> Self {
        Self {
            order_item_service: Arc::new(OrderItemApplicationService::new(
                unit_of_work_factory.clone(),
            )),
            order_service: Arc::new(OrderApplicationService::new(
                order_repository.clone(),
                unit_of_work_factory.clone(),
            )),
            catalog_service: Arc::new(CatalogApplicationService::new(
                catalog_repository.clone(),
                unit_of_work_factory,
            )),
            catalog_query_service: Arc::new(CatalogQueryService::new(catalog_repository)),
            order_query_service: Arc::new(OrderQueryService::new(order_repository)),
        }
    }
}

// REST APIルーターを作成
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/categories", get(list_categories).post(create_category))
        .route(
            "/categories/:category_id",
            put(rename_category).delete(delete_category),
        )
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/:product_id",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/products/:product_id/stock", put(restock_product))
        .route("/orders", get(list_orders).post(create_order))
        .route("/orders/:order_id", get(get_order).delete(delete_order))
        .route("/orders/:order_id/checkout", post(check_out_order))
        .route("/order-items", get(list_order_items).post(create_order_item))
        .route(
            "/order-items/:item_id",
            get(get_order_item)
                .put(update_order_item)
                .delete(delete_order_item),
        )
}

// ヘルスチェックエンドポイント
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "shop-inventory",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

// カテゴリ一覧取得エンドポイント
async fn list_categories(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<CategoryResponse>>> {
    let categories = state
        .catalog_query_service
        .list_categories()
        .await
        .map_err(map_application_error)?;

    Ok(Json(
        categories.iter().map(CategoryResponse::from_category).collect(),
    ))
}

async fn create_category(
    State(state): State<AppState>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    JsonBody(request): JsonBody<CategoryRequest>,
) -> ApiResult<(StatusCode, Json<CategoryResponse>)> {
    let category = state
        .catalog_service
        .create_category(&caller, request.name)
        .await
        .map_err(map_application_error)?;

    Ok((
        StatusCode::CREATED,
        Json(CategoryResponse::from_category(&category)),
    ))
}

async fn rename_category(
    State(state): State<AppState>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    Path(category_id): Path<Uuid>,
    JsonBody(request): JsonBody<CategoryRequest>,
) -> ApiResult<Json<CategoryResponse>> {
    let category = state
        .catalog_service
        .rename_category(&caller, CategoryId::from_uuid(category_id), request.name)
        .await
        .map_err(map_application_error)?;

    Ok(Json(CategoryResponse::from_category(&category)))
}

async fn delete_category(
    State(state): State<AppState>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    Path(category_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .catalog_service
        .delete_category(&caller, CategoryId::from_uuid(category_id))
        .await
        .map_err(map_application_error)?;

    Ok(StatusCode::NO_CONTENT)
}

// 商品一覧取得エンドポイント
// 管理者以外には販売可能な商品のみを返す
async fn list_products(
    State(state): State<AppState>,
    caller: Option<AuthenticatedCaller>,
) -> ApiResult<Json<Vec<ProductResponse>>> {
    let caller = caller.map(|AuthenticatedCaller(caller)| caller);
    let products = state
        .catalog_query_service
        .list_products(caller.as_ref())
        .await
        .map_err(map_application_error)?;

    Ok(Json(products.iter().map(ProductResponse::from_product).collect()))
}

// 商品詳細取得エンドポイント
async fn get_product(
    State(state): State<AppState>,
    caller: Option<AuthenticatedCaller>,
    Path(product_id): Path<Uuid>,
) -> ApiResult<Json<ProductResponse>> {
    let caller = caller.map(|AuthenticatedCaller(caller)| caller);
    let product = state
        .catalog_query_service
        .get_product(caller.as_ref(), ProductId::from_uuid(product_id))
        .await
        .map_err(map_application_error)?
        .ok_or_else(|| {
            api_error(
                StatusCode::NOT_FOUND,
                "指定された商品が見つかりません",
                "PRODUCT_NOT_FOUND",
            )
        })?;

    Ok(Json(ProductResponse::from_product(&product)))
}

async fn create_product(
    State(state): State<AppState>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    JsonBody(request): JsonBody<CreateProductRequest>,
) -> ApiResult<(StatusCode, Json<ProductResponse>)> {
    let product = state
        .catalog_service
        .create_product(
            &caller,
            CategoryId::from_uuid(request.category_id),
            request.name,
            request.description,
            request.price,
            request.stock,
        )
        .await
        .map_err(map_application_error)?;

    Ok((
        StatusCode::CREATED,
        Json(ProductResponse::from_product(&product)),
    ))
}

// 商品情報更新エンドポイント（管理者のみ、在庫数は変更しない）
async fn update_product(
    State(state): State<AppState>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    Path(product_id): Path<Uuid>,
    JsonBody(request): JsonBody<UpdateProductRequest>,
) -> ApiResult<Json<ProductResponse>> {
    let product = state
        .catalog_service
        .update_product(
            &caller,
            ProductId::from_uuid(product_id),
            CategoryId::from_uuid(request.category_id),
            request.name,
            request.description,
            request.price,
        )
        .await
        .map_err(map_application_error)?;

    Ok(Json(ProductResponse::from_product(&product)))
}

async fn delete_product(
    State(state): State<AppState>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    Path(product_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .catalog_service
        .delete_product(&caller, ProductId::from_uuid(product_id))
        .await
        .map_err(map_application_error)?;

    Ok(StatusCode::NO_CONTENT)
}

// 在庫補充エンドポイント（管理者のみ）
async fn restock_product(
    State(state): State<AppState>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    Path(product_id): Path<Uuid>,
    JsonBody(request): JsonBody<RestockRequest>,
) -> ApiResult<Json<ProductResponse>> {
    let product = state
        .catalog_service
        .restock(&caller, ProductId::from_uuid(product_id), request.stock)
        .await
        .map_err(map_application_error)?;

    Ok(Json(ProductResponse::from_product(&product)))
}

// 注文作成エンドポイント
async fn create_order(
    State(state): State<AppState>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
) -> ApiResult<(StatusCode, Json<OrderResponse>)> {
    let order = state
        .order_service
        .create_order(&caller)
        .await
        .map_err(map_application_error)?;

    Ok((StatusCode::CREATED, Json(OrderResponse::from_order(&order))))
}

// 注文一覧取得エンドポイント
async fn list_orders(
    State(state): State<AppState>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
) -> ApiResult<Json<Vec<OrderResponse>>> {
    let orders = state
        .order_query_service
        .list_orders(&caller)
        .await
        .map_err(map_application_error)?;

    Ok(Json(orders.iter().map(OrderResponse::from_order).collect()))
}

// 注文詳細取得エンドポイント
async fn get_order(
    State(state): State<AppState>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    Path(order_id): Path<Uuid>,
) -> ApiResult<Json<OrderDetailResponse>> {
    let details = state
        .order_query_service
        .get_order(&caller, OrderId::from_uuid(order_id))
        .await
        .map_err(map_application_error)?
        .ok_or_else(|| {
            api_error(
                StatusCode::NOT_FOUND,
                "指定された注文が見つかりません",
                "ORDER_NOT_FOUND",
            )
        })?;

    Ok(Json(OrderDetailResponse::from_details(&details)))
}

async fn delete_order(
    State(state): State<AppState>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    Path(order_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .order_service
        .delete_order(&caller, OrderId::from_uuid(order_id))
        .await
        .map_err(map_application_error)?;

    Ok(StatusCode::NO_CONTENT)
}

// チェックアウトエンドポイント
// 既にチェックアウト済みの場合は400を返す
async fn check_out_order(
    State(state): State<AppState>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    Path(order_id): Path<Uuid>,
) -> ApiResult<Json<CheckoutResponse>> {
    let order_id = OrderId::from_uuid(order_id);
    let outcome = state
        .order_service
        .check_out(&caller, order_id)
        .await
        .map_err(map_application_error)?;

    match outcome {
        CheckoutOutcome::CheckedOut => Ok(Json(CheckoutResponse {
            order_id: order_id.to_string(),
            checked_out: true,
        })),
        CheckoutOutcome::AlreadyCheckedOut => Err(api_error(
            StatusCode::BAD_REQUEST,
            "Order is already checked out.",
            "ALREADY_CHECKED_OUT",
        )),
    }
}

// 注文明細一覧取得エンドポイント
// 自分の注文の明細のみ（管理者はすべて）
async fn list_order_items(
    State(state): State<AppState>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
) -> ApiResult<Json<Vec<OrderItemResponse>>> {
    let items = state
        .order_query_service
        .list_order_items(&caller)
        .await
        .map_err(map_application_error)?;

    Ok(Json(items.iter().map(OrderItemResponse::from_order_item).collect()))
}

async fn get_order_item(
    State(state): State<AppState>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    Path(item_id): Path<Uuid>,
) -> ApiResult<Json<OrderItemResponse>> {
    let item = state
        .order_query_service
        .get_order_item(&caller, OrderItemId::from_uuid(item_id))
        .await
        .map_err(map_application_error)?
        .ok_or_else(|| {
            api_error(
                StatusCode::NOT_FOUND,
                "指定された注文明細が見つかりません",
                "ORDER_ITEM_NOT_FOUND",
            )
        })?;

    Ok(Json(OrderItemResponse::from_order_item(&item)))
}

// 注文明細作成エンドポイント（在庫を予約する）
async fn create_order_item(
    State(state): State<AppState>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    JsonBody(request): JsonBody<CreateOrderItemRequest>,
) -> ApiResult<(StatusCode, Json<OrderItemResponse>)> {
    let item = state
        .order_item_service
        .create_order_item(
            &caller,
            OrderId::from_uuid(request.order_id),
            ProductId::from_uuid(request.product_id),
            request.quantity,
        )
        .await
        .map_err(map_application_error)?;

    Ok((
        StatusCode::CREATED,
        Json(OrderItemResponse::from_order_item(&item)),
    ))
}

async fn update_order_item(
    State(state): State<AppState>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    Path(item_id): Path<Uuid>,
    JsonBody(request): JsonBody<UpdateOrderItemRequest>,
) -> ApiResult<Json<OrderItemResponse>> {
    let item = state
        .order_item_service
        .update_order_item(
            &caller,
            OrderItemId::from_uuid(item_id),
            ProductId::from_uuid(request.product_id),
            request.quantity,
        )
        .await
        .map_err(map_application_error)?;

    Ok(Json(OrderItemResponse::from_order_item(&item)))
}

async fn delete_order_item(
    State(state): State<AppState>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    Path(item_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .order_item_service
        .delete_order_item(&caller, OrderItemId::from_uuid(item_id))
        .await
        .map_err(map_application_error)?;

    Ok(StatusCode::NO_CONTENT)
}

// アプリケーションエラーをHTTPエラーにマッピング
fn map_application_error(err: ApplicationError) -> (StatusCode, Json<ApiError>) {
    match err {
        ApplicationError::Domain(domain_err) => map_domain_error(domain_err),
        ApplicationError::Repository(RepositoryError::StillReferenced(msg)) => {
            api_error(StatusCode::CONFLICT, msg, "STILL_REFERENCED")
        }
        ApplicationError::Repository(repo_err) => {
            tracing::error!(error = %repo_err, "repository operation failed");
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                repo_err.to_string(),
                "REPOSITORY_ERROR",
            )
        }
        ApplicationError::NotFound(msg) => api_error(StatusCode::NOT_FOUND, msg, "NOT_FOUND"),
        ApplicationError::Forbidden(msg) => api_error(StatusCode::FORBIDDEN, msg, "FORBIDDEN"),
    }
}

// ドメインエラーを適切なHTTPステータスコードとエラーコードにマッピング
fn map_domain_error(domain_err: DomainError) -> (StatusCode, Json<ApiError>) {
    let message = domain_err.to_string();
    match domain_err {
        // 既存クライアントとの互換のため404を返す
        DomainError::OutOfStock { .. } => {
            api_error(StatusCode::NOT_FOUND, message, "OUT_OF_STOCK")
        }
        DomainError::InvalidQuantity(_) => {
            api_error(StatusCode::BAD_REQUEST, message, "INVALID_QUANTITY")
        }
        DomainError::InvalidValue(_) => {
            api_error(StatusCode::BAD_REQUEST, message, "INVALID_VALUE")
        }
        DomainError::OrderCheckedOut(_) => {
            api_error(StatusCode::BAD_REQUEST, message, "ORDER_CHECKED_OUT")
        }
    }
}
