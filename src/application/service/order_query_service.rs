use crate::application::ApplicationError;
use crate::domain::model::{Caller, Order, OrderId, OrderItem, OrderItemId};
use crate::domain::port::OrderRepository;
use std::sync::Arc;

/// 注文とその明細
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDetails {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// 注文クエリサービス
/// 読み取り専用の注文操作を提供する
pub struct OrderQueryService {
    order_repository: Arc<dyn OrderRepository>,
}

impl OrderQueryService {
    /// 新しい注文クエリサービスを作成
    ///
    /// # Arguments
    /// * `order_repository` - 注文リポジトリ
    pub fn new(order_repository: Arc<dyn OrderRepository>) -> Self {
        Self { order_repository }
    }

    /// 注文IDで注文と明細を取得
    ///
    /// # Arguments
    /// * `caller` - 呼び出し元
    /// * `id` - 注文ID
    ///
    /// # Returns
    /// * `Ok(Some(OrderDetails))` - 注文が見つかった
    /// * `Ok(None)` - 注文が見つからなかった、または呼び出し元の注文ではない
    /// * `Err(ApplicationError)` - 取得失敗
    pub async fn get_order(
        &self,
        caller: &Caller,
        id: OrderId,
    ) -> Result<Option<OrderDetails>, ApplicationError> {
        let order = match self.order_repository.find_by_id(id).await? {
            Some(order) if order.is_accessible_by(caller) => order,
            _ => return Ok(None),
        };
        let items = self.order_repository.find_items(id).await?;
        Ok(Some(OrderDetails { order, items }))
    }

    /// 呼び出し元の注文を作成日時の昇順で取得
    /// 管理者はすべての注文を取得する
    pub async fn list_orders(&self, caller: &Caller) -> Result<Vec<Order>, ApplicationError> {
        let orders = if caller.is_admin() {
            self.order_repository.find_all().await?
        } else {
            self.order_repository.find_by_user(caller.user_id()).await?
        };
        Ok(orders)
    }

    /// 注文明細を取得
    /// 呼び出し元が参照できない注文の明細は `None` を返す
    pub async fn get_order_item(
        &self,
        caller: &Caller,
        item_id: OrderItemId,
    ) -> Result<Option<OrderItem>, ApplicationError> {
        let Some(item) = self.order_repository.find_item(item_id).await? else {
            return Ok(None);
        };
        let visible = self
            .order_repository
            .find_by_id(item.order_id())
            .await?
            .is_some_and(|order| order.is_accessible_by(caller));
        Ok(visible.then_some(item))
    }

    /// 呼び出し元の注文に属する明細をID順で取得
    /// 管理者はすべての明細を取得する
    pub async fn list_order_items(
        &self,
        caller: &Caller,
    ) -> Result<Vec<OrderItem>, ApplicationError> {
        let items = if caller.is_admin() {
            self.order_repository.find_all_items().await?
        } else {
            self.order_repository
                .find_items_by_user(caller.user_id())
                .await?
        };
        Ok(items)
    }
}
