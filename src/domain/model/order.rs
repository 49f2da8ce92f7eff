use chrono::{DateTime, Utc};

use crate::domain::error::DomainError;
use crate::domain::model::{Caller, OrderId, OrderItemId, ProductId, Quantity, UserId};

/// チェックアウト操作の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutOutcome {
    /// 今回の呼び出しでチェックアウトした
    CheckedOut,
    /// 既にチェックアウト済み（状態は変更していない）
    AlreadyCheckedOut,
}

/// Order集約
/// 注文明細をまとめ、チェックアウト状態（open → checked_out の一方向）を管理する
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    id: OrderId,
    user_id: UserId,
    checked_out: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Order {
    /// 新しい注文を作成
    /// 初期状態はopen
    pub fn new(id: OrderId, user_id: UserId) -> Self {
        let now = Utc::now();
        Self {
            id,
            user_id,
            checked_out: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// データベースから取得したデータで注文を再構築
    pub fn reconstruct(
        id: OrderId,
        user_id: UserId,
        checked_out: bool,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            checked_out,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    /// 注文の所有者
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn is_checked_out(&self) -> bool {
        self.checked_out
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// 呼び出し元がこの注文を参照・操作できるか（所有者または管理者）
    pub fn is_accessible_by(&self, caller: &Caller) -> bool {
        caller.is_admin() || caller.user_id() == self.user_id
    }

    /// 注文をチェックアウトする
    /// 既にチェックアウト済みの場合は何も変更せずにその旨を返す
    pub fn check_out(&mut self) -> CheckoutOutcome {
        if self.checked_out {
            return CheckoutOutcome::AlreadyCheckedOut;
        }
        self.checked_out = true;
        self.updated_at = Utc::now();
        CheckoutOutcome::CheckedOut
    }

    /// 明細の変更が可能か確認する
    /// チェックアウト済みの注文の明細は凍結される
    pub fn ensure_open(&self) -> Result<(), DomainError> {
        if self.checked_out {
            return Err(DomainError::OrderCheckedOut(self.id));
        }
        Ok(())
    }
}

/// 注文明細
/// 注文に対する商品の `quantity` 個分の予約を表す
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItem {
    id: OrderItemId,
    order_id: OrderId,
    product_id: ProductId,
    quantity: Quantity,
}

impl OrderItem {
    pub fn new(
        id: OrderItemId,
        order_id: OrderId,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Self {
        Self {
            id,
            order_id,
            product_id,
            quantity,
        }
    }

    pub fn id(&self) -> OrderItemId {
        self.id
    }

    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    /// 予約対象の商品と数量を差し替える
    pub fn change(&mut self, product_id: ProductId, quantity: Quantity) {
        self.product_id = product_id;
        self.quantity = quantity;
    }
}
