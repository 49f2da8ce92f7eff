// ドメインサービス
// 在庫数を変更する唯一の経路（在庫台帳）

use crate::domain::error::DomainError;
use crate::domain::model::{Product, ProductId, Quantity};
use crate::domain::port::{RepositoryError, UnitOfWork};
use thiserror::Error;

/// 在庫台帳のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// ビジネスルール違反（在庫切れなど）
    #[error(transparent)]
    Domain(#[from] DomainError),
    /// 対象の商品が存在しない
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),
    /// 分類されないストレージ障害（そのまま伝播する）
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// 在庫台帳
///
/// 注文明細の作成・更新・削除に応じて商品の在庫数を変更する。
/// 呼び出し元が開始した作業単位の中でのみ動作し、コミットは呼び出し元が行う。
pub struct InventoryLedger<'a> {
    uow: &'a mut dyn UnitOfWork,
}

impl<'a> InventoryLedger<'a> {
    /// 作業単位を借用して台帳を作成
    pub fn new(uow: &'a mut dyn UnitOfWork) -> Self {
        Self { uow }
    }

    /// 在庫を予約する
    ///
    /// 商品行をロックして読み直し、販売不可（在庫0）なら差し引く前に失敗する。
    /// 差し引きで在庫が負になる場合はストレージの非負制約が書き込みを拒否し、
    /// それを `OutOfStock` に変換する。
    ///
    /// # Returns
    /// * `Ok(Product)` - 予約後の商品
    /// * `Err(LedgerError::Domain(DomainError::OutOfStock))` - 在庫不足
    pub async fn reserve(
        &mut self,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<Product, LedgerError> {
        let product = self
            .uow
            .lock_product(product_id)
            .await?
            .ok_or(LedgerError::ProductNotFound(product_id))?;

        if !product.is_available() {
            tracing::warn!(%product_id, quantity = quantity.value(), "product is not available");
            return Err(DomainError::OutOfStock { product_id }.into());
        }

        match self.uow.apply_stock_delta(product_id, -quantity.as_delta()).await {
            Ok(product) => {
                tracing::debug!(%product_id, stock = product.stock(), "stock reserved");
                Ok(product)
            }
            Err(RepositoryError::StockConstraintViolation(_)) => {
                tracing::warn!(
                    %product_id,
                    quantity = quantity.value(),
                    stock = product.stock(),
                    "reservation rejected by stock constraint"
                );
                Err(DomainError::OutOfStock { product_id }.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// 予約済みの在庫を戻す
    pub async fn release(
        &mut self,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<Product, LedgerError> {
        self.uow
            .lock_product(product_id)
            .await?
            .ok_or(LedgerError::ProductNotFound(product_id))?;

        let product = self
            .uow
            .apply_stock_delta(product_id, quantity.as_delta())
            .await?;
        tracing::debug!(%product_id, stock = product.stock(), "stock released");
        Ok(product)
    }

    /// 数量変更に応じて在庫を調整する
    /// `from` を戻してから `to` を予約する。失敗時の巻き戻しは作業単位が行う
    pub async fn adjust(
        &mut self,
        product_id: ProductId,
        from: Quantity,
        to: Quantity,
    ) -> Result<Product, LedgerError> {
        self.release(product_id, from).await?;
        self.reserve(product_id, to).await
    }
}
