use crate::domain::error::DomainError;
use crate::domain::model::availability::availability;
use crate::domain::model::{CategoryId, Price, ProductId};

/// カテゴリ
/// 商品を分類する表示用のラベル
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    id: CategoryId,
    name: String,
}

impl Category {
    /// 新しいカテゴリを作成
    /// 名前は空にできない
    pub fn new(id: CategoryId, name: String) -> Result<Self, DomainError> {
        Ok(Self {
            id,
            name: Self::validate_name(name)?,
        })
    }

    /// データベースから取得したデータでカテゴリを再構築
    pub fn reconstruct(id: CategoryId, name: String) -> Self {
        Self { id, name }
    }

    pub fn id(&self) -> CategoryId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// カテゴリ名を変更
    pub fn rename(&mut self, name: String) -> Result<(), DomainError> {
        self.name = Self::validate_name(name)?;
        Ok(())
    }

    fn validate_name(name: String) -> Result<String, DomainError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidValue(
                "カテゴリ名は空にできません".to_string(),
            ));
        }
        Ok(trimmed.to_string())
    }
}

/// 商品
/// 販売可否は在庫数から導出され、独立して設定することはできない
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    id: ProductId,
    category_id: CategoryId,
    name: String,
    description: String,
    price: Price,
    stock: u32,
}

impl Product {
    /// 新しい商品を作成
    ///
    /// # Arguments
    /// * `id` - 商品ID
    /// * `category_id` - 所属カテゴリ
    /// * `name` - 商品名（空不可）
    /// * `description` - 説明（空可）
    /// * `price` - 価格
    /// * `stock` - 初期在庫数
    pub fn new(
        id: ProductId,
        category_id: CategoryId,
        name: String,
        description: String,
        price: Price,
        stock: u32,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            id,
            category_id,
            name: Self::validate_name(name)?,
            description,
            price,
            stock,
        })
    }

    /// データベースから取得したデータで商品を再構築
    pub fn reconstruct(
        id: ProductId,
        category_id: CategoryId,
        name: String,
        description: String,
        price: Price,
        stock: u32,
    ) -> Self {
        Self {
            id,
            category_id,
            name,
            description,
            price,
            stock,
        }
    }

    pub fn id(&self) -> ProductId {
        self.id
    }

    pub fn category_id(&self) -> CategoryId {
        self.category_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn price(&self) -> Price {
        self.price
    }

    /// 在庫数を取得
    pub fn stock(&self) -> u32 {
        self.stock
    }

    /// 販売可否（在庫数から導出）
    pub fn is_available(&self) -> bool {
        availability(self.stock)
    }

    /// 在庫数を上書きする
    /// 管理者による補充と、ストレージ層での在庫差分の反映にのみ使う
    pub fn restock(&mut self, stock: u32) {
        self.stock = stock;
    }

    /// 商品情報を変更する
    /// 在庫数と販売可否は変わらない
    pub fn update_details(
        &mut self,
        category_id: CategoryId,
        name: String,
        description: String,
        price: Price,
    ) -> Result<(), DomainError> {
        self.name = Self::validate_name(name)?;
        self.category_id = category_id;
        self.description = description;
        self.price = price;
        Ok(())
    }

    fn validate_name(name: String) -> Result<String, DomainError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidValue("商品名は空にできません".to_string()));
        }
        Ok(trimmed.to_string())
    }
}
