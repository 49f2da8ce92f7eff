use crate::domain::error::DomainError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;

/// UUIDをラップした識別子型を定義する
macro_rules! uuid_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            /// 新しい一意の識別子を生成
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// UUIDから識別子を作成
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// 文字列から識別子を作成
            pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
                let uuid = Uuid::parse_str(s)?;
                Ok(Self(uuid))
            }

            /// 内部のUUIDを取得
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

uuid_identifier!(
    /// カテゴリの一意識別子
    CategoryId
);
uuid_identifier!(
    /// 商品の一意識別子
    ProductId
);
uuid_identifier!(
    /// 注文の一意識別子
    OrderId
);
uuid_identifier!(
    /// 注文明細の一意識別子
    OrderItemId
);
uuid_identifier!(
    /// ユーザーの一意識別子
    UserId
);

/// 在庫数と数量の上限（在庫列 `INT` の最大値）
///
/// 商品ごとに「在庫数 + 予約済み数量」がこの値を超えないように保たれるため、
/// 予約の解放で在庫数が上限を超えることはない。
pub const MAX_STOCK: u32 = i32::MAX as u32;

/// 注文数量を表す値オブジェクト
/// 常に1以上 `MAX_STOCK` 以下
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Quantity(u32);

impl Quantity {
    /// 生の入力値から数量を作成
    /// 1未満、または `MAX_STOCK` を超える値は拒否する
    pub fn new(value: i64) -> Result<Self, DomainError> {
        if value < 1 || value > i64::from(MAX_STOCK) {
            return Err(DomainError::InvalidQuantity(value));
        }
        u32::try_from(value)
            .map(Self)
            .map_err(|_| DomainError::InvalidQuantity(value))
    }

    /// 数量を取得
    pub fn value(&self) -> u32 {
        self.0
    }

    /// 在庫差分として使う符号付きの値
    pub fn as_delta(&self) -> i64 {
        i64::from(self.0)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 価格を表す値オブジェクト
/// 通貨の最小単位での非負整数
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Price(u32);

impl Price {
    /// 生の入力値から価格を作成
    pub fn new(amount: i64) -> Result<Self, DomainError> {
        u32::try_from(amount)
            .map(Self)
            .map_err(|_| DomainError::InvalidValue(format!("価格は0以上である必要があります: {}", amount)))
    }

    /// 金額を取得
    pub fn amount(&self) -> u32 {
        self.0
    }
}

/// 呼び出し元のロール
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserRole {
    /// 管理者（スタッフ）
    Admin,
    /// 一般の顧客
    Customer,
}

impl UserRole {
    /// 文字列からUserRoleを作成
    pub fn from_string(s: &str) -> Result<Self, DomainError> {
        match s {
            "admin" => Ok(UserRole::Admin),
            "customer" => Ok(UserRole::Customer),
            _ => Err(DomainError::InvalidValue(format!("無効なロール: {}", s))),
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let role_str = match self {
            UserRole::Admin => "admin",
            UserRole::Customer => "customer",
        };
        write!(f, "{}", role_str)
    }
}

/// 認証済みの呼び出し元
/// 上流のゲートウェイが検証した識別情報をそのまま受け取る
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    user_id: UserId,
    role: UserRole,
}

impl Caller {
    pub fn new(user_id: UserId, role: UserRole) -> Self {
        Self { user_id, role }
    }

    /// 管理者の呼び出し元を作成
    pub fn admin(user_id: UserId) -> Self {
        Self::new(user_id, UserRole::Admin)
    }

    /// 顧客の呼び出し元を作成
    pub fn customer(user_id: UserId) -> Self {
        Self::new(user_id, UserRole::Customer)
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn role(&self) -> UserRole {
        self.role
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}
