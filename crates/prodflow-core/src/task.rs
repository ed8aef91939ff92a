//! 任務通知模型（跨實體的輕量通知，核心邏輯只產生、不消費）

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 使用者角色（角色廣播用）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserRole {
    /// 供應管理員
    SupplyManager,
    /// 生產管理員
    ProductionManager,
    /// 倉庫管理員
    WarehouseManager,
}

/// 關聯實體參照（取代字串式多型關聯）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelatedEntityRef {
    /// 生產訂單
    ProdOrder(Uuid),
    /// 供應訂單
    SupplyOrder(Uuid),
    /// 生產訂單群組
    ProdOrderGroup(Uuid),
}

/// 任務收件人（指定使用者或角色廣播）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskRecipients {
    /// 指定使用者
    Users(Vec<Uuid>),
    /// 角色廣播
    Roles(Vec<UserRole>),
}

/// 任務動作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskAction {
    /// 數量不符（到貨或產出與預期不一致）
    QuantityMismatch,
    /// 缺料待補
    SupplyShortfall,
    /// 需要人工確認
    ManualCheck,
}

/// 任務狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    /// 未處理
    Open,
    /// 已處理
    Resolved,
}

/// 任務通知
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// 任務ID
    pub id: Uuid,

    /// 發出者
    pub from_user: Uuid,

    /// 收件人
    pub recipients: TaskRecipients,

    /// 關聯實體
    pub related: RelatedEntityRef,

    /// 動作
    pub action: TaskAction,

    /// 說明文字
    pub comment: String,

    /// 任務狀態
    pub status: TaskStatus,

    /// 建立時間
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// 創建新的任務通知
    pub fn new(
        from_user: Uuid,
        recipients: TaskRecipients,
        related: RelatedEntityRef,
        action: TaskAction,
        comment: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            from_user,
            recipients,
            related,
            action,
            comment: comment.into(),
            status: TaskStatus::Open,
            created_at: Utc::now(),
        }
    }

    /// 檢查是否廣播給指定角色
    pub fn is_for_role(&self, role: UserRole) -> bool {
        match &self.recipients {
            TaskRecipients::Roles(roles) => roles.contains(&role),
            TaskRecipients::Users(_) => false,
        }
    }
}
