//! 任務通知（射後不理，核心只產生）

use uuid::Uuid;

use prodflow_core::{RelatedEntityRef, Task, TaskAction, TaskRecipients, UserRole};
use prodflow_store::Store;

/// 任務通知器
pub struct Notifier;

impl Notifier {
    /// 廣播任務給角色
    pub fn notify_roles(
        store: &mut Store,
        from_user: Uuid,
        roles: Vec<UserRole>,
        related: RelatedEntityRef,
        action: TaskAction,
        comment: impl Into<String>,
    ) {
        store.tasks.push(Task::new(
            from_user,
            TaskRecipients::Roles(roles),
            related,
            action,
            comment,
        ));
    }

    /// 發送任務給指定使用者
    pub fn notify_users(
        store: &mut Store,
        from_user: Uuid,
        users: Vec<Uuid>,
        related: RelatedEntityRef,
        action: TaskAction,
        comment: impl Into<String>,
    ) {
        store.tasks.push(Task::new(
            from_user,
            TaskRecipients::Users(users),
            related,
            action,
            comment,
        ));
    }
}
