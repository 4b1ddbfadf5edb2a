use tracing::{debug, error, info};

use super::{ActionKind, AdminPanel, Locale, NotificationLevel, RowAction, TableRow};
use crate::{client::UserApi, models::dto::UserRecord};

impl<A: UserApi> AdminPanel<A> {
    /// Replaces the users table with the server's current collection.
    /// A failed fetch keeps the old rows and shows one error notification.
    pub async fn load_users_table(&mut self) {
        if self.page.table.is_none() {
            debug!("Page has no users table");
            return;
        }

        match self.api.list_users().await {
            Ok(users) => {
                let rows: Vec<TableRow> = users.iter().map(|u| render_row(self.locale, u)).collect();
                info!(count = rows.len(), "Users table refreshed");
                self.page.table = Some(rows);
            }
            Err(err) => {
                error!(error = %err, "Error loading users");
                let message = self.messages().users_load_failed;
                self.page.notify(NotificationLevel::Danger, message);
            }
        }
    }
}

fn render_row(locale: Locale, user: &UserRecord) -> TableRow {
    TableRow {
        id: user.id,
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        email: user.email.clone(),
        age: user.age,
        roles: locale.format_roles(&user.roles),
        actions: [
            RowAction {
                kind: ActionKind::Edit,
                user_id: user.id,
            },
            RowAction {
                kind: ActionKind::Delete,
                user_id: user.id,
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use crate::panel::{
        testing::{record, sample_users, FakeApi, Failure},
        ActionKind, AdminPanel, Locale, NotificationLevel, Page,
    };

    #[tokio::test]
    async fn one_row_per_record_with_mapped_roles() {
        let mut panel = AdminPanel::new(
            FakeApi::with_users(sample_users()),
            Page::admin(),
            Locale::En,
        );
        panel.load_users_table().await;

        let rows = panel.page().rows();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].roles, "Administrator, User");
        assert_eq!(rows[1].roles, "User");
        assert_eq!(rows[2].roles, "auditor");
        assert_eq!(rows[1].email, "ann@example.com");
    }

    #[tokio::test]
    async fn row_actions_are_bound_to_row_id() {
        let mut panel = AdminPanel::new(
            FakeApi::with_users(sample_users()),
            Page::admin(),
            Locale::En,
        );
        panel.load_users_table().await;

        for row in panel.page().rows() {
            assert_eq!(row.edit_action().kind, ActionKind::Edit);
            assert_eq!(row.edit_action().user_id, row.id);
            assert_eq!(row.delete_action().kind, ActionKind::Delete);
            assert_eq!(row.delete_action().user_id, row.id);
        }
    }

    #[tokio::test]
    async fn empty_role_set_renders_dash() {
        let mut panel = AdminPanel::new(
            FakeApi::with_users(vec![record(7, "Nora", "Vale", &[])]),
            Page::admin(),
            Locale::Ru,
        );
        panel.load_users_table().await;
        assert_eq!(panel.page().rows()[0].roles, "-");
    }

    #[tokio::test]
    async fn reload_rebuilds_rows_from_scratch() {
        let mut panel = AdminPanel::new(
            FakeApi::with_users(sample_users()),
            Page::admin(),
            Locale::En,
        );
        panel.load_users_table().await;
        panel.load_users_table().await;
        assert_eq!(panel.page().rows().len(), 3);
        assert_eq!(panel.api().calls("list_users"), 2);
    }

    #[tokio::test]
    async fn failure_keeps_rows_and_notifies_once() {
        let mut panel = AdminPanel::new(
            FakeApi::with_users(sample_users()),
            Page::admin(),
            Locale::En,
        );
        panel.load_users_table().await;
        panel.api().fail(
            "list_users",
            Failure::Status(StatusCode::INTERNAL_SERVER_ERROR, "boom"),
        );
        panel.load_users_table().await;

        assert_eq!(panel.page().rows().len(), 3);
        let errors = panel.page().notifications_of(NotificationLevel::Danger);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Failed to load users");
    }

    #[tokio::test]
    async fn page_without_table_makes_no_request() {
        let mut panel = AdminPanel::new(
            FakeApi::with_users(sample_users()),
            Page::user(),
            Locale::En,
        );
        panel.load_users_table().await;
        assert_eq!(panel.api().calls("list_users"), 0);
        assert!(panel.page().table.is_none());
    }
}
