use tracing::{error, info};

use super::{AdminPanel, NotificationLevel};
use crate::client::UserApi;

/// Where the page goes once the session is closed
pub const LOGGED_OUT_LOCATION: &str = "/login?logout";

impl<A: UserApi> AdminPanel<A> {
    pub async fn logout(&mut self) {
        match self.api.logout().await {
            Ok(()) => {
                info!("Logged out");
                self.current_user = None;
                self.page.location = LOGGED_OUT_LOCATION.to_owned();
            }
            Err(err) => {
                error!(error = %err, "Logout error");
                let message = self.messages().logout_failed;
                self.page.notify(NotificationLevel::Danger, message);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use crate::panel::{
        testing::{sample_users, FakeApi, Failure},
        AdminPanel, Locale, NotificationLevel, Page,
    };

    #[tokio::test]
    async fn logout_moves_to_login_page() {
        let mut panel = AdminPanel::new(
            FakeApi::with_users(sample_users()),
            Page::admin(),
            Locale::En,
        );
        panel.init().await;
        panel.logout().await;

        assert_eq!(panel.page().location, "/login?logout");
        assert!(panel.current_user().is_none());
        assert_eq!(panel.api().calls("logout"), 1);
    }

    #[tokio::test]
    async fn failed_logout_stays_and_notifies() {
        let api = FakeApi::with_users(sample_users());
        api.fail(
            "logout",
            Failure::Status(StatusCode::FORBIDDEN, "Invalid CSRF token"),
        );
        let mut panel = AdminPanel::new(api, Page::admin(), Locale::Ru);
        panel.logout().await;

        assert_eq!(panel.page().location, "/admin");
        let errors = panel.page().notifications_of(NotificationLevel::Danger);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Ошибка при выходе из системы");

        panel.api().heal("logout");
        panel.logout().await;
        assert_eq!(panel.page().location, "/login?logout");
    }
}
