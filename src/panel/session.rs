use tracing::{error, info};

use super::{AdminPanel, ProfileCard, Slot};
use crate::{client::UserApi, models::dto::UserRecord};

impl<A: UserApi> AdminPanel<A> {
    /// Fetches the signed-in identity and shows it in the page header.
    /// On failure the page keeps whatever it displayed before.
    pub async fn load_current_user(&mut self) {
        match self.api.current_user().await {
            Ok(user) => {
                info!(email = %user.email, "Current user loaded");
                self.render_identity(&user);
                self.current_user = Some(user);
            }
            Err(err) => error!(error = %err, "Error loading current user"),
        }
    }

    fn render_identity(&mut self, user: &UserRecord) {
        let full_name = format!("{} {}", user.first_name, user.last_name);
        self.page.set_slot_text(Slot::UserInfo, &full_name);
        self.page.set_slot_text(Slot::UserEmail, &user.email);

        let locale = self.locale;
        if let Some(profile) = self.page.profile.as_mut() {
            *profile = ProfileCard {
                first_name: user.first_name.clone(),
                last_name: user.last_name.clone(),
                email: user.email.clone(),
                age: user.age.to_string(),
                roles: user
                    .roles
                    .iter()
                    .map(|tag| locale.display_role(tag).to_owned())
                    .collect(),
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use crate::panel::{
        testing::{sample_users, FakeApi, Failure},
        AdminPanel, Locale, Page, Slot,
    };

    fn page_with_copies() -> Page {
        Page::from_html(
            "/admin",
            r#"<span class="user-info">?</span><p class="user-info">?</p>
               <span class="user-email">?</span><p class="user-email">?</p>"#,
        )
    }

    #[tokio::test]
    async fn identity_reaches_every_tagged_element() {
        let mut panel = AdminPanel::new(
            FakeApi::with_users(sample_users()),
            page_with_copies(),
            Locale::En,
        );
        panel.load_current_user().await;

        assert_eq!(
            panel.page().slot_texts(Slot::UserInfo),
            vec!["Admin Root", "Admin Root"]
        );
        assert_eq!(
            panel.page().slot_texts(Slot::UserEmail),
            vec!["admin@example.com", "admin@example.com"]
        );
        assert_eq!(panel.current_user().unwrap().id, 1);
    }

    #[tokio::test]
    async fn failure_leaves_display_untouched() {
        let api = FakeApi::with_users(sample_users());
        api.fail(
            "current_user",
            Failure::Status(StatusCode::UNAUTHORIZED, "unauthorized"),
        );
        let mut panel = AdminPanel::new(api, page_with_copies(), Locale::En);
        panel.load_current_user().await;

        assert_eq!(panel.page().slot_texts(Slot::UserInfo), vec!["?", "?"]);
        assert!(panel.page().notifications.is_empty());
        assert!(panel.current_user().is_none());
    }

    #[tokio::test]
    async fn profile_card_shows_role_labels() {
        let mut panel = AdminPanel::new(
            FakeApi::with_users(sample_users()),
            Page::user(),
            Locale::Ru,
        );
        panel.load_current_user().await;

        let profile = panel.page().profile.as_ref().unwrap();
        assert_eq!(profile.first_name, "Admin");
        assert_eq!(profile.age, "21");
        assert_eq!(profile.roles, vec!["Администратор", "Пользователь"]);
    }
}
