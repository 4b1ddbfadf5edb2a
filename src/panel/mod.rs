//! Controller for the user administration page.
//!
//! [`AdminPanel`] owns a [`Page`] and a [`UserApi`] implementation. Every
//! operation awaits its request, then applies the outcome to the page. No
//! operation fails: errors end up as notifications or log lines.

mod editor;
mod locale;
mod logout;
pub mod page;
mod session;
mod table;
#[cfg(test)]
mod testing;

pub use editor::Prompt;
pub use locale::{Locale, Messages};
pub use logout::LOGGED_OUT_LOCATION;
pub use page::{
    ActionKind, Dialog, Element, Notification, NotificationLevel, Page, ProfileCard, RowAction,
    Slot, TableRow, UserForm, NOTIFICATION_TTL,
};

use crate::{client::UserApi, models::dto::UserRecord};

/// Where the record editor is in its create/edit cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditorState {
    #[default]
    Idle,
    CreatePending,
    EditPending,
}

pub struct AdminPanel<A: UserApi> {
    api: A,
    page: Page,
    locale: Locale,
    current_user: Option<UserRecord>,
    state: EditorState,
}

impl<A: UserApi> AdminPanel<A> {
    pub fn new(api: A, page: Page, locale: Locale) -> Self {
        AdminPanel {
            api,
            page,
            locale,
            current_user: None,
            state: EditorState::Idle,
        }
    }

    /// Page start-up: identity first, then the users table. A failure in
    /// the first step does not stop the second.
    pub async fn init(&mut self) {
        self.load_current_user().await;
        self.load_users_table().await;
    }

    /// Runs a row button
    pub async fn trigger(&mut self, action: RowAction, prompt: &mut impl Prompt) {
        match action.kind {
            ActionKind::Edit => self.open_edit(action.user_id).await,
            ActionKind::Delete => self.delete_user(action.user_id, prompt).await,
        }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Identity loaded by the session reader, if it succeeded
    pub fn current_user(&self) -> Option<&UserRecord> {
        self.current_user.as_ref()
    }

    pub fn state(&self) -> EditorState {
        self.state
    }

    fn messages(&self) -> &'static Messages {
        self.locale.messages()
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use super::{
        testing::{sample_users, FakeApi, Failure},
        AdminPanel, Locale, NotificationLevel, Page, Slot,
    };

    #[tokio::test]
    async fn init_loads_table_even_when_identity_fails() {
        let api = FakeApi::with_users(sample_users());
        api.fail(
            "current_user",
            Failure::Status(StatusCode::UNAUTHORIZED, ""),
        );
        let mut panel = AdminPanel::new(api, Page::admin(), Locale::En);
        panel.init().await;

        assert_eq!(panel.page().slot_texts(Slot::UserInfo), vec![""]);
        assert_eq!(panel.page().rows().len(), 3);
        assert!(panel
            .page()
            .notifications_of(NotificationLevel::Danger)
            .is_empty());
    }
}
