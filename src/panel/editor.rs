use tracing::{error, info, warn};

use super::{AdminPanel, EditorState, NotificationLevel, UserForm};
use crate::{client::UserApi, models::ClientError};

/// Yes/no confirmation asked before a destructive action
pub trait Prompt {
    fn confirm(&mut self, message: &str) -> bool;
}

impl<F: FnMut(&str) -> bool> Prompt for F {
    fn confirm(&mut self, message: &str) -> bool {
        self(message)
    }
}

impl<A: UserApi> AdminPanel<A> {
    /// Opens the create dialog with an empty form. Any other open dialog is
    /// closed first, so at most one dialog shows at a time.
    pub fn open_create(&mut self) {
        self.close_dialog();
        self.page.create_dialog.form.reset();
        self.page.create_dialog.show();
        self.state = EditorState::CreatePending;
    }

    /// Loads the record and opens the edit dialog with it, closing the create
    /// dialog if it was showing. If the fetch fails nothing changes but the
    /// error notification.
    pub async fn open_edit(&mut self, id: i64) {
        match self.api.get_user(id).await {
            Ok(user) => {
                if self.state == EditorState::CreatePending {
                    self.page.create_dialog.hide();
                }
                let dialog = &mut self.page.edit_dialog;
                dialog.form.populate(&user);
                dialog.show();
                self.state = EditorState::EditPending;
            }
            Err(err) => {
                error!(id, error = %err, "Error loading user");
                let message = self.messages().user_load_failed;
                self.page.notify(NotificationLevel::Danger, message);
            }
        }
    }

    /// Form of the dialog currently open, if any
    pub fn active_form(&mut self) -> Option<&mut UserForm> {
        match self.state {
            EditorState::Idle => None,
            EditorState::CreatePending => Some(&mut self.page.create_dialog.form),
            EditorState::EditPending => Some(&mut self.page.edit_dialog.form),
        }
    }

    /// Closes whichever dialog is open without submitting
    pub fn close_dialog(&mut self) {
        match self.state {
            EditorState::Idle => return,
            EditorState::CreatePending => self.page.create_dialog.hide(),
            EditorState::EditPending => self.page.edit_dialog.hide(),
        }
        self.state = EditorState::Idle;
    }

    pub async fn submit_create(&mut self) {
        let payload = self.page.create_dialog.form.to_payload();
        let messages = self.messages();

        match self.api.create_user(&payload).await {
            Ok(()) => {
                info!(email = %payload.email, "User created");
                self.page.create_dialog.hide();
                self.state = EditorState::Idle;
                self.page.notify(NotificationLevel::Success, messages.created);
                self.load_users_table().await;
            }
            Err(err) => {
                error!(error = %err, "Error creating user");
                self.report(&err, messages.create_failed, messages.create_failed_prefix);
            }
        }
    }

    /// Sends the edit form keyed by its hidden id field. An id that does not
    /// parse sends nothing.
    pub async fn submit_update(&mut self) {
        let messages = self.messages();
        let form = &self.page.edit_dialog.form;
        let Ok(id) = form.id.trim().parse::<i64>() else {
            warn!(id = %form.id, "Edit form has no valid user id");
            self.page.notify(NotificationLevel::Danger, messages.update_failed);
            return;
        };
        let mut payload = form.to_payload();
        payload.id = Some(id);

        match self.api.update_user(id, &payload).await {
            Ok(()) => {
                info!(id, "User updated");
                self.page.edit_dialog.hide();
                self.state = EditorState::Idle;
                self.page.notify(NotificationLevel::Success, messages.updated);
                self.load_users_table().await;
            }
            Err(err) => {
                error!(id, error = %err, "Error updating user");
                self.report(&err, messages.update_failed, messages.update_failed_prefix);
            }
        }
    }

    /// Deletes after confirmation. Declining sends no request.
    pub async fn delete_user(&mut self, id: i64, prompt: &mut impl Prompt) {
        let messages = self.messages();
        if !prompt.confirm(messages.delete_confirm) {
            return;
        }

        match self.api.delete_user(id).await {
            Ok(()) => {
                info!(id, "User deleted");
                self.page.notify(NotificationLevel::Success, messages.deleted);
                self.load_users_table().await;
            }
            Err(err) => {
                error!(id, error = %err, "Error deleting user");
                self.report(&err, messages.delete_failed, messages.delete_failed_prefix);
            }
        }
    }

    /// Error notification for a failed write: the response body after
    /// `prefix` when the server answered, `generic` otherwise
    fn report(&mut self, err: &ClientError, generic: &str, prefix: &str) {
        let message = match err.response_body() {
            Some(body) => format!("{}: {}", prefix, body),
            None => generic.to_owned(),
        };
        self.page.notify(NotificationLevel::Danger, message);
    }
}
