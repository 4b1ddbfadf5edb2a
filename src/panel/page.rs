//! In-memory model of the page the panel drives.
//!
//! Each region the controller touches (display elements, the users table,
//! the two dialogs, the notification area) is plain state here, so a front
//! end only has to render a [`Page`].

use core::fmt;
use std::time::{Duration, Instant};

use scraper::{Html, Selector};

use crate::models::{
    dto::{UserPayload, UserRecord},
    Role,
};

/// How long a notification stays on the page
pub const NOTIFICATION_TTL: Duration = Duration::from_secs(5);

/// What a display element is tagged to show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// `first last` of the signed-in user
    UserInfo,
    UserEmail,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub slot: Slot,
    pub text: String,
}

/// Profile card shown on the plain user page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileCard {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub age: String,
    /// Role badges, already mapped to display labels
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Edit,
    Delete,
}

/// A row button, bound to the row's user when the row is built
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowAction {
    pub kind: ActionKind,
    pub user_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub age: i32,
    pub roles: String,
    pub actions: [RowAction; 2],
}

impl TableRow {
    pub fn edit_action(&self) -> RowAction {
        self.actions[0]
    }

    pub fn delete_action(&self) -> RowAction {
        self.actions[1]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleCheckbox {
    pub role: Role,
    pub checked: bool,
}

/// Text state of a create or edit form, one field per input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserForm {
    /// Hidden id input, only filled on the edit form
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub age: String,
    pub password: String,
    pub roles: Vec<RoleCheckbox>,
}

impl Default for UserForm {
    fn default() -> Self {
        Self {
            id: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            age: String::new(),
            password: String::new(),
            roles: Role::ALL
                .into_iter()
                .map(|role| RoleCheckbox {
                    role,
                    checked: false,
                })
                .collect(),
        }
    }
}

impl UserForm {
    /// Back to empty inputs and unchecked roles
    pub fn reset(&mut self) {
        *self = UserForm::default();
    }

    /// Fills the inputs from a fetched record. Every role checkbox is cleared
    /// before the record's roles are checked, so nothing carries over from an
    /// earlier edit. The password input is left as it is.
    pub fn populate(&mut self, user: &UserRecord) {
        self.id = user.id.to_string();
        self.first_name = user.first_name.clone();
        self.last_name = user.last_name.clone();
        self.email = user.email.clone();
        self.age = user.age.to_string();

        self.clear_roles();
        for role in user.roles.iter().filter_map(|tag| Role::parse(tag)) {
            self.set_role(role, true);
        }
    }

    pub fn clear_roles(&mut self) {
        for checkbox in &mut self.roles {
            checkbox.checked = false;
        }
    }

    pub fn set_role(&mut self, role: Role, checked: bool) {
        if let Some(checkbox) = self.roles.iter_mut().find(|c| c.role == role) {
            checkbox.checked = checked;
        }
    }

    pub fn is_checked(&self, role: Role) -> bool {
        self.roles.iter().any(|c| c.role == role && c.checked)
    }

    /// Tags of the checked roles, in checkbox order
    pub fn checked_roles(&self) -> Vec<String> {
        self.roles
            .iter()
            .filter(|c| c.checked)
            .map(|c| c.role.as_str().to_owned())
            .collect()
    }

    /// Sets an input by its form field name. `roles` takes a comma separated
    /// list and replaces the whole selection. Returns false for unknown names.
    pub fn set_field(&mut self, name: &str, value: &str) -> bool {
        match name {
            "id" => self.id = value.to_owned(),
            "firstName" => self.first_name = value.to_owned(),
            "lastName" => self.last_name = value.to_owned(),
            "email" => self.email = value.to_owned(),
            "age" => self.age = value.to_owned(),
            "password" => self.password = value.to_owned(),
            "roles" => {
                self.clear_roles();
                for role in value.split(',').filter_map(|tag| Role::parse(tag.trim())) {
                    self.set_role(role, true);
                }
            }
            _ => return false,
        }
        true
    }

    /// Serializes the inputs into a request body. A password that is blank
    /// after trimming is left out; a non-numeric age becomes `None`.
    pub fn to_payload(&self) -> UserPayload {
        let password = (!self.password.trim().is_empty()).then(|| self.password.clone());
        UserPayload {
            id: None,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            age: self.age.trim().parse().ok(),
            password,
            roles: self.checked_roles(),
        }
    }
}

/// A modal dialog wrapping one form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dialog {
    pub open: bool,
    pub form: UserForm,
}

impl Dialog {
    pub fn show(&mut self) {
        self.open = true;
    }

    /// Closing a dialog also resets its form
    pub fn hide(&mut self) {
        self.open = false;
        self.form.reset();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Danger,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub created_at: Instant,
}

#[derive(Debug, Clone)]
pub struct Page {
    pub location: String,
    pub elements: Vec<Element>,
    pub profile: Option<ProfileCard>,
    /// Users table body; `None` when the page has no table
    pub table: Option<Vec<TableRow>>,
    pub create_dialog: Dialog,
    pub edit_dialog: Dialog,
    pub notifications: Vec<Notification>,
}

impl Page {
    fn empty(location: &str) -> Page {
        Page {
            location: location.to_owned(),
            elements: Vec::new(),
            profile: None,
            table: None,
            create_dialog: Dialog::default(),
            edit_dialog: Dialog::default(),
            notifications: Vec::new(),
        }
    }

    /// Layout of the admin page: header info, users table and dialogs
    pub fn admin() -> Page {
        let mut page = Page::empty("/admin");
        page.elements = vec![
            Element {
                slot: Slot::UserInfo,
                text: String::new(),
            },
            Element {
                slot: Slot::UserEmail,
                text: String::new(),
            },
        ];
        page.table = Some(Vec::new());
        page
    }

    /// Layout of the plain user page: header info and a profile card
    pub fn user() -> Page {
        let mut page = Page::admin();
        page.location = "/user".to_owned();
        page.table = None;
        page.profile = Some(ProfileCard::default());
        page
    }

    /// Builds the page model from server-rendered markup: one element per
    /// `.user-info`/`.user-email` node (keeping its current text), a table when
    /// `#usersTableBody` exists, a profile card when `#userFirstName` exists.
    pub fn from_html(location: &str, html: &str) -> Page {
        let document = Html::parse_document(html);
        let mut page = Page::empty(location);

        for (selector, slot) in [(".user-info", Slot::UserInfo), (".user-email", Slot::UserEmail)] {
            let Ok(selector) = Selector::parse(selector) else {
                continue;
            };
            page.elements.extend(document.select(&selector).map(|node| Element {
                slot,
                text: node.text().collect::<String>().trim().to_owned(),
            }));
        }

        if has_match(&document, "#usersTableBody") {
            page.table = Some(Vec::new());
        }
        if has_match(&document, "#userFirstName") {
            page.profile = Some(ProfileCard::default());
        }
        page
    }

    pub fn slot_texts(&self, slot: Slot) -> Vec<&str> {
        self.elements
            .iter()
            .filter(|e| e.slot == slot)
            .map(|e| e.text.as_str())
            .collect()
    }

    /// Writes `text` into every element tagged with `slot`
    pub fn set_slot_text(&mut self, slot: Slot, text: &str) {
        for element in self.elements.iter_mut().filter(|e| e.slot == slot) {
            element.text = text.to_owned();
        }
    }

    /// Current table rows; empty when the page has no table
    pub fn rows(&self) -> &[TableRow] {
        self.table.as_deref().unwrap_or(&[])
    }

    /// Adds a notification, dropping the ones that have already expired
    pub fn notify(&mut self, level: NotificationLevel, message: impl Into<String>) {
        let now = Instant::now();
        self.expire_notifications(now);
        self.notifications.push(Notification {
            level,
            message: message.into(),
            created_at: now,
        });
    }

    pub fn notifications_of(&self, level: NotificationLevel) -> Vec<&Notification> {
        self.notifications
            .iter()
            .filter(|n| n.level == level)
            .collect()
    }

    /// Drops notifications older than [`NOTIFICATION_TTL`] at `now`
    pub fn expire_notifications(&mut self, now: Instant) {
        self.notifications
            .retain(|n| now.saturating_duration_since(n.created_at) < NOTIFICATION_TTL);
    }
}

fn has_match(document: &Html, selector: &str) -> bool {
    Selector::parse(selector)
        .map(|selector| document.select(&selector).next().is_some())
        .unwrap_or(false)
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[{}]", self.location)?;
        if let Some(info) = self.slot_texts(Slot::UserInfo).first() {
            let email = self.slot_texts(Slot::UserEmail).first().copied().unwrap_or("");
            writeln!(f, "Signed in as {} <{}>", info, email)?;
        }

        if let Some(profile) = &self.profile {
            writeln!(f, "First name: {}", profile.first_name)?;
            writeln!(f, "Last name:  {}", profile.last_name)?;
            writeln!(f, "Email:      {}", profile.email)?;
            writeln!(f, "Age:        {}", profile.age)?;
            writeln!(f, "Roles:      {}", profile.roles.join(" "))?;
        }

        if let Some(rows) = &self.table {
            writeln!(
                f,
                "{:<5} {:<15} {:<15} {:<28} {:<4} {}",
                "ID", "First name", "Last name", "Email", "Age", "Roles"
            )?;
            for row in rows {
                writeln!(
                    f,
                    "{:<5} {:<15} {:<15} {:<28} {:<4} {}",
                    row.id, row.first_name, row.last_name, row.email, row.age, row.roles
                )?;
            }
        }

        for dialog in [&self.create_dialog, &self.edit_dialog] {
            if dialog.open {
                let form = &dialog.form;
                writeln!(
                    f,
                    "Dialog open: id={} firstName={} lastName={} email={} age={} roles={}",
                    form.id,
                    form.first_name,
                    form.last_name,
                    form.email,
                    form.age,
                    form.checked_roles().join(",")
                )?;
            }
        }

        for notification in &self.notifications {
            let level = match notification.level {
                NotificationLevel::Success => "success",
                NotificationLevel::Danger => "danger",
            };
            writeln!(f, "[{}] {}", level, notification.message)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(roles: &[&str]) -> UserRecord {
        UserRecord {
            id: 5,
            first_name: "Ann".to_string(),
            last_name: "Lee".to_string(),
            email: "ann@example.com".to_string(),
            age: 31,
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    #[test]
    fn populate_clears_stale_role_selection() {
        let mut form = UserForm::default();
        form.set_role(Role::User, true);
        form.populate(&record(&["admin"]));

        assert!(form.is_checked(Role::Admin));
        assert!(!form.is_checked(Role::User));
        assert_eq!(form.id, "5");
        assert_eq!(form.age, "31");
    }

    #[test]
    fn populate_ignores_unknown_role_tags() {
        let mut form = UserForm::default();
        form.populate(&record(&["auditor"]));
        assert!(form.checked_roles().is_empty());
    }

    #[test]
    fn blank_password_is_left_out_of_payload() {
        let mut form = UserForm::default();
        form.populate(&record(&["user"]));
        form.password = "   ".to_string();
        assert_eq!(form.to_payload().password, None);

        form.password = " s3cret ".to_string();
        assert_eq!(form.to_payload().password.as_deref(), Some(" s3cret "));
    }

    #[test]
    fn payload_parses_age_from_text() {
        let mut form = UserForm::default();
        form.age = " 42 ".to_string();
        assert_eq!(form.to_payload().age, Some(42));

        form.age = "forty".to_string();
        assert_eq!(form.to_payload().age, None);
        assert_eq!(form.to_payload().id, None);
    }

    #[test]
    fn set_field_by_form_name() {
        let mut form = UserForm::default();
        assert!(form.set_field("firstName", "Bo"));
        assert!(form.set_field("roles", "admin, user"));
        assert!(!form.set_field("nickname", "bobo"));
        assert_eq!(form.first_name, "Bo");
        assert_eq!(form.checked_roles(), vec!["admin", "user"]);

        assert!(form.set_field("roles", "user"));
        assert_eq!(form.checked_roles(), vec!["user"]);
    }

    #[test]
    fn hiding_a_dialog_resets_its_form() {
        let mut dialog = Dialog::default();
        dialog.show();
        dialog.form.populate(&record(&["admin"]));
        dialog.hide();
        assert!(!dialog.open);
        assert_eq!(dialog.form, UserForm::default());
    }

    #[test]
    fn page_regions_discovered_from_markup() {
        let html = r#"<html><body>
            <span class="user-info">Old Name</span>
            <div class="user-info"></div>
            <span class="user-email">old@example.com</span>
            <table><tbody id="usersTableBody"></tbody></table>
        </body></html>"#;
        let page = Page::from_html("/admin", html);
        assert_eq!(page.slot_texts(Slot::UserInfo), vec!["Old Name", ""]);
        assert_eq!(page.slot_texts(Slot::UserEmail), vec!["old@example.com"]);
        assert!(page.table.is_some());
        assert!(page.profile.is_none());
    }

    #[test]
    fn page_without_table_has_no_rows() {
        let page = Page::from_html(
            "/user",
            r#"<table><tr><th>First name</th><td id="userFirstName"></td></tr></table>"#,
        );
        assert!(page.table.is_none());
        assert!(page.rows().is_empty());
        assert!(page.profile.is_some());
    }

    #[test]
    fn notifications_expire_after_ttl() {
        let mut page = Page::admin();
        page.notify(NotificationLevel::Success, "saved");
        let created = page.notifications[0].created_at;

        page.expire_notifications(created + Duration::from_secs(4));
        assert_eq!(page.notifications.len(), 1);

        page.expire_notifications(created + NOTIFICATION_TTL);
        assert!(page.notifications.is_empty());
    }

    #[test]
    fn new_notification_drops_expired_ones() {
        let mut page = Page::admin();
        page.notify(NotificationLevel::Danger, "first");
        let aged = Instant::now()
            .checked_sub(NOTIFICATION_TTL + Duration::from_millis(100))
            .unwrap();
        page.notifications[0].created_at = aged;

        page.notify(NotificationLevel::Danger, "second");
        assert_eq!(page.notifications.len(), 1);
        assert_eq!(page.notifications[0].message, "second");

        page.notify(NotificationLevel::Success, "third");
        assert_eq!(page.notifications.len(), 2);
    }
}
