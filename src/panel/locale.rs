use crate::models::Role;

/// Language of the panel's labels and notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    En,
    Ru,
}

/// Notification texts for one locale
#[derive(Debug)]
pub struct Messages {
    pub users_load_failed: &'static str,
    pub user_load_failed: &'static str,
    pub created: &'static str,
    pub create_failed: &'static str,
    pub create_failed_prefix: &'static str,
    pub updated: &'static str,
    pub update_failed: &'static str,
    pub update_failed_prefix: &'static str,
    pub deleted: &'static str,
    pub delete_failed: &'static str,
    pub delete_failed_prefix: &'static str,
    pub delete_confirm: &'static str,
    pub logout_failed: &'static str,
}

const EN: Messages = Messages {
    users_load_failed: "Failed to load users",
    user_load_failed: "Failed to load user data",
    created: "User created successfully",
    create_failed: "Failed to create user",
    create_failed_prefix: "Create failed",
    updated: "User updated successfully",
    update_failed: "Failed to update user",
    update_failed_prefix: "Update failed",
    deleted: "User deleted successfully",
    delete_failed: "Failed to delete user",
    delete_failed_prefix: "Delete failed",
    delete_confirm: "Are you sure you want to delete this user?",
    logout_failed: "Failed to log out",
};

const RU: Messages = Messages {
    users_load_failed: "Ошибка загрузки пользователей",
    user_load_failed: "Ошибка загрузки данных пользователя",
    created: "Пользователь успешно создан",
    create_failed: "Ошибка создания пользователя",
    create_failed_prefix: "Ошибка создания",
    updated: "Пользователь успешно обновлен",
    update_failed: "Ошибка обновления пользователя",
    update_failed_prefix: "Ошибка обновления",
    deleted: "Пользователь успешно удален",
    delete_failed: "Ошибка удаления пользователя",
    delete_failed_prefix: "Ошибка удаления",
    delete_confirm: "Вы уверены, что хотите удалить этого пользователя?",
    logout_failed: "Ошибка при выходе из системы",
};

impl Locale {
    pub fn parse(raw: &str) -> Option<Locale> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "en" => Some(Locale::En),
            "ru" => Some(Locale::Ru),
            _ => None,
        }
    }

    pub fn messages(&self) -> &'static Messages {
        match self {
            Locale::En => &EN,
            Locale::Ru => &RU,
        }
    }

    pub fn role_label(&self, role: Role) -> &'static str {
        match (self, role) {
            (Locale::En, Role::Admin) => "Administrator",
            (Locale::En, Role::User) => "User",
            (Locale::Ru, Role::Admin) => "Администратор",
            (Locale::Ru, Role::User) => "Пользователь",
        }
    }

    /// Display name of a role tag. Tags outside the known set come back unchanged.
    pub fn display_role<'a>(&self, tag: &'a str) -> &'a str {
        match Role::parse(tag) {
            Some(role) => self.role_label(role),
            None => tag,
        }
    }

    /// Comma separated role labels, or `-` for an empty set
    pub fn format_roles(&self, roles: &[String]) -> String {
        if roles.is_empty() {
            return "-".to_owned();
        }
        roles
            .iter()
            .map(|tag| self.display_role(tag))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
