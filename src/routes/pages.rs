use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::Query,
    middleware,
    response::Html,
    routing::get,
    Extension, Router,
};

use crate::{models::Role, AppState};

use super::middlewares::{admin_guard, auth_guard, Session};

/// Builds the router for the server-rendered pages the panel mounts on
pub fn page_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let admin = Router::new()
        .route("/admin", get(admin_page))
        .route_layer(middleware::from_fn(admin_guard))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    let user = Router::new()
        .route("/user", get(user_page))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    admin.merge(user)
}

pub async fn login_page(Query(params): Query<HashMap<String, String>>) -> Html<String> {
    let notice = if params.contains_key("logout") {
        r#"<div class="alert alert-info">You have been logged out.</div>"#
    } else if params.contains_key("error") {
        r#"<div class="alert alert-danger">Invalid email or password.</div>"#
    } else {
        ""
    };

    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Login</title></head>
<body>
{notice}
<form method="post" action="/login">
  <input type="email" name="email" placeholder="Email">
  <input type="password" name="password" placeholder="Password">
  <button type="submit">Sign in</button>
</form>
</body>
</html>"#
    ))
}

pub async fn admin_page(Extension(session): Extension<Session>) -> Html<String> {
    let user = &session.user;
    let full_name = escape_html(&format!("{} {}", user.first_name, user.last_name));
    let email = escape_html(&user.email);
    let csrf = escape_html(&session.csrf);
    let create_roles = role_checkboxes("create");
    let edit_roles = role_checkboxes("edit");

    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<meta name="_csrf" content="{csrf}">
<meta name="_csrf_header" content="X-CSRF-TOKEN">
<title>Admin panel</title>
</head>
<body>
<nav>
  <span class="user-info">{full_name}</span>
  <span class="user-email">{email}</span>
  <form action="/logout" method="post"><input type="hidden" name="_csrf" value="{csrf}"><button type="submit">Logout</button></form>
</nav>
<button id="createUserBtn">New user</button>
<table>
  <thead><tr><th>ID</th><th>First name</th><th>Last name</th><th>Email</th><th>Age</th><th>Role</th><th></th></tr></thead>
  <tbody id="usersTableBody"></tbody>
</table>
<form id="createUserForm">
  <input name="firstName"><input name="lastName"><input name="email">
  <input name="age" type="number"><input name="password" type="password">
  {create_roles}
</form>
<form id="editUserForm">
  <input type="hidden" id="editUserId" name="id">
  <input id="editFirstName" name="firstName"><input id="editLastName" name="lastName">
  <input id="editEmail" name="email"><input id="editAge" name="age" type="number">
  <input name="password" type="password">
  {edit_roles}
</form>
<div id="notificationContainer"></div>
</body>
</html>"#
    ))
}

pub async fn user_page(Extension(session): Extension<Session>) -> Html<String> {
    let user = &session.user;
    let full_name = escape_html(&format!("{} {}", user.first_name, user.last_name));
    let first_name = escape_html(&user.first_name);
    let last_name = escape_html(&user.last_name);
    let email = escape_html(&user.email);
    let csrf = escape_html(&session.csrf);
    let age = user.age;

    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<meta name="_csrf" content="{csrf}">
<meta name="_csrf_header" content="X-CSRF-TOKEN">
<title>User page</title>
</head>
<body>
<nav>
  <span class="user-info">{full_name}</span>
  <span class="user-email">{email}</span>
  <form action="/logout" method="post"><input type="hidden" name="_csrf" value="{csrf}"><button type="submit">Logout</button></form>
</nav>
<table>
  <tr><th>First name</th><td id="userFirstName">{first_name}</td></tr>
  <tr><th>Last name</th><td id="userLastName">{last_name}</td></tr>
  <tr><th>Email</th><td id="userEmail">{email}</td></tr>
  <tr><th>Age</th><td id="userAge">{age}</td></tr>
  <tr><th>Role</th><td id="userRoles"></td></tr>
</table>
</body>
</html>"#
    ))
}

fn role_checkboxes(form: &str) -> String {
    Role::ALL
        .iter()
        .map(|role| {
            format!(
                r#"<label><input type="checkbox" id="{form}Role{role}" name="roles" value="{role}"> {role}</label>"#
            )
        })
        .collect::<Vec<_>>()
        .join("\n  ")
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
