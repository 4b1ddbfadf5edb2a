use std::{collections::HashMap, sync::Mutex};

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::{
    client::UserApi,
    models::{
        dto::{UserPayload, UserRecord},
        ClientError,
    },
};

/// How a scripted call should fail
#[derive(Debug, Clone)]
pub enum Failure {
    Status(StatusCode, &'static str),
    /// Stands in for a transport error: no response body to show
    Broken,
}

impl Failure {
    fn to_error(&self) -> ClientError {
        match self {
            Failure::Status(status, body) => ClientError::ApiError {
                status: *status,
                body: body.to_string(),
            },
            Failure::Broken => {
                ClientError::from(serde_json::from_str::<UserRecord>("<html>").unwrap_err())
            }
        }
    }
}

#[derive(Default)]
struct FakeState {
    current: Option<UserRecord>,
    users: Vec<UserRecord>,
    failures: HashMap<&'static str, Failure>,
    calls: Vec<&'static str>,
    payloads: Vec<UserPayload>,
}

/// In-memory [`UserApi`] that records every call
#[derive(Default)]
pub struct FakeApi {
    state: Mutex<FakeState>,
}

impl FakeApi {
    pub fn with_users(users: Vec<UserRecord>) -> Self {
        let api = FakeApi::default();
        {
            let mut state = api.state.lock().unwrap();
            state.current = users.first().cloned();
            state.users = users;
        }
        api
    }

    pub fn fail(&self, call: &'static str, failure: Failure) {
        self.state.lock().unwrap().failures.insert(call, failure);
    }

    pub fn heal(&self, call: &'static str) {
        self.state.lock().unwrap().failures.remove(call);
    }

    /// How many times `call` was made
    pub fn calls(&self, call: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| **c == call)
            .count()
    }

    pub fn last_payload(&self) -> Option<UserPayload> {
        self.state.lock().unwrap().payloads.last().cloned()
    }

    pub fn users(&self) -> Vec<UserRecord> {
        self.state.lock().unwrap().users.clone()
    }

    fn enter(&self, call: &'static str) -> Result<std::sync::MutexGuard<'_, FakeState>, ClientError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        match state.failures.get(call) {
            Some(failure) => Err(failure.to_error()),
            None => Ok(state),
        }
    }
}

fn not_found() -> ClientError {
    ClientError::ApiError {
        status: StatusCode::NOT_FOUND,
        body: r#"{"message":"User not found"}"#.to_string(),
    }
}

fn apply(record: &mut UserRecord, payload: &UserPayload) {
    record.first_name = payload.first_name.clone();
    record.last_name = payload.last_name.clone();
    record.email = payload.email.clone();
    record.age = payload.age.unwrap_or_default();
    record.roles = payload.roles.clone();
}

#[async_trait]
impl UserApi for FakeApi {
    async fn current_user(&self) -> Result<UserRecord, ClientError> {
        let state = self.enter("current_user")?;
        state.current.clone().ok_or_else(|| ClientError::ApiError {
            status: StatusCode::UNAUTHORIZED,
            body: String::new(),
        })
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>, ClientError> {
        Ok(self.enter("list_users")?.users.clone())
    }

    async fn get_user(&self, id: i64) -> Result<UserRecord, ClientError> {
        let state = self.enter("get_user")?;
        state
            .users
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or_else(not_found)
    }

    async fn create_user(&self, payload: &UserPayload) -> Result<(), ClientError> {
        let mut state = self.enter("create_user")?;
        state.payloads.push(payload.clone());
        let id = state.users.iter().map(|u| u.id).max().unwrap_or(0) + 1;
        let mut record = UserRecord {
            id,
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            age: 0,
            roles: Vec::new(),
        };
        apply(&mut record, payload);
        state.users.push(record);
        Ok(())
    }

    async fn update_user(&self, id: i64, payload: &UserPayload) -> Result<(), ClientError> {
        let mut state = self.enter("update_user")?;
        state.payloads.push(payload.clone());
        let record = state
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(not_found)?;
        apply(record, payload);
        Ok(())
    }

    async fn delete_user(&self, id: i64) -> Result<(), ClientError> {
        let mut state = self.enter("delete_user")?;
        let before = state.users.len();
        state.users.retain(|u| u.id != id);
        if state.users.len() == before {
            return Err(not_found());
        }
        Ok(())
    }

    async fn logout(&self) -> Result<(), ClientError> {
        let _state = self.enter("logout")?;
        Ok(())
    }
}

pub fn record(id: i64, first_name: &str, last_name: &str, roles: &[&str]) -> UserRecord {
    UserRecord {
        id,
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        email: format!("{}@example.com", first_name.to_lowercase()),
        age: 20 + id as i32,
        roles: roles.iter().map(|r| r.to_string()).collect(),
    }
}

pub fn sample_users() -> Vec<UserRecord> {
    vec![
        record(1, "Admin", "Root", &["admin", "user"]),
        record(2, "Ann", "Lee", &["user"]),
        record(3, "Bob", "Stone", &["auditor"]),
    ]
}
