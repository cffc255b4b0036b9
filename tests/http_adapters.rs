//! HTTP adapters against an in-process API
//!
//! A small axum app stands in for the REST backend: cookie session,
//! `{"results": [...]}` lists, item envelopes and soft-deleted bank accounts.

use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use serde_json::{Value, json};

use bank_fsm::auth::{AuthService, Credentials, start_auth_machine};
use bank_fsm::bank_accounts::display_order;
use bank_fsm::config::ApiConfig;
use bank_fsm::data::{FetchQuery, ResourceService, spawn_data_machine};
use bank_fsm::http::{ApiClient, HttpAuthService, HttpResourceService};
use bank_fsm::{
    AuthEvent, AuthState, BankAccount, BankAccountDraft, DataEvent, DataState, FailureKind,
    NewUser, ProfilePatch, SuccessState, User,
};

const SESSION: &str = "connect.sid=s%3Agiovanna";

// ============================================================================
// Fake API
// ============================================================================

#[derive(Default)]
struct Backend {
    users: Vec<(User, String)>,
    accounts: Vec<BankAccount>,
    /// Username behind the one live session
    session: Option<String>,
    next_id: usize,
}

type Shared = Arc<Mutex<Backend>>;

fn signed_in(backend: &Backend, headers: &HeaderMap) -> Option<User> {
    let cookie = headers.get(COOKIE)?.to_str().ok()?;
    if !cookie.contains(SESSION) {
        return None;
    }
    let username = backend.session.as_ref()?;
    backend
        .users
        .iter()
        .find(|(u, _)| &u.username == username)
        .map(|(u, _)| u.clone())
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, "Unauthorized").into_response()
}

async fn login(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut backend = state.lock().unwrap();
    let username = body["username"].as_str().unwrap_or_default().to_string();
    let password = body["password"].as_str().unwrap_or_default();
    let Some(user) = backend
        .users
        .iter()
        .find(|(u, p)| u.username == username && p == password)
        .map(|(u, _)| u.clone())
    else {
        return unauthorized();
    };
    backend.session = Some(username);
    (
        [(SET_COOKIE, format!("{}; Path=/; HttpOnly", SESSION))],
        Json(json!({ "user": user })),
    )
        .into_response()
}

async fn check_auth(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let backend = state.lock().unwrap();
    match signed_in(&backend, &headers) {
        Some(user) => Json(json!({ "user": user })).into_response(),
        None => (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Not logged in" }))).into_response(),
    }
}

async fn logout(State(state): State<Shared>) -> StatusCode {
    state.lock().unwrap().session = None;
    StatusCode::OK
}

async fn create_user(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut backend = state.lock().unwrap();
    let username = body["username"].as_str().unwrap_or_default().to_string();
    if backend.users.iter().any(|(u, _)| u.username == username) {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "message": "Username already exists" })),
        )
            .into_response();
    }
    backend.next_id += 1;
    let user = User::new(
        format!("u{}", backend.next_id),
        body["firstName"].as_str().unwrap_or_default(),
        body["lastName"].as_str().unwrap_or_default(),
        username,
    );
    let password = body["password"].as_str().unwrap_or_default().to_string();
    backend.users.push((user.clone(), password));
    (StatusCode::CREATED, Json(json!({ "user": user }))).into_response()
}

async fn update_user(
    State(state): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(patch): Json<ProfilePatch>,
) -> Response {
    let mut backend = state.lock().unwrap();
    if signed_in(&backend, &headers).is_none() {
        return unauthorized();
    }
    match backend.users.iter_mut().find(|(u, _)| u.id == id) {
        Some((user, _)) => {
            if let Some(first_name) = patch.first_name {
                user.first_name = first_name;
            }
            if let Some(last_name) = patch.last_name {
                user.last_name = last_name;
            }
            if patch.email.is_some() {
                user.email = patch.email;
            }
            if patch.phone_number.is_some() {
                user.phone_number = patch.phone_number;
            }
            StatusCode::NO_CONTENT.into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn search_users(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<Vec<(String, String)>>,
) -> Response {
    let backend = state.lock().unwrap();
    if signed_in(&backend, &headers).is_none() {
        return unauthorized();
    }
    let q = params
        .iter()
        .find(|(k, _)| k == "q")
        .map(|(_, v)| v.to_lowercase())
        .unwrap_or_default();
    let results: Vec<&User> = backend
        .users
        .iter()
        .map(|(u, _)| u)
        .filter(|u| u.username.to_lowercase().contains(&q))
        .collect();
    Json(json!({ "results": results })).into_response()
}

async fn list_accounts(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let backend = state.lock().unwrap();
    if signed_in(&backend, &headers).is_none() {
        return unauthorized();
    }
    Json(json!({ "results": backend.accounts })).into_response()
}

async fn create_account(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(draft): Json<BankAccountDraft>,
) -> Response {
    let mut backend = state.lock().unwrap();
    let Some(user) = signed_in(&backend, &headers) else {
        return unauthorized();
    };
    backend.next_id += 1;
    let mut account = BankAccount::new(
        format!("ba{}", backend.next_id),
        draft.bank_name,
        draft.routing_number,
        draft.account_number,
    );
    account.user_id = Some(user.id);
    backend.accounts.push(account.clone());
    Json(json!({ "account": account })).into_response()
}

/// Soft delete, like the real API
async fn delete_account(
    State(state): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let mut backend = state.lock().unwrap();
    if signed_in(&backend, &headers).is_none() {
        return unauthorized();
    }
    match backend.accounts.iter_mut().find(|a| a.id == id) {
        Some(account) => {
            account.is_deleted = true;
            StatusCode::OK.into_response()
        }
        None => (StatusCode::NOT_FOUND, Json(json!({ "error": "Not Found" }))).into_response(),
    }
}

struct TestApi {
    client: Arc<ApiClient>,
    backend: Shared,
}

impl TestApi {
    async fn start() -> Self {
        let backend: Shared = Arc::new(Mutex::new(Backend::default()));
        backend.lock().unwrap().users.push((
            User::new("t45AiwidW", "Giovanna", "Smith", "Giovanna74"),
            "s3cret".to_string(),
        ));

        let app = Router::new()
            .route("/login", post(login))
            .route("/logout", post(logout))
            .route("/checkAuth", get(check_auth))
            .route("/users", post(create_user))
            .route("/users/search", get(search_users))
            .route("/users/{id}", patch(update_user))
            .route("/bankAccounts", get(list_accounts).post(create_account))
            .route("/bankAccounts/{id}", delete(delete_account))
            .with_state(backend.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = ApiClient::new(&ApiConfig {
            base_url: format!("http://{}", addr),
            timeout_ms: 2000,
        })
        .unwrap();

        Self {
            client: Arc::new(client),
            backend,
        }
    }

    fn auth(&self) -> HttpAuthService {
        HttpAuthService::new(self.client.clone(), false)
    }

    fn accounts(&self) -> HttpResourceService<BankAccount> {
        HttpResourceService::new(self.client.clone())
    }

    async fn sign_in(&self) {
        self.auth()
            .login(&Credentials::new("Giovanna74", "s3cret", false))
            .await
            .unwrap();
    }
}

// ============================================================================
// Adapters
// ============================================================================

#[tokio::test]
async fn test_login_rejected() {
    let api = TestApi::start().await;
    let err = api
        .auth()
        .login(&Credentials::new("Giovanna74", "wrong", false))
        .await
        .unwrap_err();

    assert_eq!(err.kind, FailureKind::Authorization);
    assert_eq!(err.status, Some(401));
    assert_eq!(err.message, "Unauthorized");
    assert_eq!(api.client.session_cookie(), None);
}

#[tokio::test]
async fn test_cookie_session_lifecycle() {
    let api = TestApi::start().await;
    let auth = api.auth();

    let grant = auth
        .login(&Credentials::new("Giovanna74", "s3cret", false))
        .await
        .unwrap();
    assert_eq!(grant.user.id, "t45AiwidW");
    assert!(api.client.session_cookie().unwrap().contains(SESSION));

    let restored = auth.check_session().await.unwrap();
    assert_eq!(restored.user.username, "Giovanna74");

    auth.logout().await.unwrap();
    let err = auth.check_session().await.unwrap_err();
    assert!(err.is_authorization());
    // JSON error body wins over the status reason
    assert_eq!(err.message, "Not logged in");
}

#[tokio::test]
async fn test_update_profile_rereads_user() {
    let api = TestApi::start().await;
    api.sign_in().await;

    let user = api
        .auth()
        .update_profile("t45AiwidW", &ProfilePatch::default().first_name("Kaden"))
        .await
        .unwrap();
    assert_eq!(user.display_name(), "Kaden Smith");

    let err = api
        .auth()
        .update_profile("nobody", &ProfilePatch::default().first_name("Kaden"))
        .await
        .unwrap_err();
    assert_eq!(err.status, Some(404));
    assert_eq!(err.kind, FailureKind::Validation);
}

#[tokio::test]
async fn test_signup_logs_in() {
    let api = TestApi::start().await;
    let grant = api
        .auth()
        .signup(&NewUser::new("Edgar", "Johns", "edgar_j", "p4ssw0rd"))
        .await
        .unwrap();
    assert_eq!(grant.user.username, "edgar_j");
    assert_eq!(
        api.backend.lock().unwrap().session.as_deref(),
        Some("edgar_j")
    );

    let err = api
        .auth()
        .signup(&NewUser::new("Edgar", "Johns", "edgar_j", "p4ssw0rd"))
        .await
        .unwrap_err();
    assert_eq!(err.status, Some(422));
    assert_eq!(err.message, "Username already exists");
}

#[tokio::test]
async fn test_bank_account_crud() {
    let api = TestApi::start().await;
    api.sign_in().await;
    let accounts = api.accounts();

    assert!(accounts.list(&FetchQuery::new()).await.unwrap().is_empty());

    let created = accounts
        .create(BankAccountDraft::new("First Bank of Test", "123456789", "987654321"))
        .await
        .unwrap();
    assert_eq!(created.user_id.as_deref(), Some("t45AiwidW"));

    accounts.delete(&created.id).await.unwrap();
    let listed = accounts.list(&FetchQuery::new()).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert!(listed[0].is_deleted);

    let err = accounts.delete(&"missing".to_string()).await.unwrap_err();
    assert_eq!(err.status, Some(404));
    assert_eq!(err.message, "Not Found");
}

#[tokio::test]
async fn test_user_search_path() {
    let api = TestApi::start().await;
    api.sign_in().await;
    api.auth()
        .signup(&NewUser::new("Edgar", "Johns", "edgar_j", "p4ssw0rd"))
        .await
        .unwrap();

    let users: HttpResourceService<User> = HttpResourceService::new(api.client.clone());
    let found = users
        .list(&FetchQuery::new().with("q", "EDGAR"))
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].username, "edgar_j");
}

#[tokio::test]
async fn test_list_without_session() {
    let api = TestApi::start().await;
    let err = api.accounts().list(&FetchQuery::new()).await.unwrap_err();
    assert!(err.is_authorization());
}

// ============================================================================
// Machines over HTTP
// ============================================================================

#[tokio::test]
async fn test_session_gates_bank_accounts() {
    let api = TestApi::start().await;

    let accounts = spawn_data_machine(
        "bank_accounts",
        Arc::new(api.accounts()) as Arc<dyn ResourceService<BankAccount>>,
        16,
        None,
    );
    let snapshot = accounts
        .send_until(DataEvent::fetch(), |s| !s.state.is_in_flight())
        .await
        .unwrap();
    assert_eq!(snapshot.state, DataState::Failure);
    assert!(snapshot.last_error.unwrap().is_authorization());

    let (auth, _task, startup) = start_auth_machine(
        Arc::new(api.auth()) as Arc<dyn AuthService>,
        16,
        None,
    )
    .await
    .unwrap();
    assert_eq!(startup.state, AuthState::Unauthorized);
    let session = auth
        .send_until(
            AuthEvent::Login(Credentials::new("Giovanna74", "s3cret", false)),
            |s| !s.state.is_in_flight(),
        )
        .await
        .unwrap();
    assert_eq!(session.state, AuthState::Authorized);

    let snapshot = accounts
        .send_until(DataEvent::fetch(), |s| !s.state.is_in_flight())
        .await
        .unwrap();
    assert_eq!(snapshot.state, DataState::Success(SuccessState::WithoutData));

    for (name, account) in [("Second Savings", "111222333"), ("Third Credit Union", "444555666")] {
        let draft = BankAccountDraft::new(name, "123456789", account);
        let snapshot = accounts
            .send_until(DataEvent::Create(draft), |s| s.state.is_success())
            .await
            .unwrap();
        assert!(snapshot.last_error.is_none());
    }
    let first = accounts.snapshot().records[0].id.clone();

    let snapshot = accounts
        .send_until(DataEvent::Delete(first.clone()), |s| s.state.is_success())
        .await
        .unwrap();
    assert_eq!(snapshot.state, DataState::Success(SuccessState::WithData));
    assert_eq!(snapshot.records.len(), 2);

    let ordered = display_order(&snapshot.records);
    assert_eq!(ordered[1].id, first);
    assert!(ordered[1].is_deleted);
    assert!(!ordered[0].is_deleted);

    let session = auth
        .send_until(AuthEvent::Logout, |s| s.state == AuthState::Unauthorized)
        .await
        .unwrap();
    assert!(session.current_user.is_none());
}
