//! In-memory fakes shared by the application service tests.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use wardbook_core::{AppError, AppResult, UserIdentity};
use wardbook_domain::{
    EmailAddress, FloorEntry, Grant, PropertyNumber, Role, RoleId, RoleName, Survey, SurveyId,
    SurveySelector, UserId, WardNumber,
};

use crate::{
    ArtifactStorage, AuthorizationRepository, DocumentCompositor, DocumentPart, MergedDocument,
    NewUserAccount, PasswordHasher, RejectedPart, RoleAdminRepository, RoleDefinition,
    SurveyRecordStore, SurveyReportRenderer, UserAccount, UserRepository,
};

#[derive(Default)]
struct SecurityState {
    roles: Vec<Role>,
    grants: HashMap<RoleId, BTreeSet<Grant>>,
    users: Vec<UserAccount>,
}

#[derive(Default)]
pub(crate) struct FakeSecurityStore {
    state: Mutex<SecurityState>,
}

impl FakeSecurityStore {
    pub(crate) async fn seed_role(&self, name: &str, grants: &[Grant]) -> Role {
        let role = Role {
            id: RoleId::new(),
            name: RoleName::new(name).unwrap_or_else(|_| RoleName::admin()),
        };
        let mut state = self.state.lock().await;
        state.roles.push(role.clone());
        state
            .grants
            .insert(role.id, grants.iter().copied().collect());
        role
    }

    pub(crate) async fn seed_user(&self, email: &str, role_id: RoleId) -> UserAccount {
        let account = UserAccount {
            id: UserId::new(),
            email: EmailAddress::new(email)
                .unwrap_or_else(|_| panic!("test email '{email}' should be valid")),
            display_name: email.to_owned(),
            role_id,
            password_hash: FakePasswordHasher::hash_of("secret-password"),
        };
        self.state.lock().await.users.push(account.clone());
        account
    }

    pub(crate) async fn user(&self, user_id: UserId) -> Option<UserAccount> {
        self.state
            .lock()
            .await
            .users
            .iter()
            .find(|user| user.id == user_id)
            .cloned()
    }

    pub(crate) async fn counts(&self) -> (usize, usize, usize) {
        let state = self.state.lock().await;
        let grant_count = state.grants.values().map(BTreeSet::len).sum();
        (state.roles.len(), state.users.len(), grant_count)
    }
}

pub(crate) fn identity_of(account: &UserAccount) -> UserIdentity {
    UserIdentity::new(
        account.id.to_string(),
        account.display_name.as_str(),
        Some(account.email.as_str().to_owned()),
    )
}

#[async_trait]
impl AuthorizationRepository for FakeSecurityStore {
    async fn find_role_for_subject(&self, subject: &str) -> AppResult<Option<Role>> {
        let state = self.state.lock().await;
        let role_id = state
            .users
            .iter()
            .find(|user| user.id.to_string() == subject)
            .map(|user| user.role_id);

        Ok(role_id.and_then(|role_id| state.roles.iter().find(|role| role.id == role_id).cloned()))
    }

    async fn list_grants_for_role(&self, role_id: RoleId) -> AppResult<Vec<Grant>> {
        self.list_grants(role_id).await
    }
}

#[async_trait]
impl RoleAdminRepository for FakeSecurityStore {
    async fn list_roles(&self) -> AppResult<Vec<RoleDefinition>> {
        let state = self.state.lock().await;
        let mut roles: Vec<RoleDefinition> = state
            .roles
            .iter()
            .map(|role| RoleDefinition {
                role: role.clone(),
                grants: state
                    .grants
                    .get(&role.id)
                    .map(|grants| grants.iter().copied().collect())
                    .unwrap_or_default(),
            })
            .collect();
        roles.sort_by_key(|definition| definition.role.name.normalized());
        Ok(roles)
    }

    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        let state = self.state.lock().await;
        Ok(state.roles.iter().find(|role| role.id == role_id).cloned())
    }

    async fn find_role_by_name(&self, name: &RoleName) -> AppResult<Option<Role>> {
        let state = self.state.lock().await;
        Ok(state.roles.iter().find(|role| &role.name == name).cloned())
    }

    async fn create_role(&self, name: RoleName) -> AppResult<Role> {
        let mut state = self.state.lock().await;
        if state.roles.iter().any(|role| role.name == name) {
            return Err(AppError::Conflict(format!("role '{name}' already exists")));
        }

        let role = Role {
            id: RoleId::new(),
            name,
        };
        state.roles.push(role.clone());
        Ok(role)
    }

    async fn rename_role(&self, role_id: RoleId, name: RoleName) -> AppResult<Role> {
        let mut state = self.state.lock().await;
        let role = state
            .roles
            .iter_mut()
            .find(|role| role.id == role_id)
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' was not found")))?;
        role.name = name;
        Ok(role.clone())
    }

    async fn delete_role(&self, role_id: RoleId) -> AppResult<()> {
        let mut state = self.state.lock().await;
        state.roles.retain(|role| role.id != role_id);
        state.grants.remove(&role_id);
        Ok(())
    }

    async fn count_users_with_role(&self, role_id: RoleId) -> AppResult<u64> {
        let state = self.state.lock().await;
        let count = state
            .users
            .iter()
            .filter(|user| user.role_id == role_id)
            .count();
        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }

    async fn list_grants(&self, role_id: RoleId) -> AppResult<Vec<Grant>> {
        let state = self.state.lock().await;
        Ok(state
            .grants
            .get(&role_id)
            .map(|grants| grants.iter().copied().collect())
            .unwrap_or_default())
    }

    async fn replace_grants(&self, role_id: RoleId, grants: Vec<Grant>) -> AppResult<()> {
        let mut state = self.state.lock().await;
        state.grants.insert(role_id, grants.into_iter().collect());
        Ok(())
    }

    async fn ensure_grant(&self, role_id: RoleId, grant: Grant) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        Ok(state.grants.entry(role_id).or_default().insert(grant))
    }
}

#[async_trait]
impl UserRepository for FakeSecurityStore {
    async fn find_by_email(&self, email: &EmailAddress) -> AppResult<Option<UserAccount>> {
        let state = self.state.lock().await;
        Ok(state.users.iter().find(|user| &user.email == email).cloned())
    }

    async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<UserAccount>> {
        Ok(self.user(user_id).await)
    }

    async fn create_user(&self, input: NewUserAccount) -> AppResult<UserAccount> {
        let mut state = self.state.lock().await;
        if state.users.iter().any(|user| user.email == input.email) {
            return Err(AppError::Conflict("email already registered".to_owned()));
        }

        let account = UserAccount {
            id: UserId::new(),
            email: input.email,
            display_name: input.display_name,
            role_id: input.role_id,
            password_hash: input.password_hash,
        };
        state.users.push(account.clone());
        Ok(account)
    }

    async fn delete_user(&self, user_id: UserId) -> AppResult<()> {
        self.state
            .lock()
            .await
            .users
            .retain(|user| user.id != user_id);
        Ok(())
    }

    async fn update_user_role(&self, user_id: UserId, role_id: RoleId) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if let Some(user) = state.users.iter_mut().find(|user| user.id == user_id) {
            user.role_id = role_id;
        }
        Ok(())
    }
}

pub(crate) struct FakePasswordHasher;

impl FakePasswordHasher {
    pub(crate) fn hash_of(password: &str) -> String {
        format!("fake-hash:{password}")
    }
}

impl PasswordHasher for FakePasswordHasher {
    fn hash_password(&self, password: &str) -> AppResult<String> {
        Ok(Self::hash_of(password))
    }

    fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool> {
        Ok(Self::hash_of(password) == hash)
    }
}

pub(crate) fn survey(ward: u32, property: u32, created_by: UserId) -> Survey {
    let ward = WardNumber::new(ward).unwrap_or_else(|_| panic!("test ward should be positive"));
    let property = PropertyNumber::new(property)
        .unwrap_or_else(|_| panic!("test property should be positive"));
    Survey::new(ward, property, created_by)
}

#[derive(Default)]
struct SurveyState {
    surveys: Vec<Survey>,
    floors: HashMap<SurveyId, Vec<FloorEntry>>,
    fail_floors: bool,
}

#[derive(Default)]
pub(crate) struct FakeSurveyStore {
    state: Mutex<SurveyState>,
}

impl FakeSurveyStore {
    pub(crate) async fn insert(&self, survey: Survey) {
        self.state.lock().await.surveys.push(survey);
    }

    pub(crate) async fn set_floors(&self, survey_id: SurveyId, floors: Vec<FloorEntry>) {
        self.state.lock().await.floors.insert(survey_id, floors);
    }

    pub(crate) async fn fail_floor_queries(&self) {
        self.state.lock().await.fail_floors = true;
    }

    pub(crate) async fn artifact_key(&self, survey_id: SurveyId) -> Option<String> {
        self.state
            .lock()
            .await
            .surveys
            .iter()
            .find(|survey| survey.id == survey_id)
            .and_then(|survey| survey.artifact_key.clone())
    }
}

#[async_trait]
impl SurveyRecordStore for FakeSurveyStore {
    async fn find_survey(&self, survey_id: SurveyId) -> AppResult<Option<Survey>> {
        let state = self.state.lock().await;
        Ok(state
            .surveys
            .iter()
            .find(|survey| survey.id == survey_id)
            .cloned())
    }

    async fn list_surveys(&self, selector: &SurveySelector) -> AppResult<Vec<Survey>> {
        let state = self.state.lock().await;
        let mut surveys: Vec<Survey> = state
            .surveys
            .iter()
            .filter(|survey| selector.matches(survey))
            .cloned()
            .collect();
        surveys.sort_by_key(|survey| survey.property);
        Ok(surveys)
    }

    async fn list_floors(&self, survey_id: SurveyId) -> AppResult<Vec<FloorEntry>> {
        let state = self.state.lock().await;
        if state.fail_floors {
            return Err(AppError::Internal("floor table unavailable".to_owned()));
        }
        Ok(state.floors.get(&survey_id).cloned().unwrap_or_default())
    }

    async fn set_artifact_key(&self, survey_id: SurveyId, key: Option<String>) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if let Some(survey) = state
            .surveys
            .iter_mut()
            .find(|survey| survey.id == survey_id)
        {
            survey.artifact_key = key;
        }
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct FakeArtifactStorage {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    unreadable: Mutex<HashSet<String>>,
    fail_writes: AtomicBool,
}

impl FakeArtifactStorage {
    pub(crate) async fn put(&self, key: &str, bytes: &[u8]) {
        self.blobs.lock().await.insert(key.to_owned(), bytes.to_vec());
    }

    pub(crate) async fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.blobs.lock().await.get(key).cloned()
    }

    pub(crate) async fn make_unreadable(&self, key: &str) {
        self.unreadable.lock().await.insert(key.to_owned());
    }

    pub(crate) fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ArtifactStorage for FakeArtifactStorage {
    async fn write(&self, key: &str, bytes: &[u8]) -> AppResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Storage(format!("disk full while writing '{key}'")));
        }
        self.unreadable.lock().await.remove(key);
        self.put(key, bytes).await;
        Ok(())
    }

    async fn read(&self, key: &str) -> AppResult<Vec<u8>> {
        if self.unreadable.lock().await.contains(key) {
            return Err(AppError::Storage(format!("permission denied reading '{key}'")));
        }
        self.get(key)
            .await
            .ok_or_else(|| AppError::Storage(format!("artifact '{key}' is missing")))
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        Ok(self.blobs.lock().await.contains_key(key))
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.blobs.lock().await.remove(key);
        self.unreadable.lock().await.remove(key);
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct CountingRenderer {
    renders: AtomicUsize,
    delay: Duration,
    failing: Mutex<HashSet<SurveyId>>,
}

impl CountingRenderer {
    pub(crate) fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub(crate) async fn fail_for(&self, survey_id: SurveyId) {
        self.failing.lock().await.insert(survey_id);
    }

    pub(crate) fn render_count(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SurveyReportRenderer for CountingRenderer {
    async fn render(&self, survey: &Survey) -> AppResult<Vec<u8>> {
        let render_number = self.renders.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.failing.lock().await.contains(&survey.id) {
            return Err(AppError::Render(format!(
                "template failed for property {}",
                survey.property
            )));
        }

        Ok(format!(
            "%PDF-fake ward {} property {} render {render_number}",
            survey.ward, survey.property
        )
        .into_bytes())
    }
}

/// Treats anything starting with `%PDF` as a one-page document.
pub(crate) struct FakeCompositor;

impl DocumentCompositor for FakeCompositor {
    fn compose(&self, markup: &str) -> AppResult<Vec<u8>> {
        Ok(format!("%PDF-composed\n{markup}").into_bytes())
    }

    fn merge(&self, parts: Vec<DocumentPart>) -> AppResult<MergedDocument> {
        let mut merged = MergedDocument {
            bytes: Vec::new(),
            page_count: 0,
            merged_labels: Vec::new(),
            rejected: Vec::new(),
        };

        for part in parts {
            if !part.bytes.starts_with(b"%PDF") {
                merged.rejected.push(RejectedPart {
                    label: part.label,
                    reason: "missing PDF header".to_owned(),
                });
                continue;
            }
            if !merged.bytes.is_empty() {
                merged.bytes.push(b'|');
            }
            merged.bytes.extend_from_slice(part.bytes.as_slice());
            merged.page_count += 1;
            merged.merged_labels.push(part.label);
        }

        Ok(merged)
    }
}
