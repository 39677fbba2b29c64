//! Handler fixture over the in-memory adapters.

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use wardbook_application::{AdminSeed, NewUserAccount, PasswordHasher, UserAccount};
use wardbook_core::UserIdentity;
use wardbook_domain::{EmailAddress, PropertyNumber, Role, Survey, UserId, WardNumber};
use wardbook_infrastructure::{
    Argon2PasswordHasher, FilesystemArtifactStorage, HandlebarsTemplateEngine,
    InMemorySecurityRepository, InMemorySurveyRepository, LopdfDocumentCompositor,
};

use crate::state::{AppState, ReportOptions, ServicePorts};

pub(crate) const ADMIN_EMAIL: &str = "admin@dehu.example";
pub(crate) const ADMIN_PASSWORD: &str = "admin-password";
pub(crate) const SURVEYOR_PASSWORD: &str = "surveyor-password";

pub(crate) struct Fixture {
    pub state: AppState,
    pub ports: ServicePorts,
    pub surveys: Arc<InMemorySurveyRepository>,
    pub storage_root: TempDir,
    pub admin: UserIdentity,
}

impl Fixture {
    pub(crate) async fn new() -> Self {
        let Ok(storage_root) = tempfile::tempdir() else {
            panic!("temporary artifact root should be created");
        };
        let Ok(storage) = FilesystemArtifactStorage::new(storage_root.path()).await else {
            panic!("artifact storage should open");
        };
        let Ok(templates) = HandlebarsTemplateEngine::new() else {
            panic!("bundled templates should register");
        };

        let security = Arc::new(InMemorySecurityRepository::new());
        let surveys = Arc::new(InMemorySurveyRepository::new());
        let ports = ServicePorts {
            authorization: security.clone(),
            roles: security.clone(),
            users: security,
            password_hasher: Arc::new(Argon2PasswordHasher::new()),
            records: surveys.clone(),
            storage: Arc::new(storage),
            templates: Arc::new(templates),
            compositor: Arc::new(LopdfDocumentCompositor::new()),
        };

        let seed = AdminSeed {
            email: ADMIN_EMAIL.to_owned(),
            password: ADMIN_PASSWORD.to_owned(),
            display_name: "Super Admin".to_owned(),
        };
        if ports.bootstrap_service().ensure_defaults(&seed).await.is_err() {
            panic!("bootstrap should seed the admin");
        }

        let options = ReportOptions {
            asset_base_url: "http://localhost:3001/".to_owned(),
            render_timeout: Duration::from_secs(30),
            bulk_concurrency: 2,
        };
        let state = AppState::from_ports(&ports, &options, "http://localhost:3000".to_owned());
        let Ok(admin) = state.user_service.login(ADMIN_EMAIL, ADMIN_PASSWORD).await else {
            panic!("seeded admin should log in");
        };

        Self {
            state,
            ports,
            surveys,
            storage_root,
            admin,
        }
    }

    /// Creates a role with the given permission tags.
    pub(crate) async fn role(&self, name: &str, permissions: &[&str]) -> Role {
        let Ok(role) = self
            .state
            .role_admin_service
            .create_role(&self.admin, name)
            .await
        else {
            panic!("role '{name}' should be created");
        };
        let permissions: Vec<String> = permissions.iter().map(|tag| (*tag).to_owned()).collect();
        if self
            .state
            .role_admin_service
            .replace_role_permissions(&self.admin, role.id, &permissions)
            .await
            .is_err()
        {
            panic!("permissions of '{name}' should be stored");
        }

        role
    }

    /// Creates a user in the role and returns its account and session identity.
    pub(crate) async fn user(&self, email: &str, role: &Role) -> (UserAccount, UserIdentity) {
        let (Ok(address), Ok(password_hash)) = (
            EmailAddress::new(email),
            self.ports.password_hasher.hash_password(SURVEYOR_PASSWORD),
        ) else {
            panic!("test account '{email}' should be valid");
        };
        let Ok(account) = self
            .ports
            .users
            .create_user(NewUserAccount {
                email: address,
                display_name: email.to_owned(),
                role_id: role.id,
                password_hash,
            })
            .await
        else {
            panic!("account '{email}' should be created");
        };
        let Ok(identity) = self.state.user_service.login(email, SURVEYOR_PASSWORD).await else {
            panic!("account '{email}' should log in");
        };

        (account, identity)
    }

    /// Stores a survey owned by `created_by`.
    pub(crate) async fn survey(&self, ward: u32, property: u32, created_by: UserId) -> Survey {
        let (Ok(ward), Ok(property)) = (WardNumber::new(ward), PropertyNumber::new(property)) else {
            panic!("test numbers should be positive");
        };
        let mut survey = Survey::new(ward, property, created_by);
        survey.property_owner_name = Some(format!("Owner {property}"));
        survey.total_tax_paise = 125_050;
        if self.surveys.insert_survey(survey.clone()).await.is_err() {
            panic!("survey should be stored");
        }

        survey
    }
}
