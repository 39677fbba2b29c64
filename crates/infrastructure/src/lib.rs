//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod argon2_password_hasher;
mod filesystem_artifact_storage;
mod handlebars_template_engine;
mod in_memory_security_repository;
mod in_memory_survey_repository;
mod lopdf_document_compositor;
mod postgres_authorization_repository;
mod postgres_role_repository;
mod postgres_survey_repository;
mod postgres_user_repository;

pub use argon2_password_hasher::Argon2PasswordHasher;
pub use filesystem_artifact_storage::FilesystemArtifactStorage;
pub use handlebars_template_engine::HandlebarsTemplateEngine;
pub use in_memory_security_repository::InMemorySecurityRepository;
pub use in_memory_survey_repository::InMemorySurveyRepository;
pub use lopdf_document_compositor::LopdfDocumentCompositor;
pub use postgres_authorization_repository::PostgresAuthorizationRepository;
pub use postgres_role_repository::PostgresRoleRepository;
pub use postgres_survey_repository::PostgresSurveyRepository;
pub use postgres_user_repository::PostgresUserRepository;
