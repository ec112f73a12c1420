pub mod credentials;
pub mod registration;

pub use credentials::PostgresCredentialRepository;
pub use registration::PostgresRegistrationRepository;
