use std::fmt;

use crate::api::{AuthService, LoginRequest, RegisterRequest};
use crate::errors::ValidationError;
use crate::registration::{Credential, Navigation, RegistrationDraft};
use crate::session::SessionStore;
use crate::Result;

pub const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Clone, Default)]
pub struct SignupForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl fmt::Debug for SignupForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignupForm")
            .field("name", &self.name)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl SignupForm {
    /// All rule violations, in field order.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push(ValidationError::MissingField("name"));
        }
        errors.extend(check_email(&self.email));
        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            errors.push(ValidationError::PasswordTooShort {
                min: MIN_PASSWORD_LENGTH,
            });
        } else if self.password != self.confirm_password {
            errors.push(ValidationError::PasswordMismatch);
        }
        errors
    }
}

#[derive(Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginForm")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl LoginForm {
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors: Vec<_> = check_email(&self.email).into_iter().collect();
        if self.password.is_empty() {
            errors.push(ValidationError::MissingField("password"));
        }
        errors
    }
}

fn check_email(email: &str) -> Option<ValidationError> {
    let email = email.trim();
    if email.is_empty() {
        return Some(ValidationError::MissingField("email"));
    }
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    (!valid).then_some(ValidationError::InvalidEmail)
}

fn first_violation(errors: Vec<ValidationError>) -> Result<()> {
    match errors.into_iter().next() {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}

/// Create an account. The new session is parked in a registration draft
/// until a slug is claimed for it.
///
/// Logging in to an existing account, by contrast, signs the user in right
/// away; a slug-less account still gets a draft so the slug step can run.
pub async fn sign_up(
    auth: &dyn AuthService,
    session: &SessionStore,
    form: &SignupForm,
) -> Result<Navigation> {
    first_violation(form.validate())?;

    let request = RegisterRequest {
        name: form.name.trim().to_owned(),
        email: form.email.trim().to_owned(),
        password: form.password.clone(),
    };
    let created = auth.register(&request).await?;
    log::info!("auth: registered {}", request.email);

    let draft = RegistrationDraft::new(
        request.name,
        request.email,
        Credential::Password(request.password),
        Some(created),
    );
    continue_with(session, draft)
}

pub async fn log_in(
    auth: &dyn AuthService,
    session: &SessionStore,
    form: &LoginForm,
) -> Result<Navigation> {
    first_violation(form.validate())?;

    let request = LoginRequest {
        email: form.email.trim().to_owned(),
        password: form.password.clone(),
    };
    let signed_in = auth.login(&request).await?;
    log::info!("auth: logged in {}", request.email);
    session.login(signed_in.clone())?;

    let draft = RegistrationDraft::new(
        signed_in.user.display_name.clone(),
        request.email,
        Credential::Password(request.password),
        Some(signed_in),
    );
    continue_with(session, draft)
}

/// Finish the Google OAuth redirect with the `code` it delivered.
pub async fn google_sign_in(
    auth: &dyn AuthService,
    session: &SessionStore,
    code: &str,
) -> Result<Navigation> {
    if code.trim().is_empty() {
        return Err(ValidationError::MissingField("code").into());
    }
    let signed_in = auth.google_callback(code.trim()).await?;
    log::info!("auth: google sign-in for {}", signed_in.user.email);
    session.login(signed_in.clone())?;

    let draft = RegistrationDraft::new(
        signed_in.user.display_name.clone(),
        signed_in.user.email.clone(),
        Credential::Google,
        Some(signed_in),
    );
    continue_with(session, draft)
}

/// Users who already own a slug go straight to the dashboard; the rest
/// keep their session in a draft and claim a slug first.
fn continue_with(
    session: &SessionStore,
    draft: RegistrationDraft,
) -> Result<Navigation> {
    match draft.session.as_ref().filter(|s| s.user.slug.is_some()) {
        Some(signed_in) => {
            session.abandon_draft();
            session.login(signed_in.clone())?;
            Ok(Navigation::Dashboard)
        }
        None => {
            session.stash_draft(draft);
            Ok(Navigation::ClaimSlug)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::AuthSession;
    use crate::profile::Profile;
    use crate::testing::{sample_profile, MockBackend};
    use crate::LinkcardError;
    use rstest::rstest;

    fn signup() -> SignupForm {
        SignupForm {
            name: "Bob".to_owned(),
            email: "bob@example.com".to_owned(),
            password: "correct horse".to_owned(),
            confirm_password: "correct horse".to_owned(),
        }
    }

    fn slugless() -> AuthSession {
        AuthSession {
            token: "new".to_owned(),
            user: Profile {
                display_name: "Bob".to_owned(),
                email: "bob@example.com".to_owned(),
                ..Default::default()
            },
        }
    }

    #[rstest]
    #[case("bob@example.com", true)]
    #[case(" bob@example.com ", true)]
    #[case("bob@example", false)]
    #[case("@example.com", false)]
    #[case("bob@@example.com", false)]
    #[case("bob smith@example.com", false)]
    #[case("bob@.com", false)]
    #[case("bob.example.com", false)]
    fn email_rules(#[case] email: &str, #[case] valid: bool) {
        assert_eq!(check_email(email).is_none(), valid);
    }

    #[test]
    fn signup_form_reports_every_problem() {
        let form = SignupForm {
            name: " ".to_owned(),
            email: "nope".to_owned(),
            password: "short".to_owned(),
            confirm_password: "short".to_owned(),
        };
        assert_eq!(
            form.validate(),
            vec![
                ValidationError::MissingField("name"),
                ValidationError::InvalidEmail,
                ValidationError::PasswordTooShort { min: 8 },
            ]
        );

        let mismatch = SignupForm {
            confirm_password: "correct horse!".to_owned(),
            ..signup()
        };
        assert_eq!(mismatch.validate(), vec![ValidationError::PasswordMismatch]);
        assert!(signup().validate().is_empty());
    }

    #[test]
    fn debug_output_hides_passwords() {
        let rendered = format!("{:?} {:?}", signup(), LoginForm {
            email: "bob@example.com".to_owned(),
            password: "correct horse".to_owned(),
        });
        assert!(!rendered.contains("correct horse"));
    }

    #[tokio::test]
    async fn sign_up_parks_the_session_in_a_draft() {
        let backend = MockBackend::new();
        backend.authenticate_as(slugless());
        let session = SessionStore::in_memory(backend.clone());

        let next = sign_up(&*backend, &session, &signup()).await.unwrap();

        assert_eq!(next, Navigation::ClaimSlug);
        assert!(!session.is_authenticated());
        let draft = session.draft().unwrap();
        assert_eq!(draft.email, "bob@example.com");
        assert_eq!(draft.session, Some(slugless()));
    }

    #[tokio::test]
    async fn invalid_form_is_rejected_locally() {
        let backend = MockBackend::new();
        let session = SessionStore::in_memory(backend.clone());
        let form = SignupForm {
            email: "bob".to_owned(),
            ..signup()
        };

        let err = sign_up(&*backend, &session, &form).await.unwrap_err();
        assert!(matches!(
            err,
            LinkcardError::Validation(ValidationError::InvalidEmail)
        ));
        assert!(session.draft().is_none());
    }

    #[tokio::test]
    async fn login_with_a_slug_goes_to_the_dashboard() {
        let backend = MockBackend::new();
        backend.authenticate_as(AuthSession {
            token: "t".to_owned(),
            user: sample_profile(),
        });
        let session = SessionStore::in_memory(backend.clone());
        let form = LoginForm {
            email: "alice@example.com".to_owned(),
            password: "whatever1".to_owned(),
        };

        let next = log_in(&*backend, &session, &form).await.unwrap();

        assert_eq!(next, Navigation::Dashboard);
        assert_eq!(session.token().as_deref(), Some("t"));
        assert!(session.draft().is_none());
    }

    #[tokio::test]
    async fn google_user_without_slug_must_claim_one() {
        let backend = MockBackend::new();
        backend.authenticate_as(slugless());
        let session = SessionStore::in_memory(backend.clone());

        let next = google_sign_in(&*backend, &session, "oauth-code")
            .await
            .unwrap();

        assert_eq!(next, Navigation::ClaimSlug);
        assert_eq!(session.draft().unwrap().credential, Credential::Google);
        assert_eq!(session.token().as_deref(), Some("new"));
        assert!(google_sign_in(&*backend, &session, " ").await.is_err());
    }
}
