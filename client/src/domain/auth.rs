//! Authentication form primitives: sign-in, sign-up, and reset inputs.
//!
//! Validation runs before any port is touched, so a rejected form never
//! produces a network call. Messages match what the login and registration
//! forms display inline.

use std::fmt;

use zeroize::Zeroizing;

use crate::domain::DomainError;

/// Minimum accepted password length at registration.
pub const PASSWORD_MIN_LEN: usize = 6;

/// Client-side validation failures for the auth forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialsValidationError {
    /// A required field was left blank.
    MissingFields,
    /// Password and confirmation differ.
    PasswordMismatch,
    /// Password shorter than [`PASSWORD_MIN_LEN`].
    PasswordTooShort { min: usize },
    /// Password reset was requested without an email.
    MissingResetEmail,
}

impl fmt::Display for CredentialsValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingFields => write!(f, "Por favor, completa todos los campos"),
            Self::PasswordMismatch => write!(f, "Las contraseñas no coinciden"),
            Self::PasswordTooShort { min } => {
                write!(f, "La contraseña debe tener al menos {min} caracteres")
            }
            Self::MissingResetEmail => write!(
                f,
                "Por favor, ingresa tu email para restablecer la contraseña"
            ),
        }
    }
}

impl std::error::Error for CredentialsValidationError {}

/// Account email as typed by the user, trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email(String);

impl Email {
    /// Parse a reset-form email.
    pub fn for_reset(raw: &str) -> Result<Self, CredentialsValidationError> {
        Self::parse(raw).ok_or(CredentialsValidationError::MissingResetEmail)
    }

    fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then(|| Self(trimmed.to_owned()))
    }

    /// Borrow the email string.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validated sign-in form.
///
/// ## Invariants
/// - `email` is trimmed and non-empty.
/// - `password` is non-empty and keeps caller-provided whitespace.
///
/// # Examples
/// ```
/// use storefront::domain::SignInCredentials;
///
/// let creds = SignInCredentials::try_from_parts(" a@b.com ", "secret1").unwrap();
/// assert_eq!(creds.email().as_str(), "a@b.com");
/// assert_eq!(creds.password(), "secret1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInCredentials {
    email: Email,
    password: Zeroizing<String>,
}

impl SignInCredentials {
    /// Construct credentials from raw form inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, CredentialsValidationError> {
        let Some(email) = Email::parse(email) else {
            return Err(CredentialsValidationError::MissingFields);
        };
        if password.is_empty() {
            return Err(CredentialsValidationError::MissingFields);
        }
        Ok(Self {
            email,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Account email.
    pub fn email(&self) -> &Email {
        &self.email
    }

    /// Password string provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Validated registration form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpCredentials {
    email: Email,
    password: Zeroizing<String>,
}

impl SignUpCredentials {
    /// Construct registration credentials, checking the confirmation field.
    ///
    /// Checks run in form order: blanks, then mismatch, then length.
    pub fn try_from_parts(
        email: &str,
        password: &str,
        confirmation: &str,
    ) -> Result<Self, CredentialsValidationError> {
        let email = Email::parse(email);
        let (Some(email), false, false) = (email, password.is_empty(), confirmation.is_empty())
        else {
            return Err(CredentialsValidationError::MissingFields);
        };
        if password != confirmation {
            return Err(CredentialsValidationError::PasswordMismatch);
        }
        if password.chars().count() < PASSWORD_MIN_LEN {
            return Err(CredentialsValidationError::PasswordTooShort {
                min: PASSWORD_MIN_LEN,
            });
        }
        Ok(Self {
            email,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Account email.
    pub fn email(&self) -> &Email {
        &self.email
    }

    /// Chosen password.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Which form produced an [`AuthFailure`]; picks the generic fallback text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthAction {
    /// Login form.
    SignIn,
    /// Registration form.
    SignUp,
    /// Sidebar sign-out.
    SignOut,
    /// "Forgot password" link.
    ResetPassword,
}

impl AuthAction {
    fn fallback_message(self) -> &'static str {
        match self {
            Self::SignIn => "Error al iniciar sesión",
            Self::SignUp => "Error al crear la cuenta",
            Self::SignOut => "Error al cerrar sesión",
            Self::ResetPassword => "Error al enviar email de restablecimiento",
        }
    }
}

/// Classified failure returned by the session store to the calling form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthFailure {
    /// Rejected locally; no request was made.
    #[error("{0}")]
    Validation(#[from] CredentialsValidationError),
    /// Email/password pair was refused.
    #[error("invalid login credentials")]
    InvalidCredentials,
    /// The account exists but the email was never confirmed.
    #[error("email not confirmed")]
    EmailNotConfirmed,
    /// Anything else the service or network reported.
    #[error("{action:?} failed: {message}")]
    Service { action: AuthAction, message: String },
}

impl AuthFailure {
    /// Build a service failure for `action`.
    pub fn service(action: AuthAction, message: impl Into<String>) -> Self {
        Self::Service {
            action,
            message: message.into(),
        }
    }

    /// Message the originating form displays inline.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(err) => err.to_string(),
            Self::InvalidCredentials => {
                "Credenciales inválidas. Verifica tu email y contraseña.".to_owned()
            }
            Self::EmailNotConfirmed => {
                "Debes confirmar tu email antes de iniciar sesión.".to_owned()
            }
            // The reset form never echoes service details.
            Self::Service {
                action: AuthAction::ResetPassword,
                ..
            } => AuthAction::ResetPassword.fallback_message().to_owned(),
            Self::Service { action, message } => {
                if message.trim().is_empty() {
                    action.fallback_message().to_owned()
                } else {
                    message.clone()
                }
            }
        }
    }
}

impl From<AuthFailure> for DomainError {
    fn from(value: AuthFailure) -> Self {
        let message = value.user_message();
        match value {
            AuthFailure::Validation(_) => Self::validation(message),
            AuthFailure::InvalidCredentials | AuthFailure::EmailNotConfirmed => {
                Self::authentication(message)
            }
            AuthFailure::Service { .. } => Self::service(message),
        }
    }
}
