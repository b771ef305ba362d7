//! Account service — registration, login form checks, confirmation resend,
//! password and email changes.
//!
//! Every operation validates its input first and only then calls the auth
//! provider. Provider failures are returned unchanged so their message can
//! be shown verbatim.

use serde::Deserialize;

use super::validate::{FieldErrors, MIN_PASSWORD_LEN, check_email, non_empty};
use crate::baas::types::{AuthProvider, AuthUser, BaasError, OtpType, UserAttributes};

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("validation failed")]
    Validation(FieldErrors),
    #[error(transparent)]
    Provider(#[from] BaasError),
}

fn fail_on(errors: FieldErrors) -> Result<(), AccountError> {
    if errors.is_empty() { Ok(()) } else { Err(AccountError::Validation(errors)) }
}

// =============================================================================
// REGISTRATION
// =============================================================================

#[derive(Deserialize)]
pub struct RegisterForm {
    pub email: Option<String>,
    pub password: Option<String>,
    pub confirm_password: Option<String>,
}

impl RegisterForm {
    /// # Errors
    ///
    /// Returns the field-level problems, keyed `email`, `password` and
    /// `confirm_password`.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        check_email(&mut errors, self.email.as_deref());
        let password = self.password.as_deref().unwrap_or_default();
        if password.is_empty() {
            errors.insert("password", "Password is required".into());
        } else if password.chars().count() < MIN_PASSWORD_LEN {
            errors.insert("password", "Password must be at least 6 characters".into());
        }
        if self.confirm_password.as_deref().unwrap_or_default() != password {
            errors.insert("confirm_password", "Passwords do not match".into());
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Create the account. The confirmation email links back to `redirect_to`.
///
/// # Errors
///
/// `Validation` before any provider call, otherwise the provider's error.
pub async fn register(auth: &dyn AuthProvider, form: &RegisterForm, redirect_to: &str) -> Result<AuthUser, AccountError> {
    form.validate().map_err(AccountError::Validation)?;
    let email = non_empty(form.email.as_deref()).unwrap_or_default();
    let password = form.password.as_deref().unwrap_or_default();
    let user = auth.sign_up(email, password, redirect_to).await?;
    tracing::info!(user_id = %user.id, "account registered; confirmation pending");
    Ok(user)
}

// =============================================================================
// LOGIN
// =============================================================================

#[derive(Deserialize)]
pub struct LoginForm {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl LoginForm {
    /// Trimmed email and raw password, or the missing fields.
    ///
    /// # Errors
    ///
    /// Returns `Email is required` / `Password is required`.
    pub fn credentials(&self) -> Result<(&str, &str), FieldErrors> {
        let mut errors = FieldErrors::new();
        let email = non_empty(self.email.as_deref());
        if email.is_none() {
            errors.insert("email", "Email is required".into());
        }
        let password = self.password.as_deref().filter(|p| !p.is_empty());
        if password.is_none() {
            errors.insert("password", "Password is required".into());
        }
        match (email, password) {
            (Some(email), Some(password)) => Ok((email, password)),
            _ => Err(errors),
        }
    }
}

// =============================================================================
// CONFIRMATION RESEND
// =============================================================================

/// Resend the sign-up confirmation to `requested`, falling back to
/// `session_email`. Returns the address used.
///
/// # Errors
///
/// `Validation` when neither address is usable.
pub async fn resend_confirmation(
    auth: &dyn AuthProvider,
    requested: Option<&str>,
    session_email: Option<&str>,
) -> Result<String, AccountError> {
    let Some(email) = non_empty(requested).or_else(|| non_empty(session_email)) else {
        let mut errors = FieldErrors::new();
        errors.insert("email", "Email is required".into());
        return Err(AccountError::Validation(errors));
    };
    let mut errors = FieldErrors::new();
    check_email(&mut errors, Some(email));
    fail_on(errors)?;

    auth.resend(OtpType::Signup, email).await?;
    tracing::info!("confirmation email resent");
    Ok(email.to_owned())
}

// =============================================================================
// SETTINGS
// =============================================================================

#[derive(Deserialize)]
pub struct PasswordChange {
    pub new_password: Option<String>,
    pub confirm_password: Option<String>,
}

impl PasswordChange {
    /// # Errors
    ///
    /// Mismatch is reported before length.
    pub fn validate(&self) -> Result<&str, FieldErrors> {
        let mut errors = FieldErrors::new();
        let new_password = self.new_password.as_deref().unwrap_or_default();
        if self.confirm_password.as_deref().unwrap_or_default() != new_password {
            errors.insert("confirm_password", "New passwords do not match.".into());
        } else if new_password.chars().count() < MIN_PASSWORD_LEN {
            errors.insert("new_password", "New password must be at least 6 characters.".into());
        }
        if errors.is_empty() { Ok(new_password) } else { Err(errors) }
    }
}

/// # Errors
///
/// `Validation` before any provider call, otherwise the provider's error.
pub async fn change_password(
    auth: &dyn AuthProvider,
    access_token: &str,
    change: &PasswordChange,
) -> Result<(), AccountError> {
    let password = change.validate().map_err(AccountError::Validation)?;
    let attrs = UserAttributes { password: Some(password.to_owned()), ..UserAttributes::default() };
    let user = auth.update_user(access_token, &attrs).await?;
    tracing::info!(user_id = %user.id, "password changed");
    Ok(())
}

/// Ask the provider to move the account to `new_email`. Returns the
/// normalized address for mirroring into the profile.
///
/// # Errors
///
/// `Validation` before any provider call, otherwise the provider's error.
pub async fn change_email(auth: &dyn AuthProvider, access_token: &str, new_email: Option<&str>) -> Result<String, AccountError> {
    let mut errors = FieldErrors::new();
    check_email(&mut errors, new_email);
    fail_on(errors)?;
    let email = non_empty(new_email).unwrap_or_default().to_owned();

    let attrs = UserAttributes { email: Some(email.clone()), ..UserAttributes::default() };
    let user = auth.update_user(access_token, &attrs).await?;
    tracing::info!(user_id = %user.id, "email change requested");
    Ok(email)
}

#[cfg(test)]
#[path = "account_test.rs"]
mod tests;
