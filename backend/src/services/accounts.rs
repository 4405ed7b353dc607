//! Student account registration and program selection.

use log::info;
use sha2::{Digest, Sha256};

use crate::db::repository::{ErrorContext, FullRepository, RepositoryError, RepositoryResult};
use crate::models::{Account, NewAccount};

const DIGEST_SEPARATOR: char = '$';

fn salted_sha256(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Digest a password with a fresh random salt, as `salt$hex`.
pub fn hash_password(password: &str) -> String {
    let salt = uuid::Uuid::new_v4().simple().to_string();
    format!("{}{}{}", salt, DIGEST_SEPARATOR, salted_sha256(&salt, password))
}

/// Check a password against a digest produced by [`hash_password`].
#[cfg(test)]
fn verify_password(digest: &str, password: &str) -> bool {
    match digest.split_once(DIGEST_SEPARATOR) {
        Some((salt, expected)) => salted_sha256(salt, password) == expected,
        None => false,
    }
}

/// Register a new account.
///
/// # Returns
/// * `Ok(true)` - The account was created
/// * `Ok(false)` - The username is already taken
/// * `Err(RepositoryError::ValidationError)` - If the username is empty
pub async fn register_account<R: FullRepository + ?Sized>(
    repo: &R,
    username: &str,
    email: &str,
    password: &str,
) -> RepositoryResult<bool> {
    let username = username.trim();
    if username.is_empty() {
        return Err(RepositoryError::validation_with_context(
            "Username must not be empty",
            ErrorContext::new("register_account").with_entity("account"),
        ));
    }

    let account = NewAccount {
        username: username.to_string(),
        email: email.trim().to_string(),
        password_digest: hash_password(password),
    };

    match repo.create_account(&account).await {
        Ok(created) => {
            info!("Registered account {} ({})", created.username, created.account_id);
            Ok(true)
        }
        Err(e) if e.is_conflict() => {
            info!("Username {} is already taken", username);
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

pub async fn get_account<R: FullRepository + ?Sized>(
    repo: &R,
    username: &str,
) -> RepositoryResult<Account> {
    repo.get_account(username).await
}

/// Set the account's study program. The code is matched upper-cased.
pub async fn select_program<R: FullRepository + ?Sized>(
    repo: &R,
    username: &str,
    program_code: &str,
) -> RepositoryResult<Account> {
    let program_code = program_code.trim().to_uppercase();
    let account = repo.set_account_program(username, &program_code).await?;
    info!("Account {} selected program {}", username, program_code);
    Ok(account)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::LocalRepository;
    use crate::db::repository::CatalogRepository;
    use crate::models::Program;

    #[tokio::test]
    async fn test_register_twice_returns_false() {
        let repo = LocalRepository::new();
        assert!(register_account(&repo, "student", "s@example.edu", "hunter2")
            .await
            .unwrap());
        assert!(!register_account(&repo, "student", "other@example.edu", "pw")
            .await
            .unwrap());
        assert_eq!(get_account(&repo, "student").await.unwrap().email, "s@example.edu");
    }

    #[tokio::test]
    async fn test_password_is_not_stored_plain() {
        let repo = LocalRepository::new();
        register_account(&repo, "student", "s@example.edu", "hunter2")
            .await
            .unwrap();

        let digest = repo.password_digest("student").unwrap();
        assert!(!digest.contains("hunter2"));
        assert!(verify_password(&digest, "hunter2"));
        assert!(!verify_password(&digest, "hunter3"));
    }

    #[tokio::test]
    async fn test_empty_username_is_rejected() {
        let repo = LocalRepository::new();
        let err = register_account(&repo, "  ", "s@example.edu", "pw")
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::ValidationError { .. }));
    }

    #[tokio::test]
    async fn test_select_program_upper_cases_code() {
        let repo = LocalRepository::new();
        repo.upsert_programs(&[Program {
            code: "6CMJU".to_string(),
            name: "Computer Science".to_string(),
        }])
        .await
        .unwrap();
        register_account(&repo, "student", "s@example.edu", "pw")
            .await
            .unwrap();

        let account = select_program(&repo, "student", "6cmju").await.unwrap();
        assert_eq!(account.program_code.as_deref(), Some("6CMJU"));

        let err = select_program(&repo, "student", "6XXXX").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_salts_differ() {
        let a = hash_password("pw");
        let b = hash_password("pw");
        assert_ne!(a, b);
        assert!(verify_password(&a, "pw") && verify_password(&b, "pw"));
        assert!(!verify_password("no-separator", "pw"));
    }
}
