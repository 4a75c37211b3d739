use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::{
    domain::username::{base_candidate, highest_suffix, is_reserved, numbered_candidates, numbering_stem},
    entities::user::User,
    errors::AppError,
    repositories::user::UserRepository,
};

const BACKFILL_BATCH_SIZE: i64 = 100;

/// Claims lost to concurrent writers before `assign` gives up.
pub const MAX_CLAIM_CONFLICTS: u32 = 25;

enum Claim {
    Won(User),
    Taken,
    Lost,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct BackfillReport {
    pub assigned: usize,
    pub failed: usize,
}

/// Hands out unique usernames derived from display names.
///
/// The store's unique index is authoritative: a pre-check only skips names
/// that are obviously taken, and a conflicting claim moves on to the next
/// candidate.
pub struct UsernameGenerator<R>
where
    R: UserRepository + ?Sized,
{
    pub user_repo: Arc<R>,
}

impl<R> UsernameGenerator<R>
where
    R: UserRepository + ?Sized,
{
    pub fn new(user_repo: Arc<R>) -> Self {
        UsernameGenerator { user_repo }
    }

    /// First candidate not currently taken. Nothing is reserved.
    pub async fn suggest(&self, display_name: &str) -> Result<String, AppError> {
        let base = base_candidate(display_name);
        if self.is_free(&base).await? {
            return Ok(base);
        }

        for candidate in self.numbered(&base).await? {
            if self.is_free(&candidate).await? {
                return Ok(candidate);
            }
        }

        Err(AppError::Conflict("No free username could be derived from this name".into()))
    }

    /// Gives `user` a username unless it already has one.
    ///
    /// Tries the base handle, then `{base}-{n}` counting up from the highest
    /// suffix already in use.
    pub async fn assign(&self, user: &User) -> Result<User, AppError> {
        if user.username.is_some() {
            return Ok(user.clone());
        }

        let base = base_candidate(&user.display_name);
        let mut lost = 0;

        match self.try_claim(user, &base).await? {
            Claim::Won(updated) => return Ok(updated),
            Claim::Lost => lost += 1,
            Claim::Taken => {}
        }

        for candidate in self.numbered(&base).await? {
            match self.try_claim(user, &candidate).await? {
                Claim::Won(updated) => return Ok(updated),
                Claim::Taken => {}
                Claim::Lost => {
                    lost += 1;
                    if lost >= MAX_CLAIM_CONFLICTS {
                        break;
                    }
                }
            }
        }

        tracing::warn!(user_id = %user.id, lost, "Gave up assigning a username");
        Err(AppError::Conflict("No free username could be derived from this name".into()))
    }

    async fn is_free(&self, candidate: &str) -> Result<bool, AppError> {
        Ok(!is_reserved(candidate) && !self.user_repo.username_exists(candidate).await?)
    }

    async fn numbered(&self, base: &str) -> Result<impl Iterator<Item = String>, AppError> {
        let taken = self.user_repo.numbered_usernames(&numbering_stem(base)).await?;
        let highest = highest_suffix(base, taken.iter().map(String::as_str));

        Ok(numbered_candidates(base, highest))
    }

    async fn try_claim(&self, user: &User, candidate: &str) -> Result<Claim, AppError> {
        if !self.is_free(candidate).await? {
            return Ok(Claim::Taken);
        }

        match self.user_repo.claim_username(&user.id, candidate).await {
            Ok(updated) => {
                tracing::info!(user_id = %user.id, username = %candidate, "Username assigned");
                Ok(Claim::Won(updated))
            }
            Err(AppError::Conflict(_)) => {
                tracing::debug!(username = %candidate, "Username claimed concurrently, trying next");
                Ok(Claim::Lost)
            }
            Err(e) => Err(e),
        }
    }

    /// Assigns usernames to every user that still lacks one.
    pub async fn backfill(&self) -> Result<BackfillReport, AppError> {
        let mut report = BackfillReport::default();
        let mut failed: HashSet<Uuid> = HashSet::new();

        loop {
            let pending = self.user_repo.users_without_username(BACKFILL_BATCH_SIZE + failed.len() as i64).await?;
            let batch: Vec<User> = pending.into_iter().filter(|u| !failed.contains(&u.id)).collect();

            if batch.is_empty() {
                break;
            }

            for user in batch {
                match self.assign(&user).await {
                    Ok(_) => report.assigned += 1,
                    // named concurrently by another run
                    Err(AppError::InvalidInput(_)) => {}
                    Err(AppError::Conflict(msg)) => {
                        tracing::warn!(user_id = %user.id, "Skipping user: {}", msg);
                        failed.insert(user.id);
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        report.failed = failed.len();
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mockall::predicate::eq;
    use mockall::Sequence;

    use crate::repositories::user::MockUserRepository;

    fn user(display_name: &str, username: Option<&str>) -> User {
        User {
            id: Uuid::new_v4(),
            email: "someone@example.com".into(),
            username: username.map(str::to_string),
            display_name: display_name.into(),
            password_hash: String::new(),
            is_admin: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[actix_rt::test]
    async fn suggestion_skips_taken_names() {
        let mut repo = MockUserRepository::new();
        repo.expect_username_exists()
            .with(eq("grace-hopper"))
            .returning(|_| Ok(true));
        repo.expect_numbered_usernames()
            .with(eq("grace-hopper"))
            .returning(|_| Ok(vec!["grace-hopper-2".into(), "grace-hopper-3".into()]));
        repo.expect_username_exists()
            .with(eq("grace-hopper-4"))
            .returning(|_| Ok(false));

        let generator = UsernameGenerator::new(Arc::new(repo));
        assert_eq!(generator.suggest("Grace Hopper").await.unwrap(), "grace-hopper-4");
    }

    #[actix_rt::test]
    async fn lost_race_moves_to_next_candidate() {
        let target = user("Grace Hopper", None);
        let mut seq = Sequence::new();

        let mut repo = MockUserRepository::new();
        repo.expect_username_exists().returning(|_| Ok(false));
        repo.expect_numbered_usernames().returning(|_| Ok(Vec::new()));
        repo.expect_claim_username()
            .with(eq(target.id), eq("grace-hopper"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(AppError::Conflict("taken".into())));
        repo.expect_claim_username()
            .with(eq(target.id), eq("grace-hopper-2"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|id, name| {
                let mut claimed = user("Grace Hopper", Some(name));
                claimed.id = *id;
                Ok(claimed)
            });

        let generator = UsernameGenerator::new(Arc::new(repo));
        let assigned = generator.assign(&target).await.unwrap();

        assert_eq!(assigned.username.as_deref(), Some("grace-hopper-2"));
        assert_eq!(assigned.id, target.id);
    }

    #[actix_rt::test]
    async fn users_with_a_username_are_left_alone() {
        let mut repo = MockUserRepository::new();
        repo.expect_claim_username().never();

        let generator = UsernameGenerator::new(Arc::new(repo));
        let existing = user("Ada", Some("ada"));
        assert_eq!(generator.assign(&existing).await.unwrap().username.as_deref(), Some("ada"));
    }

    #[actix_rt::test]
    async fn store_failures_are_not_retried() {
        let mut repo = MockUserRepository::new();
        repo.expect_username_exists().returning(|_| Ok(false));
        repo.expect_claim_username()
            .times(1)
            .returning(|_, _| Err(AppError::InternalError("connection reset".into())));

        let generator = UsernameGenerator::new(Arc::new(repo));
        assert!(matches!(
            generator.assign(&user("Ada", None)).await,
            Err(AppError::InternalError(_))
        ));
    }

    #[actix_rt::test]
    async fn reserved_route_words_are_skipped() {
        let mut repo = MockUserRepository::new();
        repo.expect_username_exists()
            .with(eq("me"))
            .never();
        repo.expect_numbered_usernames().returning(|_| Ok(Vec::new()));
        repo.expect_username_exists()
            .with(eq("me-2"))
            .returning(|_| Ok(false));

        let generator = UsernameGenerator::new(Arc::new(repo));
        assert_eq!(generator.suggest("Me").await.unwrap(), "me-2");
    }

    #[actix_rt::test]
    async fn endless_conflicts_stop_after_the_retry_cap() {
        let mut repo = MockUserRepository::new();
        repo.expect_username_exists().returning(|_| Ok(false));
        repo.expect_numbered_usernames().returning(|_| Ok(Vec::new()));
        repo.expect_claim_username()
            .times(MAX_CLAIM_CONFLICTS as usize)
            .returning(|_, _| Err(AppError::Conflict("taken".into())));

        let generator = UsernameGenerator::new(Arc::new(repo));
        assert!(matches!(
            generator.assign(&user("Ada", None)).await,
            Err(AppError::Conflict(_))
        ));
    }
}
