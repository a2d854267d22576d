//! User repository with transactional email uniqueness.

use std::sync::Arc;

use microposts_core::model::User;
use microposts_core::storage::{
    Condition, Entity, RepositoryError, Result, TableStore, UniqueShadow, USER_EMAIL,
};

use super::EntityRepository;
use crate::storage::uniqueness::UniquenessGuard;

const EMAIL_FIELD: &str = "email";

/// Users, each owning a unique email address.
///
/// Every write goes through a transaction that also claims the email's shadow
/// row. A scan for another owner runs first and fails fast, but only the
/// transaction decides.
#[derive(Clone)]
pub struct UserRepository {
    entities: EntityRepository<User>,
    guard: UniquenessGuard,
}

impl UserRepository {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self {
            guard: UniquenessGuard::new(store.clone(), EMAIL_FIELD),
            entities: EntityRepository::new(store),
        }
    }

    pub async fn get(&self, id: u64) -> Result<Option<User>> {
        self.entities.get(id).await
    }

    pub async fn list(&self) -> Result<Vec<User>> {
        self.entities.list().await
    }

    /// The user currently holding `email`, if any.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let mut found = self
            .entities
            .list_where(Some(Condition::equals(USER_EMAIL, email)))
            .await?;
        Ok(found.pop())
    }

    /// Creates a new user with a fresh id.
    pub async fn create(&self, user: &User) -> Result<User> {
        self.ensure_email_available(&user.email, None).await?;

        let write = self.entities.prepare(user).await?;
        let id = write.entity.id();
        let shadow = Self::shadow(&user.email, id);
        let created = self.guard.reserve_and_write(write, shadow, None).await?;

        tracing::info!(user_id = id, "Created user");
        tracing::debug!(user_id = id, email = %created.email, "Reserved email");
        Ok(created)
    }

    /// Reads user `id`, applies `change` and saves it at the version read.
    pub async fn update_with(
        &self,
        id: u64,
        change: impl FnOnce(&mut User) + Send,
    ) -> Result<User> {
        let mut user = self.entities.require(id).await?;
        change(&mut user);
        self.save(&user).await
    }

    /// Creates unsaved users and updates persisted ones, moving the email
    /// reservation along when the address changed.
    pub async fn save(&self, user: &User) -> Result<User> {
        if user.version().is_none() {
            return self.create(user).await;
        }

        let id = user.id();
        self.ensure_email_available(&user.email, Some(id)).await?;

        let stored = self.entities.require(id).await?;
        let released = Self::shadow(&stored.email, id);

        let write = self.entities.prepare(user).await?;
        let shadow = Self::shadow(&user.email, id);
        let updated = self
            .guard
            .reserve_and_write(write, shadow, Some(released))
            .await?;

        tracing::info!(
            user_id = id,
            version = ?updated.version(),
            email_changed = stored.email != updated.email,
            "Updated user"
        );
        Ok(updated)
    }

    /// Deletes the user and releases its email. Missing users are a no-op.
    ///
    /// Fails with `StaleVersion` when the user changed after it was read.
    pub async fn delete(&self, id: u64) -> Result<()> {
        let Some(user) = self.entities.get(id).await? else {
            return Ok(());
        };

        self.guard
            .release_and_delete(&user, Self::shadow(&user.email, id))
            .await?;

        tracing::info!(user_id = id, "Deleted user");
        Ok(())
    }

    /// Advisory check that no other user holds `email`.
    async fn ensure_email_available(&self, email: &str, owner: Option<u64>) -> Result<()> {
        match self.find_by_email(email).await? {
            Some(holder) if Some(holder.id()) != owner => {
                Err(RepositoryError::UniquenessConflict {
                    field: EMAIL_FIELD,
                    value: email.to_string(),
                })
            }
            _ => Ok(()),
        }
    }

    fn shadow(email: &str, owner: u64) -> UniqueShadow {
        UniqueShadow::new(email, User::ENTITY_NAME, owner)
    }
}

#[cfg(test)]
mod tests {
    use microposts_core::model::RecordState;
    use microposts_core::storage::keys::{shadow_key, SORT_KEY};
    use microposts_core::storage::{SHADOW_EXISTS, SHADOW_OWNER};

    use super::*;
    use crate::storage::inmemory::InMemoryStore;
    use crate::storage::testing::FailingStore;

    fn setup() -> (Arc<InMemoryStore>, UserRepository) {
        let store = Arc::new(InMemoryStore::new());
        let repo = UserRepository::new(store.clone());
        (store, repo)
    }

    /// Every email shadow belongs to an existing user holding that email, and
    /// every user holds exactly one shadow.
    async fn assert_emails_consistent(store: &InMemoryStore, repo: &UserRepository) {
        let users = repo.list().await.unwrap();
        let shadows = store
            .scan(
                &Condition::equals(SORT_KEY, User::ENTITY_NAME)
                    .and(Condition::attribute_exists(SHADOW_EXISTS)),
            )
            .await
            .unwrap();

        for row in &shadows {
            let owner = row.get_number(SHADOW_OWNER).unwrap();
            let user = users
                .iter()
                .find(|user| user.id() == owner)
                .unwrap_or_else(|| panic!("shadow {} has no owner row", row.key));
            assert_eq!(user.email, row.key.partition);
        }
        assert_eq!(shadows.len(), users.len());
    }

    fn email_conflict(email: &str) -> RepositoryError {
        RepositoryError::UniquenessConflict {
            field: "email",
            value: email.to_string(),
        }
    }

    // ==================== Create Tests ====================

    #[tokio::test]
    async fn test_create_user() {
        let (store, repo) = setup();

        let user = repo.create(&User::new("A", "a@x.com")).await.unwrap();

        assert_eq!(user.id(), 1);
        assert_eq!(user.meta.state, RecordState::Persisted { version: 1 });
        assert!(store
            .get_item(&shadow_key("a@x.com", "User"))
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let (_store, repo) = setup();
        repo.create(&User::new("A", "a@x.com")).await.unwrap();

        let result = repo.create(&User::new("B", "a@x.com")).await;

        assert_eq!(result.unwrap_err(), email_conflict("a@x.com"));
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_shadow_rejects_when_precheck_misses() {
        let (store, repo) = setup();
        // A shadow without a visible owner row, as left by a writer whose
        // entity is not yet visible to the scan.
        store
            .put_item(microposts_core::storage::ConditionalPut::unconditional(
                UniqueShadow::new("a@x.com", "User", 99).to_record(),
            ))
            .await
            .unwrap();

        let result = repo.create(&User::new("A", "a@x.com")).await;

        assert_eq!(result.unwrap_err(), email_conflict("a@x.com"));
        assert!(repo.get(1).await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_creates_with_same_email() {
        let (_store, repo) = setup();

        let handles: Vec<_> = (0..10)
            .map(|i| {
                let repo = repo.clone();
                tokio::spawn(async move {
                    repo.create(&User::new(format!("U{i}"), "same@x.com")).await
                })
            })
            .collect();

        let mut wins = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => wins += 1,
                Err(RepositoryError::UniquenessConflict { .. }) => {}
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }

        assert_eq!(wins, 1);
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    // ==================== Update Tests ====================

    #[tokio::test]
    async fn test_update_keeping_email() {
        let (_store, repo) = setup();
        let user = repo.create(&User::new("A", "a@x.com")).await.unwrap();

        let updated = repo
            .update_with(user.id(), |u| u.name = "A2".to_string())
            .await
            .unwrap();

        assert_eq!(updated.version(), Some(2));
        assert_eq!(updated.name, "A2");
        assert_eq!(updated.email, "a@x.com");
    }

    #[tokio::test]
    async fn test_update_moves_email_reservation() {
        let (store, repo) = setup();
        let user = repo.create(&User::new("A", "a@x.com")).await.unwrap();

        repo.update_with(user.id(), |u| u.email = "b@x.com".to_string())
            .await
            .unwrap();

        assert!(store
            .get_item(&shadow_key("a@x.com", "User"))
            .await
            .unwrap()
            .is_none());
        assert_eq!(
            repo.find_by_email("b@x.com").await.unwrap().map(|u| u.id()),
            Some(user.id())
        );

        // The old address can be claimed again.
        repo.create(&User::new("B", "a@x.com")).await.unwrap();
    }

    #[tokio::test]
    async fn test_update_to_taken_email_is_rejected() {
        let (_store, repo) = setup();
        let a = repo.create(&User::new("A", "a@x.com")).await.unwrap();
        repo.create(&User::new("B", "b@x.com")).await.unwrap();

        let result = repo
            .update_with(a.id(), |u| u.email = "b@x.com".to_string())
            .await;

        assert_eq!(result.unwrap_err(), email_conflict("b@x.com"));
        let stored = repo.get(a.id()).await.unwrap().unwrap();
        assert_eq!(stored.email, "a@x.com");
        assert_eq!(stored.version(), Some(1));
    }

    #[tokio::test]
    async fn test_update_missing_user_is_not_found() {
        let (_store, repo) = setup();

        let result = repo.update_with(7, |u| u.name = "X".to_string()).await;

        assert_eq!(
            result.unwrap_err(),
            RepositoryError::NotFound {
                entity_type: "User",
                id: 7
            }
        );
    }

    #[tokio::test]
    async fn test_save_with_stale_version() {
        let (_store, repo) = setup();
        let v1 = repo.create(&User::new("A", "a@x.com")).await.unwrap();

        let mut first = v1.clone();
        first.name = "First".to_string();
        let mut second = v1.clone();
        second.name = "Second".to_string();

        repo.save(&first).await.unwrap();
        let result = repo.save(&second).await;

        assert_eq!(
            result.unwrap_err(),
            RepositoryError::StaleVersion {
                entity_type: "User",
                id: v1.id(),
                expected: 1
            }
        );
        assert_eq!(repo.get(v1.id()).await.unwrap().unwrap().name, "First");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_updates_from_same_version() {
        let (_store, repo) = setup();
        let v1 = repo.create(&User::new("A", "a@x.com")).await.unwrap();

        let handles: Vec<_> = (0..2)
            .map(|i| {
                let repo = repo.clone();
                let mut user = v1.clone();
                user.name = format!("Writer {i}");
                tokio::spawn(async move { repo.save(&user).await })
            })
            .collect();

        let mut wins = 0;
        let mut stale = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(user) => {
                    assert_eq!(user.version(), Some(2));
                    wins += 1;
                }
                Err(RepositoryError::StaleVersion { .. }) => stale += 1,
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }

        assert_eq!((wins, stale), (1, 1));
        assert_eq!(repo.get(v1.id()).await.unwrap().unwrap().version(), Some(2));
    }

    // ==================== Delete Tests ====================

    #[tokio::test]
    async fn test_delete_releases_email() {
        let (_store, repo) = setup();
        let user = repo.create(&User::new("A", "a@x.com")).await.unwrap();

        repo.delete(user.id()).await.unwrap();
        repo.delete(user.id()).await.unwrap();

        assert!(repo.get(user.id()).await.unwrap().is_none());
        let again = repo.create(&User::new("B", "a@x.com")).await.unwrap();
        assert_eq!(again.id(), user.id() + 1);
    }

    #[tokio::test]
    async fn test_delete_after_email_changed_is_stale() {
        let (store, repo) = setup();
        repo.create(&User::new("A", "a@x.com")).await.unwrap();
        let read = repo.get(1).await.unwrap().unwrap();

        // Between the read and the delete, user 1 moves to b@x.com and user 2
        // claims the released a@x.com.
        repo.update_with(1, |u| u.email = "b@x.com".to_string())
            .await
            .unwrap();
        let taker = repo.create(&User::new("B", "a@x.com")).await.unwrap();

        let result = repo
            .guard
            .release_and_delete(&read, UserRepository::shadow(&read.email, 1))
            .await;

        assert_eq!(
            result.unwrap_err(),
            RepositoryError::StaleVersion {
                entity_type: "User",
                id: 1,
                expected: 1
            }
        );
        assert_eq!(
            repo.find_by_email("a@x.com").await.unwrap().map(|u| u.id()),
            Some(taker.id())
        );
        assert_emails_consistent(&store, &repo).await;

        // A fresh read deletes the current row and frees b@x.com only.
        repo.delete(1).await.unwrap();
        assert_emails_consistent(&store, &repo).await;
        assert_eq!(
            repo.create(&User::new("C", "a@x.com")).await.unwrap_err(),
            email_conflict("a@x.com")
        );
        repo.create(&User::new("C", "b@x.com")).await.unwrap();
        assert_emails_consistent(&store, &repo).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_delete_racing_email_change_keeps_shadows_consistent() {
        for _ in 0..20 {
            let (store, repo) = setup();
            repo.create(&User::new("A", "a@x.com")).await.unwrap();

            let deleter = {
                let repo = repo.clone();
                tokio::spawn(async move { repo.delete(1).await })
            };
            let updater = {
                let repo = repo.clone();
                tokio::spawn(async move {
                    repo.update_with(1, |u| u.email = "b@x.com".to_string())
                        .await
                        .map(|_| ())
                })
            };
            for handle in [deleter, updater] {
                match handle.await.unwrap() {
                    Ok(())
                    | Err(RepositoryError::StaleVersion { .. })
                    | Err(RepositoryError::NotFound { .. }) => {}
                    Err(other) => panic!("unexpected error: {other:?}"),
                }
            }
            assert_emails_consistent(&store, &repo).await;
            let original_survived = repo.get(1).await.unwrap().is_some();

            // Two creates race on each address; the old one is always free.
            let handles: Vec<_> = ["a@x.com", "a@x.com", "b@x.com", "b@x.com"]
                .into_iter()
                .map(|email| {
                    let repo = repo.clone();
                    tokio::spawn(async move {
                        (email, repo.create(&User::new("New", email)).await)
                    })
                })
                .collect();

            let mut wins_a = 0;
            let mut wins_b = 0;
            for handle in handles {
                match handle.await.unwrap() {
                    (email, Ok(_)) if email == "a@x.com" => wins_a += 1,
                    (_, Ok(_)) => wins_b += 1,
                    (_, Err(RepositoryError::UniquenessConflict { .. })) => {}
                    (_, Err(other)) => panic!("unexpected error: {other:?}"),
                }
            }

            assert_eq!(wins_a, 1);
            assert_eq!(wins_b, if original_survived { 0 } else { 1 });
            assert_emails_consistent(&store, &repo).await;
        }
    }

    #[tokio::test]
    async fn test_find_by_email() {
        let (_store, repo) = setup();
        repo.create(&User::new("A", "a@x.com")).await.unwrap();
        let b = repo.create(&User::new("B", "b@x.com")).await.unwrap();

        let found = repo.find_by_email("b@x.com").await.unwrap().unwrap();
        assert_eq!(found.id(), b.id());
        assert!(repo.find_by_email("c@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_store_unavailable_propagates() {
        let repo = UserRepository::new(Arc::new(FailingStore));

        assert!(matches!(
            repo.create(&User::new("A", "a@x.com")).await,
            Err(RepositoryError::StoreUnavailable(_))
        ));
        assert!(matches!(
            repo.delete(1).await,
            Err(RepositoryError::StoreUnavailable(_))
        ));
    }
}
