use std::{
    collections::BTreeMap,
    sync::atomic::{AtomicI64, Ordering},
};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use super::{NewUser, StoreError, UserChanges, UserCredentials, UserLookup, UserStore};
use crate::user::User;

#[derive(Debug, Clone)]
struct StoredUser {
    user: User,
    password_hash: String,
}

/// Process-local account store.
///
/// Ids start at 1 and are never reused.
#[derive(Debug)]
pub struct MemoryUserStore {
    users: RwLock<BTreeMap<i64, StoredUser>>,
    next_id: AtomicI64,
}

impl Default for MemoryUserStore {
    fn default() -> Self {
        Self {
            users: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }
}

fn email_taken(
    users: &BTreeMap<i64, StoredUser>,
    email: &str,
    except: Option<i64>,
) -> bool {
    users.values().any(|stored| {
        Some(stored.user.id) != except
            && stored.user.email.eq_ignore_ascii_case(email)
    })
}

#[async_trait]
impl UserLookup for MemoryUserStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().get(&id).map(|stored| stored.user.clone()))
    }

    async fn find_by_login_name(
        &self,
        email: &str,
    ) -> Result<Option<UserCredentials>, StoreError> {
        let users = self.users.read();
        Ok(users
            .values()
            .find(|stored| stored.user.email.eq_ignore_ascii_case(email))
            .map(|stored| UserCredentials {
                user: stored.user.clone(),
                password_hash: stored.password_hash.clone(),
            }))
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, new: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.write();
        if email_taken(&users, &new.email, None) {
            return Err(StoreError::Conflict(format!(
                "email {} already exists",
                new.email
            )));
        }

        let now = Utc::now();
        let user = User {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            email: new.email,
            firstname: new.firstname,
            lastname: new.lastname,
            role: new.role,
            created_at: now,
            updated_at: now,
        };
        users.insert(
            user.id,
            StoredUser {
                user: user.clone(),
                password_hash: new.password_hash,
            },
        );
        Ok(user)
    }

    async fn list(&self, skip: u32, limit: u32) -> Result<Vec<User>, StoreError> {
        Ok(self
            .users
            .read()
            .values()
            .skip(skip as usize)
            .take(limit as usize)
            .map(|stored| stored.user.clone())
            .collect())
    }

    async fn update(
        &self,
        id: i64,
        changes: UserChanges,
    ) -> Result<Option<User>, StoreError> {
        let mut users = self.users.write();
        if let Some(email) = changes.email.as_deref()
            && email_taken(&users, email, Some(id))
        {
            return Err(StoreError::Conflict(format!(
                "email {email} already exists"
            )));
        }

        let Some(stored) = users.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(email) = changes.email {
            stored.user.email = email;
        }
        if let Some(firstname) = changes.firstname {
            stored.user.firstname = firstname;
        }
        if let Some(lastname) = changes.lastname {
            stored.user.lastname = lastname;
        }
        if let Some(role) = changes.role {
            stored.user.role = role;
        }
        if let Some(hash) = changes.password_hash {
            stored.password_hash = hash;
        }
        stored.user.updated_at = Utc::now();

        Ok(Some(stored.user.clone()))
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        Ok(self.users.write().remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            firstname: "Test".into(),
            lastname: "User".into(),
            password_hash: "$argon2id$placeholder".into(),
            role: Role::User,
        }
    }

    #[tokio::test]
    async fn assigns_increasing_ids() {
        let store = MemoryUserStore::new();
        let first = store.create(new_user("a@example.com")).await.unwrap();
        let second = store.create(new_user("b@example.com")).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let store = MemoryUserStore::new();
        store.create(new_user("a@example.com")).await.unwrap();

        let err = store.create(new_user("A@Example.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn login_lookup_returns_hash() {
        let store = MemoryUserStore::new();
        store.create(new_user("a@example.com")).await.unwrap();

        let found = store
            .find_by_login_name("a@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.password_hash, "$argon2id$placeholder");
        assert!(store.find_by_login_name("x@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_applies_only_given_fields() {
        let store = MemoryUserStore::new();
        let user = store.create(new_user("a@example.com")).await.unwrap();

        let updated = store
            .update(
                user.id,
                UserChanges {
                    firstname: Some("Renamed".into()),
                    role: Some(Role::Admin),
                    ..UserChanges::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.firstname, "Renamed");
        assert_eq!(updated.lastname, "User");
        assert_eq!(updated.role, Role::Admin);
        assert!(updated.updated_at >= user.updated_at);
        assert!(
            store
                .update(99, UserChanges::default())
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn update_to_taken_email_conflicts() {
        let store = MemoryUserStore::new();
        store.create(new_user("a@example.com")).await.unwrap();
        let b = store.create(new_user("b@example.com")).await.unwrap();

        let err = store
            .update(
                b.id,
                UserChanges {
                    email: Some("a@example.com".into()),
                    ..UserChanges::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn list_pages_in_id_order() {
        let store = MemoryUserStore::new();
        for n in 0..5 {
            store
                .create(new_user(&format!("u{n}@example.com")))
                .await
                .unwrap();
        }

        let page: Vec<i64> = store
            .list(1, 2)
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.id)
            .collect();
        assert_eq!(page, vec![2, 3]);
    }

    #[tokio::test]
    async fn delete_reports_whether_a_row_went_away() {
        let store = MemoryUserStore::new();
        let user = store.create(new_user("a@example.com")).await.unwrap();

        assert!(store.delete(user.id).await.unwrap());
        assert!(!store.delete(user.id).await.unwrap());
        assert!(store.find_by_id(user.id).await.unwrap().is_none());
    }
}
