use std::collections::HashMap;

use chrono::Utc;

use super::{Fetch, join::lookup_one};
use crate::{
    error::AppResult,
    ids::{RoleAssignmentId, UserId},
    models::{Profile, Role, RoleAssignment},
    store::DataService,
};

impl<S: DataService> Fetch<'_, S> {
    /// Display names for the given users. Users whose profile can't be read are absent.
    pub async fn names(&self, ids: impl IntoIterator<Item = UserId>) -> HashMap<UserId, String> {
        lookup_one(self.store, self.joins, "id", ids, |p: &Profile| p.id)
            .await
            .into_iter()
            .map(|(id, profile)| (id, profile.name))
            .collect()
    }

    pub async fn profile(&self, id: UserId) -> AppResult<Profile> {
        self.store.find(id.as_uuid()).await
    }

    /// Add a role row unless the user already has it.
    pub async fn grant_role(&self, user_id: UserId, role: Role) -> AppResult<()> {
        if crate::roles::RoleResolver::new(self.store)
            .has_role(user_id, role)
            .await?
        {
            return Ok(());
        }
        self.store
            .insert(RoleAssignment {
                id: RoleAssignmentId::new(),
                user_id,
                role,
                created_at: Utc::now(),
            })
            .await?;
        tracing::info!(%user_id, role = role.as_str(), "role granted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        fetchers::JoinStrategy,
        store::{MemoryStore, Table},
    };

    fn profile(name: &str) -> Profile {
        Profile {
            id: UserId::new(),
            email: format!("{name}@example.com"),
            name: name.to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn names_skip_missing_profiles() {
        let store = MemoryStore::new();
        let asha = profile("Asha");
        store.seed(&asha).unwrap();
        let ghost = UserId::new();

        for joins in [JoinStrategy::Batched, JoinStrategy::PerRow] {
            let names = Fetch::new(&store, joins).names([asha.id, ghost, asha.id]).await;
            assert_eq!(names.len(), 1);
            assert_eq!(names[&asha.id], "Asha");
        }
    }

    #[tokio::test]
    async fn batched_names_cost_one_request() {
        let store = MemoryStore::new();
        let people: Vec<_> = ["A", "B", "C"].iter().map(|n| profile(n)).collect();
        for p in &people {
            store.seed(p).unwrap();
        }

        Fetch::new(&store, JoinStrategy::Batched)
            .names(people.iter().map(|p| p.id))
            .await;
        assert_eq!(store.requests(Table::Profiles), 1);

        Fetch::new(&store, JoinStrategy::PerRow)
            .names(people.iter().map(|p| p.id))
            .await;
        assert_eq!(store.requests(Table::Profiles), 4);
    }

    #[tokio::test]
    async fn granting_twice_keeps_one_row() {
        let store = MemoryStore::new();
        let fetch = Fetch::new(&store, JoinStrategy::Batched);
        let user = UserId::new();
        fetch.grant_role(user, Role::Chef).await.unwrap();
        fetch.grant_role(user, Role::Chef).await.unwrap();
        assert_eq!(store.rows::<RoleAssignment>().unwrap().len(), 1);
    }
}
