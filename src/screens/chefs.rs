use serde::Serialize;
use utoipa::ToSchema;

use super::{Screens, settle};
use crate::{
    fetchers::ChefCard,
    store::DataService,
    view::{Notice, Screen, ScreenState},
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct ChefsView {
    pub search: String,
    pub chefs: Vec<ChefCard>,
    pub notice: Option<Notice>,
}

super::impl_view!(ChefsView);

/// Case-insensitive substring match on the chef's name or any specialty.
pub fn chef_matches_search(card: &ChefCard, search: &str) -> bool {
    let needle = search.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    std::iter::once(&card.name)
        .chain(&card.specialties)
        .any(|field| field.to_lowercase().contains(&needle))
}

impl<S: DataService> Screens<'_, S> {
    #[tracing::instrument(skip(self, state), name = "screen.chefs")]
    pub async fn chefs(&self, state: &ScreenState<ChefsView>, search: Option<&str>) -> Screen<ChefsView> {
        let search = search.unwrap_or_default().trim().to_string();
        let loaded = self
            .fetch()
            .approved_chefs(None)
            .await
            .map(|chefs| ChefsView {
                chefs: chefs
                    .into_iter()
                    .filter(|card| chef_matches_search(card, &search))
                    .collect(),
                search,
                notice: None,
            });
        settle(state, loaded, "Failed to load chefs")
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::{
        fetchers::{Fetch, JoinStrategy},
        ids::UserId,
        models::{Chef, Profile, VerificationStatus},
        session::SessionStore,
        store::MemoryStore,
        view::ScreenScope,
    };

    fn card(name: &str, specialties: &[&str]) -> ChefCard {
        ChefCard {
            chef: Chef::pending_for(UserId::new()),
            name: name.into(),
            specialties: specialties.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn search_looks_at_name_and_specialties() {
        let asha = card("Asha Patel", &["Gujarati", "Farsan"]);
        assert!(chef_matches_search(&asha, "patel"));
        assert!(chef_matches_search(&asha, "FARS"));
        assert!(chef_matches_search(&asha, ""));
        assert!(!chef_matches_search(&asha, "bengali"));
        assert!(!chef_matches_search(&card("Ravi", &[]), "gujarati"));
    }

    #[tokio::test]
    async fn chefs_screen_keeps_only_matching_chefs() {
        let store = MemoryStore::new();
        let fetch = Fetch::new(&store, JoinStrategy::Batched);
        for name in ["Asha", "Ravi"] {
            let profile = Profile {
                id: UserId::new(),
                email: format!("{}@example.com", name.to_lowercase()),
                name: name.into(),
                created_at: Utc::now(),
            };
            store.seed(&profile).unwrap();
            let chef = fetch.ensure_chef_profile(profile.id).await.unwrap();
            fetch
                .set_verification(chef.id, VerificationStatus::Approved)
                .await
                .unwrap();
        }
        let session = SessionStore::with_identity(None);
        let screens = Screens::new(fetch, &session);

        let scope = ScreenScope::mount();
        let view = screens.chefs(&scope.state(), Some(" ravi ")).await.ready().unwrap();
        assert_eq!(view.search, "ravi");
        assert_eq!(view.chefs.len(), 1);
        assert_eq!(view.chefs[0].name, "Ravi");

        let all = screens.chefs(&scope.state(), None).await.ready().unwrap();
        assert_eq!(all.chefs.len(), 2);
    }
}
