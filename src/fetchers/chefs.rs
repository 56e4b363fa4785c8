use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{Fetch, fallback, join::lookup_many, optional, required};
use crate::{
    error::{AppError, AppResult},
    ids::{ChefId, SpecialtyId, UserId},
    models::{Chef, ChefSpecialty, VerificationStatus},
    store::{Changes, DataService, Query},
};

/// A chef in the public directory.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ChefCard {
    #[serde(flatten)]
    pub chef: Chef,
    pub name: String,
    pub specialties: Vec<String>,
}

/// A chef on the home page, with the dish they are known for.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct FeaturedChef {
    #[serde(flatten)]
    pub chef: Chef,
    pub name: String,
    pub signature_dish: Option<String>,
}

/// A chef in the admin verification list.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ChefRow {
    #[serde(flatten)]
    pub chef: Chef,
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ChefProfileUpdate {
    pub bio: Option<String>,
    pub kitchen_photo_url: Option<String>,
    #[serde(default)]
    pub hygiene_certificate: bool,
    #[serde(default)]
    pub fssai_license: bool,
}

impl<S: DataService> Fetch<'_, S> {
    async fn chef_names(&self, chefs: &[Chef], fallback: &str) -> Vec<String> {
        let names = self.names(chefs.iter().map(|c| c.user_id)).await;
        chefs
            .iter()
            .map(|chef| {
                names
                    .get(&chef.user_id)
                    .cloned()
                    .unwrap_or_else(|| fallback.to_string())
            })
            .collect()
    }

    fn approved_query(limit: Option<u64>) -> Query<Chef> {
        let query = Query::<Chef>::new()
            .eq("verification_status", VerificationStatus::Approved)
            .order("is_featured", false)
            .order("avg_rating", false);
        match limit {
            Some(limit) => query.limit(limit),
            None => query,
        }
    }

    pub async fn chef(&self, id: ChefId) -> AppResult<Chef> {
        self.store.find(id.as_uuid()).await
    }

    pub async fn chef_for_user(&self, user: UserId) -> AppResult<Option<Chef>> {
        self.store
            .select_one(Query::<Chef>::new().eq("user_id", user))
            .await
    }

    /// The user's chef profile, created blank and pending on first visit.
    pub async fn ensure_chef_profile(&self, user: UserId) -> AppResult<Chef> {
        if let Some(chef) = self.chef_for_user(user).await? {
            return Ok(chef);
        }
        let chef = self.store.insert(Chef::pending_for(user)).await?;
        tracing::info!(chef_id = %chef.id, user_id = %user, "chef profile created");
        Ok(chef)
    }

    /// Approved chefs, featured first and then by rating.
    pub async fn approved_chefs(&self, limit: Option<u64>) -> AppResult<Vec<ChefCard>> {
        let chefs = self.store.select(Self::approved_query(limit)).await?;
        let names = self.chef_names(&chefs, fallback::CHEF).await;
        let mut specialties = lookup_many(
            self.store,
            self.joins,
            Query::<ChefSpecialty>::new(),
            "chef_id",
            chefs.iter().map(|c| c.id),
            |s: &ChefSpecialty| s.chef_id,
        )
        .await;

        Ok(chefs
            .into_iter()
            .zip(names)
            .map(|(chef, name)| ChefCard {
                specialties: specialties
                    .remove(&chef.id)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|s| s.specialty)
                    .collect(),
                chef,
                name,
            })
            .collect())
    }

    /// The home page's "meet our chefs" strip.
    pub async fn featured_chefs(&self, limit: u64) -> AppResult<Vec<FeaturedChef>> {
        let chefs = self.store.select(Self::approved_query(Some(limit))).await?;
        let (names, mut dishes) = tokio::join!(
            self.chef_names(&chefs, fallback::HOME_CHEF),
            self.signature_dishes(chefs.iter().map(|c| c.user_id)),
        );
        Ok(chefs
            .into_iter()
            .zip(names)
            .map(|(chef, name)| FeaturedChef {
                signature_dish: dishes.remove(&chef.user_id).map(|meal| meal.title),
                chef,
                name,
            })
            .collect())
    }

    /// Every chef regardless of status, newest first.
    pub async fn all_chefs(&self) -> AppResult<Vec<ChefRow>> {
        let chefs = self
            .store
            .select(Query::<Chef>::new().newest_first())
            .await?;
        let names = self.chef_names(&chefs, fallback::CHEF).await;
        Ok(chefs
            .into_iter()
            .zip(names)
            .map(|(chef, name)| ChefRow { chef, name })
            .collect())
    }

    pub async fn set_verification(&self, id: ChefId, status: VerificationStatus) -> AppResult<Chef> {
        let chef: Chef = self
            .store
            .update(
                id.as_uuid(),
                Changes::new().set("verification_status", status.as_str()),
            )
            .await?;
        tracing::info!(chef_id = %id, status = status.as_str(), "chef verification changed");
        Ok(chef)
    }

    pub async fn set_featured(&self, id: ChefId, featured: bool) -> AppResult<Chef> {
        self.store
            .update(id.as_uuid(), Changes::new().set("is_featured", featured))
            .await
    }

    pub async fn update_chef_profile(&self, id: ChefId, update: ChefProfileUpdate) -> AppResult<Chef> {
        let changes = Changes::new()
            .set("bio", optional(update.bio))
            .set("kitchen_photo_url", optional(update.kitchen_photo_url))
            .set("hygiene_certificate", update.hygiene_certificate)
            .set("fssai_license", update.fssai_license);
        self.store.update(id.as_uuid(), changes).await
    }

    pub async fn specialties(&self, chef: ChefId) -> AppResult<Vec<ChefSpecialty>> {
        self.store
            .select(
                Query::<ChefSpecialty>::new()
                    .eq("chef_id", chef)
                    .order("created_at", true),
            )
            .await
    }

    pub async fn add_specialty(&self, chef: ChefId, specialty: &str) -> AppResult<ChefSpecialty> {
        let specialty = required(specialty, "Specialty")?;
        let existing = self.specialties(chef).await?;
        if existing
            .iter()
            .any(|s| s.specialty.eq_ignore_ascii_case(&specialty))
        {
            return Err(AppError::validation("Specialty already added"));
        }
        self.store
            .insert(ChefSpecialty {
                id: SpecialtyId::new(),
                chef_id: chef,
                specialty,
                created_at: Utc::now(),
            })
            .await
    }

    pub async fn remove_specialty(&self, chef: ChefId, specialty: &str) -> AppResult<()> {
        let removed = self
            .store
            .delete_where(
                Query::<ChefSpecialty>::new()
                    .eq("chef_id", chef)
                    .eq("specialty", specialty.trim()),
            )
            .await?;
        if removed == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        fetchers::JoinStrategy,
        ids::MealId,
        models::{Meal, Profile},
        store::MemoryStore,
    };

    fn approved(store: &MemoryStore, name: Option<&str>, rating: f64, featured: bool) -> Chef {
        let user = UserId::new();
        if let Some(name) = name {
            store
                .seed(&Profile {
                    id: user,
                    email: format!("{name}@example.com"),
                    name: name.into(),
                    created_at: Utc::now(),
                })
                .unwrap();
        }
        let chef = Chef {
            verification_status: VerificationStatus::Approved,
            avg_rating: rating,
            is_featured: featured,
            ..Chef::pending_for(user)
        };
        store.seed(&chef).unwrap();
        chef
    }

    #[tokio::test]
    async fn directory_orders_featured_then_rating() {
        let store = MemoryStore::new();
        let low = approved(&store, Some("Low"), 3.0, false);
        let high = approved(&store, Some("High"), 4.9, false);
        let star = approved(&store, None, 4.0, true);
        store.seed(&Chef::pending_for(UserId::new())).unwrap();

        let fetch = Fetch::new(&store, JoinStrategy::Batched);
        fetch.add_specialty(high.id, "Biryani").await.unwrap();

        let cards = fetch.approved_chefs(None).await.unwrap();
        let ids: Vec<_> = cards.iter().map(|c| c.chef.id).collect();
        assert_eq!(ids, [star.id, high.id, low.id]);
        assert_eq!(cards[0].name, fallback::CHEF);
        assert_eq!(cards[1].specialties, ["Biryani"]);
    }

    #[tokio::test]
    async fn featured_chefs_carry_a_signature_dish() {
        let store = MemoryStore::new();
        let chef = approved(&store, None, 4.5, true);
        store
            .seed(&Meal {
                id: MealId::new(),
                chef_id: chef.user_id,
                title: "Rajma Chawal".into(),
                description: String::new(),
                price: 150.0,
                category: "main course".into(),
                available: true,
                image_url: None,
                spice_levels: vec![],
                oil_options: vec![],
                min_quantity: None,
                max_quantity: None,
                created_at: Utc::now(),
            })
            .unwrap();

        let home = Fetch::new(&store, JoinStrategy::PerRow)
            .featured_chefs(10)
            .await
            .unwrap();
        assert_eq!(home[0].name, fallback::HOME_CHEF);
        assert_eq!(home[0].signature_dish.as_deref(), Some("Rajma Chawal"));
    }

    #[tokio::test]
    async fn chef_profile_is_created_once() {
        let store = MemoryStore::new();
        let fetch = Fetch::new(&store, JoinStrategy::Batched);
        let user = UserId::new();
        let first = fetch.ensure_chef_profile(user).await.unwrap();
        let second = fetch.ensure_chef_profile(user).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.verification_status, VerificationStatus::Pending);
    }

    #[tokio::test]
    async fn specialties_are_unique_and_removable() {
        let store = MemoryStore::new();
        let fetch = Fetch::new(&store, JoinStrategy::Batched);
        let chef = ChefId::new();
        fetch.add_specialty(chef, "Thali").await.unwrap();
        let err = fetch.add_specialty(chef, "thali").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        fetch.remove_specialty(chef, "Thali").await.unwrap();
        assert!(fetch.specialties(chef).await.unwrap().is_empty());
        let err = fetch.remove_specialty(chef, "Thali").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound));
    }
}
