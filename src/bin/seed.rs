use homeplate::{
    auth::{PasswordAuth, SignUp, TokenIssuer},
    config::AppConfig,
    db::{DbPool, create_orm_conn, create_pool, run_migrations},
    error::AppError,
    fetchers::{ChefProfileUpdate, Fetch, MealDraft},
    ids::UserId,
    models::{Role, VerificationStatus},
    store::OrmStore,
};

struct DemoChef {
    email: &'static str,
    name: &'static str,
    bio: &'static str,
    featured: bool,
    specialties: &'static [&'static str],
    dishes: &'static [(&'static str, &'static str, f64, &'static str)],
}

const CHEFS: &[DemoChef] = &[
    DemoChef {
        email: "asha@example.com",
        name: "Asha Kitchen",
        bio: "Home-style Gujarati thalis, cooked fresh every morning.",
        featured: true,
        specialties: &["Gujarati", "Thali"],
        dishes: &[
            ("Gujarati Thali", "Dal, kadhi, two sabzis, rotli and rice", 220.0, "thali"),
            ("Dhokla", "Steamed gram flour cakes with green chutney", 90.0, "snacks"),
        ],
    },
    DemoChef {
        email: "ravi@example.com",
        name: "Ravi's Tiffin",
        bio: "South Indian breakfasts and light lunches.",
        featured: false,
        specialties: &["South Indian"],
        dishes: &[
            ("Masala Dosa", "Crisp dosa with potato bhaji, sambar and chutney", 120.0, "breakfast"),
            ("Curd Rice", "Tempered curd rice with pomegranate", 80.0, "main course"),
        ],
    },
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    // Ensure migrations are applied.
    run_migrations(&orm).await?;
    let pool = create_pool(&config.database_url).await?;
    let issuer = TokenIssuer::new(config.jwt_secret.clone(), config.session_ttl_hours);

    let store = OrmStore::new(orm);
    let fetch = Fetch::new(&store, config.join_strategy);

    let admin_id = ensure_account(&pool, &issuer, "admin@example.com", "admin123", "Admin", false).await?;
    fetch.grant_role(admin_id, Role::Admin).await?;
    PasswordAuth::new(pool.clone(), issuer.clone())
        .set_role_claim(admin_id, Role::Admin)
        .await?;

    let customer_id =
        ensure_account(&pool, &issuer, "customer@example.com", "customer123", "Meera", false).await?;

    for demo in CHEFS {
        let user = ensure_account(&pool, &issuer, demo.email, "chef123", demo.name, true).await?;
        seed_chef(&fetch, user, demo).await?;
    }

    println!("Seed completed. Admin ID: {admin_id}, Customer ID: {customer_id}");
    Ok(())
}

/// Sign up, or sign in when the account already exists.
async fn ensure_account(
    pool: &DbPool,
    issuer: &TokenIssuer,
    email: &str,
    password: &str,
    name: &str,
    become_chef: bool,
) -> anyhow::Result<UserId> {
    let auth = PasswordAuth::new(pool.clone(), issuer.clone());
    let signed_up = auth
        .sign_up(SignUp {
            email: email.to_string(),
            password: password.to_string(),
            name: name.to_string(),
            become_chef,
        })
        .await;
    let session = match signed_up {
        Ok(session) => session,
        Err(AppError::Validation(_)) => auth.sign_in_with_password(email, password).await?,
        Err(err) => return Err(err.into()),
    };

    println!("Ensured user {email}");
    Ok(session.identity.id)
}

async fn seed_chef(fetch: &Fetch<'_, OrmStore>, user: UserId, demo: &DemoChef) -> anyhow::Result<()> {
    let chef = fetch.ensure_chef_profile(user).await?;
    fetch
        .update_chef_profile(
            chef.id,
            ChefProfileUpdate {
                bio: Some(demo.bio.to_string()),
                kitchen_photo_url: None,
                hygiene_certificate: true,
                fssai_license: true,
            },
        )
        .await?;
    fetch.set_verification(chef.id, VerificationStatus::Approved).await?;
    fetch.set_featured(chef.id, demo.featured).await?;

    let existing = fetch.specialties(chef.id).await?;
    for specialty in demo.specialties {
        if existing.iter().any(|s| s.specialty == *specialty) {
            continue;
        }
        fetch.add_specialty(chef.id, specialty).await?;
    }

    if fetch.chef_meals(user).await?.is_empty() {
        for (title, description, price, category) in demo.dishes {
            fetch
                .create_meal(
                    user,
                    MealDraft {
                        title: title.to_string(),
                        description: description.to_string(),
                        price: *price,
                        category: Some(category.to_string()),
                        available: true,
                        image_url: None,
                        spice_levels: vec!["mild".into(), "medium".into(), "spicy".into()],
                        oil_options: vec!["regular".into(), "less oil".into()],
                        min_quantity: Some(1),
                        max_quantity: Some(10),
                    },
                )
                .await?;
        }
    }

    println!("Seeded chef {}", demo.name);
    Ok(())
}
