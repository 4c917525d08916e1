use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum_storefront_api::{config::AppConfig, db::create_pool};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let admin_id = ensure_admin(&pool, "admin", "admin@example.com", "admin123").await?;
    seed_categories(&pool).await?;
    seed_products(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}");
    Ok(())
}

async fn ensure_admin(
    pool: &sqlx::PgPool,
    username: &str,
    email: &str,
    password: &str,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO admins (id, username, email, password_hash, is_active)
        VALUES ($1, $2, $3, $4, true)
        ON CONFLICT (username) DO UPDATE SET is_active = true
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .fetch_optional(pool)
    .await?;

    let admin_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM admins WHERE username = $1")
                .bind(username)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured admin {username}");
    Ok(admin_id)
}

async fn seed_categories(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let categories = vec![("men", "Men"), ("women", "Women"), ("unisex", "Unisex")];

    for (key, label) in categories {
        sqlx::query(
            r#"
            INSERT INTO categories (id, key, label)
            VALUES ($1, $2, $3)
            ON CONFLICT (key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(key)
        .bind(label)
        .execute(pool)
        .await?;
    }

    println!("Seeded categories");
    Ok(())
}

async fn seed_products(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let products = vec![
        (
            "amber-noir",
            "Amber Noir",
            "Smoky amber with a leather base",
            2499_i64,
            "50ml,100ml",
            "men",
            true,
            false,
        ),
        (
            "velvet-rose",
            "Velvet Rose",
            "Rose absolute over soft musk",
            2899_i64,
            "30ml,50ml,100ml",
            "women",
            true,
            true,
        ),
        (
            "citrus-atlas",
            "Citrus Atlas",
            "Bergamot and cedar, bright and dry",
            1999_i64,
            "50ml,100ml",
            "unisex",
            false,
            true,
        ),
    ];

    for (slug, name, desc, price, sizes, category, best, new) in products {
        sqlx::query(
            r#"
            INSERT INTO products
                (id, slug, name, description, price, sizes, default_size, category,
                 is_best_seller, is_new_arrival, image)
            VALUES ($1, $2, $3, $4, $5, $6, 0, $7, $8, $9, '')
            ON CONFLICT (slug) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(slug)
        .bind(name)
        .bind(desc)
        .bind(price)
        .bind(sizes)
        .bind(category)
        .bind(best)
        .bind(new)
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}
