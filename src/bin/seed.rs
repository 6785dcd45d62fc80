use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use rust_decimal::Decimal;
use uuid::Uuid;

use bazar_api::{config::AppConfig, db::create_pool};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;

    let admin_id = ensure_user_with_role(&pool, "admin@example.com", "admin123", "admin").await?;
    let user_id = ensure_user_with_role(&pool, "user@example.com", "user123", "user").await?;
    seed_products(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user_with_role(
    pool: &sqlx::PgPool,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash, role)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_optional(pool)
    .await?;

    // If user already exists, fetch id
    let user_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM users WHERE email = $1")
                .bind(email)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured user {email} (role={role})");
    Ok(user_id)
}

async fn seed_products(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let products = [
        ("Bazin Riche Doré", "bazin", Some("Riche"), "mètre", 7500, 120),
        ("Gabardine Type 3", "gabardine", Some("Type 3"), "mètre", 4000, 80),
        ("Pagne Super Wax", "pagne", Some("Super Wax"), "complet", 15000, 35),
        ("Dashiki Brodé", "dashiki", Some("Brodé"), "pièce", 12000, 20),
        ("Ankara Hollandais", "ankara", Some("Hollandais"), "yard", 3500, 200),
    ];

    for (name, fabric_type, subtype, unit, price, stock) in products {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, description, price, stock, images, fabric_type, fabric_subtype, unit)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(format!("{name} en vente à la boutique"))
        .bind(Decimal::from(price))
        .bind(stock)
        .bind(serde_json::json!([format!(
            "https://img.example/{}.jpg",
            name.to_lowercase().replace(' ', "-")
        )]))
        .bind(fabric_type)
        .bind(subtype)
        .bind(unit)
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}
