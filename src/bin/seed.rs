use serde_json::json;
use storefront_api::{
    config::AppConfig,
    db::{create_pool, orm_from_pool, run_migrations},
    models::Role,
    services::auth_service::hash_password,
};
use uuid::Uuid;

struct SeedProduct {
    name: &'static str,
    description: &'static str,
    price: i64,
    category: &'static str,
    subcategory: Option<&'static str>,
    stock: i32,
    featured: bool,
    rating: f64,
    key_features: &'static [&'static str],
}

const CATALOG: &[SeedProduct] = &[
    SeedProduct {
        name: "Heirloom Tomato Seeds",
        description: "Open-pollinated beefsteak tomatoes for warm beds",
        price: 1500,
        category: "seeds",
        subcategory: Some("vegetables"),
        stock: 120,
        featured: true,
        rating: 4.7,
        key_features: &["Non-GMO", "80 days to harvest"],
    },
    SeedProduct {
        name: "Sweet Basil Seeds",
        description: "Genovese basil, fast germinating",
        price: 900,
        category: "seeds",
        subcategory: Some("herbs"),
        stock: 200,
        featured: false,
        rating: 4.5,
        key_features: &["Container friendly", "Germinates in 5 days"],
    },
    SeedProduct {
        name: "Sunflower Giant Seeds",
        description: "Tall single-stem sunflowers",
        price: 1200,
        category: "seeds",
        subcategory: Some("flowers"),
        stock: 0,
        featured: false,
        rating: 4.2,
        key_features: &["Up to 3m tall"],
    },
    SeedProduct {
        name: "Organic Potting Mix 20L",
        description: "Peat-free mix for seedlings and containers",
        price: 4500,
        category: "soil",
        subcategory: None,
        stock: 40,
        featured: true,
        rating: 4.8,
        key_features: &["Peat-free", "Slow-release feed", "20 litres"],
    },
    SeedProduct {
        name: "Hand Trowel",
        description: "Stainless steel trowel with ash handle",
        price: 3200,
        category: "tools",
        subcategory: None,
        stock: 25,
        featured: false,
        rating: 4.4,
        key_features: &["Rust resistant", "Depth markings"],
    },
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config).await?;
    run_migrations(&orm_from_pool(&pool)).await?;

    let admin_id = ensure_user(&pool, "Store Admin", "admin@example.com", "admin1234", Role::Admin).await?;
    let user_id = ensure_user(&pool, "Demo Shopper", "user@example.com", "user12345", Role::User).await?;
    seed_products(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    name: &str,
    email: &str,
    password: &str,
    role: Role,
) -> anyhow::Result<Uuid> {
    let password_hash =
        hash_password(password).map_err(|e| anyhow::anyhow!("hashing password: {e}"))?;

    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, name, email, password_hash, role)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .bind(role.as_str())
    .fetch_one(pool)
    .await?;

    println!("Ensured user {email} (role={role})");
    Ok(id)
}

async fn seed_products(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    for product in CATALOG {
        let slug = product.name.to_lowercase().replace(' ', "-");
        sqlx::query(
            r#"
            INSERT INTO products (id, name, description, price, images, category, subcategory,
                                  key_features, stock, is_published, is_featured, rating)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, TRUE, $10, $11)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(product.name)
        .bind(product.description)
        .bind(product.price)
        .bind(json!([format!("https://images.example.com/{slug}.jpg")]))
        .bind(product.category)
        .bind(product.subcategory)
        .bind(json!(product.key_features))
        .bind(product.stock)
        .bind(product.featured)
        .bind(product.rating)
        .execute(pool)
        .await?;
    }

    println!("Seeded {} products", CATALOG.len());
    Ok(())
}
