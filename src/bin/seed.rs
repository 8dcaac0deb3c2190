use marketplace_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    models::Role,
    services::auth_service::hash_password,
    slug::generate_slug,
};
use sqlx::PgPool;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;
    let pool = orm.get_postgres_connection_pool();

    let seller_id = ensure_user(pool, "Sekar Batik", "seller@example.com", "seller123", Role::Seller).await?;
    let buyer_id = ensure_user(pool, "Budi", "buyer@example.com", "buyer1234", Role::Buyer).await?;
    let store_id = ensure_store(pool, seller_id).await?;
    seed_categories(pool).await?;

    println!("Seed completed. Seller ID: {seller_id}, Buyer ID: {buyer_id}, Store ID: {store_id}");
    Ok(())
}

async fn ensure_user(
    pool: &PgPool,
    name: &str,
    email: &str,
    password: &str,
    role: Role,
) -> anyhow::Result<i64> {
    let password_hash = hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO users (name, email, password_hash, role)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .bind(role.as_str())
    .fetch_one(pool)
    .await?;

    Ok(id)
}

async fn ensure_store(pool: &PgPool, owner_id: i64) -> anyhow::Result<i64> {
    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO stores (name, description, whatsapp, address, user_id)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (name) DO UPDATE SET user_id = EXCLUDED.user_id
        RETURNING id
        "#,
    )
    .bind("Sekar Batik Solo")
    .bind("Hand-drawn batik tulis from Laweyan, Solo.")
    .bind("+6281234567890")
    .bind("Jl. Sidoluhur 12, Laweyan, Surakarta")
    .bind(owner_id)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

async fn seed_categories(pool: &PgPool) -> anyhow::Result<()> {
    let categories = ["Batik Tulis", "Batik Cap", "Kain Tenun", "Aksesoris"];

    for name in categories {
        sqlx::query(
            r#"
            INSERT INTO product_categories (category_name, slug)
            VALUES ($1, $2)
            ON CONFLICT (slug) DO NOTHING
            "#,
        )
        .bind(name)
        .bind(generate_slug(name, "category"))
        .execute(pool)
        .await?;
    }

    println!("Seeded categories");
    Ok(())
}
