use std::sync::Arc;

use marketplace_api::{
    db::{create_orm_conn, run_migrations},
    dto::{
        auth::RegisterRequest,
        form::MultipartForm,
        products::{CreateProductForm, UpdateProductForm},
        stores::CreateStoreRequest,
    },
    entity::product_categories::ActiveModel as CategoryActive,
    error::AppError,
    middleware::auth::AuthUser,
    models::Role,
    routes::params::PageQuery,
    services::{auth_service, product_service, store_service, token_service::JwtKeys},
    state::AppState,
    storage::{LocalFileStorage, UploadFile},
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set, Statement};
use tempfile::TempDir;

// Seller opens a store, lists a product, replaces its thumbnail image and
// deletes it; a second seller is kept out.
#[tokio::test]
async fn seller_product_lifecycle() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };

    let uploads = TempDir::new()?;
    let state = setup_state(&database_url, &uploads).await?;

    let seller = register(&state, "seller@example.com", Role::Seller).await?;
    let intruder = register(&state, "other@example.com", Role::Seller).await?;
    let buyer = register(&state, "buyer@example.com", Role::Buyer).await?;

    let store_request = || CreateStoreRequest {
        name: "Sekar Batik".into(),
        description: "Batik tulis from Solo".into(),
        whatsapp: "+6281234567890".into(),
        address: "Jl. Sidoluhur 12, Surakarta".into(),
    };
    assert!(matches!(
        store_service::create_store(&state, &buyer, store_request()).await,
        Err(AppError::Forbidden)
    ));
    let store = store_service::create_store(&state, &seller, store_request())
        .await?
        .data
        .unwrap();
    assert!(matches!(
        store_service::create_store(&state, &intruder, store_request()).await,
        Err(AppError::Conflict(_))
    ));

    let category = CategoryActive {
        id: NotSet,
        category_name: Set("Batik Tulis".into()),
        slug: Set("batik-tulis".into()),
    }
    .insert(&state.orm)
    .await?;

    let mut form = MultipartForm::default();
    form.insert_field("name", "Batik Parang");
    form.insert_field("description", "Hand-drawn parang motif");
    form.insert_field("price", "150000");
    form.insert_field("store_id", store.id.to_string());
    form.insert_field("category_id", category.id.to_string());
    form.insert_file("images", UploadFile::new("a.png", vec![1, 2, 3]));
    form.insert_file("images", UploadFile::new("b.jpg", vec![4, 5, 6]));
    form.insert_file("images", UploadFile::new("notes.txt", vec![7]));

    let product =
        product_service::create_product(&state, &seller, CreateProductForm::try_from(form)?)
            .await?
            .data
            .unwrap();
    assert_eq!(product.slug, "batik-parang");
    assert_eq!(product.images.len(), 2);
    assert_eq!(product.thumbnail, product.images[0].image);

    // Deleting the thumbnail and uploading a new image moves the thumbnail.
    let old_thumbnail = product.thumbnail.clone();
    let mut form = MultipartForm::default();
    form.insert_field("name", "Batik Parang");
    form.insert_field("imagesToDelete", serde_json::to_string(&[&old_thumbnail])?);
    form.insert_file("images", UploadFile::new("c.webp", vec![8, 9]));
    let update = UpdateProductForm::try_from(form)?;

    let mut stolen = MultipartForm::default();
    stolen.insert_field("name", "Stolen");
    assert!(matches!(
        product_service::update_product(
            &state,
            &intruder,
            &product.slug,
            UpdateProductForm::try_from(stolen)?
        )
        .await,
        Err(AppError::Forbidden)
    ));

    let updated = product_service::update_product(&state, &seller, &product.slug, update)
        .await?
        .data
        .unwrap();
    assert_eq!(updated.slug, "batik-parang");
    assert_eq!(updated.images.len(), 2);
    assert_ne!(updated.thumbnail, old_thumbnail);
    assert!(updated.images.iter().any(|img| img.image == updated.thumbnail));
    assert!(!updated.images.iter().any(|img| img.image == old_thumbnail));
    assert!(state.storage.resolve(&old_thumbnail).is_some_and(|p| !p.exists()));

    let listing = product_service::list_public_products(&state, PageQuery::default()).await?;
    let meta = listing.meta.unwrap();
    assert_eq!(meta.total_items, Some(1));
    assert_eq!(meta.limit, Some(product_service::PUBLIC_PAGE_LIMIT));

    product_service::delete_product(&state, &seller, &updated.slug).await?;
    assert!(matches!(
        product_service::get_public_product(&state, &updated.slug).await,
        Err(AppError::NotFound)
    ));

    Ok(())
}

async fn setup_state(database_url: &str, uploads: &TempDir) -> anyhow::Result<AppState> {
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;

    // Clean tables between runs
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE product_images, products, product_categories, stores, articles, audit_logs, users RESTART IDENTITY CASCADE",
    ))
    .await?;

    Ok(AppState {
        orm,
        jwt: Arc::new(JwtKeys::new("test-secret", "batik", 300)),
        storage: Arc::new(LocalFileStorage::new(uploads.path())),
    })
}

async fn register(state: &AppState, email: &str, role: Role) -> anyhow::Result<AuthUser> {
    let user = auth_service::register_user(
        state,
        RegisterRequest {
            name: "Test User".into(),
            email: email.into(),
            password: "password123".into(),
            role,
        },
    )
    .await?
    .data
    .unwrap();

    Ok(AuthUser {
        user_id: user.id,
        email: user.email,
        role,
    })
}
