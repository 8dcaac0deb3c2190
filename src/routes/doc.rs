use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        articles::{ArticleList, ArticleRequest, UploadImageForm, UploadImageResponse},
        auth::{LoginRequest, LoginResponse, RegisterRequest, UserList},
        products::{
            AddProductImageForm, CategoryList, CreateProductForm, PublicProductList, StoreCatalog,
            StoreProducts, UpdateProductForm,
        },
        stores::{CreateStoreRequest, StoreList, UpdateStoreForm},
    },
    models::{
        Article, Product, ProductCard, ProductCategory, ProductDetail, ProductImage,
        PublicProductCard, PublicStore, Role, Store, User,
    },
    pagination::Pagination,
    response::{ApiResponse, Meta},
    routes::{articles, auth, categories, health, params, products, stores, users},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        users::list_users,
        stores::list_stores,
        stores::list_stores_paginated,
        stores::get_store_by_user,
        stores::create_store,
        stores::get_store,
        stores::update_store,
        stores::list_store_products,
        stores::store_catalog,
        products::list_products,
        products::latest_products,
        products::list_products_by_category,
        products::get_public_product,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        products::add_product_image,
        products::delete_product_image,
        categories::list_categories,
        articles::list_articles,
        articles::latest_articles,
        articles::search_articles,
        articles::get_article,
        articles::get_article_by_slug,
        articles::create_article,
        articles::update_article,
        articles::delete_article,
        articles::upload_image
    ),
    components(
        schemas(
            Role,
            User,
            Store,
            PublicStore,
            Product,
            ProductCard,
            PublicProductCard,
            ProductDetail,
            ProductImage,
            ProductCategory,
            Article,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            UserList,
            CreateStoreRequest,
            UpdateStoreForm,
            StoreList,
            CreateProductForm,
            UpdateProductForm,
            AddProductImageForm,
            PublicProductList,
            StoreProducts,
            StoreCatalog,
            CategoryList,
            ArticleRequest,
            ArticleList,
            UploadImageForm,
            UploadImageResponse,
            params::PageQuery,
            params::ArticleSearchQuery,
            Pagination,
            Meta,
            ApiResponse<Product>,
            ApiResponse<PublicProductList>,
            ApiResponse<StoreList>,
            ApiResponse<ArticleList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration and login"),
        (name = "Users", description = "User directory"),
        (name = "Stores", description = "Seller stores"),
        (name = "Products", description = "Product catalog and images"),
        (name = "Categories", description = "Product categories"),
        (name = "Articles", description = "Editorial articles and uploads"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
