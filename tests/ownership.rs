use marketplace_api::{
    error::AppError,
    middleware::auth::{Access, AuthUser, authorize, bearer_token, ensure_owner, ensure_seller},
    models::Role,
    services::token_service::JwtKeys,
};

fn user(user_id: i64, role: Role) -> AuthUser {
    AuthUser {
        user_id,
        email: format!("user{user_id}@example.com"),
        role,
    }
}

#[test]
fn authorize_denies_whenever_actor_differs() {
    for (actor, owner) in [(1, 2), (2, 1), (0, 5), (-1, 1)] {
        assert_eq!(authorize(actor, owner), Access::Denied);
    }
    assert_eq!(authorize(4, 4), Access::Allowed);
}

#[test]
fn ensure_owner_maps_denial_to_forbidden() {
    let seller = user(1, Role::Seller);
    assert!(ensure_owner(&seller, 1).is_ok());
    assert!(matches!(ensure_owner(&seller, 2), Err(AppError::Forbidden)));
}

#[test]
fn only_sellers_pass_the_seller_check() {
    assert!(ensure_seller(&user(1, Role::Seller)).is_ok());
    assert!(matches!(
        ensure_seller(&user(1, Role::Buyer)),
        Err(AppError::Forbidden)
    ));
}

#[test]
fn bearer_prefix_is_optional() {
    assert_eq!(bearer_token("Bearer abc.def"), Some("abc.def"));
    assert_eq!(bearer_token("abc.def"), Some("abc.def"));
    assert_eq!(bearer_token("Bearer "), None);
}

#[test]
fn tokens_round_trip_and_reject_other_issuers() {
    let keys = JwtKeys::new("secret", "batik", 300);
    let token = keys.issue("seller@example.com").unwrap();
    let claims = keys.validate(&token).unwrap();
    assert_eq!(claims.email, "seller@example.com");
    assert_eq!(claims.iss, "batik");
    assert!(claims.exp > claims.iat);

    let foreign = JwtKeys::new("secret", "elsewhere", 300);
    assert!(matches!(
        foreign.validate(&token),
        Err(AppError::Unauthorized(_))
    ));
}
