use marketplace_api::{
    pagination::{DEFAULT_LIMIT, Pagination, paginate},
    response::Meta,
    routes::params::PageQuery,
};

#[test]
fn paginate_normalizes_page_and_limit() {
    let p = paginate(0, 0, 25);
    assert_eq!(p.page, 1);
    assert_eq!(p.limit, DEFAULT_LIMIT);
    assert_eq!(p.total_pages, 3);
    assert_eq!(p.offset(), 0);
}

#[test]
fn empty_result_still_has_one_page() {
    let p = paginate(3, 10, 0);
    assert_eq!(p.page, 3);
    assert_eq!(p.limit, 10);
    assert_eq!(p.total_items, 0);
    assert_eq!(p.total_pages, 1);
    assert_eq!(p.offset(), 20);
}

#[test]
fn endpoint_default_limit_applies() {
    let p = Pagination::with_default_limit(2, -5, 100, 40);
    assert_eq!(p.limit, 40);
    assert_eq!(p.total_pages, 3);
    assert_eq!(p.offset(), 40);
}

#[test]
fn meta_serializes_camel_case() {
    let meta = Meta::from(paginate(1, 10, 11));
    let json = serde_json::to_value(meta).unwrap();
    assert_eq!(json["totalItems"], 11);
    assert_eq!(json["totalPages"], 2);
}

#[test]
fn page_query_falls_back_on_out_of_range_limit() {
    let query = PageQuery {
        page: Some(-1),
        limit: Some(500),
        search: None,
    };
    assert_eq!(query.resolve(12, 50), (1, 12));

    let query = PageQuery {
        page: Some(2),
        limit: Some(50),
        search: Some("  ".into()),
    };
    assert_eq!(query.resolve(12, 50), (2, 50));
    assert_eq!(query.search_pattern(), None);
}

#[test]
fn huge_page_number_does_not_overflow_offset() {
    let query = PageQuery {
        page: Some(i64::MAX),
        limit: Some(40),
        search: None,
    };
    let (page, limit) = query.resolve(40, 100);
    let p = Pagination::with_default_limit(page, limit, 5, 40);
    assert_eq!(p.page, i64::MAX);
    assert_eq!(p.offset(), i64::MAX as u64);
    assert_eq!(p.total_pages, 1);
}
