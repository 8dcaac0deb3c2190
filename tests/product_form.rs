use marketplace_api::{
    dto::{
        form::MultipartForm,
        products::{CreateProductForm, UpdateProductForm, parse_images_to_delete},
    },
    error::AppError,
    storage::UploadFile,
};
use rust_decimal::Decimal;

#[test]
fn deletion_list_accepts_empty_forms() {
    for raw in ["", "  ", "[]", "null"] {
        assert!(parse_images_to_delete(raw).unwrap().is_empty(), "{raw:?}");
    }
}

#[test]
fn deletion_list_drops_blank_entries() {
    let paths =
        parse_images_to_delete(r#"["/uploads/product-images/a.png", " ", ""]"#).unwrap();
    assert_eq!(paths, vec!["/uploads/product-images/a.png".to_string()]);
}

#[test]
fn deletion_list_rejects_foreign_paths() {
    let err = parse_images_to_delete(r#"["/uploads/product-images/a.png", "/etc/passwd"]"#)
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    assert!(matches!(
        parse_images_to_delete("not json"),
        Err(AppError::Validation(_))
    ));
}

fn create_form() -> MultipartForm {
    let mut form = MultipartForm::default();
    form.insert_field("name", "Batik Parang");
    form.insert_field("description", "Hand-drawn parang motif");
    form.insert_field("price", "150000.50");
    form.insert_field("store_id", "1");
    form.insert_field("category_id", "2");
    form
}

#[test]
fn create_form_requires_an_image() {
    let err = CreateProductForm::try_from(create_form()).unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let mut form = create_form();
    form.insert_file("images", UploadFile::new("a.png", vec![1, 2, 3]));
    let parsed = CreateProductForm::try_from(form).unwrap();
    assert_eq!(parsed.price, Decimal::new(15_000_050, 2));
    assert_eq!(parsed.images.len(), 1);
}

#[test]
fn create_form_rejects_non_positive_price() {
    let mut form = create_form();
    form.insert_field("price", "0");
    form.insert_file("images", UploadFile::new("a.png", vec![1]));
    assert!(matches!(
        CreateProductForm::try_from(form),
        Err(AppError::Validation(_))
    ));
}

#[test]
fn update_form_treats_blank_fields_as_unchanged() {
    let mut form = MultipartForm::default();
    form.insert_field("name", "Batik Kawung");
    form.insert_field("description", "  ");
    form.insert_field("price", "");
    form.insert_field("imagesToDelete", r#"["/uploads/product-images/a.png"]"#);

    let parsed = UpdateProductForm::try_from(form).unwrap();
    assert_eq!(parsed.name, "Batik Kawung");
    assert!(parsed.description.is_none());
    assert!(parsed.price.is_none());
    assert_eq!(parsed.images_to_delete.len(), 1);
    assert!(parsed.images.is_empty());
}
