mod common;

use salon_booking::{
    pricing::NegativePricePolicy,
    repo::discounts,
    validation::validate_discount,
    BookingError,
};

use common::memory_pool;

#[tokio::test]
async fn stored_discounts_apply_by_name() {
    let pool = memory_pool().await;
    let welcome = discounts::create(&pool, &validate_discount(" welcome ", "20").unwrap())
        .await
        .unwrap();
    discounts::create(&pool, &validate_discount("take10", "10").unwrap())
        .await
        .unwrap();

    assert_eq!(welcome.name, "welcome");
    assert_eq!(discounts::get(&pool, &welcome.id).await.unwrap(), welcome);
    assert_eq!(discounts::get_all(&pool).await.unwrap().len(), 2);

    let cases = [
        ("coloronly", Some("welcome"), 25.0),
        ("cutandcolor", Some("take10"), 70.0),
        ("washandcut", Some("nonexistent"), 65.0),
        ("washandcut", Some("  "), 65.0),
        ("washandcut", None, 65.0),
    ];
    for (service, discount, expected) in cases {
        let price = discounts::compute_price(&pool, service, discount, NegativePricePolicy::Allow)
            .await
            .unwrap();
        assert_eq!(price, expected, "{service} with {discount:?}");
    }
}

#[tokio::test]
async fn every_discount_sharing_a_name_is_subtracted() {
    let pool = memory_pool().await;
    for (name, amount) in [("spring", "5"), ("welcome", "20"), ("spring", "25")] {
        discounts::create(&pool, &validate_discount(name, amount).unwrap())
            .await
            .unwrap();
    }

    let found = discounts::find_by_name(&pool, "spring").await.unwrap().unwrap();
    assert_eq!(found.amount, 5.0);
    assert!(discounts::find_by_name(&pool, "autumn").await.unwrap().is_none());

    let all: Vec<f64> = discounts::find_all_by_name(&pool, " spring ")
        .await
        .unwrap()
        .iter()
        .map(|discount| discount.amount)
        .collect();
    assert_eq!(all, vec![5.0, 25.0]);

    let allow = NegativePricePolicy::Allow;
    let price = discounts::compute_price(&pool, "coloronly", Some("spring"), allow)
        .await
        .unwrap();
    assert_eq!(price, 15.0);

    // A third "spring" pushes the combined reduction past the base price.
    discounts::create(&pool, &validate_discount("spring", "20").unwrap())
        .await
        .unwrap();
    let price = discounts::compute_price(&pool, "coloronly", Some("spring"), allow)
        .await
        .unwrap();
    assert_eq!(price, -5.0);

    let floor = NegativePricePolicy::FloorAtZero;
    let price = discounts::compute_price(&pool, "coloronly", Some("spring"), floor)
        .await
        .unwrap();
    assert_eq!(price, 0.0);
}

#[tokio::test]
async fn unknown_service_and_missing_discount_fail() {
    let pool = memory_pool().await;
    let err = discounts::compute_price(&pool, "perm", None, NegativePricePolicy::Allow)
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::UnknownService(_)));

    let err = discounts::get(&pool, "3f2504e0-4f89-41d3-9a0c-0305e82c3301").await.unwrap_err();
    assert!(matches!(err, BookingError::NotFound { entity: "discount", .. }));
}

#[tokio::test]
async fn amount_outside_one_to_twenty_five_is_rejected() {
    for amount in ["0", "26", "-3", "lots"] {
        let err = validate_discount("big", amount).unwrap_err();
        assert!(matches!(err, BookingError::OutOfRange { .. }), "{amount}");
    }
    assert!(validate_discount("max", "25").is_ok());
}
