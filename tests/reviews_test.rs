mod common;

use salon_booking::{
    models::{Review, User},
    repo::{
        reviews::{self, RatingOrder},
        users,
    },
    validation::validate_review,
    BookingError,
};
use sqlx::SqlitePool;

use common::{customer, hairdresser, memory_pool};

async fn post(
    pool: &SqlitePool,
    poster: &User,
    hairdresser: &User,
    body: &str,
    rating: &str,
) -> Review {
    let review = validate_review(&poster.id, &hairdresser.id, body, rating).unwrap();
    reviews::create(pool, &review).await.unwrap()
}

fn ratings(found: &[Review]) -> Vec<f64> {
    found.iter().map(|review| review.rating).collect()
}

#[tokio::test]
async fn create_links_poster_and_hairdresser() {
    let pool = memory_pool().await;
    let alma = customer(&pool, "alma@example.com").await;
    let alex = hairdresser(&pool, "alex@example.com").await;

    let review = post(&pool, &alma, &alex, "  Great color!  ", "4.6").await;
    assert_eq!(review.body, "Great color!");
    assert_eq!(reviews::get(&pool, &review.id).await.unwrap(), review);

    let alma = users::get(&pool, &alma.id).await.unwrap();
    let alex = users::get(&pool, &alex.id).await.unwrap();
    assert_eq!(alma.review_ids, vec![review.id.clone()]);
    assert_eq!(alex.review_ids, vec![review.id.clone()]);
    assert!(alma.appointment_ids.is_empty());
}

#[tokio::test]
async fn sorting_by_rating_keeps_ties_in_posting_order() {
    let pool = memory_pool().await;
    let alma = customer(&pool, "alma@example.com").await;
    let alex = hairdresser(&pool, "alex@example.com").await;

    let first_four = post(&pool, &alma, &alex, "first four", "4").await;
    post(&pool, &alma, &alex, "one", "1.3").await;
    let second_four = post(&pool, &alma, &alex, "second four", "4").await;
    post(&pool, &alma, &alex, "best", "4.8").await;

    let desc = reviews::sorted_by_rating(&pool, RatingOrder::Descending).await.unwrap();
    assert_eq!(ratings(&desc), vec![4.8, 4.0, 4.0, 1.3]);
    assert_eq!(desc[1].id, first_four.id);
    assert_eq!(desc[2].id, second_four.id);

    let asc = reviews::sorted_by_rating(&pool, RatingOrder::Ascending).await.unwrap();
    assert_eq!(ratings(&asc), vec![1.3, 4.0, 4.0, 4.8]);
    assert_eq!(asc[1].id, first_four.id);
}

#[tokio::test]
async fn search_is_literal_and_case_insensitive() {
    let pool = memory_pool().await;
    let alma = customer(&pool, "alma@example.com").await;
    let alex = hairdresser(&pool, "alex@example.com").await;

    post(&pool, &alma, &alex, "I believe that the service was first-class!", "4.6").await;
    post(&pool, &alma, &alex, "Cut took (far) too long.", "2").await;

    assert_eq!(reviews::search(&pool, "FIRST-CLASS").await.unwrap().len(), 1);
    assert_eq!(reviews::search(&pool, "(far)").await.unwrap().len(), 1);
    assert!(reviews::search(&pool, "f.r").await.unwrap().is_empty());

    let err = reviews::get_by_search(&pool, "terrible").await.unwrap_err();
    assert!(matches!(err, BookingError::NotFound { key: "term", .. }));

    let err = reviews::search(&pool, "   ").await.unwrap_err();
    assert!(matches!(err, BookingError::EmptyField { .. }));
}

#[tokio::test]
async fn by_poster_and_by_hairdresser() {
    let pool = memory_pool().await;
    let alma = customer(&pool, "alma@example.com").await;
    let john = customer(&pool, "john@example.com").await;
    let alex = hairdresser(&pool, "alex@example.com").await;
    let zach = hairdresser(&pool, "zach@example.com").await;

    post(&pool, &alma, &alex, "lovely", "5").await;
    post(&pool, &john, &alex, "fine", "3").await;

    assert_eq!(reviews::get_by_poster(&pool, &alma.id).await.unwrap().len(), 1);
    assert_eq!(reviews::get_by_hairdresser(&pool, &alex.id).await.unwrap().len(), 2);

    assert!(reviews::find_by_hairdresser(&pool, &zach.id).await.unwrap().is_empty());
    let err = reviews::get_by_hairdresser(&pool, &zach.id).await.unwrap_err();
    assert!(matches!(err, BookingError::NotFound { entity: "review", .. }));

    let err = reviews::get_by_poster(&pool, &zach.id).await.unwrap_err();
    assert!(matches!(err, BookingError::NotFound { key: "poster id", .. }));
}

#[tokio::test]
async fn out_of_range_rating_never_reaches_the_store() {
    let pool = memory_pool().await;
    let alma = customer(&pool, "alma@example.com").await;
    let alex = hairdresser(&pool, "alex@example.com").await;

    for rating in ["0", "5.5", "great"] {
        let err = validate_review(&alma.id, &alex.id, "hmm", rating).unwrap_err();
        assert!(matches!(err, BookingError::OutOfRange { .. }), "{rating}");
    }
    assert!(reviews::get_all(&pool).await.unwrap().is_empty());
}
