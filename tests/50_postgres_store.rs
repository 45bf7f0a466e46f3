// Exercises the sqlx store directly. Runs only when DATABASE_URL points at a
// PostgreSQL the suite may write to; otherwise each test returns early.
use anyhow::Result;
use chrono::NaiveDate;

use benefits_api::config::DatabaseConfig;
use benefits_api::database::models::{BenefitInput, ChildInput};
use benefits_api::database::{
    AssociationStore, BenefitStore, ChildStore, DatabaseError, DatabaseManager, FilterStore, PgStore,
};
use benefits_api::filter::{FilterAssignment, FilterDefinitionInput, FilterType, FilterValue, OwnerKind};

async fn connect() -> Result<Option<PgStore>> {
    let Some(url) = std::env::var("DATABASE_URL").ok().filter(|u| !u.is_empty()) else {
        eprintln!("DATABASE_URL not set; skipping PostgreSQL store test");
        return Ok(None);
    };

    let config = DatabaseConfig { url: Some(url), max_connections: 2, ..Default::default() };
    let db = DatabaseManager::connect(&config).await?;
    db.ensure_schema().await?;
    Ok(Some(PgStore::new(db)))
}

fn marker() -> String {
    format!("T{}", uuid::Uuid::new_v4().simple())
}

async fn number_filter(store: &PgStore, name: &str) -> Result<i64> {
    let filter = store
        .create_filter(&FilterDefinitionInput {
            name: name.to_string(),
            filter_type: FilterType::NumberRange,
            hint: None,
            values: vec![],
        })
        .await?;
    Ok(filter.id)
}

#[tokio::test]
async fn replace_all_swaps_the_whole_set() -> Result<()> {
    let Some(store) = connect().await? else { return Ok(()) };
    let tag = marker();
    let age = number_filter(&store, &format!("Age {}", tag)).await?;
    let weight = number_filter(&store, &format!("Weight {}", tag)).await?;

    let child = store
        .create_child(
            1,
            &ChildInput {
                first_name: "Ada".into(),
                last_name: tag.clone(),
                birth_date: NaiveDate::from_ymd_opt(2019, 5, 4).unwrap(),
            },
        )
        .await?;

    let first = store
        .replace_all(
            OwnerKind::Child,
            child.id,
            &[
                FilterAssignment::new(age, FilterValue::exact("5")),
                FilterAssignment::new(weight, FilterValue::range(Some("18"), Some("20"))),
            ],
        )
        .await?;
    assert_eq!(first.len(), 2);

    store
        .replace_all(OwnerKind::Child, child.id, &[FilterAssignment::new(weight, FilterValue::exact("19"))])
        .await?;
    let stored = store.list_associations(OwnerKind::Child, child.id).await?;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].filter_id, weight);
    assert_eq!(stored[0].value.value.as_deref(), Some("19"));

    // A failing insert rolls back the delete as well
    let failed = store
        .replace_all(OwnerKind::Child, child.id, &[FilterAssignment::new(i64::MAX, FilterValue::exact("1"))])
        .await;
    assert!(matches!(failed, Err(DatabaseError::NotFound(_))));
    assert_eq!(store.list_associations(OwnerKind::Child, child.id).await?.len(), 1);

    assert_eq!(store.delete_all(OwnerKind::Child, child.id).await?, 1);
    assert!(store.list_associations(OwnerKind::Child, child.id).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn filter_delete_cascades_to_benefits() -> Result<()> {
    let Some(store) = connect().await? else { return Ok(()) };
    let tag = marker();
    let age = number_filter(&store, &format!("Age {}", tag)).await?;

    let benefit = store
        .create_benefit(&BenefitInput {
            title: tag.clone(),
            filters: vec![FilterAssignment::new(age, FilterValue::range(Some("0"), Some("6")))],
            ..Default::default()
        })
        .await?;
    assert_eq!(benefit.filters.len(), 1);

    store.delete_filter(age).await?;
    assert!(store.get_benefit(benefit.id).await?.filters.is_empty());
    assert!(matches!(store.get_filter(age).await, Err(DatabaseError::NotFound(_))));
    Ok(())
}

#[tokio::test]
async fn filter_listing_is_case_sensitive() -> Result<()> {
    let Some(store) = connect().await? else { return Ok(()) };
    let tag = marker();
    let id = number_filter(&store, &format!("Region {}", tag)).await?;

    let hits = store.list_filters(Some(&tag)).await?;
    assert_eq!(hits.iter().map(|f| f.id).collect::<Vec<_>>(), vec![id]);
    assert!(store.list_filters(Some(&tag.to_lowercase())).await?.is_empty());

    // LIKE wildcards are matched literally
    assert!(store.list_filters(Some(&format!("Region%{}", &tag[1..]))).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn user_selections_are_unique_per_filter() -> Result<()> {
    let Some(store) = connect().await? else { return Ok(()) };
    let age = number_filter(&store, &format!("Age {}", marker())).await?;
    let user_id = (uuid::Uuid::new_v4().as_u128() >> 72) as i64;

    store.create_association(OwnerKind::User, user_id, age, &FilterValue::exact("30")).await?;
    let duplicate = store.create_association(OwnerKind::User, user_id, age, &FilterValue::exact("31")).await;
    assert!(matches!(duplicate, Err(DatabaseError::Conflict(_))));

    let updated = store.update_association(OwnerKind::User, user_id, age, &FilterValue::exact("31")).await?;
    assert_eq!(updated.value.value.as_deref(), Some("31"));
    Ok(())
}
