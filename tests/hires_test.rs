mod common;

use anyhow::Result;
use common::{parse_date, test_service, StandardFleet};
use fleetdesk::application::{AppError, HireFilter};
use fleetdesk::domain::{Entity, HireRequest, HireStatus, HireType, ValidationError};

#[tokio::test]
async fn test_rented_in_hire_requires_supplier() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let yard = StandardFleet::create(&service).await?;

    let request = HireRequest::new(
        "F1",
        yard.driver_id,
        yard.acme_id,
        "Daily",
        parse_date("2024-03-01"),
        15000,
    );
    let err = service.hires().create_hire(request).await.unwrap_err();
    assert_eq!(
        err.validation(),
        Some(&ValidationError::SupplierRequired {
            fleet_id: "F1".to_string()
        })
    );

    // An unknown supplier does not satisfy the rule either
    let request = yard.rented_in_request().with_supplier(9999);
    let err = service.hires().create_hire(request).await.unwrap_err();
    assert!(matches!(
        err.validation(),
        Some(ValidationError::SupplierRequired { .. })
    ));

    // Nothing was written
    let hires = service.hires().list_hires(&HireFilter::default()).await?;
    assert!(hires.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_rented_in_hire_records_supplier_and_total() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let yard = StandardFleet::create(&service).await?;

    let hire = service
        .hires()
        .create_hire(yard.rented_in_request())
        .await?;

    assert_eq!(hire.fleet_id, "F1");
    assert_eq!(hire.supplier_id, Some(yard.supplier_id));
    assert_eq!(hire.hire_type, HireType::Daily);
    assert_eq!(hire.total_cents, 45000);
    assert_eq!(hire.status, HireStatus::Open);

    // Stored values match what was returned
    let stored = service.hires().get_hire(hire.id).await?;
    assert_eq!(stored, hire);

    Ok(())
}

#[tokio::test]
async fn test_owned_hire_without_supplier() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let yard = StandardFleet::create(&service).await?;

    let hire = service
        .hires()
        .create_hire(yard.owned_request(yard.beta_id, 80000))
        .await?;
    assert_eq!(hire.supplier_id, None);
    assert_eq!(hire.quantity, 1);
    assert_eq!(hire.total_cents, 80000);

    // A supplier on an owned asset is optional, but must exist when given
    let err = service
        .hires()
        .create_hire(yard.owned_request(yard.beta_id, 80000).with_supplier(4242))
        .await
        .unwrap_err();
    assert!(err.is_not_found(Entity::Supplier));

    Ok(())
}

#[tokio::test]
async fn test_references_checked_in_order() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let yard = StandardFleet::create(&service).await?;
    let start = parse_date("2024-03-01");

    // Unknown fleet is reported before unknown driver
    let request = HireRequest::new("F404", 777, 888, "Daily", start, 1000);
    let err = service.hires().create_hire(request).await.unwrap_err();
    assert!(err.is_not_found(Entity::Fleet));

    let request = HireRequest::new("F2", 777, 888, "Daily", start, 1000);
    let err = service.hires().create_hire(request).await.unwrap_err();
    assert!(err.is_not_found(Entity::Driver));

    let request = HireRequest::new("F2", yard.driver_id, 888, "Daily", start, 1000);
    let err = service.hires().create_hire(request).await.unwrap_err();
    assert!(err.is_not_found(Entity::Customer));

    // References are checked before the hire's own terms
    let request = HireRequest::new("F2", yard.driver_id, 888, "Hourly", start, -5);
    let err = service.hires().create_hire(request).await.unwrap_err();
    assert!(err.is_not_found(Entity::Customer));

    Ok(())
}

#[tokio::test]
async fn test_invalid_terms_rejected() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let yard = StandardFleet::create(&service).await?;

    let err = service
        .hires()
        .create_hire(HireRequest::new(
            "F2",
            yard.driver_id,
            yard.acme_id,
            "Hourly",
            parse_date("2024-03-01"),
            1000,
        ))
        .await
        .unwrap_err();
    assert_eq!(
        err.validation(),
        Some(&ValidationError::InvalidHireType("Hourly".to_string()))
    );

    let err = service
        .hires()
        .create_hire(yard.owned_request(yard.acme_id, 0))
        .await
        .unwrap_err();
    assert_eq!(err.validation(), Some(&ValidationError::InvalidRate(0)));

    let err = service
        .hires()
        .create_hire(yard.owned_request(yard.acme_id, 1000).with_quantity(0))
        .await
        .unwrap_err();
    assert_eq!(err.validation(), Some(&ValidationError::InvalidQuantity(0)));

    let err = service
        .hires()
        .create_hire(
            yard.owned_request(yard.acme_id, 1000)
                .with_end_date(parse_date("2024-02-01")),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err.validation(),
        Some(ValidationError::EndBeforeStart { .. })
    ));

    let err = service
        .hires()
        .create_hire(
            yard.owned_request(yard.acme_id, i64::MAX / 2)
                .with_quantity(3),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err.validation(),
        Some(ValidationError::AmountOverflow { .. })
    ));

    let hires = service.hires().list_hires(&HireFilter::default()).await?;
    assert!(hires.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_status_lifecycle() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let yard = StandardFleet::create(&service).await?;
    let hires = service.hires();

    let hire = hires
        .create_hire(yard.owned_request(yard.acme_id, 5000))
        .await?;

    // Same status is a no-op
    let same = hires.transition_status(hire.id, HireStatus::Open).await?;
    assert_eq!(same.status, HireStatus::Open);

    let completed = hires
        .transition_status(hire.id, HireStatus::Completed)
        .await?;
    assert_eq!(completed.status, HireStatus::Completed);

    // Completed is final
    let err = hires
        .transition_status(hire.id, HireStatus::Open)
        .await
        .unwrap_err();
    assert_eq!(
        err.validation(),
        Some(&ValidationError::InvalidTransition {
            entity: Entity::Hire,
            from: "Completed".to_string(),
            to: "Open".to_string(),
        })
    );
    let err = hires
        .transition_status(hire.id, HireStatus::Cancelled)
        .await
        .unwrap_err();
    assert!(matches!(
        err.validation(),
        Some(ValidationError::InvalidTransition { .. })
    ));

    // The administrative override ignores the lifecycle
    let reopened = hires.override_status(hire.id, HireStatus::Open).await?;
    assert_eq!(reopened.status, HireStatus::Open);

    let err = hires
        .transition_status(999, HireStatus::Completed)
        .await
        .unwrap_err();
    assert!(err.is_not_found(Entity::Hire));
    let err = hires
        .override_status(999, HireStatus::Completed)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound { .. }));

    Ok(())
}

#[tokio::test]
async fn test_list_and_filter_hires() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let yard = StandardFleet::create(&service).await?;
    let hires = service.hires();

    let first = hires.create_hire(yard.rented_in_request()).await?;
    let second = hires
        .create_hire(yard.owned_request(yard.beta_id, 7000))
        .await?;
    let third = hires
        .create_hire(yard.owned_request(yard.acme_id, 9000))
        .await?;
    hires
        .transition_status(second.id, HireStatus::Completed)
        .await?;
    hires
        .transition_status(third.id, HireStatus::Cancelled)
        .await?;

    let all = hires.list_hires(&HireFilter::default()).await?;
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].hire.id, first.id);
    assert_eq!(all[0].customer_name, "Acme Builders");
    assert_eq!(all[1].customer_name, "Beta Roads");

    // Empty filter text means no filter
    let unfiltered = hires
        .list_hires(&HireFilter {
            status: Some(String::new()),
        })
        .await?;
    assert_eq!(unfiltered, all);

    let open = hires
        .list_hires(&HireFilter {
            status: Some("Open".into()),
        })
        .await?;
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].hire.id, first.id);

    // Substring match
    let cancelled = hires
        .list_hires(&HireFilter {
            status: Some("Cancel".into()),
        })
        .await?;
    assert_eq!(cancelled.len(), 1);
    assert_eq!(cancelled[0].hire.id, third.id);

    // Case-sensitive
    let lowercase = hires
        .list_hires(&HireFilter {
            status: Some("open".into()),
        })
        .await?;
    assert!(lowercase.is_empty());

    // Wildcard characters are matched literally
    let wildcard = hires
        .list_hires(&HireFilter {
            status: Some("%".into()),
        })
        .await?;
    assert!(wildcard.is_empty());

    // Listing does not change anything
    let again = hires.list_hires(&HireFilter::default()).await?;
    assert_eq!(again, all);

    Ok(())
}
