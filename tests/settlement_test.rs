mod common;

use anyhow::Result;
use common::{parse_date, test_service, StandardFleet};
use fleetdesk::application::PaymentFilter;
use fleetdesk::domain::{Entity, SettlementStatus, Supplier, ValidationError};

#[tokio::test]
async fn test_payment_goes_to_hire_supplier() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let yard = StandardFleet::create(&service).await?;

    let hire = service
        .hires()
        .create_hire(yard.rented_in_request())
        .await?;

    // Payments can be recorded while the hire is still open
    let payment = service
        .settlements()
        .record_payment(hire.id, parse_date("2024-03-05"), 30000)
        .await?;

    assert_eq!(payment.supplier_id, yard.supplier_id);
    assert_eq!(payment.hire_id, hire.id);
    assert_eq!(payment.amount_cents, 30000);
    assert_eq!(payment.payment_date, parse_date("2024-03-05"));
    assert_eq!(payment.status, SettlementStatus::Pending);

    let stored = service.settlements().get_payment(payment.id).await?;
    assert_eq!(stored, payment);

    Ok(())
}

#[tokio::test]
async fn test_payment_requires_supplier_on_hire() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let yard = StandardFleet::create(&service).await?;

    let owned = service
        .hires()
        .create_hire(yard.owned_request(yard.acme_id, 5000))
        .await?;
    let err = service
        .settlements()
        .record_payment(owned.id, parse_date("2024-03-05"), 1000)
        .await
        .unwrap_err();
    assert_eq!(
        err.validation(),
        Some(&ValidationError::NoSupplierOnHire(owned.id))
    );

    let err = service
        .settlements()
        .record_payment(5150, parse_date("2024-03-05"), 1000)
        .await
        .unwrap_err();
    assert!(err.is_not_found(Entity::Hire));

    let payments = service
        .settlements()
        .list_payments(&PaymentFilter::default())
        .await?;
    assert!(payments.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_payment_amount_must_be_positive() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let yard = StandardFleet::create(&service).await?;

    let hire = service
        .hires()
        .create_hire(yard.rented_in_request())
        .await?;
    for amount in [0, -100] {
        let err = service
            .settlements()
            .record_payment(hire.id, parse_date("2024-03-05"), amount)
            .await
            .unwrap_err();
        assert_eq!(err.validation(), Some(&ValidationError::InvalidAmount(amount)));
    }

    Ok(())
}

#[tokio::test]
async fn test_settlement_status_lifecycle() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let yard = StandardFleet::create(&service).await?;
    let settlements = service.settlements();

    let hire = service
        .hires()
        .create_hire(yard.rented_in_request())
        .await?;
    let payment = settlements
        .record_payment(hire.id, parse_date("2024-03-05"), 30000)
        .await?;

    let paid = settlements
        .update_payment_status(payment.id, SettlementStatus::Paid)
        .await?;
    assert_eq!(paid.status, SettlementStatus::Paid);

    // Paid -> Paid is a no-op
    let again = settlements
        .update_payment_status(payment.id, SettlementStatus::Paid)
        .await?;
    assert_eq!(again.status, SettlementStatus::Paid);

    let err = settlements
        .update_payment_status(payment.id, SettlementStatus::Pending)
        .await
        .unwrap_err();
    assert_eq!(
        err.validation(),
        Some(&ValidationError::InvalidTransition {
            entity: Entity::Payment,
            from: "Paid".to_string(),
            to: "Pending".to_string(),
        })
    );

    let reverted = settlements
        .override_payment_status(payment.id, SettlementStatus::Pending)
        .await?;
    assert_eq!(reverted.status, SettlementStatus::Pending);

    let err = settlements
        .override_payment_status(321, SettlementStatus::Paid)
        .await
        .unwrap_err();
    assert!(err.is_not_found(Entity::Payment));

    Ok(())
}

#[tokio::test]
async fn test_search_payments() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let yard = StandardFleet::create(&service).await?;
    let settlements = service.settlements();

    let other = service
        .register_supplier(Supplier::new("Southern Cranes"))
        .await?;

    let first = service
        .hires()
        .create_hire(yard.rented_in_request())
        .await?;
    let second = service
        .hires()
        .create_hire(yard.rented_in_request().with_supplier(other.id))
        .await?;

    let date = parse_date("2024-03-05");
    let p1 = settlements.record_payment(first.id, date, 10000).await?;
    let p2 = settlements.record_payment(first.id, date, 5000).await?;
    let p3 = settlements.record_payment(second.id, date, 7000).await?;
    settlements
        .update_payment_status(p2.id, SettlementStatus::Paid)
        .await?;

    let all = settlements.list_payments(&PaymentFilter::default()).await?;
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].supplier_name, "Northern Plant Hire");
    assert_eq!(all[2].supplier_name, "Southern Cranes");

    let northern = settlements
        .list_payments(&PaymentFilter {
            supplier_name: Some("Northern".into()),
            ..Default::default()
        })
        .await?;
    let ids: Vec<_> = northern.iter().map(|s| s.payment.id).collect();
    assert_eq!(ids, vec![p1.id, p2.id]);

    let pending = settlements
        .list_payments(&PaymentFilter {
            status: Some("Pending".into()),
            ..Default::default()
        })
        .await?;
    let ids: Vec<_> = pending.iter().map(|s| s.payment.id).collect();
    assert_eq!(ids, vec![p1.id, p3.id]);

    let northern_paid = settlements
        .list_payments(&PaymentFilter {
            supplier_name: Some("Northern".into()),
            status: Some("Paid".into()),
        })
        .await?;
    assert_eq!(northern_paid.len(), 1);
    assert_eq!(northern_paid[0].payment.id, p2.id);

    let lowercase = settlements
        .list_payments(&PaymentFilter {
            supplier_name: Some("northern".into()),
            ..Default::default()
        })
        .await?;
    assert!(lowercase.is_empty());

    Ok(())
}
