//! End-to-end repository tests against a real Postgres database.
//!
//! These tests verify that:
//! - Approval awards points exactly once, with one matching ledger entry
//! - The daily cap truncates awards even under concurrent approvals
//! - Duplicate uploads are rejected by the unique index
//! - Concurrent redemptions never overspend a balance
//! - A user can be referred at most once
//!
//! Tests connect to `DATABASE_URL` (or `DANKPASS__DATABASE__URL`) and
//! skip themselves when neither is set.

#![allow(clippy::uninlined_format_args)]

use std::env;
use std::sync::Arc;

use futures::future::join_all;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use tokio::sync::Barrier;
use uuid::Uuid;

use dankpass_core::extraction::ExtractedReceipt;
use dankpass_core::points::PointsConfig;
use dankpass_db::entities::{
    partners, users,
    sea_orm_active_enums::{LedgerEntryKind, PartnerStatus, ReceiptStatus, UserTier},
};
use dankpass_db::migration::Migrator;
use dankpass_db::repositories::receipt::{CreateReceiptInput, ReceiptRepoError};
use dankpass_db::repositories::perk::CreatePerkInput;
use dankpass_db::{
    LedgerRepository, PerkRepository, ReceiptRepository, ReferralRepository,
};

async fn test_db() -> Option<DatabaseConnection> {
    let url = env::var("DATABASE_URL")
        .or_else(|_| env::var("DANKPASS__DATABASE__URL"))
        .ok()?;
    let db = Database::connect(&url)
        .await
        .expect("failed to connect to test database");
    Migrator::up(&db, None).await.expect("migrations failed");
    Some(db)
}

async fn create_user(db: &DatabaseConnection, tier: UserTier) -> users::Model {
    let id = Uuid::new_v4();
    users::ActiveModel {
        id: Set(id),
        email: Set(format!("loyalty-test-{}@example.com", id)),
        display_name: Set("Loyalty Test User".to_string()),
        tier: Set(tier),
        referral_count: Set(0),
        referral_points_earned: Set(0),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("failed to create user")
}

async fn create_partner(db: &DatabaseConnection, status: PartnerStatus) -> partners::Model {
    partners::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(format!("Test Partner {}", Uuid::new_v4())),
        status: Set(status),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("failed to create partner")
}

fn receipt_input(user_id: Uuid, partner_id: Option<Uuid>, total: Decimal) -> CreateReceiptInput {
    CreateReceiptInput {
        user_id,
        partner_id,
        image_url: format!("https://cdn.example.com/receipts/{}.jpg", Uuid::new_v4()),
        image_sha256: hex_digest(&Uuid::new_v4().to_string()),
        extracted: ExtractedReceipt {
            merchant: Some("Test Mart".to_string()),
            purchase_date: None,
            subtotal: None,
            tax: None,
            total: Some(total),
            items: vec![],
        },
        items_sum: None,
        confidence: Some(Decimal::new(95, 2)),
    }
}

fn hex_digest(input: &str) -> String {
    dankpass_core::receipt::fingerprint(input.as_bytes())
}

#[tokio::test]
async fn approval_awards_points_with_one_ledger_entry() {
    let Some(db) = test_db().await else { return };
    let repo = ReceiptRepository::new(db.clone());
    let ledger = LedgerRepository::new(db.clone());
    let user = create_user(&db, UserTier::Free).await;

    let created = repo
        .create(receipt_input(user.id, None, Decimal::new(4500, 2)))
        .await
        .expect("create failed");

    let outcome = repo
        .approve(created.receipt.id, None, &PointsConfig::default())
        .await
        .expect("approve failed");

    assert_eq!(outcome.breakdown.base_points, 45);
    assert_eq!(outcome.breakdown.awardable_points, 45);
    assert_eq!(outcome.receipt.status, ReceiptStatus::Approved);
    assert_eq!(outcome.receipt.points_awarded, 45);

    let entries = repo
        .ledger_entries(created.receipt.id)
        .await
        .expect("ledger query failed");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].points, 45);
    assert_eq!(entries[0].kind, LedgerEntryKind::Earned);

    assert_eq!(ledger.balance(user.id).await.expect("balance failed"), 45);
}

#[tokio::test]
async fn premium_in_network_multipliers_compose() {
    let Some(db) = test_db().await else { return };
    let repo = ReceiptRepository::new(db.clone());
    let user = create_user(&db, UserTier::Premium).await;
    let partner = create_partner(&db, PartnerStatus::Approved).await;

    let created = repo
        .create(receipt_input(
            user.id,
            Some(partner.id),
            Decimal::new(6725, 2),
        ))
        .await
        .expect("create failed");

    let outcome = repo
        .approve(created.receipt.id, None, &PointsConfig::default())
        .await
        .expect("approve failed");

    // floor(67.25) = 67 base, floor(67 * 3.0) = 201 total.
    assert_eq!(outcome.breakdown.base_points, 67);
    assert_eq!(outcome.breakdown.multiplier, Decimal::new(30, 1));
    assert_eq!(outcome.breakdown.total_points, 201);
    assert_eq!(outcome.breakdown.bonus_points, 134);
}

#[tokio::test]
async fn second_approval_fails_and_awards_nothing() {
    let Some(db) = test_db().await else { return };
    let repo = ReceiptRepository::new(db.clone());
    let ledger = LedgerRepository::new(db.clone());
    let user = create_user(&db, UserTier::Free).await;

    let created = repo
        .create(receipt_input(user.id, None, Decimal::new(1000, 2)))
        .await
        .expect("create failed");

    repo.approve(created.receipt.id, None, &PointsConfig::default())
        .await
        .expect("first approve failed");
    let second = repo
        .approve(created.receipt.id, None, &PointsConfig::default())
        .await;
    assert!(matches!(second, Err(ReceiptRepoError::NotPending(_))));

    assert_eq!(ledger.balance(user.id).await.expect("balance failed"), 10);
    let entries = repo
        .ledger_entries(created.receipt.id)
        .await
        .expect("ledger query failed");
    assert_eq!(entries.len(), 1);
}

#[tokio::test]
async fn concurrent_approvals_of_same_receipt_award_once() {
    let Some(db) = test_db().await else { return };
    let repo = Arc::new(ReceiptRepository::new(db.clone()));
    let user = create_user(&db, UserTier::Free).await;

    let created = repo
        .create(receipt_input(user.id, None, Decimal::new(2500, 2)))
        .await
        .expect("create failed");
    let receipt_id = created.receipt.id;

    let barrier = Arc::new(Barrier::new(4));
    let mut handles = Vec::new();
    for _ in 0..4 {
        let repo = Arc::clone(&repo);
        let barrier = Arc::clone(&barrier);
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            repo.approve(receipt_id, None, &PointsConfig::default()).await
        }));
    }

    let results: Vec<_> = join_all(handles).await;
    let successes = results
        .iter()
        .filter(|r| matches!(r, Ok(Ok(_))))
        .count();
    assert_eq!(successes, 1);

    let entries = repo
        .ledger_entries(receipt_id)
        .await
        .expect("ledger query failed");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].points, 25);
}

#[tokio::test]
async fn daily_cap_truncates_award_to_headroom() {
    let Some(db) = test_db().await else { return };
    let repo = ReceiptRepository::new(db.clone());
    let ledger = LedgerRepository::new(db.clone());
    let user = create_user(&db, UserTier::Free).await;

    // Burn most of today's headroom with two earlier approvals.
    for amount in [Decimal::new(100_000, 2), Decimal::new(98_000, 2)] {
        let created = repo
            .create(receipt_input(user.id, None, amount))
            .await
            .expect("create failed");
        repo.approve(created.receipt.id, None, &PointsConfig::default())
            .await
            .expect("warmup approve failed");
    }
    assert_eq!(
        ledger.earned_today(user.id).await.expect("earned failed"),
        1980
    );

    let created = repo
        .create(receipt_input(user.id, None, Decimal::new(9000, 2)))
        .await
        .expect("create failed");
    let outcome = repo
        .approve(created.receipt.id, None, &PointsConfig::default())
        .await
        .expect("approve failed");

    assert_eq!(outcome.breakdown.total_points, 90);
    assert_eq!(outcome.breakdown.awardable_points, 20);
    assert!(!outcome.breakdown.daily_cap_reached);
    assert_eq!(
        ledger.earned_today(user.id).await.expect("earned failed"),
        2000
    );
}

#[tokio::test]
async fn duplicate_upload_is_rejected() {
    let Some(db) = test_db().await else { return };
    let repo = ReceiptRepository::new(db.clone());
    let user = create_user(&db, UserTier::Free).await;

    let mut input = receipt_input(user.id, None, Decimal::new(1200, 2));
    input.image_sha256 = hex_digest("same receipt photo");
    let first = repo.create(input.clone()).await.expect("create failed");

    let second = repo.create(input.clone()).await;
    assert!(
        matches!(second, Err(ReceiptRepoError::Duplicate(id)) if id == first.receipt.id)
    );

    let found = repo
        .find_duplicate(user.id, &input.image_sha256)
        .await
        .expect("lookup failed");
    assert_eq!(found.map(|r| r.id), Some(first.receipt.id));

    // A different user uploading the same image is not a duplicate.
    let other = create_user(&db, UserTier::Free).await;
    let mut other_input = receipt_input(other.id, None, Decimal::new(1200, 2));
    other_input.image_sha256 = input.image_sha256.clone();
    assert!(repo.create(other_input).await.is_ok());
}

#[tokio::test]
async fn concurrent_redemptions_never_overspend() {
    let Some(db) = test_db().await else { return };
    let receipts = ReceiptRepository::new(db.clone());
    let perks = Arc::new(PerkRepository::new(db.clone()));
    let ledger = LedgerRepository::new(db.clone());
    let user = create_user(&db, UserTier::Free).await;

    let created = receipts
        .create(receipt_input(user.id, None, Decimal::new(50_000, 2)))
        .await
        .expect("create failed");
    receipts
        .approve(created.receipt.id, None, &PointsConfig::default())
        .await
        .expect("approve failed");

    let perk = perks
        .create(CreatePerkInput {
            title: "Free Coffee".to_string(),
            description: None,
            points_cost: 300,
            is_premium_only: false,
            is_active: true,
        })
        .await
        .expect("perk create failed");

    // Balance 500, cost 300: only one of two racing redemptions can win.
    let barrier = Arc::new(Barrier::new(2));
    let mut handles = Vec::new();
    for _ in 0..2 {
        let perks = Arc::clone(&perks);
        let barrier = Arc::clone(&barrier);
        let user_id = user.id;
        let perk_id = perk.id;
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            perks.redeem(user_id, perk_id).await
        }));
    }

    let results: Vec<_> = join_all(handles).await;
    let successes = results
        .iter()
        .filter(|r| matches!(r, Ok(Ok(_))))
        .count();
    assert_eq!(successes, 1);
    assert_eq!(ledger.balance(user.id).await.expect("balance failed"), 200);
}

#[tokio::test]
async fn referral_completion_credits_both_sides_once() {
    let Some(db) = test_db().await else { return };
    let referrals = ReferralRepository::new(db.clone());
    let ledger = LedgerRepository::new(db.clone());
    let referrer = create_user(&db, UserTier::Free).await;
    let newcomer = create_user(&db, UserTier::Free).await;

    let code = referrals.my_code(referrer.id).await.expect("code failed");
    // Idempotent: asking again returns the same code.
    assert_eq!(
        referrals.my_code(referrer.id).await.expect("code failed"),
        code
    );

    let outcome = referrals
        .complete(&code, newcomer.id)
        .await
        .expect("complete failed");
    assert_eq!(outcome.referrer_points, 250);
    assert_eq!(outcome.referred_points, 250);
    assert_eq!(
        ledger.balance(referrer.id).await.expect("balance failed"),
        250
    );
    assert_eq!(
        ledger.balance(newcomer.id).await.expect("balance failed"),
        250
    );

    // Bonus points do not count toward the earning cap.
    assert_eq!(
        ledger
            .earned_today(newcomer.id)
            .await
            .expect("earned failed"),
        0
    );

    // The same user cannot be referred again, by anyone.
    let other_referrer = create_user(&db, UserTier::Free).await;
    let other_code = referrals
        .my_code(other_referrer.id)
        .await
        .expect("code failed");
    let second = referrals.complete(&other_code, newcomer.id).await;
    assert!(second.is_err());
    assert_eq!(
        ledger.balance(newcomer.id).await.expect("balance failed"),
        250
    );
}

#[tokio::test]
async fn self_referral_is_rejected() {
    let Some(db) = test_db().await else { return };
    let referrals = ReferralRepository::new(db.clone());
    let user = create_user(&db, UserTier::Free).await;

    let code = referrals.my_code(user.id).await.expect("code failed");
    assert!(referrals.complete(&code, user.id).await.is_err());
}
