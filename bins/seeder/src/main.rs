//! Database seeder for DankPass development and testing.
//!
//! Seeds test users, partners, and perks for local development.
//!
//! Usage: cargo run --bin seeder

use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use uuid::Uuid;

use dankpass_db::entities::{
    partners, perks,
    sea_orm_active_enums::{PartnerStatus, UserTier},
    users,
};

/// Free-tier test user ID (consistent for all seeds)
const TEST_USER_ID: &str = "00000000-0000-0000-0000-000000000001";
/// Premium-tier test user ID (consistent for all seeds)
const TEST_PREMIUM_USER_ID: &str = "00000000-0000-0000-0000-000000000002";
/// In-network test partner ID (consistent for all seeds)
const TEST_PARTNER_ID: &str = "00000000-0000-0000-0000-000000000010";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    println!("Connecting to database...");
    let db = dankpass_db::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    println!("Seeding test users...");
    seed_test_users(&db).await;

    println!("Seeding partners...");
    seed_partners(&db).await;

    println!("Seeding perks...");
    seed_perks(&db).await;

    println!("Seeding complete!");
}

fn test_user_id() -> Uuid {
    Uuid::parse_str(TEST_USER_ID).expect("valid uuid literal")
}

fn test_premium_user_id() -> Uuid {
    Uuid::parse_str(TEST_PREMIUM_USER_ID).expect("valid uuid literal")
}

fn test_partner_id() -> Uuid {
    Uuid::parse_str(TEST_PARTNER_ID).expect("valid uuid literal")
}

async fn seed_test_users(db: &DatabaseConnection) {
    if users::Entity::find_by_id(test_user_id())
        .one(db)
        .await
        .expect("query failed")
        .is_some()
    {
        println!("  Test users already exist, skipping");
        return;
    }

    users::ActiveModel {
        id: Set(test_user_id()),
        email: Set("free@dankpass.test".to_string()),
        display_name: Set("Freya Freebird".to_string()),
        tier: Set(UserTier::Free),
        referral_count: Set(0),
        referral_points_earned: Set(0),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("failed to seed free user");

    users::ActiveModel {
        id: Set(test_premium_user_id()),
        email: Set("premium@dankpass.test".to_string()),
        display_name: Set("Preston Premium".to_string()),
        tier: Set(UserTier::Premium),
        premium_expires_at: Set(Some((Utc::now() + Duration::days(365)).into())),
        referral_count: Set(0),
        referral_points_earned: Set(0),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("failed to seed premium user");
}

async fn seed_partners(db: &DatabaseConnection) {
    if partners::Entity::find_by_id(test_partner_id())
        .one(db)
        .await
        .expect("query failed")
        .is_some()
    {
        println!("  Partners already exist, skipping");
        return;
    }

    partners::ActiveModel {
        id: Set(test_partner_id()),
        name: Set("Green Leaf Grocers".to_string()),
        status: Set(PartnerStatus::Approved),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("failed to seed approved partner");

    partners::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set("Corner Smoke Shop".to_string()),
        status: Set(PartnerStatus::Pending),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("failed to seed pending partner");
}

async fn seed_perks(db: &DatabaseConnection) {
    let existing = perks::Entity::find()
        .one(db)
        .await
        .expect("query failed");
    if existing.is_some() {
        println!("  Perks already exist, skipping");
        return;
    }

    let catalog: [(&str, i64, bool); 3] = [
        ("Free delivery on your next order", 500, false),
        ("10% off coupon", 1000, false),
        ("Early access to weekly drops", 2500, true),
    ];

    for (title, cost, premium_only) in catalog {
        perks::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(title.to_string()),
            description: Set(None),
            points_cost: Set(cost),
            is_premium_only: Set(premium_only),
            is_active: Set(true),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("failed to seed perk");
    }
}
