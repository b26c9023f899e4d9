//! Initial database migration.
//!
//! Creates all enums, tables, and indexes, and seeds the default point
//! configuration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: USERS & PARTNERS
        // ============================================================
        db.execute_unprepared(USERS_SQL).await?;
        db.execute_unprepared(PARTNERS_SQL).await?;

        // ============================================================
        // PART 3: RECEIPTS
        // ============================================================
        db.execute_unprepared(RECEIPTS_SQL).await?;
        db.execute_unprepared(RECEIPT_ITEMS_SQL).await?;

        // ============================================================
        // PART 4: LEDGER, PERKS & REDEMPTIONS
        // ============================================================
        db.execute_unprepared(POINTS_LEDGER_SQL).await?;
        db.execute_unprepared(PERKS_SQL).await?;
        db.execute_unprepared(REDEMPTIONS_SQL).await?;

        // ============================================================
        // PART 5: REFERRALS
        // ============================================================
        db.execute_unprepared(REFERRALS_SQL).await?;

        // ============================================================
        // PART 6: APP CONFIG + SEED
        // ============================================================
        db.execute_unprepared(APP_CONFIG_SQL).await?;
        db.execute_unprepared(SEED_CONFIG_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

const ENUMS_SQL: &str = r"
CREATE TYPE user_tier AS ENUM ('free', 'premium');
CREATE TYPE partner_status AS ENUM ('pending', 'approved', 'rejected');
CREATE TYPE receipt_status AS ENUM ('pending', 'approved', 'rejected');
CREATE TYPE ledger_entry_kind AS ENUM ('earned', 'bonus', 'redeemed', 'adjustment');
CREATE TYPE redemption_status AS ENUM ('pending', 'completed', 'cancelled');
CREATE TYPE referral_status AS ENUM ('completed', 'cancelled');
";

const USERS_SQL: &str = r"
CREATE TABLE users (
    id UUID PRIMARY KEY,
    email VARCHAR(255) NOT NULL UNIQUE,
    display_name VARCHAR(255) NOT NULL,
    tier user_tier NOT NULL DEFAULT 'free',
    premium_expires_at TIMESTAMPTZ,
    referral_code VARCHAR(16) UNIQUE,
    referred_by_code VARCHAR(16),
    referral_count INTEGER NOT NULL DEFAULT 0,
    referral_points_earned BIGINT NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
";

const PARTNERS_SQL: &str = r"
CREATE TABLE partners (
    id UUID PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    status partner_status NOT NULL DEFAULT 'pending',
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
";

const RECEIPTS_SQL: &str = r"
CREATE TABLE receipts (
    id UUID PRIMARY KEY,
    user_id UUID NOT NULL REFERENCES users(id),
    partner_id UUID REFERENCES partners(id),
    image_url TEXT NOT NULL,
    image_sha256 CHAR(64) NOT NULL,
    merchant VARCHAR(255),
    purchase_date DATE,
    subtotal NUMERIC(12, 2),
    tax NUMERIC(12, 2),
    total NUMERIC(12, 2),
    items_sum NUMERIC(12, 2),
    confidence NUMERIC(4, 2),
    status receipt_status NOT NULL DEFAULT 'pending',
    points_awarded BIGINT NOT NULL DEFAULT 0,
    admin_notes TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

-- Dedup: the same user may not upload the same image twice.
CREATE UNIQUE INDEX idx_receipts_user_image ON receipts(user_id, image_sha256);
CREATE INDEX idx_receipts_user_status ON receipts(user_id, status);
CREATE INDEX idx_receipts_status_created ON receipts(status, created_at);
";

const RECEIPT_ITEMS_SQL: &str = r"
CREATE TABLE receipt_items (
    id UUID PRIMARY KEY,
    receipt_id UUID NOT NULL REFERENCES receipts(id) ON DELETE CASCADE,
    name VARCHAR(255) NOT NULL,
    category VARCHAR(100),
    quantity NUMERIC(10, 3),
    unit_price NUMERIC(12, 2),
    line_total NUMERIC(12, 2),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_receipt_items_receipt ON receipt_items(receipt_id);
";

const POINTS_LEDGER_SQL: &str = r"
CREATE TABLE points_ledger (
    id UUID PRIMARY KEY,
    user_id UUID NOT NULL REFERENCES users(id),
    receipt_id UUID REFERENCES receipts(id),
    points BIGINT NOT NULL,
    kind ledger_entry_kind NOT NULL,
    description TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_points_ledger_user ON points_ledger(user_id);
CREATE INDEX idx_points_ledger_user_kind_created ON points_ledger(user_id, kind, created_at);
";

const PERKS_SQL: &str = r"
CREATE TABLE perks (
    id UUID PRIMARY KEY,
    title VARCHAR(255) NOT NULL,
    description TEXT,
    points_cost BIGINT NOT NULL CHECK (points_cost > 0),
    is_premium_only BOOLEAN NOT NULL DEFAULT FALSE,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
";

const REDEMPTIONS_SQL: &str = r"
CREATE TABLE redemptions (
    id UUID PRIMARY KEY,
    user_id UUID NOT NULL REFERENCES users(id),
    perk_id UUID NOT NULL REFERENCES perks(id),
    points_spent BIGINT NOT NULL,
    status redemption_status NOT NULL DEFAULT 'completed',
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_redemptions_user ON redemptions(user_id);
";

const REFERRALS_SQL: &str = r"
CREATE TABLE referrals (
    id UUID PRIMARY KEY,
    referrer_id UUID NOT NULL REFERENCES users(id),
    referred_id UUID NOT NULL REFERENCES users(id),
    code VARCHAR(16) NOT NULL,
    referrer_points BIGINT NOT NULL,
    referred_points BIGINT NOT NULL,
    status referral_status NOT NULL DEFAULT 'completed',
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

-- A user can be referred at most once, and a pair is processed at most once.
CREATE UNIQUE INDEX idx_referrals_referred ON referrals(referred_id);
CREATE UNIQUE INDEX idx_referrals_pair ON referrals(referrer_id, referred_id);
";

const APP_CONFIG_SQL: &str = r"
CREATE TABLE app_config (
    key VARCHAR(64) PRIMARY KEY,
    value VARCHAR(255) NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
";

const SEED_CONFIG_SQL: &str = r"
INSERT INTO app_config (key, value) VALUES
    ('POINTS_BASE', '1'),
    ('POINTS_PREMIUM', '1.5'),
    ('POINTS_INNETWORK', '2'),
    ('DAILY_CAP', '2000');
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS app_config;
DROP TABLE IF EXISTS referrals;
DROP TABLE IF EXISTS redemptions;
DROP TABLE IF EXISTS perks;
DROP TABLE IF EXISTS points_ledger;
DROP TABLE IF EXISTS receipt_items;
DROP TABLE IF EXISTS receipts;
DROP TABLE IF EXISTS partners;
DROP TABLE IF EXISTS users;
DROP TYPE IF EXISTS referral_status;
DROP TYPE IF EXISTS redemption_status;
DROP TYPE IF EXISTS ledger_entry_kind;
DROP TYPE IF EXISTS receipt_status;
DROP TYPE IF EXISTS partner_status;
DROP TYPE IF EXISTS user_tier;
";
