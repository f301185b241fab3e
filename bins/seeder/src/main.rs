//! Seeds a demo construction company for development.
//!
//! Everything goes through the ledger engine, so the seeded books obey the
//! same rules as production data: balanced vouchers, weighted-average stock
//! and allocations bounded by what is owed.
//!
//! Usage: cargo run --bin seeder

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use girder_core::error::EngineError;
use girder_core::inventory::{MovementRequest, MovementTags, MovementType, NewStockItem};
use girder_core::ledger::{
    Account, AccountType, LedgerError, LineInput, LineTags, NewAccount, NewVoucher, VoucherType,
};
use girder_core::payables::{AllocationRequest, NewVendor};
use girder_core::purchase::PurchaseLineInput;
use girder_core::workflow::{Actor, Role};
use girder_core::{EngineSettings, LedgerEngine};
use girder_db::{PgAuditSink, PgStore};
use girder_shared::AppConfig;
use girder_shared::types::{CompanyId, ProjectId, UserId, VoucherId};
use rust_decimal_macros::dec;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

/// Demo company ID (consistent for all seeds)
const DEMO_COMPANY_ID: Uuid = Uuid::from_u128(1);
/// Demo owner ID (consistent for all seeds)
const DEMO_OWNER_ID: Uuid = Uuid::from_u128(2);
/// Demo project receiving site issues
const DEMO_PROJECT_ID: Uuid = Uuid::from_u128(3);

type Engine = LedgerEngine<PgStore>;

struct ChartOfAccounts {
    bank: Account,
    inventory: Account,
    payable: Account,
    equity: Account,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "girder=debug,seeder=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;
    let settings = EngineSettings::try_from(&config.ledger).context("invalid ledger settings")?;

    info!("Connecting to database...");
    let store = PgStore::connect(&config.database)
        .await
        .context("failed to connect to database")?;
    let sink = PgAuditSink::new(store.connection().clone());
    let engine = LedgerEngine::with_settings(store, settings).with_audit_sink(Arc::new(sink));

    let owner = Actor::new(
        UserId::from_uuid(DEMO_OWNER_ID),
        CompanyId::from_uuid(DEMO_COMPANY_ID),
        Role::Owner,
    );

    info!("Seeding chart of accounts...");
    let Some(accounts) = seed_accounts(&engine, &owner).await? else {
        warn!("Demo company already seeded, skipping...");
        return Ok(());
    };

    info!("Seeding opening capital...");
    seed_opening_capital(&engine, &owner, &accounts).await?;

    info!("Seeding purchases and payments...");
    seed_purchases(&engine, &owner, &accounts).await?;

    info!("Seeding complete!");
    Ok(())
}

/// Creates the demo chart. Returns `None` when it already exists.
async fn seed_accounts(engine: &Engine, owner: &Actor) -> Result<Option<ChartOfAccounts>> {
    let bank = match create_account(engine, owner, "1000", "Bank", AccountType::Asset).await {
        Ok(account) => account,
        Err(EngineError::Ledger(LedgerError::DuplicateAccountCode(_))) => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    let inventory =
        create_account(engine, owner, "1200", "Inventory", AccountType::Asset).await?;
    let payable =
        create_account(engine, owner, "2000", "Trade Payables", AccountType::Liability).await?;
    let equity =
        create_account(engine, owner, "3000", "Owner's Capital", AccountType::Equity).await?;
    create_account(engine, owner, "5000", "Site Expenses", AccountType::Expense).await?;

    Ok(Some(ChartOfAccounts {
        bank,
        inventory,
        payable,
        equity,
    }))
}

async fn create_account(
    engine: &Engine,
    owner: &Actor,
    code: &str,
    name: &str,
    account_type: AccountType,
) -> Result<Account, EngineError> {
    engine
        .create_account(
            owner,
            NewAccount {
                code: code.to_string(),
                name: name.to_string(),
                account_type,
                is_system: true,
            },
        )
        .await
}

fn seed_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 6).unwrap_or_default()
}

async fn post(engine: &Engine, owner: &Actor, input: NewVoucher) -> Result<VoucherId> {
    let document = engine.create_voucher(owner, input).await?;
    let id = document.voucher.id;
    engine.submit(owner, id).await?;
    engine.approve(owner, id).await?;
    let posted = engine.post(owner, id).await?;
    info!(voucher_no = %posted.voucher_no, "  Posted");
    Ok(id)
}

async fn seed_opening_capital(
    engine: &Engine,
    owner: &Actor,
    accounts: &ChartOfAccounts,
) -> Result<()> {
    let opening = NewVoucher::new(
        VoucherType::Journal,
        seed_date(),
        vec![
            LineInput::debit(accounts.bank.id, dec!(50000)),
            LineInput::credit(accounts.equity.id, dec!(50000)),
        ],
    )
    .with_narration("Opening capital");
    post(engine, owner, opening).await?;
    Ok(())
}

async fn seed_purchases(engine: &Engine, owner: &Actor, accounts: &ChartOfAccounts) -> Result<()> {
    let vendor = engine
        .create_vendor(
            owner,
            NewVendor {
                name: "Ready Mix Ltd".to_string(),
                payable_account_id: accounts.payable.id,
            },
        )
        .await?;
    let cement = engine
        .create_stock_item(
            owner,
            NewStockItem {
                name: "Cement".to_string(),
                unit: "bag".to_string(),
                reorder_level: dec!(20),
            },
        )
        .await?;
    let rebar = engine
        .create_stock_item(
            owner,
            NewStockItem {
                name: "Rebar".to_string(),
                unit: "t".to_string(),
                reorder_level: dec!(2),
            },
        )
        .await?;

    let vendor_tags = LineTags {
        vendor_id: Some(vendor.id),
        ..LineTags::default()
    };

    let bill = NewVoucher::new(
        VoucherType::Purchase,
        seed_date(),
        vec![
            LineInput::debit(accounts.inventory.id, dec!(5200)),
            LineInput::credit(accounts.payable.id, dec!(5200)).with_tags(vendor_tags),
        ],
    )
    .with_vendor(vendor.id)
    .with_purchase_lines(vec![
        PurchaseLineInput::material(cement.id, dec!(100), dec!(12)),
        PurchaseLineInput::material(rebar.id, dec!(5), dec!(800)),
    ]);
    post(engine, owner, bill).await?;

    let open = engine.open_items(owner, vendor.id).await?;
    let bill_line = open
        .first()
        .context("posted bill left no open item")?
        .line_id;

    let payment = NewVoucher::new(
        VoucherType::Payment,
        seed_date(),
        vec![
            LineInput::debit(accounts.payable.id, dec!(3000)).with_tags(vendor_tags),
            LineInput::credit(accounts.bank.id, dec!(3000)),
        ],
    )
    .with_vendor(vendor.id)
    .with_allocations(vec![AllocationRequest::new(bill_line, dec!(3000))]);
    post(engine, owner, payment).await?;

    let issue = MovementRequest::new(cement.id, MovementType::Out, dec!(30), seed_date())
        .with_tags(MovementTags {
            project_id: Some(ProjectId::from_uuid(DEMO_PROJECT_ID)),
            note: Some("Foundation pour".to_string()),
            ..MovementTags::default()
        });
    let outcome = engine.apply_movement(owner, issue).await?;
    info!(
        on_hand = %outcome.balance.position.qty,
        avg_cost = %outcome.balance.position.avg_cost,
        "  Cement issued to site"
    );

    for item in engine.open_items(owner, vendor.id).await? {
        info!(voucher_no = %item.voucher_no, outstanding = %item.outstanding, "  Open item");
    }
    Ok(())
}
