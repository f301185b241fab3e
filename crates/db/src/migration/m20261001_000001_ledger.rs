//! Ledger and inventory schema.
//!
//! Creates master data, vouchers and their lines, numbering counters, stock
//! balances and movements, vendor allocations and the audit log, together
//! with the tenant isolation policies.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: MASTER DATA
        // ============================================================
        db.execute_unprepared(ACCOUNTS_SQL).await?;
        db.execute_unprepared(VENDORS_SQL).await?;
        db.execute_unprepared(STOCK_ITEMS_SQL).await?;

        // ============================================================
        // PART 2: VOUCHERS & NUMBERING
        // ============================================================
        db.execute_unprepared(VOUCHERS_SQL).await?;
        db.execute_unprepared(LEDGER_LINES_SQL).await?;
        db.execute_unprepared(PURCHASE_LINES_SQL).await?;
        db.execute_unprepared(VOUCHER_COUNTERS_SQL).await?;

        // ============================================================
        // PART 3: STOCK
        // ============================================================
        db.execute_unprepared(STOCK_BALANCES_SQL).await?;
        db.execute_unprepared(STOCK_MOVEMENTS_SQL).await?;

        // ============================================================
        // PART 4: PAYABLES & AUDIT
        // ============================================================
        db.execute_unprepared(VENDOR_ALLOCATIONS_SQL).await?;
        db.execute_unprepared(AUDIT_LOG_SQL).await?;

        // ============================================================
        // PART 5: ROW LEVEL SECURITY
        // ============================================================
        db.execute_unprepared(RLS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ACCOUNTS_SQL: &str = r"
CREATE TABLE accounts (
    id UUID PRIMARY KEY,
    company_id UUID NOT NULL,
    code VARCHAR(50) NOT NULL,
    name VARCHAR(255) NOT NULL,
    account_type VARCHAR(20) NOT NULL,
    is_system BOOLEAN NOT NULL DEFAULT false,
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT accounts_company_code_key UNIQUE (company_id, code),
    CONSTRAINT chk_account_type CHECK (
        account_type IN ('asset', 'liability', 'equity', 'income', 'expense')
    )
);

CREATE INDEX idx_accounts_company ON accounts(company_id);
";

const VENDORS_SQL: &str = r"
CREATE TABLE vendors (
    id UUID PRIMARY KEY,
    company_id UUID NOT NULL,
    name VARCHAR(255) NOT NULL,
    payable_account_id UUID NOT NULL REFERENCES accounts(id),
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_vendors_company ON vendors(company_id);
";

const STOCK_ITEMS_SQL: &str = r"
CREATE TABLE stock_items (
    id UUID PRIMARY KEY,
    company_id UUID NOT NULL,
    name VARCHAR(255) NOT NULL,
    unit VARCHAR(20) NOT NULL,
    reorder_level NUMERIC(19, 4) NOT NULL DEFAULT 0,
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_reorder_level CHECK (reorder_level >= 0)
);

CREATE INDEX idx_stock_items_company ON stock_items(company_id);
";

const VOUCHERS_SQL: &str = r"
CREATE TABLE vouchers (
    id UUID PRIMARY KEY,
    company_id UUID NOT NULL,
    voucher_no VARCHAR(50) NOT NULL,
    voucher_date DATE NOT NULL,
    voucher_type VARCHAR(20) NOT NULL,
    status VARCHAR(20) NOT NULL DEFAULT 'draft',
    project_id UUID,
    vendor_id UUID REFERENCES vendors(id),
    narration TEXT,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    submitted_by UUID,
    submitted_at TIMESTAMPTZ,
    approved_by UUID,
    approved_at TIMESTAMPTZ,
    posted_by UUID,
    posted_at TIMESTAMPTZ,
    reversed_by_voucher_id UUID REFERENCES vouchers(id),
    reverses_voucher_id UUID REFERENCES vouchers(id),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT vouchers_company_voucher_no_key UNIQUE (company_id, voucher_no),
    CONSTRAINT chk_voucher_type CHECK (
        voucher_type IN ('receipt', 'payment', 'journal', 'purchase', 'contra')
    ),
    CONSTRAINT chk_voucher_status CHECK (
        status IN ('draft', 'submitted', 'approved', 'posted', 'reversed')
    )
);

CREATE INDEX idx_vouchers_company_date ON vouchers(company_id, voucher_date);
CREATE INDEX idx_vouchers_vendor ON vouchers(vendor_id) WHERE vendor_id IS NOT NULL;
CREATE UNIQUE INDEX idx_vouchers_single_reversal ON vouchers(reverses_voucher_id)
    WHERE reverses_voucher_id IS NOT NULL;
";

const LEDGER_LINES_SQL: &str = r"
CREATE TABLE ledger_lines (
    id UUID PRIMARY KEY,
    company_id UUID NOT NULL,
    voucher_id UUID NOT NULL REFERENCES vouchers(id) ON DELETE CASCADE,
    account_id UUID NOT NULL REFERENCES accounts(id),
    debit NUMERIC(19, 4) NOT NULL DEFAULT 0,
    credit NUMERIC(19, 4) NOT NULL DEFAULT 0,
    project_id UUID,
    vendor_id UUID REFERENCES vendors(id),
    payment_method VARCHAR(20),
    narration TEXT,
    position INTEGER NOT NULL,
    CONSTRAINT chk_debit_or_credit CHECK (
        (debit > 0 AND credit = 0) OR (debit = 0 AND credit > 0)
    )
);

CREATE INDEX idx_ledger_lines_voucher ON ledger_lines(voucher_id, position);
CREATE INDEX idx_ledger_lines_account ON ledger_lines(account_id);
CREATE INDEX idx_ledger_lines_vendor ON ledger_lines(vendor_id) WHERE vendor_id IS NOT NULL;
";

const PURCHASE_LINES_SQL: &str = r"
CREATE TABLE purchase_lines (
    id UUID PRIMARY KEY,
    company_id UUID NOT NULL,
    voucher_id UUID NOT NULL REFERENCES vouchers(id) ON DELETE CASCADE,
    kind VARCHAR(20) NOT NULL,
    stock_item_id UUID REFERENCES stock_items(id),
    quantity NUMERIC(19, 4) NOT NULL,
    unit_rate NUMERIC(19, 4) NOT NULL,
    description TEXT,
    position INTEGER NOT NULL,
    CONSTRAINT chk_purchase_kind CHECK (kind IN ('material', 'labour', 'service', 'other')),
    CONSTRAINT chk_purchase_amounts CHECK (quantity >= 0 AND unit_rate >= 0)
);

CREATE INDEX idx_purchase_lines_voucher ON purchase_lines(voucher_id, position);
";

const VOUCHER_COUNTERS_SQL: &str = r"
CREATE TABLE voucher_counters (
    company_id UUID NOT NULL,
    year INTEGER NOT NULL,
    month INTEGER NOT NULL,
    last_value INTEGER NOT NULL,
    PRIMARY KEY (company_id, year, month)
);
";

const STOCK_BALANCES_SQL: &str = r"
CREATE TABLE stock_balances (
    company_id UUID NOT NULL,
    stock_item_id UUID NOT NULL REFERENCES stock_items(id),
    qty NUMERIC(19, 4) NOT NULL DEFAULT 0,
    avg_cost NUMERIC(19, 4) NOT NULL DEFAULT 0,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    PRIMARY KEY (company_id, stock_item_id),
    CONSTRAINT chk_stock_non_negative CHECK (qty >= 0 AND avg_cost >= 0)
);
";

const STOCK_MOVEMENTS_SQL: &str = r"
CREATE TABLE stock_movements (
    id UUID PRIMARY KEY,
    seq BIGINT GENERATED ALWAYS AS IDENTITY,
    company_id UUID NOT NULL,
    stock_item_id UUID NOT NULL REFERENCES stock_items(id),
    movement_type VARCHAR(20) NOT NULL,
    kind VARCHAR(30) NOT NULL,
    qty NUMERIC(19, 4) NOT NULL,
    unit_cost NUMERIC(19, 4),
    movement_date DATE NOT NULL,
    project_id UUID,
    vendor_id UUID REFERENCES vendors(id),
    voucher_id UUID REFERENCES vouchers(id),
    purchase_line_id UUID REFERENCES purchase_lines(id),
    note TEXT,
    transfer_group UUID,
    reverses_movement_id UUID REFERENCES stock_movements(id),
    approved_by UUID,
    approved_at TIMESTAMPTZ,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    balance_qty NUMERIC(19, 4) NOT NULL,
    balance_avg_cost NUMERIC(19, 4) NOT NULL,
    CONSTRAINT chk_movement_type CHECK (movement_type IN ('in', 'out', 'adjust', 'transfer')),
    CONSTRAINT chk_movement_qty CHECK (qty >= 0)
);

CREATE INDEX idx_stock_movements_item ON stock_movements(stock_item_id, seq);
CREATE INDEX idx_stock_movements_voucher ON stock_movements(voucher_id)
    WHERE voucher_id IS NOT NULL;
CREATE UNIQUE INDEX idx_stock_movements_single_reversal ON stock_movements(reverses_movement_id)
    WHERE reverses_movement_id IS NOT NULL;
";

const VENDOR_ALLOCATIONS_SQL: &str = r"
CREATE TABLE vendor_allocations (
    id UUID PRIMARY KEY,
    company_id UUID NOT NULL,
    vendor_id UUID NOT NULL REFERENCES vendors(id),
    payment_voucher_id UUID NOT NULL REFERENCES vouchers(id),
    source_line_id UUID NOT NULL REFERENCES ledger_lines(id),
    amount NUMERIC(19, 4) NOT NULL,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_allocation_positive CHECK (amount > 0)
);

CREATE INDEX idx_vendor_allocations_vendor ON vendor_allocations(vendor_id);
CREATE INDEX idx_vendor_allocations_payment ON vendor_allocations(payment_voucher_id);
CREATE INDEX idx_vendor_allocations_source ON vendor_allocations(source_line_id);
";

const AUDIT_LOG_SQL: &str = r"
CREATE TABLE audit_log (
    id UUID PRIMARY KEY,
    company_id UUID NOT NULL,
    entity_type VARCHAR(50) NOT NULL,
    entity_id UUID NOT NULL,
    action VARCHAR(30) NOT NULL,
    before_state JSONB,
    after_state JSONB,
    actor_user_id UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_audit_log_entity ON audit_log(entity_type, entity_id);
CREATE INDEX idx_audit_log_company ON audit_log(company_id, created_at);

-- Append-only
CREATE RULE audit_log_no_update AS ON UPDATE TO audit_log DO INSTEAD NOTHING;
CREATE RULE audit_log_no_delete AS ON DELETE TO audit_log DO INSTEAD NOTHING;
";

const RLS_SQL: &str = r"
ALTER TABLE accounts ENABLE ROW LEVEL SECURITY;
ALTER TABLE vendors ENABLE ROW LEVEL SECURITY;
ALTER TABLE stock_items ENABLE ROW LEVEL SECURITY;
ALTER TABLE vouchers ENABLE ROW LEVEL SECURITY;
ALTER TABLE ledger_lines ENABLE ROW LEVEL SECURITY;
ALTER TABLE purchase_lines ENABLE ROW LEVEL SECURITY;
ALTER TABLE voucher_counters ENABLE ROW LEVEL SECURITY;
ALTER TABLE stock_balances ENABLE ROW LEVEL SECURITY;
ALTER TABLE stock_movements ENABLE ROW LEVEL SECURITY;
ALTER TABLE vendor_allocations ENABLE ROW LEVEL SECURITY;
ALTER TABLE audit_log ENABLE ROW LEVEL SECURITY;

-- The store sets the context per unit of work: SET LOCAL app.current_company_id = 'company-uuid';

CREATE POLICY tenant_isolation ON accounts
    USING (company_id = current_setting('app.current_company_id', true)::UUID);

CREATE POLICY tenant_isolation ON vendors
    USING (company_id = current_setting('app.current_company_id', true)::UUID);

CREATE POLICY tenant_isolation ON stock_items
    USING (company_id = current_setting('app.current_company_id', true)::UUID);

CREATE POLICY tenant_isolation ON vouchers
    USING (company_id = current_setting('app.current_company_id', true)::UUID);

CREATE POLICY tenant_isolation ON ledger_lines
    USING (company_id = current_setting('app.current_company_id', true)::UUID);

CREATE POLICY tenant_isolation ON purchase_lines
    USING (company_id = current_setting('app.current_company_id', true)::UUID);

CREATE POLICY tenant_isolation ON voucher_counters
    USING (company_id = current_setting('app.current_company_id', true)::UUID);

CREATE POLICY tenant_isolation ON stock_balances
    USING (company_id = current_setting('app.current_company_id', true)::UUID);

CREATE POLICY tenant_isolation ON stock_movements
    USING (company_id = current_setting('app.current_company_id', true)::UUID);

CREATE POLICY tenant_isolation ON vendor_allocations
    USING (company_id = current_setting('app.current_company_id', true)::UUID);

CREATE POLICY tenant_isolation ON audit_log
    USING (company_id = current_setting('app.current_company_id', true)::UUID);
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS audit_log CASCADE;
DROP TABLE IF EXISTS vendor_allocations CASCADE;
DROP TABLE IF EXISTS stock_movements CASCADE;
DROP TABLE IF EXISTS stock_balances CASCADE;
DROP TABLE IF EXISTS voucher_counters CASCADE;
DROP TABLE IF EXISTS purchase_lines CASCADE;
DROP TABLE IF EXISTS ledger_lines CASCADE;
DROP TABLE IF EXISTS vouchers CASCADE;
DROP TABLE IF EXISTS stock_items CASCADE;
DROP TABLE IF EXISTS vendors CASCADE;
DROP TABLE IF EXISTS accounts CASCADE;
";
