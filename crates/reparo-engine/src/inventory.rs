//! # Inventory Operations
//!
//! Item CRUD, manual stock movements, and the stock-opname flow. The
//! bulk movements live with the operations that cause them (sales,
//! purchases, services, returns); what is here is the catalog plus the
//! two deliberate manual paths:
//!
//! - `adjust_stock_manually` - a relative correction (+/-), checked
//! - `stock_opname` - set-to-counted-value with an immutable audit row

use chrono::Utc;
use tracing::info;

use crate::error::EngineResult;
use crate::input::{ItemInput, StockOpnameInput};
use crate::stock::{apply_deltas, StockDelta};
use crate::Engine;
use reparo_core::{validation, InventoryItem, StockOpnameEntry, Tenant};
use reparo_db::repository::item::StockValuation;
use reparo_db::repository::new_id;
use reparo_db::Page;

impl Engine {
    /// Creates an inventory item with its opening stock.
    pub async fn create_item(
        &self,
        tenant: &Tenant,
        input: ItemInput,
    ) -> EngineResult<InventoryItem> {
        let name = validation::required_text("name", &input.name)?;
        validation::non_negative("stock", input.stock)?;
        validation::non_negative("min_stock", input.min_stock)?;
        validation::non_negative("buy_price_cents", input.buy_price_cents)?;
        validation::non_negative("sell_price_cents", input.sell_price_cents)?;

        let now = Utc::now();
        let item = InventoryItem {
            id: new_id(),
            owner_id: tenant.owner_id.clone(),
            store_id: tenant.store_id.clone(),
            name,
            category: input.category,
            brand: input.brand,
            stock: input.stock,
            min_stock: input.min_stock,
            buy_price_cents: input.buy_price_cents,
            sell_price_cents: input.sell_price_cents,
            created_at: now,
            updated_at: now,
        };

        let mut tx = self.db().begin().await?;
        self.db().items().insert(&mut tx, &item).await?;
        tx.commit().await?;

        info!(id = %item.id, name = %item.name, "Inventory item created");
        Ok(item)
    }

    /// Updates an item's catalog fields. Stock is untouched: it only
    /// moves through deltas and opname.
    pub async fn update_item(
        &self,
        tenant: &Tenant,
        id: &str,
        input: ItemInput,
    ) -> EngineResult<InventoryItem> {
        let name = validation::required_text("name", &input.name)?;
        validation::non_negative("min_stock", input.min_stock)?;
        validation::non_negative("buy_price_cents", input.buy_price_cents)?;
        validation::non_negative("sell_price_cents", input.sell_price_cents)?;

        let mut tx = self.db().begin().await?;
        let mut item = self.db().items().find_tx(&mut tx, tenant, id).await?;

        item.name = name;
        item.category = input.category;
        item.brand = input.brand;
        item.min_stock = input.min_stock;
        item.buy_price_cents = input.buy_price_cents;
        item.sell_price_cents = input.sell_price_cents;
        item.updated_at = Utc::now();

        self.db().items().update(&mut tx, &item).await?;
        tx.commit().await?;

        Ok(item)
    }

    /// Deletes an item from the catalog.
    ///
    /// Historical lines keep their snapshots (the FK goes NULL), so past
    /// sales and services are unaffected.
    pub async fn delete_item(&self, tenant: &Tenant, id: &str) -> EngineResult<()> {
        let mut tx = self.db().begin().await?;
        self.db().items().delete(&mut tx, tenant, id).await?;
        tx.commit().await?;

        info!(id = %id, "Inventory item deleted");
        Ok(())
    }

    /// Applies a manual relative stock correction.
    pub async fn adjust_stock_manually(
        &self,
        tenant: &Tenant,
        item_id: &str,
        delta: i64,
    ) -> EngineResult<InventoryItem> {
        let mut tx = self.db().begin().await?;
        apply_deltas(
            &self.db().items(),
            &mut tx,
            tenant,
            &[StockDelta::new(item_id, delta)],
        )
        .await?;
        let item = self.db().items().find_tx(&mut tx, tenant, item_id).await?;
        tx.commit().await?;

        info!(item_id = %item_id, delta, stock = item.stock, "Manual stock adjustment");
        Ok(item)
    }

    /// Records a stock opname: stock is SET to the counted value and the
    /// difference is preserved in an immutable audit row.
    pub async fn stock_opname(
        &self,
        tenant: &Tenant,
        input: StockOpnameInput,
    ) -> EngineResult<StockOpnameEntry> {
        validation::non_negative("counted_stock", input.counted_stock)?;

        let mut tx = self.db().begin().await?;
        let item = self.db().items().find_tx(&mut tx, tenant, &input.item_id).await?;

        let entry = StockOpnameEntry {
            id: new_id(),
            owner_id: tenant.owner_id.clone(),
            store_id: tenant.store_id.clone(),
            item_id: Some(item.id.clone()),
            item_name: item.name.clone(),
            old_stock: item.stock,
            new_stock: input.counted_stock,
            difference: input.counted_stock - item.stock,
            notes: input.notes,
            created_at: Utc::now(),
        };

        self.db()
            .items()
            .set_stock(&mut tx, tenant, &item.id, input.counted_stock)
            .await?;
        self.db().items().insert_opname(&mut tx, &entry).await?;
        tx.commit().await?;

        info!(
            item_id = %item.id,
            old = entry.old_stock,
            new = entry.new_stock,
            "Stock opname recorded"
        );
        Ok(entry)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Fetches an item by id.
    pub async fn get_item(&self, tenant: &Tenant, id: &str) -> EngineResult<InventoryItem> {
        Ok(self.db().items().find(tenant, id).await?)
    }

    /// Lists items, optionally filtered by a name search.
    pub async fn list_items(
        &self,
        tenant: &Tenant,
        search: Option<&str>,
        page: u32,
        per_page: u32,
    ) -> EngineResult<Page<InventoryItem>> {
        Ok(self.db().items().list(tenant, search, page, per_page).await?)
    }

    /// Lists items at or below their minimum stock threshold.
    pub async fn low_stock_items(&self, tenant: &Tenant) -> EngineResult<Vec<InventoryItem>> {
        Ok(self.db().items().low_stock(tenant).await?)
    }

    /// Aggregate buy/sell value of the stock on hand.
    pub async fn stock_valuation(&self, tenant: &Tenant) -> EngineResult<StockValuation> {
        Ok(self.db().items().stock_valuation(tenant).await?)
    }

    /// Pages through the stock-opname audit trail.
    pub async fn opname_history(
        &self,
        tenant: &Tenant,
        page: u32,
        per_page: u32,
    ) -> EngineResult<Page<StockOpnameEntry>> {
        Ok(self.db().items().opname_history(tenant, page, per_page).await?)
    }
}
