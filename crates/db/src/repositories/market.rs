//! Company, stock, shareholding and ledger repositories.

use crate::entities::{
    Company, SharePriceHistory, Stock, TransactionHistory, UserShare, company,
    share_price_history, stock, transaction_history, user_share,
};
use polity_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    sea_query::{Expr, Query},
};

/// Company repository for database operations.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompanyRepository;

impl CompanyRepository {
    /// Create a new company repository.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Every company, in id order.
    pub async fn find_all<C>(&self, conn: &C) -> AppResult<Vec<company::Model>>
    where
        C: ConnectionTrait,
    {
        Company::find()
            .order_by_asc(company::Column::Id)
            .all(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Companies with no holding of positive quantity.
    pub async fn find_without_holders<C>(&self, conn: &C) -> AppResult<Vec<company::Model>>
    where
        C: ConnectionTrait,
    {
        Company::find()
            .filter(
                company::Column::Id.not_in_subquery(
                    Query::select()
                        .column(user_share::Column::CompanyId)
                        .from(UserShare)
                        .and_where(user_share::Column::Quantity.gt(0))
                        .to_owned(),
                ),
            )
            .order_by_asc(company::Column::Id)
            .all(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a company and everything hanging off it.
    ///
    /// Order: price history, stock, holdings, company.
    pub async fn dissolve<C>(&self, conn: &C, company_id: &str) -> AppResult<()>
    where
        C: ConnectionTrait,
    {
        SharePriceHistory::delete_many()
            .filter(
                share_price_history::Column::StockId.in_subquery(
                    Query::select()
                        .column(stock::Column::Id)
                        .from(Stock)
                        .and_where(stock::Column::CompanyId.eq(company_id))
                        .to_owned(),
                ),
            )
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Stock::delete_many()
            .filter(stock::Column::CompanyId.eq(company_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        UserShare::delete_many()
            .filter(user_share::Column::CompanyId.eq(company_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Company::delete_by_id(company_id)
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    /// Issue one more share of the company.
    pub async fn mint_share<C>(&self, conn: &C, company_id: &str) -> AppResult<()>
    where
        C: ConnectionTrait,
    {
        Company::update_many()
            .col_expr(
                company::Column::IssuedShares,
                Expr::col(company::Column::IssuedShares).add(1),
            )
            .filter(company::Column::Id.eq(company_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Record a new CEO.
    pub async fn set_ceo<C>(&self, conn: &C, company_id: &str, user_id: &str) -> AppResult<()>
    where
        C: ConnectionTrait,
    {
        Company::update_many()
            .col_expr(company::Column::CreatorId, Expr::value(user_id))
            .filter(company::Column::Id.eq(company_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

/// Stock repository for database operations.
#[derive(Debug, Clone, Copy, Default)]
pub struct StockRepository;

impl StockRepository {
    /// Create a new stock repository.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// The stock row of a company.
    pub async fn find_by_company<C>(
        &self,
        conn: &C,
        company_id: &str,
    ) -> AppResult<Option<stock::Model>>
    where
        C: ConnectionTrait,
    {
        Stock::find()
            .filter(stock::Column::CompanyId.eq(company_id))
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Set the new price and zero the daily counters.
    pub async fn reprice<C>(&self, conn: &C, stock_id: &str, price: i64) -> AppResult<()>
    where
        C: ConnectionTrait,
    {
        Stock::update_many()
            .col_expr(stock::Column::Price, Expr::value(price))
            .col_expr(stock::Column::BoughtToday, Expr::value(0_i64))
            .col_expr(stock::Column::SoldToday, Expr::value(0_i64))
            .filter(stock::Column::Id.eq(stock_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Append a price history point.
    pub async fn record_price<C>(
        &self,
        conn: &C,
        point: share_price_history::ActiveModel,
    ) -> AppResult<()>
    where
        C: ConnectionTrait,
    {
        SharePriceHistory::insert(point)
            .exec_without_returning(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

/// Shareholding repository for database operations.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShareRepository;

impl ShareRepository {
    /// Create a new share repository.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Holdings of positive quantity, largest first, ties by user id.
    pub async fn find_holders<C>(
        &self,
        conn: &C,
        company_id: &str,
    ) -> AppResult<Vec<user_share::Model>>
    where
        C: ConnectionTrait,
    {
        UserShare::find()
            .filter(user_share::Column::CompanyId.eq(company_id))
            .filter(user_share::Column::Quantity.gt(0))
            .order_by_desc(user_share::Column::Quantity)
            .order_by_asc(user_share::Column::UserId)
            .all(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

/// Transaction ledger repository.
#[derive(Debug, Clone, Copy, Default)]
pub struct LedgerRepository;

impl LedgerRepository {
    /// Create a new ledger repository.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Append a ledger entry.
    pub async fn record<C>(
        &self,
        conn: &C,
        entry: transaction_history::ActiveModel,
    ) -> AppResult<()>
    where
        C: ConnectionTrait,
    {
        TransactionHistory::insert(entry)
            .exec_without_returning(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
