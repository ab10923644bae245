//! API Routes
//!
//! HTTP endpoint definitions.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::amount::with_ledger_scale;
use crate::domain::{OperationContext, Transaction, Wallet};
use crate::engine::{BalanceEngine, DepositCommand, WithdrawCommand};
use crate::error::AppError;
use crate::store::{LedgerStore, PageRequest, Reconciliation, DEFAULT_PAGE_LIMIT};

/// Shared state for all handlers
#[derive(Debug, Clone)]
pub struct AppState {
    pub engine: BalanceEngine,
}

impl AppState {
    pub fn new(engine: BalanceEngine) -> Self {
        Self { engine }
    }

    fn store(&self) -> &LedgerStore {
        self.engine.store()
    }
}

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateWalletRequest {
    pub label: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateWalletRequest {
    pub label: String,
}

/// Amount as sent by clients: a decimal string or a JSON number.
///
/// Numbers keep their literal digits (serde_json `arbitrary_precision`) so
/// they are never rounded through `f64`.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "serde_json::Value")]
pub enum AmountInput {
    Text(String),
    Number(serde_json::Number),
}

impl TryFrom<serde_json::Value> for AmountInput {
    type Error = String;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        match value {
            serde_json::Value::String(text) => Ok(AmountInput::Text(text)),
            serde_json::Value::Number(number) => Ok(AmountInput::Number(number)),
            other => Err(format!("amount must be a string or a number, got {}", other)),
        }
    }
}

impl AmountInput {
    fn into_string(self) -> String {
        match self {
            AmountInput::Text(text) => text,
            AmountInput::Number(number) => number.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BalanceChangeRequest {
    pub wallet_id: i64,
    pub amount: AmountInput,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WalletResponse {
    pub id: i64,
    pub label: String,
    pub balance: Decimal,
}

impl From<Wallet> for WalletResponse {
    fn from(wallet: Wallet) -> Self {
        Self {
            id: wallet.id,
            label: wallet.label,
            balance: with_ledger_scale(wallet.balance),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionResponse {
    pub id: i64,
    pub amount: Decimal,
    pub txid: Uuid,
    pub wallet: i64,
}

impl From<Transaction> for TransactionResponse {
    fn from(transaction: Transaction) -> Self {
        Self {
            id: transaction.id,
            amount: with_ledger_scale(transaction.amount),
            txid: transaction.txid,
            wallet: transaction.wallet_id,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReconciliationResponse {
    pub wallet_id: i64,
    pub balance: Decimal,
    pub transaction_sum: Decimal,
    pub consistent: bool,
}

impl From<Reconciliation> for ReconciliationResponse {
    fn from(reconciliation: Reconciliation) -> Self {
        Self {
            consistent: reconciliation.is_consistent(),
            wallet_id: reconciliation.wallet_id,
            balance: with_ledger_scale(reconciliation.balance),
            transaction_sum: with_ledger_scale(reconciliation.transaction_sum),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    DEFAULT_PAGE_LIMIT
}

impl From<PageQuery> for PageRequest {
    fn from(query: PageQuery) -> Self {
        PageRequest::new(query.limit, query.offset)
    }
}

/// One page of a list endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct Page<T> {
    pub count: i64,
    pub results: Vec<T>,
}

// =========================================================================
// API Router
// =========================================================================

/// Create the API router
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/wallets", get(list_wallets).post(create_wallet))
        .route("/wallets/deposit", post(deposit))
        .route("/wallets/withdraw", post(withdraw))
        .route("/wallets/:wallet_id", get(get_wallet).patch(update_wallet))
        .route("/wallets/:wallet_id/transactions", get(list_wallet_transactions))
        .route("/wallets/:wallet_id/reconciliation", get(reconcile_wallet))
        .route("/transactions", get(list_transactions))
        .route("/transactions/:txid", get(get_transaction))
}

// =========================================================================
// Wallets
// =========================================================================

/// List wallets
async fn list_wallets(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<WalletResponse>>, AppError> {
    let store = state.store();
    let wallets = store.list_wallets(query.into()).await?;
    let count = store.count_wallets().await?;

    Ok(Json(Page {
        count,
        results: wallets.into_iter().map(WalletResponse::from).collect(),
    }))
}

/// Create a wallet with a zero balance
async fn create_wallet(
    State(state): State<AppState>,
    Json(request): Json<CreateWalletRequest>,
) -> Result<(StatusCode, Json<WalletResponse>), AppError> {
    let wallet = state.store().create_wallet(&request.label).await?;
    Ok((StatusCode::CREATED, Json(wallet.into())))
}

/// Get wallet by ID
async fn get_wallet(
    State(state): State<AppState>,
    Path(wallet_id): Path<i64>,
) -> Result<Json<WalletResponse>, AppError> {
    let wallet = state.store().get_wallet(wallet_id).await?;
    Ok(Json(wallet.into()))
}

/// Rename a wallet
async fn update_wallet(
    State(state): State<AppState>,
    Path(wallet_id): Path<i64>,
    Json(request): Json<UpdateWalletRequest>,
) -> Result<Json<WalletResponse>, AppError> {
    let wallet = state.store().rename_wallet(wallet_id, &request.label).await?;
    Ok(Json(wallet.into()))
}

/// Transactions of one wallet in creation order
async fn list_wallet_transactions(
    State(state): State<AppState>,
    Path(wallet_id): Path<i64>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<TransactionResponse>>, AppError> {
    let store = state.store();
    let transactions = store
        .list_wallet_transactions(wallet_id, query.into())
        .await?;
    let count = store.count_wallet_transactions(wallet_id).await?;

    Ok(Json(Page {
        count,
        results: transactions.into_iter().map(TransactionResponse::from).collect(),
    }))
}

/// Compare stored balance with the transaction log
async fn reconcile_wallet(
    State(state): State<AppState>,
    Path(wallet_id): Path<i64>,
) -> Result<Json<ReconciliationResponse>, AppError> {
    let reconciliation = state.store().reconcile_wallet(wallet_id).await?;
    Ok(Json(reconciliation.into()))
}

// =========================================================================
// Balance mutations
// =========================================================================

/// Deposit into a wallet
async fn deposit(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    Json(request): Json<BalanceChangeRequest>,
) -> Result<(StatusCode, Json<TransactionResponse>), AppError> {
    let command = DepositCommand::new(request.wallet_id, request.amount.into_string());
    let transaction = state.engine.deposit(command, &context).await?;
    Ok((StatusCode::CREATED, Json(transaction.into())))
}

/// Withdraw from a wallet
async fn withdraw(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    Json(request): Json<BalanceChangeRequest>,
) -> Result<(StatusCode, Json<TransactionResponse>), AppError> {
    let command = WithdrawCommand::new(request.wallet_id, request.amount.into_string());
    let transaction = state.engine.withdraw(command, &context).await?;
    Ok((StatusCode::CREATED, Json(transaction.into())))
}

// =========================================================================
// Transactions
// =========================================================================

/// List all transactions
async fn list_transactions(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<TransactionResponse>>, AppError> {
    let store = state.store();
    let transactions = store.list_transactions(query.into()).await?;
    let count = store.count_transactions().await?;

    Ok(Json(Page {
        count,
        results: transactions.into_iter().map(TransactionResponse::from).collect(),
    }))
}

/// Get transaction by its public txid
async fn get_transaction(
    State(state): State<AppState>,
    Path(txid): Path<String>,
) -> Result<Json<TransactionResponse>, AppError> {
    let transaction = state.store().get_transaction_by_txid(&txid).await?;
    Ok(Json(transaction.into()))
}
