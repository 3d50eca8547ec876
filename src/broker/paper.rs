//! In-memory paper trading gateway
//!
//! Market orders fill immediately at the symbol's current quote and update
//! the position book; limit and stop orders rest as working orders.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

use super::{
    AccountValue, Bar, Broker, BrokerError, OrderHandle, OrderStatus, OrderStatusReport,
    PositionSnapshot, QuoteHandle, QuoteTick, BUYING_POWER, CASH_BALANCE, NET_LIQUIDATION,
};
use crate::order::{Action, OrderKind, OrderLeg};

#[derive(Debug, Clone)]
struct PaperOrder {
    symbol: String,
    leg: OrderLeg,
    status: OrderStatus,
    avg_fill_price: Decimal,
}

#[derive(Debug, Default)]
struct PaperState {
    quotes: HashMap<String, QuoteTick>,
    bars: HashMap<String, Vec<Bar>>,
    account: Vec<AccountValue>,
    positions: HashMap<String, i64>,
    subscriptions: HashMap<QuoteHandle, String>,
    orders: HashMap<OrderHandle, PaperOrder>,
    placement_log: Vec<(String, OrderLeg)>,
    next_id: u64,
}

impl PaperState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Simulated gateway with immediate market fills
pub struct PaperBroker {
    connected: AtomicBool,
    state: Mutex<PaperState>,
}

impl PaperBroker {
    /// Create a disconnected paper gateway with no data
    pub fn new() -> Self {
        Self {
            connected: AtomicBool::new(false),
            state: Mutex::new(PaperState::default()),
        }
    }

    /// Start in the connected state
    pub fn connected(self) -> Self {
        self.connected.store(true, Ordering::SeqCst);
        self
    }

    pub fn with_quote(mut self, symbol: &str, tick: QuoteTick) -> Self {
        self.state.get_mut().quotes.insert(symbol.to_string(), tick);
        self
    }

    /// Quote with only a last trade price
    pub fn with_price(self, symbol: &str, price: Decimal) -> Self {
        self.with_quote(
            symbol,
            QuoteTick {
                market_price: None,
                last: Some(price),
                close: None,
            },
        )
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<Bar>) -> Self {
        self.state.get_mut().bars.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_position(mut self, symbol: &str, quantity: i64) -> Self {
        self.state
            .get_mut()
            .positions
            .insert(symbol.to_string(), quantity);
        self
    }

    /// USD account balances
    pub fn with_account(mut self, net_liquidation: Decimal, cash: Decimal, buying_power: Decimal) -> Self {
        self.state.get_mut().account = vec![
            AccountValue::new(NET_LIQUIDATION, "USD", net_liquidation.to_string()),
            AccountValue::new(CASH_BALANCE, "USD", cash.to_string()),
            AccountValue::new(BUYING_POWER, "USD", buying_power.to_string()),
        ];
        self
    }

    /// Replace the quote for a symbol while running
    pub async fn set_quote(&self, symbol: &str, tick: QuoteTick) {
        self.state
            .lock()
            .await
            .quotes
            .insert(symbol.to_string(), tick);
    }

    /// Every order placed so far, in placement order
    pub async fn placed_orders(&self) -> Vec<(String, OrderLeg)> {
        self.state.lock().await.placement_log.clone()
    }

    /// Orders still working at the gateway
    pub async fn working_orders(&self) -> Vec<(OrderHandle, OrderLeg)> {
        let state = self.state.lock().await;
        let mut working: Vec<_> = state
            .orders
            .iter()
            .filter(|(_, o)| o.status.is_active())
            .map(|(h, o)| (*h, o.leg.clone()))
            .collect();
        working.sort_by_key(|(h, _)| h.0);
        working
    }

    pub async fn open_subscriptions(&self) -> usize {
        self.state.lock().await.subscriptions.len()
    }

    pub async fn position(&self, symbol: &str) -> i64 {
        self.state
            .lock()
            .await
            .positions
            .get(symbol)
            .copied()
            .unwrap_or(0)
    }

    fn ensure_connected(&self) -> Result<(), BrokerError> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(BrokerError::NotConnected)
        }
    }
}

impl Default for PaperBroker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Broker for PaperBroker {
    async fn connect(&self, host: &str, port: u16, client_id: i32, _timeout: Duration) -> bool {
        self.connected.store(true, Ordering::SeqCst);
        tracing::info!(host, port, client_id, "Paper gateway connected");
        true
    }

    async fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
        self.state.lock().await.subscriptions.clear();
        tracing::info!("Paper gateway disconnected");
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn account_values(&self) -> Result<Vec<AccountValue>, BrokerError> {
        self.ensure_connected()?;
        Ok(self.state.lock().await.account.clone())
    }

    async fn positions(&self) -> Result<Vec<PositionSnapshot>, BrokerError> {
        self.ensure_connected()?;
        let state = self.state.lock().await;
        let mut positions: Vec<_> = state
            .positions
            .iter()
            .filter(|(_, qty)| **qty != 0)
            .map(|(symbol, qty)| PositionSnapshot {
                symbol: symbol.clone(),
                quantity: *qty,
            })
            .collect();
        positions.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        Ok(positions)
    }

    async fn request_quote(&self, symbol: &str) -> Result<QuoteHandle, BrokerError> {
        self.ensure_connected()?;
        let mut state = self.state.lock().await;
        let handle = QuoteHandle(state.next_id());
        state.subscriptions.insert(handle, symbol.to_string());
        Ok(handle)
    }

    async fn cancel_quote(&self, handle: QuoteHandle) -> Result<(), BrokerError> {
        self.state
            .lock()
            .await
            .subscriptions
            .remove(&handle)
            .map(|_| ())
            .ok_or(BrokerError::UnknownSubscription(handle))
    }

    async fn poll_quote(&self, handle: QuoteHandle) -> Result<QuoteTick, BrokerError> {
        self.ensure_connected()?;
        let state = self.state.lock().await;
        let symbol = state
            .subscriptions
            .get(&handle)
            .ok_or(BrokerError::UnknownSubscription(handle))?;
        Ok(state.quotes.get(symbol).copied().unwrap_or_default())
    }

    async fn request_daily_bars(&self, symbol: &str) -> Result<Vec<Bar>, BrokerError> {
        self.ensure_connected()?;
        Ok(self
            .state
            .lock()
            .await
            .bars
            .get(symbol)
            .cloned()
            .unwrap_or_default())
    }

    async fn place_order(&self, symbol: &str, leg: &OrderLeg) -> Result<OrderHandle, BrokerError> {
        self.ensure_connected()?;
        if leg.quantity == 0 {
            return Err(BrokerError::Rejected("quantity must be positive".to_string()));
        }

        let mut state = self.state.lock().await;
        let handle = OrderHandle(state.next_id());
        state.placement_log.push((symbol.to_string(), leg.clone()));

        let mut order = PaperOrder {
            symbol: symbol.to_string(),
            leg: leg.clone(),
            status: OrderStatus::Submitted,
            avg_fill_price: Decimal::ZERO,
        };

        if leg.kind == OrderKind::Market {
            let fill_price = state.quotes.get(symbol).and_then(|q| q.tradable_price());
            match fill_price {
                Some(price) => {
                    order.status = OrderStatus::Filled;
                    order.avg_fill_price = price;
                    let signed = i64::try_from(leg.quantity).unwrap_or(i64::MAX);
                    let position = state.positions.entry(symbol.to_string()).or_insert(0);
                    match leg.side {
                        Action::Buy => *position += signed,
                        Action::Sell => *position -= signed,
                    }
                    tracing::info!(%handle, symbol, %price, quantity = leg.quantity, "Paper market order filled");
                }
                None => {
                    order.status = OrderStatus::Inactive;
                    tracing::warn!(%handle, symbol, "Paper market order inactive: no price");
                }
            }
        } else {
            tracing::info!(%handle, symbol, order = %leg, "Paper order working");
        }

        state.orders.insert(handle, order);
        Ok(handle)
    }

    async fn poll_order_status(&self, handle: OrderHandle) -> Result<OrderStatusReport, BrokerError> {
        let state = self.state.lock().await;
        let order = state
            .orders
            .get(&handle)
            .ok_or(BrokerError::UnknownOrder(handle))?;
        Ok(OrderStatusReport {
            status: order.status,
            avg_fill_price: order.avg_fill_price,
        })
    }

    async fn cancel_order(&self, handle: OrderHandle) -> Result<(), BrokerError> {
        self.ensure_connected()?;
        let mut state = self.state.lock().await;
        let order = state
            .orders
            .get_mut(&handle)
            .ok_or(BrokerError::UnknownOrder(handle))?;
        if order.status.is_active() {
            order.status = OrderStatus::Cancelled;
            tracing::info!(%handle, symbol = %order.symbol, "Paper order cancelled");
        }
        Ok(())
    }
}
