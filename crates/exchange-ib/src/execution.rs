//! Order execution: placement, open orders and fills.

use std::time::Duration;

use async_trait::async_trait;
use ibapi::orders::{ExecutionFilter, Executions, Orders, PlaceOrder};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::broker::OrderRouter;
use crate::client::IBClient;
use crate::convert::{
    from_ib_action, order_limit, parse_execution_time, target_to_ib, to_decimal, to_ib_order,
};
use crate::error::{IbError, Result};
use crate::types::{
    ExecutionReport, OpenOrder, OrderAck, OrderStatus, OrderTarget, OrderTicket,
    PositionRecord,
};

/// How long to wait for TWS to report the first status of a new order.
const ORDER_ACK_TIMEOUT: Duration = Duration::from_secs(10);

/// Upper bound on draining an account listing.
const LISTING_TIMEOUT: Duration = Duration::from_secs(15);

#[async_trait]
impl OrderRouter for IBClient {
    async fn place_order(&self, target: &OrderTarget, ticket: &OrderTicket) -> Result<OrderAck> {
        self.ensure_writable("place orders")?;

        let order_id = self.inner().next_order_id();
        let contract = target_to_ib(target);
        let order = to_ib_order(ticket);

        info!(
            order_id,
            target = %target.display_name(),
            action = %ticket.action,
            quantity = ticket.quantity,
            order_type = ticket.kind.code(),
            limit = ?ticket.limit_price(),
            transmit = ticket.transmit,
            order_ref = %ticket.order_ref,
            "Placing order"
        );

        let mut subscription = self.inner().place_order(order_id, &contract, &order).await?;

        let first_status = async {
            while let Some(event) = subscription.next().await {
                match event? {
                    PlaceOrder::OrderStatus(status) => return Ok(Some(status)),
                    PlaceOrder::Message(notice) => {
                        warn!(order_id, notice = %notice.message, "Order notice");
                    }
                    _ => {}
                }
            }
            Ok::<_, IbError>(None)
        };

        let status = match tokio::time::timeout(ORDER_ACK_TIMEOUT, first_status).await {
            Ok(Ok(Some(status))) => status,
            Ok(Ok(None)) => {
                return Err(IbError::OrderRejected(format!(
                    "order {order_id} closed without a status"
                )))
            }
            Ok(Err(e)) => return Err(e),
            // Untransmitted orders may never report; treat as staged.
            Err(_) if !ticket.transmit => {
                debug!(order_id, "Staged order did not report a status");
                return Ok(OrderAck {
                    order_id,
                    status: OrderStatus::PendingSubmit,
                    filled: Decimal::ZERO,
                    avg_fill_price: None,
                });
            }
            Err(_) => return Err(IbError::Timeout(format!("status of order {order_id}"))),
        };

        let ack = OrderAck {
            order_id,
            status: OrderStatus::parse(&status.status),
            filled: to_decimal(status.filled).unwrap_or_default(),
            avg_fill_price: to_decimal(status.average_fill_price).ok().filter(|p| !p.is_zero()),
        };

        info!(order_id, status = %ack.status, filled = %ack.filled, "Order acknowledged");
        Ok(ack)
    }

    async fn open_orders(&self) -> Result<Vec<OpenOrder>> {
        let mut subscription = self.inner().all_open_orders().await?;
        let mut orders = Vec::new();

        let drain = async {
            while let Some(event) = subscription.next().await {
                if let Orders::OrderData(data) = event? {
                    orders.push(OpenOrder {
                        order_id: data.order_id,
                        symbol: data.contract.symbol.to_string(),
                        action: from_ib_action(&data.order.action),
                        order_type: data.order.order_type.clone(),
                        quantity: to_decimal(data.order.total_quantity)?,
                        limit_price: order_limit(data.order.limit_price),
                        status: OrderStatus::parse(&data.order_state.status),
                        order_ref: data.order.order_ref.clone(),
                    });
                }
            }
            Ok::<_, IbError>(())
        };

        match tokio::time::timeout(LISTING_TIMEOUT, drain).await {
            Ok(result) => result?,
            Err(_) => warn!("Open order listing did not finish, returning what arrived"),
        }

        debug!(count = orders.len(), "Open orders retrieved");
        Ok(orders)
    }

    async fn executions(&self) -> Result<Vec<ExecutionReport>> {
        let mut subscription = self.inner().executions(ExecutionFilter::default()).await?;
        let mut reports = Vec::new();

        let drain = async {
            while let Some(event) = subscription.next().await {
                let Executions::ExecutionData(data) = event? else {
                    continue;
                };
                let execution = &data.execution;
                let Some(time) = parse_execution_time(&execution.time) else {
                    warn!(execution_id = %execution.execution_id, raw = %execution.time, "Unparseable execution time");
                    continue;
                };
                reports.push(ExecutionReport {
                    order_id: execution.order_id,
                    execution_id: execution.execution_id.clone(),
                    symbol: data.contract.symbol.to_string(),
                    local_symbol: data.contract.local_symbol.clone(),
                    side: execution.side.parse()?,
                    shares: to_decimal(execution.shares)?,
                    avg_price: to_decimal(execution.average_price)?,
                    time,
                });
            }
            Ok::<_, IbError>(())
        };

        match tokio::time::timeout(LISTING_TIMEOUT, drain).await {
            Ok(result) => result?,
            Err(_) => warn!("Execution listing did not finish, returning what arrived"),
        }

        debug!(count = reports.len(), "Executions retrieved");
        Ok(reports)
    }

    async fn positions(&self) -> Result<Vec<PositionRecord>> {
        self.position_snapshot().await
    }
}
