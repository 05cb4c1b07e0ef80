//! Read-only queries and cancellation.

use anyhow::Result;
use bot_core::Exchange;
use bot_execution::OrderHandler;

use crate::cli::output::{print_balance, print_order, print_orders, print_price, print_symbol};
use crate::cli::{OpenOrdersArgs, OrderIdArgs, SymbolArgs};

pub async fn status(exchange: &dyn Exchange, args: &OrderIdArgs) -> Result<()> {
    let order = OrderHandler::new(exchange)
        .order_status(&args.symbol, &args.order_id)
        .await?;
    print_order(&order);
    Ok(())
}

pub async fn cancel(exchange: &dyn Exchange, args: &OrderIdArgs) -> Result<()> {
    let order = OrderHandler::new(exchange)
        .cancel(&args.symbol, &args.order_id)
        .await?;
    println!("Order {} canceled", order.order_id);
    print_order(&order);
    Ok(())
}

pub async fn open_orders(exchange: &dyn Exchange, args: &OpenOrdersArgs) -> Result<()> {
    let orders = OrderHandler::new(exchange)
        .open_orders(args.symbol.as_deref())
        .await?;
    print_orders(&orders);
    Ok(())
}

pub async fn balance(exchange: &dyn Exchange) -> Result<()> {
    let balance = OrderHandler::new(exchange).balance().await?;
    print_balance(&balance);
    Ok(())
}

pub async fn symbol(exchange: &dyn Exchange, args: &SymbolArgs) -> Result<()> {
    let info = OrderHandler::new(exchange).symbol_info(&args.symbol).await?;
    print_symbol(&info);
    Ok(())
}

pub async fn price(exchange: &dyn Exchange, args: &SymbolArgs) -> Result<()> {
    let ticker = OrderHandler::new(exchange).current_price(&args.symbol).await?;
    print_price(&ticker);
    Ok(())
}
