//! Terminal rendering of exchange results.

use bot_core::{AccountBalance, OrderResult, PriceTicker, SymbolInfo};

pub fn print_order(order: &OrderResult) {
    println!("Order ID:        {}", order.order_id);
    if let Some(client_id) = &order.client_order_id {
        println!("Client order ID: {}", client_id);
    }
    println!("Symbol:          {}", order.symbol);
    println!("Side:            {}", order.side);
    println!("Type:            {}", order.order_type);
    println!("Status:          {}", order.status);
    println!("Quantity:        {}", order.quantity);
    println!("Filled:          {}", order.filled_quantity);
    if order.status.is_active() {
        println!("Remaining:       {}", order.remaining_quantity());
    }
    if let Some(price) = order.price {
        println!("Price:           {}", price);
    }
    if let Some(stop) = order.stop_price {
        println!("Stop price:      {}", stop);
    }
    if let Some(avg) = order.avg_price {
        println!("Average price:   {}", avg);
    }
    if let Some(tif) = order.time_in_force {
        println!("Time in force:   {}", tif);
    }
    println!("Updated:         {}", order.updated_at.format("%Y-%m-%d %H:%M:%S UTC"));
}

pub fn print_orders(orders: &[OrderResult]) {
    if orders.is_empty() {
        println!("No open orders");
        return;
    }
    println!("{} open order(s):", orders.len());
    for order in orders {
        println!("  {}", order);
    }
}

pub fn print_balance(balance: &AccountBalance) {
    println!("Total wallet balance:    {} USDT", balance.total_wallet_balance);
    println!("Available balance:       {} USDT", balance.available_balance);
    println!("Total unrealized profit: {} USDT", balance.total_unrealized_profit);
    println!("Total margin balance:    {} USDT", balance.total_margin_balance);
    if !balance.assets.is_empty() {
        println!();
        println!("{:<8} {:>20} {:>20} {:>16}", "Asset", "Wallet", "Available", "Unrealized");
        for asset in &balance.assets {
            println!(
                "{:<8} {:>20} {:>20} {:>16}",
                asset.asset, asset.wallet_balance, asset.available_balance, asset.unrealized_profit
            );
        }
    }
}

pub fn print_symbol(info: &SymbolInfo) {
    let or_dash = |value: Option<rust_decimal::Decimal>| {
        value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
    };
    println!("Symbol:             {}", info.symbol);
    if info.is_trading() {
        println!("Status:             {}", info.status);
    } else {
        println!("Status:             {} (not accepting orders)", info.status);
    }
    println!("Base/Quote:         {}/{}", info.base_asset, info.quote_asset);
    println!("Price precision:    {}", info.price_precision);
    println!("Quantity precision: {}", info.quantity_precision);
    println!("Tick size:          {}", or_dash(info.tick_size));
    println!("Step size:          {}", or_dash(info.step_size));
    println!("Min quantity:       {}", or_dash(info.min_qty));
    println!("Max quantity:       {}", or_dash(info.max_qty));
    println!("Min notional:       {}", or_dash(info.min_notional));
    if let Some(price) = info.current_price {
        println!("Current price:      {}", price);
    }
}

pub fn print_price(ticker: &PriceTicker) {
    println!("{}: {}", ticker.symbol, ticker.price);
}
